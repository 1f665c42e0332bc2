//! # Workflows Module
//!
//! End-to-end procedures built from the engine tasks. These are the entry points for
//! callers of the library.
//!
//! ## Architecture
//!
//! - **Recommendation** ([`recommend`]) - Filters, scores, ranks and explains a candidate
//!   pool against a [`crate::engine::request::RecommendationRequest`].
//! - **Trade-off Exploration** ([`tradeoffs`]) - Frontier, per-objective leaders and
//!   objective correlations over a wider slice of the ranking.
//! - **Baseline Comparison** ([`compare`]) - Percentage differences between a baseline
//!   material and alternatives.
//!
//! Every workflow validates its inputs before touching the pool and returns an
//! [`crate::engine::error::EngineError`] on failure.

pub mod compare;
pub mod recommend;
pub mod tradeoffs;

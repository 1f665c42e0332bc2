//! # Engine Module
//!
//! The logic core of the recommendation pipeline.
//!
//! ## Overview
//!
//! A recommendation runs as a fixed sequence of stateless tasks over an in-memory
//! candidate pool: constraint filtering, normalization, scoring, Pareto analysis and
//! explanation. Each task is a pure function of its inputs and the immutable
//! [`config::EngineConfig`], which makes concurrent invocations on independent requests
//! safe without any coordination.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Tunable defaults: missing-data penalty, stability
//!   penalty curve, explanation thresholds and default objective weights
//! - **Requests** ([`request`]) - The per-invocation requirement set, objectives and `top_n`
//! - **Progress Monitoring** ([`progress`]) - Stage events for front ends
//! - **Error Handling** ([`error`]) - Engine error kinds
//! - **Tasks** ([`tasks`]) - The computational stages of the pipeline

pub mod config;
pub mod error;
pub mod progress;
pub mod request;
pub mod tasks;

//! # Core Module
//!
//! Stateless building blocks of the recommendation engine.
//!
//! - **Data Models** ([`models`]) - Candidates, property vectors, requirements, objectives
//!   and the ordered category scales used by category-match requirements.
//! - **Pool I/O** ([`io`]) - Loading candidate pools from CSV and TOML files supplied by
//!   external data sources.
//!
//! Nothing in this module performs network access or holds state between calls; data
//! fetching, property prediction and cost feeds are the responsibility of collaborators
//! that hand fully-formed [`models::candidate::Candidate`] records to the engine.

pub mod io;
pub mod models;

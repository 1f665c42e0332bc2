//! # MatSelect Core Library
//!
//! A multi-criteria recommendation engine for materials selection. Given a pool of
//! candidate materials with (possibly incomplete) property vectors, it applies hard
//! constraints, scores the survivors against weighted objectives, derives the Pareto
//! frontier and explains every ranked recommendation.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Candidate`, `PropertyVector`,
//!   `Requirement`, `ObjectiveSpec`) and candidate pool I/O.
//!
//! - **[`engine`]: The Logic Core.** Immutable configuration, the request model, error
//!   types, progress events, and the computational tasks of the pipeline: constraint
//!   filtering, normalization, scoring, Pareto analysis and explanation.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures built from the engine tasks:
//!   ranked recommendations, trade-off exploration and baseline comparisons.
//!
//! Every invocation is a pure computation over in-memory data. The engine holds no mutable
//! state between calls, so independent requests can run concurrently without coordination.

pub mod core;
pub mod engine;
pub mod workflows;

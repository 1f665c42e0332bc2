//! Data models for materials selection.
//!
//! - [`ids`] - Stable material identifiers
//! - [`property`] - Measurements and the immutable [`property::PropertyVector`]
//! - [`candidate`] - Candidate materials and their provenance
//! - [`category`] - Ordered category scales (e.g. corrosion resistance tiers)
//! - [`requirement`] - Hard pass/fail constraints on properties
//! - [`objective`] - Soft, weighted optimization objectives

pub mod candidate;
pub mod category;
pub mod ids;
pub mod objective;
pub mod property;
pub mod requirement;

//! Computational stages of the recommendation pipeline.
//!
//! Each stage is a pure function over the surviving candidates, run in this order by
//! [`crate::workflows::recommend`]: [`filter`] → [`normalize`] → [`score`] → [`pareto`] →
//! [`explain`].

pub mod explain;
pub mod filter;
pub mod normalize;
pub mod pareto;
pub mod score;

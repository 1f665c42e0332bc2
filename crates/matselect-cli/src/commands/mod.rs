pub mod compare;
pub mod recommend;
pub mod tradeoffs;

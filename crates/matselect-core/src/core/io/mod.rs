//! Loading candidate pools from files.
//!
//! Pools come from external sources (database exports, spreadsheets, prediction runs) as
//! CSV or TOML. [`pool::read_pool`] picks the format from the file extension.

pub mod pool;

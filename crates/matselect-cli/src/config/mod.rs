//! Configuration layering for the CLI: built-in defaults, then the TOML file, then
//! `-S key=value` overrides, then dedicated flags.

pub mod builder;
pub mod defaults;
pub mod file;
pub mod models;

// LogIntel - core/mod.rs
//
// Core business logic layer: data model, line parser, record filter.
// Must NOT depend on: app, platform, or any network/storage crate.

pub mod filter;
pub mod model;
pub mod parser;

// LogIntel - platform/mod.rs
//
// Platform layer: configuration, record stores, the engine client and the
// HTTP server. Implements the contracts declared in app::contracts.
// Dependencies: app, core, util.

pub mod config;
pub mod engine;
pub mod server;
pub mod sqlite;
pub mod store;

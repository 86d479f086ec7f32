// LogIntel - lib.rs
//
// Library entry point, exposing every layer for integration testing and
// programmatic embedding. The binary in `main.rs` only wires them together.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;

// LogIntel - app/mod.rs
//
// Application layer: ingestion and analysis orchestration, plus the
// collaborator contracts they are written against.
// Dependencies: core layer, util.
// Must NOT depend on: platform specifics.

pub mod analysis;
pub mod contracts;
pub mod ingest;

// SuburbExplorer - app/mod.rs
//
// Application layer: load caching, session state, dashboard cycles.
// Dependencies: core layer.
// Must NOT depend on: platform specifics.

pub mod cache;
pub mod dashboard;
pub mod state;

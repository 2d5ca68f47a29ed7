// SuburbExplorer - core/mod.rs
//
// Core business logic layer.
// Dependencies: standard library plus the workbook and statistics crates.
// Must NOT depend on: platform, app.

pub mod charts;
pub mod export;
pub mod filter;
pub mod loader;
pub mod metrics;
pub mod model;

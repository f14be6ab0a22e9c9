//! kube-query API - library crate for the natural-language cluster query server.
//!
//! Re-exports all modules so the binary (`main.rs`) and external crates
//! (e.g. `kq-e2e-tests`) can access `AppState`, `build_router`, the
//! classifier implementations and the pipeline.

pub mod classifier;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod validate;

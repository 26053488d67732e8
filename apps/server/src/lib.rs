//! Library root for the `capfox` admission-control server. `main.rs` is a
//! thin ignition shell over this crate so integration tests can drive the
//! router and CLI plumbing directly.

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pidfile;
pub mod routes;
pub mod state;

//! services/api/src/lib.rs
//!
//! The library surface of the `api` service: the persisted store, the
//! simulated upload/ask/search flows, the port adapters, and the Axum
//! handlers the binaries assemble into a server.

pub mod adapters;
pub mod config;
pub mod error;
pub mod store;
pub mod web;

//! services/api/src/lib.rs
//!
//! Library half of the `api` service: adapters, configuration and the web layer,
//! shared by the `api` and `openapi` binaries and the integration tests.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;

//! services/api/src/lib.rs
//!
//! Library surface of the API service: configuration, adapters for the
//! external services the session coordinator depends on, and the web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;

//! Shared service plumbing: error rendering, tracing, middleware and env configuration.

pub mod config;
pub mod error;
pub mod middleware;
pub mod tracing;

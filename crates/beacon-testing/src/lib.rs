//! Test utilities for Beacon services.
//!
//! Provides scripted probes with call counting, a one-shot router client and
//! the contract fixture loader. Import from tests only, never production code.

pub mod client;
pub mod fixture;
pub mod probe;

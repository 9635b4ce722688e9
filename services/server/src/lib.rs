pub mod config;
pub mod infra;
pub mod router;
pub mod state;

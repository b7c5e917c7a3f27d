//! service-core: Shared infrastructure for the workout relay services.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;

//! HTTP handlers for the workout service.

pub mod workout;

pub use workout::{generate_workout, not_found, GenerationError};

pub mod workout;

pub use workout::{ErrorResponse, GenerateWorkoutRequest, GenerateWorkoutResponse};

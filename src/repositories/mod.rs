pub mod service;
pub mod workout_repo;

pub use service::{Deadline, WorkoutService};
pub use workout_repo::WorkoutRepository;

pub mod exercise;
pub mod from_row;
pub mod workout;

pub use exercise::{Exercise, ExerciseRequest};
pub use from_row::FromSqliteRow;
pub use workout::{CreateWorkoutRequest, NewWorkout, Workout};

pub mod health;
pub mod workouts;

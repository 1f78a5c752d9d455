use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{health, workouts};

pub fn create_router(workouts_state: workouts::WorkoutsState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        // Workout routes
        .route("/workouts", post(workouts::create))
        .route(
            "/workouts/{id}",
            get(workouts::show).delete(workouts::delete),
        )
        .with_state(workouts_state)
        .layer(TraceLayer::new_for_http())
}

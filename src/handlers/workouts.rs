use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{CreateWorkoutRequest, Workout};
use crate::repositories::{Deadline, WorkoutService};

#[derive(Clone)]
pub struct WorkoutsState {
    pub service: Arc<dyn WorkoutService>,
    pub request_timeout: Duration,
}

impl WorkoutsState {
    pub fn new(service: Arc<dyn WorkoutService>, request_timeout: Duration) -> Self {
        Self {
            service,
            request_timeout,
        }
    }

    fn deadline(&self) -> Deadline {
        Deadline::after(self.request_timeout)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateWorkoutResponse {
    pub workout_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteWorkoutResponse {
    pub message: String,
    pub workout_id: i64,
}

fn workout_id(path: std::result::Result<Path<i64>, PathRejection>) -> Result<i64> {
    let Path(id) = path.map_err(|e| {
        tracing::debug!("Rejected workout id: {}", e.body_text());
        AppError::BadRequest("workout id must be an integer".to_string())
    })?;
    Ok(id)
}

pub async fn create(
    State(state): State<WorkoutsState>,
    payload: std::result::Result<Json<CreateWorkoutRequest>, JsonRejection>,
) -> Result<Json<CreateWorkoutResponse>> {
    let Json(request) = payload.map_err(|e| {
        tracing::debug!("Failed to decode request body: {}", e.body_text());
        AppError::BadRequest(format!("failed to decode request: {}", e.body_text()))
    })?;

    let workout = request.validate().map_err(|errors| {
        tracing::debug!("Invalid workout request: {}", errors);
        AppError::Validation(errors)
    })?;

    let workout_id = state
        .service
        .save_workout(workout, state.deadline())
        .await?;

    tracing::info!(workout_id, "Workout saved");
    Ok(Json(CreateWorkoutResponse { workout_id }))
}

pub async fn show(
    State(state): State<WorkoutsState>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<Workout>> {
    let id = workout_id(path)?;

    let workout = state.service.get_workout(id, state.deadline()).await?;

    tracing::debug!(workout_id = id, exercises = workout.exercises.len(), "Workout found");
    Ok(Json(workout))
}

pub async fn delete(
    State(state): State<WorkoutsState>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<DeleteWorkoutResponse>> {
    let id = workout_id(path)?;

    state.service.delete_workout(id, state.deadline()).await?;

    tracing::info!(workout_id = id, "Workout deleted");
    Ok(Json(DeleteWorkoutResponse {
        message: "workout deleted".to_string(),
        workout_id: id,
    }))
}

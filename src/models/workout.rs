use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::{Exercise, ExerciseRequest, FromSqliteRow};
use crate::error::ValidationErrors;

/// A dated exercise session belonging to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: i64,
    pub user_id: i64,
    pub date: DateTime<Utc>,
    pub exercises: Vec<Exercise>,
}

impl FromSqliteRow for Workout {
    /// Maps the `workouts` row only; exercises are attached by the caller.
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            date: row.get("date")?,
            exercises: Vec::new(),
        })
    }
}

/// A validated workout that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkout {
    pub user_id: i64,
    pub date: DateTime<Utc>,
    pub exercises: Vec<Exercise>,
}

/// Body of `POST /workouts`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateWorkoutRequest {
    pub user_id: Option<i64>,
    pub date: Option<DateTime<Utc>>,
    pub exercises: Option<Vec<ExerciseRequest>>,
}

impl CreateWorkoutRequest {
    /// Check every field and collect all failures at once.
    ///
    /// An empty `exercises` list is accepted; a missing one is not.
    pub fn validate(self) -> Result<NewWorkout, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let user_id = match self.user_id {
            Some(id) if id > 0 => Some(id),
            Some(_) => {
                errors.add("user_id", "must be a positive integer");
                None
            }
            None => {
                errors.add("user_id", "required");
                None
            }
        };

        if self.date.is_none() {
            errors.add("date", "required");
        }

        let exercises = match self.exercises {
            Some(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| item.validate(&format!("exercises[{i}]"), &mut errors))
                .collect::<Vec<_>>(),
            None => {
                errors.add("exercises", "required");
                Vec::new()
            }
        };

        match (user_id, self.date) {
            (Some(user_id), Some(date)) if errors.is_empty() => Ok(NewWorkout {
                user_id,
                date,
                exercises: exercises.into_iter().flatten().collect(),
            }),
            _ => Err(errors),
        }
    }
}

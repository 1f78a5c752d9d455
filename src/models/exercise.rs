use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;
use crate::error::ValidationErrors;

/// One movement within a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub weight: f64,
    pub sets: i32,
    pub reps: i32,
}

impl FromSqliteRow for Exercise {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get("name")?,
            weight: row.get("weight")?,
            sets: row.get("sets")?,
            reps: row.get("reps")?,
        })
    }
}

/// Exercise as it arrives over the wire; every field is optional so a
/// missing one can be reported alongside the others.
#[derive(Debug, Default, Deserialize)]
pub struct ExerciseRequest {
    pub name: Option<String>,
    pub weight: Option<f64>,
    pub sets: Option<i32>,
    pub reps: Option<i32>,
}

impl ExerciseRequest {
    /// Validate into an [`Exercise`], recording failures under `prefix`.
    pub(crate) fn validate(self, prefix: &str, errors: &mut ValidationErrors) -> Option<Exercise> {
        let name = match self.name {
            Some(name) if !name.trim().is_empty() => Some(name),
            Some(_) => {
                errors.add(format!("{prefix}.name"), "must not be empty");
                None
            }
            None => {
                errors.add(format!("{prefix}.name"), "required");
                None
            }
        };

        let weight = match self.weight {
            Some(w) if w.is_finite() && w >= 0.0 => Some(w),
            Some(_) => {
                errors.add(format!("{prefix}.weight"), "must be a non-negative number");
                None
            }
            None => {
                errors.add(format!("{prefix}.weight"), "required");
                None
            }
        };

        let sets = positive(self.sets, &format!("{prefix}.sets"), errors);
        let reps = positive(self.reps, &format!("{prefix}.reps"), errors);

        Some(Exercise {
            name: name?,
            weight: weight?,
            sets: sets?,
            reps: reps?,
        })
    }
}

fn positive(value: Option<i32>, field: &str, errors: &mut ValidationErrors) -> Option<i32> {
    match value {
        Some(v) if v > 0 => Some(v),
        Some(_) => {
            errors.add(field, "must be a positive integer");
            None
        }
        None => {
            errors.add(field, "required");
            None
        }
    }
}

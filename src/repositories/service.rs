use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};
use crate::models::{NewWorkout, Workout};

/// The point in time by which a storage call must have finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Instant);

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        Self(Instant::now() + timeout)
    }

    pub fn at(instant: Instant) -> Self {
        Self(instant)
    }

    /// Time left before expiry, or `None` once the deadline has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.0
            .checked_duration_since(Instant::now())
            .filter(|d| !d.is_zero())
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_none()
    }

    /// Fail with [`StorageError::Timeout`] tagged with `op` if expired.
    pub fn check(&self, op: &'static str) -> StorageResult<()> {
        if self.is_expired() {
            Err(StorageError::Timeout { op })
        } else {
            Ok(())
        }
    }
}

/// Workout persistence as seen by the HTTP layer.
#[async_trait]
pub trait WorkoutService: Send + Sync {
    /// Persist a workout and all of its exercises atomically, returning the
    /// identifier assigned by storage.
    async fn save_workout(&self, workout: NewWorkout, deadline: Deadline) -> StorageResult<i64>;

    /// Fetch a workout with its exercises in insertion order.
    async fn get_workout(&self, id: i64, deadline: Deadline) -> StorageResult<Workout>;

    /// Delete a workout and its exercises atomically. Deleting an id that
    /// does not exist fails with [`StorageError::NotFound`].
    async fn delete_workout(&self, id: i64, deadline: Deadline) -> StorageResult<()>;
}

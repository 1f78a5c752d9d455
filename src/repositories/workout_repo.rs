use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::service::{Deadline, WorkoutService};
use crate::db::{DbConnection, DbPool, DEFAULT_BUSY_TIMEOUT};
use crate::error::{StorageError, StorageResult};
use crate::models::{Exercise, FromSqliteRow, NewWorkout, Workout};

/// SQLite-backed [`WorkoutService`].
#[derive(Clone)]
pub struct WorkoutRepository {
    pool: DbPool,
    busy_timeout: Duration,
}

impl WorkoutRepository {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Longest a single statement may wait on another writer's lock. The
    /// request deadline shortens it further.
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }
}

/// Check out a pooled connection, waiting no longer than the deadline allows.
fn acquire(pool: &DbPool, deadline: Deadline, op: &'static str) -> StorageResult<DbConnection> {
    let remaining = deadline.remaining().ok_or(StorageError::Timeout { op })?;
    pool.get_timeout(remaining).map_err(|e| {
        if deadline.is_expired() {
            StorageError::Timeout { op }
        } else {
            StorageError::pool(op, e)
        }
    })
}

/// Bound SQLite's lock wait by both the configured busy timeout and the
/// time left on the deadline.
fn cap_lock_wait(
    conn: &Connection,
    deadline: Deadline,
    busy_timeout: Duration,
    op: &'static str,
) -> StorageResult<()> {
    let remaining = deadline.remaining().ok_or(StorageError::Timeout { op })?;
    // SQLite truncates to whole milliseconds; round up so a deadline-bound
    // wait never gives up before the deadline has actually passed
    let wait = if remaining < busy_timeout {
        remaining + Duration::from_millis(1)
    } else {
        busy_timeout
    };
    conn.busy_timeout(wait)
        .map_err(|e| StorageError::database(op, e))
}

/// Wrap a SQLite error; lock contention that ran past the deadline is a
/// timeout rather than a conflict.
fn sql_error(deadline: Deadline, op: &'static str) -> impl FnOnce(rusqlite::Error) -> StorageError {
    move |e| match StorageError::database(op, e) {
        StorageError::Conflict { .. } if deadline.is_expired() => StorageError::Timeout { op },
        other => other,
    }
}

async fn run_blocking<T, F>(op: &'static str, f: F) -> StorageResult<T>
where
    F: FnOnce() -> StorageResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::Task {
            op,
            message: e.to_string(),
        })?
}

#[async_trait]
impl WorkoutService for WorkoutRepository {
    async fn save_workout(&self, workout: NewWorkout, deadline: Deadline) -> StorageResult<i64> {
        let pool = self.pool.clone();
        let busy_timeout = self.busy_timeout;
        run_blocking("save_workout", move || {
            let mut conn = acquire(&pool, deadline, "save_workout: acquire connection")?;
            cap_lock_wait(&conn, deadline, busy_timeout, "save_workout: begin")?;

            // Dropping `tx` on any early return rolls back
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(sql_error(deadline, "save_workout: begin"))?;

            deadline.check("save_workout: insert workout")?;
            tx.execute(
                "INSERT INTO workouts (user_id, date) VALUES (?1, ?2)",
                params![workout.user_id, workout.date],
            )
            .map_err(sql_error(deadline, "save_workout: insert workout"))?;
            let workout_id = tx.last_insert_rowid();

            {
                let mut stmt = tx
                    .prepare_cached(
                        "INSERT INTO exercises (workout_id, name, weight, sets, reps)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                    )
                    .map_err(sql_error(deadline, "save_workout: insert exercise"))?;

                for exercise in &workout.exercises {
                    deadline.check("save_workout: insert exercise")?;
                    stmt.execute(params![
                        workout_id,
                        exercise.name,
                        exercise.weight,
                        exercise.sets,
                        exercise.reps
                    ])
                    .map_err(sql_error(deadline, "save_workout: insert exercise"))?;
                }
            }

            cap_lock_wait(&tx, deadline, busy_timeout, "save_workout: commit")?;
            tx.commit()
                .map_err(sql_error(deadline, "save_workout: commit"))?;

            tracing::debug!(
                workout_id,
                user_id = workout.user_id,
                exercises = workout.exercises.len(),
                "Saved workout"
            );
            Ok(workout_id)
        })
        .await
    }

    async fn get_workout(&self, id: i64, deadline: Deadline) -> StorageResult<Workout> {
        let pool = self.pool.clone();
        let busy_timeout = self.busy_timeout;
        run_blocking("get_workout", move || {
            let mut conn = acquire(&pool, deadline, "get_workout: acquire connection")?;
            cap_lock_wait(&conn, deadline, busy_timeout, "get_workout: begin")?;

            // Read both tables from one snapshot
            let tx = conn
                .transaction()
                .map_err(sql_error(deadline, "get_workout: begin"))?;

            deadline.check("get_workout: select workout")?;
            let mut workout = tx
                .prepare_cached("SELECT id, user_id, date FROM workouts WHERE id = ?1")
                .and_then(|mut stmt| stmt.query_row([id], Workout::from_row).optional())
                .map_err(sql_error(deadline, "get_workout: select workout"))?
                .ok_or(StorageError::NotFound {
                    op: "get_workout: select workout",
                    id,
                })?;

            deadline.check("get_workout: select exercises")?;
            workout.exercises = tx
                .prepare_cached(
                    "SELECT name, weight, sets, reps FROM exercises
                     WHERE workout_id = ?1 ORDER BY id",
                )
                .and_then(|mut stmt| {
                    let exercises = stmt
                        .query_map([id], Exercise::from_row)?
                        .collect::<rusqlite::Result<Vec<_>>>();
                    exercises
                })
                .map_err(sql_error(deadline, "get_workout: select exercises"))?;

            Ok(workout)
        })
        .await
    }

    async fn delete_workout(&self, id: i64, deadline: Deadline) -> StorageResult<()> {
        let pool = self.pool.clone();
        let busy_timeout = self.busy_timeout;
        run_blocking("delete_workout", move || {
            let mut conn = acquire(&pool, deadline, "delete_workout: acquire connection")?;
            cap_lock_wait(&conn, deadline, busy_timeout, "delete_workout: begin")?;

            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(sql_error(deadline, "delete_workout: begin"))?;

            deadline.check("delete_workout: delete exercises")?;
            let exercises_deleted = tx
                .execute("DELETE FROM exercises WHERE workout_id = ?1", [id])
                .map_err(sql_error(deadline, "delete_workout: delete exercises"))?;

            deadline.check("delete_workout: delete workout")?;
            let workouts_deleted = tx
                .execute("DELETE FROM workouts WHERE id = ?1", [id])
                .map_err(sql_error(deadline, "delete_workout: delete workout"))?;

            if workouts_deleted == 0 {
                return Err(StorageError::NotFound {
                    op: "delete_workout: delete workout",
                    id,
                });
            }

            cap_lock_wait(&tx, deadline, busy_timeout, "delete_workout: commit")?;
            tx.commit()
                .map_err(sql_error(deadline, "delete_workout: commit"))?;

            tracing::debug!(workout_id = id, exercises_deleted, "Deleted workout");
            Ok(())
        })
        .await
    }
}

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response, Router};
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

use workout_tracker::db::{create_memory_pool, DbPool};
use workout_tracker::error::{StorageError, StorageResult};
use workout_tracker::handlers::workouts::WorkoutsState;
use workout_tracker::models::{Exercise, NewWorkout, Workout};
use workout_tracker::repositories::{Deadline, WorkoutRepository, WorkoutService};
use workout_tracker::schema::ensure_schema;

pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

pub fn setup_test_db() -> DbPool {
    let pool = create_memory_pool().expect("Failed to create test database");
    ensure_schema(&pool).expect("Failed to create schema");
    pool
}

pub fn create_test_app(pool: DbPool) -> Router {
    create_test_app_with_service(Arc::new(WorkoutRepository::new(pool)))
}

pub fn create_test_app_with_service(service: Arc<dyn WorkoutService>) -> Router {
    workout_tracker::routes::create_router(WorkoutsState::new(service, TEST_TIMEOUT))
}

pub fn deadline() -> Deadline {
    Deadline::after(TEST_TIMEOUT)
}

pub fn squat() -> Exercise {
    Exercise {
        name: "squat".to_string(),
        weight: 100.0,
        sets: 3,
        reps: 5,
    }
}

pub fn new_workout(exercises: Vec<Exercise>) -> NewWorkout {
    NewWorkout {
        user_id: 1,
        date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        exercises,
    }
}

pub fn count_rows(pool: &DbPool, table: &str) -> i64 {
    let conn = pool.get().unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// What the fake does when called.
#[derive(Clone, Copy)]
pub enum FakeBehaviour {
    Normal,
    FailStorage,
    TimeOut,
}

/// In-memory stand-in for the SQLite repository.
pub struct FakeWorkoutService {
    workouts: Mutex<HashMap<i64, Workout>>,
    next_id: AtomicI64,
    behaviour: FakeBehaviour,
    calls: Mutex<Vec<String>>,
}

impl FakeWorkoutService {
    pub fn new() -> Self {
        Self::with_behaviour(FakeBehaviour::Normal)
    }

    pub fn with_behaviour(behaviour: FakeBehaviour) -> Self {
        Self {
            workouts: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            behaviour,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &'static str) -> StorageResult<()> {
        self.calls.lock().unwrap().push(op.to_string());
        match self.behaviour {
            FakeBehaviour::Normal => Ok(()),
            FakeBehaviour::FailStorage => Err(StorageError::Task {
                op,
                message: "disk on fire: /var/lib/secret.db".to_string(),
            }),
            FakeBehaviour::TimeOut => Err(StorageError::Timeout { op }),
        }
    }
}

#[async_trait]
impl WorkoutService for FakeWorkoutService {
    async fn save_workout(&self, workout: NewWorkout, _deadline: Deadline) -> StorageResult<i64> {
        self.record("save_workout")?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.workouts.lock().unwrap().insert(
            id,
            Workout {
                id,
                user_id: workout.user_id,
                date: workout.date,
                exercises: workout.exercises,
            },
        );
        Ok(id)
    }

    async fn get_workout(&self, id: i64, _deadline: Deadline) -> StorageResult<Workout> {
        self.record("get_workout")?;
        self.workouts
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound {
                op: "get_workout",
                id,
            })
    }

    async fn delete_workout(&self, id: i64, _deadline: Deadline) -> StorageResult<()> {
        self.record("delete_workout")?;
        self.workouts
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound {
                op: "delete_workout",
                id,
            })
    }
}

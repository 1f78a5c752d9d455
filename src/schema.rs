//! Embedded database schema
//!
//! Every statement is `CREATE ... IF NOT EXISTS`, so the whole set is applied
//! on each start. Nothing here alters or drops existing tables.

use crate::db::DbPool;

/// Schema files in dependency order, each as (filename, sql_content)
pub const SCHEMA: &[(&str, &str)] = &[
    (
        "001_create_users.sql",
        include_str!("../migrations/001_create_users.sql"),
    ),
    (
        "002_create_workouts.sql",
        include_str!("../migrations/002_create_workouts.sql"),
    ),
    (
        "003_create_exercises.sql",
        include_str!("../migrations/003_create_exercises.sql"),
    ),
];

/// Make sure the users, workouts and exercises tables exist.
pub fn ensure_schema(pool: &DbPool) -> anyhow::Result<()> {
    tracing::info!("Ensuring database schema...");

    let conn = pool.get()?;

    for (filename, sql) in SCHEMA {
        tracing::debug!("Applying schema file: {}", filename);
        conn.execute_batch(sql)?;
    }

    tracing::info!("Schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;

    fn table_names(pool: &DbPool) -> Vec<String> {
        let conn = pool.get().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                 ORDER BY name",
            )
            .unwrap();
        let names = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<String>>>()
            .unwrap();
        names
    }

    #[test]
    fn creates_all_tables() {
        let pool = create_memory_pool().unwrap();
        ensure_schema(&pool).unwrap();

        assert_eq!(table_names(&pool), vec!["exercises", "users", "workouts"]);
    }

    #[test]
    fn is_idempotent_and_keeps_rows() {
        let pool = create_memory_pool().unwrap();
        ensure_schema(&pool).unwrap();

        pool.get()
            .unwrap()
            .execute(
                "INSERT INTO workouts (user_id, date) VALUES (1, '2024-01-01 00:00:00+00:00')",
                [],
            )
            .unwrap();

        ensure_schema(&pool).unwrap();

        let count: i64 = pool
            .get()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM workouts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn exercise_requires_existing_workout() {
        let pool = create_memory_pool().unwrap();
        ensure_schema(&pool).unwrap();

        let result = pool.get().unwrap().execute(
            "INSERT INTO exercises (workout_id, name, weight, sets, reps) VALUES (42, 'squat', 100.0, 3, 5)",
            [],
        );
        assert!(result.is_err());
    }
}

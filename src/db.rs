use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use std::time::Duration;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn create_pool(
    database_url: &str,
    max_size: u32,
    busy_timeout: Duration,
) -> Result<DbPool, r2d2::Error> {
    let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);
    // Remove query parameters (e.g., ?mode=rwc)
    let path = path.split('?').next().unwrap_or(path);

    let manager = if path == ":memory:" {
        SqliteConnectionManager::memory()
    } else {
        SqliteConnectionManager::file(Path::new(path))
    };

    // Every :memory: connection is its own database
    let max_size = if path == ":memory:" { 1 } else { max_size };

    Pool::builder()
        .max_size(max_size)
        .build(with_connection_init(manager, busy_timeout))
}

pub fn create_memory_pool() -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::memory();
    Pool::builder()
        .max_size(1)
        .build(with_connection_init(manager, DEFAULT_BUSY_TIMEOUT))
}

fn with_connection_init(
    manager: SqliteConnectionManager,
    busy_timeout: Duration,
) -> SqliteConnectionManager {
    manager.with_init(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
    })
}

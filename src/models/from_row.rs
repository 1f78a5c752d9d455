use rusqlite::Row;

/// Build a model from a row selected by name, not by position.
pub trait FromSqliteRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

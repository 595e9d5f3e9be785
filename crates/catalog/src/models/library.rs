use crate::error::Error;
use crate::models::timestamp;
use std::path::PathBuf;
use time::UtcDateTime;

/// A root directory whose immediate subdirectories are series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    pub id: i64,
    /// Unique display name
    pub name: String,
    /// Unique absolute root path
    pub path: PathBuf,
    pub created_at: UtcDateTime,
}

#[derive(sqlx::FromRow)]
pub(crate) struct LibraryRow {
    id: i64,
    name: String,
    path: String,
    created_at: i64,
}
impl TryFrom<LibraryRow> for Library {
    type Error = Error;
    fn try_from(row: LibraryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            path: PathBuf::from(row.path),
            created_at: timestamp(row.created_at)?,
        })
    }
}

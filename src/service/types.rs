use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Failures reported by a record service backend.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Another instance of the application has locked the database
    #[error("Another instance of taskflow appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status from the hosted service
    #[error("Service returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The service answered but reported the operation as failed
    #[error("Service rejected the request: {0}")]
    Rejected(String),

    #[error("Malformed record: {0}")]
    Malformed(String),

    #[error("Record {id} not found in {collection}")]
    NotFound { collection: Collection, id: String },

    #[error("Invalid service endpoint: {0}")]
    InvalidEndpoint(String),
}

impl ServiceError {
    /// Map a sqlx error, recognizing SQLite lock conditions.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5), SQLITE_LOCKED (6), SQLITE_CANTOPEN (14)
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return ServiceError::InstanceLocked;
        }

        ServiceError::Database(err)
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Malformed(err.to_string())
    }
}

// ============================================================================
// Records
// ============================================================================

/// Logical record collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Tasks,
    Categories,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Tasks => "tasks",
            Collection::Categories => "categories",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat field map exchanged with the service.
pub type Fields = Map<String, Value>;

/// A stored record: an opaque id plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub fields: Fields,
}

impl Record {
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Paging and ordering for a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchQuery {
    pub limit: u32,
    pub offset: u32,
    /// Field to order by, ascending. `None` keeps insertion order.
    pub order_by: Option<String>,
}

impl Default for FetchQuery {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
            order_by: None,
        }
    }
}

impl FetchQuery {
    pub fn ordered_by(field: &str, limit: u32) -> Self {
        Self {
            limit,
            offset: 0,
            order_by: Some(field.to_string()),
        }
    }
}

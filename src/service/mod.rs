//! Record service: opaque CRUD over the `tasks` and `categories` collections.
//!
//! The rest of the crate only talks to [`RecordService`]. Two backends exist:
//!
//! - [`SqliteService`] keeps records in a local SQLite file
//! - [`HttpService`] talks JSON to a hosted record service
//!
//! Records are flat key/value maps. Mapping them to domain types lives in
//! [`codec`].

pub mod codec;
mod http;
mod sqlite;
mod types;

pub use http::HttpService;
pub use sqlite::SqliteService;
pub use types::{Collection, FetchQuery, Fields, Record, ServiceError};

use async_trait::async_trait;

/// Asynchronous CRUD over record collections.
///
/// Implementations must be cheap to share (`Arc<dyn RecordService>`); every
/// call is independent and none are retried.
#[async_trait]
pub trait RecordService: Send + Sync {
    /// Fetch a page of records ordered by `query.order_by` (ascending).
    async fn fetch_records(
        &self,
        collection: Collection,
        query: &FetchQuery,
    ) -> Result<Vec<Record>, ServiceError>;

    /// Fetch one record. `Ok(None)` when it does not exist.
    async fn get_record(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Record>, ServiceError>;

    /// Create a record; the service assigns the id.
    async fn create_record(
        &self,
        collection: Collection,
        fields: Fields,
    ) -> Result<Record, ServiceError>;

    /// Merge `fields` into an existing record.
    ///
    /// Returns [`ServiceError::NotFound`] when the record is absent.
    async fn update_record(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<Record, ServiceError>;

    /// Delete records by id, returning the ids the service confirmed removed.
    ///
    /// Ids that did not exist are left out. A call where the service refused
    /// every deletion fails with [`ServiceError::Rejected`].
    async fn delete_records(
        &self,
        collection: Collection,
        ids: &[String],
    ) -> Result<Vec<String>, ServiceError>;
}

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;

use super::types::{Collection, FetchQuery, Fields, Record, ServiceError};
use super::RecordService;

// ============================================================================
// SQLite Record Service
// ============================================================================

/// Local record service backed by a single SQLite `records` table.
///
/// Each row holds one record of one collection; fields are stored as a JSON
/// object. `CreatedOn` / `ModifiedOn` are maintained by the service and
/// merged into the returned field map, mirroring the hosted backend.
#[derive(Clone)]
pub struct SqliteService {
    pub(crate) pool: SqlitePool,
}

/// Row type for record queries
type RecordRow = (i64, String, String, String);

impl SqliteService {
    /// Open a database and run migrations.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InstanceLocked` if another instance holds the
    /// database lock, `ServiceError::Migration` if the schema cannot be set up.
    pub async fn open(path: &str) -> Result<Self, ServiceError> {
        let url = format!("sqlite:{}?mode=rwc", path);

        // Restrict the database file to the current user before the pool
        // creates it with default umask permissions.
        #[cfg(unix)]
        if path != ":memory:" {
            use std::os::unix::fs::OpenOptionsExt;
            use std::os::unix::fs::PermissionsExt;
            let db_path = std::path::Path::new(path);
            if db_path.exists() {
                let perms = std::fs::Permissions::from_mode(0o600);
                if let Err(e) = std::fs::set_permissions(path, perms) {
                    tracing::warn!(path = %path, error = %e, "Failed to set database file permissions");
                }
            } else if db_path.parent().is_some_and(|p| p.as_os_str().is_empty() || p.exists()) {
                // If creation fails, SQLite reports the error at connect time.
                let _file = std::fs::OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .mode(0o600)
                    .open(db_path)
                    .ok();
            }
        }

        let options = SqliteConnectOptions::from_str(&url)
            .map_err(ServiceError::from_sqlx)?
            .pragma("busy_timeout", "5000");
        // An in-memory database lives and dies with its connection.
        let max_connections = if path == ":memory:" { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(ServiceError::from_sqlx)?;

        let service = Self { pool };
        service.migrate().await.map_err(|e| match ServiceError::from_sqlx(e) {
            ServiceError::InstanceLocked => ServiceError::InstanceLocked,
            other => ServiceError::Migration(other.to_string()),
        })?;
        tracing::debug!(path = %path, "Opened record database");
        Ok(service)
    }

    /// Create the schema inside one transaction. Idempotent.
    async fn migrate(&self) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                fields TEXT NOT NULL,
                created_on TEXT NOT NULL,
                modified_on TEXT NOT NULL
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_records_collection ON records(collection)")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    #[cfg(test)]
    async fn count(&self, collection: Collection) -> Result<i64, ServiceError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM records WHERE collection = ?")
            .bind(collection.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    fn row_to_record(row: RecordRow) -> Result<Record, ServiceError> {
        let (id, fields, created_on, modified_on) = row;
        let mut fields: Fields = match serde_json::from_str::<Value>(&fields)? {
            Value::Object(map) => map,
            other => {
                return Err(ServiceError::Malformed(format!(
                    "record {} holds {} instead of an object",
                    id, other
                )))
            }
        };
        fields.insert("CreatedOn".into(), Value::from(created_on));
        fields.insert("ModifiedOn".into(), Value::from(modified_on));
        Ok(Record {
            id: id.to_string(),
            fields,
        })
    }

    async fn fetch_row(
        &self,
        collection: Collection,
        id: i64,
    ) -> Result<Option<RecordRow>, ServiceError> {
        let row: Option<RecordRow> = sqlx::query_as(
            "SELECT id, fields, created_on, modified_on FROM records WHERE collection = ? AND id = ?",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

/// Service-maintained keys never persisted in the field blob.
fn strip_service_keys(fields: &mut Fields) {
    for key in ["Id", "id", "CreatedOn", "ModifiedOn"] {
        fields.remove(key);
    }
}

#[async_trait]
impl RecordService for SqliteService {
    async fn fetch_records(
        &self,
        collection: Collection,
        query: &FetchQuery,
    ) -> Result<Vec<Record>, ServiceError> {
        // The order field is bound as a JSON path, never interpolated.
        let order_path = query.order_by.as_deref().map(|f| format!("$.{}", f));
        let rows: Vec<RecordRow> = sqlx::query_as(
            r#"
            SELECT id, fields, created_on, modified_on
            FROM records
            WHERE collection = ?
            ORDER BY CASE WHEN ? IS NULL THEN NULL ELSE json_extract(fields, ?) END ASC, id ASC
            LIMIT ? OFFSET ?
        "#,
        )
        .bind(collection.as_str())
        .bind(order_path.as_deref())
        .bind(order_path.as_deref().unwrap_or("$.id"))
        .bind(i64::from(query.limit))
        .bind(i64::from(query.offset))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn get_record(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Record>, ServiceError> {
        let Ok(row_id) = id.parse::<i64>() else {
            return Ok(None);
        };
        self.fetch_row(collection, row_id)
            .await?
            .map(Self::row_to_record)
            .transpose()
    }

    async fn create_record(
        &self,
        collection: Collection,
        mut fields: Fields,
    ) -> Result<Record, ServiceError> {
        strip_service_keys(&mut fields);
        let now = Utc::now().to_rfc3339();
        let row: RecordRow = sqlx::query_as(
            r#"
            INSERT INTO records (collection, fields, created_on, modified_on)
            VALUES (?, ?, ?, ?)
            RETURNING id, fields, created_on, modified_on
        "#,
        )
        .bind(collection.as_str())
        .bind(serde_json::to_string(&fields)?)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        let record = Self::row_to_record(row)?;
        tracing::debug!(collection = %collection, id = %record.id, "Record created");
        Ok(record)
    }

    async fn update_record(
        &self,
        collection: Collection,
        id: &str,
        mut fields: Fields,
    ) -> Result<Record, ServiceError> {
        let not_found = || ServiceError::NotFound {
            collection,
            id: id.to_string(),
        };
        let row_id = id.parse::<i64>().map_err(|_| not_found())?;

        let mut tx = self.pool.begin().await?;
        let existing: Option<(String,)> =
            sqlx::query_as("SELECT fields FROM records WHERE collection = ? AND id = ?")
                .bind(collection.as_str())
                .bind(row_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((existing,)) = existing else {
            return Err(not_found());
        };

        let mut merged: Fields = serde_json::from_str(&existing)?;
        strip_service_keys(&mut fields);
        merged.extend(fields);

        let row: RecordRow = sqlx::query_as(
            r#"
            UPDATE records SET fields = ?, modified_on = ?
            WHERE collection = ? AND id = ?
            RETURNING id, fields, created_on, modified_on
        "#,
        )
        .bind(serde_json::to_string(&merged)?)
        .bind(Utc::now().to_rfc3339())
        .bind(collection.as_str())
        .bind(row_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Self::row_to_record(row)
    }

    async fn delete_records(
        &self,
        collection: Collection,
        ids: &[String],
    ) -> Result<Vec<String>, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            let Ok(row_id) = id.parse::<i64>() else {
                continue;
            };
            let result = sqlx::query("DELETE FROM records WHERE collection = ? AND id = ?")
                .bind(collection.as_str())
                .bind(row_id)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() > 0 {
                removed.push(id.clone());
            }
        }
        tx.commit().await?;
        tracing::debug!(
            collection = %collection,
            requested = ids.len(),
            removed = removed.len(),
            "Records deleted"
        );
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn test_service() -> SqliteService {
        SqliteService::open(":memory:").await.unwrap()
    }

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_service_fields() {
        let svc = test_service().await;
        let rec = svc
            .create_record(Collection::Tasks, fields(json!({"title": "A"})))
            .await
            .unwrap();
        assert!(!rec.id.is_empty());
        assert_eq!(rec.fields["title"], json!("A"));
        assert!(rec.fields.contains_key("CreatedOn"));
        assert!(rec.fields.contains_key("ModifiedOn"));
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let svc = test_service().await;
        svc.create_record(Collection::Tasks, fields(json!({"title": "A"})))
            .await
            .unwrap();
        svc.create_record(Collection::Categories, fields(json!({"Name": "Work"})))
            .await
            .unwrap();

        let tasks = svc
            .fetch_records(Collection::Tasks, &FetchQuery::default())
            .await
            .unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(svc.count(Collection::Categories).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_fetch_orders_by_field_then_id() {
        let svc = test_service().await;
        for (title, due) in [("c", "2024-03-01"), ("a", "2024-01-01"), ("b", "2024-03-01")] {
            svc.create_record(
                Collection::Tasks,
                fields(json!({"title": title, "due_date": due})),
            )
            .await
            .unwrap();
        }

        let recs = svc
            .fetch_records(Collection::Tasks, &FetchQuery::ordered_by("due_date", 100))
            .await
            .unwrap();
        let titles: Vec<&str> = recs.iter().filter_map(|r| r.str_field("title")).collect();
        assert_eq!(titles, vec!["a", "c", "b"]);
    }

    #[tokio::test]
    async fn test_fetch_respects_limit_and_offset() {
        let svc = test_service().await;
        for i in 0..5 {
            svc.create_record(Collection::Tasks, fields(json!({"title": i.to_string()})))
                .await
                .unwrap();
        }
        let query = FetchQuery {
            limit: 2,
            offset: 1,
            order_by: None,
        };
        let recs = svc.fetch_records(Collection::Tasks, &query).await.unwrap();
        let titles: Vec<&str> = recs.iter().filter_map(|r| r.str_field("title")).collect();
        assert_eq!(titles, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let svc = test_service().await;
        let rec = svc
            .create_record(
                Collection::Tasks,
                fields(json!({"title": "A", "description": "keep"})),
            )
            .await
            .unwrap();

        let updated = svc
            .update_record(Collection::Tasks, &rec.id, fields(json!({"title": "B"})))
            .await
            .unwrap();
        assert_eq!(updated.id, rec.id);
        assert_eq!(updated.fields["title"], json!("B"));
        assert_eq!(updated.fields["description"], json!("keep"));
        assert_eq!(updated.fields["CreatedOn"], rec.fields["CreatedOn"]);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let svc = test_service().await;
        let err = svc
            .update_record(Collection::Tasks, "999", Fields::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));

        let err = svc
            .update_record(Collection::Tasks, "not-a-number", Fields::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_respects_collection() {
        let svc = test_service().await;
        let rec = svc
            .create_record(Collection::Tasks, fields(json!({"title": "A"})))
            .await
            .unwrap();

        assert!(svc
            .get_record(Collection::Tasks, &rec.id)
            .await
            .unwrap()
            .is_some());
        assert!(svc
            .get_record(Collection::Categories, &rec.id)
            .await
            .unwrap()
            .is_none());
        assert!(svc
            .get_record(Collection::Tasks, "default-1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_reports_only_existing() {
        let svc = test_service().await;
        let a = svc
            .create_record(Collection::Tasks, fields(json!({"title": "A"})))
            .await
            .unwrap();
        let b = svc
            .create_record(Collection::Tasks, fields(json!({"title": "B"})))
            .await
            .unwrap();

        let removed = svc
            .delete_records(
                Collection::Tasks,
                &[a.id.clone(), b.id.clone(), "999".to_string(), "x".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(removed, vec![a.id, b.id]);
        assert_eq!(svc.count(Collection::Tasks).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_service_keys_are_not_persisted() {
        let svc = test_service().await;
        let rec = svc
            .create_record(
                Collection::Tasks,
                fields(json!({"title": "A", "Id": 5, "CreatedOn": "bogus"})),
            )
            .await
            .unwrap();
        assert_ne!(rec.fields["CreatedOn"], json!("bogus"));
        assert!(!rec.fields.contains_key("Id"));
    }
}

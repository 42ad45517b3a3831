use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::codec::id_from_value;
use super::types::{Collection, FetchQuery, Fields, Record, ServiceError};
use super::RecordService;

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct QueryBody<'a> {
    limit: u32,
    offset: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_by: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct RecordsBody {
    records: Vec<Fields>,
}

#[derive(Debug, Serialize)]
struct DeleteBody<'a> {
    record_ids: &'a [String],
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Envelope {
    success: Option<bool>,
    message: Option<String>,
    data: Option<Value>,
    results: Option<Vec<ResultEntry>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResultEntry {
    success: bool,
    message: Option<String>,
    data: Option<Value>,
}

// ============================================================================
// HTTP Record Service
// ============================================================================

/// Record service backed by a hosted JSON API.
///
/// Every request carries the project id and the public key as a bearer token.
/// No request timeout and no retries are applied.
#[derive(Clone)]
pub struct HttpService {
    client: reqwest::Client,
    base: Url,
    project_id: String,
    public_key: SecretString,
}

impl std::fmt::Debug for HttpService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpService")
            .field("base", &self.base.as_str())
            .field("project_id", &self.project_id)
            .field("public_key", &"[REDACTED]")
            .finish()
    }
}

impl HttpService {
    /// Build a client for `endpoint` (must be `http` or `https`).
    pub fn new(
        endpoint: &str,
        project_id: impl Into<String>,
        public_key: SecretString,
    ) -> Result<Self, ServiceError> {
        let mut base = Url::parse(endpoint)
            .map_err(|e| ServiceError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ServiceError::InvalidEndpoint(format!(
                "unsupported scheme '{}'",
                base.scheme()
            )));
        }
        // Url::join replaces the last segment unless the path ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("taskflow/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base,
            project_id: project_id.into(),
            public_key,
        })
    }

    fn url(&self, collection: Collection, tail: &str) -> Result<Url, ServiceError> {
        self.base
            .join(&format!("v1/{}/{}", collection.as_str(), tail))
            .map_err(|e| ServiceError::InvalidEndpoint(e.to_string()))
    }

    /// `v1/{collection}/records/{id}` with `id` percent-encoded as one segment.
    fn record_url(&self, collection: Collection, id: &str) -> Result<Url, ServiceError> {
        let mut url = self.url(collection, "records/")?;
        url.path_segments_mut()
            .map_err(|_| ServiceError::InvalidEndpoint(self.base.to_string()))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("X-Project-Id", &self.project_id)
            .bearer_auth(self.public_key.expose_secret())
    }

    /// Send a request and decode the envelope, mapping HTTP and envelope failures.
    async fn send(&self, builder: RequestBuilder) -> Result<Envelope, ServiceError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Envelope>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or(body);
            return Err(ServiceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope = response.json().await?;
        if envelope.success == Some(false) {
            return Err(ServiceError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "operation failed".to_string()),
            ));
        }
        Ok(envelope)
    }

    /// First result of a create/update call, which must report success.
    fn single_result(envelope: Envelope, op: &str) -> Result<Record, ServiceError> {
        let entry = envelope
            .results
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| ServiceError::Rejected(format!("Failed to {}: empty result", op)))?;
        if !entry.success {
            return Err(ServiceError::Rejected(
                entry
                    .message
                    .unwrap_or_else(|| format!("Failed to {}", op)),
            ));
        }
        entry
            .data
            .ok_or_else(|| ServiceError::Malformed(format!("{} result without data", op)))
            .and_then(value_to_record)
    }
}

/// Split a wire object into its id and remaining fields.
fn value_to_record(value: Value) -> Result<Record, ServiceError> {
    let Value::Object(mut fields) = value else {
        return Err(ServiceError::Malformed("record is not an object".to_string()));
    };
    let id = fields
        .remove("Id")
        .or_else(|| fields.remove("id"))
        .as_ref()
        .and_then(id_from_value)
        .ok_or_else(|| ServiceError::Malformed("record without Id".to_string()))?;
    Ok(Record { id, fields })
}

#[async_trait]
impl RecordService for HttpService {
    async fn fetch_records(
        &self,
        collection: Collection,
        query: &FetchQuery,
    ) -> Result<Vec<Record>, ServiceError> {
        let body = QueryBody {
            limit: query.limit,
            offset: query.offset,
            order_by: query.order_by.as_deref(),
        };
        let envelope = self
            .send(
                self.request(Method::POST, self.url(collection, "query")?)
                    .json(&body),
            )
            .await?;

        match envelope.data {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items.into_iter().map(value_to_record).collect(),
            Some(other) => Err(ServiceError::Malformed(format!(
                "expected a list of records, got {}",
                other
            ))),
        }
    }

    async fn get_record(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Record>, ServiceError> {
        let url = self.record_url(collection, id)?;
        match self.send(self.request(Method::GET, url)).await {
            Ok(envelope) => envelope.data.map(value_to_record).transpose(),
            Err(ServiceError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn create_record(
        &self,
        collection: Collection,
        fields: Fields,
    ) -> Result<Record, ServiceError> {
        let body = RecordsBody {
            records: vec![fields],
        };
        let envelope = self
            .send(
                self.request(Method::POST, self.url(collection, "records")?)
                    .json(&body),
            )
            .await?;
        let record = Self::single_result(envelope, "create record")?;
        tracing::debug!(collection = %collection, id = %record.id, "Remote record created");
        Ok(record)
    }

    async fn update_record(
        &self,
        collection: Collection,
        id: &str,
        mut fields: Fields,
    ) -> Result<Record, ServiceError> {
        fields.insert("Id".into(), id.parse::<i64>().map(Value::from).unwrap_or_else(|_| Value::from(id)));
        let body = RecordsBody {
            records: vec![fields],
        };
        let result = self
            .send(
                self.request(Method::PATCH, self.url(collection, "records")?)
                    .json(&body),
            )
            .await;

        match result {
            Ok(envelope) => Self::single_result(envelope, "update record"),
            Err(ServiceError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(ServiceError::NotFound {
                    collection,
                    id: id.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn delete_records(
        &self,
        collection: Collection,
        ids: &[String],
    ) -> Result<Vec<String>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let envelope = self
            .send(
                self.request(Method::DELETE, self.url(collection, "records")?)
                    .json(&DeleteBody { record_ids: ids }),
            )
            .await?;
        let results = envelope.results.ok_or_else(|| {
            ServiceError::Rejected("Failed to delete records: empty result".to_string())
        })?;

        // Results are positional: entry N reports on ids[N].
        let mut deleted = Vec::with_capacity(ids.len());
        let mut refusal: Option<String> = None;
        for (id, entry) in ids.iter().zip(results) {
            if entry.success {
                deleted.push(id.clone());
            } else {
                tracing::warn!(
                    collection = %collection,
                    id = %id,
                    message = entry.message.as_deref().unwrap_or(""),
                    "Remote delete refused"
                );
                if refusal.is_none() {
                    refusal = entry.message;
                }
            }
        }
        if deleted.is_empty() {
            return Err(ServiceError::Rejected(
                refusal.unwrap_or_else(|| "Failed to delete records".to_string()),
            ));
        }
        Ok(deleted)
    }
}

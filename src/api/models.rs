//! Request and response bodies of the AlphaBase REST API.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Items of one collection, keyed by item key.
pub type Items = Map<String, Value>;

/// Body of POST /auth/login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Body of POST /auth/register.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Response from the login and register endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Response from GET /auth/me.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<chrono::NaiveDateTime>,
}

/// Response from GET /data/collections.
///
/// Older servers do not implement the endpoint at all, so every field is
/// optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub collections: Option<Vec<String>>,
}

/// Response from GET /data/list/{collection}.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub items: Items,
}

/// Body of POST /data/set.
#[derive(Debug, Clone, Serialize)]
pub struct SetRequest<'a> {
    pub collection: &'a str,
    pub key: &'a str,
    pub value: &'a Value,
}

/// Response from POST /data/set and DELETE /data/delete.
#[derive(Debug, Clone, Deserialize)]
pub struct MutationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response from GET /data/get/{collection}/{key}.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItemResponse {
    #[serde(default)]
    pub success: bool,
    pub collection: String,
    pub key: String,
    pub data: Value,
    #[serde(default)]
    pub owner: Option<String>,
}

/// Filters for GET /data/query/{collection}.
///
/// `where_clause` uses the server's `field==value` syntax.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub where_clause: Option<String>,
    pub order_by: Option<String>,
    pub limit: Option<u32>,
    pub start_after: Option<String>,
}

impl QueryOptions {
    /// Create empty query options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter with a `field==value` style clause.
    pub fn filter(mut self, clause: impl Into<String>) -> Self {
        self.where_clause = Some(clause.into());
        self
    }

    /// Order by a field (prefix with `-` for descending).
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    /// Limit the number of results.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Start after the given key.
    pub fn start_after(mut self, key: impl Into<String>) -> Self {
        self.start_after = Some(key.into());
        self
    }

    /// Encoded query string, without the leading `?`.
    pub fn to_query_string(&self) -> String {
        let limit = self.limit.map(|l| l.to_string());
        [
            ("where", self.where_clause.as_deref()),
            ("orderBy", self.order_by.as_deref()),
            ("limit", limit.as_deref()),
            ("startAfter", self.start_after.as_deref()),
        ]
        .iter()
        .filter_map(|(name, value)| {
            value.map(|v| format!("{}={}", name, urlencoding::encode(v)))
        })
        .collect::<Vec<_>>()
        .join("&")
    }
}

/// One row of a query result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryRow {
    pub key: String,
    pub data: Value,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub created_at: Option<chrono::NaiveDateTime>,
}

/// Response from GET /data/query/{collection}.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub items: Items,
    #[serde(default)]
    pub results: Vec<QueryRow>,
}

/// Response from POST /storage/upload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    pub file_id: String,
    pub filename: String,
    pub file_size: u64,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    pub download_url: String,
}

/// Metadata of one stored file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoredFile {
    pub file_id: String,
    pub filename: String,
    pub file_size: u64,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub created_at: Option<chrono::NaiveDateTime>,
    pub download_url: String,
}

/// Response from GET /storage/files.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub files: Vec<StoredFile>,
    #[serde(default)]
    pub count: usize,
}

/// A downloaded file body.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub contents: Bytes,
    pub content_type: Option<String>,
}

/// Response from GET /system/status.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SystemStatus {
    #[serde(default)]
    pub websocket_clients: u32,
    #[serde(default)]
    pub mqtt_connected: bool,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Response from GET /.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

/// FastAPI-style error body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: Value,
}

/// One entry of the `presses` collection, newest first when listed.
#[derive(Debug, Clone, PartialEq)]
pub struct PressEvent {
    pub key: String,
    pub timestamp: f64,
    pub data: Value,
}

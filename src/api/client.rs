//! REST client for the AlphaBase backend.

use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::models::{
    CollectionsResponse, DownloadedFile, ErrorBody, FilesResponse, ItemResponse, ListResponse,
    LoginRequest, MutationResponse, PressEvent, QueryOptions, QueryResponse, RegisterRequest,
    ServerInfo, SetRequest, StoredFile, SystemStatus, TokenResponse, UploadResponse, UserProfile,
};
use crate::error::{ConsoleError, ConsoleResult};
use crate::session::{BearerToken, Session};
use crate::traits::{FilePart, Headers, HttpClient, MultipartForm, Response};

/// Client for the AlphaBase REST surface.
///
/// The client holds no credential of its own: every authenticated call takes
/// the [`Session`] to act for, and fails with `Unauthenticated` before any
/// request is sent if the session has no token.
///
/// # Example
///
/// ```ignore
/// let api = ApiClient::new("http://localhost:8000", Arc::new(ReqwestHttpClient::new()));
/// let session = api.login("alice", "pw").await?;
/// api.set(&session, "sensors", "k1", &json!({"temp": 21.5})).await?;
/// ```
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: Arc<dyn HttpClient>,
}

impl ApiClient {
    /// Create a client rooted at `base_url`.
    pub fn new(base_url: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    /// The backend root.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(session: &Session) -> ConsoleResult<Headers> {
        let token = session.require_credential()?;
        let mut headers = Headers::new();
        headers.insert("Authorization".to_string(), token.header_value());
        Ok(headers)
    }

    fn json_headers(mut headers: Headers) -> Headers {
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers
    }

    // ------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------

    /// Sign in and return the resulting session.
    ///
    /// POST /auth/login
    pub async fn login(&self, username: &str, password: &str) -> ConsoleResult<Session> {
        let body = serde_json::to_string(&LoginRequest { username, password })?;
        let response = self
            .http
            .post(
                &self.url("/auth/login"),
                &body,
                &Self::json_headers(Headers::new()),
            )
            .await?;
        self.session_from_token_response(response, username, "login")
    }

    /// Create an account and return the resulting session.
    ///
    /// POST /auth/register
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> ConsoleResult<Session> {
        let body = serde_json::to_string(&RegisterRequest {
            username,
            email,
            password,
        })?;
        let response = self
            .http
            .post(
                &self.url("/auth/register"),
                &body,
                &Self::json_headers(Headers::new()),
            )
            .await?;
        self.session_from_token_response(response, username, "register")
    }

    fn session_from_token_response(
        &self,
        response: Response,
        username: &str,
        context: &str,
    ) -> ConsoleResult<Session> {
        if !response.is_success() {
            let message = error_message(&response);
            warn!("{} for '{}' refused ({}): {}", context, username, response.status, message);
            return match response.status {
                400 | 401 | 403 | 422 => Err(ConsoleError::InvalidCredentials(message)),
                status => Err(ConsoleError::Api { status, message }),
            };
        }
        let token: TokenResponse = decode(&response, context)?;
        debug!("{} succeeded for '{}'", context, username);
        Ok(Session::authenticated(
            BearerToken::new(token.access_token),
            username,
        ))
    }

    /// Profile of the signed-in user.
    ///
    /// GET /auth/me
    pub async fn current_user(&self, session: &Session) -> ConsoleResult<UserProfile> {
        let headers = Self::auth_headers(session)?;
        let response = self.http.get(&self.url("/auth/me"), &headers).await?;
        decode(&check(response)?, "current user")
    }

    // ------------------------------------------------------------------
    // Data
    // ------------------------------------------------------------------

    /// Server-reported collection names.
    ///
    /// GET /data/collections. Returns an empty list when the server answers
    /// without a `success` flag or without a list.
    pub async fn collection_names(&self, session: &Session) -> ConsoleResult<Vec<String>> {
        let headers = Self::auth_headers(session)?;
        let response = self
            .http
            .get(&self.url("/data/collections"), &headers)
            .await?;
        let parsed: CollectionsResponse = decode(&check(response)?, "collections")?;
        if !parsed.success {
            return Ok(Vec::new());
        }
        Ok(parsed.collections.unwrap_or_default())
    }

    /// All items of one collection.
    ///
    /// GET /data/list/{collection}
    pub async fn list(&self, session: &Session, collection: &str) -> ConsoleResult<ListResponse> {
        let headers = Self::auth_headers(session)?;
        let url = self.url(&format!("/data/list/{}", segment(collection)));
        let response = self.http.get(&url, &headers).await?;
        decode(&check(response)?, "list")
    }

    /// One item.
    ///
    /// GET /data/get/{collection}/{key}
    pub async fn get(
        &self,
        session: &Session,
        collection: &str,
        key: &str,
    ) -> ConsoleResult<ItemResponse> {
        let headers = Self::auth_headers(session)?;
        let url = self.url(&format!(
            "/data/get/{}/{}",
            segment(collection),
            segment(key)
        ));
        let response = self.http.get(&url, &headers).await?;
        decode(&check(response)?, "get")
    }

    /// Create or overwrite an item.
    ///
    /// POST /data/set
    pub async fn set(
        &self,
        session: &Session,
        collection: &str,
        key: &str,
        value: &Value,
    ) -> ConsoleResult<MutationResponse> {
        let headers = Self::json_headers(Self::auth_headers(session)?);
        let body = serde_json::to_string(&SetRequest {
            collection,
            key,
            value,
        })?;
        let response = self
            .http
            .post(&self.url("/data/set"), &body, &headers)
            .await?;
        decode(&check(response)?, "set")
    }

    /// Delete an item.
    ///
    /// DELETE /data/delete/{collection}/{key}
    pub async fn delete(
        &self,
        session: &Session,
        collection: &str,
        key: &str,
    ) -> ConsoleResult<MutationResponse> {
        let headers = Self::auth_headers(session)?;
        let url = self.url(&format!(
            "/data/delete/{}/{}",
            segment(collection),
            segment(key)
        ));
        let response = self.http.delete(&url, &headers).await?;
        decode(&check(response)?, "delete")
    }

    /// Filtered, ordered listing.
    ///
    /// GET /data/query/{collection}?where=&orderBy=&limit=&startAfter=
    pub async fn query(
        &self,
        session: &Session,
        collection: &str,
        options: &QueryOptions,
    ) -> ConsoleResult<QueryResponse> {
        let headers = Self::auth_headers(session)?;
        let mut url = self.url(&format!("/data/query/{}", segment(collection)));
        let query = options.to_query_string();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        let response = self.http.get(&url, &headers).await?;
        decode(&check(response)?, "query")
    }

    /// Entries of the `presses` collection, newest first.
    ///
    /// Entries without a numeric `timestamp` sort last.
    pub async fn press_events(&self, session: &Session) -> ConsoleResult<Vec<PressEvent>> {
        let listing = self.list(session, "presses").await?;
        let mut events: Vec<PressEvent> = listing
            .items
            .into_iter()
            .map(|(key, data)| PressEvent {
                timestamp: data
                    .get("timestamp")
                    .and_then(Value::as_f64)
                    .unwrap_or(f64::MIN),
                key,
                data,
            })
            .collect();
        events.sort_by(|a, b| b.timestamp.total_cmp(&a.timestamp));
        Ok(events)
    }

    // ------------------------------------------------------------------
    // Storage
    // ------------------------------------------------------------------

    /// Upload a file.
    ///
    /// POST /storage/upload (multipart: `file`, `is_public`)
    pub async fn upload_file(
        &self,
        session: &Session,
        filename: &str,
        contents: Bytes,
        mime_type: Option<&str>,
        is_public: bool,
    ) -> ConsoleResult<UploadResponse> {
        let headers = Self::auth_headers(session)?;
        let form = MultipartForm::new()
            .text("is_public", is_public.to_string())
            .file(FilePart {
                field: "file".to_string(),
                filename: filename.to_string(),
                mime_type: mime_type.map(str::to_string),
                contents,
            });
        let response = self
            .http
            .post_multipart(&self.url("/storage/upload"), form, &headers)
            .await?;
        decode(&check(response)?, "upload")
    }

    /// Download a file's contents.
    ///
    /// GET /storage/download/{id}
    pub async fn download_file(
        &self,
        session: &Session,
        file_id: &str,
    ) -> ConsoleResult<DownloadedFile> {
        let headers = Self::auth_headers(session)?;
        let response = self.http.get(&self.file_url(file_id), &headers).await?;
        let response = check(response)?;
        Ok(DownloadedFile {
            content_type: response.header("content-type").map(str::to_string),
            contents: response.body,
        })
    }

    /// Files owned by the signed-in user.
    ///
    /// GET /storage/files
    pub async fn list_files(&self, session: &Session) -> ConsoleResult<Vec<StoredFile>> {
        let headers = Self::auth_headers(session)?;
        let response = self.http.get(&self.url("/storage/files"), &headers).await?;
        let parsed: FilesResponse = decode(&check(response)?, "files")?;
        Ok(parsed.files)
    }

    /// Delete a stored file.
    ///
    /// DELETE /storage/delete/{id}
    pub async fn delete_file(
        &self,
        session: &Session,
        file_id: &str,
    ) -> ConsoleResult<MutationResponse> {
        let headers = Self::auth_headers(session)?;
        let url = self.url(&format!("/storage/delete/{}", segment(file_id)));
        let response = self.http.delete(&url, &headers).await?;
        decode(&check(response)?, "delete file")
    }

    /// Absolute download URL of a file.
    pub fn file_url(&self, file_id: &str) -> String {
        self.url(&format!("/storage/download/{}", segment(file_id)))
    }

    // ------------------------------------------------------------------
    // System
    // ------------------------------------------------------------------

    /// Server status counters.
    ///
    /// GET /system/status
    pub async fn system_status(&self, session: &Session) -> ConsoleResult<SystemStatus> {
        let headers = Self::auth_headers(session)?;
        let response = self.http.get(&self.url("/system/status"), &headers).await?;
        decode(&check(response)?, "system status")
    }

    /// Unauthenticated banner, used as a reachability check.
    ///
    /// GET /
    pub async fn server_info(&self) -> ConsoleResult<ServerInfo> {
        let response = self.http.get(&self.url("/"), &Headers::new()).await?;
        decode(&check(response)?, "server info")
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn segment(raw: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(raw)
}

/// Map a non-2xx response to an error; 401 means the credential is gone.
fn check(response: Response) -> ConsoleResult<Response> {
    if response.is_success() {
        return Ok(response);
    }
    if response.status == 401 {
        return Err(ConsoleError::Unauthenticated);
    }
    Err(ConsoleError::Api {
        status: response.status,
        message: error_message(&response),
    })
}

fn decode<T: DeserializeOwned>(response: &Response, context: &str) -> ConsoleResult<T> {
    response.json().map_err(|e| ConsoleError::parse(context, e))
}

/// Extract `detail` from a FastAPI error body, falling back to the raw text.
fn error_message(response: &Response) -> String {
    if let Ok(body) = response.json::<ErrorBody>() {
        return match body.detail {
            Value::String(s) => s,
            other => other.to_string(),
        };
    }
    match response.text() {
        Ok(text) if !text.trim().is_empty() => text.chars().take(200).collect(),
        _ => format!("HTTP {}", response.status),
    }
}

//! AlphaBase REST API: typed client and wire models.

pub mod client;
pub mod models;

pub use client::ApiClient;
pub use models::{
    DownloadedFile, ItemResponse, Items, ListResponse, MutationResponse, PressEvent, QueryOptions,
    QueryResponse, QueryRow, ServerInfo, StoredFile, SystemStatus, UploadResponse, UserProfile,
};

//! Backend access.
//!
//! Every page controller talks to the Docspace backend through [`Backend`], so
//! the interaction logic can run against [`HttpBackend`] or a test double.

pub mod http;

pub use http::HttpBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::PendingFile;

pub const INGEST_PATH: &str = "/api/ingest";
pub const CHAT_PATH: &str = "/api/chat";
pub const LOGIN_PATH: &str = "/auth/login";
pub const SIGNUP_PATH: &str = "/auth/signup";
pub const HEALTH_PATH: &str = "/health";
pub const DOCUMENTS_PATH: &str = "/documents";
pub const DOCUMENT_UPLOAD_PATH: &str = "/documents/upload";

/// `/documents/{id}`, for fetching or deleting one record.
pub fn document_path(id: i64) -> String {
    format!("{}/{}", DOCUMENTS_PATH, id)
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// POST the queued files as repeated multipart `files` fields.
    async fn ingest(&self, files: &[PendingFile]) -> Result<IngestReceipt, ApiError>;

    async fn chat(&self, message: &str) -> Result<ChatReply, ApiError>;

    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, ApiError>;

    /// Any 2xx response counts as success; the body is not inspected.
    async fn signup(&self, registration: &Registration) -> Result<(), ApiError>;

    async fn health(&self) -> Result<(), ApiError>;

    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, ApiError>;

    /// A missing record comes back as [`ApiError::Rejected`].
    async fn get_document(&self, id: i64) -> Result<DocumentRecord, ApiError>;

    async fn delete_document(&self, id: i64) -> Result<(), ApiError>;

    /// POST one file with its department and role; returns the stored record.
    async fn upload_document(
        &self,
        file: &PendingFile,
        tags: &DocumentTags,
    ) -> Result<DocumentRecord, ApiError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub department: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginGrant {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub reply: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IngestReceipt {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub message: &'a str,
}

/// Form fields sent alongside a `/documents/upload` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTags {
    pub department: String,
    pub role: String,
}

/// A stored document as listed by `GET /documents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: i64,
    pub filename: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

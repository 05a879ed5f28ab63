use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{
    document_path, Backend, ChatReply, ChatRequest, Credentials, DocumentRecord, DocumentTags,
    IngestReceipt, LoginGrant, Registration, CHAT_PATH, DOCUMENTS_PATH, DOCUMENT_UPLOAD_PATH,
    HEALTH_PATH, INGEST_PATH, LOGIN_PATH, SIGNUP_PATH,
};
use crate::error::ApiError;
use crate::session::{Session, TokenStore};
use crate::state::PendingFile;

/// reqwest-backed client for the Docspace backend.
///
/// One request per call: no retries and no timeout.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    store: Option<Arc<dyn TokenStore>>,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            store: None,
        }
    }

    /// Attach the stored bearer token to every non-auth request.
    pub fn with_session(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Token stores may hit the filesystem, so the lookup runs on the blocking pool.
    async fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let Some(store) = self.store.clone() else {
            return request;
        };
        match tokio::task::spawn_blocking(move || Session::load(store.as_ref())).await {
            Ok(Ok(Some(session))) => request.bearer_auth(session.access_token),
            Ok(Ok(None)) => request,
            Ok(Err(e)) => {
                warn!("Could not read stored session: {}", e);
                request
            }
            Err(e) => {
                warn!("Session lookup did not complete: {}", e);
                request
            }
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("Backend returned {}: {}", status, body);
            return Err(ApiError::Status { status: status.as_u16(), body });
        }

        Ok(response)
    }

    /// Parse an optional JSON body; anything unreadable becomes the default value.
    async fn lenient<T: DeserializeOwned + Default>(response: Response) -> T {
        match response.text().await {
            Ok(text) if !text.trim().is_empty() => serde_json::from_str(&text).unwrap_or_default(),
            _ => T::default(),
        }
    }

    /// Parse a required JSON body. The document routes answer a missing record
    /// with 200 and `{"error": "..."}`, which becomes [`ApiError::Rejected`].
    async fn checked_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let value: Value = response.json().await?;
        if let Some(message) = value.get("error").and_then(Value::as_str) {
            debug!("Backend rejected request: {}", message);
            return Err(ApiError::Rejected(message.to_string()));
        }
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn file_part(file: &PendingFile) -> Result<Part, ApiError> {
        let bytes = tokio::fs::read(&file.path).await.map_err(|e| ApiError::LocalFile {
            path: file.path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Part::bytes(bytes).file_name(file.name.clone()))
    }

    async fn build_form(files: &[PendingFile]) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for file in files {
            form = form.part("files", Self::file_part(file).await?);
        }
        Ok(form)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn ingest(&self, files: &[PendingFile]) -> Result<IngestReceipt, ApiError> {
        debug!("Uploading {} file(s) to {}", files.len(), INGEST_PATH);
        let form = Self::build_form(files).await?;
        let request = self
            .authorized(self.client.post(self.url(INGEST_PATH)).multipart(form))
            .await;
        let response = self.send(request).await?;
        Ok(Self::lenient(response).await)
    }

    async fn chat(&self, message: &str) -> Result<ChatReply, ApiError> {
        debug!("Sending chat message ({} chars)", message.chars().count());
        let request = self
            .authorized(
                self.client
                    .post(self.url(CHAT_PATH))
                    .json(&ChatRequest { message }),
            )
            .await;
        let response = self.send(request).await?;
        Ok(Self::lenient(response).await)
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, ApiError> {
        debug!("Logging in as {}", credentials.email);
        let request = self.client.post(self.url(LOGIN_PATH)).json(credentials);
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    async fn signup(&self, registration: &Registration) -> Result<(), ApiError> {
        debug!("Registering {}", registration.email);
        let request = self.client.post(self.url(SIGNUP_PATH)).json(registration);
        self.send(request).await?;
        Ok(())
    }

    async fn health(&self) -> Result<(), ApiError> {
        self.send(self.client.get(self.url(HEALTH_PATH))).await?;
        Ok(())
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, ApiError> {
        let request = self.authorized(self.client.get(self.url(DOCUMENTS_PATH))).await;
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    async fn get_document(&self, id: i64) -> Result<DocumentRecord, ApiError> {
        debug!("Fetching document {}", id);
        let request = self.authorized(self.client.get(self.url(&document_path(id)))).await;
        let response = self.send(request).await?;
        Self::checked_json(response).await
    }

    async fn delete_document(&self, id: i64) -> Result<(), ApiError> {
        debug!("Deleting document {}", id);
        let request = self
            .authorized(self.client.delete(self.url(&document_path(id))))
            .await;
        let response = self.send(request).await?;
        let _: Value = Self::checked_json(response).await?;
        Ok(())
    }

    async fn upload_document(
        &self,
        file: &PendingFile,
        tags: &DocumentTags,
    ) -> Result<DocumentRecord, ApiError> {
        debug!("Uploading {} to {}", file.name, DOCUMENT_UPLOAD_PATH);
        let form = Form::new()
            .part("file", Self::file_part(file).await?)
            .text("department", tags.department.clone())
            .text("role", tags.role.clone());
        let request = self
            .authorized(self.client.post(self.url(DOCUMENT_UPLOAD_PATH)).multipart(form))
            .await;
        let response = self.send(request).await?;
        Self::checked_json(response).await
    }
}

//! Dashboard shown after login: the list of stored documents.

use tracing::{info, warn};
use url::form_urlencoded;

use crate::api::{Backend, DocumentRecord, DocumentTags};
use crate::document::TITLE_PARAM;
use crate::error::ApiError;
use crate::state::{PendingFile, StatusLine};

pub trait DashboardView {
    fn render_documents(&mut self, documents: &[DocumentRecord]);
    fn show_status(&mut self, status: StatusLine);
}

/// Link that opens the document view for a record.
pub fn document_link(record: &DocumentRecord) -> String {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair(TITLE_PARAM, &record.filename)
        .append_pair("id", &record.id.to_string())
        .finish();
    format!("document?{}", query)
}

#[derive(Debug, Default)]
pub struct Dashboard {
    documents: Vec<DocumentRecord>,
    loading: bool,
    deleting: Option<i64>,
    uploading: bool,
}

fn failure_message(err: &ApiError) -> String {
    if err.is_transport() {
        "Unable to reach the document service.".to_string()
    } else {
        err.auth_message()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> &[DocumentRecord] {
        &self.documents
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn deleting(&self) -> bool {
        self.deleting.is_some()
    }

    pub fn begin_refresh<V: DashboardView + ?Sized>(&mut self, view: &mut V) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        view.show_status(StatusLine::info("Loading documents…"));
        true
    }

    pub fn finish_refresh<V: DashboardView + ?Sized>(
        &mut self,
        result: Result<Vec<DocumentRecord>, ApiError>,
        view: &mut V,
    ) {
        self.loading = false;
        match result {
            Ok(documents) => {
                info!("Loaded {} document(s)", documents.len());
                self.documents = documents;
                view.render_documents(&self.documents);
                let status = if self.documents.is_empty() {
                    "No documents uploaded yet.".to_string()
                } else {
                    format!("{} document(s).", self.documents.len())
                };
                view.show_status(StatusLine::info(status));
            }
            Err(err) => {
                warn!("Listing documents failed: {}", err);
                view.show_status(StatusLine::error(failure_message(&err)));
            }
        }
    }

    fn name_of(&self, id: i64) -> String {
        self.documents
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.filename.clone())
            .unwrap_or_else(|| format!("document {}", id))
    }

    /// One delete at a time; returns false while another is in flight.
    pub fn begin_delete<V: DashboardView + ?Sized>(&mut self, id: i64, view: &mut V) -> bool {
        if self.deleting.is_some() {
            return false;
        }
        self.deleting = Some(id);
        view.show_status(StatusLine::info(format!("Deleting {}…", self.name_of(id))));
        true
    }

    /// On success the record leaves the list and the list is rendered again.
    pub fn finish_delete<V: DashboardView + ?Sized>(
        &mut self,
        id: i64,
        result: Result<(), ApiError>,
        view: &mut V,
    ) {
        self.deleting = None;
        let name = self.name_of(id);
        match result {
            Ok(()) => {
                info!("Deleted document {}", id);
                self.documents.retain(|d| d.id != id);
                view.render_documents(&self.documents);
                view.show_status(StatusLine::success(format!("Deleted {}.", name)));
            }
            Err(err) => {
                warn!("Deleting document {} failed: {}", id, err);
                view.show_status(StatusLine::error(failure_message(&err)));
            }
        }
    }

    pub async fn delete<B, V>(&mut self, id: i64, backend: &B, view: &mut V) -> bool
    where
        B: Backend + ?Sized,
        V: DashboardView + ?Sized,
    {
        if !self.begin_delete(id, view) {
            return false;
        }
        let result = backend.delete_document(id).await;
        self.finish_delete(id, result, view);
        true
    }

    pub fn begin_upload<V: DashboardView + ?Sized>(&mut self, file: &PendingFile, view: &mut V) -> bool {
        if self.uploading {
            return false;
        }
        self.uploading = true;
        view.show_status(StatusLine::info(format!("Uploading {}…", file.name)));
        true
    }

    /// The stored record is appended to the list.
    pub fn finish_upload<V: DashboardView + ?Sized>(
        &mut self,
        result: Result<DocumentRecord, ApiError>,
        view: &mut V,
    ) {
        self.uploading = false;
        match result {
            Ok(record) => {
                info!("Stored document {} as id {}", record.filename, record.id);
                let status = format!("Uploaded {}.", record.filename);
                self.documents.push(record);
                view.render_documents(&self.documents);
                view.show_status(StatusLine::success(status));
            }
            Err(err) => {
                warn!("Document upload failed: {}", err);
                view.show_status(StatusLine::error(failure_message(&err)));
            }
        }
    }

    pub async fn upload<B, V>(
        &mut self,
        file: &PendingFile,
        tags: &DocumentTags,
        backend: &B,
        view: &mut V,
    ) -> bool
    where
        B: Backend + ?Sized,
        V: DashboardView + ?Sized,
    {
        if !self.begin_upload(file, view) {
            return false;
        }
        let result = backend.upload_document(file, tags).await;
        self.finish_upload(result, view);
        true
    }

    pub async fn refresh<B, V>(&mut self, backend: &B, view: &mut V) -> bool
    where
        B: Backend + ?Sized,
        V: DashboardView + ?Sized,
    {
        if !self.begin_refresh(view) {
            return false;
        }
        let result = backend.list_documents().await;
        self.finish_refresh(result, view);
        true
    }
}

//! Test doubles shared by the controller tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::api::{
    Backend, ChatReply, Credentials, DocumentRecord, DocumentTags, IngestReceipt, LoginGrant,
    Registration,
};
use crate::auth::{AuthPanel, AuthView, DeferredAction};
use crate::chat::{ChatView, ConnectionStatus};
use crate::dashboard::DashboardView;
use crate::document::DocumentView;
use crate::error::ApiError;
use crate::state::{ChatMessage, PendingFile, StatusLine};
use crate::upload::UploadView;

fn unconfigured<T>() -> Result<T, ApiError> {
    Err(ApiError::Transport("no response configured".to_string()))
}

/// Backend returning canned results and recording what it was sent.
#[derive(Default)]
pub struct FakeBackend {
    ingest: Option<Result<IngestReceipt, ApiError>>,
    chat: Option<Result<ChatReply, ApiError>>,
    login: Option<Result<LoginGrant, ApiError>>,
    signup: Option<Result<(), ApiError>>,
    health: Option<Result<(), ApiError>>,
    documents: Option<Result<Vec<DocumentRecord>, ApiError>>,
    document: Option<Result<DocumentRecord, ApiError>>,
    delete: Option<Result<(), ApiError>>,
    upload: Option<Result<DocumentRecord, ApiError>>,
    calls: AtomicUsize,
    fetched: Mutex<Vec<i64>>,
    deleted: Mutex<Vec<i64>>,
    uploaded: Mutex<Vec<(String, DocumentTags)>>,
    ingested: Mutex<Vec<Vec<String>>>,
    chatted: Mutex<Vec<String>>,
    signed_up: Mutex<Vec<Registration>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest_returns(mut self, result: Result<IngestReceipt, ApiError>) -> Self {
        self.ingest = Some(result);
        self
    }

    pub fn chat_returns(mut self, result: Result<ChatReply, ApiError>) -> Self {
        self.chat = Some(result);
        self
    }

    pub fn login_returns(mut self, result: Result<LoginGrant, ApiError>) -> Self {
        self.login = Some(result);
        self
    }

    pub fn signup_returns(mut self, result: Result<(), ApiError>) -> Self {
        self.signup = Some(result);
        self
    }

    pub fn health_returns(mut self, result: Result<(), ApiError>) -> Self {
        self.health = Some(result);
        self
    }

    pub fn documents_return(mut self, result: Result<Vec<DocumentRecord>, ApiError>) -> Self {
        self.documents = Some(result);
        self
    }

    pub fn document_returns(mut self, result: Result<DocumentRecord, ApiError>) -> Self {
        self.document = Some(result);
        self
    }

    pub fn delete_returns(mut self, result: Result<(), ApiError>) -> Self {
        self.delete = Some(result);
        self
    }

    pub fn upload_returns(mut self, result: Result<DocumentRecord, ApiError>) -> Self {
        self.upload = Some(result);
        self
    }

    pub fn fetched(&self) -> Vec<i64> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<i64> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn uploaded(&self) -> Vec<(String, DocumentTags)> {
        self.uploaded.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn ingested(&self) -> Vec<Vec<String>> {
        self.ingested.lock().unwrap().clone()
    }

    pub fn chatted(&self) -> Vec<String> {
        self.chatted.lock().unwrap().clone()
    }

    pub fn signed_up(&self) -> Vec<Registration> {
        self.signed_up.lock().unwrap().clone()
    }

    fn answer<T: Clone>(&self, canned: &Option<Result<T, ApiError>>) -> Result<T, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        canned.clone().unwrap_or_else(unconfigured)
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn ingest(&self, files: &[PendingFile]) -> Result<IngestReceipt, ApiError> {
        self.ingested
            .lock()
            .unwrap()
            .push(files.iter().map(|f| f.name.clone()).collect());
        self.answer(&self.ingest)
    }

    async fn chat(&self, message: &str) -> Result<ChatReply, ApiError> {
        self.chatted.lock().unwrap().push(message.to_string());
        self.answer(&self.chat)
    }

    async fn login(&self, _credentials: &Credentials) -> Result<LoginGrant, ApiError> {
        self.answer(&self.login)
    }

    async fn signup(&self, registration: &Registration) -> Result<(), ApiError> {
        self.signed_up.lock().unwrap().push(registration.clone());
        self.answer(&self.signup)
    }

    async fn health(&self) -> Result<(), ApiError> {
        self.answer(&self.health)
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, ApiError> {
        self.answer(&self.documents)
    }

    async fn get_document(&self, id: i64) -> Result<DocumentRecord, ApiError> {
        self.fetched.lock().unwrap().push(id);
        self.answer(&self.document)
    }

    async fn delete_document(&self, id: i64) -> Result<(), ApiError> {
        self.deleted.lock().unwrap().push(id);
        self.answer(&self.delete)
    }

    async fn upload_document(
        &self,
        file: &PendingFile,
        tags: &DocumentTags,
    ) -> Result<DocumentRecord, ApiError> {
        self.uploaded
            .lock()
            .unwrap()
            .push((file.name.clone(), tags.clone()));
        self.answer(&self.upload)
    }
}

/// One view implementing every page trait, keeping what it was told.
#[derive(Debug, Default)]
pub struct Recorder {
    pub statuses: Vec<StatusLine>,
    pub submit_enabled: Option<bool>,
    pub queue: Vec<String>,
    pub messages: Vec<ChatMessage>,
    pub send_enabled: Option<bool>,
    pub connection: Option<ConnectionStatus>,
    pub panel: Option<AuthPanel>,
    pub auth_messages: Vec<(AuthPanel, StatusLine)>,
    pub scheduled: Vec<(DeferredAction, Duration)>,
    pub titles: Vec<String>,
    pub pin_label: Option<String>,
    pub alerts: Vec<String>,
    pub comments: Vec<String>,
    pub comment_scrolls: usize,
    pub documents: Vec<String>,
    pub details: Option<DocumentRecord>,
    pub notice: Option<StatusLine>,
}

impl Recorder {
    pub fn last_status(&self) -> Option<&StatusLine> {
        self.statuses.last()
    }
}

impl UploadView for Recorder {
    fn show_status(&mut self, status: StatusLine) {
        self.statuses.push(status);
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.submit_enabled = Some(enabled);
    }

    fn render_queue(&mut self, files: &[PendingFile]) {
        self.queue = files.iter().map(|f| f.name.clone()).collect();
    }
}

impl ChatView for Recorder {
    fn append_message(&mut self, message: &ChatMessage) {
        self.messages.push(message.clone());
    }

    fn reset_transcript(&mut self, messages: &[ChatMessage]) {
        self.messages = messages.to_vec();
    }

    fn set_send_enabled(&mut self, enabled: bool) {
        self.send_enabled = Some(enabled);
    }

    fn set_connection(&mut self, status: ConnectionStatus) {
        self.connection = Some(status);
    }
}

impl AuthView for Recorder {
    fn show_panel(&mut self, panel: AuthPanel) {
        self.panel = Some(panel);
    }

    fn show_message(&mut self, panel: AuthPanel, status: StatusLine) {
        self.auth_messages.push((panel, status));
    }

    fn schedule(&mut self, action: DeferredAction, delay: Duration) {
        self.scheduled.push((action, delay));
    }
}

impl DocumentView for Recorder {
    fn set_title(&mut self, title: &str) {
        self.titles.push(title.to_string());
    }

    fn set_pin_label(&mut self, label: &str) {
        self.pin_label = Some(label.to_string());
    }

    fn alert(&mut self, text: &str) {
        self.alerts.push(text.to_string());
    }

    fn append_comment(&mut self, text: &str) {
        self.comments.push(text.to_string());
    }

    fn scroll_comments_to_end(&mut self) {
        self.comment_scrolls += 1;
    }

    fn show_details(&mut self, record: &DocumentRecord) {
        self.details = Some(record.clone());
    }

    fn show_notice(&mut self, notice: Option<StatusLine>) {
        self.notice = notice;
    }
}

impl DashboardView for Recorder {
    fn render_documents(&mut self, documents: &[DocumentRecord]) {
        self.documents = documents.iter().map(|d| d.filename.clone()).collect();
    }

    fn show_status(&mut self, status: StatusLine) {
        self.statuses.push(status);
    }
}

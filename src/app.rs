use std::sync::Arc;
use std::time::Instant;

use docspace_core::api::{ChatReply, DocumentRecord, IngestReceipt, LoginGrant};
use docspace_core::dashboard::document_link;
use docspace_core::upload::{collect_candidates, parse_dropped_paths};
use docspace_core::{
    ApiError, AuthForms, AuthPanel, Backend, ChatComposer, ChatView, Config, Dashboard,
    DashboardView, DeferredAction, DocumentPanel, Session, StatusLine, TokenStore, UploadQueue,
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::input::TextInput;
use crate::panes::{AuthPane, ChatPane, DashboardPane, DocumentPane, UploadPane};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Auth,
    Dashboard,
    Ingest,
    Chat,
    Document,
}

impl Screen {
    pub fn all() -> [Screen; 5] {
        [Screen::Auth, Screen::Dashboard, Screen::Ingest, Screen::Chat, Screen::Document]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Auth => "Account",
            Screen::Dashboard => "Dashboard",
            Screen::Ingest => "Ingest",
            Screen::Chat => "Chat",
            Screen::Document => "Document",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Default)]
pub struct LoginForm {
    pub email: TextInput,
    pub password: TextInput,
    pub focus: usize,
}

impl LoginForm {
    pub const LABELS: [&'static str; 2] = ["Email", "Password"];

    pub fn field_mut(&mut self, index: usize) -> &mut TextInput {
        match index {
            0 => &mut self.email,
            _ => &mut self.password,
        }
    }

    pub fn fields(&self) -> [&TextInput; 2] {
        [&self.email, &self.password]
    }
}

#[derive(Debug, Default)]
pub struct SignupForm {
    pub full_name: TextInput,
    pub email: TextInput,
    pub password: TextInput,
    pub department: TextInput,
    pub focus: usize,
}

impl SignupForm {
    pub const LABELS: [&'static str; 4] = ["Full name", "Email", "Password", "Department"];

    pub fn field_mut(&mut self, index: usize) -> &mut TextInput {
        match index {
            0 => &mut self.full_name,
            1 => &mut self.email,
            2 => &mut self.password,
            _ => &mut self.department,
        }
    }

    pub fn fields(&self) -> [&TextInput; 4] {
        [&self.full_name, &self.email, &self.password, &self.department]
    }
}

/// A backend call running on the runtime, completed on a later tick.
pub enum PendingRequest {
    Upload(JoinHandle<Result<IngestReceipt, ApiError>>),
    Chat(JoinHandle<Result<ChatReply, ApiError>>),
    Login(JoinHandle<Result<LoginGrant, ApiError>>),
    Signup(JoinHandle<Result<(), ApiError>>),
    Documents(JoinHandle<Result<Vec<DocumentRecord>, ApiError>>),
    Document(i64, JoinHandle<Result<DocumentRecord, ApiError>>),
    Delete(i64, JoinHandle<Result<(), ApiError>>),
    Health(JoinHandle<Result<(), ApiError>>),
}

impl PendingRequest {
    fn is_finished(&self) -> bool {
        match self {
            PendingRequest::Upload(h) => h.is_finished(),
            PendingRequest::Chat(h) => h.is_finished(),
            PendingRequest::Login(h) => h.is_finished(),
            PendingRequest::Signup(h) => h.is_finished(),
            PendingRequest::Documents(h) => h.is_finished(),
            PendingRequest::Document(_, h) => h.is_finished(),
            PendingRequest::Delete(_, h) => h.is_finished(),
            PendingRequest::Health(h) => h.is_finished(),
        }
    }
}

async fn joined<T>(handle: JoinHandle<Result<T, ApiError>>) -> Result<T, ApiError> {
    handle
        .await
        .unwrap_or_else(|e| Err(ApiError::Transport(format!("request task failed: {}", e))))
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub session_active: bool,

    // Ingest screen
    pub upload: UploadQueue,
    pub upload_pane: UploadPane,
    pub path_input: TextInput,

    // Chat screen
    pub chat: ChatComposer,
    pub chat_pane: ChatPane,
    pub chat_input: TextInput,
    pub chat_height: u16,

    // Account screen
    pub auth: AuthForms,
    pub auth_pane: AuthPane,
    pub login_form: LoginForm,
    pub signup_form: SignupForm,

    // Dashboard screen
    pub dashboard: Dashboard,
    pub dashboard_pane: DashboardPane,
    /// Record awaiting a `y` before it is deleted
    pub confirm_delete: Option<i64>,

    // Document screen
    pub document: DocumentPanel,
    pub document_pane: DocumentPane,
    pub comment_input: TextInput,

    // Animation state
    pub animation_frame: u8,

    backend: Arc<dyn Backend>,
    store: Arc<dyn TokenStore>,
    pending: Vec<PendingRequest>,
}

impl App {
    pub fn new(backend: Arc<dyn Backend>, store: Arc<dyn TokenStore>, config: &Config) -> Self {
        let chat = ChatComposer::new();
        let mut chat_pane = ChatPane::default();
        chat_pane.reset_transcript(chat.transcript());

        let mut document_pane = DocumentPane::default();
        let document = DocumentPanel::open("document", &mut document_pane);

        let session_active = match Session::load(store.as_ref()) {
            Ok(session) => session.is_some(),
            Err(e) => {
                warn!("Could not read stored session: {}", e);
                false
            }
        };

        Self {
            should_quit: false,
            screen: if session_active { Screen::Dashboard } else { Screen::Auth },
            input_mode: InputMode::Normal,
            session_active,

            upload: UploadQueue::new(),
            upload_pane: UploadPane::default(),
            path_input: TextInput::new(),

            chat,
            chat_pane,
            chat_input: TextInput::new(),
            chat_height: 0,

            auth: AuthForms::new(store.clone(), config.redirect_delay()),
            auth_pane: AuthPane::default(),
            login_form: LoginForm::default(),
            signup_form: SignupForm::default(),

            dashboard: Dashboard::new(),
            dashboard_pane: DashboardPane::default(),
            confirm_delete: None,

            document,
            document_pane,
            comment_input: TextInput::new(),

            animation_frame: 0,

            backend,
            store,
            pending: Vec::new(),
        }
    }

    /// Kick off the startup requests: health check, and the document list when
    /// a session is already stored.
    pub fn start(&mut self) {
        let backend = self.backend.clone();
        self.pending
            .push(PendingRequest::Health(tokio::spawn(async move { backend.health().await })));
        if self.session_active {
            self.refresh_documents();
        }
    }

    pub fn is_busy(&self) -> bool {
        !self.pending.is_empty()
    }

    // Ingest actions
    pub fn add_paths(&mut self, text: &str) {
        let paths = parse_dropped_paths(text);
        if paths.is_empty() {
            return;
        }
        debug!("Adding {} dropped path(s)", paths.len());
        let candidates = collect_candidates(&paths);
        self.upload.add_files(candidates, &mut self.upload_pane);
    }

    pub fn submit_upload(&mut self) {
        if let Some(files) = self.upload.begin_submit(&mut self.upload_pane) {
            let backend = self.backend.clone();
            self.pending.push(PendingRequest::Upload(tokio::spawn(async move {
                backend.ingest(&files).await
            })));
        }
    }

    pub fn clear_upload(&mut self) {
        self.upload.clear(&mut self.upload_pane);
    }

    // Chat actions
    pub fn send_chat(&mut self) {
        let text = self.chat_input.value().to_string();
        if let Some(message) = self.chat.begin_send(&text, &mut self.chat_pane) {
            self.chat_input.clear();
            let backend = self.backend.clone();
            self.pending.push(PendingRequest::Chat(tokio::spawn(async move {
                backend.chat(&message).await
            })));
        }
    }

    pub fn clear_chat(&mut self) {
        self.chat.clear(&mut self.chat_pane);
    }

    pub fn scroll_chat_up(&mut self) {
        self.chat_pane.follow = false;
        self.chat_pane.scroll = self.chat_pane.scroll.saturating_sub(1);
    }

    pub fn scroll_chat_down(&mut self) {
        self.chat_pane.scroll = self.chat_pane.scroll.saturating_add(1);
    }

    // Account actions
    pub fn show_login(&mut self) {
        self.auth.show_login(&mut self.auth_pane);
    }

    pub fn show_signup(&mut self) {
        self.auth.show_signup(&mut self.auth_pane);
    }

    pub fn submit_auth(&mut self) {
        match self.auth.visible() {
            AuthPanel::Login => self.submit_login(),
            AuthPanel::Signup => self.submit_signup(),
        }
    }

    fn submit_login(&mut self) {
        let form = &self.login_form;
        if let Some(credentials) =
            self.auth
                .begin_login(form.email.value(), form.password.value(), &mut self.auth_pane)
        {
            let backend = self.backend.clone();
            self.pending.push(PendingRequest::Login(tokio::spawn(async move {
                backend.login(&credentials).await
            })));
        }
    }

    fn submit_signup(&mut self) {
        let form = &self.signup_form;
        if let Some(registration) = self.auth.begin_signup(
            form.full_name.value(),
            form.email.value(),
            form.password.value(),
            form.department.value(),
            &mut self.auth_pane,
        ) {
            let backend = self.backend.clone();
            self.pending.push(PendingRequest::Signup(tokio::spawn(async move {
                backend.signup(&registration).await
            })));
        }
    }

    pub fn focused_auth_field(&mut self) -> &mut TextInput {
        match self.auth.visible() {
            AuthPanel::Login => {
                let focus = self.login_form.focus;
                self.login_form.field_mut(focus)
            }
            AuthPanel::Signup => {
                let focus = self.signup_form.focus;
                self.signup_form.field_mut(focus)
            }
        }
    }

    pub fn next_auth_field(&mut self) {
        match self.auth.visible() {
            AuthPanel::Login => {
                self.login_form.focus = (self.login_form.focus + 1) % LoginForm::LABELS.len()
            }
            AuthPanel::Signup => {
                self.signup_form.focus = (self.signup_form.focus + 1) % SignupForm::LABELS.len()
            }
        }
    }

    pub fn prev_auth_field(&mut self) {
        match self.auth.visible() {
            AuthPanel::Login => {
                let len = LoginForm::LABELS.len();
                self.login_form.focus = (self.login_form.focus + len - 1) % len;
            }
            AuthPanel::Signup => {
                let len = SignupForm::LABELS.len();
                self.signup_form.focus = (self.signup_form.focus + len - 1) % len;
            }
        }
    }

    // Dashboard actions
    pub fn refresh_documents(&mut self) {
        if self.dashboard.begin_refresh(&mut self.dashboard_pane) {
            let backend = self.backend.clone();
            self.pending.push(PendingRequest::Documents(tokio::spawn(async move {
                backend.list_documents().await
            })));
        }
    }

    pub fn open_selected_document(&mut self) {
        if let Some(link) = self.dashboard_pane.selected().map(document_link) {
            self.open_document(&link);
        }
    }

    /// Ask for confirmation before deleting the selected record.
    pub fn request_delete(&mut self) {
        let Some(record) = self.dashboard_pane.selected() else {
            return;
        };
        let prompt = format!("Delete {}? Press y to confirm.", record.filename);
        self.confirm_delete = Some(record.id);
        self.dashboard_pane.show_status(StatusLine::info(prompt));
    }

    pub fn confirm_delete(&mut self) {
        let Some(id) = self.confirm_delete.take() else {
            return;
        };
        if self.dashboard.begin_delete(id, &mut self.dashboard_pane) {
            let backend = self.backend.clone();
            self.pending.push(PendingRequest::Delete(
                id,
                tokio::spawn(async move { backend.delete_document(id).await }),
            ));
        }
    }

    pub fn cancel_delete(&mut self) {
        if self.confirm_delete.take().is_some() {
            self.dashboard_pane.show_status(StatusLine::info("Delete cancelled."));
        }
    }

    // Document actions
    pub fn open_document(&mut self, link: &str) {
        self.document_pane = DocumentPane::default();
        self.document = DocumentPanel::open(link, &mut self.document_pane);
        self.comment_input.clear();
        self.screen = Screen::Document;

        if let Some(id) = self.document.begin_load(&mut self.document_pane) {
            let backend = self.backend.clone();
            self.pending.push(PendingRequest::Document(
                id,
                tokio::spawn(async move { backend.get_document(id).await }),
            ));
        }
    }

    pub fn toggle_pin(&mut self) {
        self.document.toggle_pin(&mut self.document_pane);
    }

    pub fn add_comment(&mut self) {
        let text = self.comment_input.take();
        self.document.add_comment(&text, &mut self.document_pane);
    }

    /// Complete every background request that has settled.
    pub async fn poll_requests(&mut self) {
        let (done, still_running): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.pending).into_iter().partition(|r| r.is_finished());
        self.pending = still_running;

        for request in done {
            match request {
                PendingRequest::Upload(handle) => {
                    let result = joined(handle).await;
                    self.upload.finish_submit(result, &mut self.upload_pane);
                }
                PendingRequest::Chat(handle) => {
                    let result = joined(handle).await;
                    self.chat.finish_send(result, &mut self.chat_pane);
                }
                PendingRequest::Login(handle) => {
                    let result = joined(handle).await;
                    self.auth.finish_login(result, &mut self.auth_pane);
                    self.session_active = matches!(Session::load(self.store.as_ref()), Ok(Some(_)));
                }
                PendingRequest::Signup(handle) => {
                    let result = joined(handle).await;
                    self.auth.finish_signup(result, &mut self.auth_pane);
                }
                PendingRequest::Documents(handle) => {
                    let result = joined(handle).await;
                    self.dashboard.finish_refresh(result, &mut self.dashboard_pane);
                }
                PendingRequest::Document(id, handle) => {
                    let result = joined(handle).await;
                    self.document.finish_load(id, result, &mut self.document_pane);
                }
                PendingRequest::Delete(id, handle) => {
                    let result = joined(handle).await;
                    self.dashboard.finish_delete(id, result, &mut self.dashboard_pane);
                }
                PendingRequest::Health(handle) => {
                    let result = joined(handle).await;
                    self.chat.apply_health(result, &mut self.chat_pane);
                }
            }
        }
    }

    /// Fire deferred auth actions whose delay has elapsed.
    pub fn run_deferred(&mut self, now: Instant) {
        for action in self.auth_pane.take_due(now) {
            match action {
                DeferredAction::OpenDashboard => {
                    self.screen = Screen::Dashboard;
                    self.input_mode = InputMode::Normal;
                    self.refresh_documents();
                }
                DeferredAction::ShowLogin => self.show_login(),
            }
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docspace_core::api::{Credentials, DocumentTags, Registration};
    use docspace_core::{MemoryTokenStore, PendingFile};
    use std::time::Duration;

    /// Backend whose calls all succeed immediately.
    struct StubBackend;

    #[async_trait]
    impl Backend for StubBackend {
        async fn ingest(&self, _files: &[PendingFile]) -> Result<IngestReceipt, ApiError> {
            Ok(IngestReceipt::default())
        }

        async fn chat(&self, message: &str) -> Result<ChatReply, ApiError> {
            Ok(ChatReply {
                reply: Some(format!("echo: {}", message)),
            })
        }

        async fn login(&self, _credentials: &Credentials) -> Result<LoginGrant, ApiError> {
            Ok(LoginGrant {
                access_token: "abc".to_string(),
                token_type: "bearer".to_string(),
                message: None,
            })
        }

        async fn signup(&self, _registration: &Registration) -> Result<(), ApiError> {
            Ok(())
        }

        async fn health(&self) -> Result<(), ApiError> {
            Ok(())
        }

        async fn list_documents(&self) -> Result<Vec<DocumentRecord>, ApiError> {
            Ok(Vec::new())
        }

        async fn get_document(&self, id: i64) -> Result<DocumentRecord, ApiError> {
            Ok(record(id, "Runbook.md"))
        }

        async fn delete_document(&self, _id: i64) -> Result<(), ApiError> {
            Ok(())
        }

        async fn upload_document(
            &self,
            file: &PendingFile,
            _tags: &DocumentTags,
        ) -> Result<DocumentRecord, ApiError> {
            Ok(record(99, &file.name))
        }
    }

    fn record(id: i64, filename: &str) -> DocumentRecord {
        DocumentRecord {
            id,
            filename: filename.to_string(),
            file_path: None,
            department: "Operations".to_string(),
            role: "employee".to_string(),
            uploaded_at: Some("2026-02-01T09:30:00".to_string()),
        }
    }

    fn app() -> (App, Arc<MemoryTokenStore>) {
        let store = Arc::new(MemoryTokenStore::new());
        let config = Config {
            redirect_delay_ms: Some(0),
            ..Config::default()
        };
        let app = App::new(Arc::new(StubBackend), store.clone(), &config);
        (app, store)
    }

    async fn settle(app: &mut App) {
        while app.is_busy() {
            tokio::task::yield_now().await;
            app.poll_requests().await;
        }
    }

    #[tokio::test]
    async fn test_starts_on_account_screen_without_session() {
        let (app, _) = app();
        assert_eq!(app.screen, Screen::Auth);
        assert!(!app.session_active);
    }

    #[tokio::test]
    async fn test_login_redirects_to_dashboard() {
        let (mut app, store) = app();
        app.login_form.email.insert_str("ada@example.com");
        app.login_form.password.insert_str("secret");

        app.submit_auth();
        settle(&mut app).await;
        app.run_deferred(Instant::now() + Duration::from_millis(1));

        assert!(app.session_active);
        assert_eq!(store.get("access_token").unwrap().as_deref(), Some("abc"));
        assert_eq!(app.screen, Screen::Dashboard);
        settle(&mut app).await;
        assert!(!app.dashboard.loading());
    }

    #[tokio::test]
    async fn test_chat_round_trip_through_background_task() {
        let (mut app, _) = app();
        app.chat_input.insert_str("hello");

        app.send_chat();
        assert!(app.chat_input.is_empty());
        settle(&mut app).await;

        let last = app.chat_pane.messages.last().unwrap();
        assert_eq!(last.content, "echo: hello");
        assert!(app.chat_pane.send_enabled);
    }

    #[tokio::test]
    async fn test_upload_success_empties_queue() {
        let (mut app, _) = app();
        app.upload.add_files(
            vec![PendingFile::new("a.md", 1, "/tmp/a.md")],
            &mut app.upload_pane,
        );

        app.submit_upload();
        settle(&mut app).await;

        assert!(app.upload_pane.files.is_empty());
        assert!(!app.upload_pane.submit_enabled);
    }

    #[tokio::test]
    async fn test_open_document_from_link() {
        let (mut app, _) = app();
        app.open_document("document?title=Runbook.md&id=4");
        app.comment_input.insert_str("Looks good");
        app.add_comment();
        app.toggle_pin();

        assert_eq!(app.screen, Screen::Document);
        assert_eq!(app.document_pane.title, "Runbook.md");
        assert_eq!(app.document_pane.comments, vec!["Looks good"]);
        assert!(app.document.is_pinned());
    }

    #[tokio::test]
    async fn test_open_document_loads_record_details() {
        let (mut app, _) = app();
        app.open_document("document?title=Runbook.md&id=4");
        assert!(app.is_busy());
        settle(&mut app).await;

        let details = app.document_pane.details.as_ref().unwrap();
        assert_eq!(details.id, 4);
        assert_eq!(details.department, "Operations");
        assert!(app.document_pane.notice.is_none());
    }

    #[tokio::test]
    async fn test_delete_needs_confirmation_then_rerenders() {
        let (mut app, _) = app();
        app.dashboard.finish_refresh(
            Ok(vec![record(1, "a.md"), record(2, "b.md")]),
            &mut app.dashboard_pane,
        );

        app.request_delete();
        assert_eq!(app.confirm_delete, Some(1));
        assert!(!app.is_busy());

        app.confirm_delete();
        settle(&mut app).await;

        assert_eq!(app.confirm_delete, None);
        let names: Vec<_> = app.dashboard_pane.documents.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(names, vec!["b.md"]);
        assert_eq!(app.dashboard_pane.selected().map(|d| d.id), Some(2));
    }

    #[tokio::test]
    async fn test_cancelled_delete_sends_nothing() {
        let (mut app, _) = app();
        app.dashboard
            .finish_refresh(Ok(vec![record(1, "a.md")]), &mut app.dashboard_pane);

        app.request_delete();
        app.cancel_delete();
        app.confirm_delete();

        assert!(!app.is_busy());
        assert_eq!(app.dashboard_pane.documents.len(), 1);
    }
}

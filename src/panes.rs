//! Render models for each screen.
//!
//! The core controllers write into these through their view traits; `ui.rs`
//! reads them when drawing a frame.

use std::time::{Duration, Instant};

use docspace_core::api::DocumentRecord;
use docspace_core::{
    AuthPanel, AuthView, ChatMessage, ChatView, ConnectionStatus, DashboardView, DeferredAction,
    DocumentView, PendingFile, StatusLine, UploadView,
};
use ratatui::widgets::ListState;

#[derive(Debug)]
pub struct UploadPane {
    pub files: Vec<PendingFile>,
    pub status: Option<StatusLine>,
    pub submit_enabled: bool,
}

impl Default for UploadPane {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            status: None,
            submit_enabled: true,
        }
    }
}

impl UploadView for UploadPane {
    fn show_status(&mut self, status: StatusLine) {
        self.status = Some(status);
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.submit_enabled = enabled;
    }

    fn render_queue(&mut self, files: &[PendingFile]) {
        self.files = files.to_vec();
    }
}

#[derive(Debug)]
pub struct ChatPane {
    pub messages: Vec<ChatMessage>,
    pub send_enabled: bool,
    pub connection: ConnectionStatus,
    pub scroll: u16,
    /// Keep the newest message in view until the user scrolls up
    pub follow: bool,
}

impl Default for ChatPane {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            send_enabled: true,
            connection: ConnectionStatus::Online,
            scroll: 0,
            follow: true,
        }
    }
}

impl ChatView for ChatPane {
    fn append_message(&mut self, message: &ChatMessage) {
        self.messages.push(message.clone());
        self.follow = true;
    }

    fn reset_transcript(&mut self, messages: &[ChatMessage]) {
        self.messages = messages.to_vec();
        self.scroll = 0;
        self.follow = true;
    }

    fn set_send_enabled(&mut self, enabled: bool) {
        self.send_enabled = enabled;
    }

    fn set_connection(&mut self, status: ConnectionStatus) {
        self.connection = status;
    }
}

#[derive(Debug)]
pub struct AuthPane {
    pub panel: AuthPanel,
    pub login_status: Option<StatusLine>,
    pub signup_status: Option<StatusLine>,
    scheduled: Vec<(DeferredAction, Instant)>,
}

impl Default for AuthPane {
    fn default() -> Self {
        Self {
            panel: AuthPanel::Login,
            login_status: None,
            signup_status: None,
            scheduled: Vec::new(),
        }
    }
}

impl AuthPane {
    /// Remove and return the deferred actions whose deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Vec<DeferredAction> {
        let (due, pending): (Vec<_>, Vec<_>) =
            self.scheduled.drain(..).partition(|(_, at)| *at <= now);
        self.scheduled = pending;
        due.into_iter().map(|(action, _)| action).collect()
    }

    pub fn has_scheduled(&self) -> bool {
        !self.scheduled.is_empty()
    }
}

impl AuthView for AuthPane {
    fn show_panel(&mut self, panel: AuthPanel) {
        self.panel = panel;
    }

    fn show_message(&mut self, panel: AuthPanel, status: StatusLine) {
        match panel {
            AuthPanel::Login => self.login_status = Some(status),
            AuthPanel::Signup => self.signup_status = Some(status),
        }
    }

    fn schedule(&mut self, action: DeferredAction, delay: Duration) {
        self.scheduled.push((action, Instant::now() + delay));
    }
}

#[derive(Debug, Default)]
pub struct DocumentPane {
    pub title: String,
    pub pin_label: String,
    pub alert: Option<String>,
    pub comments: Vec<String>,
    pub comment_scroll: u16,
    pub follow: bool,
    pub details: Option<DocumentRecord>,
    pub notice: Option<StatusLine>,
}

impl DocumentView for DocumentPane {
    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn set_pin_label(&mut self, label: &str) {
        self.pin_label = label.to_string();
    }

    fn alert(&mut self, text: &str) {
        self.alert = Some(text.to_string());
    }

    fn append_comment(&mut self, text: &str) {
        self.comments.push(text.to_string());
    }

    fn scroll_comments_to_end(&mut self) {
        self.follow = true;
    }

    fn show_details(&mut self, record: &DocumentRecord) {
        self.details = Some(record.clone());
    }

    fn show_notice(&mut self, notice: Option<StatusLine>) {
        self.notice = notice;
    }
}

#[derive(Debug, Default)]
pub struct DashboardPane {
    pub documents: Vec<DocumentRecord>,
    pub status: Option<StatusLine>,
    pub list_state: ListState,
}

impl DashboardPane {
    pub fn selected(&self) -> Option<&DocumentRecord> {
        self.list_state.selected().and_then(|i| self.documents.get(i))
    }

    pub fn nav_down(&mut self) {
        let len = self.documents.len();
        if len > 0 {
            let i = self.list_state.selected().unwrap_or(0);
            self.list_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn nav_up(&mut self) {
        let i = self.list_state.selected().unwrap_or(0);
        self.list_state.select(Some(i.saturating_sub(1)));
    }
}

impl DashboardView for DashboardPane {
    fn render_documents(&mut self, documents: &[DocumentRecord]) {
        self.documents = documents.to_vec();
        let selected = if self.documents.is_empty() {
            None
        } else {
            Some(self.list_state.selected().unwrap_or(0).min(self.documents.len() - 1))
        };
        self.list_state.select(selected);
    }

    fn show_status(&mut self, status: StatusLine) {
        self.status = Some(status);
    }
}

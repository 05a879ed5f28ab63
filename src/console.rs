//! Plain-text view for the one-shot commands.

use std::time::Duration;

use docspace_core::api::DocumentRecord;
use docspace_core::{
    AuthPanel, AuthView, ChatMessage, ChatRole, ChatView, ConnectionStatus, DashboardView,
    DeferredAction, DocumentView, PendingFile, StatusLine, UploadView,
};
use tracing::debug;

/// Prints what the controllers render; remembers whether an error was shown
/// so the process can exit non-zero.
#[derive(Debug, Default)]
pub struct ConsoleView {
    pub failed: bool,
}

impl ConsoleView {
    pub fn new() -> Self {
        Self::default()
    }

    fn status(&mut self, status: StatusLine) {
        if status.is_error() {
            self.failed = true;
            eprintln!("{}", status.text);
        } else {
            println!("{}", status.text);
        }
    }
}

impl UploadView for ConsoleView {
    fn show_status(&mut self, status: StatusLine) {
        self.status(status);
    }

    fn set_submit_enabled(&mut self, _enabled: bool) {}

    fn render_queue(&mut self, files: &[PendingFile]) {
        for file in files {
            println!("  {} ({:.1} KB)", file.name, file.size as f64 / 1024.0);
        }
    }
}

impl ChatView for ConsoleView {
    fn append_message(&mut self, message: &ChatMessage) {
        match message.role {
            ChatRole::Assistant => println!("{}", message.content),
            ChatRole::System => {
                self.failed = true;
                eprintln!("{}", message.content);
            }
            ChatRole::User => {}
        }
    }

    fn reset_transcript(&mut self, _messages: &[ChatMessage]) {}

    fn set_send_enabled(&mut self, _enabled: bool) {}

    fn set_connection(&mut self, status: ConnectionStatus) {
        debug!("Connection: {}", status.label());
    }
}

impl AuthView for ConsoleView {
    fn show_panel(&mut self, _panel: AuthPanel) {}

    fn show_message(&mut self, _panel: AuthPanel, status: StatusLine) {
        self.status(status);
    }

    fn schedule(&mut self, action: DeferredAction, _delay: Duration) {
        debug!("Skipping deferred {:?} outside the TUI", action);
    }
}

impl DocumentView for ConsoleView {
    fn set_title(&mut self, title: &str) {
        println!("{}", title);
    }

    fn set_pin_label(&mut self, _label: &str) {}

    fn alert(&mut self, text: &str) {
        println!("{}", text);
    }

    fn append_comment(&mut self, text: &str) {
        println!("  • {}", text);
    }

    fn scroll_comments_to_end(&mut self) {}

    fn show_details(&mut self, record: &DocumentRecord) {
        println!("  department: {}", record.department);
        println!("  role:       {}", record.role);
        println!("  uploaded:   {}", record.uploaded_at.as_deref().unwrap_or("-"));
    }

    fn show_notice(&mut self, notice: Option<StatusLine>) {
        match notice {
            Some(status) if status.is_error() => self.status(status),
            Some(status) => debug!("{}", status.text),
            None => {}
        }
    }
}

impl DashboardView for ConsoleView {
    fn render_documents(&mut self, documents: &[DocumentRecord]) {
        if documents.is_empty() {
            println!("No documents.");
        }
        for doc in documents {
            let uploaded = doc.uploaded_at.as_deref().unwrap_or("-");
            println!("{:>5}  {:<40}  {:<16}  {}", doc.id, doc.filename, doc.department, uploaded);
        }
    }

    fn show_status(&mut self, status: StatusLine) {
        self.status(status);
    }
}

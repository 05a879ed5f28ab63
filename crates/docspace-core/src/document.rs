//! Document view side panel: pin toggle, a local comment list, and the stored
//! record's details when the link carries an `id`.
//!
//! Pin state and comments stay local and are lost when the panel is dropped.

use tracing::warn;
use url::Url;

use crate::api::{Backend, DocumentRecord};
use crate::error::ApiError;
use crate::state::StatusLine;

pub const TITLE_PARAM: &str = "title";
pub const ID_PARAM: &str = "id";
pub const UNTITLED: &str = "Untitled Document";
pub const PIN_LABEL: &str = "Pin Document";
pub const UNPIN_LABEL: &str = "Unpin Document";

pub trait DocumentView {
    fn set_title(&mut self, title: &str);
    fn set_pin_label(&mut self, label: &str);
    fn alert(&mut self, text: &str);
    fn append_comment(&mut self, text: &str);
    fn scroll_comments_to_end(&mut self);
    fn show_details(&mut self, record: &DocumentRecord);
    /// `None` clears the notice.
    fn show_notice(&mut self, notice: Option<StatusLine>);
}

fn query_value(link: &str, name: &str) -> Option<String> {
    let parsed = Url::parse(link).or_else(|_| {
        Url::parse("http://docspace.local/").and_then(|base| base.join(link))
    });
    let parsed = parsed.ok()?;
    let value = parsed
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.trim().to_string());
    value.filter(|v| !v.is_empty())
}

/// Read the `title` query parameter from an absolute or relative URL.
pub fn title_from_url(link: &str) -> Option<String> {
    query_value(link, TITLE_PARAM)
}

/// Read the numeric `id` query parameter; anything unparsable is ignored.
pub fn id_from_url(link: &str) -> Option<i64> {
    query_value(link, ID_PARAM)?.parse().ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPanel {
    title: String,
    id: Option<i64>,
    record: Option<DocumentRecord>,
    loading: bool,
    pinned: bool,
    comments: Vec<String>,
}

impl DocumentPanel {
    /// Read the title once and write it into the heading.
    pub fn open<V: DocumentView + ?Sized>(link: &str, view: &mut V) -> Self {
        let title = title_from_url(link).unwrap_or_else(|| UNTITLED.to_string());
        view.set_title(&title);
        view.set_pin_label(PIN_LABEL);
        Self {
            title,
            id: id_from_url(link),
            record: None,
            loading: false,
            pinned: false,
            comments: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn record(&self) -> Option<&DocumentRecord> {
        self.record.as_ref()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Returns the id to fetch, or `None` when the link had no id or a fetch
    /// is already running.
    pub fn begin_load<V: DocumentView + ?Sized>(&mut self, view: &mut V) -> Option<i64> {
        let id = self.id?;
        if self.loading {
            return None;
        }
        self.loading = true;
        view.show_notice(Some(StatusLine::info("Loading document details…")));
        Some(id)
    }

    /// A result for an id other than this panel's is dropped.
    pub fn finish_load<V: DocumentView + ?Sized>(
        &mut self,
        id: i64,
        result: Result<DocumentRecord, ApiError>,
        view: &mut V,
    ) {
        if self.id != Some(id) {
            return;
        }
        self.loading = false;
        match result {
            Ok(record) => {
                view.show_details(&record);
                view.show_notice(None);
                self.record = Some(record);
            }
            Err(err) => {
                warn!("Loading document {} failed: {}", id, err);
                let message = if err.is_transport() {
                    "Unable to reach the document service.".to_string()
                } else {
                    err.auth_message()
                };
                view.show_notice(Some(StatusLine::error(message)));
            }
        }
    }

    pub async fn load<B, V>(&mut self, backend: &B, view: &mut V) -> bool
    where
        B: Backend + ?Sized,
        V: DocumentView + ?Sized,
    {
        let Some(id) = self.begin_load(view) else {
            return false;
        };
        let result = backend.get_document(id).await;
        self.finish_load(id, result, view);
        true
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn toggle_pin<V: DocumentView + ?Sized>(&mut self, view: &mut V) -> bool {
        self.pinned = !self.pinned;
        if self.pinned {
            view.set_pin_label(UNPIN_LABEL);
            view.alert("Document pinned.");
        } else {
            view.set_pin_label(PIN_LABEL);
            view.alert("Document unpinned.");
        }
        self.pinned
    }

    /// Returns false for blank text, which is dropped without feedback.
    pub fn add_comment<V: DocumentView + ?Sized>(&mut self, text: &str, view: &mut V) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        view.append_comment(text);
        view.scroll_comments_to_end();
        self.comments.push(text.to_string());
        true
    }
}

//! Pending upload queue for the ingestion screen.

use std::path::{Path, PathBuf};
use tracing::{info, warn};
use url::Url;
use walkdir::WalkDir;

use crate::api::{Backend, IngestReceipt};
use crate::error::ApiError;
use crate::state::{PendingFile, StatusLine};

/// Suffixes accepted by the ingestion pipeline, matched case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 4] = [".md", ".markdown", ".txt", ".rst"];

pub const REJECTED_MESSAGE: &str =
    "No supported files selected. Allowed types: .md, .markdown, .txt, .rst";
pub const UPLOADING_MESSAGE: &str = "Uploading…";
pub const ACCEPTED_MESSAGE: &str = "Upload accepted.";
pub const UNREACHABLE_MESSAGE: &str = "Unable to reach the ingestion service.";

pub trait UploadView {
    fn show_status(&mut self, status: StatusLine);
    fn set_submit_enabled(&mut self, enabled: bool);
    fn render_queue(&mut self, files: &[PendingFile]);
}

pub fn is_supported(name: &str) -> bool {
    let lower = name.to_lowercase();
    ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

#[derive(Debug, Default)]
pub struct UploadQueue {
    files: Vec<PendingFile>,
    in_flight: bool,
    /// Number of files carried by the request in flight
    sending: usize,
}

impl UploadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[PendingFile] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Keep the supported candidates, in order, and report how many were queued.
    pub fn add_files<V: UploadView + ?Sized>(
        &mut self,
        candidates: impl IntoIterator<Item = PendingFile>,
        view: &mut V,
    ) -> usize {
        let accepted: Vec<PendingFile> = candidates
            .into_iter()
            .filter(|file| is_supported(&file.name))
            .collect();

        if accepted.is_empty() {
            view.show_status(StatusLine::error(REJECTED_MESSAGE));
            return 0;
        }

        let added = accepted.len();
        self.files.extend(accepted);
        view.render_queue(&self.files);
        view.set_submit_enabled(!self.in_flight);
        view.show_status(StatusLine::info(format!(
            "{} file(s) ready to upload.",
            self.files.len()
        )));
        added
    }

    pub fn clear<V: UploadView + ?Sized>(&mut self, view: &mut V) {
        self.files.clear();
        view.render_queue(&self.files);
        view.show_status(StatusLine::info("Queue cleared."));
    }

    /// Returns the files to send, or `None` when there is nothing to do.
    pub fn begin_submit<V: UploadView + ?Sized>(&mut self, view: &mut V) -> Option<Vec<PendingFile>> {
        if self.files.is_empty() || self.in_flight {
            return None;
        }

        self.in_flight = true;
        self.sending = self.files.len();
        view.set_submit_enabled(false);
        view.show_status(StatusLine::info(UPLOADING_MESSAGE));
        Some(self.files.clone())
    }

    /// Settle the request; returns how many files the backend accepted.
    ///
    /// Files added while the request was in flight are cleared with the rest
    /// of the queue but are not counted.
    pub fn finish_submit<V: UploadView + ?Sized>(
        &mut self,
        result: Result<IngestReceipt, ApiError>,
        view: &mut V,
    ) -> usize {
        self.in_flight = false;
        let sent = std::mem::take(&mut self.sending);
        match result {
            Ok(receipt) => {
                info!("Upload of {} file(s) accepted", sent);
                // The submit control stays disabled until new files are added
                self.files.clear();
                view.render_queue(&self.files);
                let message = receipt
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| ACCEPTED_MESSAGE.to_string());
                view.show_status(StatusLine::success(message));
                sent
            }
            Err(err) => {
                warn!("Upload of {} file(s) failed: {}", sent, err);
                view.set_submit_enabled(true);
                let message = if err.is_transport() {
                    UNREACHABLE_MESSAGE.to_string()
                } else {
                    err.body_message()
                };
                view.show_status(StatusLine::error(message));
                0
            }
        }
    }

    /// Run a whole submission; returns whether a request was issued.
    pub async fn submit<B, V>(&mut self, backend: &B, view: &mut V) -> bool
    where
        B: Backend + ?Sized,
        V: UploadView + ?Sized,
    {
        let Some(files) = self.begin_submit(view) else {
            return false;
        };
        let result = backend.ingest(&files).await;
        self.finish_submit(result, view);
        true
    }
}

/// Split a terminal paste or file drop into paths.
///
/// Terminals paste dropped files as quoted or backslash-escaped paths
/// separated by spaces or newlines.
pub fn parse_dropped_paths(text: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => quote = Some(c),
            (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            (None, c) if c.is_whitespace() => {
                if !current.is_empty() {
                    paths.push(PathBuf::from(std::mem::take(&mut current)));
                }
            }
            (None, c) => current.push(c),
        }
    }

    if !current.is_empty() {
        paths.push(PathBuf::from(current));
    }

    paths.into_iter().map(decode_file_uri).collect()
}

/// `file://` URIs are percent-decoded; anything that does not parse as one
/// is kept as typed.
fn decode_file_uri(path: PathBuf) -> PathBuf {
    let Some(text) = path.to_str() else {
        return path;
    };
    if !text.starts_with("file://") {
        return path;
    }
    Url::parse(text)
        .ok()
        .and_then(|uri| uri.to_file_path().ok())
        .unwrap_or(path)
}

/// Turn paths into upload candidates, walking directories.
///
/// Extension filtering is left to [`UploadQueue::add_files`].
pub fn collect_candidates<P: AsRef<Path>>(paths: &[P]) -> Vec<PendingFile> {
    let mut candidates = Vec::new();

    for path in paths {
        let path = path.as_ref();
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let size = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(e) => {
                    warn!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            candidates.push(PendingFile::new(name, size, entry.path()));
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeBackend, Recorder};
    use std::fs;
    use tempfile::tempdir;

    fn file(name: &str) -> PendingFile {
        PendingFile::new(name, 10, format!("/tmp/{}", name))
    }

    fn names(files: &[PendingFile]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_filter_keeps_supported_in_order() {
        let mut queue = UploadQueue::new();
        let mut view = Recorder::default();
        let added = queue.add_files(
            vec![
                file("guide.MD"),
                file("photo.png"),
                file("notes.txt"),
                file("design.Markdown"),
                file("archive.tar.gz"),
                file("index.rst"),
                file("notes.txt"),
            ],
            &mut view,
        );

        assert_eq!(added, 5);
        assert_eq!(
            names(queue.files()),
            vec!["guide.MD", "notes.txt", "design.Markdown", "index.rst", "notes.txt"]
        );
        assert_eq!(view.queue, names(queue.files()));
        assert_eq!(view.submit_enabled, Some(true));
        assert_eq!(view.last_status().unwrap().text, "5 file(s) ready to upload.");
    }

    #[test]
    fn test_all_rejected_leaves_queue_unchanged() {
        let mut queue = UploadQueue::new();
        let mut view = Recorder::default();
        queue.add_files(vec![file("a.md")], &mut view);

        let added = queue.add_files(vec![file("b.pdf"), file("c.docx")], &mut view);

        assert_eq!(added, 0);
        assert_eq!(names(queue.files()), vec!["a.md"]);
        let status = view.last_status().unwrap();
        assert!(status.is_error());
        assert_eq!(status.text, REJECTED_MESSAGE);
    }

    #[tokio::test]
    async fn test_submit_empty_queue_is_noop() {
        let backend = FakeBackend::new();
        let mut queue = UploadQueue::new();
        let mut view = Recorder::default();

        assert!(!queue.submit(&backend, &mut view).await);
        assert_eq!(backend.calls(), 0);
        assert!(view.statuses.is_empty());
    }

    #[tokio::test]
    async fn test_success_clears_queue_and_keeps_submit_disabled() {
        let backend = FakeBackend::new().ingest_returns(Ok(IngestReceipt {
            message: Some("Ingestion started for 2 file(s).".to_string()),
        }));
        let mut queue = UploadQueue::new();
        let mut view = Recorder::default();
        queue.add_files(vec![file("a.md"), file("b.txt")], &mut view);

        assert!(queue.submit(&backend, &mut view).await);

        assert!(queue.is_empty());
        assert!(!queue.in_flight());
        assert!(view.queue.is_empty());
        assert_eq!(view.submit_enabled, Some(false));
        assert_eq!(backend.ingested(), vec![vec!["a.md".to_string(), "b.txt".to_string()]]);
        assert_eq!(view.last_status().unwrap().text, "Ingestion started for 2 file(s).");
    }

    #[tokio::test]
    async fn test_success_without_message_uses_generic_text() {
        let backend = FakeBackend::new().ingest_returns(Ok(IngestReceipt::default()));
        let mut queue = UploadQueue::new();
        let mut view = Recorder::default();
        queue.add_files(vec![file("a.md")], &mut view);

        queue.submit(&backend, &mut view).await;

        assert_eq!(view.last_status().unwrap().text, ACCEPTED_MESSAGE);
    }

    #[tokio::test]
    async fn test_failure_reenables_submit_and_keeps_queue() {
        let backend = FakeBackend::new().ingest_returns(Err(ApiError::Status {
            status: 400,
            body: "No valid files".to_string(),
        }));
        let mut queue = UploadQueue::new();
        let mut view = Recorder::default();
        queue.add_files(vec![file("a.md")], &mut view);

        queue.submit(&backend, &mut view).await;

        assert_eq!(names(queue.files()), vec!["a.md"]);
        assert_eq!(view.submit_enabled, Some(true));
        let status = view.last_status().unwrap();
        assert!(status.is_error());
        assert_eq!(status.text, "No valid files");
    }

    #[tokio::test]
    async fn test_network_failure_message() {
        let backend = FakeBackend::new()
            .ingest_returns(Err(ApiError::Transport("connection refused".to_string())));
        let mut queue = UploadQueue::new();
        let mut view = Recorder::default();
        queue.add_files(vec![file("a.md")], &mut view);

        queue.submit(&backend, &mut view).await;

        assert_eq!(view.last_status().unwrap().text, UNREACHABLE_MESSAGE);
    }

    #[test]
    fn test_second_begin_while_in_flight_is_noop() {
        let mut queue = UploadQueue::new();
        let mut view = Recorder::default();
        queue.add_files(vec![file("a.md")], &mut view);

        assert!(queue.begin_submit(&mut view).is_some());
        assert!(queue.begin_submit(&mut view).is_none());

        // Adding during an upload must not re-enable the control
        queue.add_files(vec![file("b.md")], &mut view);
        assert_eq!(view.submit_enabled, Some(false));
    }

    #[test]
    fn test_parse_dropped_paths() {
        let pasted = "'/home/me/My Docs/a.md' /tmp/b\\ c.txt\n\"/tmp/d.rst\"\nfile:///tmp/e.md ";
        assert_eq!(
            parse_dropped_paths(pasted),
            vec![
                PathBuf::from("/home/me/My Docs/a.md"),
                PathBuf::from("/tmp/b c.txt"),
                PathBuf::from("/tmp/d.rst"),
                PathBuf::from("/tmp/e.md"),
            ]
        );
        assert!(parse_dropped_paths("   \n ").is_empty());
    }

    #[test]
    fn test_parse_dropped_file_uris_are_percent_decoded() {
        assert_eq!(
            parse_dropped_paths("file:///tmp/My%20Docs/a.md\nfile:///tmp/r%C3%A9sum%C3%A9.txt"),
            vec![
                PathBuf::from("/tmp/My Docs/a.md"),
                PathBuf::from("/tmp/résumé.txt"),
            ]
        );
        // Not a usable file URI: keep what was pasted
        assert_eq!(
            parse_dropped_paths("file://remote-host/share/a.md"),
            vec![PathBuf::from("file://remote-host/share/a.md")]
        );
    }

    #[test]
    fn test_files_added_in_flight_are_not_counted_as_sent() {
        let mut queue = UploadQueue::new();
        let mut view = Recorder::default();
        queue.add_files(vec![file("a.md"), file("b.md")], &mut view);
        let sent = queue.begin_submit(&mut view).unwrap();
        queue.add_files(vec![file("late.md")], &mut view);

        let accepted = queue.finish_submit(Ok(IngestReceipt::default()), &mut view);

        assert_eq!(sent.len(), 2);
        assert_eq!(accepted, 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_collect_candidates_walks_directories() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.md"), "# Title").unwrap();
        fs::write(dir.path().join("sub").join("b.png"), [0u8; 4]).unwrap();
        let missing = dir.path().join("missing.md");

        let candidates = collect_candidates(&[dir.path().to_path_buf(), missing]);

        assert_eq!(names(&candidates), vec!["a.md", "b.png"]);
        assert_eq!(candidates[0].size, 7);
    }
}

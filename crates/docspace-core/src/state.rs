//! UI-agnostic page state types
//!
//! This module contains data structures that are shared between the terminal UI
//! and the one-shot console commands and don't depend on any rendering surface.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A chat message in the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Info,
    Success,
    Error,
}

/// Inline status text shown under a form or upload area
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub tone: StatusTone,
}

impl StatusLine {
    pub fn info(text: impl Into<String>) -> Self {
        Self { text: text.into(), tone: StatusTone::Info }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self { text: text.into(), tone: StatusTone::Success }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), tone: StatusTone::Error }
    }

    pub fn is_error(&self) -> bool {
        self.tone == StatusTone::Error
    }
}

/// A file selected for upload but not yet sent.
///
/// Only the name and size identify it; the path is kept so the bytes can be
/// read when the multipart body is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub name: String,
    pub size: u64,
    pub path: PathBuf,
}

impl PendingFile {
    pub fn new(name: impl Into<String>, size: u64, path: impl Into<PathBuf>) -> Self {
        Self { name: name.into(), size, path: path.into() }
    }
}

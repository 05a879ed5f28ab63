//! # Docspace core
//!
//! UI-agnostic client logic for the Docspace backend. Each screen is a
//! controller that owns its page state and renders through a small view trait,
//! so the same logic drives the terminal UI, the one-shot CLI commands, and the
//! tests.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`upload`] | Pending file queue for `/api/ingest` |
//! | [`chat`] | Chat transcript for `/api/chat` |
//! | [`auth`] | Login and signup forms |
//! | [`document`] | Document view pin toggle, comments, and record details |
//! | [`dashboard`] | Stored document list |
//! | [`api`] | Backend trait and reqwest client |
//! | [`session`] | Persisted bearer token |

pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod document;
pub mod error;
pub mod session;
pub mod state;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use api::{Backend, HttpBackend};
pub use auth::{AuthForms, AuthPanel, AuthView, DeferredAction};
pub use chat::{ChatComposer, ChatView, ConnectionStatus};
pub use config::Config;
pub use dashboard::{Dashboard, DashboardView};
pub use document::{DocumentPanel, DocumentView};
pub use error::ApiError;
pub use session::{FileTokenStore, MemoryTokenStore, Session, TokenStore};
pub use state::{ChatMessage, ChatRole, PendingFile, StatusLine, StatusTone};
pub use upload::{UploadQueue, UploadView};

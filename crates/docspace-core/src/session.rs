//! Persistent key/value storage for the login session.
//!
//! The login screen writes `access_token` and `token_type` after a successful
//! login; nothing clears them.

use anyhow::Result;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const TOKEN_TYPE_KEY: &str = "token_type";

pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Store backed by a JSON object file, rewritten on every `set`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `session.json` inside the given data directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self.read_map()?;
        Ok(map.get(key).and_then(|v| v.as_str()).map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.read_map()?;
        map.insert(key.to_string(), Value::String(value.to_string()));

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&map)?)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
}

impl Session {
    pub fn load(store: &dyn TokenStore) -> Result<Option<Self>> {
        let token = store.get(ACCESS_TOKEN_KEY)?;
        let token_type = store.get(TOKEN_TYPE_KEY)?;
        Ok(match (token, token_type) {
            (Some(access_token), token_type) if !access_token.is_empty() => Some(Session {
                access_token,
                token_type: token_type.unwrap_or_else(|| "bearer".to_string()),
            }),
            _ => None,
        })
    }

    pub fn save(&self, store: &dyn TokenStore) -> Result<()> {
        store.set(ACCESS_TOKEN_KEY, &self.access_token)?;
        store.set(TOKEN_TYPE_KEY, &self.token_type)?;
        Ok(())
    }
}

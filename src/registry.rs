use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::Context;

use crate::foundation::error::{FmiError, FmiResult};

/// Maps a chat-platform user id to a Last.fm username.
pub trait UserRegistry: Send + Sync {
    fn find(&self, user_id: &str) -> FmiResult<Option<String>>;

    /// Insert or replace the username linked to `user_id`.
    fn link(&self, user_id: &str, username: &str) -> FmiResult<()>;
}

/// Registry persisted as a single JSON object `{ "<user id>": "<username>" }`.
#[derive(Debug)]
pub struct JsonFileRegistry {
    path: PathBuf,
    users: Mutex<BTreeMap<String, String>>,
}

impl JsonFileRegistry {
    /// Load the registry at `path`; a missing file is an empty registry.
    pub fn open(path: impl Into<PathBuf>) -> FmiResult<Self> {
        let path = path.into();
        let users = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("parse user registry '{}'", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read user registry '{}'", path.display()))
                    .into());
            }
        };
        Ok(Self {
            path,
            users: Mutex::new(users),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, users: &BTreeMap<String, String>) -> FmiResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create registry dir '{}'", parent.display()))?;
        }
        let json = serde_json::to_vec_pretty(users).context("serialize user registry")?;
        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, json)
            .with_context(|| format!("write '{}'", temp_path.display()))?;
        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("move registry into place '{}'", self.path.display()))?;
        Ok(())
    }
}

impl UserRegistry for JsonFileRegistry {
    fn find(&self, user_id: &str) -> FmiResult<Option<String>> {
        let users = self
            .users
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(users.get(user_id).cloned())
    }

    fn link(&self, user_id: &str, username: &str) -> FmiResult<()> {
        let user_id = user_id.trim();
        let username = username.trim();
        if user_id.is_empty() || username.is_empty() {
            return Err(FmiError::validation(
                "user id and username must both be non-empty",
            ));
        }

        let mut users = self
            .users
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let previous = users.insert(user_id.to_string(), username.to_string());
        if let Err(e) = self.persist(&users) {
            // Keep memory consistent with disk.
            match previous {
                Some(p) => users.insert(user_id.to_string(), p),
                None => users.remove(user_id),
            };
            return Err(e);
        }
        tracing::info!(user_id, username, replaced = previous.is_some(), "account linked");
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/registry.rs"]
mod tests;

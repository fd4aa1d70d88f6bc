//! Persisted client identity, kept under the `user-storage` key.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const STORAGE_KEY: &str = "user-storage";
pub const STORE_ENV: &str = "ROOMBOARD_STORE";

/// The identity a client last joined with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub room_id: String,
    #[serde(default)]
    pub room_key: String,
}

impl UserState {
    pub fn is_authenticated(&self) -> bool {
        !self.name.is_empty() && !self.email.is_empty() && !self.room_key.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Persisted {
    state: UserState,
    #[serde(default)]
    version: u32,
}

/// JSON file holding one `UserState`.
#[derive(Debug, Clone)]
pub struct UserStore {
    path: PathBuf,
}

impl UserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$ROOMBOARD_STORE` if set, else `<data dir>/roomboard/user-storage.json`.
    pub fn default_location() -> Result<Self> {
        if let Some(path) = std::env::var_os(STORE_ENV) {
            return Ok(Self::new(path));
        }
        let dir = dirs::data_dir().context("Could not determine the user data directory")?;
        Ok(Self::new(
            dir.join("roomboard").join(format!("{}.json", STORAGE_KEY)),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file means nobody has joined yet.
    pub fn load(&self) -> Result<UserState> {
        if !self.path.exists() {
            return Ok(UserState::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let persisted: Persisted = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(persisted.state)
    }

    pub fn set_user(&self, name: &str, email: &str, room_id: &str, room_key: &str) -> Result<UserState> {
        let state = UserState {
            name: name.to_string(),
            email: email.to_string(),
            room_id: room_id.to_string(),
            room_key: room_key.to_string(),
        };
        self.save(&state)?;
        Ok(state)
    }

    pub fn clear_user(&self) -> Result<()> {
        self.save(&UserState::default())
    }

    fn save(&self, state: &UserState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(&Persisted {
            state: state.clone(),
            version: 0,
        })?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "saved user state");
        Ok(())
    }
}

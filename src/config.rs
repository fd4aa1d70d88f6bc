//! Gate configuration, read from `roomboard.toml`.
//!
//! Layered: file → environment (including a `.env` file) → CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! port = 3141
//! dev = false
//!
//! [sync]
//! base_url = "https://api.liveblocks.io"
//!
//! [rooms."design-review"]
//! key = "per-room secret"
//! ```
//!
//! Secrets for the Sync Service and the shared room key come from the
//! environment only (`LIVEBLOCKS_SECRET_KEY`, `KANBAN_SECRET_KEY`).

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "roomboard.toml";
pub const SYNC_SECRET_ENV: &str = "LIVEBLOCKS_SECRET_KEY";
pub const ROOM_SECRET_ENV: &str = "KANBAN_SECRET_KEY";
pub const DEFAULT_SYNC_BASE_URL: &str = "https://api.liveblocks.io";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub dev: bool,
}

fn default_port() -> u16 {
    3141
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            dev: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSection {
    #[serde(default = "default_sync_base_url")]
    pub base_url: String,
}

fn default_sync_base_url() -> String {
    DEFAULT_SYNC_BASE_URL.to_string()
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            base_url: default_sync_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSection {
    pub key: String,
}

/// Contents of `roomboard.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomboardToml {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub sync: SyncSection,
    #[serde(default)]
    pub rooms: BTreeMap<String, RoomSection>,
}

impl RoomboardToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse roomboard.toml")
    }

    /// Returns default configuration if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize roomboard.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Non-fatal problems worth printing at startup.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.server.port == 0 {
            warnings.push("server.port is 0; an ephemeral port will be chosen".to_string());
        }
        if !self.sync.base_url.starts_with("http://") && !self.sync.base_url.starts_with("https://")
        {
            warnings.push(format!(
                "sync.base_url '{}' is not an http(s) URL",
                self.sync.base_url
            ));
        }
        for (room_id, room) in &self.rooms {
            if room.key.trim().is_empty() {
                warnings.push(format!("rooms.\"{}\".key is empty; nobody can join", room_id));
            }
        }
        warnings
    }
}

/// Room-access secrets: per-room keys, falling back to one shared key.
#[derive(Clone, Default)]
pub struct RoomSecrets {
    shared: Option<String>,
    rooms: BTreeMap<String, String>,
}

impl std::fmt::Debug for RoomSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomSecrets")
            .field("shared", &self.shared.as_ref().map(|_| "<redacted>"))
            .field("rooms", &self.rooms.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RoomSecrets {
    pub fn new(shared: Option<String>) -> Self {
        Self {
            shared: shared.filter(|s| !s.is_empty()),
            rooms: BTreeMap::new(),
        }
    }

    pub fn with_room(mut self, room_id: impl Into<String>, key: impl Into<String>) -> Self {
        self.rooms.insert(room_id.into(), key.into());
        self
    }

    /// The secret that guards `room_id`, if any is configured.
    pub fn resolve(&self, room_id: &str) -> Option<&str> {
        self.rooms
            .get(room_id)
            .or(self.shared.as_ref())
            .map(String::as_str)
    }

    /// Exact comparison against the room's secret. No secret means no entry.
    pub fn verify(&self, room_id: &str, key: &str) -> bool {
        self.resolve(room_id).is_some_and(|secret| secret == key)
    }

    pub fn is_empty(&self) -> bool {
        self.shared.is_none() && self.rooms.is_empty()
    }
}

/// Fully resolved settings for the gate server.
#[derive(Clone)]
pub struct GateConfig {
    pub port: u16,
    pub dev_mode: bool,
    pub sync_base_url: String,
    pub sync_secret: Option<String>,
    pub secrets: RoomSecrets,
}

impl GateConfig {
    /// Merge the config file with environment secrets. Loads `.env` first.
    pub fn resolve(file: &RoomboardToml) -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_parts(
            file,
            std::env::var(SYNC_SECRET_ENV).ok(),
            std::env::var(ROOM_SECRET_ENV).ok(),
        )
    }

    pub fn from_parts(
        file: &RoomboardToml,
        sync_secret: Option<String>,
        shared_room_secret: Option<String>,
    ) -> Self {
        let secrets = file
            .rooms
            .iter()
            .fold(RoomSecrets::new(shared_room_secret), |acc, (id, room)| {
                acc.with_room(id.clone(), room.key.clone())
            });
        Self {
            port: file.server.port,
            dev_mode: file.server.dev,
            sync_base_url: file.sync.base_url.trim_end_matches('/').to_string(),
            sync_secret: sync_secret.filter(|s| !s.is_empty()),
            secrets,
        }
    }
}

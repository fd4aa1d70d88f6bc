use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ── Transient room notifications ─────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notification {
    TaskMoved(TaskMovedEvent),
    #[serde(rename_all = "camelCase")]
    TaskAdded {
        column_title: String,
        user_name: String,
    },
    #[serde(rename_all = "camelCase")]
    TaskDeleted {
        task_title: String,
        column_title: Option<String>,
        user_name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMovedEvent {
    pub task_title: String,
    pub source_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_column: Option<String>,
    #[serde(default)]
    pub is_same_column: bool,
    #[serde(default)]
    pub dropped_outside: bool,
    pub user_name: String,
}

impl Notification {
    /// Toast text shown to the peers that receive this notification.
    pub fn render(&self) -> String {
        match self {
            Self::TaskMoved(e) if e.dropped_outside => format!(
                "{} dropped task \"{}\" outside of any column",
                e.user_name, e.task_title
            ),
            Self::TaskMoved(e) if e.is_same_column => format!(
                "{} reordered task \"{}\" in \"{}\"",
                e.user_name, e.task_title, e.source_column
            ),
            Self::TaskMoved(e) => format!(
                "{} moved task \"{}\" from \"{}\" to \"{}\"",
                e.user_name,
                e.task_title,
                e.source_column,
                e.destination_column.as_deref().unwrap_or_default()
            ),
            Self::TaskAdded {
                column_title,
                user_name,
            } => format!("{} added a new task to \"{}\"", user_name, column_title),
            Self::TaskDeleted {
                task_title,
                column_title,
                user_name,
            } => format!(
                "{} deleted task \"{}\" from \"{}\"",
                user_name,
                task_title,
                column_title.as_deref().unwrap_or_default()
            ),
        }
    }
}

/// A notification as it travels over the room's ephemeral channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomEvent {
    /// Sender's connection; `None` for events not originating from a peer.
    pub connection_id: Option<u64>,
    pub event: Notification,
}

impl RoomEvent {
    /// Toast for a received event. Events without a peer connection are ignored.
    pub fn toast(&self) -> Option<String> {
        self.connection_id.map(|_| self.event.render())
    }
}

// ── Local notices ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Feedback shown only to the user who issued a mutation. Never broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalNotice {
    pub level: NoticeLevel,
    pub message: String,
}

impl LocalNotice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

// ── Broadcast channel ────────────────────────────────────────────────

/// Fire-and-forget publisher for one connection's notifications.
///
/// Delivery is best effort: no acknowledgement, no retry, and a send with no
/// live subscribers is silently dropped. Nothing about board state depends
/// on these messages arriving.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<RoomEvent>,
    connection_id: u64,
}

impl Notifier {
    pub fn new(tx: broadcast::Sender<RoomEvent>, connection_id: u64) -> Self {
        Self { tx, connection_id }
    }

    /// A notifier on its own channel, for a session that is not yet connected.
    pub fn detached(connection_id: u64) -> Self {
        let (tx, _rx) = broadcast::channel(64);
        Self { tx, connection_id }
    }

    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoomEvent> {
        self.tx.subscribe()
    }

    pub fn broadcast(&self, event: Notification) {
        let event = RoomEvent {
            connection_id: Some(self.connection_id),
            event,
        };
        if self.tx.send(event).is_err() {
            tracing::trace!(connection_id = self.connection_id, "no listeners for room event");
        }
    }
}

//! Presence Projection: a read-only view over the room's live sessions.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// How many remote users are shown before collapsing into "N more".
pub const VISIBLE_USERS: usize = 3;

/// Identity attached to a session grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    pub email: String,
    pub avatar: String,
}

impl UserInfo {
    /// Two-character fallback shown when the avatar cannot load.
    pub fn initials(&self) -> String {
        self.name.chars().take(2).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub x: f64,
    pub y: f64,
}

/// Per-connection ephemeral state. Lives as long as the connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presence {
    pub cursor: Option<Cursor>,
    pub viewing_task_id: Option<String>,
    pub dragging_task: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub connection_id: u64,
    pub info: UserInfo,
    pub presence: Presence,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OnlineUsers<'a> {
    /// The local session first, then each remote session once.
    pub users: Vec<&'a Session>,
    /// Leading remote sessions rendered as avatars.
    pub visible: Vec<&'a Session>,
    /// Remote sessions folded into the overflow list. The local user is not
    /// counted here, unlike the web client's `+N` badge.
    pub overflow: usize,
}

impl OnlineUsers<'_> {
    pub fn total(&self) -> usize {
        self.users.len()
    }
}

/// Order and bound the room's sessions for display.
pub fn project<'a>(local: &'a Session, others: &'a [Session], limit: usize) -> OnlineUsers<'a> {
    let mut seen = HashSet::from([local.connection_id]);
    let remote: Vec<&Session> = others
        .iter()
        .filter(|s| seen.insert(s.connection_id))
        .collect();

    let visible: Vec<&Session> = remote.iter().take(limit).copied().collect();
    let overflow = remote.len() - visible.len();
    let users = std::iter::once(local).chain(remote).collect();

    OnlineUsers {
        users,
        visible,
        overflow,
    }
}

/// Remote sessions that currently have the task open.
pub fn viewer_count(others: &[Session], task_id: &str) -> usize {
    others
        .iter()
        .filter(|s| s.presence.viewing_task_id.as_deref() == Some(task_id))
        .count()
}

/// Remote sessions currently dragging the task.
pub fn dragging<'a>(others: &'a [Session], task_id: &str) -> Vec<&'a Session> {
    others
        .iter()
        .filter(|s| s.presence.dragging_task.as_deref() == Some(task_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: u64, name: &str) -> Session {
        Session {
            connection_id: id,
            info: UserInfo {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                avatar: "https://liveblocks.io/avatars/avatar-1.png".into(),
            },
            presence: Presence::default(),
        }
    }

    #[test]
    fn test_local_first_and_deduplicated() {
        let local = session(1, "Me");
        let others = vec![session(2, "Ann"), session(1, "Me"), session(2, "Ann"), session(3, "Bo")];
        let online = project(&local, &others, VISIBLE_USERS);

        let ids: Vec<u64> = online.users.iter().map(|s| s.connection_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(online.visible.len(), 2);
        assert_eq!(online.overflow, 0);
        assert_eq!(online.total(), 3);
    }

    #[test]
    fn test_overflow_counts_hidden_remote_users() {
        let local = session(1, "Me");
        let others: Vec<Session> = (2..=6).map(|i| session(i, &format!("U{}", i))).collect();
        let online = project(&local, &others, 3);
        assert_eq!(online.visible.len(), 3);
        assert_eq!(online.visible[0].connection_id, 2);
        assert_eq!(online.overflow, 2);
        assert_eq!(online.total(), 6);
    }

    #[test]
    fn test_viewers_and_draggers() {
        let mut a = session(2, "Ann");
        a.presence.viewing_task_id = Some("task-1".into());
        let mut b = session(3, "Bo");
        b.presence.viewing_task_id = Some("task-1".into());
        b.presence.dragging_task = Some("task-2".into());
        let others = vec![a, b, session(4, "Cy")];

        assert_eq!(viewer_count(&others, "task-1"), 2);
        assert_eq!(viewer_count(&others, "task-2"), 0);
        let draggers = dragging(&others, "task-2");
        assert_eq!(draggers.len(), 1);
        assert_eq!(draggers[0].info.name, "Bo");
    }

    #[test]
    fn test_presence_wire_shape() {
        let presence = Presence {
            cursor: None,
            viewing_task_id: Some("task-1".into()),
            dragging_task: None,
        };
        let json = serde_json::to_value(&presence).unwrap();
        assert_eq!(json["viewingTaskId"], "task-1");
        assert!(json["draggingTask"].is_null());
    }

    #[test]
    fn test_initials() {
        assert_eq!(session(1, "Ada").info.initials(), "Ad");
        assert_eq!(session(1, "Z").info.initials(), "Z");
    }
}

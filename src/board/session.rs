//! Per-user session over a room replica: runs mutations, tracks presence,
//! and debounces text edits.

use std::time::Instant;

use crate::errors::BoardError;

use super::debounce::{EditDebouncer, EditField};
use super::models::Board;
use super::notify::{LocalNotice, Notifier};
use super::presence::Presence;
use super::protocol::{self, DropResult, Mutation};
use super::replica::{LocalApply, Replica};
use super::seed::{generate_id, now_millis};

/// One user's connection to a room board.
///
/// This is the mutation boundary: every operation either applies in full
/// or is turned into an error notice. Failures never escape as errors.
pub struct BoardSession {
    replica: Replica,
    notifier: Notifier,
    user_name: String,
    presence: Presence,
    edits: EditDebouncer,
}

impl BoardSession {
    pub fn new(replica: Replica, notifier: Notifier, user_name: impl Into<String>) -> Self {
        Self {
            replica,
            notifier,
            user_name: user_name.into(),
            presence: Presence::default(),
            edits: EditDebouncer::default(),
        }
    }

    pub fn board(&self) -> &Board {
        self.replica.board()
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn replica_mut(&mut self) -> &mut Replica {
        &mut self.replica
    }

    pub fn on_drag_start(&mut self, task_id: &str) {
        self.presence.dragging_task = Some(task_id.to_string());
    }

    pub fn on_drag_end(&mut self, drop: &DropResult) -> Option<LocalNotice> {
        self.presence.dragging_task = None;
        let result = protocol::resolve_drop(self.replica.board(), drop, &self.user_name);
        self.commit("move task", result)
    }

    pub fn add_task(&mut self, column_id: &str) -> Option<LocalNotice> {
        let result = protocol::add_task(
            self.replica.board(),
            column_id,
            generate_id(),
            now_millis(),
            &self.user_name,
        );
        self.commit("add task", result)
    }

    pub fn delete_task(&mut self, task_id: &str) -> Option<LocalNotice> {
        let result = protocol::delete_task(self.replica.board(), task_id, &self.user_name);
        self.commit("delete task", result)
    }

    pub fn open_task(&mut self, task_id: &str) {
        self.presence.viewing_task_id = Some(task_id.to_string());
    }

    /// Close the task dialog. Edits still waiting on the debounce are written now.
    pub fn close_task(&mut self) -> usize {
        self.presence.viewing_task_id = None;
        let edits = self.edits.take_all();
        self.write_edits(edits)
    }

    pub fn edit_title(&mut self, task_id: &str, title: &str, now: Instant) {
        self.edits.push(task_id, EditField::Title, title.to_string(), now);
    }

    pub fn edit_description(&mut self, task_id: &str, description: &str, now: Instant) {
        self.edits
            .push(task_id, EditField::Description, description.to_string(), now);
    }

    pub fn next_edit_deadline(&self) -> Option<Instant> {
        self.edits.next_deadline()
    }

    /// Write every edit that has been idle past the debounce delay.
    /// Returns how many fields changed.
    pub fn flush_edits(&mut self, now: Instant) -> usize {
        let edits = self.edits.take_due(now);
        self.write_edits(edits)
    }

    fn write_edits(&mut self, edits: Vec<super::debounce::PendingEdit>) -> usize {
        let mut written = 0;
        for edit in edits {
            let board = self.replica.board();
            let result = match edit.field {
                EditField::Title => protocol::rename_title(board, &edit.task_id, &edit.value),
                EditField::Description => {
                    protocol::update_description(board, &edit.task_id, &edit.value)
                }
            };
            match result {
                Ok(mutation) if !mutation.is_noop() => {
                    self.replica.apply_local(mutation.patches);
                    written += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(task_id = %edit.task_id, error = %e, "dropping edit for missing task");
                }
            }
        }
        written
    }

    fn commit(&mut self, op: &str, result: Result<Mutation, BoardError>) -> Option<LocalNotice> {
        match result {
            Ok(mutation) => {
                if !mutation.is_noop() {
                    let tx = self.replica.apply_local(mutation.patches);
                    tracing::debug!(
                        room_id = %self.replica.room_id(),
                        tx_id = %tx.id,
                        op,
                        "applied local transaction"
                    );
                }
                if let Some(notification) = mutation.notification {
                    self.notifier.broadcast(notification);
                }
                mutation.notice
            }
            Err(e) => {
                tracing::error!(room_id = %self.replica.room_id(), op, error = %e, "mutation aborted");
                Some(LocalNotice::error(format!("Failed to {}: {}", op, e.summary())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::board::notify::{NoticeLevel, Notification};
    use crate::board::protocol::DragLocation;
    use crate::board::seed::initial_board;

    fn session() -> BoardSession {
        BoardSession::new(
            Replica::open("R1", Some(initial_board(0))),
            Notifier::detached(1),
            "Ada",
        )
    }

    fn drop_result(task: &str, from: (&str, usize), to: Option<(&str, usize)>) -> DropResult {
        DropResult {
            task_id: task.into(),
            source: DragLocation {
                column_id: from.0.into(),
                index: from.1,
            },
            destination: to.map(|(c, i)| DragLocation {
                column_id: c.into(),
                index: i,
            }),
        }
    }

    #[tokio::test]
    async fn test_move_applies_and_broadcasts() {
        let mut s = session();
        let mut rx = s.notifier().subscribe();
        s.on_drag_start("task-2");
        assert_eq!(s.presence().dragging_task.as_deref(), Some("task-2"));

        let notice = s
            .on_drag_end(&drop_result("task-2", ("column-2", 0), Some(("column-3", 1))))
            .unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(s.presence().dragging_task, None);
        assert_eq!(s.board().columns["column-3"].task_ids, vec!["task-3", "task-2"]);
        assert_eq!(s.replica_mut().pending(), 1);

        let event = rx.recv().await.unwrap();
        assert!(matches!(event.event, Notification::TaskMoved(_)));
    }

    #[test]
    fn test_unchanged_drop_touches_nothing() {
        let mut s = session();
        let mut rx = s.notifier().subscribe();
        let before = s.board().clone();
        let notice = s
            .on_drag_end(&drop_result("task-1", ("column-1", 0), Some(("column-1", 0))))
            .unwrap();
        assert_eq!(notice.message, "Task position unchanged");
        assert_eq!(s.board(), &before);
        assert_eq!(s.replica_mut().pending(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_missing_column_becomes_error_notice() {
        let mut s = session();
        let before = s.board().clone();
        let notice = s
            .on_drag_end(&drop_result("task-1", ("column-1", 0), Some(("column-9", 0))))
            .unwrap();
        assert_eq!(notice, LocalNotice::error("Failed to move task: Column not found"));
        assert_eq!(s.board(), &before);
    }

    #[test]
    fn test_add_then_delete_keeps_board_consistent() {
        let mut s = session();
        s.add_task("column-1").unwrap();
        let new_id = s.board().columns["column-1"].task_ids.last().unwrap().clone();
        assert_eq!(s.board().tasks.len(), 4);

        s.delete_task(&new_id).unwrap();
        assert_eq!(s.board().tasks.len(), 3);
        assert!(s.board().check_invariants().is_empty());

        let notice = s.delete_task(&new_id).unwrap();
        assert_eq!(notice, LocalNotice::error("Failed to delete task: Task not found"));
    }

    #[test]
    fn test_add_task_stamps_creation_time() {
        let mut s = session();
        let before = now_millis();
        s.add_task("column-2").unwrap();
        let after = now_millis();

        let id = s.board().columns["column-2"].task_ids.last().unwrap().clone();
        let task = &s.board().tasks[&id];
        assert!(task.created_at >= before && task.created_at <= after);
        assert_eq!(task.column_id, "column-2");
        let (millis, suffix) = id.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 8);
    }

    #[test]
    fn test_edits_are_debounced() {
        let mut s = session();
        let start = Instant::now();
        s.open_task("task-1");
        assert_eq!(s.presence().viewing_task_id.as_deref(), Some("task-1"));

        s.edit_title("task-1", "Wr", start);
        s.edit_title("task-1", "Write", start + Duration::from_millis(400));
        assert_eq!(s.flush_edits(start + Duration::from_millis(900)), 0);
        assert_eq!(s.board().tasks["task-1"].title, "Task 1");

        assert_eq!(s.flush_edits(start + Duration::from_millis(1400)), 1);
        assert_eq!(s.board().tasks["task-1"].title, "Write");
    }

    #[test]
    fn test_close_task_flushes_pending_edits() {
        let mut s = session();
        let now = Instant::now();
        s.open_task("task-3");
        s.edit_description("task-3", "Done and dusted", now);
        s.edit_title("task-3", "Task 3", now);
        assert!(s.next_edit_deadline().is_some());

        assert_eq!(s.close_task(), 1);
        assert_eq!(s.board().tasks["task-3"].description, "Done and dusted");
        assert_eq!(s.presence().viewing_task_id, None);
    }
}

//! Board Mutation Protocol.
//!
//! Each operation reads the current board and produces a [`Mutation`]: the
//! patches to apply locally, the notification for peers, and the notice for
//! the acting user. Nothing here touches the replica or the network; the
//! session applies and publishes the result.

use serde::{Deserialize, Serialize};

use crate::errors::BoardError;

use super::models::{Board, Priority, Task};
use super::notify::{LocalNotice, Notification, TaskMovedEvent};
use super::patch::BoardPatch;

pub const NEW_TASK_TITLE: &str = "New Task";
pub const NEW_TASK_DESCRIPTION: &str = "Description for new task";

/// A slot on the board: a column and a position within it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragLocation {
    pub column_id: String,
    pub index: usize,
}

/// The end of a drag gesture. `destination` is `None` when the task was
/// released outside every column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropResult {
    pub task_id: String,
    pub source: DragLocation,
    pub destination: Option<DragLocation>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mutation {
    pub patches: Vec<BoardPatch>,
    pub notification: Option<Notification>,
    pub notice: Option<LocalNotice>,
}

impl Mutation {
    pub fn is_noop(&self) -> bool {
        self.patches.is_empty()
    }

    fn notice_only(notice: LocalNotice) -> Self {
        Self {
            notice: Some(notice),
            ..Self::default()
        }
    }
}

/// Dispatch a finished drag to the matching operation.
pub fn resolve_drop(board: &Board, drop: &DropResult, user_name: &str) -> Result<Mutation, BoardError> {
    match &drop.destination {
        None => Ok(drop_outside(board, &drop.task_id, user_name)),
        Some(dest) if *dest == drop.source => Ok(unchanged()),
        Some(dest) => move_task(
            board,
            &drop.task_id,
            &drop.source.column_id,
            dest.index,
            &dest.column_id,
            user_name,
        ),
    }
}

/// Same slot in, same slot out: nothing to write, nothing to tell peers.
pub fn unchanged() -> Mutation {
    Mutation::notice_only(LocalNotice::info("Task position unchanged"))
}

/// A drag that ended outside every column. Only peers hear about it.
pub fn drop_outside(board: &Board, task_id: &str, user_name: &str) -> Mutation {
    let notification = board.task(task_id).map(|task| {
        Notification::TaskMoved(TaskMovedEvent {
            task_title: task.title.clone(),
            source_column: String::new(),
            destination_column: None,
            is_same_column: false,
            dropped_outside: true,
            user_name: user_name.to_string(),
        })
    });
    Mutation {
        notification,
        ..Mutation::default()
    }
}

/// Move a task to `dest_index` of `dest_column_id`. The index is clamped to
/// the destination's length after the task has been taken out of its source.
pub fn move_task(
    board: &Board,
    task_id: &str,
    source_column_id: &str,
    dest_index: usize,
    dest_column_id: &str,
    user_name: &str,
) -> Result<Mutation, BoardError> {
    let source = board
        .column(source_column_id)
        .ok_or_else(|| BoardError::ColumnNotFound {
            id: source_column_id.to_string(),
        })?;
    let dest = board
        .column(dest_column_id)
        .ok_or_else(|| BoardError::ColumnNotFound {
            id: dest_column_id.to_string(),
        })?;
    let task = board.task(task_id).ok_or_else(|| BoardError::TaskNotFound {
        id: task_id.to_string(),
    })?;

    let mut source_ids: Vec<String> = source
        .task_ids
        .iter()
        .filter(|id| *id != task_id)
        .cloned()
        .collect();

    if source_column_id == dest_column_id {
        let at = dest_index.min(source_ids.len());
        source_ids.insert(at, task_id.to_string());
        return Ok(Mutation {
            patches: vec![BoardPatch::SetTaskIds {
                column_id: source.id.clone(),
                task_ids: source_ids,
            }],
            notification: Some(Notification::TaskMoved(TaskMovedEvent {
                task_title: task.title.clone(),
                source_column: source.title.clone(),
                destination_column: None,
                is_same_column: true,
                dropped_outside: false,
                user_name: user_name.to_string(),
            })),
            notice: Some(LocalNotice::success(format!(
                "Task \"{}\" reordered in \"{}\"",
                task.title, source.title
            ))),
        });
    }

    let mut dest_ids: Vec<String> = dest
        .task_ids
        .iter()
        .filter(|id| *id != task_id)
        .cloned()
        .collect();
    let at = dest_index.min(dest_ids.len());
    dest_ids.insert(at, task_id.to_string());

    Ok(Mutation {
        patches: vec![
            BoardPatch::SetTaskColumn {
                task_id: task_id.to_string(),
                column_id: dest.id.clone(),
            },
            BoardPatch::SetTaskIds {
                column_id: source.id.clone(),
                task_ids: source_ids,
            },
            BoardPatch::SetTaskIds {
                column_id: dest.id.clone(),
                task_ids: dest_ids,
            },
        ],
        notification: Some(Notification::TaskMoved(TaskMovedEvent {
            task_title: task.title.clone(),
            source_column: source.title.clone(),
            destination_column: Some(dest.title.clone()),
            is_same_column: false,
            dropped_outside: false,
            user_name: user_name.to_string(),
        })),
        notice: Some(LocalNotice::success(format!(
            "Task \"{}\" moved from \"{}\" to \"{}\"",
            task.title, source.title, dest.title
        ))),
    })
}

/// Append a default task to the end of a column.
pub fn add_task(
    board: &Board,
    column_id: &str,
    task_id: String,
    now: i64,
    user_name: &str,
) -> Result<Mutation, BoardError> {
    let column = board.column(column_id).ok_or_else(|| BoardError::ColumnNotFound {
        id: column_id.to_string(),
    })?;

    let task = Task {
        id: task_id.clone(),
        title: NEW_TASK_TITLE.to_string(),
        description: NEW_TASK_DESCRIPTION.to_string(),
        priority: Priority::Medium,
        assignee_id: None,
        labels: Vec::new(),
        created_at: now,
        column_id: column.id.clone(),
    };
    let mut task_ids = column.task_ids.clone();
    task_ids.push(task_id);

    Ok(Mutation {
        patches: vec![
            BoardPatch::PutTask { task },
            BoardPatch::SetTaskIds {
                column_id: column.id.clone(),
                task_ids,
            },
        ],
        notification: Some(Notification::TaskAdded {
            column_title: column.title.clone(),
            user_name: user_name.to_string(),
        }),
        notice: Some(LocalNotice::success(format!(
            "New task added to \"{}\"",
            column.title
        ))),
    })
}

/// Remove a task and every column reference to it in one transaction.
pub fn delete_task(board: &Board, task_id: &str, user_name: &str) -> Result<Mutation, BoardError> {
    let task = board.task(task_id).ok_or_else(|| BoardError::TaskNotFound {
        id: task_id.to_string(),
    })?;
    let column_title = board.column(&task.column_id).map(|c| c.title.clone());

    let mut patches = vec![BoardPatch::DeleteTask {
        task_id: task_id.to_string(),
    }];
    for column in board.ordered_columns() {
        if column.task_ids.iter().any(|id| id == task_id) {
            patches.push(BoardPatch::SetTaskIds {
                column_id: column.id.clone(),
                task_ids: column
                    .task_ids
                    .iter()
                    .filter(|id| *id != task_id)
                    .cloned()
                    .collect(),
            });
        }
    }

    Ok(Mutation {
        patches,
        notice: Some(LocalNotice::success(format!(
            "Deleted task \"{}\" from \"{}\"",
            task.title,
            column_title.as_deref().unwrap_or_default()
        ))),
        notification: Some(Notification::TaskDeleted {
            task_title: task.title.clone(),
            column_title,
            user_name: user_name.to_string(),
        }),
    })
}

/// Replace a task's title. Silent: no notification, no notice.
pub fn rename_title(board: &Board, task_id: &str, title: &str) -> Result<Mutation, BoardError> {
    let task = board.task(task_id).ok_or_else(|| BoardError::TaskNotFound {
        id: task_id.to_string(),
    })?;
    if task.title == title {
        return Ok(Mutation::default());
    }
    Ok(Mutation {
        patches: vec![BoardPatch::SetTaskTitle {
            task_id: task_id.to_string(),
            title: title.to_string(),
        }],
        ..Mutation::default()
    })
}

/// Replace a task's description. Silent: no notification, no notice.
pub fn update_description(
    board: &Board,
    task_id: &str,
    description: &str,
) -> Result<Mutation, BoardError> {
    let task = board.task(task_id).ok_or_else(|| BoardError::TaskNotFound {
        id: task_id.to_string(),
    })?;
    if task.description == description {
        return Ok(Mutation::default());
    }
    Ok(Mutation {
        patches: vec![BoardPatch::SetTaskDescription {
            task_id: task_id.to_string(),
            description: description.to_string(),
        }],
        ..Mutation::default()
    })
}

//! Field-level board patches and the transactions that group them.
//!
//! A patch replaces exactly one leaf (a task field, a column's `taskIds`)
//! or adds/removes one map key. Applying patches in arrival order gives
//! last-write-wins per leaf and add/remove-wins per key, which is the
//! convergence the Sync Service provides. A patch that targets a key no
//! longer present is dropped rather than resurrecting it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::{Board, Column, Task};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum BoardPatch {
    PutTask {
        task: Task,
    },
    DeleteTask {
        task_id: String,
    },
    PutColumn {
        column: Column,
    },
    SetTaskIds {
        column_id: String,
        task_ids: Vec<String>,
    },
    SetTaskColumn {
        task_id: String,
        column_id: String,
    },
    SetTaskTitle {
        task_id: String,
        title: String,
    },
    SetTaskDescription {
        task_id: String,
        description: String,
    },
}

/// One mutation's worth of patches, applied atomically by the issuer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub patches: Vec<BoardPatch>,
}

impl Transaction {
    pub fn new(patches: Vec<BoardPatch>) -> Self {
        Self {
            id: Uuid::new_v4(),
            patches,
        }
    }
}

impl Board {
    /// Apply a single patch. Returns `false` when the target was missing
    /// and the patch was dropped.
    pub fn apply(&mut self, patch: &BoardPatch) -> bool {
        match patch {
            BoardPatch::PutTask { task } => {
                self.tasks.insert(task.id.clone(), task.clone());
                true
            }
            BoardPatch::DeleteTask { task_id } => self.tasks.remove(task_id).is_some(),
            BoardPatch::PutColumn { column } => {
                self.columns.insert(column.id.clone(), column.clone());
                true
            }
            BoardPatch::SetTaskIds {
                column_id,
                task_ids,
            } => match self.columns.get_mut(column_id) {
                Some(column) => {
                    column.task_ids = task_ids.clone();
                    true
                }
                None => false,
            },
            BoardPatch::SetTaskColumn { task_id, column_id } => {
                self.update_task(task_id, |t| t.column_id = column_id.clone())
            }
            BoardPatch::SetTaskTitle { task_id, title } => {
                self.update_task(task_id, |t| t.title = title.clone())
            }
            BoardPatch::SetTaskDescription {
                task_id,
                description,
            } => self.update_task(task_id, |t| t.description = description.clone()),
        }
    }

    /// Apply every patch of a transaction in order. Returns how many took effect.
    pub fn apply_transaction(&mut self, tx: &Transaction) -> usize {
        tx.patches.iter().filter(|p| self.apply(p)).count()
    }

    fn update_task(&mut self, task_id: &str, f: impl FnOnce(&mut Task)) -> bool {
        match self.tasks.get_mut(task_id) {
            Some(task) => {
                f(task);
                true
            }
            None => false,
        }
    }
}

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
    pub column_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub title: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wip_limit: Option<u32>,
    pub order: i32,
    /// Epoch milliseconds.
    pub created_at: i64,
    #[serde(default)]
    pub task_ids: Vec<String>,
}

/// Root replicated aggregate of a room.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Board {
    #[serde(default)]
    pub tasks: BTreeMap<String, Task>,
    #[serde(default)]
    pub columns: BTreeMap<String, Column>,
}

/// A breach of the Column ↔ Task consistency rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A column lists an id absent from `tasks`.
    DanglingTaskId { column_id: String, task_id: String },
    /// A column lists the same id more than once.
    DuplicateTaskId { column_id: String, task_id: String },
    /// A task is listed by no column, or by more than one.
    Unplaced { task_id: String, listed_in: usize },
    /// A task's `columnId` disagrees with the column that lists it.
    ColumnMismatch {
        task_id: String,
        column_id: String,
        listed_in: String,
    },
}

impl Board {
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.get(id)
    }

    /// Columns in display order: `order` ascending, then creation time, then id.
    pub fn ordered_columns(&self) -> Vec<&Column> {
        let mut columns: Vec<&Column> = self.columns.values().collect();
        columns.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        columns
    }

    /// Tasks of a column in position order. Ids that no longer resolve are skipped.
    pub fn tasks_in(&self, column_id: &str) -> Vec<&Task> {
        self.column(column_id)
            .map(|column| {
                column
                    .task_ids
                    .iter()
                    .filter_map(|id| self.tasks.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The column whose `taskIds` lists the task, if any.
    pub fn owning_column(&self, task_id: &str) -> Option<&Column> {
        self.ordered_columns()
            .into_iter()
            .find(|c| c.task_ids.iter().any(|id| id == task_id))
    }

    pub fn view(&self) -> BoardView {
        BoardView {
            columns: self
                .ordered_columns()
                .into_iter()
                .map(|column| ColumnView {
                    column: column.clone(),
                    tasks: self.tasks_in(&column.id).into_iter().cloned().collect(),
                })
                .collect(),
        }
    }

    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();
        let mut listings: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

        for column in self.columns.values() {
            let mut seen = std::collections::BTreeSet::new();
            for task_id in &column.task_ids {
                if !seen.insert(task_id.as_str()) {
                    violations.push(InvariantViolation::DuplicateTaskId {
                        column_id: column.id.clone(),
                        task_id: task_id.clone(),
                    });
                    continue;
                }
                if !self.tasks.contains_key(task_id) {
                    violations.push(InvariantViolation::DanglingTaskId {
                        column_id: column.id.clone(),
                        task_id: task_id.clone(),
                    });
                    continue;
                }
                listings
                    .entry(task_id.as_str())
                    .or_default()
                    .push(column.id.as_str());
            }
        }

        for task in self.tasks.values() {
            let listed = listings.get(task.id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
            match listed {
                [only] if *only == task.column_id => {}
                [only] => violations.push(InvariantViolation::ColumnMismatch {
                    task_id: task.id.clone(),
                    column_id: task.column_id.clone(),
                    listed_in: (*only).to_string(),
                }),
                _ => violations.push(InvariantViolation::Unplaced {
                    task_id: task.id.clone(),
                    listed_in: listed.len(),
                }),
            }
        }

        violations
    }
}

// View types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardView {
    pub columns: Vec<ColumnView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnView {
    #[serde(flatten)]
    pub column: Column,
    pub tasks: Vec<Task>,
}

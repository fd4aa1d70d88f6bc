//! Initial board contents for a freshly created room.

use super::models::{Board, Column, Priority, Task};

/// Generate a time-prefixed id: `"{epoch-millis}-{8 hex chars}"`.
pub fn generate_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", chrono::Utc::now().timestamp_millis(), &suffix[..8])
}

/// Current time in epoch milliseconds, the timestamp unit of the board.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// The board a room starts with: three columns holding one task each.
pub fn initial_board(now: i64) -> Board {
    let columns = [
        ("column-1", "To Do", "#f0f0f0", 1, "task-1"),
        ("column-2", "In Progress", "#ffd700", 2, "task-2"),
        ("column-3", "Done", "#90ee90", 3, "task-3"),
    ];
    let tasks = [
        ("task-1", 1, Priority::Medium, "column-1"),
        ("task-2", 2, Priority::High, "column-2"),
        ("task-3", 3, Priority::Low, "column-3"),
    ];

    let mut board = Board::default();
    for (id, title, color, order, task_id) in columns {
        board.columns.insert(
            id.to_string(),
            Column {
                id: id.to_string(),
                title: title.to_string(),
                color: color.to_string(),
                wip_limit: None,
                order,
                created_at: now,
                task_ids: vec![task_id.to_string()],
            },
        );
    }
    for (id, n, priority, column_id) in tasks {
        board.tasks.insert(
            id.to_string(),
            Task {
                id: id.to_string(),
                title: format!("Task {}", n),
                description: format!("Description for Task {}", n),
                priority,
                assignee_id: None,
                labels: Vec::new(),
                created_at: now,
                column_id: column_id.to_string(),
            },
        );
    }
    board
}

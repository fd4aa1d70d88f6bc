//! The local copy of a room's board and its two-phase contract with the
//! Sync Service.
//!
//! - [`LocalApply`]: synchronous. A transaction takes effect on the local
//!   board immediately and is queued for upload.
//! - [`RemoteReconcile`]: asynchronous. Queued transactions are handed to a
//!   [`SyncSink`], and the Sync Service's ordered stream (peers' transactions
//!   and echoes of our own) is folded into the confirmed board.
//!
//! The visible board is the confirmed board with every unconfirmed local
//! transaction replayed on top. When our own echo arrives it takes its place
//! in service order, so every replica ends at the same fold once the stream
//! has been drained.

use std::collections::VecDeque;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::models::Board;
use super::patch::{BoardPatch, Transaction};
use super::seed::{initial_board, now_millis};

pub trait LocalApply {
    /// Apply patches to the local board at once and queue them for upload.
    fn apply_local(&mut self, patches: Vec<BoardPatch>) -> Transaction;

    fn board(&self) -> &Board;
}

#[async_trait]
pub trait RemoteReconcile {
    /// Push queued local transactions to the sink, oldest first. Stops at the
    /// first failure, leaving it and everything after it queued.
    async fn flush(&mut self, sink: &dyn SyncSink) -> Result<usize>;

    /// Fold the next transaction of the service stream into the confirmed
    /// board. Our own echoes are confirmed in place. Returns the number of
    /// patches that took effect on the confirmed board.
    fn apply_remote(&mut self, tx: &Transaction) -> usize;
}

/// Upload side of the Sync Service client.
#[async_trait]
pub trait SyncSink: Send + Sync {
    async fn push(&self, room_id: &str, tx: &Transaction) -> Result<()>;
}

/// Sink backed by an in-process channel, the seam where a Sync Service
/// client picks transactions up.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<(String, Transaction)>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(String, Transaction)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl SyncSink for ChannelSink {
    async fn push(&self, room_id: &str, tx: &Transaction) -> Result<()> {
        self.tx
            .send((room_id.to_string(), tx.clone()))
            .map_err(|_| anyhow::anyhow!("sync channel closed"))
    }
}

/// Local transactions awaiting their echo. Past this many the oldest is
/// taken as confirmed so the queue cannot grow without bound.
pub const MAX_UNCONFIRMED: usize = 1024;

pub struct Replica {
    room_id: String,
    confirmed: Board,
    board: Board,
    outbox: VecDeque<Transaction>,
    unconfirmed: VecDeque<Transaction>,
}

impl Replica {
    /// Open a room's replica from the storage the Sync Service handed back,
    /// seeding the initial board if the room has none yet.
    pub fn open(room_id: &str, existing: Option<Board>) -> Self {
        let board = existing.unwrap_or_else(|| {
            tracing::info!(room_id, "seeding new room board");
            initial_board(now_millis())
        });
        Self {
            room_id: room_id.to_string(),
            confirmed: board.clone(),
            board,
            outbox: VecDeque::new(),
            unconfirmed: VecDeque::new(),
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Transactions not yet handed to the sink.
    pub fn pending(&self) -> usize {
        self.outbox.len()
    }

    /// Local transactions whose echo has not come back yet.
    pub fn unconfirmed(&self) -> usize {
        self.unconfirmed.len()
    }

    pub fn confirmed(&self) -> &Board {
        &self.confirmed
    }

    fn rebase(&mut self) {
        let mut board = self.confirmed.clone();
        for tx in &self.unconfirmed {
            board.apply_transaction(tx);
        }
        self.board = board;
    }
}

impl LocalApply for Replica {
    fn apply_local(&mut self, patches: Vec<BoardPatch>) -> Transaction {
        let tx = Transaction::new(patches);
        let applied = self.board.apply_transaction(&tx);
        if applied != tx.patches.len() {
            tracing::warn!(
                room_id = %self.room_id,
                tx_id = %tx.id,
                applied,
                total = tx.patches.len(),
                "local transaction partially dropped"
            );
        }
        self.unconfirmed.push_back(tx.clone());
        if self.unconfirmed.len() > MAX_UNCONFIRMED {
            if let Some(oldest) = self.unconfirmed.pop_front() {
                tracing::warn!(room_id = %self.room_id, tx_id = %oldest.id, "echo overdue; confirming locally");
                self.confirmed.apply_transaction(&oldest);
            }
        }
        self.outbox.push_back(tx.clone());
        tx
    }

    fn board(&self) -> &Board {
        &self.board
    }
}

#[async_trait]
impl RemoteReconcile for Replica {
    async fn flush(&mut self, sink: &dyn SyncSink) -> Result<usize> {
        let mut pushed = 0;
        while let Some(tx) = self.outbox.front() {
            sink.push(&self.room_id, tx).await?;
            self.outbox.pop_front();
            pushed += 1;
        }
        Ok(pushed)
    }

    fn apply_remote(&mut self, tx: &Transaction) -> usize {
        if let Some(pos) = self.unconfirmed.iter().position(|own| own.id == tx.id) {
            self.unconfirmed.remove(pos);
        }
        let applied = self.confirmed.apply_transaction(tx);
        self.rebase();

        let violations = self.board.check_invariants();
        if !violations.is_empty() {
            tracing::debug!(
                room_id = %self.room_id,
                tx_id = %tx.id,
                violations = violations.len(),
                "board inconsistent after remote transaction"
            );
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::protocol;

    struct FailingSink;

    #[async_trait]
    impl SyncSink for FailingSink {
        async fn push(&self, _room_id: &str, _tx: &Transaction) -> Result<()> {
            anyhow::bail!("offline")
        }
    }

    #[test]
    fn test_open_seeds_only_when_absent() {
        let fresh = Replica::open("R1", None);
        assert_eq!(fresh.board().columns.len(), 3);

        let existing = Replica::open("R1", Some(Board::default()));
        assert!(existing.board().columns.is_empty());
    }

    #[test]
    fn test_local_apply_is_immediate_and_queued() {
        let mut replica = Replica::open("R1", None);
        let m = protocol::rename_title(replica.board(), "task-1", "Ship it").unwrap();
        replica.apply_local(m.patches);
        assert_eq!(replica.board().tasks["task-1"].title, "Ship it");
        assert_eq!(replica.pending(), 1);
    }

    #[tokio::test]
    async fn test_flush_drains_in_order() {
        let mut replica = Replica::open("R1", None);
        let first = replica.apply_local(vec![BoardPatch::SetTaskTitle {
            task_id: "task-1".into(),
            title: "one".into(),
        }]);
        let second = replica.apply_local(vec![BoardPatch::SetTaskTitle {
            task_id: "task-1".into(),
            title: "two".into(),
        }]);

        let (sink, mut rx) = ChannelSink::new();
        assert_eq!(replica.flush(&sink).await.unwrap(), 2);
        assert_eq!(replica.pending(), 0);

        let (room, tx) = rx.recv().await.unwrap();
        assert_eq!(room, "R1");
        assert_eq!(tx.id, first.id);
        assert_eq!(rx.recv().await.unwrap().1.id, second.id);
    }

    #[tokio::test]
    async fn test_failed_flush_keeps_queue() {
        let mut replica = Replica::open("R1", None);
        replica.apply_local(vec![BoardPatch::DeleteTask {
            task_id: "task-3".into(),
        }]);
        assert!(replica.flush(&FailingSink).await.is_err());
        assert_eq!(replica.pending(), 1);
    }

    #[test]
    fn test_own_echo_is_confirmed() {
        let mut replica = Replica::open("R1", None);
        let tx = replica.apply_local(vec![BoardPatch::SetTaskTitle {
            task_id: "task-1".into(),
            title: "mine".into(),
        }]);
        assert_eq!(replica.unconfirmed(), 1);
        assert_eq!(replica.confirmed().tasks["task-1"].title, "Task 1");

        assert_eq!(replica.apply_remote(&tx), 1);
        assert_eq!(replica.unconfirmed(), 0);
        assert_eq!(replica.confirmed().tasks["task-1"].title, "mine");
        assert_eq!(replica.board().tasks["task-1"].title, "mine");
    }

    #[test]
    fn test_local_edit_stays_on_top_of_remote_until_echo() {
        let mut ours = Replica::open("R1", Some(initial_board(0)));
        let mine = ours.apply_local(vec![BoardPatch::SetTaskTitle {
            task_id: "task-1".into(),
            title: "mine".into(),
        }]);
        let peer = Transaction::new(vec![BoardPatch::SetTaskTitle {
            task_id: "task-1".into(),
            title: "theirs".into(),
        }]);

        // Peer's write was sequenced first: ours still shows on top.
        ours.apply_remote(&peer);
        assert_eq!(ours.board().tasks["task-1"].title, "mine");
        ours.apply_remote(&mine);
        assert_eq!(ours.board().tasks["task-1"].title, "mine");
    }

    #[test]
    fn test_unconfirmed_queue_is_bounded() {
        let mut replica = Replica::open("R1", None);
        for i in 0..MAX_UNCONFIRMED + 5 {
            replica.apply_local(vec![BoardPatch::SetTaskTitle {
                task_id: "task-1".into(),
                title: format!("t{}", i),
            }]);
        }
        assert_eq!(replica.unconfirmed(), MAX_UNCONFIRMED);
        assert_eq!(replica.confirmed().tasks["task-1"].title, "t4");
    }

    #[test]
    fn test_concurrent_moves_converge_in_service_order() {
        // Two peers move task-2 at the same time: one to column-1, one to column-3.
        let base = initial_board(0);
        let mut ours = Replica::open("R1", Some(base.clone()));
        let mut theirs = Replica::open("R1", Some(base.clone()));

        let m_ours = protocol::move_task(ours.board(), "task-2", "column-2", 0, "column-1", "A").unwrap();
        let m_theirs =
            protocol::move_task(theirs.board(), "task-2", "column-2", 0, "column-3", "B").unwrap();
        let tx_ours = ours.apply_local(m_ours.patches);
        let tx_theirs = theirs.apply_local(m_theirs.patches);

        // Service order: ours, then theirs. Both replicas see the same stream.
        for tx in [&tx_ours, &tx_theirs] {
            ours.apply_remote(tx);
            theirs.apply_remote(tx);
        }

        assert_eq!(ours.board(), theirs.board());
        assert_eq!(ours.unconfirmed(), 0);
        assert_eq!(theirs.unconfirmed(), 0);
        let board = ours.board();
        assert_eq!(board.tasks["task-2"].column_id, "column-3");
        assert!(board.columns["column-3"].task_ids.contains(&"task-2".to_string()));
        assert!(board.columns["column-2"].task_ids.is_empty());
    }
}

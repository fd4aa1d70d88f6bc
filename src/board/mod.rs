//! Shared board of a room: model, mutation protocol, presence.
//!
//! ## Module Map
//!
//! ```text
//!  user action ─> session.rs (BoardSession: the mutation boundary)
//!                    │
//!                    │ protocol::*()  → Mutation { patches, notification, notice }
//!                    v
//!                 replica.rs
//!                    ├─ LocalApply::apply_local()      (sync, immediate)
//!                    └─ RemoteReconcile::flush() / apply_remote()
//!                                │
//!                                v
//!                        SyncSink (Sync Service client)
//!
//!  notification ─> notify.rs (Notifier: best-effort broadcast, never acked)
//! ```
//!
//! | Module     | Responsibility                                          |
//! |------------|---------------------------------------------------------|
//! | `models`   | `Board`, `Column`, `Task`, invariant check, views       |
//! | `patch`    | `BoardPatch`, `Transaction`, patch application          |
//! | `protocol` | Move / add / delete / rename operations                 |
//! | `replica`  | Local replica and its two-phase sync contract           |
//! | `notify`   | Transient notifications and local notices               |
//! | `debounce` | Idle-based coalescing of text edits                     |
//! | `presence` | Presence records and the online-users projection        |
//! | `seed`     | Initial board and id generation                         |

pub mod debounce;
pub mod models;
pub mod notify;
pub mod patch;
pub mod presence;
pub mod protocol;
pub mod replica;
pub mod seed;
pub mod session;

pub use models::{Board, Column, Priority, Task};
pub use session::BoardSession;

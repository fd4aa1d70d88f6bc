//! Session gate: exchanges a room key for a Sync Service session grant.
//!
//! `POST /api/liveblocks-auth` validates the join request, checks the room
//! key against the configured secrets, and asks the Sync Service to mint a
//! grant scoped to that one room. The grant body is passed through as-is.

pub mod api;
pub mod grant;
pub mod server;
pub mod validate;

pub use server::{build_router, start_server};

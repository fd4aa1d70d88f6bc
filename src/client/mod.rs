//! Client side of the session gate: joining a room and remembering who we are.

pub mod gate_client;
pub mod store;

pub use gate_client::{GateClient, RoomRoute};
pub use store::{UserState, UserStore};

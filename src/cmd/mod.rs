//! CLI command implementations.
//!
//! | Module    | Commands handled                |
//! |-----------|---------------------------------|
//! | `serve`   | `Serve`                         |
//! | `session` | `Join`, `Whoami`, `Logout`      |
//! | `config`  | `Config`                        |

pub mod config;
pub mod serve;
pub mod session;

pub use config::cmd_config;
pub use serve::cmd_serve;
pub use session::{cmd_join, cmd_logout, cmd_whoami, open_store};

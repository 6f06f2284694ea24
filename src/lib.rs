//! Pick-and-place line coordination over a shared PostgreSQL store.
//!
//! A line coordinator and one agent per robot station run as independent
//! processes. They never talk to each other directly: the coordinator writes
//! line commands into the store, agents relay them to their robot over a text
//! socket and write the robot's status back.

pub mod db;
pub mod error;
pub mod line;
pub mod station;
pub mod store;
pub mod supervisor;
pub mod types;

pub use db::LineDb;
pub use error::{ErrorClass, LineError, Result};
pub use supervisor::{shutdown_signal, Supervised, Supervisor};
pub use types::*;

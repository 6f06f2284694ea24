#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

pub mod memory;
mod ports;

pub use memory::{MemoryStore, PickEventRecord};
pub use ports::{CoordinationStore, LineStore, PortFuture, StationStore, StoreSession};

//! Open/read/write/close/reset endpoint over a shared record queue.
//!
//! A [`Repeater`] owns the queue and hands out [`Session`]s, one per open
//! handle. Sessions carry their own one-shot delivery state; everything else
//! lives in the queue and is serialized by its lock.

pub mod config;
pub mod device;
pub mod error;
pub mod session;

pub use config::{ChannelConfig, OneShotAccounting};
pub use device::Repeater;
pub use error::{ChannelError, Result};
pub use repeater_queue::{OverflowPolicy, Popped, QueueConfig, QueueStats};
pub use session::{AccessMode, Session};

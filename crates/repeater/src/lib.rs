//! Message-framed byte channel.
//!
//! Writers push opaque byte records; readers take them back one record at a
//! time in FIFO order. An optional one-shot mode limits every reader handle
//! to a single record.
//!
//! # Crate Structure
//!
//! - [`queue`]: Bounded record queue and the inline record wire format
//! - [`channel`]: Open/read/write/close/reset endpoint with per-handle sessions

/// Re-export queue types.
pub mod queue {
    pub use repeater_queue::*;
}

/// Re-export channel types.
pub mod channel {
    pub use repeater_channel::*;
}

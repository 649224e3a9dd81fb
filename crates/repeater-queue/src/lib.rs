//! Bounded record queue for a message-framed byte channel.
//!
//! Record payloads share one fixed-size byte ring; a second ring holds the
//! length of every pending record, so message boundaries survive storage in
//! otherwise unstructured bytes:
//! - both rings sit behind one lock, taken for the whole of every operation
//! - a record is retired from both rings at once, even when a reader only
//!   takes part of it
//! - capacity failures are reported up front and leave the queue untouched
//!
//! [`codec`] serializes records with their length inlined, for callers that
//! move records across a byte stream.

pub mod codec;
pub mod config;
pub mod error;
mod guard;
pub mod queue;

pub use codec::{decode_record, encode_record, DEFAULT_MAX_RECORD, HEADER_SIZE};
pub use config::{OverflowPolicy, QueueConfig, DEFAULT_BYTE_CAPACITY, DEFAULT_MAX_RECORDS};
pub use error::{QueueError, RecordError, Result};
pub use queue::{FramedQueue, Popped, Pushed, QueueStats};

/// Errors reported by [`FramedQueue`](crate::FramedQueue) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The byte buffer has no room for the record.
    #[error("queue full ({capacity} byte capacity)")]
    QueueFull { capacity: usize },

    /// The length buffer already holds the maximum number of pending records.
    #[error("too many pending records (max {max})")]
    TooManyRecords { max: usize },

    /// The length and byte buffers fell out of correspondence.
    #[error("framing desync: {reason}")]
    FramingDesync { reason: String },
}

impl QueueError {
    /// True for the recoverable "no room for a new record" family.
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(
            self,
            QueueError::QueueFull { .. } | QueueError::TooManyRecords { .. }
        )
    }

    pub(crate) fn desync(reason: impl Into<String>) -> Self {
        QueueError::FramingDesync {
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while decoding records from the wire format.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The record header contains an invalid magic number.
    #[error("invalid record magic (expected 0x5250 \"RP\")")]
    InvalidMagic,

    /// The payload exceeds the configured maximum size.
    #[error("record too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, QueueError>;

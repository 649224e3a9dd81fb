use std::io;

use repeater_queue::QueueError;

use crate::session::AccessMode;

/// Errors reported at the channel boundary.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The requested access mode is not allowed by the channel.
    #[error("access denied: {0} handles are not supported")]
    AccessDenied(AccessMode),

    /// Read attempted on a handle opened write-only.
    #[error("handle is not open for reading")]
    NotReadable,

    /// Write attempted on a handle opened read-only.
    #[error("handle is not open for writing")]
    NotWritable,

    /// The record queue refused or lost the operation.
    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl ChannelError {
    /// True when the record queue lost framing and the operation is void.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ChannelError::Queue(QueueError::FramingDesync { .. }))
    }

    /// True for "no room right now"; retrying later may succeed.
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, ChannelError::Queue(err) if err.is_capacity_exceeded())
    }
}

impl From<ChannelError> for io::Error {
    fn from(err: ChannelError) -> Self {
        let kind = match &err {
            ChannelError::AccessDenied(_) => io::ErrorKind::PermissionDenied,
            ChannelError::NotReadable | ChannelError::NotWritable => io::ErrorKind::Unsupported,
            ChannelError::Queue(QueueError::QueueFull { .. })
            | ChannelError::Queue(QueueError::TooManyRecords { .. }) => io::ErrorKind::OutOfMemory,
            ChannelError::Queue(QueueError::FramingDesync { .. }) => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_errors_keep_their_distinct_messages() {
        let full = ChannelError::from(QueueError::QueueFull { capacity: 16 });
        let many = ChannelError::from(QueueError::TooManyRecords { max: 4 });

        assert!(full.to_string().starts_with("queue full"));
        assert!(many.to_string().starts_with("too many pending records"));
        assert!(full.is_capacity_exceeded() && many.is_capacity_exceeded());
        assert!(!full.is_fatal());
    }

    #[test]
    fn desync_is_fatal_io() {
        let err = ChannelError::from(QueueError::FramingDesync {
            reason: "zero-length record".to_string(),
        });
        assert!(err.is_fatal());

        let io_err = io::Error::from(err);
        assert_eq!(io_err.kind(), io::ErrorKind::Other);
        assert!(io_err.to_string().contains("framing desync"));
    }

    #[test]
    fn io_kinds_follow_device_errno() {
        let denied = io::Error::from(ChannelError::AccessDenied(AccessMode::ReadWrite));
        assert_eq!(denied.kind(), io::ErrorKind::PermissionDenied);

        let full = io::Error::from(ChannelError::from(QueueError::QueueFull { capacity: 1 }));
        assert_eq!(full.kind(), io::ErrorKind::OutOfMemory);

        let wrong_side = io::Error::from(ChannelError::NotWritable);
        assert_eq!(wrong_side.kind(), io::ErrorKind::Unsupported);
    }
}

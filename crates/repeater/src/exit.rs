use std::fmt;
use std::io;

use repeater_channel::ChannelError;
use repeater_queue::RecordError;

// Exit code constants follow sysexits where one fits.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const QUEUE_FULL: i32 = 75;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound | io::ErrorKind::InvalidInput => USAGE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn channel_error(context: &str, err: ChannelError) -> CliError {
    let code = match &err {
        ChannelError::AccessDenied(_) => PERMISSION_DENIED,
        ChannelError::NotReadable | ChannelError::NotWritable => USAGE,
        other if other.is_capacity_exceeded() => QUEUE_FULL,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn record_error(context: &str, err: RecordError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use repeater_channel::AccessMode;
    use repeater_queue::QueueError;

    use super::*;

    #[test]
    fn channel_errors_map_to_exit_codes() {
        let denied = channel_error("open", ChannelError::AccessDenied(AccessMode::ReadWrite));
        assert_eq!(denied.code, PERMISSION_DENIED);

        let full = channel_error(
            "write",
            ChannelError::Queue(QueueError::TooManyRecords { max: 2 }),
        );
        assert_eq!(full.code, QUEUE_FULL);
        assert!(full.message.starts_with("write: too many pending records"));

        let desync = channel_error(
            "read",
            ChannelError::Queue(QueueError::FramingDesync {
                reason: "zero-length record".to_string(),
            }),
        );
        assert_eq!(desync.code, INTERNAL);
    }
}

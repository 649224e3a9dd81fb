/// Default byte buffer capacity.
pub const DEFAULT_BYTE_CAPACITY: usize = 1024;

/// Default number of records that may be pending at once.
pub const DEFAULT_MAX_RECORDS: usize = 128;

/// What a push does with a record larger than the remaining byte space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Refuse the record and leave the queue untouched.
    #[default]
    Reject,
    /// Store the prefix that fits and record that shorter length.
    Truncate,
}

/// Sizing and overflow behavior of a [`FramedQueue`](crate::FramedQueue).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Byte buffer capacity. Values below 1 are raised to 1.
    pub byte_capacity: usize,
    /// Length buffer capacity. Values below 1 are raised to 1.
    pub max_records: usize,
    pub overflow: OverflowPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            byte_capacity: DEFAULT_BYTE_CAPACITY,
            max_records: DEFAULT_MAX_RECORDS,
            overflow: OverflowPolicy::Reject,
        }
    }
}

use std::fmt;

use bytes::Bytes;
use ringbuf::traits::{Consumer, Observer, Producer};
use ringbuf::HeapRb;

use crate::config::{OverflowPolicy, QueueConfig};
use crate::error::{QueueError, Result};
use crate::guard::ExclusionGuard;

/// Outcome of a successful [`FramedQueue::push_record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pushed {
    /// Bytes stored as the new record.
    pub accepted: usize,
    /// Bytes the caller offered.
    pub requested: usize,
}

impl Pushed {
    /// True when only a prefix of the offered data was stored.
    pub fn is_partial(&self) -> bool {
        self.accepted < self.requested
    }
}

/// Outcome of a successful [`FramedQueue::pop_record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popped {
    /// No record was pending.
    Empty,
    /// A whole record.
    Record(Bytes),
    /// The head of a record that did not fit the caller's limit. The rest of
    /// the record was discarded.
    Truncated { data: Bytes, record_len: usize },
}

impl Popped {
    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, Popped::Truncated { .. })
    }

    /// Delivered bytes (empty for [`Popped::Empty`]).
    pub fn data(&self) -> &[u8] {
        match self {
            Popped::Empty => &[],
            Popped::Record(data) | Popped::Truncated { data, .. } => data.as_ref(),
        }
    }

    pub fn len(&self) -> usize {
        self.data().len()
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            Popped::Empty => Bytes::new(),
            Popped::Record(data) | Popped::Truncated { data, .. } => data,
        }
    }
}

/// Point-in-time occupancy of a [`FramedQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub records: usize,
    pub bytes: usize,
    pub byte_capacity: usize,
    pub max_records: usize,
}

/// Bounded FIFO of byte records.
///
/// Payload bytes live in one ring and record lengths in a second, parallel
/// ring. Both sit behind a single lock, so every pending length always
/// describes a contiguous span at the front of the unread bytes, and the byte
/// ring never holds bytes that no length accounts for.
#[derive(Debug)]
pub struct FramedQueue {
    buffers: ExclusionGuard<Buffers>,
    config: QueueConfig,
}

impl FramedQueue {
    /// Create a queue with default sizing.
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    pub fn with_config(config: QueueConfig) -> Self {
        let config = QueueConfig {
            byte_capacity: config.byte_capacity.max(1),
            max_records: config.max_records.max(1),
            ..config
        };
        Self {
            buffers: ExclusionGuard::new(Buffers {
                bytes: HeapRb::new(config.byte_capacity),
                lengths: HeapRb::new(config.max_records),
            }),
            config,
        }
    }

    /// Effective configuration (capacities after clamping).
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Append `data` as one record.
    ///
    /// Fails with a capacity error when either ring is already full. Under
    /// [`OverflowPolicy::Reject`] a record larger than the free byte space is
    /// refused with nothing stored; under [`OverflowPolicy::Truncate`] the
    /// prefix that fits becomes the record. Empty input stores nothing and
    /// reports zero bytes accepted.
    pub fn push_record(&self, data: &[u8]) -> Result<Pushed> {
        self.buffers.enter().push(data, self.config.overflow)
    }

    /// Remove the oldest record, delivering at most `max_bytes` of it.
    ///
    /// The whole record is retired even when only part of it is delivered.
    pub fn pop_record(&self, max_bytes: usize) -> Result<Popped> {
        self.buffers.enter().pop(max_bytes)
    }

    /// Drop every pending record. Returns how many were discarded.
    pub fn reset(&self) -> usize {
        let mut buffers = self.buffers.enter();
        let discarded = buffers.lengths.occupied_len();
        buffers.clear();
        discarded
    }

    /// Number of pending records.
    pub fn len(&self) -> usize {
        self.buffers.enter().lengths.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> QueueStats {
        let buffers = self.buffers.enter();
        QueueStats {
            records: buffers.lengths.occupied_len(),
            bytes: buffers.bytes.occupied_len(),
            byte_capacity: buffers.bytes.capacity().get(),
            max_records: buffers.lengths.capacity().get(),
        }
    }

    #[cfg(test)]
    fn with_buffers<R>(&self, f: impl FnOnce(&mut Buffers) -> R) -> R {
        f(&mut self.buffers.enter())
    }
}

impl Default for FramedQueue {
    fn default() -> Self {
        Self::new()
    }
}

struct Buffers {
    bytes: HeapRb<u8>,
    lengths: HeapRb<usize>,
}

impl fmt::Debug for Buffers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffers")
            .field("bytes", &self.bytes.occupied_len())
            .field("lengths", &self.lengths.occupied_len())
            .finish()
    }
}

impl Buffers {
    fn push(&mut self, data: &[u8], overflow: OverflowPolicy) -> Result<Pushed> {
        if self.bytes.is_full() {
            return Err(self.queue_full());
        }
        if self.lengths.is_full() {
            return Err(QueueError::TooManyRecords {
                max: self.lengths.capacity().get(),
            });
        }
        if data.is_empty() {
            return Ok(Pushed {
                accepted: 0,
                requested: 0,
            });
        }
        if overflow == OverflowPolicy::Reject && data.len() > self.bytes.vacant_len() {
            return Err(self.queue_full());
        }

        let accepted = self.bytes.push_slice(data);
        if accepted == 0 {
            return Err(self.queue_full());
        }

        self.commit_length(accepted)?;

        Ok(Pushed {
            accepted,
            requested: data.len(),
        })
    }

    /// Record the length of the `accepted` bytes just stored, or unstore them
    /// so no unframed bytes are left behind.
    fn commit_length(&mut self, accepted: usize) -> Result<()> {
        if self.lengths.try_push(accepted).is_ok() {
            return Ok(());
        }
        self.unpush_bytes(accepted);
        Err(QueueError::desync(format!(
            "no length slot for {accepted} stored bytes"
        )))
    }

    /// Remove the newest `count` bytes, keeping everything older in order.
    fn unpush_bytes(&mut self, count: usize) {
        let keep = self.bytes.occupied_len().saturating_sub(count);
        let mut kept = vec![0u8; keep];
        self.bytes.pop_slice(&mut kept);
        self.bytes.clear();
        self.bytes.push_slice(&kept);
    }

    fn pop(&mut self, max_bytes: usize) -> Result<Popped> {
        let Some(size) = self.lengths.try_pop() else {
            return Ok(Popped::Empty);
        };

        if size == 0 {
            return Err(QueueError::desync("zero-length record"));
        }
        let unread = self.bytes.occupied_len();
        if size > unread {
            self.clear();
            return Err(QueueError::desync(format!(
                "record of {size} bytes with only {unread} unread"
            )));
        }

        let take = size.min(max_bytes);
        let mut out = vec![0u8; take];
        self.bytes.pop_slice(&mut out);
        self.bytes.skip(size - take);

        let data = Bytes::from(out);
        if take < size {
            Ok(Popped::Truncated {
                data,
                record_len: size,
            })
        } else {
            Ok(Popped::Record(data))
        }
    }

    fn queue_full(&self) -> QueueError {
        QueueError::QueueFull {
            capacity: self.bytes.capacity().get(),
        }
    }

    fn clear(&mut self) {
        self.bytes.clear();
        self.lengths.clear();
    }
}

use std::fmt;
use std::io;
use std::sync::Arc;

use repeater_queue::{FramedQueue, Popped};
use tracing::{debug, error, warn};

use crate::config::{ChannelConfig, OneShotAccounting};
use crate::error::{ChannelError, Result};

/// Direction a handle is opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessMode {
    pub fn can_read(self) -> bool {
        matches!(self, AccessMode::ReadOnly | AccessMode::ReadWrite)
    }

    pub fn can_write(self) -> bool {
        matches!(self, AccessMode::WriteOnly | AccessMode::ReadWrite)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessMode::ReadOnly => "read-only",
            AccessMode::WriteOnly => "write-only",
            AccessMode::ReadWrite => "read-write",
        };
        f.write_str(name)
    }
}

/// One open handle on a channel.
///
/// Holds the handle's private delivery counter and a reference to the shared
/// queue. Dropping the session closes it; pending records are not affected.
///
/// The [`io::Read`] and [`io::Write`] impls expose the handle as a byte
/// stream: each `read` returns at most one record (truncation is silent there,
/// use [`Session::read`] to observe it) and each `write` stores one record.
pub struct Session {
    id: u64,
    mode: AccessMode,
    delivered: u32,
    queue: Arc<FramedQueue>,
    config: ChannelConfig,
}

impl Session {
    pub(crate) fn new(
        id: u64,
        mode: AccessMode,
        queue: Arc<FramedQueue>,
        config: ChannelConfig,
    ) -> Self {
        if config.debug {
            debug!(session = id, %mode, "session opened");
        }
        Self {
            id,
            mode,
            delivered: 0,
            queue,
            config,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Reads counted against one-shot mode so far.
    pub fn delivered(&self) -> u32 {
        self.delivered
    }

    /// True once one-shot mode will answer every further read with nothing.
    pub fn is_exhausted(&self) -> bool {
        self.config.one_shot && self.delivered > 0
    }

    /// Take the next record, delivering at most `max_bytes` of it.
    ///
    /// Returns [`Popped::Empty`] when nothing is pending or the handle has
    /// used its one-shot delivery.
    pub fn read(&mut self, max_bytes: usize) -> Result<Popped> {
        if !self.mode.can_read() {
            return Err(ChannelError::NotReadable);
        }
        if self.is_exhausted() {
            if self.config.debug {
                debug!(session = self.id, "one-shot delivery already used");
            }
            return Ok(Popped::Empty);
        }
        if self.config.one_shot_accounting == OneShotAccounting::Attempt {
            self.delivered = self.delivered.saturating_add(1);
        }

        let popped = self.queue.pop_record(max_bytes).map_err(|err| {
            error!(session = self.id, %err, "failed to get record length");
            ChannelError::from(err)
        })?;

        match &popped {
            Popped::Empty => {
                if self.config.debug {
                    debug!(session = self.id, "no records pending");
                }
                return Ok(popped);
            }
            Popped::Truncated { data, record_len } => {
                warn!(
                    session = self.id,
                    delivered = data.len(),
                    record_len,
                    "record truncated to reader limit; remainder discarded"
                );
            }
            Popped::Record(data) => {
                if self.config.debug {
                    debug!(session = self.id, size = data.len(), "record delivered");
                }
            }
        }

        if self.config.one_shot_accounting == OneShotAccounting::Delivery {
            self.delivered = self.delivered.saturating_add(1);
        }
        Ok(popped)
    }

    /// Store `data` as one record. Returns the number of bytes accepted.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        if !self.mode.can_write() {
            return Err(ChannelError::NotWritable);
        }

        match self.queue.push_record(data) {
            Ok(pushed) => {
                if pushed.is_partial() {
                    warn!(
                        session = self.id,
                        accepted = pushed.accepted,
                        requested = pushed.requested,
                        "partial write; record stored truncated"
                    );
                } else if self.config.debug {
                    debug!(session = self.id, size = pushed.accepted, "record stored");
                }
                Ok(pushed.accepted)
            }
            Err(err) if err.is_capacity_exceeded() => {
                warn!(session = self.id, %err, "record rejected");
                Err(err.into())
            }
            Err(err) => {
                error!(session = self.id, %err, "record lost");
                Err(err.into())
            }
        }
    }

    /// Close the handle.
    pub fn close(self) {}
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.config.debug {
            debug!(session = self.id, delivered = self.delivered, "session closed");
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("delivered", &self.delivered)
            .finish()
    }
}

impl io::Read for Session {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let popped = Session::read(self, buf.len())?;
        let data = popped.data();
        buf[..data.len()].copy_from_slice(data);
        Ok(data.len())
    }
}

/// Every `write` call stores one record. A short count means the record was
/// stored truncated, so `write_all` never writes the remainder as a second
/// record and fails with `WriteZero` instead.
impl io::Write for Session {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(Session::write(self, buf)?)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let accepted = Session::write(self, buf)?;
        if accepted < buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("record stored truncated to {accepted} of {} bytes", buf.len()),
            ));
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use repeater_queue::{FramedQueue, QueueStats};
use tracing::{debug, info, warn};

use crate::config::ChannelConfig;
use crate::error::{ChannelError, Result};
use crate::session::{AccessMode, Session};

/// A record channel: one shared queue, any number of open handles.
///
/// Handles are opened read-only or write-only. Every handle shares the same
/// [`FramedQueue`], so a record written through one handle is delivered to
/// exactly one read on any handle.
#[derive(Debug)]
pub struct Repeater {
    queue: Arc<FramedQueue>,
    config: ChannelConfig,
    next_session_id: AtomicU64,
}

impl Repeater {
    /// Create a channel with its own queue sized from `config.queue`.
    pub fn new(config: ChannelConfig) -> Self {
        let queue = Arc::new(FramedQueue::with_config(config.queue));
        Self::with_queue(queue, config)
    }

    /// Create a channel over an existing queue.
    ///
    /// `config.queue` is replaced by the queue's own configuration.
    pub fn with_queue(queue: Arc<FramedQueue>, config: ChannelConfig) -> Self {
        let config = ChannelConfig {
            queue: *queue.config(),
            ..config
        };
        Self {
            queue,
            config,
            next_session_id: AtomicU64::new(1),
        }
    }

    /// Open a handle. Read-write access is refused.
    pub fn open(&self, mode: AccessMode) -> Result<Session> {
        if mode == AccessMode::ReadWrite {
            warn!(%mode, "open refused: handles must be read-only or write-only");
            return Err(ChannelError::AccessDenied(mode));
        }
        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        Ok(Session::new(id, mode, Arc::clone(&self.queue), self.config))
    }

    /// Close a handle. Same as dropping it.
    pub fn close(&self, session: Session) {
        session.close();
    }

    /// Discard every pending record. Returns how many were discarded.
    ///
    /// Open handles keep their one-shot state.
    pub fn reset(&self) -> usize {
        let discarded = self.queue.reset();
        if self.config.debug {
            debug!(discarded, "reset requested");
        }
        info!(discarded, "queue reset");
        discarded
    }

    pub fn stats(&self) -> QueueStats {
        self.queue.stats()
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// The shared queue behind every handle.
    pub fn queue(&self) -> &Arc<FramedQueue> {
        &self.queue
    }
}

impl Default for Repeater {
    fn default() -> Self {
        Self::new(ChannelConfig::default())
    }
}

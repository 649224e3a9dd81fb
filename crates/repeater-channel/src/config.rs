use repeater_queue::QueueConfig;

/// How one-shot mode decides that a handle has had its delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OneShotAccounting {
    /// Only reads that retire a record count.
    #[default]
    Delivery,
    /// Every read that reaches the queue counts, including ones that find it
    /// empty.
    Attempt,
}

/// Channel behavior, fixed when the channel is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Emit a `debug` event for every operation.
    pub debug: bool,
    /// Each handle receives at most one record.
    pub one_shot: bool,
    pub one_shot_accounting: OneShotAccounting,
    pub queue: QueueConfig,
}

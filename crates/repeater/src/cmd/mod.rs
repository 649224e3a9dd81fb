use clap::{Args, Subcommand};
use std::path::PathBuf;

use repeater_channel::{ChannelConfig, OneShotAccounting, OverflowPolicy, QueueConfig};
use repeater_queue::{DEFAULT_BYTE_CAPACITY, DEFAULT_MAX_RECORDS};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod feed;
pub mod shell;
pub mod stress;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Drive a channel with line commands read from stdin.
    Shell(ShellArgs),
    /// Write framed records from a file through the channel and print what readers get.
    Feed(FeedArgs),
    /// Hammer one channel with concurrent writers and readers.
    Stress(StressArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, config: ChannelConfig, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Shell(args) => shell::run(args, config, format),
        Command::Feed(args) => feed::run(args, config, format),
        Command::Stress(args) => stress::run(args, config, format),
        Command::Version(args) => version::run(args),
    }
}

/// Channel behavior, fixed for the lifetime of the process.
#[derive(Args, Debug, Clone)]
pub struct ChannelArgs {
    /// Log every channel operation at debug level.
    #[arg(long, env = "REPEATER_DEBUG", global = true)]
    pub debug: bool,
    /// Deliver at most one record per reader handle.
    #[arg(long, env = "REPEATER_ONE_SHOT", global = true)]
    pub one_shot: bool,
    /// In one-shot mode, spend a handle's delivery on any read, even one that finds nothing.
    #[arg(long, global = true)]
    pub count_attempts: bool,
    /// Byte buffer capacity.
    #[arg(
        long,
        env = "REPEATER_CAPACITY",
        default_value_t = DEFAULT_BYTE_CAPACITY,
        global = true
    )]
    pub capacity: usize,
    /// Maximum number of pending records.
    #[arg(
        long,
        env = "REPEATER_MAX_RECORDS",
        default_value_t = DEFAULT_MAX_RECORDS,
        global = true
    )]
    pub max_records: usize,
    /// Store the prefix of a record that does not fit instead of rejecting it.
    #[arg(long, global = true)]
    pub truncate_on_overflow: bool,
}

impl ChannelArgs {
    pub fn to_config(&self) -> ChannelConfig {
        ChannelConfig {
            debug: self.debug,
            one_shot: self.one_shot,
            one_shot_accounting: if self.count_attempts {
                OneShotAccounting::Attempt
            } else {
                OneShotAccounting::Delivery
            },
            queue: QueueConfig {
                byte_capacity: self.capacity,
                max_records: self.max_records,
                overflow: if self.truncate_on_overflow {
                    OverflowPolicy::Truncate
                } else {
                    OverflowPolicy::Reject
                },
            },
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct ShellArgs {
    /// Read limit used when a `read` command gives none. Default: byte capacity.
    #[arg(long, value_name = "BYTES")]
    pub max_bytes: Option<usize>,
}

#[derive(Args, Debug)]
pub struct FeedArgs {
    /// File of framed records ("RP" ++ u32 LE length ++ payload, back to back).
    pub file: PathBuf,
    /// Per-read limit. Longer records are delivered truncated.
    #[arg(long, value_name = "BYTES")]
    pub max_bytes: Option<usize>,
}

#[derive(Args, Debug)]
pub struct StressArgs {
    /// Number of writer threads.
    #[arg(long, default_value_t = 4)]
    pub writers: u32,
    /// Number of reader threads.
    #[arg(long, default_value_t = 2)]
    pub readers: usize,
    /// Records each writer sends.
    #[arg(long, default_value_t = 1000)]
    pub records: u32,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

use std::io::{IsTerminal, Write};

use bytes::BytesMut;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use repeater_channel::{AccessMode, Popped, QueueStats};
use repeater_queue::encode_record;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    /// Delivered records only, each framed as `"RP" ++ u32 LE length ++ payload`.
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Something a command did to the channel, ready to print.
#[derive(Debug)]
pub enum Outcome {
    Opened {
        handle: u64,
        mode: AccessMode,
    },
    Wrote {
        handle: u64,
        accepted: usize,
        requested: usize,
    },
    Delivered {
        handle: u64,
        popped: Popped,
    },
    Closed {
        handle: u64,
    },
    Reset {
        discarded: usize,
    },
    Stats(QueueStats),
    Failed {
        code: i32,
        message: String,
    },
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum OutcomeOutput<'a> {
    Opened {
        handle: u64,
        mode: String,
    },
    Wrote {
        handle: u64,
        accepted: usize,
        requested: usize,
        partial: bool,
    },
    Delivered {
        handle: u64,
        status: &'static str,
        size: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        record_len: Option<usize>,
        payload: String,
    },
    Closed {
        handle: u64,
    },
    Reset {
        discarded: usize,
    },
    Stats {
        records: usize,
        bytes: usize,
        byte_capacity: usize,
        max_records: usize,
    },
    Failed {
        code: i32,
        error: &'a str,
    },
}

impl Outcome {
    fn name(&self) -> &'static str {
        match self {
            Outcome::Opened { .. } => "opened",
            Outcome::Wrote { .. } => "wrote",
            Outcome::Delivered { .. } => "delivered",
            Outcome::Closed { .. } => "closed",
            Outcome::Reset { .. } => "reset",
            Outcome::Stats(_) => "stats",
            Outcome::Failed { .. } => "failed",
        }
    }

    fn handle(&self) -> Option<u64> {
        match self {
            Outcome::Opened { handle, .. }
            | Outcome::Wrote { handle, .. }
            | Outcome::Delivered { handle, .. }
            | Outcome::Closed { handle } => Some(*handle),
            _ => None,
        }
    }

    fn detail(&self) -> String {
        match self {
            Outcome::Opened { mode, .. } => mode.to_string(),
            Outcome::Wrote {
                accepted,
                requested,
                ..
            } if accepted < requested => format!("{accepted} of {requested} bytes (partial)"),
            Outcome::Wrote { accepted, .. } => format!("{accepted} bytes"),
            Outcome::Delivered { popped, .. } => match popped {
                Popped::Empty => "no data".to_string(),
                Popped::Record(data) => payload_preview(data),
                Popped::Truncated { data, record_len } => format!(
                    "{} (truncated, {} of {record_len} bytes)",
                    payload_preview(data),
                    data.len()
                ),
            },
            Outcome::Closed { .. } => String::new(),
            Outcome::Reset { discarded } => format!("{discarded} records discarded"),
            Outcome::Stats(stats) => format!(
                "{}/{} records, {}/{} bytes",
                stats.records, stats.max_records, stats.bytes, stats.byte_capacity
            ),
            Outcome::Failed { code, message } => format!("{message} (exit {code})"),
        }
    }

    fn to_output(&self) -> OutcomeOutput<'_> {
        match self {
            Outcome::Opened { handle, mode } => OutcomeOutput::Opened {
                handle: *handle,
                mode: mode.to_string(),
            },
            Outcome::Wrote {
                handle,
                accepted,
                requested,
            } => OutcomeOutput::Wrote {
                handle: *handle,
                accepted: *accepted,
                requested: *requested,
                partial: accepted < requested,
            },
            Outcome::Delivered { handle, popped } => {
                let (status, record_len) = match popped {
                    Popped::Empty => ("empty", None),
                    Popped::Record(_) => ("record", None),
                    Popped::Truncated { record_len, .. } => ("truncated", Some(*record_len)),
                };
                OutcomeOutput::Delivered {
                    handle: *handle,
                    status,
                    size: popped.len(),
                    record_len,
                    payload: payload_preview(popped.data()),
                }
            }
            Outcome::Closed { handle } => OutcomeOutput::Closed { handle: *handle },
            Outcome::Reset { discarded } => OutcomeOutput::Reset {
                discarded: *discarded,
            },
            Outcome::Stats(stats) => OutcomeOutput::Stats {
                records: stats.records,
                bytes: stats.bytes,
                byte_capacity: stats.byte_capacity,
                max_records: stats.max_records,
            },
            Outcome::Failed { code, message } => OutcomeOutput::Failed {
                code: *code,
                error: message,
            },
        }
    }
}

pub fn print_outcome(outcome: &Outcome, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&outcome.to_output()).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["EVENT", "HANDLE", "DETAIL"])
                .add_row(vec![
                    outcome.name().to_string(),
                    outcome
                        .handle()
                        .map(|h| h.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    outcome.detail(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => match outcome.handle() {
            Some(handle) => println!("{} handle={handle} {}", outcome.name(), outcome.detail()),
            None => println!("{} {}", outcome.name(), outcome.detail()),
        },
        OutputFormat::Raw => match outcome {
            Outcome::Delivered { popped, .. } if !matches!(popped, Popped::Empty) => {
                print_raw_record(popped.data());
            }
            Outcome::Failed { message, .. } => eprintln!("error: {message}"),
            _ => {}
        },
    }
}

pub fn print_raw_record(data: &[u8]) {
    let mut framed = BytesMut::new();
    if encode_record(data, &mut framed).is_err() {
        return;
    }
    let mut out = std::io::stdout();
    let _ = out.write_all(&framed);
    let _ = out.flush();
}

pub fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn truncated_delivery_serializes_record_length() {
        let outcome = Outcome::Delivered {
            handle: 3,
            popped: Popped::Truncated {
                data: Bytes::from_static(b"0123"),
                record_len: 10,
            },
        };
        let json = serde_json::to_value(outcome.to_output()).unwrap();

        assert_eq!(json["event"], "delivered");
        assert_eq!(json["status"], "truncated");
        assert_eq!(json["size"], 4);
        assert_eq!(json["record_len"], 10);
        assert_eq!(json["payload"], "0123");
    }

    #[test]
    fn empty_delivery_omits_record_length() {
        let outcome = Outcome::Delivered {
            handle: 1,
            popped: Popped::Empty,
        };
        let json = serde_json::to_value(outcome.to_output()).unwrap();

        assert_eq!(json["status"], "empty");
        assert!(json.get("record_len").is_none());
    }

    #[test]
    fn partial_write_is_flagged() {
        let outcome = Outcome::Wrote {
            handle: 2,
            accepted: 3,
            requested: 6,
        };
        let json = serde_json::to_value(outcome.to_output()).unwrap();
        assert_eq!(json["partial"], true);
        assert_eq!(outcome.detail(), "3 of 6 bytes (partial)");
    }

    #[test]
    fn binary_payloads_are_summarized() {
        assert_eq!(payload_preview(&[0xff, 0xfe]), "<binary 2 bytes>");
        assert_eq!(payload_preview(b"text"), "text");
    }
}

use std::collections::HashMap;
use std::io::BufRead;

use repeater_channel::{AccessMode, ChannelConfig, Repeater, Session};

use crate::cmd::ShellArgs;
use crate::exit::{channel_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_outcome, Outcome, OutputFormat};

const HELP: &str = "commands: open r|w|rw, write <handle> <text>, read <handle> [max], \
                    close <handle>, reset, stats, quit";

pub fn run(args: ShellArgs, config: ChannelConfig, format: OutputFormat) -> CliResult<i32> {
    let mut shell = Shell::new(Repeater::new(config), args.max_bytes);

    for line in std::io::stdin().lock().lines() {
        let line = line.map_err(|err| io_error("failed reading stdin", err))?;
        match shell.execute(&line) {
            Step::Quit => break,
            Step::Continue(None) => {}
            Step::Continue(Some(outcome)) => print_outcome(&outcome, format),
        }
    }

    Ok(SUCCESS)
}

#[derive(Debug)]
pub enum Step {
    Continue(Option<Outcome>),
    Quit,
}

/// One channel plus the handles opened on it, addressed by session id.
pub struct Shell {
    repeater: Repeater,
    handles: HashMap<u64, Session>,
    default_max: usize,
}

impl Shell {
    pub fn new(repeater: Repeater, default_max: Option<usize>) -> Self {
        let default_max = default_max.unwrap_or(repeater.config().queue.byte_capacity);
        Self {
            repeater,
            handles: HashMap::new(),
            default_max,
        }
    }

    pub fn execute(&mut self, line: &str) -> Step {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Step::Continue(None);
        }

        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let result = match verb {
            "quit" | "exit" => return Step::Quit,
            "open" => self.open(rest.trim()),
            "write" => self.write(rest.trim_start()),
            "read" => self.read(rest.trim()),
            "close" => self.close(rest.trim()),
            "reset" => Ok(Outcome::Reset {
                discarded: self.repeater.reset(),
            }),
            "stats" => Ok(Outcome::Stats(self.repeater.stats())),
            other => Err(CliError::new(
                USAGE,
                format!("unknown command '{other}'; {HELP}"),
            )),
        };

        Step::Continue(Some(result.unwrap_or_else(|err| Outcome::Failed {
            code: err.code,
            message: err.message,
        })))
    }

    fn open(&mut self, mode: &str) -> CliResult<Outcome> {
        let mode = match mode {
            "r" | "ro" | "read" => AccessMode::ReadOnly,
            "w" | "wo" | "write" => AccessMode::WriteOnly,
            "rw" | "read-write" => AccessMode::ReadWrite,
            other => {
                return Err(CliError::new(
                    USAGE,
                    format!("invalid access mode '{other}' (expected r, w or rw)"),
                ))
            }
        };
        let session = self
            .repeater
            .open(mode)
            .map_err(|err| channel_error("open failed", err))?;
        let handle = session.id();
        self.handles.insert(handle, session);
        Ok(Outcome::Opened { handle, mode })
    }

    fn write(&mut self, args: &str) -> CliResult<Outcome> {
        let (handle, text) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
        let handle = parse_handle(handle)?;
        let session = self.session(handle)?;
        let accepted = session
            .write(text.as_bytes())
            .map_err(|err| channel_error("write failed", err))?;
        Ok(Outcome::Wrote {
            handle,
            accepted,
            requested: text.len(),
        })
    }

    fn read(&mut self, args: &str) -> CliResult<Outcome> {
        let mut parts = args.split_whitespace();
        let handle = parse_handle(parts.next().unwrap_or(""))?;
        let max_bytes = match parts.next() {
            Some(max) => max
                .parse()
                .map_err(|_| CliError::new(USAGE, format!("invalid read limit '{max}'")))?,
            None => self.default_max,
        };
        let session = self.session(handle)?;
        let popped = session
            .read(max_bytes)
            .map_err(|err| channel_error("read failed", err))?;
        Ok(Outcome::Delivered { handle, popped })
    }

    fn close(&mut self, args: &str) -> CliResult<Outcome> {
        let handle = parse_handle(args)?;
        let session = self
            .handles
            .remove(&handle)
            .ok_or_else(|| unknown_handle(handle))?;
        self.repeater.close(session);
        Ok(Outcome::Closed { handle })
    }

    fn session(&mut self, handle: u64) -> CliResult<&mut Session> {
        self.handles
            .get_mut(&handle)
            .ok_or_else(|| unknown_handle(handle))
    }
}

fn parse_handle(raw: &str) -> CliResult<u64> {
    raw.parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid handle '{raw}'")))
}

fn unknown_handle(handle: u64) -> CliError {
    CliError::new(USAGE, format!("no open handle {handle}"))
}

use std::fs;

use bytes::{Bytes, BytesMut};
use repeater_channel::{AccessMode, ChannelConfig, Repeater, Session};
use repeater_queue::{decode_record, DEFAULT_MAX_RECORD};

use crate::cmd::FeedArgs;
use crate::exit::{
    channel_error, io_error, record_error, CliError, CliResult, DATA_INVALID, SUCCESS,
};
use crate::output::{print_outcome, Outcome, OutputFormat};

pub fn run(args: FeedArgs, config: ChannelConfig, format: OutputFormat) -> CliResult<i32> {
    let raw = fs::read(&args.file)
        .map_err(|err| io_error(&format!("failed reading {}", args.file.display()), err))?;
    let records = decode_all(BytesMut::from(raw.as_slice()))?;

    let repeater = Repeater::new(config);
    let max_bytes = args
        .max_bytes
        .unwrap_or(repeater.config().queue.byte_capacity);
    let mut pump = Pump::new(&repeater, max_bytes)?;

    for record in &records {
        pump.feed(record, &mut |outcome| print_outcome(&outcome, format))?;
    }
    pump.drain(&mut |outcome| print_outcome(&outcome, format))?;

    Ok(SUCCESS)
}

fn decode_all(mut buf: BytesMut) -> CliResult<Vec<Bytes>> {
    let mut records = Vec::new();
    while let Some(record) =
        decode_record(&mut buf, DEFAULT_MAX_RECORD).map_err(|err| record_error("bad record", err))?
    {
        records.push(record);
    }
    if !buf.is_empty() {
        return Err(CliError::new(
            DATA_INVALID,
            format!("trailing {} bytes do not form a complete record", buf.len()),
        ));
    }
    Ok(records)
}

/// Moves records through a channel: one writer handle, and a reader handle
/// that is reopened whenever one-shot mode has used it up.
struct Pump<'a> {
    repeater: &'a Repeater,
    writer: Session,
    reader: Session,
    max_bytes: usize,
}

impl<'a> Pump<'a> {
    fn new(repeater: &'a Repeater, max_bytes: usize) -> CliResult<Self> {
        Ok(Self {
            repeater,
            writer: open(repeater, AccessMode::WriteOnly)?,
            reader: open(repeater, AccessMode::ReadOnly)?,
            max_bytes,
        })
    }

    /// Write one record, draining the channel first if it is full.
    fn feed(&mut self, record: &[u8], emit: &mut dyn FnMut(Outcome)) -> CliResult<()> {
        let accepted = match self.writer.write(record) {
            Err(err) if err.is_capacity_exceeded() && !self.repeater.queue().is_empty() => {
                self.drain(emit)?;
                self.writer.write(record)
            }
            other => other,
        }
        .map_err(|err| channel_error("write failed", err))?;

        emit(Outcome::Wrote {
            handle: self.writer.id(),
            accepted,
            requested: record.len(),
        });
        Ok(())
    }

    /// Read until the channel is empty.
    fn drain(&mut self, emit: &mut dyn FnMut(Outcome)) -> CliResult<()> {
        while !self.repeater.queue().is_empty() {
            if self.reader.is_exhausted() {
                self.reader = open(self.repeater, AccessMode::ReadOnly)?;
            }
            let popped = self
                .reader
                .read(self.max_bytes)
                .map_err(|err| channel_error("read failed", err))?;
            emit(Outcome::Delivered {
                handle: self.reader.id(),
                popped,
            });
        }
        Ok(())
    }
}

fn open(repeater: &Repeater, mode: AccessMode) -> CliResult<Session> {
    repeater
        .open(mode)
        .map_err(|err| channel_error("open failed", err))
}

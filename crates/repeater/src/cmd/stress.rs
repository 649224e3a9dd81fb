use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use repeater_channel::{AccessMode, ChannelConfig, Repeater, Session};
use serde::Serialize;

use crate::cmd::StressArgs;
use crate::exit::{channel_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS, USAGE};
use crate::output::OutputFormat;

#[derive(Debug, Default, Serialize)]
struct StressReport {
    writers: u32,
    readers: usize,
    written: u64,
    delivered: u64,
    full_retries: u64,
    /// Records seen out of order, duplicated, malformed or never seen.
    violations: u64,
    elapsed_ms: u128,
}

/// What one reader thread saw: per writer, the sequence numbers in arrival order.
type Seen = HashMap<u32, Vec<u32>>;

pub fn run(args: StressArgs, config: ChannelConfig, format: OutputFormat) -> CliResult<i32> {
    if args.writers == 0 || args.readers == 0 {
        return Err(CliError::new(USAGE, "need at least one writer and one reader"));
    }

    let repeater = Arc::new(Repeater::new(config));
    let report = stress(&repeater, &args)?;
    print_report(&report, format);

    if report.violations > 0 {
        Ok(FAILURE)
    } else {
        Ok(SUCCESS)
    }
}

fn stress(repeater: &Arc<Repeater>, args: &StressArgs) -> CliResult<StressReport> {
    let started = Instant::now();
    let writers_done = Arc::new(AtomicBool::new(false));

    let writers: Vec<_> = (0..args.writers)
        .map(|id| {
            let repeater = Arc::clone(repeater);
            let records = args.records;
            thread::spawn(move || write_records(&repeater, id, records))
        })
        .collect();

    let readers: Vec<_> = (0..args.readers)
        .map(|_| {
            let repeater = Arc::clone(repeater);
            let writers_done = Arc::clone(&writers_done);
            thread::spawn(move || read_records(&repeater, &writers_done))
        })
        .collect();

    let mut report = StressReport {
        writers: args.writers,
        readers: args.readers,
        ..StressReport::default()
    };

    let mut first_error = None;
    for writer in writers {
        match join(writer)? {
            Ok(retries) => {
                report.written += u64::from(args.records);
                report.full_retries += retries;
            }
            Err(err) => first_error = first_error.or(Some(err)),
        }
    }
    writers_done.store(true, Ordering::SeqCst);

    let mut per_writer: Seen = HashMap::new();
    for reader in readers {
        match join(reader)? {
            Ok((seen, malformed)) => {
                report.violations += malformed;
                for (writer, seqs) in seen {
                    report.violations += out_of_order(&seqs);
                    per_writer.entry(writer).or_default().extend(seqs);
                }
            }
            Err(err) => first_error = first_error.or(Some(err)),
        }
    }
    if let Some(err) = first_error {
        return Err(err);
    }

    for writer in 0..args.writers {
        let mut seqs = per_writer.remove(&writer).unwrap_or_default();
        report.delivered += seqs.len() as u64;
        seqs.sort_unstable();
        seqs.dedup();
        report.violations += u64::from(args.records).saturating_sub(seqs.len() as u64);
    }
    report.violations += per_writer.values().map(|s| s.len() as u64).sum::<u64>();
    report.elapsed_ms = started.elapsed().as_millis();

    Ok(report)
}

fn write_records(repeater: &Repeater, id: u32, records: u32) -> CliResult<u64> {
    let mut session = open(repeater, AccessMode::WriteOnly)?;
    let mut retries = 0u64;
    let mut seq = 0u32;
    while seq < records {
        let record = format!("{id}:{seq}");
        match session.write(record.as_bytes()) {
            Ok(_) => seq += 1,
            Err(err) if err.is_capacity_exceeded() => {
                retries += 1;
                thread::yield_now();
            }
            Err(err) => return Err(channel_error("write failed", err)),
        }
    }
    Ok(retries)
}

fn read_records(repeater: &Repeater, writers_done: &AtomicBool) -> CliResult<(Seen, u64)> {
    let mut session = open(repeater, AccessMode::ReadOnly)?;
    let mut seen = Seen::new();
    let mut malformed = 0u64;
    loop {
        if session.is_exhausted() {
            session = open(repeater, AccessMode::ReadOnly)?;
        }
        // Sample before reading so a record written just before the flag flips is not missed.
        let finished = writers_done.load(Ordering::SeqCst);
        let popped = session
            .read(64)
            .map_err(|err| channel_error("read failed", err))?;
        if popped.is_empty() {
            if finished && repeater.queue().is_empty() {
                return Ok((seen, malformed));
            }
            thread::yield_now();
            continue;
        }
        match parse_record(popped.data()) {
            Some((writer, seq)) => seen.entry(writer).or_default().push(seq),
            None => malformed += 1,
        }
    }
}

fn parse_record(data: &[u8]) -> Option<(u32, u32)> {
    let text = std::str::from_utf8(data).ok()?;
    let (writer, seq) = text.split_once(':')?;
    Some((writer.parse().ok()?, seq.parse().ok()?))
}

/// Count places where a sequence fails to strictly increase.
fn out_of_order(seqs: &[u32]) -> u64 {
    seqs.windows(2).filter(|pair| pair[0] >= pair[1]).count() as u64
}

fn open(repeater: &Repeater, mode: AccessMode) -> CliResult<Session> {
    repeater
        .open(mode)
        .map_err(|err| channel_error("open failed", err))
}

fn join<T>(handle: thread::JoinHandle<T>) -> CliResult<T> {
    handle
        .join()
        .map_err(|_| CliError::new(INTERNAL, "stress worker panicked"))
}

fn print_report(report: &StressReport, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => {
            println!(
                "{}",
                serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("repeater stress\n");
            println!("  writers:      {}", report.writers);
            println!("  readers:      {}", report.readers);
            println!("  written:      {}", report.written);
            println!("  delivered:    {}", report.delivered);
            println!("  full retries: {}", report.full_retries);
            println!("  violations:   {}", report.violations);
            println!("  elapsed:      {} ms", report.elapsed_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use repeater_channel::QueueConfig;

    use super::*;

    fn args(writers: u32, readers: usize, records: u32) -> StressArgs {
        StressArgs {
            writers,
            readers,
            records,
        }
    }

    #[test]
    fn parses_well_formed_records_only() {
        assert_eq!(parse_record(b"3:17"), Some((3, 17)));
        assert_eq!(parse_record(b"3-17"), None);
        assert_eq!(parse_record(&[0xff, b':', b'1']), None);
    }

    #[test]
    fn counts_order_breaks() {
        assert_eq!(out_of_order(&[0, 1, 2, 3]), 0);
        assert_eq!(out_of_order(&[0, 2, 1, 3, 3]), 2);
    }

    #[test]
    fn small_channel_delivers_everything_in_order() {
        let repeater = Arc::new(Repeater::new(ChannelConfig {
            queue: QueueConfig {
                byte_capacity: 64,
                max_records: 8,
                ..QueueConfig::default()
            },
            ..ChannelConfig::default()
        }));

        let report = stress(&repeater, &args(3, 2, 300)).unwrap();
        assert_eq!(report.written, 900);
        assert_eq!(report.delivered, 900);
        assert_eq!(report.violations, 0);
    }

    #[test]
    fn one_shot_readers_reopen_and_still_drain() {
        let repeater = Arc::new(Repeater::new(ChannelConfig {
            one_shot: true,
            ..ChannelConfig::default()
        }));

        let report = stress(&repeater, &args(2, 2, 100)).unwrap();
        assert_eq!(report.delivered, 200);
        assert_eq!(report.violations, 0);
    }
}

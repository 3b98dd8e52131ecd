//! framecast-replay: feed recorded payloads through the frame pipeline
//!
//! Reads one message payload per line (bare scalar values or JSON bodies),
//! replays them into the engine as if delivered by a broker, and prints the
//! materialized frame as JSON.
//!
//! Usage:
//!   # Replay a capture file into a frame
//!   framecast-replay sensors.jsonl --topic sensors/temp
//!
//!   # Read from stdin, select sub-paths with aliases
//!   cat capture.txt | framecast-replay --topic t --path a.b=temp
//!
//!   # Print every intermediate frame as rows arrive
//!   framecast-replay capture.txt --topic t --stream

use anyhow::{bail, Result};
use chrono::Utc;
use clap::Parser;
use framecast::{Engine, ExtractionPath, Frame, FrameSink};
use std::fs::File;
use std::io::{stdin, BufRead, BufReader};
use std::sync::Arc;
use std::time::Duration;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(name = "framecast-replay")]
#[command(about = "Replay message payloads into a columnar frame", long_about = None)]
struct Args {
    /// Input file with one payload per line (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Topic path the payloads belong to
    #[arg(long, default_value = "replay")]
    topic: String,

    /// Aggregation interval in seconds
    #[arg(long, default_value_t = 0)]
    interval: u64,

    /// Extraction path, as `path` or `path=alias` (repeatable)
    #[arg(long = "path", value_name = "PATH[=ALIAS]")]
    paths: Vec<String>,

    /// Channel prefix stamped into frame metadata
    #[arg(long, default_value = "ds/replay/")]
    channel_prefix: String,

    /// Print every intermediate frame as messages arrive
    #[arg(long)]
    stream: bool,

    /// Compact output (no pretty-printing)
    #[arg(long)]
    compact: bool,
}

struct StdoutSink {
    compact: bool,
}

impl FrameSink for StdoutSink {
    fn send_frame(&self, frame: &Frame) -> Result<()> {
        println!("{}", render(frame, self.compact)?);
        Ok(())
    }
}

fn render(frame: &Frame, compact: bool) -> Result<String> {
    Ok(if compact {
        serde_json::to_string(frame)?
    } else {
        serde_json::to_string_pretty(frame)?
    })
}

fn parse_extraction_path(raw: &str) -> Result<ExtractionPath> {
    match raw.split_once('=') {
        Some((path, alias)) if !path.is_empty() => Ok(ExtractionPath::new(path, alias)),
        None if !raw.is_empty() => Ok(ExtractionPath::new(raw, "")),
        _ => bail!("invalid extraction path: {:?}", raw),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let paths = args
        .paths
        .iter()
        .map(|raw| parse_extraction_path(raw))
        .collect::<Result<Vec<_>>>()?;

    let interval = Duration::from_secs(args.interval);
    let mut engine = Engine::new(args.channel_prefix.clone());
    if args.stream {
        engine = engine.with_sink(Arc::new(StdoutSink {
            compact: args.compact,
        }));
    }
    engine.subscribe(&args.topic, interval, paths);

    // Create reader based on input source
    let reader: Box<dyn BufRead> = if let Some(file_path) = &args.input {
        Box::new(BufReader::new(File::open(file_path)?))
    } else {
        Box::new(BufReader::new(stdin()))
    };

    let mut count = 0;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        engine.on_message(&args.topic, Utc::now(), line.into_bytes());
        count += 1;
    }

    if count == 0 {
        eprintln!("Warning: no payloads found in input");
    }

    if !args.stream {
        let frame = engine.query_topic(&args.topic, interval, None)?;
        println!("{}", render(&frame, args.compact)?);
    }

    Ok(())
}

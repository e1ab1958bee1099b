//! Run a simulated sensor and watch its samples

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::warn;
use simtemp_core::{record, InitialConfig, SimTempError, RECORD_SIZE};
use simtemp_device::{loader, Command, DeviceError, OpenFlags, PollMask, SimTempDevice};
use simtemp_tools::monitor::{apply, format_sample, RecordSink, Settings};

#[derive(Parser)]
#[command(name = "simtemp-monitor")]
#[command(about = "Run the simulated temperature sensor and print its samples", long_about = None)]
struct Cli {
    /// JSON property document with start-up values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sampling period in milliseconds (10..=10000)
    #[arg(short, long)]
    sampling_ms: Option<u32>,

    /// Alert threshold in milli-degrees Celsius
    #[arg(short, long, allow_hyphen_values = true)]
    threshold_mc: Option<i32>,

    /// Signal model: normal, noisy or ramp
    #[arg(short, long)]
    mode: Option<String>,

    /// Number of samples to read
    #[arg(short = 'n', long, default_value = "10")]
    count: usize,

    /// Open the device non-blocking and poll between reads
    #[arg(long)]
    nonblock: bool,

    /// Append raw records to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print samples as JSON lines
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let initial = match &cli.config {
        Some(path) => loader::from_path(path)?,
        None => InitialConfig::default(),
    };
    let device = SimTempDevice::probe(initial).context("starting device")?;

    let settings = Settings {
        sampling_ms: cli.sampling_ms,
        threshold_mc: cli.threshold_mc,
        mode: cli.mode.clone(),
    };
    apply(&device.attributes(), &settings)?;

    let config = device.engine().config();
    println!(
        "simtemp: sampling {} ms, threshold {} mC, mode {}",
        config.sampling_period_ms, config.threshold_mc, config.mode
    );

    let mut sink = cli.output.as_ref().map(RecordSink::append).transpose()?;
    let flags = OpenFlags {
        nonblocking: cli.nonblock,
    };
    let file = device.open(flags);
    let poll_timeout = Duration::from_millis(u64::from(config.sampling_period_ms) * 4);

    let mut buf = [0u8; RECORD_SIZE];
    let mut read = 0;
    while read < cli.count {
        match file.read(&mut buf) {
            Ok(_) => {
                let sample = record::decode(&buf)?;
                if cli.json {
                    println!("{}", serde_json::to_string(&sample)?);
                } else {
                    println!("{}", format_sample(&sample));
                }
                if let Some(sink) = sink.as_mut() {
                    sink.write(&sample)?;
                }
                read += 1;
            }
            Err(DeviceError::Engine(SimTempError::WouldBlock)) => {
                let ready = file.poll_wait(PollMask::POLLIN | PollMask::POLLPRI, Some(poll_timeout))?;
                if ready.contains(PollMask::POLLPRI) {
                    warn!("threshold alert pending");
                    println!("-- threshold alert --");
                }
            }
            Err(e) => return Err(e).context("reading sample"),
        }
    }

    if let Some(sink) = sink.as_mut() {
        sink.flush()?;
        println!("appended {} records", sink.written());
    }

    if let Some(stats) = file.command(Command::GetStats)? {
        println!(
            "stats: produced {}, alerts {}, overflows {}, last error {}",
            stats.samples_produced,
            stats.alerts_triggered,
            stats.queue_overflow_errors,
            stats.last_error
        );
    }

    device.remove();
    Ok(())
}

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use pt_control::{Pid, PidConfig};
use pt_core::Record;
use pt_pipeline::{Pipeline, PipelineConfig, SnapshotObserver};
use pt_source::{CsvSource, RecordSource};

#[derive(Parser)]
#[command(name = "pidtrend")]
#[command(about = "pidtrend - live PID trend over a watched data file", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a file once, run the controller over it, and print the result
    Read {
        /// Path to the CSV data file
        file: PathBuf,
        /// Print records as JSON lines instead of a table
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        tuning: TuningArgs,
    },
    /// Watch a file and print each reconciled snapshot as it changes
    Watch {
        /// Path to the CSV data file
        file: PathBuf,
        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 100)]
        interval_ms: u64,
        /// Re-ingest only when the file's modification time changes
        /// (default re-ingests on every tick)
        #[arg(long)]
        on_change_only: bool,
        /// Stop after this many seconds (default: run until interrupted)
        #[arg(long)]
        duration_s: Option<u64>,
        /// How many trailing records to print per snapshot
        #[arg(long, default_value_t = 5)]
        tail: usize,
        /// Print snapshots as JSON lines instead of a table
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        tuning: TuningArgs,
    },
}

#[derive(Args)]
struct TuningArgs {
    /// Proportional gain
    #[arg(long, default_value_t = 0.3)]
    kp: f64,
    /// Integral gain
    #[arg(long, default_value_t = 0.005)]
    ki: f64,
    /// Derivative gain
    #[arg(long, default_value_t = 0.05)]
    kd: f64,
    /// Minimum controller output
    #[arg(long, default_value_t = 0.0)]
    min: f64,
    /// Maximum controller output
    #[arg(long, default_value_t = 100.0)]
    max: f64,
}

impl TuningArgs {
    fn to_config(&self) -> PidConfig {
        PidConfig {
            kp: self.kp,
            ki: self.ki,
            kd: self.kd,
            min_output: self.min,
            max_output: self.max,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Read { file, json, tuning } => cmd_read(&file, json, &tuning),
        Commands::Watch {
            file,
            interval_ms,
            on_change_only,
            duration_s,
            tail,
            json,
            tuning,
        } => cmd_watch(
            &file,
            interval_ms,
            on_change_only,
            duration_s,
            tail,
            json,
            &tuning,
        ),
    }
}

fn cmd_read(file: &Path, json: bool, tuning: &TuningArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut batch = CsvSource::new().read(file)?;

    let mut pid = Pid::new(tuning.to_config());
    for record in &mut batch {
        record.output_value = pid.calculate(record.set_point, record.input_value);
    }

    if json {
        for record in &batch {
            println!("{}", serde_json::to_string(record)?);
        }
    } else {
        println!("✓ Read {} records from {}", batch.len(), file.display());
        print_records(&batch);
    }
    Ok(())
}

fn cmd_watch(
    file: &Path,
    interval_ms: u64,
    on_change_only: bool,
    duration_s: Option<u64>,
    tail: usize,
    json: bool,
    tuning: &TuningArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = PipelineConfig {
        pid: tuning.to_config(),
        poll_interval: Duration::from_millis(interval_ms),
        ignore_modified_time: !on_change_only,
    };

    let observer: SnapshotObserver = Arc::new(move |records: &[Record]| {
        render_snapshot(records, tail, json);
    });

    let mut pipeline = Pipeline::new(config, observer);
    pipeline.start(file)?;

    println!(
        "✓ Watching {} (poll every {} ms{})",
        file.display(),
        interval_ms,
        if on_change_only {
            ", on change only"
        } else {
            ", re-ingesting every tick"
        }
    );

    match duration_s {
        Some(secs) => {
            thread::sleep(Duration::from_secs(secs));
            pipeline.stop();
            println!("✓ Stopped after {} s", secs);
        }
        None => loop {
            thread::sleep(Duration::from_secs(3600));
        },
    }
    Ok(())
}

fn render_snapshot(records: &[Record], tail: usize, json: bool) {
    if json {
        if let Ok(line) = serde_json::to_string(records) {
            println!("{}", line);
        }
        return;
    }

    println!("-- {} records --", records.len());
    let start = records.len().saturating_sub(tail);
    print_records(&records[start..]);
}

fn print_records(records: &[Record]) {
    println!(
        "{:<19}  {:>10}  {:>10}  {:>10}",
        "timestamp", "input", "setpoint", "output"
    );
    for record in records {
        println!(
            "{:<19}  {:>10.3}  {:>10.3}  {:>10.3}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.input_value,
            record.set_point,
            record.output_value
        );
    }
}

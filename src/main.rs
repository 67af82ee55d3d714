//! `tofex` - headless forward-sensor trial runner.
//!
//! - `tofex run` - run one corridor trial and write its raw and summary records
//! - `tofex config` - print the default configuration as JSON

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod app;
mod config;

use app::App;
use config::ExperimentFile;
use tofex_sim::Steering;

#[derive(Parser)]
#[command(name = "tofex")]
#[command(about = "Forward time-of-flight sensor trial recorder", version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one trial
    Run(RunArgs),

    /// Print the default configuration
    Config,
}

#[derive(Args)]
struct RunArgs {
    /// JSON configuration file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    participant: Option<String>,

    #[arg(long)]
    condition: Option<String>,

    #[arg(long)]
    trial: Option<u32>,

    /// Sample rate in Hz
    #[arg(long)]
    hz: Option<f64>,

    /// Maximum forward sensor range in metres
    #[arg(long)]
    range: Option<f32>,

    /// Output directory
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Output file prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Simulated frames per second
    #[arg(long)]
    fps: Option<f64>,

    /// Random frame length variation, as a fraction of the nominal frame
    #[arg(long)]
    frame_jitter: Option<f64>,

    /// Stop the trial after this many simulated seconds
    #[arg(long)]
    time_limit: Option<f64>,

    /// Steer around obstacles using the ToF array
    #[arg(long)]
    guided: bool,

    /// Also write the change-driven ToF event log
    #[arg(long)]
    events: bool,

    /// Pace frames against the wall clock
    #[arg(long)]
    realtime: bool,

    #[arg(long)]
    seed: Option<u64>,
}

impl RunArgs {
    fn into_config(self) -> Result<ExperimentFile> {
        let mut config = match &self.config {
            Some(path) => ExperimentFile::load(path)?,
            None => ExperimentFile::default(),
        };
        let trial = &mut config.trial;
        if let Some(v) = self.participant {
            trial.participant_id = v;
        }
        if let Some(v) = self.condition {
            trial.condition = v;
        }
        if let Some(v) = self.trial {
            trial.trial = v;
        }
        if let Some(v) = self.hz {
            trial.sample_hz = v;
        }
        if let Some(v) = self.range {
            trial.max_sensor_range = v;
        }
        if let Some(v) = self.out {
            trial.output_directory = v;
        }
        if let Some(v) = self.prefix {
            trial.file_prefix = v;
        }

        let run = &mut config.run;
        if let Some(v) = self.fps {
            run.fps = v;
        }
        if let Some(v) = self.frame_jitter {
            run.frame_jitter = v;
        }
        if let Some(v) = self.time_limit {
            run.time_limit = v;
        }
        if let Some(v) = self.seed {
            run.seed = v;
        }
        if self.guided {
            run.steering = Steering::Guided;
        }
        run.events |= self.events;
        run.realtime |= self.realtime;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "info" })
    });
    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Run(args) => {
            let config = args.into_config()?;
            let summary = App::new(config)?.run()?;
            println!("Trial complete:");
            println!(
                "  {} / {} / T{}",
                summary.participant, summary.condition, summary.trial
            );
            println!("  Duration: {:.3} s", summary.duration);
            println!("  Samples: {}", summary.sample_count);
            match summary.min_distance {
                Some(d) => println!("  Min forward hit: {d:.4} m"),
                None => println!("  Min forward hit: none"),
            }
            println!("  End reason: {}", summary.end_reason);
            println!("  Raw record: {}", summary.raw_path.display());
            Ok(())
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&ExperimentFile::default())?);
            Ok(())
        }
    }
}

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use gait_tracker_rs::config::{AnalysisConfig, Polarity};
use gait_tracker_rs::report::GaitReport;
use gait_tracker_rs::simulate::{synthetic_walk, WalkParams};
use gait_tracker_rs::{analyze_with_config, load};

/// Command-line spelling of [`Polarity`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PolarityArg {
    /// Heel strikes are troughs of the filtered magnitude
    Minima,
    /// Heel strikes are crests of the filtered magnitude
    Maxima,
}

impl From<PolarityArg> for Polarity {
    fn from(arg: PolarityArg) -> Self {
        match arg {
            PolarityArg::Minima => Polarity::Minima,
            PolarityArg::Maxima => Polarity::Maxima,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "gait_tracker")]
#[command(about = "Stride timing from a wearable 3-axis accelerometer recording", long_about = None)]
struct Args {
    /// WFDB record base path (e.g. LabWalks/CO001) or session log (*.json, *.json.gz)
    #[arg(value_name = "RECORD", required_unless_present = "synthetic")]
    record: Option<PathBuf>,

    /// Analyze a generated walk of this many gait cycles instead of a record
    #[arg(long, value_name = "CYCLES", conflicts_with = "record")]
    synthetic: Option<usize>,

    /// JSON configuration file; flags below override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Bandpass lower cutoff (Hz)
    #[arg(long)]
    low_cutoff: Option<f64>,

    /// Bandpass upper cutoff (Hz)
    #[arg(long)]
    high_cutoff: Option<f64>,

    /// Butterworth prototype order
    #[arg(long)]
    order: Option<usize>,

    /// Minimum time between heel strikes (seconds)
    #[arg(long)]
    min_separation: Option<f64>,

    /// Minimum peak prominence; omit to disable the gate
    #[arg(long)]
    prominence: Option<f64>,

    /// Which extremum marks a heel strike
    #[arg(long, value_enum)]
    polarity: Option<PolarityArg>,

    /// Print the report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// List every heel-strike time in the text report
    #[arg(long, default_value_t = false)]
    list_events: bool,

    /// -v for info, -vv for debug logging (RUST_LOG takes precedence)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Config file (or defaults) with command-line overrides applied
fn build_config(args: &Args) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    if let Some(low) = args.low_cutoff {
        config.filter.low_cutoff_hz = low;
    }
    if let Some(high) = args.high_cutoff {
        config.filter.high_cutoff_hz = high;
    }
    if let Some(order) = args.order {
        config.filter.order = order;
    }
    if let Some(sep) = args.min_separation {
        config.events.min_event_separation_s = sep;
    }
    if args.prominence.is_some() {
        config.events.prominence_threshold = args.prominence;
    }
    if let Some(polarity) = args.polarity {
        config.events.polarity = polarity.into();
    }
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = build_config(&args)?;

    let (label, trace) = match (&args.record, args.synthetic) {
        (_, Some(cycles)) => {
            let params = WalkParams {
                cycles,
                ..Default::default()
            };
            let trace = synthetic_walk(&params).context("generating synthetic walk")?;
            (format!("synthetic walk ({cycles} cycles)"), trace)
        }
        (Some(path), None) => {
            let trace =
                load(path).with_context(|| format!("loading record {}", path.display()))?;
            (path.display().to_string(), trace)
        }
        (None, None) => bail!("provide a RECORD path or --synthetic <CYCLES>"),
    };
    info!(
        "{}: {} samples at {:.2} Hz",
        label,
        trace.len(),
        trace.sampling_rate_hz()
    );

    let analysis =
        analyze_with_config(&trace, &config).with_context(|| format!("analyzing {label}"))?;
    let report = GaitReport::new(label, &trace, &analysis, &config);

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report.render_text(args.list_events));
    }
    Ok(())
}

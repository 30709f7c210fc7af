//! Gaze dwell replay tool: feeds recorded detections through the tracker.

use anyhow::{bail, Context, Result};
use clap::Parser;
use gaze_dwell::{
    app::{AppConfig, ReplayApp},
    calibration::CalibrationMethod,
    config::Config,
    page::StaticPage,
    pipeline::SessionMode,
    signal::SignalMode,
};
use log::info;
use std::{
    fs::File,
    io::{self, BufReader},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON-lines recording to replay (stdin when omitted)
    #[arg(short, long)]
    input: Option<String>,

    /// Page layout file (YAML list of elements)
    #[arg(short, long)]
    page: Option<String>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Signal mode override (gaze, head)
    #[arg(short, long)]
    mode: Option<String>,

    /// Calibration method override (regression, range)
    #[arg(long)]
    method: Option<String>,

    /// Start in live dwell mode instead of idle
    #[arg(long)]
    live: bool,

    /// Start in calibration mode
    #[arg(long, conflicts_with = "live")]
    calibrate: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path);
        Config::from_file(config_path).with_context(|| format!("loading {config_path}"))?
    } else {
        Config::default()
    };

    if let Some(mode) = &args.mode {
        config.signal.mode = match mode.as_str() {
            "gaze" => SignalMode::Gaze,
            "head" => SignalMode::Head,
            other => bail!("unknown signal mode '{other}' (expected gaze or head)"),
        };
    }
    if let Some(method) = &args.method {
        config.calibration.method = match method.as_str() {
            "regression" => CalibrationMethod::Regression,
            "range" => CalibrationMethod::Range,
            other => bail!("unknown calibration method '{other}' (expected regression or range)"),
        };
    }
    config.validate()?;

    if args.print_config {
        print!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    let page = match &args.page {
        Some(path) => StaticPage::from_file(path).with_context(|| format!("loading page {path}"))?,
        None => StaticPage::new(),
    };

    let start_mode = if args.live {
        SessionMode::Live
    } else if args.calibrate {
        SessionMode::Calibrating
    } else {
        SessionMode::Idle
    };

    let mut app = ReplayApp::new(AppConfig {
        tracker: config,
        page,
        start_mode,
    })?;

    let stdout = io::stdout().lock();
    let stats = match &args.input {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {path}"))?;
            app.run(BufReader::new(file), stdout)?
        }
        None => app.run(io::stdin().lock(), stdout)?,
    };
    info!("Replayed {} records", stats.records);

    Ok(())
}

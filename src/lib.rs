#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod models;
pub mod utils;

// Re-export commonly used types outside of crate
pub use analysis::{
    ConfluenceReport, DetectionContext, DetectorKind, FactorDetector, ZoneAggregator,
    panic_is_isolated,
};
pub use config::{CONFLUENCE, ConfluenceConfig, Pct, Price};
pub use data::{InputBundle, load_bundle};
pub use models::{ConfluenceFactor, ConfluenceZone, OhlcvTimeSeries, ZoneRecord};

// CLI argument parsing
use {
    anyhow::{Context, Result, bail},
    clap::Parser,
    itertools::Itertools,
    std::path::PathBuf,
};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Confluence zone detection", long_about = None)]
pub struct Cli {
    /// JSON bundle: {"bars": [...], "flows": [...], "open_interest": [...]}
    #[arg(short, long)]
    pub input: PathBuf,

    /// Reference price (defaults to the latest close)
    #[arg(long)]
    pub current_price: Option<f64>,

    /// Clustering tolerance in percent, e.g. 0.75
    #[arg(long)]
    pub tolerance_pct: Option<f64>,

    /// Comma-separated detectors to run (default: all)
    #[arg(long, value_delimiter = ',')]
    pub detectors: Vec<DetectorKind>,

    /// Evaluate detectors in parallel
    #[arg(long, default_value_t = false)]
    pub parallel: bool,

    /// Print JSON zone records instead of a table
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Only show the N highest-scoring zones
    #[arg(long)]
    pub top: Option<usize>,

    /// Detection timestamp stamped on factors (YYYY-MM-DD or RFC 3339). Defaults to now.
    #[arg(long)]
    pub as_of: Option<String>,
}

impl Cli {
    /// Compile-time defaults with the command-line overrides applied.
    pub fn config(&self) -> Result<ConfluenceConfig> {
        let mut config = CONFLUENCE;
        config.parallel = self.parallel;

        if let Some(pct) = self.tolerance_pct {
            if !(pct > 0.0 && pct < 100.0) {
                bail!("--tolerance-pct must be in (0, 100), got {}", pct);
            }
            config.zones.tolerance_pct = Pct::new(pct / 100.0);
        }
        Ok(config)
    }

    /// Requested detectors in registry order, duplicates removed.
    pub fn detector_kinds(&self) -> Vec<DetectorKind> {
        if self.detectors.is_empty() {
            return DetectorKind::ALL.to_vec();
        }
        self.detectors.iter().copied().sorted().dedup().collect()
    }
}

/// Loads the bundle named on the command line and runs one aggregation pass.
pub fn run_cli(args: &Cli) -> Result<ConfluenceReport> {
    let config = args.config()?;
    let bundle = load_bundle(&args.input)?;

    let as_of = match &args.as_of {
        Some(text) => utils::parse_timestamp_ms(text)
            .ok()
            .and_then(utils::epoch_ms_to_utc)
            .with_context(|| format!("Invalid --as-of '{}'", text))?,
        None => utils::now_utc(),
    };

    let mut ctx = DetectionContext::new(as_of);
    if let Some(flows) = &bundle.flows {
        ctx = ctx.with_flows(flows);
    }
    if let Some(oi) = &bundle.open_interest {
        ctx = ctx.with_open_interest(oi);
    }
    if let Some(price) = args.current_price {
        if !(price.is_finite() && price > 0.0) {
            bail!("--current-price must be a positive number, got {}", price);
        }
        ctx = ctx.with_current_price(Price::new(price));
    }

    let aggregator = ZoneAggregator::from_kinds(config, &args.detector_kinds());
    log::info!(
        "Running detectors: {}",
        aggregator.detector_kinds().iter().join(", ")
    );

    Ok(aggregator.run(&bundle.series, &ctx))
}

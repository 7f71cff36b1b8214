use {
    anyhow::{Context, Result},
    clap::Parser,
    confluence_zones::{Cli, ConfluenceZone, config::PriceLike, panic_is_isolated, run_cli},
    itertools::Itertools,
    std::panic,
    tabled::{Table, Tabled, settings::Style},
};

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Range")]
    range: String,
    #[tabled(rename = "Type")]
    zone_type: String,
    #[tabled(rename = "Strength")]
    strength: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Factors")]
    factors: String,
    #[tabled(rename = "Dist %")]
    distance: String,
    #[tabled(rename = "Breach")]
    breach: String,
}

impl ZoneRow {
    fn new(rank: usize, zone: &ConfluenceZone) -> Self {
        let kinds = zone
            .factors
            .iter()
            .map(|f| f.factor_type.to_string())
            .unique()
            .join(", ");
        Self {
            rank,
            level: zone.price_level.format_price(),
            range: format!(
                "{} - {}",
                zone.price_range.0.format_price(),
                zone.price_range.1.format_price()
            ),
            zone_type: zone.zone_type.to_string(),
            strength: zone.strength.to_string(),
            score: format!("{:.3}", zone.confluence_score),
            factors: format!("{} ({})", zone.factor_count(), kinds),
            distance: format!("{:+.2}", zone.distance_to_current),
            breach: zone.breach_probability.to_string(),
        }
    }
}

fn main() -> Result<()> {
    panic::set_hook(Box::new(|info| {
        // Detector panics are caught and reported by the aggregator
        if panic_is_isolated() {
            return;
        }
        let backtrace = std::backtrace::Backtrace::force_capture();
        log::error!("CRITICAL PANIC:\n{}\nStack Trace:\n{}", info, backtrace);
    }));

    let (global_level, my_code_level) = if cfg!(debug_assertions) {
        (log::LevelFilter::Warn, log::LevelFilter::Info)
    } else {
        (log::LevelFilter::Error, log::LevelFilter::Warn)
    };

    let mut builder = env_logger::Builder::new();

    builder
        .filter(None, global_level)
        .filter(Some("confluence_zones"), my_code_level)
        .parse_default_env()
        .init();

    let args = Cli::parse();
    let report = run_cli(&args)?;

    let shown = args.top.unwrap_or(report.zones.len());
    let zones = report.top(shown);

    if args.json {
        let records: Vec<_> = zones.iter().map(ConfluenceZone::to_record).collect();
        let text = serde_json::to_string_pretty(&records).context("Failed to serialize zones")?;
        println!("{}", text);
        return Ok(());
    }

    match report.reference_price {
        Some(price) => println!("Reference price: {}", price),
        None => println!("Reference price: n/a"),
    }
    println!(
        "{} factors, {} zones (showing {})",
        report.factor_count,
        report.zones.len(),
        zones.len()
    );
    if !report.skipped.is_empty() {
        println!("Skipped (no input): {}", report.skipped.iter().join(", "));
    }
    if !report.failed.is_empty() {
        println!("Failed: {}", report.failed.iter().join(", "));
    }

    let rows: Vec<ZoneRow> = zones
        .iter()
        .enumerate()
        .map(|(i, z)| ZoneRow::new(i + 1, z))
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    Ok(())
}

use {
    crate::{
        config::constants::etf_flow::FLOW_COLUMN_ALIASES,
        domain::{Candle, FlowSeries, OpenInterestSeries},
        models::OhlcvTimeSeries,
        utils::parse_timestamp_ms,
    },
    anyhow::{Context, Result, anyhow, bail},
    serde::Deserialize,
    serde_json::{Map, Value},
    std::{fs, path::Path},
};

const DEFAULT_SYMBOL: &str = "UNKNOWN";

/// On-disk shape of an input bundle. Rows stay loosely typed until resolved.
#[derive(Deserialize, Debug)]
struct RawBundle {
    #[serde(default)]
    symbol: Option<String>,
    bars: Vec<Map<String, Value>>,
    #[serde(default)]
    flows: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    open_interest: Option<Vec<Map<String, Value>>>,
}

/// Price bars plus whatever auxiliary series the bundle carried.
#[derive(Debug, Clone, Default)]
pub struct InputBundle {
    pub series: OhlcvTimeSeries,
    pub flows: Option<FlowSeries>,
    pub open_interest: Option<OpenInterestSeries>,
}

pub fn load_bundle(path: &Path) -> Result<InputBundle> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input bundle: {}", path.display()))?;
    parse_bundle(&text).with_context(|| format!("Invalid input bundle: {}", path.display()))
}

pub fn parse_bundle(text: &str) -> Result<InputBundle> {
    let raw: RawBundle = serde_json::from_str(text).context("Failed to parse bundle JSON")?;

    if raw.bars.is_empty() {
        bail!("Bundle has no price bars");
    }

    let mut candles = raw
        .bars
        .iter()
        .enumerate()
        .map(|(i, row)| parse_bar(row).with_context(|| format!("Bar {}", i)))
        .collect::<Result<Vec<Candle>>>()?;

    if !candles.is_sorted_by_key(|c| c.timestamp_ms) {
        log::warn!("Price bars were not in time order, sorting");
        candles.sort_by_key(|c| c.timestamp_ms);
    }

    let symbol = raw.symbol.unwrap_or_else(|| DEFAULT_SYMBOL.to_string());
    let series = OhlcvTimeSeries::from_candles(symbol, candles);

    let flows = raw
        .flows
        .map(|rows| FlowSeries::from_rows(&rows, FLOW_COLUMN_ALIASES));
    let open_interest = raw
        .open_interest
        .map(|rows| OpenInterestSeries::from_rows(&rows));

    log::info!(
        "Loaded {} bars for {} (flows: {}, OI levels: {})",
        series.klines(),
        series.symbol,
        flows.as_ref().map_or(0, FlowSeries::len),
        open_interest.as_ref().map_or(0, OpenInterestSeries::len)
    );

    Ok(InputBundle {
        series,
        flows,
        open_interest,
    })
}

fn field<'a>(row: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    row.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v)
}

fn price_field(row: &Map<String, Value>, name: &str) -> Result<f64> {
    let value = field(row, name).ok_or_else(|| anyhow!("missing '{}'", name))?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| anyhow!("'{}' is not a number: {}", name, value))
}

fn bar_timestamp(row: &Map<String, Value>) -> Result<i64> {
    if let Some(ms) = field(row, "timestamp_ms").and_then(Value::as_i64) {
        return Ok(ms);
    }
    match field(row, "timestamp").or_else(|| field(row, "date")) {
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| anyhow!("timestamp is not an integer")),
        Some(Value::String(s)) => parse_timestamp_ms(s),
        _ => bail!("missing 'timestamp_ms', 'timestamp' or 'date'"),
    }
}

fn parse_bar(row: &Map<String, Value>) -> Result<Candle> {
    // Volume is optional: bars without it simply add nothing to the volume profile
    let volume = if field(row, "volume").is_some() {
        price_field(row, "volume")?
    } else {
        0.0
    };

    Ok(Candle::new(
        bar_timestamp(row)?,
        price_field(row, "open")?,
        price_field(row, "high")?,
        price_field(row, "low")?,
        price_field(row, "close")?,
        volume,
    ))
}

use {
    crate::utils::{epoch_ms_to_date, parse_timestamp_ms},
    chrono::NaiveDate,
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
    std::collections::BTreeMap,
};

const DATE_COLUMN: &str = "date";

/// One institutional flow print.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub date: NaiveDate,
    pub flow: f64,
}

/// Net flow series, already resolved to a single magnitude column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowSeries {
    pub records: Vec<FlowRecord>,
}

/// Finds which of `aliases` names the flow column. Case-insensitive, first alias wins.
pub fn resolve_flow_column<'a, I>(keys: I, aliases: &[&str]) -> Option<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let by_lower: BTreeMap<String, &String> =
        keys.into_iter().map(|k| (k.to_lowercase(), k)).collect();

    aliases
        .iter()
        .find_map(|alias| by_lower.get(&alias.to_lowercase()).map(|k| (*k).clone()))
}

fn find_key<'a>(row: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    row.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v)
}

fn value_to_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(text) => parse_timestamp_ms(text).ok().and_then(epoch_ms_to_date),
        Value::Number(n) => n.as_i64().and_then(epoch_ms_to_date),
        _ => None,
    }
}

impl FlowSeries {
    pub fn new(records: Vec<FlowRecord>) -> Self {
        Self { records }
    }

    /// Builds the series from loosely-typed rows.
    /// The magnitude column is resolved once against `aliases`. An unknown column
    /// or a missing `date` column yields an empty series and a warning.
    pub fn from_rows(rows: &[Map<String, Value>], aliases: &[&str]) -> Self {
        let Some(first) = rows.first() else {
            return Self::default();
        };

        let Some(flow_col) = resolve_flow_column(first.keys(), aliases) else {
            log::warn!(
                "ETF flows: no flow column among {:?} (have {:?})",
                aliases,
                first.keys().collect::<Vec<_>>()
            );
            return Self::default();
        };

        if find_key(first, DATE_COLUMN).is_none() {
            log::warn!("ETF flows missing '{}' column", DATE_COLUMN);
            return Self::default();
        }

        let mut dropped = 0usize;
        let records: Vec<FlowRecord> = rows
            .iter()
            .filter_map(|row| {
                let date = find_key(row, DATE_COLUMN).and_then(value_to_date);
                let flow = row.get(&flow_col).and_then(Value::as_f64);
                match (date, flow) {
                    (Some(date), Some(flow)) if flow.is_finite() => Some(FlowRecord { date, flow }),
                    _ => {
                        dropped += 1;
                        None
                    }
                }
            })
            .collect();

        if dropped > 0 {
            log::warn!("ETF flows: dropped {} malformed rows", dropped);
        }

        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Net flow per calendar date, oldest first.
    pub fn daily_totals(&self) -> BTreeMap<NaiveDate, f64> {
        let mut totals = BTreeMap::new();
        for record in &self.records {
            *totals.entry(record.date).or_insert(0.0) += record.flow;
        }
        totals
    }
}

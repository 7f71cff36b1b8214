use {
    crate::config::{Price, PriceLike, Strength},
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    serde_json::Value,
    std::{collections::BTreeMap, fmt},
    strum_macros::{Display, EnumCount},
};

/// Auxiliary evidence carried with a factor. Only the price-action keys are read downstream.
pub type FactorMetadata = BTreeMap<String, Value>;

/// Metadata keys shared between detectors and the aggregator.
pub mod meta {
    pub const TOUCHES: &str = "touches";
    pub const LAST_TOUCH_MS: &str = "last_touch_ms";
    pub const RECENCY_WEIGHT: &str = "recency_weight";
    pub const BAR_INDEX: &str = "bar_index";
    pub const WINDOW: &str = "window";
    pub const VOLUME: &str = "volume";
    pub const PROMINENCE: &str = "prominence";
    pub const BIN_INDEX: &str = "bin_index";
    pub const FIB_LEVEL: &str = "fib_level";
    pub const SWING_HIGH: &str = "swing_high";
    pub const SWING_LOW: &str = "swing_low";
    pub const FLOW_MAGNITUDE: &str = "flow_magnitude";
    pub const Z_SCORE: &str = "z_score";
    pub const DATE: &str = "date";
    pub const OPEN_INTEREST: &str = "open_interest";
    pub const PERIOD: &str = "period";
    pub const DISTANCE_PCT: &str = "distance_pct";
    pub const INTERVAL: &str = "interval";
    pub const PIVOT_TYPE: &str = "pivot_type";
    pub const LEVEL: &str = "level";
    pub const GAP_TYPE: &str = "gap_type";
}

#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Debug,
    Serialize,
    Deserialize,
    Display,
    EnumCount,
)]
pub enum FactorType {
    #[serde(rename = "historical_support_resistance")]
    #[strum(to_string = "historical_support_resistance")]
    HistoricalSr,
    #[serde(rename = "volume_profile_node")]
    #[strum(to_string = "volume_profile_node")]
    VolumeProfile,
    #[serde(rename = "fibonacci_level")]
    #[strum(to_string = "fibonacci_level")]
    Fibonacci,
    #[serde(rename = "moving_average")]
    #[strum(to_string = "moving_average")]
    MovingAverage,
    #[serde(rename = "round_number")]
    #[strum(to_string = "round_number")]
    RoundNumber,
    #[serde(rename = "etf_flow_pivot")]
    #[strum(to_string = "etf_flow_pivot")]
    EtfFlowPivot,
    #[serde(rename = "open_interest_cluster")]
    #[strum(to_string = "open_interest_cluster")]
    OpenInterest,
    #[serde(rename = "pivot_point")]
    #[strum(to_string = "pivot_point")]
    PivotPoint,
    #[serde(rename = "gap_level")]
    #[strum(to_string = "gap_level")]
    GapLevel,
    #[serde(rename = "swing_high_low")]
    #[strum(to_string = "swing_high_low")]
    SwingPoint,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConfluenceType {
    Support,
    Resistance,
    /// Can act as either
    Pivot,
    /// Attracts price (OI clusters)
    Magnet,
}

impl ConfluenceType {
    /// Support below the reference, resistance at or above it.
    pub fn relative_to(price: f64, reference: f64) -> Self {
        if price < reference {
            ConfluenceType::Support
        } else {
            ConfluenceType::Resistance
        }
    }
}

/// Individual technical factor at a price level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfluenceFactor {
    pub price: Price,
    pub factor_type: FactorType,
    pub strength: Strength,
    pub direction: ConfluenceType,
    #[serde(default)]
    pub metadata: FactorMetadata,
    pub detected_at: DateTime<Utc>,
}

impl ConfluenceFactor {
    pub fn new(
        price: f64,
        factor_type: FactorType,
        strength: Strength,
        direction: ConfluenceType,
        detected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            price: Price::new(price),
            factor_type,
            strength,
            direction,
            metadata: FactorMetadata::new(),
            detected_at,
        }
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Finite, strictly positive price.
    pub fn is_well_formed(&self) -> bool {
        self.price.is_valid_level()
    }

    pub fn meta_f64(&self, key: &str) -> Option<f64> {
        self.metadata.get(key).and_then(Value::as_f64)
    }

    pub fn meta_i64(&self, key: &str) -> Option<i64> {
        self.metadata.get(key).and_then(Value::as_i64)
    }
}

impl fmt::Display for ConfluenceFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{:.2}({:.2})",
            self.factor_type,
            self.price.value(),
            self.strength.value()
        )
    }
}

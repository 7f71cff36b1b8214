use {
    crate::{
        analysis::{
            EtfFlowDetector, FibonacciDetector, GapLevelDetector, MovingAverageDetector,
            OpenInterestDetector, PivotPointDetector, PriceActionDetector, RoundNumberDetector,
            VolumeProfileDetector,
        },
        config::{ConfluenceConfig, Price, PriceLike},
        domain::{FlowSeries, OpenInterestSeries},
        models::{ConfluenceFactor, OhlcvTimeSeries},
    },
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    strum_macros::{Display, EnumString},
};

/// Auxiliary inputs a detector may read. Borrowed, never owned.
#[derive(Debug, Clone, Copy)]
pub struct DetectionContext<'a> {
    pub flows: Option<&'a FlowSeries>,
    pub open_interest: Option<&'a OpenInterestSeries>,
    /// Overrides the latest close as the reference price
    pub current_price: Option<Price>,
    /// Stamped onto every factor of the pass
    pub as_of: DateTime<Utc>,
}

impl<'a> DetectionContext<'a> {
    pub fn new(as_of: DateTime<Utc>) -> Self {
        Self {
            flows: None,
            open_interest: None,
            current_price: None,
            as_of,
        }
    }

    pub fn with_flows(mut self, flows: &'a FlowSeries) -> Self {
        self.flows = Some(flows);
        self
    }

    pub fn with_open_interest(mut self, open_interest: &'a OpenInterestSeries) -> Self {
        self.open_interest = Some(open_interest);
        self
    }

    pub fn with_current_price(mut self, price: Price) -> Self {
        self.current_price = Some(price);
        self
    }

    /// Override if valid, else the latest close.
    pub fn reference_price(&self, series: &OhlcvTimeSeries) -> Option<Price> {
        self.current_price
            .filter(|p| p.is_valid_level())
            .or_else(|| series.last_close().map(Price::from))
            .filter(|p| p.is_valid_level())
    }
}

/// Which auxiliary series a detector cannot run without.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display)]
pub enum ContextRequirement {
    None,
    Flows,
    OpenInterest,
}

impl ContextRequirement {
    pub fn is_satisfied_by(self, ctx: &DetectionContext<'_>) -> bool {
        match self {
            ContextRequirement::None => true,
            ContextRequirement::Flows => ctx.flows.is_some(),
            ContextRequirement::OpenInterest => ctx.open_interest.is_some(),
        }
    }
}

/// One class of market evidence.
/// Implementations are total: missing or degenerate input gives an empty list.
pub trait FactorDetector: Send + Sync {
    fn kind(&self) -> DetectorKind;

    fn requirement(&self) -> ContextRequirement {
        ContextRequirement::None
    }

    fn detect(&self, series: &OhlcvTimeSeries, ctx: &DetectionContext<'_>)
    -> Vec<ConfluenceFactor>;
}

/// Registry of the built-in detectors.
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
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DetectorKind {
    PriceAction,
    VolumeProfile,
    Fibonacci,
    EtfFlow,
    OpenInterest,
    MovingAverage,
    RoundNumber,
    PivotPoint,
    GapLevel,
}

impl DetectorKind {
    /// Registry order. Factors are concatenated in this order.
    pub const ALL: &'static [DetectorKind] = &[
        DetectorKind::PriceAction,
        DetectorKind::VolumeProfile,
        DetectorKind::Fibonacci,
        DetectorKind::EtfFlow,
        DetectorKind::OpenInterest,
        DetectorKind::MovingAverage,
        DetectorKind::RoundNumber,
        DetectorKind::PivotPoint,
        DetectorKind::GapLevel,
    ];

    pub fn build(self, config: &ConfluenceConfig) -> Box<dyn FactorDetector> {
        match self {
            DetectorKind::PriceAction => Box::new(PriceActionDetector::new(config.price_action)),
            DetectorKind::VolumeProfile => {
                Box::new(VolumeProfileDetector::new(config.volume_profile))
            }
            DetectorKind::Fibonacci => Box::new(FibonacciDetector::new(config.fibonacci)),
            DetectorKind::EtfFlow => Box::new(EtfFlowDetector::new(config.etf_flow)),
            DetectorKind::OpenInterest => {
                Box::new(OpenInterestDetector::new(config.open_interest))
            }
            DetectorKind::MovingAverage => {
                Box::new(MovingAverageDetector::new(config.moving_average))
            }
            DetectorKind::RoundNumber => Box::new(RoundNumberDetector),
            DetectorKind::PivotPoint => Box::new(PivotPointDetector),
            DetectorKind::GapLevel => Box::new(GapLevelDetector),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::CONFLUENCE, domain::Candle};
    use std::str::FromStr;

    #[test]
    fn registry_builds_every_kind() {
        for &kind in DetectorKind::ALL {
            assert_eq!(kind.build(&CONFLUENCE).kind(), kind);
        }
    }

    #[test]
    fn kinds_parse_from_cli_names() {
        assert_eq!(
            DetectorKind::from_str("etf_flow").unwrap(),
            DetectorKind::EtfFlow
        );
        assert_eq!(
            DetectorKind::from_str("Open_Interest").unwrap(),
            DetectorKind::OpenInterest
        );
        assert!(DetectorKind::from_str("astrology").is_err());
    }

    #[test]
    fn reference_price_prefers_a_valid_override() {
        let series = OhlcvTimeSeries::from_candles(
            "T",
            vec![Candle::new(0, 10.0, 11.0, 9.0, 10.5, 1.0)],
        );
        let as_of = DateTime::from_timestamp(0, 0).unwrap();

        let ctx = DetectionContext::new(as_of);
        assert_eq!(ctx.reference_price(&series), Some(Price::new(10.5)));

        let ctx = ctx.with_current_price(Price::new(12.0));
        assert_eq!(ctx.reference_price(&series), Some(Price::new(12.0)));

        let ctx = DetectionContext::new(as_of).with_current_price(Price::new(0.0));
        assert_eq!(ctx.reference_price(&series), Some(Price::new(10.5)));
    }
}

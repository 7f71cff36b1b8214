// Factor detectors and zone aggregation
mod confluence;
mod detector;
mod etf_flow;
mod fibonacci;
mod gap_level;
mod moving_average;
mod open_interest;
mod pivot_point;
mod price_action;
mod round_number;
mod volume_profile;
mod zone_scoring;

pub use {
    confluence::{ConfluenceReport, ZoneAggregator, panic_is_isolated},
    detector::{ContextRequirement, DetectionContext, DetectorKind, FactorDetector},
    etf_flow::EtfFlowDetector,
    fibonacci::FibonacciDetector,
    gap_level::GapLevelDetector,
    moving_average::MovingAverageDetector,
    open_interest::OpenInterestDetector,
    pivot_point::PivotPointDetector,
    price_action::PriceActionDetector,
    round_number::RoundNumberDetector,
    volume_profile::VolumeProfileDetector,
};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{
        domain::Candle,
        models::OhlcvTimeSeries,
        utils::{TimeUtils, date_to_epoch_ms},
    };
    use chrono::NaiveDate;

    pub fn day_date(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64)
    }

    /// Midnight UTC of day `i`, counting from 2024-01-01.
    pub fn day_ms(i: usize) -> i64 {
        date_to_epoch_ms(day_date(0)) + i as i64 * TimeUtils::MS_IN_D
    }

    /// Daily bars closing at the middle of each [low, high].
    pub fn series_from_hl(highs: &[f64], lows: &[f64]) -> OhlcvTimeSeries {
        let candles = highs
            .iter()
            .zip(lows)
            .enumerate()
            .map(|(i, (&h, &l))| {
                let mid = (h + l) / 2.0;
                Candle::new(day_ms(i), mid, h, l, mid, 1.0)
            })
            .collect();
        OhlcvTimeSeries::from_candles("TEST", candles)
    }

    pub fn series_from_closes(closes: &[f64]) -> OhlcvTimeSeries {
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle::new(day_ms(i), c, c * 1.01, c * 0.99, c, 1.0))
            .collect();
        OhlcvTimeSeries::from_candles("TEST", candles)
    }
}

use {
    crate::{
        analysis::{DetectionContext, DetectorKind, FactorDetector},
        config::{Price, PriceActionSettings, PriceLike, Strength},
        models::{ConfluenceFactor, ConfluenceType, FactorType, OhlcvTimeSeries, meta},
        utils::{centered_window, get_max, get_min},
    },
    chrono::{DateTime, Utc},
};

/// Historical support/resistance from local swings, plus major swing points.
#[derive(Debug, Clone, Copy)]
pub struct PriceActionDetector {
    settings: PriceActionSettings,
}

impl PriceActionDetector {
    pub fn new(settings: PriceActionSettings) -> Self {
        Self { settings }
    }

    /// Strict local extremes over `swing_neighbours` bars on each side.
    fn historical_levels(
        &self,
        series: &OhlcvTimeSeries,
        as_of: DateTime<Utc>,
    ) -> Vec<ConfluenceFactor> {
        let k = self.settings.swing_neighbours;
        let n = series.klines();
        if k == 0 || n < 2 * k + 1 {
            return Vec::new();
        }

        let highs = series.highs();
        let lows = series.lows();
        let mut factors = Vec::new();

        for i in k..n - k {
            let neighbours = (i - k..=i + k).filter(|&j| j != i);

            if neighbours.clone().all(|j| highs[i] > highs[j]) {
                factors.extend(self.touch_scored(
                    series,
                    i,
                    highs[i],
                    ConfluenceType::Resistance,
                    as_of,
                ));
            }
            if neighbours.clone().all(|j| lows[i] < lows[j]) {
                factors.extend(self.touch_scored(
                    series,
                    i,
                    lows[i],
                    ConfluenceType::Support,
                    as_of,
                ));
            }
        }

        factors
    }

    fn touch_scored(
        &self,
        series: &OhlcvTimeSeries,
        bar_index: usize,
        level: f64,
        direction: ConfluenceType,
        as_of: DateTime<Utc>,
    ) -> Option<ConfluenceFactor> {
        let level_price = Price::new(level);
        if !level_price.is_valid_level() {
            return None;
        }

        let tolerance = self.settings.touch_tolerance.value();
        let touching: Vec<usize> = (0..series.klines())
            .filter(|&i| {
                series.high_prices[i].percent_diff_from_0_1(&level_price) <= tolerance
                    || series.low_prices[i].percent_diff_from_0_1(&level_price) <= tolerance
            })
            .collect();

        // The swing bar itself always touches its own level
        let last_touch = touching.last().copied().unwrap_or(bar_index);
        let n = series.klines() as f64;
        let recency_weight = 0.5 + 0.5 * (last_touch as f64 + 1.0) / n;
        let touches = touching.len();
        let strength = Strength::new(
            (touches as f64 / self.settings.touches_for_full_strength * recency_weight).min(1.0),
        );

        Some(
            ConfluenceFactor::new(level, FactorType::HistoricalSr, strength, direction, as_of)
                .with_meta(meta::TOUCHES, touches as u64)
                .with_meta(meta::RECENCY_WEIGHT, recency_weight)
                .with_meta(meta::BAR_INDEX, bar_index as u64)
                .with_meta(meta::LAST_TOUCH_MS, series.timestamps[last_touch]),
        )
    }

    /// Bars that are the extreme of a full centered window.
    fn major_swings(
        &self,
        series: &OhlcvTimeSeries,
        as_of: DateTime<Utc>,
    ) -> Vec<ConfluenceFactor> {
        let half = self.settings.major_swing_half_window;
        if series.klines() < 2 * half + 1 {
            return Vec::new();
        }

        let highs = series.highs();
        let lows = series.lows();
        let window_max = centered_window(&highs, half, get_max);
        let window_min = centered_window(&lows, half, get_min);
        let strength = self.settings.major_swing_strength;

        let swing = |price: f64, direction: ConfluenceType, i: usize| {
            ConfluenceFactor::new(price, FactorType::SwingPoint, strength, direction, as_of)
                .with_meta(meta::WINDOW, half as u64)
                .with_meta(meta::BAR_INDEX, i as u64)
        };

        let mut factors = Vec::new();
        for i in 0..series.klines() {
            if window_max[i] == Some(highs[i]) {
                factors.push(swing(highs[i], ConfluenceType::Resistance, i));
            }
            if window_min[i] == Some(lows[i]) {
                factors.push(swing(lows[i], ConfluenceType::Support, i));
            }
        }
        factors
    }
}

impl FactorDetector for PriceActionDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::PriceAction
    }

    fn detect(
        &self,
        series: &OhlcvTimeSeries,
        ctx: &DetectionContext<'_>,
    ) -> Vec<ConfluenceFactor> {
        let mut factors = self.historical_levels(series, ctx.as_of);
        factors.extend(self.major_swings(series, ctx.as_of));
        factors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analysis::test_support::series_from_hl, config::CONFLUENCE};

    fn detector() -> PriceActionDetector {
        PriceActionDetector::new(CONFLUENCE.price_action)
    }

    fn ctx() -> DetectionContext<'static> {
        DetectionContext::new(DateTime::from_timestamp(0, 0).unwrap())
    }

    #[test]
    fn single_peak_is_resistance_with_touch_metadata() {
        let highs = [101.0, 102.0, 110.0, 102.0, 101.0];
        let lows = [99.0, 100.0, 100.5, 100.0, 99.5];
        let series = series_from_hl(&highs, &lows);

        let factors = detector().detect(&series, &ctx());
        let sr: Vec<_> = factors
            .iter()
            .filter(|f| f.factor_type == FactorType::HistoricalSr)
            .collect();

        assert_eq!(sr.len(), 1);
        let peak = sr[0];
        assert_eq!(peak.price.value(), 110.0);
        assert_eq!(peak.direction, ConfluenceType::Resistance);
        assert_eq!(peak.meta_i64(meta::TOUCHES), Some(1));
        assert_eq!(peak.meta_i64(meta::BAR_INDEX), Some(2));
        // 1 touch, last touch at bar 2 of 5: 1/5 * (0.5 + 0.5 * 3/5)
        assert!((peak.strength.value() - 0.16).abs() < 1e-9);
    }

    #[test]
    fn repeated_tests_raise_strength() {
        // Valley at 90, re-tested twice near the end
        let lows = [95.0, 94.0, 90.0, 94.0, 95.0, 96.0, 90.5, 96.0, 95.0, 90.2];
        let highs: Vec<f64> = lows.iter().map(|l| l + 3.0).collect();
        let series = series_from_hl(&highs, &lows);

        let factors = detector().detect(&series, &ctx());
        let valley = factors
            .iter()
            .find(|f| f.factor_type == FactorType::HistoricalSr && f.price.value() == 90.0)
            .unwrap();

        assert_eq!(valley.direction, ConfluenceType::Support);
        assert_eq!(valley.meta_i64(meta::TOUCHES), Some(3));
        assert_eq!(valley.meta_i64(meta::LAST_TOUCH_MS), Some(series.timestamps[9]));
        // 3/5 * (0.5 + 0.5 * 10/10)
        assert!((valley.strength.value() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn major_swings_need_a_full_window() {
        let mut highs: Vec<f64> = (0..25).map(|i| 100.0 + (i % 3) as f64).collect();
        highs[12] = 120.0;
        let lows: Vec<f64> = highs.iter().map(|h| h - 5.0).collect();
        let series = series_from_hl(&highs, &lows);

        let swings: Vec<_> = detector()
            .detect(&series, &ctx())
            .into_iter()
            .filter(|f| {
                f.factor_type == FactorType::SwingPoint && f.direction == ConfluenceType::Resistance
            })
            .collect();

        assert_eq!(swings.len(), 1);
        assert_eq!(swings[0].price.value(), 120.0);
        assert_eq!(swings[0].strength.value(), 0.6);
        assert_eq!(swings[0].meta_i64(meta::WINDOW), Some(10));

        let short = series_from_hl(&highs[..20], &lows[..20]);
        assert!(
            detector()
                .detect(&short, &ctx())
                .iter()
                .all(|f| f.factor_type != FactorType::SwingPoint)
        );
    }

    #[test]
    fn detection_is_idempotent() {
        let highs: Vec<f64> = (0..60).map(|i| 100.0 + ((i as f64) * 0.7).sin() * 5.0).collect();
        let lows: Vec<f64> = highs.iter().map(|h| h - 2.0).collect();
        let series = series_from_hl(&highs, &lows);

        let first = detector().detect(&series, &ctx());
        let second = detector().detect(&series, &ctx());
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn short_or_empty_series_yield_nothing() {
        assert!(detector().detect(&OhlcvTimeSeries::default(), &ctx()).is_empty());
        let series = series_from_hl(&[101.0, 102.0], &[99.0, 100.0]);
        assert!(detector().detect(&series, &ctx()).is_empty());
    }
}

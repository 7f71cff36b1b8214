use {
    crate::{
        analysis::{DetectionContext, DetectorKind, FactorDetector},
        config::{PriceLike, Strength, constants::pivot_point},
        models::{ConfluenceFactor, ConfluenceType, FactorType, OhlcvTimeSeries, meta},
    },
};

const FLOOR_TRADER: &str = "floor_trader";

/// Classic floor-trader pivots from the previous bar.
#[derive(Debug, Clone, Copy, Default)]
pub struct PivotPointDetector;

impl FactorDetector for PivotPointDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::PivotPoint
    }

    fn detect(
        &self,
        series: &OhlcvTimeSeries,
        ctx: &DetectionContext<'_>,
    ) -> Vec<ConfluenceFactor> {
        let n = series.klines();
        if n < 2 {
            return Vec::new();
        }

        let prev = series.get_candle(n - 2);
        let (high, low, close) = (
            prev.high_price.value(),
            prev.low_price.value(),
            prev.close_price.value(),
        );
        let pivot = (high + low + close) / 3.0;
        let range = high - low;

        let levels: [(&str, f64, Strength, ConfluenceType); 5] = [
            ("P", pivot, pivot_point::PIVOT, ConfluenceType::Pivot),
            ("R1", 2.0 * pivot - low, pivot_point::FIRST, ConfluenceType::Resistance),
            ("R2", pivot + range, pivot_point::SECOND, ConfluenceType::Resistance),
            ("S1", 2.0 * pivot - high, pivot_point::FIRST, ConfluenceType::Support),
            ("S2", pivot - range, pivot_point::SECOND, ConfluenceType::Support),
        ];

        levels
            .into_iter()
            // S2 can fall below zero on very wide bars
            .filter(|&(_, price, _, _)| price > 0.0)
            .map(|(name, price, strength, direction)| {
                ConfluenceFactor::new(price, FactorType::PivotPoint, strength, direction, ctx.as_of)
                    .with_meta(meta::PIVOT_TYPE, FLOOR_TRADER)
                    .with_meta(meta::LEVEL, name)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::series_from_hl;
    use chrono::DateTime;

    #[test]
    fn levels_come_from_the_previous_bar() {
        // Previous bar: H 110, L 90, C 100 -> P 100
        let series = series_from_hl(&[110.0, 130.0], &[90.0, 120.0]);
        let ctx = DetectionContext::new(DateTime::from_timestamp(0, 0).unwrap());
        let factors = PivotPointDetector.detect(&series, &ctx);

        let prices: Vec<f64> = factors.iter().map(|f| f.price.value()).collect();
        assert_eq!(prices, vec![100.0, 110.0, 120.0, 90.0, 80.0]);
        assert_eq!(factors[0].direction, ConfluenceType::Pivot);
        assert_eq!(factors[0].strength.value(), 0.8);
        assert_eq!(factors[2].direction, ConfluenceType::Resistance);
        assert_eq!(factors[4].direction, ConfluenceType::Support);
        assert_eq!(
            factors[3].metadata.get(meta::LEVEL).and_then(|v| v.as_str()),
            Some("S1")
        );
    }

    #[test]
    fn single_bar_has_no_pivots() {
        let series = series_from_hl(&[110.0], &[90.0]);
        let ctx = DetectionContext::new(DateTime::from_timestamp(0, 0).unwrap());
        assert!(PivotPointDetector.detect(&series, &ctx).is_empty());
    }
}

use {
    crate::{
        analysis::{DetectionContext, DetectorKind, FactorDetector},
        config::{PriceLike, constants::gap_level},
        models::{ConfluenceFactor, ConfluenceType, FactorType, OhlcvTimeSeries, meta},
    },
};

/// Edges of bar-to-bar price gaps.
#[derive(Debug, Clone, Copy, Default)]
pub struct GapLevelDetector;

impl FactorDetector for GapLevelDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::GapLevel
    }

    fn detect(
        &self,
        series: &OhlcvTimeSeries,
        ctx: &DetectionContext<'_>,
    ) -> Vec<ConfluenceFactor> {
        let gap = |price: f64, direction: ConfluenceType, gap_type: &str, i: usize| {
            ConfluenceFactor::new(
                price,
                FactorType::GapLevel,
                gap_level::STRENGTH,
                direction,
                ctx.as_of,
            )
            .with_meta(meta::GAP_TYPE, gap_type)
            .with_meta(meta::BAR_INDEX, i as u64)
        };

        let mut factors = Vec::new();
        for i in 1..series.klines() {
            let prev_high = series.high_prices[i - 1].value();
            let prev_low = series.low_prices[i - 1].value();

            if series.low_prices[i].value() > prev_high {
                factors.push(gap(prev_high, ConfluenceType::Support, "up", i));
            } else if series.high_prices[i].value() < prev_low {
                factors.push(gap(prev_low, ConfluenceType::Resistance, "down", i));
            }
        }
        factors
    }
}

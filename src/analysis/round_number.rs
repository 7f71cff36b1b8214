use {
    crate::{
        analysis::{DetectionContext, DetectorKind, FactorDetector},
        config::{PriceLike, constants::round_number},
        models::{ConfluenceFactor, ConfluenceType, FactorType, OhlcvTimeSeries, meta},
        utils::{get_max, get_min},
    },
};

/// Psychological levels at multiples of a magnitude-scaled step.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundNumberDetector;

impl RoundNumberDetector {
    /// Two significant digits of the price: 85_000 -> 1_000, 150_000 -> 10_000.
    pub fn step_for(price: f64) -> f64 {
        if !(price >= 1.0 && price.is_finite()) {
            return 1.0;
        }
        let digits = price.log10().floor() as i32 + 1;
        10f64.powi(digits - 2).max(1.0)
    }
}

impl FactorDetector for RoundNumberDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::RoundNumber
    }

    fn detect(
        &self,
        series: &OhlcvTimeSeries,
        ctx: &DetectionContext<'_>,
    ) -> Vec<ConfluenceFactor> {
        let Some(close) = series.last_close().map(|c| c.value()) else {
            return Vec::new();
        };

        let low = get_min(&series.lows());
        let high = get_max(&series.highs());
        if !(high >= low && low.is_finite() && high.is_finite()) {
            return Vec::new();
        }

        let mut step = Self::step_for(close);
        let mut first = (low / step).ceil() as i64;
        let mut last = (high / step).floor() as i64;
        while last - first + 1 > round_number::MAX_LEVELS as i64 {
            step *= 10.0;
            first = (low / step).ceil() as i64;
            last = (high / step).floor() as i64;
        }

        (first.max(1)..=last)
            .map(|k| {
                let price = k as f64 * step;
                let strength = if k % 10 == 0 {
                    round_number::MAJOR
                } else if k % 5 == 0 {
                    round_number::HALF
                } else {
                    round_number::MINOR
                };
                ConfluenceFactor::new(
                    price,
                    FactorType::RoundNumber,
                    strength,
                    ConfluenceType::relative_to(price, close),
                    ctx.as_of,
                )
                .with_meta(meta::INTERVAL, step)
            })
            .collect()
    }
}

use {
    crate::{
        analysis::{DetectionContext, DetectorKind, FactorDetector},
        config::{FibonacciSettings, PriceLike},
        models::{ConfluenceFactor, ConfluenceType, FactorType, OhlcvTimeSeries, meta},
        utils::{get_max, get_min},
    },
};

/// Retracement levels of the most recent swing range.
#[derive(Debug, Clone, Copy)]
pub struct FibonacciDetector {
    settings: FibonacciSettings,
}

impl FibonacciDetector {
    pub fn new(settings: FibonacciSettings) -> Self {
        Self { settings }
    }
}

impl FactorDetector for FibonacciDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Fibonacci
    }

    fn detect(
        &self,
        series: &OhlcvTimeSeries,
        ctx: &DetectionContext<'_>,
    ) -> Vec<ConfluenceFactor> {
        let Some(last_close) = series.last_close() else {
            return Vec::new();
        };

        let start = series.tail_start(self.settings.lookback_bars);
        let swing_high = get_max(&series.highs()[start..]);
        let swing_low = get_min(&series.lows()[start..]);
        let span = swing_high - swing_low;

        self.settings
            .levels
            .iter()
            .map(|level| {
                // Retracement measured down from the high
                let price = swing_low + span * (1.0 - level.ratio);
                ConfluenceFactor::new(
                    price,
                    FactorType::Fibonacci,
                    level.strength,
                    ConfluenceType::relative_to(price, last_close.value()),
                    ctx.as_of,
                )
                .with_meta(meta::FIB_LEVEL, level.ratio)
                .with_meta(meta::SWING_HIGH, swing_high)
                .with_meta(meta::SWING_LOW, swing_low)
            })
            .collect()
    }
}

use {
    crate::{
        analysis::{DetectionContext, DetectorKind, FactorDetector},
        config::{MovingAverageSettings, PriceLike, Strength, constants::moving_average},
        models::{ConfluenceFactor, ConfluenceType, FactorType, OhlcvTimeSeries, meta},
        utils::trailing_mean,
    },
};

/// Simple moving averages of the close, evaluated at the last bar.
#[derive(Debug, Clone, Copy)]
pub struct MovingAverageDetector {
    settings: MovingAverageSettings,
}

impl MovingAverageDetector {
    pub fn new(settings: MovingAverageSettings) -> Self {
        Self { settings }
    }

    fn period_boost(period: usize) -> f64 {
        if period >= 200 {
            moving_average::LONG_PERIOD_BOOST
        } else if period >= 100 {
            moving_average::MEDIUM_PERIOD_BOOST
        } else {
            1.0
        }
    }
}

impl FactorDetector for MovingAverageDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::MovingAverage
    }

    fn detect(
        &self,
        series: &OhlcvTimeSeries,
        ctx: &DetectionContext<'_>,
    ) -> Vec<ConfluenceFactor> {
        let Some(close) = series.last_close().map(|c| c.value()) else {
            return Vec::new();
        };
        let closes = series.closes();

        self.settings
            .periods
            .iter()
            .filter_map(|&period| {
                let ma = trailing_mean(&closes, period)?;
                if ma <= 0.0 {
                    return None;
                }

                let distance = (close - ma).abs() / ma;
                let base = (1.0 - self.settings.distance_decay * distance)
                    .max(self.settings.strength_floor.value());
                let direction = if ma < close {
                    ConfluenceType::Support
                } else {
                    ConfluenceType::Resistance
                };

                Some(
                    ConfluenceFactor::new(
                        ma,
                        FactorType::MovingAverage,
                        Strength::new(base * Self::period_boost(period)),
                        direction,
                        ctx.as_of,
                    )
                    .with_meta(meta::PERIOD, period as u64)
                    .with_meta(meta::DISTANCE_PCT, distance * 100.0),
                )
            })
            .collect()
    }
}

use {
    crate::{
        analysis::{ContextRequirement, DetectionContext, DetectorKind, FactorDetector},
        config::{EtfFlowSettings, PriceLike, Strength},
        models::{ConfluenceFactor, ConfluenceType, FactorType, OhlcvTimeSeries, meta},
        utils::TimeUtils,
    },
    statrs::statistics::Statistics,
};

/// Days with anomalous institutional net flow, priced at that day's bars.
#[derive(Debug, Clone, Copy)]
pub struct EtfFlowDetector {
    settings: EtfFlowSettings,
}

impl EtfFlowDetector {
    pub fn new(settings: EtfFlowSettings) -> Self {
        Self { settings }
    }
}

impl FactorDetector for EtfFlowDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::EtfFlow
    }

    fn requirement(&self) -> ContextRequirement {
        ContextRequirement::Flows
    }

    fn detect(
        &self,
        series: &OhlcvTimeSeries,
        ctx: &DetectionContext<'_>,
    ) -> Vec<ConfluenceFactor> {
        let Some(flows) = ctx.flows else {
            return Vec::new();
        };

        let daily = flows.daily_totals();
        if daily.len() < self.settings.min_days.max(2) {
            return Vec::new();
        }

        let totals: Vec<f64> = daily.values().copied().collect();
        let mean = totals.iter().mean();
        let std_dev = totals.iter().std_dev();
        if !std_dev.is_finite() || std_dev <= f64::EPSILON {
            return Vec::new();
        }

        let mut factors = Vec::new();
        for (date, flow) in daily {
            let z_score = (flow - mean) / std_dev;
            if z_score.abs() <= self.settings.z_threshold {
                continue;
            }

            let bars = series.indices_on_date(date);
            if bars.is_empty() {
                log::debug!("ETF flow spike on {} has no price bars, dropped", date);
                continue;
            }

            let count = bars.len() as f64;
            let high_sum: f64 = bars.iter().map(|&i| series.high_prices[i].value()).sum();
            let low_sum: f64 = bars.iter().map(|&i| series.low_prices[i].value()).sum();
            let (mean_high, mean_low) = (high_sum / count, low_sum / count);
            let direction = if flow > 0.0 {
                ConfluenceType::Support
            } else {
                ConfluenceType::Resistance
            };

            factors.push(
                ConfluenceFactor::new(
                    (mean_high + mean_low) / 2.0,
                    FactorType::EtfFlowPivot,
                    Strength::new(z_score.abs() / self.settings.z_for_full_strength),
                    direction,
                    ctx.as_of,
                )
                .with_meta(meta::FLOW_MAGNITUDE, flow)
                .with_meta(meta::Z_SCORE, z_score)
                .with_meta(
                    meta::DATE,
                    date.format(TimeUtils::STANDARD_TIME_FORMAT).to_string(),
                ),
            );
        }

        factors
    }
}

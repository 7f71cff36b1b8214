use {
    crate::{
        analysis::{ContextRequirement, DetectionContext, DetectorKind, FactorDetector},
        config::{OpenInterestSettings, PriceLike, Strength},
        models::{ConfluenceFactor, ConfluenceType, FactorType, OhlcvTimeSeries, meta},
        utils::get_max,
    },
    statrs::statistics::Statistics,
};

/// Price levels carrying outsized open interest.
#[derive(Debug, Clone, Copy)]
pub struct OpenInterestDetector {
    settings: OpenInterestSettings,
}

impl OpenInterestDetector {
    pub fn new(settings: OpenInterestSettings) -> Self {
        Self { settings }
    }
}

impl FactorDetector for OpenInterestDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::OpenInterest
    }

    fn requirement(&self) -> ContextRequirement {
        ContextRequirement::OpenInterest
    }

    fn detect(
        &self,
        series: &OhlcvTimeSeries,
        ctx: &DetectionContext<'_>,
    ) -> Vec<ConfluenceFactor> {
        let Some(raw) = ctx.open_interest else {
            return Vec::new();
        };

        let oi = if raw.len() > self.settings.coarsen_above_rows {
            raw.coarsened(self.settings.bucket_width)
        } else {
            raw.clone()
        };

        let values = oi.open_interest_values();
        if values.len() < 2 {
            return Vec::new();
        }

        let mean = values.iter().mean();
        let std_dev = values.iter().std_dev();
        if !std_dev.is_finite() || std_dev <= f64::EPSILON {
            return Vec::new();
        }

        let threshold = mean + self.settings.sigma * std_dev;
        let max_oi = get_max(&values);
        if max_oi <= 0.0 {
            return Vec::new();
        }

        let reference = ctx.reference_price(series);
        let magnet_pct = self.settings.magnet_pct.value();

        oi.levels
            .iter()
            .filter(|level| level.open_interest >= threshold && level.price.is_valid_level())
            .map(|level| {
                let direction = match reference {
                    Some(r) if level.price.percent_diff_from_0_1(&r) <= magnet_pct => {
                        ConfluenceType::Magnet
                    }
                    Some(r) => ConfluenceType::relative_to(level.price.value(), r.value()),
                    None => ConfluenceType::Pivot,
                };
                ConfluenceFactor::new(
                    level.price.value(),
                    FactorType::OpenInterest,
                    Strength::new(level.open_interest / max_oi),
                    direction,
                    ctx.as_of,
                )
                .with_meta(meta::OPEN_INTEREST, level.open_interest)
            })
            .collect()
    }
}

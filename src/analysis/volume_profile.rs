use {
    crate::{
        analysis::{DetectionContext, DetectorKind, FactorDetector},
        config::{HighPrice, LowPrice, Strength, VolumeProfileSettings},
        models::{
            ConfluenceFactor, ConfluenceType, FactorType, OhlcvTimeSeries, VolumeProfile, meta,
        },
        utils::{get_max, get_min, mean_and_stddev, normalize_max},
    },
    find_peaks::PeakFinder,
};

/// High-volume nodes of the traded-volume histogram.
#[derive(Debug, Clone, Copy)]
pub struct VolumeProfileDetector {
    settings: VolumeProfileSettings,
}

impl VolumeProfileDetector {
    pub fn new(settings: VolumeProfileSettings) -> Self {
        Self { settings }
    }

    /// None when the range or the traded volume is degenerate.
    pub fn build_profile(&self, series: &OhlcvTimeSeries) -> Option<VolumeProfile> {
        if series.is_empty() || series.total_volume() <= 0.0 {
            return None;
        }

        let min = get_min(&series.lows());
        let max = get_max(&series.highs());
        if !(min > 0.0 && max > min) {
            return None;
        }

        let target_width = min * self.settings.bin_width_pct.value();
        let wanted = if target_width > 0.0 {
            ((max - min) / target_width).floor() as usize
        } else {
            0
        };
        let ceiling = self.settings.max_bins.max(self.settings.min_bins);
        let bin_count = wanted.clamp(self.settings.min_bins, ceiling);
        if wanted > ceiling {
            log::debug!(
                "Volume profile [{}]: {} bins capped at {}",
                series.symbol,
                wanted,
                ceiling
            );
        }

        let mut profile = VolumeProfile::new(LowPrice::new(min), HighPrice::new(max), bin_count);
        for i in 0..series.klines() {
            profile.apply_full_volume(
                series.low_prices[i],
                series.high_prices[i],
                series.volumes[i].value(),
            );
        }
        Some(profile)
    }
}

impl FactorDetector for VolumeProfileDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::VolumeProfile
    }

    fn detect(
        &self,
        series: &OhlcvTimeSeries,
        ctx: &DetectionContext<'_>,
    ) -> Vec<ConfluenceFactor> {
        let Some(profile) = self.build_profile(series) else {
            return Vec::new();
        };

        let hist = &profile.bin_volumes;
        log::debug!(
            "Volume profile [{}]: {} bins over {} bars",
            series.symbol,
            profile.bin_count(),
            profile.total_bars
        );
        let (_, std_dev) = mean_and_stddev(hist);
        if std_dev <= f64::EPSILON {
            return Vec::new();
        }
        let relative = normalize_max(hist);

        let mut finder = PeakFinder::new(hist);
        finder.with_min_prominence(std_dev);
        let mut peaks = finder.find_peaks();
        peaks.sort_by_key(|p| p.middle_position());

        let last_bin = hist.len() - 1;
        peaks
            .iter()
            .map(|p| (p.middle_position(), p.prominence.unwrap_or(0.0)))
            // Interior maxima only
            .filter(|&(idx, _)| idx > 0 && idx < last_bin)
            .map(|(idx, prominence)| {
                let volume = hist[idx];
                ConfluenceFactor::new(
                    profile.bin_midpoint(idx),
                    FactorType::VolumeProfile,
                    Strength::new(relative[idx]),
                    ConfluenceType::Pivot,
                    ctx.as_of,
                )
                .with_meta(meta::VOLUME, volume)
                .with_meta(meta::PROMINENCE, prominence)
                .with_meta(meta::BIN_INDEX, idx as u64)
            })
            .collect()
    }
}

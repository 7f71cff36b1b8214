//! Detection and aggregation configuration

use crate::analysis::DetectorKind;
use crate::config::constants::{
    etf_flow, fibonacci, moving_average, open_interest, price_action, volume_profile, zones,
};
use crate::config::{Pct, Strength};

/// Historical support/resistance and major swing settings
#[derive(Clone, Debug, Copy)]
pub struct PriceActionSettings {
    /// A bar "touches" a level when its high or low is within this fraction of it.
    pub touch_tolerance: Pct,
    pub touches_for_full_strength: f64,
    /// Bars that must be strictly lower (higher) on each side of a swing high (low).
    pub swing_neighbours: usize,
    /// Half-width of the centered major swing window (10 -> 21 bars).
    pub major_swing_half_window: usize,
    pub major_swing_strength: Strength,
}

#[derive(Clone, Debug, Copy)]
pub struct VolumeProfileSettings {
    /// Target bin width as a fraction of the lowest price.
    pub bin_width_pct: Pct,
    pub min_bins: usize,
    /// Ceiling on the bin count; wide ranges get coarser bins.
    pub max_bins: usize,
}

#[derive(Clone, Debug, Copy, PartialEq)]
pub struct FibLevel {
    pub ratio: f64,
    pub strength: Strength,
}

#[derive(Clone, Debug, Copy)]
pub struct FibonacciSettings {
    pub lookback_bars: usize,
    pub levels: &'static [FibLevel],
}

#[derive(Clone, Debug, Copy)]
pub struct EtfFlowSettings {
    pub z_threshold: f64,
    pub z_for_full_strength: f64,
    pub min_days: usize,
}

#[derive(Clone, Debug, Copy)]
pub struct OpenInterestSettings {
    /// Series longer than this get re-binned before thresholding.
    pub coarsen_above_rows: usize,
    pub bucket_width: f64,
    pub sigma: f64,
    pub magnet_pct: Pct,
}

#[derive(Clone, Debug, Copy)]
pub struct MovingAverageSettings {
    pub periods: &'static [usize],
    pub strength_floor: Strength,
    pub distance_decay: f64,
}

/// Score thresholds for the zone strength labels.
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct StrengthBands {
    pub moderate: f64,
    pub strong: f64,
    pub critical: f64,
}

#[derive(Clone, Debug, Copy)]
pub struct ZoneSettings {
    /// Max relative distance between a factor and the running cluster mean.
    pub tolerance_pct: Pct,
    pub diversity_weight: f64,
    pub breach_decay: f64,
    pub breach_diversity_damping: f64,
    pub bands: StrengthBands,
    pub min_factors_per_zone: usize,
    pub min_score: f64,
}

/// The Master Confluence Configuration
#[derive(Clone, Debug)]
pub struct ConfluenceConfig {
    pub detectors: &'static [DetectorKind],
    /// Evaluate detectors on the rayon pool. Output is identical either way.
    pub parallel: bool,

    // Sub-groups
    pub price_action: PriceActionSettings,
    pub volume_profile: VolumeProfileSettings,
    pub fibonacci: FibonacciSettings,
    pub etf_flow: EtfFlowSettings,
    pub open_interest: OpenInterestSettings,
    pub moving_average: MovingAverageSettings,
    pub zones: ZoneSettings,
}

pub const CONFLUENCE: ConfluenceConfig = ConfluenceConfig {
    detectors: DetectorKind::ALL,
    parallel: false,

    price_action: PriceActionSettings {
        touch_tolerance: price_action::TOUCH_TOLERANCE,
        touches_for_full_strength: price_action::TOUCHES_FOR_FULL_STRENGTH,
        swing_neighbours: price_action::SWING_NEIGHBOURS,
        major_swing_half_window: price_action::MAJOR_SWING_HALF_WINDOW,
        major_swing_strength: price_action::MAJOR_SWING_STRENGTH,
    },

    volume_profile: VolumeProfileSettings {
        bin_width_pct: volume_profile::BIN_WIDTH_PCT,
        min_bins: volume_profile::MIN_BINS,
        max_bins: volume_profile::MAX_BINS,
    },

    fibonacci: FibonacciSettings {
        lookback_bars: fibonacci::LOOKBACK_BARS,
        levels: fibonacci::LEVELS,
    },

    etf_flow: EtfFlowSettings {
        z_threshold: etf_flow::Z_THRESHOLD,
        z_for_full_strength: etf_flow::Z_FOR_FULL_STRENGTH,
        min_days: etf_flow::MIN_DAYS,
    },

    // Bucket width is a placeholder re-binning: nearest 10 price units
    open_interest: OpenInterestSettings {
        coarsen_above_rows: open_interest::COARSEN_ABOVE_ROWS,
        bucket_width: open_interest::BUCKET_WIDTH,
        sigma: open_interest::SIGMA,
        magnet_pct: open_interest::MAGNET_PCT,
    },

    moving_average: MovingAverageSettings {
        periods: moving_average::PERIODS,
        strength_floor: moving_average::STRENGTH_FLOOR,
        distance_decay: moving_average::DISTANCE_DECAY,
    },

    zones: ZoneSettings {
        tolerance_pct: zones::TOLERANCE_PCT,
        diversity_weight: zones::DIVERSITY_WEIGHT,
        breach_decay: zones::BREACH_DECAY,
        breach_diversity_damping: zones::BREACH_DIVERSITY_DAMPING,
        bands: zones::BANDS,
        min_factors_per_zone: zones::MIN_FACTORS_PER_ZONE,
        min_score: zones::MIN_SCORE,
    },
};

pub mod price_action {
    use crate::config::{Pct, Strength};
    pub const TOUCH_TOLERANCE: Pct = Pct::new(0.01);
    pub const TOUCHES_FOR_FULL_STRENGTH: f64 = 5.0;
    pub const SWING_NEIGHBOURS: usize = 2;
    pub const MAJOR_SWING_HALF_WINDOW: usize = 10;
    pub const MAJOR_SWING_STRENGTH: Strength = Strength::new(0.6);
}

pub mod volume_profile {
    use crate::config::Pct;
    pub const BIN_WIDTH_PCT: Pct = Pct::new(0.005);
    pub const MIN_BINS: usize = 10;
    pub const MAX_BINS: usize = 10_000;
}

pub mod fibonacci {
    use crate::config::{FibLevel, Strength};
    pub const LOOKBACK_BARS: usize = 60;
    pub const LEVELS: &[FibLevel] = &[
        FibLevel {
            ratio: 0.0,
            strength: Strength::new(0.5),
        },
        FibLevel {
            ratio: 0.236,
            strength: Strength::new(0.5),
        },
        FibLevel {
            ratio: 0.382,
            strength: Strength::new(0.7),
        },
        FibLevel {
            ratio: 0.5,
            strength: Strength::new(0.9),
        },
        FibLevel {
            ratio: 0.618,
            strength: Strength::new(0.9),
        },
        FibLevel {
            ratio: 0.786,
            strength: Strength::new(0.7),
        },
        FibLevel {
            ratio: 1.0,
            strength: Strength::new(0.5),
        },
    ];
}

pub mod etf_flow {
    pub const Z_THRESHOLD: f64 = 2.0;
    // Max |z| in a 10-sample window is ~sqrt(N-1) = 3
    pub const Z_FOR_FULL_STRENGTH: f64 = 3.0;
    pub const MIN_DAYS: usize = 2;
    pub const FLOW_COLUMN_ALIASES: &[&str] = &["flow_usd", "Net_Flow", "net_flow", "flow"];
}

pub mod open_interest {
    use crate::config::Pct;
    pub const COARSEN_ABOVE_ROWS: usize = 200;
    pub const BUCKET_WIDTH: f64 = 10.0;
    pub const SIGMA: f64 = 2.0;
    pub const MAGNET_PCT: Pct = Pct::new(0.01);
}

pub mod moving_average {
    use crate::config::Strength;
    pub const PERIODS: &[usize] = &[20, 50, 100, 200];
    pub const STRENGTH_FLOOR: Strength = Strength::new(0.3);
    pub const DISTANCE_DECAY: f64 = 2.0;
    pub const LONG_PERIOD_BOOST: f64 = 1.2;
    pub const MEDIUM_PERIOD_BOOST: f64 = 1.1;
}

pub mod round_number {
    use crate::config::Strength;
    pub const MAJOR: Strength = Strength::new(0.8);
    pub const HALF: Strength = Strength::new(0.6);
    pub const MINOR: Strength = Strength::new(0.4);
    // Step is widened tenfold until the range holds at most this many levels
    pub const MAX_LEVELS: usize = 100;
}

pub mod pivot_point {
    use crate::config::Strength;
    pub const PIVOT: Strength = Strength::new(0.8);
    pub const FIRST: Strength = Strength::new(0.6);
    pub const SECOND: Strength = Strength::new(0.5);
}

pub mod gap_level {
    use crate::config::Strength;
    pub const STRENGTH: Strength = Strength::new(0.7);
}

pub mod zones {
    use crate::config::{Pct, StrengthBands};
    pub const TOLERANCE_PCT: Pct = Pct::new(0.0075);
    pub const DIVERSITY_WEIGHT: f64 = 1.0;
    pub const BREACH_DECAY: f64 = 0.5;
    pub const BREACH_DIVERSITY_DAMPING: f64 = 0.5;
    pub const MIN_FACTORS_PER_ZONE: usize = 1;
    pub const MIN_SCORE: f64 = 0.0;

    pub const BANDS: StrengthBands = StrengthBands {
        moderate: 1.0,
        strong: 2.0,
        critical: 3.5,
    };
}

//! Configuration module for the confluence engine.

mod analysis;
mod debug;
mod types;

// Public
pub mod constants;

// Re-export commonly used items
pub use analysis::{
    CONFLUENCE,
    ConfluenceConfig,
    EtfFlowSettings,
    FibLevel,
    FibonacciSettings,
    MovingAverageSettings,
    OpenInterestSettings,
    PriceActionSettings,
    StrengthBands,
    VolumeProfileSettings,
    ZoneSettings,
};
pub use debug::{DF, LOG_PERFORMANCE};
pub use types::{
    BaseVol, ClosePrice, HighPrice, LowPrice, OpenPrice, Pct, Price, PriceLike, PriceRange, Prob,
    Strength,
};

mod factor;
mod ohlcv;
mod volume_profile;
mod zone;

pub use {
    factor::{ConfluenceFactor, ConfluenceType, FactorMetadata, FactorType, meta},
    ohlcv::OhlcvTimeSeries,
    volume_profile::VolumeProfile,
    zone::{ConfluenceZone, FactorRecord, ZoneRecord, ZoneStrength},
};

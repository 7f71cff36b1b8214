use crate::config::{BaseVol, ClosePrice, HighPrice, LowPrice, OpenPrice, PriceLike};

/// One OHLCV bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub timestamp_ms: i64,

    pub open_price: OpenPrice,
    pub high_price: HighPrice,
    pub low_price: LowPrice,
    pub close_price: ClosePrice,

    pub volume: BaseVol,
}

impl Candle {
    // A constructor for convenience
    pub fn new(timestamp_ms: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Candle {
            timestamp_ms,
            open_price: OpenPrice::new(open),
            high_price: HighPrice::new(high),
            low_price: LowPrice::new(low),
            close_price: ClosePrice::new(close),
            volume: BaseVol::new(volume),
        }
    }

    /// Finite prices with low <= high.
    pub fn is_well_formed(&self) -> bool {
        let prices = [
            self.open_price.value(),
            self.high_price.value(),
            self.low_price.value(),
            self.close_price.value(),
        ];
        prices.iter().all(|p| p.is_finite()) && self.low_price.value() <= self.high_price.value()
    }
}

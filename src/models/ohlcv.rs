use {
    crate::{
        config::{BaseVol, ClosePrice, HighPrice, LowPrice, OpenPrice, PriceLike},
        domain::Candle,
        utils::epoch_ms_to_date,
    },
    chrono::NaiveDate,
    serde::{Deserialize, Serialize},
};

/// Column-oriented bar series, oldest first.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct OhlcvTimeSeries {
    pub symbol: String,
    pub timestamps: Vec<i64>,
    pub open_prices: Vec<OpenPrice>,
    pub high_prices: Vec<HighPrice>,
    pub low_prices: Vec<LowPrice>,
    pub close_prices: Vec<ClosePrice>,
    pub volumes: Vec<BaseVol>,
}

impl OhlcvTimeSeries {
    /// Malformed bars (non-finite prices, low above high) are skipped.
    pub fn from_candles(symbol: impl Into<String>, candles: Vec<Candle>) -> Self {
        let len = candles.len();

        let mut ts_vec = Vec::with_capacity(len);
        let mut open_vec = Vec::with_capacity(len);
        let mut high_vec = Vec::with_capacity(len);
        let mut low_vec = Vec::with_capacity(len);
        let mut close_vec = Vec::with_capacity(len);
        let mut vol_vec = Vec::with_capacity(len);

        let mut skipped = 0usize;
        for c in candles {
            if !c.is_well_formed() {
                skipped += 1;
                continue;
            }
            ts_vec.push(c.timestamp_ms);
            open_vec.push(c.open_price);
            high_vec.push(c.high_price);
            low_vec.push(c.low_price);
            close_vec.push(c.close_price);
            vol_vec.push(c.volume);
        }

        if skipped > 0 {
            log::warn!("Skipped {} malformed bars out of {}", skipped, len);
        }

        Self {
            symbol: symbol.into(),
            timestamps: ts_vec,
            open_prices: open_vec,
            high_prices: high_vec,
            low_prices: low_vec,
            close_prices: close_vec,
            volumes: vol_vec,
        }
    }

    pub fn get_candle(&self, idx: usize) -> Candle {
        Candle {
            timestamp_ms: self.timestamps[idx],
            open_price: self.open_prices[idx],
            high_price: self.high_prices[idx],
            low_price: self.low_prices[idx],
            close_price: self.close_prices[idx],
            volume: self.volumes[idx],
        }
    }

    pub fn klines(&self) -> usize {
        self.close_prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close_prices.is_empty()
    }

    pub fn last_close(&self) -> Option<ClosePrice> {
        self.close_prices.last().copied()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.high_prices.iter().map(|p| p.value()).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.low_prices.iter().map(|p| p.value()).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.close_prices.iter().map(|p| p.value()).collect()
    }

    pub fn total_volume(&self) -> f64 {
        self.volumes.iter().map(|v| v.value()).sum()
    }

    pub fn date_at(&self, idx: usize) -> Option<NaiveDate> {
        self.timestamps.get(idx).copied().and_then(epoch_ms_to_date)
    }

    /// Indices of the bars whose UTC calendar date is `date`.
    pub fn indices_on_date(&self, date: NaiveDate) -> Vec<usize> {
        (0..self.klines())
            .filter(|&i| self.date_at(i) == Some(date))
            .collect()
    }

    /// Start index of the trailing window of at most `n` bars.
    pub fn tail_start(&self, n: usize) -> usize {
        self.klines().saturating_sub(n)
    }
}

use {
    crate::config::{HighPrice, LowPrice, Price, PriceLike, PriceRange},
    serde::{Deserialize, Serialize},
};

/// Traded-volume histogram over equal-width price bins.
#[derive(Default, Debug, Clone, Deserialize, Serialize)]
pub struct VolumeProfile {
    pub bin_volumes: Vec<f64>,
    pub price_range: PriceRange<Price>,
    pub total_bars: usize,
}

impl VolumeProfile {
    pub fn new(min_price: LowPrice, max_price: HighPrice, bin_count: usize) -> Self {
        let price_range: PriceRange<Price> =
            PriceRange::new(min_price.into(), max_price.into(), bin_count);
        let n_slices = price_range.n_chunks;

        VolumeProfile {
            bin_volumes: vec![0.0; n_slices],
            price_range,
            total_bars: 0,
        }
    }

    pub fn bin_count(&self) -> usize {
        self.bin_volumes.len()
    }

    /// Adds the bar's full volume to every bin its [low, high] touches.
    /// Volume is not split across bins.
    pub fn apply_full_volume(&mut self, low: LowPrice, high: HighPrice, volume: f64) {
        self.total_bars += 1;
        if self.bin_volumes.is_empty() || volume <= 0.0 {
            return;
        }

        let num_chunks = self
            .price_range
            .count_intersecting_chunks(low.value(), high.value());

        if num_chunks == 0 {
            return;
        }

        let start_chunk = self.price_range.chunk_index(low.value());

        self.bin_volumes
            .iter_mut()
            .skip(start_chunk)
            .take(num_chunks)
            .for_each(|v| *v += volume);
    }

    pub fn bin_midpoint(&self, idx: usize) -> f64 {
        self.price_range.chunk_midpoint(idx)
    }
}

use {
    crate::config::{Price, PriceLike},
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
    std::collections::BTreeMap,
};

const PRICE_COLUMN: &str = "price";
const OI_COLUMN: &str = "open_interest";

/// Open interest resting at one price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OiLevel {
    pub price: Price,
    pub open_interest: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenInterestSeries {
    pub levels: Vec<OiLevel>,
}

impl OpenInterestSeries {
    pub fn new(levels: Vec<OiLevel>) -> Self {
        Self { levels }
    }

    /// Builds the series from loosely-typed rows. Rows without a numeric
    /// `price` and `open_interest` are dropped with a warning.
    pub fn from_rows(rows: &[Map<String, Value>]) -> Self {
        let levels: Vec<OiLevel> = rows
            .iter()
            .filter_map(|row| {
                let price = row.get(PRICE_COLUMN).and_then(Value::as_f64)?;
                let open_interest = row.get(OI_COLUMN).and_then(Value::as_f64)?;
                (price.is_finite() && open_interest.is_finite()).then(|| OiLevel {
                    price: Price::new(price),
                    open_interest,
                })
            })
            .collect();

        if levels.len() < rows.len() {
            log::warn!(
                "OI data: dropped {} of {} rows missing '{}' or '{}'",
                rows.len() - levels.len(),
                rows.len(),
                PRICE_COLUMN,
                OI_COLUMN
            );
        }

        Self { levels }
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Re-bins by rounding each price to the nearest multiple of `bucket_width`
    /// and summing OI per bucket. Output is ordered by price.
    pub fn coarsened(&self, bucket_width: f64) -> Self {
        if bucket_width <= 0.0 || !bucket_width.is_finite() {
            return self.clone();
        }

        let mut buckets: BTreeMap<i64, f64> = BTreeMap::new();
        for level in &self.levels {
            let bucket = (level.price.value() / bucket_width).round() as i64;
            *buckets.entry(bucket).or_insert(0.0) += level.open_interest;
        }

        Self {
            levels: buckets
                .into_iter()
                .map(|(bucket, open_interest)| OiLevel {
                    price: Price::new(bucket as f64 * bucket_width),
                    open_interest,
                })
                .collect(),
        }
    }

    pub fn open_interest_values(&self) -> Vec<f64> {
        self.levels.iter().map(|l| l.open_interest).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rows_without_required_columns_are_dropped() {
        let rows: Vec<Map<String, Value>> = vec![
            json!({"wrong_col": 1}).as_object().unwrap().clone(),
            json!({"price": 100.0, "open_interest": 5.0}).as_object().unwrap().clone(),
        ];
        let series = OpenInterestSeries::from_rows(&rows);
        assert_eq!(series.len(), 1);
        assert_eq!(series.levels[0].price.value(), 100.0);
    }

    #[test]
    fn coarsening_sums_into_nearest_bucket() {
        let series = OpenInterestSeries::new(vec![
            OiLevel {
                price: Price::new(101.0),
                open_interest: 1.0,
            },
            OiLevel {
                price: Price::new(104.0),
                open_interest: 2.0,
            },
            OiLevel {
                price: Price::new(106.0),
                open_interest: 4.0,
            },
        ]);
        let coarse = series.coarsened(10.0);
        assert_eq!(coarse.len(), 2);
        assert_eq!(coarse.levels[0].price.value(), 100.0);
        assert_eq!(coarse.levels[0].open_interest, 3.0);
        assert_eq!(coarse.levels[1].price.value(), 110.0);
        assert_eq!(coarse.levels[1].open_interest, 4.0);
    }
}

use {
    crate::{
        config::{Price, PriceLike, Prob, StrengthBands},
        models::{ConfluenceFactor, ConfluenceType, FactorMetadata, FactorType},
        utils::round_dp,
    },
    chrono::{DateTime, SecondsFormat, Utc},
    serde::{Deserialize, Serialize},
    std::{collections::BTreeSet, fmt},
    strum::EnumCount,
    strum_macros::Display,
};

/// Categorical label derived from the confluence score.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ZoneStrength {
    Weak,
    Moderate,
    Strong,
    Critical,
}

impl ZoneStrength {
    pub fn from_score(score: f64, bands: &StrengthBands) -> Self {
        if score < bands.moderate {
            ZoneStrength::Weak
        } else if score < bands.strong {
            ZoneStrength::Moderate
        } else if score < bands.critical {
            ZoneStrength::Strong
        } else {
            ZoneStrength::Critical
        }
    }
}

/// Cluster of confluence factors judged to be one market level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfluenceZone {
    pub price_level: Price,
    pub confluence_score: f64,
    /// Members ordered by price ascending
    pub factors: Vec<ConfluenceFactor>,
    pub zone_type: ConfluenceType,
    pub strength: ZoneStrength,
    pub price_range: (Price, Price),
    /// Signed % distance from the reference price
    pub distance_to_current: f64,
    pub historical_tests: u32,
    pub last_test_date: Option<DateTime<Utc>>,
    pub breach_probability: Prob,
}

impl ConfluenceZone {
    pub fn factor_count(&self) -> usize {
        self.factors.len()
    }

    pub fn distinct_factor_types(&self) -> usize {
        self.factors
            .iter()
            .map(|f| f.factor_type)
            .collect::<BTreeSet<FactorType>>()
            .len()
    }

    /// Distinct factor types over all known factor types (0..=1).
    pub fn factor_diversity(&self) -> f64 {
        self.distinct_factor_types() as f64 / FactorType::COUNT as f64
    }

    /// Flat, rounded record for downstream consumers.
    pub fn to_record(&self) -> ZoneRecord {
        ZoneRecord {
            price_level: round_dp(self.price_level.value(), 2),
            confluence_score: round_dp(self.confluence_score, 3),
            factor_count: self.factor_count(),
            factor_diversity: round_dp(self.factor_diversity(), 3),
            zone_type: self.zone_type,
            strength: self.strength,
            price_range: [
                round_dp(self.price_range.0.value(), 2),
                round_dp(self.price_range.1.value(), 2),
            ],
            distance_to_current_pct: round_dp(self.distance_to_current, 2),
            factors: self.factors.iter().map(FactorRecord::from).collect(),
            historical_tests: self.historical_tests,
            last_test_date: self
                .last_test_date
                .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true)),
            breach_probability: round_dp(self.breach_probability.value(), 3),
        }
    }
}

impl fmt::Display for ConfluenceZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} @ {} (score {:.3}, {} factors, {:+.2}%)",
            self.strength,
            self.zone_type,
            self.price_level,
            self.confluence_score,
            self.factor_count(),
            self.distance_to_current
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorRecord {
    #[serde(rename = "type")]
    pub factor_type: FactorType,
    pub price: f64,
    pub strength: f64,
    pub direction: ConfluenceType,
    pub metadata: FactorMetadata,
}

impl From<&ConfluenceFactor> for FactorRecord {
    fn from(f: &ConfluenceFactor) -> Self {
        Self {
            factor_type: f.factor_type,
            price: round_dp(f.price.value(), 2),
            strength: round_dp(f.strength.value(), 3),
            direction: f.direction,
            metadata: f.metadata.clone(),
        }
    }
}

/// JSON-ready view of a zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneRecord {
    pub price_level: f64,
    pub confluence_score: f64,
    pub factor_count: usize,
    pub factor_diversity: f64,
    pub zone_type: ConfluenceType,
    pub strength: ZoneStrength,
    pub price_range: [f64; 2],
    pub distance_to_current_pct: f64,
    pub factors: Vec<FactorRecord>,
    pub historical_tests: u32,
    pub last_test_date: Option<String>,
    pub breach_probability: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CONFLUENCE, Strength};

    fn factor(price: f64, factor_type: FactorType) -> ConfluenceFactor {
        ConfluenceFactor::new(
            price,
            factor_type,
            Strength::new(0.5),
            ConfluenceType::Support,
            DateTime::from_timestamp(0, 0).unwrap(),
        )
    }

    #[test]
    fn score_bands_map_to_labels() {
        let bands = CONFLUENCE.zones.bands;
        assert_eq!(ZoneStrength::from_score(0.0, &bands), ZoneStrength::Weak);
        assert_eq!(ZoneStrength::from_score(0.99, &bands), ZoneStrength::Weak);
        assert_eq!(ZoneStrength::from_score(1.0, &bands), ZoneStrength::Moderate);
        assert_eq!(ZoneStrength::from_score(2.5, &bands), ZoneStrength::Strong);
        assert_eq!(ZoneStrength::from_score(3.5, &bands), ZoneStrength::Critical);
    }

    #[test]
    fn record_is_rounded_and_flat() {
        let zone = ConfluenceZone {
            price_level: Price::new(100.12345),
            confluence_score: 1.23456,
            factors: vec![
                factor(100.1, FactorType::Fibonacci),
                factor(100.2, FactorType::Fibonacci),
                factor(100.15, FactorType::RoundNumber),
            ],
            zone_type: ConfluenceType::Support,
            strength: ZoneStrength::Moderate,
            price_range: (Price::new(100.1), Price::new(100.2)),
            distance_to_current: -1.23456,
            historical_tests: 0,
            last_test_date: None,
            breach_probability: Prob::new(0.45678),
        };

        let record = zone.to_record();
        assert_eq!(record.price_level, 100.12);
        assert_eq!(record.confluence_score, 1.235);
        assert_eq!(record.factor_count, 3);
        assert_eq!(record.factor_diversity, 0.2);
        assert_eq!(record.distance_to_current_pct, -1.23);
        assert_eq!(record.breach_probability, 0.457);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["zone_type"], "support");
        assert_eq!(json["strength"], "moderate");
        assert_eq!(json["factors"][0]["type"], "fibonacci_level");
        assert!(json["last_test_date"].is_null());
    }
}

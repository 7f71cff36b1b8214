use {
    crate::{
        config::{DF, Pct, Price, PriceLike, Prob, ZoneSettings},
        models::{
            ConfluenceFactor, ConfluenceType, ConfluenceZone, FactorType, ZoneStrength, meta,
        },
        utils::epoch_ms_to_utc,
    },
    chrono::{DateTime, Utc},
    std::collections::{BTreeSet, HashMap},
    strum::EnumCount,
};

/// Groups factors into clusters of nearby prices.
/// Factors are sorted by price and walked left to right. A factor joins the
/// current cluster while it stays within `tolerance` of the cluster's running mean.
pub(crate) fn cluster_factors(
    mut factors: Vec<ConfluenceFactor>,
    tolerance: Pct,
) -> Vec<Vec<ConfluenceFactor>> {
    if factors.is_empty() {
        return Vec::new();
    }

    factors.sort_by(|a, b| a.price.value().total_cmp(&b.price.value()));

    let mut clusters = Vec::new();
    let mut current: Vec<ConfluenceFactor> = Vec::new();
    let mut running_sum = 0.0;

    for factor in factors {
        let price = factor.price.value();
        if !current.is_empty() {
            let running_mean = running_sum / current.len() as f64;
            // The bridge breaks: close the cluster
            if (price - running_mean).abs() / running_mean > tolerance.value() {
                if DF.log_clustering {
                    log::info!(
                        "Cluster closed: {} factors around {:.2}, next at {:.2}",
                        current.len(),
                        running_mean,
                        price
                    );
                }
                clusters.push(std::mem::take(&mut current));
                running_sum = 0.0;
            }
        }
        running_sum += price;
        current.push(factor);
    }

    // Finalize the last cluster
    clusters.push(current);
    clusters
}

pub(crate) fn distinct_types(factors: &[ConfluenceFactor]) -> usize {
    factors
        .iter()
        .map(|f| f.factor_type)
        .collect::<BTreeSet<FactorType>>()
        .len()
}

/// Total strength, boosted by how many different kinds of evidence agree.
pub(crate) fn confluence_score(factors: &[ConfluenceFactor], diversity_weight: f64) -> f64 {
    let total: f64 = factors.iter().map(|f| f.strength.value()).sum();
    let diversity_bonus =
        1.0 + diversity_weight * distinct_types(factors) as f64 / FactorType::COUNT as f64;
    (total * diversity_bonus).max(0.0)
}

/// Decreasing in both score and diversity.
pub(crate) fn breach_probability(score: f64, diversity: f64, settings: &ZoneSettings) -> Prob {
    let decay = (-settings.breach_decay * score.max(0.0)).exp();
    let damping = 1.0 - settings.breach_diversity_damping * diversity.clamp(0.0, 1.0);
    Prob::new(decay * damping)
}

/// Most frequent direction. A tie for first place is a pivot.
pub(crate) fn majority_direction(factors: &[ConfluenceFactor]) -> ConfluenceType {
    let mut counts: HashMap<ConfluenceType, usize> = HashMap::new();
    for f in factors {
        *counts.entry(f.direction).or_insert(0) += 1;
    }

    let top = counts.values().copied().max().unwrap_or(0);
    let mut leaders = counts.iter().filter(|&(_, &c)| c == top).map(|(d, _)| *d);

    match (leaders.next(), leaders.next()) {
        (Some(direction), None) => direction,
        _ => ConfluenceType::Pivot,
    }
}

/// Strength-weighted mean price. Falls back to the plain mean when all strengths are zero.
pub(crate) fn weighted_price_level(factors: &[ConfluenceFactor]) -> f64 {
    if factors.is_empty() {
        return 0.0;
    }
    let total_strength: f64 = factors.iter().map(|f| f.strength.value()).sum();
    if total_strength <= f64::EPSILON {
        return factors.iter().map(|f| f.price.value()).sum::<f64>() / factors.len() as f64;
    }
    factors
        .iter()
        .map(|f| f.price.value() * f.strength.value())
        .sum::<f64>()
        / total_strength
}

/// Test count and latest test date carried by historical S/R members.
pub(crate) fn historical_tests(factors: &[ConfluenceFactor]) -> (u32, Option<DateTime<Utc>>) {
    let history = factors
        .iter()
        .filter(|f| f.factor_type == FactorType::HistoricalSr);

    let tests = history
        .clone()
        .filter_map(|f| f.meta_i64(meta::TOUCHES))
        .max()
        .unwrap_or(0);
    let last_test = history
        .filter_map(|f| f.meta_i64(meta::LAST_TOUCH_MS))
        .max()
        .and_then(epoch_ms_to_utc);

    (u32::try_from(tests).unwrap_or(u32::MAX), last_test)
}

/// Turns one cluster into a scored, labelled zone.
pub(crate) fn build_zone(
    factors: Vec<ConfluenceFactor>,
    reference: Option<Price>,
    settings: &ZoneSettings,
) -> ConfluenceZone {
    let price_level = weighted_price_level(&factors);
    let score = confluence_score(&factors, settings.diversity_weight);
    let diversity = distinct_types(&factors) as f64 / FactorType::COUNT as f64;

    let (min, max) = factors.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), f| {
        (lo.min(f.price.value()), hi.max(f.price.value()))
    });

    let distance_to_current = match reference {
        Some(r) if r.is_positive() => (price_level - r.value()) / r.value() * 100.0,
        _ => 0.0,
    };

    let (historical_tests, last_test_date) = historical_tests(&factors);

    ConfluenceZone {
        price_level: Price::new(price_level),
        confluence_score: score,
        zone_type: majority_direction(&factors),
        strength: ZoneStrength::from_score(score, &settings.bands),
        price_range: (Price::new(min), Price::new(max)),
        distance_to_current,
        historical_tests,
        last_test_date,
        breach_probability: breach_probability(score, diversity, settings),
        factors,
    }
}

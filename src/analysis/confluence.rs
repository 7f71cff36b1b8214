use {
    crate::{
        analysis::{
            DetectionContext, DetectorKind, FactorDetector,
            zone_scoring::{build_zone, cluster_factors},
        },
        config::{ConfluenceConfig, DF, Price, PriceLike},
        models::{ConfluenceFactor, ConfluenceZone, OhlcvTimeSeries, ZoneRecord},
    },
    rayon::prelude::*,
    std::{
        cell::Cell,
        panic::{self, AssertUnwindSafe},
    },
};

thread_local! {
    static ISOLATING: Cell<bool> = const { Cell::new(false) };
}

/// True while the current thread runs a detector under panic isolation.
/// A panic hook can use this to leave reporting to the aggregator.
pub fn panic_is_isolated() -> bool {
    ISOLATING.with(Cell::get)
}

/// Result of one aggregation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfluenceReport {
    /// Ranked by score, strongest first
    pub zones: Vec<ConfluenceZone>,
    pub reference_price: Option<Price>,
    /// Valid factors fed into clustering
    pub factor_count: usize,
    /// Enabled, but their auxiliary input was absent
    pub skipped: Vec<DetectorKind>,
    /// Panicked during detection
    pub failed: Vec<DetectorKind>,
}

impl ConfluenceReport {
    pub fn records(&self) -> Vec<ZoneRecord> {
        self.zones.iter().map(ConfluenceZone::to_record).collect()
    }

    pub fn top(&self, n: usize) -> &[ConfluenceZone] {
        &self.zones[..n.min(self.zones.len())]
    }
}

enum DetectorOutcome {
    Produced(Vec<ConfluenceFactor>),
    Skipped,
    Failed,
}

/// Runs the enabled detectors and merges their factors into ranked zones.
pub struct ZoneAggregator {
    config: ConfluenceConfig,
    detectors: Vec<Box<dyn FactorDetector>>,
}

impl ZoneAggregator {
    /// Builds the detectors listed in `config.detectors`.
    pub fn new(config: ConfluenceConfig) -> Self {
        let kinds = config.detectors;
        Self::from_kinds(config, kinds)
    }

    pub fn from_kinds(config: ConfluenceConfig, kinds: &[DetectorKind]) -> Self {
        let detectors = kinds.iter().map(|k| k.build(&config)).collect();
        Self::with_detectors(config, detectors)
    }

    pub fn with_detectors(
        config: ConfluenceConfig,
        detectors: Vec<Box<dyn FactorDetector>>,
    ) -> Self {
        Self { config, detectors }
    }

    pub fn detector_kinds(&self) -> Vec<DetectorKind> {
        self.detectors.iter().map(|d| d.kind()).collect()
    }

    pub fn run(&self, series: &OhlcvTimeSeries, ctx: &DetectionContext<'_>) -> ConfluenceReport {
        let reference_price = ctx.reference_price(series);

        let outcomes: Vec<(DetectorKind, DetectorOutcome)> =
            crate::trace_time!("Confluence: detectors", 2000, {
                if self.config.parallel {
                    self.detectors
                        .par_iter()
                        .map(|d| (d.kind(), run_isolated(d.as_ref(), series, ctx)))
                        .collect()
                } else {
                    self.detectors
                        .iter()
                        .map(|d| (d.kind(), run_isolated(d.as_ref(), series, ctx)))
                        .collect()
                }
            });

        let mut skipped = Vec::new();
        let mut failed = Vec::new();
        let mut factors = Vec::new();
        for (kind, outcome) in outcomes {
            match outcome {
                DetectorOutcome::Produced(found) => {
                    log::debug!("{}: {} factors", kind, found.len());
                    if DF.log_factors {
                        for f in &found {
                            log::info!(
                                "  {} {} @ {:.2} ({:.3})",
                                kind,
                                f.direction,
                                f.price.value(),
                                f.strength.value()
                            );
                        }
                    }
                    factors.extend(found);
                }
                DetectorOutcome::Skipped => skipped.push(kind),
                DetectorOutcome::Failed => failed.push(kind),
            }
        }

        let before = factors.len();
        factors.retain(ConfluenceFactor::is_well_formed);
        if factors.len() < before {
            log::debug!("Discarded {} factors with invalid prices", before - factors.len());
        }
        let factor_count = factors.len();

        let settings = &self.config.zones;
        let mut zones: Vec<ConfluenceZone> = crate::trace_time!("Confluence: clustering", 1000, {
            cluster_factors(factors, settings.tolerance_pct)
                .into_iter()
                .map(|members| build_zone(members, reference_price, settings))
                .filter(|z| {
                    z.factor_count() >= settings.min_factors_per_zone
                        && z.confluence_score >= settings.min_score
                })
                .collect()
        });

        zones.sort_by(|a, b| {
            b.confluence_score
                .total_cmp(&a.confluence_score)
                .then(a.price_level.value().total_cmp(&b.price_level.value()))
        });

        for zone in &zones {
            log::debug!("  {}", zone);
        }
        log::info!(
            "Confluence [{}]: {} factors -> {} zones ({} skipped, {} failed)",
            series.symbol,
            factor_count,
            zones.len(),
            skipped.len(),
            failed.len()
        );

        ConfluenceReport {
            zones,
            reference_price,
            factor_count,
            skipped,
            failed,
        }
    }
}

fn run_isolated(
    detector: &dyn FactorDetector,
    series: &OhlcvTimeSeries,
    ctx: &DetectionContext<'_>,
) -> DetectorOutcome {
    if !detector.requirement().is_satisfied_by(ctx) {
        log::debug!(
            "{}: skipped, no {} context",
            detector.kind(),
            detector.requirement()
        );
        return DetectorOutcome::Skipped;
    }

    ISOLATING.with(|flag| flag.set(true));
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| detector.detect(series, ctx)));
    ISOLATING.with(|flag| flag.set(false));

    match outcome {
        Ok(factors) => DetectorOutcome::Produced(factors),
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::error!("Detector {} failed: {}", detector.kind(), reason);
            DetectorOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::test_support::series_from_hl,
        config::{CONFLUENCE, PriceLike, Strength},
        domain::{FlowSeries, OpenInterestSeries},
        models::{ConfluenceType, FactorType},
    };
    use chrono::DateTime;

    struct FixedDetector {
        kind: DetectorKind,
        prices: Vec<f64>,
    }

    impl FactorDetector for FixedDetector {
        fn kind(&self) -> DetectorKind {
            self.kind
        }

        fn detect(
            &self,
            _series: &OhlcvTimeSeries,
            ctx: &DetectionContext<'_>,
        ) -> Vec<ConfluenceFactor> {
            self.prices
                .iter()
                .map(|&p| {
                    ConfluenceFactor::new(
                        p,
                        FactorType::RoundNumber,
                        Strength::new(0.5),
                        ConfluenceType::Support,
                        ctx.as_of,
                    )
                })
                .collect()
        }
    }

    struct PanickingDetector;

    impl FactorDetector for PanickingDetector {
        fn kind(&self) -> DetectorKind {
            DetectorKind::GapLevel
        }

        fn detect(&self, _: &OhlcvTimeSeries, _: &DetectionContext<'_>) -> Vec<ConfluenceFactor> {
            panic!("index out of range")
        }
    }

    struct FlagCheckingDetector;

    impl FactorDetector for FlagCheckingDetector {
        fn kind(&self) -> DetectorKind {
            DetectorKind::PivotPoint
        }

        fn detect(
            &self,
            _series: &OhlcvTimeSeries,
            ctx: &DetectionContext<'_>,
        ) -> Vec<ConfluenceFactor> {
            if !panic_is_isolated() {
                return Vec::new();
            }
            vec![ConfluenceFactor::new(
                100.0,
                FactorType::PivotPoint,
                Strength::new(0.5),
                ConfluenceType::Pivot,
                ctx.as_of,
            )]
        }
    }

    fn ctx() -> DetectionContext<'static> {
        DetectionContext::new(DateTime::from_timestamp(0, 0).unwrap())
    }

    fn fixed(prices: &[f64]) -> Box<dyn FactorDetector> {
        Box::new(FixedDetector {
            kind: DetectorKind::RoundNumber,
            prices: prices.to_vec(),
        })
    }

    fn wavy_series() -> OhlcvTimeSeries {
        let highs: Vec<f64> = (0..120)
            .map(|i| 100.0 + ((i as f64) * 0.3).sin() * 8.0 + i as f64 * 0.05)
            .collect();
        let lows: Vec<f64> = highs.iter().map(|h| h - 1.5).collect();
        series_from_hl(&highs, &lows)
    }

    #[test]
    fn close_factors_form_one_zone() {
        let agg =
            ZoneAggregator::with_detectors(CONFLUENCE, vec![fixed(&[100.0, 100.2, 100.4])]);
        let report = agg.run(&series_from_hl(&[101.0], &[99.0]), &ctx());

        assert_eq!(report.zones.len(), 1);
        assert_eq!(report.zones[0].factor_count(), 3);
        assert_eq!(report.factor_count, 3);
    }

    #[test]
    fn far_apart_factors_stay_apart() {
        let agg =
            ZoneAggregator::with_detectors(CONFLUENCE, vec![fixed(&[100.0, 120.0, 140.0])]);
        let report = agg.run(&series_from_hl(&[101.0], &[99.0]), &ctx());

        assert_eq!(report.zones.len(), 3);
        assert!(report.zones.iter().all(|z| z.factor_count() == 1));
        // Equal scores rank lower prices first
        let levels: Vec<f64> = report.zones.iter().map(|z| z.price_level.value()).collect();
        assert_eq!(levels, vec![100.0, 120.0, 140.0]);
    }

    #[test]
    fn invalid_factor_prices_are_discarded() {
        let agg =
            ZoneAggregator::with_detectors(CONFLUENCE, vec![fixed(&[0.0, f64::NAN, 100.0])]);
        let report = agg.run(&series_from_hl(&[101.0], &[99.0]), &ctx());
        assert_eq!(report.factor_count, 1);
        assert_eq!(report.zones.len(), 1);
    }

    #[test]
    fn panicking_detector_is_isolated() {
        let agg = ZoneAggregator::with_detectors(
            CONFLUENCE,
            vec![Box::new(PanickingDetector), fixed(&[100.0])],
        );
        let report = agg.run(&series_from_hl(&[101.0], &[99.0]), &ctx());

        assert_eq!(report.failed, vec![DetectorKind::GapLevel]);
        assert_eq!(report.zones.len(), 1);
    }

    #[test]
    fn isolation_flag_is_set_only_inside_detectors() {
        assert!(!panic_is_isolated());
        let agg = ZoneAggregator::with_detectors(
            CONFLUENCE,
            vec![Box::new(PanickingDetector), Box::new(FlagCheckingDetector)],
        );
        let report = agg.run(&series_from_hl(&[101.0], &[99.0]), &ctx());

        assert_eq!(report.failed, vec![DetectorKind::GapLevel]);
        assert_eq!(report.factor_count, 1);
        // Cleared again after a caught panic
        assert!(!panic_is_isolated());
    }

    #[test]
    fn missing_context_counts_as_skipped() {
        let agg = ZoneAggregator::new(CONFLUENCE);
        let report = agg.run(&wavy_series(), &ctx());

        assert_eq!(
            report.skipped,
            vec![DetectorKind::EtfFlow, DetectorKind::OpenInterest]
        );
        assert!(report.failed.is_empty());
        assert!(!report.zones.is_empty());
    }

    #[test]
    fn empty_context_and_series_never_error() {
        let flows = FlowSeries::default();
        let oi = OpenInterestSeries::default();
        let ctx = ctx().with_flows(&flows).with_open_interest(&oi);
        let report = ZoneAggregator::new(CONFLUENCE).run(&OhlcvTimeSeries::default(), &ctx);

        assert!(report.zones.is_empty());
        assert!(report.skipped.is_empty());
        assert!(report.failed.is_empty());
        assert_eq!(report.reference_price, None);
    }

    #[test]
    fn zones_respect_value_bounds_and_ranking() {
        let report = ZoneAggregator::new(CONFLUENCE).run(&wavy_series(), &ctx());

        for zone in &report.zones {
            assert!(zone.confluence_score >= 0.0);
            assert!((0.0..=1.0).contains(&zone.breach_probability.value()));
            assert!(zone.factors.iter().all(|f| (0.0..=1.0).contains(&f.strength.value())));
            let level = zone.price_level.value();
            assert!(level >= zone.price_range.0.value() - 1e-9);
            assert!(level <= zone.price_range.1.value() + 1e-9);
        }
        for pair in report.zones.windows(2) {
            assert!(pair[0].confluence_score >= pair[1].confluence_score);
        }
    }

    #[test]
    fn parallel_run_matches_sequential() {
        let series = wavy_series();
        let sequential = ZoneAggregator::new(CONFLUENCE).run(&series, &ctx());

        let mut config = CONFLUENCE;
        config.parallel = true;
        let parallel = ZoneAggregator::new(config).run(&series, &ctx());

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn filters_drop_thin_zones() {
        let mut config = CONFLUENCE;
        config.zones.min_factors_per_zone = 2;
        let agg = ZoneAggregator::with_detectors(config, vec![fixed(&[100.0, 100.1, 150.0])]);
        let report = agg.run(&series_from_hl(&[101.0], &[99.0]), &ctx());

        assert_eq!(report.zones.len(), 1);
        assert_eq!(report.zones[0].factor_count(), 2);
    }
}

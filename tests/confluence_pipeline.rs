use {
    chrono::{DateTime, Days, NaiveDate},
    confluence_zones::{
        CONFLUENCE, DetectionContext, DetectorKind, ZoneAggregator,
        config::{Price, PriceLike},
        data::parse_bundle,
        domain::{Candle, FlowRecord, FlowSeries, OiLevel, OpenInterestSeries},
        models::{FactorType, OhlcvTimeSeries},
        utils::date_to_epoch_ms,
    },
    serde_json::json,
};

fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + Days::new(i as u64)
}

/// Range-bound market between ~83k and ~87k.
fn ranging_series() -> OhlcvTimeSeries {
    let candles = (0..150)
        .map(|i| {
            let mid = 85_000.0 + (i as f64 * 0.25).sin() * 2_000.0;
            let open = mid - 150.0;
            let close = mid + 150.0;
            Candle::new(
                date_to_epoch_ms(day(i)),
                open,
                mid + 400.0,
                mid - 400.0,
                close,
                1_000.0 + (i % 7) as f64 * 100.0,
            )
        })
        .collect();
    OhlcvTimeSeries::from_candles("BTCUSD", candles)
}

fn flows() -> FlowSeries {
    let values = [10.0, -5.0, 12.0, 8.0, 1500.0, 15.0, -10.0, 5.0, 20.0, 12.0];
    FlowSeries::new(
        values
            .iter()
            .enumerate()
            .map(|(i, &flow)| FlowRecord {
                date: day(130 + i),
                flow,
            })
            .collect(),
    )
}

fn open_interest() -> OpenInterestSeries {
    OpenInterestSeries::new(
        (0..100)
            .map(|i| OiLevel {
                price: Price::new(80_000.0 + i as f64 * 10_000.0 / 99.0),
                open_interest: match i {
                    20 => 50_000.0,
                    80 => 75_000.0,
                    _ => 1_000.0,
                },
            })
            .collect(),
    )
}

#[test]
fn full_pass_produces_bounded_ranked_zones() {
    let series = ranging_series();
    let flows = flows();
    let oi = open_interest();
    let as_of = DateTime::from_timestamp(1_720_000_000, 0).unwrap();
    let ctx = DetectionContext::new(as_of)
        .with_flows(&flows)
        .with_open_interest(&oi);

    let report = ZoneAggregator::new(CONFLUENCE).run(&series, &ctx);

    assert!(report.skipped.is_empty());
    assert!(report.failed.is_empty());
    assert!(!report.zones.is_empty());
    assert_eq!(
        report.reference_price.map(|p| p.value()),
        series.last_close().map(|c| c.value())
    );

    let clustered: usize = report.zones.iter().map(|z| z.factor_count()).sum();
    assert_eq!(clustered, report.factor_count);

    for zone in &report.zones {
        assert!(zone.confluence_score >= 0.0);
        assert!((0.0..=1.0).contains(&zone.breach_probability.value()));
        assert!((0.0..=1.0).contains(&zone.factor_diversity()));
        for f in &zone.factors {
            assert!((0.0..=1.0).contains(&f.strength.value()));
            assert!(f.price.is_valid_level());
            assert_eq!(f.detected_at, as_of);
        }
    }
    for pair in report.zones.windows(2) {
        assert!(pair[0].confluence_score >= pair[1].confluence_score);
    }

    // Auxiliary evidence made it into the zones
    let types: Vec<FactorType> = report
        .zones
        .iter()
        .flat_map(|z| z.factors.iter().map(|f| f.factor_type))
        .collect();
    assert!(types.contains(&FactorType::EtfFlowPivot));
    assert!(types.contains(&FactorType::OpenInterest));
    assert!(types.contains(&FactorType::Fibonacci));
}

#[test]
fn identical_inputs_give_identical_reports() {
    let series = ranging_series();
    let flows = flows();
    let ctx = DetectionContext::new(DateTime::from_timestamp(0, 0).unwrap()).with_flows(&flows);

    let first = ZoneAggregator::new(CONFLUENCE).run(&series, &ctx);
    let second = ZoneAggregator::new(CONFLUENCE).run(&series, &ctx);
    assert_eq!(first, second);
    assert_eq!(first.skipped, vec![DetectorKind::OpenInterest]);
}

#[test]
fn records_serialize_to_flat_json() {
    let series = ranging_series();
    let ctx = DetectionContext::new(DateTime::from_timestamp(0, 0).unwrap());
    let report = ZoneAggregator::new(CONFLUENCE).run(&series, &ctx);

    let json = serde_json::to_value(report.records()).unwrap();
    let first = &json[0];
    for key in [
        "price_level",
        "confluence_score",
        "factor_count",
        "factor_diversity",
        "zone_type",
        "strength",
        "price_range",
        "distance_to_current_pct",
        "factors",
        "historical_tests",
        "last_test_date",
        "breach_probability",
    ] {
        assert!(first.get(key).is_some(), "missing {}", key);
    }
    assert!(first["factors"][0].get("type").is_some());
}

#[test]
fn bundle_text_drives_the_engine() {
    let bars: Vec<_> = (0..40)
        .map(|i| {
            let mid = 100.0 + (i % 10) as f64;
            json!({
                "date": day(i).format("%Y-%m-%d").to_string(),
                "open": mid, "high": mid + 1.0, "low": mid - 1.0, "close": mid, "volume": 10.0
            })
        })
        .collect();
    let text = json!({ "symbol": "ETHUSD", "bars": bars, "flows": [] }).to_string();

    let bundle = parse_bundle(&text).unwrap();
    let mut ctx = DetectionContext::new(DateTime::from_timestamp(0, 0).unwrap());
    if let Some(flows) = &bundle.flows {
        ctx = ctx.with_flows(flows);
    }

    let report = ZoneAggregator::new(CONFLUENCE).run(&bundle.series, &ctx);
    assert_eq!(report.skipped, vec![DetectorKind::OpenInterest]);
    assert!(report.failed.is_empty());
    assert!(!report.zones.is_empty());
}

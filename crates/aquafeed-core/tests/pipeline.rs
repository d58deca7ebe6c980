//! End-to-end scenarios through `FeedController` with the default
//! configuration (0.001 grids, 4-decimal degrees).
//!
//! Convention: test_pipeline_{scenario}

use aquafeed_core::{centroid, ConsequentBuilder, FeedController, InferenceEngine};
use aquafeed_types::{FeedConfig, FeedStatus, InferenceResult, Observation};
use chrono::{NaiveDate, NaiveDateTime};

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 11, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn controller() -> FeedController {
    FeedController::new(FeedConfig::default()).expect("default config is valid")
}

#[test]
fn test_pipeline_optimal_conditions() {
    // 25 °C sits on normal's apex, pH 7 on netral's plateau: only
    // "normal & netral → banyak" fires, at full strength.
    let c = controller();
    let r = c.evaluate(&Observation::new(at(4, 8), Some(25.0), Some(7.0), 1000.0));

    assert_eq!(r.status, FeedStatus::Crisp);
    assert_eq!(r.temperature_degrees["normal"], 1.0);
    assert_eq!(r.temperature_degrees["rendah"], 0.0);
    assert_eq!(r.ph_degrees["netral"], 1.0);
    assert_eq!(r.activated_rules.len(), 1);
    assert_eq!(r.activated_rules[0].consequent, "banyak");
    assert_eq!(r.activated_rules[0].firing_strength, 1.0);

    // Same centroid computed independently from the banyak curve.
    let feed = ConsequentBuilder::default().build(30.0, 50.0).unwrap();
    let banyak = feed.term("banyak").unwrap();
    let expected = centroid(feed.universe().points(), banyak.samples());
    assert!((r.feed_amount.unwrap() - expected).abs() < 1e-9);
    assert!((expected - 47.2917).abs() < 0.01);
}

#[test]
fn test_pipeline_rising_edge_ph() {
    // pH 6 is 2/3 up netral's rising edge and 1/3 down asam's falling edge.
    let c = controller();
    let r = c.evaluate(&Observation::new(at(4, 8), Some(25.0), Some(6.0), 1000.0));

    assert_eq!(r.ph_degrees["netral"], 0.6667);
    assert_eq!(r.ph_degrees["asam"], 0.3333);
    let preds = r.alpha_predicates();
    assert_eq!(preds["Rule 2"], 0.6667);
    assert_eq!(preds["Rule 1"], 0.3333);

    // Top cut only covers the banyak shoulder; the lower cut spans both.
    assert_eq!(r.alpha_cuts.len(), 2);
    assert_eq!(r.alpha_cuts[0].level, 0.6667);
    assert_eq!(r.alpha_cuts[0].intervals.len(), 1);
    let (lo, hi) = r.alpha_cuts[0].intervals[0];
    assert!((lo - 45.83).abs() < 0.01, "lo = {lo}");
    assert!(hi > 49.99);
    assert_eq!(r.alpha_cuts[1].level, 0.3333);
    let (lo, _) = r.alpha_cuts[1].intervals[0];
    assert!((lo - 35.83).abs() < 0.01, "lo = {lo}");

    let feed = r.feed_amount.unwrap();
    assert!(feed > 40.0 && feed < 47.2917, "feed = {feed}");
}

#[test]
fn test_pipeline_cold_acidic_gives_little_feed() {
    let c = controller();
    let r = c.evaluate(&Observation::new(at(4, 8), Some(18.0), Some(4.5), 1000.0));
    assert_eq!(r.activated_rules.len(), 1);
    assert_eq!(r.activated_rules[0].consequent, "sedikit");
    let feed = r.feed_amount.unwrap();
    assert!(feed < 35.0, "feed = {feed}");
    assert!(r.feed_degrees["sedikit"] > 0.9);
}

#[test]
fn test_pipeline_records_control_points() {
    let c = controller();
    let r = c.evaluate(&Observation::new(at(4, 8), Some(27.0), Some(7.2), 1000.0));
    assert_eq!(r.temperature_params["normal"], vec![23.0, 25.0, 29.0, 31.0]);
    assert_eq!(r.ph_params["basa"], vec![7.5, 9.0, 14.0, 14.0]);
    assert_eq!(r.feed_params["sedikit"], vec![30.0, 30.0, 35.0, 37.5]);
    assert_eq!(r.feed_params["sedang"], vec![35.0, 37.5, 42.5, 45.0]);
}

#[test]
fn test_pipeline_gap_propagation() {
    let c = controller();
    let batch = [
        Observation::new(at(4, 8), None, Some(7.0), 1000.0),
        Observation::new(at(4, 18), Some(26.0), None, 1000.0),
        Observation::new(at(5, 8), None, None, 1000.0),
    ];
    let out = c.run(&batch);
    assert!(out.iter().all(InferenceResult::is_gap));
    assert!(out
        .iter()
        .all(|r| matches!(r.status, FeedStatus::MissingInput { .. })));
}

#[test]
fn test_pipeline_engine_matches_controller() {
    let c = controller();
    let obs = Observation::new(at(4, 8), Some(29.5), Some(8.3), 1250.0);
    let (lo, hi) = c.feed_bounds(obs.biomass_weight).unwrap();
    let feed = ConsequentBuilder::from_config(c.config())
        .unwrap()
        .build(lo, hi)
        .unwrap();
    let direct = InferenceEngine::from_config(c.config()).infer(
        &obs,
        c.temperature(),
        c.ph(),
        &feed,
        c.rules(),
    );
    assert_eq!(direct, c.evaluate(&obs));
}

#[test]
fn test_pipeline_json_export() {
    let c = controller();
    let r = c.evaluate(&Observation::new(at(4, 8), Some(25.0), Some(7.0), 1000.0));
    let json = r.to_json().unwrap();
    let back: InferenceResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.status, FeedStatus::Crisp);
    assert_eq!(back.activated_rules, r.activated_rules);
    assert!(json.contains("\"status\":\"crisp\""));
}

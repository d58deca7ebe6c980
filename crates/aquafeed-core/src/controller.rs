// ─────────────────────────────────────────────────────────────────────
// AquaFeed — Batch Feed Controller
// ─────────────────────────────────────────────────────────────────────
//! Owns the fixed inputs (temperature and pH variables, rule base) and
//! turns an ordered sequence of observations into an equally ordered
//! sequence of records.
//!
//! Observations are independent: the output variable is rebuilt from each
//! observation's biomass, and the shared state is read-only apart from the
//! run counters. A bad record, including one that panics, degrades to a
//! gap and never aborts the batch.

use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use aquafeed_types::{FeedConfig, FeedError, FeedResult, FeedStatus, InferenceResult, Observation};

use crate::biomass::WeeklyBiomass;
use crate::consequent::{feed_bounds, ConsequentBuilder};
use crate::engine::InferenceEngine;
use crate::membership::LinguisticVariable;
use crate::rules::RuleBase;

/// Name of the temperature input variable.
pub const TEMPERATURE_VARIABLE: &str = "temperature";
/// Name of the pH input variable.
pub const PH_VARIABLE: &str = "ph";

/// Cumulative outcome counters since construction or the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub processed: u64,
    pub crisp: u64,
    pub missing_input: u64,
    pub no_activation: u64,
    pub failures: u64,
}

impl RunStats {
    fn record(&mut self, status: &FeedStatus) {
        self.processed += 1;
        match status {
            FeedStatus::Crisp => self.crisp += 1,
            FeedStatus::MissingInput { .. } => self.missing_input += 1,
            FeedStatus::NoRuleActivated => self.no_activation += 1,
            FeedStatus::ComputationFailure { .. } => self.failures += 1,
        }
    }

    pub fn gaps(&self) -> u64 {
        self.processed - self.crisp
    }
}

/// Fuzzy feed controller.
///
/// Thread-safe: counters are guarded by a `parking_lot::Mutex`, everything
/// else is immutable after construction.
pub struct FeedController {
    config: FeedConfig,
    temperature: LinguisticVariable,
    ph: LinguisticVariable,
    rules: RuleBase,
    builder: ConsequentBuilder,
    engine: InferenceEngine,
    stats: Mutex<RunStats>,
}

impl FeedController {
    /// Controller with the standard 9-rule table.
    pub fn new(config: FeedConfig) -> FeedResult<Self> {
        Self::with_rules(config, RuleBase::standard())
    }

    pub fn with_rules(config: FeedConfig, rules: RuleBase) -> FeedResult<Self> {
        config.validate()?;
        let temperature = LinguisticVariable::from_specs(
            TEMPERATURE_VARIABLE,
            &config.temperature_universe,
            &config.temperature_terms,
        )?;
        let ph =
            LinguisticVariable::from_specs(PH_VARIABLE, &config.ph_universe, &config.ph_terms)?;
        rules.validate_antecedents(&temperature, &ph)?;
        let builder = ConsequentBuilder::from_config(&config)?;
        let engine = InferenceEngine::from_config(&config);
        Ok(Self {
            config,
            temperature,
            ph,
            rules,
            builder,
            engine,
            stats: Mutex::new(RunStats::default()),
        })
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn temperature(&self) -> &LinguisticVariable {
        &self.temperature
    }

    pub fn ph(&self) -> &LinguisticVariable {
        &self.ph
    }

    pub fn rules(&self) -> &RuleBase {
        &self.rules
    }

    /// `(min_feed, max_feed)` for a biomass weight.
    pub fn feed_bounds(&self, biomass_weight: f64) -> FeedResult<(f64, f64)> {
        feed_bounds(
            biomass_weight,
            self.config.feed_multiplier_min,
            self.config.feed_multiplier_max,
        )
    }

    /// The output variable for a biomass weight.
    pub fn feed_variable(&self, biomass_weight: f64) -> FeedResult<LinguisticVariable> {
        let (min_feed, max_feed) = self.feed_bounds(biomass_weight)?;
        self.builder.build(min_feed, max_feed)
    }

    /// Infer one observation. Never panics and never returns an error:
    /// every failure is folded into the record's status.
    pub fn evaluate(&self, observation: &Observation) -> InferenceResult {
        self.evaluate_with(observation, |o| self.evaluate_inner(o))
    }

    /// Runs `infer` under `catch_unwind` and counts the outcome.
    fn evaluate_with<F>(&self, observation: &Observation, infer: F) -> InferenceResult
    where
        F: FnOnce(&Observation) -> InferenceResult,
    {
        let result = match catch_unwind(AssertUnwindSafe(|| infer(observation))) {
            Ok(result) => result,
            Err(_) => {
                log::error!(
                    "{}: inference panicked, emitting gap record",
                    observation.timestamp
                );
                InferenceResult::gap_for(
                    observation,
                    FeedStatus::ComputationFailure {
                        reason: "panic during inference".into(),
                    },
                )
            }
        };
        self.stats.lock().record(&result.status);
        result
    }

    fn evaluate_inner(&self, observation: &Observation) -> InferenceResult {
        // Absent readings short-circuit before the output variable is built.
        if let Err(FeedError::MissingInput(input)) = observation.inputs() {
            log::warn!(
                "{}: missing {input}, emitting gap record",
                observation.timestamp
            );
            return InferenceResult::gap_for(observation, FeedStatus::MissingInput { input });
        }
        let feed = match self.feed_variable(observation.biomass_weight) {
            Ok(feed) => feed,
            Err(e) => {
                log::warn!(
                    "{}: cannot build feed variable for biomass {}: {e}",
                    observation.timestamp,
                    observation.biomass_weight
                );
                return InferenceResult::gap_for(
                    observation,
                    FeedStatus::ComputationFailure {
                        reason: e.to_string(),
                    },
                );
            }
        };
        self.engine
            .infer(observation, &self.temperature, &self.ph, &feed, &self.rules)
    }

    /// Sequential batch; output order equals input order.
    pub fn run(&self, observations: &[Observation]) -> Vec<InferenceResult> {
        let results: Vec<InferenceResult> =
            observations.iter().map(|o| self.evaluate(o)).collect();
        log_batch(&results);
        results
    }

    /// Batch split into contiguous chunks over `workers` scoped threads.
    /// Output order equals input order regardless of scheduling.
    pub fn run_parallel(
        &self,
        observations: &[Observation],
        workers: usize,
    ) -> Vec<InferenceResult> {
        run_chunked(observations, workers, &|o: &Observation| self.evaluate(o))
    }

    /// Resolve each reading's biomass from the weekly provider, then run.
    pub fn run_with_biomass(
        &self,
        readings: &[(NaiveDateTime, Option<f64>, Option<f64>)],
        biomass: &WeeklyBiomass,
    ) -> Vec<InferenceResult> {
        let observations: Vec<Observation> = readings
            .iter()
            .map(|&(ts, temperature, ph)| {
                Observation::new(ts, temperature, ph, biomass.weight_at(ts))
            })
            .collect();
        self.run(&observations)
    }

    pub fn stats(&self) -> RunStats {
        *self.stats.lock()
    }

    pub fn reset_stats(&self) {
        *self.stats.lock() = RunStats::default();
    }
}

/// A worker that panics outside `evaluate` degrades its whole chunk.
fn run_chunked(
    observations: &[Observation],
    workers: usize,
    evaluate: &(dyn Fn(&Observation) -> InferenceResult + Sync),
) -> Vec<InferenceResult> {
    if observations.is_empty() {
        return Vec::new();
    }
    let workers = workers.clamp(1, observations.len());
    let results: Vec<InferenceResult> = if workers == 1 {
        observations.iter().map(evaluate).collect()
    } else {
        let chunk_size = observations.len().div_ceil(workers);
        std::thread::scope(|scope| {
            let handles: Vec<_> = observations
                .chunks(chunk_size)
                .map(|chunk| {
                    let handle =
                        scope.spawn(move || chunk.iter().map(evaluate).collect::<Vec<_>>());
                    (chunk, handle)
                })
                .collect();

            let mut out = Vec::with_capacity(observations.len());
            for (chunk, handle) in handles {
                match handle.join() {
                    Ok(part) => out.extend(part),
                    Err(_) => {
                        log::error!("worker thread panicked, {} records degraded", chunk.len());
                        out.extend(chunk.iter().map(|o| {
                            InferenceResult::gap_for(
                                o,
                                FeedStatus::ComputationFailure {
                                    reason: "worker thread panicked".into(),
                                },
                            )
                        }));
                    }
                }
            }
            out
        })
    };
    log_batch(&results);
    results
}

fn log_batch(results: &[InferenceResult]) {
    let crisp = results.iter().filter(|r| r.status.is_crisp()).count();
    log::info!(
        "batch complete: {} records, {crisp} crisp, {} gaps",
        results.len(),
        results.len() - crisp
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 4)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn controller() -> FeedController {
        let config = FeedConfig {
            feed_resolution: 0.01,
            ..Default::default()
        };
        FeedController::new(config).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = FeedConfig {
            feed_resolution: -1.0,
            ..Default::default()
        };
        assert!(FeedController::new(config).is_err());
    }

    #[test]
    fn test_new_rejects_missing_antecedent_term() {
        let mut config = FeedConfig::default();
        config.ph_terms.retain(|t| t.label != "basa");
        assert!(matches!(
            FeedController::new(config),
            Err(FeedError::UnknownTerm { .. })
        ));
    }

    #[test]
    fn test_feed_bounds_from_config() {
        let c = controller();
        let (lo, hi) = c.feed_bounds(1000.0).unwrap();
        assert!((lo - 30.0).abs() < 1e-9 && (hi - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_evaluate_crisp() {
        let c = controller();
        let r = c.evaluate(&Observation::new(at(8), Some(25.0), Some(7.0), 1000.0));
        assert_eq!(r.status, FeedStatus::Crisp);
        let feed = r.feed_amount.unwrap();
        assert!((30.0..=50.0).contains(&feed));
    }

    #[test]
    fn test_evaluate_missing_ph() {
        let c = controller();
        let r = c.evaluate(&Observation::new(at(8), Some(25.0), None, 1000.0));
        assert_eq!(
            r.status,
            FeedStatus::MissingInput { input: "ph".into() }
        );
        assert!(r.feed_params.is_empty());
    }

    #[test]
    fn test_evaluate_negative_biomass_is_failure() {
        let c = controller();
        let r = c.evaluate(&Observation::new(at(8), Some(25.0), Some(7.0), -5.0));
        assert!(matches!(r.status, FeedStatus::ComputationFailure { .. }));
    }

    #[test]
    fn test_evaluate_zero_biomass_is_zero_feed() {
        let c = controller();
        let r = c.evaluate(&Observation::new(at(8), Some(25.0), Some(7.0), 0.0));
        assert_eq!(r.status, FeedStatus::Crisp);
        assert_eq!(r.feed_amount, Some(0.0));
    }

    #[test]
    fn test_run_isolates_bad_records() {
        let c = controller();
        let batch = vec![
            Observation::new(at(8), Some(25.0), Some(7.0), 1000.0),
            Observation::new(at(9), None, Some(7.0), 1000.0),
            Observation::new(at(10), Some(25.0), Some(7.0), f64::NAN),
            Observation::new(at(11), Some(20.0), Some(5.0), 1000.0),
        ];
        let out = c.run(&batch);
        assert_eq!(out.len(), 4);
        assert!(!out[0].is_gap());
        assert!(out[1].is_gap());
        assert!(out[2].is_gap());
        assert!(!out[3].is_gap());
        let times: Vec<_> = out.iter().map(|r| r.timestamp).collect();
        assert_eq!(times, vec![at(8), at(9), at(10), at(11)]);

        let stats = c.stats();
        assert_eq!(stats.processed, 4);
        assert_eq!(stats.crisp, 2);
        assert_eq!(stats.missing_input, 1);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.gaps(), 2);
    }

    #[test]
    fn test_run_parallel_matches_sequential() {
        let c = controller();
        let batch: Vec<Observation> = (0..24)
            .map(|i| {
                let temp = if i % 5 == 0 {
                    None
                } else {
                    Some(18.0 + i as f64 * 0.6)
                };
                Observation::new(
                    at(i as u32 % 24),
                    temp,
                    Some(4.5 + i as f64 * 0.3),
                    800.0,
                )
            })
            .collect();
        let seq = c.run(&batch);
        let par = c.run_parallel(&batch, 4);
        assert_eq!(seq, par);
    }

    #[test]
    fn test_run_parallel_empty_and_single_worker() {
        let c = controller();
        assert!(c.run_parallel(&[], 8).is_empty());
        let batch = vec![Observation::new(at(8), Some(25.0), Some(7.0), 1000.0)];
        assert_eq!(c.run_parallel(&batch, 0).len(), 1);
    }

    #[test]
    fn test_evaluate_panic_degrades_to_gap() {
        let c = controller();
        let obs = Observation::new(at(8), Some(25.0), Some(7.0), 1000.0);
        let r = c.evaluate_with(&obs, |_| panic!("curve sampling blew up"));
        assert_eq!(
            r.status,
            FeedStatus::ComputationFailure {
                reason: "panic during inference".into()
            }
        );
        assert!(r.is_gap());
        assert_eq!(r.timestamp, at(8));

        // The controller keeps working afterwards.
        let next = c.evaluate(&Observation::new(at(9), Some(25.0), Some(7.0), 1000.0));
        assert_eq!(next.status, FeedStatus::Crisp);
        let stats = c.stats();
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.crisp, 1);
    }

    #[test]
    fn test_run_chunked_worker_panic_degrades_chunk() {
        let c = controller();
        let batch: Vec<Observation> = (0..8)
            .map(|h| Observation::new(at(h), Some(25.0), Some(7.0), 1000.0))
            .collect();
        // Panics outside evaluate's isolation, killing the worker for hours 2..=3.
        let flaky = |o: &Observation| {
            if o.timestamp == at(3) {
                panic!("worker fault");
            }
            c.evaluate(o)
        };
        let out = run_chunked(&batch, 4, &flaky);

        assert_eq!(out.len(), 8);
        let times: Vec<_> = out.iter().map(|r| r.timestamp).collect();
        assert_eq!(times, (0..8).map(at).collect::<Vec<_>>());
        for (i, r) in out.iter().enumerate() {
            if i == 2 || i == 3 {
                assert_eq!(
                    r.status,
                    FeedStatus::ComputationFailure {
                        reason: "worker thread panicked".into()
                    }
                );
            } else {
                assert_eq!(r.status, FeedStatus::Crisp, "record {i}");
            }
        }
    }

    #[test]
    fn test_run_with_biomass_resolves_week() {
        let c = controller();
        let start = at(0);
        let biomass = WeeklyBiomass::new(start, vec![1000.0, 2000.0]).unwrap();
        let week2 = start + chrono::Duration::days(8);
        let out = c.run_with_biomass(
            &[(at(8), Some(25.0), Some(7.0)), (week2, Some(25.0), Some(7.0))],
            &biomass,
        );
        assert_eq!(out[0].feed_params["banyak"], vec![42.5, 47.5, 50.0, 50.0]);
        assert_eq!(out[1].feed_params["banyak"], vec![85.0, 95.0, 100.0, 100.0]);
    }

    #[test]
    fn test_reset_stats() {
        let c = controller();
        c.evaluate(&Observation::new(at(8), None, None, 1000.0));
        assert_eq!(c.stats().processed, 1);
        c.reset_stats();
        assert_eq!(c.stats(), RunStats::default());
    }
}

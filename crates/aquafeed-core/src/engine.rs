// ─────────────────────────────────────────────────────────────────────
// AquaFeed — Mamdani Inference Engine
// ─────────────────────────────────────────────────────────────────────
//! One observation in, one `InferenceResult` out:
//!
//!   1. Fuzzify temperature and pH against the fixed input variables.
//!   2. Fire every rule at `min(temp_degree, ph_degree)`.
//!   3. Clip each activated consequent at its firing strength.
//!   4. Aggregate the clipped curves by pointwise maximum.
//!   5. Centroid → crisp feed amount; alpha-cuts for diagnostics.
//!
//! `infer` is a pure function of its arguments. Missing inputs and
//! failures are reported through `FeedStatus`, never as a panic or `Err`.

use std::collections::BTreeMap;

use aquafeed_types::record::round_to;
use aquafeed_types::{
    FeedConfig, FeedError, FeedResult, FeedStatus, InferenceResult, Observation, RuleActivation,
};

use crate::defuzz;
use crate::membership::LinguisticVariable;
use crate::rules::RuleBase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InferenceEngine {
    degree_precision: Option<u32>,
}

impl InferenceEngine {
    /// `degree_precision`: decimals kept on fuzzified degrees (`None` = all).
    pub fn new(degree_precision: Option<u32>) -> Self {
        Self { degree_precision }
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(config.degree_precision)
    }

    /// Degree of `x` in every term of `var`.
    pub fn fuzzify(&self, var: &LinguisticVariable, x: f64) -> BTreeMap<String, f64> {
        var.fuzzify(x)
            .into_iter()
            .map(|(label, degree)| (label, self.round(degree)))
            .collect()
    }

    fn round(&self, degree: f64) -> f64 {
        match self.degree_precision {
            Some(p) => round_to(degree, p),
            None => degree,
        }
    }

    /// Pointwise max over the activated consequents, each clipped at its
    /// firing strength. All-zero when nothing fired.
    pub fn aggregate(
        feed: &LinguisticVariable,
        activations: &[RuleActivation],
    ) -> FeedResult<Vec<f64>> {
        let mut aggregated = vec![0.0_f64; feed.universe().len()];
        for activation in activations {
            let curve = feed.term(&activation.consequent)?;
            for (acc, &m) in aggregated.iter_mut().zip(curve.samples()) {
                *acc = acc.max(m.min(activation.firing_strength));
            }
        }
        Ok(aggregated)
    }

    /// Run the full pipeline for one observation.
    pub fn infer(
        &self,
        observation: &Observation,
        temperature: &LinguisticVariable,
        ph: &LinguisticVariable,
        feed: &LinguisticVariable,
        rules: &RuleBase,
    ) -> InferenceResult {
        match self.try_infer(observation, temperature, ph, feed, rules) {
            Ok(result) => result,
            Err(FeedError::MissingInput(input)) => {
                log::warn!(
                    "{}: missing {input}, emitting gap record",
                    observation.timestamp
                );
                InferenceResult::gap_for(observation, FeedStatus::MissingInput { input })
            }
            Err(e) => {
                log::warn!("{}: inference failed: {e}", observation.timestamp);
                InferenceResult::gap_for(
                    observation,
                    FeedStatus::ComputationFailure {
                        reason: e.to_string(),
                    },
                )
            }
        }
    }

    /// Like [`infer`](Self::infer) but surfaces failures as `Err`.
    /// `NoRuleActivated` is still an `Ok` record.
    pub fn try_infer(
        &self,
        observation: &Observation,
        temperature: &LinguisticVariable,
        ph: &LinguisticVariable,
        feed: &LinguisticVariable,
        rules: &RuleBase,
    ) -> FeedResult<InferenceResult> {
        let (temperature_value, ph_value) = observation.inputs()?;
        rules.validate_consequents(feed)?;

        let temperature_degrees = self.fuzzify(temperature, temperature_value);
        let ph_degrees = self.fuzzify(ph, ph_value);
        let activated_rules = rules.evaluate(temperature, &temperature_degrees, ph, &ph_degrees)?;

        let mut result = InferenceResult::gap_for(observation, FeedStatus::NoRuleActivated);
        result.temperature_params = temperature.control_points().into_iter().collect();
        result.ph_params = ph.control_points().into_iter().collect();
        result.feed_params = feed.control_points().into_iter().collect();
        result.temperature_degrees = temperature_degrees;
        result.ph_degrees = ph_degrees;

        if activated_rules.is_empty() {
            log::info!(
                "{}: no rule activated (temperature={temperature_value}, ph={ph_value})",
                observation.timestamp
            );
            return Ok(result);
        }

        let universe = feed.universe().points();
        let aggregated = Self::aggregate(feed, &activated_rules)?;
        let summary = defuzz::summarize(universe, &aggregated);
        if summary.area == 0.0 {
            // Rules fired but their consequents have no support on the grid.
            return Err(FeedError::Computation("aggregated output curve is empty".into()));
        }
        let feed_amount = summary.moment / summary.area;
        if !feed_amount.is_finite() {
            return Err(FeedError::Numerical(format!(
                "centroid is {feed_amount} (area={}, moment={})",
                summary.area, summary.moment
            )));
        }
        log::debug!(
            "{}: feed={feed_amount:.4} over [{}, {}]",
            observation.timestamp,
            feed.universe().first(),
            feed.universe().last()
        );

        result.feed_degrees = self.fuzzify(feed, feed_amount);
        result.alpha_cuts = defuzz::alpha_cuts(universe, &aggregated, &activated_rules);
        result.aggregate = Some(summary);
        result.activated_rules = activated_rules;
        result.feed_amount = Some(feed_amount);
        result.status = FeedStatus::Crisp;
        Ok(result)
    }
}

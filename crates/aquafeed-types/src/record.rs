// ─────────────────────────────────────────────────────────────────────
// AquaFeed — Observation and Inference Record Types
// ─────────────────────────────────────────────────────────────────────

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{FeedError, FeedResult};

/// Clamp a membership degree into [0, 1], mapping NaN to 0 and Inf to
/// the nearest bound.
#[inline]
pub fn clamp_degree(value: f64) -> f64 {
    if value.is_nan() {
        log::warn!("clamp_degree: NaN detected, clamping to 0");
        return 0.0;
    }
    if value.is_infinite() {
        let boundary = if value > 0.0 { 1.0 } else { 0.0 };
        log::warn!("clamp_degree: Inf detected, clamping to {boundary}");
        return boundary;
    }
    value.clamp(0.0, 1.0)
}

/// Round half away from zero to `precision` decimal places.
#[inline]
pub fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (value * scale).round() / scale
}

/// One aligned sensor reading plus the biomass of its weekly period.
///
/// Either sensor value may be absent; that marks a gap upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub temperature: Option<f64>,
    pub ph: Option<f64>,
    /// Summed biomass (grams) of the containing weekly period.
    pub biomass_weight: f64,
}

impl Observation {
    pub fn new(
        timestamp: NaiveDateTime,
        temperature: Option<f64>,
        ph: Option<f64>,
        biomass_weight: f64,
    ) -> Self {
        Self {
            timestamp,
            temperature,
            ph,
            biomass_weight,
        }
    }

    /// Both readings, or `MissingInput` naming the first absent one.
    /// Non-finite readings count as absent.
    pub fn inputs(&self) -> FeedResult<(f64, f64)> {
        let temperature = self
            .temperature
            .filter(|t| t.is_finite())
            .ok_or_else(|| FeedError::MissingInput("temperature".into()))?;
        let ph = self
            .ph
            .filter(|p| p.is_finite())
            .ok_or_else(|| FeedError::MissingInput("ph".into()))?;
        Ok((temperature, ph))
    }
}

/// Why a record does or does not carry a crisp feed amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FeedStatus {
    Crisp,
    MissingInput { input: String },
    /// Every rule fired at 0: the feed amount is undefined, not zero.
    NoRuleActivated,
    ComputationFailure { reason: String },
}

impl FeedStatus {
    pub fn is_crisp(&self) -> bool {
        matches!(self, Self::Crisp)
    }
}

/// A rule whose firing strength was strictly positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleActivation {
    pub label: String,
    pub temperature_term: String,
    pub ph_term: String,
    pub temperature_degree: f64,
    pub ph_degree: f64,
    /// `min(temperature_degree, ph_degree)`.
    pub firing_strength: f64,
    pub consequent: String,
}

/// Universe intervals where the aggregated curve reaches `level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaCut {
    pub level: f64,
    pub intervals: Vec<(f64, f64)>,
}

/// Summary of the aggregated output curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSummary {
    /// Σ μ(u)
    pub area: f64,
    /// Σ u·μ(u)
    pub moment: f64,
    /// max μ(u)
    pub peak: f64,
    /// First and last universe sample with μ > 0.
    pub support: Option<(f64, f64)>,
}

/// Everything the kernel produced for one observation.
///
/// Built once per observation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub timestamp: NaiveDateTime,
    pub temperature: Option<f64>,
    pub ph: Option<f64>,
    pub status: FeedStatus,
    /// Crisp feed dose (grams); `None` for every non-crisp status.
    pub feed_amount: Option<f64>,
    pub temperature_degrees: BTreeMap<String, f64>,
    pub ph_degrees: BTreeMap<String, f64>,
    /// Degrees of the crisp feed amount in each feed term.
    pub feed_degrees: BTreeMap<String, f64>,
    pub temperature_params: BTreeMap<String, Vec<f64>>,
    pub ph_params: BTreeMap<String, Vec<f64>>,
    pub feed_params: BTreeMap<String, Vec<f64>>,
    pub activated_rules: Vec<RuleActivation>,
    pub aggregate: Option<AggregateSummary>,
    pub alpha_cuts: Vec<AlphaCut>,
}

impl InferenceResult {
    /// A record with no crisp output and no inference trail.
    pub fn gap(
        timestamp: NaiveDateTime,
        temperature: Option<f64>,
        ph: Option<f64>,
        status: FeedStatus,
    ) -> Self {
        Self {
            timestamp,
            temperature,
            ph,
            status,
            feed_amount: None,
            temperature_degrees: BTreeMap::new(),
            ph_degrees: BTreeMap::new(),
            feed_degrees: BTreeMap::new(),
            temperature_params: BTreeMap::new(),
            ph_params: BTreeMap::new(),
            feed_params: BTreeMap::new(),
            activated_rules: Vec::new(),
            aggregate: None,
            alpha_cuts: Vec::new(),
        }
    }

    pub fn gap_for(observation: &Observation, status: FeedStatus) -> Self {
        Self::gap(
            observation.timestamp,
            observation.temperature,
            observation.ph,
            status,
        )
    }

    pub fn is_gap(&self) -> bool {
        self.feed_amount.is_none()
    }

    /// Firing strength of every activated rule, keyed by rule label.
    pub fn alpha_predicates(&self) -> BTreeMap<String, f64> {
        self.activated_rules
            .iter()
            .map(|r| (r.label.clone(), r.firing_strength))
            .collect()
    }

    pub fn to_json(&self) -> FeedResult<String> {
        serde_json::to_string(self)
            .map_err(|e| FeedError::Computation(format!("JSON encode error: {e}")))
    }
}

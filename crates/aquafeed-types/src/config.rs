// ─────────────────────────────────────────────────────────────────────
// AquaFeed — Fuzzy Feed Kernel Configuration
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::error::{FeedError, FeedResult};

/// Largest rounding precision accepted for fuzzified degrees.
pub const MAX_DEGREE_PRECISION: u32 = 12;

/// Half-open sampling range `low <= u < high` with a fixed step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniverseSpec {
    pub low: f64,
    pub high: f64,
    pub step: f64,
}

impl UniverseSpec {
    pub const fn new(low: f64, high: f64, step: f64) -> Self {
        Self { low, high, step }
    }

    fn validate(&self, name: &str) -> FeedResult<()> {
        if !self.low.is_finite() || !self.high.is_finite() {
            return Err(FeedError::Config(format!(
                "{name} universe bounds must be finite, got [{}, {})",
                self.low, self.high
            )));
        }
        if self.high <= self.low {
            return Err(FeedError::Config(format!(
                "{name} universe high must exceed low, got [{}, {})",
                self.low, self.high
            )));
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(FeedError::Config(format!(
                "{name} universe step must be > 0, got {}",
                self.step
            )));
        }
        Ok(())
    }
}

/// One fuzzy term: 3 control points build a triangle, 4 a trapezoid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermSpec {
    pub label: String,
    pub points: Vec<f64>,
}

impl TermSpec {
    pub fn new(label: impl Into<String>, points: &[f64]) -> Self {
        Self {
            label: label.into(),
            points: points.to_vec(),
        }
    }
}

/// Runtime configuration for the feed kernel.
///
/// Membership layouts are fixed constants of the deployment; they live here
/// so a site can ship them as JSON next to its sensor exports, not so they
/// can be tuned at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Temperature sampling grid (°C). Default: [14, 40) step 0.001.
    pub temperature_universe: UniverseSpec,

    /// pH sampling grid. Default: [4, 14) step 0.001.
    pub ph_universe: UniverseSpec,

    /// Temperature terms. Default: rendah / normal / tinggi trapezoids.
    pub temperature_terms: Vec<TermSpec>,

    /// pH terms. Default: asam / netral / basa trapezoids.
    pub ph_terms: Vec<TermSpec>,

    /// Step of the feed-amount universe rebuilt per observation.
    /// Default: 0.001 (grams).
    ///
    /// Ranges that would exceed 50 000 000 samples at this step (above
    /// roughly 2.5 t of biomass at 0.001) are sampled at the step
    /// multiplied by the smallest power of ten that fits.
    pub feed_resolution: f64,

    /// Lower feed bound as a fraction of biomass. Default: 0.03.
    pub feed_multiplier_min: f64,

    /// Upper feed bound as a fraction of biomass. Default: 0.05.
    pub feed_multiplier_max: f64,

    /// Decimal places kept on fuzzified input degrees before rule firing.
    /// `None` keeps full precision. Default: 4.
    pub degree_precision: Option<u32>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            temperature_universe: UniverseSpec::new(14.0, 40.0, 0.001),
            ph_universe: UniverseSpec::new(4.0, 14.0, 0.001),
            temperature_terms: vec![
                TermSpec::new("rendah", &[14.0, 14.0, 23.0, 25.0]),
                TermSpec::new("normal", &[23.0, 25.0, 29.0, 31.0]),
                TermSpec::new("tinggi", &[29.0, 31.0, 40.0, 40.0]),
            ],
            ph_terms: vec![
                TermSpec::new("asam", &[0.0, 0.0, 5.0, 6.5]),
                TermSpec::new("netral", &[5.0, 6.5, 7.5, 9.0]),
                TermSpec::new("basa", &[7.5, 9.0, 14.0, 14.0]),
            ],
            feed_resolution: 0.001,
            feed_multiplier_min: 0.03,
            feed_multiplier_max: 0.05,
            degree_precision: Some(4),
        }
    }
}

impl FeedConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> FeedResult<()> {
        self.temperature_universe.validate("temperature")?;
        self.ph_universe.validate("ph")?;
        validate_terms("temperature", &self.temperature_terms)?;
        validate_terms("ph", &self.ph_terms)?;

        if !(self.feed_resolution.is_finite() && self.feed_resolution > 0.0) {
            return Err(FeedError::Config(format!(
                "feed_resolution must be > 0, got {}",
                self.feed_resolution
            )));
        }
        if !(self.feed_multiplier_min.is_finite() && self.feed_multiplier_min >= 0.0) {
            return Err(FeedError::Config(format!(
                "feed_multiplier_min must be >= 0, got {}",
                self.feed_multiplier_min
            )));
        }
        if !self.feed_multiplier_max.is_finite()
            || self.feed_multiplier_max < self.feed_multiplier_min
        {
            return Err(FeedError::Config(format!(
                "feed_multiplier_max must be >= feed_multiplier_min, got {} < {}",
                self.feed_multiplier_max, self.feed_multiplier_min
            )));
        }
        if let Some(precision) = self.degree_precision {
            if precision > MAX_DEGREE_PRECISION {
                return Err(FeedError::Config(format!(
                    "degree_precision must be <= {MAX_DEGREE_PRECISION}, got {precision}"
                )));
            }
        }
        Ok(())
    }

    /// Load from JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> FeedResult<Self> {
        serde_json::from_str(json).map_err(|e| FeedError::Config(format!("JSON parse error: {e}")))
    }

    pub fn to_json(&self) -> FeedResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FeedError::Config(format!("JSON encode error: {e}")))
    }
}

fn validate_terms(variable: &str, terms: &[TermSpec]) -> FeedResult<()> {
    if terms.is_empty() {
        return Err(FeedError::Config(format!(
            "{variable} must define at least one term"
        )));
    }
    for (i, term) in terms.iter().enumerate() {
        if term.label.is_empty() {
            return Err(FeedError::Config(format!(
                "{variable} term #{i} has an empty label"
            )));
        }
        if terms[..i].iter().any(|t| t.label == term.label) {
            return Err(FeedError::Config(format!(
                "{variable} term '{}' is defined twice",
                term.label
            )));
        }
        if !matches!(term.points.len(), 3 | 4) {
            return Err(FeedError::membership(
                term.label.clone(),
                format!("expected 3 or 4 control points, got {}", term.points.len()),
            ));
        }
    }
    Ok(())
}

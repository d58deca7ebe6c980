// ─────────────────────────────────────────────────────────────────────
// AquaFeed — Fuzzy Feed Kernel PyO3 FFI Bindings
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
// Note: #[deny(unsafe_code)] not applied — PyO3 proc macros generate
// unsafe blocks internally. All hand-written code in this crate is safe.
//! Python-callable wrappers around the Rust fuzzy feed kernel.
//!
//! Exposes `FeedController`, `FeedConfig`, `InferenceResult` and the
//! defuzzification helpers to Python via PyO3.
//!
//! # FFI Safety
//!
//! - Kernel errors → `ValueError`; a gap record is a normal return value.
//! - Timestamps cross the boundary as ISO-8601 strings.
//! - All config validated before storage (`FeedConfig::validate()`).
//!
//! Install: `pip install -e crates/aquafeed-ffi` (requires maturin).
//!
//! Usage from Python:
//! ```python
//! from aquafeed_kernel import FeedController
//!
//! ctl = FeedController()
//! r = ctl.evaluate("2024-11-04 08:00:00", 26.0, 7.1, 1000.0)
//! print(r.feed_amount, r.alpha_predicates)
//! ```

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use aquafeed_core::{defuzz, feed_bounds as core_feed_bounds, FeedController, RunStats};
use aquafeed_types::{FeedConfig, FeedError, FeedStatus, InferenceResult, Observation};

fn to_py_err(e: FeedError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Accepts `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD HH:MM:SS`, fractional
/// seconds optional.
fn parse_timestamp(raw: &str) -> PyResult<NaiveDateTime> {
    raw.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(|e| PyValueError::new_err(format!("invalid timestamp {raw:?}: {e}")))
}

fn status_name(status: &FeedStatus) -> &'static str {
    match status {
        FeedStatus::Crisp => "crisp",
        FeedStatus::MissingInput { .. } => "missing_input",
        FeedStatus::NoRuleActivated => "no_rule_activated",
        FeedStatus::ComputationFailure { .. } => "computation_failure",
    }
}

type Reading = (String, Option<f64>, Option<f64>, f64);

fn observations(readings: Vec<Reading>) -> PyResult<Vec<Observation>> {
    readings
        .into_iter()
        .map(|(ts, temperature, ph, weight)| {
            Ok(Observation::new(parse_timestamp(&ts)?, temperature, ph, weight))
        })
        .collect()
}

fn wrap(results: Vec<InferenceResult>) -> Vec<PyInferenceResult> {
    results
        .into_iter()
        .map(|inner| PyInferenceResult { inner })
        .collect()
}

// ─── PyFeedConfig ───────────────────────────────────────────────────

/// Python-visible configuration for the feed kernel.
///
/// Membership terms keep their defaults here; load a JSON document via
/// `FeedConfig.from_json` to override them.
#[pyclass(name = "FeedConfig")]
#[derive(Clone)]
struct PyFeedConfig {
    inner: FeedConfig,
}

#[pymethods]
impl PyFeedConfig {
    #[new]
    #[pyo3(signature = (
        temperature_step = 0.001,
        ph_step = 0.001,
        feed_resolution = 0.001,
        feed_multiplier_min = 0.03,
        feed_multiplier_max = 0.05,
        degree_precision = Some(4),
    ))]
    fn new(
        temperature_step: f64,
        ph_step: f64,
        feed_resolution: f64,
        feed_multiplier_min: f64,
        feed_multiplier_max: f64,
        degree_precision: Option<u32>,
    ) -> PyResult<Self> {
        let mut config = FeedConfig {
            feed_resolution,
            feed_multiplier_min,
            feed_multiplier_max,
            degree_precision,
            ..Default::default()
        };
        config.temperature_universe.step = temperature_step;
        config.ph_universe.step = ph_step;
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    /// Construct from JSON string.
    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        let config = FeedConfig::from_json(json).map_err(to_py_err)?;
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    fn to_json(&self) -> PyResult<String> {
        self.inner.to_json().map_err(to_py_err)
    }

    fn __repr__(&self) -> String {
        format!(
            "FeedConfig(feed_multiplier=[{}, {}], feed_resolution={}, degree_precision={:?})",
            self.inner.feed_multiplier_min,
            self.inner.feed_multiplier_max,
            self.inner.feed_resolution,
            self.inner.degree_precision
        )
    }
}

// ─── PyInferenceResult ──────────────────────────────────────────────

/// Python-visible inference record for one observation.
#[pyclass(name = "InferenceResult")]
#[derive(Clone)]
struct PyInferenceResult {
    inner: InferenceResult,
}

#[pymethods]
impl PyInferenceResult {
    #[getter]
    fn timestamp(&self) -> String {
        self.inner.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    #[getter]
    fn temperature(&self) -> Option<f64> {
        self.inner.temperature
    }

    #[getter]
    fn ph(&self) -> Option<f64> {
        self.inner.ph
    }

    /// One of `crisp`, `missing_input`, `no_rule_activated`,
    /// `computation_failure`.
    #[getter]
    fn status(&self) -> &'static str {
        status_name(&self.inner.status)
    }

    /// Missing input name or failure reason, when the status carries one.
    #[getter]
    fn detail(&self) -> Option<String> {
        match &self.inner.status {
            FeedStatus::MissingInput { input } => Some(input.clone()),
            FeedStatus::ComputationFailure { reason } => Some(reason.clone()),
            _ => None,
        }
    }

    #[getter]
    fn feed_amount(&self) -> Option<f64> {
        self.inner.feed_amount
    }

    #[getter]
    fn temperature_degrees(&self) -> BTreeMap<String, f64> {
        self.inner.temperature_degrees.clone()
    }

    #[getter]
    fn ph_degrees(&self) -> BTreeMap<String, f64> {
        self.inner.ph_degrees.clone()
    }

    #[getter]
    fn feed_degrees(&self) -> BTreeMap<String, f64> {
        self.inner.feed_degrees.clone()
    }

    #[getter]
    fn feed_params(&self) -> BTreeMap<String, Vec<f64>> {
        self.inner.feed_params.clone()
    }

    /// Rule label → firing strength.
    #[getter]
    fn alpha_predicates(&self) -> BTreeMap<String, f64> {
        self.inner.alpha_predicates()
    }

    /// List of `(level, [(lo, hi), ...])`, highest level first.
    #[getter]
    fn alpha_cuts(&self) -> Vec<(f64, Vec<(f64, f64)>)> {
        self.inner
            .alpha_cuts
            .iter()
            .map(|c| (c.level, c.intervals.clone()))
            .collect()
    }

    fn is_gap(&self) -> bool {
        self.inner.is_gap()
    }

    fn to_dict<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let dict = PyDict::new(py);
        dict.set_item("timestamp", self.timestamp())?;
        dict.set_item("temperature", self.inner.temperature)?;
        dict.set_item("ph", self.inner.ph)?;
        dict.set_item("status", self.status())?;
        dict.set_item("detail", self.detail())?;
        dict.set_item("feed_amount", self.inner.feed_amount)?;
        dict.set_item("temperature_degrees", &self.inner.temperature_degrees)?;
        dict.set_item("ph_degrees", &self.inner.ph_degrees)?;
        dict.set_item("feed_degrees", &self.inner.feed_degrees)?;
        dict.set_item("temperature_params", &self.inner.temperature_params)?;
        dict.set_item("ph_params", &self.inner.ph_params)?;
        dict.set_item("feed_params", &self.inner.feed_params)?;

        let rules = PyList::empty(py);
        for rule in &self.inner.activated_rules {
            let entry = PyDict::new(py);
            entry.set_item("label", &rule.label)?;
            entry.set_item("temperature_term", &rule.temperature_term)?;
            entry.set_item("ph_term", &rule.ph_term)?;
            entry.set_item("firing_strength", rule.firing_strength)?;
            entry.set_item("consequent", &rule.consequent)?;
            rules.append(entry)?;
        }
        dict.set_item("activated_rules", rules)?;
        dict.set_item("alpha_cuts", self.alpha_cuts())?;
        Ok(dict)
    }

    fn to_json(&self) -> PyResult<String> {
        self.inner.to_json().map_err(to_py_err)
    }

    fn __repr__(&self) -> String {
        match self.inner.feed_amount {
            Some(feed) => format!(
                "InferenceResult(timestamp={}, feed_amount={:.4}, rules={})",
                self.timestamp(),
                feed,
                self.inner.activated_rules.len()
            ),
            None => format!(
                "InferenceResult(timestamp={}, status={})",
                self.timestamp(),
                self.status()
            ),
        }
    }
}

// ─── PyFeedController ───────────────────────────────────────────────

/// Fuzzy feed controller.
///
/// Each call crosses the FFI boundary once; fuzzification, rule firing
/// and defuzzification all run in Rust.
#[pyclass(name = "FeedController")]
struct PyFeedController {
    inner: FeedController,
}

#[pymethods]
impl PyFeedController {
    /// Create a controller with the standard 9-rule table.
    ///
    /// Args:
    ///     config: Optional FeedConfig (uses defaults if None).
    #[new]
    #[pyo3(signature = (config = None))]
    fn new(config: Option<PyFeedConfig>) -> PyResult<Self> {
        let cfg = config.map(|c| c.inner).unwrap_or_default();
        Ok(Self {
            inner: FeedController::new(cfg).map_err(to_py_err)?,
        })
    }

    /// Infer the feed dose for one reading.
    ///
    /// `temperature` or `ph` may be None; the result is then a gap.
    #[pyo3(signature = (timestamp, temperature, ph, biomass_weight))]
    fn evaluate(
        &self,
        timestamp: &str,
        temperature: Option<f64>,
        ph: Option<f64>,
        biomass_weight: f64,
    ) -> PyResult<PyInferenceResult> {
        let obs = Observation::new(parse_timestamp(timestamp)?, temperature, ph, biomass_weight);
        Ok(PyInferenceResult {
            inner: self.inner.evaluate(&obs),
        })
    }

    /// Batch over `(timestamp, temperature, ph, biomass_weight)` tuples.
    fn run(&self, readings: Vec<Reading>) -> PyResult<Vec<PyInferenceResult>> {
        let obs = observations(readings)?;
        Ok(wrap(self.inner.run(&obs)))
    }

    /// Same as `run`, split over worker threads with the GIL released.
    #[pyo3(signature = (readings, workers = 4))]
    fn run_parallel(
        &self,
        py: Python<'_>,
        readings: Vec<Reading>,
        workers: usize,
    ) -> PyResult<Vec<PyInferenceResult>> {
        let obs = observations(readings)?;
        let results = py.allow_threads(|| self.inner.run_parallel(&obs, workers));
        Ok(wrap(results))
    }

    /// `(min_feed, max_feed)` for a biomass weight.
    fn feed_bounds(&self, biomass_weight: f64) -> PyResult<(f64, f64)> {
        self.inner.feed_bounds(biomass_weight).map_err(to_py_err)
    }

    fn stats<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let RunStats {
            processed,
            crisp,
            missing_input,
            no_activation,
            failures,
        } = self.inner.stats();
        let dict = PyDict::new(py);
        dict.set_item("processed", processed)?;
        dict.set_item("crisp", crisp)?;
        dict.set_item("missing_input", missing_input)?;
        dict.set_item("no_activation", no_activation)?;
        dict.set_item("failures", failures)?;
        Ok(dict)
    }

    fn reset_stats(&self) {
        self.inner.reset_stats();
    }
}

// ─── Module Functions ───────────────────────────────────────────────

/// `(biomass * min_multiplier, biomass * max_multiplier)`.
#[pyfunction]
#[pyo3(signature = (biomass_weight, min_multiplier = 0.03, max_multiplier = 0.05))]
fn feed_bounds(
    biomass_weight: f64,
    min_multiplier: f64,
    max_multiplier: f64,
) -> PyResult<(f64, f64)> {
    core_feed_bounds(biomass_weight, min_multiplier, max_multiplier).map_err(to_py_err)
}

/// Discrete centroid of a sampled curve; 0.0 for an all-zero curve.
#[pyfunction]
fn centroid(universe: Vec<f64>, curve: Vec<f64>) -> PyResult<f64> {
    if universe.len() != curve.len() {
        return Err(PyValueError::new_err(format!(
            "universe and curve lengths differ: {} vs {}",
            universe.len(),
            curve.len()
        )));
    }
    Ok(defuzz::centroid(&universe, &curve))
}

/// Maximal `(lo, hi)` runs where `curve >= alpha`.
#[pyfunction]
fn alpha_cut(universe: Vec<f64>, curve: Vec<f64>, alpha: f64) -> PyResult<Vec<(f64, f64)>> {
    if universe.len() != curve.len() {
        return Err(PyValueError::new_err(format!(
            "universe and curve lengths differ: {} vs {}",
            universe.len(),
            curve.len()
        )));
    }
    Ok(defuzz::alpha_cut(&universe, &curve, alpha))
}

// ─── Module Registration ────────────────────────────────────────────

/// AquaFeed Kernel — Rust Mamdani controller for aquaculture feeding.
///
/// - `FeedConfig` — configuration
/// - `FeedController` — temperature + pH + biomass → feed dose
/// - `InferenceResult` — per-observation record and trail
/// - `feed_bounds`, `centroid`, `alpha_cut` — standalone helpers
#[pymodule]
fn aquafeed_kernel(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyFeedConfig>()?;
    m.add_class::<PyInferenceResult>()?;
    m.add_class::<PyFeedController>()?;
    m.add_function(wrap_pyfunction!(feed_bounds, m)?)?;
    m.add_function(wrap_pyfunction!(centroid, m)?)?;
    m.add_function(wrap_pyfunction!(alpha_cut, m)?)?;
    Ok(())
}

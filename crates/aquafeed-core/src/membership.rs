// ─────────────────────────────────────────────────────────────────────
// AquaFeed — Membership Curves and Linguistic Variables
// ─────────────────────────────────────────────────────────────────────
//! Sampled fuzzy sets over a discretised universe.
//!
//! A curve is evaluated analytically once, at every universe sample, and
//! from then on only the sampled array is used: crisp lookups interpolate
//! linearly between the two bracketing samples and clamp to the boundary
//! sample outside the grid. Clipping and aggregation act on the arrays.

use std::sync::Arc;

use aquafeed_types::config::{TermSpec, UniverseSpec};
use aquafeed_types::record::clamp_degree;
use aquafeed_types::{FeedError, FeedResult};

/// Upper bound on samples per universe (guards against a typo'd step).
pub const MAX_UNIVERSE_SAMPLES: usize = 50_000_000;

/// Ordered, strictly increasing sampling grid shared by every curve of a
/// variable. Cloning is cheap.
#[derive(Debug, Clone, PartialEq)]
pub struct Universe {
    points: Arc<[f64]>,
}

impl Universe {
    /// `low, low + step, …` while `< high`.
    pub fn arange(low: f64, high: f64, step: f64) -> FeedResult<Self> {
        if !low.is_finite() || !high.is_finite() {
            return Err(FeedError::InvalidUniverse(format!(
                "bounds must be finite, got [{low}, {high})"
            )));
        }
        if !(step.is_finite() && step > 0.0) {
            return Err(FeedError::InvalidUniverse(format!(
                "step must be > 0, got {step}"
            )));
        }
        if high <= low {
            return Err(FeedError::InvalidUniverse(format!(
                "high must exceed low, got [{low}, {high})"
            )));
        }
        let count = ((high - low) / step).ceil();
        if count > MAX_UNIVERSE_SAMPLES as f64 {
            return Err(FeedError::InvalidUniverse(format!(
                "[{low}, {high}) at step {step} needs {count} samples (max {MAX_UNIVERSE_SAMPLES})"
            )));
        }
        let mut count = (count as usize).max(1);
        // (high - low) / step can land a hair above an integer.
        while count > 1 && low + (count - 1) as f64 * step >= high {
            count -= 1;
        }
        let points: Vec<f64> = (0..count).map(|i| low + i as f64 * step).collect();
        Ok(Self {
            points: points.into(),
        })
    }

    pub fn from_spec(spec: &UniverseSpec) -> FeedResult<Self> {
        Self::arange(spec.low, spec.high, spec.step)
    }

    /// One-sample universe, used when a range collapses to a point.
    pub fn singleton(value: f64) -> FeedResult<Self> {
        if !value.is_finite() {
            return Err(FeedError::InvalidUniverse(format!(
                "singleton value must be finite, got {value}"
            )));
        }
        Ok(Self {
            points: Arc::from(vec![value]),
        })
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed universe.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> f64 {
        self.points[0]
    }

    pub fn last(&self) -> f64 {
        self.points[self.points.len() - 1]
    }

    /// Linear interpolation of `samples` (aligned with this universe) at `x`.
    ///
    /// Outside the grid the nearest boundary sample is returned; an exact
    /// grid hit returns that sample unchanged.
    pub fn interp(&self, samples: &[f64], x: f64) -> f64 {
        debug_assert_eq!(samples.len(), self.points.len());
        let xs = &self.points;
        let n = xs.len();
        // Number of grid points <= x.
        let idx = xs.partition_point(|&u| u <= x);
        if idx == 0 {
            return samples[0];
        }
        if idx == n {
            return samples[n - 1];
        }
        let (lo, hi) = (idx - 1, idx);
        let t = (x - xs[lo]) / (xs[hi] - xs[lo]);
        samples[lo] + t * (samples[hi] - samples[lo])
    }
}

/// Analytic shape of a fuzzy set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MembershipShape {
    /// `a <= b <= c`
    Triangular([f64; 3]),
    /// `a <= b <= c <= d`
    Trapezoidal([f64; 4]),
}

impl MembershipShape {
    /// 3 points make a triangle, 4 a trapezoid; anything else is rejected.
    pub fn from_points(label: &str, points: &[f64]) -> FeedResult<Self> {
        if points.iter().any(|p| !p.is_finite()) {
            return Err(FeedError::membership(
                label,
                format!("control points must be finite, got {points:?}"),
            ));
        }
        if points.windows(2).any(|w| w[0] > w[1]) {
            return Err(FeedError::membership(
                label,
                format!("control points must be non-decreasing, got {points:?}"),
            ));
        }
        match *points {
            [a, b, c] => Ok(Self::Triangular([a, b, c])),
            [a, b, c, d] => Ok(Self::Trapezoidal([a, b, c, d])),
            _ => Err(FeedError::membership(
                label,
                format!("expected 3 or 4 control points, got {}", points.len()),
            )),
        }
    }

    pub fn control_points(&self) -> Vec<f64> {
        match self {
            Self::Triangular(p) => p.to_vec(),
            Self::Trapezoidal(p) => p.to_vec(),
        }
    }

    /// Exact degree at `x`. Collapsed edges (`a == b`, `c == d`) are
    /// vertical: degree 1 on the edge itself, 0 just outside it.
    pub fn evaluate(&self, x: f64) -> f64 {
        match *self {
            Self::Triangular([a, b, c]) => triangular(x, a, b, c),
            Self::Trapezoidal([a, b, c, d]) => {
                if x < a || x > d {
                    0.0
                } else if x >= c {
                    triangular(x, c, c, d)
                } else if x <= b {
                    triangular(x, a, b, b)
                } else {
                    1.0
                }
            }
        }
    }
}

#[inline]
fn triangular(x: f64, a: f64, b: f64, c: f64) -> f64 {
    if x == b {
        1.0
    } else if a < x && x < b {
        (x - a) / (b - a)
    } else if b < x && x < c {
        (c - x) / (c - b)
    } else {
        0.0
    }
}

/// A fuzzy set pre-sampled over its variable's universe.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipCurve {
    shape: MembershipShape,
    universe: Universe,
    samples: Vec<f64>,
}

impl MembershipCurve {
    pub fn new(shape: MembershipShape, universe: &Universe) -> Self {
        let samples = universe
            .points()
            .iter()
            .map(|&u| clamp_degree(shape.evaluate(u)))
            .collect();
        Self {
            shape,
            universe: universe.clone(),
            samples,
        }
    }

    pub fn shape(&self) -> &MembershipShape {
        &self.shape
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Interpolated degree at an arbitrary crisp value.
    pub fn degree_at(&self, x: f64) -> f64 {
        clamp_degree(self.universe.interp(&self.samples, x))
    }

    /// Pointwise `min(strength, μ(u))`.
    pub fn clipped(&self, strength: f64) -> Vec<f64> {
        self.samples.iter().map(|&m| m.min(strength)).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub label: String,
    pub curve: MembershipCurve,
}

/// A named axis partitioned into fuzzy terms. Terms keep insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct LinguisticVariable {
    name: String,
    universe: Universe,
    terms: Vec<Term>,
}

impl LinguisticVariable {
    pub fn new(name: impl Into<String>, universe: Universe) -> Self {
        Self {
            name: name.into(),
            universe,
            terms: Vec::new(),
        }
    }

    pub fn from_range(name: impl Into<String>, low: f64, high: f64, step: f64) -> FeedResult<Self> {
        Ok(Self::new(name, Universe::arange(low, high, step)?))
    }

    /// Build from a universe spec and term list as found in `FeedConfig`.
    pub fn from_specs(
        name: impl Into<String>,
        universe: &UniverseSpec,
        terms: &[TermSpec],
    ) -> FeedResult<Self> {
        let mut var = Self::new(name, Universe::from_spec(universe)?);
        for term in terms {
            var.add_term(&term.label, &term.points)?;
        }
        Ok(var)
    }

    /// Add (or replace) a term from its control points.
    pub fn add_term(&mut self, label: &str, points: &[f64]) -> FeedResult<()> {
        let shape = MembershipShape::from_points(label, points)?;
        let curve = MembershipCurve::new(shape, &self.universe);
        match self.terms.iter_mut().find(|t| t.label == label) {
            Some(existing) => existing.curve = curve,
            None => self.terms.push(Term {
                label: label.to_string(),
                curve,
            }),
        }
        Ok(())
    }

    pub fn with_term(mut self, label: &str, points: &[f64]) -> FeedResult<Self> {
        self.add_term(label, points)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn has_term(&self, label: &str) -> bool {
        self.terms.iter().any(|t| t.label == label)
    }

    pub fn term(&self, label: &str) -> FeedResult<&MembershipCurve> {
        self.terms
            .iter()
            .find(|t| t.label == label)
            .map(|t| &t.curve)
            .ok_or_else(|| FeedError::unknown_term(&self.name, label))
    }

    pub fn degree_at(&self, label: &str, x: f64) -> FeedResult<f64> {
        Ok(self.term(label)?.degree_at(x))
    }

    /// Degree of `x` in every term, in term order.
    pub fn fuzzify(&self, x: f64) -> Vec<(String, f64)> {
        self.terms
            .iter()
            .map(|t| (t.label.clone(), t.curve.degree_at(x)))
            .collect()
    }

    /// Control points of every term, in term order.
    pub fn control_points(&self) -> Vec<(String, Vec<f64>)> {
        self.terms
            .iter()
            .map(|t| (t.label.clone(), t.curve.shape().control_points()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_arange_half_open() {
        let u = Universe::arange(0.0, 1.0, 0.25).unwrap();
        assert_eq!(u.points(), &[0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn test_arange_partial_step() {
        let u = Universe::arange(0.0, 1.0, 0.3).unwrap();
        assert_eq!(u.len(), 4);
        assert!(u.last() < 1.0);
    }

    #[test]
    fn test_arange_rejects_bad_step() {
        assert!(Universe::arange(0.0, 1.0, 0.0).is_err());
        assert!(Universe::arange(0.0, 1.0, -0.1).is_err());
        assert!(Universe::arange(0.0, 1.0, f64::NAN).is_err());
    }

    #[test]
    fn test_arange_rejects_empty_range() {
        assert!(matches!(
            Universe::arange(1.0, 1.0, 0.1),
            Err(FeedError::InvalidUniverse(_))
        ));
        assert!(Universe::arange(2.0, 1.0, 0.1).is_err());
    }

    #[test]
    fn test_arange_rejects_oversized_grid() {
        assert!(Universe::arange(0.0, 1.0e9, 1.0e-3).is_err());
    }

    #[test]
    fn test_arange_strictly_increasing() {
        let u = Universe::arange(14.0, 40.0, 0.001).unwrap();
        assert!(u.points().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(u.first(), 14.0);
        assert!(u.last() < 40.0);
    }

    #[test]
    fn test_interp_exact_and_between() {
        let u = Universe::arange(0.0, 3.0, 1.0).unwrap();
        let s = [0.0, 1.0, 0.5];
        assert_eq!(u.interp(&s, 1.0), 1.0);
        assert!(approx(u.interp(&s, 0.5), 0.5));
        assert!(approx(u.interp(&s, 1.5), 0.75));
    }

    #[test]
    fn test_interp_clamps_outside() {
        let u = Universe::arange(0.0, 3.0, 1.0).unwrap();
        let s = [0.2, 1.0, 0.5];
        assert_eq!(u.interp(&s, -10.0), 0.2);
        assert_eq!(u.interp(&s, 2.5), 0.5);
        assert_eq!(u.interp(&s, 99.0), 0.5);
    }

    #[test]
    fn test_singleton_interp() {
        let u = Universe::singleton(30.0).unwrap();
        assert_eq!(u.interp(&[1.0], 0.0), 1.0);
        assert_eq!(u.interp(&[1.0], 30.0), 1.0);
        assert_eq!(u.interp(&[1.0], 99.0), 1.0);
    }

    #[test]
    fn test_shape_arity() {
        assert!(matches!(
            MembershipShape::from_points("x", &[1.0, 2.0, 3.0]),
            Ok(MembershipShape::Triangular(_))
        ));
        assert!(matches!(
            MembershipShape::from_points("x", &[1.0, 2.0, 3.0, 4.0]),
            Ok(MembershipShape::Trapezoidal(_))
        ));
        assert!(matches!(
            MembershipShape::from_points("x", &[1.0, 2.0]),
            Err(FeedError::InvalidMembershipParams { .. })
        ));
        assert!(MembershipShape::from_points("x", &[1.0, 2.0, 3.0, 4.0, 5.0]).is_err());
    }

    #[test]
    fn test_shape_rejects_non_monotonic() {
        assert!(MembershipShape::from_points("x", &[3.0, 2.0, 4.0]).is_err());
        assert!(MembershipShape::from_points("x", &[1.0, 2.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_triangular_formula() {
        let s = MembershipShape::Triangular([0.0, 2.0, 4.0]);
        assert_eq!(s.evaluate(0.0), 0.0);
        assert_eq!(s.evaluate(2.0), 1.0);
        assert_eq!(s.evaluate(4.0), 0.0);
        assert!(approx(s.evaluate(1.0), 0.5));
        assert!(approx(s.evaluate(3.5), 0.25));
        assert_eq!(s.evaluate(-1.0), 0.0);
    }

    #[test]
    fn test_triangular_vertical_edge() {
        let s = MembershipShape::Triangular([0.0, 0.0, 4.0]);
        assert_eq!(s.evaluate(0.0), 1.0);
        assert_eq!(s.evaluate(-1e-9), 0.0);
        assert!(approx(s.evaluate(1.0), 0.75));
    }

    #[test]
    fn test_trapezoidal_formula() {
        let s = MembershipShape::Trapezoidal([5.0, 6.5, 7.5, 9.0]);
        assert_eq!(s.evaluate(5.0), 0.0);
        assert_eq!(s.evaluate(9.0), 0.0);
        assert_eq!(s.evaluate(6.5), 1.0);
        assert_eq!(s.evaluate(7.0), 1.0);
        assert_eq!(s.evaluate(7.5), 1.0);
        assert!(approx(s.evaluate(6.0), 2.0 / 3.0));
        assert!(approx(s.evaluate(8.0), 2.0 / 3.0));
    }

    #[test]
    fn test_trapezoidal_shoulders() {
        let left = MembershipShape::Trapezoidal([0.0, 0.0, 5.0, 6.5]);
        assert_eq!(left.evaluate(0.0), 1.0);
        assert_eq!(left.evaluate(5.0), 1.0);
        assert_eq!(left.evaluate(6.5), 0.0);
        let right = MembershipShape::Trapezoidal([7.5, 9.0, 14.0, 14.0]);
        assert_eq!(right.evaluate(14.0), 1.0);
        assert_eq!(right.evaluate(7.5), 0.0);
    }

    #[test]
    fn test_trapezoidal_point() {
        let s = MembershipShape::Trapezoidal([3.0, 3.0, 3.0, 3.0]);
        assert_eq!(s.evaluate(3.0), 1.0);
        assert_eq!(s.evaluate(3.0001), 0.0);
    }

    #[test]
    fn test_curve_degree_interpolates_samples() {
        let u = Universe::arange(0.0, 10.0, 1.0).unwrap();
        let c = MembershipCurve::new(MembershipShape::Triangular([0.0, 4.0, 8.0]), &u);
        assert_eq!(c.degree_at(4.0), 1.0);
        assert!(approx(c.degree_at(2.5), 0.625));
        assert_eq!(c.degree_at(-3.0), 0.0);
    }

    #[test]
    fn test_curve_clamps_to_last_sample() {
        // Half-open grid: 40 itself is not sampled, the last sample is 39.999.
        let var = LinguisticVariable::from_range("temperature", 14.0, 40.0, 0.001)
            .unwrap()
            .with_term("tinggi", &[29.0, 31.0, 40.0, 40.0])
            .unwrap();
        assert_eq!(var.degree_at("tinggi", 40.0).unwrap(), 1.0);
        assert_eq!(var.degree_at("tinggi", 55.0).unwrap(), 1.0);
    }

    #[test]
    fn test_clipped() {
        let u = Universe::arange(0.0, 5.0, 1.0).unwrap();
        let c = MembershipCurve::new(MembershipShape::Triangular([0.0, 2.0, 4.0]), &u);
        assert_eq!(c.clipped(0.5), vec![0.0, 0.5, 0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_variable_terms_and_lookup() {
        let var = LinguisticVariable::from_range("ph", 4.0, 14.0, 0.01)
            .unwrap()
            .with_term("asam", &[0.0, 0.0, 5.0, 6.5])
            .unwrap()
            .with_term("netral", &[5.0, 6.5, 7.5, 9.0])
            .unwrap();
        assert_eq!(var.terms().len(), 2);
        assert!(var.has_term("netral"));
        assert!(matches!(
            var.term("basa"),
            Err(FeedError::UnknownTerm { .. })
        ));
        let degrees = var.fuzzify(6.0);
        assert_eq!(degrees[0].0, "asam");
        assert!((degrees[0].1 - 1.0 / 3.0).abs() < 1e-6);
        assert!((degrees[1].1 - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_add_term_replaces() {
        let mut var = LinguisticVariable::from_range("x", 0.0, 10.0, 1.0).unwrap();
        var.add_term("a", &[0.0, 1.0, 2.0]).unwrap();
        var.add_term("a", &[5.0, 6.0, 7.0]).unwrap();
        assert_eq!(var.terms().len(), 1);
        assert_eq!(var.control_points()[0].1, vec![5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_add_term_bad_arity() {
        let mut var = LinguisticVariable::from_range("x", 0.0, 10.0, 1.0).unwrap();
        assert!(matches!(
            var.add_term("a", &[1.0]),
            Err(FeedError::InvalidMembershipParams { .. })
        ));
    }
}

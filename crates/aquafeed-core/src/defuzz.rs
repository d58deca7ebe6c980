// ─────────────────────────────────────────────────────────────────────
// AquaFeed — Defuzzification
// ─────────────────────────────────────────────────────────────────────
//! Centroid defuzzification and alpha-cut diagnostics over an aggregated
//! curve sampled on a universe.
//!
//! Alpha-cuts are diagnostic only and never feed back into the crisp value.

use aquafeed_types::{AggregateSummary, AlphaCut, RuleActivation};

/// `(Σ μ(u), Σ u·μ(u))`.
pub fn area_and_moment(universe: &[f64], curve: &[f64]) -> (f64, f64) {
    universe
        .iter()
        .zip(curve)
        .fold((0.0, 0.0), |(area, moment), (&u, &m)| {
            (area + m, moment + u * m)
        })
}

/// `Σ u·μ(u) / Σ μ(u)`.
///
/// Returns 0 when the curve is identically zero. That 0 is a fallback
/// only: callers must rule out the no-activation case before using it.
pub fn centroid(universe: &[f64], curve: &[f64]) -> f64 {
    let (area, moment) = area_and_moment(universe, curve);
    if area != 0.0 {
        moment / area
    } else {
        0.0
    }
}

pub fn summarize(universe: &[f64], curve: &[f64]) -> AggregateSummary {
    let (area, moment) = area_and_moment(universe, curve);
    let peak = curve.iter().copied().fold(0.0, f64::max);
    let first = curve.iter().position(|&m| m > 0.0);
    let last = curve.iter().rposition(|&m| m > 0.0);
    let support = match (first, last) {
        (Some(i), Some(j)) => Some((universe[i], universe[j])),
        _ => None,
    };
    AggregateSummary {
        area,
        moment,
        peak,
        support,
    }
}

/// Contiguous runs of samples with `μ >= alpha`, as
/// `(universe[run_start], universe[run_end])`.
pub fn alpha_cut(universe: &[f64], curve: &[f64], alpha: f64) -> Vec<(f64, f64)> {
    let mut intervals = Vec::new();
    let mut run_start: Option<usize> = None;
    for (i, &m) in curve.iter().enumerate() {
        match (m >= alpha, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                intervals.push((universe[start], universe[i - 1]));
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        intervals.push((universe[start], universe[curve.len() - 1]));
    }
    intervals
}

/// Distinct firing strengths among the activations, highest first.
pub fn alpha_levels(activations: &[RuleActivation]) -> Vec<f64> {
    let mut levels: Vec<f64> = activations.iter().map(|a| a.firing_strength).collect();
    levels.sort_by(|a, b| b.total_cmp(a));
    levels.dedup();
    levels
}

/// One cut per distinct firing strength, in descending level order.
pub fn alpha_cuts(
    universe: &[f64],
    curve: &[f64],
    activations: &[RuleActivation],
) -> Vec<AlphaCut> {
    alpha_levels(activations)
        .into_iter()
        .map(|level| AlphaCut {
            level,
            intervals: alpha_cut(universe, curve, level),
        })
        .collect()
}

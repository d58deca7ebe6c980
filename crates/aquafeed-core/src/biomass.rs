// ─────────────────────────────────────────────────────────────────────
// AquaFeed — Weekly Biomass Provider
// ─────────────────────────────────────────────────────────────────────
//! Resolves the summed stock weight for the week containing a timestamp.
//!
//! Biomass is sampled once a week; every reading within a week uses that
//! week's total. Readings past the last sampled week reuse the last total.

use chrono::NaiveDateTime;

use aquafeed_types::{FeedError, FeedResult};

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyBiomass {
    start: NaiveDateTime,
    totals: Vec<f64>,
}

impl WeeklyBiomass {
    /// `totals[k]` is the summed biomass of week `k` counted from `start`.
    pub fn new(start: NaiveDateTime, totals: Vec<f64>) -> FeedResult<Self> {
        if totals.is_empty() {
            return Err(FeedError::Config(
                "weekly biomass needs at least one week".into(),
            ));
        }
        if let Some((week, w)) = totals
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(FeedError::Config(format!(
                "week {week} biomass must be finite and >= 0, got {w}"
            )));
        }
        Ok(Self { start, totals })
    }

    /// Build from individual weighings per week (e.g. one per animal).
    pub fn from_samples(start: NaiveDateTime, weeks: &[Vec<f64>]) -> FeedResult<Self> {
        Self::new(start, weeks.iter().map(|w| w.iter().sum()).collect())
    }

    pub fn weeks(&self) -> usize {
        self.totals.len()
    }

    /// `floor(days_since_start / 7)`, clamped into the sampled weeks.
    pub fn week_index(&self, at: NaiveDateTime) -> usize {
        let days = (at - self.start).num_days();
        if days < 0 {
            return 0;
        }
        ((days / 7) as usize).min(self.totals.len() - 1)
    }

    pub fn weight_at(&self, at: NaiveDateTime) -> f64 {
        self.totals[self.week_index(at)]
    }
}

// ─────────────────────────────────────────────────────────────────────
// AquaFeed — Dynamic Feed-Amount Variable
// ─────────────────────────────────────────────────────────────────────
//! Per-observation construction of the output variable.
//!
//! The feed range `[min_feed, max_feed]` follows biomass, so the output
//! variable is rebuilt for every observation from the current bounds:
//!
//! ```text
//!   step = (max_feed - min_feed) / 8
//!
//!   sedikit  [0, 0, 2, 3] ─┐
//!   sedang   [2, 3, 5, 6]  ├─ × step + min_feed
//!   banyak   [5, 7, 8, 8] ─┘
//! ```

use aquafeed_types::{FeedConfig, FeedError, FeedResult};

use crate::membership::{LinguisticVariable, Universe, MAX_UNIVERSE_SAMPLES};

/// Name of the output variable.
pub const FEED_VARIABLE: &str = "takaran";

/// Number of equal sub-units the feed range is split into.
pub const FEED_SUBDIVISIONS: f64 = 8.0;

/// Trapezoid control points in sub-units from `min_feed`.
pub const FEED_LAYOUT: [(&str, [f64; 4]); 3] = [
    ("sedikit", [0.0, 0.0, 2.0, 3.0]),
    ("sedang", [2.0, 3.0, 5.0, 6.0]),
    ("banyak", [5.0, 7.0, 8.0, 8.0]),
];

/// `(weight × min_multiplier, weight × max_multiplier)`.
pub fn feed_bounds(
    weight: f64,
    min_multiplier: f64,
    max_multiplier: f64,
) -> FeedResult<(f64, f64)> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(FeedError::InvalidBounds {
            min: weight * min_multiplier,
            max: weight * max_multiplier,
        });
    }
    let bounds = (weight * min_multiplier, weight * max_multiplier);
    if bounds.0 > bounds.1 {
        return Err(FeedError::InvalidBounds {
            min: bounds.0,
            max: bounds.1,
        });
    }
    Ok(bounds)
}

/// Builds the feed-amount variable from the current feed bounds.
///
/// The grid step is `resolution` unless the feed range would need more
/// than `max_samples` points; it is then coarsened by powers of ten.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsequentBuilder {
    resolution: f64,
    max_samples: usize,
}

impl Default for ConsequentBuilder {
    fn default() -> Self {
        Self {
            resolution: 0.001,
            max_samples: MAX_UNIVERSE_SAMPLES,
        }
    }
}

impl ConsequentBuilder {
    pub fn new(resolution: f64) -> FeedResult<Self> {
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(FeedError::Config(format!(
                "feed resolution must be > 0, got {resolution}"
            )));
        }
        Ok(Self {
            resolution,
            max_samples: MAX_UNIVERSE_SAMPLES,
        })
    }

    /// Cap on feed grid samples, at most `MAX_UNIVERSE_SAMPLES`.
    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples.clamp(1, MAX_UNIVERSE_SAMPLES);
        self
    }

    pub fn from_config(config: &FeedConfig) -> FeedResult<Self> {
        Self::new(config.feed_resolution)
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Grid step used for a feed range of width `span`.
    pub fn step_for(&self, span: f64) -> f64 {
        let mut step = self.resolution;
        if !span.is_finite() {
            return step;
        }
        while span / step > self.max_samples as f64 {
            step *= 10.0;
        }
        if step != self.resolution {
            log::debug!(
                "feed range {span} exceeds {} samples at {}, using step {step}",
                self.max_samples,
                self.resolution
            );
        }
        step
    }

    /// Absolute control points of the three feed terms.
    pub fn layout(min_feed: f64, max_feed: f64) -> [(&'static str, [f64; 4]); 3] {
        let step = (max_feed - min_feed) / FEED_SUBDIVISIONS;
        FEED_LAYOUT.map(|(label, fractions)| (label, fractions.map(|f| min_feed + f * step)))
    }

    /// Fresh output variable over `[min_feed, max_feed)`.
    ///
    /// Equal bounds are legal: the universe collapses to the single sample
    /// `min_feed`, where all three terms have degree 1.
    pub fn build(&self, min_feed: f64, max_feed: f64) -> FeedResult<LinguisticVariable> {
        if !min_feed.is_finite() || !max_feed.is_finite() || min_feed > max_feed {
            return Err(FeedError::InvalidBounds {
                min: min_feed,
                max: max_feed,
            });
        }
        let universe = if min_feed == max_feed {
            Universe::singleton(min_feed)?
        } else {
            Universe::arange(min_feed, max_feed, self.step_for(max_feed - min_feed))?
        };
        let mut var = LinguisticVariable::new(FEED_VARIABLE, universe);
        for (label, points) in Self::layout(min_feed, max_feed) {
            var.add_term(label, &points)?;
        }
        Ok(var)
    }
}

// ─────────────────────────────────────────────────────────────────────
// AquaFeed — Fuzzy Feed Kernel Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! AquaFeed kernel — Mamdani fuzzy feed dosing from water temperature,
//! pH and biomass.

pub mod config;
pub mod error;
pub mod record;

pub use config::{FeedConfig, TermSpec, UniverseSpec};
pub use error::{FeedError, FeedResult};
pub use record::{
    AggregateSummary, AlphaCut, FeedStatus, InferenceResult, Observation, RuleActivation,
};

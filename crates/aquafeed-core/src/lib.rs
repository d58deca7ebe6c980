// ─────────────────────────────────────────────────────────────────────
// AquaFeed — Fuzzy Feed Kernel Core Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Mamdani fuzzy inference turning water temperature, pH and weekly
//! biomass into a recommended feed dose, with an auditable trail of
//! intermediate degrees.
//!
//! # Invariants
//!
//! 1. **Degrees stay in [0, 1]**: every sampled curve and every
//!    interpolated lookup passes through `clamp_degree`.
//!
//! 2. **Zero feed is not undefined feed**: when no rule fires the record
//!    carries `FeedStatus::NoRuleActivated` and no feed amount, even though
//!    the centroid fallback of an all-zero curve is 0.
//!
//! 3. **Observations are independent**: the output variable is rebuilt
//!    from each observation's biomass by a pure builder; the input
//!    variables and rule base are read-only after construction.
//!
//! 4. **One bad record never aborts a batch**: missing inputs, invalid
//!    bounds and panics inside a single evaluation all degrade to a gap
//!    record, and batch output order always matches input order.

pub mod biomass;
pub mod consequent;
pub mod controller;
pub mod defuzz;
pub mod engine;
pub mod membership;
pub mod rules;

pub use biomass::WeeklyBiomass;
pub use consequent::{feed_bounds, ConsequentBuilder, FEED_LAYOUT, FEED_VARIABLE};
pub use controller::{FeedController, RunStats};
pub use defuzz::{alpha_cut, alpha_cuts, centroid};
pub use engine::InferenceEngine;
pub use membership::{LinguisticVariable, MembershipCurve, MembershipShape, Universe};
pub use rules::{Rule, RuleBase, STANDARD_RULES};

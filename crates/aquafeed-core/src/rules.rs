// ─────────────────────────────────────────────────────────────────────
// AquaFeed — Rule Base
// ─────────────────────────────────────────────────────────────────────
//! Conjunctive rules `temperature_term AND ph_term → feed_term`.
//!
//! The standard table:
//!
//! | temp \ pH | asam    | netral | basa    |
//! |-----------|---------|--------|---------|
//! | rendah    | sedikit | sedang | sedikit |
//! | normal    | sedang  | banyak | sedang  |
//! | tinggi    | sedikit | sedang | sedikit |

use std::collections::BTreeMap;

use aquafeed_types::{FeedError, FeedResult, RuleActivation};

use crate::membership::LinguisticVariable;

/// `(temperature_term, ph_term, feed_term)`, labelled `Rule 1..=9` in order.
pub const STANDARD_RULES: [(&str, &str, &str); 9] = [
    ("normal", "asam", "sedang"),
    ("normal", "netral", "banyak"),
    ("normal", "basa", "sedang"),
    ("rendah", "asam", "sedikit"),
    ("rendah", "netral", "sedang"),
    ("rendah", "basa", "sedikit"),
    ("tinggi", "asam", "sedikit"),
    ("tinggi", "netral", "sedang"),
    ("tinggi", "basa", "sedikit"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub label: String,
    pub temperature_term: String,
    pub ph_term: String,
    pub consequent: String,
}

impl Rule {
    pub fn new(
        label: impl Into<String>,
        temperature_term: impl Into<String>,
        ph_term: impl Into<String>,
        consequent: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            temperature_term: temperature_term.into(),
            ph_term: ph_term.into(),
            consequent: consequent.into(),
        }
    }
}

/// Immutable rule set, built once and shared by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleBase {
    rules: Vec<Rule>,
}

impl Default for RuleBase {
    fn default() -> Self {
        Self::standard()
    }
}

impl RuleBase {
    /// The fixed 9-rule aquaculture table.
    pub fn standard() -> Self {
        let rules = STANDARD_RULES
            .iter()
            .enumerate()
            .map(|(i, (t, p, f))| Rule::new(format!("Rule {}", i + 1), *t, *p, *f))
            .collect();
        Self { rules }
    }

    pub fn new(rules: Vec<Rule>) -> FeedResult<Self> {
        if rules.is_empty() {
            return Err(FeedError::Config("rule base must not be empty".into()));
        }
        for (i, rule) in rules.iter().enumerate() {
            if rules[..i].iter().any(|r| r.label == rule.label) {
                return Err(FeedError::Config(format!(
                    "duplicate rule label '{}'",
                    rule.label
                )));
            }
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every antecedent term must exist in the fixed input variables.
    pub fn validate_antecedents(
        &self,
        temperature: &LinguisticVariable,
        ph: &LinguisticVariable,
    ) -> FeedResult<()> {
        for rule in &self.rules {
            if !temperature.has_term(&rule.temperature_term) {
                return Err(FeedError::unknown_term(
                    temperature.name(),
                    &rule.temperature_term,
                ));
            }
            if !ph.has_term(&rule.ph_term) {
                return Err(FeedError::unknown_term(ph.name(), &rule.ph_term));
            }
        }
        Ok(())
    }

    /// Every consequent term must exist in the per-observation feed variable.
    pub fn validate_consequents(&self, feed: &LinguisticVariable) -> FeedResult<()> {
        match self.rules.iter().find(|r| !feed.has_term(&r.consequent)) {
            Some(rule) => Err(FeedError::unknown_term(feed.name(), &rule.consequent)),
            None => Ok(()),
        }
    }

    /// Firing strength `min(temp, ph)` per rule; rules at 0 are left out.
    ///
    /// Degree maps are keyed by term label of the matching variable.
    pub fn evaluate(
        &self,
        temperature: &LinguisticVariable,
        temperature_degrees: &BTreeMap<String, f64>,
        ph: &LinguisticVariable,
        ph_degrees: &BTreeMap<String, f64>,
    ) -> FeedResult<Vec<RuleActivation>> {
        let mut activated = Vec::new();
        for rule in &self.rules {
            let temperature_degree = *temperature_degrees
                .get(&rule.temperature_term)
                .ok_or_else(|| {
                    FeedError::unknown_term(temperature.name(), &rule.temperature_term)
                })?;
            let ph_degree = *ph_degrees
                .get(&rule.ph_term)
                .ok_or_else(|| FeedError::unknown_term(ph.name(), &rule.ph_term))?;
            let firing_strength = temperature_degree.min(ph_degree);
            if firing_strength > 0.0 {
                activated.push(RuleActivation {
                    label: rule.label.clone(),
                    temperature_term: rule.temperature_term.clone(),
                    ph_term: rule.ph_term.clone(),
                    temperature_degree,
                    ph_degree,
                    firing_strength,
                    consequent: rule.consequent.clone(),
                });
            }
        }
        Ok(activated)
    }
}

//! Per-model token pricing

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cost information for a model (dollars per million tokens)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostInfo {
    pub input: f64,
    pub output: f64,
}

impl CostInfo {
    pub const fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }
}

/// Built-in rates, current as of the gpt-4o-2024-11-20 release
const BUILTIN_RATES: &[(&str, CostInfo)] = &[
    ("gpt-4o-2024-11-20", CostInfo::new(2.50, 10.00)),
    ("gpt-4o-mini-2024-07-18", CostInfo::new(0.150, 0.150)),
];

/// Mapping from model identifier to its token rates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostRateTable {
    rates: BTreeMap<String, CostInfo>,
}

impl CostRateTable {
    /// An empty table (every model costs zero and logs an error)
    pub fn new() -> Self {
        Self::default()
    }

    /// The table shipped with the application
    pub fn builtin() -> Self {
        let rates = BUILTIN_RATES
            .iter()
            .map(|(id, cost)| (id.to_string(), *cost))
            .collect();
        Self { rates }
    }

    /// Add or replace the rates for a model
    pub fn insert(&mut self, model: impl Into<String>, cost: CostInfo) {
        self.rates.insert(model.into(), cost);
    }

    /// Overlay another table on top of this one
    pub fn merge(&mut self, overrides: &CostRateTable) {
        for (model, cost) in &overrides.rates {
            self.rates.insert(model.clone(), *cost);
        }
    }

    pub fn get(&self, model: &str) -> Option<&CostInfo> {
        self.rates.get(model)
    }

    pub fn contains(&self, model: &str) -> bool {
        self.rates.contains_key(model)
    }

    /// Model identifiers in the table, sorted
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.rates.keys().map(String::as_str)
    }

    /// Dollar cost of one completion. Unknown models cost nothing.
    pub fn calculate_cost(&self, model: &str, prompt_tokens: u32, completion_tokens: u32) -> f64 {
        let Some(cost) = self.rates.get(model) else {
            tracing::error!(model, "Unknown model: no rates configured, reporting zero cost");
            return 0.0;
        };

        let input = (prompt_tokens as f64 / 1_000_000.0) * cost.input;
        let output = (completion_tokens as f64 / 1_000_000.0) * cost.output;
        input + output
    }
}

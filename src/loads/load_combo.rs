//! Load combinations: a factored sum of load cases for ULS/SLS verification.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombinationType {
    Uls,
    Sls,
}

/// `factors` maps load case id to its factor in this combination; a `BTreeMap`
/// keeps iteration order deterministic for reproducible superposition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadCombination {
    pub id: u64,
    pub name: String,
    pub combo_type: CombinationType,
    pub factors: BTreeMap<u64, f64>,
}

impl LoadCombination {
    pub fn new(id: u64, name: impl Into<String>, combo_type: CombinationType) -> Self {
        Self { id, name: name.into(), combo_type, factors: BTreeMap::new() }
    }

    pub fn with_factor(mut self, load_case_id: u64, factor: f64) -> Self {
        self.factors.insert(load_case_id, factor);
        self
    }

    pub fn factor(&self, load_case_id: u64) -> f64 {
        *self.factors.get(&load_case_id).unwrap_or(&0.0)
    }

    pub fn includes(&self, load_case_id: u64) -> bool {
        self.factors.get(&load_case_id).is_some_and(|f| f.abs() > 1e-10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_defaults_to_zero_for_unlisted_case() {
        let combo = LoadCombination::new(1, "1.35D + 1.5L", CombinationType::Uls)
            .with_factor(1, 1.35)
            .with_factor(2, 1.5);
        assert_eq!(combo.factor(1), 1.35);
        assert_eq!(combo.factor(99), 0.0);
        assert!(!combo.includes(99));
    }
}

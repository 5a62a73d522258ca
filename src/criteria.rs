pub mod ahp;
pub mod topsis;

use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::weights::{CriterionMap, WeightMap};

pub const YIELD_POTENTIAL: &str = "yield_potential";
pub const QUALITY_ATTRIBUTES: &str = "quality_attributes";
pub const DISEASE_RESISTANCE: &str = "disease_resistance";
pub const CLIMATE_ADAPTATION: &str = "climate_adaptation";
pub const MARKET_DESIRABILITY: &str = "market_desirability";
pub const MANAGEMENT_EASE: &str = "management_ease";
pub const RISK_TOLERANCE: &str = "risk_tolerance";

/// The fixed sequence of criterion names. Every weight vector and score row in a ranking call is
/// indexed by this order.
#[derive(Clone, PartialEq, Eq)]
pub struct Criteria(Arc<[String]>);

impl Criteria {
    /// Criteria in the key order of `weights`.
    pub fn of(weights: &WeightMap) -> Self {
        Self(weights.criteria().map(str::to_owned).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.to_vec()
    }

    /// Values of `map` in criteria order. Missing criteria read as 0.
    pub fn align(&self, map: &CriterionMap) -> Vec<f64> {
        self.iter().map(|c| map.get(c).unwrap_or(0.0)).collect()
    }

    /// Pair an index-aligned vector back up with criterion names.
    pub fn label(&self, values: &[f64]) -> CriterionMap {
        self.iter().zip(values.iter().copied()).collect()
    }
}

impl std::fmt::Debug for Criteria {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl Serialize for Criteria {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

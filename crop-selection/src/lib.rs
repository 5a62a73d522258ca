use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use decision_engine::criteria::{
    CLIMATE_ADAPTATION, DISEASE_RESISTANCE, MANAGEMENT_EASE, MARKET_DESIRABILITY,
    QUALITY_ATTRIBUTES, RISK_TOLERANCE, YIELD_POTENTIAL,
};
pub use decision_engine::{
    Engine, FarmerPreferences, Normalized, PrimaryFocus, RankingResult, RegionalContext,
    RiskAttitude, WeightMap,
};


/// Base weights for crop variety selection, in criteria order.
pub const DEFAULT_BASE_WEIGHTS: [(&str, f64); 7] = [
    (YIELD_POTENTIAL, 0.25),
    (DISEASE_RESISTANCE, 0.20),
    (CLIMATE_ADAPTATION, 0.15),
    (QUALITY_ATTRIBUTES, 0.12),
    (MARKET_DESIRABILITY, 0.10),
    (RISK_TOLERANCE, 0.10),
    (MANAGEMENT_EASE, 0.08),
];

pub fn default_base_weights() -> WeightMap {
    DEFAULT_BASE_WEIGHTS.into_iter().collect()
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub base_weights: WeightMap,
    /// Number of varieties returned by [`recommend`].
    pub shortlist_len: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            base_weights: default_base_weights(),
            shortlist_len: 5,
        }
    }
}

impl SelectionConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config: Self = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        info!(
            path = %path.display(),
            criteria = config.base_weights.len(),
            "loaded selection config"
        );
        Ok(config)
    }

    pub fn engine(&self) -> Engine {
        Engine::new(self.base_weights.clone())
    }
}

/// A crop variety with its criterion scores already computed, each in [0, 1] with higher being
/// better. Criteria the variety has no score for count as 0.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Variety {
    pub name: String,
    pub yield_potential: Option<f64>,
    pub quality_attributes: Option<f64>,
    pub disease_resistance: Option<f64>,
    pub climate_adaptation: Option<f64>,
    pub market_desirability: Option<f64>,
    pub management_ease: Option<f64>,
    pub risk_tolerance: Option<f64>,
    /// Overall suitability reported when a variety is the only option.
    pub baseline_suitability: Option<f64>,
}

impl Variety {
    pub fn score(&self, criterion: &str) -> Option<f64> {
        match criterion {
            YIELD_POTENTIAL => self.yield_potential,
            QUALITY_ATTRIBUTES => self.quality_attributes,
            DISEASE_RESISTANCE => self.disease_resistance,
            CLIMATE_ADAPTATION => self.climate_adaptation,
            MARKET_DESIRABILITY => self.market_desirability,
            MANAGEMENT_EASE => self.management_ease,
            RISK_TOLERANCE => self.risk_tolerance,
            _ => None,
        }
    }

    pub fn score_mut(&mut self, criterion: &str) -> Option<&mut Option<f64>> {
        match criterion {
            YIELD_POTENTIAL => Some(&mut self.yield_potential),
            QUALITY_ATTRIBUTES => Some(&mut self.quality_attributes),
            DISEASE_RESISTANCE => Some(&mut self.disease_resistance),
            CLIMATE_ADAPTATION => Some(&mut self.climate_adaptation),
            MARKET_DESIRABILITY => Some(&mut self.market_desirability),
            MANAGEMENT_EASE => Some(&mut self.management_ease),
            RISK_TOLERANCE => Some(&mut self.risk_tolerance),
            _ => None,
        }
    }
}

impl decision_engine::Candidate for Variety {
    type Id = String;

    fn id(&self) -> Self::Id {
        self.name.clone()
    }

    fn criterion_score(&self, criterion: &str) -> Option<f64> {
        self.score(criterion)
    }

    fn baseline_score(&self) -> Option<f64> {
        self.baseline_suitability
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recommendation {
    pub name: String,
    pub rank: usize,
    pub closeness: Normalized,
}

/// Rank `varieties` and return the best `config.shortlist_len` of them, best first.
pub fn recommend(
    config: &SelectionConfig,
    engine: &Engine,
    varieties: &[Variety],
    context: Option<&RegionalContext>,
    preferences: Option<&FarmerPreferences>,
) -> Vec<Recommendation> {
    let result = engine.rank(varieties, context, preferences);
    debug!(
        consistency_ratio = result.consistency_ratio,
        varieties = result.results.len(),
        "ranked varieties"
    );
    result
        .ranked()
        .into_iter()
        .take(config.shortlist_len)
        .map(|(name, ranking)| Recommendation {
            name: name.clone(),
            rank: ranking.rank,
            closeness: ranking.closeness,
        })
        .collect()
}

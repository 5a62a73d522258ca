use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::context::{adjust, FarmerPreferences, RegionalContext};
use crate::criteria::{ahp, topsis, Criteria};
use crate::num::{finite, Normalized};
use crate::rank::assign_ranks;
use crate::weights::{CriterionMap, WeightMap};
use crate::{Candidate, Result};

/// Immutable base weight configuration together with the criteria order derived from it.
#[derive(Clone, Debug, PartialEq)]
pub struct BaseWeights {
    criteria: Criteria,
    weights: WeightMap,
}

impl BaseWeights {
    pub fn new(weights: WeightMap) -> Self {
        Self {
            criteria: Criteria::of(&weights),
            weights,
        }
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub fn weights(&self) -> &WeightMap {
        &self.weights
    }
}

/// Ranks candidates against a fixed criteria order.
///
/// The base weights live in a shared snapshot. Each ranking call holds on to the snapshot it
/// started with, and [`Engine::update_weights`] installs a new one instead of mutating it, so
/// clones of an engine never observe a partially updated configuration.
#[derive(Clone, Debug)]
pub struct Engine {
    base: Arc<BaseWeights>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CandidateRanking {
    pub closeness: Normalized,
    pub rank: usize,
    pub weighted_scores: CriterionMap,
}

/// Output of a single ranking call, including the intermediate vectors used to produce it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankingResult<Id: Ord> {
    pub results: BTreeMap<Id, CandidateRanking>,
    pub criteria: Vec<String>,
    /// Contextual weights after normalization.
    pub contextual_weights: WeightMap,
    /// AHP-derived weights, the ones applied to candidate scores.
    pub weights: WeightMap,
    pub ideal_best: CriterionMap,
    pub ideal_worst: CriterionMap,
    pub consistency_ratio: f64,
}

impl<Id: Ord> RankingResult<Id> {
    /// Candidates ordered by rank, ties by id.
    pub fn ranked(&self) -> Vec<(&Id, &CandidateRanking)> {
        let mut ranked: Vec<(&Id, &CandidateRanking)> = self.results.iter().collect();
        ranked.sort_by_key(|(_, ranking)| ranking.rank);
        ranked
    }

    pub fn best(&self) -> Option<(&Id, &CandidateRanking)> {
        self.ranked().into_iter().next()
    }
}

impl Engine {
    pub fn new(base_weights: WeightMap) -> Self {
        Self {
            base: Arc::new(BaseWeights::new(base_weights)),
        }
    }

    /// Build from an explicit list of criterion weights. Repeated criteria are rejected.
    pub fn from_entries<I, K>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Ok(Self::new(WeightMap::from_entries(entries)?))
    }

    /// Build from a JSON object of criterion weights, keeping the document's key order.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Ok(Self::new(crate::input::parse_base_weights(&value)?))
    }

    pub fn criteria(&self) -> &Criteria {
        self.base.criteria()
    }

    pub fn base_weights(&self) -> &WeightMap {
        self.base.weights()
    }

    pub fn snapshot(&self) -> Arc<BaseWeights> {
        Arc::clone(&self.base)
    }

    /// Replace the base weights wholesale and re-derive the criteria order from them.
    pub fn update_weights(&mut self, base_weights: WeightMap) {
        debug!(criteria = base_weights.len(), "replacing base weights");
        self.base = Arc::new(BaseWeights::new(base_weights));
    }

    /// Rank `candidates` given the optional regional context and farmer preferences.
    ///
    /// Candidates sharing an id collapse to the last one given. With no candidates the weights
    /// are still derived. A lone candidate skips TOPSIS: it scores its baseline (or 1 when the
    /// baseline is missing or outside [0, 1]) and its breakdown is the raw `score × weight`.
    pub fn rank<C>(
        &self,
        candidates: &[C],
        context: Option<&RegionalContext>,
        preferences: Option<&FarmerPreferences>,
    ) -> RankingResult<C::Id>
    where
        C: Candidate,
    {
        let base = self.snapshot();
        let criteria = base.criteria();

        let contextual_weights = adjust(base.weights(), context, preferences);
        let matrix = ahp::pairwise_matrix(&contextual_weights, criteria);
        let weight_vector = ahp::priority_vector(&matrix);
        let consistency_ratio = ahp::consistency_ratio(&matrix, &weight_vector);

        let candidates: BTreeMap<C::Id, &C> = candidates.iter().map(|c| (c.id(), c)).collect();
        debug!(
            candidates = candidates.len(),
            criteria = criteria.len(),
            "ranking candidates"
        );

        let mut result = RankingResult {
            results: BTreeMap::new(),
            criteria: criteria.to_vec(),
            contextual_weights,
            weights: criteria.label(&weight_vector),
            ideal_best: CriterionMap::new(),
            ideal_worst: CriterionMap::new(),
            consistency_ratio,
        };

        match candidates.len() {
            0 => {}
            1 => {
                for (id, candidate) in candidates {
                    let closeness = candidate
                        .baseline_score()
                        .and_then(Normalized::new)
                        .unwrap_or(Normalized::ONE);
                    let weighted: Vec<f64> = score_row(candidate, criteria)
                        .iter()
                        .zip(&weight_vector)
                        .map(|(score, weight)| score * weight)
                        .collect();
                    result.results.insert(
                        id,
                        CandidateRanking {
                            closeness,
                            rank: 1,
                            weighted_scores: criteria.label(&weighted),
                        },
                    );
                }
            }
            _ => {
                let matrix: Vec<Vec<f64>> = candidates
                    .values()
                    .map(|candidate| score_row(*candidate, criteria))
                    .collect();
                let scored = topsis::score(&matrix, &weight_vector);
                let closeness: BTreeMap<C::Id, Normalized> = candidates
                    .keys()
                    .cloned()
                    .zip(scored.closeness.iter().copied().map(Normalized::saturating))
                    .collect();
                // All three iterate in id order.
                let ranks = assign_ranks(&closeness);
                for (((id, closeness), rank), weighted) in closeness
                    .into_iter()
                    .zip(ranks.into_values())
                    .zip(&scored.weighted)
                {
                    result.results.insert(
                        id,
                        CandidateRanking {
                            closeness,
                            rank,
                            weighted_scores: criteria.label(weighted),
                        },
                    );
                }
                result.ideal_best = criteria.label(&scored.ideal_best);
                result.ideal_worst = criteria.label(&scored.ideal_worst);
            }
        }
        result
    }
}

fn score_row<C: Candidate>(candidate: &C, criteria: &Criteria) -> Vec<f64> {
    criteria
        .iter()
        .map(|c| candidate.criterion_score(c).and_then(finite).unwrap_or(0.0))
        .collect()
}

//! Multi-criteria ranking of candidate options.
//!
//! Base weights are adjusted to the situation at hand ([`context::adjust`]), turned into a
//! consistent weight vector through the Analytic Hierarchy Process ([`criteria::ahp`]), and
//! candidates are then scored by their closeness to an ideal solution with TOPSIS
//! ([`criteria::topsis`]) before receiving competition ranks ([`rank::assign_ranks`]).

pub mod context;
pub mod criteria;
mod engine;
pub mod input;
pub mod num;
pub mod rank;
#[cfg(test)]
mod test;
pub mod weights;

pub use crate::context::{FarmerPreferences, PrimaryFocus, RegionalContext, RiskAttitude};
pub use crate::criteria::Criteria;
pub use crate::engine::{BaseWeights, CandidateRanking, Engine, RankingResult};
pub use crate::input::{CandidateInput, RankRequest};
pub use crate::num::{Normalized, Weight};
pub use crate::weights::{CriterionMap, WeightMap};

/// An option to be ranked. Scores are looked up by criterion name; `None` (or a non-finite
/// value) counts as a score of 0.
pub trait Candidate {
    type Id: Clone + Ord;
    fn id(&self) -> Self::Id;
    fn criterion_score(&self, criterion: &str) -> Option<f64>;
    /// Score reported when this is the only candidate in a ranking call.
    fn baseline_score(&self) -> Option<f64> {
        None
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("criterion {0:?} appears more than once")]
    DuplicateCriterion(String),
    #[error("candidates must be an array, got {0}")]
    CandidatesNotArray(&'static str),
    #[error("candidate at index {0} must be an object")]
    CandidateNotObject(usize),
    #[error("candidate at index {0} has no string or numeric id")]
    MissingCandidateId(usize),
    #[error("base weights must be an object of criterion names to numbers")]
    BaseWeightsNotObject,
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

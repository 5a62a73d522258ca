//! Conversion of loosely typed JSON payloads into the strict inputs of the ranking core.
//!
//! Only the overall shape is enforced: the candidates argument must be an array of objects with
//! an id, and base weights must be an object. Anywhere a number is expected, a value that is not a
//! finite number is dropped as if it had been absent.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::context::{FarmerPreferences, RegionalContext};
use crate::num::finite;
use crate::weights::{CriterionMap, WeightMap};
use crate::{Candidate, Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CandidateInput {
    pub id: String,
    pub scores: CriterionMap,
    pub baseline_score: Option<f64>,
}

impl Candidate for CandidateInput {
    type Id = String;

    fn id(&self) -> Self::Id {
        self.id.clone()
    }

    fn criterion_score(&self, criterion: &str) -> Option<f64> {
        self.scores.get(criterion)
    }

    fn baseline_score(&self) -> Option<f64> {
        self.baseline_score
    }
}

/// A complete `rank` call as received over a serialization boundary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RankRequest {
    pub candidates: Vec<CandidateInput>,
    pub regional_context: Option<RegionalContext>,
    pub farmer_preferences: Option<FarmerPreferences>,
}

impl RankRequest {
    /// Parse `{"candidates": [...], "regional_context": {...}, "farmer_preferences": {...}}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let candidates = parse_candidates(&value["candidates"])?;
        Ok(Self {
            candidates,
            regional_context: value
                .get("regional_context")
                .and_then(Value::as_object)
                .map(parse_context),
            farmer_preferences: value
                .get("farmer_preferences")
                .and_then(Value::as_object)
                .map(parse_preferences),
        })
    }
}

pub fn parse_candidates(value: &Value) -> Result<Vec<CandidateInput>> {
    let items = value
        .as_array()
        .ok_or_else(|| Error::CandidatesNotArray(type_name(value)))?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_candidate(index, item))
        .collect()
}

fn parse_candidate(index: usize, value: &Value) -> Result<CandidateInput> {
    let object = value.as_object().ok_or(Error::CandidateNotObject(index))?;
    let id = match object.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => return Err(Error::MissingCandidateId(index)),
    };
    let scores = object
        .get("scores")
        .and_then(Value::as_object)
        .map(numeric_entries)
        .unwrap_or_default();
    Ok(CandidateInput {
        id,
        scores,
        baseline_score: object.get("baseline_score").and_then(number),
    })
}

/// Reads `climate_risks`, `regional_priorities.market_focus` and
/// `soil_constraints.management_pressure`. Everything else is ignored.
pub fn parse_context(object: &Map<String, Value>) -> RegionalContext {
    let climate_risks: BTreeMap<String, f64> = object
        .get("climate_risks")
        .and_then(Value::as_object)
        .map(|risks| {
            numeric_entries(risks)
                .iter()
                .map(|(name, value)| (name.to_owned(), value))
                .collect()
        })
        .unwrap_or_default();
    RegionalContext {
        climate_risks,
        market_focus: nested_number(object, "regional_priorities", "market_focus"),
        management_pressure: nested_number(object, "soil_constraints", "management_pressure"),
    }
}

/// Reads `weight_overrides`, `primary_focus`, `risk_attitude` and `sustainability_priority`.
/// Unknown labels are dropped.
pub fn parse_preferences(object: &Map<String, Value>) -> FarmerPreferences {
    let label = |key: &str| object.get(key).and_then(Value::as_str);
    FarmerPreferences {
        weight_overrides: object
            .get("weight_overrides")
            .and_then(Value::as_object)
            .map(numeric_entries)
            .unwrap_or_default(),
        primary_focus: label("primary_focus").and_then(|l| {
            l.parse()
                .map_err(|err| debug!(%err, "ignoring primary focus"))
                .ok()
        }),
        risk_attitude: label("risk_attitude").and_then(|l| {
            l.parse()
                .map_err(|err| debug!(%err, "ignoring risk attitude"))
                .ok()
        }),
        sustainability_priority: object.get("sustainability_priority").and_then(number),
    }
}

/// Base weights from a JSON object, in key order. Non-numeric weights read as 0.
pub fn parse_base_weights(value: &Value) -> Result<WeightMap> {
    let object = value.as_object().ok_or(Error::BaseWeightsNotObject)?;
    Ok(object
        .iter()
        .map(|(criterion, weight)| (criterion.as_str(), number(weight).unwrap_or(0.0)))
        .collect())
}

fn numeric_entries(object: &Map<String, Value>) -> CriterionMap {
    object
        .iter()
        .filter_map(|(key, value)| match number(value) {
            Some(n) => Some((key.as_str(), n)),
            None => {
                debug!(%key, "ignoring non-numeric value");
                None
            }
        })
        .collect()
}

fn nested_number(object: &Map<String, Value>, outer: &str, inner: &str) -> Option<f64> {
    object.get(outer)?.get(inner).and_then(number)
}

fn number(value: &Value) -> Option<f64> {
    value.as_f64().and_then(finite)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

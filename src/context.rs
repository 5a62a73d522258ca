//! Situational inputs and the contextual weight adjustment they drive.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;
use tracing::trace;

use crate::criteria::{
    CLIMATE_ADAPTATION, DISEASE_RESISTANCE, MANAGEMENT_EASE, MARKET_DESIRABILITY,
    QUALITY_ATTRIBUTES, RISK_TOLERANCE, YIELD_POTENTIAL,
};
use crate::num::finite;
use crate::weights::{normalize, WeightMap};

const CLIMATE_ADAPTATION_PER_RISK: f64 = 0.1;
const RISK_TOLERANCE_PER_RISK: f64 = 0.05;
const MARKET_FOCUS_FACTOR: f64 = 0.05;
const MANAGEMENT_PRESSURE_FACTOR: f64 = 0.05;
const PRIMARY_FOCUS_BONUS: f64 = 0.1;
const RISK_ATTITUDE_BONUS: f64 = 0.05;
const SUSTAINABILITY_FACTOR: f64 = 0.05;

/// Regional risk and priority signals. Absent signals have no effect.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RegionalContext {
    /// Climate risk indicators by name (e.g. drought, flood).
    pub climate_risks: BTreeMap<String, f64>,
    pub market_focus: Option<f64>,
    /// Soil constraint signal: how much management effort local soils demand.
    pub management_pressure: Option<f64>,
}

impl RegionalContext {
    /// Arithmetic mean of the finite climate risk indicators, if there are any.
    pub fn mean_climate_risk(&self) -> Option<f64> {
        let risks: Vec<f64> = self
            .climate_risks
            .values()
            .copied()
            .filter_map(finite)
            .collect();
        if risks.is_empty() {
            return None;
        }
        Some(risks.iter().sum::<f64>() / risks.len() as f64)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FarmerPreferences {
    /// Values that replace the corresponding contextual weights outright.
    pub weight_overrides: WeightMap,
    pub primary_focus: Option<PrimaryFocus>,
    pub risk_attitude: Option<RiskAttitude>,
    pub sustainability_priority: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimaryFocus {
    Yield,
    Quality,
    Disease,
    Risk,
}

impl PrimaryFocus {
    pub fn criterion(&self) -> &'static str {
        match self {
            Self::Yield => YIELD_POTENTIAL,
            Self::Quality => QUALITY_ATTRIBUTES,
            Self::Disease => DISEASE_RESISTANCE,
            Self::Risk => RISK_TOLERANCE,
        }
    }
}

/// Labels match case-insensitively.
impl FromStr for PrimaryFocus {
    type Err = UnknownLabel;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yield" => Ok(Self::Yield),
            "quality" => Ok(Self::Quality),
            "disease" => Ok(Self::Disease),
            "risk" => Ok(Self::Risk),
            _ => Err(UnknownLabel(s.to_owned())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskAttitude {
    Conservative,
    Aggressive,
}

impl RiskAttitude {
    pub fn criterion(&self) -> &'static str {
        match self {
            Self::Conservative => RISK_TOLERANCE,
            Self::Aggressive => YIELD_POTENTIAL,
        }
    }
}

impl FromStr for RiskAttitude {
    type Err = UnknownLabel;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conservative" => Ok(Self::Conservative),
            "aggressive" => Ok(Self::Aggressive),
            _ => Err(UnknownLabel(s.to_owned())),
        }
    }
}

/// A preference label with no associated adjustment.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown label {0:?}")]
pub struct UnknownLabel(pub String);

/// Contextual weights for one ranking call, normalized. `base` is left untouched.
pub fn adjust(
    base: &WeightMap,
    context: Option<&RegionalContext>,
    preferences: Option<&FarmerPreferences>,
) -> WeightMap {
    normalize(&apply_adjustments(base, context, preferences))
}

/// The adjustments of [`adjust`] without the final normalization.
///
/// Non-finite signals and overrides are ignored.
/// Regional nudges come first, then overrides replace values, then the preference bonuses are
/// added on top, so an overridden weight still receives a focus or attitude bonus.
pub fn apply_adjustments(
    base: &WeightMap,
    context: Option<&RegionalContext>,
    preferences: Option<&FarmerPreferences>,
) -> WeightMap {
    let mut weights = base.clone();

    if let Some(context) = context {
        if let Some(mean_risk) = context.mean_climate_risk() {
            weights.nudge(CLIMATE_ADAPTATION, mean_risk * CLIMATE_ADAPTATION_PER_RISK);
            weights.nudge(RISK_TOLERANCE, mean_risk * RISK_TOLERANCE_PER_RISK);
        }
        if let Some(market_focus) = context.market_focus.and_then(finite) {
            weights.nudge(MARKET_DESIRABILITY, market_focus * MARKET_FOCUS_FACTOR);
        }
        if let Some(pressure) = context.management_pressure.and_then(finite) {
            weights.nudge(MANAGEMENT_EASE, pressure * MANAGEMENT_PRESSURE_FACTOR);
        }
    }

    if let Some(preferences) = preferences {
        for (criterion, value) in preferences.weight_overrides.iter() {
            if let Some(value) = finite(value) {
                weights.replace(criterion, value);
            }
        }
        if let Some(focus) = preferences.primary_focus {
            weights.nudge(focus.criterion(), PRIMARY_FOCUS_BONUS);
        }
        if let Some(attitude) = preferences.risk_attitude {
            weights.nudge(attitude.criterion(), RISK_ATTITUDE_BONUS);
        }
        if let Some(sustainability) = preferences.sustainability_priority.and_then(finite) {
            weights.nudge(MANAGEMENT_EASE, sustainability * SUSTAINABILITY_FACTOR);
        }
    }

    trace!(?weights, "contextual weights before normalization");
    weights
}

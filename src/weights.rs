use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap as _, Serializer};

use crate::num::Weight;
use crate::Error;

/// Mapping from criterion name to a real value that remembers insertion order.
///
/// Used for base weights, contextual weights, ideal vectors and per-candidate breakdowns. The
/// entry order is the criteria order whenever a map is built from an engine's criteria.
#[derive(Clone, Default, PartialEq)]
pub struct CriterionMap {
    entries: Vec<(String, f64)>,
}

pub type WeightMap = CriterionMap;

impl CriterionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from an explicit list, rejecting repeated criterion names.
    pub fn from_entries<I, K>(entries: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let mut map = Self::new();
        for (criterion, value) in entries {
            let criterion = criterion.into();
            if map.contains(&criterion) {
                return Err(Error::DuplicateCriterion(criterion));
            }
            map.entries.push((criterion, value));
        }
        Ok(map)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, criterion: &str) -> bool {
        self.position(criterion).is_some()
    }

    pub fn get(&self, criterion: &str) -> Option<f64> {
        self.position(criterion).map(|i| self.entries[i].1)
    }

    /// Set `criterion` to `value`, appending it if it is new.
    pub fn insert(&mut self, criterion: impl Into<String>, value: f64) {
        let criterion = criterion.into();
        match self.position(&criterion) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((criterion, value)),
        }
    }

    /// Add `delta` to an existing entry. Returns false when the criterion is absent.
    pub fn nudge(&mut self, criterion: &str, delta: f64) -> bool {
        match self.position(criterion) {
            Some(i) => {
                self.entries[i].1 += delta;
                true
            }
            None => false,
        }
    }

    /// Overwrite an existing entry. Returns false when the criterion is absent.
    pub fn replace(&mut self, criterion: &str, value: f64) -> bool {
        match self.position(criterion) {
            Some(i) => {
                self.entries[i].1 = value;
                true
            }
            None => false,
        }
    }

    pub fn criteria(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(criterion, _)| criterion.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries
            .iter()
            .map(|(criterion, value)| (criterion.as_str(), *value))
    }

    fn position(&self, criterion: &str) -> Option<usize> {
        self.entries.iter().position(|(c, _)| c == criterion)
    }
}

/// Later entries for a repeated criterion overwrite the earlier value in place.
impl<K: Into<String>> FromIterator<(K, f64)> for CriterionMap {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (criterion, value) in iter {
            map.insert(criterion, value);
        }
        map
    }
}

impl std::fmt::Debug for CriterionMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl Serialize for CriterionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (criterion, value) in self.iter() {
            map.serialize_entry(criterion, &value)?;
        }
        map.end()
    }
}

/// Reads a map in document order. A repeated criterion is an error.
impl<'de> Deserialize<'de> for CriterionMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CriterionMapVisitor;

        impl<'de> Visitor<'de> for CriterionMapVisitor {
            type Value = CriterionMap;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map of criterion names to numbers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = CriterionMap::new();
                while let Some((criterion, value)) = access.next_entry::<String, f64>()? {
                    if map.contains(&criterion) {
                        return Err(de::Error::custom(Error::DuplicateCriterion(criterion)));
                    }
                    map.entries.push((criterion, value));
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(CriterionMapVisitor)
    }
}

/// Clamp every weight to be non-negative and rescale so the weights sum to 1. When nothing
/// positive remains, every criterion gets `1/N`.
pub fn normalize(weights: &WeightMap) -> WeightMap {
    if weights.is_empty() {
        return WeightMap::new();
    }
    let clamped: Vec<Weight> = weights.values().map(Weight::clamped).collect();
    let max = clamped.iter().map(Weight::as_f64).fold(0.0, f64::max);
    if max <= 0.0 {
        let uniform = (weights.len() as f64).recip();
        return weights.criteria().map(|c| (c, uniform)).collect();
    }
    // Scaled by the largest weight first so the sum stays finite.
    let scaled: Vec<f64> = clamped.iter().map(|w| w.as_f64() / max).collect();
    let total: f64 = scaled.iter().sum();
    weights
        .criteria()
        .zip(scaled)
        .map(|(c, w)| (c, w / total))
        .collect()
}

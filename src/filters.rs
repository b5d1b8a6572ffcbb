//! Sparse search parameter sets.
//!
//! Blank means "not specified": a field that is missing, empty, or only
//! whitespace never appears in the built set, not even as `""`.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// A geographic search point with radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64, radius_km: f64) -> Self {
        Self {
            latitude,
            longitude,
            radius_km,
        }
    }

    /// Combine independently-known parts; yields a point only once both
    /// latitude and longitude are known.
    pub fn from_parts(
        latitude: Option<f64>,
        longitude: Option<f64>,
        radius_km: f64,
    ) -> Option<Self> {
        Some(Self::new(latitude?, longitude?, radius_km))
    }
}

/// Optional search criteria collected from trigger sources.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCriteria {
    pub query: Option<String>,
    pub category: Option<String>,
    pub chain: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl SearchCriteria {
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_chain(mut self, chain: impl Into<String>) -> Self {
        self.chain = Some(chain.into());
        self
    }

    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    /// Build the sparse parameter set for these criteria.
    pub fn build(&self) -> FilterSet {
        build(self)
    }
}

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Number(f64),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text}"),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

/// Ordered, immutable mapping of parameter name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    entries: Vec<(String, FilterValue)>,
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Key/value pairs ready for a URL query string.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect()
    }

    /// Add a free-text parameter, trimmed; blank values are skipped.
    pub fn insert_text(&mut self, key: &str, value: Option<&str>) {
        let Some(trimmed) = value.map(str::trim).filter(|text| !text.is_empty()) else {
            return;
        };
        self.put(key, FilterValue::Text(trimmed.to_string()));
    }

    pub fn insert_number(&mut self, key: &str, value: f64) {
        self.put(key, FilterValue::Number(value));
    }

    fn put(&mut self, key: &str, value: FilterValue) {
        match self.entries.iter_mut().find(|(name, _)| name == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }
}

impl Serialize for FilterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            match value {
                FilterValue::Text(text) => map.serialize_entry(name, text)?,
                FilterValue::Number(number) => map.serialize_entry(name, number)?,
            }
        }
        map.end()
    }
}

/// Build a sparse parameter set from optional criteria.
///
/// Coordinates expand to `latitude`, `longitude`, and `radius` together.
pub fn build(criteria: &SearchCriteria) -> FilterSet {
    let mut set = FilterSet::default();
    set.insert_text("query", criteria.query.as_deref());
    set.insert_text("category", criteria.category.as_deref());
    set.insert_text("chain", criteria.chain.as_deref());
    if let Some(coords) = criteria.coordinates {
        set.insert_number("latitude", coords.latitude);
        set.insert_number("longitude", coords.longitude);
        set.insert_number("radius", coords.radius_km);
    }
    set
}

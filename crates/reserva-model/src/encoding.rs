//! Categorical encoding maps.
//!
//! A [`CategoryMap`] is a bijection from category label to a dense
//! integer code in `[0, distinct_count)`, assigned in lexicographic
//! order of the categories observed at fit time. Maps are fitted on the
//! training table only and replayed verbatim on the test table; a
//! category unseen at fit time is the caller's error to surface.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Label-to-code bijection for one categorical column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMap {
    codes: BTreeMap<String, u32>,
}

impl CategoryMap {
    /// Fit a map from observed values. Duplicates collapse; codes follow
    /// lexicographic category order.
    pub fn fit<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut codes: BTreeMap<String, u32> = values
            .into_iter()
            .map(|value| (value.into(), 0))
            .collect();
        for (code, value) in codes.values_mut().enumerate() {
            *value = code as u32;
        }
        Self { codes }
    }

    /// The code assigned to `value`, if it was seen at fit time.
    pub fn code(&self, value: &str) -> Option<u32> {
        self.codes.get(value).copied()
    }

    /// Number of distinct categories.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Categories in code order (lexicographic).
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.codes.keys().map(String::as_str)
    }
}

/// The per-column encoding maps produced by preprocessing a training
/// table, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encodings {
    columns: BTreeMap<String, CategoryMap>,
}

impl Encodings {
    pub fn insert(&mut self, column: impl Into<String>, map: CategoryMap) {
        self.columns.insert(column.into(), map);
    }

    pub fn get(&self, column: &str) -> Option<&CategoryMap> {
        self.columns.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryMap)> {
        self.columns.iter().map(|(name, map)| (name.as_str(), map))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

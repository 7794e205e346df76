use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::record::MasterRecord;

/// One categorical filter dimension; `All` matches every record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetSelection {
    #[default]
    All,
    Only(String),
}

impl FacetSelection {
    /// `"all"` (any case) and the empty string select everything.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Only(trimmed.to_ascii_lowercase())
        }
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => {
                value.is_some_and(|value| value.eq_ignore_ascii_case(expected))
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub search: String,
    pub facets: BTreeMap<String, FacetSelection>,
}

impl RecordFilter {
    pub fn search(term: impl Into<String>) -> Self {
        Self { search: term.into(), facets: BTreeMap::new() }
    }

    pub fn with_facet(mut self, dimension: impl Into<String>, selection: FacetSelection) -> Self {
        self.facets.insert(dimension.into(), selection);
        self
    }

    pub fn matches<R: MasterRecord>(&self, record: &R) -> bool {
        self.matches_search(record)
            && self
                .facets
                .iter()
                .all(|(dimension, selection)| selection.matches(record.facet(dimension)))
    }

    fn matches_search<R: MasterRecord>(&self, record: &R) -> bool {
        let needle = self.search.to_lowercase();
        needle.is_empty()
            || record.searchable_text().iter().any(|text| text.to_lowercase().contains(&needle))
    }
}

/// Records matching `filter`, in collection order.
pub fn apply_filter<R: MasterRecord>(records: &[R], filter: &RecordFilter) -> Vec<R> {
    records.iter().filter(|record| filter.matches(*record)).cloned().collect()
}

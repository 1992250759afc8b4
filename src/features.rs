//! Structural summary of a parsed statement.
//!
//! [`QueryFeatures`] is produced once per analysis by the
//! [`FeatureExtractor`](crate::extractor::FeatureExtractor) and is read by
//! every advisor. It is never modified after construction.

use serde::{Deserialize, Serialize};

/// Syntactic features of one statement.
///
/// Column lists keep every occurrence in syntactic order; consumers decide
/// whether to deduplicate. `tables` is an insertion-ordered set of
/// lower-cased names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFeatures {
    pub tables: Vec<String>,
    #[serde(rename = "joins")]
    pub join_count: usize,
    #[serde(rename = "conditions")]
    pub condition_count: usize,
    #[serde(rename = "subqueries")]
    pub subquery_count: usize,
    pub has_wildcard: bool,
    pub has_order_by: bool,
    pub has_group_by: bool,
    pub has_having: bool,
    pub has_distinct: bool,
    pub has_limit: bool,
    pub where_columns: Vec<String>,
    pub order_by_columns: Vec<String>,
    pub group_by_columns: Vec<String>,
    pub query_type: String,
}

impl QueryFeatures {
    /// Features of a statement that is not a query: all counts zero, all flags off.
    pub fn empty(query_type: impl Into<String>) -> Self {
        Self {
            query_type: query_type.into(),
            ..Self::default()
        }
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// The table every index suggestion is attributed to
    pub fn primary_table(&self) -> Option<&str> {
        self.tables.first().map(String::as_str)
    }

    /// Payload sent to the remote prediction service.
    pub fn to_vector(&self, query_length: usize) -> FeatureVector {
        FeatureVector {
            num_tables: self.tables.len(),
            num_joins: self.join_count,
            num_conditions: self.condition_count,
            num_subqueries: self.subquery_count,
            has_wildcard: flag(self.has_wildcard),
            has_order_by: flag(self.has_order_by),
            has_group_by: flag(self.has_group_by),
            has_having: flag(self.has_having),
            has_distinct: flag(self.has_distinct),
            has_limit: flag(self.has_limit),
            num_where_columns: self.where_columns.len(),
            num_order_columns: self.order_by_columns.len(),
            num_group_columns: self.group_by_columns.len(),
            query_length,
        }
    }
}

/// Fixed 14-field feature vector understood by the prediction service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub num_tables: usize,
    pub num_joins: usize,
    pub num_conditions: usize,
    pub num_subqueries: usize,
    pub has_wildcard: u8,
    pub has_order_by: u8,
    pub has_group_by: u8,
    pub has_having: u8,
    pub has_distinct: u8,
    pub has_limit: u8,
    pub num_where_columns: usize,
    pub num_order_columns: usize,
    pub num_group_columns: usize,
    pub query_length: usize,
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

/// Distinct values in first-seen order.
pub(crate) fn distinct(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(value) {
            out.push(value.clone());
        }
    }
    out
}

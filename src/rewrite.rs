// Rewrite Advisor - text-level query rewrite and optimization tips
//
// The rewrite is a literal text substitution over the normalized query. It is
// not guaranteed to be equivalent to the input: the first `SELECT *` in the
// text is replaced, which may belong to a nested subquery.

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use serde::Serialize;

use crate::features::{distinct, QueryFeatures};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
static SELECT_STAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bSELECT\s*\*").expect("static regex"));
static TRAILING_TERMINATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[;\s]*$").expect("static regex"));

pub const TIP_EXPLICIT_COLUMNS: &str =
    "Replace SELECT * with specific column names to reduce I/O and enable covering indexes.";
pub const TIP_ADD_LIMIT: &str = "Add a LIMIT clause to prevent unbounded result sets.";
pub const TIP_WILDCARD_JOINS: &str =
    "SELECT * with multiple JOINs pulls all columns from all tables; specify only needed columns.";
pub const TIP_SORT_WITHOUT_LIMIT: &str =
    "ORDER BY without LIMIT forces a full sort; add LIMIT if only top rows are needed.";
pub const TIP_DISTINCT_JOINS: &str =
    "DISTINCT with JOINs may indicate a missing or incorrect JOIN condition producing duplicates.";
pub const TIP_SUBQUERIES: &str =
    "Consider rewriting correlated subqueries as JOINs or using EXISTS instead of IN for better performance.";
pub const TIP_WIDE_GROUP_BY: &str =
    "GROUP BY on many columns can be expensive; ensure an appropriate composite index exists.";

const DEFAULT_LIMIT: &str = " LIMIT 1000;";

/// Rewritten text plus the tips that fired, in rule order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteResult {
    pub optimized_query: String,
    pub tips: Vec<String>,
}

pub struct RewriteAdvisor;

impl RewriteAdvisor {
    pub fn rewrite(raw: &str, features: &QueryFeatures) -> RewriteResult {
        let mut text = WHITESPACE.replace_all(raw.trim(), " ").into_owned();
        let mut tips = Vec::new();

        if features.has_wildcard {
            tips.push(TIP_EXPLICIT_COLUMNS);
        }

        if !features.has_limit
            && !features.has_group_by
            && features.subquery_count == 0
            && features.condition_count == 0
        {
            tips.push(TIP_ADD_LIMIT);
            text = format!("{}{}", strip_terminators(&text), DEFAULT_LIMIT);
        }

        if features.has_wildcard && features.join_count >= 2 {
            tips.push(TIP_WILDCARD_JOINS);
        }

        if features.has_order_by && !features.has_limit {
            tips.push(TIP_SORT_WITHOUT_LIMIT);
        }

        if features.has_distinct && features.join_count > 0 {
            tips.push(TIP_DISTINCT_JOINS);
        }

        if features.subquery_count > 0 {
            tips.push(TIP_SUBQUERIES);
        }

        if features.has_group_by && distinct(&features.group_by_columns).len() > 2 {
            tips.push(TIP_WIDE_GROUP_BY);
        }

        if features.has_wildcard && !features.where_columns.is_empty() {
            let mut columns = distinct(&features.where_columns);
            for column in &features.order_by_columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
            let projection = format!("SELECT {}", columns.join(", "));
            text = SELECT_STAR.replace(&text, NoExpand(&projection)).into_owned();
        }

        let optimized_query = format!("{};", strip_terminators(&text));

        RewriteResult {
            optimized_query,
            tips: tips.into_iter().map(String::from).collect(),
        }
    }
}

fn strip_terminators(text: &str) -> &str {
    match TRAILING_TERMINATORS.find(text) {
        Some(m) => &text[..m.start()],
        None => text,
    }
}

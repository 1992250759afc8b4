// Index Advisor - rule-based index suggestions from query features
//
// Every suggestion is attributed to the first table of the query, even when a
// column belongs to a joined table.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::features::{distinct, QueryFeatures};
use crate::parser::SqlDialect;

/// Shown in place of the primary suggestion when nothing was suggested
pub const NO_INDEX_PLACEHOLDER: &str = "-- No index suggestions";

/// Advisory emitted for `SELECT *` combined with joins
pub const WILDCARD_JOIN_ADVISORY: &str =
    "-- TIP: Replace SELECT * with specific columns to enable covering-index optimization";

/// A single `CREATE INDEX` recommendation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IndexDefinition {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
}

impl IndexDefinition {
    pub fn new(table: &str, columns: Vec<String>) -> Self {
        Self {
            name: Self::generate_name(table, &columns),
            table: table.to_string(),
            columns,
        }
    }

    /// `idx_<table>_<col1>_..._<colN>`
    pub fn generate_name(table: &str, columns: &[String]) -> String {
        format!("idx_{}_{}", table, columns.join("_"))
    }

    pub fn to_create_sql(&self) -> String {
        format!(
            "CREATE INDEX {} ON {}({});",
            self.name,
            self.table,
            self.columns.join(", ")
        )
    }

    pub fn to_drop_sql(&self, dialect: SqlDialect) -> String {
        if dialect.supports_standalone_drop_index() {
            format!("DROP INDEX IF EXISTS {};", self.name)
        } else {
            format!("DROP INDEX {} ON {};", self.name, self.table)
        }
    }
}

/// One entry of the ordered suggestion list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSuggestion {
    Create(IndexDefinition),
    /// Free-text comment, not DDL
    Advisory(String),
}

impl IndexSuggestion {
    pub fn as_index(&self) -> Option<&IndexDefinition> {
        match self {
            IndexSuggestion::Create(index) => Some(index),
            IndexSuggestion::Advisory(_) => None,
        }
    }
}

impl fmt::Display for IndexSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexSuggestion::Create(index) => f.write_str(&index.to_create_sql()),
            IndexSuggestion::Advisory(text) => f.write_str(text),
        }
    }
}

/// Stateless index rule engine
pub struct IndexAdvisor;

impl IndexAdvisor {
    /// Ordered, duplicate-free suggestions; the first entry is the primary one.
    ///
    /// Rules run in a fixed order:
    /// 1. `WHERE` columns: one composite index plus single-column alternatives
    ///    (or just the single-column index when there is one column)
    /// 2. `WHERE` + `ORDER BY` covering index, when it adds columns
    /// 3. `ORDER BY` index when there is no `WHERE` column
    /// 4. `GROUP BY` index, unless already suggested
    /// 5. wildcard-with-joins advisory
    pub fn suggest(features: &QueryFeatures) -> Vec<IndexSuggestion> {
        let table = match features.primary_table() {
            Some(table) => table,
            None => return Vec::new(),
        };

        let mut suggestions = Vec::new();
        let where_cols = distinct(&features.where_columns);

        // Rule 1
        if where_cols.len() == 1 {
            suggestions.push(Self::create(table, where_cols.clone()));
        } else if where_cols.len() > 1 {
            suggestions.push(Self::create(table, where_cols.clone()));
            for column in &where_cols {
                suggestions.push(Self::create(table, vec![column.clone()]));
            }
        }

        // Rule 2
        if !where_cols.is_empty() && !features.order_by_columns.is_empty() {
            let mut covering = where_cols.clone();
            for column in &features.order_by_columns {
                if !covering.contains(column) {
                    covering.push(column.clone());
                }
            }
            if covering.len() > where_cols.len() {
                suggestions.push(Self::create(table, covering));
            }
        }

        // Rule 3
        if where_cols.is_empty() && !features.order_by_columns.is_empty() {
            suggestions.push(Self::create(table, distinct(&features.order_by_columns)));
        }

        // Rule 4
        if !features.group_by_columns.is_empty() {
            let group_index = Self::create(table, distinct(&features.group_by_columns));
            let text = group_index.to_string();
            if suggestions.iter().all(|s| s.to_string() != text) {
                suggestions.push(group_index);
            }
        }

        // Rule 5
        if features.has_wildcard && features.join_count > 0 {
            suggestions.push(IndexSuggestion::Advisory(WILDCARD_JOIN_ADVISORY.to_string()));
        }

        let mut seen = HashSet::new();
        suggestions.retain(|s| seen.insert(s.to_string()));

        debug!(table, count = suggestions.len(), "index suggestions computed");
        suggestions
    }

    /// The suggestion list as display strings
    pub fn suggest_statements(features: &QueryFeatures) -> Vec<String> {
        Self::suggest(features)
            .iter()
            .map(IndexSuggestion::to_string)
            .collect()
    }

    fn create(table: &str, columns: Vec<String>) -> IndexSuggestion {
        IndexSuggestion::Create(IndexDefinition::new(table, columns))
    }
}

/// Migration script creating every distinct index, wrapped in a transaction.
pub fn render_create_script(indexes: &[IndexDefinition], dialect: SqlDialect) -> String {
    let mut sql = String::new();
    sql.push_str("-- Auto-generated by sql-analyzer\n");
    sql.push_str(&format!("-- Dialect: {}\n\n", dialect));
    sql.push_str("BEGIN;\n\n");

    for index in unique_indexes(indexes) {
        sql.push_str(&format!("{}\n\n", index.to_create_sql()));
    }

    sql.push_str("COMMIT;\n");
    sql
}

/// Rollback for [`render_create_script`]; indexes are dropped in reverse order.
pub fn render_drop_script(indexes: &[IndexDefinition], dialect: SqlDialect) -> String {
    let mut sql = String::new();
    sql.push_str("-- Auto-generated rollback script\n\n");
    sql.push_str("BEGIN;\n\n");

    for index in unique_indexes(indexes).iter().rev() {
        sql.push_str(&format!("{}\n\n", index.to_drop_sql(dialect)));
    }

    sql.push_str("COMMIT;\n");
    sql
}

fn unique_indexes(indexes: &[IndexDefinition]) -> Vec<&IndexDefinition> {
    let mut seen = HashSet::new();
    indexes
        .iter()
        .filter(|index| seen.insert(index.name.as_str()))
        .collect()
}

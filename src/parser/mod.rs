// Parser module - SQL text to syntax tree
//
// The analyzer only depends on the `SqlParser` trait; the default backend
// wraps sqlparser-rs and can be swapped without touching the extractor.

pub mod sql_parser;

pub use sql_parser::SqlparserBackend;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};

use crate::error::{AdvisorError, Result};

/// Capability that turns SQL text into a single parsed statement.
pub trait SqlParser: Send + Sync {
    /// Parse exactly one statement, or fail with [`AdvisorError::Syntax`].
    fn parse(&self, sql: &str) -> Result<Statement>;
}

// Database dialect support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    #[default]
    Generic,
    Postgres,
    MySQL,
    SQLite,
}

impl SqlDialect {
    /// Grammar used by sqlparser for this dialect
    pub fn grammar(&self) -> Box<dyn Dialect> {
        match self {
            SqlDialect::Generic => Box::new(GenericDialect {}),
            SqlDialect::Postgres => Box::new(PostgreSqlDialect {}),
            SqlDialect::MySQL => Box::new(MySqlDialect {}),
            SqlDialect::SQLite => Box::new(SQLiteDialect {}),
        }
    }

    /// Check if this dialect accepts `DROP INDEX IF EXISTS <name>` without a table
    pub fn supports_standalone_drop_index(&self) -> bool {
        !matches!(self, SqlDialect::MySQL)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SqlDialect::Generic => "generic",
            SqlDialect::Postgres => "postgres",
            SqlDialect::MySQL => "mysql",
            SqlDialect::SQLite => "sqlite",
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SqlDialect {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" | "ansi" => Ok(SqlDialect::Generic),
            "postgres" | "postgresql" | "pg" => Ok(SqlDialect::Postgres),
            "mysql" => Ok(SqlDialect::MySQL),
            "sqlite" => Ok(SqlDialect::SQLite),
            other => Err(AdvisorError::InvalidConfig(format!(
                "unknown SQL dialect '{}' (expected generic, postgres, mysql or sqlite)",
                other
            ))),
        }
    }
}

/// Tag for the statement's syntactic kind.
///
/// Every query expression is `SELECT`; other statements use their variant
/// name upper-cased without separators (`INSERT`, `UPDATE`, `CREATETABLE`).
pub fn statement_kind(statement: &Statement) -> String {
    let kind = match statement {
        Statement::Query(_) => "SELECT",
        Statement::Insert(_) => "INSERT",
        Statement::Delete(_) => "DELETE",
        Statement::CreateTable(_) => "CREATETABLE",
        Statement::CreateIndex(_) => "CREATEINDEX",
        Statement::Explain { .. } => "EXPLAIN",
        other => return variant_name(other),
    };
    kind.to_string()
}

/// Upper-cased variant name from the `Debug` rendering.
///
/// Only the leading identifier is kept, so the scan stops at the first
/// delimiter instead of formatting the whole tree.
fn variant_name(statement: &Statement) -> String {
    use std::fmt::Write;

    struct Head(String);

    impl Write for Head {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            let end = s
                .find(|c: char| !c.is_ascii_alphanumeric())
                .unwrap_or(s.len());
            self.0.push_str(&s[..end].to_ascii_uppercase());
            if end < s.len() {
                return Err(fmt::Error);
            }
            Ok(())
        }
    }

    let mut head = Head(String::new());
    let _ = write!(head, "{:?}", statement);
    head.0
}

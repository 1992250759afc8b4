// SQL Parser - sqlparser-rs backend
//
// Rejects input that does not contain exactly one statement.

use sqlparser::ast::Statement;
use sqlparser::parser::Parser;

use super::{SqlDialect, SqlParser};
use crate::error::{AdvisorError, Result};

/// Parser backed by sqlparser-rs
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlparserBackend {
    dialect: SqlDialect,
}

impl SqlparserBackend {
    /// Create a new SQL parser for the specified dialect
    pub fn new(dialect: SqlDialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }
}

impl SqlParser for SqlparserBackend {
    fn parse(&self, sql: &str) -> Result<Statement> {
        let grammar = self.dialect.grammar();
        let mut statements = Parser::parse_sql(grammar.as_ref(), sql)
            .map_err(|e| AdvisorError::Syntax(e.to_string()))?;

        match statements.len() {
            1 => Ok(statements.remove(0)),
            0 => Err(AdvisorError::Syntax("no SQL statement found".to_string())),
            n => Err(AdvisorError::Syntax(format!(
                "expected a single statement, found {}",
                n
            ))),
        }
    }
}

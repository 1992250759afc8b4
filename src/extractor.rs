//! Single-pass feature extraction over a parsed statement.
//!
//! The walk threads one mutable [`ExtractionContext`] through the tree.
//! Boolean expressions are first classified into a [`Predicate`] view so that
//! condition counting, `WHERE` column capture and `WHERE` subquery counting
//! happen in the same fold. Every syntax node is visited at most once.
//!
//! Sub-select bodies are opaque: a nested `SELECT` counts as one subquery,
//! and its own tables, joins and predicates are not added to the outer
//! statement's features.

use sqlparser::ast::{
    BinaryOperator, Distinct, Expr, GroupByExpr, Join, JoinConstraint, JoinOperator, LimitClause,
    ObjectName, ObjectNamePart, OrderByKind, Query, Select, SelectItem, SetExpr, Statement,
    TableFactor, TableWithJoins,
};

use crate::features::QueryFeatures;
use crate::parser::statement_kind;

/// Builds [`QueryFeatures`] from a parsed statement.
///
/// Total over any successfully parsed statement; non-query statements yield
/// [`QueryFeatures::empty`] tagged with the statement kind.
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn extract(statement: &Statement) -> QueryFeatures {
        match statement {
            Statement::Query(query) => {
                let mut ctx = ExtractionContext::default();
                ctx.visit_query(query);
                ctx.into_features(statement_kind(statement))
            }
            other => QueryFeatures::empty(statement_kind(other)),
        }
    }
}

/// Which clause a predicate belongs to.
///
/// Only `WHERE` predicates contribute columns and subqueries; join `ON` and
/// `HAVING` predicates are counted as conditions only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clause {
    Where,
    JoinOn,
    Having,
}

/// Tagged view of a boolean expression node.
#[derive(Debug, Clone, Copy)]
enum Predicate<'a> {
    And(&'a Expr, &'a Expr),
    Or(&'a Expr, &'a Expr),
    Paren(&'a Expr),
    Comparison { left: &'a Expr, right: &'a Expr },
    In { operand: &'a Expr, subquery: bool },
    Between(&'a Expr),
    Like(&'a Expr),
    IsNull(&'a Expr),
    Exists,
    Subquery,
    Other,
}

impl<'a> Predicate<'a> {
    fn classify(expr: &'a Expr) -> Self {
        match expr {
            Expr::BinaryOp { left, op, right } => match op {
                BinaryOperator::And => Predicate::And(left, right),
                BinaryOperator::Or => Predicate::Or(left, right),
                op if is_comparison(op) => Predicate::Comparison { left, right },
                _ => Predicate::Other,
            },
            Expr::AnyOp {
                left,
                compare_op,
                right,
                ..
            }
            | Expr::AllOp {
                left,
                compare_op,
                right,
            } if is_comparison(compare_op) => Predicate::Comparison { left, right },
            Expr::Nested(inner) => Predicate::Paren(inner),
            Expr::InList { expr, .. } => Predicate::In {
                operand: expr,
                subquery: false,
            },
            Expr::InSubquery { expr, .. } => Predicate::In {
                operand: expr,
                subquery: true,
            },
            Expr::Between { expr, .. } => Predicate::Between(expr),
            Expr::Like { expr, .. }
            | Expr::ILike { expr, .. }
            | Expr::SimilarTo { expr, .. }
            | Expr::RLike { expr, .. } => Predicate::Like(expr),
            Expr::IsNull(expr) | Expr::IsNotNull(expr) => Predicate::IsNull(expr),
            Expr::Exists { .. } => Predicate::Exists,
            Expr::Subquery(_) => Predicate::Subquery,
            _ => Predicate::Other,
        }
    }
}

/// Mutable accumulator for one extraction pass
#[derive(Debug, Default)]
struct ExtractionContext {
    features: QueryFeatures,
}

impl ExtractionContext {
    fn into_features(self, query_type: String) -> QueryFeatures {
        QueryFeatures {
            query_type,
            ..self.features
        }
    }

    fn visit_query(&mut self, query: &Query) {
        self.visit_set_expr(&query.body);

        if let Some(order_by) = &query.order_by {
            match &order_by.kind {
                OrderByKind::Expressions(exprs) => {
                    if !exprs.is_empty() {
                        self.features.has_order_by = true;
                    }
                    for item in exprs {
                        if let Some(column) = column_name(&item.expr) {
                            self.features.order_by_columns.push(column);
                        }
                    }
                }
                OrderByKind::All(_) => self.features.has_order_by = true,
            }
        }

        if has_limit(&query.limit_clause) {
            self.features.has_limit = true;
        }
    }

    fn visit_set_expr(&mut self, body: &SetExpr) {
        match body {
            SetExpr::Select(select) => self.visit_select(select),
            SetExpr::Query(query) => self.visit_query(query),
            SetExpr::SetOperation { left, right, .. } => {
                self.visit_set_expr(left);
                self.visit_set_expr(right);
            }
            _ => {}
        }
    }

    fn visit_select(&mut self, select: &Select) {
        for item in &select.projection {
            if item.to_string().contains('*') {
                self.features.has_wildcard = true;
            }
            if let SelectItem::UnnamedExpr(Expr::Subquery(_))
            | SelectItem::ExprWithAlias {
                expr: Expr::Subquery(_),
                ..
            } = item
            {
                self.features.subquery_count += 1;
            }
        }

        self.visit_from(&select.from);

        if let Some(selection) = &select.selection {
            self.fold_predicate(selection, Clause::Where);
        }

        match &select.group_by {
            GroupByExpr::All(_) => self.features.has_group_by = true,
            GroupByExpr::Expressions(exprs, modifiers) => {
                if !exprs.is_empty() || !modifiers.is_empty() {
                    self.features.has_group_by = true;
                }
                for expr in exprs {
                    if let Some(column) = column_name(expr) {
                        self.features.group_by_columns.push(column);
                    }
                }
            }
        }

        if let Some(having) = &select.having {
            self.features.has_having = true;
            self.fold_predicate(having, Clause::Having);
        }

        if matches!(
            select.distinct,
            Some(Distinct::Distinct) | Some(Distinct::On(_))
        ) {
            self.features.has_distinct = true;
        }
    }

    fn visit_from(&mut self, from: &[TableWithJoins]) {
        for (i, item) in from.iter().enumerate() {
            // `FROM a, b` is an implicit cross join
            if i > 0 {
                self.features.join_count += 1;
            }
            self.visit_table_with_joins(item);
        }
    }

    fn visit_table_with_joins(&mut self, item: &TableWithJoins) {
        self.visit_relation(&item.relation);
        for join in &item.joins {
            self.visit_join(join);
        }
    }

    fn visit_relation(&mut self, relation: &TableFactor) {
        match relation {
            TableFactor::Table { name, .. } => self.add_table(table_name(name)),
            TableFactor::Derived { .. } => self.features.subquery_count += 1,
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => self.visit_table_with_joins(table_with_joins),
            _ => {}
        }
    }

    fn visit_join(&mut self, join: &Join) {
        self.features.join_count += 1;
        self.visit_relation(&join.relation);
        if let Some(JoinConstraint::On(expr)) = join_constraint(&join.join_operator) {
            self.fold_predicate(expr, Clause::JoinOn);
        }
    }

    fn add_table(&mut self, name: String) {
        if !self.features.tables.contains(&name) {
            self.features.tables.push(name);
        }
    }

    /// AND / OR / parentheses are transparent; every other node is one condition.
    fn fold_predicate(&mut self, expr: &Expr, clause: Clause) {
        match Predicate::classify(expr) {
            Predicate::And(left, right) | Predicate::Or(left, right) => {
                self.fold_predicate(left, clause);
                self.fold_predicate(right, clause);
            }
            Predicate::Paren(inner) => self.fold_predicate(inner, clause),
            leaf => {
                self.features.condition_count += 1;
                if clause == Clause::Where {
                    self.record_where_leaf(leaf);
                }
            }
        }
    }

    fn record_where_leaf(&mut self, leaf: Predicate<'_>) {
        match leaf {
            Predicate::Comparison { left, right } => {
                self.push_where_column(left);
                self.push_where_column(right);
            }
            Predicate::In { operand, subquery } => {
                self.push_where_column(operand);
                if subquery {
                    self.features.subquery_count += 1;
                }
            }
            Predicate::Between(operand) | Predicate::Like(operand) | Predicate::IsNull(operand) => {
                self.push_where_column(operand)
            }
            Predicate::Exists | Predicate::Subquery => self.features.subquery_count += 1,
            Predicate::And(..) | Predicate::Or(..) | Predicate::Paren(_) | Predicate::Other => {}
        }
    }

    fn push_where_column(&mut self, expr: &Expr) {
        if let Some(column) = column_name(expr) {
            self.features.where_columns.push(column);
        }
    }
}

fn is_comparison(op: &BinaryOperator) -> bool {
    matches!(
        op,
        BinaryOperator::Eq
            | BinaryOperator::NotEq
            | BinaryOperator::Lt
            | BinaryOperator::LtEq
            | BinaryOperator::Gt
            | BinaryOperator::GtEq
            | BinaryOperator::Spaceship
    )
}

/// Unqualified column name of a direct column reference
fn column_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.clone()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|ident| ident.value.clone()),
        _ => None,
    }
}

/// Unqualified, lower-cased table name (`sales.Orders` -> `orders`)
fn table_name(name: &ObjectName) -> String {
    name.0
        .last()
        .and_then(ObjectNamePart::as_ident)
        .map(|ident| ident.value.clone())
        .unwrap_or_else(|| name.to_string())
        .to_lowercase()
}

fn join_constraint(operator: &JoinOperator) -> Option<&JoinConstraint> {
    match operator {
        JoinOperator::Join(constraint)
        | JoinOperator::Inner(constraint)
        | JoinOperator::Left(constraint)
        | JoinOperator::LeftOuter(constraint)
        | JoinOperator::Right(constraint)
        | JoinOperator::RightOuter(constraint)
        | JoinOperator::FullOuter(constraint)
        | JoinOperator::CrossJoin(constraint)
        | JoinOperator::Semi(constraint)
        | JoinOperator::LeftSemi(constraint)
        | JoinOperator::RightSemi(constraint)
        | JoinOperator::Anti(constraint)
        | JoinOperator::LeftAnti(constraint)
        | JoinOperator::RightAnti(constraint)
        | JoinOperator::StraightJoin(constraint)
        | JoinOperator::AsOf { constraint, .. } => Some(constraint),
        _ => None,
    }
}

/// `OFFSET` without a row count is not a limit
fn has_limit(clause: &Option<LimitClause>) -> bool {
    match clause {
        Some(LimitClause::LimitOffset { limit, .. }) => limit.is_some(),
        Some(LimitClause::OffsetCommaLimit { .. }) => true,
        None => false,
    }
}

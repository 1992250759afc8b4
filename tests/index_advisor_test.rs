mod support;

use std::collections::HashSet;

use sql_advisor::index_advisor::WILDCARD_JOIN_ADVISORY;
use sql_advisor::{IndexAdvisor, IndexSuggestion, QueryFeatures};
use support::{features_of, strings};

fn suggest(sql: &str) -> Vec<String> {
    IndexAdvisor::suggest_statements(&features_of(sql))
}

#[test]
fn test_composite_then_single_column_alternatives() {
    assert_eq!(
        suggest("SELECT id FROM orders WHERE user_id = 1 AND status = 'open'"),
        vec![
            "CREATE INDEX idx_orders_user_id_status ON orders(user_id, status);",
            "CREATE INDEX idx_orders_user_id ON orders(user_id);",
            "CREATE INDEX idx_orders_status ON orders(status);",
        ]
    );
}

#[test]
fn test_covering_index_for_where_and_order_by() {
    assert_eq!(
        suggest("SELECT id FROM orders WHERE user_id = 1 ORDER BY created_at"),
        vec![
            "CREATE INDEX idx_orders_user_id ON orders(user_id);",
            "CREATE INDEX idx_orders_user_id_created_at ON orders(user_id, created_at);",
        ]
    );
}

#[test]
fn test_order_by_only() {
    assert_eq!(
        suggest("SELECT id FROM orders ORDER BY created_at, id"),
        vec!["CREATE INDEX idx_orders_created_at_id ON orders(created_at, id);"]
    );
}

#[test]
fn test_group_by_index_skipped_when_already_suggested() {
    assert_eq!(
        suggest("SELECT status, COUNT(id) FROM orders WHERE status = 'x' GROUP BY status"),
        vec!["CREATE INDEX idx_orders_status ON orders(status);"]
    );

    assert_eq!(
        suggest("SELECT region, COUNT(id) FROM orders WHERE status = 'x' GROUP BY region"),
        vec![
            "CREATE INDEX idx_orders_status ON orders(status);",
            "CREATE INDEX idx_orders_region ON orders(region);",
        ]
    );
}

#[test]
fn test_wildcard_join_advisory_is_last() {
    let suggestions = IndexAdvisor::suggest(&features_of(
        "SELECT * FROM orders o JOIN users u ON u.id = o.user_id WHERE o.status = 'open'",
    ));

    assert_eq!(suggestions.len(), 2);
    assert_eq!(
        suggestions[0].to_string(),
        "CREATE INDEX idx_orders_status ON orders(status);"
    );
    assert_eq!(
        suggestions[1],
        IndexSuggestion::Advisory(WILDCARD_JOIN_ADVISORY.to_string())
    );
}

#[test]
fn test_columns_attributed_to_first_table() {
    assert_eq!(
        suggest("SELECT o.id FROM orders o JOIN users u ON u.id = o.user_id WHERE u.email = 'x'"),
        vec!["CREATE INDEX idx_orders_email ON orders(email);"]
    );
}

#[test]
fn test_no_tables_no_suggestions() {
    assert!(suggest("SELECT s.n FROM (SELECT COUNT(id) AS n FROM orders) s WHERE s.n > 1").is_empty());

    let no_tables = QueryFeatures {
        where_columns: strings(&["a"]),
        order_by_columns: strings(&["b"]),
        group_by_columns: strings(&["c"]),
        has_wildcard: true,
        join_count: 2,
        ..QueryFeatures::default()
    };
    assert!(IndexAdvisor::suggest(&no_tables).is_empty());
}

#[test]
fn test_suggestions_never_repeat() {
    let queries = [
        "SELECT id FROM t WHERE a = 1 AND a = 2 AND b = 3 ORDER BY b, a",
        "SELECT a, b FROM t WHERE a = 1 AND b = 2 GROUP BY a, b",
        "SELECT * FROM t JOIN u ON u.id = t.id WHERE t.a = 1 OR t.a = 2 GROUP BY a ORDER BY a",
        "SELECT id FROM t GROUP BY a, b ORDER BY a, b",
    ];

    for sql in queries {
        let statements = suggest(sql);
        let unique: HashSet<&String> = statements.iter().collect();
        assert_eq!(unique.len(), statements.len(), "{}: {:?}", sql, statements);
    }
}

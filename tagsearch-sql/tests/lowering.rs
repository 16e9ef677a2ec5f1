mod common;
use common::lower;
use tagsearch_sql::{BindValue, Order};

#[test]
fn empty_query_matches_worked_example() {
    let lowered = lower("", Order::DescPostDate, 10, 0);
    assert_eq!(
        lowered.sql,
        "SELECT posted_articles.id FROM posted_articles ORDER BY posted_articles.id DESC LIMIT ? OFFSET ?"
    );
    assert_eq!(lowered.binds, vec![BindValue::Int(10), BindValue::Int(0)]);
}

#[test]
fn and_or_minus_compose_without_intersect_or_except() {
    let lowered = lower("(a OR b) c -d", Order::AscPostDate, 20, 40);
    let upper = lowered.sql.to_uppercase();
    assert!(upper.contains("INNER JOIN"));
    assert!(upper.contains("UNION"));
    assert!(upper.contains("NOT IN"));
    assert!(!upper.contains("INTERSECT"));
    assert!(!upper.contains("EXCEPT"));
}

#[test]
fn placeholder_count_always_matches_bind_count() {
    for query in ["", "a", "a b", "a OR b", "a -b", "(a OR b) c -d -e"] {
        let lowered = lower(query, Order::AscUpdateDate, 5, 0);
        assert_eq!(
            lowered.sql.matches('?').count(),
            lowered.binds.len(),
            "query {query:?}"
        );
    }
}

#[test]
fn limit_and_offset_bind_last_as_integers() {
    let lowered = lower("a", Order::DescUpdateDate, 7, 3);
    let tail = &lowered.binds[lowered.binds.len() - 2..];
    assert_eq!(tail, [BindValue::Int(7), BindValue::Int(3)]);
}

#[test]
fn order_selects_distinct_order_by_clauses() {
    let asc = lower("a", Order::AscPostDate, 1, 0);
    let desc = lower("a", Order::DescUpdateDate, 1, 0);
    assert!(asc.sql.contains("posted_articles.id ASC"));
    assert!(desc.sql.contains("posted_articles.update_date DESC"));
}

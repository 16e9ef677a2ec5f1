#![allow(dead_code)]
//! Shared helpers for `tagsearch-syntax` integration tests.

use tagsearch_syntax::{parse_query, QueryTree};

pub fn canon(input: &str) -> String {
    match parse_query(input, None) {
        Some(tree) => tree.canonical(),
        None => String::new(),
    }
}

pub fn tree(input: &str) -> QueryTree {
    parse_query(input, None).expect("expected a non-empty query")
}

pub fn as_and(t: &QueryTree) -> &Vec<QueryTree> {
    match t {
        QueryTree::And(children) => children,
        other => panic!("expected And, got: {other:?}"),
    }
}

pub fn as_or(t: &QueryTree) -> &Vec<QueryTree> {
    match t {
        QueryTree::Or(children) => children,
        other => panic!("expected Or, got: {other:?}"),
    }
}

pub fn as_minus(t: &QueryTree) -> &Vec<QueryTree> {
    match t {
        QueryTree::Minus(children) => children,
        other => panic!("expected Minus, got: {other:?}"),
    }
}

pub fn tag_value(t: &QueryTree) -> &str {
    match t {
        QueryTree::Tag(v) => v,
        other => panic!("expected Tag, got: {other:?}"),
    }
}

mod common;
use common::*;
use tagsearch_syntax::{parse_query, QueryTree};

#[test]
fn parenthesis_redundancy_elision() {
    let variants = ["a b c", "(a b) c", "a (b c)", "a (b (c))"];
    let expected = canon("a b c");
    for v in variants {
        assert_eq!(canon(v), expected, "{v}");
    }
}

#[test]
fn permutation_insensitivity_of_and() {
    let a = canon("foo bar baz");
    let b = canon("baz foo bar");
    let c = canon("bar baz foo");
    assert_eq!(a, b);
    assert_eq!(b, c);
}

#[test]
fn permutation_insensitivity_of_or() {
    let a = canon("foo OR bar OR baz");
    let b = canon("baz OR foo OR bar");
    assert_eq!(a, b);
}

#[test]
fn canonicalization_idempotence() {
    for input in ["a b c", "(a OR b) -c", "\"x y\" OR z", "a -b -c"] {
        let once = canon(input);
        let twice = canon(&once);
        assert_eq!(once, twice, "input {input:?}");
    }
}

#[test]
fn reparsing_canonical_form_reproduces_same_tree() {
    let original = tree("(a OR b) c -d");
    let reparsed = parse_query(&original.canonical(), None).unwrap();
    assert_eq!(original, reparsed);
}

#[test]
fn duplicate_tags_are_preserved_not_deduplicated() {
    let t = tree("a OR b OR a");
    let children = as_or(&t);
    assert_eq!(children.len(), 3);
    let values: Vec<&str> = children.iter().map(tag_value).collect();
    assert_eq!(values, vec!["A", "A", "B"]);
}

#[test]
fn minus_first_child_position_is_significant() {
    let t = tree("b -a");
    let children = as_minus(&t);
    assert_eq!(tag_value(&children[0]), "B");
    assert_eq!(tag_value(&children[1]), "A");
}

#[test]
fn unterminated_quote_recovers_as_tag() {
    let t = tree("\"unterminated");
    assert_eq!(tag_value(&t), "UNTERMINATED");
}

#[test]
fn missing_closing_paren_recovers() {
    assert_eq!(canon("(a b"), canon("(a b)"));
}

#[test]
fn empty_query_has_no_tree() {
    assert!(parse_query("", None).is_none());
    assert!(parse_query("   ", None).is_none());
}

#[test]
fn whole_group_dropped_when_empty_inside() {
    // "()" contains nothing parseable; the whole group is dropped like any
    // other recoverable parse failure, leaving the remaining fact(s).
    assert_eq!(canon("() a"), canon("a"));
}

#[test]
fn tag_count_limit_drops_excess_tags_silently() {
    let t = parse_query("a b c d e", Some(3)).unwrap();
    let children = as_and(&t);
    assert_eq!(children.len(), 3);
}

#[test]
fn case_insensitive_or_keyword_via_normalization() {
    assert_eq!(canon("a or b"), canon("a OR b"));
    assert_eq!(canon("a Or b"), canon("a OR b"));
}

#[test]
fn quoted_tag_with_escaped_quote_round_trips() {
    let t = tree("\"ab\"\"cd\"");
    assert_eq!(tag_value(&t), "AB\"CD");
    assert_eq!(t.canonical(), "\"AB\"\"CD\"");
}

#[test]
fn bind_free_structural_check_for_intersection_expansion() {
    let t = tree("(a OR b) c");
    let children = as_and(&t);
    assert_eq!(children.len(), 2);
    match &children[0] {
        QueryTree::Paren(inner) => match inner.as_ref() {
            QueryTree::Or(parts) => assert_eq!(parts.len(), 2),
            other => panic!("expected Or, got {other:?}"),
        },
        other => panic!("expected Paren, got {other:?}"),
    }
}

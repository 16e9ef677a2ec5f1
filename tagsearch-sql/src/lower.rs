use crate::order::Order;
use tagsearch_syntax::QueryTree;

/// A single `?` placeholder's bound value. Tag literals bind as text; the
/// outer query's `LIMIT`/`OFFSET` bind as integers.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Int(i64),
}

/// The fully lowered statement: literal SQL text with positional `?`
/// placeholders, and the bind values in the exact order their placeholders
/// appear in `sql`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoweredQuery {
    pub sql: String,
    pub binds: Vec<BindValue>,
}

const TAG_SELECT_SQL: &str =
    "SELECT article_id FROM posted_articles_tags WHERE tag_id IN (SELECT id FROM tags WHERE norm_name = ?)";

/// Fresh alias counter threaded through lowering so nested subqueries get
/// unique `t0, t1, ...` aliases.
struct AliasSeq(u32);

impl AliasSeq {
    fn next(&mut self) -> u32 {
        let id = self.0;
        self.0 += 1;
        id
    }
}

struct Inner {
    sql: String,
    binds: Vec<BindValue>,
}

fn lower_inner(tree: &QueryTree, seq: &mut AliasSeq) -> Inner {
    match tree {
        QueryTree::Tag(v) => Inner {
            sql: TAG_SELECT_SQL.to_string(),
            binds: vec![BindValue::Text(v.clone())],
        },
        QueryTree::Paren(inner) => lower_inner(inner, seq),
        QueryTree::And(children) => fold(children, seq, join_and),
        QueryTree::Or(children) => fold(children, seq, join_or),
        QueryTree::Minus(children) => fold(children, seq, join_minus),
    }
}

fn fold(
    children: &[QueryTree],
    seq: &mut AliasSeq,
    combine: impl Fn(Inner, Inner, &mut AliasSeq) -> Inner,
) -> Inner {
    let mut iter = children.iter();
    let mut acc = lower_inner(iter.next().expect("binary node has at least one child"), seq);
    for child in iter {
        let rhs = lower_inner(child, seq);
        acc = combine(acc, rhs, seq);
    }
    acc
}

fn join_and(lhs: Inner, rhs: Inner, seq: &mut AliasSeq) -> Inner {
    let a = seq.next();
    let b = seq.next();
    let sql = format!(
        "SELECT t{a}.article_id FROM ({}) AS t{a} INNER JOIN ({}) AS t{b} ON t{a}.article_id = t{b}.article_id",
        lhs.sql, rhs.sql
    );
    let mut binds = lhs.binds;
    binds.extend(rhs.binds);
    Inner { sql, binds }
}

fn join_or(lhs: Inner, rhs: Inner, _seq: &mut AliasSeq) -> Inner {
    let sql = format!("({}) UNION ({})", lhs.sql, rhs.sql);
    let mut binds = lhs.binds;
    binds.extend(rhs.binds);
    Inner { sql, binds }
}

fn join_minus(lhs: Inner, rhs: Inner, seq: &mut AliasSeq) -> Inner {
    let a = seq.next();
    let sql = format!(
        "SELECT article_id FROM ({}) AS t{a} WHERE article_id NOT IN ({})",
        lhs.sql, rhs.sql
    );
    let mut binds = lhs.binds;
    binds.extend(rhs.binds);
    Inner { sql, binds }
}

/// Lowers a (possibly absent) query tree into the outer, pageable SELECT
/// statement. `tree = None` means no tag literal was parsed at all, and
/// the inner join against `posted_articles_tags` is skipped entirely
/// rather than emitted as a degenerate always-true filter.
pub fn lower_query(
    tree: Option<&QueryTree>,
    order: Order,
    limit: i64,
    offset: i64,
) -> LoweredQuery {
    let order_by = order.order_by_clause();
    match tree {
        None => LoweredQuery {
            sql: format!(
                "SELECT posted_articles.id FROM posted_articles {order_by} LIMIT ? OFFSET ?"
            ),
            binds: vec![BindValue::Int(limit), BindValue::Int(offset)],
        },
        Some(tree) => {
            let mut seq = AliasSeq(0);
            let inner = lower_inner(tree, &mut seq);
            let sql = format!(
                "SELECT posted_articles.id FROM posted_articles INNER JOIN ({}) AS r ON posted_articles.id = r.article_id {order_by} LIMIT ? OFFSET ?",
                inner.sql
            );
            let mut binds = inner.binds;
            binds.push(BindValue::Int(limit));
            binds.push(BindValue::Int(offset));
            LoweredQuery { sql, binds }
        }
    }
}

/// Lowers the same tree into a row-count statement — the façade's other
/// "local" populated alongside the id page on a cache miss. No
/// `ORDER BY`/`LIMIT`/`OFFSET`, since the count ignores pagination.
pub fn lower_count_query(tree: Option<&QueryTree>) -> LoweredQuery {
    match tree {
        None => LoweredQuery {
            sql: "SELECT COUNT(*) AS count FROM posted_articles".to_string(),
            binds: Vec::new(),
        },
        Some(tree) => {
            let mut seq = AliasSeq(0);
            let inner = lower_inner(tree, &mut seq);
            LoweredQuery {
                sql: format!(
                    "SELECT COUNT(*) AS count FROM posted_articles INNER JOIN ({}) AS r ON posted_articles.id = r.article_id",
                    inner.sql
                ),
                binds: inner.binds,
            }
        }
    }
}

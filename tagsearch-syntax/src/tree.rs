use std::cmp::Ordering;

/// Canonical, normalized query tree.
///
/// Every tree reachable through the public constructors (`tag`, `and`, `or`,
/// `minus`, `paren`) satisfies the invariants a cache key can rely on:
/// no `Paren` ever wraps another `Paren` or a bare `Tag`, no `And`/`Or` child
/// is a same-operator `Paren` (it gets flattened in), and every `And`/`Or`/
/// `Minus` has at least two children (singletons collapse to the child
/// itself). See [`QueryTree::canonical`] for the inverse: turning a tree back
/// into the unique string that produced it.
///
/// ```
/// use tagsearch_syntax::QueryTree;
/// let tree = QueryTree::and(vec![QueryTree::tag("FOO"), QueryTree::tag("BAR")]);
/// assert_eq!(tree.canonical(), "\"BAR\" \"FOO\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTree {
    Tag(String),
    And(Vec<QueryTree>),
    Or(Vec<QueryTree>),
    Minus(Vec<QueryTree>),
    Paren(Box<QueryTree>),
}

impl QueryTree {
    pub fn tag(value: impl Into<String>) -> QueryTree {
        QueryTree::Tag(value.into())
    }

    /// Wraps `inner` in a grouping marker, eliding the wrapper when `inner`
    /// is already a `Paren` (invariant 1) or a bare `Tag` (invariant 2).
    ///
    /// ```
    /// use tagsearch_syntax::QueryTree;
    /// // Paren around a leaf is elided entirely.
    /// assert_eq!(QueryTree::paren(QueryTree::tag("A")), QueryTree::tag("A"));
    /// ```
    pub fn paren(inner: QueryTree) -> QueryTree {
        match inner {
            QueryTree::Paren(boxed) => *boxed,
            QueryTree::Tag(v) => QueryTree::Tag(v),
            other => QueryTree::Paren(Box::new(other)),
        }
    }

    /// Builds an intersection, flattening nested `And`s (bare or
    /// `Paren`-wrapped) and sorting all operands into canonical order.
    /// A single resulting operand collapses to that operand (invariant 6).
    pub fn and(children: Vec<QueryTree>) -> QueryTree {
        build_flat(children, Op::And)
    }

    /// Builds a union. See [`QueryTree::and`] for the flattening rule.
    pub fn or(children: Vec<QueryTree>) -> QueryTree {
        build_flat(children, Op::Or)
    }

    /// Builds a left-folded set difference: `minus(a, [b, c]) = (a \ b) \ c`.
    /// `first` is the minuend and keeps its position; `tail` is sorted into
    /// canonical order. An empty `tail` collapses to `first` alone.
    ///
    /// ```
    /// use tagsearch_syntax::QueryTree;
    /// let tree = QueryTree::minus(QueryTree::tag("A"), vec![QueryTree::tag("C"), QueryTree::tag("B")]);
    /// assert_eq!(tree.canonical(), "\"A\"-\"B\"-\"C\"");
    /// ```
    pub fn minus(first: QueryTree, tail: Vec<QueryTree>) -> QueryTree {
        if tail.is_empty() {
            return first;
        }
        let mut tail = tail;
        tail.sort_by(canonical_cmp);
        let mut children = Vec::with_capacity(1 + tail.len());
        children.push(first);
        children.extend(tail);
        QueryTree::Minus(children)
    }

    /// Precedence level used by the comparator and by canonical
    /// reconstruction's parenthesization rule: `And` = 2, `Or`/`Minus` = 1.
    /// `None` for leaves and grouping markers.
    fn binary_level(&self) -> Option<u8> {
        match self {
            QueryTree::And(_) => Some(2),
            QueryTree::Or(_) | QueryTree::Minus(_) => Some(1),
            _ => None,
        }
    }

    /// Reconstructs the unique textual form of this tree: two trees built
    /// from queries that differ only in redundant parens, commutative
    /// operand order, or same-operator nesting canonicalize to the same
    /// string, and therefore hash to the same cache key.
    pub fn canonical(&self) -> String {
        match self {
            QueryTree::Tag(v) => format!("\"{}\"", v.replace('"', "\"\"")),
            QueryTree::Paren(inner) => match inner.as_ref() {
                QueryTree::Tag(_) => inner.canonical(),
                other => format!("({})", other.canonical()),
            },
            QueryTree::And(children) => join_binary(children, " ", 2),
            QueryTree::Or(children) => join_binary(children, "OR", 1),
            QueryTree::Minus(children) => join_binary(children, "-", 1),
        }
    }
}

fn join_binary(children: &[QueryTree], sep: &str, level: u8) -> String {
    children
        .iter()
        .map(|child| render_child(child, level))
        .collect::<Vec<_>>()
        .join(sep)
}

fn render_child(child: &QueryTree, parent_level: u8) -> String {
    match child.binary_level() {
        Some(child_level) if child_level < parent_level => format!("({})", child.canonical()),
        _ => child.canonical(),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Op {
    And,
    Or,
}

fn build_flat(children: Vec<QueryTree>, op: Op) -> QueryTree {
    let mut flat = Vec::with_capacity(children.len());
    for child in children {
        match child {
            QueryTree::And(inner) if op == Op::And => flat.extend(inner),
            QueryTree::Or(inner) if op == Op::Or => flat.extend(inner),
            QueryTree::Paren(boxed) => match (*boxed, op) {
                (QueryTree::And(inner), Op::And) => flat.extend(inner),
                (QueryTree::Or(inner), Op::Or) => flat.extend(inner),
                (other, _) => flat.push(QueryTree::paren(other)),
            },
            other => flat.push(other),
        }
    }

    match flat.len() {
        0 => panic!("and()/or() require at least one operand"),
        1 => flat.pop().unwrap(),
        _ => {
            flat.sort_by(canonical_cmp);
            match op {
                Op::And => QueryTree::And(flat),
                Op::Or => QueryTree::Or(flat),
            }
        }
    }
}

fn category(t: &QueryTree) -> u8 {
    match t {
        QueryTree::Paren(_) => 0,
        QueryTree::And(_) | QueryTree::Or(_) | QueryTree::Minus(_) => 1,
        QueryTree::Tag(_) => 2,
    }
}

/// Canonical enumeration order used as the comparator's operator tiebreak;
/// must be stable across runs, the exact ordering is otherwise arbitrary.
fn operator_rank(t: &QueryTree) -> u8 {
    match t {
        QueryTree::And(_) => 0,
        QueryTree::Minus(_) => 1,
        QueryTree::Or(_) => 2,
        _ => u8::MAX,
    }
}

fn child_count(t: &QueryTree) -> usize {
    match t {
        QueryTree::And(c) | QueryTree::Or(c) | QueryTree::Minus(c) => c.len(),
        _ => 0,
    }
}

/// Total order over query trees used to sort `And`/`Or` operands (and the
/// tail of `Minus`) into a canonical sequence.
///
/// Ranking, most to least significant:
/// 1. Category: `Paren` < binary (`And`/`Or`/`Minus`) < `Tag`.
/// 2. Within `Tag`: code-point lexical order of the value.
/// 3. Within `Paren`: recursively compare the wrapped child.
/// 4. Within binary nodes: descending precedence level, then ascending
///    canonical operator rank (`And`, `Minus`, `Or`), then descending child
///    count.
pub fn canonical_cmp(a: &QueryTree, b: &QueryTree) -> Ordering {
    let (ca, cb) = (category(a), category(b));
    if ca != cb {
        return ca.cmp(&cb);
    }
    match ca {
        2 => match (a, b) {
            (QueryTree::Tag(va), QueryTree::Tag(vb)) => va.cmp(vb),
            _ => unreachable!(),
        },
        0 => match (a, b) {
            (QueryTree::Paren(ia), QueryTree::Paren(ib)) => canonical_cmp(ia, ib),
            _ => unreachable!(),
        },
        1 => {
            let (la, lb) = (a.binary_level().unwrap(), b.binary_level().unwrap());
            lb.cmp(&la)
                .then_with(|| operator_rank(a).cmp(&operator_rank(b)))
                .then_with(|| child_count(b).cmp(&child_count(a)))
        }
        _ => unreachable!(),
    }
}

use crate::lexer::{Lexer, Token, TokenKind};
use crate::tree::QueryTree;

/// Recursive-descent parser over the grammar:
///
/// ```text
/// expr = term (OR term | '-' term)*
/// term = fact+
/// fact = '(' expr ')' | tag
/// ```
///
/// `expr` tracks an OR-list and a separate MINUS-list so the final node can
/// be built as `minus(or_aggregate, minus_list)` per [`QueryTree::minus`].
/// Parse failures (unterminated quotes, a missing closing paren, a stray
/// operator with nothing to apply to) are recovered silently: the offending
/// fragment is dropped and parsing continues. There is no fatal error path
/// in this grammar; `parse` never returns `Err`.
pub struct Parser {
    lexer: Lexer,
    current: Token,
    limit_tag: Option<u32>,
    tag_count: u32,
}

impl Parser {
    pub fn new(input: &str, limit_tag: Option<u32>) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            limit_tag,
            tag_count: 0,
        }
    }

    fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    fn is_or_keyword(&self) -> bool {
        self.current.kind == TokenKind::Word && self.current.text == "OR"
    }

    /// Consumes the whole input and returns the parsed tree, or `None` for
    /// an empty query (no tag literals parsed at all). Any trailing garbage
    /// left after a well-formed prefix is ignored rather than rejected.
    pub fn parse(mut self) -> Option<QueryTree> {
        self.parse_expr()
    }

    fn parse_expr(&mut self) -> Option<QueryTree> {
        let mut or_list = Vec::new();
        let mut minus_list = Vec::new();

        if let Some(t) = self.parse_term() {
            or_list.push(t);
        }

        loop {
            match self.current.kind {
                TokenKind::Minus => {
                    self.advance();
                    if let Some(t) = self.parse_term() {
                        minus_list.push(t);
                    }
                }
                _ if self.is_or_keyword() => {
                    self.advance();
                    if let Some(t) = self.parse_term() {
                        or_list.push(t);
                    }
                }
                _ => break,
            }
        }

        let or_node = match or_list.len() {
            0 => None,
            1 => Some(or_list.into_iter().next().unwrap()),
            _ => Some(QueryTree::or(or_list)),
        };

        match or_node {
            None => None,
            Some(base) if minus_list.is_empty() => Some(base),
            Some(base) => Some(QueryTree::minus(base, minus_list)),
        }
    }

    /// Collects consecutive facts until an `OR`, `-`, `)`, or end of input.
    fn parse_term(&mut self) -> Option<QueryTree> {
        let mut facts = Vec::new();
        loop {
            match self.current.kind {
                TokenKind::End | TokenKind::RParen | TokenKind::Minus => break,
                _ if self.is_or_keyword() => break,
                _ => match self.parse_fact() {
                    Some(fact) => facts.push(fact),
                    None => continue,
                },
            }
        }

        match facts.len() {
            0 => None,
            1 => Some(facts.into_iter().next().unwrap()),
            _ => Some(QueryTree::and(facts)),
        }
    }

    fn parse_fact(&mut self) -> Option<QueryTree> {
        match self.current.kind {
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr();
                if self.current.kind == TokenKind::RParen {
                    self.advance();
                }
                // A missing ')' (end of input reached instead) is tolerated:
                // whatever was parsed before EOF is kept as-is.
                inner.map(QueryTree::paren)
            }
            TokenKind::RParen => {
                // Unexpected close seen where a fact was expected; drop it.
                self.advance();
                None
            }
            TokenKind::Tag | TokenKind::Word => {
                let text = self.current.text.clone();
                self.advance();
                if self.tag_count >= self.limit_tag.unwrap_or(u32::MAX) {
                    return None;
                }
                self.tag_count += 1;
                Some(QueryTree::tag(text))
            }
            TokenKind::End | TokenKind::Minus => None,
        }
    }
}

/// Parses `input` into a canonical query tree, enforcing `limit_tag` as the
/// maximum number of `Tag` nodes that may be emitted (`None` = unlimited);
/// once the limit is reached, further facts are silently dropped rather
/// than erroring.
///
/// ```
/// use tagsearch_syntax::{parse_query, QueryTree};
/// let tree = parse_query("foo bar", None).unwrap();
/// assert_eq!(tree.canonical(), "\"BAR\" \"FOO\"");
/// assert!(parse_query("   ", None).is_none());
/// ```
pub fn parse_query(input: &str, limit_tag: Option<u32>) -> Option<QueryTree> {
    Parser::new(input, limit_tag).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon(input: &str) -> String {
        match parse_query(input, None) {
            Some(t) => t.canonical(),
            None => String::new(),
        }
    }

    #[test]
    fn empty_query_is_empty() {
        assert_eq!(canon(""), "");
        assert_eq!(canon("   "), "");
    }

    #[test]
    fn implicit_and_by_juxtaposition() {
        assert_eq!(canon("foo bar"), "\"BAR\" \"FOO\"");
    }

    #[test]
    fn explicit_or() {
        assert_eq!(canon("a OR b OR a"), "\"A\"OR\"A\"OR\"B\"");
    }

    #[test]
    fn minus_chain_keeps_minuend_first() {
        assert_eq!(canon("a -b -c"), "\"A\"-\"B\"-\"C\"");
    }

    #[test]
    fn parens_around_or_retained_under_and() {
        assert_eq!(canon("(a OR b) c"), "(\"A\"OR\"B\") \"C\"");
    }

    #[test]
    fn quoted_literal_with_escaped_quote() {
        assert_eq!(canon("\"ab\"\"cd\""), "\"AB\"\"CD\"");
    }

    #[test]
    fn redundant_parens_elide() {
        let variants = ["a b c", "(a b) c", "a (b c)", "a (b (c))"];
        let expected = canon("a b c");
        for v in variants {
            assert_eq!(canon(v), expected, "variant {v:?} should canonicalize identically");
        }
    }

    #[test]
    fn missing_closing_paren_is_tolerated() {
        assert_eq!(canon("(a b"), canon("(a b)"));
    }

    #[test]
    fn tag_limit_truncates_silently() {
        let tree = parse_query("a b c d", Some(2)).unwrap();
        match tree {
            QueryTree::And(children) => assert_eq!(children.len(), 2),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn or_keyword_is_case_insensitive_via_normalization() {
        assert_eq!(canon("a or b"), canon("a OR b"));
    }

    #[test]
    fn idempotent_canonicalization() {
        let input = "(a OR b) c -d";
        let once = canon(input);
        let twice = canon(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn permutation_insensitive_or() {
        let a = canon("x OR y OR z");
        let b = canon("z OR x OR y");
        let c = canon("y OR z OR x");
        assert_eq!(a, b);
        assert_eq!(b, c);
    }
}

//! Query parser for converting query strings to query trees.
//!
//! Supported syntax:
//! - Words: `apple`
//! - Phrases: `"apple pie"`
//! - Wildcards: `appl*` (prefix), `*ing` (suffix), `*ppl*` (substring)
//! - Boolean operators: `AND` / `&`, `OR` / `|`, `NOT` / `!`
//! - Parentheses: `(apple OR pear) AND NOT tart`
//!
//! Precedence is NOT > AND > OR. Adjacent operands are joined by AND, or
//! by OR when `space_means_or` is set. Groups nest at most
//! [`DEFAULT_MAX_QUERY_DEPTH`] levels deep unless configured otherwise.
//!
//! # Examples
//!
//! ```
//! use lectern::query::ast::QueryNode;
//! use lectern::query::parser::QueryParser;
//!
//! let parser = QueryParser::new();
//! let tree = parser.parse("apple pie").unwrap();
//! assert_eq!(tree, QueryNode::And(vec![
//!     QueryNode::Term("apple".into()),
//!     QueryNode::Term("pie".into()),
//! ]));
//!
//! let err = parser.parse("(apple").unwrap_err();
//! assert_eq!(err.syntax_position(), Some(0));
//! ```

use crate::error::{LecternError, Result};
use crate::query::ast::{QueryNode, WildcardKind};
use crate::query::lexer::{QueryToken, TokenKind, tokenize};

/// Default minimum literal length of a `*x*` pattern.
pub const DEFAULT_MIN_SUBSTRING_LITERAL: usize = 2;

/// Default limit on nested parentheses.
pub const DEFAULT_MAX_QUERY_DEPTH: usize = 128;

/// Parses query strings into [`QueryNode`] trees.
#[derive(Debug, Clone)]
pub struct QueryParser {
    space_means_or: bool,
    min_substring_literal: usize,
    max_depth: usize,
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryParser {
    /// Create a parser where whitespace means AND.
    pub fn new() -> Self {
        QueryParser {
            space_means_or: false,
            min_substring_literal: DEFAULT_MIN_SUBSTRING_LITERAL,
            max_depth: DEFAULT_MAX_QUERY_DEPTH,
        }
    }

    /// Make whitespace between operands mean OR.
    pub fn with_space_means_or(mut self, space_means_or: bool) -> Self {
        self.space_means_or = space_means_or;
        self
    }

    /// Set the minimum literal length of substring wildcards.
    pub fn with_min_substring_literal(mut self, min: usize) -> Self {
        self.min_substring_literal = min;
        self
    }

    /// Set how many parenthesized groups may nest inside each other.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse a query string.
    pub fn parse(&self, query: &str) -> Result<QueryNode> {
        let tokens = tokenize(query)?;
        if tokens.is_empty() {
            return Err(LecternError::query_syntax(0, "empty query"));
        }

        let mut parser = TokenParser {
            tokens,
            cursor: 0,
            depth: 0,
            end: query.chars().count(),
            options: self,
        };
        let tree = parser.parse_or_expression()?;

        if let Some(token) = parser.peek() {
            let message = match token.kind {
                TokenKind::RParen => "unbalanced ')'".to_string(),
                _ => format!("unexpected {}", token.describe()),
            };
            return Err(LecternError::query_syntax(token.position, message));
        }
        Ok(tree)
    }
}

struct TokenParser<'a> {
    tokens: Vec<QueryToken>,
    cursor: usize,
    depth: usize,
    end: usize,
    options: &'a QueryParser,
}

impl TokenParser<'_> {
    fn peek(&self) -> Option<&QueryToken> {
        self.tokens.get(self.cursor)
    }

    fn next(&mut self) -> Option<QueryToken> {
        let token = self.tokens.get(self.cursor).cloned();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    /// Whether the next token can begin an operand.
    fn starts_operand(&self) -> bool {
        matches!(
            self.peek_kind(),
            Some(TokenKind::Word(_) | TokenKind::Phrase(_) | TokenKind::Not | TokenKind::LParen)
        )
    }

    fn parse_or_expression(&mut self) -> Result<QueryNode> {
        let mut children = vec![self.parse_and_expression()?];

        loop {
            if self.peek_kind() == Some(&TokenKind::Or) {
                let operator = self.next();
                children.push(self.parse_operand_after(operator, Self::parse_and_expression)?);
            } else if self.options.space_means_or && self.starts_operand() {
                children.push(self.parse_and_expression()?);
            } else {
                break;
            }
        }

        Ok(QueryNode::or(children))
    }

    fn parse_and_expression(&mut self) -> Result<QueryNode> {
        let mut children = vec![self.parse_not_expression()?];

        loop {
            if self.peek_kind() == Some(&TokenKind::And) {
                let operator = self.next();
                children.push(self.parse_operand_after(operator, Self::parse_not_expression)?);
            } else if !self.options.space_means_or && self.starts_operand() {
                children.push(self.parse_not_expression()?);
            } else {
                break;
            }
        }

        Ok(QueryNode::and(children))
    }

    /// A run of NOTs is read in one pass and only its parity is kept.
    fn parse_not_expression(&mut self) -> Result<QueryNode> {
        let mut negations = 0usize;
        let mut operator = None;
        while self.peek_kind() == Some(&TokenKind::Not) {
            operator = self.next();
            negations += 1;
        }
        if negations == 0 {
            return self.parse_primary();
        }

        let child = self.parse_operand_after(operator, Self::parse_primary)?;
        // NOT NOT x keeps x's documents but not its scores.
        Ok(match negations % 2 {
            1 => QueryNode::not(child),
            _ => QueryNode::not(QueryNode::not(child)),
        })
    }

    /// Parse the right-hand operand of a binary or unary operator, reporting
    /// a missing operand at the operator.
    fn parse_operand_after(
        &mut self,
        operator: Option<QueryToken>,
        parse: fn(&mut Self) -> Result<QueryNode>,
    ) -> Result<QueryNode> {
        if self.starts_operand() {
            return parse(self);
        }
        let (position, name) = operator
            .map(|op| (op.position, op.describe()))
            .unwrap_or((self.end, "operator".to_string()));
        Err(LecternError::query_syntax(
            position,
            format!("{name} is missing an operand"),
        ))
    }

    fn parse_primary(&mut self) -> Result<QueryNode> {
        let Some(token) = self.next() else {
            return Err(LecternError::query_syntax(
                self.end,
                "unexpected end of query",
            ));
        };

        match token.kind {
            TokenKind::Word(word) => self.parse_word(&word, token.position),
            TokenKind::Phrase(text) => parse_phrase(&text, token.position),
            TokenKind::LParen => {
                if self.peek_kind() == Some(&TokenKind::RParen) {
                    return Err(LecternError::query_syntax(token.position, "empty group"));
                }
                if self.depth >= self.options.max_depth {
                    return Err(LecternError::query_syntax(
                        token.position,
                        format!("groups nest deeper than {} levels", self.options.max_depth),
                    ));
                }
                self.depth += 1;
                let inner = self.parse_or_expression()?;
                self.depth -= 1;
                match self.next() {
                    Some(QueryToken {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(inner),
                    _ => Err(LecternError::query_syntax(token.position, "unclosed '('")),
                }
            }
            TokenKind::RParen => Err(LecternError::query_syntax(
                token.position,
                "unbalanced ')'",
            )),
            TokenKind::And | TokenKind::Or | TokenKind::Not => Err(LecternError::query_syntax(
                token.position,
                format!("{} is missing an operand", token.describe()),
            )),
        }
    }

    fn parse_word(&self, word: &str, position: usize) -> Result<QueryNode> {
        let leading = word.starts_with('*');
        let trailing = word.ends_with('*') && word.len() > 1;
        let core = word.trim_start_matches('*').trim_end_matches('*');

        if core.is_empty() {
            return Err(LecternError::query_syntax(
                position,
                "wildcard has no literal text",
            ));
        }
        let leading_stars = word.chars().take_while(|&c| c == '*').count();
        if let Some(offset) = core.chars().position(|c| c == '*') {
            return Err(LecternError::query_syntax(
                position + leading_stars + offset,
                "'*' is only allowed at the start or end of a word",
            ));
        }

        let kind = match (leading, trailing) {
            (false, false) => return Ok(QueryNode::Term(word.to_string())),
            (false, true) => WildcardKind::Prefix,
            (true, false) => WildcardKind::Suffix,
            (true, true) => WildcardKind::Substring,
        };

        if kind == WildcardKind::Substring
            && core.chars().count() < self.options.min_substring_literal
        {
            return Err(LecternError::query_syntax(
                position,
                format!(
                    "substring pattern needs at least {} literal characters",
                    self.options.min_substring_literal
                ),
            ));
        }

        Ok(QueryNode::Wildcard {
            pattern: core.to_string(),
            kind,
        })
    }
}

/// Wildcards are ignored inside phrases.
fn parse_phrase(text: &str, position: usize) -> Result<QueryNode> {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|word| word.trim_matches('*'))
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect();

    if words.is_empty() {
        return Err(LecternError::query_syntax(position, "empty phrase"));
    }
    Ok(QueryNode::Phrase(words))
}

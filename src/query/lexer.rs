//! Query string lexer.
//!
//! `(`, `)`, `"`, `&`, `|` and `!` always stand on their own; everything
//! else is split on whitespace. The keywords `AND`, `OR` and `NOT` are
//! recognized only in exactly that case. Positions are zero-based
//! character offsets into the query string.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::{LecternError, Result};

/// Kind of a lexed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Word(String),
    /// Raw text between a pair of double quotes.
    Phrase(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

/// A token and where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryToken {
    pub kind: TokenKind,
    pub position: usize,
}

impl QueryToken {
    fn new(kind: TokenKind, position: usize) -> Self {
        QueryToken { kind, position }
    }

    /// Short description for error messages.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Word(word) => format!("'{word}'"),
            TokenKind::Phrase(_) => "phrase".to_string(),
            TokenKind::And => "AND".to_string(),
            TokenKind::Or => "OR".to_string(),
            TokenKind::Not => "NOT".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
        }
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '"' | '&' | '|' | '!')
}

/// Split a query string into tokens.
pub fn tokenize(query: &str) -> Result<Vec<QueryToken>> {
    QueryLexer::new(query).collect()
}

/// Streaming lexer over a query string.
pub struct QueryLexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    // Byte offset -> character offset bookkeeping.
    char_pos: usize,
}

impl<'a> QueryLexer<'a> {
    pub fn new(source: &'a str) -> Self {
        QueryLexer {
            source,
            chars: source.char_indices().peekable(),
            char_pos: 0,
        }
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if next.is_some() {
            self.char_pos += 1;
        }
        next
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.bump();
        }
    }

    fn lex_phrase(&mut self, open_position: usize) -> Result<QueryToken> {
        let mut text = String::new();
        loop {
            match self.bump() {
                Some((_, '"')) => return Ok(QueryToken::new(TokenKind::Phrase(text), open_position)),
                Some((_, c)) => text.push(c),
                None => {
                    return Err(LecternError::query_syntax(
                        open_position,
                        "unterminated quote",
                    ));
                }
            }
        }
    }

    fn lex_word(&mut self, start_byte: usize, position: usize) -> QueryToken {
        let mut end_byte = start_byte;
        while let Some(&(offset, c)) = self.chars.peek() {
            if is_delimiter(c) {
                break;
            }
            end_byte = offset + c.len_utf8();
            self.bump();
        }

        let word = &self.source[start_byte..end_byte];
        let kind = match word {
            "AND" => TokenKind::And,
            "OR" => TokenKind::Or,
            "NOT" => TokenKind::Not,
            _ => TokenKind::Word(word.to_string()),
        };
        QueryToken::new(kind, position)
    }
}

impl Iterator for QueryLexer<'_> {
    type Item = Result<QueryToken>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();

        let position = self.char_pos;
        let &(offset, c) = self.chars.peek()?;
        let token = match c {
            '(' | ')' | '&' | '|' | '!' => {
                self.bump();
                let kind = match c {
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    '&' => TokenKind::And,
                    '|' => TokenKind::Or,
                    _ => TokenKind::Not,
                };
                Ok(QueryToken::new(kind, position))
            }
            '"' => {
                self.bump();
                self.lex_phrase(position)
            }
            _ => Ok(self.lex_word(offset, position)),
        };
        Some(token)
    }
}

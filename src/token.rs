//! The token definition for the search-query syntax.

/// A token is a single unit of the query, with a specific kind and location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub span: Span,
}

/// The kind of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind<'a> {
    /// A double-quoted phrase, stored with its surrounding quotes.
    Phrase(&'a str),
    /// A bare word: a maximal run of non-whitespace, non-parenthesis
    /// characters. May carry a `-` prefix or a `key:value` operator.
    Word(&'a str),
    /// The alternation keyword, exactly `OR`.
    Or,
    LParen, // (
    RParen, // )
}

impl<'a> TokenKind<'a> {
    /// The lexeme as it appears in the input.
    pub fn text(&self) -> &'a str {
        match self {
            TokenKind::Phrase(s) | TokenKind::Word(s) => s,
            TokenKind::Or => "OR",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
        }
    }

    /// The interior of a quoted phrase, without the quotes.
    pub fn phrase_content(&self) -> Option<&'a str> {
        match self {
            TokenKind::Phrase(s) => Some(&s[1..s.len() - 1]),
            _ => None,
        }
    }
}

/// Represents a span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// The starting byte offset.
    pub start: usize,
    /// The ending byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

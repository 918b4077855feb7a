//! Lexer for brace-delimited source languages.
//!
//! Tokenizes source text into a stream of tokens with their byte ranges.

mod tokens;

pub use tokens::{CommentStyle, TokenKind};

use logos::Logos;
use text_size::{TextRange, TextSize};

/// A token produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The byte range of the token in the source text.
    pub range: TextRange,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub fn new(kind: TokenKind, range: TextRange) -> Self {
        Self { kind, range }
    }
}

/// Lexer over source text.
///
/// The lexer is an iterator over tokens. Unrecognized input is returned as
/// `TokenKind::Error` instead of stopping the stream.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
}

impl<'src> Lexer<'src> {
    /// Creates a lexer with flat block comments.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self::with_style(source, CommentStyle::Flat)
    }

    /// Creates a lexer that treats block comments according to `style`.
    #[must_use]
    pub fn with_style(source: &'src str, style: CommentStyle) -> Self {
        Self {
            inner: TokenKind::lexer_with_extras(source, style),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let kind = self.inner.next()?;
        let span = self.inner.span();

        let kind = kind.unwrap_or(TokenKind::Error);
        let range = TextRange::new(
            TextSize::from(span.start as u32),
            TextSize::from(span.end as u32),
        );
        Some(Token::new(kind, range))
    }
}

/// Lex the entire source and return all tokens.
#[must_use]
pub fn lex(source: &str) -> Vec<Token> {
    Lexer::new(source).collect()
}

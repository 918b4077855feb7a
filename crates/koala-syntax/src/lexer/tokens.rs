//! Token definitions for brace-delimited source languages.
//!
//! The token set is deliberately coarse: it covers what the outline parser
//! needs to find function boundaries in Kotlin, Java, Rust, Go, JavaScript
//! and similar languages. Anything else is lexed as [`TokenKind::Punct`] or
//! [`TokenKind::Error`].

use logos::Logos;

/// How a language treats `/*` inside a block comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommentStyle {
    /// The first `*/` closes the comment (Java, C, Go, JavaScript).
    #[default]
    Flat,
    /// Block comments nest (Kotlin, Rust, Swift, Scala).
    Nested,
}

impl CommentStyle {
    /// Style for a file extension without the dot; unknown extensions are flat.
    #[must_use]
    pub fn for_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "kt" | "kts" | "rs" | "swift" | "scala" => Self::Nested,
            _ => Self::Flat,
        }
    }
}

fn lex_block_comment(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let bytes = lex.remainder().as_bytes();
    if lex.extras == CommentStyle::Flat {
        return match lex.remainder().find("*/") {
            Some(end) => {
                lex.bump(end + 2);
                true
            }
            None => {
                lex.bump(bytes.len());
                false
            }
        };
    }

    let mut depth = 1usize;
    let mut i = 0usize;
    while i + 1 < bytes.len() {
        if bytes[i] == b'/' && bytes[i + 1] == b'*' {
            depth += 1;
            i += 2;
            continue;
        }
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            depth -= 1;
            i += 2;
            if depth == 0 {
                lex.bump(i);
                return true;
            }
            continue;
        }
        i += 1;
    }

    lex.bump(bytes.len());
    false
}

fn lex_raw_string(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let rest = lex.remainder();
    match rest.find("\"\"\"") {
        Some(end) => {
            lex.bump(end + 3);
            true
        }
        None => {
            lex.bump(rest.len());
            false
        }
    }
}

/// All token kinds recognised by the lexer.
///
/// - Trivia (whitespace, comments)
/// - Braces, parentheses and the few operators the outline cares about
/// - Control-flow and declaration keywords
/// - Literals and identifiers
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[logos(extras = CommentStyle)]
#[repr(u16)]
#[derive(Default)]
pub enum TokenKind {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    /// Whitespace (spaces, tabs, newlines)
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    /// Single-line comment: // ...
    #[regex(r"//[^\r\n]*", allow_greedy = true)]
    LineComment,

    /// Block comment: /* ... */ (nesting per [`CommentStyle`]).
    #[token("/*", lex_block_comment)]
    BlockComment,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    /// `{`
    #[token("{")]
    LBrace,

    /// `}`
    #[token("}")]
    RBrace,

    /// `(`
    #[token("(")]
    LParen,

    /// `)`
    #[token(")")]
    RParen,

    /// `;`
    #[token(";")]
    Semicolon,

    /// `=` (assignment or expression body)
    #[token("=")]
    Eq,

    /// Two-character operators that contain `=` or `>`.
    #[token("==")]
    #[token("!=")]
    #[token("<=")]
    #[token(">=")]
    #[token("=>")]
    #[token("->")]
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    Operator,

    /// Any other single punctuation character.
    #[regex(r"[.,:<>+\-*/%&|^!?~@#$\[\]\\]")]
    Punct,

    // =========================================================================
    // CONTROL-FLOW KEYWORDS
    // =========================================================================
    /// `if`
    #[token("if")]
    KwIf,

    /// `else`
    #[token("else")]
    KwElse,

    /// `while`
    #[token("while")]
    KwWhile,

    /// `for`
    #[token("for")]
    KwFor,

    /// `try`
    #[token("try")]
    KwTry,

    // =========================================================================
    // DECLARATION KEYWORDS
    // =========================================================================
    /// Function keywords: `fn`, `fun`, `func`, `function`
    #[token("fn")]
    #[token("fun")]
    #[token("func")]
    #[token("function")]
    KwFunction,

    /// Type keywords: `class`, `interface`, `enum`, `object`, `struct`,
    /// `impl`, `trait`, `record`
    #[token("class")]
    #[token("interface")]
    #[token("enum")]
    #[token("object")]
    #[token("struct")]
    #[token("impl")]
    #[token("trait")]
    #[token("record")]
    KwType,

    // =========================================================================
    // LITERALS
    // =========================================================================
    /// Numeric literal: 42, 0xFF, 1_000L, 3.14f
    #[regex(r"[0-9][0-9A-Za-z_.]*")]
    NumberLiteral,

    /// Double-quoted string with backslash escapes.
    #[regex(r#""([^"\\\r\n]|\\.)*""#)]
    StringLiteral,

    /// Triple-quoted raw string: """ ... """
    #[token("\"\"\"", lex_raw_string)]
    RawStringLiteral,

    /// Character literal: 'a', '\n', 'A'
    #[regex(r"'([^'\\\r\n]|\\[^\r\n][^'\r\n]*)'")]
    CharLiteral,

    // =========================================================================
    // IDENTIFIERS
    // =========================================================================
    /// Identifier: starts with letter or underscore, contains letters, digits, underscores
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    // =========================================================================
    // SPECIAL TOKENS
    // =========================================================================
    /// Lexer error - unrecognized character, unterminated comment or string
    #[default]
    Error,
}

impl TokenKind {
    /// Returns `true` if this token is trivia (whitespace or comment).
    #[inline]
    #[must_use]
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::Whitespace | Self::LineComment | Self::BlockComment
        )
    }

    /// Distinct bit per control-flow keyword, used to count keyword kinds.
    #[must_use]
    pub fn control_keyword_bit(self) -> Option<u8> {
        match self {
            Self::KwIf => Some(1 << 0),
            Self::KwElse => Some(1 << 1),
            Self::KwWhile => Some(1 << 2),
            Self::KwFor => Some(1 << 3),
            Self::KwTry => Some(1 << 4),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<(TokenKind, &str)> {
        lex_as(source, CommentStyle::Flat)
    }

    fn lex_as(source: &str, style: CommentStyle) -> Vec<(TokenKind, &str)> {
        let mut lexer = TokenKind::lexer_with_extras(source, style);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next() {
            tokens.push((token.unwrap_or(TokenKind::Error), lexer.slice()));
        }
        tokens
    }

    #[test]
    fn test_keywords_versus_identifiers() {
        let tokens = lex("if iffy format for_each fun funny");
        let kinds: Vec<_> = tokens
            .iter()
            .map(|(k, _)| *k)
            .filter(|k| !k.is_trivia())
            .collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::KwIf,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::KwFunction,
                TokenKind::Ident,
            ]
        );
    }

    #[test]
    fn test_nested_block_comment() {
        let tokens = lex_as(
            "/* outer /* inner */ still outer */ x",
            CommentStyle::Nested,
        );
        assert_eq!(tokens[0].0, TokenKind::BlockComment);
        assert_eq!(tokens[0].1, "/* outer /* inner */ still outer */");
        assert_eq!(tokens[2], (TokenKind::Ident, "x"));
    }

    #[test]
    fn test_flat_block_comment_closes_at_first_terminator() {
        let tokens = lex("/* see /* legacy */ x");
        assert_eq!(tokens[0], (TokenKind::BlockComment, "/* see /* legacy */"));
        assert_eq!(tokens[2], (TokenKind::Ident, "x"));
    }

    #[test]
    fn test_comment_style_by_extension() {
        assert_eq!(CommentStyle::for_extension("kt"), CommentStyle::Nested);
        assert_eq!(CommentStyle::for_extension("RS"), CommentStyle::Nested);
        assert_eq!(CommentStyle::for_extension("java"), CommentStyle::Flat);
        assert_eq!(CommentStyle::for_extension(""), CommentStyle::Flat);
    }

    #[test]
    fn test_strings_hide_braces() {
        let tokens = lex(r#""{ not a brace }" """raw { }""" '{'"#);
        let kinds: Vec<_> = tokens
            .iter()
            .map(|(k, _)| *k)
            .filter(|k| !k.is_trivia())
            .collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::StringLiteral,
                TokenKind::RawStringLiteral,
                TokenKind::CharLiteral
            ]
        );
    }

    #[test]
    fn test_control_keyword_bits_are_distinct() {
        let bits: Vec<u8> = [
            TokenKind::KwIf,
            TokenKind::KwElse,
            TokenKind::KwWhile,
            TokenKind::KwFor,
            TokenKind::KwTry,
        ]
        .iter()
        .filter_map(|kind| kind.control_keyword_bit())
        .collect();
        assert_eq!(bits.len(), 5);
        assert_eq!(bits.iter().fold(0u8, |acc, bit| acc | bit).count_ones(), 5);
        assert!(TokenKind::Ident.control_keyword_bit().is_none());
    }
}

//! `koala-syntax` - Lexing and function outlines for brace-delimited sources.
//!
//! This crate provides the structural view that the heuristic scanner needs:
//!
//! - **Lexer**: Tokenizes source text, keeping comments and strings opaque
//! - **Outline**: Finds function and method bodies with their line spans and
//!   the control-flow keywords they contain
//!
//! # Example
//!
//! ```
//! use koala_syntax::outline;
//!
//! let source = "fun greet(name: String) {\n    if (name.isEmpty()) return\n}\n";
//! let spans = outline(source).unwrap();
//!
//! assert_eq!(spans.len(), 1);
//! assert_eq!(spans[0].name.as_deref(), Some("greet"));
//! assert_eq!(spans[0].start_line, 0);
//! assert_eq!(spans[0].end_line, 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod lexer;
mod line_index;
mod outline;

pub use lexer::{lex, CommentStyle, Lexer, Token, TokenKind};
pub use line_index::LineIndex;
pub use outline::{outline, outline_with, FunctionSpan, ParseError};

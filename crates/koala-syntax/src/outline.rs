//! Function outline extraction.
//!
//! The outline parser is not a full grammar. It tracks brace blocks and the
//! declaration that precedes each block, which is enough to recover function
//! and method boundaries in the common brace-delimited languages:
//!
//! - keyword declarations: `fun`, `fn`, `func`, `function`
//! - Java-style methods: `<modifiers> <type> name(<params>) [throws ...] {`
//!   directly inside a type body
//!
//! Expression-bodied declarations (`fun f() = ...`) and bodiless ones
//! (`fn f();`, abstract methods) produce no span.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};
use thiserror::Error;

use crate::lexer::{CommentStyle, Lexer, TokenKind};
use crate::line_index::LineIndex;

/// Structural failure while outlining a file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A closing brace without a matching open brace.
    #[error("unmatched '}}' at line {}", .line + 1)]
    UnmatchedClose {
        /// Zero-based line of the brace.
        line: u32,
    },

    /// A block that is still open at end of file.
    #[error("block opened at line {} is never closed", .line + 1)]
    UnclosedBlock {
        /// Zero-based line of the opening brace.
        line: u32,
    },

    /// A `/*` comment that runs to end of file.
    #[error("unterminated block comment starting at line {}", .line + 1)]
    UnterminatedComment {
        /// Zero-based line of the `/*`.
        line: u32,
    },
}

/// A function or method body found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpan {
    /// Declared name, when one could be identified.
    pub name: Option<SmolStr>,
    /// Zero-based line of the declaration start.
    pub start_line: u32,
    /// Zero-based line of the closing brace.
    pub end_line: u32,
    /// Declaration start through the closing brace.
    pub range: TextRange,
    /// Opening brace through the closing brace.
    pub body: TextRange,
    control_keywords: u8,
}

impl FunctionSpan {
    /// Number of source lines covered, declaration line and closing line included.
    #[must_use]
    pub fn line_span(&self) -> u32 {
        self.end_line - self.start_line + 1
    }

    /// Number of distinct control-flow keyword kinds (`if`, `else`, `while`,
    /// `for`, `try`) that appear in the body, nested bodies included.
    #[must_use]
    pub fn control_keyword_kinds(&self) -> u32 {
        self.control_keywords.count_ones()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Type,
    Function(usize),
    Other,
}

#[derive(Debug, Clone, Default)]
enum Signature {
    #[default]
    None,
    Params {
        name: SmolStr,
    },
    Complete {
        name: SmolStr,
    },
}

#[derive(Debug, Clone)]
struct PendingFunction {
    name: Option<SmolStr>,
    start: TextSize,
    awaiting_name: bool,
}

/// Declaration state since the last boundary (`;`, `{` or `}`).
#[derive(Debug, Clone, Default)]
struct Pending {
    decl_start: Option<TextSize>,
    function: Option<PendingFunction>,
    is_type: bool,
    assigned: bool,
    signature: Signature,
    last_ident: Option<SmolStr>,
    new_call: bool,
}

#[derive(Debug)]
struct Block {
    kind: BlockKind,
    open: TextSize,
    saved_parens: u32,
    saved_pending: Option<Pending>,
}

/// Outline every function body in `source`, with flat block comments.
pub fn outline(source: &str) -> Result<Vec<FunctionSpan>, ParseError> {
    outline_with(source, CommentStyle::Flat)
}

/// Outline every function body in `source`, lexing block comments per `style`.
pub fn outline_with(source: &str, style: CommentStyle) -> Result<Vec<FunctionSpan>, ParseError> {
    let index = LineIndex::new(source);
    let mut functions: Vec<FunctionSpan> = Vec::new();
    let mut stack: Vec<Block> = Vec::new();
    let mut pending = Pending::default();
    let mut parens = 0u32;
    let mut prev = None;

    for token in Lexer::with_style(source, style).filter(|token| !token.kind.is_trivia()) {
        let start = token.range.start();
        let text = &source[token.range];

        if token.kind == TokenKind::Error && text.starts_with("/*") {
            return Err(ParseError::UnterminatedComment {
                line: index.line_of(start),
            });
        }
        let is_boundary = matches!(
            token.kind,
            TokenKind::LBrace | TokenKind::RBrace | TokenKind::Semicolon
        );
        if pending.decl_start.is_none() && !is_boundary {
            pending.decl_start = Some(start);
        }
        let in_type_body = matches!(
            stack.last(),
            Some(Block {
                kind: BlockKind::Type,
                ..
            })
        );

        match token.kind {
            TokenKind::Semicolon if parens == 0 => pending = Pending::default(),
            TokenKind::LBrace => {
                // `new Foo(...) {` opens an anonymous class body.
                let anonymous_class = pending.new_call && prev == Some(TokenKind::RParen);
                let kind = if anonymous_class {
                    BlockKind::Type
                } else if parens > 0 {
                    BlockKind::Other
                } else if let Some(function) = pending.function.take() {
                    functions.push(new_span(
                        function.name,
                        function.start,
                        token.range,
                        &index,
                    ));
                    BlockKind::Function(functions.len() - 1)
                } else if pending.is_type {
                    BlockKind::Type
                } else if let (true, Signature::Complete { name }) =
                    (in_type_body, &pending.signature)
                {
                    let decl_start = pending.decl_start.unwrap_or(start);
                    functions.push(new_span(
                        Some(name.clone()),
                        decl_start,
                        token.range,
                        &index,
                    ));
                    BlockKind::Function(functions.len() - 1)
                } else {
                    BlockKind::Other
                };
                let saved_pending = (parens > 0).then(|| std::mem::take(&mut pending));
                stack.push(Block {
                    kind,
                    open: start,
                    saved_parens: parens,
                    saved_pending,
                });
                pending = Pending::default();
                parens = 0;
            }
            TokenKind::RBrace => {
                let Some(block) = stack.pop() else {
                    return Err(ParseError::UnmatchedClose {
                        line: index.line_of(start),
                    });
                };
                if let BlockKind::Function(idx) = block.kind {
                    let span = &mut functions[idx];
                    span.end_line = index.line_of(start);
                    span.range = TextRange::new(span.range.start(), token.range.end());
                    span.body = TextRange::new(span.body.start(), token.range.end());
                }
                parens = block.saved_parens;
                pending = block.saved_pending.unwrap_or_default();
            }
            TokenKind::LParen => {
                parens += 1;
                let method_candidate =
                    in_type_body && !pending.assigned && pending.function.is_none();
                if parens == 1 && method_candidate {
                    if let Some(name) = pending.last_ident.take() {
                        pending.signature = Signature::Params { name };
                    }
                }
            }
            TokenKind::RParen => {
                parens = parens.saturating_sub(1);
                if parens == 0 {
                    if let Signature::Params { name } = &pending.signature {
                        pending.signature = Signature::Complete { name: name.clone() };
                    }
                }
            }
            TokenKind::Eq if parens == 0 => {
                pending.assigned = true;
                pending.function = None;
                pending.signature = Signature::None;
            }
            TokenKind::KwFunction if parens == 0 => {
                pending.function = Some(PendingFunction {
                    name: None,
                    start,
                    awaiting_name: true,
                });
            }
            TokenKind::KwType if parens == 0 => pending.is_type = true,
            TokenKind::Ident => {
                if parens == 0 {
                    if let Some(function) = pending.function.as_mut() {
                        if function.awaiting_name {
                            function.name = Some(SmolStr::new(text));
                            function.awaiting_name = false;
                        }
                    }
                }
                if text == "new" {
                    pending.new_call = true;
                }
                pending.last_ident = Some(SmolStr::new(text));
            }
            TokenKind::Punct if text == "." && parens == 0 => {
                // `fun Receiver.name()` names the function after the dot.
                if let Some(function) = pending.function.as_mut() {
                    function.awaiting_name = true;
                }
            }
            kind => {
                if let Some(bit) = kind.control_keyword_bit() {
                    for block in &stack {
                        if let BlockKind::Function(idx) = block.kind {
                            functions[idx].control_keywords |= bit;
                        }
                    }
                }
            }
        }
        if token.kind != TokenKind::Ident {
            pending.last_ident = None;
        }
        prev = Some(token.kind);
    }

    if let Some(block) = stack.last() {
        return Err(ParseError::UnclosedBlock {
            line: index.line_of(block.open),
        });
    }
    Ok(functions)
}

fn new_span(
    name: Option<SmolStr>,
    start: TextSize,
    lbrace: TextRange,
    index: &LineIndex,
) -> FunctionSpan {
    FunctionSpan {
        name,
        start_line: index.line_of(start),
        end_line: index.line_of(lbrace.start()),
        range: TextRange::new(start, lbrace.end()),
        body: lbrace,
        control_keywords: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(source: &str) -> Vec<String> {
        outline(source)
            .unwrap()
            .into_iter()
            .map(|span| span.name.map(|name| name.to_string()).unwrap_or_default())
            .collect()
    }

    #[test]
    fn kotlin_functions_and_expression_bodies() {
        let source = "fun a() = 1\nfun b(): Int {\n    return 2\n}\n";
        assert_eq!(names(source), vec!["b"]);
        let spans = outline(source).unwrap();
        assert_eq!(spans[0].start_line, 1);
        assert_eq!(spans[0].end_line, 3);
        assert_eq!(spans[0].line_span(), 3);
    }

    #[test]
    fn java_methods_inside_class_body() {
        let source = "class A {\n  int x = compute(1);\n  @Override\n  public void run() throws E {\n    if (x) { go(); }\n  }\n  abstract void skip();\n}\n";
        let spans = outline(source).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name.as_deref(), Some("run"));
        assert_eq!(spans[0].start_line, 2);
        assert_eq!(spans[0].end_line, 5);
        assert_eq!(spans[0].control_keyword_kinds(), 1);
    }

    #[test]
    fn nested_blocks_count_toward_enclosing_function() {
        let source = "fn outer() {\n    let f = || { while go() {} };\n    for x in y {}\n}\n";
        let spans = outline(source).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].control_keyword_kinds(), 2);
    }

    #[test]
    fn comment_style_decides_where_a_comment_ends() {
        let source = "/* a /* b */ { */\nfun f() {\n}\n";
        let spans = outline_with(source, CommentStyle::Nested).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start_line, 1);
        // Flat lexing leaves ` { */` as code.
        assert_eq!(outline(source), Err(ParseError::UnclosedBlock { line: 0 }));
    }

    #[test]
    fn receiver_functions_take_the_member_name() {
        assert_eq!(names("fun String.shout() {\n}\n"), vec!["shout"]);
    }

    #[test]
    fn lambda_default_arguments_do_not_end_the_declaration() {
        let source = "fun run(cb: () -> Unit = { }) {\n  cb()\n}\n";
        assert_eq!(names(source), vec!["run"]);
    }

    #[test]
    fn unbalanced_braces_are_errors() {
        assert_eq!(
            outline("fun a() {\n}\n}\n"),
            Err(ParseError::UnmatchedClose { line: 2 })
        );
        assert_eq!(
            outline("class A {\n  fun b() {\n"),
            Err(ParseError::UnclosedBlock { line: 1 })
        );
        assert_eq!(
            outline("fun a() {}\n/* open"),
            Err(ParseError::UnterminatedComment { line: 1 })
        );
    }
}

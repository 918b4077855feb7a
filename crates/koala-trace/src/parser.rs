//! Structural parse seam used by the complexity detector.

use std::path::Path;

use koala_syntax::{CommentStyle, FunctionSpan, ParseError};

/// Finds function boundaries in source text.
pub trait OutlineParser: Send + Sync {
    /// Outline `text`, read from `path`; the path selects language rules.
    fn functions(&self, path: &Path, text: &str) -> Result<Vec<FunctionSpan>, ParseError>;
}

/// [`OutlineParser`] backed by the `koala-syntax` brace outliner.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntaxOutline;

impl OutlineParser for SyntaxOutline {
    fn functions(&self, path: &Path, text: &str) -> Result<Vec<FunctionSpan>, ParseError> {
        let style = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(CommentStyle::Flat, CommentStyle::for_extension);
        koala_syntax::outline_with(text, style)
    }
}

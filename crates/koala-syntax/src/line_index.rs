//! Byte offset to zero-based line mapping.

use text_size::TextSize;

/// Start offsets of every line in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    starts: Vec<TextSize>,
}

impl LineIndex {
    /// Build the index for `text`. Lines are split on `\n`; a trailing `\r` stays
    /// part of the previous line.
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut starts = vec![TextSize::from(0)];
        for (idx, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                starts.push(TextSize::from((idx + 1) as u32));
            }
        }
        Self { starts }
    }

    /// Zero-based line containing `offset`.
    #[must_use]
    pub fn line_of(&self, offset: TextSize) -> u32 {
        let line = match self.starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next.saturating_sub(1),
        };
        line as u32
    }

    /// Number of lines, counting a final line without a newline.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.starts.len()
    }
}

//! Plain-text rendering of views and suggestions for the CLI.

use std::fmt::Write as _;
use std::path::Path;

use crate::heuristics::Suggestion;
use crate::location::SourceLocation;
use crate::view::{BreakpointView, DisplayMode};

/// Renders locations relative to a root directory when possible.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    root: &'a Path,
}

impl<'a> Report<'a> {
    #[must_use]
    pub fn new(root: &'a Path) -> Self {
        Self { root }
    }

    /// `path:line` with the root stripped and one-based lines.
    #[must_use]
    pub fn location(&self, location: &SourceLocation) -> String {
        let path = Path::new(location.path.as_str());
        let shown = path
            .strip_prefix(self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        format!("{shown}:{}", location.display_line())
    }

    #[must_use]
    pub fn view(&self, view: &BreakpointView) -> String {
        let mut out = String::new();
        match view.mode {
            DisplayMode::LiveList => {
                let _ = writeln!(out, "Breakpoints ({})", view.listed.len());
                for bp in &view.listed {
                    let mark = if bp.enabled { "x" } else { " " };
                    let _ = write!(out, "  [{mark}] {}", self.location(&bp.location));
                    if bp.hit_count > 0 {
                        let _ = write!(out, "  hits: {}", bp.hit_count);
                    }
                    out.push('\n');
                }
            }
            DisplayMode::PostSessionTrace => {
                let _ = writeln!(out, "Hit breakpoints ({})", view.hit_cards.len());
                self.hit_cards(&mut out, view);
                let _ = writeln!(out, "Never hit ({})", view.unhit_cards.len());
                for card in &view.unhit_cards {
                    let state = if card.enabled { "" } else { " (disabled)" };
                    let _ = writeln!(
                        out,
                        "  {}{state}  {}",
                        self.location(&card.location),
                        card.excerpt
                    );
                }
            }
            DisplayMode::Diagram => {
                let _ = writeln!(
                    out,
                    "Trace diagram ({} locations, {} transitions)",
                    view.hit_cards.len(),
                    view.transitions.len()
                );
                self.hit_cards(&mut out, view);
                for transition in &view.transitions {
                    let _ = writeln!(
                        out,
                        "  {} -> {}",
                        self.location(&transition.from),
                        self.location(&transition.to)
                    );
                }
            }
        }
        out
    }

    fn hit_cards(&self, out: &mut String, view: &BreakpointView) {
        for card in &view.hit_cards {
            let hot = if card.is_hot { " hot" } else { "" };
            let _ = writeln!(
                out,
                "  {}  x{}{hot}  {}",
                self.location(&card.location),
                card.hit_count,
                card.excerpt
            );
        }
    }

    #[must_use]
    pub fn suggestions(&self, suggestions: &[Suggestion]) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Suggestions ({})", suggestions.len());
        for suggestion in suggestions {
            let _ = writeln!(
                out,
                "  {}  {}\n      {}",
                self.location(&suggestion.location),
                suggestion.reason,
                suggestion.excerpt
            );
        }
        out
    }
}

//! Static scan for additional instrumentation points.
//!
//! Three independent detectors run over the source tree:
//!
//! - **log statements**: lines containing a configured print/log pattern
//! - **near hits**: unhit, non-blank lines around every recorded hit
//! - **complex functions**: long functions with several kinds of control
//!   flow and no breakpoint on their first line
//!
//! Locations are compared after canonicalization so that a breakpoint set
//! through a symlinked or relative path still suppresses a suggestion.
//! Results are ordered by detector; the same line may be suggested by more
//! than one detector.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexSet;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::config::HeuristicSettings;
use crate::error::ScanError;
use crate::location::{BreakpointSnapshot, SourceLocation};
use crate::parser::OutlineParser;
use crate::recorder::{CancelToken, HitSnapshot};
use crate::source::{excerpt, SourceTree};

/// Why a location was suggested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuggestionReason {
    LogStatement,
    NearHotHit,
    ComplexUninstrumented,
}

impl SuggestionReason {
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            SuggestionReason::LogStatement => "Contains print/log statement",
            SuggestionReason::NearHotHit => "Unhit nearby line to frequently hit breakpoint",
            SuggestionReason::ComplexUninstrumented => "Complex method with no breakpoints",
        }
    }
}

impl fmt::Display for SuggestionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A proposed instrumentation point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// Canonical location of the suggested line.
    pub location: SourceLocation,
    /// Trimmed source line, at most `excerpt_width` characters.
    pub excerpt: String,
    pub reason: SuggestionReason,
}

/// Runs the detectors against injected collaborators.
#[derive(Clone)]
pub struct HeuristicEngine {
    settings: HeuristicSettings,
    sources: Arc<dyn SourceTree>,
    parser: Arc<dyn OutlineParser>,
}

impl fmt::Debug for HeuristicEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeuristicEngine")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

struct ScannedFile {
    path: SmolStr,
    text: String,
}

/// Canonical breakpoint and hit sets for one scan.
struct Exclusions {
    enabled_breakpoints: FxHashSet<SourceLocation>,
    breakpoints: FxHashSet<SourceLocation>,
    hits: FxHashSet<SourceLocation>,
    /// Distinct hit locations in first-occurrence order.
    hit_order: IndexSet<SourceLocation>,
}

impl HeuristicEngine {
    pub fn new(
        settings: HeuristicSettings,
        sources: Arc<dyn SourceTree>,
        parser: Arc<dyn OutlineParser>,
    ) -> Self {
        Self {
            settings,
            sources,
            parser,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &HeuristicSettings {
        &self.settings
    }

    /// Scan the tree and return suggestions: log statements, then near hits,
    /// then complex functions.
    pub fn analyze(
        &self,
        breakpoints: &BreakpointSnapshot,
        hits: &HitSnapshot,
        cancel: &CancelToken,
    ) -> Result<Vec<Suggestion>, ScanError> {
        let exclusions = self.exclusions(breakpoints, hits);
        let files = self.load_files(cancel)?;

        let mut suggestions = self.log_statements(&files, &exclusions, cancel)?;
        suggestions.extend(self.near_hits(&files, &exclusions, cancel)?);
        suggestions.extend(self.complex_functions(&files, &exclusions, cancel)?);
        check(cancel)?;
        debug!(
            files = files.len(),
            suggestions = suggestions.len(),
            "heuristic scan finished"
        );
        Ok(suggestions)
    }

    fn canonical(&self, location: &SourceLocation) -> SourceLocation {
        let path = self
            .sources
            .canonicalize_lossy(Path::new(location.path.as_str()));
        location.with_path(path.to_string_lossy().as_ref())
    }

    fn exclusions(&self, breakpoints: &BreakpointSnapshot, hits: &HitSnapshot) -> Exclusions {
        let mut enabled_breakpoints = FxHashSet::default();
        let mut all_breakpoints = FxHashSet::default();
        for bp in breakpoints.iter() {
            let location = self.canonical(&bp.location);
            if bp.enabled {
                enabled_breakpoints.insert(location.clone());
            }
            all_breakpoints.insert(location);
        }
        let hit_order: IndexSet<SourceLocation> = hits
            .hits()
            .iter()
            .map(|hit| self.canonical(&hit.location))
            .collect();
        Exclusions {
            enabled_breakpoints,
            breakpoints: all_breakpoints,
            hits: hit_order.iter().cloned().collect(),
            hit_order,
        }
    }

    fn load_files(&self, cancel: &CancelToken) -> Result<Vec<ScannedFile>, ScanError> {
        let paths = match self.sources.files() {
            Ok(paths) => paths,
            Err(err) => {
                warn!("failed to enumerate source tree: {err}");
                return Ok(Vec::new());
            }
        };
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            check(cancel)?;
            let canonical = match self.sources.canonicalize(&path) {
                Ok(canonical) => canonical,
                Err(err) => {
                    debug!(path = %path.display(), "skipping unresolvable file: {err}");
                    continue;
                }
            };
            match self.sources.read(&canonical) {
                Ok(text) => files.push(ScannedFile {
                    path: SmolStr::new(canonical.to_string_lossy()),
                    text,
                }),
                Err(err) => warn!(path = %canonical.display(), "skipping unreadable file: {err}"),
            }
        }
        Ok(files)
    }

    fn log_statements(
        &self,
        files: &[ScannedFile],
        exclusions: &Exclusions,
        cancel: &CancelToken,
    ) -> Result<Vec<Suggestion>, ScanError> {
        let mut suggestions = Vec::new();
        for file in files {
            check(cancel)?;
            for (line, content) in (0u32..).zip(file.text.lines()) {
                let trimmed = content.trim();
                if !self
                    .settings
                    .log_patterns
                    .iter()
                    .any(|pattern| trimmed.contains(pattern.as_str()))
                {
                    continue;
                }
                let location = SourceLocation::new(file.path.clone(), line);
                if exclusions.enabled_breakpoints.contains(&location)
                    || exclusions.hits.contains(&location)
                {
                    continue;
                }
                suggestions.push(Suggestion {
                    location,
                    excerpt: excerpt(trimmed, self.settings.excerpt_width),
                    reason: SuggestionReason::LogStatement,
                });
            }
        }
        Ok(suggestions)
    }

    fn near_hits(
        &self,
        files: &[ScannedFile],
        exclusions: &Exclusions,
        cancel: &CancelToken,
    ) -> Result<Vec<Suggestion>, ScanError> {
        let scanned: FxHashMap<&str, &str> = files
            .iter()
            .map(|file| (file.path.as_str(), file.text.as_str()))
            .collect();
        let mut outside: FxHashMap<SmolStr, Option<String>> = FxHashMap::default();
        let radius = self.settings.neighbor_radius;

        let mut suggestions = Vec::new();
        for hit in &exclusions.hit_order {
            check(cancel)?;
            let text = match scanned.get(hit.path.as_str()) {
                Some(text) => Some(*text),
                None => outside
                    .entry(hit.path.clone())
                    .or_insert_with(|| self.read_outside(&hit.path))
                    .as_deref(),
            };
            let Some(text) = text else {
                continue;
            };
            let lines: Vec<&str> = text.lines().collect();
            let first = hit.line.saturating_sub(radius);
            let last = hit.line.saturating_add(radius);
            for line in first..=last {
                if line == hit.line {
                    continue;
                }
                let Some(content) = usize::try_from(line).ok().and_then(|idx| lines.get(idx))
                else {
                    continue;
                };
                let trimmed = content.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let location = SourceLocation::new(hit.path.clone(), line);
                if exclusions.breakpoints.contains(&location) || exclusions.hits.contains(&location)
                {
                    continue;
                }
                suggestions.push(Suggestion {
                    location,
                    excerpt: excerpt(trimmed, self.settings.excerpt_width),
                    reason: SuggestionReason::NearHotHit,
                });
            }
        }
        Ok(suggestions)
    }

    fn read_outside(&self, path: &str) -> Option<String> {
        match self.sources.read(Path::new(path)) {
            Ok(text) => Some(text),
            Err(err) => {
                debug!(path, "hit file unavailable for neighbour scan: {err}");
                None
            }
        }
    }

    fn complex_functions(
        &self,
        files: &[ScannedFile],
        exclusions: &Exclusions,
        cancel: &CancelToken,
    ) -> Result<Vec<Suggestion>, ScanError> {
        let mut suggestions = Vec::new();
        for file in files {
            check(cancel)?;
            let path = Path::new(file.path.as_str());
            let functions = match self.parser.functions(path, &file.text) {
                Ok(functions) => functions,
                Err(err) => {
                    debug!(path = %file.path, "skipping unparsable file: {err}");
                    continue;
                }
            };
            for function in functions {
                if function.line_span() < self.settings.min_function_lines
                    || function.control_keyword_kinds() < self.settings.min_control_keywords
                {
                    continue;
                }
                let location = SourceLocation::new(file.path.clone(), function.start_line);
                if exclusions.breakpoints.contains(&location) || exclusions.hits.contains(&location)
                {
                    continue;
                }
                let first_line = file
                    .text
                    .lines()
                    .nth(function.start_line as usize)
                    .unwrap_or_default();
                suggestions.push(Suggestion {
                    location,
                    excerpt: excerpt(first_line, self.settings.excerpt_width),
                    reason: SuggestionReason::ComplexUninstrumented,
                });
            }
        }
        Ok(suggestions)
    }
}

fn check(cancel: &CancelToken) -> Result<(), ScanError> {
    if cancel.is_cancelled() {
        Err(ScanError::Cancelled)
    } else {
        Ok(())
    }
}

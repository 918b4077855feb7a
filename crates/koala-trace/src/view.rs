//! Reconciles declared breakpoints with recorded hits.
//!
//! [`ViewStateAggregator`] owns the display mode; [`ViewBuilder`] turns a
//! breakpoint snapshot and a hit snapshot into a [`BreakpointView`]. The
//! builder is stateless apart from its settings, so the view worker can run
//! it off the event path.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::debug;

use crate::config::HeuristicSettings;
use crate::location::{BreakpointSnapshot, SourceLocation};
use crate::recorder::HitSnapshot;
use crate::source::{line_excerpt, SourceTree, UNAVAILABLE_EXCERPT};

/// How the presentation adapter should render the current view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DisplayMode {
    /// Plain breakpoint list; initial, and the mode while a session runs.
    #[default]
    LiveList,
    /// Hit cards and unhit breakpoints after a session ended.
    PostSessionTrace,
    /// The trace drawn as a transition sequence.
    Diagram,
}

/// One distinct hit location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitCard {
    pub location: SourceLocation,
    pub hit_count: usize,
    pub first_hit: Instant,
    pub last_hit: Instant,
    pub is_hot: bool,
    pub excerpt: String,
}

/// A breakpoint that was never hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnhitCard {
    pub location: SourceLocation,
    pub enabled: bool,
    pub excerpt: String,
}

/// A declared breakpoint as shown by the live list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedBreakpoint {
    pub location: SourceLocation,
    pub enabled: bool,
    pub hit_count: usize,
}

/// Consecutive hits whose source lines differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: SourceLocation,
    pub to: SourceLocation,
    pub from_excerpt: String,
    pub to_excerpt: String,
}

/// Reconciled snapshot handed to the presentation adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreakpointView {
    pub mode: DisplayMode,
    pub listed: Vec<ListedBreakpoint>,
    pub hit_cards: Vec<HitCard>,
    pub unhit_cards: Vec<UnhitCard>,
    pub transitions: Vec<Transition>,
}

/// Display-mode state machine plus the view recompute for that mode.
#[derive(Debug, Clone)]
pub struct ViewStateAggregator {
    mode: DisplayMode,
    has_trace: bool,
    builder: ViewBuilder,
}

impl ViewStateAggregator {
    #[must_use]
    pub fn new(builder: ViewBuilder) -> Self {
        Self {
            mode: DisplayMode::LiveList,
            has_trace: false,
            builder,
        }
    }

    #[must_use]
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// True once a session has ended and until the next one starts.
    #[must_use]
    pub fn has_trace(&self) -> bool {
        self.has_trace
    }

    #[must_use]
    pub fn builder(&self) -> &ViewBuilder {
        &self.builder
    }

    pub fn on_session_started(&mut self) {
        self.mode = DisplayMode::LiveList;
        self.has_trace = false;
    }

    pub fn on_session_stopped(&mut self) {
        self.mode = DisplayMode::PostSessionTrace;
        self.has_trace = true;
    }

    /// Flip between trace and diagram; returns whether the mode changed.
    pub fn toggle(&mut self) -> bool {
        let next = match self.mode {
            DisplayMode::PostSessionTrace if self.has_trace => DisplayMode::Diagram,
            DisplayMode::Diagram if self.has_trace => DisplayMode::PostSessionTrace,
            _ => return false,
        };
        self.mode = next;
        true
    }

    /// Return to the live list, keeping the trace.
    pub fn reset_view(&mut self) -> bool {
        let changed = self.mode != DisplayMode::LiveList;
        self.mode = DisplayMode::LiveList;
        changed
    }

    /// Show the kept trace again after [`ViewStateAggregator::reset_view`].
    pub fn show_trace(&mut self) -> bool {
        if !self.has_trace || self.mode == DisplayMode::PostSessionTrace {
            return false;
        }
        self.mode = DisplayMode::PostSessionTrace;
        true
    }

    /// View of `breakpoints` and `hits` in the current mode.
    #[must_use]
    pub fn recompute(
        &self,
        breakpoints: &BreakpointSnapshot,
        hits: &HitSnapshot,
    ) -> BreakpointView {
        self.builder.build(self.mode, breakpoints, hits)
    }
}

/// Builds [`BreakpointView`]s from snapshots.
#[derive(Clone)]
pub struct ViewBuilder {
    hot_threshold: usize,
    excerpt_width: usize,
    sources: Arc<dyn SourceTree>,
}

impl std::fmt::Debug for ViewBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewBuilder")
            .field("hot_threshold", &self.hot_threshold)
            .field("excerpt_width", &self.excerpt_width)
            .finish_non_exhaustive()
    }
}

struct HitGroup {
    count: usize,
    first: Instant,
    last: Instant,
}

impl ViewBuilder {
    pub fn new(settings: &HeuristicSettings, sources: Arc<dyn SourceTree>) -> Self {
        Self {
            hot_threshold: settings.hot_threshold,
            excerpt_width: settings.excerpt_width,
            sources,
        }
    }

    /// Reconcile `breakpoints` with `hits` for display in `mode`.
    pub fn build(
        &self,
        mode: DisplayMode,
        breakpoints: &BreakpointSnapshot,
        hits: &HitSnapshot,
    ) -> BreakpointView {
        let mut excerpts = ExcerptCache::new(self.sources.as_ref(), self.excerpt_width);

        let mut groups: IndexMap<&SourceLocation, HitGroup> = IndexMap::new();
        for hit in hits.hits() {
            groups
                .entry(&hit.location)
                .and_modify(|group| {
                    group.count += 1;
                    group.first = group.first.min(hit.timestamp);
                    group.last = group.last.max(hit.timestamp);
                })
                .or_insert(HitGroup {
                    count: 1,
                    first: hit.timestamp,
                    last: hit.timestamp,
                });
        }

        let hit_cards = groups
            .iter()
            .map(|(location, group)| HitCard {
                location: (*location).clone(),
                hit_count: group.count,
                first_hit: group.first,
                last_hit: group.last,
                is_hot: group.count >= self.hot_threshold,
                excerpt: excerpts.get(location),
            })
            .collect();

        let hit_locations: FxHashSet<&SourceLocation> = groups.keys().copied().collect();
        let unhit_cards = breakpoints
            .iter()
            .filter(|bp| !hit_locations.contains(&bp.location))
            .map(|bp| UnhitCard {
                location: bp.location.clone(),
                enabled: bp.enabled,
                excerpt: excerpts.get(&bp.location),
            })
            .collect();

        let listed = breakpoints
            .iter()
            .map(|bp| ListedBreakpoint {
                location: bp.location.clone(),
                enabled: bp.enabled,
                hit_count: groups.get(&bp.location).map_or(0, |group| group.count),
            })
            .collect();

        let mut transitions = Vec::new();
        for pair in hits.hits().windows(2) {
            let (from, to) = (&pair[0].location, &pair[1].location);
            let from_excerpt = excerpts.get(from);
            let to_excerpt = excerpts.get(to);
            if from_excerpt != to_excerpt {
                transitions.push(Transition {
                    from: from.clone(),
                    to: to.clone(),
                    from_excerpt,
                    to_excerpt,
                });
            }
        }

        BreakpointView {
            mode,
            listed,
            hit_cards,
            unhit_cards,
            transitions,
        }
    }
}

/// Reads each file at most once per build.
struct ExcerptCache<'a> {
    sources: &'a dyn SourceTree,
    width: usize,
    files: FxHashMap<SmolStr, Option<String>>,
}

impl<'a> ExcerptCache<'a> {
    fn new(sources: &'a dyn SourceTree, width: usize) -> Self {
        Self {
            sources,
            width,
            files: FxHashMap::default(),
        }
    }

    fn get(&mut self, location: &SourceLocation) -> String {
        let sources = self.sources;
        let text = self
            .files
            .entry(location.path.clone())
            .or_insert_with(|| match sources.read(Path::new(location.path.as_str())) {
                Ok(text) => Some(text),
                Err(err) => {
                    debug!(path = %location.path, "source unavailable for excerpt: {err}");
                    None
                }
            });
        text.as_deref()
            .and_then(|text| line_excerpt(text, location.line, self.width))
            .unwrap_or_else(|| UNAVAILABLE_EXCERPT.to_string())
    }
}

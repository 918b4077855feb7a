//! Source locations and breakpoint snapshots.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use tracing::debug;

/// A `(path, zero-based line)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceLocation {
    /// File path as reported by the debugger or registry.
    pub path: SmolStr,
    /// Zero-based line number.
    pub line: u32,
}

impl SourceLocation {
    /// Create a location from a path and a zero-based line.
    #[must_use]
    pub fn new(path: impl Into<SmolStr>, line: u32) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }

    /// One-based line, as shown to users.
    #[must_use]
    pub fn display_line(&self) -> u32 {
        self.line + 1
    }

    /// Final path component, or the full path if there is none.
    #[must_use]
    pub fn file_name(&self) -> &str {
        Path::new(self.path.as_str())
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(self.path.as_str())
    }

    /// Same line in another path.
    #[must_use]
    pub fn with_path(&self, path: impl Into<SmolStr>) -> Self {
        Self::new(path, self.line)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.display_line())
    }
}

/// A user-declared breakpoint, owned by the host registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    /// Where the breakpoint is set.
    pub location: SourceLocation,
    /// Whether the breakpoint is currently enabled.
    pub enabled: bool,
}

impl Breakpoint {
    /// An enabled breakpoint at `location`.
    #[must_use]
    pub fn enabled(location: SourceLocation) -> Self {
        Self {
            location,
            enabled: true,
        }
    }

    /// A disabled breakpoint at `location`.
    #[must_use]
    pub fn disabled(location: SourceLocation) -> Self {
        Self {
            location,
            enabled: false,
        }
    }
}

/// Raw registry entry; `position` is `None` when the host cannot resolve it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Resolved source position, if any.
    pub position: Option<SourceLocation>,
    /// Whether the breakpoint is enabled.
    pub enabled: bool,
}

impl From<Breakpoint> for RegistryEntry {
    fn from(breakpoint: Breakpoint) -> Self {
        Self {
            position: Some(breakpoint.location),
            enabled: breakpoint.enabled,
        }
    }
}

/// Immutable, ordered breakpoint set captured at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreakpointSnapshot {
    breakpoints: Arc<[Breakpoint]>,
}

impl BreakpointSnapshot {
    /// Build a snapshot from registry entries, dropping unresolved ones.
    #[must_use]
    pub fn from_entries(entries: Vec<RegistryEntry>) -> Self {
        let breakpoints = entries
            .into_iter()
            .filter_map(|entry| match entry.position {
                Some(location) => Some(Breakpoint {
                    location,
                    enabled: entry.enabled,
                }),
                None => {
                    debug!("skipping breakpoint without a resolvable source position");
                    None
                }
            })
            .collect::<Vec<_>>();
        Self {
            breakpoints: breakpoints.into(),
        }
    }

    /// Snapshot of already-resolved breakpoints.
    #[must_use]
    pub fn from_breakpoints(breakpoints: Vec<Breakpoint>) -> Self {
        Self {
            breakpoints: breakpoints.into(),
        }
    }

    /// Breakpoints in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &Breakpoint> {
        self.breakpoints.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    /// Every breakpoint location, enabled or not.
    #[must_use]
    pub fn locations(&self) -> FxHashSet<SourceLocation> {
        self.iter().map(|bp| bp.location.clone()).collect()
    }

    /// Locations of enabled breakpoints only.
    #[must_use]
    pub fn enabled_locations(&self) -> FxHashSet<SourceLocation> {
        self.iter()
            .filter(|bp| bp.enabled)
            .map(|bp| bp.location.clone())
            .collect()
    }
}

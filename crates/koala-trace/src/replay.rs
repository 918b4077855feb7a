//! JSON session scripts replayed through a [`Tracker`].
//!
//! ```json
//! {
//!   "breakpoints": [{ "path": "src/Main.kt", "line": 12 }],
//!   "events": [
//!     { "event": "session_started" },
//!     { "event": "paused", "path": "src/Main.kt", "line": 12 },
//!     { "event": "session_stopped" },
//!     { "event": "toggle" }
//!   ]
//! }
//! ```
//!
//! Lines are 1-based; relative paths resolve against the replay root. A
//! `paused` event without a path or line is an unresolvable pause.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ReplayError;
use crate::location::{Breakpoint, SourceLocation};
use crate::recorder::SessionEvent;
use crate::registry::{RegistryEvent, StaticRegistry};
use crate::tracker::{Tracker, TrackerAction};
use crate::worker::ScanTicket;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayScript {
    #[serde(default)]
    pub breakpoints: Vec<ScriptBreakpoint>,
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScriptBreakpoint {
    pub path: String,
    pub line: u32,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScriptEvent {
    SessionStarted,
    Paused {
        #[serde(default)]
        path: Option<String>,
        #[serde(default)]
        line: Option<u32>,
    },
    SessionStopped,
    AddBreakpoint(ScriptBreakpoint),
    RemoveBreakpoint {
        path: String,
        line: u32,
    },
    ChangeBreakpoint(ScriptBreakpoint),
    /// Raw navigation token, as the adapter would send it.
    Request {
        token: String,
    },
    Toggle,
    ResetView,
    ShowTrace,
}

/// What happened while replaying.
#[derive(Debug, Default)]
pub struct ReplayOutcome {
    /// Locations the adapter was asked to open.
    pub opened: Vec<SourceLocation>,
    /// Navigation tokens that failed to decode.
    pub rejected: Vec<String>,
    /// Scans requested through `__suggest__` tokens.
    pub tickets: Vec<ScanTicket>,
    /// Revision of the last queued view.
    pub last_revision: u64,
}

impl ReplayScript {
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ReplayError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, ReplayError> {
        let script: ReplayScript = serde_json::from_str(contents)?;
        script.validate()?;
        Ok(script)
    }

    fn validate(&self) -> Result<(), ReplayError> {
        let zero = |path: &str| ReplayError::ZeroLine {
            path: path.to_string(),
        };
        for bp in &self.breakpoints {
            if bp.line == 0 {
                return Err(zero(&bp.path));
            }
        }
        for event in &self.events {
            match event {
                ScriptEvent::Paused {
                    path: Some(path),
                    line: Some(0),
                }
                | ScriptEvent::RemoveBreakpoint { path, line: 0 } => return Err(zero(path)),
                ScriptEvent::AddBreakpoint(bp) | ScriptEvent::ChangeBreakpoint(bp)
                    if bp.line == 0 =>
                {
                    return Err(zero(&bp.path));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Registry seeded with the script's initial breakpoints.
    #[must_use]
    pub fn registry(&self, root: &Path) -> StaticRegistry {
        StaticRegistry::new(self.breakpoints.iter().map(|bp| breakpoint(root, bp)))
    }

    /// Feed every event to `tracker`, mirroring breakpoint edits into `registry`.
    pub fn run(
        &self,
        tracker: &mut Tracker,
        registry: &StaticRegistry,
        root: &Path,
    ) -> ReplayOutcome {
        let mut outcome = ReplayOutcome::default();
        for event in &self.events {
            let revision = match event {
                ScriptEvent::SessionStarted => tracker.handle_session(SessionEvent::Started),
                ScriptEvent::SessionStopped => tracker.handle_session(SessionEvent::Stopped),
                ScriptEvent::Paused { path, line } => {
                    let location = path
                        .as_deref()
                        .zip(*line)
                        .map(|(path, line)| location(root, path, line));
                    tracker.handle_session(SessionEvent::Paused(location))
                }
                ScriptEvent::AddBreakpoint(bp) => {
                    apply(tracker, registry, RegistryEvent::Added(breakpoint(root, bp)))
                }
                ScriptEvent::ChangeBreakpoint(bp) => {
                    apply(tracker, registry, RegistryEvent::Changed(breakpoint(root, bp)))
                }
                ScriptEvent::RemoveBreakpoint { path, line } => apply(
                    tracker,
                    registry,
                    RegistryEvent::Removed(location(root, path, *line)),
                ),
                ScriptEvent::Request { token } => {
                    match tracker.handle_request(token) {
                        Ok(TrackerAction::Open(location)) => {
                            info!("open {location}");
                            outcome.opened.push(location);
                        }
                        Ok(TrackerAction::Suggestions(ticket)) => outcome.tickets.push(ticket),
                        Ok(TrackerAction::Toggled(mode)) => debug!(?mode, "view toggled"),
                        Ok(TrackerAction::Ignored) => debug!("navigation token ignored"),
                        Err(_) => outcome.rejected.push(token.clone()),
                    }
                    continue;
                }
                ScriptEvent::Toggle => {
                    tracker.toggle_view();
                    continue;
                }
                ScriptEvent::ResetView => {
                    tracker.reset_view();
                    continue;
                }
                ScriptEvent::ShowTrace => {
                    tracker.show_trace();
                    continue;
                }
            };
            outcome.last_revision = revision;
        }
        outcome
    }
}

fn apply(tracker: &mut Tracker, registry: &StaticRegistry, event: RegistryEvent) -> u64 {
    registry.apply(&event);
    tracker.handle_registry(&event)
}

fn resolve(root: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn location(root: &Path, path: &str, line: u32) -> SourceLocation {
    SourceLocation::new(
        resolve(root, path).to_string_lossy().as_ref(),
        line.saturating_sub(1),
    )
}

fn breakpoint(root: &Path, bp: &ScriptBreakpoint) -> Breakpoint {
    Breakpoint {
        location: location(root, &bp.path, bp.line),
        enabled: bp.enabled,
    }
}

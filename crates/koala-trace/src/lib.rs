//! `koala-trace` - Breakpoint hit recording and instrumentation advice.
//!
//! This crate sits between a debugger, a breakpoint store and a presentation
//! layer:
//!
//! - [`HitRecorder`]: append-only log of where execution paused
//! - [`ViewStateAggregator`]: reconciles breakpoints with hits and owns the
//!   display mode
//! - [`HeuristicEngine`]: scans a source tree for lines worth instrumenting
//! - [`Tracker`]: the single owner that wires these together with the
//!   background view and scan workers
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use koala_trace::{
//!     Breakpoint, HeuristicSettings, MemorySourceTree, SessionEvent, SourceLocation,
//!     StaticRegistry, SyntaxOutline, Tracker,
//! };
//!
//! let tree = MemorySourceTree::new().with_file("/w/A.kt", "fun a() {\n    println(1)\n}\n");
//! let at = SourceLocation::new("/w/A.kt", 1);
//! let registry = Arc::new(StaticRegistry::new([Breakpoint::enabled(at.clone())]));
//! let mut tracker = Tracker::new(
//!     HeuristicSettings::default(),
//!     registry,
//!     Arc::new(tree),
//!     Arc::new(SyntaxOutline),
//! );
//!
//! tracker.handle_session(SessionEvent::Started);
//! tracker.handle_session(SessionEvent::Paused(Some(at)));
//! tracker.handle_session(SessionEvent::Stopped);
//!
//! let view = tracker.current_view();
//! assert_eq!(view.hit_cards.len(), 1);
//! assert!(view.unhit_cards.is_empty());
//! ```

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
mod error;
pub mod heuristics;
mod location;
pub mod nav;
mod parser;
pub mod recorder;
mod registry;
pub mod replay;
pub mod report;
pub mod source;
mod tracker;
pub mod view;
pub mod worker;

pub use config::{HeuristicSettings, ProjectConfig, SourceSettings};
pub use error::{ConfigError, NavError, ReplayError, ScanError, SourceError};
pub use heuristics::{HeuristicEngine, Suggestion, SuggestionReason};
pub use location::{Breakpoint, BreakpointSnapshot, RegistryEntry, SourceLocation};
pub use nav::{NavRequest, TOGGLE_VIEW};
pub use parser::{OutlineParser, SyntaxOutline};
pub use recorder::{
    BreakpointHit, CancelToken, HitRecorder, HitSnapshot, RecorderSignal, SessionEvent,
};
pub use registry::{BreakpointRegistry, RegistryEvent, StaticRegistry};
pub use replay::{ReplayOutcome, ReplayScript};
pub use report::Report;
pub use source::{FsSourceTree, MemorySourceTree, SourceTree, UNAVAILABLE_EXCERPT};
pub use tracker::{Tracker, TrackerAction};
pub use view::{BreakpointView, DisplayMode, HitCard, UnhitCard, ViewBuilder, ViewStateAggregator};
pub use worker::{ScanTicket, ScanWorker, ViewFrame, ViewWorker};

//! Single owner that wires the recorder, view state and workers together.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use tracing::{debug, warn};

use crate::config::{HeuristicSettings, ProjectConfig};
use crate::error::{NavError, ScanError};
use crate::heuristics::{HeuristicEngine, Suggestion};
use crate::location::SourceLocation;
use crate::nav::NavRequest;
use crate::parser::{OutlineParser, SyntaxOutline};
use crate::recorder::{HitRecorder, RecorderSignal, SessionEvent};
use crate::registry::{BreakpointRegistry, RegistryEvent};
use crate::source::{FsSourceTree, SourceTree};
use crate::view::{BreakpointView, DisplayMode, ViewBuilder, ViewStateAggregator};
use crate::worker::{ScanResult, ScanTicket, ScanWorker, ViewFrame, ViewWorker};

/// What the adapter should do after a navigation token.
#[derive(Debug)]
pub enum TrackerAction {
    /// Jump to this location.
    Open(SourceLocation),
    /// The display mode changed.
    Toggled(DisplayMode),
    /// A scan was queued.
    Suggestions(ScanTicket),
    /// Valid token, nothing to do.
    Ignored,
}

/// Receives every external event and owns all mutable state.
pub struct Tracker {
    recorder: Arc<HitRecorder>,
    registry: Arc<dyn BreakpointRegistry>,
    state: ViewStateAggregator,
    views: ViewWorker,
    scans: ScanWorker,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("mode", &self.state.mode())
            .field("epoch", &self.recorder.epoch())
            .finish_non_exhaustive()
    }
}

impl Tracker {
    pub fn new(
        settings: HeuristicSettings,
        registry: Arc<dyn BreakpointRegistry>,
        sources: Arc<dyn SourceTree>,
        parser: Arc<dyn OutlineParser>,
    ) -> Self {
        let recorder = Arc::new(HitRecorder::new());
        let builder = ViewBuilder::new(&settings, Arc::clone(&sources));
        let engine = HeuristicEngine::new(settings, sources, parser);
        let views = ViewWorker::spawn(
            builder.clone(),
            Arc::clone(&recorder),
            Arc::clone(&registry),
        );
        let scans = ScanWorker::spawn(engine, Arc::clone(&recorder), Arc::clone(&registry));
        let tracker = Self {
            recorder,
            registry,
            state: ViewStateAggregator::new(builder),
            views,
            scans,
        };
        tracker.refresh_view();
        tracker
    }

    /// Tracker over the filesystem tree described by `config`.
    pub fn from_config(config: &ProjectConfig, registry: Arc<dyn BreakpointRegistry>) -> Self {
        let sources = FsSourceTree::new(&config.root, config.sources.clone());
        Self::new(
            config.heuristics.clone(),
            registry,
            Arc::new(sources),
            Arc::new(SyntaxOutline),
        )
    }

    /// Apply a debug session event; returns the view revision it queued.
    pub fn handle_session(&mut self, event: SessionEvent) -> u64 {
        match &event {
            SessionEvent::Started => self.state.on_session_started(),
            SessionEvent::Stopped => self.state.on_session_stopped(),
            SessionEvent::Paused(_) => {}
        }
        self.recorder.handle(event);
        self.refresh_view()
    }

    /// React to a registry change; the registry itself is already updated.
    pub fn handle_registry(&mut self, event: &RegistryEvent) -> u64 {
        debug!(?event, "breakpoint registry changed");
        self.refresh_view()
    }

    /// Decode and act on a navigation token. Malformed tokens change nothing.
    pub fn handle_request(&mut self, token: &str) -> Result<TrackerAction, NavError> {
        let request = NavRequest::decode(token).map_err(|err| {
            warn!("rejected navigation token: {err}");
            err
        })?;
        Ok(match request {
            NavRequest::Open(location) => TrackerAction::Open(location),
            NavRequest::Toggle => {
                if self.toggle_view() {
                    TrackerAction::Toggled(self.mode())
                } else {
                    TrackerAction::Ignored
                }
            }
            NavRequest::Suggest => TrackerAction::Suggestions(self.request_suggestions()),
        })
    }

    pub fn toggle_view(&mut self) -> bool {
        let changed = self.state.toggle();
        if changed {
            self.refresh_view();
        }
        changed
    }

    pub fn reset_view(&mut self) -> bool {
        let changed = self.state.reset_view();
        if changed {
            self.refresh_view();
        }
        changed
    }

    pub fn show_trace(&mut self) -> bool {
        let changed = self.state.show_trace();
        if changed {
            self.refresh_view();
        }
        changed
    }

    /// Queue a suggestion scan.
    pub fn request_suggestions(&self) -> ScanTicket {
        self.scans.request()
    }

    /// Run a scan and wait for it.
    pub fn suggest(&self) -> Result<Vec<Suggestion>, ScanError> {
        let result: ScanResult = self.request_suggestions().wait();
        result.map(|suggestions| suggestions.to_vec())
    }

    /// Rebuild the view synchronously on the calling thread.
    #[must_use]
    pub fn current_view(&self) -> BreakpointView {
        self.state
            .recompute(&self.registry.snapshot(), &self.recorder.hits())
    }

    #[must_use]
    pub fn latest_view(&self) -> Option<Arc<ViewFrame>> {
        self.views.latest()
    }

    #[must_use]
    pub fn wait_for_view(&self, revision: u64, timeout: Duration) -> Option<Arc<ViewFrame>> {
        self.views.wait_for(revision, timeout)
    }

    #[must_use]
    pub fn mode(&self) -> DisplayMode {
        self.state.mode()
    }

    #[must_use]
    pub fn recorder(&self) -> &Arc<HitRecorder> {
        &self.recorder
    }

    pub fn subscribe(&self) -> Receiver<RecorderSignal> {
        self.recorder.subscribe()
    }

    /// Scans run so far by the background worker.
    #[must_use]
    pub fn scans_run(&self) -> usize {
        self.scans.scans_run()
    }

    /// Views built so far by the background worker.
    #[must_use]
    pub fn views_built(&self) -> usize {
        self.views.builds_run()
    }

    fn refresh_view(&self) -> u64 {
        self.views.submit(self.state.mode())
    }
}

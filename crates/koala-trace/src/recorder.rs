//! Append-only log of pause events for the current debug session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{unbounded, Receiver, Sender};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::location::SourceLocation;

/// Lifecycle notifications delivered by the debug session collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A new debug session started.
    Started,
    /// Execution paused; `None` when the frame has no resolvable position.
    Paused(Option<SourceLocation>),
    /// The session ended.
    Stopped,
}

/// A single recorded pause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointHit {
    /// Where execution paused.
    pub location: SourceLocation,
    /// When the pause was recorded.
    pub timestamp: Instant,
}

/// Signals broadcast to recorder subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderSignal {
    /// The log was cleared for a new session.
    SessionReset,
    /// A hit was appended.
    HitRecorded,
    /// The session ended; the log is final until the next reset.
    SessionStopped,
}

/// Point-in-time copy of the hit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitSnapshot {
    hits: Arc<[BreakpointHit]>,
    epoch: u64,
    started_at: Option<Instant>,
}

impl HitSnapshot {
    /// A snapshot built from explicit hits, outside any recorder.
    #[must_use]
    pub fn from_hits(hits: Vec<BreakpointHit>) -> Self {
        Self {
            hits: hits.into(),
            epoch: 0,
            started_at: None,
        }
    }

    /// Hits in delivery order.
    #[must_use]
    pub fn hits(&self) -> &[BreakpointHit] {
        &self.hits
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Session epoch the snapshot was taken in.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// When the session that produced these hits started.
    #[must_use]
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Hit count per location, in first-occurrence order.
    #[must_use]
    pub fn counts(&self) -> IndexMap<SourceLocation, usize> {
        let mut counts: IndexMap<SourceLocation, usize> = IndexMap::new();
        for hit in self.hits.iter() {
            *counts.entry(hit.location.clone()).or_insert(0) += 1;
        }
        counts
    }
}

impl Default for HitSnapshot {
    fn default() -> Self {
        Self::from_hits(Vec::new())
    }
}

/// Cheap handle that reports whether the session it was taken in has ended.
#[derive(Debug, Clone)]
pub struct CancelToken {
    epoch: Arc<AtomicU64>,
    taken_in: u64,
}

impl CancelToken {
    /// A token that is never cancelled.
    #[must_use]
    pub fn never() -> Self {
        Self {
            epoch: Arc::new(AtomicU64::new(0)),
            taken_in: 0,
        }
    }

    /// True once a newer session has started.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.epoch.load(Ordering::Acquire) != self.taken_in
    }

    /// Epoch the token belongs to.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.taken_in
    }
}

#[derive(Debug, Default)]
struct RecorderState {
    hits: Vec<BreakpointHit>,
    /// Bumped by every change to `hits`.
    revision: u64,
    session_active: bool,
    started_at: Option<Instant>,
}

/// Records pause events; the only writer of the hit log.
#[derive(Debug, Default)]
pub struct HitRecorder {
    state: RwLock<RecorderState>,
    epoch: Arc<AtomicU64>,
    /// Last published copy of the log, keyed by state revision.
    published: Mutex<Option<(u64, Arc<[BreakpointHit]>)>>,
    subscribers: Mutex<Vec<Sender<RecorderSignal>>>,
}

impl HitRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch a session lifecycle event.
    pub fn handle(&self, event: SessionEvent) {
        match event {
            SessionEvent::Started => self.on_session_started(),
            SessionEvent::Paused(location) => self.on_paused(location),
            SessionEvent::Stopped => self.on_session_stopped(),
        }
    }

    /// Clear the log and start a new epoch.
    pub fn on_session_started(&self) {
        {
            let mut state = self.state.write();
            state.hits.clear();
            state.revision += 1;
            state.session_active = true;
            state.started_at = Some(Instant::now());
            self.epoch.fetch_add(1, Ordering::AcqRel);
        }
        debug!(epoch = self.epoch(), "debug session started");
        self.broadcast(RecorderSignal::SessionReset);
    }

    /// Append a hit; unresolved pauses are dropped.
    pub fn on_paused(&self, location: Option<SourceLocation>) {
        let Some(location) = location else {
            debug!("pause without a resolvable source position; not recorded");
            return;
        };
        {
            let mut state = self.state.write();
            state.hits.push(BreakpointHit {
                location,
                timestamp: Instant::now(),
            });
            state.revision += 1;
        }
        self.broadcast(RecorderSignal::HitRecorded);
    }

    /// Mark the session inactive; the log stays available.
    pub fn on_session_stopped(&self) {
        let snapshot = {
            let mut state = self.state.write();
            state.session_active = false;
            self.snapshot_locked(&state)
        };
        debug!(hits = snapshot.len(), "debug session ended, trace collected");
        for line in trace_lines(&snapshot) {
            debug!("{line}");
        }
        self.broadcast(RecorderSignal::SessionStopped);
    }

    /// The current log as numbered `path:line` entries, one per line.
    #[must_use]
    pub fn trace_summary(&self) -> String {
        let mut summary = String::new();
        for line in trace_lines(&self.hits()) {
            summary.push_str(&line);
            summary.push('\n');
        }
        summary
    }

    /// Immutable copy of the log as of now. Snapshots taken between two
    /// changes share one allocation.
    #[must_use]
    pub fn hits(&self) -> HitSnapshot {
        let state = self.state.read();
        self.snapshot_locked(&state)
    }

    #[must_use]
    pub fn session_active(&self) -> bool {
        self.state.read().session_active
    }

    /// Current session epoch; bumped by every session start.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Token that cancels when the next session starts.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        CancelToken {
            epoch: Arc::clone(&self.epoch),
            taken_in: self.epoch(),
        }
    }

    /// Receive lifecycle signals from now on.
    pub fn subscribe(&self) -> Receiver<RecorderSignal> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    fn snapshot_locked(&self, state: &RecorderState) -> HitSnapshot {
        let mut published = self.published.lock();
        let hits = match published.as_ref() {
            Some((revision, hits)) if *revision == state.revision => Arc::clone(hits),
            _ => {
                let hits: Arc<[BreakpointHit]> = state.hits.as_slice().into();
                *published = Some((state.revision, Arc::clone(&hits)));
                hits
            }
        };
        HitSnapshot {
            hits,
            epoch: self.epoch(),
            started_at: state.started_at,
        }
    }

    fn broadcast(&self, signal: RecorderSignal) {
        self.subscribers
            .lock()
            .retain(|subscriber| subscriber.send(signal).is_ok());
    }
}

fn trace_lines(snapshot: &HitSnapshot) -> impl Iterator<Item = String> + '_ {
    snapshot
        .hits()
        .iter()
        .enumerate()
        .map(|(index, hit)| format!("{}. {}", index + 1, hit.location))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(line: u32) -> SourceLocation {
        SourceLocation::new("A.src", line)
    }

    #[test]
    fn records_resolvable_pauses_in_order() {
        let recorder = HitRecorder::new();
        recorder.handle(SessionEvent::Started);
        recorder.handle(SessionEvent::Paused(Some(loc(3))));
        recorder.handle(SessionEvent::Paused(None));
        recorder.handle(SessionEvent::Paused(Some(loc(3))));
        recorder.handle(SessionEvent::Paused(Some(loc(1))));

        let lines: Vec<_> = recorder
            .hits()
            .hits()
            .iter()
            .map(|hit| hit.location.line)
            .collect();
        assert_eq!(lines, vec![3, 3, 1]);
    }

    #[test]
    fn snapshots_do_not_see_later_appends() {
        let recorder = HitRecorder::new();
        recorder.on_session_started();
        recorder.on_paused(Some(loc(0)));
        let before = recorder.hits();
        recorder.on_paused(Some(loc(1)));
        assert_eq!(before.len(), 1);
        assert_eq!(recorder.hits().len(), 2);
    }

    #[test]
    fn unchanged_log_is_copied_once() {
        let recorder = HitRecorder::new();
        recorder.on_session_started();
        recorder.on_paused(Some(loc(0)));
        let first = recorder.hits();
        let second = recorder.hits();
        assert!(Arc::ptr_eq(&first.hits, &second.hits));

        recorder.on_paused(Some(loc(1)));
        let third = recorder.hits();
        assert!(!Arc::ptr_eq(&first.hits, &third.hits));
        assert_eq!(third.len(), 2);

        recorder.on_session_started();
        recorder.on_paused(Some(loc(5)));
        recorder.on_paused(Some(loc(6)));
        let fresh = recorder.hits();
        assert!(!Arc::ptr_eq(&third.hits, &fresh.hits));
        assert_eq!(fresh.hits()[0].location, loc(5));
    }

    #[test]
    fn stop_keeps_the_log_and_start_clears_it() {
        let recorder = HitRecorder::new();
        recorder.on_session_started();
        recorder.on_paused(Some(loc(0)));
        recorder.on_session_stopped();
        assert!(!recorder.session_active());
        assert_eq!(recorder.hits().len(), 1);

        recorder.on_session_started();
        assert!(recorder.session_active());
        assert!(recorder.hits().is_empty());
    }

    #[test]
    fn trace_summary_numbers_hits_in_order() {
        let recorder = HitRecorder::new();
        recorder.on_session_started();
        recorder.on_paused(Some(loc(3)));
        recorder.on_paused(Some(loc(0)));
        recorder.on_session_stopped();
        assert_eq!(recorder.trace_summary(), "1. A.src:4\n2. A.src:1\n");
    }

    #[test]
    fn session_start_cancels_older_tokens() {
        let recorder = HitRecorder::new();
        recorder.on_session_started();
        let token = recorder.cancel_token();
        assert!(!token.is_cancelled());
        recorder.on_session_started();
        assert!(token.is_cancelled());
        assert!(!recorder.cancel_token().is_cancelled());
    }

    #[test]
    fn subscribers_receive_signals_and_dropped_ones_are_pruned() {
        let recorder = HitRecorder::new();
        let rx = recorder.subscribe();
        drop(recorder.subscribe());
        recorder.on_session_started();
        recorder.on_paused(Some(loc(2)));
        recorder.on_session_stopped();
        let signals: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            signals,
            vec![
                RecorderSignal::SessionReset,
                RecorderSignal::HitRecorded,
                RecorderSignal::SessionStopped
            ]
        );
        assert_eq!(recorder.subscribers.lock().len(), 1);
    }

    #[test]
    fn counts_follow_first_occurrence() {
        let snapshot = HitSnapshot::from_hits(
            [5, 2, 5, 5]
                .into_iter()
                .map(|line| BreakpointHit {
                    location: loc(line),
                    timestamp: Instant::now(),
                })
                .collect(),
        );
        let counts: Vec<_> = snapshot
            .counts()
            .into_iter()
            .map(|(location, count)| (location.line, count))
            .collect();
        assert_eq!(counts, vec![(5, 3), (2, 1)]);
    }
}

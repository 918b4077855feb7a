//! Coalescing view builder thread.
//!
//! The event path only queues a revision and the display mode. The worker
//! takes the breakpoint and hit snapshots itself when it drains the queue,
//! so a burst of events costs one snapshot and one build.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Sender};
use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::recorder::HitRecorder;
use crate::registry::BreakpointRegistry;
use crate::view::{BreakpointView, DisplayMode, ViewBuilder};

/// A published view and the revision of the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewFrame {
    pub revision: u64,
    pub view: BreakpointView,
}

#[derive(Debug, Default)]
struct Slot {
    frame: Mutex<Option<Arc<ViewFrame>>>,
    published: Condvar,
}

impl Slot {
    fn publish(&self, frame: ViewFrame) {
        let mut current = self.frame.lock();
        if current
            .as_ref()
            .is_none_or(|existing| existing.revision < frame.revision)
        {
            *current = Some(Arc::new(frame));
        }
        self.published.notify_all();
    }
}

/// Builds views on a background thread; only the newest queued request is built.
#[derive(Debug)]
pub struct ViewWorker {
    sender: Option<Sender<(u64, DisplayMode)>>,
    slot: Arc<Slot>,
    next_revision: AtomicU64,
    builds: Arc<AtomicUsize>,
    handle: Option<JoinHandle<()>>,
}

impl ViewWorker {
    pub fn spawn(
        builder: ViewBuilder,
        recorder: Arc<HitRecorder>,
        registry: Arc<dyn BreakpointRegistry>,
    ) -> Self {
        let (sender, receiver) = unbounded::<(u64, DisplayMode)>();
        let slot = Arc::new(Slot::default());
        let builds = Arc::new(AtomicUsize::new(0));
        let worker_slot = Arc::clone(&slot);
        let worker_builds = Arc::clone(&builds);
        let handle = thread::spawn(move || {
            while let Ok(next) = receiver.recv() {
                let mut latest = next;
                while let Ok(newer) = receiver.try_recv() {
                    latest = newer;
                }
                let (revision, mode) = latest;
                let breakpoints = registry.snapshot();
                let hits = recorder.hits();
                let view = builder.build(mode, &breakpoints, &hits);
                worker_builds.fetch_add(1, Ordering::Relaxed);
                trace!(revision, hits = hits.len(), "view rebuilt");
                worker_slot.publish(ViewFrame { revision, view });
            }
        });
        Self {
            sender: Some(sender),
            slot,
            next_revision: AtomicU64::new(1),
            builds,
            handle: Some(handle),
        }
    }

    /// Queue a rebuild in `mode` and return its revision; never blocks.
    pub fn submit(&self, mode: DisplayMode) -> u64 {
        let revision = self.next_revision.fetch_add(1, Ordering::Relaxed);
        if let Some(sender) = &self.sender {
            let _ = sender.send((revision, mode));
        }
        revision
    }

    /// Most recently published view.
    #[must_use]
    pub fn latest(&self) -> Option<Arc<ViewFrame>> {
        self.slot.frame.lock().clone()
    }

    /// Block until a view at `revision` or newer is published, or `timeout` elapses.
    #[must_use]
    pub fn wait_for(&self, revision: u64, timeout: Duration) -> Option<Arc<ViewFrame>> {
        let deadline = Instant::now() + timeout;
        let mut frame = self.slot.frame.lock();
        loop {
            if let Some(current) = frame.as_ref().filter(|f| f.revision >= revision) {
                return Some(Arc::clone(current));
            }
            if self
                .slot
                .published
                .wait_until(&mut frame, deadline)
                .timed_out()
            {
                return frame
                    .as_ref()
                    .filter(|f| f.revision >= revision)
                    .map(Arc::clone);
            }
        }
    }

    /// Number of views actually built.
    #[must_use]
    pub fn builds_run(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}

impl Drop for ViewWorker {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

//! Single-flight suggestion scans.
//!
//! One thread runs every scan, so at most one is in flight. Requests that
//! queue up while a scan runs are served together by the next scan, which
//! captures fresh snapshots when it starts. A request made in an older
//! session than the one current at scan time is answered with
//! [`ScanError::Cancelled`], as is every waiter of a scan interrupted by a
//! session start.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use tracing::debug;

use crate::error::ScanError;
use crate::heuristics::{HeuristicEngine, Suggestion};
use crate::recorder::HitRecorder;
use crate::registry::BreakpointRegistry;

/// Outcome delivered to every waiter of one scan.
pub type ScanResult = Result<Arc<[Suggestion]>, ScanError>;

struct ScanJob {
    epoch: u64,
    reply: Sender<ScanResult>,
}

/// Handle to a requested scan.
#[derive(Debug)]
pub struct ScanTicket {
    epoch: u64,
    receiver: Receiver<ScanResult>,
}

impl ScanTicket {
    /// Session epoch the request was made in.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Block until the scan finishes.
    pub fn wait(self) -> ScanResult {
        self.receiver.recv().unwrap_or(Err(ScanError::WorkerGone))
    }

    /// Block for at most `timeout`; `None` when the scan is still running.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<ScanResult> {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(ScanError::WorkerGone)),
        }
    }

    /// The result if it is already available.
    pub fn try_result(&self) -> Option<ScanResult> {
        self.wait_timeout(Duration::ZERO)
    }
}

/// Owns the scan thread.
#[derive(Debug)]
pub struct ScanWorker {
    sender: Option<Sender<ScanJob>>,
    recorder: Arc<HitRecorder>,
    scans: Arc<AtomicUsize>,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ScanJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanJob").field("epoch", &self.epoch).finish()
    }
}

impl ScanWorker {
    pub fn spawn(
        engine: HeuristicEngine,
        recorder: Arc<HitRecorder>,
        registry: Arc<dyn BreakpointRegistry>,
    ) -> Self {
        let (sender, receiver) = unbounded::<ScanJob>();
        let scans = Arc::new(AtomicUsize::new(0));
        let worker_scans = Arc::clone(&scans);
        let worker_recorder = Arc::clone(&recorder);
        let handle = thread::spawn(move || {
            while let Ok(job) = receiver.recv() {
                let mut waiters = vec![job];
                waiters.extend(receiver.try_iter());

                let cancel = worker_recorder.cancel_token();
                let (current, stale): (Vec<_>, Vec<_>) = waiters
                    .into_iter()
                    .partition(|job| job.epoch == cancel.epoch());
                for job in stale {
                    let _ = job.reply.send(Err(ScanError::Cancelled));
                }
                if current.is_empty() {
                    continue;
                }

                let breakpoints = registry.snapshot();
                let hits = worker_recorder.hits();
                worker_scans.fetch_add(1, Ordering::Relaxed);
                let result: ScanResult = engine
                    .analyze(&breakpoints, &hits, &cancel)
                    .map(Arc::from)
                    .and_then(|suggestions| {
                        if cancel.is_cancelled() {
                            Err(ScanError::Cancelled)
                        } else {
                            Ok(suggestions)
                        }
                    });
                match &result {
                    Ok(suggestions) => debug!(
                        waiters = current.len(),
                        suggestions = suggestions.len(),
                        "scan complete"
                    ),
                    Err(err) => debug!(waiters = current.len(), "scan ended: {err}"),
                }
                for job in current {
                    let _ = job.reply.send(result.clone());
                }
            }
        });
        Self {
            sender: Some(sender),
            recorder,
            scans,
            handle: Some(handle),
        }
    }

    /// Queue a scan request tagged with the current session epoch.
    pub fn request(&self) -> ScanTicket {
        let epoch = self.recorder.epoch();
        let (reply, receiver) = bounded(1);
        match &self.sender {
            Some(sender) => {
                // A send failure drops `reply`, so the ticket reports WorkerGone.
                let _ = sender.send(ScanJob { epoch, reply });
            }
            None => drop(reply),
        }
        ScanTicket { epoch, receiver }
    }

    /// Number of scans actually run.
    #[must_use]
    pub fn scans_run(&self) -> usize {
        self.scans.load(Ordering::Relaxed)
    }
}

impl Drop for ScanWorker {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

//! Shared helpers for koala-trace integration tests.
#![allow(dead_code, unused_imports)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

pub use koala_syntax::{FunctionSpan, ParseError};
pub use koala_trace::*;

pub const WAIT: Duration = Duration::from_secs(5);

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// Fresh directory under the system temp dir.
pub fn temp_root(label: &str) -> PathBuf {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "koala-trace-{label}-{}-{id}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create temp dir");
    std::fs::canonicalize(&dir).expect("canonical temp dir")
}

pub fn write_file(root: &Path, relative: &str, text: &str) -> PathBuf {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
    std::fs::write(&path, text).expect("write source");
    path
}

pub fn loc(path: &str, line: u32) -> SourceLocation {
    SourceLocation::new(path, line)
}

/// Tracker over an in-memory tree with default settings.
pub fn memory_tracker(
    tree: MemorySourceTree,
    breakpoints: Vec<Breakpoint>,
) -> (Tracker, Arc<StaticRegistry>) {
    let registry = Arc::new(StaticRegistry::new(breakpoints));
    let tracker = Tracker::new(
        HeuristicSettings::default(),
        registry.clone(),
        Arc::new(tree),
        Arc::new(SyntaxOutline),
    );
    (tracker, registry)
}

/// Source tree whose enumeration blocks until the test releases it.
pub struct GatedTree {
    pub inner: MemorySourceTree,
    pub entered: Sender<()>,
    pub gate: Receiver<()>,
}

impl GatedTree {
    /// The tree plus `(entered, release)` handles for the test.
    pub fn new(inner: MemorySourceTree) -> (Self, Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        (
            Self {
                inner,
                entered: entered_tx,
                gate: gate_rx,
            },
            entered_rx,
            gate_tx,
        )
    }
}

impl SourceTree for GatedTree {
    fn files(&self) -> Result<Vec<PathBuf>, SourceError> {
        let _ = self.entered.send(());
        let _ = self.gate.recv();
        self.inner.files()
    }

    fn read(&self, path: &Path) -> std::io::Result<String> {
        self.inner.read(path)
    }

    fn canonicalize(&self, path: &Path) -> std::io::Result<PathBuf> {
        self.inner.canonicalize(path)
    }
}

/// Registry that counts reads and blocks each one until the test releases it.
/// Dropping the release handle lets every later read through.
pub struct GatedRegistry {
    pub inner: StaticRegistry,
    pub reads: AtomicUsize,
    pub entered: Sender<()>,
    pub gate: Receiver<()>,
}

impl GatedRegistry {
    pub fn new(inner: StaticRegistry) -> (Arc<Self>, Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        let registry = Arc::new(Self {
            inner,
            reads: AtomicUsize::new(0),
            entered: entered_tx,
            gate: gate_rx,
        });
        (registry, entered_rx, gate_tx)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl BreakpointRegistry for GatedRegistry {
    fn entries(&self) -> Vec<RegistryEntry> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let _ = self.entered.send(());
        let _ = self.gate.recv();
        self.inner.entries()
    }
}

/// Outline parser that blocks on every file until the test releases it.
pub struct GatedParser {
    pub entered: Sender<()>,
    pub gate: Receiver<()>,
}

impl GatedParser {
    pub fn new() -> (Self, Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        (
            Self {
                entered: entered_tx,
                gate: gate_rx,
            },
            entered_rx,
            gate_tx,
        )
    }
}

impl OutlineParser for GatedParser {
    fn functions(&self, path: &Path, text: &str) -> Result<Vec<FunctionSpan>, ParseError> {
        let _ = self.entered.send(());
        let _ = self.gate.recv();
        SyntaxOutline.functions(path, text)
    }
}

/// Memory tree where some paths fail to read and others fail to canonicalize.
pub struct FlakyTree {
    pub inner: MemorySourceTree,
    pub unreadable: Vec<PathBuf>,
    pub unresolvable: Vec<PathBuf>,
}

impl SourceTree for FlakyTree {
    fn files(&self) -> Result<Vec<PathBuf>, SourceError> {
        let mut files = self.inner.files()?;
        files.extend(self.unreadable.iter().cloned());
        Ok(files)
    }

    fn read(&self, path: &Path) -> std::io::Result<String> {
        if self.unreadable.iter().any(|p| p == path) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "unreadable",
            ));
        }
        self.inner.read(path)
    }

    fn canonicalize(&self, path: &Path) -> std::io::Result<PathBuf> {
        if self.unresolvable.iter().any(|p| p == path) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "dangling",
            ));
        }
        self.inner.canonicalize(path)
    }
}

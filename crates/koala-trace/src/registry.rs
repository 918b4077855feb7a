//! Boundary to the host's breakpoint store.

use parking_lot::RwLock;

use crate::location::{Breakpoint, BreakpointSnapshot, RegistryEntry, SourceLocation};

/// Read access to the user's declared breakpoints.
pub trait BreakpointRegistry: Send + Sync {
    /// All entries in registry order, resolved or not.
    fn entries(&self) -> Vec<RegistryEntry>;

    /// Resolved breakpoints captured at one instant.
    fn snapshot(&self) -> BreakpointSnapshot {
        BreakpointSnapshot::from_entries(self.entries())
    }
}

/// Change notification from the registry; each one triggers a view recompute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    Added(Breakpoint),
    Removed(SourceLocation),
    Changed(Breakpoint),
}

/// In-memory registry for the CLI and tests.
#[derive(Debug, Default)]
pub struct StaticRegistry {
    entries: RwLock<Vec<RegistryEntry>>,
}

impl StaticRegistry {
    #[must_use]
    pub fn new(breakpoints: impl IntoIterator<Item = Breakpoint>) -> Self {
        Self {
            entries: RwLock::new(breakpoints.into_iter().map(RegistryEntry::from).collect()),
        }
    }

    /// Add an entry the host could not resolve to a position.
    pub fn push_unresolved(&self, enabled: bool) {
        self.entries.write().push(RegistryEntry {
            position: None,
            enabled,
        });
    }

    /// Mirror a change notification into the store.
    pub fn apply(&self, event: &RegistryEvent) {
        let mut entries = self.entries.write();
        match event {
            RegistryEvent::Added(breakpoint) => {
                entries.push(RegistryEntry::from(breakpoint.clone()));
            }
            RegistryEvent::Removed(location) => {
                entries.retain(|entry| entry.position.as_ref() != Some(location));
            }
            RegistryEvent::Changed(breakpoint) => {
                for entry in entries.iter_mut() {
                    if entry.position.as_ref() == Some(&breakpoint.location) {
                        entry.enabled = breakpoint.enabled;
                    }
                }
            }
        }
    }
}

impl BreakpointRegistry for StaticRegistry {
    fn entries(&self) -> Vec<RegistryEntry> {
        self.entries.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_change_notifications() {
        let a = SourceLocation::new("A.kt", 1);
        let b = SourceLocation::new("A.kt", 2);
        let registry = StaticRegistry::new([Breakpoint::enabled(a.clone())]);
        registry.push_unresolved(true);
        registry.apply(&RegistryEvent::Added(Breakpoint::enabled(b.clone())));
        registry.apply(&RegistryEvent::Changed(Breakpoint::disabled(b.clone())));
        registry.apply(&RegistryEvent::Removed(a));

        assert_eq!(registry.entries().len(), 2);
        let snapshot = registry.snapshot();
        let kept: Vec<_> = snapshot.iter().cloned().collect();
        assert_eq!(kept, vec![Breakpoint::disabled(b)]);
    }
}

use std::collections::HashMap;

use nix::unistd::Pid;
use tracing::debug;

use crate::types::ResourceKind;

/// A resource some earlier call produced, named by its creation order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceHandle {
    pub kind: &'static ResourceKind,
    pub id: usize,
    pub pid: Pid,
    pub raw: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceResolution {
    Handle(ResourceHandle),
    Literal(u64),
}

#[derive(Debug, Default)]
struct ProcessBindings {
    next_id: usize,
    // keyed by the root of the kind lineage, fd 3 and watch descriptor 3 live side by side
    bindings: HashMap<(&'static str, u64), ResourceHandle>,
}

#[derive(Debug, Default)]
pub struct ResourceTracker {
    processes: HashMap<Pid, ProcessBindings>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `raw` to a fresh handle, replacing whatever it was bound to.
    /// Sentinel values never bind.
    pub fn bind_new_resource(
        &mut self,
        pid: Pid,
        raw: u64,
        kind: &'static ResourceKind,
    ) -> Option<ResourceHandle> {
        if kind.is_sentinel(raw) {
            return None;
        }
        let process = self.processes.entry(pid).or_default();
        let handle = ResourceHandle {
            kind,
            id: process.next_id,
            pid,
            raw,
        };
        process.next_id += 1;
        if let Some(previous) = process
            .bindings
            .insert((kind.family(), raw), handle.clone())
        {
            debug!(
                raw,
                previous = previous.id,
                current = handle.id,
                "resource value reused, older handle is no longer reachable"
            );
        }
        Some(handle)
    }

    pub fn lookup(&self, pid: Pid, raw: u64, kind: &ResourceKind) -> Option<&ResourceHandle> {
        if kind.is_sentinel(raw) {
            return None;
        }
        self.processes
            .get(&pid)?
            .bindings
            .get(&(kind.family(), raw))
    }

    pub fn resolve_argument(&self, pid: Pid, raw: u64, kind: &ResourceKind) -> ResourceResolution {
        match self.lookup(pid, raw, kind) {
            Some(handle) if handle.kind.is_compatible(kind) => {
                ResourceResolution::Handle(handle.clone())
            }
            _ => ResourceResolution::Literal(raw),
        }
    }

    pub fn handles_created(&self, pid: Pid) -> usize {
        self.processes
            .get(&pid)
            .map_or(0, |process| process.next_id)
    }
}

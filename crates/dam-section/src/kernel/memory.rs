//! In-memory snapshot kernel
//!
//! Holds snapshots registered by a host (or a test) and serves them through the
//! [`GeometryKernelAdapter`] trait.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use uuid::Uuid;

use super::{BrepSnapshot, GeometryKernelAdapter, KernelError, KernelResult};

/// Snapshot-backed kernel adapter
#[derive(Debug, Default)]
pub struct SnapshotKernel {
    /// Storage for snapshots (keyed by solid ID, ordered for stable listing)
    solids: RwLock<BTreeMap<Uuid, BrepSnapshot>>,
}

impl SnapshotKernel {
    /// Create an empty kernel
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a snapshot after checking it, replacing any previous one with the same ID
    pub fn insert(&self, snapshot: BrepSnapshot) -> KernelResult<Uuid> {
        snapshot.check()?;
        let id = snapshot.solid_id;
        tracing::debug!(
            "Registered solid '{}' ({} faces)",
            snapshot.name,
            snapshot.face_count()
        );
        self.solids.write().insert(id, snapshot);
        Ok(id)
    }

    /// Remove a snapshot
    pub fn remove(&self, solid_id: Uuid) -> Option<BrepSnapshot> {
        self.solids.write().remove(&solid_id)
    }

    /// Number of registered solids
    pub fn len(&self) -> usize {
        self.solids.read().len()
    }

    /// Check if no solid is registered
    pub fn is_empty(&self) -> bool {
        self.solids.read().is_empty()
    }
}

impl GeometryKernelAdapter for SnapshotKernel {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn solids(&self) -> Vec<Uuid> {
        self.solids.read().keys().copied().collect()
    }

    fn snapshot(&self, solid_id: Uuid) -> KernelResult<BrepSnapshot> {
        self.solids
            .read()
            .get(&solid_id)
            .cloned()
            .ok_or(KernelError::SolidNotFound(solid_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::SnapshotBuilder;

    #[test]
    fn test_insert_and_snapshot() {
        let kernel = SnapshotKernel::new();
        let block = SnapshotBuilder::rectangular_block(10.0, 10.0, 4.0).extrude();
        let id = kernel.insert(block.clone()).unwrap();

        assert_eq!(kernel.len(), 1);
        assert_eq!(kernel.solids(), vec![id]);
        assert_eq!(kernel.snapshot(id).unwrap(), block);
    }

    #[test]
    fn test_missing_solid() {
        let kernel = SnapshotKernel::new();
        let id = Uuid::new_v4();
        assert_eq!(kernel.snapshot(id), Err(KernelError::SolidNotFound(id)));
    }

    #[test]
    fn test_invalid_snapshot_is_rejected() {
        let kernel = SnapshotKernel::new();
        let empty = BrepSnapshot::new(Uuid::new_v4(), "empty", Vec::new());
        assert!(kernel.insert(empty).is_err());
        assert!(kernel.is_empty());
    }
}

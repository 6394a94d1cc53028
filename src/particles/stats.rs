/// Snapshot of one slab's counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlabStats {
    pub name: &'static str,
    pub capacity: usize,
    /// New or Alive slots
    pub live: usize,
    /// Requests queued but not yet drained
    pub pending_spawns: usize,
    /// Requests that claimed a slot, since creation
    pub spawned: u64,
    /// Requests discarded because the slab was full, since creation
    pub dropped: u64,
    pub expired: u64,
    /// Instances in the last packed buffer
    pub packed: usize,
}

/// Statistics about the particle system
#[derive(Debug, Clone, Default)]
pub struct ParticleSystemStats {
    /// One entry per slab, in registration order
    pub slabs: Vec<SlabStats>,
    pub total_live: usize,
    pub total_capacity: usize,
}

impl ParticleSystemStats {
    pub fn from_slabs(slabs: Vec<SlabStats>) -> Self {
        let total_live = slabs.iter().map(|s| s.live).sum();
        let total_capacity = slabs.iter().map(|s| s.capacity).sum();
        Self {
            slabs,
            total_live,
            total_capacity,
        }
    }

    /// Fraction of all slots in use
    pub fn capacity_used(&self) -> f32 {
        if self.total_capacity == 0 {
            return 0.0;
        }
        self.total_live as f32 / self.total_capacity as f32
    }

    pub fn slab(&self, name: &str) -> Option<&SlabStats> {
        self.slabs.iter().find(|s| s.name == name)
    }
}

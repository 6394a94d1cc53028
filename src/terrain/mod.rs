//! Terrain collaborator contracts
//!
//! The particle core never owns world data. It asks the terrain for the
//! obstacles inside a swept volume and for per-cell visibility and light.

pub mod grid;

pub use grid::{VoxelCell, VoxelGrid};

use glam::IVec3;

use crate::physics::Aabb;

/// Side effect an obstacle applies to a particle overlapping it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Contact {
    #[default]
    Inert,
    /// Marks the particle as submerged (extra drag)
    Liquid,
    /// Lava, fire and similar; kinds may terminate on touch
    Hazard,
}

/// One obstacle returned by a terrain query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub bounds: Aabb,
    /// Blocks particle movement
    pub solid: bool,
    pub contact: Contact,
}

/// Visibility and lighting of one voxel cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellSample {
    pub solid: bool,
    pub opaque: bool,
    /// 0..=15
    pub block_light: u8,
    /// 0..=15
    pub sky_light: u8,
}

impl CellSample {
    /// Cells that are both solid and opaque hide anything inside them
    pub fn hides_particles(&self) -> bool {
        self.solid && self.opaque
    }
}

/// Terrain collision and sampling service
///
/// Implementations must treat unloaded cells as empty: no obstacles, not
/// opaque. Both methods are called from the simulation thread and the render
/// thread concurrently.
pub trait Terrain: Send + Sync {
    /// Append every obstacle intersecting `volume` to `out`
    fn collect_obstacles(&self, volume: &Aabb, out: &mut Vec<Obstacle>);

    fn sample(&self, cell: IVec3) -> CellSample;
}

use glam::IVec3;
use rustc_hash::FxHashMap;

use crate::constants::render_constants::MAX_LIGHT_LEVEL;
use crate::physics::{aabb_unit_cell, Aabb};
use crate::terrain::{CellSample, Contact, Obstacle, Terrain};

/// Material of one occupied voxel cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoxelCell {
    pub solid: bool,
    pub opaque: bool,
    pub contact: Contact,
    /// Light emitted into the cell itself
    pub emission: u8,
}

impl VoxelCell {
    pub const fn stone() -> Self {
        Self { solid: true, opaque: true, contact: Contact::Inert, emission: 0 }
    }

    pub const fn glass() -> Self {
        Self { solid: true, opaque: false, contact: Contact::Inert, emission: 0 }
    }

    pub const fn water() -> Self {
        Self { solid: false, opaque: false, contact: Contact::Liquid, emission: 0 }
    }

    pub const fn lava() -> Self {
        Self { solid: false, opaque: true, contact: Contact::Hazard, emission: MAX_LIGHT_LEVEL }
    }
}

/// Sparse in-memory voxel field
///
/// Every absent cell is air lit by `sky_light`. Used by tests, benchmarks and
/// the soak binary; real worlds implement [`Terrain`] over their chunk store.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    cells: FxHashMap<IVec3, VoxelCell>,
    block_light: FxHashMap<IVec3, u8>,
    sky_light: u8,
}

impl Default for VoxelGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl VoxelGrid {
    pub fn new() -> Self {
        Self {
            cells: FxHashMap::default(),
            block_light: FxHashMap::default(),
            sky_light: MAX_LIGHT_LEVEL,
        }
    }

    pub fn set(&mut self, cell: IVec3, voxel: VoxelCell) {
        self.cells.insert(cell, voxel);
    }

    pub fn remove(&mut self, cell: IVec3) -> Option<VoxelCell> {
        self.cells.remove(&cell)
    }

    pub fn get(&self, cell: IVec3) -> Option<&VoxelCell> {
        self.cells.get(&cell)
    }

    /// Fill the inclusive cell range `min..=max`
    pub fn fill(&mut self, min: IVec3, max: IVec3, voxel: VoxelCell) {
        for z in min.z..=max.z {
            for y in min.y..=max.y {
                for x in min.x..=max.x {
                    self.cells.insert(IVec3::new(x, y, z), voxel);
                }
            }
        }
    }

    pub fn set_block_light(&mut self, cell: IVec3, level: u8) {
        self.block_light.insert(cell, level.min(MAX_LIGHT_LEVEL));
    }

    pub fn set_sky_light(&mut self, level: u8) {
        self.sky_light = level.min(MAX_LIGHT_LEVEL);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Terrain for VoxelGrid {
    fn collect_obstacles(&self, volume: &Aabb, out: &mut Vec<Obstacle>) {
        if self.cells.is_empty() {
            return;
        }

        let min = volume.min.floor().as_ivec3();
        let max = volume.max.floor().as_ivec3();
        for z in min.z..=max.z {
            for y in min.y..=max.y {
                for x in min.x..=max.x {
                    let cell = IVec3::new(x, y, z);
                    if let Some(voxel) = self.cells.get(&cell) {
                        if voxel.solid || voxel.contact != Contact::Inert {
                            out.push(Obstacle {
                                bounds: aabb_unit_cell(cell),
                                solid: voxel.solid,
                                contact: voxel.contact,
                            });
                        }
                    }
                }
            }
        }
    }

    fn sample(&self, cell: IVec3) -> CellSample {
        let voxel = self.cells.get(&cell);
        let emitted = voxel.map_or(0, |v| v.emission);
        let placed = self.block_light.get(&cell).copied().unwrap_or(0);
        let sky_light = match voxel {
            Some(v) if v.opaque => 0,
            _ => self.sky_light,
        };

        CellSample {
            solid: voxel.map_or(false, |v| v.solid),
            opaque: voxel.map_or(false, |v| v.opaque),
            block_light: emitted.max(placed),
            sky_light,
        }
    }
}

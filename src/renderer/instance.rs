use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::constants::render_constants::{INSTANCE_STRIDE, MAX_LIGHT_LEVEL};
use crate::terrain::CellSample;

/// Per-instance record consumed by the particle vertex shader
///
/// Layout (byte offsets): color 0, light 16, tex_offset 24, transform 32,
/// tex_size 80, padding 88.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    /// RGBA
    pub color: [f32; 4],
    /// Block light and sky light, normalised to 0..=1
    pub light: [f32; 2],
    /// Atlas offset of the particle texture (UV)
    pub tex_offset: [f32; 2],
    /// Rows of a 3x4 affine transform
    pub transform: [[f32; 4]; 3],
    /// Atlas size of the particle texture (UV)
    pub tex_size: [f32; 2],
    pub _padding: [f32; 2],
}

const _: () = assert!(std::mem::size_of::<InstanceData>() == INSTANCE_STRIDE);

/// Region of the particle texture atlas, in UV units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasRegion {
    pub offset: Vec2,
    pub size: Vec2,
}

impl Default for AtlasRegion {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            size: Vec2::ONE,
        }
    }
}

impl AtlasRegion {
    pub fn new(offset: Vec2, size: Vec2) -> Self {
        Self { offset, size }
    }

    /// Cell `index` of an atlas split into `columns` x `rows` equal tiles
    pub fn grid_cell(index: u32, columns: u32, rows: u32) -> Self {
        let columns = columns.max(1);
        let rows = rows.max(1);
        let size = Vec2::new(1.0 / columns as f32, 1.0 / rows as f32);
        let column = index % columns;
        let row = (index / columns) % rows;
        Self {
            offset: Vec2::new(column as f32, row as f32) * size,
            size,
        }
    }

    /// A random sub-square of this region, `fraction` of its size, used to
    /// cut debris chips out of a block texture
    pub fn sub_region(&self, fraction: f32, u: f32, v: f32) -> Self {
        let fraction = fraction.clamp(0.0, 1.0);
        let size = self.size * fraction;
        let slack = self.size - size;
        Self {
            offset: self.offset + slack * Vec2::new(u.clamp(0.0, 1.0), v.clamp(0.0, 1.0)),
            size,
        }
    }
}

/// Normalise the two terrain light levels for the shader
pub fn light_terms(sample: &CellSample) -> [f32; 2] {
    let max = MAX_LIGHT_LEVEL as f32;
    [
        sample.block_light.min(MAX_LIGHT_LEVEL) as f32 / max,
        sample.sky_light.min(MAX_LIGHT_LEVEL) as f32 / max,
    ]
}

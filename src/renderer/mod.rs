//! Render-side boundary of the particle core
//!
//! The core packs instance records; whatever owns the GPU receives them through
//! [`ParticleRenderer`] and issues one instanced draw per slab.

pub mod billboard;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod instance;
pub mod packer;

pub use billboard::{billboard_rotation, transform_rows};
#[cfg(feature = "gpu")]
pub use gpu::ParticleGpuBuffers;
pub use instance::{light_terms, AtlasRegion, InstanceData};
pub use packer::{InstancePacker, PackContext};

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// What the packer needs to know about the viewer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        Self { position }
    }
}

/// How a slab's instances are composited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    Opaque,
    /// Requires back-to-front ordering
    AlphaBlend,
}

/// Shader uniforms shared by every particle draw
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ParticleUniforms {
    /// RGB fog color, alpha unused
    pub fog_color: [f32; 4],
    pub fog_start: f32,
    pub fog_end: f32,
    /// Darkening applied to sky light (night, weather)
    pub light_reduction: f32,
    /// Light level of an item the player carries, 0..=1
    pub player_light: f32,
}

impl Default for ParticleUniforms {
    fn default() -> Self {
        Self {
            fog_color: [0.7, 0.8, 1.0, 1.0],
            fog_start: 64.0,
            fog_end: 128.0,
            light_reduction: 0.0,
            player_light: 0.0,
        }
    }
}

/// One instanced draw covering all visible instances of a slab
#[derive(Debug, Clone, Copy)]
pub struct InstanceBatch<'a> {
    pub kind: &'static str,
    pub bytes: &'a [u8],
    pub instance_count: u32,
    pub stride: u32,
    pub blend: BlendMode,
}

/// GPU resource and shader boundary
pub trait ParticleRenderer {
    /// Called once before the frame's uniforms and draws
    fn begin_frame(&mut self) {}

    fn set_uniforms(&mut self, uniforms: &ParticleUniforms);

    /// Submit one slab's packed instances for drawing
    ///
    /// Implementations may draw immediately or upload `batch.bytes` now and
    /// record the draw of `batch.instance_count` instances later in the frame.
    fn draw_instanced(&mut self, batch: InstanceBatch<'_>);
}

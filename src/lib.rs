//! Particle simulation and instanced rendering core for a voxel engine
//!
//! Particles live in fixed-capacity slabs, one per kind. A background thread
//! steps them through the voxel collision field at a fixed rate while the
//! render loop packs the visible ones into one instance buffer per slab.
//!
//! ```no_run
//! use std::sync::Arc;
//! use glam::Vec3;
//! use hearth_particles::{BlockDebris, Camera, ParticleConfig, ParticleSystem, VoxelGrid};
//!
//! let mut system =
//!     ParticleSystem::with_default_kinds(ParticleConfig::default(), Arc::new(VoxelGrid::new()))?;
//! system.start()?;
//! system.spawn::<BlockDebris, _>(|body, _| {
//!     body.position = Vec3::new(0.5, 0.5, 64.0);
//!     body.lifetime = 1.5;
//! });
//! system.update(&Camera::new(Vec3::new(0.0, -4.0, 66.0)));
//! system.shutdown()?;
//! # Ok::<(), hearth_particles::ParticleError>(())
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod particles;
pub mod physics;
pub mod renderer;
pub mod terrain;

pub use config::{ParticleConfig, PhysicsSettings, SlabCapacities};
pub use error::{ParticleError, ParticleResult};
pub use particles::{
    BlockDebris, BodyPart, BodyPartData, DebrisData, Fate, ParticleBody, ParticleInstance,
    ParticleKind, ParticleSlab, ParticleState, ParticleSystem, ParticleSystemStats, SoftSprite,
    SpriteData,
};
pub use physics::{Aabb, StepOutcome};
pub use renderer::{
    BlendMode, Camera, InstanceBatch, InstanceData, ParticleRenderer, ParticleUniforms,
};
pub use terrain::{CellSample, Contact, Obstacle, Terrain, VoxelCell, VoxelGrid};

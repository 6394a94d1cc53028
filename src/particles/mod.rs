//! Particle slabs, kinds and the orchestrating system
//!
//! Each kind lives in its own fixed-capacity slab. Gameplay code queues spawns
//! from any thread, the simulation tick claims slots and steps physics, and the
//! render frame promotes new particles and packs the visible ones.

pub mod arena;
pub mod effects;
pub mod instance;
pub mod kind;
pub mod kinds;
pub mod slab;
pub mod snapshot;
pub mod stats;
pub mod system;

pub use arena::{DrainReport, Initializer, SlotArena, StepReport};
pub use effects::{block_break, scatter_body_parts, smoke_puff, BodyPartPiece};
pub use instance::{ParticleBody, ParticleInstance, ParticleState, SlotStates};
pub use kind::{Fate, ParticleKind};
pub use kinds::{BlockDebris, BodyPart, BodyPartData, DebrisData, SoftSprite, SpriteData};
pub use slab::ParticleSlab;
pub use snapshot::{PublishedSlot, Snapshot, SnapshotExchange, SNAPSHOT_BUFFERS};
pub use stats::{ParticleSystemStats, SlabStats};
pub use system::{ParticleSystem, SIMULATION_THREAD_NAME};

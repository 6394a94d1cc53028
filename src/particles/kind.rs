use glam::Vec3;

use crate::particles::ParticleBody;
use crate::physics::StepOutcome;
use crate::renderer::{BlendMode, InstanceData, PackContext};

/// What a kind decides after each physics step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    Live,
    /// Free the slot now regardless of remaining lifetime
    Expire,
}

/// A particle specialisation: its extra per-instance data and how it packs
///
/// The slab engine is generic over this trait; kinds never touch slot
/// allocation or lifecycle state.
pub trait ParticleKind: Send + Sync + 'static {
    type Data: Default + Clone + Send + Sync + 'static;

    /// Stable name used for logging, stats and GPU buffer labels
    const NAME: &'static str;

    const BLEND: BlendMode = BlendMode::Opaque;

    /// Runs on the simulation thread right after the spawn initializer
    fn initialize(_body: &mut ParticleBody, _data: &mut Self::Data) {}

    /// Kind-specific reaction to a physics step (spin damping, contact death)
    fn after_step(
        _body: &mut ParticleBody,
        _data: &mut Self::Data,
        _outcome: &StepOutcome,
        _dt: f32,
    ) -> Fate {
        Fate::Live
    }

    /// Depth key for back-to-front ordering; `None` for unsorted kinds.
    /// A kind returns either always `Some` or always `None`.
    fn sort_key(_body: &ParticleBody, _camera: Vec3) -> Option<f32> {
        None
    }

    fn pack_one(body: &ParticleBody, data: &Self::Data, context: &PackContext) -> InstanceData;
}

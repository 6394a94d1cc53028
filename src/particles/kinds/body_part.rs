use glam::{Quat, Vec3, Vec4};

use crate::particles::kinds::debris::tumble;
use crate::particles::{Fate, ParticleBody, ParticleKind};
use crate::physics::StepOutcome;
use crate::renderer::{transform_rows, AtlasRegion, InstanceData, PackContext};

/// Fraction of spin kept per tick once a part lies on the ground
pub const BODY_PART_SPIN_RETENTION: f32 = 0.2;

/// Limbs and heads flung off a mob when it dies
pub struct BodyPart;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyPartData {
    pub orientation: Quat,
    pub angular_velocity: Vec3,
    /// Quad extents along the local axes
    pub size: Vec3,
    pub region: AtlasRegion,
    pub tint: Vec4,
}

impl Default for BodyPartData {
    fn default() -> Self {
        Self {
            orientation: Quat::IDENTITY,
            angular_velocity: Vec3::ZERO,
            size: Vec3::splat(0.25),
            region: AtlasRegion::default(),
            tint: Vec4::ONE,
        }
    }
}

impl ParticleKind for BodyPart {
    type Data = BodyPartData;

    const NAME: &'static str = "body_part";

    /// The collision box follows the visual size so parts rest on their faces
    fn initialize(body: &mut ParticleBody, data: &mut BodyPartData) {
        body.half_extents = data.size.abs() * 0.5;
    }

    fn after_step(
        _body: &mut ParticleBody,
        data: &mut BodyPartData,
        outcome: &StepOutcome,
        dt: f32,
    ) -> Fate {
        if outcome.grounded {
            data.angular_velocity *= BODY_PART_SPIN_RETENTION;
        }
        data.orientation = tumble(data.orientation, data.angular_velocity, dt);
        Fate::Live
    }

    fn pack_one(body: &ParticleBody, data: &BodyPartData, context: &PackContext) -> InstanceData {
        let rotation = context.billboard * data.orientation;
        InstanceData {
            color: data.tint.to_array(),
            light: context.light(),
            tex_offset: data.region.offset.to_array(),
            transform: transform_rows(data.size, rotation, body.position),
            tex_size: data.region.size.to_array(),
            _padding: [0.0; 2],
        }
    }
}

use glam::{Quat, Vec3, Vec4};

use crate::particles::{Fate, ParticleBody, ParticleKind};
use crate::physics::StepOutcome;
use crate::renderer::{transform_rows, AtlasRegion, InstanceData, PackContext};

/// Fraction of spin kept per tick while resting on the ground
pub const GROUNDED_SPIN_RETENTION: f32 = 0.5;

/// Chips of a broken block, textured with a piece of the block's face
pub struct BlockDebris;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebrisData {
    pub orientation: Quat,
    /// Rotation vector, radians per second
    pub angular_velocity: Vec3,
    /// Edge length of the chip quad
    pub size: f32,
    pub region: AtlasRegion,
    pub tint: Vec4,
}

impl Default for DebrisData {
    fn default() -> Self {
        Self {
            orientation: Quat::IDENTITY,
            angular_velocity: Vec3::ZERO,
            size: 0.1,
            region: AtlasRegion::default(),
            tint: Vec4::ONE,
        }
    }
}

/// Integrate a rotation vector into an orientation
pub(crate) fn tumble(orientation: Quat, angular_velocity: Vec3, dt: f32) -> Quat {
    let delta = angular_velocity * dt;
    if delta.length_squared() == 0.0 {
        return orientation;
    }
    (Quat::from_scaled_axis(delta) * orientation).normalize()
}

impl ParticleKind for BlockDebris {
    type Data = DebrisData;

    const NAME: &'static str = "block_debris";

    fn after_step(
        _body: &mut ParticleBody,
        data: &mut DebrisData,
        outcome: &StepOutcome,
        dt: f32,
    ) -> Fate {
        if outcome.hazard {
            return Fate::Expire;
        }
        if outcome.grounded {
            data.angular_velocity *= GROUNDED_SPIN_RETENTION;
        }
        data.orientation = tumble(data.orientation, data.angular_velocity, dt);
        Fate::Live
    }

    fn pack_one(body: &ParticleBody, data: &DebrisData, context: &PackContext) -> InstanceData {
        let rotation = context.billboard * data.orientation;
        InstanceData {
            color: data.tint.to_array(),
            light: context.light(),
            tex_offset: data.region.offset.to_array(),
            transform: transform_rows(Vec3::splat(data.size), rotation, body.position),
            tex_size: data.region.size.to_array(),
            _padding: [0.0; 2],
        }
    }
}

use glam::{Quat, Vec3, Vec4};

use crate::particles::{Fate, ParticleBody, ParticleKind};
use crate::physics::StepOutcome;
use crate::renderer::{transform_rows, AtlasRegion, BlendMode, InstanceData, PackContext};

/// Alpha-blended billboards (smoke, steam, flames) that fade over their life
pub struct SoftSprite;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteData {
    pub start_color: Vec4,
    pub end_color: Vec4,
    pub start_size: f32,
    pub end_size: f32,
    /// Roll around the view axis, radians per second
    pub spin: f32,
    pub angle: f32,
    pub region: AtlasRegion,
    /// Flames and embers go out on touching liquid
    pub dies_in_liquid: bool,
}

impl Default for SpriteData {
    fn default() -> Self {
        Self {
            start_color: Vec4::ONE,
            end_color: Vec4::new(1.0, 1.0, 1.0, 0.0),
            start_size: 0.25,
            end_size: 0.5,
            spin: 0.0,
            angle: 0.0,
            region: AtlasRegion::default(),
            dies_in_liquid: false,
        }
    }
}

impl SpriteData {
    /// Color and size at `life` (1.0 at spawn, 0.0 at expiry)
    pub fn interpolate(&self, life: f32) -> (Vec4, f32) {
        let life = life.clamp(0.0, 1.0);
        let color = self.end_color.lerp(self.start_color, life);
        let size = self.end_size + (self.start_size - self.end_size) * life;
        (color, size)
    }
}

impl ParticleKind for SoftSprite {
    type Data = SpriteData;

    const NAME: &'static str = "soft_sprite";
    const BLEND: BlendMode = BlendMode::AlphaBlend;

    fn after_step(
        _body: &mut ParticleBody,
        data: &mut SpriteData,
        outcome: &StepOutcome,
        dt: f32,
    ) -> Fate {
        if data.dies_in_liquid && outcome.submerged {
            return Fate::Expire;
        }
        data.angle = (data.angle + data.spin * dt) % std::f32::consts::TAU;
        Fate::Live
    }

    fn sort_key(body: &ParticleBody, camera: Vec3) -> Option<f32> {
        Some(body.position.distance_squared(camera))
    }

    fn pack_one(body: &ParticleBody, data: &SpriteData, context: &PackContext) -> InstanceData {
        let (color, size) = data.interpolate(body.life_fraction());
        let rotation = context.billboard * Quat::from_rotation_x(data.angle);
        InstanceData {
            color: color.to_array(),
            light: context.light(),
            tex_offset: data.region.offset.to_array(),
            transform: transform_rows(Vec3::splat(size), rotation, body.position),
            tex_size: data.region.size.to_array(),
            _padding: [0.0; 2],
        }
    }
}

use glam::{Quat, Vec3, Vec4};
use rand::Rng;

use crate::particles::kinds::{
    BlockDebris, BodyPart, BodyPartData, DebrisData, SoftSprite, SpriteData,
};
use crate::particles::ParticleSystem;
use crate::renderer::AtlasRegion;

/// Chips per axis when a block breaks (4x4x4)
pub const BLOCK_BREAK_GRID: usize = 4;

/// One detached piece of a dying mob
#[derive(Debug, Clone, Copy)]
pub struct BodyPartPiece {
    /// Piece center relative to the mob origin
    pub offset: Vec3,
    pub orientation: Quat,
    pub size: Vec3,
    pub region: AtlasRegion,
}

/// Burst of debris chips filling the broken block at `cell_origin`
///
/// Each chip carries a random sub-square of the block's face texture and is
/// flung outward from the block center. Returns the number of spawn requests.
pub fn block_break<R: Rng>(
    system: &ParticleSystem,
    cell_origin: Vec3,
    face: AtlasRegion,
    tint: Vec4,
    rng: &mut R,
) -> usize {
    let center = cell_origin + Vec3::splat(0.5);
    let step = 1.0 / BLOCK_BREAK_GRID as f32;
    let mut requested = 0;

    for x in 0..BLOCK_BREAK_GRID {
        for y in 0..BLOCK_BREAK_GRID {
            for z in 0..BLOCK_BREAK_GRID {
                let local = (Vec3::new(x as f32, y as f32, z as f32) + 0.5) * step;
                let position = cell_origin + local;
                let outward = (position - center) * 4.0;
                let velocity = outward + Vec3::new(0.0, 0.0, rng.gen_range(1.0..3.0));
                let lifetime = rng.gen_range(0.8..1.6);
                let size = rng.gen_range(0.06..0.12);
                let spin = Vec3::new(
                    rng.gen_range(-6.0..6.0),
                    rng.gen_range(-6.0..6.0),
                    rng.gen_range(-6.0..6.0),
                );
                let region = face.sub_region(0.25, rng.gen(), rng.gen());

                let spawned = system.spawn::<BlockDebris, _>(move |body, data: &mut DebrisData| {
                    body.position = position;
                    body.velocity = velocity;
                    body.lifetime = lifetime;
                    body.half_extents = Vec3::splat(size * 0.5);
                    data.size = size;
                    data.angular_velocity = spin;
                    data.region = region;
                    data.tint = tint;
                });
                if !spawned {
                    return requested;
                }
                requested += 1;
            }
        }
    }

    requested
}

/// Small cloud of rising, fading smoke sprites
pub fn smoke_puff<R: Rng>(
    system: &ParticleSystem,
    position: Vec3,
    count: usize,
    rng: &mut R,
) -> usize {
    for spawned in 0..count {
        let offset = Vec3::new(
            rng.gen_range(-0.2..0.2),
            rng.gen_range(-0.2..0.2),
            rng.gen_range(0.0..0.2),
        );
        let velocity = Vec3::new(
            rng.gen_range(-0.3..0.3),
            rng.gen_range(-0.3..0.3),
            rng.gen_range(0.6..1.2),
        );
        let lifetime = rng.gen_range(1.5..3.0);
        let spin = rng.gen_range(-1.0..1.0);
        let grey = rng.gen_range(0.35..0.6);

        let queued = system.spawn::<SoftSprite, _>(move |body, data: &mut SpriteData| {
            body.position = position + offset;
            body.velocity = velocity;
            body.lifetime = lifetime;
            // Smoke drifts upward instead of falling
            body.gravity_multiplier = -0.05;
            body.air_friction = 1.5;
            data.start_color = Vec4::new(grey, grey, grey, 0.8);
            data.end_color = Vec4::new(grey, grey, grey, 0.0);
            data.start_size = 0.2;
            data.end_size = 0.8;
            data.spin = spin;
        });
        if !queued {
            return spawned;
        }
    }
    count
}

/// Throw the pieces of a dead mob away from `knockback`
pub fn scatter_body_parts<R: Rng>(
    system: &ParticleSystem,
    origin: Vec3,
    knockback: Vec3,
    pieces: &[BodyPartPiece],
    rng: &mut R,
) -> usize {
    for (spawned, piece) in pieces.iter().enumerate() {
        let piece = *piece;
        let jitter = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(1.5..3.0),
        );
        let velocity = knockback + jitter;
        let spin = Vec3::new(
            rng.gen_range(-4.0..4.0),
            rng.gen_range(-4.0..4.0),
            rng.gen_range(-4.0..4.0),
        );
        let lifetime = rng.gen_range(4.0..6.0);

        let queued = system.spawn::<BodyPart, _>(move |body, data: &mut BodyPartData| {
            body.position = origin + piece.offset;
            body.velocity = velocity;
            body.lifetime = lifetime;
            data.orientation = piece.orientation;
            data.angular_velocity = spin;
            data.size = piece.size;
            data.region = piece.region;
        });
        if !queued {
            return spawned;
        }
    }
    pieces.len()
}

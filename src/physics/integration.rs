/// Particle integration against the voxel collision field
///
/// One terrain query per particle per tick, then per-axis sweep resolution in
/// the fixed order Z, X, Y. Kind-specific code depends on the `grounded`
/// result this ordering produces, so the order must not change.

use glam::Vec3;

use crate::config::PhysicsSettings;
use crate::particles::ParticleBody;
use crate::physics::aabb::{aabb_clip_axis, aabb_overlaps, aabb_swept, aabb_translate};
use crate::terrain::{Contact, Obstacle, Terrain};

/// Axis resolution order: Z first so vertical arrest is known before sliding
pub const AXIS_ORDER: [usize; 3] = [2, 0, 1];

const AXIS_Z: usize = 2;

/// Result of one integration step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepOutcome {
    /// Downward movement was stopped by a solid obstacle
    pub grounded: bool,
    /// Overlapping at least one liquid obstacle after moving
    pub submerged: bool,
    /// Overlapping at least one hazard obstacle after moving
    pub hazard: bool,
}

/// Advance one particle body by `dt` seconds
///
/// `scratch` is the caller's reusable obstacle buffer; it is cleared here.
pub fn integrate_particle(
    body: &mut ParticleBody,
    dt: f32,
    terrain: &dyn Terrain,
    settings: &PhysicsSettings,
    scratch: &mut Vec<Obstacle>,
) -> StepOutcome {
    let limit = Vec3::splat(settings.max_displacement);
    let requested = (body.velocity * dt).clamp(-limit, limit);

    let mut outcome = StepOutcome::default();

    if body.collides {
        let mut bounds = body.bounds();
        scratch.clear();
        terrain.collect_obstacles(&aabb_swept(&bounds, requested), scratch);

        for axis in AXIS_ORDER {
            let wanted = requested[axis];
            if wanted == 0.0 {
                continue;
            }

            let mut allowed = wanted;
            for obstacle in scratch.iter().filter(|o| o.solid) {
                allowed = aabb_clip_axis(&bounds, &obstacle.bounds, axis, allowed);
            }

            let mut offset = Vec3::ZERO;
            offset[axis] = allowed;
            aabb_translate(&mut bounds, offset);
            body.position += offset;

            if allowed != wanted {
                if axis == AXIS_Z {
                    if wanted < 0.0 {
                        outcome.grounded = true;
                    } else {
                        body.velocity.z = 0.0;
                    }
                } else {
                    body.velocity[axis] = 0.0;
                }
            }
        }

        for obstacle in scratch.iter() {
            if !aabb_overlaps(&bounds, &obstacle.bounds) {
                continue;
            }
            match obstacle.contact {
                Contact::Liquid => outcome.submerged = true,
                Contact::Hazard => outcome.hazard = true,
                Contact::Inert => {}
            }
        }
    } else {
        body.position += requested;
    }

    let gravity = settings.gravity;
    body.velocity.z -= body.gravity_multiplier * gravity * dt;

    body.velocity /= 1.0 + body.air_friction * dt;
    if outcome.submerged {
        body.velocity /= 1.0 + body.water_friction * dt;
    } else if outcome.grounded {
        body.velocity.z = 0.0;
        body.velocity /= 1.0 + body.ground_friction * dt * gravity;
    }

    body.grounded = outcome.grounded;
    body.submerged = outcome.submerged;
    outcome
}

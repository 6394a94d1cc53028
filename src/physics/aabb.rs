/// Data-Oriented Axis-Aligned Bounding Box System
///
/// Pure functions operating on AABB data - the particle integrator sweeps
/// these through the terrain one axis at a time.

use glam::Vec3;

/// Axis-Aligned Bounding Box - pure data structure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

/// Create new AABB from min/max points
pub fn create_aabb(min: Vec3, max: Vec3) -> Aabb {
    Aabb { min, max }
}

/// Create AABB from center point and half extents
/// Pure function - transforms center/extents into AABB bounds
pub fn aabb_from_center_half_extents(center: Vec3, half_extents: Vec3) -> Aabb {
    Aabb {
        min: center - half_extents,
        max: center + half_extents,
    }
}

/// Unit cube occupying the voxel cell whose minimum corner is `cell`
pub fn aabb_unit_cell(cell: glam::IVec3) -> Aabb {
    let min = cell.as_vec3();
    Aabb {
        min,
        max: min + Vec3::ONE,
    }
}

/// Test if two AABBs intersect, touching faces included
/// Pure function - used for broad volume queries
pub fn aabb_intersects(aabb1: &Aabb, aabb2: &Aabb) -> bool {
    aabb1.min.x <= aabb2.max.x && aabb1.max.x >= aabb2.min.x &&
    aabb1.min.y <= aabb2.max.y && aabb1.max.y >= aabb2.min.y &&
    aabb1.min.z <= aabb2.max.z && aabb1.max.z >= aabb2.min.z
}

/// Test if two AABBs share interior volume; touching faces do not count
/// Pure function - used for contact effects after movement
pub fn aabb_overlaps(aabb1: &Aabb, aabb2: &Aabb) -> bool {
    aabb1.min.x < aabb2.max.x && aabb1.max.x > aabb2.min.x &&
    aabb1.min.y < aabb2.max.y && aabb1.max.y > aabb2.min.y &&
    aabb1.min.z < aabb2.max.z && aabb1.max.z > aabb2.min.z
}

/// Translate AABB by offset (mutating)
pub fn aabb_translate(aabb: &mut Aabb, offset: Vec3) {
    aabb.min += offset;
    aabb.max += offset;
}

/// Create translated copy of AABB
pub fn aabb_translated(aabb: &Aabb, offset: Vec3) -> Aabb {
    Aabb {
        min: aabb.min + offset,
        max: aabb.max + offset,
    }
}

/// Volume covered by an AABB moving along `displacement`
/// Pure function - extends each axis by the signed displacement
pub fn aabb_swept(aabb: &Aabb, displacement: Vec3) -> Aabb {
    Aabb {
        min: aabb.min + displacement.min(Vec3::ZERO),
        max: aabb.max + displacement.max(Vec3::ZERO),
    }
}

/// Largest movement along `axis` (0 = X, 1 = Y, 2 = Z) that `mover` can make
/// towards `obstacle` without entering it, limited to `requested`.
///
/// Only obstacles overlapping the mover on the two other axes can block, and
/// an obstacle the mover already penetrates on `axis` never blocks.
pub fn aabb_clip_axis(mover: &Aabb, obstacle: &Aabb, axis: usize, requested: f32) -> f32 {
    let (a, b) = ((axis + 1) % 3, (axis + 2) % 3);
    if mover.max[a] <= obstacle.min[a] || mover.min[a] >= obstacle.max[a] {
        return requested;
    }
    if mover.max[b] <= obstacle.min[b] || mover.min[b] >= obstacle.max[b] {
        return requested;
    }

    if requested > 0.0 && mover.max[axis] <= obstacle.min[axis] {
        let gap = obstacle.min[axis] - mover.max[axis];
        if gap < requested {
            return gap;
        }
    } else if requested < 0.0 && mover.min[axis] >= obstacle.max[axis] {
        let gap = obstacle.max[axis] - mover.min[axis];
        if gap > requested {
            return gap;
        }
    }

    requested
}

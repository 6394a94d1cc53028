pub mod aabb;
pub mod integration;

pub use aabb::{
    aabb_clip_axis, aabb_from_center_half_extents, aabb_intersects, aabb_overlaps,
    aabb_swept, aabb_translate, aabb_translated, aabb_unit_cell, create_aabb, Aabb,
};
pub use integration::{integrate_particle, StepOutcome, AXIS_ORDER};

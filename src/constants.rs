// Hearth Particles Constants - SINGLE SOURCE OF TRUTH
//
// Tuning values shared by the simulation, the packer and the config defaults.
// World units are blocks (one voxel cell = 1.0), Z is up.

/// Physics constants - ALL IN BLOCK UNITS
pub mod physics_constants {
    /// Gravitational acceleration magnitude (blocks/s²), applied along -Z
    pub const GRAVITY: f32 = 9.81;

    /// Largest displacement a particle may make on one axis in one tick (blocks)
    /// Bounds the swept query volume and stops tunnelling after a dt spike
    pub const MAX_DISPLACEMENT: f32 = 1.0;

    /// Default friction coefficients (1/s)
    pub const DEFAULT_AIR_FRICTION: f32 = 0.4;
    pub const DEFAULT_WATER_FRICTION: f32 = 4.0;
    pub const DEFAULT_GROUND_FRICTION: f32 = 0.6;

    /// Default collision box half-extents for a small particle (blocks)
    pub const DEFAULT_HALF_EXTENT: f32 = 0.05;

    /// Simulation tick rate (Hz)
    pub const DEFAULT_TICK_RATE_HZ: f32 = 60.0;

    /// Accepted tick rates; the interval must fit a `Duration` and stay above zero
    pub const MIN_TICK_RATE_HZ: f32 = 0.001;
    pub const MAX_TICK_RATE_HZ: f32 = 10_000.0;
}

/// Slab capacities
pub mod particle_limits {
    pub const DEFAULT_BLOCK_DEBRIS_CAPACITY: usize = 4096;
    pub const DEFAULT_BODY_PART_CAPACITY: usize = 256;
    pub const DEFAULT_SOFT_SPRITE_CAPACITY: usize = 2048;

    /// Hard upper bound; slot indices travel as u32 through the activation queue
    pub const MAX_SLAB_CAPACITY: usize = 1 << 20;
}

/// Render constants
pub mod render_constants {
    /// Size in bytes of one packed instance record
    pub const INSTANCE_STRIDE: usize = 96;

    /// Light levels reported by the terrain are in 0..=MAX_LIGHT_LEVEL
    pub const MAX_LIGHT_LEVEL: u8 = 15;

    /// Vertices per instanced billboard quad (two triangles)
    pub const QUAD_VERTEX_COUNT: u32 = 6;
}

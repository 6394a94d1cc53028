use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::particle_limits::{
    DEFAULT_BLOCK_DEBRIS_CAPACITY, DEFAULT_BODY_PART_CAPACITY, DEFAULT_SOFT_SPRITE_CAPACITY,
    MAX_SLAB_CAPACITY,
};
use crate::constants::physics_constants::{
    DEFAULT_TICK_RATE_HZ, GRAVITY, MAX_DISPLACEMENT, MAX_TICK_RATE_HZ, MIN_TICK_RATE_HZ,
};
use crate::error::{invalid_config, ParticleError, ParticleResult};

/// Particle subsystem configuration
///
/// Loaded from TOML; every field is optional and falls back to the values in
/// [`crate::constants`].
///
/// ```toml
/// tick_rate_hz = 30.0
///
/// [physics]
/// gravity = 9.81
///
/// [capacity]
/// soft_sprites = 512
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Simulation ticks per second
    pub tick_rate_hz: f32,
    pub physics: PhysicsSettings,
    pub capacity: SlabCapacities,
}

/// Global physics parameters shared by every slab
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Gravity magnitude (blocks/s²)
    pub gravity: f32,
    /// Per-axis displacement clamp per tick (blocks)
    pub max_displacement: f32,
}

/// Fixed capacities of the built-in slabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlabCapacities {
    pub block_debris: usize,
    pub body_parts: usize,
    pub soft_sprites: usize,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            physics: PhysicsSettings::default(),
            capacity: SlabCapacities::default(),
        }
    }
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            max_displacement: MAX_DISPLACEMENT,
        }
    }
}

impl Default for SlabCapacities {
    fn default() -> Self {
        Self {
            block_debris: DEFAULT_BLOCK_DEBRIS_CAPACITY,
            body_parts: DEFAULT_BODY_PART_CAPACITY,
            soft_sprites: DEFAULT_SOFT_SPRITE_CAPACITY,
        }
    }
}

impl ParticleConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> ParticleResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> ParticleResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ParticleError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw)?;
        log::info!("Loaded particle config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> ParticleResult<()> {
        if !(MIN_TICK_RATE_HZ..=MAX_TICK_RATE_HZ).contains(&self.tick_rate_hz) {
            return Err(invalid_config(format!(
                "tick_rate_hz must be in {}..={}, got {}",
                MIN_TICK_RATE_HZ, MAX_TICK_RATE_HZ, self.tick_rate_hz
            )));
        }
        if !self.physics.gravity.is_finite() {
            return Err(invalid_config("physics.gravity must be finite"));
        }
        if !(self.physics.max_displacement.is_finite() && self.physics.max_displacement > 0.0) {
            return Err(invalid_config(format!(
                "physics.max_displacement must be positive, got {}",
                self.physics.max_displacement
            )));
        }

        let capacities = [
            ("capacity.block_debris", self.capacity.block_debris),
            ("capacity.body_parts", self.capacity.body_parts),
            ("capacity.soft_sprites", self.capacity.soft_sprites),
        ];
        for (name, capacity) in capacities {
            validate_capacity(name, capacity)?;
        }

        Ok(())
    }

    /// Fixed simulation step in seconds
    pub fn tick_seconds(&self) -> f32 {
        1.0 / self.tick_rate_hz
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f32(self.tick_seconds())
    }
}

pub(crate) fn validate_capacity(name: &str, capacity: usize) -> ParticleResult<()> {
    if capacity == 0 || capacity > MAX_SLAB_CAPACITY {
        return Err(invalid_config(format!(
            "{} must be in 1..={}, got {}",
            name, MAX_SLAB_CAPACITY, capacity
        )));
    }
    Ok(())
}

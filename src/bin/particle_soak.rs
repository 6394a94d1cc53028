//! Headless soak run of the particle pipeline
//!
//! Usage: `particle_soak [config.toml] [seconds]`
//!
//! Breaks blocks and puffs smoke over a small voxel arena while the simulation
//! thread runs, packing and "drawing" every frame, then logs slab statistics.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use glam::{IVec3, Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use hearth_particles::particles::{block_break, smoke_puff};
use hearth_particles::renderer::AtlasRegion;
use hearth_particles::{
    Camera, InstanceBatch, ParticleConfig, ParticleRenderer, ParticleSystem, ParticleUniforms,
    VoxelCell, VoxelGrid,
};

const FRAME_TIME: Duration = Duration::from_millis(16);

/// Counts what a GPU renderer would have uploaded
#[derive(Default)]
struct CountingRenderer {
    frames: u64,
    draws: u64,
    instances: u64,
    bytes: u64,
}

impl ParticleRenderer for CountingRenderer {
    fn begin_frame(&mut self) {
        self.frames += 1;
    }

    fn set_uniforms(&mut self, _uniforms: &ParticleUniforms) {}

    fn draw_instanced(&mut self, batch: InstanceBatch<'_>) {
        self.draws += 1;
        self.instances += batch.instance_count as u64;
        self.bytes += batch.bytes.len() as u64;
    }
}

fn arena() -> VoxelGrid {
    let mut grid = VoxelGrid::new();
    grid.fill(IVec3::new(-16, -16, 0), IVec3::new(16, 16, 0), VoxelCell::stone());
    grid.fill(IVec3::new(-16, -16, 1), IVec3::new(-16, 16, 4), VoxelCell::stone());
    grid.fill(IVec3::new(4, 4, 1), IVec3::new(8, 8, 1), VoxelCell::water());
    grid.fill(IVec3::new(-8, 4, 1), IVec3::new(-6, 6, 1), VoxelCell::lava());
    grid.set_sky_light(15);
    grid
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => ParticleConfig::load(&path).with_context(|| format!("loading {}", path))?,
        None => ParticleConfig::default(),
    };
    let seconds: u64 = match args.next() {
        Some(raw) => raw.parse().context("seconds must be an integer")?,
        None => 10,
    };

    let mut system = ParticleSystem::with_default_kinds(config, Arc::new(arena()))?;
    system.start()?;

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut renderer = CountingRenderer::default();
    let uniforms = ParticleUniforms::default();
    let camera = Camera::new(Vec3::new(0.0, -12.0, 6.0));
    let deadline = Instant::now() + Duration::from_secs(seconds);
    let mut last_report = Instant::now();

    while Instant::now() < deadline {
        for _ in 0..rng.gen_range(0..4) {
            let cell = Vec3::new(
                rng.gen_range(-12..12) as f32,
                rng.gen_range(-12..12) as f32,
                rng.gen_range(2..6) as f32,
            );
            let face = AtlasRegion::grid_cell(rng.gen_range(0..256), 16, 16);
            block_break(&system, cell, face, Vec4::ONE, &mut rng);
        }
        smoke_puff(&system, Vec3::new(-7.0, 5.0, 2.0), 3, &mut rng);

        system.update(&camera);
        system.render(&mut renderer, &uniforms);

        if last_report.elapsed() >= Duration::from_secs(1) {
            let stats = system.stats();
            for slab in &stats.slabs {
                log::info!(
                    "{:>12}: live {:>5}/{:<5} packed {:>5} spawned {:>7} dropped {:>6} expired {:>7}",
                    slab.name,
                    slab.live,
                    slab.capacity,
                    slab.packed,
                    slab.spawned,
                    slab.dropped,
                    slab.expired
                );
            }
            log::info!("capacity used {:.1}%", stats.capacity_used() * 100.0);
            last_report = Instant::now();
        }

        thread::sleep(FRAME_TIME);
    }

    system.shutdown()?;
    log::info!(
        "{} frames, {} draws, {} instances, {:.1} MiB uploaded",
        renderer.frames,
        renderer.draws,
        renderer.instances,
        renderer.bytes as f64 / (1024.0 * 1024.0)
    );
    Ok(())
}

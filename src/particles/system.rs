use std::any::{Any, TypeId};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::config::{ParticleConfig, PhysicsSettings};
use crate::error::{ParticleError, ParticleResult};
use crate::particles::arena::{DrainReport, StepReport};
use crate::particles::kinds::{BlockDebris, BodyPart, SoftSprite};
use crate::particles::slab::ParticleSlab;
use crate::particles::stats::{ParticleSystemStats, SlabStats};
use crate::particles::{ParticleBody, ParticleKind};
use crate::renderer::{Camera, ParticleRenderer, ParticleUniforms};
use crate::terrain::Terrain;

/// Name of the background simulation thread
pub const SIMULATION_THREAD_NAME: &str = "particle-sim";

/// Kind-erased view of a slab used by the orchestrator
trait SlabDriver: Send + Sync {
    fn name(&self) -> &'static str;
    fn simulate(
        &self,
        dt: f32,
        terrain: &dyn Terrain,
        settings: &PhysicsSettings,
    ) -> (DrainReport, StepReport);
    fn pack(&self, camera: &Camera, terrain: &dyn Terrain) -> usize;
    fn draw(&self, renderer: &mut dyn ParticleRenderer) -> bool;
    fn stats(&self) -> SlabStats;
    fn clear(&self);
}

impl<K: ParticleKind> SlabDriver for ParticleSlab<K> {
    fn name(&self) -> &'static str {
        K::NAME
    }

    fn simulate(
        &self,
        dt: f32,
        terrain: &dyn Terrain,
        settings: &PhysicsSettings,
    ) -> (DrainReport, StepReport) {
        ParticleSlab::simulate(self, dt, terrain, settings)
    }

    fn pack(&self, camera: &Camera, terrain: &dyn Terrain) -> usize {
        ParticleSlab::pack(self, camera, terrain)
    }

    fn draw(&self, renderer: &mut dyn ParticleRenderer) -> bool {
        ParticleSlab::draw(self, renderer)
    }

    fn stats(&self) -> SlabStats {
        ParticleSlab::stats(self)
    }

    fn clear(&self) {
        ParticleSlab::clear(self)
    }
}

struct SlabEntry {
    driver: Arc<dyn SlabDriver>,
    handle: Arc<dyn Any + Send + Sync>,
}

/// Slabs keyed by kind, iterated in registration order
#[derive(Default)]
struct SlabRegistry {
    entries: Vec<SlabEntry>,
    index: FxHashMap<TypeId, usize>,
}

impl SlabRegistry {
    fn tick(&self, dt: f32, terrain: &dyn Terrain, settings: &PhysicsSettings) {
        for entry in &self.entries {
            let (drained, stepped) = entry.driver.simulate(dt, terrain, settings);
            log::trace!(
                "{}: claimed {}, simulated {}, expired {}",
                entry.driver.name(),
                drained.claimed,
                stepped.simulated,
                stepped.expired
            );
        }
    }
}

struct SimulationThread {
    shutdown_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Owns every particle slab and drives both schedules
///
/// Simulation runs either on a dedicated thread ([`Self::start`]) or
/// synchronously through [`Self::tick`]. The render schedule calls
/// [`Self::update`] then [`Self::render`] once per frame.
pub struct ParticleSystem {
    registry: Arc<RwLock<SlabRegistry>>,
    terrain: Arc<dyn Terrain>,
    config: ParticleConfig,
    simulation: Option<SimulationThread>,
}

impl ParticleSystem {
    pub fn new(config: ParticleConfig, terrain: Arc<dyn Terrain>) -> ParticleResult<Self> {
        config.validate()?;
        Ok(Self {
            registry: Arc::new(RwLock::new(SlabRegistry::default())),
            terrain,
            config,
            simulation: None,
        })
    }

    /// System with debris, body part and soft sprite slabs at configured capacities
    pub fn with_default_kinds(
        config: ParticleConfig,
        terrain: Arc<dyn Terrain>,
    ) -> ParticleResult<Self> {
        let capacity = config.capacity;
        let system = Self::new(config, terrain)?;
        system.register(ParticleSlab::<BlockDebris>::new(capacity.block_debris)?)?;
        system.register(ParticleSlab::<BodyPart>::new(capacity.body_parts)?)?;
        system.register(ParticleSlab::<SoftSprite>::new(capacity.soft_sprites)?)?;
        Ok(system)
    }

    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    pub fn terrain(&self) -> &Arc<dyn Terrain> {
        &self.terrain
    }

    pub fn register<K: ParticleKind>(
        &self,
        slab: ParticleSlab<K>,
    ) -> ParticleResult<Arc<ParticleSlab<K>>> {
        let mut registry = self.registry.write();
        let type_id = TypeId::of::<K>();
        if registry.index.contains_key(&type_id) {
            return Err(ParticleError::DuplicateKind(K::NAME));
        }

        let slab = Arc::new(slab);
        let position = registry.entries.len();
        registry.entries.push(SlabEntry {
            driver: slab.clone(),
            handle: slab.clone(),
        });
        registry.index.insert(type_id, position);

        log::info!("Registered {} slab with {} slots", K::NAME, slab.capacity());
        Ok(slab)
    }

    pub fn lookup<K: ParticleKind>(&self) -> Option<Arc<ParticleSlab<K>>> {
        let registry = self.registry.read();
        let position = *registry.index.get(&TypeId::of::<K>())?;
        registry.entries[position]
            .handle
            .clone()
            .downcast::<ParticleSlab<K>>()
            .ok()
    }

    /// Queue a particle of kind `K`; false when no such slab is registered
    pub fn spawn<K, F>(&self, initializer: F) -> bool
    where
        K: ParticleKind,
        F: FnOnce(&mut ParticleBody, &mut K::Data) + Send + 'static,
    {
        match self.lookup::<K>() {
            Some(slab) => {
                slab.spawn(initializer);
                true
            }
            None => {
                log::warn!("Spawn of unregistered particle kind {}", K::NAME);
                false
            }
        }
    }

    /// Run one simulation tick on the calling thread
    pub fn tick(&self, dt: f32) {
        self.registry
            .read()
            .tick(dt, self.terrain.as_ref(), &self.config.physics);
    }

    pub fn is_running(&self) -> bool {
        self.simulation.is_some()
    }

    /// Start the fixed-rate simulation thread
    pub fn start(&mut self) -> ParticleResult<()> {
        if self.simulation.is_some() {
            return Err(ParticleError::AlreadyRunning);
        }

        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let registry = Arc::clone(&self.registry);
        let terrain = Arc::clone(&self.terrain);
        let settings = self.config.physics;
        let interval = self.config.tick_interval();

        let handle = thread::Builder::new()
            .name(SIMULATION_THREAD_NAME.to_string())
            .spawn(move || {
                let dt = interval.as_secs_f32();
                loop {
                    let started = Instant::now();
                    registry.read().tick(dt, terrain.as_ref(), &settings);
                    let elapsed = started.elapsed();
                    if elapsed > interval {
                        log::warn!(
                            "Particle tick took {:.2}ms, budget {:.2}ms",
                            elapsed.as_secs_f64() * 1000.0,
                            interval.as_secs_f64() * 1000.0
                        );
                    }

                    match shutdown_rx.recv_timeout(interval.saturating_sub(elapsed)) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .map_err(ParticleError::ThreadSpawn)?;

        log::info!(
            "Particle simulation started at {} Hz",
            self.config.tick_rate_hz
        );
        self.simulation = Some(SimulationThread {
            shutdown_tx,
            handle,
        });
        Ok(())
    }

    /// Stop the simulation thread after its current tick; no-op when not running
    pub fn shutdown(&mut self) -> ParticleResult<()> {
        let Some(simulation) = self.simulation.take() else {
            return Ok(());
        };
        let _ = simulation.shutdown_tx.send(());
        simulation
            .handle
            .join()
            .map_err(|_| ParticleError::SimulationPanicked)?;
        log::info!("Particle simulation stopped");
        Ok(())
    }

    /// Promote and pack every slab; returns the number of packed instances
    ///
    /// Packs from each slab's newest published snapshot and never waits on a
    /// running simulation tick.
    pub fn update(&self, camera: &Camera) -> usize {
        let registry = self.registry.read();
        registry
            .entries
            .iter()
            .map(|entry| entry.driver.pack(camera, self.terrain.as_ref()))
            .sum()
    }

    /// Bind uniforms and issue one draw per non-empty slab; returns the draw count
    pub fn render(&self, renderer: &mut dyn ParticleRenderer, uniforms: &ParticleUniforms) -> usize {
        renderer.begin_frame();
        renderer.set_uniforms(uniforms);

        let registry = self.registry.read();
        let mut draws = 0;
        for entry in &registry.entries {
            if entry.driver.draw(renderer) {
                draws += 1;
            }
        }
        draws
    }

    pub fn stats(&self) -> ParticleSystemStats {
        let registry = self.registry.read();
        ParticleSystemStats::from_slabs(registry.entries.iter().map(|e| e.driver.stats()).collect())
    }

    /// Kill every particle and discard queued spawns (world unload)
    pub fn clear(&self) {
        let registry = self.registry.read();
        for entry in &registry.entries {
            entry.driver.clear();
        }
    }
}

impl Drop for ParticleSystem {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!("Particle simulation shutdown failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::kinds::DebrisData;
    use crate::terrain::VoxelGrid;
    use glam::Vec3;

    fn system() -> ParticleSystem {
        ParticleSystem::with_default_kinds(ParticleConfig::default(), Arc::new(VoxelGrid::new()))
            .expect("default system")
    }

    #[test]
    fn test_default_kinds_registered_in_order() {
        let system = system();
        let names: Vec<&str> = system.stats().slabs.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["block_debris", "body_part", "soft_sprite"]);
        assert!(system.lookup::<BodyPart>().is_some());
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let system = system();
        let again = system.register(ParticleSlab::<SoftSprite>::new(4).unwrap());
        assert!(matches!(again, Err(ParticleError::DuplicateKind("soft_sprite"))));
    }

    #[test]
    fn test_spawn_unregistered_kind_returns_false() {
        let system = ParticleSystem::new(ParticleConfig::default(), Arc::new(VoxelGrid::new()))
            .unwrap();
        assert!(!system.spawn::<BlockDebris, _>(|_, _: &mut DebrisData| {}));
    }

    #[test]
    fn test_tick_and_update_make_spawn_visible() {
        let system = system();
        assert!(system.spawn::<BlockDebris, _>(|body, _| {
            body.position = Vec3::new(0.5, 0.5, 30.0);
            body.lifetime = 2.0;
        }));

        assert_eq!(system.update(&Camera::new(Vec3::ZERO)), 0);
        system.tick(1.0 / 60.0);
        assert_eq!(system.update(&Camera::new(Vec3::ZERO)), 1);
        assert_eq!(system.stats().total_live, 1);
    }

    #[test]
    fn test_start_twice_is_an_error() {
        let mut system = system();
        system.start().unwrap();
        assert!(system.is_running());
        assert!(matches!(system.start(), Err(ParticleError::AlreadyRunning)));
        system.shutdown().unwrap();
        assert!(!system.is_running());
        system.shutdown().unwrap();
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ParticleConfig {
            tick_rate_hz: -1.0,
            ..Default::default()
        };
        assert!(ParticleSystem::new(config, Arc::new(VoxelGrid::new())).is_err());
    }
}

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

use crate::config::{validate_capacity, PhysicsSettings};
use crate::constants::render_constants::INSTANCE_STRIDE;
use crate::error::ParticleResult;
use crate::particles::arena::{DrainReport, Initializer, SlotArena, StepReport};
use crate::particles::snapshot::{Snapshot, SnapshotExchange};
use crate::particles::stats::SlabStats;
use crate::particles::{ParticleBody, ParticleInstance, ParticleKind, SlotStates};
use crate::renderer::{Camera, InstanceBatch, InstanceData, InstancePacker, ParticleRenderer};
use crate::terrain::Terrain;

#[derive(Debug, Default)]
struct SlabCounters {
    spawned: AtomicU64,
    dropped: AtomicU64,
    expired: AtomicU64,
    live: AtomicUsize,
    packed: AtomicUsize,
}

/// Render-side half of a slab
struct FrameState<D> {
    snapshot: Snapshot<D>,
    packer: InstancePacker,
}

/// Fixed-capacity emitter of one particle kind
///
/// `spawn` may be called from any thread. `drain_spawns`, `step_physics` and
/// `simulate` belong to the simulation schedule; `promote_new`, `pack` and
/// `draw` belong to the render schedule.
///
/// The two schedules never share a lock. Each simulation pass publishes a
/// copy of the occupied slots through a [`SnapshotExchange`]; the render side
/// packs from the newest copy. Slot lifecycle words are atomics, and the
/// activation queue is the only handoff of new particles.
pub struct ParticleSlab<K: ParticleKind> {
    capacity: usize,
    /// Simulation-side storage
    arena: Mutex<SlotArena<K>>,
    states: Arc<SlotStates>,
    spawn_tx: Sender<Initializer<K::Data>>,
    spawn_rx: Receiver<Initializer<K::Data>>,
    activation_tx: Sender<u32>,
    activation_rx: Receiver<u32>,
    snapshots: SnapshotExchange<K::Data>,
    /// Render-side storage
    frame: Mutex<FrameState<K::Data>>,
    counters: SlabCounters,
}

impl<K: ParticleKind> ParticleSlab<K> {
    pub fn new(capacity: usize) -> ParticleResult<Self> {
        validate_capacity(K::NAME, capacity)?;
        let (spawn_tx, spawn_rx) = unbounded();
        let (activation_tx, activation_rx) = unbounded();
        let (snapshots, snapshot) = SnapshotExchange::new(capacity);
        let arena = SlotArena::new(capacity);

        Ok(Self {
            capacity,
            states: Arc::clone(arena.states()),
            arena: Mutex::new(arena),
            spawn_tx,
            spawn_rx,
            activation_tx,
            activation_rx,
            snapshots,
            frame: Mutex::new(FrameState {
                snapshot,
                packer: InstancePacker::with_capacity(capacity),
            }),
            counters: SlabCounters::default(),
        })
    }

    pub fn name(&self) -> &'static str {
        K::NAME
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queue a particle; the initializer runs on the next simulation tick
    pub fn spawn<F>(&self, initializer: F)
    where
        F: FnOnce(&mut ParticleBody, &mut K::Data) + Send + 'static,
    {
        // The slab owns the receiver, send cannot fail
        let _ = self.spawn_tx.send(Box::new(initializer));
    }

    pub fn pending_spawns(&self) -> usize {
        self.spawn_rx.len()
    }

    pub fn drain_spawns(&self) -> DrainReport {
        let mut arena = self.arena.lock();
        let report = arena.drain_spawns(&self.spawn_rx, &self.activation_tx);
        self.record_drain(&report, arena.live_count());
        self.publish(&arena);
        report
    }

    pub fn step_physics(
        &self,
        dt: f32,
        terrain: &dyn Terrain,
        settings: &PhysicsSettings,
    ) -> StepReport {
        let mut arena = self.arena.lock();
        let report = arena.step_physics(dt, terrain, settings);
        self.record_step(&report, arena.live_count());
        self.publish(&arena);
        report
    }

    /// One simulation tick: drain spawns, step physics, publish once
    pub fn simulate(
        &self,
        dt: f32,
        terrain: &dyn Terrain,
        settings: &PhysicsSettings,
    ) -> (DrainReport, StepReport) {
        let mut arena = self.arena.lock();
        let drained = arena.drain_spawns(&self.spawn_rx, &self.activation_tx);
        let stepped = arena.step_physics(dt, terrain, settings);
        let live = arena.live_count();
        self.publish(&arena);
        drop(arena);

        self.record_drain(&drained, live);
        self.record_step(&stepped, live);
        (drained, stepped)
    }

    fn publish(&self, arena: &SlotArena<K>) {
        let mut snapshot = self.snapshots.acquire();
        arena.publish_into(&mut snapshot);
        self.snapshots.publish(snapshot);
    }

    /// Turn every particle handed over by the simulation side Alive
    pub fn promote_new(&self) -> usize {
        self.states.promote_queued(&self.activation_rx)
    }

    /// Promote pending activations and rebuild the instance buffer from the
    /// newest published snapshot
    ///
    /// Never waits on the simulation schedule. Without a new publication the
    /// previous snapshot is packed again for the current camera.
    pub fn pack(&self, camera: &Camera, terrain: &dyn Terrain) -> usize {
        let mut frame = self.frame.lock();
        self.promote_new();
        let FrameState { snapshot, packer } = &mut *frame;
        self.snapshots.take_latest(snapshot);

        let count = packer.pack::<K>(snapshot.as_slice(), &self.states, camera, terrain);
        self.counters.packed.store(count, Ordering::Relaxed);
        count
    }

    /// Issue one instanced draw for the packed buffer; nothing when it is empty
    pub fn draw(&self, renderer: &mut dyn ParticleRenderer) -> bool {
        let frame = self.frame.lock();
        if frame.packer.is_empty() {
            return false;
        }
        renderer.draw_instanced(InstanceBatch {
            kind: K::NAME,
            bytes: frame.packer.bytes(),
            instance_count: frame.packer.len() as u32,
            stride: INSTANCE_STRIDE as u32,
            blend: K::BLEND,
        });
        true
    }

    pub fn with_instances<R>(&self, f: impl FnOnce(&[InstanceData]) -> R) -> R {
        f(self.frame.lock().packer.instances())
    }

    /// Copy of every slot as the simulation side currently holds it
    ///
    /// Waits for a running simulation pass; meant for tests and tooling.
    pub fn with_slots<R>(&self, f: impl FnOnce(&[ParticleInstance<K::Data>]) -> R) -> R {
        let view = self.arena.lock().view();
        f(&view)
    }

    /// New or Alive slots as of the last simulation or clear
    pub fn live_count(&self) -> usize {
        self.counters.live.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> SlabStats {
        SlabStats {
            name: K::NAME,
            capacity: self.capacity(),
            live: self.live_count(),
            pending_spawns: self.pending_spawns(),
            spawned: self.counters.spawned.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            expired: self.counters.expired.load(Ordering::Relaxed),
            packed: self.counters.packed.load(Ordering::Relaxed),
        }
    }

    /// Free every slot and discard queued spawns and activations
    ///
    /// Administrative; waits for both schedules.
    pub fn clear(&self) {
        let mut arena = self.arena.lock();
        let discarded = self.spawn_rx.try_iter().count();
        self.activation_rx.try_iter().for_each(drop);
        arena.clear();
        self.publish(&arena);

        let mut frame = self.frame.lock();
        let FrameState { snapshot, packer } = &mut *frame;
        self.snapshots.take_latest(snapshot);
        packer.clear();

        self.counters.live.store(0, Ordering::Relaxed);
        self.counters.packed.store(0, Ordering::Relaxed);
        log::debug!("Cleared {} slab ({} queued spawns discarded)", K::NAME, discarded);
    }

    fn record_drain(&self, report: &DrainReport, live: usize) {
        self.counters
            .spawned
            .fetch_add(report.claimed as u64, Ordering::Relaxed);
        if report.dropped > 0 {
            self.counters
                .dropped
                .fetch_add(report.dropped as u64, Ordering::Relaxed);
            log::debug!("{} slab full, dropped {} spawn requests", K::NAME, report.dropped);
        }
        self.counters.live.store(live, Ordering::Relaxed);
    }

    fn record_step(&self, report: &StepReport, live: usize) {
        self.counters
            .expired
            .fetch_add(report.expired as u64, Ordering::Relaxed);
        self.counters.live.store(live, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::kinds::{BlockDebris, SoftSprite, SpriteData};
    use crate::renderer::{BlendMode, ParticleUniforms};
    use crate::terrain::VoxelGrid;
    use crossbeam_channel::bounded;
    use glam::Vec3;
    use std::thread;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingRenderer {
        draws: Vec<(&'static str, u32, usize, BlendMode)>,
    }

    impl ParticleRenderer for RecordingRenderer {
        fn set_uniforms(&mut self, _uniforms: &ParticleUniforms) {}

        fn draw_instanced(&mut self, batch: InstanceBatch<'_>) {
            self.draws
                .push((batch.kind, batch.instance_count, batch.bytes.len(), batch.blend));
        }
    }

    fn floating(body: &mut ParticleBody) {
        body.position = Vec3::new(0.5, 0.5, 20.0);
        body.lifetime = 5.0;
    }

    #[test]
    fn test_rejects_zero_capacity() {
        assert!(ParticleSlab::<BlockDebris>::new(0).is_err());
    }

    #[test]
    fn test_spawn_is_invisible_until_promoted() {
        let slab = ParticleSlab::<BlockDebris>::new(8).unwrap();
        let grid = VoxelGrid::new();
        let camera = Camera::new(Vec3::ZERO);

        slab.spawn(|body, _| floating(body));
        assert_eq!(slab.pending_spawns(), 1);
        assert_eq!(slab.pack(&camera, &grid), 0);

        slab.simulate(0.05, &grid, &PhysicsSettings::default());
        assert_eq!(slab.live_count(), 1);
        assert_eq!(slab.pending_spawns(), 0);
        assert!(slab.with_slots(|s| s.iter().all(|slot| !slot.is_alive())));

        assert_eq!(slab.pack(&camera, &grid), 1);
        assert_eq!(slab.with_instances(|i| i.len()), 1);
        assert!(slab.with_slots(|s| s[0].is_alive()));
    }

    #[test]
    fn test_simulation_tick_completes_while_render_side_is_packing() {
        let slab = ParticleSlab::<SoftSprite>::new(64).unwrap();
        let grid = VoxelGrid::new();
        for _ in 0..64 {
            slab.spawn(|body, _: &mut SpriteData| floating(body));
        }
        slab.drain_spawns();
        slab.pack(&Camera::new(Vec3::ZERO), &grid);

        // Hold the render side as a long pack would
        let frame = slab.frame.lock();
        let (done_tx, done_rx) = bounded(1);
        thread::scope(|scope| {
            scope.spawn(|| {
                let settings = PhysicsSettings::default();
                for _ in 0..10 {
                    slab.simulate(1.0 / 60.0, &grid, &settings);
                }
                let _ = done_tx.send(());
            });
            let finished = done_rx.recv_timeout(Duration::from_secs(5));
            drop(frame);
            assert!(finished.is_ok(), "simulation waited on the render side");
        });
        assert_eq!(slab.stats().expired, 0);
    }

    #[test]
    fn test_pack_completes_while_simulation_holds_storage() {
        let slab = ParticleSlab::<BlockDebris>::new(4).unwrap();
        let grid = VoxelGrid::new();
        let camera = Camera::new(Vec3::ZERO);

        slab.spawn(|body, _| floating(body));
        slab.drain_spawns();

        // Hold the simulation side as a long tick would
        let arena = slab.arena.lock();
        let (done_tx, done_rx) = bounded(1);
        thread::scope(|scope| {
            scope.spawn(|| {
                let _ = done_tx.send(slab.pack(&camera, &grid));
            });
            let packed = done_rx.recv_timeout(Duration::from_secs(5));
            drop(arena);
            assert_eq!(packed.ok(), Some(1));
        });
        assert_eq!(slab.with_instances(|i| i.len()), 1);
    }

    #[test]
    fn test_draw_skips_empty_buffer() {
        let slab = ParticleSlab::<SoftSprite>::new(4).unwrap();
        let grid = VoxelGrid::new();
        let mut renderer = RecordingRenderer::default();

        slab.pack(&Camera::new(Vec3::ZERO), &grid);
        assert!(!slab.draw(&mut renderer));
        assert!(renderer.draws.is_empty());

        slab.spawn(|body, _| floating(body));
        slab.spawn(|body, _| floating(body));
        slab.drain_spawns();
        slab.pack(&Camera::new(Vec3::ZERO), &grid);

        assert!(slab.draw(&mut renderer));
        assert_eq!(
            renderer.draws,
            vec![("soft_sprite", 2, 2 * INSTANCE_STRIDE, BlendMode::AlphaBlend)]
        );
    }

    #[test]
    fn test_expired_particle_leaves_the_buffer_after_next_publication() {
        let slab = ParticleSlab::<BlockDebris>::new(2).unwrap();
        let grid = VoxelGrid::new();
        let camera = Camera::new(Vec3::ZERO);
        let settings = PhysicsSettings::default();

        slab.spawn(|body, _| {
            floating(body);
            body.lifetime = 0.04;
        });
        slab.drain_spawns();
        assert_eq!(slab.pack(&camera, &grid), 1);

        slab.step_physics(0.05, &grid, &settings);
        assert_eq!(slab.pack(&camera, &grid), 0);
    }

    #[test]
    fn test_stats_track_drops_and_expiry() {
        let slab = ParticleSlab::<BlockDebris>::new(2).unwrap();
        let grid = VoxelGrid::new();
        let settings = PhysicsSettings::default();

        for _ in 0..5 {
            slab.spawn(|body, _| {
                floating(body);
                body.lifetime = 0.04;
            });
        }
        slab.simulate(0.05, &grid, &settings);
        slab.promote_new();
        slab.simulate(0.05, &grid, &settings);

        let stats = slab.stats();
        assert_eq!(stats.name, "block_debris");
        assert_eq!(stats.capacity, 2);
        assert_eq!(stats.spawned, 2);
        assert_eq!(stats.dropped, 3);
        assert_eq!(stats.expired, 2);
        assert_eq!(stats.live, 0);
    }

    #[test]
    fn test_clear_discards_queues() {
        let slab = ParticleSlab::<BlockDebris>::new(4).unwrap();
        let grid = VoxelGrid::new();

        slab.spawn(|body, _| floating(body));
        slab.drain_spawns();
        slab.spawn(|body, _| floating(body));
        slab.pack(&Camera::new(Vec3::ZERO), &grid);

        slab.clear();
        assert_eq!(slab.live_count(), 0);
        assert_eq!(slab.pending_spawns(), 0);
        assert_eq!(slab.with_instances(|i| i.len()), 0);
        assert_eq!(slab.pack(&Camera::new(Vec3::ZERO), &grid), 0);
        assert!(slab.with_slots(|s| s.iter().all(|slot| slot.is_dead())));
    }
}

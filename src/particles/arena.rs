use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use crate::config::PhysicsSettings;
use crate::particles::snapshot::{PublishedSlot, Snapshot};
use crate::particles::{Fate, ParticleBody, ParticleInstance, ParticleKind, ParticleState, SlotStates};
use crate::physics::integrate_particle;
use crate::terrain::{Obstacle, Terrain};

/// Deferred spawn request; runs on the simulation thread against a claimed slot
pub type Initializer<D> = Box<dyn FnOnce(&mut ParticleBody, &mut D) + Send + 'static>;

/// Result of one `drain_spawns` pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainReport {
    pub claimed: usize,
    /// Requests discarded because no slot was free
    pub dropped: usize,
}

/// Result of one `step_physics` pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepReport {
    pub simulated: usize,
    pub expired: usize,
}

/// Fixed-capacity slot storage of one slab
///
/// Bodies and kind data belong to the simulation side. Lifecycle states live
/// in a [`SlotStates`] table the render side reads and promotes through
/// without touching this storage.
pub struct SlotArena<K: ParticleKind> {
    bodies: Box<[ParticleBody]>,
    data: Box<[K::Data]>,
    states: Arc<SlotStates>,
    /// Round-robin allocation cursor
    last_free: usize,
    /// Non-Dead slots
    live: usize,
    /// Obstacle buffer reused by every integration step
    scratch: Vec<Obstacle>,
}

impl<K: ParticleKind> SlotArena<K> {
    pub fn new(capacity: usize) -> Self {
        Self {
            bodies: (0..capacity).map(|_| ParticleBody::default()).collect(),
            data: (0..capacity).map(|_| K::Data::default()).collect(),
            states: Arc::new(SlotStates::new(capacity)),
            last_free: 0,
            live: 0,
            scratch: Vec::with_capacity(64),
        }
    }

    pub fn capacity(&self) -> usize {
        self.bodies.len()
    }

    /// Number of New or Alive slots
    pub fn live_count(&self) -> usize {
        self.live
    }

    pub fn states(&self) -> &Arc<SlotStates> {
        &self.states
    }

    /// Copy of every slot with its current state
    pub fn view(&self) -> Vec<ParticleInstance<K::Data>> {
        self.bodies
            .iter()
            .zip(self.data.iter())
            .enumerate()
            .map(|(slot, (body, data))| ParticleInstance {
                state: self.states.state(slot),
                body: *body,
                data: data.clone(),
            })
            .collect()
    }

    /// Scan from the cursor, wrapping, for a free slot
    fn find_dead_slot(&self) -> Option<usize> {
        let capacity = self.capacity();
        if self.live >= capacity {
            return None;
        }
        (0..capacity)
            .map(|offset| (self.last_free + offset) % capacity)
            .find(|&index| self.states.state(index) == ParticleState::Dead)
    }

    /// Move queued spawn requests into free slots and queue them for activation
    ///
    /// Once no slot is free every request still queued is discarded.
    pub fn drain_spawns(
        &mut self,
        spawns: &Receiver<Initializer<K::Data>>,
        activations: &Sender<u32>,
    ) -> DrainReport {
        let mut report = DrainReport::default();

        while let Ok(initializer) = spawns.try_recv() {
            let Some(index) = self.find_dead_slot() else {
                report.dropped = 1 + spawns.try_iter().count();
                break;
            };

            let body = &mut self.bodies[index];
            let data = &mut self.data[index];
            *body = ParticleBody::default();
            *data = K::Data::default();
            initializer(&mut *body, &mut *data);
            K::initialize(&mut *body, &mut *data);
            if !body.sanitize() {
                log::trace!("{} spawn had invalid body, expiring on next step", K::NAME);
            }
            self.states.claim(index);

            self.last_free = index;
            self.live += 1;
            report.claimed += 1;

            // The receiving end lives as long as the slab, send cannot fail
            let _ = activations.send(index as u32);
        }

        report
    }

    /// Promote every slot handed over by the simulation side to Alive
    pub fn promote_new(&self, activations: &Receiver<u32>) -> usize {
        self.states.promote_queued(activations)
    }

    /// Advance every Alive slot by `dt` and retire the expired ones
    pub fn step_physics(
        &mut self,
        dt: f32,
        terrain: &dyn Terrain,
        settings: &PhysicsSettings,
    ) -> StepReport {
        let mut report = StepReport::default();
        let states = &self.states;
        let scratch = &mut self.scratch;

        for (index, (body, data)) in self.bodies.iter_mut().zip(self.data.iter_mut()).enumerate() {
            if states.state(index) != ParticleState::Alive {
                continue;
            }
            report.simulated += 1;

            if !(body.lifetime > 0.0) {
                states.retire(index);
                report.expired += 1;
                continue;
            }

            let outcome = integrate_particle(body, dt, terrain, settings, scratch);
            let fate = K::after_step(body, data, &outcome, dt);
            body.lifetime -= dt;

            if fate == Fate::Expire || body.lifetime <= 0.0 {
                states.retire(index);
                report.expired += 1;
            }
        }

        self.live -= report.expired;
        report
    }

    /// Copy every New or Alive slot into `snapshot`, replacing its contents
    pub fn publish_into(&self, snapshot: &mut Snapshot<K::Data>) {
        snapshot.clear();
        for (index, (body, data)) in self.bodies.iter().zip(self.data.iter()).enumerate() {
            if self.states.state(index) == ParticleState::Dead {
                continue;
            }
            snapshot.push(PublishedSlot {
                slot: index as u32,
                generation: self.states.generation(index),
                body: *body,
                data: data.clone(),
            });
        }
    }

    /// Free every slot
    pub fn clear(&mut self) {
        self.bodies.fill(ParticleBody::default());
        for data in self.data.iter_mut() {
            *data = K::Data::default();
        }
        self.states.retire_all();
        self.live = 0;
        self.last_free = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::kinds::{BlockDebris, DebrisData};
    use crate::terrain::VoxelGrid;
    use crossbeam_channel::unbounded;
    use glam::Vec3;

    type Queues = (
        Sender<Initializer<DebrisData>>,
        Receiver<Initializer<DebrisData>>,
        Sender<u32>,
        Receiver<u32>,
    );

    fn queues() -> Queues {
        let (spawn_tx, spawn_rx) = unbounded();
        let (activation_tx, activation_rx) = unbounded();
        (spawn_tx, spawn_rx, activation_tx, activation_rx)
    }

    fn request(lifetime: f32) -> Initializer<DebrisData> {
        Box::new(move |body: &mut ParticleBody, _: &mut DebrisData| {
            body.position = Vec3::new(0.5, 0.5, 10.0);
            body.lifetime = lifetime;
        })
    }

    #[test]
    fn test_drain_marks_new_and_queues_activation() {
        let (spawn_tx, spawn_rx, activation_tx, activation_rx) = queues();
        let mut arena = SlotArena::<BlockDebris>::new(4);

        spawn_tx.send(request(1.0)).unwrap();
        spawn_tx.send(request(1.0)).unwrap();
        let report = arena.drain_spawns(&spawn_rx, &activation_tx);

        assert_eq!(report, DrainReport { claimed: 2, dropped: 0 });
        assert_eq!(arena.live_count(), 2);
        assert_eq!(activation_rx.len(), 2);
        assert_eq!(arena.states().count(ParticleState::New), 2);

        // New slots are not simulated until promoted
        let grid = VoxelGrid::new();
        let step = arena.step_physics(0.1, &grid, &PhysicsSettings::default());
        assert_eq!(step.simulated, 0);

        assert_eq!(arena.promote_new(&activation_rx), 2);
        assert!(activation_rx.is_empty());
        assert_eq!(arena.states().count(ParticleState::Alive), 2);
    }

    #[test]
    fn test_drop_under_saturation() {
        let (spawn_tx, spawn_rx, activation_tx, _activation_rx) = queues();
        let mut arena = SlotArena::<BlockDebris>::new(3);

        for _ in 0..3 {
            spawn_tx.send(request(5.0)).unwrap();
        }
        arena.drain_spawns(&spawn_rx, &activation_tx);
        assert_eq!(arena.live_count(), 3);

        for _ in 0..10 {
            spawn_tx.send(request(5.0)).unwrap();
        }
        let report = arena.drain_spawns(&spawn_rx, &activation_tx);

        assert_eq!(report, DrainReport { claimed: 0, dropped: 10 });
        assert!(spawn_rx.is_empty());
        assert_eq!(arena.live_count(), 3);
    }

    #[test]
    fn test_partial_fit_drops_the_tail() {
        let (spawn_tx, spawn_rx, activation_tx, _activation_rx) = queues();
        let mut arena = SlotArena::<BlockDebris>::new(2);

        for _ in 0..5 {
            spawn_tx.send(request(5.0)).unwrap();
        }
        let report = arena.drain_spawns(&spawn_rx, &activation_tx);

        assert_eq!(report, DrainReport { claimed: 2, dropped: 3 });
        assert!(spawn_rx.is_empty());
    }

    #[test]
    fn test_lifetime_decrements_by_dt_then_expires() {
        let (spawn_tx, spawn_rx, activation_tx, activation_rx) = queues();
        let mut arena = SlotArena::<BlockDebris>::new(1);
        let grid = VoxelGrid::new();
        let settings = PhysicsSettings::default();

        spawn_tx.send(request(0.25)).unwrap();
        arena.drain_spawns(&spawn_rx, &activation_tx);
        arena.promote_new(&activation_rx);

        arena.step_physics(0.125, &grid, &settings);
        let view = arena.view();
        assert_eq!(view[0].body.lifetime, 0.125);
        assert!(view[0].is_alive());

        let report = arena.step_physics(0.125, &grid, &settings);
        assert_eq!(report.expired, 1);
        assert!(arena.view()[0].is_dead());
        assert_eq!(arena.live_count(), 0);
    }

    #[test]
    fn test_invalid_lifetime_is_reclaimed_without_physics() {
        let (spawn_tx, spawn_rx, activation_tx, activation_rx) = queues();
        let mut arena = SlotArena::<BlockDebris>::new(2);
        let grid = VoxelGrid::new();

        spawn_tx.send(request(f32::NAN)).unwrap();
        spawn_tx.send(request(0.0)).unwrap();
        arena.drain_spawns(&spawn_rx, &activation_tx);
        assert_eq!(arena.promote_new(&activation_rx), 2);

        let report = arena.step_physics(0.05, &grid, &PhysicsSettings::default());
        assert_eq!(report.expired, 2);
        assert_eq!(arena.live_count(), 0);
        assert!(arena.view().iter().all(|s| s.body.position.is_finite()));
    }

    #[test]
    fn test_freed_slot_is_reused() {
        let (spawn_tx, spawn_rx, activation_tx, activation_rx) = queues();
        let mut arena = SlotArena::<BlockDebris>::new(2);
        let grid = VoxelGrid::new();
        let settings = PhysicsSettings::default();

        spawn_tx.send(request(0.1)).unwrap();
        spawn_tx.send(request(10.0)).unwrap();
        arena.drain_spawns(&spawn_rx, &activation_tx);
        arena.promote_new(&activation_rx);
        arena.step_physics(0.2, &grid, &settings);
        assert_eq!(arena.live_count(), 1);

        spawn_tx.send(request(10.0)).unwrap();
        let report = arena.drain_spawns(&spawn_rx, &activation_tx);
        assert_eq!(report.claimed, 1);
        assert_eq!(arena.live_count(), 2);
    }

    #[test]
    fn test_publish_copies_occupied_slots_with_generation() {
        let (spawn_tx, spawn_rx, activation_tx, activation_rx) = queues();
        let mut arena = SlotArena::<BlockDebris>::new(4);
        let grid = VoxelGrid::new();

        spawn_tx.send(request(0.05)).unwrap();
        spawn_tx.send(request(5.0)).unwrap();
        arena.drain_spawns(&spawn_rx, &activation_tx);
        arena.promote_new(&activation_rx);
        arena.step_physics(0.1, &grid, &PhysicsSettings::default());

        let mut snapshot = vec![];
        arena.publish_into(&mut snapshot);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].slot, 1);
        assert_eq!(snapshot[0].generation, arena.states().generation(1));
        assert!(arena.states().is_alive_claim(1, snapshot[0].generation));
        assert!((snapshot[0].body.lifetime - 4.9).abs() < 1e-5);
    }

    #[test]
    fn test_clear_frees_everything() {
        let (spawn_tx, spawn_rx, activation_tx, _activation_rx) = queues();
        let mut arena = SlotArena::<BlockDebris>::new(3);
        for _ in 0..3 {
            spawn_tx.send(request(1.0)).unwrap();
        }
        arena.drain_spawns(&spawn_rx, &activation_tx);

        arena.clear();
        assert_eq!(arena.live_count(), 0);
        assert!(arena.view().iter().all(|s| s.is_dead()));
    }
}

use std::sync::atomic::{AtomicU32, Ordering};

use crossbeam_channel::Receiver;
use glam::Vec3;

use crate::constants::physics_constants::{
    DEFAULT_AIR_FRICTION, DEFAULT_GROUND_FRICTION, DEFAULT_HALF_EXTENT, DEFAULT_WATER_FRICTION,
};
use crate::physics::{aabb_from_center_half_extents, Aabb};

/// Lifecycle tag of a slot
///
/// `Dead -> New` happens on the simulation thread when a spawn request claims
/// the slot, `New -> Alive` on the render thread once the activation queue
/// hands the slot over, and `Alive -> Dead` on the simulation thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParticleState {
    #[default]
    Dead = 0,
    New = 1,
    Alive = 2,
}

impl ParticleState {
    fn from_bits(bits: u32) -> Self {
        match bits {
            1 => ParticleState::New,
            2 => ParticleState::Alive,
            _ => ParticleState::Dead,
        }
    }
}

const STATE_BITS: u32 = 2;
const STATE_MASK: u32 = (1 << STATE_BITS) - 1;
const GENERATION_MASK: u32 = u32::MAX >> STATE_BITS;

fn encode(generation: u32, state: ParticleState) -> u32 {
    (generation << STATE_BITS) | state as u32
}

/// Lifecycle word of every slot in a slab, shared by both schedules
///
/// Each word holds the state in its low bits and a claim generation above
/// them. The generation changes every time a spawn claims the slot, so a copy
/// of a slot published earlier can be matched against the claim it came from.
/// Only the simulation side writes `Dead` and `New`; only the render side
/// turns `New` into `Alive`.
#[derive(Debug)]
pub struct SlotStates {
    words: Box<[AtomicU32]>,
}

impl SlotStates {
    pub fn new(capacity: usize) -> Self {
        Self {
            words: (0..capacity).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn state(&self, slot: usize) -> ParticleState {
        ParticleState::from_bits(self.words[slot].load(Ordering::Acquire) & STATE_MASK)
    }

    pub fn generation(&self, slot: usize) -> u32 {
        self.words[slot].load(Ordering::Acquire) >> STATE_BITS
    }

    /// True while `slot` is Alive under the claim `generation`
    pub fn is_alive_claim(&self, slot: usize, generation: u32) -> bool {
        self.words
            .get(slot)
            .map(|word| word.load(Ordering::Acquire) == encode(generation, ParticleState::Alive))
            .unwrap_or(false)
    }

    pub fn count(&self, state: ParticleState) -> usize {
        (0..self.words.len())
            .filter(|&slot| self.state(slot) == state)
            .count()
    }

    /// Mark a Dead slot New under a fresh generation and return it
    pub(crate) fn claim(&self, slot: usize) -> u32 {
        let generation = self.generation(slot).wrapping_add(1) & GENERATION_MASK;
        self.words[slot].store(encode(generation, ParticleState::New), Ordering::Release);
        generation
    }

    pub(crate) fn retire(&self, slot: usize) {
        let generation = self.generation(slot);
        self.words[slot].store(encode(generation, ParticleState::Dead), Ordering::Release);
    }

    /// `New -> Alive`; false when the slot was retired or cleared meanwhile
    pub(crate) fn promote(&self, slot: usize) -> bool {
        let Some(word) = self.words.get(slot) else {
            return false;
        };
        let current = word.load(Ordering::Acquire);
        if current & STATE_MASK != ParticleState::New as u32 {
            return false;
        }
        let alive = (current & !STATE_MASK) | ParticleState::Alive as u32;
        word.compare_exchange(current, alive, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Promote every slot handed over on the activation queue
    pub fn promote_queued(&self, activations: &Receiver<u32>) -> usize {
        activations
            .try_iter()
            .filter(|&slot| self.promote(slot as usize))
            .count()
    }

    /// Mark every slot Dead, keeping generations so older copies stay stale
    pub(crate) fn retire_all(&self) {
        for slot in 0..self.words.len() {
            self.retire(slot);
        }
    }
}

/// Simulated state shared by every particle kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleBody {
    /// Center of the collision box, world space
    pub position: Vec3,
    /// Blocks per second
    pub velocity: Vec3,
    /// Remaining lifetime (seconds)
    pub lifetime: f32,
    /// Lifetime at spawn, used for interpolation
    pub initial_lifetime: f32,
    /// Local collision box half-extents
    pub half_extents: Vec3,
    pub gravity_multiplier: f32,
    pub air_friction: f32,
    pub water_friction: f32,
    pub ground_friction: f32,
    /// When false the particle flies through terrain
    pub collides: bool,
    /// Resting on a surface after the last step
    pub grounded: bool,
    /// Overlapping a liquid after the last step
    pub submerged: bool,
}

impl Default for ParticleBody {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            lifetime: 0.0,
            initial_lifetime: 0.0,
            half_extents: Vec3::splat(DEFAULT_HALF_EXTENT),
            gravity_multiplier: 1.0,
            air_friction: DEFAULT_AIR_FRICTION,
            water_friction: DEFAULT_WATER_FRICTION,
            ground_friction: DEFAULT_GROUND_FRICTION,
            collides: true,
            grounded: false,
            submerged: false,
        }
    }
}

impl ParticleBody {
    /// World-space collision box
    pub fn bounds(&self) -> Aabb {
        aabb_from_center_half_extents(self.position, self.half_extents)
    }

    /// Remaining fraction of the lifetime, 1.0 at spawn and 0.0 at expiry
    pub fn life_fraction(&self) -> f32 {
        if self.initial_lifetime > 0.0 {
            (self.lifetime / self.initial_lifetime).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Force invalid spawn input into something the pipeline can carry safely.
    /// Returns false when the body was unusable and has been set to expire.
    pub(crate) fn sanitize(&mut self) -> bool {
        let mut valid = true;
        if !self.position.is_finite() {
            self.position = Vec3::ZERO;
            valid = false;
        }
        if !self.velocity.is_finite() {
            self.velocity = Vec3::ZERO;
            valid = false;
        }
        if !self.half_extents.is_finite() {
            self.half_extents = Vec3::splat(DEFAULT_HALF_EXTENT);
        }
        if !(self.lifetime.is_finite() && self.lifetime > 0.0) {
            valid = false;
        }
        if !valid {
            self.lifetime = 0.0;
        }
        self.initial_lifetime = self.lifetime;
        valid
    }
}

/// Copy of one slot: lifecycle tag, shared body, kind-specific data
#[derive(Debug, Clone, Default)]
pub struct ParticleInstance<D> {
    pub state: ParticleState,
    pub body: ParticleBody,
    pub data: D,
}

impl<D: Default> ParticleInstance<D> {
    pub fn is_alive(&self) -> bool {
        self.state == ParticleState::Alive
    }

    pub fn is_dead(&self) -> bool {
        self.state == ParticleState::Dead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_rejects_nan_lifetime() {
        let mut body = ParticleBody {
            lifetime: f32::NAN,
            ..Default::default()
        };
        assert!(!body.sanitize());
        assert_eq!(body.lifetime, 0.0);
        assert_eq!(body.initial_lifetime, 0.0);
        assert_eq!(body.life_fraction(), 0.0);
    }

    #[test]
    fn test_sanitize_zeroes_non_finite_vectors() {
        let mut body = ParticleBody {
            position: Vec3::new(f32::INFINITY, 0.0, 0.0),
            velocity: Vec3::new(1.0, f32::NAN, 0.0),
            lifetime: 2.0,
            ..Default::default()
        };
        assert!(!body.sanitize());
        assert_eq!(body.position, Vec3::ZERO);
        assert_eq!(body.velocity, Vec3::ZERO);
        assert_eq!(body.lifetime, 0.0);
    }

    #[test]
    fn test_slot_states_follow_the_lifecycle() {
        let states = SlotStates::new(2);
        assert_eq!(states.count(ParticleState::Dead), 2);
        assert!(!states.promote(0));

        let generation = states.claim(0);
        assert_eq!(states.state(0), ParticleState::New);
        assert!(!states.is_alive_claim(0, generation));

        assert!(states.promote(0));
        assert!(!states.promote(0));
        assert!(states.is_alive_claim(0, generation));
        assert_eq!(states.count(ParticleState::Alive), 1);

        states.retire(0);
        assert_eq!(states.state(0), ParticleState::Dead);
        assert!(!states.is_alive_claim(0, generation));
        assert!(!states.is_alive_claim(7, generation));
    }

    #[test]
    fn test_reclaimed_slot_invalidates_older_generation() {
        let states = SlotStates::new(1);
        let first = states.claim(0);
        states.promote(0);
        states.retire(0);

        let second = states.claim(0);
        states.promote(0);
        assert_ne!(first, second);
        assert!(states.is_alive_claim(0, second));
        assert!(!states.is_alive_claim(0, first));
    }

    #[test]
    fn test_promote_queued_skips_cleared_slots() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let states = SlotStates::new(3);
        for slot in 0..3u32 {
            states.claim(slot as usize);
            tx.send(slot).unwrap();
        }
        states.retire_all();
        states.claim(1);

        assert_eq!(states.promote_queued(&rx), 1);
        assert_eq!(states.state(1), ParticleState::Alive);
        assert_eq!(states.state(0), ParticleState::Dead);
    }

    #[test]
    fn test_sanitize_keeps_valid_body() {
        let mut body = ParticleBody {
            position: Vec3::new(1.0, 2.0, 3.0),
            lifetime: 4.0,
            ..Default::default()
        };
        assert!(body.sanitize());
        assert_eq!(body.initial_lifetime, 4.0);
        body.lifetime = 1.0;
        assert_eq!(body.life_fraction(), 0.25);
    }
}

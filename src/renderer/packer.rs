use glam::{Quat, Vec3};

use crate::particles::snapshot::PublishedSlot;
use crate::particles::{ParticleBody, ParticleKind, SlotStates};
use crate::renderer::billboard::billboard_rotation;
use crate::renderer::instance::{light_terms, InstanceData};
use crate::renderer::Camera;
use crate::terrain::{CellSample, Terrain};

/// Per-instance inputs handed to [`ParticleKind::pack_one`]
#[derive(Debug, Clone, Copy)]
pub struct PackContext {
    pub camera: Vec3,
    /// Camera-facing rotation for this instance
    pub billboard: Quat,
    /// Terrain sample of the cell the instance occupies
    pub cell: CellSample,
}

impl PackContext {
    pub fn light(&self) -> [f32; 2] {
        light_terms(&self.cell)
    }
}

#[derive(Debug, Clone, Copy)]
struct SortEntry {
    key: f32,
    /// Index into the snapshot being packed
    entry: u32,
    cell: CellSample,
}

/// Builds the linear instance buffer of one slab
///
/// Both internal vectors are sized to the slab capacity up front, so packing
/// never reallocates.
#[derive(Debug)]
pub struct InstancePacker {
    instances: Vec<InstanceData>,
    order: Vec<SortEntry>,
}

impl InstancePacker {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            instances: Vec::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
        }
    }

    /// Pack every visible alive instance of a published snapshot and return
    /// the instance count
    ///
    /// An entry is packed only while its slot is still Alive under the claim
    /// the copy was taken from. Kinds exposing a sort key are emitted farthest
    /// first.
    pub fn pack<K: ParticleKind>(
        &mut self,
        snapshot: &[PublishedSlot<K::Data>],
        states: &SlotStates,
        camera: &Camera,
        terrain: &dyn Terrain,
    ) -> usize {
        self.instances.clear();
        self.order.clear();

        for (index, entry) in snapshot.iter().enumerate() {
            if !states.is_alive_claim(entry.slot as usize, entry.generation)
                || !(entry.body.lifetime > 0.0)
            {
                continue;
            }

            let cell = terrain.sample(entry.body.position.floor().as_ivec3());
            if cell.hides_particles() {
                continue;
            }

            match K::sort_key(&entry.body, camera.position) {
                Some(key) => self.order.push(SortEntry {
                    key,
                    entry: index as u32,
                    cell,
                }),
                None => {
                    let packed = pack_slot::<K>(&entry.body, &entry.data, camera, cell);
                    self.instances.push(packed);
                }
            }
        }

        if !self.order.is_empty() {
            self.order.sort_unstable_by(|a, b| b.key.total_cmp(&a.key));
            for sorted in &self.order {
                let entry = &snapshot[sorted.entry as usize];
                let packed = pack_slot::<K>(&entry.body, &entry.data, camera, sorted.cell);
                self.instances.push(packed);
            }
        }

        self.instances.len()
    }

    pub fn instances(&self) -> &[InstanceData] {
        &self.instances
    }

    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn clear(&mut self) {
        self.instances.clear();
        self.order.clear();
    }
}

fn pack_slot<K: ParticleKind>(
    body: &ParticleBody,
    data: &K::Data,
    camera: &Camera,
    cell: CellSample,
) -> InstanceData {
    let context = PackContext {
        camera: camera.position,
        billboard: billboard_rotation(body.position, camera.position),
        cell,
    };
    K::pack_one(body, data, &context)
}

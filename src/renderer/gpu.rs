use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::constants::render_constants::{INSTANCE_STRIDE, QUAD_VERTEX_COUNT};
use crate::renderer::{BlendMode, InstanceBatch, InstanceData, ParticleRenderer, ParticleUniforms};

/// Smallest instance buffer ever allocated, in instances
const MIN_INSTANCE_CAPACITY: u32 = 64;

/// One kind's GPU instance buffer
struct KindBuffer {
    buffer: wgpu::Buffer,
    /// Capacity in instances
    capacity: u32,
    /// Instances written this frame
    count: u32,
    blend: BlendMode,
}

/// wgpu side of the particle renderer boundary
///
/// Owns one instance buffer per particle kind (grown on demand, never shrunk)
/// and the shared uniform buffer. Pipelines and the quad vertex buffer belong
/// to the caller; [`Self::draw`] records the instanced draws into its pass.
pub struct ParticleGpuBuffers {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    uniforms: wgpu::Buffer,
    buffers: FxHashMap<&'static str, KindBuffer>,
    /// Kinds in first-draw order
    order: Vec<&'static str>,
}

impl ParticleGpuBuffers {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Uniforms"),
            size: std::mem::size_of::<ParticleUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            device,
            queue,
            uniforms,
            buffers: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    pub fn uniform_buffer(&self) -> &wgpu::Buffer {
        &self.uniforms
    }

    /// Instances uploaded for `kind` this frame
    pub fn instance_count(&self, kind: &str) -> u32 {
        self.buffers.get(kind).map_or(0, |b| b.count)
    }

    /// Vertex buffer layout of [`InstanceData`], shader locations 2 through 8
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // Color
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Block and sky light
                wgpu::VertexAttribute {
                    offset: 16,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // Atlas offset
                wgpu::VertexAttribute {
                    offset: 24,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // Transform - 3 row vec4s
                wgpu::VertexAttribute {
                    offset: 32,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: 48,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: 64,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Atlas size
                wgpu::VertexAttribute {
                    offset: 80,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }

    /// Record one instanced quad draw per kind uploaded this frame with `blend`
    ///
    /// The caller binds the pipeline matching `blend` and the bind group holding
    /// [`Self::uniform_buffer`]; `quad` is bound at slot 0, instances at slot 1.
    pub fn draw<'a>(
        &'a self,
        pass: &mut wgpu::RenderPass<'a>,
        quad: &'a wgpu::Buffer,
        blend: BlendMode,
    ) -> u32 {
        let mut draws = 0;
        pass.set_vertex_buffer(0, quad.slice(..));
        for kind in &self.order {
            let Some(entry) = self.buffers.get(kind) else {
                continue;
            };
            if entry.count == 0 || entry.blend != blend {
                continue;
            }
            let used = entry.count as wgpu::BufferAddress * INSTANCE_STRIDE as wgpu::BufferAddress;
            pass.set_vertex_buffer(1, entry.buffer.slice(..used));
            pass.draw(0..QUAD_VERTEX_COUNT, 0..entry.count);
            draws += 1;
        }
        draws
    }

    fn create_instance_buffer(&self, kind: &str, capacity: u32) -> wgpu::Buffer {
        log::debug!("Allocating {} particle instance buffer for {} instances", kind, capacity);
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Instance Buffer"),
            size: capacity as wgpu::BufferAddress * INSTANCE_STRIDE as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }
}

/// Upload stage of the particle pass
///
/// `draw_instanced` only writes the batch into its kind's instance buffer.
/// The host records the actual draws afterwards with
/// [`ParticleGpuBuffers::draw`] inside its render pass.
impl ParticleRenderer for ParticleGpuBuffers {
    fn begin_frame(&mut self) {
        for entry in self.buffers.values_mut() {
            entry.count = 0;
        }
    }

    fn set_uniforms(&mut self, uniforms: &ParticleUniforms) {
        self.queue
            .write_buffer(&self.uniforms, 0, bytemuck::bytes_of(uniforms));
    }

    fn draw_instanced(&mut self, batch: InstanceBatch<'_>) {
        if batch.instance_count == 0 {
            return;
        }
        let needed = batch.instance_count.max(MIN_INSTANCE_CAPACITY).next_power_of_two();

        let replacement = match self.buffers.get(batch.kind) {
            Some(entry) if entry.capacity >= batch.instance_count => None,
            _ => Some(self.create_instance_buffer(batch.kind, needed)),
        };
        if let Some(buffer) = replacement {
            if !self.buffers.contains_key(batch.kind) {
                self.order.push(batch.kind);
            }
            self.buffers.insert(
                batch.kind,
                KindBuffer {
                    buffer,
                    capacity: needed,
                    count: 0,
                    blend: batch.blend,
                },
            );
        }

        if let Some(entry) = self.buffers.get_mut(batch.kind) {
            self.queue.write_buffer(&entry.buffer, 0, batch.bytes);
            entry.count = batch.instance_count;
            entry.blend = batch.blend;
        }
    }
}

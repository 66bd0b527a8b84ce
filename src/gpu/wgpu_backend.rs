//! [`GpuBackend`] implementation on wgpu.
//!
//! All resources live behind integer handles in a [`RefCell`]'d table;
//! the engine's wrapper types own the handles and this module owns the
//! wgpu objects. Shader "stages" are validated `ShaderModule`s and a
//! linked "program" is a pair of render pipelines, one per attachment
//! format (off-screen chain vs. visible surface).

use std::cell::RefCell;
use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::foundation::core::Dimensions;
use crate::foundation::error::{ImagoError, ImagoResult};
use crate::gpu::backend::{
    Destination, DrawCall, GeometryId, GpuBackend, ProgramId, StageId, StageKind, TargetId,
    TextureId,
};

const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Layout-matched mirror of the WGSL `LayerUniforms` block.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct LayerUniforms {
    aspect: [[f32; 4]; 4],
    invert: [[f32; 4]; 4],
    intensity: f32,
    blend_mode: u32,
    _pad: [f32; 2],
    params: [[f32; 4]; 4],
}

const UNIFORMS_SIZE: u64 = std::mem::size_of::<LayerUniforms>() as u64;

const MIP_BLIT_SHADER: &str = r#"
struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs(@builtin(vertex_index) vi: u32) -> VsOut {
    var p = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 3.0, -1.0),
        vec2<f32>(-1.0,  3.0),
    );
    let pos = p[vi];
    var o: VsOut;
    o.pos = vec4<f32>(pos, 0.0, 1.0);
    o.uv = vec2<f32>((pos.x + 1.0) * 0.5, (1.0 - pos.y) * 0.5);
    return o;
}

@group(0) @binding(0) var t_src: texture_2d<f32>;
@group(0) @binding(1) var s_src: sampler;

@fragment
fn fs(in: VsOut) -> @location(0) vec4<f32> {
    return textureSample(t_src, s_src, in.uv);
}
"#;

struct TextureEntry {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct GeometryEntry {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

struct StageEntry {
    module: wgpu::ShaderModule,
    kind: StageKind,
}

struct ProgramEntry {
    offscreen: wgpu::RenderPipeline,
    surface: wgpu::RenderPipeline,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    textures: HashMap<TextureId, TextureEntry>,
    targets: HashMap<TargetId, TextureId>,
    geometries: HashMap<GeometryId, GeometryEntry>,
    stages: HashMap<StageId, StageEntry>,
    programs: HashMap<ProgramId, ProgramEntry>,
    surface_view: Option<wgpu::TextureView>,
}

impl Inner {
    fn alloc(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    sampler: wgpu::Sampler,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    uniforms: wgpu::Buffer,
    mip_pipeline: wgpu::RenderPipeline,
    mip_bind_group_layout: wgpu::BindGroupLayout,
    inner: RefCell<Inner>,
}

impl WgpuBackend {
    /// Wraps an existing device, e.g. one whose surface is managed by a
    /// windowing layer. `surface_format` is the format of the visible
    /// surface the final preview pass renders into.
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("imago_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("imago_layer_uniforms"),
            size: UNIFORMS_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("imago_layer_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(UNIFORMS_SIZE),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("imago_layer_pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let (mip_pipeline, mip_bind_group_layout) = build_mip_pipeline(&device);

        Self {
            device,
            queue,
            surface_format,
            sampler,
            bind_group_layout,
            pipeline_layout,
            uniforms,
            mip_pipeline,
            mip_bind_group_layout,
            inner: RefCell::new(Inner::default()),
        }
    }

    /// Stands up a device with no window surface, for export-only use
    /// and integration tests.
    pub fn request_headless() -> ImagoResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| match e {
            wgpu::RequestAdapterError::NotFound { .. } => {
                ImagoError::gpu("no gpu adapter available")
            }
            other => ImagoError::gpu(format!("wgpu request_adapter failed: {other:?}")),
        })?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| ImagoError::gpu(format!("wgpu request_device failed: {e:?}")))?;

        Ok(Self::new(device, queue, OFFSCREEN_FORMAT))
    }

    /// Sets (or clears) the view the next surface-destined passes render
    /// into. Windowed integrations call this once per acquired frame.
    pub fn set_surface_target(&self, view: Option<wgpu::TextureView>) {
        self.inner.borrow_mut().surface_view = view;
    }

    fn create_texture_entry(&self, dimensions: Dimensions, mip_level_count: u32) -> TextureEntry {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("imago_texture"),
            size: wgpu::Extent3d {
                width: dimensions.width,
                height: dimensions.height,
                depth_or_array_layers: 1,
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OFFSCREEN_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        TextureEntry { texture, view }
    }

    /// Renders each mip level from the one above it with a plain blit.
    fn generate_mipmaps(&self, texture: &wgpu::Texture, mip_level_count: u32) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("imago_mip_encoder"),
            });

        for level in 1..mip_level_count {
            let source = texture.create_view(&wgpu::TextureViewDescriptor {
                base_mip_level: level - 1,
                mip_level_count: Some(1),
                ..Default::default()
            });
            let destination = texture.create_view(&wgpu::TextureViewDescriptor {
                base_mip_level: level,
                mip_level_count: Some(1),
                ..Default::default()
            });
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("imago_mip_bg"),
                layout: &self.mip_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&source),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            });

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("imago_mip_rp"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &destination,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.mip_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
            drop(pass);
        }

        self.queue.submit(Some(encoder.finish()));
    }

    /// Collects the validation error (if any) raised since the matching
    /// `push_error_scope`, as a shader failure.
    fn finish_shader_scope(&self, what: &str) -> ImagoResult<()> {
        match pollster::block_on(self.device.pop_error_scope()) {
            None => Ok(()),
            Some(err) => Err(ImagoError::shader(format!("{what}: {err}"))),
        }
    }
}

impl GpuBackend for WgpuBackend {
    fn create_texture(&self, dimensions: Dimensions) -> ImagoResult<TextureId> {
        let entry = self.create_texture_entry(dimensions, 1);
        let mut inner = self.inner.borrow_mut();
        let id = TextureId(inner.alloc());
        inner.textures.insert(id, entry);
        Ok(id)
    }

    fn create_textures(&self, count: usize, dimensions: Dimensions) -> ImagoResult<Vec<TextureId>> {
        (0..count).map(|_| self.create_texture(dimensions)).collect()
    }

    fn upload_texture(
        &self,
        dimensions: Dimensions,
        pixels: &[u8],
        mipmaps: bool,
    ) -> ImagoResult<TextureId> {
        if pixels.len() != dimensions.byte_len() {
            return Err(ImagoError::validation(format!(
                "upload of {} bytes does not cover {dimensions}",
                pixels.len()
            )));
        }

        let mip_level_count = if mipmaps {
            32 - dimensions.width.max(dimensions.height).leading_zeros()
        } else {
            1
        };
        let entry = self.create_texture_entry(dimensions, mip_level_count);

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &entry.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(dimensions.width * 4),
                rows_per_image: Some(dimensions.height),
            },
            wgpu::Extent3d {
                width: dimensions.width,
                height: dimensions.height,
                depth_or_array_layers: 1,
            },
        );
        if mip_level_count > 1 {
            self.generate_mipmaps(&entry.texture, mip_level_count);
        }

        let mut inner = self.inner.borrow_mut();
        let id = TextureId(inner.alloc());
        inner.textures.insert(id, entry);
        Ok(id)
    }

    fn delete_texture(&self, id: TextureId) {
        self.inner.borrow_mut().textures.remove(&id);
    }

    fn create_render_target(&self, texture: TextureId) -> ImagoResult<TargetId> {
        let mut inner = self.inner.borrow_mut();
        if !inner.textures.contains_key(&texture) {
            return Err(ImagoError::gpu(format!(
                "render target refers to unknown texture {texture:?}"
            )));
        }
        let id = TargetId(inner.alloc());
        inner.targets.insert(id, texture);
        Ok(id)
    }

    fn delete_render_target(&self, id: TargetId) {
        self.inner.borrow_mut().targets.remove(&id);
    }

    fn create_geometry(&self, vertices: &[f32], indices: &[u16]) -> ImagoResult<GeometryId> {
        let vertex = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("imago_vertices"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("imago_indices"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        let mut inner = self.inner.borrow_mut();
        let id = GeometryId(inner.alloc());
        inner.geometries.insert(
            id,
            GeometryEntry {
                vertex,
                index,
                index_count: indices.len() as u32,
            },
        );
        Ok(id)
    }

    fn delete_geometry(&self, id: GeometryId) {
        self.inner.borrow_mut().geometries.remove(&id);
    }

    fn compile_stage(&self, kind: StageKind, source: &str) -> ImagoResult<StageId> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("imago_stage"),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        self.finish_shader_scope(&format!("{kind} stage compile failed"))?;

        let mut inner = self.inner.borrow_mut();
        let id = StageId(inner.alloc());
        inner.stages.insert(id, StageEntry { module, kind });
        Ok(id)
    }

    fn delete_stage(&self, id: StageId) {
        self.inner.borrow_mut().stages.remove(&id);
    }

    fn link_program(&self, vertex: StageId, fragment: StageId) -> ImagoResult<ProgramId> {
        let inner = self.inner.borrow();
        let vertex = inner
            .stages
            .get(&vertex)
            .filter(|s| s.kind == StageKind::Vertex)
            .ok_or_else(|| ImagoError::shader("link: vertex stage not found"))?;
        let fragment = inner
            .stages
            .get(&fragment)
            .filter(|s| s.kind == StageKind::Fragment)
            .ok_or_else(|| ImagoError::shader("link: fragment stage not found"))?;

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let offscreen = build_layer_pipeline(
            &self.device,
            &self.pipeline_layout,
            &vertex.module,
            &fragment.module,
            OFFSCREEN_FORMAT,
        );
        let surface = build_layer_pipeline(
            &self.device,
            &self.pipeline_layout,
            &vertex.module,
            &fragment.module,
            self.surface_format,
        );
        drop(inner);
        self.finish_shader_scope("program link failed")?;

        let mut inner = self.inner.borrow_mut();
        let id = ProgramId(inner.alloc());
        inner.programs.insert(id, ProgramEntry { offscreen, surface });
        Ok(id)
    }

    fn delete_program(&self, id: ProgramId) {
        self.inner.borrow_mut().programs.remove(&id);
    }

    fn draw(&self, call: &DrawCall) -> ImagoResult<()> {
        let uniforms = LayerUniforms {
            aspect: call.aspect.to_cols_array_2d(),
            invert: call.invert.to_cols_array_2d(),
            intensity: call.intensity,
            blend_mode: call.blend_mode,
            _pad: [0.0; 2],
            params: [
                [call.params[0], call.params[1], call.params[2], call.params[3]],
                [call.params[4], call.params[5], call.params[6], call.params[7]],
                [call.params[8], call.params[9], call.params[10], call.params[11]],
                [
                    call.params[12],
                    call.params[13],
                    call.params[14],
                    call.params[15],
                ],
            ],
        };
        self.queue
            .write_buffer(&self.uniforms, 0, bytemuck::bytes_of(&uniforms));

        let inner = self.inner.borrow();
        let program = inner
            .programs
            .get(&call.program)
            .ok_or_else(|| ImagoError::gpu(format!("draw with unknown program {:?}", call.program)))?;
        let geometry = inner
            .geometries
            .get(&call.geometry)
            .ok_or_else(|| ImagoError::gpu(format!("draw with unknown geometry {:?}", call.geometry)))?;
        let source = inner
            .textures
            .get(&call.source)
            .ok_or_else(|| ImagoError::gpu(format!("draw with unknown texture {:?}", call.source)))?;

        let (pipeline, view) = match call.destination {
            Destination::Target(target) => {
                let texture = inner
                    .targets
                    .get(&target)
                    .ok_or_else(|| ImagoError::gpu(format!("draw to unknown target {target:?}")))?;
                let entry = inner.textures.get(texture).ok_or_else(|| {
                    ImagoError::gpu(format!("target {target:?} texture was deleted"))
                })?;
                (&program.offscreen, &entry.view)
            }
            Destination::Surface => {
                let view = inner
                    .surface_view
                    .as_ref()
                    .ok_or_else(|| ImagoError::gpu("draw to surface with no surface target set"))?;
                (&program.surface, view)
            }
        };

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("imago_layer_bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&source.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let [r, g, b, a] = call.clear_color;
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("imago_layer_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("imago_layer_rp"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(0, geometry.vertex.slice(..));
            pass.set_index_buffer(geometry.index.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..geometry.index_count, 0, 0..1);
        }
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    fn read_pixels(&self, target: TargetId, dimensions: Dimensions) -> ImagoResult<Vec<u8>> {
        let inner = self.inner.borrow();
        let texture = inner
            .targets
            .get(&target)
            .and_then(|texture| inner.textures.get(texture))
            .ok_or_else(|| ImagoError::gpu(format!("readback from unknown target {target:?}")))?;

        let row_bytes = dimensions.width * 4;
        let padded_row_bytes = align_to(row_bytes, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("imago_readback"),
            size: padded_row_bytes as u64 * dimensions.height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("imago_readback_encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row_bytes),
                    rows_per_image: Some(dimensions.height),
                },
            },
            wgpu::Extent3d {
                width: dimensions.width,
                height: dimensions.height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| ImagoError::gpu(format!("wgpu poll failed: {e:?}")))?;
        rx.recv()
            .map_err(|_| ImagoError::gpu("readback channel closed"))?
            .map_err(|e| ImagoError::gpu(format!("readback map failed: {e:?}")))?;

        let mapped = slice.get_mapped_range();
        let mut out = Vec::with_capacity(dimensions.byte_len());
        for row in 0..dimensions.height as usize {
            let start = row * padded_row_bytes as usize;
            out.extend_from_slice(&mapped[start..start + row_bytes as usize]);
        }
        drop(mapped);
        readback.unmap();
        Ok(out)
    }

    fn clear_surface(&self, color: [f32; 4]) -> ImagoResult<()> {
        let inner = self.inner.borrow();
        let view = inner
            .surface_view
            .as_ref()
            .ok_or_else(|| ImagoError::gpu("clear with no surface target set"))?;

        let [r, g, b, a] = color;
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("imago_clear_encoder"),
            });
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("imago_clear_rp"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: r as f64,
                        g: g as f64,
                        b: b as f64,
                        a: a as f64,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }
}

fn build_layer_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    vertex: &wgpu::ShaderModule,
    fragment: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("imago_layer_pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: vertex,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: 16,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x2,
                        offset: 0,
                        shader_location: 0,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x2,
                        offset: 8,
                        shader_location: 1,
                    },
                ],
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn build_mip_pipeline(device: &wgpu::Device) -> (wgpu::RenderPipeline, wgpu::BindGroupLayout) {
    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("imago_mip_bgl"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("imago_mip_shader"),
        source: wgpu::ShaderSource::Wgsl(MIP_BLIT_SHADER.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("imago_mip_pl"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("imago_mip_pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: OFFSCREEN_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    (pipeline, bind_group_layout)
}

fn align_to(value: u32, alignment: u32) -> u32 {
    let mask = alignment - 1;
    (value + mask) & !mask
}

use crate::action::*;
use crate::bindings;
use crate::error::*;
use crate::gpu_data::*;
use crate::pipeline::*;
use crate::registry::*;
use crate::shaders::*;
use crate::transform2d::*;

use log::{info, trace};

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

///
/// Executes streams of render actions against a wgpu device
///
/// Rendering happens in two phases: the action stream is first walked to update
/// resources and realize the bind groups and pipelines each draw needs, then the
/// recorded passes are replayed into a command encoder. The replay only borrows,
/// which is what the borrowing design of wgpu render passes requires.
///
pub struct Renderer {
    layouts: BindGroupLayouts,
    shaders: ShaderCache,
    registry: Registry,
    sampler_bind_group: wgpu::BindGroup,
    empty_fragment_bind_group: wgpu::BindGroup,
    surface_format: wgpu::TextureFormat,
}

/// A render pass recorded by the planning phase
struct FramePass {
    target: Option<RenderTargetId>,
    clear: Option<wgpu::Color>,
    ops: Vec<DrawOp>,
}

/// One step of a recorded render pass, referencing the frame resources by index
enum DrawOp {
    Pipeline(usize),
    VertexGroup(usize),
    FragmentGroup(Option<usize>),
    Draw(Range<u32>),
    DrawIndexed(usize, u32),
}

/// Everything the planning phase needs to realize GPU objects
struct PlanContext<'a> {
    device: &'a wgpu::Device,
    registry: &'a mut Registry,
    shaders: &'a mut ShaderCache,
    layouts: &'a BindGroupLayouts,
    surface_format: wgpu::TextureFormat,
}

///
/// Builds the pass list for one frame
///
/// The realized bind groups keep the buffers and textures they reference alive, so a
/// resource that is freed or replaced later in the same action stream still renders
/// correctly in the draws recorded before the free.
///
struct FramePlanner {
    passes: Vec<FramePass>,

    pipelines: Vec<Arc<wgpu::RenderPipeline>>,
    vertex_groups: Vec<wgpu::BindGroup>,
    fragment_groups: Vec<wgpu::BindGroup>,
    index_buffers: Vec<Arc<wgpu::Buffer>>,

    transform_slots: Vec<(wgpu::Buffer, wgpu::Buffer)>,
    pipeline_indexes: HashMap<PipelineConfiguration, usize>,
    vertex_group_indexes: HashMap<(usize, VertexBufferId), usize>,

    // Stream state
    transform: Matrix,
    texture_transform: Matrix,
    transform_slot: Option<usize>,
    blend_mode: BlendMode,
    shader: ShaderType,
    fragment_group: Option<usize>,
    target: Option<RenderTargetId>,

    // Redundant-state elision for the pass currently being recorded
    last_pipeline: Option<usize>,
    last_vertex_group: Option<usize>,
    last_fragment_group: Option<Option<usize>>,
}

impl FramePlanner {
    fn new() -> FramePlanner {
        FramePlanner {
            passes: vec![],
            pipelines: vec![],
            vertex_groups: vec![],
            fragment_groups: vec![],
            index_buffers: vec![],
            transform_slots: vec![],
            pipeline_indexes: HashMap::new(),
            vertex_group_indexes: HashMap::new(),
            transform: Matrix::identity(),
            texture_transform: Matrix::identity(),
            transform_slot: None,
            blend_mode: BlendMode::SourceOver,
            shader: ShaderType::default(),
            fragment_group: None,
            target: None,
            last_pipeline: None,
            last_vertex_group: None,
            last_fragment_group: None,
        }
    }

    /// Starts recording a new pass against the current target
    fn start_pass(&mut self, clear: Option<wgpu::Color>) {
        self.passes.push(FramePass { target: self.target, clear, ops: vec![] });
        self.last_pipeline = None;
        self.last_vertex_group = None;
        self.last_fragment_group = None;
    }

    /// Clears the current target at the start of the next pass
    fn clear(&mut self, color: Rgba8) {
        let color = color.to_wgpu_color();

        match self.passes.last_mut() {
            Some(pass) if pass.target == self.target && pass.ops.is_empty() => {
                pass.clear = Some(color);
            }

            _ => self.start_pass(Some(color)),
        }
    }

    /// Realizes the fragment bind group for a shader and makes it current
    fn use_shader(&mut self, context: &mut PlanContext<'_>, shader: ShaderType) -> Result<(), RenderError> {
        let features = shader.features();

        self.fragment_group = if features == NO_FEATURES {
            None
        } else {
            let registry = &*context.registry;
            let mut entries = vec![];

            match &shader {
                ShaderType::Simple { .. } => {}
                ShaderType::Texture { texture, .. } => {
                    entries.push(ColorTexture::bind_group_entry(&registry.texture(*texture)?.view));
                }
                ShaderType::DashedLine { dash_texture, .. } => {
                    entries.push(ColorTexture::bind_group_entry(&registry.texture(*dash_texture)?.view));
                }
            }

            let (erase_texture, clip_texture) = match &shader {
                ShaderType::Simple { erase_texture, clip_texture }
                | ShaderType::Texture { erase_texture, clip_texture, .. }
                | ShaderType::DashedLine { erase_texture, clip_texture, .. } => (*erase_texture, *clip_texture),
            };

            if let Some(erase) = erase_texture {
                entries.push(EraseMask::bind_group_entry(&registry.texture(erase)?.view));
            }
            if let Some(clip) = clip_texture {
                entries.push(ClipMask::bind_group_entry(&registry.texture(clip)?.view));
            }

            let bind_group = context.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("fragment_inputs"),
                layout: context.layouts.fragment_for(features),
                entries: &entries,
            });

            self.fragment_groups.push(bind_group);
            Some(self.fragment_groups.len() - 1)
        };

        self.shader = shader;
        Ok(())
    }

    /// Records one draw, emitting the pipeline and bind group changes it needs first
    fn draw(&mut self, context: &mut PlanContext<'_>, vertex_buffer: VertexBufferId, op: DrawOp) -> Result<(), RenderError> {
        // Make sure the current pass draws to the current target
        let needs_new_pass = match self.passes.last() {
            Some(pass) => pass.target != self.target,
            None => true,
        };
        if needs_new_pass {
            self.start_pass(None);
        }

        // The transform slot is realized lazily so that several transform changes
        // between draws only upload one matrix pair
        let slot = match self.transform_slot {
            Some(slot) => slot,
            None => {
                let transform = GpuTransform::from(self.transform).buffer(context.device);
                let texture_transform = GpuTextureTransform::from(self.texture_transform).buffer(context.device);

                self.transform_slots.push((transform, texture_transform));

                let slot = self.transform_slots.len() - 1;
                self.transform_slot = Some(slot);
                slot
            }
        };

        // Pipeline for the current target format, blend mode and shader
        let texture_format = match self.target {
            None => context.surface_format,
            Some(target) => context.registry.render_target_format(target)?,
        };

        let config = PipelineConfiguration {
            texture_format,
            sample_count: 1,
            blend_mode: self.blend_mode,
            source_is_premultiplied: false,
            shader: self.shader.program(),
            features: self.shader.features(),
        };

        let pipeline = match self.pipeline_indexes.get(&config) {
            Some(index) => *index,
            None => {
                let realized = context.registry.render_pipeline(context.device, context.shaders, context.layouts, config.clone());
                self.pipelines.push(realized);

                let index = self.pipelines.len() - 1;
                self.pipeline_indexes.insert(config, index);
                index
            }
        };

        // Bind group tying the transform slot to the vertex buffer
        let vertex_group = match self.vertex_group_indexes.get(&(slot, vertex_buffer)) {
            Some(index) => *index,
            None => {
                let (transform, texture_transform) = &self.transform_slots[slot];
                let vertices = context.registry.vertex_buffer(vertex_buffer)?;

                let bind_group = context.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("vertex_inputs"),
                    layout: context.layouts.vertex(),
                    entries: &[
                        GpuTransform::bind_group_entry(transform),
                        VertexStream::bind_group_entry(&vertices.buffer),
                        GpuTextureTransform::bind_group_entry(texture_transform),
                    ],
                });

                self.vertex_groups.push(bind_group);

                let index = self.vertex_groups.len() - 1;
                self.vertex_group_indexes.insert((slot, vertex_buffer), index);
                index
            }
        };

        let pass = self.passes.last_mut().unwrap();

        if self.last_pipeline != Some(pipeline) {
            pass.ops.push(DrawOp::Pipeline(pipeline));
            self.last_pipeline = Some(pipeline);
        }

        if self.last_vertex_group != Some(vertex_group) {
            pass.ops.push(DrawOp::VertexGroup(vertex_group));
            self.last_vertex_group = Some(vertex_group);
        }

        if self.last_fragment_group != Some(self.fragment_group) {
            pass.ops.push(DrawOp::FragmentGroup(self.fragment_group));
            self.last_fragment_group = Some(self.fragment_group);
        }

        pass.ops.push(op);

        Ok(())
    }

    /// Drops the cached vertex bind groups that reference a vertex buffer
    fn invalidate_vertex_buffer(&mut self, id: VertexBufferId) {
        self.vertex_group_indexes.retain(|(_, vertex_buffer), _| *vertex_buffer != id);
    }
}

impl Renderer {
    ///
    /// Creates a renderer that will present to targets with the specified texture format
    ///
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Renderer {
        let layouts = BindGroupLayouts::new(device);

        let default_sampler = device.create_sampler(&DefaultSampler::descriptor());
        let sampler_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("samplers"),
            layout: layouts.samplers(),
            entries: &[DefaultSampler::bind_group_entry(&default_sampler)],
        });

        let empty_fragment_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fragment_inputs_empty"),
            layout: layouts.fragment_for(NO_FEATURES),
            entries: &[],
        });

        info!("canvas renderer ready (surface format {:?})", surface_format);

        Renderer {
            layouts,
            shaders: ShaderCache::empty(),
            registry: Registry::new(),
            sampler_bind_group,
            empty_fragment_bind_group,
            surface_format,
        }
    }

    ///
    /// Executes a stream of render actions, rendering to `frame_view` whenever the
    /// stream targets the main frame buffer
    ///
    pub fn render<Actions: IntoIterator<Item=RenderAction>>(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, actions: Actions, frame_view: &wgpu::TextureView) -> Result<(), RenderError> {
        let Renderer { layouts, shaders, registry, sampler_bind_group, empty_fragment_bind_group, surface_format } = self;

        let mut context = PlanContext {
            device,
            registry,
            shaders,
            layouts: &*layouts,
            surface_format: *surface_format,
        };
        let mut planner = FramePlanner::new();

        // Phase 1: walk the action stream, updating resources and recording passes
        for action in actions {
            trace!("{:?}", RenderActionType::from(&action));

            match action {
                RenderAction::SetTransform(matrix) => {
                    planner.transform = matrix;
                    planner.transform_slot = None;
                }

                RenderAction::SetTextureTransform(matrix) => {
                    planner.texture_transform = matrix;
                    planner.transform_slot = None;
                }

                RenderAction::CreateVertex2DBuffer(id, vertices) => {
                    context.registry.create_vertex_buffer(context.device, id, &vertices);
                    planner.invalidate_vertex_buffer(id);
                }

                RenderAction::CreateIndexBuffer(id, indices) => {
                    context.registry.create_index_buffer(context.device, id, &indices);
                }

                RenderAction::FreeVertexBuffer(id) => {
                    context.registry.free_vertex_buffer(id);
                    planner.invalidate_vertex_buffer(id);
                }

                RenderAction::FreeIndexBuffer(id) => {
                    context.registry.free_index_buffer(id);
                }

                RenderAction::BlendMode(blend_mode) => {
                    planner.blend_mode = blend_mode;
                }

                RenderAction::CreateRenderTarget(render_target, texture, width, height, target_type) => {
                    context.registry.create_render_target(context.device, render_target, texture, width, height, target_type);
                }

                RenderAction::FreeRenderTarget(id) => {
                    context.registry.free_render_target(id);
                }

                RenderAction::SelectRenderTarget(id) => {
                    context.registry.render_target(id)?;
                    planner.target = Some(id);
                }

                RenderAction::RenderToFrameBuffer => {
                    planner.target = None;
                }

                RenderAction::CreateTextureBgra(id, width, height) => {
                    context.registry.create_texture(context.device, id, width, height, ColorTexture::FORMAT);
                }

                RenderAction::CreateTextureMono(id, width, height) => {
                    context.registry.create_texture(context.device, id, width, height, ClipMask::FORMAT);
                }

                RenderAction::WriteTextureData(id, pos, size, bytes) => {
                    context.registry.write_texture(queue, id, pos, size, &bytes)?;
                }

                RenderAction::FreeTexture(id) => {
                    context.registry.free_texture(id);
                }

                RenderAction::Clear(color) => {
                    planner.clear(color);
                }

                RenderAction::UseShader(shader) => {
                    planner.use_shader(&mut context, shader)?;
                }

                RenderAction::DrawTriangles(vertex_buffer, range) => {
                    let op = DrawOp::Draw((range.start as u32)..(range.end as u32));
                    planner.draw(&mut context, vertex_buffer, op)?;
                }

                RenderAction::DrawIndexedTriangles(vertex_buffer, index_buffer, num_vertices) => {
                    let indexes = context.registry.index_buffer(index_buffer)?;
                    planner.index_buffers.push(Arc::clone(&indexes.buffer));

                    let op = DrawOp::DrawIndexed(planner.index_buffers.len() - 1, num_vertices as u32);
                    planner.draw(&mut context, vertex_buffer, op)?;
                }
            }
        }

        // Phase 2: replay the recorded passes into a command encoder
        let registry = context.registry;
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("canvas_render") });

        for pass in &planner.passes {
            let target_view = match pass.target {
                None => frame_view,
                Some(target_id) => {
                    let target = registry.render_target(target_id)?;
                    &registry.texture(target.texture)?.view
                }
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("canvas_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: pass.clear.map(wgpu::LoadOp::Clear).unwrap_or(wgpu::LoadOp::Load),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(bindings::SAMPLER_SET, &*sampler_bind_group, &[]);

            for op in &pass.ops {
                match op {
                    DrawOp::Pipeline(pipeline) => {
                        render_pass.set_pipeline(&planner.pipelines[*pipeline]);
                    }

                    DrawOp::VertexGroup(group) => {
                        render_pass.set_bind_group(bindings::VERTEX_SET, &planner.vertex_groups[*group], &[]);
                    }

                    DrawOp::FragmentGroup(None) => {
                        render_pass.set_bind_group(bindings::FRAGMENT_SET, &*empty_fragment_bind_group, &[]);
                    }

                    DrawOp::FragmentGroup(Some(group)) => {
                        render_pass.set_bind_group(bindings::FRAGMENT_SET, &planner.fragment_groups[*group], &[]);
                    }

                    DrawOp::Draw(vertices) => {
                        render_pass.draw(vertices.clone(), 0..1);
                    }

                    DrawOp::DrawIndexed(index_buffer, num_vertices) => {
                        render_pass.set_index_buffer(planner.index_buffers[*index_buffer].slice(..), wgpu::IndexFormat::Uint16);
                        render_pass.draw_indexed(0..*num_vertices, 0, 0..1);
                    }
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));

        Ok(())
    }
}

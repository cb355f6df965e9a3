use crate::action::*;
use crate::error::*;
use crate::gpu_data::*;
use crate::pipeline::*;
use crate::shaders::*;

use log::{debug, warn};
use wgpu::util::DeviceExt;

use std::collections::HashMap;
use std::sync::Arc;

pub struct VertexBufferEntry {
    pub buffer: wgpu::Buffer,
    pub vertex_count: usize,
}

pub struct IndexBufferEntry {
    // Shared so that a frame that draws with this buffer can keep it alive after a free
    pub buffer: Arc<wgpu::Buffer>,
    pub index_count: usize,
}

pub struct TextureEntry {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
}

pub struct RenderTargetEntry {
    pub texture: TextureId,
    pub width: u32,
    pub height: u32,
    pub target_type: RenderTargetType,
}

///
/// Storage for the live GPU resources, keyed by the ids used in the render action stream
///
pub struct Registry {
    vertex_buffers: HashMap<VertexBufferId, VertexBufferEntry>,
    index_buffers: HashMap<IndexBufferId, IndexBufferEntry>,
    textures: HashMap<TextureId, TextureEntry>,
    render_targets: HashMap<RenderTargetId, RenderTargetEntry>,
    pipelines: HashMap<PipelineConfiguration, Arc<wgpu::RenderPipeline>>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry {
            vertex_buffers: HashMap::new(),
            index_buffers: HashMap::new(),
            textures: HashMap::new(),
            render_targets: HashMap::new(),
            pipelines: HashMap::new(),
        }
    }

    ///
    /// Creates (or replaces) a vertex buffer with the specified vertices
    ///
    pub fn create_vertex_buffer(&mut self, device: &wgpu::Device, id: VertexBufferId, vertices: &[Vertex2D]) {
        debug!("create vertex buffer {:?} ({} vertices)", id, vertices.len());

        // An empty buffer cannot back the vertex binding, so allocate one zeroed entry
        let buffer = if vertices.is_empty() {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("vertices"),
                contents: &[0u8; std::mem::size_of::<Vertex2D>()],
                usage: wgpu::BufferUsages::STORAGE,
            })
        } else {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("vertices"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::STORAGE,
            })
        };

        self.vertex_buffers.insert(id, VertexBufferEntry { buffer, vertex_count: vertices.len() });
    }

    pub fn free_vertex_buffer(&mut self, id: VertexBufferId) {
        if self.vertex_buffers.remove(&id).is_none() {
            warn!("freeing vertex buffer {:?} which is not allocated", id);
        }
    }

    pub fn vertex_buffer(&self, id: VertexBufferId) -> Result<&VertexBufferEntry, RenderError> {
        self.vertex_buffers.get(&id).ok_or(RenderError::UnknownVertexBuffer(id))
    }

    ///
    /// Creates (or replaces) an index buffer with the specified indices
    ///
    pub fn create_index_buffer(&mut self, device: &wgpu::Device, id: IndexBufferId, indices: &[u16]) {
        debug!("create index buffer {:?} ({} indices)", id, indices.len());

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("indices"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        self.index_buffers.insert(id, IndexBufferEntry { buffer: Arc::new(buffer), index_count: indices.len() });
    }

    pub fn free_index_buffer(&mut self, id: IndexBufferId) {
        if self.index_buffers.remove(&id).is_none() {
            warn!("freeing index buffer {:?} which is not allocated", id);
        }
    }

    pub fn index_buffer(&self, id: IndexBufferId) -> Result<&IndexBufferEntry, RenderError> {
        self.index_buffers.get(&id).ok_or(RenderError::UnknownIndexBuffer(id))
    }

    ///
    /// Creates (or replaces) a 2D texture of the specified size and format
    ///
    pub fn create_texture(&mut self, device: &wgpu::Device, id: TextureId, width: usize, height: usize, format: wgpu::TextureFormat) {
        debug!("create texture {:?} ({}x{} {:?})", id, width, height, format);

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("canvas_texture"),
            size: wgpu::Extent3d { width: width as u32, height: height as u32, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        self.textures.insert(id, TextureEntry { texture, view, format });
    }

    pub fn free_texture(&mut self, id: TextureId) {
        if self.textures.remove(&id).is_none() {
            warn!("freeing texture {:?} which is not allocated", id);
        }
    }

    pub fn texture(&self, id: TextureId) -> Result<&TextureEntry, RenderError> {
        self.textures.get(&id).ok_or(RenderError::UnknownTexture(id))
    }

    ///
    /// Writes bytes into a region of an existing texture
    ///
    pub fn write_texture(&self, queue: &wgpu::Queue, id: TextureId, pos: (usize, usize), size: (usize, usize), bytes: &[u8]) -> Result<(), RenderError> {
        let entry = self.texture(id)?;

        let bytes_per_pixel = match entry.format {
            wgpu::TextureFormat::R8Unorm => 1,
            _ => 4,
        };
        let (x, y) = pos;
        let (width, height) = size;

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &entry.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x: x as u32, y: y as u32, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            bytes,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some((width * bytes_per_pixel) as u32),
                rows_per_image: Some(height as u32),
            },
            wgpu::Extent3d { width: width as u32, height: height as u32, depth_or_array_layers: 1 },
        );

        Ok(())
    }

    ///
    /// Creates a render target and the texture that backs it
    ///
    pub fn create_render_target(&mut self, device: &wgpu::Device, id: RenderTargetId, texture: TextureId, width: usize, height: usize, target_type: RenderTargetType) {
        debug!("create render target {:?} backed by {:?} ({}x{} {:?})", id, texture, width, height, target_type);

        let format = match target_type {
            RenderTargetType::Standard => ColorTexture::FORMAT,
            RenderTargetType::Monochrome => ClipMask::FORMAT,
        };

        self.create_texture(device, texture, width, height, format);
        self.render_targets.insert(id, RenderTargetEntry {
            texture,
            width: width as u32,
            height: height as u32,
            target_type,
        });
    }

    pub fn free_render_target(&mut self, id: RenderTargetId) {
        if self.render_targets.remove(&id).is_none() {
            warn!("freeing render target {:?} which is not allocated", id);
        }
    }

    pub fn render_target(&self, id: RenderTargetId) -> Result<&RenderTargetEntry, RenderError> {
        self.render_targets.get(&id).ok_or(RenderError::UnknownRenderTarget(id))
    }

    ///
    /// The format of the texture that backs a render target
    ///
    pub fn render_target_format(&self, id: RenderTargetId) -> Result<wgpu::TextureFormat, RenderError> {
        let target = self.render_target(id)?;
        Ok(self.texture(target.texture)?.format)
    }

    ///
    /// Retrieves the pipeline for a configuration, creating it on first use
    ///
    pub fn render_pipeline(&mut self, device: &wgpu::Device, shaders: &mut ShaderCache, layouts: &BindGroupLayouts, config: PipelineConfiguration) -> Arc<wgpu::RenderPipeline> {
        if let Some(pipeline) = self.pipelines.get(&config) {
            return Arc::clone(pipeline);
        }

        debug!("create render pipeline {:?}", config);

        let pipeline = Arc::new(config.render_pipeline(device, shaders, layouts));
        self.pipelines.insert(config, Arc::clone(&pipeline));

        pipeline
    }
}

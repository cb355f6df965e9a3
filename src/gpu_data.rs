use crate::bindings;
use crate::bindings::{FragmentInputIndex, VertexInputIndex};

use bytemuck::{Pod, Zeroable};

///
/// 2D vertex representation
///
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Debug, Pod, Zeroable)]
pub struct Vertex2D {
    pub pos:        [f32; 2],
    pub tex_coord:  [f32; 2],
    pub color:      [u8; 4],
}

impl Vertex2D {
    ///
    /// Creates a 2D vertex with the position set and the other values zeroed out
    ///
    pub fn with_pos(x: f32, y: f32) -> Vertex2D {
        Vertex2D {
            pos:        [x, y],
            tex_coord:  [0.0, 0.0],
            color:      [0, 0, 0, 0],
        }
    }

    ///
    /// Updates this vertex with a particular colour
    ///
    pub fn with_color(self, r: f32, g: f32, b: f32, a: f32) -> Vertex2D {
        Vertex2D {
            pos:        self.pos,
            tex_coord:  self.tex_coord,
            color:      [(r*255.0) as _, (g*255.0) as _, (b*255.0) as _, (a*255.0) as _],
        }
    }

    ///
    /// Updates this vertex with a texture coordinate
    ///
    pub fn with_texture_coordinates(self, x: f32, y: f32) -> Vertex2D {
        Vertex2D {
            pos:        self.pos,
            tex_coord:  [x, y],
            color:      self.color,
        }
    }
}

///
/// The vertex buffer, bound as a read-only storage buffer and fetched by vertex index
///
pub struct VertexStream;

impl VertexStream {
    pub const BINDING: u32 = VertexInputIndex::Vertices.binding();
    pub const STRIDE: u64 = std::mem::size_of::<Vertex2D>() as u64;

    pub fn bind_group_layout_entry() -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding: Self::BINDING,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(Self::STRIDE),
            },
            count: None,
        }
    }

    pub fn bind_group_entry(buffer: &wgpu::Buffer) -> wgpu::BindGroupEntry {
        wgpu::BindGroupEntry {
            binding: Self::BINDING,
            resource: wgpu::BindingResource::Buffer(buffer.as_entire_buffer_binding()),
        }
    }
}

///
/// The primary colour texture (also carries the dash pattern for the dashed line shader)
///
pub struct ColorTexture;

impl ColorTexture {
    pub const BINDING: u32 = FragmentInputIndex::Texture.binding();
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8Unorm;

    pub fn bind_group_layout_entry() -> wgpu::BindGroupLayoutEntry {
        sampled_texture_layout_entry(Self::BINDING)
    }

    pub fn bind_group_entry(texture: &wgpu::TextureView) -> wgpu::BindGroupEntry {
        wgpu::BindGroupEntry {
            binding: Self::BINDING,
            resource: wgpu::BindingResource::TextureView(texture),
        }
    }
}

///
/// The eraser mask, subtracted from anything drawn while it is bound
///
pub struct EraseMask;

impl EraseMask {
    pub const BINDING: u32 = FragmentInputIndex::EraseTexture.binding();
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

    pub fn bind_group_layout_entry() -> wgpu::BindGroupLayoutEntry {
        sampled_texture_layout_entry(Self::BINDING)
    }

    pub fn bind_group_entry(texture: &wgpu::TextureView) -> wgpu::BindGroupEntry {
        wgpu::BindGroupEntry {
            binding: Self::BINDING,
            resource: wgpu::BindingResource::TextureView(texture),
        }
    }
}

///
/// The clip mask, constraining rendering to the region where the mask is set
///
pub struct ClipMask;

impl ClipMask {
    pub const BINDING: u32 = FragmentInputIndex::ClipMaskTexture.binding();
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

    pub fn bind_group_layout_entry() -> wgpu::BindGroupLayoutEntry {
        sampled_texture_layout_entry(Self::BINDING)
    }

    pub fn bind_group_entry(texture: &wgpu::TextureView) -> wgpu::BindGroupEntry {
        wgpu::BindGroupEntry {
            binding: Self::BINDING,
            resource: wgpu::BindingResource::TextureView(texture),
        }
    }
}

///
/// The sampler shared by all of the texture inputs
///
pub struct DefaultSampler;

impl DefaultSampler {
    pub const BINDING: u32 = bindings::DEFAULT_SAMPLER;

    pub fn bind_group_layout_entry() -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding: Self::BINDING,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        }
    }

    pub fn bind_group_entry(sampler: &wgpu::Sampler) -> wgpu::BindGroupEntry {
        wgpu::BindGroupEntry {
            binding: Self::BINDING,
            resource: wgpu::BindingResource::Sampler(sampler),
        }
    }

    pub fn descriptor() -> wgpu::SamplerDescriptor<'static> {
        wgpu::SamplerDescriptor {
            label: Some("default_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        }
    }
}

fn sampled_texture_layout_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
        },
        count: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex2d_has_no_padding() {
        assert_eq!(std::mem::size_of::<Vertex2D>(), 20);
        assert_eq!(VertexStream::STRIDE, 20);
    }

    #[test]
    fn vertex2d_round_trips_through_raw_bytes() {
        let vertices = vec![
            Vertex2D::with_pos(0.0, 1.0).with_color(1.0, 0.5, 0.0, 1.0),
            Vertex2D::with_pos(-1.0, -1.0).with_texture_coordinates(0.25, 0.75),
        ];

        let bytes = bytemuck::cast_slice::<_, u8>(&vertices);
        assert_eq!(bytes.len(), 40);

        let restored = bytemuck::cast_slice::<u8, Vertex2D>(bytes);
        assert_eq!(restored, &vertices[..]);
    }

    #[test]
    fn vertex_constructors_fill_the_expected_fields() {
        let vertex = Vertex2D::with_pos(2.0, 3.0)
            .with_color(0.0, 1.0, 0.0, 1.0)
            .with_texture_coordinates(0.5, 0.5);

        assert_eq!(vertex.pos, [2.0, 3.0]);
        assert_eq!(vertex.tex_coord, [0.5, 0.5]);
        assert_eq!(vertex.color, [0, 255, 0, 255]);
    }

    #[test]
    fn texture_slots_use_their_fragment_bindings() {
        assert_eq!(ColorTexture::BINDING, 0);
        assert_eq!(EraseMask::BINDING, 1);
        assert_eq!(ClipMask::BINDING, 2);

        assert_eq!(ColorTexture::bind_group_layout_entry().binding, 0);
        assert_eq!(EraseMask::bind_group_layout_entry().binding, 1);
        assert_eq!(ClipMask::bind_group_layout_entry().binding, 2);
    }

    #[test]
    fn vertex_stream_uses_the_vertices_binding() {
        assert_eq!(VertexStream::BINDING, 1);
        assert_eq!(VertexStream::bind_group_layout_entry().binding, 1);
    }
}

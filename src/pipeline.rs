use crate::gpu_data::*;
use crate::shaders::*;
use crate::transform2d::*;

pub const DEFAULT_COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8Unorm;

///
/// The blend modes that the renderer can use
///
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum BlendMode {
    SourceOver,
    DestinationOver,
    SourceIn,
    DestinationIn,
    SourceOut,
    DestinationOut,
    SourceATop,
    DestinationATop,
    Multiply,
    Screen,
}

impl Default for BlendMode {
    fn default() -> BlendMode {
        BlendMode::SourceOver
    }
}

impl BlendMode {
    ///
    /// The blend factors for this mode, depending on whether or not the source colour
    /// has its alpha pre-multiplied into its components
    ///
    pub fn to_blend_state(self, source_is_premultiplied: bool) -> wgpu::BlendState {
        use self::BlendMode::*;
        use wgpu::BlendFactor::{Dst, DstAlpha, One, OneMinusDst, OneMinusDstAlpha, OneMinusSrcAlpha, SrcAlpha, Zero};

        let (src_rgb, dst_rgb, src_alpha, dst_alpha) = match (self, source_is_premultiplied) {
            (SourceOver, false)         => (SrcAlpha, OneMinusSrcAlpha, One, OneMinusSrcAlpha),
            (SourceOver, true)          => (One, OneMinusSrcAlpha, One, OneMinusSrcAlpha),

            (DestinationOver, _)        => (OneMinusDstAlpha, DstAlpha, OneMinusDstAlpha, One),
            (SourceIn, _)               => (DstAlpha, Zero, DstAlpha, Zero),
            (DestinationIn, _)          => (Zero, SrcAlpha, Zero, SrcAlpha),
            (SourceOut, _)              => (Zero, OneMinusDstAlpha, Zero, OneMinusDstAlpha),
            (DestinationOut, _)         => (Zero, OneMinusSrcAlpha, Zero, OneMinusSrcAlpha),
            (SourceATop, _)             => (OneMinusDstAlpha, SrcAlpha, OneMinusDstAlpha, SrcAlpha),
            (DestinationATop, _)        => (OneMinusDstAlpha, OneMinusSrcAlpha, OneMinusDstAlpha, OneMinusSrcAlpha),

            // Multiply is a*b: the source colour is multiplied by the destination colour.
            // The source side is expected to be precalculated so that an alpha of 0
            // produces a colour of (1,1,1), to account for transparency in the source.
            (Multiply, _)               => (Dst, Zero, Zero, One),

            // Screen is 1-(1-a)*(1-b), with (1-a) precalculated on the source side
            (Screen, _)                 => (OneMinusDst, One, Zero, One),
        };

        wgpu::BlendState {
            color: wgpu::BlendComponent { src_factor: src_rgb, dst_factor: dst_rgb, operation: wgpu::BlendOperation::Add },
            alpha: wgpu::BlendComponent { src_factor: src_alpha, dst_factor: dst_alpha, operation: wgpu::BlendOperation::Add },
        }
    }
}

///
/// The bind group layouts shared by every pipeline the renderer creates
///
/// The vertex set always has the same shape; the fragment set varies with the shader
/// features (which of the texture slots the shader declares).
///
pub struct BindGroupLayouts {
    vertex: wgpu::BindGroupLayout,
    fragment: Vec<wgpu::BindGroupLayout>,
    samplers: wgpu::BindGroupLayout,
}

impl BindGroupLayouts {
    pub fn new(device: &wgpu::Device) -> BindGroupLayouts {
        let vertex = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("vertex_inputs"),
            entries: &[
                GpuTransform::bind_group_layout_entry(),
                VertexStream::bind_group_layout_entry(),
                GpuTextureTransform::bind_group_layout_entry(),
            ],
        });

        let fragment = (0..(ALL_FEATURES + 1))
            .map(|features| {
                let mut entries = vec![];
                if features & INPUT_TEXTURE != 0 { entries.push(ColorTexture::bind_group_layout_entry()); }
                if features & ERASE_MASK != 0 { entries.push(EraseMask::bind_group_layout_entry()); }
                if features & CLIP_MASK != 0 { entries.push(ClipMask::bind_group_layout_entry()); }

                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("fragment_inputs"),
                    entries: &entries,
                })
            })
            .collect();

        let samplers = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("samplers"),
            entries: &[DefaultSampler::bind_group_layout_entry()],
        });

        BindGroupLayouts { vertex, fragment, samplers }
    }

    pub fn vertex(&self) -> &wgpu::BindGroupLayout {
        &self.vertex
    }

    pub fn fragment_for(&self, features: ShaderFeatures) -> &wgpu::BindGroupLayout {
        &self.fragment[(features & ALL_FEATURES) as usize]
    }

    pub fn samplers(&self) -> &wgpu::BindGroupLayout {
        &self.samplers
    }
}

///
/// Description of a render pipeline (used to create the pipeline and as a cache key)
///
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct PipelineConfiguration {
    /// The format of the texture this pipeline renders to
    pub texture_format: wgpu::TextureFormat,

    /// The sample count for this pipeline configuration
    pub sample_count: u32,

    /// The blend mode to use for this configuration
    pub blend_mode: BlendMode,

    /// True if the source alpha has been pre-multiplied into its components
    pub source_is_premultiplied: bool,

    /// The shader program to use
    pub shader: StandardShader,

    /// The texture slots the shader declares
    pub features: ShaderFeatures,
}

impl Default for PipelineConfiguration {
    fn default() -> PipelineConfiguration {
        PipelineConfiguration {
            texture_format:             DEFAULT_COLOR_FORMAT,
            sample_count:               1,
            blend_mode:                 BlendMode::SourceOver,
            source_is_premultiplied:    false,
            shader:                     StandardShader::Simple,
            features:                   NO_FEATURES,
        }
    }
}

impl PipelineConfiguration {
    ///
    /// Creates a default pipeline configuration for rendering to a target with the specified format
    ///
    pub fn for_target(texture_format: wgpu::TextureFormat) -> PipelineConfiguration {
        let mut pipeline_config = Self::default();
        pipeline_config.texture_format = texture_format;

        pipeline_config
    }

    ///
    /// The colour target state for this configuration
    ///
    pub fn color_target_state(&self) -> wgpu::ColorTargetState {
        wgpu::ColorTargetState {
            format: self.texture_format,
            blend: Some(self.blend_mode.to_blend_state(self.source_is_premultiplied)),
            write_mask: wgpu::ColorWrites::ALL,
        }
    }

    ///
    /// Creates the render pipeline for this configuration
    ///
    pub fn render_pipeline(&self, device: &wgpu::Device, shaders: &mut ShaderCache, layouts: &BindGroupLayouts) -> wgpu::RenderPipeline {
        let vertex_module = shaders.vertex_module(device);
        let fragment_module = shaders.fragment_module(device, self.shader, self.features);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("canvas_pipeline_layout"),
            bind_group_layouts: &[layouts.vertex(), layouts.fragment_for(self.features), layouts.samplers()],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("canvas_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &*vertex_module,
                entry_point: "main",
                // Vertices are fetched from the storage buffer in the vertex set
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &*fragment_module,
                entry_point: "main",
                targets: &[Some(self.color_target_state())],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                polygon_mode: wgpu::PolygonMode::Fill,
                front_face: wgpu::FrontFace::Ccw,
                strip_index_format: None,
                cull_mode: None,
                conservative: false,
                unclipped_depth: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: self.sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_over_uses_classic_alpha_blending() {
        let state = BlendMode::SourceOver.to_blend_state(false);

        assert_eq!(state.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(state.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
        assert_eq!(state.alpha.src_factor, wgpu::BlendFactor::One);
        assert_eq!(state.alpha.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
    }

    #[test]
    fn premultiplied_source_over_drops_the_source_alpha_factor() {
        let state = BlendMode::SourceOver.to_blend_state(true);

        assert_eq!(state.color.src_factor, wgpu::BlendFactor::One);
        assert_eq!(state.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
    }

    #[test]
    fn destination_out_subtracts_the_source_alpha() {
        let state = BlendMode::DestinationOut.to_blend_state(false);

        assert_eq!(state.color.src_factor, wgpu::BlendFactor::Zero);
        assert_eq!(state.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
    }

    #[test]
    fn multiply_multiplies_by_the_destination_colour() {
        let state = BlendMode::Multiply.to_blend_state(false);

        assert_eq!(state.color.src_factor, wgpu::BlendFactor::Dst);
        assert_eq!(state.color.dst_factor, wgpu::BlendFactor::Zero);
        assert_eq!(state.alpha.src_factor, wgpu::BlendFactor::Zero);
        assert_eq!(state.alpha.dst_factor, wgpu::BlendFactor::One);
    }

    #[test]
    fn premultiplication_only_changes_source_over() {
        for mode in [
            BlendMode::DestinationOver, BlendMode::SourceIn, BlendMode::DestinationIn,
            BlendMode::SourceOut, BlendMode::DestinationOut, BlendMode::SourceATop,
            BlendMode::DestinationATop, BlendMode::Multiply, BlendMode::Screen,
        ].iter() {
            assert_eq!(mode.to_blend_state(false), mode.to_blend_state(true));
        }
    }

    #[test]
    fn configurations_with_the_same_settings_are_the_same_cache_key() {
        let config_a = PipelineConfiguration::for_target(wgpu::TextureFormat::R8Unorm);
        let config_b = PipelineConfiguration::for_target(wgpu::TextureFormat::R8Unorm);
        let config_c = PipelineConfiguration::default();

        assert_eq!(config_a, config_b);
        assert_ne!(config_a, config_c);
    }
}

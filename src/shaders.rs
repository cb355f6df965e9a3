use crate::action::ShaderType;

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

///
/// The texture slots a shader variant declares, as a bitmask
///
pub type ShaderFeatures = u32;

pub const NO_FEATURES: ShaderFeatures = 0;

/// The shader reads the primary colour texture
pub const INPUT_TEXTURE: ShaderFeatures = 1 << 0;

/// The shader subtracts the erase mask from its output
pub const ERASE_MASK: ShaderFeatures = 1 << 1;

/// The shader clips its output to the clip mask
pub const CLIP_MASK: ShaderFeatures = 1 << 2;

pub const ALL_FEATURES: ShaderFeatures = INPUT_TEXTURE | ERASE_MASK | CLIP_MASK;

///
/// The shader programs that the renderer can load
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum StandardShader {
    /// Flat colour shader
    Simple,

    /// Colours fragments from a texture input
    Texture,

    /// Flat colour with 'dashed line' texturing using a dash pattern texture
    DashedLine,
}

impl Default for StandardShader {
    fn default() -> StandardShader {
        StandardShader::Simple
    }
}

impl StandardShader {
    ///
    /// The features every variant of this program uses
    ///
    pub fn base_features(self) -> ShaderFeatures {
        match self {
            StandardShader::Simple      => NO_FEATURES,
            StandardShader::Texture     => INPUT_TEXTURE,
            StandardShader::DashedLine  => INPUT_TEXTURE,
        }
    }
}

impl ShaderType {
    ///
    /// The shader program this shader type loads
    ///
    pub fn program(&self) -> StandardShader {
        match self {
            ShaderType::Simple { .. }       => StandardShader::Simple,
            ShaderType::Texture { .. }      => StandardShader::Texture,
            ShaderType::DashedLine { .. }   => StandardShader::DashedLine,
        }
    }

    ///
    /// The features the program needs for this shader type
    ///
    pub fn features(&self) -> ShaderFeatures {
        let (erase, clip) = match self {
            ShaderType::Simple { erase_texture, clip_texture }          => (erase_texture, clip_texture),
            ShaderType::Texture { erase_texture, clip_texture, .. }     => (erase_texture, clip_texture),
            ShaderType::DashedLine { erase_texture, clip_texture, .. }  => (erase_texture, clip_texture),
        };

        let mut features = self.program().base_features();
        if erase.is_some() { features |= ERASE_MASK; }
        if clip.is_some() { features |= CLIP_MASK; }

        features
    }
}

///
/// The source for the vertex shader shared by all of the shader programs
///
pub fn vertex_shader_source() -> &'static str {
    include_str!("shaders/canvas.vs.wgsl")
}

///
/// Assembles the fragment shader source for a shader program and a set of features
///
/// The sections carry their binding numbers as literals so that the shader-side half
/// of the binding contract stays reviewable as plain source.
///
pub fn fragment_shader_source(shader: StandardShader, features: ShaderFeatures) -> String {
    let features = shader.base_features() | (features & (ERASE_MASK | CLIP_MASK));
    let mut source = String::new();

    source.push_str(include_str!("shaders/fragment_common.wgsl"));

    source.push_str(if features & ERASE_MASK != 0 {
        include_str!("shaders/erase_mask.wgsl")
    } else {
        include_str!("shaders/no_erase_mask.wgsl")
    });

    source.push_str(if features & CLIP_MASK != 0 {
        include_str!("shaders/clip_mask.wgsl")
    } else {
        include_str!("shaders/no_clip_mask.wgsl")
    });

    source.push_str(match shader {
        StandardShader::Simple      => include_str!("shaders/simple.fs.wgsl"),
        StandardShader::Texture     => include_str!("shaders/texture.fs.wgsl"),
        StandardShader::DashedLine  => include_str!("shaders/dashed_line.fs.wgsl"),
    });

    source
}

///
/// Caches the compiled shader modules so that each variant is only compiled once
///
pub struct ShaderCache {
    vertex_module: Option<Arc<wgpu::ShaderModule>>,
    fragment_modules: HashMap<(StandardShader, ShaderFeatures), Arc<wgpu::ShaderModule>>,
}

impl ShaderCache {
    ///
    /// Creates an empty shader cache
    ///
    pub fn empty() -> ShaderCache {
        ShaderCache {
            vertex_module: None,
            fragment_modules: HashMap::new(),
        }
    }

    ///
    /// Retrieves the shared vertex shader module, compiling it on first use
    ///
    pub fn vertex_module(&mut self, device: &wgpu::Device) -> Arc<wgpu::ShaderModule> {
        if self.vertex_module.is_none() {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("canvas_vertex"),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(vertex_shader_source())),
            });

            self.vertex_module = Some(Arc::new(module));
        }

        Arc::clone(self.vertex_module.as_ref().unwrap())
    }

    ///
    /// Retrieves the fragment shader module for a variant, compiling it on first use
    ///
    pub fn fragment_module(&mut self, device: &wgpu::Device, shader: StandardShader, features: ShaderFeatures) -> Arc<wgpu::ShaderModule> {
        let features = shader.base_features() | (features & (ERASE_MASK | CLIP_MASK));

        let module = self.fragment_modules
            .entry((shader, features))
            .or_insert_with(|| {
                log::debug!("compiling fragment shader {:?} (features {:03b})", shader, features);

                let source = fragment_shader_source(shader, features);
                let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("canvas_fragment"),
                    source: wgpu::ShaderSource::Wgsl(Cow::Owned(source)),
                });

                Arc::new(module)
            });

        Arc::clone(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::TextureId;
    use crate::bindings::*;

    /// Parses `@group(G) @binding(B) var... name` declarations out of WGSL source
    fn declared_bindings(source: &str) -> HashMap<String, (u32, u32)> {
        let mut bindings = HashMap::new();

        for line in source.lines() {
            let line = line.trim();
            if !line.starts_with("@group(") {
                continue;
            }

            let group = number_after(line, "@group(");
            let binding = number_after(line, "@binding(");

            let after_var = line.split(" var").nth(1).expect("binding declarations declare a var").trim();
            let after_var = if after_var.starts_with('<') {
                // Skip an address space qualifier such as var<uniform> or var<storage, read>
                after_var.split('>').nth(1).unwrap()
            } else {
                after_var
            };
            let name = after_var.trim().split(':').next().unwrap().trim().to_string();

            bindings.insert(name, (group, binding));
        }

        bindings
    }

    fn number_after(line: &str, prefix: &str) -> u32 {
        line.split(prefix)
            .nth(1)
            .and_then(|rest| rest.split(')').next())
            .and_then(|digits| digits.parse().ok())
            .unwrap_or_else(|| panic!("malformed binding declaration: {}", line))
    }

    #[test]
    fn vertex_shader_declares_the_vertex_namespace() {
        let bindings = declared_bindings(vertex_shader_source());

        assert_eq!(bindings["transform"], (VERTEX_SET, VertexInputIndex::Matrix.binding()));
        assert_eq!(bindings["vertices"], (VERTEX_SET, VertexInputIndex::Vertices.binding()));
        assert_eq!(bindings["texture_transform"], (VERTEX_SET, VertexInputIndex::TextureMatrix.binding()));
    }

    #[test]
    fn fragment_shader_declares_the_fragment_namespace() {
        let source = fragment_shader_source(StandardShader::Texture, ERASE_MASK | CLIP_MASK);
        let bindings = declared_bindings(&source);

        assert_eq!(bindings["color_texture"], (FRAGMENT_SET, FragmentInputIndex::Texture.binding()));
        assert_eq!(bindings["erase_mask_texture"], (FRAGMENT_SET, FragmentInputIndex::EraseTexture.binding()));
        assert_eq!(bindings["clip_mask_texture"], (FRAGMENT_SET, FragmentInputIndex::ClipMaskTexture.binding()));
        assert_eq!(bindings["default_sampler"], (SAMPLER_SET, DEFAULT_SAMPLER));
    }

    #[test]
    fn dash_pattern_binds_at_the_texture_slot() {
        let source = fragment_shader_source(StandardShader::DashedLine, NO_FEATURES);
        let bindings = declared_bindings(&source);

        assert_eq!(bindings["dash_pattern_texture"], (FRAGMENT_SET, FragmentInputIndex::Texture.binding()));
    }

    #[test]
    fn mask_declarations_follow_the_features() {
        let with_masks = fragment_shader_source(StandardShader::Simple, ERASE_MASK | CLIP_MASK);
        assert!(with_masks.contains("erase_mask_texture"));
        assert!(with_masks.contains("clip_mask_texture"));

        let without_masks = fragment_shader_source(StandardShader::Simple, NO_FEATURES);
        assert!(!without_masks.contains("erase_mask_texture"));
        assert!(!without_masks.contains("clip_mask_texture"));

        // The stubs keep the body compiling either way
        assert!(without_masks.contains("fn erase_fade"));
        assert!(without_masks.contains("fn clip_fade"));
    }

    #[test]
    fn every_variant_assembles_each_section_exactly_once() {
        for shader in [StandardShader::Simple, StandardShader::Texture, StandardShader::DashedLine].iter() {
            for features in 0..(ALL_FEATURES + 1) {
                let source = fragment_shader_source(*shader, features);

                assert_eq!(source.matches("fn erase_fade").count(), 1);
                assert_eq!(source.matches("fn clip_fade").count(), 1);
                assert_eq!(source.matches("fn main").count(), 1);
            }
        }
    }

    #[test]
    fn shader_types_map_to_programs_and_features() {
        let shader = ShaderType::Simple { erase_texture: None, clip_texture: None };
        assert_eq!(shader.program(), StandardShader::Simple);
        assert_eq!(shader.features(), NO_FEATURES);

        let shader = ShaderType::Simple { erase_texture: Some(TextureId(1)), clip_texture: None };
        assert_eq!(shader.features(), ERASE_MASK);

        let shader = ShaderType::Texture { texture: TextureId(0), erase_texture: None, clip_texture: Some(TextureId(2)) };
        assert_eq!(shader.program(), StandardShader::Texture);
        assert_eq!(shader.features(), INPUT_TEXTURE | CLIP_MASK);

        let shader = ShaderType::DashedLine { dash_texture: TextureId(0), erase_texture: Some(TextureId(1)), clip_texture: Some(TextureId(2)) };
        assert_eq!(shader.features(), ALL_FEATURES);
    }
}

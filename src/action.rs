use crate::gpu_data::*;
use crate::pipeline::BlendMode;
use crate::transform2d::Matrix;

use std::ops::Range;
use std::sync::Arc;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexBufferId(pub usize);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexBufferId(pub usize);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureId(pub usize);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderTargetId(pub usize);

///
/// An RGBA colour with 8 bits per channel
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgba8(pub [u8; 4]);

///
/// The types of render target that can be created
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum RenderTargetType {
    /// A standard BGRA render target
    Standard,

    /// A single-channel render target, used for the erase and clip mask textures
    Monochrome,
}

///
/// The shaders that can be chosen for the renderer
///
#[derive(Clone, Copy, PartialEq, Debug, Hash)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum ShaderType {
    /// Flat colour shader
    /// The erase texture is subtracted from anything drawn, if present
    Simple { erase_texture: Option<TextureId>, clip_texture: Option<TextureId> },

    /// Colours fragments from a texture input
    Texture { texture: TextureId, erase_texture: Option<TextureId>, clip_texture: Option<TextureId> },

    /// Flat colour with 'dashed line' texturing using a dash pattern texture
    DashedLine { dash_texture: TextureId, erase_texture: Option<TextureId>, clip_texture: Option<TextureId> },
}

impl Default for ShaderType {
    fn default() -> ShaderType {
        ShaderType::Simple { erase_texture: None, clip_texture: None }
    }
}

///
/// Represents an action for a render target
///
#[derive(Clone, PartialEq, Debug)]
pub enum RenderAction {
    ///
    /// Sets the transformation matrix to use for future renderings
    ///
    SetTransform(Matrix),

    ///
    /// Sets the transformation applied to texture coordinates for future renderings
    ///
    SetTextureTransform(Matrix),

    ///
    /// Creates a vertex buffer with the specified 2D vertices in it (replacing any existing buffer)
    ///
    CreateVertex2DBuffer(VertexBufferId, Vec<Vertex2D>),

    ///
    /// Creates an index buffer with the specified 2D vertices in it (replacing any existing buffer)
    ///
    CreateIndexBuffer(IndexBufferId, Vec<u16>),

    ///
    /// Frees an existing vertex buffer
    ///
    FreeVertexBuffer(VertexBufferId),

    ///
    /// Frees an existing index buffer
    ///
    FreeIndexBuffer(IndexBufferId),

    ///
    /// Sets the blend mode for future drawing operations (SourceOver is the default)
    ///
    BlendMode(BlendMode),

    ///
    /// Creates a new render target of the specified size, as the specified texture
    ///
    CreateRenderTarget(RenderTargetId, TextureId, usize, usize, RenderTargetType),

    ///
    /// Frees up an existing render target
    ///
    FreeRenderTarget(RenderTargetId),

    ///
    /// Send future rendering instructions to the specified render target
    ///
    SelectRenderTarget(RenderTargetId),

    ///
    /// Send future rendering instructions to the main frame buffer
    ///
    RenderToFrameBuffer,

    ///
    /// Creates an 8-bit BGRA 2D texture of the specified size
    ///
    CreateTextureBgra(TextureId, usize, usize),

    ///
    /// Creates an 8-bit monochrome 2D texture of the specified size
    ///
    CreateTextureMono(TextureId, usize, usize),

    ///
    /// Given a region in a 2D texture and a set of bytes to write, updates the texture with those bytes
    ///
    WriteTextureData(TextureId, (usize, usize), (usize, usize), Arc<Vec<u8>>),

    ///
    /// Frees up an existing texture
    ///
    FreeTexture(TextureId),

    ///
    /// Clears the current render target to the specified colour
    ///
    Clear(Rgba8),

    ///
    /// Uses the specified shader
    ///
    UseShader(ShaderType),

    ///
    /// Renders triangles from a vertex buffer (with no texture)
    ///
    /// Parameters are the range of vertices to use
    ///
    DrawTriangles(VertexBufferId, Range<usize>),

    ///
    /// Renders triangles using an index buffer
    ///
    DrawIndexedTriangles(VertexBufferId, IndexBufferId, usize),
}

///
/// An enumeration of the types of possible render actions without their data (useful for logging and profiling)
///
#[derive(Copy, Clone, PartialEq, Debug, Eq, Hash)]
pub enum RenderActionType {
    SetTransform,
    SetTextureTransform,
    CreateVertex2DBuffer,
    CreateIndexBuffer,
    FreeVertexBuffer,
    FreeIndexBuffer,
    BlendMode,
    CreateRenderTarget,
    FreeRenderTarget,
    SelectRenderTarget,
    RenderToFrameBuffer,
    CreateTextureBgra,
    CreateTextureMono,
    WriteTextureData,
    FreeTexture,
    Clear,
    UseShader,
    DrawTriangles,
    DrawIndexedTriangles,
}

impl From<&RenderAction> for RenderActionType {
    fn from(render_action: &RenderAction) -> RenderActionType {
        match render_action {
            RenderAction::SetTransform(_)                   => RenderActionType::SetTransform,
            RenderAction::SetTextureTransform(_)            => RenderActionType::SetTextureTransform,
            RenderAction::CreateVertex2DBuffer(_, _)        => RenderActionType::CreateVertex2DBuffer,
            RenderAction::CreateIndexBuffer(_, _)           => RenderActionType::CreateIndexBuffer,
            RenderAction::FreeVertexBuffer(_)               => RenderActionType::FreeVertexBuffer,
            RenderAction::FreeIndexBuffer(_)                => RenderActionType::FreeIndexBuffer,
            RenderAction::BlendMode(_)                      => RenderActionType::BlendMode,
            RenderAction::CreateRenderTarget(_, _, _, _, _) => RenderActionType::CreateRenderTarget,
            RenderAction::FreeRenderTarget(_)               => RenderActionType::FreeRenderTarget,
            RenderAction::SelectRenderTarget(_)             => RenderActionType::SelectRenderTarget,
            RenderAction::RenderToFrameBuffer               => RenderActionType::RenderToFrameBuffer,
            RenderAction::CreateTextureBgra(_, _, _)        => RenderActionType::CreateTextureBgra,
            RenderAction::CreateTextureMono(_, _, _)        => RenderActionType::CreateTextureMono,
            RenderAction::WriteTextureData(_, _, _, _)      => RenderActionType::WriteTextureData,
            RenderAction::FreeTexture(_)                    => RenderActionType::FreeTexture,
            RenderAction::Clear(_)                          => RenderActionType::Clear,
            RenderAction::UseShader(_)                      => RenderActionType::UseShader,
            RenderAction::DrawTriangles(_, _)               => RenderActionType::DrawTriangles,
            RenderAction::DrawIndexedTriangles(_, _, _)     => RenderActionType::DrawIndexedTriangles,
        }
    }
}

impl Rgba8 {
    ///
    /// Converts this colour to the floating point representation used for clear operations
    ///
    pub fn to_wgpu_color(self) -> wgpu::Color {
        let Rgba8([r, g, b, a]) = self;

        wgpu::Color {
            r: (r as f64) / 255.0,
            g: (g as f64) / 255.0,
            b: (b as f64) / 255.0,
            a: (a as f64) / 255.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_types_strip_the_payload() {
        let action = RenderAction::DrawTriangles(VertexBufferId(3), 0..42);
        assert_eq!(RenderActionType::from(&action), RenderActionType::DrawTriangles);

        let action = RenderAction::Clear(Rgba8([0, 0, 0, 255]));
        assert_eq!(RenderActionType::from(&action), RenderActionType::Clear);
    }

    #[test]
    fn clear_colors_convert_to_unit_range() {
        let color = Rgba8([255, 0, 51, 255]).to_wgpu_color();

        assert!((color.r - 1.0).abs() < 1e-6);
        assert!((color.g - 0.0).abs() < 1e-6);
        assert!((color.b - 0.2).abs() < 1e-3);
        assert!((color.a - 1.0).abs() < 1e-6);
    }

    #[test]
    fn default_shader_is_simple_with_no_masks() {
        assert_eq!(ShaderType::default(), ShaderType::Simple { erase_texture: None, clip_texture: None });
    }
}

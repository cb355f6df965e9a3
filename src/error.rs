use crate::action::*;

use thiserror::Error;

///
/// Errors that can occur while setting up a device or executing render actions
///
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no compatible GPU adapter found")]
    NoCompatibleAdapter,

    #[error("failed to acquire a GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("failed to create a rendering surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    #[error("vertex buffer {0:?} is not allocated")]
    UnknownVertexBuffer(VertexBufferId),

    #[error("index buffer {0:?} is not allocated")]
    UnknownIndexBuffer(IndexBufferId),

    #[error("texture {0:?} is not allocated")]
    UnknownTexture(TextureId),

    #[error("render target {0:?} is not allocated")]
    UnknownRenderTarget(RenderTargetId),
}

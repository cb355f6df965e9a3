pub mod bindings;
mod action;
mod error;
mod gpu_data;
mod pipeline;
mod registry;
mod renderer;
mod shaders;
mod transform2d;

pub use action::*;
pub use error::*;
pub use gpu_data::*;
pub use pipeline::*;
pub use registry::*;
pub use renderer::*;
pub use shaders::*;
pub use transform2d::*;

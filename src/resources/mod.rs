//! GPU resource allocation and ownership
//!
//! - [`allocator`]: helpers creating textures of every supported shape
//! - [`defaults`]: the shared pool of placeholder resources
//! - [`RenderTexture`] / [`GpuBuffer`]: owned handles released on drop

pub mod allocator;
pub mod defaults;
mod texture;

pub use allocator::*;
pub use defaults::{DefaultResourcePool, DefaultResources, DefaultTextureKind, DefaultsLease};
pub use texture::*;

//! # RedLilium Atmosphere
//!
//! Renderer contract and GPU resource allocation for layered atmosphere
//! rendering.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`Renderer`] - Contract of a stage that owns named textures
//! - [`RendererRegistry`] - Stages that bind each other's outputs by name
//! - [`resources`] - Texture allocation helpers and the shared default pool
//! - [`binding`] - Material, compute and command binding contexts
//! - Backends: wgpu and Dummy (for testing)
//!
//! ## Example
//!
//! ```ignore
//! use redlilium_atmosphere::{DefaultResourcePool, RendererRegistry, SkyRenderer};
//!
//! let pool = Arc::new(DefaultResourcePool::new(backend));
//! let mut registry = RendererRegistry::new(pool.clone());
//! registry.register(Box::new(SkyRenderer::new(pool, SkyConfig::default())))?;
//! registry.build_all()?;
//! ```

pub mod backend;
pub mod binding;
pub mod error;
pub mod host;
pub mod renderer;
pub mod resources;
pub mod stages;

// Re-export main types for convenience
pub use backend::{BackendError, DummyBackend, GpuBackend, SharedBackend, TextureFormat};
pub use binding::{BindTarget, CommandRecorder, ComputeDispatch, MaterialPropertyBlock, PropertyId};
pub use error::{AllocationError, AllocationResult, StageError, StageResult};
pub use host::ReloadNotifier;
pub use renderer::{Renderer, RendererRegistry, TextureSet};
pub use resources::{DefaultResourcePool, DefaultTextureKind, RenderTexture, TextureOptions};
pub use stages::{
    AerialPerspectiveConfig, AerialPerspectiveRenderer, CloudConfig, CloudRenderer, SkyConfig,
    SkyRenderer,
};

/// Atmosphere library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the atmosphere subsystem.
pub fn init() {
    log::info!("RedLilium Atmosphere v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_dummy_backend() {
        let backend = DummyBackend::new();
        assert_eq!(backend.name(), "Dummy");
    }
}

//! Core backend abstraction traits
//!
//! The atmosphere layer never talks to a GPU API directly. Everything it needs
//! from the renderer goes through [`GpuBackend`].

use crate::backend::types::*;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

/// Backend error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Failed to initialize backend: {0}")]
    InitializationFailed(String),
    #[error("Failed to create texture: {0}")]
    TextureCreationFailed(String),
    #[error("Failed to create buffer: {0}")]
    BufferCreationFailed(String),
    #[error("Texture format {0:?} cannot be used for random write")]
    UnsupportedFormat(TextureFormat),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Unknown texture handle {0:?}")]
    UnknownTexture(TextureHandle),
    #[error("No active render target")]
    NoActiveRenderTarget,
    #[error("Out of memory")]
    OutOfMemory,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Handle to a GPU texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) u64);

/// Handle to a GPU buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub(crate) u64);

/// Backend shared by every stage and the default resource pool.
pub type SharedBackend = Arc<Mutex<dyn GpuBackend>>;

/// Primitives the atmosphere layer consumes from the host renderer.
///
/// All calls are made from the render thread in program order. Nothing here
/// waits for GPU completion.
pub trait GpuBackend: Send {
    /// Backend name for diagnostics
    fn name(&self) -> &str;

    /// Create a texture.
    ///
    /// The descriptor is already validated for non-zero extents; the backend
    /// still rejects formats or sizes it cannot honor.
    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle>;

    /// Destroy a texture. Unknown handles are ignored.
    fn destroy_texture(&mut self, texture: TextureHandle);

    /// Create a buffer
    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferHandle>;

    /// Destroy a buffer. Unknown handles are ignored.
    fn destroy_buffer(&mut self, buffer: BufferHandle);

    /// Currently active render target, if any
    fn active_render_target(&self) -> Option<TextureHandle>;

    /// Replace the active render target
    fn set_active_render_target(&mut self, target: Option<TextureHandle>);

    /// Clear the active render target to `color`, and its depth when requested.
    fn clear_active_render_target(
        &mut self,
        color: ClearColor,
        clear_depth: bool,
    ) -> BackendResult<()>;

    /// Number of textures created and not yet destroyed
    fn live_texture_count(&self) -> usize;

    /// Number of buffers created and not yet destroyed
    fn live_buffer_count(&self) -> usize;
}

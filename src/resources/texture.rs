//! Owned GPU textures and buffers

use glam::UVec3;

use crate::backend::*;

/// What a binding context stores when a texture is bound into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureBinding {
    pub handle: TextureHandle,
    pub dimension: TextureDimension,
    pub format: TextureFormat,
    pub resolution: UVec3,
}

/// A texture owned by whoever allocated it.
///
/// The backend texture is destroyed when this value is dropped or released.
pub struct RenderTexture {
    backend: SharedBackend,
    handle: TextureHandle,
    descriptor: TextureDescriptor,
}

impl RenderTexture {
    pub(crate) fn new(
        backend: SharedBackend,
        handle: TextureHandle,
        descriptor: TextureDescriptor,
    ) -> Self {
        Self {
            backend,
            handle,
            descriptor,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.label
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    pub fn dimension(&self) -> TextureDimension {
        self.descriptor.dimension
    }

    pub fn format(&self) -> TextureFormat {
        self.descriptor.format
    }

    /// Width, height and depth. Depth is the slice count for arrays and 1 for 2D.
    pub fn resolution(&self) -> UVec3 {
        self.descriptor.extent()
    }

    /// Number of array slices; 1 for 2D and 3D textures.
    pub fn slices(&self) -> u32 {
        if self.descriptor.dimension.is_layered() {
            self.descriptor.depth_or_layers
        } else {
            1
        }
    }

    pub fn mip_level_count(&self) -> u32 {
        self.descriptor.mip_level_count
    }

    pub fn use_mip_map(&self) -> bool {
        self.descriptor.use_mip_map
    }

    pub fn random_write(&self) -> bool {
        self.descriptor.random_write()
    }

    pub fn binding(&self) -> TextureBinding {
        TextureBinding {
            handle: self.handle,
            dimension: self.descriptor.dimension,
            format: self.descriptor.format,
            resolution: self.resolution(),
        }
    }

    /// Destroy the backend texture now.
    pub fn release(self) {
        drop(self)
    }
}

impl Drop for RenderTexture {
    fn drop(&mut self) {
        log::trace!("Releasing texture '{}'", self.descriptor.label);
        self.backend.lock().destroy_texture(self.handle);
    }
}

impl std::fmt::Debug for RenderTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderTexture")
            .field("name", &self.descriptor.label)
            .field("handle", &self.handle)
            .field("dimension", &self.descriptor.dimension)
            .field("format", &self.descriptor.format)
            .field("resolution", &self.resolution())
            .finish()
    }
}

/// A buffer owned by whoever allocated it.
pub struct GpuBuffer {
    backend: SharedBackend,
    handle: BufferHandle,
    descriptor: BufferDescriptor,
}

impl GpuBuffer {
    pub(crate) fn new(
        backend: SharedBackend,
        handle: BufferHandle,
        descriptor: BufferDescriptor,
    ) -> Self {
        Self {
            backend,
            handle,
            descriptor,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.label
    }

    pub fn handle(&self) -> BufferHandle {
        self.handle
    }

    pub fn element_count(&self) -> u64 {
        self.descriptor.element_count
    }

    pub fn stride(&self) -> u64 {
        self.descriptor.stride
    }

    pub fn release(self) {
        drop(self)
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        log::trace!("Releasing buffer '{}'", self.descriptor.label);
        self.backend.lock().destroy_buffer(self.handle);
    }
}

impl std::fmt::Debug for GpuBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuBuffer")
            .field("name", &self.descriptor.label)
            .field("handle", &self.handle)
            .field("size", &self.descriptor.size())
            .finish()
    }
}

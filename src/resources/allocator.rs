//! Texture allocation helpers
//!
//! Every texture allocated here is random-write capable so compute passes can
//! fill it, and never has its mip chain generated automatically. When mips
//! are requested the caller is responsible for populating them.

use std::sync::Arc;

use glam::{UVec2, UVec3};

use crate::backend::*;
use crate::error::{AllocationError, AllocationResult};
use crate::resources::{GpuBuffer, RenderTexture};

/// Number of faces backing an emulated cubemap.
pub const CUBE_FACE_COUNT: u32 = 6;

/// Default format of single-channel textures
pub const MONOCHROME_FORMAT: TextureFormat = TextureFormat::R16Float;

/// Default format of four-channel textures
pub const RGBA_FORMAT: TextureFormat = TextureFormat::Rgba16Float;

/// Optional parameters shared by all allocation helpers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextureOptions {
    /// Allocate a full mip chain. Mips are never generated automatically.
    pub use_mip_map: bool,
    /// Override the helper's default format.
    pub format: Option<TextureFormat>,
}

impl TextureOptions {
    pub fn with_mip_map(mut self, use_mip_map: bool) -> Self {
        self.use_mip_map = use_mip_map;
        self
    }

    pub fn with_format(mut self, format: TextureFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// Number of thread groups needed to cover `resolution` elements.
///
/// A partially filled trailing group still counts.
pub fn compute_groups(resolution: u32, threads_per_group: u32) -> u32 {
    debug_assert!(threads_per_group > 0, "thread group size must be non-zero");
    resolution.div_ceil(threads_per_group.max(1))
}

/// Thread groups needed to cover a 3D domain.
pub fn compute_groups_3d(resolution: UVec3, threads_per_group: UVec3) -> UVec3 {
    UVec3::new(
        compute_groups(resolution.x, threads_per_group.x),
        compute_groups(resolution.y, threads_per_group.y),
        compute_groups(resolution.z, threads_per_group.z),
    )
}

/// Length of a full mip chain for the given extents.
fn full_mip_chain(largest: u32) -> u32 {
    32 - largest.max(1).leading_zeros()
}

fn allocate(
    backend: &SharedBackend,
    name: &str,
    dimension: TextureDimension,
    extent: UVec3,
    format: TextureFormat,
    use_mip_map: bool,
) -> AllocationResult<RenderTexture> {
    if extent.min_element() == 0 {
        return Err(AllocationError::InvalidResolution {
            name: name.to_string(),
            resolution: extent,
        });
    }

    let largest = match dimension {
        TextureDimension::D3 => extent.max_element(),
        _ => extent.x.max(extent.y),
    };
    let descriptor = TextureDescriptor {
        label: name.to_string(),
        width: extent.x,
        height: extent.y,
        depth_or_layers: extent.z,
        dimension,
        format,
        mip_level_count: if use_mip_map { full_mip_chain(largest) } else { 1 },
        use_mip_map,
        auto_generate_mips: false,
        usage: TextureUsage::STORAGE_BINDING
            | TextureUsage::TEXTURE_BINDING
            | TextureUsage::COPY_SRC
            | TextureUsage::COPY_DST,
    };

    let handle = backend
        .lock()
        .create_texture(&descriptor)
        .map_err(|source| AllocationError::Backend {
            name: name.to_string(),
            source,
        })?;

    log::trace!(
        "Allocated {:?} texture '{}' {} ({:?}, {} mips)",
        dimension,
        name,
        extent,
        format,
        descriptor.mip_level_count
    );
    Ok(RenderTexture::new(Arc::clone(backend), handle, descriptor))
}

/// Single-channel 2D texture, `R16Float` unless overridden.
pub fn create_monochrome_2d(
    backend: &SharedBackend,
    name: &str,
    resolution: UVec2,
    options: TextureOptions,
) -> AllocationResult<RenderTexture> {
    allocate(
        backend,
        name,
        TextureDimension::D2,
        resolution.extend(1),
        options.format.unwrap_or(MONOCHROME_FORMAT),
        options.use_mip_map,
    )
}

/// Four-channel 2D texture, `Rgba16Float` unless overridden.
pub fn create_rgba_2d(
    backend: &SharedBackend,
    name: &str,
    resolution: UVec2,
    options: TextureOptions,
) -> AllocationResult<RenderTexture> {
    allocate(
        backend,
        name,
        TextureDimension::D2,
        resolution.extend(1),
        options.format.unwrap_or(RGBA_FORMAT),
        options.use_mip_map,
    )
}

pub fn create_monochrome_3d(
    backend: &SharedBackend,
    name: &str,
    resolution: UVec3,
    options: TextureOptions,
) -> AllocationResult<RenderTexture> {
    allocate(
        backend,
        name,
        TextureDimension::D3,
        resolution,
        options.format.unwrap_or(MONOCHROME_FORMAT),
        options.use_mip_map,
    )
}

pub fn create_rgba_3d(
    backend: &SharedBackend,
    name: &str,
    resolution: UVec3,
    options: TextureOptions,
) -> AllocationResult<RenderTexture> {
    allocate(
        backend,
        name,
        TextureDimension::D3,
        resolution,
        options.format.unwrap_or(RGBA_FORMAT),
        options.use_mip_map,
    )
}

/// Single-channel 2D array. A slice count of zero still allocates one slice.
pub fn create_monochrome_2d_array(
    backend: &SharedBackend,
    name: &str,
    resolution: UVec2,
    slices: u32,
    options: TextureOptions,
) -> AllocationResult<RenderTexture> {
    allocate(
        backend,
        name,
        TextureDimension::D2Array,
        resolution.extend(slices.max(1)),
        options.format.unwrap_or(MONOCHROME_FORMAT),
        options.use_mip_map,
    )
}

/// Four-channel 2D array. A slice count of zero still allocates one slice.
pub fn create_rgba_2d_array(
    backend: &SharedBackend,
    name: &str,
    resolution: UVec2,
    slices: u32,
    options: TextureOptions,
) -> AllocationResult<RenderTexture> {
    allocate(
        backend,
        name,
        TextureDimension::D2Array,
        resolution.extend(slices.max(1)),
        options.format.unwrap_or(RGBA_FORMAT),
        options.use_mip_map,
    )
}

/// Single-channel cubemap backed by a six-layer 2D array.
///
/// Mips are always allocated so faces can be sampled with filtering;
/// `options.use_mip_map` is ignored.
pub fn create_monochrome_cubemap(
    backend: &SharedBackend,
    name: &str,
    resolution: UVec2,
    options: TextureOptions,
) -> AllocationResult<RenderTexture> {
    allocate(
        backend,
        name,
        TextureDimension::EmulatedCube,
        resolution.extend(CUBE_FACE_COUNT),
        options.format.unwrap_or(MONOCHROME_FORMAT),
        true,
    )
}

/// Four-channel cubemap backed by a six-layer 2D array, mips always on.
pub fn create_rgba_cubemap(
    backend: &SharedBackend,
    name: &str,
    resolution: UVec2,
    options: TextureOptions,
) -> AllocationResult<RenderTexture> {
    allocate(
        backend,
        name,
        TextureDimension::EmulatedCube,
        resolution.extend(CUBE_FACE_COUNT),
        options.format.unwrap_or(RGBA_FORMAT),
        true,
    )
}

/// Structured buffer of `element_count` elements of `stride` bytes.
pub fn create_buffer(
    backend: &SharedBackend,
    name: &str,
    element_count: u64,
    stride: u64,
) -> AllocationResult<GpuBuffer> {
    let descriptor = BufferDescriptor {
        label: name.to_string(),
        element_count,
        stride,
        usage: BufferUsage::STORAGE | BufferUsage::COPY_DST,
    };
    let handle = backend
        .lock()
        .create_buffer(&descriptor)
        .map_err(|source| AllocationError::Backend {
            name: name.to_string(),
            source,
        })?;
    Ok(GpuBuffer::new(Arc::clone(backend), handle, descriptor))
}

/// Clear `texture` through the backend's active render target slot.
///
/// The previously active target is restored afterwards, even if the clear fails.
pub fn clear_texture(
    backend: &SharedBackend,
    texture: &RenderTexture,
    color: ClearColor,
) -> BackendResult<()> {
    let mut backend = backend.lock();
    let previous = backend.active_render_target();
    backend.set_active_render_target(Some(texture.handle()));
    let result = backend.clear_active_render_target(color, true);
    backend.set_active_render_target(previous);
    result
}

pub fn clear_to_white(backend: &SharedBackend, texture: &RenderTexture) -> BackendResult<()> {
    clear_texture(backend, texture, ClearColor::WHITE)
}

pub fn clear_to_black(backend: &SharedBackend, texture: &RenderTexture) -> BackendResult<()> {
    clear_texture(backend, texture, ClearColor::BLACK)
}

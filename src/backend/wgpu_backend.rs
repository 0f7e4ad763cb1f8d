//! wgpu implementation of [`GpuBackend`]
//!
//! Used either headless (tests, offline baking) or on top of a device the
//! host renderer already owns.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::backend::traits::*;
use crate::backend::types::*;

struct WgpuTexture {
    texture: wgpu::Texture,
    desc: TextureDescriptor,
}

/// wgpu backend
pub struct WgpuBackend {
    adapter: Arc<wgpu::Adapter>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    textures: FxHashMap<u64, WgpuTexture>,
    buffers: FxHashMap<u64, wgpu::Buffer>,
    next_id: u64,
    active_target: Option<TextureHandle>,
}

impl WgpuBackend {
    /// Create a backend on an adapter without a surface.
    pub fn new_headless() -> BackendResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        }))
        .ok_or_else(|| BackendError::InitializationFailed("no suitable adapter".into()))?;

        // Half-float single channel storage needs adapter specific format features
        let required_features =
            adapter.features() & wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Atmosphere Device"),
                required_features,
                required_limits: adapter.limits(),
            },
            None,
        ))
        .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        log::info!("WgpuBackend: using adapter {:?}", adapter.get_info().name);

        Ok(Self::from_device(
            Arc::new(adapter),
            Arc::new(device),
            Arc::new(queue),
        ))
    }

    /// Wrap a device owned by the host renderer.
    pub fn from_device(
        adapter: Arc<wgpu::Adapter>,
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
    ) -> Self {
        Self {
            adapter,
            device,
            queue,
            textures: FxHashMap::default(),
            buffers: FxHashMap::default(),
            next_id: 1,
            active_target: None,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Underlying wgpu texture for a handle.
    pub fn texture(&self, texture: TextureHandle) -> Option<&wgpu::Texture> {
        self.textures.get(&texture.0).map(|t| &t.texture)
    }

    /// Underlying wgpu buffer for a handle.
    pub fn buffer(&self, buffer: BufferHandle) -> Option<&wgpu::Buffer> {
        self.buffers.get(&buffer.0)
    }

    /// Create a view matching the texture's dimension.
    pub fn create_view(&self, texture: TextureHandle) -> Option<wgpu::TextureView> {
        let entry = self.textures.get(&texture.0)?;
        let dimension = match entry.desc.dimension {
            TextureDimension::D2 => wgpu::TextureViewDimension::D2,
            TextureDimension::D3 => wgpu::TextureViewDimension::D3,
            TextureDimension::D2Array | TextureDimension::EmulatedCube => {
                wgpu::TextureViewDimension::D2Array
            }
        };
        Some(entry.texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(entry.desc.label.as_str()),
            dimension: Some(dimension),
            ..Default::default()
        }))
    }

    fn convert_texture_format(format: TextureFormat) -> wgpu::TextureFormat {
        match format {
            TextureFormat::R8Unorm => wgpu::TextureFormat::R8Unorm,
            TextureFormat::R16Float => wgpu::TextureFormat::R16Float,
            TextureFormat::R32Float => wgpu::TextureFormat::R32Float,
            TextureFormat::Rg16Float => wgpu::TextureFormat::Rg16Float,
            TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            TextureFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
            TextureFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
        }
    }

    fn convert_texture_usage(usage: TextureUsage) -> wgpu::TextureUsages {
        let mut result = wgpu::TextureUsages::empty();
        if usage.contains(TextureUsage::COPY_SRC) {
            result |= wgpu::TextureUsages::COPY_SRC;
        }
        if usage.contains(TextureUsage::COPY_DST) {
            result |= wgpu::TextureUsages::COPY_DST;
        }
        if usage.contains(TextureUsage::TEXTURE_BINDING) {
            result |= wgpu::TextureUsages::TEXTURE_BINDING;
        }
        if usage.contains(TextureUsage::STORAGE_BINDING) {
            result |= wgpu::TextureUsages::STORAGE_BINDING;
        }
        if usage.contains(TextureUsage::RENDER_ATTACHMENT) {
            result |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }
        result
    }

    fn convert_buffer_usage(usage: BufferUsage) -> wgpu::BufferUsages {
        let mut result = wgpu::BufferUsages::empty();
        if usage.contains(BufferUsage::COPY_SRC) {
            result |= wgpu::BufferUsages::COPY_SRC;
        }
        if usage.contains(BufferUsage::COPY_DST) {
            result |= wgpu::BufferUsages::COPY_DST;
        }
        if usage.contains(BufferUsage::UNIFORM) {
            result |= wgpu::BufferUsages::UNIFORM;
        }
        if usage.contains(BufferUsage::STORAGE) {
            result |= wgpu::BufferUsages::STORAGE;
        }
        result
    }

    /// Run `create` inside validation and out-of-memory error scopes.
    fn scoped<T>(&self, create: impl FnOnce(&wgpu::Device) -> T) -> Result<T, wgpu::Error> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create(&self.device);
        let validation = pollster::block_on(self.device.pop_error_scope());
        let oom = pollster::block_on(self.device.pop_error_scope());
        match validation.or(oom) {
            Some(error) => Err(error),
            None => Ok(value),
        }
    }

    fn next_handle(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl GpuBackend for WgpuBackend {
    fn name(&self) -> &str {
        "wgpu"
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle> {
        let format = Self::convert_texture_format(desc.format);
        let usage = Self::convert_texture_usage(desc.usage);

        let allowed = self.adapter.get_texture_format_features(format).allowed_usages;
        if !allowed.contains(usage) {
            return Err(BackendError::UnsupportedFormat(desc.format));
        }

        let dimension = match desc.dimension {
            TextureDimension::D3 => wgpu::TextureDimension::D3,
            _ => wgpu::TextureDimension::D2,
        };

        let texture = self
            .scoped(|device| {
                device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(desc.label.as_str()),
                    size: wgpu::Extent3d {
                        width: desc.width,
                        height: desc.height,
                        depth_or_array_layers: desc.depth_or_layers,
                    },
                    mip_level_count: desc.mip_level_count,
                    sample_count: 1,
                    dimension,
                    format,
                    usage,
                    view_formats: &[],
                })
            })
            .map_err(|e| match e {
                wgpu::Error::OutOfMemory { .. } => BackendError::OutOfMemory,
                other => BackendError::TextureCreationFailed(other.to_string()),
            })?;

        let id = self.next_handle();
        log::trace!("WgpuBackend: created texture '{}'", desc.label);
        self.textures.insert(
            id,
            WgpuTexture {
                texture,
                desc: desc.clone(),
            },
        );
        Ok(TextureHandle(id))
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        if let Some(entry) = self.textures.remove(&texture.0) {
            log::trace!("WgpuBackend: destroying texture '{}'", entry.desc.label);
            entry.texture.destroy();
        }
        if self.active_target == Some(texture) {
            self.active_target = None;
        }
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferHandle> {
        let buffer = self
            .scoped(|device| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(desc.label.as_str()),
                    size: desc.size(),
                    usage: Self::convert_buffer_usage(desc.usage),
                    mapped_at_creation: false,
                })
            })
            .map_err(|e| match e {
                wgpu::Error::OutOfMemory { .. } => BackendError::OutOfMemory,
                other => BackendError::BufferCreationFailed(other.to_string()),
            })?;

        let id = self.next_handle();
        self.buffers.insert(id, buffer);
        Ok(BufferHandle(id))
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        if let Some(buffer) = self.buffers.remove(&buffer.0) {
            buffer.destroy();
        }
    }

    fn active_render_target(&self) -> Option<TextureHandle> {
        self.active_target
    }

    fn set_active_render_target(&mut self, target: Option<TextureHandle>) {
        self.active_target = target;
    }

    fn clear_active_render_target(
        &mut self,
        color: ClearColor,
        _clear_depth: bool,
    ) -> BackendResult<()> {
        // Atmosphere targets carry no depth aspect, so only color is written.
        let target = self.active_target.ok_or(BackendError::NoActiveRenderTarget)?;
        let entry = self
            .textures
            .get(&target.0)
            .ok_or(BackendError::UnknownTexture(target))?;
        if !entry.desc.usage.contains(TextureUsage::COPY_DST) {
            return Err(BackendError::InvalidParameter(format!(
                "texture '{}' cannot be written",
                entry.desc.label
            )));
        }

        let texel = entry.desc.format.encode_color(color);
        for level in 0..entry.desc.mip_level_count {
            let extent = entry.desc.mip_extent(level);
            let data = texel.repeat(entry.desc.mip_texel_count(level));
            self.queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &entry.texture,
                    mip_level: level,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &data,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(extent.x * entry.desc.format.block_size()),
                    rows_per_image: Some(extent.y),
                },
                wgpu::Extent3d {
                    width: extent.x,
                    height: extent.y,
                    depth_or_array_layers: extent.z,
                },
            );
        }
        Ok(())
    }

    fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("textures", &self.textures.len())
            .field("buffers", &self.buffers.len())
            .field("active_target", &self.active_target)
            .finish_non_exhaustive()
    }
}

//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't perform actual GPU operations. It keeps the
//! descriptors of everything alive so tests can inspect allocations, and it
//! can be told to reject formats, sizes or further allocations so failure
//! paths can be exercised without GPU hardware.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::backend::traits::*;
use crate::backend::types::*;

/// A clear issued against the active render target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedClear {
    pub target: TextureHandle,
    pub color: ClearColor,
    pub clear_depth: bool,
}

/// Dummy GPU backend.
#[derive(Debug)]
pub struct DummyBackend {
    textures: FxHashMap<u64, TextureDescriptor>,
    buffers: FxHashMap<u64, BufferDescriptor>,
    next_id: u64,
    active_target: Option<TextureHandle>,
    clears: Vec<RecordedClear>,
    unsupported_formats: FxHashSet<TextureFormat>,
    max_texture_dimension: u32,
    allocation_budget: Option<usize>,
    total_texture_allocations: usize,
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self {
            textures: FxHashMap::default(),
            buffers: FxHashMap::default(),
            next_id: 1,
            active_target: None,
            clears: Vec::new(),
            unsupported_formats: FxHashSet::default(),
            max_texture_dimension: 16384,
            allocation_budget: None,
            total_texture_allocations: 0,
        }
    }

    /// Reject random-write textures of `format`.
    pub fn with_unsupported_format(mut self, format: TextureFormat) -> Self {
        self.unsupported_formats.insert(format);
        self
    }

    /// Reject textures with any extent larger than `max`.
    pub fn with_max_texture_dimension(mut self, max: u32) -> Self {
        self.max_texture_dimension = max;
        self
    }

    /// Report out-of-memory once `count` more textures have been created.
    pub fn with_allocation_budget(mut self, count: usize) -> Self {
        self.allocation_budget = Some(count);
        self
    }

    /// Descriptor of a live texture.
    pub fn texture_descriptor(&self, texture: TextureHandle) -> Option<&TextureDescriptor> {
        self.textures.get(&texture.0)
    }

    /// Descriptor of a live buffer.
    pub fn buffer_descriptor(&self, buffer: BufferHandle) -> Option<&BufferDescriptor> {
        self.buffers.get(&buffer.0)
    }

    pub fn is_texture_live(&self, texture: TextureHandle) -> bool {
        self.textures.contains_key(&texture.0)
    }

    /// Labels of all live textures, sorted.
    pub fn live_texture_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.textures.values().map(|d| d.label.clone()).collect();
        labels.sort();
        labels
    }

    /// Every clear issued so far, oldest first.
    pub fn clears(&self) -> &[RecordedClear] {
        &self.clears
    }

    /// Total number of textures ever created.
    pub fn total_texture_allocations(&self) -> usize {
        self.total_texture_allocations
    }

    fn next_handle(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for DummyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &str {
        "Dummy"
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle> {
        if desc.random_write() && self.unsupported_formats.contains(&desc.format) {
            return Err(BackendError::UnsupportedFormat(desc.format));
        }

        let largest = desc.width.max(desc.height).max(desc.depth_or_layers);
        if largest > self.max_texture_dimension {
            return Err(BackendError::InvalidParameter(format!(
                "texture '{}' extent {} exceeds maximum {}",
                desc.label, largest, self.max_texture_dimension
            )));
        }

        if let Some(budget) = self.allocation_budget.as_mut() {
            if *budget == 0 {
                return Err(BackendError::OutOfMemory);
            }
            *budget -= 1;
        }

        let id = self.next_handle();
        log::trace!(
            "DummyBackend: creating texture '{}' ({}x{}x{}, {:?}, {:?})",
            desc.label,
            desc.width,
            desc.height,
            desc.depth_or_layers,
            desc.dimension,
            desc.format
        );
        self.textures.insert(id, desc.clone());
        self.total_texture_allocations += 1;
        Ok(TextureHandle(id))
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        if let Some(desc) = self.textures.remove(&texture.0) {
            log::trace!("DummyBackend: destroying texture '{}'", desc.label);
        }
        if self.active_target == Some(texture) {
            self.active_target = None;
        }
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferHandle> {
        if desc.size() == 0 {
            return Err(BackendError::BufferCreationFailed(format!(
                "buffer '{}' has zero size",
                desc.label
            )));
        }

        let id = self.next_handle();
        log::trace!(
            "DummyBackend: creating buffer '{}' (size: {})",
            desc.label,
            desc.size()
        );
        self.buffers.insert(id, desc.clone());
        Ok(BufferHandle(id))
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        if let Some(desc) = self.buffers.remove(&buffer.0) {
            log::trace!("DummyBackend: destroying buffer '{}'", desc.label);
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
        clear_depth: bool,
    ) -> BackendResult<()> {
        let target = self.active_target.ok_or(BackendError::NoActiveRenderTarget)?;
        if !self.textures.contains_key(&target.0) {
            return Err(BackendError::UnknownTexture(target));
        }
        self.clears.push(RecordedClear {
            target,
            color,
            clear_depth,
        });
        Ok(())
    }

    fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }
}

//! Shared placeholder resources
//!
//! Stages that bind an optional dependency need something valid to bind when
//! the dependency is missing. [`DefaultResourcePool`] keeps one 1×1 texture of
//! each dimension plus a minimal buffer alive for as long as at least one
//! consumer holds an acquisition.
//!
//! The pool is an explicit service object: create one per backend and hand an
//! `Arc` of it to every stage that needs it.

use std::sync::{Arc, Weak};

use glam::{UVec2, UVec3};
use parking_lot::Mutex;

use crate::backend::{BufferHandle, SharedBackend};
use crate::binding::{BindTarget, PropertyId};
use crate::error::{AllocationResult, StageError, StageResult};
use crate::host::ReloadNotifier;
use crate::resources::allocator::{
    create_buffer, create_rgba_2d, create_rgba_3d, create_rgba_cubemap, TextureOptions,
};
use crate::resources::{GpuBuffer, RenderTexture, TextureBinding};

/// Which placeholder texture to bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultTextureKind {
    Cube,
    Texture2d,
    Texture3d,
}

/// The four placeholder resources of a live pool.
#[derive(Debug)]
pub struct DefaultResources {
    pub cube: RenderTexture,
    pub texture_2d: RenderTexture,
    pub texture_3d: RenderTexture,
    pub buffer: GpuBuffer,
}

impl DefaultResources {
    fn allocate(backend: &SharedBackend) -> AllocationResult<Self> {
        let options = TextureOptions::default();
        Ok(Self {
            cube: create_rgba_cubemap(backend, "default_cube", UVec2::ONE, options)?,
            texture_2d: create_rgba_2d(backend, "default_texture_2d", UVec2::ONE, options)?,
            texture_3d: create_rgba_3d(backend, "default_texture_3d", UVec3::ONE, options)?,
            buffer: create_buffer(backend, "default_buffer", 1, 4)?,
        })
    }

    pub fn texture(&self, kind: DefaultTextureKind) -> &RenderTexture {
        match kind {
            DefaultTextureKind::Cube => &self.cube,
            DefaultTextureKind::Texture2d => &self.texture_2d,
            DefaultTextureKind::Texture3d => &self.texture_3d,
        }
    }
}

#[derive(Debug, Default)]
struct PoolState {
    ref_count: u32,
    /// Bumped whenever the pool is forcibly emptied, so leases taken before
    /// the reset do not release acquisitions made after it.
    generation: u64,
    resources: Option<DefaultResources>,
}

/// Reference-counted pool of placeholder resources.
///
/// Resources exist exactly while the reference count is above zero.
pub struct DefaultResourcePool {
    backend: SharedBackend,
    state: Mutex<PoolState>,
}

impl DefaultResourcePool {
    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            state: Mutex::new(PoolState::default()),
        }
    }

    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    pub fn ref_count(&self) -> u32 {
        self.state.lock().ref_count
    }

    pub fn is_live(&self) -> bool {
        self.state.lock().resources.is_some()
    }

    /// Number of host reloads and failed reallocations so far.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Register one consumer, allocating the resources on the first one.
    ///
    /// On failure the count is left unchanged.
    pub fn acquire(&self) -> AllocationResult<()> {
        let mut state = self.state.lock();
        self.acquire_locked(&mut state).map(|_| ())
    }

    /// Count one acquisition and return the generation it belongs to.
    fn acquire_locked(&self, state: &mut PoolState) -> AllocationResult<u64> {
        if state.ref_count == 0 {
            // Anything left over from before a context loss is dropped first.
            state.resources = None;
            state.resources = Some(DefaultResources::allocate(&self.backend)?);
            log::info!("Default resources allocated");
        }
        state.ref_count += 1;
        log::trace!("Default resources acquired (count {})", state.ref_count);
        Ok(state.generation)
    }

    /// Unregister one consumer, releasing the resources after the last one.
    ///
    /// Releasing an empty pool does nothing.
    pub fn release(&self) {
        let mut state = self.state.lock();
        Self::release_locked(&mut state);
    }

    fn release_locked(state: &mut PoolState) {
        if state.ref_count == 0 {
            log::warn!("Default resources released more often than acquired");
            return;
        }
        state.ref_count -= 1;
        log::trace!("Default resources released (count {})", state.ref_count);
        if state.ref_count == 0 {
            state.resources = None;
            log::info!("Default resources destroyed");
        }
    }

    /// Reallocate the resources of a live pool without touching the count.
    ///
    /// Call after the host context was reset and old handles may be stale.
    /// Does nothing when the pool is not live.
    pub fn ensure_live(&self) -> AllocationResult<()> {
        let mut state = self.state.lock();
        if state.ref_count == 0 {
            return Ok(());
        }
        state.resources = None;
        match DefaultResources::allocate(&self.backend) {
            Ok(resources) => {
                state.resources = Some(resources);
                log::debug!("Default resources reallocated");
                Ok(())
            }
            Err(err) => {
                // Without resources the pool cannot claim to be live.
                state.ref_count = 0;
                state.generation += 1;
                Err(err)
            }
        }
    }

    /// Drop every resource and forget all acquisitions.
    ///
    /// Run when the host is about to discard all GPU state. Consumers that
    /// still hold a [`DefaultsLease`] from before the reset release nothing.
    pub fn reset_for_reload(&self) {
        let mut state = self.state.lock();
        if state.ref_count > 0 {
            log::info!(
                "Host reload: dropping default resources ({} holders)",
                state.ref_count
            );
        }
        state.ref_count = 0;
        state.generation += 1;
        state.resources = None;
    }

    /// Install [`Self::reset_for_reload`] on the host's reload notification.
    pub fn register_reload_handler(self: &Arc<Self>, notifier: &mut ReloadNotifier) {
        let pool: Weak<Self> = Arc::downgrade(self);
        notifier.register(move || {
            if let Some(pool) = pool.upgrade() {
                pool.reset_for_reload();
            }
        });
    }

    /// Acquire the pool for the lifetime of the returned lease.
    pub fn lease(self: &Arc<Self>) -> AllocationResult<DefaultsLease> {
        let generation = {
            let mut state = self.state.lock();
            self.acquire_locked(&mut state)?
        };
        Ok(DefaultsLease {
            pool: Arc::clone(self),
            generation,
        })
    }

    /// Binding of a placeholder texture, if the pool is live.
    pub fn texture_binding(&self, kind: DefaultTextureKind) -> Option<TextureBinding> {
        self.state
            .lock()
            .resources
            .as_ref()
            .map(|r| r.texture(kind).binding())
    }

    /// Handle of the placeholder buffer, if the pool is live.
    pub fn buffer_handle(&self) -> Option<BufferHandle> {
        self.state.lock().resources.as_ref().map(|r| r.buffer.handle())
    }

    /// Bind a placeholder texture into `target`.
    pub fn bind_default(
        &self,
        kind: DefaultTextureKind,
        variable: PropertyId,
        mut target: BindTarget<'_>,
    ) -> StageResult<()> {
        let binding = self
            .texture_binding(kind)
            .ok_or(StageError::DefaultsUnavailable)?;
        target.set_texture(variable, binding);
        Ok(())
    }
}

impl std::fmt::Debug for DefaultResourcePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DefaultResourcePool")
            .field("ref_count", &state.ref_count)
            .field("generation", &state.generation)
            .field("live", &state.resources.is_some())
            .finish()
    }
}

/// One acquisition of a [`DefaultResourcePool`], released on drop.
#[derive(Debug)]
pub struct DefaultsLease {
    pool: Arc<DefaultResourcePool>,
    generation: u64,
}

impl DefaultsLease {
    pub fn pool(&self) -> &Arc<DefaultResourcePool> {
        &self.pool
    }

    /// Pool generation this acquisition was counted in.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for DefaultsLease {
    fn drop(&mut self) {
        let mut state = self.pool.state.lock();
        if state.generation == self.generation {
            DefaultResourcePool::release_locked(&mut state);
        } else {
            log::debug!("Dropping lease from before a host reload");
        }
    }
}

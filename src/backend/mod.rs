//! Backend abstraction layer
//!
//! Provides the primitives the atmosphere layer needs from the host renderer.
//!
//! # Available Backends
//!
//! - [`DummyBackend`]: no-op backend for testing and development
//! - `WgpuBackend` (feature `wgpu-backend`): real allocations through wgpu

pub mod dummy;
pub mod traits;
pub mod types;

#[cfg(feature = "wgpu-backend")]
pub mod wgpu_backend;

pub use dummy::{DummyBackend, RecordedClear};
pub use traits::*;
pub use types::*;

#[cfg(feature = "wgpu-backend")]
pub use wgpu_backend::WgpuBackend;

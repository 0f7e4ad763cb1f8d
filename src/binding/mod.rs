//! Shader variable ids and the contexts textures are bound into

mod context;
mod property;

pub use context::*;
pub use property::PropertyId;

//! Renderer stage contract and composition
//!
//! - [`Renderer`]: the trait every stage implements
//! - [`TextureSet`]: named texture storage with the shared lookup rules
//! - [`RendererRegistry`]: stages addressed by name, with default fallbacks

mod registry;
mod stage;
mod texture_set;

pub use registry::RendererRegistry;
pub use stage::Renderer;
pub use texture_set::{resolution_from_vector, TextureSet};

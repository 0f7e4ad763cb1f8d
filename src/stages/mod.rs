//! Atmosphere stages
//!
//! Each stage owns the textures of one layer of the atmosphere and exposes
//! them through [`Renderer`](crate::renderer::Renderer):
//!
//! - [`SkyRenderer`]: sky lookup tables and the sky cubemap
//! - [`AerialPerspectiveRenderer`]: froxel volumes for distant geometry
//! - [`CloudRenderer`]: cloud layers, cloud shadows and reflections

pub mod aerial_perspective;
pub mod clouds;
pub mod sky;

pub use aerial_perspective::{AerialPerspectiveConfig, AerialPerspectiveRenderer};
pub use clouds::{CloudConfig, CloudRenderer};
pub use sky::{SkyConfig, SkyRenderer};

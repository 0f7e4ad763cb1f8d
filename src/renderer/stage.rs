//! The contract every atmosphere stage implements

use std::collections::BTreeSet;

use glam::UVec3;

use crate::binding::{BindTarget, PropertyId};
use crate::error::StageResult;
use crate::renderer::TextureSet;

/// A rendering stage that owns named textures.
///
/// Consumers only ever see this trait: they ask a stage which textures it
/// exposes and bind them by name, without knowing how the stage backs them.
///
/// # Lifecycle
///
/// 1. Construct with configuration
/// 2. [`build`](Self::build) allocates every owned texture
/// 3. Query and bind through the provided methods
/// 4. [`cleanup`](Self::cleanup) releases everything
///
/// A stage can be rebuilt at any time, for example after its configuration
/// changed. Building releases the previous textures first.
pub trait Renderer: Send {
    /// Stage name, unique within a registry
    fn name(&self) -> &str;

    /// Allocate every texture this stage owns.
    ///
    /// Fails when the configuration is invalid or the backend rejects an
    /// allocation. Nothing stays allocated after a failed build.
    fn build(&mut self) -> StageResult<()>;

    /// Release every owned texture. Calling it again is a no-op.
    fn cleanup(&mut self);

    /// The owned textures
    fn textures(&self) -> &TextureSet;

    fn is_built(&self) -> bool {
        self.textures().is_built()
    }

    /// Names accepted by the bind and query methods. Empty until built.
    fn texture_names(&self) -> BTreeSet<&str> {
        self.textures().names()
    }

    /// Bind the named texture to `variable` in `target`.
    fn set_texture(
        &self,
        name: &str,
        variable: PropertyId,
        target: BindTarget<'_>,
    ) -> StageResult<()> {
        self.textures().bind(name, variable, target)
    }

    /// Write the named texture's resolution to `variable` in `target`.
    fn set_texture_resolution(
        &self,
        name: &str,
        variable: PropertyId,
        target: BindTarget<'_>,
    ) -> StageResult<()> {
        self.textures().bind_resolution(name, variable, target)
    }

    /// Width, height and depth of the named texture. Depth is 1 for 2D.
    fn texture_resolution(&self, name: &str) -> StageResult<UVec3> {
        self.textures().resolution(name)
    }
}

//! Stage composition by name

use std::sync::Arc;

use crate::binding::{BindTarget, PropertyId};
use crate::error::{StageError, StageResult};
use crate::renderer::Renderer;
use crate::resources::{DefaultResourcePool, DefaultTextureKind, DefaultsLease};

/// Set of stages that refer to each other's outputs by name.
///
/// Stages are built in registration order. Consumers bind a dependency's
/// output through [`RendererRegistry::bind_dependency`], which falls back to
/// a placeholder texture from the default pool when the dependency is not
/// registered, not built, or does not expose the requested texture.
pub struct RendererRegistry {
    pool: Arc<DefaultResourcePool>,
    stages: Vec<Box<dyn Renderer>>,
    lease: Option<DefaultsLease>,
}

impl RendererRegistry {
    pub fn new(pool: Arc<DefaultResourcePool>) -> Self {
        Self {
            pool,
            stages: Vec::new(),
            lease: None,
        }
    }

    pub fn pool(&self) -> &Arc<DefaultResourcePool> {
        &self.pool
    }

    /// Add a stage. Names must be unique.
    pub fn register(&mut self, stage: Box<dyn Renderer>) -> StageResult<()> {
        if self.position(stage.name()).is_some() {
            return Err(StageError::DuplicateStage(stage.name().to_string()));
        }
        log::debug!("Registered stage '{}'", stage.name());
        self.stages.push(stage);
        Ok(())
    }

    /// Remove a stage, releasing its textures.
    pub fn unregister(&mut self, name: &str) -> StageResult<()> {
        let index = self
            .position(name)
            .ok_or_else(|| StageError::UnknownStage(name.to_string()))?;
        let mut stage = self.stages.remove(index);
        stage.cleanup();
        Ok(())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.name() == name)
    }

    pub fn stage(&self, name: &str) -> Option<&dyn Renderer> {
        self.stages
            .iter()
            .find(|s| s.name() == name)
            .map(|s| &**s)
    }

    pub fn stage_mut(&mut self, name: &str) -> Option<&mut (dyn Renderer + 'static)> {
        self.stages
            .iter_mut()
            .find(|s| s.name() == name)
            .map(|s| &mut **s)
    }

    /// Stage names in build order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Build every stage in registration order.
    ///
    /// If any stage fails, every stage is cleaned up again and the error is
    /// returned.
    pub fn build_all(&mut self) -> StageResult<()> {
        self.lease = None;
        self.lease = Some(self.pool.lease()?);

        for index in 0..self.stages.len() {
            if let Err(err) = self.stages[index].build() {
                log::error!(
                    "Stage '{}' failed to build, cleaning up",
                    self.stages[index].name()
                );
                self.cleanup_all();
                return Err(err);
            }
        }
        log::info!("Built {} atmosphere stages", self.stages.len());
        Ok(())
    }

    /// Build one stage by name.
    pub fn build_stage(&mut self, name: &str) -> StageResult<()> {
        self.stage_mut(name)
            .ok_or_else(|| StageError::UnknownStage(name.to_string()))?
            .build()
    }

    /// Clean up every stage in reverse order.
    pub fn cleanup_all(&mut self) {
        for stage in self.stages.iter_mut().rev() {
            stage.cleanup();
        }
        self.lease = None;
    }

    /// Bind `texture` of stage `stage`, or the `fallback` placeholder if the
    /// stage cannot provide it.
    ///
    /// Fails only when the fallback is needed and the default pool is not live.
    pub fn bind_dependency(
        &self,
        stage: &str,
        texture: &str,
        fallback: DefaultTextureKind,
        variable: PropertyId,
        target: BindTarget<'_>,
    ) -> StageResult<()> {
        match self.stage(stage) {
            Some(provider) if provider.is_built() && provider.texture_names().contains(texture) => {
                provider.set_texture(texture, variable, target)
            }
            _ => {
                log::debug!(
                    "Dependency '{}/{}' unavailable, binding default {:?}",
                    stage,
                    texture,
                    fallback
                );
                self.pool.bind_default(fallback, variable, target)
            }
        }
    }
}

impl Drop for RendererRegistry {
    fn drop(&mut self) {
        self.cleanup_all();
    }
}

impl std::fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("stages", &self.stage_names())
            .field("pool", &self.pool)
            .finish()
    }
}

//! Layered clouds

use std::sync::Arc;

use glam::UVec2;

use crate::backend::TextureFormat;
use crate::binding::{BindTarget, CommandRecorder, PropertyId};
use crate::error::{AllocationError, StageError, StageResult};
use crate::renderer::{Renderer, RendererRegistry, TextureSet};
use crate::resources::{
    clear_to_white, create_monochrome_2d, create_monochrome_cubemap, create_rgba_2d_array,
    DefaultResourcePool, DefaultTextureKind, TextureOptions,
};
use crate::stages::aerial_perspective::{AerialPerspectiveRenderer, AERIAL_TRANSMITTANCE};
use crate::stages::sky::{SkyRenderer, SKY_CUBEMAP};

pub const CLOUD_LAYERS: &str = "cloud_layers";
pub const CLOUD_SHADOW_MAP: &str = "cloud_shadow_map";
pub const CLOUD_REFLECTION: &str = "cloud_reflection";

/// Configuration for [`CloudRenderer`]
#[derive(Debug, Clone, PartialEq)]
pub struct CloudConfig {
    pub layer_resolution: UVec2,
    /// Number of independent cloud layers, one array slice each
    pub layer_count: u32,
    pub shadow_resolution: UVec2,
    pub reflection_resolution: u32,
    /// Format override for the layer array
    pub layer_format: Option<TextureFormat>,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            layer_resolution: UVec2::new(512, 512),
            layer_count: 3,
            shadow_resolution: UVec2::new(256, 256),
            reflection_resolution: 32,
            layer_format: None,
        }
    }
}

impl CloudConfig {
    pub fn with_layer_resolution(mut self, resolution: UVec2) -> Self {
        self.layer_resolution = resolution;
        self
    }

    pub fn with_layer_count(mut self, count: u32) -> Self {
        self.layer_count = count;
        self
    }

    pub fn with_shadow_resolution(mut self, resolution: UVec2) -> Self {
        self.shadow_resolution = resolution;
        self
    }

    pub fn with_reflection_resolution(mut self, resolution: u32) -> Self {
        self.reflection_resolution = resolution;
        self
    }

    pub fn with_layer_format(mut self, format: TextureFormat) -> Self {
        self.layer_format = Some(format);
        self
    }

    pub fn validate(&self, stage: &str) -> StageResult<()> {
        let invalid = |reason: String| StageError::InvalidConfig {
            stage: stage.to_string(),
            reason,
        };
        if self.layer_count == 0 {
            return Err(invalid("at least one cloud layer is required".into()));
        }
        if self.layer_resolution.min_element() == 0 {
            return Err(invalid(format!(
                "layer resolution {} has a zero component",
                self.layer_resolution
            )));
        }
        if self.shadow_resolution.min_element() == 0 {
            return Err(invalid(format!(
                "shadow resolution {} has a zero component",
                self.shadow_resolution
            )));
        }
        if self.reflection_resolution == 0 {
            return Err(invalid("reflection resolution is zero".into()));
        }
        Ok(())
    }
}

/// Owns the cloud layer array, the cloud shadow map and the cloud
/// reflection cubemap.
pub struct CloudRenderer {
    config: CloudConfig,
    defaults: Arc<DefaultResourcePool>,
    textures: TextureSet,
}

impl CloudRenderer {
    pub const NAME: &'static str = "clouds";

    pub fn new(defaults: Arc<DefaultResourcePool>, config: CloudConfig) -> Self {
        Self {
            config,
            defaults,
            textures: TextureSet::new(Self::NAME),
        }
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    /// Replace the configuration. Takes effect on the next build.
    pub fn set_config(&mut self, config: CloudConfig) {
        self.config = config;
    }

    /// Publish the cloud textures as globals, together with the sky and
    /// aerial perspective inputs the cloud shaders sample.
    pub fn bind_globals(
        &self,
        registry: &RendererRegistry,
        target: &mut CommandRecorder,
    ) -> StageResult<()> {
        registry.bind_dependency(
            SkyRenderer::NAME,
            SKY_CUBEMAP,
            DefaultTextureKind::Cube,
            PropertyId::from_name("_SkyCubemap"),
            BindTarget::Commands(&mut *target),
        )?;
        registry.bind_dependency(
            AerialPerspectiveRenderer::NAME,
            AERIAL_TRANSMITTANCE,
            DefaultTextureKind::Texture3d,
            PropertyId::from_name("_AerialTransmittance"),
            BindTarget::Commands(&mut *target),
        )?;
        for name in [CLOUD_LAYERS, CLOUD_SHADOW_MAP, CLOUD_REFLECTION] {
            self.set_texture(
                name,
                PropertyId::from_name(name),
                BindTarget::Commands(&mut *target),
            )?;
        }
        self.set_texture_resolution(
            CLOUD_SHADOW_MAP,
            PropertyId::from_name("_CloudShadowSize"),
            BindTarget::Commands(&mut *target),
        )
    }
}

impl Renderer for CloudRenderer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn build(&mut self) -> StageResult<()> {
        self.config.validate(Self::NAME)?;

        let config = &self.config;
        let defaults = &self.defaults;
        let backend = defaults.backend();
        self.textures.rebuild_with(|set| {
            set.hold_defaults(defaults.lease()?);

            let mut layer_options = TextureOptions::default();
            if let Some(format) = config.layer_format {
                layer_options = layer_options.with_format(format);
            }
            set.insert(create_rgba_2d_array(
                backend,
                CLOUD_LAYERS,
                config.layer_resolution,
                config.layer_count,
                layer_options,
            )?)?;

            // Unshadowed until the first shadow pass runs
            let shadow = create_monochrome_2d(
                backend,
                CLOUD_SHADOW_MAP,
                config.shadow_resolution,
                TextureOptions::default(),
            )?;
            clear_to_white(backend, &shadow).map_err(|source| AllocationError::Backend {
                name: CLOUD_SHADOW_MAP.to_string(),
                source,
            })?;
            set.insert(shadow)?;

            set.insert(create_monochrome_cubemap(
                backend,
                CLOUD_REFLECTION,
                UVec2::splat(config.reflection_resolution),
                TextureOptions::default(),
            )?)?;
            Ok(())
        })
    }

    fn cleanup(&mut self) {
        self.textures.clear();
    }

    fn textures(&self) -> &TextureSet {
        &self.textures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::no_layers(CloudConfig::default().with_layer_count(0))]
    #[case::flat_layers(CloudConfig::default().with_layer_resolution(UVec2::new(512, 0)))]
    #[case::no_shadow(CloudConfig::default().with_shadow_resolution(UVec2::ZERO))]
    #[case::no_reflection(CloudConfig::default().with_reflection_resolution(0))]
    fn test_invalid_config(#[case] config: CloudConfig) {
        assert!(matches!(
            config.validate(CloudRenderer::NAME),
            Err(StageError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(CloudConfig::default().validate(CloudRenderer::NAME).is_ok());
    }
}

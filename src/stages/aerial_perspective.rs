//! Aerial perspective froxel volumes

use std::sync::Arc;

use glam::UVec3;

use crate::binding::{BindTarget, ComputeDispatch, KernelIndex, PropertyId};
use crate::error::{StageError, StageResult};
use crate::renderer::{Renderer, RendererRegistry, TextureSet};
use crate::resources::{
    create_monochrome_3d, create_rgba_3d, DefaultResourcePool, DefaultTextureKind, TextureOptions,
};
use crate::stages::sky::{SkyRenderer, TRANSMITTANCE_LUT};

pub const AERIAL_INSCATTER: &str = "aerial_inscatter";
pub const AERIAL_TRANSMITTANCE: &str = "aerial_transmittance";

const FROXEL_THREADS: UVec3 = UVec3::new(4, 4, 4);

/// Configuration for [`AerialPerspectiveRenderer`]
#[derive(Debug, Clone, PartialEq)]
pub struct AerialPerspectiveConfig {
    /// Froxel grid: screen width, screen height, depth slices
    pub froxel_resolution: UVec3,
}

impl Default for AerialPerspectiveConfig {
    fn default() -> Self {
        Self {
            froxel_resolution: UVec3::new(32, 32, 32),
        }
    }
}

impl AerialPerspectiveConfig {
    pub fn with_froxel_resolution(mut self, resolution: UVec3) -> Self {
        self.froxel_resolution = resolution;
        self
    }

    pub fn validate(&self, stage: &str) -> StageResult<()> {
        if self.froxel_resolution.min_element() == 0 {
            return Err(StageError::InvalidConfig {
                stage: stage.to_string(),
                reason: format!(
                    "froxel resolution {} has a zero component",
                    self.froxel_resolution
                ),
            });
        }
        Ok(())
    }
}

/// Owns the in-scattering and transmittance froxel volumes.
///
/// Reads the sky's transmittance LUT when a sky stage is available, and a
/// placeholder otherwise.
pub struct AerialPerspectiveRenderer {
    config: AerialPerspectiveConfig,
    defaults: Arc<DefaultResourcePool>,
    textures: TextureSet,
}

impl AerialPerspectiveRenderer {
    pub const NAME: &'static str = "aerial_perspective";

    pub fn new(defaults: Arc<DefaultResourcePool>, config: AerialPerspectiveConfig) -> Self {
        Self {
            config,
            defaults,
            textures: TextureSet::new(Self::NAME),
        }
    }

    pub fn config(&self) -> &AerialPerspectiveConfig {
        &self.config
    }

    /// Replace the configuration. Takes effect on the next build.
    pub fn set_config(&mut self, config: AerialPerspectiveConfig) {
        self.config = config;
    }

    /// Bind inputs and outputs of the froxel kernel and record its dispatch.
    pub fn record_dispatches(
        &self,
        registry: &RendererRegistry,
        dispatch: &mut ComputeDispatch,
    ) -> StageResult<()> {
        let kernel = KernelIndex(0);
        registry.bind_dependency(
            SkyRenderer::NAME,
            TRANSMITTANCE_LUT,
            DefaultTextureKind::Texture2d,
            PropertyId::from_name("_TransmittanceLut"),
            BindTarget::Compute {
                dispatch: &mut *dispatch,
                kernel,
            },
        )?;
        self.set_texture(
            AERIAL_INSCATTER,
            PropertyId::from_name("_InScatter"),
            BindTarget::Compute {
                dispatch: &mut *dispatch,
                kernel,
            },
        )?;
        self.set_texture(
            AERIAL_TRANSMITTANCE,
            PropertyId::from_name("_Transmittance"),
            BindTarget::Compute {
                dispatch: &mut *dispatch,
                kernel,
            },
        )?;
        self.set_texture_resolution(
            AERIAL_INSCATTER,
            PropertyId::from_name("_FroxelSize"),
            BindTarget::Compute {
                dispatch: &mut *dispatch,
                kernel,
            },
        )?;
        dispatch.dispatch_over(
            kernel,
            self.texture_resolution(AERIAL_INSCATTER)?,
            FROXEL_THREADS,
        );
        Ok(())
    }
}

impl Renderer for AerialPerspectiveRenderer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn build(&mut self) -> StageResult<()> {
        self.config.validate(Self::NAME)?;

        let resolution = self.config.froxel_resolution;
        let defaults = &self.defaults;
        let backend = defaults.backend();
        self.textures.rebuild_with(|set| {
            set.hold_defaults(defaults.lease()?);
            set.insert(create_rgba_3d(
                backend,
                AERIAL_INSCATTER,
                resolution,
                TextureOptions::default(),
            )?)?;
            set.insert(create_monochrome_3d(
                backend,
                AERIAL_TRANSMITTANCE,
                resolution,
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

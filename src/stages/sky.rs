//! Sky lookup tables

use std::sync::Arc;

use glam::{UVec2, UVec3};

use crate::binding::{BindTarget, ComputeDispatch, KernelIndex, PropertyId};
use crate::error::{StageError, StageResult};
use crate::renderer::{Renderer, TextureSet};
use crate::resources::{create_rgba_2d, create_rgba_cubemap, DefaultResourcePool, TextureOptions};

pub const TRANSMITTANCE_LUT: &str = "transmittance_lut";
pub const MULTI_SCATTERING_LUT: &str = "multi_scattering_lut";
pub const SKY_VIEW_LUT: &str = "sky_view_lut";
pub const SKY_CUBEMAP: &str = "sky_cubemap";

/// Thread group size of the LUT kernels.
const LUT_THREADS: UVec3 = UVec3::new(8, 8, 1);

/// Configuration for [`SkyRenderer`]
#[derive(Debug, Clone, PartialEq)]
pub struct SkyConfig {
    pub transmittance_resolution: UVec2,
    pub multi_scattering_resolution: UVec2,
    pub sky_view_resolution: UVec2,
    /// Face size of the sky cubemap used for ambient and reflections
    pub cubemap_resolution: u32,
    /// Allocate a mip chain for the sky view LUT
    pub sky_view_mips: bool,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            transmittance_resolution: UVec2::new(256, 64),
            multi_scattering_resolution: UVec2::new(32, 32),
            sky_view_resolution: UVec2::new(192, 108),
            cubemap_resolution: 64,
            sky_view_mips: false,
        }
    }
}

impl SkyConfig {
    pub fn with_transmittance_resolution(mut self, resolution: UVec2) -> Self {
        self.transmittance_resolution = resolution;
        self
    }

    pub fn with_multi_scattering_resolution(mut self, resolution: UVec2) -> Self {
        self.multi_scattering_resolution = resolution;
        self
    }

    pub fn with_sky_view_resolution(mut self, resolution: UVec2) -> Self {
        self.sky_view_resolution = resolution;
        self
    }

    pub fn with_cubemap_resolution(mut self, resolution: u32) -> Self {
        self.cubemap_resolution = resolution;
        self
    }

    pub fn with_sky_view_mips(mut self, enabled: bool) -> Self {
        self.sky_view_mips = enabled;
        self
    }

    pub fn validate(&self, stage: &str) -> StageResult<()> {
        let checks = [
            ("transmittance", self.transmittance_resolution),
            ("multiple scattering", self.multi_scattering_resolution),
            ("sky view", self.sky_view_resolution),
            ("cubemap", UVec2::splat(self.cubemap_resolution)),
        ];
        for (what, resolution) in checks {
            if resolution.min_element() == 0 {
                return Err(StageError::InvalidConfig {
                    stage: stage.to_string(),
                    reason: format!("{what} resolution {resolution} has a zero component"),
                });
            }
        }
        Ok(())
    }
}

/// Owns the sky's transmittance, multiple scattering and sky view LUTs and
/// the sky cubemap.
pub struct SkyRenderer {
    config: SkyConfig,
    defaults: Arc<DefaultResourcePool>,
    textures: TextureSet,
}

impl SkyRenderer {
    pub const NAME: &'static str = "sky";

    pub fn new(defaults: Arc<DefaultResourcePool>, config: SkyConfig) -> Self {
        Self {
            config,
            defaults,
            textures: TextureSet::new(Self::NAME),
        }
    }

    pub fn config(&self) -> &SkyConfig {
        &self.config
    }

    /// Replace the configuration. Takes effect on the next build.
    pub fn set_config(&mut self, config: SkyConfig) {
        self.config = config;
    }

    /// Bind the LUTs as kernel outputs and record one dispatch per LUT.
    pub fn record_dispatches(&self, dispatch: &mut ComputeDispatch) -> StageResult<()> {
        let luts = [
            (KernelIndex(0), TRANSMITTANCE_LUT),
            (KernelIndex(1), MULTI_SCATTERING_LUT),
            (KernelIndex(2), SKY_VIEW_LUT),
        ];
        let output = PropertyId::from_name("_Output");
        let output_size = PropertyId::from_name("_OutputSize");
        for (kernel, name) in luts {
            self.set_texture(
                name,
                output,
                BindTarget::Compute {
                    dispatch: &mut *dispatch,
                    kernel,
                },
            )?;
            self.set_texture_resolution(
                name,
                output_size,
                BindTarget::Compute {
                    dispatch: &mut *dispatch,
                    kernel,
                },
            )?;
            dispatch.dispatch_over(kernel, self.texture_resolution(name)?, LUT_THREADS);
        }
        Ok(())
    }
}

impl Renderer for SkyRenderer {
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
            set.insert(create_rgba_2d(
                backend,
                TRANSMITTANCE_LUT,
                config.transmittance_resolution,
                TextureOptions::default(),
            )?)?;
            set.insert(create_rgba_2d(
                backend,
                MULTI_SCATTERING_LUT,
                config.multi_scattering_resolution,
                TextureOptions::default(),
            )?)?;
            set.insert(create_rgba_2d(
                backend,
                SKY_VIEW_LUT,
                config.sky_view_resolution,
                TextureOptions::default().with_mip_map(config.sky_view_mips),
            )?)?;
            set.insert(create_rgba_cubemap(
                backend,
                SKY_CUBEMAP,
                UVec2::splat(config.cubemap_resolution),
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

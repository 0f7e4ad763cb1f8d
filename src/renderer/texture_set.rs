//! Named textures owned by a stage

use std::collections::BTreeSet;

use glam::{UVec3, Vec4};
use rustc_hash::FxHashMap;

use crate::binding::{BindTarget, PropertyId};
use crate::error::{StageError, StageResult};
use crate::resources::{DefaultsLease, RenderTexture};

/// The textures a stage owns, keyed by name, plus its built flag.
///
/// Lookups fail with [`StageError::NotBuilt`] before a successful build and
/// after cleanup, and with [`StageError::UnknownTexture`] for names the
/// stage does not own.
#[derive(Debug)]
pub struct TextureSet {
    stage: String,
    textures: FxHashMap<String, RenderTexture>,
    lease: Option<DefaultsLease>,
    built: bool,
}

impl TextureSet {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            textures: FxHashMap::default(),
            lease: None,
            built: false,
        }
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Add a texture under its own name.
    ///
    /// Names are unique per stage; a second texture with a taken name is
    /// rejected and released.
    pub fn insert(&mut self, texture: RenderTexture) -> StageResult<()> {
        if self.textures.contains_key(texture.name()) {
            return Err(StageError::DuplicateTexture {
                stage: self.stage.clone(),
                name: texture.name().to_string(),
            });
        }
        self.textures.insert(texture.name().to_string(), texture);
        Ok(())
    }

    /// Keep the default pool acquired until the next [`Self::clear`].
    pub fn hold_defaults(&mut self, lease: DefaultsLease) {
        self.lease = Some(lease);
    }

    pub fn holds_defaults(&self) -> bool {
        self.lease.is_some()
    }

    /// Release every texture and the defaults lease. Safe to call repeatedly.
    pub fn clear(&mut self) {
        if !self.textures.is_empty() {
            log::debug!(
                "{}: releasing {} textures",
                self.stage,
                self.textures.len()
            );
        }
        self.textures.clear();
        self.lease = None;
        self.built = false;
    }

    /// Release the current contents, then run `allocate` to fill the set.
    ///
    /// The set is only marked built if `allocate` succeeds. On failure
    /// everything allocated so far is released again.
    pub fn rebuild_with(
        &mut self,
        allocate: impl FnOnce(&mut Self) -> StageResult<()>,
    ) -> StageResult<()> {
        self.clear();
        match allocate(self) {
            Ok(()) => {
                self.built = true;
                log::debug!("{}: built {} textures", self.stage, self.textures.len());
                Ok(())
            }
            Err(err) => {
                log::error!("{}: build failed: {}", self.stage, err);
                self.clear();
                Err(err)
            }
        }
    }

    /// Names usable with [`Self::get`] and the bind methods.
    pub fn names(&self) -> BTreeSet<&str> {
        self.textures.keys().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> StageResult<&RenderTexture> {
        if !self.built {
            return Err(StageError::NotBuilt {
                stage: self.stage.clone(),
            });
        }
        self.textures
            .get(name)
            .ok_or_else(|| StageError::UnknownTexture {
                stage: self.stage.clone(),
                name: name.to_string(),
            })
    }

    pub fn resolution(&self, name: &str) -> StageResult<UVec3> {
        Ok(self.get(name)?.resolution())
    }

    /// Bind the named texture to `variable` in `target`.
    pub fn bind(
        &self,
        name: &str,
        variable: PropertyId,
        mut target: BindTarget<'_>,
    ) -> StageResult<()> {
        let binding = self.get(name)?.binding();
        target.set_texture(variable, binding);
        Ok(())
    }

    /// Write the named texture's resolution to `variable` in `target`.
    ///
    /// The vector holds width, height and depth; the fourth component is zero.
    pub fn bind_resolution(
        &self,
        name: &str,
        variable: PropertyId,
        mut target: BindTarget<'_>,
    ) -> StageResult<()> {
        let resolution = self.resolution(name)?;
        target.set_vector(variable, resolution.as_vec3().extend(0.0));
        Ok(())
    }
}

/// Decode a resolution written by [`TextureSet::bind_resolution`].
pub fn resolution_from_vector(value: Vec4) -> UVec3 {
    value.truncate().as_uvec3()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DummyBackend, GpuBackend, SharedBackend};
    use crate::binding::MaterialPropertyBlock;
    use crate::resources::{create_rgba_2d, DefaultResourcePool, TextureOptions};
    use glam::UVec2;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn backend() -> (Arc<Mutex<DummyBackend>>, SharedBackend) {
        let dummy = Arc::new(Mutex::new(DummyBackend::new()));
        let shared: SharedBackend = dummy.clone();
        (dummy, shared)
    }

    #[test]
    fn test_unbuilt_set_rejects_lookups() {
        let set = TextureSet::new("sky");
        assert_eq!(
            set.get("lut").unwrap_err(),
            StageError::NotBuilt {
                stage: "sky".into()
            }
        );
        assert!(set.names().is_empty());
    }

    #[test]
    fn test_rebuild_marks_built_and_clear_releases() {
        let (dummy, backend) = backend();
        let mut set = TextureSet::new("sky");
        set.rebuild_with(|set| {
            set.insert(create_rgba_2d(
                &backend,
                "lut",
                UVec2::new(8, 4),
                TextureOptions::default(),
            )?)?;
            Ok(())
        })
        .unwrap();

        assert!(set.is_built());
        assert_eq!(set.names().into_iter().collect::<Vec<_>>(), vec!["lut"]);
        assert_eq!(set.resolution("lut").unwrap(), UVec3::new(8, 4, 1));

        set.clear();
        set.clear();
        assert!(!set.is_built());
        assert_eq!(dummy.lock().live_texture_count(), 0);
    }

    #[test]
    fn test_failed_rebuild_releases_partial_allocations() {
        let (dummy, backend) = backend();
        let mut set = TextureSet::new("clouds");
        let result = set.rebuild_with(|set| {
            set.insert(create_rgba_2d(
                &backend,
                "ok",
                UVec2::new(8, 8),
                TextureOptions::default(),
            )?)?;
            set.insert(create_rgba_2d(
                &backend,
                "broken",
                UVec2::new(0, 8),
                TextureOptions::default(),
            )?)?;
            Ok(())
        });

        assert!(matches!(result, Err(StageError::Allocation(_))));
        assert!(!set.is_built());
        assert!(set.is_empty());
        assert_eq!(dummy.lock().live_texture_count(), 0);
    }

    #[test]
    fn test_duplicate_name_fails_build() {
        let (dummy, backend) = backend();
        let mut set = TextureSet::new("sky");
        let result = set.rebuild_with(|set| {
            for _ in 0..2 {
                set.insert(create_rgba_2d(
                    &backend,
                    "lut",
                    UVec2::new(8, 8),
                    TextureOptions::default(),
                )?)?;
            }
            Ok(())
        });

        assert_eq!(
            result.unwrap_err(),
            StageError::DuplicateTexture {
                stage: "sky".into(),
                name: "lut".into()
            }
        );
        assert!(!set.is_built());
        assert_eq!(dummy.lock().live_texture_count(), 0);
    }

    #[test]
    fn test_defaults_lease_held_until_clear() {
        let (_, backend) = backend();
        let pool = Arc::new(DefaultResourcePool::new(backend));
        let mut set = TextureSet::new("clouds");
        set.rebuild_with(|set| {
            set.hold_defaults(pool.lease()?);
            Ok(())
        })
        .unwrap();
        assert!(set.holds_defaults());
        assert_eq!(pool.ref_count(), 1);

        set.clear();
        assert!(!set.holds_defaults());
        assert_eq!(pool.ref_count(), 0);
    }

    #[test]
    fn test_resolution_vector_round_trip() {
        let (_, backend) = backend();
        let mut set = TextureSet::new("sky");
        set.rebuild_with(|set| {
            set.insert(create_rgba_2d(
                &backend,
                "lut",
                UVec2::new(256, 64),
                TextureOptions::default(),
            )?)?;
            Ok(())
        })
        .unwrap();

        let mut block = MaterialPropertyBlock::new();
        let variable = PropertyId::from_name("_LutSize");
        set.bind_resolution("lut", variable, BindTarget::Material(&mut block))
            .unwrap();
        let written = block.vector(variable).unwrap();
        assert_eq!(resolution_from_vector(written), set.resolution("lut").unwrap());
    }
}

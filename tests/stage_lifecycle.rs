//! Integration tests for the stage lifecycle: build, query, bind, cleanup.

mod common;

use glam::{UVec2, UVec3, Vec4};
use rstest::rstest;

use common::TestContext;
use redlilium_atmosphere::backend::ClearColor;
use redlilium_atmosphere::binding::KernelIndex;
use redlilium_atmosphere::renderer::resolution_from_vector;
use redlilium_atmosphere::stages::clouds::{CLOUD_LAYERS, CLOUD_SHADOW_MAP};
use redlilium_atmosphere::stages::sky::{SKY_CUBEMAP, SKY_VIEW_LUT, TRANSMITTANCE_LUT};
use redlilium_atmosphere::{
    AllocationError, BackendError, BindTarget, CloudConfig, CommandRecorder, ComputeDispatch,
    DummyBackend, GpuBackend, MaterialPropertyBlock, PropertyId, Renderer, SkyConfig, StageError,
    TextureFormat,
};

/// Which binding context a test binds into.
#[derive(Debug, Clone, Copy)]
enum Context {
    Material,
    Compute,
    Commands,
}

/// Owns one binding context of each kind.
struct Contexts {
    block: MaterialPropertyBlock,
    dispatch: ComputeDispatch,
    recorder: CommandRecorder,
}

impl Contexts {
    fn new() -> Self {
        Self {
            block: MaterialPropertyBlock::new(),
            dispatch: ComputeDispatch::new("test"),
            recorder: CommandRecorder::new("test"),
        }
    }

    fn target(&mut self, context: Context) -> BindTarget<'_> {
        match context {
            Context::Material => BindTarget::Material(&mut self.block),
            Context::Compute => BindTarget::Compute {
                dispatch: &mut self.dispatch,
                kernel: KernelIndex(0),
            },
            Context::Commands => BindTarget::Commands(&mut self.recorder),
        }
    }

    fn vector(&self, context: Context, variable: PropertyId) -> Option<Vec4> {
        match context {
            Context::Material => self.block.vector(variable),
            Context::Compute => self.dispatch.vector(KernelIndex(0), variable),
            Context::Commands => self.recorder.global_vector(variable),
        }
    }

    fn is_untouched(&self, variable: PropertyId) -> bool {
        self.block.is_empty()
            && self.dispatch.get(KernelIndex(0), variable).is_none()
            && self.recorder.commands().is_empty()
    }
}

#[test]
fn test_sky_exposes_its_textures_after_build() {
    let ctx = TestContext::new();
    let mut sky = ctx.sky();
    assert!(sky.texture_names().is_empty());

    sky.build().unwrap();

    let names: Vec<&str> = sky.texture_names().into_iter().collect();
    assert_eq!(
        names,
        vec![
            "multi_scattering_lut",
            "sky_cubemap",
            "sky_view_lut",
            "transmittance_lut"
        ]
    );
    assert_eq!(
        sky.texture_resolution(TRANSMITTANCE_LUT).unwrap(),
        UVec3::new(256, 64, 1)
    );
    assert_eq!(
        sky.texture_resolution(SKY_CUBEMAP).unwrap(),
        UVec3::new(64, 64, 6)
    );
    // Four sky textures plus the three default placeholders
    assert_eq!(ctx.live_textures(), 7);
    assert_eq!(ctx.pool.ref_count(), 1);
}

#[rstest]
#[case::material(Context::Material)]
#[case::compute(Context::Compute)]
#[case::commands(Context::Commands)]
fn test_unknown_texture_is_rejected(#[case] context: Context) {
    let ctx = TestContext::new();
    let mut sky = ctx.sky();
    sky.build().unwrap();

    let mut contexts = Contexts::new();
    let variable = PropertyId::from_name("_Missing");
    let err = sky
        .set_texture("no_such_lut", variable, contexts.target(context))
        .unwrap_err();
    assert_eq!(
        err,
        StageError::UnknownTexture {
            stage: "sky".into(),
            name: "no_such_lut".into()
        }
    );
    assert!(matches!(
        sky.set_texture_resolution("no_such_lut", variable, contexts.target(context)),
        Err(StageError::UnknownTexture { .. })
    ));
    assert!(matches!(
        sky.texture_resolution("no_such_lut"),
        Err(StageError::UnknownTexture { .. })
    ));
    assert!(contexts.is_untouched(variable));
}

#[rstest]
#[case::material(Context::Material)]
#[case::compute(Context::Compute)]
#[case::commands(Context::Commands)]
fn test_unbuilt_stage_rejects_every_context(#[case] context: Context) {
    let ctx = TestContext::new();
    let sky = ctx.sky();
    let not_built = StageError::NotBuilt {
        stage: "sky".into(),
    };

    let mut contexts = Contexts::new();
    let variable = PropertyId::from_name("_TransmittanceLut");
    assert_eq!(
        sky.set_texture(TRANSMITTANCE_LUT, variable, contexts.target(context))
            .unwrap_err(),
        not_built
    );
    assert_eq!(
        sky.set_texture_resolution(TRANSMITTANCE_LUT, variable, contexts.target(context))
            .unwrap_err(),
        not_built
    );
    assert_eq!(
        sky.texture_resolution(TRANSMITTANCE_LUT).unwrap_err(),
        not_built
    );
    assert!(contexts.is_untouched(variable));
    assert_eq!(ctx.live_textures(), 0);
}

#[rstest]
#[case::material(Context::Material)]
#[case::compute(Context::Compute)]
#[case::commands(Context::Commands)]
fn test_resolution_round_trips_through_context(#[case] context: Context) {
    let ctx = TestContext::new();
    let mut sky = ctx.sky();
    sky.build().unwrap();

    let mut contexts = Contexts::new();
    let variable = PropertyId::from_name("_SkyViewSize");
    sky.set_texture_resolution(SKY_VIEW_LUT, variable, contexts.target(context))
        .unwrap();

    let written = contexts.vector(context, variable).unwrap();
    assert_eq!(
        resolution_from_vector(written),
        sky.texture_resolution(SKY_VIEW_LUT).unwrap()
    );
    assert_eq!(written.w, 0.0);
}

#[test]
fn test_distinct_variables_bind_distinct_slots() {
    let ctx = TestContext::new();
    let mut sky = ctx.sky();
    sky.build().unwrap();

    // Both names fold to the same 32-bit FxHash
    let first = PropertyId::from_name("_Var81194");
    let second = PropertyId::from_name("_Var153800");
    let mut block = MaterialPropertyBlock::new();
    sky.set_texture_resolution(TRANSMITTANCE_LUT, first, BindTarget::Material(&mut block))
        .unwrap();
    sky.set_texture_resolution(SKY_VIEW_LUT, second, BindTarget::Material(&mut block))
        .unwrap();

    assert_eq!(block.len(), 2);
    assert_eq!(
        resolution_from_vector(block.vector(first).unwrap()),
        UVec3::new(256, 64, 1)
    );
    assert_eq!(
        resolution_from_vector(block.vector(second).unwrap()),
        sky.texture_resolution(SKY_VIEW_LUT).unwrap()
    );
}

#[test]
fn test_sky_allocates_labelled_textures() {
    let ctx = TestContext::new();
    let mut sky = ctx.sky();
    sky.build().unwrap();

    assert_eq!(
        ctx.dummy.lock().live_texture_labels(),
        vec![
            "default_cube",
            "default_texture_2d",
            "default_texture_3d",
            "multi_scattering_lut",
            "sky_cubemap",
            "sky_view_lut",
            "transmittance_lut"
        ]
    );
}

#[test]
fn test_cleanup_releases_everything() {
    let ctx = TestContext::new();
    let mut sky = ctx.sky();
    sky.build().unwrap();

    sky.cleanup();
    sky.cleanup();

    assert!(!sky.is_built());
    assert!(sky.texture_names().is_empty());
    assert_eq!(ctx.live_textures(), 0);
    assert_eq!(ctx.pool.ref_count(), 0);

    let mut block = MaterialPropertyBlock::new();
    let err = sky
        .set_texture(
            TRANSMITTANCE_LUT,
            PropertyId::from_name("_Lut"),
            BindTarget::Material(&mut block),
        )
        .unwrap_err();
    assert_eq!(
        err,
        StageError::NotBuilt {
            stage: "sky".into()
        }
    );
}

#[test]
fn test_rebuild_applies_new_config() {
    let ctx = TestContext::new();
    let mut sky = ctx.sky();
    sky.build().unwrap();
    let before = ctx.dummy.lock().total_texture_allocations();

    sky.set_config(SkyConfig::default().with_sky_view_resolution(UVec2::new(96, 54)));
    sky.build().unwrap();

    assert_eq!(
        sky.texture_resolution(SKY_VIEW_LUT).unwrap(),
        UVec3::new(96, 54, 1)
    );
    assert_eq!(ctx.live_textures(), 7);
    assert!(ctx.dummy.lock().total_texture_allocations() > before);
    assert_eq!(ctx.pool.ref_count(), 1);
}

#[test]
fn test_invalid_config_fails_build_without_allocating() {
    let ctx = TestContext::new();
    let mut sky = ctx.sky();
    sky.set_config(SkyConfig::default().with_cubemap_resolution(0));

    assert!(matches!(
        sky.build(),
        Err(StageError::InvalidConfig { .. })
    ));
    assert!(!sky.is_built());
    assert_eq!(ctx.dummy.lock().total_texture_allocations(), 0);
}

#[test]
fn test_failed_build_releases_partial_allocations() {
    // Room for the defaults and two sky textures only
    let ctx = TestContext::with_backend(DummyBackend::new().with_allocation_budget(5));
    let mut sky = ctx.sky();

    let err = sky.build().unwrap_err();
    assert!(matches!(err, StageError::Allocation(_)));
    assert!(!sky.is_built());
    assert!(sky.texture_names().is_empty());
    assert_eq!(ctx.live_textures(), 0);
    assert_eq!(ctx.pool.ref_count(), 0);
}

#[test]
fn test_unsupported_format_surfaces_as_allocation_error() {
    let ctx = TestContext::with_backend(
        DummyBackend::new().with_unsupported_format(TextureFormat::Rgba8Unorm),
    );
    let mut clouds = ctx.clouds();
    clouds.set_config(
        CloudConfig::default().with_layer_format(TextureFormat::Rgba8Unorm),
    );

    assert!(matches!(clouds.build(), Err(StageError::Allocation(_))));
    assert_eq!(ctx.live_textures(), 0);
}

#[test]
fn test_oversized_texture_is_rejected_by_backend() {
    // The transmittance LUT is 256 texels wide
    let ctx = TestContext::with_backend(DummyBackend::new().with_max_texture_dimension(128));
    let mut sky = ctx.sky();

    let err = sky.build().unwrap_err();
    assert!(
        matches!(
            err,
            StageError::Allocation(AllocationError::Backend {
                source: BackendError::InvalidParameter(_),
                ..
            })
        ),
        "unexpected error: {err}"
    );
    assert!(!sky.is_built());
    assert_eq!(ctx.live_textures(), 0);
    assert_eq!(ctx.pool.ref_count(), 0);
}

#[test]
fn test_cloud_layers_and_cleared_shadow_map() {
    let ctx = TestContext::new();
    let mut clouds = ctx.clouds();
    clouds.build().unwrap();

    assert_eq!(
        clouds.texture_resolution(CLOUD_LAYERS).unwrap(),
        UVec3::new(512, 512, 3)
    );
    let shadow = clouds.textures().get(CLOUD_SHADOW_MAP).unwrap();
    assert_eq!(shadow.format(), TextureFormat::R16Float);

    let dummy = ctx.dummy.lock();
    let clear = dummy
        .clears()
        .iter()
        .find(|c| c.target == shadow.handle())
        .expect("shadow map cleared");
    assert_eq!(clear.color, ClearColor::WHITE);
    assert_eq!(dummy.active_render_target(), None);
}

#[test]
fn test_sky_records_lut_dispatches() {
    let ctx = TestContext::new();
    let mut sky = ctx.sky();
    sky.build().unwrap();

    let mut dispatch = ComputeDispatch::new("sky_luts");
    sky.record_dispatches(&mut dispatch).unwrap();

    let groups: Vec<UVec3> = dispatch.dispatches().iter().map(|d| d.groups).collect();
    assert_eq!(
        groups,
        vec![
            UVec3::new(32, 8, 1),
            UVec3::new(4, 4, 1),
            UVec3::new(24, 14, 1)
        ]
    );
    let output = PropertyId::from_name("_Output");
    assert_eq!(
        dispatch.texture(KernelIndex(2), output).map(|b| b.resolution),
        Some(UVec3::new(192, 108, 1))
    );
}

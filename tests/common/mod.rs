//! Common utilities for atmosphere integration tests.

use std::sync::Arc;

use parking_lot::Mutex;
use redlilium_atmosphere::{
    AerialPerspectiveConfig, AerialPerspectiveRenderer, CloudConfig, CloudRenderer,
    DefaultResourcePool, DummyBackend, RendererRegistry, SharedBackend, SkyConfig, SkyRenderer,
};

/// Route library logs to the test harness. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A dummy backend shared by a default pool.
#[allow(dead_code)]
pub struct TestContext {
    pub dummy: Arc<Mutex<DummyBackend>>,
    pub pool: Arc<DefaultResourcePool>,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        Self::with_backend(DummyBackend::new())
    }

    pub fn with_backend(backend: DummyBackend) -> Self {
        init_logging();
        let dummy = Arc::new(Mutex::new(backend));
        let shared: SharedBackend = dummy.clone();
        Self {
            dummy,
            pool: Arc::new(DefaultResourcePool::new(shared)),
        }
    }

    pub fn live_textures(&self) -> usize {
        use redlilium_atmosphere::GpuBackend;
        self.dummy.lock().live_texture_count()
    }

    pub fn sky(&self) -> SkyRenderer {
        SkyRenderer::new(self.pool.clone(), SkyConfig::default())
    }

    pub fn aerial_perspective(&self) -> AerialPerspectiveRenderer {
        AerialPerspectiveRenderer::new(self.pool.clone(), AerialPerspectiveConfig::default())
    }

    pub fn clouds(&self) -> CloudRenderer {
        CloudRenderer::new(self.pool.clone(), CloudConfig::default())
    }

    /// Registry with sky, aerial perspective and clouds, in that order.
    pub fn full_registry(&self) -> RendererRegistry {
        let mut registry = RendererRegistry::new(self.pool.clone());
        registry
            .register(Box::new(self.sky()))
            .expect("register sky");
        registry
            .register(Box::new(self.aerial_perspective()))
            .expect("register aerial perspective");
        registry
            .register(Box::new(self.clouds()))
            .expect("register clouds");
        registry
    }
}

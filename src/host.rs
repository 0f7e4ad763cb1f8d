//! Host renderer integration hooks

/// Handlers run when the host is about to discard and rebuild all GPU state,
/// for example on a development-time hot reload.
#[derive(Default)]
pub struct ReloadNotifier {
    handlers: Vec<Box<dyn FnMut() + Send>>,
}

impl ReloadNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler. Handlers run in registration order.
    pub fn register(&mut self, handler: impl FnMut() + Send + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Run every handler.
    pub fn notify_before_reload(&mut self) {
        log::debug!("Notifying {} reload handlers", self.handlers.len());
        for handler in &mut self.handlers {
            handler();
        }
    }
}

impl std::fmt::Debug for ReloadNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadNotifier")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_handlers_run_in_order() {
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let mut notifier = ReloadNotifier::new();
        for i in 0..3 {
            let order = Arc::clone(&order);
            notifier.register(move || order.lock().push(i));
        }

        notifier.notify_before_reload();
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_handlers_run_every_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut notifier = ReloadNotifier::new();
        let counter = Arc::clone(&calls);
        notifier.register(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        notifier.notify_before_reload();
        notifier.notify_before_reload();
        assert_eq!(calls.load(Ordering::Relaxed), 2);
        assert_eq!(notifier.handler_count(), 1);
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared "currently speaking/listening" flag.
///
/// Counts active holders so a preempted operation releasing late cannot
/// clear the flag raised by the one that replaced it.
#[derive(Debug, Clone, Default)]
pub struct Indicator {
    active: Arc<AtomicUsize>,
}

impl Indicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) > 0
    }

    /// Raise the flag until the returned guard is dropped
    pub fn raise(&self) -> IndicatorGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        IndicatorGuard {
            active: Arc::clone(&self.active),
        }
    }
}

pub struct IndicatorGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for IndicatorGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

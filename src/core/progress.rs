use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 进度回调 `(stage, progress_pct, current, total)`，只在流水线线程调用
pub type ProgressCallback = dyn Fn(&str, f64, u64, u64) + Send + Sync;

/// 共享的停止标志，逐帧检查
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancel_requested: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }
}

pub(crate) fn report(
    callback: Option<&ProgressCallback>,
    stage: &str,
    current: u64,
    total: u64,
) {
    if let Some(cb) = callback {
        let pct = if total == 0 {
            100.0
        } else {
            current as f64 / total as f64 * 100.0
        };
        cb(stage, pct, current, total);
    }
}

pub mod api;
pub mod core;
pub mod hand_detector;

pub use api::HandDetector;
pub use crate::core::{BoundaryStrategy, CancelToken, Config, HandDetectionError, Result};
pub use hand_detector::{HandReport, PokerHand, ValidationStatus};

use once_cell::sync::OnceCell;

static LOGGER: OnceCell<()> = OnceCell::new();

/// 初始化日志（只执行一次），`RUST_LOG` 可覆盖默认的 info 级别
pub fn init_logging() {
    LOGGER.get_or_init(|| {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp_millis()
            .try_init();
        log::debug!("logging initialised");
    });
}

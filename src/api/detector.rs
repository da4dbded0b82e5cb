//! 牌局检测器

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::progress::CancelToken;
use crate::core::signals::SignalProviders;
use crate::core::video::{ImageSequenceSource, VideoSource};
use crate::hand_detector::{HandDetectionPipeline, HandReport, PokerHand};
use log::info;
use std::path::Path;
use std::sync::Arc;

/// 牌局检测器 - 把扑克直播切分成一手一手的牌局
///
/// ```no_run
/// use poker_hands::api::HandDetector;
///
/// let detector = HandDetector::create();
/// let report = detector.detect_path("frames/table-1").unwrap();
/// println!("{}", report.hands_json().unwrap());
/// ```
pub struct HandDetector {
    pipeline: HandDetectionPipeline,
}

impl HandDetector {
    /// 使用默认配置和内置启发式检测器创建
    pub fn create() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        info!(
            "🎬 HandDetector: created (stride {}, {} workers, {:?})",
            config.sampling_rate, config.num_workers, config.boundary_strategy
        );
        Self {
            pipeline: HandDetectionPipeline::new(config),
        }
    }

    /// 从 JSON 配置文件创建
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::with_config(Config::load(path)?))
    }

    /// 替换信号检测器（例如加速后端）
    pub fn with_providers(mut self, providers: SignalProviders) -> Self {
        self.pipeline.set_providers(providers);
        self
    }

    /// 采样和校验阶段的进度回调 `(stage, progress_pct, current, total)`
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, f64, u64, u64) + Send + Sync + 'static,
    {
        self.pipeline.set_progress(Arc::new(callback));
        self
    }

    pub fn config(&self) -> &Config {
        self.pipeline.config()
    }

    /// 取消令牌会中止正在进行的检测
    pub fn cancel_token(&self) -> CancelToken {
        self.pipeline.cancel_token()
    }

    pub fn detect(&self, source: &mut dyn VideoSource) -> Result<HandReport> {
        self.pipeline.run(source)
    }

    /// 对已解码的帧目录做检测
    pub fn detect_path(&self, dir: impl AsRef<Path>) -> Result<HandReport> {
        let mut source = ImageSequenceSource::open(dir, self.config().source_fps)?;
        self.detect(&mut source)
    }

    /// 只返回牌局列表
    pub fn detect_hands(&self, source: &mut dyn VideoSource) -> Result<Vec<PokerHand>> {
        Ok(self.detect(source)?.hands)
    }
}

impl Drop for HandDetector {
    fn drop(&mut self) {
        info!("🗑️ HandDetector: released");
    }
}

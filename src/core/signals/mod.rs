//! 逐帧信号检测器
//!
//! 每个检测器都是 `(frame, previous frame)` 的纯函数，核心流程只读取返回的读数，
//! 只要产出相同的 [`SignalRecord`] 即可替换实现

pub mod cards;
pub mod chips;
pub mod grid;
pub mod mock;
pub mod motion;
pub mod overlay;

use crate::core::video::Frame;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use cards::{CardDetector, FeltCardDetector};
pub use chips::{ChipColorDetector, ChipDetector};
pub use mock::{MockCardDetector, MockChipDetector, MockMotionDetector, MockUiDetector};
pub use motion::{FrameDiffMotionDetector, MotionDetector, MotionReading};
pub use overlay::{OverlayBandDetector, UiDetector, UiReading};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiType {
    Stats,
    Break,
    Ad,
    Unknown,
}

/// 单个采样帧的全部信号
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalRecord {
    pub timestamp: f64,
    pub frame_index: u64,
    pub motion_area: u32,
    pub motion_delta: i32,
    pub card_count: u8,
    pub chip_count: u8,
    pub ui_probability: f32,
    pub ui_type: UiType,
}

impl SignalRecord {
    pub fn is_ui(&self, threshold: f32) -> bool {
        self.ui_probability >= threshold
    }
}

/// 扫描时每帧运行的四个检测器，所有 worker 只读共享
#[derive(Clone)]
pub struct SignalProviders {
    pub motion: Arc<dyn MotionDetector>,
    pub cards: Arc<dyn CardDetector>,
    pub chips: Arc<dyn ChipDetector>,
    pub ui: Arc<dyn UiDetector>,
}

impl SignalProviders {
    pub fn new(
        motion: Arc<dyn MotionDetector>,
        cards: Arc<dyn CardDetector>,
        chips: Arc<dyn ChipDetector>,
        ui: Arc<dyn UiDetector>,
    ) -> Self {
        Self {
            motion,
            cards,
            chips,
            ui,
        }
    }

    /// 内置像素启发式
    pub fn heuristic() -> Self {
        Self::new(
            Arc::new(FrameDiffMotionDetector::new()),
            Arc::new(FeltCardDetector::new()),
            Arc::new(ChipColorDetector::new()),
            Arc::new(OverlayBandDetector::new()),
        )
    }

    /// `prev_motion_area` 为同一分块内上一采样的运动面积，缺失时差值为 0
    pub fn read(
        &self,
        frame: &Frame,
        prev: Option<&Frame>,
        prev_motion_area: Option<u32>,
    ) -> SignalRecord {
        let motion = self.motion.detect(frame, prev);
        let ui = self.ui.detect(frame, prev);
        let motion_delta = prev_motion_area
            .map(|p| (motion.area as i64 - p as i64).clamp(i32::MIN as i64, i32::MAX as i64) as i32)
            .unwrap_or(0);

        SignalRecord {
            timestamp: frame.timestamp,
            frame_index: frame.index,
            motion_area: motion.area,
            motion_delta,
            card_count: self.cards.count(frame, prev),
            chip_count: self.chips.count(frame, prev),
            ui_probability: ui.probability.clamp(0.0, 1.0),
            ui_type: ui.ui_type,
        }
    }
}

impl Default for SignalProviders {
    fn default() -> Self {
        Self::heuristic()
    }
}

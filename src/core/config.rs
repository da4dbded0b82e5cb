use crate::core::error::{HandDetectionError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 由扫描结果生成候选牌局的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryStrategy {
    /// 基于合并后 UI 片段的批量分组，确定性、无副作用
    UiSegments,
    /// 基于运动/发牌事件和 UI 窗口的事件驱动状态机
    Streaming,
}

impl Default for BoundaryStrategy {
    fn default() -> Self {
        BoundaryStrategy::UiSegments
    }
}

/// 检测配置，只读引用传递给各阶段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 采样步长（帧）
    pub sampling_rate: u64,
    pub num_workers: usize,
    pub min_hand_duration: f64,
    pub max_hand_duration: f64,
    /// 缩放后帧上的变化像素数
    pub motion_threshold: u32,
    pub card_threshold: u8,
    pub ui_buffer_before: f64,
    pub ui_buffer_after: f64,
    pub merge_gap_seconds: f64,
    pub split_target_duration: f64,
    pub boundary_strategy: BoundaryStrategy,
    /// 流式模式输入结束时是否输出未结束的牌局
    pub close_open_hand_at_end: bool,
    pub ui_probability_threshold: f32,
    pub ui_merge_gap_seconds: f64,
    pub ui_min_segment_seconds: f64,
    pub target_width: u32,
    pub target_height: u32,
    /// 视频源无法给出帧率时使用
    pub source_fps: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sampling_rate: 60,
            num_workers: num_cpus::get().max(1),
            min_hand_duration: 30.0,
            max_hand_duration: 600.0,
            motion_threshold: 5000,
            card_threshold: 2,
            ui_buffer_before: 15.0,
            ui_buffer_after: 15.0,
            merge_gap_seconds: 30.0,
            split_target_duration: 180.0,
            boundary_strategy: BoundaryStrategy::default(),
            close_open_hand_at_end: false,
            ui_probability_threshold: 0.5,
            ui_merge_gap_seconds: 5.0,
            ui_min_segment_seconds: 15.0,
            target_width: 480,
            target_height: 270,
            source_fps: 30.0,
        }
    }
}

impl Config {
    pub fn for_fast_scan() -> Self {
        Self {
            sampling_rate: 120,
            motion_threshold: 3000,
            target_width: 320,
            target_height: 180,
            ..Default::default()
        }
    }

    pub fn for_precise_scan() -> Self {
        Self {
            sampling_rate: 30,
            motion_threshold: 4000,
            card_threshold: 1,
            ..Default::default()
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(HandDetectionError::InvalidConfig(msg.to_string()));

        if self.sampling_rate == 0 {
            return fail("sampling_rate must be at least 1");
        }
        if self.num_workers == 0 {
            return fail("num_workers must be at least 1");
        }
        if !(self.min_hand_duration > 0.0) || !(self.max_hand_duration > self.min_hand_duration) {
            return fail("hand duration bounds must satisfy 0 < min < max");
        }
        if self.motion_threshold == 0 {
            return fail("motion_threshold must be positive");
        }
        if self.ui_buffer_before < 0.0 || self.ui_buffer_after < 0.0 {
            return fail("ui buffers must not be negative");
        }
        if !(self.split_target_duration > 0.0) || self.merge_gap_seconds < 0.0 {
            return fail("split_target_duration must be positive and merge_gap_seconds non-negative");
        }
        // 拆分段时长落在 (target / 2, target)
        if self.split_target_duration > self.max_hand_duration
            || self.split_target_duration < 2.0 * self.min_hand_duration
        {
            return fail("split_target_duration must lie in [2 * min_hand_duration, max_hand_duration]");
        }
        if !(0.0..=1.0).contains(&self.ui_probability_threshold) {
            return fail("ui_probability_threshold must lie in [0, 1]");
        }
        if self.target_width == 0 || self.target_height == 0 {
            return fail("target resolution must be non-zero");
        }
        if !(self.source_fps > 0.0) {
            return fail("source_fps must be positive");
        }
        Ok(())
    }

    /// 相邻采样的间隔秒数
    pub fn sample_interval(&self, fps: f64) -> f64 {
        self.sampling_rate as f64 / fps
    }

    /// UI 持续窗口的采样数
    pub fn ui_window_len(&self, fps: f64) -> usize {
        self.samples_for(self.ui_buffer_before, fps)
    }

    /// 一秒对应的采样数，至少为 1
    pub fn one_second_samples(&self, fps: f64) -> usize {
        self.samples_for(1.0, fps)
    }

    fn samples_for(&self, seconds: f64, fps: f64) -> usize {
        ((seconds * fps / self.sampling_rate as f64).ceil() as usize).max(1)
    }
}

use super::postprocess::PostProcessStats;
use super::types::{PokerHand, UiSegment};
use crate::core::config::BoundaryStrategy;
use crate::core::error::Result;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// 一次检测的完整结果
#[derive(Debug, Clone, Serialize)]
pub struct HandReport {
    pub video: String,
    pub video_duration: f64,
    pub fps: f64,
    pub sampled_frames: usize,
    pub skipped_frames: u64,
    pub chunks: usize,
    pub event_count: usize,
    pub strategy: BoundaryStrategy,
    pub ui_segments: Vec<UiSegment>,
    pub stats: PostProcessStats,
    pub hands: Vec<PokerHand>,
    pub elapsed_seconds: f64,
}

impl HandReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 只输出牌局列表（下游记录格式）
    pub fn hands_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.hands)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

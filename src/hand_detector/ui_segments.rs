//! 从逐采样信号中提取 UI 片段

use super::types::UiSegment;
use crate::core::config::Config;
use crate::core::signals::{SignalRecord, UiType};
use log::debug;

const UI_TYPES: [UiType; 4] = [UiType::Stats, UiType::Break, UiType::Ad, UiType::Unknown];

/// 构建中的片段，类型投票按覆盖秒数加权
#[derive(Debug, Clone, Copy)]
struct Region {
    start: f64,
    end: f64,
    weighted_confidence: f64,
    type_seconds: [f64; 4],
}

impl Region {
    fn from_segment(segment: &UiSegment) -> Self {
        let mut type_seconds = [0.0; 4];
        type_seconds[type_slot(segment.ui_type)] = segment.duration();
        Self {
            start: segment.start,
            end: segment.end,
            weighted_confidence: segment.confidence as f64 * segment.duration(),
            type_seconds,
        }
    }

    fn absorb(&mut self, other: &Region) {
        self.end = self.end.max(other.end);
        self.weighted_confidence += other.weighted_confidence;
        for (mine, theirs) in self.type_seconds.iter_mut().zip(other.type_seconds.iter()) {
            *mine += theirs;
        }
    }

    fn into_segment(self) -> UiSegment {
        let covered: f64 = self.type_seconds.iter().sum();
        let confidence = if covered > 0.0 {
            (self.weighted_confidence / covered) as f32
        } else {
            0.0
        };
        UiSegment::new(self.start, self.end, confidence, dominant_type(&self.type_seconds))
    }
}

fn type_slot(ui_type: UiType) -> usize {
    match ui_type {
        UiType::Stats => 0,
        UiType::Break => 1,
        UiType::Ad => 2,
        UiType::Unknown => 3,
    }
}

/// 票数相同时取 `UI_TYPES` 中靠前的类型
fn dominant_type(type_seconds: &[f64; 4]) -> UiType {
    let mut best = 0;
    for slot in 1..4 {
        if type_seconds[slot] > type_seconds[best] {
            best = slot;
        }
    }
    UI_TYPES[best]
}

/// 原始 UI 连续区间，每个采样覆盖其时间戳起 `sample_interval` 秒
pub fn raw_ui_regions(
    signals: &[SignalRecord],
    threshold: f32,
    sample_interval: f64,
) -> Vec<UiSegment> {
    let mut segments = Vec::new();
    let mut run: Vec<&SignalRecord> = Vec::new();

    for signal in signals {
        if signal.is_ui(threshold) {
            run.push(signal);
        } else {
            flush_run(&mut run, &mut segments, sample_interval);
        }
    }
    flush_run(&mut run, &mut segments, sample_interval);

    segments
}

fn flush_run(run: &mut Vec<&SignalRecord>, segments: &mut Vec<UiSegment>, sample_interval: f64) {
    if run.is_empty() {
        return;
    }
    let start = run[0].timestamp;
    let end = run[run.len() - 1].timestamp + sample_interval;
    let confidence = run.iter().map(|s| s.ui_probability).sum::<f32>() / run.len() as f32;

    let mut type_seconds = [0.0; 4];
    for s in run.iter() {
        type_seconds[type_slot(s.ui_type)] += sample_interval;
    }
    segments.push(UiSegment::new(
        start,
        end,
        confidence,
        dominant_type(&type_seconds),
    ));
    run.clear();
}

/// 合并间隔小于 `max_gap` 秒的区间，再丢弃短于 `min_duration` 的
pub fn merge_ui_regions(mut regions: Vec<UiSegment>, max_gap: f64, min_duration: f64) -> Vec<UiSegment> {
    regions.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged: Vec<Region> = Vec::new();
    for segment in &regions {
        let region = Region::from_segment(segment);
        match merged.last_mut() {
            Some(last) if region.start - last.end < max_gap => last.absorb(&region),
            _ => merged.push(region),
        }
    }

    let before = merged.len();
    let segments: Vec<UiSegment> = merged
        .into_iter()
        .map(Region::into_segment)
        .filter(|s| s.duration() >= min_duration)
        .collect();

    debug!(
        "UI regions: {} raw, {} merged, {} kept",
        regions.len(),
        before,
        segments.len()
    );
    segments
}

pub fn build_ui_segments(signals: &[SignalRecord], config: &Config, fps: f64) -> Vec<UiSegment> {
    let regions = raw_ui_regions(
        signals,
        config.ui_probability_threshold,
        config.sample_interval(fps),
    );
    merge_ui_regions(
        regions,
        config.ui_merge_gap_seconds,
        config.ui_min_segment_seconds,
    )
}

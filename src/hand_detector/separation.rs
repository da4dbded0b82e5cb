//! 基于 UI 片段的批量牌局切分
//!
//! 直播图层出现在两手牌之间，所以 UI 片段之间的空隙（两侧扣除缓冲）就是牌局。
//! 纯函数，调用之间不保留状态。

use super::types::{CandidateSource, HandCandidate, UiSegment};
use crate::core::config::Config;
use crate::core::signals::UiType;
use log::debug;

const BASE_CONFIDENCE: f32 = 0.5;
const UI_CONFIDENCE_WEIGHT: f32 = 0.2;
const NO_UI_CONFIDENCE: f32 = 0.5;
/// 电视转播中常见的单手时长（秒），落在其中的候选加分更多
const TYPICAL_HAND: (f64, f64) = (60.0, 300.0);

#[derive(Debug, Clone, Copy)]
pub struct HandSeparationAlgorithm {
    min_hand_duration: f64,
    max_hand_duration: f64,
    buffer_before: f64,
    buffer_after: f64,
}

impl HandSeparationAlgorithm {
    pub fn new(config: &Config) -> Self {
        Self {
            min_hand_duration: config.min_hand_duration,
            max_hand_duration: config.max_hand_duration,
            buffer_before: config.ui_buffer_before,
            buffer_after: config.ui_buffer_after,
        }
    }

    pub fn generate_candidates(
        &self,
        segments: &[UiSegment],
        video_duration: f64,
    ) -> Vec<HandCandidate> {
        if segments.is_empty() {
            debug!("no UI segments, whole video is one candidate");
            return vec![HandCandidate::new(
                0.0,
                video_duration,
                NO_UI_CONFIDENCE,
                CandidateSource::NoUi,
            )];
        }

        let mut sorted = segments.to_vec();
        sorted.sort_by(|a, b| a.start.total_cmp(&b.start));
        let mut candidates = Vec::new();

        let first = &sorted[0];
        let leading_end = first.start - self.buffer_before;
        if leading_end >= self.min_hand_duration {
            let confidence = self.edge_confidence(first, leading_end);
            candidates.push(HandCandidate::new(
                0.0,
                leading_end,
                confidence,
                CandidateSource::BeforeFirstUi,
            ));
        }

        for pair in sorted.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            let start = prev.end + self.buffer_after;
            let end = next.start - self.buffer_before;
            let duration = end - start;

            if duration >= self.min_hand_duration && duration <= self.max_hand_duration {
                candidates.push(HandCandidate::new(
                    start,
                    end,
                    self.between_confidence(prev, next, duration),
                    CandidateSource::BetweenUi,
                ));
            } else {
                debug!(
                    "skipping gap {:.1}-{:.1}s ({:.1}s) between UI segments",
                    start, end, duration
                );
            }
        }

        let last = &sorted[sorted.len() - 1];
        let trailing_start = last.end + self.buffer_after;
        if video_duration - trailing_start >= self.min_hand_duration {
            let confidence = self.edge_confidence(last, video_duration - trailing_start);
            candidates.push(HandCandidate::new(
                trailing_start,
                video_duration,
                confidence,
                CandidateSource::AfterLastUi,
            ));
        }

        candidates
    }

    fn between_confidence(&self, prev: &UiSegment, next: &UiSegment, duration: f64) -> f32 {
        let ui_avg = (prev.confidence + next.confidence) / 2.0;
        let type_bonus = if prev.ui_type == UiType::Stats && next.ui_type == UiType::Stats {
            0.1
        } else {
            0.0
        };
        (BASE_CONFIDENCE + UI_CONFIDENCE_WEIGHT * ui_avg + duration_bonus(duration) + type_bonus)
            .min(1.0)
    }

    /// 首尾候选只有一侧是 UI 片段
    fn edge_confidence(&self, segment: &UiSegment, duration: f64) -> f32 {
        (BASE_CONFIDENCE + UI_CONFIDENCE_WEIGHT * segment.confidence + duration_bonus(duration))
            .min(1.0)
    }
}

fn duration_bonus(duration: f64) -> f32 {
    if duration >= TYPICAL_HAND.0 && duration <= TYPICAL_HAND.1 {
        0.2
    } else {
        0.1
    }
}

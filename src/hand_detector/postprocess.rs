//! 候选牌局的时长校验、合并与拆分

use super::types::{HandCandidate, PokerHand, ValidationStatus};
use crate::core::config::Config;
use crate::core::progress::{self, ProgressCallback};
use log::{debug, info};
use serde::Serialize;

/// 拆分后每段保留的置信度比例
const SPLIT_CONFIDENCE_FACTOR: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateValidity {
    Valid,
    TooShort,
    TooLong,
}

/// 一次后处理的统计
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostProcessStats {
    pub total_candidates: usize,
    pub valid: usize,
    pub too_short: usize,
    pub too_long: usize,
    /// 合并次数，每对计一次
    pub merged: usize,
    /// 拆分产生的段数
    pub split: usize,
    /// 无法保留的过短候选（含合并后仍过短的）
    pub dropped: usize,
    pub hands: usize,
    pub mean_duration: f64,
    pub mean_confidence: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PostProcessOutput {
    pub hands: Vec<PokerHand>,
    pub stats: PostProcessStats,
}

#[derive(Debug, Clone, Copy)]
pub struct HandSeparationPostProcessor {
    min_hand_duration: f64,
    max_hand_duration: f64,
    merge_gap: f64,
    split_target: f64,
}

impl HandSeparationPostProcessor {
    pub fn new(config: &Config) -> Self {
        Self {
            min_hand_duration: config.min_hand_duration,
            max_hand_duration: config.max_hand_duration,
            merge_gap: config.merge_gap_seconds,
            split_target: config.split_target_duration,
        }
    }

    pub fn classify(&self, duration: f64) -> CandidateValidity {
        if duration < self.min_hand_duration {
            CandidateValidity::TooShort
        } else if duration > self.max_hand_duration {
            CandidateValidity::TooLong
        } else {
            CandidateValidity::Valid
        }
    }

    pub fn process(
        &self,
        mut candidates: Vec<HandCandidate>,
        progress: Option<&ProgressCallback>,
    ) -> PostProcessOutput {
        candidates.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut stats = PostProcessStats {
            total_candidates: candidates.len(),
            ..Default::default()
        };
        for candidate in &candidates {
            match self.classify(candidate.duration()) {
                CandidateValidity::Valid => stats.valid += 1,
                CandidateValidity::TooShort => stats.too_short += 1,
                CandidateValidity::TooLong => stats.too_long += 1,
            }
        }

        let total = candidates.len() as u64;
        let mut hands = Vec::with_capacity(candidates.len());
        let mut i = 0;
        while i < candidates.len() {
            let current = candidates[i];
            match self.classify(current.duration()) {
                CandidateValidity::Valid => {
                    hands.push(PokerHand::new(
                        current.start,
                        current.end,
                        current.confidence,
                        ValidationStatus::Valid,
                    ));
                    i += 1;
                }
                CandidateValidity::TooLong => {
                    let pieces = self.split(current.start, current.end, current.confidence);
                    stats.split += pieces.len();
                    hands.extend(pieces);
                    i += 1;
                }
                CandidateValidity::TooShort => {
                    match candidates.get(i + 1) {
                        Some(next) if next.start - current.end < self.merge_gap => {
                            stats.merged += 1;
                            self.place_merged(&current, next, &mut hands, &mut stats);
                            i += 2;
                        }
                        _ => {
                            debug!(
                                "dropping short candidate {:.1}-{:.1}s",
                                current.start, current.end
                            );
                            stats.dropped += 1;
                            i += 1;
                        }
                    }
                }
            }
            progress::report(progress, "validation", (i as u64).min(total), total);
        }

        hands.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        for (n, hand) in hands.iter_mut().enumerate() {
            hand.hand_id = n as u32 + 1;
        }

        stats.hands = hands.len();
        if !hands.is_empty() {
            let count = hands.len() as f64;
            stats.mean_duration = hands.iter().map(|h| h.duration).sum::<f64>() / count;
            stats.mean_confidence = hands.iter().map(|h| h.confidence as f64).sum::<f64>() / count;
        }

        info!(
            "✂️ Post-processing: {} candidates -> {} hands ({} merged, {} split pieces, {} dropped)",
            stats.total_candidates, stats.hands, stats.merged, stats.split, stats.dropped
        );

        PostProcessOutput { hands, stats }
    }

    /// 合并结果重新按时长上下限校验
    fn place_merged(
        &self,
        first: &HandCandidate,
        second: &HandCandidate,
        hands: &mut Vec<PokerHand>,
        stats: &mut PostProcessStats,
    ) {
        let start = first.start;
        let end = second.end.max(first.end);
        let confidence = (first.confidence + second.confidence) / 2.0;

        match self.classify(end - start) {
            CandidateValidity::Valid => {
                hands.push(PokerHand::new(start, end, confidence, ValidationStatus::Merged));
            }
            CandidateValidity::TooLong => {
                let pieces = self.split(start, end, confidence);
                stats.split += pieces.len();
                hands.extend(pieces);
            }
            CandidateValidity::TooShort => {
                debug!("merged {:.1}-{:.1}s still too short", start, end);
                stats.dropped += 1;
            }
        }
    }

    /// 等分为 `floor(D / target) + 1` 段，段数限制在时长上下限之内，
    /// 最后一段恰好结束于 `end`
    pub fn split(&self, start: f64, end: f64, confidence: f32) -> Vec<PokerHand> {
        let duration = end - start;
        let fewest = (duration / self.max_hand_duration).ceil() as usize;
        let most = ((duration / self.min_hand_duration).floor() as usize).max(fewest);
        let count = ((duration / self.split_target).floor() as usize + 1)
            .clamp(fewest, most)
            .max(1);
        let piece = duration / count as f64;
        let confidence = confidence * SPLIT_CONFIDENCE_FACTOR;

        (0..count)
            .map(|k| {
                let piece_start = start + k as f64 * piece;
                let piece_end = if k + 1 == count {
                    end
                } else {
                    start + (k + 1) as f64 * piece
                };
                PokerHand::new(piece_start, piece_end, confidence, ValidationStatus::Split)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand_detector::types::CandidateSource;
    use std::sync::{Arc, Mutex};

    fn candidate(start: f64, end: f64, confidence: f32) -> HandCandidate {
        HandCandidate::new(start, end, confidence, CandidateSource::BetweenUi)
    }

    fn processor() -> HandSeparationPostProcessor {
        HandSeparationPostProcessor::new(&Config::default())
    }

    #[test]
    fn test_classify_bounds() {
        let p = processor();
        assert_eq!(p.classify(29.9), CandidateValidity::TooShort);
        assert_eq!(p.classify(30.0), CandidateValidity::Valid);
        assert_eq!(p.classify(600.0), CandidateValidity::Valid);
        assert_eq!(p.classify(600.1), CandidateValidity::TooLong);
    }

    #[test]
    fn test_short_candidate_merges_with_next() {
        let output = processor().process(
            vec![candidate(0.0, 20.0, 0.6), candidate(35.0, 100.0, 0.8)],
            None,
        );

        assert_eq!(output.hands.len(), 1);
        let hand = output.hands[0];
        assert_eq!((hand.start_time, hand.end_time), (0.0, 100.0));
        assert_eq!(hand.validation_status, ValidationStatus::Merged);
        assert!((hand.confidence - 0.7).abs() < 1e-6);
        assert_eq!(output.stats.merged, 1);
    }

    #[test]
    fn test_long_candidate_splits_evenly() {
        let output = processor().process(vec![candidate(0.0, 700.0, 1.0)], None);

        let bounds: Vec<(f64, f64)> = output
            .hands
            .iter()
            .map(|h| (h.start_time, h.end_time))
            .collect();
        assert_eq!(
            bounds,
            vec![(0.0, 175.0), (175.0, 350.0), (350.0, 525.0), (525.0, 700.0)]
        );
        assert!(output
            .hands
            .iter()
            .all(|h| h.validation_status == ValidationStatus::Split && h.confidence == 0.8));
        let ids: Vec<u32> = output.hands.iter().map(|h| h.hand_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(output.stats.split, 4);
        assert_eq!(output.stats.too_long, 1);
    }

    #[test]
    fn test_split_pieces_stay_in_bounds() {
        let config = Config::default();
        let p = processor();
        let mut duration = config.max_hand_duration + 0.5;
        while duration <= 5.0 * config.max_hand_duration {
            let pieces = p.split(100.0, 100.0 + duration, 1.0);
            for piece in &pieces {
                assert!(
                    piece.duration >= config.min_hand_duration
                        && piece.duration <= config.max_hand_duration,
                    "{:.2}s split into a {:.2}s piece",
                    duration,
                    piece.duration
                );
            }
            assert_eq!(pieces.last().map(|h| h.end_time), Some(100.0 + duration));
            duration += 7.3;
        }
    }

    #[test]
    fn test_split_clamped_for_unchecked_target() {
        let wide = HandSeparationPostProcessor::new(&Config {
            split_target_duration: 1000.0,
            ..Default::default()
        });
        let pieces = wide.split(0.0, 700.0, 1.0);
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].end_time, 350.0);

        let narrow = HandSeparationPostProcessor::new(&Config {
            split_target_duration: 20.0,
            ..Default::default()
        });
        let pieces = narrow.split(0.0, 700.0, 1.0);
        assert_eq!(pieces.len(), 23);
        assert!(pieces.iter().all(|h| h.duration >= 30.0));
    }

    #[test]
    fn test_unmergeable_short_dropped() {
        let output = processor().process(
            vec![candidate(0.0, 20.0, 0.9), candidate(100.0, 200.0, 0.9)],
            None,
        );

        assert_eq!(output.hands.len(), 1);
        assert_eq!(output.hands[0].start_time, 100.0);
        assert_eq!(output.hands[0].hand_id, 1);
        assert_eq!(output.stats.dropped, 1);
        assert_eq!(output.stats.too_short, 1);
    }

    #[test]
    fn test_merged_result_revalidated() {
        let p = processor();

        let still_short = p.process(vec![candidate(0.0, 5.0, 0.9), candidate(10.0, 20.0, 0.9)], None);
        assert!(still_short.hands.is_empty());
        assert_eq!(still_short.stats.merged, 1);
        assert_eq!(still_short.stats.dropped, 1);

        let too_long = p.process(vec![candidate(0.0, 20.0, 1.0), candidate(30.0, 700.0, 1.0)], None);
        assert_eq!(too_long.hands.len(), 4);
        assert_eq!(too_long.hands[3].end_time, 700.0);
        assert!(too_long
            .hands
            .iter()
            .all(|h| h.validation_status == ValidationStatus::Split));
    }

    #[test]
    fn test_output_within_bounds() {
        let config = Config::default();
        let output = processor().process(
            vec![
                candidate(0.0, 10.0, 0.5),
                candidate(12.0, 50.0, 0.5),
                candidate(80.0, 1500.0, 0.9),
                candidate(1600.0, 1700.0, 0.7),
            ],
            None,
        );

        assert!(output.hands.iter().all(|h| {
            h.duration >= config.min_hand_duration && h.duration <= config.max_hand_duration
        }));
        assert!(output
            .hands
            .windows(2)
            .all(|w| w[0].end_time <= w[1].start_time && w[0].hand_id + 1 == w[1].hand_id));
        assert!(output.stats.mean_duration > 0.0);
    }

    #[test]
    fn test_reports_validation_progress() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let callback: Arc<ProgressCallback> =
            Arc::new(move |stage: &str, pct: f64, current: u64, total: u64| {
                sink.lock()
                    .unwrap()
                    .push((stage.to_string(), pct, current, total));
            });

        processor().process(
            vec![candidate(0.0, 60.0, 0.5), candidate(100.0, 160.0, 0.5)],
            Some(callback.as_ref()),
        );

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.0 == "validation"));
        assert_eq!(calls[1].1, 100.0);
    }
}

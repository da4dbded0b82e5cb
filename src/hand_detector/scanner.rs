//! 分块并行信号提取

use super::event::{sort_events, Event, EventKind};
use crate::core::config::Config;
use crate::core::error::{HandDetectionError, Result};
use crate::core::progress::CancelToken;
use crate::core::signals::{SignalProviders, SignalRecord};
use crate::core::video::Frame;
use log::{debug, info};
use rayon::prelude::*;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};

/// 每块保留的运动面积历史长度
const MOTION_HISTORY: usize = 5;
/// 预热采样数，之前的差值不可信
const WARMUP_SAMPLES: usize = 2;
const HAND_END_CONFIDENCE: f32 = 80.0;

/// 单个分块的产出，按采样顺序
#[derive(Debug, Clone)]
pub struct ChunkResult {
    pub chunk_id: usize,
    pub events: Vec<Event>,
    pub signals: Vec<SignalRecord>,
}

/// 汇总结果：全局有序的事件和逐采样信号
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    pub events: Vec<Event>,
    pub signals: Vec<SignalRecord>,
    pub chunks: usize,
}

pub struct ParallelCandidateScanner<'c> {
    config: &'c Config,
    providers: SignalProviders,
    /// 触发 `UiPersistent` 所需的连续 UI 采样数
    persistence_samples: usize,
}

/// 分块内部状态，不跨块共享
struct ChunkState {
    prev_frame: Option<Frame>,
    motion_history: VecDeque<u32>,
    prev_ui: Option<bool>,
    ui_run_len: usize,
    ui_run_prob_sum: f32,
}

impl ChunkState {
    fn new() -> Self {
        Self {
            prev_frame: None,
            motion_history: VecDeque::with_capacity(MOTION_HISTORY),
            prev_ui: None,
            ui_run_len: 0,
            ui_run_prob_sum: 0.0,
        }
    }

    fn push_motion(&mut self, area: u32) {
        if self.motion_history.len() >= MOTION_HISTORY {
            self.motion_history.pop_front();
        }
        self.motion_history.push_back(area);
    }
}

impl<'c> ParallelCandidateScanner<'c> {
    pub fn new(config: &'c Config, providers: SignalProviders, fps: f64) -> Self {
        Self {
            config,
            providers,
            persistence_samples: config.ui_window_len(fps),
        }
    }

    /// 按 `ceil(total / num_workers)` 帧切成连续分块
    pub fn partition(frames: Vec<Frame>, num_workers: usize) -> Vec<Vec<Frame>> {
        if frames.is_empty() {
            return Vec::new();
        }
        let chunk_size = (frames.len() + num_workers.max(1) - 1) / num_workers.max(1);

        let mut chunks = Vec::with_capacity(num_workers);
        let mut rest = frames.into_iter().peekable();
        while rest.peek().is_some() {
            chunks.push(rest.by_ref().take(chunk_size).collect());
        }
        chunks
    }

    pub fn scan(&self, frames: Vec<Frame>, cancel: &CancelToken) -> Result<ScanOutput> {
        let total = frames.len();
        let chunks = Self::partition(frames, self.config.num_workers);
        info!(
            "🔍 Scanning {} samples in {} chunks on {} workers",
            total,
            chunks.len(),
            self.config.num_workers
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.num_workers)
            .build()
            .map_err(|e| HandDetectionError::WorkerPool(e.to_string()))?;

        // 每块一个槽位，按下标填充
        let slots: Vec<Result<ChunkResult>> = pool.install(|| {
            chunks
                .into_par_iter()
                .enumerate()
                .map(|(chunk_id, chunk)| {
                    panic::catch_unwind(AssertUnwindSafe(|| {
                        self.scan_chunk(chunk_id, chunk, cancel)
                    }))
                    .unwrap_or_else(|payload| {
                        Err(HandDetectionError::ScanWorkerFailed {
                            chunk_id,
                            cause: panic_message(payload.as_ref()),
                        })
                    })
                })
                .collect()
        });

        if cancel.is_cancelled() {
            return Err(HandDetectionError::Aborted);
        }

        let mut results = Vec::with_capacity(slots.len());
        for slot in slots {
            results.push(slot?);
        }

        Ok(Self::fan_in(results))
    }

    fn scan_chunk(
        &self,
        chunk_id: usize,
        frames: Vec<Frame>,
        cancel: &CancelToken,
    ) -> Result<ChunkResult> {
        let mut state = ChunkState::new();
        let mut events = Vec::new();
        let mut signals = Vec::with_capacity(frames.len());
        let threshold = self.config.motion_threshold as f64;

        for frame in frames {
            if cancel.is_cancelled() {
                return Err(HandDetectionError::Aborted);
            }

            let prev_area = state.motion_history.back().copied();
            let record = self
                .providers
                .read(&frame, state.prev_frame.as_ref(), prev_area);
            let area = record.motion_area as f64;

            let warm = state.motion_history.len() >= WARMUP_SAMPLES;
            if warm
                && record.motion_delta as f64 > 0.5 * threshold
                && area > threshold
                && record.card_count >= self.config.card_threshold
            {
                let confidence =
                    (area / threshold * 50.0 + record.card_count as f64 * 10.0).min(100.0);
                events.push(Event::new(
                    EventKind::PotentialHandStart,
                    record.timestamp,
                    record.frame_index,
                    confidence as f32,
                ));
            }

            if let Some(prev) = prev_area {
                if prev as f64 > 2.0 * threshold && area < 0.5 * threshold {
                    events.push(Event::new(
                        EventKind::PotentialHandEnd,
                        record.timestamp,
                        record.frame_index,
                        HAND_END_CONFIDENCE,
                    ));
                }
            }

            self.track_ui(&mut state, &record, &mut events);

            state.push_motion(record.motion_area);
            state.prev_frame = Some(frame);
            signals.push(record);
        }

        debug!(
            "chunk {}: {} samples, {} events",
            chunk_id,
            signals.len(),
            events.len()
        );

        Ok(ChunkResult {
            chunk_id,
            events,
            signals,
        })
    }

    fn track_ui(&self, state: &mut ChunkState, record: &SignalRecord, events: &mut Vec<Event>) {
        let is_ui = record.is_ui(self.config.ui_probability_threshold);

        if let Some(prev_ui) = state.prev_ui {
            if prev_ui != is_ui {
                events.push(Event::new(
                    EventKind::UiTransition,
                    record.timestamp,
                    record.frame_index,
                    record.ui_probability * 100.0,
                ));
            }
        }
        state.prev_ui = Some(is_ui);

        if is_ui {
            state.ui_run_len += 1;
            state.ui_run_prob_sum += record.ui_probability;
            if state.ui_run_len == self.persistence_samples {
                let mean = state.ui_run_prob_sum / state.ui_run_len as f32;
                events.push(Event::new(
                    EventKind::UiPersistent,
                    record.timestamp,
                    record.frame_index,
                    mean * 100.0,
                ));
            }
        } else {
            state.ui_run_len = 0;
            state.ui_run_prob_sum = 0.0;
        }
    }

    /// 合并分块结果，与 worker 完成顺序无关
    pub fn fan_in(mut results: Vec<ChunkResult>) -> ScanOutput {
        results.sort_by_key(|r| r.chunk_id);

        let chunks = results.len();
        let mut events = Vec::new();
        let mut signals = Vec::new();
        for result in results {
            events.extend(result.events);
            signals.extend(result.signals);
        }

        sort_events(&mut events);
        signals.sort_by(|a, b| {
            a.timestamp
                .total_cmp(&b.timestamp)
                .then(a.frame_index.cmp(&b.frame_index))
        });

        ScanOutput {
            events,
            signals,
            chunks,
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

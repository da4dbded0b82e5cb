//! 流式边界融合
//!
//! 在全局有序的时间线上单线程归约：
//! 1. 运动/发牌事件负责开局和收局
//! 2. UI 窗口优先级更高：持续出现的图层在其出现前 `ui_buffer_before` 秒结束当前牌局
//! 3. 图层消失 `ui_buffer_after` 秒后才允许新牌局开始

use super::event::{Event, EventKind};
use super::types::{CandidateSource, HandCandidate};
use super::ui_window::UiWindow;
use crate::core::config::Config;
use crate::core::signals::SignalRecord;
use log::debug;
use std::cmp::Ordering;

const UI_BOUNDARY_CONFIDENCE: f32 = 0.8;
const OPEN_HAND_CONFIDENCE: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opener {
    Motion,
    UiEnd,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FusionState {
    Idle,
    AwaitingHandEnd {
        start: f64,
        confidence: f32,
        opened_by: Opener,
    },
    UiObserving {
        ui_start: f64,
    },
}

impl FusionState {
    pub fn name(&self) -> &'static str {
        match self {
            FusionState::Idle => "idle",
            FusionState::AwaitingHandEnd { .. } => "awaiting_hand_end",
            FusionState::UiObserving { .. } => "ui_observing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FusionTransition {
    HandStart { at: f64 },
    HandEnd { at: f64 },
    HandStartPossible { at: f64 },
    UiSessionOpened { at: f64 },
    UiSessionClosed { at: f64 },
}

/// 状态机只读快照
#[derive(Debug, Clone, PartialEq)]
pub struct FusionSnapshot {
    pub state: &'static str,
    pub hand_start: Option<f64>,
    pub ui_session_start: Option<f64>,
    pub window_true: usize,
    pub window_capacity: usize,
    pub candidates_emitted: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FusionOutput {
    pub candidates: Vec<HandCandidate>,
    pub transitions: Vec<FusionTransition>,
}

pub struct BoundaryStateMachine {
    state: FusionState,
    window: UiWindow,
    min_true_samples: usize,
    ui_threshold: f32,
    sample_interval: f64,
    buffer_before: f64,
    buffer_after: f64,
    close_open_hand_at_end: bool,
    last_ui_true: Option<f64>,
    seen_ui: bool,
    ui_events_seen: usize,
    output: FusionOutput,
}

impl BoundaryStateMachine {
    pub fn new(config: &Config, fps: f64) -> Self {
        Self {
            state: FusionState::Idle,
            window: UiWindow::with_capacity(config.ui_window_len(fps)),
            min_true_samples: config.one_second_samples(fps),
            ui_threshold: config.ui_probability_threshold,
            sample_interval: config.sample_interval(fps),
            buffer_before: config.ui_buffer_before,
            buffer_after: config.ui_buffer_after,
            close_open_hand_at_end: config.close_open_hand_at_end,
            last_ui_true: None,
            seen_ui: false,
            ui_events_seen: 0,
            output: FusionOutput::default(),
        }
    }

    pub fn current_state(&self) -> &FusionState {
        &self.state
    }

    pub fn snapshot(&self) -> FusionSnapshot {
        let (hand_start, ui_session_start) = match self.state {
            FusionState::Idle => (None, None),
            FusionState::AwaitingHandEnd { start, .. } => (Some(start), None),
            FusionState::UiObserving { ui_start } => (None, Some(ui_start)),
        };
        FusionSnapshot {
            state: self.state.name(),
            hand_start,
            ui_session_start,
            window_true: self.window.true_count(),
            window_capacity: self.window.capacity(),
            candidates_emitted: self.output.candidates.len(),
        }
    }

    pub fn on_event(&mut self, event: &Event) {
        let at = event.timestamp;
        match (&self.state, event.kind) {
            (_, EventKind::UiPersistent) | (_, EventKind::UiTransition) => {
                // UI 边界由采样窗口决定，忽略这些标记
                self.ui_events_seen += 1;
            }
            (FusionState::Idle, EventKind::PotentialHandStart) => {
                self.state = FusionState::AwaitingHandEnd {
                    start: at,
                    confidence: event.confidence / 100.0,
                    opened_by: Opener::Motion,
                };
                self.output.transitions.push(FusionTransition::HandStart { at });
            }
            (FusionState::AwaitingHandEnd { start, .. }, EventKind::PotentialHandEnd) => {
                if at > *start {
                    self.close_hand(at, event.confidence / 100.0, false);
                    self.state = FusionState::Idle;
                }
            }
            (FusionState::AwaitingHandEnd { .. }, EventKind::PotentialHandStart)
            | (FusionState::Idle, EventKind::PotentialHandEnd)
            | (FusionState::UiObserving { .. }, EventKind::PotentialHandStart)
            | (FusionState::UiObserving { .. }, EventKind::PotentialHandEnd) => {}
        }
    }

    pub fn on_ui_sample(&mut self, timestamp: f64, probability: f32) {
        let is_ui = probability >= self.ui_threshold;
        self.window.push(timestamp, is_ui);
        if is_ui {
            self.last_ui_true = Some(timestamp);
        }

        if let FusionState::UiObserving { .. } = self.state {
            if self.window.true_count() < self.min_true_samples {
                let ui_end = self.last_ui_true.unwrap_or(timestamp) + self.sample_interval;
                let start = ui_end + self.buffer_after;
                self.output
                    .transitions
                    .push(FusionTransition::UiSessionClosed { at: ui_end });
                self.output
                    .transitions
                    .push(FusionTransition::HandStartPossible { at: start });
                self.state = FusionState::AwaitingHandEnd {
                    start,
                    confidence: UI_BOUNDARY_CONFIDENCE,
                    opened_by: Opener::UiEnd,
                };
            }
            return;
        }

        if self.window.is_saturated() {
            let ui_start = self.window.oldest_timestamp().unwrap_or(timestamp);
            if let FusionState::AwaitingHandEnd { start, .. } = self.state {
                let end = ui_start - self.buffer_before;
                if end > start {
                    self.close_hand(end, UI_BOUNDARY_CONFIDENCE, true);
                } else {
                    debug!("hand from {:.1}s swallowed by UI at {:.1}s", start, ui_start);
                }
            }
            self.seen_ui = true;
            self.output
                .transitions
                .push(FusionTransition::UiSessionOpened { at: ui_start });
            self.state = FusionState::UiObserving { ui_start };
        }
    }

    fn close_hand(&mut self, end: f64, end_confidence: f32, closed_by_ui: bool) {
        if let FusionState::AwaitingHandEnd {
            start,
            confidence,
            opened_by,
        } = self.state
        {
            let source = match (opened_by, closed_by_ui, self.seen_ui) {
                (Opener::UiEnd, true, _) | (Opener::Motion, true, true) => CandidateSource::BetweenUi,
                (Opener::Motion, true, false) => CandidateSource::BeforeFirstUi,
                (_, false, true) => CandidateSource::AfterLastUi,
                (_, false, false) => CandidateSource::NoUi,
            };
            self.output.candidates.push(HandCandidate::new(
                start,
                end,
                (confidence + end_confidence) / 2.0,
                source,
            ));
            self.output
                .transitions
                .push(FusionTransition::HandEnd { at: end });
        }
    }

    /// 输入结束。未结束的牌局仅在配置开启时输出
    pub fn finish(mut self, video_end: f64) -> FusionOutput {
        if let FusionState::AwaitingHandEnd { start, .. } = self.state {
            if self.close_open_hand_at_end && video_end > start {
                let source = if self.seen_ui {
                    CandidateSource::AfterLastUi
                } else {
                    CandidateSource::NoUi
                };
                self.output.candidates.push(HandCandidate::new(
                    start,
                    video_end,
                    OPEN_HAND_CONFIDENCE,
                    source,
                ));
                self.output
                    .transitions
                    .push(FusionTransition::HandEnd { at: video_end });
            } else {
                debug!("discarding hand still open since {:.1}s", start);
            }
        }
        debug!(
            "fusion done: {} candidates, {} UI markers",
            self.output.candidates.len(),
            self.ui_events_seen
        );
        self.output
    }
}

/// 用新的状态机跑完合并后的时间线，同一位置上 UI 采样先于事件处理
pub fn fuse(
    events: &[Event],
    signals: &[SignalRecord],
    config: &Config,
    fps: f64,
    video_end: f64,
) -> FusionOutput {
    let mut machine = BoundaryStateMachine::new(config, fps);
    let (mut i, mut j) = (0, 0);

    while i < signals.len() || j < events.len() {
        let take_signal = match (signals.get(i), events.get(j)) {
            (Some(s), Some(e)) => {
                s.timestamp
                    .total_cmp(&e.timestamp)
                    .then(s.frame_index.cmp(&e.frame_index))
                    != Ordering::Greater
            }
            (Some(_), None) => true,
            _ => false,
        };

        if take_signal {
            let s = &signals[i];
            machine.on_ui_sample(s.timestamp, s.ui_probability);
            i += 1;
        } else {
            machine.on_event(&events[j]);
            j += 1;
        }
    }

    machine.finish(video_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::signals::UiType;

    const FPS: f64 = 30.0;

    fn signal(t: f64, ui: bool) -> SignalRecord {
        SignalRecord {
            timestamp: t,
            frame_index: (t * FPS) as u64,
            motion_area: 0,
            motion_delta: 0,
            card_count: 0,
            chip_count: 0,
            ui_probability: if ui { 0.9 } else { 0.1 },
            ui_type: if ui { UiType::Stats } else { UiType::Unknown },
        }
    }

    /// 每 2 秒一个采样直到 `until`，`[ui_from, ui_to)` 内有 UI
    fn signals(until: f64, ui_from: f64, ui_to: f64) -> Vec<SignalRecord> {
        (0..)
            .map(|k| k as f64 * 2.0)
            .take_while(|t| *t < until)
            .map(|t| signal(t, t >= ui_from && t < ui_to))
            .collect()
    }

    fn event(kind: EventKind, t: f64, confidence: f32) -> Event {
        Event::new(kind, t, (t * FPS) as u64, confidence)
    }

    #[test]
    fn test_motion_only_hand() {
        let config = Config::default();
        let events = vec![
            event(EventKind::PotentialHandStart, 10.0, 60.0),
            event(EventKind::PotentialHandEnd, 80.0, 80.0),
        ];
        let output = fuse(&events, &signals(100.0, 1e9, 1e9), &config, FPS, 100.0);

        assert_eq!(output.candidates.len(), 1);
        let c = output.candidates[0];
        assert_eq!((c.start, c.end), (10.0, 80.0));
        assert_eq!(c.source, CandidateSource::NoUi);
        assert!((c.confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_ui_persistence_ends_hand_early() {
        let config = Config::default();
        let events = vec![event(EventKind::PotentialHandStart, 10.0, 60.0)];
        let output = fuse(&events, &signals(200.0, 100.0, 130.0), &config, FPS, 200.0);

        assert_eq!(output.candidates.len(), 1);
        let c = output.candidates[0];
        assert_eq!((c.start, c.end), (10.0, 85.0));
        assert_eq!(c.source, CandidateSource::BeforeFirstUi);

        assert!(output
            .transitions
            .contains(&FusionTransition::UiSessionOpened { at: 100.0 }));
        assert!(output
            .transitions
            .contains(&FusionTransition::UiSessionClosed { at: 130.0 }));
        assert!(output
            .transitions
            .contains(&FusionTransition::HandStartPossible { at: 145.0 }));
    }

    #[test]
    fn test_open_hand_dropped_by_default() {
        let config = Config::default();
        let output = fuse(&[], &signals(300.0, 100.0, 130.0), &config, FPS, 300.0);
        assert!(output.candidates.is_empty());
    }

    #[test]
    fn test_open_hand_closed_when_configured() {
        let config = Config {
            close_open_hand_at_end: true,
            ..Default::default()
        };
        let output = fuse(&[], &signals(300.0, 100.0, 130.0), &config, FPS, 300.0);

        assert_eq!(output.candidates.len(), 1);
        let c = output.candidates[0];
        assert_eq!((c.start, c.end), (145.0, 300.0));
        assert_eq!(c.source, CandidateSource::AfterLastUi);
        assert_eq!(c.confidence, 0.3);
    }

    #[test]
    fn test_hand_between_ui_sessions() {
        let config = Config::default();
        let mut samples = signals(400.0, 100.0, 130.0);
        for s in samples.iter_mut() {
            if s.timestamp >= 300.0 && s.timestamp < 340.0 {
                *s = signal(s.timestamp, true);
            }
        }
        let output = fuse(&[], &samples, &config, FPS, 400.0);

        assert_eq!(output.candidates.len(), 1);
        let c = output.candidates[0];
        assert_eq!((c.start, c.end), (145.0, 285.0));
        assert_eq!(c.source, CandidateSource::BetweenUi);
    }

    #[test]
    fn test_motion_ignored_during_ui() {
        let config = Config::default();
        let events = vec![
            event(EventKind::PotentialHandStart, 120.0, 90.0),
            event(EventKind::PotentialHandEnd, 125.0, 80.0),
        ];
        let output = fuse(&events, &signals(200.0, 100.0, 130.0), &config, FPS, 200.0);
        assert!(output.candidates.is_empty());
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let config = Config::default();
        let mut machine = BoundaryStateMachine::new(&config, FPS);
        let before = machine.snapshot();
        assert_eq!(before.state, "idle");
        assert_eq!(before.window_capacity, 8);

        machine.on_event(&event(EventKind::PotentialHandStart, 10.0, 50.0));
        let after = machine.snapshot();
        assert_eq!(after.state, "awaiting_hand_end");
        assert_eq!(after.hand_start, Some(10.0));
        assert_eq!(before.state, "idle");
        assert!(matches!(
            machine.current_state(),
            FusionState::AwaitingHandEnd {
                opened_by: Opener::Motion,
                ..
            }
        ));
    }

    #[test]
    fn test_end_before_start_ignored() {
        let config = Config::default();
        let mut machine = BoundaryStateMachine::new(&config, FPS);
        machine.on_event(&event(EventKind::PotentialHandEnd, 5.0, 80.0));
        assert_eq!(machine.current_state(), &FusionState::Idle);
        machine.on_event(&event(EventKind::PotentialHandStart, 10.0, 50.0));
        machine.on_event(&event(EventKind::PotentialHandStart, 20.0, 50.0));
        machine.on_event(&event(EventKind::PotentialHandEnd, 60.0, 80.0));

        let output = machine.finish(100.0);
        assert_eq!(output.candidates.len(), 1);
        assert_eq!(output.candidates[0].start, 10.0);
    }
}

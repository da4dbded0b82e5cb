use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PotentialHandStart,
    PotentialHandEnd,
    UiPersistent,
    UiTransition,
}

/// 扫描器输出的离散事件，置信度范围 0-100
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Event {
    pub kind: EventKind,
    pub timestamp: f64,
    pub frame_index: u64,
    pub confidence: f32,
}

impl Event {
    pub fn new(kind: EventKind, timestamp: f64, frame_index: u64, confidence: f32) -> Self {
        Self {
            kind,
            timestamp,
            frame_index,
            confidence: confidence.clamp(0.0, 100.0),
        }
    }

    /// 全局顺序：先时间戳，再帧号
    pub fn timeline_cmp(&self, other: &Event) -> Ordering {
        self.timestamp
            .total_cmp(&other.timestamp)
            .then(self.frame_index.cmp(&other.frame_index))
    }
}

/// 稳定排序到全局时间线顺序
pub fn sort_events(events: &mut [Event]) {
    events.sort_by(Event::timeline_cmp);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_by_timestamp_then_frame() {
        let mut events = vec![
            Event::new(EventKind::PotentialHandEnd, 4.0, 120, 80.0),
            Event::new(EventKind::UiTransition, 2.0, 61, 50.0),
            Event::new(EventKind::PotentialHandStart, 2.0, 60, 70.0),
        ];
        sort_events(&mut events);

        let order: Vec<u64> = events.iter().map(|e| e.frame_index).collect();
        assert_eq!(order, vec![60, 61, 120]);
    }

    #[test]
    fn test_sort_is_stable_on_full_ties() {
        let mut events = vec![
            Event::new(EventKind::UiTransition, 2.0, 60, 50.0),
            Event::new(EventKind::PotentialHandStart, 2.0, 60, 70.0),
        ];
        sort_events(&mut events);
        assert_eq!(events[0].kind, EventKind::UiTransition);
        assert_eq!(events[1].kind, EventKind::PotentialHandStart);
    }

    #[test]
    fn test_confidence_clamped() {
        assert_eq!(Event::new(EventKind::PotentialHandStart, 0.0, 0, 250.0).confidence, 100.0);
    }
}

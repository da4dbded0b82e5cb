//! 按帧号脚本化的检测器，用于测试和离线回放

use super::cards::CardDetector;
use super::chips::ChipDetector;
use super::motion::{MotionDetector, MotionReading};
use super::overlay::{UiDetector, UiReading};
use super::UiType;
use crate::core::video::Frame;

type Pattern<T> = Box<dyn Fn(u64) -> T + Send + Sync>;

pub struct MockMotionDetector {
    pattern: Pattern<u32>,
}

impl MockMotionDetector {
    pub fn with_pattern<F>(pattern: F) -> Self
    where
        F: Fn(u64) -> u32 + Send + Sync + 'static,
    {
        Self {
            pattern: Box::new(pattern),
        }
    }
}

impl MotionDetector for MockMotionDetector {
    fn detect(&self, frame: &Frame, _prev: Option<&Frame>) -> MotionReading {
        MotionReading {
            area: (self.pattern)(frame.index),
        }
    }
}

pub struct MockCardDetector {
    pattern: Pattern<u8>,
}

impl MockCardDetector {
    pub fn with_pattern<F>(pattern: F) -> Self
    where
        F: Fn(u64) -> u8 + Send + Sync + 'static,
    {
        Self {
            pattern: Box::new(pattern),
        }
    }
}

impl CardDetector for MockCardDetector {
    fn count(&self, frame: &Frame, _prev: Option<&Frame>) -> u8 {
        (self.pattern)(frame.index)
    }
}

pub struct MockChipDetector {
    pattern: Pattern<u8>,
}

impl MockChipDetector {
    pub fn with_pattern<F>(pattern: F) -> Self
    where
        F: Fn(u64) -> u8 + Send + Sync + 'static,
    {
        Self {
            pattern: Box::new(pattern),
        }
    }
}

impl ChipDetector for MockChipDetector {
    fn count(&self, frame: &Frame, _prev: Option<&Frame>) -> u8 {
        (self.pattern)(frame.index)
    }
}

pub struct MockUiDetector {
    pattern: Pattern<(f32, UiType)>,
}

impl MockUiDetector {
    pub fn with_pattern<F>(pattern: F) -> Self
    where
        F: Fn(u64) -> (f32, UiType) + Send + Sync + 'static,
    {
        Self {
            pattern: Box::new(pattern),
        }
    }

    /// 帧号落在给定区间内时显示 UI（统计类）
    pub fn with_ranges(ranges: Vec<std::ops::Range<u64>>) -> Self {
        Self::with_pattern(move |index| {
            if ranges.iter().any(|r| r.contains(&index)) {
                (0.9, UiType::Stats)
            } else {
                (0.05, UiType::Unknown)
            }
        })
    }
}

impl UiDetector for MockUiDetector {
    fn detect(&self, frame: &Frame, _prev: Option<&Frame>) -> UiReading {
        let (probability, ui_type) = (self.pattern)(frame.index);
        UiReading {
            probability,
            ui_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: u64) -> Frame {
        Frame::solid(index, 0.0, 1, 1, [0, 0, 0, 255])
    }

    #[test]
    fn test_mock_motion_with_pattern() {
        let detector = MockMotionDetector::with_pattern(|n| if n % 10 == 0 { 500 } else { 0 });
        assert_eq!(detector.detect(&frame(10), None).area, 500);
        assert_eq!(detector.detect(&frame(5), None).area, 0);
    }

    #[test]
    fn test_mock_ui_with_ranges() {
        let detector = MockUiDetector::with_ranges(vec![100..200]);
        let inside = detector.detect(&frame(150), None);
        assert!(inside.probability > 0.5);
        assert_eq!(inside.ui_type, UiType::Stats);
        assert!(detector.detect(&frame(200), None).probability < 0.5);
    }
}

use crate::core::video::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionReading {
    /// 两帧间变化的像素数
    pub area: u32,
}

pub trait MotionDetector: Send + Sync {
    fn detect(&self, frame: &Frame, prev: Option<&Frame>) -> MotionReading;
}

/// 与上一采样做亮度帧差
pub struct FrameDiffMotionDetector {
    pixel_threshold: u8,
}

impl FrameDiffMotionDetector {
    pub fn new() -> Self {
        Self {
            pixel_threshold: 25,
        }
    }

    pub fn with_threshold(pixel_threshold: u8) -> Self {
        Self { pixel_threshold }
    }

    fn changed_pixels(&self, current: &[u8], previous: &[u8]) -> u32 {
        current
            .iter()
            .zip(previous.iter())
            .filter(|&(&a, &b)| a.abs_diff(b) > self.pixel_threshold)
            .count() as u32
    }
}

impl Default for FrameDiffMotionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionDetector for FrameDiffMotionDetector {
    fn detect(&self, frame: &Frame, prev: Option<&Frame>) -> MotionReading {
        let area = match prev {
            Some(prev) if prev.width == frame.width && prev.height == frame.height => {
                self.changed_pixels(&frame.to_luma(), &prev.to_luma())
            }
            _ => 0,
        };
        MotionReading { area }
    }
}

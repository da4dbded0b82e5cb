use super::UiType;
use crate::core::video::Frame;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiReading {
    /// 屏幕上有直播图层的概率，取值 [0, 1]
    pub probability: f32,
    pub ui_type: UiType,
}

impl UiReading {
    pub fn none() -> Self {
        Self {
            probability: 0.0,
            ui_type: UiType::Unknown,
        }
    }
}

pub trait UiDetector: Send + Sync {
    fn detect(&self, frame: &Frame, prev: Option<&Frame>) -> UiReading;
}

/// 直播图层检测器
/// 统计栏、休息画面和广告卡片外观相似：
/// 1. 大片纯暗或纯亮的底色，区别于中间调的桌布
/// 2. 底色内有锐利的文字笔画
/// 3. 这些行连成水平条带
pub struct OverlayBandDetector {
    flat_diff: u8,
    edge_diff: u8,
    min_flat_ratio: f32,
    min_edge_ratio: f32,
    dark_level: u8,
    bright_level: u8,
    /// 计入的最短条带，占帧高比例
    min_band_ratio: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct BandStats {
    coverage: f32,
    longest_band: usize,
}

impl OverlayBandDetector {
    pub fn new() -> Self {
        Self {
            flat_diff: 4,
            edge_diff: 30,
            min_flat_ratio: 0.6,
            min_edge_ratio: 0.02,
            dark_level: 60,
            bright_level: 190,
            min_band_ratio: 0.03,
        }
    }

    fn is_graphic_row(&self, row: &[u8]) -> bool {
        if row.len() < 2 {
            return false;
        }

        let mut flat = 0usize;
        let mut edges = 0usize;
        let mut sum = 0u64;
        for x in 1..row.len() {
            let diff = row[x].abs_diff(row[x - 1]);
            if diff <= self.flat_diff {
                flat += 1;
            } else if diff > self.edge_diff {
                edges += 1;
            }
            sum += row[x] as u64;
        }

        let n = (row.len() - 1) as f32;
        let mean = sum as f32 / n;
        let off_felt = mean < self.dark_level as f32 || mean > self.bright_level as f32;

        off_felt && flat as f32 / n >= self.min_flat_ratio && edges as f32 / n >= self.min_edge_ratio
    }

    fn band_stats(&self, gray: &[u8], width: usize, height: usize) -> BandStats {
        let mut graphic_rows = 0usize;
        let mut longest_band = 0usize;
        let mut current = 0usize;

        for y in 0..height {
            if self.is_graphic_row(&gray[y * width..(y + 1) * width]) {
                graphic_rows += 1;
                current += 1;
                longest_band = longest_band.max(current);
            } else {
                current = 0;
            }
        }

        BandStats {
            coverage: graphic_rows as f32 / height.max(1) as f32,
            longest_band,
        }
    }

    fn classify(&self, stats: BandStats, height: usize) -> UiReading {
        let min_band = ((height as f32 * self.min_band_ratio).ceil() as usize).max(1);

        if stats.longest_band < min_band {
            return UiReading {
                probability: (stats.coverage * 2.0).min(0.3),
                ui_type: UiType::Unknown,
            };
        }

        let ui_type = if stats.coverage >= 0.8 {
            UiType::Break
        } else if stats.coverage >= 0.4 {
            UiType::Ad
        } else {
            UiType::Stats
        };

        UiReading {
            probability: (0.5 + stats.coverage * 2.0).min(1.0),
            ui_type,
        }
    }
}

impl Default for OverlayBandDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl UiDetector for OverlayBandDetector {
    fn detect(&self, frame: &Frame, _prev: Option<&Frame>) -> UiReading {
        let (w, h) = (frame.width as usize, frame.height as usize);
        if w < 2 || h == 0 {
            return UiReading::none();
        }
        let gray = frame.to_luma();
        let stats = self.band_stats(&gray, w, h);
        self.classify(stats, h)
    }
}

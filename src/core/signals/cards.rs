use super::grid::CellGrid;
use crate::core::video::Frame;

pub trait CardDetector: Send + Sync {
    fn count(&self, frame: &Frame, prev: Option<&Frame>) -> u8;
}

/// 统计桌布上明亮、低饱和度的牌面
///
/// 基于粗网格：牌面白色像素占多数的格子连成块，尺寸和长宽比像牌的块计数
pub struct FeltCardDetector {
    cell_size: u32,
    brightness_threshold: u8,
    max_channel_spread: u8,
    min_cell_fill: f32,
    min_cells: usize,
    max_cells: usize,
}

impl FeltCardDetector {
    pub fn new() -> Self {
        Self {
            cell_size: 6,
            brightness_threshold: 200,
            max_channel_spread: 40,
            min_cell_fill: 0.6,
            min_cells: 4,
            max_cells: 40,
        }
    }

    fn is_card_pixel(&self, px: [u8; 4]) -> bool {
        let max = px[0].max(px[1]).max(px[2]);
        let min = px[0].min(px[1]).min(px[2]);
        min > self.brightness_threshold && max - min <= self.max_channel_spread
    }
}

impl Default for FeltCardDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl CardDetector for FeltCardDetector {
    fn count(&self, frame: &Frame, _prev: Option<&Frame>) -> u8 {
        let grid = CellGrid::build(frame, self.cell_size, |px| self.is_card_pixel(px));

        let cards = grid
            .blobs(self.min_cell_fill)
            .into_iter()
            .filter(|b| b.cells >= self.min_cells && b.cells <= self.max_cells)
            .filter(|b| {
                // 竖放或横放的牌，排除细长条
                let aspect = b.width() as f32 / b.height() as f32;
                (0.4..=2.5).contains(&aspect)
            })
            .count();

        cards.min(u8::MAX as usize) as u8
    }
}

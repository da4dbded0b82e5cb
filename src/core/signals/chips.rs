use super::grid::CellGrid;
use crate::core::video::Frame;

pub trait ChipDetector: Send + Sync {
    fn count(&self, frame: &Frame, prev: Option<&Frame>) -> u8;
}

/// 统计红/蓝小筹码堆，跳过绿色避免匹配桌布
pub struct ChipColorDetector {
    cell_size: u32,
    min_cell_fill: f32,
    max_cells: usize,
}

impl ChipColorDetector {
    pub fn new() -> Self {
        Self {
            cell_size: 4,
            min_cell_fill: 0.5,
            max_cells: 12,
        }
    }

    fn is_chip_pixel(px: [u8; 4]) -> bool {
        let (r, g, b) = (px[0], px[1], px[2]);
        let red = r > 150 && g < 90 && b < 90;
        let blue = b > 150 && r < 90 && g < 120;
        red || blue
    }
}

impl Default for ChipColorDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ChipDetector for ChipColorDetector {
    fn count(&self, frame: &Frame, _prev: Option<&Frame>) -> u8 {
        let grid = CellGrid::build(frame, self.cell_size, Self::is_chip_pixel);
        let stacks = grid
            .blobs(self.min_cell_fill)
            .into_iter()
            .filter(|b| b.cells <= self.max_cells)
            .count();
        stacks.min(u8::MAX as usize) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::signals::grid::test_support::paint;

    const FELT: [u8; 4] = [20, 110, 40, 255];

    #[test]
    fn test_felt_is_not_a_chip() {
        let frame = Frame::solid(0, 0.0, 64, 32, FELT);
        assert_eq!(ChipColorDetector::new().count(&frame, None), 0);
    }

    #[test]
    fn test_counts_red_and_blue_stacks() {
        let mut frame = Frame::solid(0, 0.0, 64, 32, FELT);
        paint(&mut frame, 4, 4, 8, 8, [200, 30, 30, 255]);
        paint(&mut frame, 32, 16, 8, 8, [30, 40, 210, 255]);
        assert_eq!(ChipColorDetector::new().count(&frame, None), 2);
    }

    #[test]
    fn test_large_red_area_is_not_a_stack() {
        let mut frame = Frame::solid(0, 0.0, 64, 32, FELT);
        paint(&mut frame, 0, 0, 64, 16, [200, 30, 30, 255]);
        assert_eq!(ChipColorDetector::new().count(&frame, None), 0);
    }
}

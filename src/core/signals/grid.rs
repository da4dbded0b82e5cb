use crate::core::video::Frame;
use std::collections::VecDeque;

/// 帧上的粗粒度网格，每格记录满足条件的像素占比
pub struct CellGrid {
    cols: usize,
    rows: usize,
    fill: Vec<f32>,
}

/// 四连通的标记格子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blob {
    pub cells: usize,
    pub min_col: usize,
    pub max_col: usize,
    pub min_row: usize,
    pub max_row: usize,
}

impl Blob {
    pub fn width(&self) -> usize {
        self.max_col - self.min_col + 1
    }

    pub fn height(&self) -> usize {
        self.max_row - self.min_row + 1
    }
}

impl CellGrid {
    pub fn build<P>(frame: &Frame, cell_size: u32, predicate: P) -> Self
    where
        P: Fn([u8; 4]) -> bool,
    {
        let cell = cell_size.max(1);
        let cols = (frame.width / cell) as usize;
        let rows = (frame.height / cell) as usize;
        let mut fill = vec![0f32; cols * rows];
        let per_cell = (cell * cell) as f32;

        for row in 0..rows {
            for col in 0..cols {
                let mut hits = 0u32;
                for y in 0..cell {
                    for x in 0..cell {
                        let px = frame.pixel(col as u32 * cell + x, row as u32 * cell + y);
                        if predicate(px) {
                            hits += 1;
                        }
                    }
                }
                fill[row * cols + col] = hits as f32 / per_cell;
            }
        }

        Self { cols, rows, fill }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn fill_at(&self, col: usize, row: usize) -> f32 {
        self.fill[row * self.cols + col]
    }

    /// 填充率不低于 `min_fill` 的连通区域，按首格的行优先顺序
    pub fn blobs(&self, min_fill: f32) -> Vec<Blob> {
        let mut visited = vec![false; self.fill.len()];
        let mut blobs = Vec::new();
        let mut queue = VecDeque::new();

        for start in 0..self.fill.len() {
            if visited[start] || self.fill[start] < min_fill {
                continue;
            }

            visited[start] = true;
            queue.push_back(start);
            let mut blob = Blob {
                cells: 0,
                min_col: usize::MAX,
                max_col: 0,
                min_row: usize::MAX,
                max_row: 0,
            };

            while let Some(idx) = queue.pop_front() {
                let (col, row) = (idx % self.cols, idx / self.cols);
                blob.cells += 1;
                blob.min_col = blob.min_col.min(col);
                blob.max_col = blob.max_col.max(col);
                blob.min_row = blob.min_row.min(row);
                blob.max_row = blob.max_row.max(row);

                let mut neighbours = Vec::with_capacity(4);
                if col > 0 {
                    neighbours.push(idx - 1);
                }
                if col + 1 < self.cols {
                    neighbours.push(idx + 1);
                }
                if row > 0 {
                    neighbours.push(idx - self.cols);
                }
                if row + 1 < self.rows {
                    neighbours.push(idx + self.cols);
                }

                for n in neighbours {
                    if !visited[n] && self.fill[n] >= min_fill {
                        visited[n] = true;
                        queue.push_back(n);
                    }
                }
            }

            blobs.push(blob);
        }

        blobs
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::paint;
    use super::*;

    #[test]
    fn test_blobs_are_separated() {
        let mut frame = Frame::solid(0, 0.0, 40, 40, [0, 0, 0, 255]);
        paint(&mut frame, 0, 0, 8, 8, [255, 255, 255, 255]);
        paint(&mut frame, 24, 24, 16, 8, [255, 255, 255, 255]);

        let grid = CellGrid::build(&frame, 4, |px| px[0] > 200);
        assert_eq!((grid.cols(), grid.rows()), (10, 10));
        assert_eq!(grid.fill_at(0, 0), 1.0);

        let blobs = grid.blobs(0.5);
        assert_eq!(blobs.len(), 2);
        assert_eq!(blobs[0].cells, 4);
        assert_eq!((blobs[1].width(), blobs[1].height()), (4, 2));
    }

    #[test]
    fn test_empty_grid() {
        let frame = Frame::solid(0, 0.0, 3, 3, [0, 0, 0, 255]);
        let grid = CellGrid::build(&frame, 4, |_| true);
        assert!(grid.blobs(0.1).is_empty());
    }
}

/// 最近 UI 判定的定长环形缓冲
///
/// 槽位只分配一次，满了之后覆盖最旧的采样并同步 UI 计数
#[derive(Debug, Clone)]
pub struct UiWindow {
    slots: Vec<UiSlot>,
    head: usize,
    len: usize,
    true_count: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct UiSlot {
    timestamp: f64,
    is_ui: bool,
}

impl UiWindow {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![UiSlot::default(); capacity.max(1)],
            head: 0,
            len: 0,
            true_count: 0,
        }
    }

    pub fn push(&mut self, timestamp: f64, is_ui: bool) {
        let capacity = self.slots.len();
        let tail = (self.head + self.len) % capacity;

        if self.len == capacity {
            // tail == head：覆盖最旧的槽位
            if self.slots[self.head].is_ui {
                self.true_count -= 1;
            }
            self.head = (self.head + 1) % capacity;
        } else {
            self.len += 1;
        }

        self.slots[tail] = UiSlot { timestamp, is_ui };
        if is_ui {
            self.true_count += 1;
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    pub fn true_count(&self) -> usize {
        self.true_count
    }

    /// 已满且全部为 UI
    pub fn is_saturated(&self) -> bool {
        self.is_full() && self.true_count == self.capacity()
    }

    pub fn oldest_timestamp(&self) -> Option<f64> {
        if self.len == 0 {
            None
        } else {
            Some(self.slots[self.head].timestamp)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fills_then_saturates() {
        let mut window = UiWindow::with_capacity(3);
        assert!(window.is_empty());

        window.push(0.0, true);
        window.push(2.0, true);
        assert!(!window.is_saturated());
        window.push(4.0, true);
        assert!(window.is_saturated());
        assert_eq!(window.oldest_timestamp(), Some(0.0));
    }

    #[test]
    fn test_overwrite_keeps_count() {
        let mut window = UiWindow::with_capacity(3);
        window.push(0.0, true);
        window.push(2.0, false);
        window.push(4.0, true);
        assert_eq!(window.true_count(), 2);

        window.push(6.0, false); // 挤出 0.0 (true)
        assert_eq!(window.true_count(), 1);
        assert_eq!(window.len(), 3);
        assert_eq!(window.oldest_timestamp(), Some(2.0));

        window.push(8.0, true); // 挤出 2.0 (false)
        window.push(10.0, true); // 挤出 4.0 (true)
        assert_eq!(window.true_count(), 2);
        assert_eq!(window.oldest_timestamp(), Some(6.0));
    }

    #[test]
    fn test_zero_capacity_is_one() {
        let mut window = UiWindow::with_capacity(0);
        assert_eq!(window.capacity(), 1);
        window.push(1.0, true);
        assert!(window.is_saturated());
        window.push(2.0, false);
        assert_eq!(window.len(), 1);
        assert_eq!(window.oldest_timestamp(), Some(2.0));
    }
}

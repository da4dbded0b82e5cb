use image::RgbaImage;

/// 已缩放的采样帧，归当前处理阶段所有
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    /// 距视频开头的秒数
    pub timestamp: f64,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>, // RGBA 格式
}

impl Frame {
    pub fn new(index: u64, timestamp: f64, width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            index,
            timestamp,
            width,
            height,
            data,
        }
    }

    /// 纯色填充，用于合成输入
    pub fn solid(index: u64, timestamp: f64, width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        Self::new(index, timestamp, width, height, data)
    }

    /// 将解码后的图像缩放到目标分辨率
    pub fn from_image(
        image: &RgbaImage,
        index: u64,
        timestamp: f64,
        target_width: u32,
        target_height: u32,
    ) -> Self {
        let resized = if image.width() == target_width && image.height() == target_height {
            image.clone()
        } else {
            image::imageops::resize(
                image,
                target_width,
                target_height,
                image::imageops::FilterType::Triangle,
            )
        };

        Self::new(index, timestamp, target_width, target_height, resized.into_raw())
    }

    pub fn pixel_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * self.width + x) * 4) as usize;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    /// BT.601 亮度平面
    pub fn to_luma(&self) -> Vec<u8> {
        self.data
            .chunks_exact(4)
            .map(|rgba| {
                ((rgba[0] as u32 * 299 + rgba[1] as u32 * 587 + rgba[2] as u32 * 114) / 1000) as u8
            })
            .collect()
    }
}

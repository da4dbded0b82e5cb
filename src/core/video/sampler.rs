use super::frame::Frame;
use super::source::{VideoMetadata, VideoSource};
use crate::core::error::{HandDetectionError, Result};
use log::{info, warn};

/// 按步长遍历 [`VideoSource`]，产出缩放后的帧
///
/// 只有整个步长都在视频内时才取 `k * stride` 处的帧，短于一个步长的视频不产出任何帧。
/// 再次调用 [`FrameSampler::frames`] 会从第 0 帧重新开始
pub struct FrameSampler<'a> {
    source: &'a mut dyn VideoSource,
    metadata: VideoMetadata,
    stride: u64,
    target_width: u32,
    target_height: u32,
    gaps: u64,
}

impl<'a> FrameSampler<'a> {
    pub fn new(
        source: &'a mut dyn VideoSource,
        stride: u64,
        target_width: u32,
        target_height: u32,
        fallback_fps: f64,
    ) -> Result<Self> {
        let mut metadata = source.metadata();
        if metadata.frame_count == 0 {
            return Err(HandDetectionError::unreadable(
                source.describe(),
                "zero-length video",
            ));
        }
        if !(metadata.fps > 0.0) {
            warn!(
                "⚠️ {} reports no frame rate, assuming {:.1} FPS",
                source.describe(),
                fallback_fps
            );
            metadata.fps = fallback_fps;
        }

        Ok(Self {
            source,
            metadata,
            stride: stride.max(1),
            target_width,
            target_height,
            gaps: 0,
        })
    }

    pub fn metadata(&self) -> VideoMetadata {
        self.metadata
    }

    pub fn fps(&self) -> f64 {
        self.metadata.fps
    }

    pub fn duration(&self) -> f64 {
        self.metadata.duration()
    }

    pub fn sample_count(&self) -> u64 {
        self.metadata.frame_count / self.stride
    }

    /// 解码失败被跳过的帧数（累计所有遍历）
    pub fn gaps(&self) -> u64 {
        self.gaps
    }

    pub fn frames(&mut self) -> SampledFrames<'_, 'a> {
        info!(
            "🎞️ Sampling {} every {} frames ({} samples)",
            self.source.describe(),
            self.stride,
            self.sample_count()
        );
        SampledFrames {
            sampler: self,
            next_sample: 0,
        }
    }
}

pub struct SampledFrames<'s, 'a> {
    sampler: &'s mut FrameSampler<'a>,
    next_sample: u64,
}

impl SampledFrames<'_, '_> {
    /// 已尝试的采样数，包含跳过的
    pub fn position(&self) -> u64 {
        self.next_sample
    }
}

impl Iterator for SampledFrames<'_, '_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        let total = self.sampler.sample_count();
        while self.next_sample < total {
            let index = self.next_sample * self.sampler.stride;
            self.next_sample += 1;

            match self.sampler.source.read_frame(index) {
                Ok(image) => {
                    let timestamp = index as f64 / self.sampler.metadata.fps;
                    return Some(Frame::from_image(
                        &image,
                        index,
                        timestamp,
                        self.sampler.target_width,
                        self.sampler.target_height,
                    ));
                }
                Err(e) => {
                    self.sampler.gaps += 1;
                    warn!("⚠️ Skipping frame {}: {}", index, e);
                }
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.sampler.sample_count().saturating_sub(self.next_sample) as usize;
        (0, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::video::source::{FnSource, MemorySource};
    use image::RgbaImage;

    fn gray(shade: u8) -> RgbaImage {
        RgbaImage::from_pixel(16, 9, image::Rgba([shade, shade, shade, 255]))
    }

    fn generated(frame_count: u64, fps: f64) -> FnSource<impl FnMut(u64) -> Option<RgbaImage> + Send> {
        let metadata = VideoMetadata {
            fps,
            frame_count,
            width: 16,
            height: 9,
        };
        FnSource::new("generated", metadata, |i| Some(gray((i % 255) as u8)))
    }

    #[test]
    fn test_stride_indices_and_timestamps() {
        let mut source = generated(300, 30.0);
        let mut sampler = FrameSampler::new(&mut source, 60, 16, 9, 30.0).unwrap();
        assert_eq!(sampler.sample_count(), 5);

        let frames: Vec<Frame> = sampler.frames().collect();
        let indices: Vec<u64> = frames.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 60, 120, 180, 240]);
        assert!((frames[2].timestamp - 4.0).abs() < 1e-9);
        assert_eq!(frames[0].width, 16);
    }

    #[test]
    fn test_restartable() {
        let mut source = generated(120, 30.0);
        let mut sampler = FrameSampler::new(&mut source, 30, 16, 9, 30.0).unwrap();

        let first: Vec<u64> = sampler.frames().map(|f| f.index).collect();
        let second: Vec<u64> = sampler.frames().map(|f| f.index).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn test_downscales_to_target() {
        let mut source = generated(10, 30.0);
        let mut sampler = FrameSampler::new(&mut source, 5, 8, 4, 30.0).unwrap();
        let frame = sampler.frames().next().unwrap();
        assert_eq!((frame.width, frame.height), (8, 4));
        assert_eq!(frame.data.len(), 8 * 4 * 4);
    }

    #[test]
    fn test_skips_unreadable_frames() {
        let frames = vec![Some(gray(1)), None, Some(gray(3)), None];
        let mut source = MemorySource::new("gappy", 1.0, frames);
        let mut sampler = FrameSampler::new(&mut source, 1, 16, 9, 30.0).unwrap();

        let indices: Vec<u64> = sampler.frames().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(sampler.gaps(), 2);
    }

    #[test]
    fn test_zero_length_is_unreadable() {
        let mut source = MemorySource::new("empty", 30.0, vec![]);
        let result = FrameSampler::new(&mut source, 60, 16, 9, 30.0);
        assert!(matches!(
            result,
            Err(HandDetectionError::VideoUnreadable { .. })
        ));
    }

    #[test]
    fn test_shorter_than_stride_yields_nothing() {
        let mut source = generated(59, 30.0);
        let mut sampler = FrameSampler::new(&mut source, 60, 16, 9, 30.0).unwrap();
        assert_eq!(sampler.frames().count(), 0);
    }

    #[test]
    fn test_fallback_fps() {
        let mut source = generated(60, 0.0);
        let sampler = FrameSampler::new(&mut source, 30, 16, 9, 25.0).unwrap();
        assert_eq!(sampler.fps(), 25.0);
    }
}

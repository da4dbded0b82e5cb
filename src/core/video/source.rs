use crate::core::error::{HandDetectionError, Result};
use image::RgbaImage;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetadata {
    pub fps: f64,
    pub frame_count: u64,
    pub width: u32,
    pub height: u32,
}

impl VideoMetadata {
    pub fn duration(&self) -> f64 {
        if self.fps > 0.0 {
            self.frame_count as f64 / self.fps
        } else {
            0.0
        }
    }
}

/// 随机访问的帧读取接口，解码不在本 crate 内
///
/// `read_frame` 的错误只影响单帧，采样器记为缺帧后继续
pub trait VideoSource: Send {
    fn describe(&self) -> String;
    fn metadata(&self) -> VideoMetadata;
    fn read_frame(&mut self, index: u64) -> Result<RgbaImage>;
}

/// 预解码帧目录（`frame_000001.png`, ...），按文件名排序
pub struct ImageSequenceSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    metadata: VideoMetadata,
}

impl ImageSequenceSource {
    pub fn open(dir: impl AsRef<Path>, fps: f64) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let label = dir.display().to_string();

        let entries = fs::read_dir(&dir)
            .map_err(|e| HandDetectionError::unreadable(&label, e.to_string()))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();

        let first = files
            .first()
            .ok_or_else(|| HandDetectionError::unreadable(&label, "no frame images found"))?;
        let (width, height) = image::image_dimensions(first)
            .map_err(|e| HandDetectionError::unreadable(&label, e.to_string()))?;

        let metadata = VideoMetadata {
            fps,
            frame_count: files.len() as u64,
            width,
            height,
        };
        info!(
            "🎬 Opened frame sequence {}: {}x{} @ {:.1} FPS, {} frames",
            label, width, height, fps, metadata.frame_count
        );

        Ok(Self {
            dir,
            files,
            metadata,
        })
    }
}

impl VideoSource for ImageSequenceSource {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn metadata(&self) -> VideoMetadata {
        self.metadata
    }

    fn read_frame(&mut self, index: u64) -> Result<RgbaImage> {
        let path = self.files.get(index as usize).ok_or_else(|| {
            HandDetectionError::unreadable(self.describe(), format!("frame {} out of range", index))
        })?;
        debug!("reading frame {} from {}", index, path.display());
        Ok(image::open(path)?.to_rgba8())
    }
}

/// 由闭包按需生成帧，`None` 表示无法解码
pub struct FnSource<F>
where
    F: FnMut(u64) -> Option<RgbaImage> + Send,
{
    label: String,
    metadata: VideoMetadata,
    generator: F,
}

impl<F> FnSource<F>
where
    F: FnMut(u64) -> Option<RgbaImage> + Send,
{
    pub fn new(label: impl Into<String>, metadata: VideoMetadata, generator: F) -> Self {
        Self {
            label: label.into(),
            metadata,
            generator,
        }
    }
}

impl<F> VideoSource for FnSource<F>
where
    F: FnMut(u64) -> Option<RgbaImage> + Send,
{
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn metadata(&self) -> VideoMetadata {
        self.metadata
    }

    fn read_frame(&mut self, index: u64) -> Result<RgbaImage> {
        if index >= self.metadata.frame_count {
            return Err(HandDetectionError::unreadable(
                &self.label,
                format!("frame {} out of range", index),
            ));
        }
        (self.generator)(index).ok_or_else(|| {
            HandDetectionError::unreadable(&self.label, format!("frame {} failed to decode", index))
        })
    }
}

/// 全部已解码并保存在内存中的帧
pub struct MemorySource {
    label: String,
    fps: f64,
    frames: Vec<Option<RgbaImage>>,
}

impl MemorySource {
    pub fn new(label: impl Into<String>, fps: f64, frames: Vec<Option<RgbaImage>>) -> Self {
        Self {
            label: label.into(),
            fps,
            frames,
        }
    }
}

impl VideoSource for MemorySource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn metadata(&self) -> VideoMetadata {
        let (width, height) = self
            .frames
            .iter()
            .flatten()
            .next()
            .map(|f| f.dimensions())
            .unwrap_or((0, 0));
        VideoMetadata {
            fps: self.fps,
            frame_count: self.frames.len() as u64,
            width,
            height,
        }
    }

    fn read_frame(&mut self, index: u64) -> Result<RgbaImage> {
        match self.frames.get(index as usize) {
            Some(Some(frame)) => Ok(frame.clone()),
            Some(None) => Err(HandDetectionError::unreadable(
                &self.label,
                format!("frame {} failed to decode", index),
            )),
            None => Err(HandDetectionError::unreadable(
                &self.label,
                format!("frame {} out of range", index),
            )),
        }
    }
}

//! 完整检测流程：采样、扫描、分组、校验、组装

use super::assembler::ResultAssembler;
use super::postprocess::HandSeparationPostProcessor;
use super::report::HandReport;
use super::scanner::ParallelCandidateScanner;
use super::separation::HandSeparationAlgorithm;
use super::state_machine::fuse;
use super::ui_segments::build_ui_segments;
use crate::core::config::{BoundaryStrategy, Config};
use crate::core::error::{HandDetectionError, Result};
use crate::core::progress::{self, CancelToken, ProgressCallback};
use crate::core::signals::SignalProviders;
use crate::core::video::{FrameSampler, VideoSource};
use log::info;
use std::sync::Arc;
use std::time::Instant;

pub struct HandDetectionPipeline {
    config: Config,
    providers: SignalProviders,
    cancel: CancelToken,
    progress: Option<Arc<ProgressCallback>>,
}

impl HandDetectionPipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            providers: SignalProviders::heuristic(),
            cancel: CancelToken::new(),
            progress: None,
        }
    }

    pub fn with_providers(mut self, providers: SignalProviders) -> Self {
        self.set_providers(providers);
        self
    }

    pub fn with_progress(mut self, callback: Arc<ProgressCallback>) -> Self {
        self.set_progress(callback);
        self
    }

    pub fn set_providers(&mut self, providers: SignalProviders) {
        self.providers = providers;
    }

    pub fn set_progress(&mut self, callback: Arc<ProgressCallback>) {
        self.progress = Some(callback);
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 与流水线共享的取消令牌，取消后正在执行的 `run` 会中止
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn run(&self, source: &mut dyn VideoSource) -> Result<HandReport> {
        let started = Instant::now();
        let config = &self.config;
        config.validate()?;

        let video = source.describe();
        let progress = self.progress.as_deref();
        let mut sampler = FrameSampler::new(
            source,
            config.sampling_rate,
            config.target_width,
            config.target_height,
            config.source_fps,
        )?;
        let fps = sampler.fps();
        let video_duration = sampler.duration();
        let total = sampler.sample_count();

        // 先解码全部帧，worker 只接触自有缓冲
        let mut frames = Vec::with_capacity(total as usize);
        {
            let mut samples = sampler.frames();
            while let Some(frame) = samples.next() {
                self.ensure_running()?;
                frames.push(frame);
                progress::report(progress, "sampling", samples.position(), total);
            }
        }
        let skipped_frames = sampler.gaps();
        if frames.is_empty() {
            return Err(HandDetectionError::NoFramesSampled);
        }
        let sampled_frames = frames.len();

        let scanner = ParallelCandidateScanner::new(config, self.providers.clone(), fps);
        let scan = scanner.scan(frames, &self.cancel)?;
        info!(
            "📡 Scan finished: {} events from {} samples",
            scan.events.len(),
            scan.signals.len()
        );

        let ui_segments = build_ui_segments(&scan.signals, config, fps);
        let candidates = match config.boundary_strategy {
            BoundaryStrategy::UiSegments => HandSeparationAlgorithm::new(config)
                .generate_candidates(&ui_segments, video_duration),
            BoundaryStrategy::Streaming => {
                fuse(&scan.events, &scan.signals, config, fps, video_duration).candidates
            }
        };
        info!(
            "🧩 {} UI segments, {} candidates ({:?})",
            ui_segments.len(),
            candidates.len(),
            config.boundary_strategy
        );
        self.ensure_running()?;

        let post = HandSeparationPostProcessor::new(config).process(candidates, progress);
        let hands = ResultAssembler::new(config).assemble(post.hands)?;
        let elapsed_seconds = started.elapsed().as_secs_f64();
        info!(
            "✅ {}: {} hands in {:.2}s",
            video,
            hands.len(),
            elapsed_seconds
        );

        Ok(HandReport {
            video,
            video_duration,
            fps,
            sampled_frames,
            skipped_frames,
            chunks: scan.chunks,
            event_count: scan.events.len(),
            strategy: config.boundary_strategy,
            ui_segments,
            stats: post.stats,
            hands,
            elapsed_seconds,
        })
    }

    fn ensure_running(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(HandDetectionError::Aborted)
        } else {
            Ok(())
        }
    }
}

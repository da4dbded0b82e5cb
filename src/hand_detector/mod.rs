//! 牌局边界检测 - 从扑克直播中切分出每一手牌
//!
//! 处理流程：
//! 1. 采样 - 每 `sampling_rate` 帧取一帧并缩放
//! 2. 并行扫描 - 分块提取信号和运动/UI 事件
//! 3. 分组 - UI 片段生成候选（批量）或流式状态机融合
//! 4. 后处理 - 时长校验、合并与拆分
//! 5. 组装 - 排序、编号和不变量检查

pub mod assembler;
pub mod event;
pub mod pipeline;
pub mod postprocess;
pub mod report;
pub mod scanner;
pub mod separation;
pub mod state_machine;
pub mod types;
pub mod ui_segments;
pub mod ui_window;

pub use assembler::ResultAssembler;
pub use event::{Event, EventKind};
pub use pipeline::HandDetectionPipeline;
pub use postprocess::{
    CandidateValidity, HandSeparationPostProcessor, PostProcessOutput, PostProcessStats,
};
pub use report::HandReport;
pub use scanner::{ChunkResult, ParallelCandidateScanner, ScanOutput};
pub use separation::HandSeparationAlgorithm;
pub use state_machine::{
    fuse, BoundaryStateMachine, FusionOutput, FusionSnapshot, FusionState, FusionTransition,
};
pub use types::{CandidateSource, HandCandidate, PokerHand, UiSegment, ValidationStatus};
pub use ui_segments::{build_ui_segments, merge_ui_regions, raw_ui_regions};
pub use ui_window::UiWindow;

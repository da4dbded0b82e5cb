use crate::core::signals::UiType;
use serde::{Deserialize, Serialize};

/// 直播图层持续在屏幕上的区间
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UiSegment {
    pub start: f64,
    pub end: f64,
    pub confidence: f32,
    pub ui_type: UiType,
}

impl UiSegment {
    pub fn new(start: f64, end: f64, confidence: f32, ui_type: UiType) -> Self {
        Self {
            start,
            end,
            confidence,
            ui_type,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// 候选两侧的边界来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    BeforeFirstUi,
    BetweenUi,
    AfterLastUi,
    NoUi,
}

/// 尚未做时长校验的候选牌局
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HandCandidate {
    pub start: f64,
    pub end: f64,
    /// 取值 [0, 1]
    pub confidence: f32,
    pub source: CandidateSource,
}

impl HandCandidate {
    pub fn new(start: f64, end: f64, confidence: f32, source: CandidateSource) -> Self {
        Self {
            start,
            end,
            confidence: confidence.clamp(0.0, 1.0),
            source,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Valid,
    Merged,
    Split,
}

/// 最终输出记录，字段顺序即序列化格式
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PokerHand {
    pub hand_id: u32,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub confidence: f32,
    pub validation_status: ValidationStatus,
}

impl PokerHand {
    pub fn new(start_time: f64, end_time: f64, confidence: f32, status: ValidationStatus) -> Self {
        Self {
            hand_id: 0,
            start_time,
            end_time,
            duration: end_time - start_time,
            confidence: confidence.clamp(0.0, 1.0),
            validation_status: status,
        }
    }
}

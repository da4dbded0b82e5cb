use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandDetectionError {
    #[error("Video unreadable: {path}: {reason}")]
    VideoUnreadable { path: String, reason: String },
    #[error("Detection aborted")]
    Aborted,
    #[error("No frames sampled")]
    NoFramesSampled,
    #[error("Scan worker for chunk {chunk_id} failed: {cause}")]
    ScanWorkerFailed { chunk_id: usize, cause: String },
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Worker pool error: {0}")]
    WorkerPool(String),
    #[error("Result invariant violated: {0}")]
    InvariantViolation(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl HandDetectionError {
    pub fn unreadable(path: impl Into<String>, reason: impl Into<String>) -> Self {
        HandDetectionError::VideoUnreadable {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HandDetectionError>;

pub mod config;
pub mod error;
pub mod progress;
pub mod signals;
pub mod video;

pub use config::{BoundaryStrategy, Config};
pub use error::{HandDetectionError, Result};
pub use progress::{CancelToken, ProgressCallback};

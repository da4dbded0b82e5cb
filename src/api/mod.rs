pub mod detector;

pub use detector::HandDetector;

pub mod frame;
pub mod sampler;
pub mod source;

pub use frame::Frame;
pub use sampler::{FrameSampler, SampledFrames};
pub use source::{FnSource, ImageSequenceSource, MemorySource, VideoMetadata, VideoSource};

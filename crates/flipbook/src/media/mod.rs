pub mod cache;
pub mod decoder;
pub mod player;
pub mod producer;
pub mod ring;
pub mod transform;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use decoder::{FrameSource, SourceKind, open_bytes, open_path};
pub use producer::FrameProducer;
pub use transform::{FrameTransform, ImageResizer};
pub use types::{Advance, FitPolicy, PreparedFrame, RawFrame, RepeatCount, TargetSize};

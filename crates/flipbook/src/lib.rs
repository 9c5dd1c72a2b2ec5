//! Decoded-frame playback for animated images under a memory budget.

pub mod config;
pub mod error;
pub mod media;

pub use config::PlaybackConfig;
pub use error::MediaError;
pub use media::cache::FrameCache;
pub use media::player::{Animator, PlaybackEvent};

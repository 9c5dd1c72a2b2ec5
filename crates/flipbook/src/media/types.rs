use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A decoded RGBA8 frame.
pub type RawFrame = image::RgbaImage;

/// A cache entry: a decoded (and possibly resized) frame, or a placeholder
/// for a frame whose decode failed.
#[derive(Debug, Clone)]
pub enum PreparedFrame {
    Decoded { image: RawFrame, duration: Duration },
    /// Failed decode. Shows as "no image" and lasts zero time.
    Missing,
}

impl PreparedFrame {
    pub fn image(&self) -> Option<&RawFrame> {
        match self {
            PreparedFrame::Decoded { image, .. } => Some(image),
            PreparedFrame::Missing => None,
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            PreparedFrame::Decoded { duration, .. } => *duration,
            PreparedFrame::Missing => Duration::ZERO,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, PreparedFrame::Missing)
    }
}

/// Outcome of a single timer tick on the frame cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Advanced,
    Unchanged,
}

/// How a frame is scaled into the target size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitPolicy {
    /// Preserve aspect ratio, fit inside the target.
    #[default]
    Fit,
    /// Preserve aspect ratio, cover the target and crop the overflow.
    Fill,
    /// Ignore aspect ratio, match the target exactly.
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// How many times an animation plays before stopping on its last frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatCount {
    #[default]
    Infinite,
    Finite(u32),
}

impl RepeatCount {
    pub fn once() -> Self {
        RepeatCount::Finite(1)
    }

    /// Whether `loops` completed loops exhausts this repeat count.
    pub fn is_reached(&self, loops: u32) -> bool {
        match self {
            RepeatCount::Infinite => false,
            RepeatCount::Finite(max) => loops >= *max,
        }
    }
}

/// Transport state for animated playback.
#[derive(Debug, Clone)]
pub struct TransportState {
    pub playing: bool,
    pub speed: f32,
    pub repeat: RepeatCount,
}

impl Default for TransportState {
    fn default() -> Self {
        Self {
            playing: true,
            speed: 1.0,
            repeat: RepeatCount::Infinite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_state_defaults() {
        let t = TransportState::default();
        assert!(t.playing);
        assert!((t.speed - 1.0).abs() < 1e-6);
        assert_eq!(t.repeat, RepeatCount::Infinite);
    }

    #[test]
    fn missing_frame_has_no_image_and_zero_duration() {
        let f = PreparedFrame::Missing;
        assert!(f.image().is_none());
        assert_eq!(f.duration(), Duration::ZERO);
        assert!(f.is_missing());
    }

    #[test]
    fn decoded_frame_exposes_image() {
        let f = PreparedFrame::Decoded {
            image: RawFrame::new(2, 3),
            duration: Duration::from_millis(40),
        };
        assert_eq!(f.image().map(|i| i.dimensions()), Some((2, 3)));
        assert_eq!(f.duration(), Duration::from_millis(40));
    }

    #[test]
    fn repeat_count_reached() {
        assert!(!RepeatCount::Infinite.is_reached(u32::MAX));
        assert!(!RepeatCount::once().is_reached(0));
        assert!(RepeatCount::once().is_reached(1));
        assert!(RepeatCount::Finite(3).is_reached(3));
    }

    #[test]
    fn empty_target_size() {
        assert!(TargetSize::new(0, 10).is_empty());
        assert!(!TargetSize::new(1, 1).is_empty());
    }

    #[test]
    fn fit_policy_serializes_lowercase() {
        let json = serde_json::to_string(&FitPolicy::Stretch).unwrap();
        assert_eq!(json, "\"stretch\"");
    }
}

use image::imageops::{self, FilterType};

use super::types::{FitPolicy, RawFrame, TargetSize};

/// Scales decoded frames to the display size.
pub trait FrameTransform {
    fn resize(&self, frame: RawFrame, target: TargetSize, policy: FitPolicy) -> RawFrame;
}

/// `FrameTransform` backed by `image::imageops`.
#[derive(Debug, Clone, Copy)]
pub struct ImageResizer {
    pub filter: FilterType,
}

impl Default for ImageResizer {
    fn default() -> Self {
        // Runs on the playback tick, so prefer speed over Lanczos quality
        Self {
            filter: FilterType::Triangle,
        }
    }
}

/// Scale `(w, h)` by `ratio`, never collapsing an axis to zero.
fn scaled(w: u32, h: u32, ratio: f64) -> (u32, u32) {
    (
        ((w as f64 * ratio).round() as u32).max(1),
        ((h as f64 * ratio).round() as u32).max(1),
    )
}

/// Size of the scaled image before any crop.
pub fn scaled_dimensions(src: (u32, u32), target: TargetSize, policy: FitPolicy) -> (u32, u32) {
    let (w, h) = src;
    if w == 0 || h == 0 {
        return src;
    }
    let rx = target.width as f64 / w as f64;
    let ry = target.height as f64 / h as f64;
    match policy {
        FitPolicy::Fit => scaled(w, h, rx.min(ry)),
        FitPolicy::Fill => scaled(w, h, rx.max(ry)),
        FitPolicy::Stretch => (target.width, target.height),
    }
}

impl FrameTransform for ImageResizer {
    fn resize(&self, frame: RawFrame, target: TargetSize, policy: FitPolicy) -> RawFrame {
        if target.is_empty() || frame.width() == 0 || frame.height() == 0 {
            return frame;
        }

        let (sw, sh) = scaled_dimensions(frame.dimensions(), target, policy);
        let scaled = if (sw, sh) == frame.dimensions() {
            frame
        } else {
            imageops::resize(&frame, sw, sh, self.filter)
        };

        if policy != FitPolicy::Fill || (sw, sh) == (target.width, target.height) {
            return scaled;
        }

        // Center-crop the overflow
        let cw = target.width.min(sw);
        let ch = target.height.min(sh);
        let x = (sw - cw) / 2;
        let y = (sh - ch) / 2;
        imageops::crop_imm(&scaled, x, y, cw, ch).to_image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(w: u32, h: u32) -> RawFrame {
        RawFrame::from_pixel(w, h, image::Rgba([10, 20, 30, 255]))
    }

    #[test]
    fn fit_preserves_aspect_inside_target() {
        assert_eq!(
            scaled_dimensions((200, 100), TargetSize::new(100, 100), FitPolicy::Fit),
            (100, 50)
        );
        assert_eq!(
            scaled_dimensions((100, 400), TargetSize::new(100, 100), FitPolicy::Fit),
            (25, 100)
        );
    }

    #[test]
    fn fill_covers_target() {
        assert_eq!(
            scaled_dimensions((200, 100), TargetSize::new(100, 100), FitPolicy::Fill),
            (200, 100)
        );
        assert_eq!(
            scaled_dimensions((50, 100), TargetSize::new(100, 100), FitPolicy::Fill),
            (100, 200)
        );
    }

    #[test]
    fn stretch_matches_target() {
        assert_eq!(
            scaled_dimensions((7, 3), TargetSize::new(64, 48), FitPolicy::Stretch),
            (64, 48)
        );
    }

    #[test]
    fn tiny_ratio_never_zero() {
        assert_eq!(
            scaled_dimensions((1000, 1), TargetSize::new(10, 10), FitPolicy::Fit),
            (10, 1)
        );
    }

    #[test]
    fn resize_fit() {
        let out = ImageResizer::default().resize(frame(40, 20), TargetSize::new(10, 10), FitPolicy::Fit);
        assert_eq!(out.dimensions(), (10, 5));
    }

    #[test]
    fn resize_fill_crops_to_target() {
        let out = ImageResizer::default().resize(frame(40, 20), TargetSize::new(10, 10), FitPolicy::Fill);
        assert_eq!(out.dimensions(), (10, 10));
        assert_eq!(out.get_pixel(5, 5).0, [10, 20, 30, 255]);
    }

    #[test]
    fn resize_stretch() {
        let out =
            ImageResizer::default().resize(frame(40, 20), TargetSize::new(8, 16), FitPolicy::Stretch);
        assert_eq!(out.dimensions(), (8, 16));
    }

    #[test]
    fn empty_target_returns_frame_unchanged() {
        let out = ImageResizer::default().resize(frame(4, 4), TargetSize::new(0, 10), FitPolicy::Fit);
        assert_eq!(out.dimensions(), (4, 4));
    }

    #[test]
    fn same_size_is_noop() {
        let out = ImageResizer::default().resize(frame(10, 10), TargetSize::new(10, 10), FitPolicy::Fill);
        assert_eq!(out.dimensions(), (10, 10));
    }
}

//! Test doubles shared by the media tests.

use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;

use super::decoder::FrameSource;
use super::types::{PreparedFrame, RawFrame};
use crate::error::MediaError;

/// In-memory source whose frame `i` is a 4x4 image with red channel `i`.
/// Counts decode calls through a shared cell.
pub struct ScriptedSource {
    durations: Vec<Duration>,
    failing: HashSet<usize>,
    calls: Rc<Cell<usize>>,
}

impl ScriptedSource {
    pub fn new(frame_count: usize, delay_ms: u64) -> (Self, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let source = Self {
            durations: vec![Duration::from_millis(delay_ms); frame_count],
            failing: HashSet::new(),
            calls: Rc::clone(&calls),
        };
        (source, calls)
    }

    pub fn failing_at(mut self, index: usize) -> Self {
        self.failing.insert(index);
        self
    }

    pub fn with_duration(mut self, index: usize, duration: Duration) -> Self {
        self.durations[index] = duration;
        self
    }
}

impl FrameSource for ScriptedSource {
    fn frame_count(&self) -> usize {
        self.durations.len()
    }

    fn dimensions(&self) -> (u32, u32) {
        (4, 4)
    }

    fn decode_frame(&mut self, index: usize) -> Result<RawFrame, MediaError> {
        self.calls.set(self.calls.get() + 1);
        if self.failing.contains(&index) || index >= self.durations.len() {
            return Err(MediaError::decode(index, "scripted failure"));
        }
        Ok(RawFrame::from_pixel(4, 4, image::Rgba([index as u8, 0, 0, 255])))
    }

    fn nominal_duration(&self, index: usize) -> Duration {
        self.durations.get(index).copied().unwrap_or(Duration::ZERO)
    }
}

/// Logical index a scripted frame was produced from.
pub fn logical_of(frame: &PreparedFrame) -> Option<usize> {
    frame.image().map(|i| i.get_pixel(0, 0).0[0] as usize)
}

//! Bounded cache of prepared frames over a cyclic frame sequence.
//!
//! When the sequence fits in `max_frame_count`, every frame is decoded once
//! and slots coincide with logical indices. Otherwise the buffer is a sliding
//! window: it always holds `buffer_len` consecutive logical frames (mod
//! `frame_count`) starting at the displayed one, and `preload_logical` is the
//! first frame past the window. Advancing overwrites the slot just left with
//! `preload_logical`, so the window moves one frame per boundary crossed.
//!
//! Slot `(current_slot + k) mod buffer_len` holds logical
//! `(preload_logical - buffer_len + k) mod frame_count`.

use std::time::Duration;

use super::producer::FrameProducer;
use super::ring;
use super::types::{Advance, PreparedFrame, RawFrame};
use crate::error::MediaError;

/// Frames kept in memory when the caller doesn't say otherwise.
pub const DEFAULT_MAX_FRAME_COUNT: usize = 10;
/// Largest time step applied per tick (bounds jumps after stalls).
pub const DEFAULT_MAX_TIME_STEP: Duration = Duration::from_secs(1);

pub struct FrameCache {
    producer: Option<FrameProducer>,
    frames: Vec<PreparedFrame>,
    frame_count: usize,
    max_frame_count: usize,
    max_time_step: Duration,
    current_slot: usize,
    preload_logical: usize,
    elapsed: Duration,
}

impl FrameCache {
    pub fn new(producer: FrameProducer, max_frame_count: usize, max_time_step: Duration) -> Self {
        Self {
            frame_count: producer.frame_count(),
            producer: Some(producer),
            frames: Vec::new(),
            max_frame_count: max_frame_count.max(1),
            max_time_step,
            current_slot: 0,
            preload_logical: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// A cache with no source. Every operation is a no-op.
    pub fn inert() -> Self {
        Self {
            producer: None,
            frames: Vec::new(),
            frame_count: 0,
            max_frame_count: DEFAULT_MAX_FRAME_COUNT,
            max_time_step: DEFAULT_MAX_TIME_STEP,
            current_slot: 0,
            preload_logical: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Populate the buffer with logical frames `0..buffer_len`.
    pub fn fill(&mut self) {
        self.current_slot = 0;
        self.elapsed = Duration::ZERO;
        let Some(producer) = self.producer.as_mut() else {
            self.frames.clear();
            self.preload_logical = 0;
            return;
        };

        let len = self.frame_count.min(self.max_frame_count);
        self.frames = (0..len).map(|i| producer.produce(i)).collect();
        self.preload_logical = if self.frame_count == 0 { 0 } else { len % self.frame_count };

        log::info!(
            "Frame cache filled: {}/{} frames{}",
            len,
            self.frame_count,
            if self.is_progressive() { " (progressive)" } else { "" }
        );
    }

    /// Accumulate `dt` (clamped to the max time step) and cross at most one
    /// frame boundary.
    pub fn advance(&mut self, dt: Duration) -> Advance {
        if self.frames.is_empty() {
            return Advance::Unchanged;
        }

        self.elapsed += dt.min(self.max_time_step);
        let duration = self.frames[self.current_slot].duration();
        if self.elapsed < duration {
            return Advance::Unchanged;
        }

        // Carry the remainder so frame timing doesn't drift
        self.elapsed -= duration;
        self.step_window();
        Advance::Advanced
    }

    /// Jump to logical frame `target`. Out-of-range targets are ignored.
    pub fn seek(&mut self, target: usize) {
        if target >= self.frame_count || self.frames.is_empty() {
            return;
        }
        self.elapsed = Duration::ZERO;

        if !self.is_progressive() {
            self.current_slot = target;
            return;
        }

        let Some(current) = self.current_logical() else {
            return;
        };
        if target == current {
            return;
        }

        // Targets still inside the window slide it forward; anything behind
        // or beyond the window is rebuilt from scratch.
        let distance = ring::forward_distance(current, target, self.frame_count);
        if distance < self.frames.len() {
            log::debug!("Seek {} -> {}: sliding window by {}", current, target, distance);
            for _ in 0..distance {
                self.step_window();
            }
        } else {
            log::debug!("Seek {} -> {}: rebuilding window", current, target);
            self.rebuild(target);
        }
    }

    fn step_window(&mut self) {
        let len = self.frames.len();
        let vacated = self.current_slot;
        self.current_slot = ring::wrap_add(vacated, len);

        if self.is_progressive() {
            if let Some(producer) = self.producer.as_mut() {
                self.frames[vacated] = producer.produce(self.preload_logical);
            }
            self.preload_logical = ring::wrap_add(self.preload_logical, self.frame_count);
        }
    }

    fn rebuild(&mut self, start: usize) {
        let Some(producer) = self.producer.as_mut() else {
            return;
        };
        let mut logical = start;
        for slot in &mut self.frames {
            *slot = producer.produce(logical);
            logical = ring::wrap_add(logical, self.frame_count);
        }
        self.current_slot = 0;
        self.preload_logical = logical;
    }

    /// Logical index held by `slot`, or `None` if the slot doesn't exist.
    pub fn slot_to_logical(&self, slot: usize) -> Option<usize> {
        let len = self.frames.len();
        if slot >= len {
            return None;
        }
        if !self.is_progressive() {
            return Some(slot);
        }
        let offset = ring::forward_distance(self.current_slot, slot, len);
        Some(ring::wrap_offset(
            self.preload_logical,
            offset as isize - len as isize,
            self.frame_count,
        ))
    }

    /// Slot -> logical index for every slot, derived from the current state.
    pub fn logical_table(&self) -> Vec<usize> {
        (0..self.frames.len())
            .filter_map(|slot| self.slot_to_logical(slot))
            .collect()
    }

    /// Logical index of the displayed frame.
    pub fn current_logical(&self) -> Option<usize> {
        self.slot_to_logical(self.current_slot)
    }

    pub fn current_frame(&self) -> Option<&PreparedFrame> {
        self.frames.get(self.current_slot)
    }

    /// Image of the displayed slot; `None` for placeholders or an empty cache.
    pub fn current_image(&self) -> Option<&RawFrame> {
        self.current_frame().and_then(|f| f.image())
    }

    pub fn current_duration(&self) -> Duration {
        self.current_frame().map_or(Duration::ZERO, |f| f.duration())
    }

    pub fn frame_at(&self, slot: usize) -> Result<&PreparedFrame, MediaError> {
        self.frames.get(slot).ok_or(MediaError::IndexOutOfRange {
            slot,
            len: self.frames.len(),
        })
    }

    pub fn is_animatable(&self) -> bool {
        self.frame_count > 1
    }

    /// Whether the buffer holds fewer frames than the sequence.
    pub fn is_progressive(&self) -> bool {
        self.frames.len() < self.frame_count
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn buffer_len(&self) -> usize {
        self.frames.len()
    }

    pub fn max_frame_count(&self) -> usize {
        self.max_frame_count
    }

    pub fn current_slot(&self) -> usize {
        self.current_slot
    }

    pub fn preload_logical(&self) -> usize {
        self.preload_logical
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Source canvas size, `(0, 0)` without a source.
    pub fn dimensions(&self) -> (u32, u32) {
        self.producer
            .as_ref()
            .map_or((0, 0), |p| p.source().dimensions())
    }

    pub fn nominal_duration(&self, index: usize) -> Duration {
        self.producer
            .as_ref()
            .map_or(Duration::ZERO, |p| p.nominal_duration(index))
    }

    pub fn decode_calls(&self) -> usize {
        self.producer.as_ref().map_or(0, |p| p.decode_calls())
    }
}

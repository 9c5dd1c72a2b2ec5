use std::path::Path;
use std::time::Duration;

use super::cache::{DEFAULT_MAX_TIME_STEP, FrameCache};
use super::decoder::{self, FrameSource};
use super::producer::{FrameProducer, Prescale};
use super::types::{Advance, RawFrame, TransportState};
use crate::config::PlaybackConfig;
use crate::error::MediaError;

/// What happened during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Nothing changed.
    None,
    /// A new frame is displayed.
    FrameChanged,
    /// Playback wrapped from the last frame back to the first.
    LoopCompleted { loops: u32 },
    /// The repeat count is exhausted; holding on the last frame.
    Finished { loops: u32 },
}

/// Timer-driven playback of an animated image over a bounded frame cache.
pub struct Animator {
    cache: FrameCache,
    pub transport: TransportState,
    loops_played: u32,
    /// Arrival at the last frame was counted by a tick, not reached by a seek.
    last_frame_counted: bool,
    finished: bool,
    needs_upload: bool,
}

impl Animator {
    pub fn new(source: Box<dyn FrameSource>, config: &PlaybackConfig) -> Self {
        let prescale = match config.target_size {
            Some(target) if config.needs_prescaling => Some(Prescale::new(target, config.fit_policy)),
            _ => None,
        };
        let max_time_step = match Duration::try_from_secs_f32(config.max_time_step_secs) {
            Ok(step) if !step.is_zero() => step,
            _ => {
                log::warn!(
                    "Invalid max_time_step_secs {}, using {:?}",
                    config.max_time_step_secs,
                    DEFAULT_MAX_TIME_STEP
                );
                DEFAULT_MAX_TIME_STEP
            }
        };

        let mut cache = FrameCache::new(
            FrameProducer::new(source, prescale),
            config.max_frame_count,
            max_time_step,
        );
        cache.fill();

        let transport = TransportState {
            repeat: config.repeat,
            speed: config.speed,
            ..TransportState::default()
        };

        let (width, height) = cache.dimensions();
        log::info!(
            "Animator ready: {}x{}, {} frame{}, {} cached",
            width,
            height,
            cache.frame_count(),
            if cache.frame_count() == 1 { "" } else { "s" },
            cache.buffer_len()
        );

        Self {
            needs_upload: cache.buffer_len() > 0,
            cache,
            transport,
            loops_played: 0,
            last_frame_counted: false,
            finished: false,
        }
    }

    /// Open `path`, or stay inert if it can't be opened.
    pub fn open(path: &Path, config: &PlaybackConfig) -> Self {
        match Self::try_open(path, config) {
            Ok(animator) => animator,
            Err(e) => {
                log::warn!("Failed to open {}: {}", path.display(), e);
                Self::inert()
            }
        }
    }

    pub fn try_open(path: &Path, config: &PlaybackConfig) -> Result<Self, MediaError> {
        let source = decoder::open_path(path)?;
        Ok(Self::new(source, config))
    }

    /// No source: zero frames, ticks never change anything.
    pub fn inert() -> Self {
        let transport = TransportState {
            playing: false,
            ..TransportState::default()
        };
        Self {
            cache: FrameCache::inert(),
            transport,
            loops_played: 0,
            last_frame_counted: false,
            finished: false,
            needs_upload: false,
        }
    }

    /// Advance playback by `dt_secs` of wall time.
    pub fn tick(&mut self, dt_secs: f32) -> PlaybackEvent {
        if !self.transport.playing || self.finished || !self.cache.is_animatable() {
            return PlaybackEvent::None;
        }
        // Negative, NaN and overflowing steps are dropped
        let Ok(dt) = Duration::try_from_secs_f64(dt_secs as f64 * self.transport.speed as f64)
        else {
            return PlaybackEvent::None;
        };

        let was_last = self.is_last_frame();
        if self.cache.advance(dt) == Advance::Unchanged {
            return PlaybackEvent::None;
        }
        self.needs_upload = true;

        if self.is_last_frame() {
            self.loops_played += 1;
            self.last_frame_counted = true;
            if self.transport.repeat.is_reached(self.loops_played) {
                self.finished = true;
                log::debug!("Playback finished after {} loop(s)", self.loops_played);
                return PlaybackEvent::Finished {
                    loops: self.loops_played,
                };
            }
        } else if was_last && std::mem::take(&mut self.last_frame_counted) {
            return PlaybackEvent::LoopCompleted {
                loops: self.loops_played,
            };
        }
        PlaybackEvent::FrameChanged
    }

    /// Seek to a specific logical frame, clamped to the sequence.
    ///
    /// A seek never counts a loop. Seeking anywhere but the last frame resumes
    /// a finished animation; its loop counter is kept, so the next arrival at
    /// the last frame finishes it again.
    pub fn seek_to_frame(&mut self, frame: usize) {
        let num_frames = self.cache.frame_count();
        if num_frames == 0 {
            return;
        }
        let target = frame.min(num_frames - 1);
        self.last_frame_counted = false;
        if target != num_frames - 1 {
            self.finished = false;
        }
        if Some(target) != self.cache.current_logical() {
            self.needs_upload = true;
        }
        self.cache.seek(target);
    }

    /// Seek to a time offset in seconds within one loop.
    pub fn seek_to_secs(&mut self, secs: f64) {
        let num_frames = self.cache.frame_count();
        let mut accum = 0.0;
        for i in 0..num_frames {
            accum += self.cache.nominal_duration(i).as_secs_f64();
            if accum > secs {
                self.seek_to_frame(i);
                return;
            }
        }
        // Past the end
        self.seek_to_frame(num_frames.saturating_sub(1));
    }

    /// Rewind to the first frame and clear the loop counter.
    pub fn reset(&mut self) {
        self.loops_played = 0;
        self.finished = false;
        self.seek_to_frame(0);
    }

    /// Start of the current frame, in seconds from the loop start.
    pub fn position_secs(&self) -> f64 {
        let current = self.current_frame();
        (0..current)
            .map(|i| self.cache.nominal_duration(i).as_secs_f64())
            .sum()
    }

    /// Length of one loop in seconds.
    pub fn duration_secs(&self) -> f64 {
        (0..self.cache.frame_count())
            .map(|i| self.cache.nominal_duration(i).as_secs_f64())
            .sum()
    }

    /// Logical index of the displayed frame (0 when inert).
    pub fn current_frame(&self) -> usize {
        self.cache.current_logical().unwrap_or(0)
    }

    pub fn current_image(&self) -> Option<&RawFrame> {
        self.cache.current_image()
    }

    /// Canvas size of the source, before prescaling. `(0, 0)` when inert.
    pub fn dimensions(&self) -> (u32, u32) {
        self.cache.dimensions()
    }

    /// True once after the displayed image changed.
    pub fn take_needs_upload(&mut self) -> bool {
        std::mem::take(&mut self.needs_upload)
    }

    fn is_last_frame(&self) -> bool {
        let count = self.cache.frame_count();
        count > 0 && self.cache.current_logical() == Some(count - 1)
    }

    pub fn frame_count(&self) -> usize {
        self.cache.frame_count()
    }

    pub fn is_animated(&self) -> bool {
        self.cache.is_animatable()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn loops_played(&self) -> u32 {
        self.loops_played
    }

    pub fn cache(&self) -> &FrameCache {
        &self.cache
    }
}

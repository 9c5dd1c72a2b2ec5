use std::time::Duration;

use super::decoder::FrameSource;
use super::transform::{FrameTransform, ImageResizer};
use super::types::{FitPolicy, PreparedFrame, TargetSize};

/// Optional prescaling applied to every produced frame.
pub struct Prescale {
    pub transform: Box<dyn FrameTransform>,
    pub target: TargetSize,
    pub policy: FitPolicy,
}

impl Prescale {
    pub fn new(target: TargetSize, policy: FitPolicy) -> Self {
        Self {
            transform: Box::new(ImageResizer::default()),
            target,
            policy,
        }
    }
}

/// Materializes logical frames: decode, then optionally resize.
pub struct FrameProducer {
    source: Box<dyn FrameSource>,
    prescale: Option<Prescale>,
    decode_calls: usize,
}

impl FrameProducer {
    pub fn new(source: Box<dyn FrameSource>, prescale: Option<Prescale>) -> Self {
        Self {
            source,
            prescale,
            decode_calls: 0,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.source.frame_count()
    }

    pub fn source(&self) -> &dyn FrameSource {
        self.source.as_ref()
    }

    pub fn nominal_duration(&self, index: usize) -> Duration {
        self.source.nominal_duration(index)
    }

    /// Total decode attempts so far, successful or not.
    pub fn decode_calls(&self) -> usize {
        self.decode_calls
    }

    /// Produce frame `index`. A failed decode degrades to `Missing`.
    pub fn produce(&mut self, index: usize) -> PreparedFrame {
        self.decode_calls += 1;
        let image = match self.source.decode_frame(index) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("Frame {} unavailable, using placeholder: {}", index, e);
                return PreparedFrame::Missing;
            }
        };

        let image = match &self.prescale {
            Some(p) => p.transform.resize(image, p.target, p.policy),
            None => image,
        };

        PreparedFrame::Decoded {
            image,
            duration: self.source.nominal_duration(index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::testing::ScriptedSource;

    #[test]
    fn produce_decodes_with_nominal_duration() {
        let (source, calls) = ScriptedSource::new(3, 40);
        let mut producer = FrameProducer::new(Box::new(source), None);
        let frame = producer.produce(1);
        assert_eq!(frame.duration(), Duration::from_millis(40));
        assert_eq!(frame.image().map(|i| i.get_pixel(0, 0).0[0]), Some(1));
        assert_eq!(calls.get(), 1);
        assert_eq!(producer.decode_calls(), 1);
    }

    #[test]
    fn failed_decode_becomes_placeholder() {
        let (source, _calls) = ScriptedSource::new(3, 40);
        let mut producer = FrameProducer::new(Box::new(source.failing_at(2)), None);
        assert!(producer.produce(2).is_missing());
        assert!(!producer.produce(1).is_missing());
        assert_eq!(producer.decode_calls(), 2);
    }

    #[test]
    fn prescale_resizes_output() {
        let (source, _calls) = ScriptedSource::new(2, 40);
        let prescale = Prescale::new(TargetSize::new(2, 2), FitPolicy::Stretch);
        let mut producer = FrameProducer::new(Box::new(source), Some(prescale));
        let frame = producer.produce(0);
        assert_eq!(frame.image().map(|i| i.dimensions()), Some((2, 2)));
    }
}

use thiserror::Error;

/// Errors surfaced by frame sources and the frame cache.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The source could not be opened at all. Fatal to the cache.
    #[error("unsupported source: {0}")]
    UnsupportedSource(String),
    /// A single frame failed to decode. Recovered locally as a placeholder.
    #[error("failed to decode frame {index}: {reason}")]
    Decode { index: usize, reason: String },
    /// Direct slot access outside the buffer.
    #[error("slot {slot} out of range (buffer holds {len})")]
    IndexOutOfRange { slot: usize, len: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MediaError {
    pub(crate) fn decode(index: usize, reason: impl std::fmt::Display) -> Self {
        MediaError::Decode {
            index,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_message_names_index() {
        let err = MediaError::decode(7, "truncated block");
        assert_eq!(err.to_string(), "failed to decode frame 7: truncated block");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: MediaError = io.into();
        assert!(matches!(err, MediaError::Io(_)));
    }
}

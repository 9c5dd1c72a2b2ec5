use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use image_webp::WebPDecoder;

use super::types::RawFrame;
use crate::error::MediaError;

/// Delays below this are treated as unset, like browsers do.
const MIN_DELAY_MS: u64 = 11;
/// Substituted for unset or near-zero delays.
const FALLBACK_DELAY_MS: u64 = 100;

/// A cyclic sequence of frames that can be decoded on demand.
pub trait FrameSource {
    fn frame_count(&self) -> usize;

    fn dimensions(&self) -> (u32, u32);

    /// Decode frame `index` as a full-canvas RGBA image.
    fn decode_frame(&mut self, index: usize) -> Result<RawFrame, MediaError>;

    /// Display duration of frame `index`. Zero for out-of-range indices.
    fn nominal_duration(&self, index: usize) -> Duration;

    fn is_animated(&self) -> bool {
        self.frame_count() > 1
    }
}

/// Container kind, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Gif,
    Webp,
    Still,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "gif" => SourceKind::Gif,
            "webp" => SourceKind::Webp,
            _ => SourceKind::Still,
        }
    }
}

/// Open an image or animation from a file path.
pub fn open_path(path: &Path) -> Result<Box<dyn FrameSource>, MediaError> {
    let bytes = std::fs::read(path)?;
    open_bytes(bytes, SourceKind::from_path(path))
}

/// Open an image or animation from encoded bytes.
pub fn open_bytes(bytes: Vec<u8>, kind: SourceKind) -> Result<Box<dyn FrameSource>, MediaError> {
    Ok(match kind {
        SourceKind::Gif => Box::new(GifSource::from_bytes(bytes)?),
        SourceKind::Webp => Box::new(WebpSource::from_bytes(bytes)?),
        SourceKind::Still => Box::new(StaticSource::from_bytes(&bytes)?),
    })
}

fn frame_delay(ms: u64) -> Duration {
    if ms < MIN_DELAY_MS {
        Duration::from_millis(FALLBACK_DELAY_MS)
    } else {
        Duration::from_millis(ms)
    }
}

fn delay_at(delays: &[Duration], index: usize) -> Duration {
    delays.get(index).copied().unwrap_or(Duration::ZERO)
}

// ---------------------------------------------------------------------------
// GIF
// ---------------------------------------------------------------------------

type GifReader = gif::Decoder<Cursor<Arc<[u8]>>>;

fn open_gif_reader(data: &Arc<[u8]>) -> Result<GifReader, gif::DecodingError> {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);
    options.read_info(Cursor::new(Arc::clone(data)))
}

/// Animated GIF decoded lazily, one composited frame at a time.
pub struct GifSource {
    data: Arc<[u8]>,
    width: u32,
    height: u32,
    delays: Vec<Duration>,
    cursor: Option<GifCursor>,
}

impl GifSource {
    /// Scan the stream once for frame count and delays. Pixels are discarded.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, MediaError> {
        let data: Arc<[u8]> = bytes.into();
        let mut reader = open_gif_reader(&data)
            .map_err(|e| MediaError::UnsupportedSource(format!("failed to decode GIF: {e}")))?;

        let width = reader.width() as u32;
        let height = reader.height() as u32;

        let mut delays = Vec::new();
        while let Some(frame) = reader
            .read_next_frame()
            .map_err(|e| MediaError::UnsupportedSource(format!("GIF frame error: {e}")))?
        {
            // GIF delay is in centiseconds
            delays.push(frame_delay(frame.delay as u64 * 10));
        }

        if delays.is_empty() {
            return Err(MediaError::UnsupportedSource("GIF has no frames".to_string()));
        }

        log::info!("Opened GIF: {}x{}, {} frames", width, height, delays.len());

        Ok(Self {
            data,
            width,
            height,
            delays,
            cursor: None,
        })
    }
}

impl FrameSource for GifSource {
    fn frame_count(&self) -> usize {
        self.delays.len()
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn decode_frame(&mut self, index: usize) -> Result<RawFrame, MediaError> {
        if index >= self.delays.len() {
            return Err(MediaError::decode(index, "index past end of sequence"));
        }

        // Continue from the cursor when moving forward, rewind otherwise.
        let mut cursor = match self.cursor.take() {
            Some(c) if c.next_index <= index + 1 => c,
            _ => GifCursor::start(&self.data, self.width, self.height)
                .map_err(|e| MediaError::decode(index, e))?,
        };

        let frame = cursor.composite_through(index, self.width, self.height)?;
        self.cursor = Some(cursor);
        Ok(frame)
    }

    fn nominal_duration(&self, index: usize) -> Duration {
        delay_at(&self.delays, index)
    }
}

/// What to do to the canvas before compositing the next frame.
enum Disposal {
    Keep,
    Clear { left: u32, top: u32, width: u32, height: u32 },
    Restore(Vec<u8>),
}

struct GifCursor {
    reader: GifReader,
    canvas: Vec<u8>,
    /// Index of the next frame the reader will yield.
    next_index: usize,
    pending: Disposal,
}

impl GifCursor {
    fn start(data: &Arc<[u8]>, width: u32, height: u32) -> Result<Self, gif::DecodingError> {
        Ok(Self {
            reader: open_gif_reader(data)?,
            canvas: vec![0u8; (width as usize) * (height as usize) * 4],
            next_index: 0,
            pending: Disposal::Keep,
        })
    }

    /// Composite frames up to and including `index`, returning the canvas.
    fn composite_through(
        &mut self,
        index: usize,
        width: u32,
        height: u32,
    ) -> Result<RawFrame, MediaError> {
        while self.next_index <= index {
            let frame_index = self.next_index;
            self.apply_pending(width, height);

            let Some(frame) = self
                .reader
                .read_next_frame()
                .map_err(|e| MediaError::decode(frame_index, e))?
            else {
                return Err(MediaError::decode(frame_index, "stream ended early"));
            };

            self.pending = match frame.dispose {
                gif::DisposalMethod::Background => Disposal::Clear {
                    left: frame.left as u32,
                    top: frame.top as u32,
                    width: frame.width as u32,
                    height: frame.height as u32,
                },
                gif::DisposalMethod::Previous => Disposal::Restore(self.canvas.clone()),
                _ => Disposal::Keep,
            };

            let fx = frame.left as u32;
            let fy = frame.top as u32;
            let fw = frame.width as u32;
            let fh = frame.height as u32;
            for y in 0..fh {
                for x in 0..fw {
                    let src_idx = ((y * fw + x) * 4) as usize;
                    let dst_x = fx + x;
                    let dst_y = fy + y;
                    if dst_x >= width || dst_y >= height || src_idx + 4 > frame.buffer.len() {
                        continue;
                    }
                    let src = &frame.buffer[src_idx..src_idx + 4];
                    // Transparent pixels leave the previous canvas visible
                    if src[3] > 0 {
                        let dst_idx = ((dst_y * width + dst_x) * 4) as usize;
                        self.canvas[dst_idx..dst_idx + 4].copy_from_slice(src);
                    }
                }
            }

            self.next_index += 1;
        }

        RawFrame::from_raw(width, height, self.canvas.clone())
            .ok_or_else(|| MediaError::decode(index, "canvas size mismatch"))
    }

    fn apply_pending(&mut self, width: u32, height: u32) {
        match std::mem::replace(&mut self.pending, Disposal::Keep) {
            Disposal::Keep => {}
            Disposal::Clear {
                left,
                top,
                width: w,
                height: h,
            } => {
                for y in top..(top + h).min(height) {
                    for x in left..(left + w).min(width) {
                        let idx = ((y * width + x) * 4) as usize;
                        self.canvas[idx..idx + 4].fill(0);
                    }
                }
            }
            Disposal::Restore(previous) => self.canvas = previous,
        }
    }
}

// ---------------------------------------------------------------------------
// WebP
// ---------------------------------------------------------------------------

type WebpReader = WebPDecoder<Cursor<Arc<[u8]>>>;

fn open_webp_reader(data: &Arc<[u8]>) -> Result<WebpReader, image_webp::DecodingError> {
    WebPDecoder::new(Cursor::new(Arc::clone(data)))
}

/// Expand an RGB or RGBA buffer into an RGBA frame.
fn rgba_frame(buf: Vec<u8>, width: u32, height: u32) -> Option<RawFrame> {
    let pixels = (width as usize) * (height as usize);
    if buf.len() == pixels * 4 {
        return RawFrame::from_raw(width, height, buf);
    }
    if buf.len() == pixels * 3 {
        let mut rgba = Vec::with_capacity(pixels * 4);
        for px in buf.chunks_exact(3) {
            rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
        }
        return RawFrame::from_raw(width, height, rgba);
    }
    None
}

/// WebP image; animated files are decoded lazily like GIFs.
pub struct WebpSource {
    data: Arc<[u8]>,
    width: u32,
    height: u32,
    animated: bool,
    delays: Vec<Duration>,
    cursor: Option<WebpCursor>,
}

struct WebpCursor {
    reader: WebpReader,
    next_index: usize,
    last: Option<RawFrame>,
}

impl WebpSource {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, MediaError> {
        let data: Arc<[u8]> = bytes.into();
        let unsupported = |e: image_webp::DecodingError| {
            MediaError::UnsupportedSource(format!("failed to decode WebP: {e}"))
        };
        let mut reader = open_webp_reader(&data).map_err(unsupported)?;
        let (width, height) = reader.dimensions();
        let animated = reader.is_animated();

        let delays = if animated {
            let size = reader
                .output_buffer_size()
                .ok_or_else(|| MediaError::UnsupportedSource("WebP frame too large".to_string()))?;
            let mut buf = vec![0u8; size];
            let mut delays = Vec::with_capacity(reader.num_frames() as usize);
            for _ in 0..reader.num_frames() {
                let ms = reader.read_frame(&mut buf).map_err(unsupported)?;
                delays.push(frame_delay(ms as u64));
            }
            delays
        } else {
            vec![Duration::ZERO]
        };

        if delays.is_empty() {
            return Err(MediaError::UnsupportedSource("WebP has no frames".to_string()));
        }

        log::info!(
            "Opened WebP: {}x{}, {} frame{}",
            width,
            height,
            delays.len(),
            if delays.len() == 1 { "" } else { "s" }
        );

        Ok(Self {
            data,
            width,
            height,
            animated,
            delays,
            cursor: None,
        })
    }

    fn decode_still(&self) -> Result<RawFrame, MediaError> {
        let mut reader = open_webp_reader(&self.data).map_err(|e| MediaError::decode(0, e))?;
        let size = reader
            .output_buffer_size()
            .ok_or_else(|| MediaError::decode(0, "image too large"))?;
        let mut buf = vec![0u8; size];
        reader.read_image(&mut buf).map_err(|e| MediaError::decode(0, e))?;
        rgba_frame(buf, self.width, self.height)
            .ok_or_else(|| MediaError::decode(0, "unexpected buffer layout"))
    }
}

impl FrameSource for WebpSource {
    fn frame_count(&self) -> usize {
        self.delays.len()
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn decode_frame(&mut self, index: usize) -> Result<RawFrame, MediaError> {
        if index >= self.delays.len() {
            return Err(MediaError::decode(index, "index past end of sequence"));
        }
        if !self.animated {
            return self.decode_still();
        }

        let mut cursor = match self.cursor.take() {
            Some(c) if c.next_index == index + 1 && c.last.is_some() => c,
            Some(c) if c.next_index <= index => c,
            _ => WebpCursor {
                reader: open_webp_reader(&self.data).map_err(|e| MediaError::decode(index, e))?,
                next_index: 0,
                last: None,
            },
        };

        while cursor.next_index <= index {
            let frame_index = cursor.next_index;
            let size = cursor
                .reader
                .output_buffer_size()
                .ok_or_else(|| MediaError::decode(frame_index, "frame too large"))?;
            let mut buf = vec![0u8; size];
            cursor
                .reader
                .read_frame(&mut buf)
                .map_err(|e| MediaError::decode(frame_index, e))?;
            cursor.last = Some(
                rgba_frame(buf, self.width, self.height)
                    .ok_or_else(|| MediaError::decode(frame_index, "unexpected buffer layout"))?,
            );
            cursor.next_index += 1;
        }

        let frame = cursor
            .last
            .clone()
            .ok_or_else(|| MediaError::decode(index, "no frame decoded"))?;
        self.cursor = Some(cursor);
        Ok(frame)
    }

    fn nominal_duration(&self, index: usize) -> Duration {
        delay_at(&self.delays, index)
    }
}

// ---------------------------------------------------------------------------
// Still images
// ---------------------------------------------------------------------------

/// Any single-frame image the `image` crate can decode.
pub struct StaticSource {
    frame: RawFrame,
}

impl StaticSource {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MediaError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| MediaError::UnsupportedSource(format!("failed to open image: {e}")))?;
        Ok(Self {
            frame: img.to_rgba8(),
        })
    }

    pub fn from_frame(frame: RawFrame) -> Self {
        Self { frame }
    }
}

impl FrameSource for StaticSource {
    fn frame_count(&self) -> usize {
        1
    }

    fn dimensions(&self) -> (u32, u32) {
        self.frame.dimensions()
    }

    fn decode_frame(&mut self, index: usize) -> Result<RawFrame, MediaError> {
        if index != 0 {
            return Err(MediaError::decode(index, "still image has one frame"));
        }
        Ok(self.frame.clone())
    }

    fn nominal_duration(&self, _index: usize) -> Duration {
        Duration::ZERO
    }
}

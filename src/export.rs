//! Looping GIF export: twelve frames sampled on the animation clock,
//! rendered synchronously in order, then encoded and delivered off-thread.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::foundation::core::Canvas;
use crate::foundation::error::{InkError, InkResult};
use crate::model::store::LayerStore;
use crate::preview::TIME_BUCKETS_PER_SEC;
use crate::render::{BackgroundRaster, Compositor, FrameRgba};

/// Frames per exported loop, one full wobble-and-a-half second of clock.
pub const EXPORT_FRAME_COUNT: u32 = 12;
/// Per-frame display time, matching the 8 Hz animation clock.
pub const FRAME_DELAY_MS: u32 = 125;
/// Longest edge of an exported frame; larger canvases are scaled down.
pub const MAX_EXPORT_EDGE: u32 = 1000;

/// Output dimensions and the user-to-device scale for a canvas.
///
/// Never upscales.
pub fn export_dimensions(canvas: Canvas) -> (u32, u32, f64) {
    let scale = (f64::from(MAX_EXPORT_EDGE) / f64::from(canvas.max_edge())).min(1.0);
    let width = (f64::from(canvas.width) * scale).round().max(1.0) as u32;
    let height = (f64::from(canvas.height) * scale).round().max(1.0) as u32;
    (width, height, scale)
}

/// Configuration handed to an [`AnimationSink`] before any frames.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
}

/// Consumer of rendered export frames.
///
/// `push_frame` is called in strictly increasing index order; `finish`
/// produces the encoded blob and may run on a worker thread.
pub trait AnimationSink: Send {
    fn begin(&mut self, config: &SinkConfig) -> InkResult<()>;
    fn push_frame(&mut self, index: u32, frame: &FrameRgba, delay_ms: u32) -> InkResult<()>;
    fn finish(self: Box<Self>) -> InkResult<Vec<u8>>;
}

/// Buffers frames and encodes an infinitely looping GIF on `finish`.
#[derive(Default)]
pub struct GifSink {
    config: Option<SinkConfig>,
    frames: Vec<(FrameRgba, u32)>,
    next_index: u32,
}

impl GifSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnimationSink for GifSink {
    fn begin(&mut self, config: &SinkConfig) -> InkResult<()> {
        if config.width == 0 || config.height == 0 {
            return Err(InkError::export("gif dimensions must be non-zero"));
        }
        self.config = Some(config.clone());
        self.frames.clear();
        self.next_index = 0;
        Ok(())
    }

    fn push_frame(&mut self, index: u32, frame: &FrameRgba, delay_ms: u32) -> InkResult<()> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| InkError::export("push_frame before begin"))?;
        if index != self.next_index {
            return Err(InkError::export(format!(
                "frames must arrive in order: got {index}, expected {}",
                self.next_index
            )));
        }
        if frame.width != config.width || frame.height != config.height {
            return Err(InkError::export("frame dimensions do not match sink config"));
        }
        self.frames.push((frame.clone(), delay_ms));
        self.next_index += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> InkResult<Vec<u8>> {
        use image::codecs::gif::{GifEncoder, Repeat};

        if self.frames.is_empty() {
            return Err(InkError::export("no frames to encode"));
        }

        let mut blob = Vec::new();
        {
            let mut encoder = GifEncoder::new_with_speed(&mut blob, 10);
            encoder
                .set_repeat(Repeat::Infinite)
                .map_err(|e| InkError::export(format!("gif repeat setup failed: {e}")))?;
            for (frame, delay_ms) in self.frames {
                // The encoder wants straight alpha; frames carry premul.
                let image =
                    image::RgbaImage::from_raw(frame.width, frame.height, frame.to_straight_rgba())
                        .ok_or_else(|| InkError::export("frame buffer size mismatch"))?;
                let delay = image::Delay::from_numer_denom_ms(delay_ms, 1);
                encoder
                    .encode_frame(image::Frame::from_parts(image, 0, 0, delay))
                    .map_err(|e| InkError::export(format!("gif frame encode failed: {e}")))?;
            }
        }
        Ok(blob)
    }
}

/// Everything a [`CapturingSink`] observed, for assertions.
#[derive(Clone, Debug, Default)]
pub struct CapturedExport {
    pub config: Option<SinkConfig>,
    pub frames: Vec<(u32, FrameRgba, u32)>,
    pub finished: bool,
}

/// Test sink recording calls into shared state.
pub struct CapturingSink {
    shared: Arc<Mutex<CapturedExport>>,
}

impl CapturingSink {
    pub fn new() -> (Self, Arc<Mutex<CapturedExport>>) {
        let shared = Arc::new(Mutex::new(CapturedExport::default()));
        (
            Self {
                shared: Arc::clone(&shared),
            },
            shared,
        )
    }
}

impl AnimationSink for CapturingSink {
    fn begin(&mut self, config: &SinkConfig) -> InkResult<()> {
        self.shared.lock().unwrap().config = Some(config.clone());
        Ok(())
    }

    fn push_frame(&mut self, index: u32, frame: &FrameRgba, delay_ms: u32) -> InkResult<()> {
        self.shared
            .lock()
            .unwrap()
            .frames
            .push((index, frame.clone(), delay_ms));
        Ok(())
    }

    fn finish(self: Box<Self>) -> InkResult<Vec<u8>> {
        self.shared.lock().unwrap().finished = true;
        Ok(Vec::new())
    }
}

/// Destination for a finished export blob.
pub trait Delivery: Send {
    fn deliver(&mut self, blob: &[u8], suggested_name: &str) -> InkResult<()>;
}

/// Writes the blob to a filesystem path.
pub struct FileDelivery {
    path: PathBuf,
}

impl FileDelivery {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Delivery for FileDelivery {
    fn deliver(&mut self, blob: &[u8], _suggested_name: &str) -> InkResult<()> {
        std::fs::write(&self.path, blob).map_err(|e| {
            InkError::export(format!("failed to write '{}': {e}", self.path.display()))
        })
    }
}

/// Handle to the encode-and-deliver stage running off-thread.
pub struct ExportJob {
    handle: std::thread::JoinHandle<InkResult<Vec<u8>>>,
}

impl ExportJob {
    /// Block until encoding and delivery complete; returns the blob.
    pub fn wait(self) -> InkResult<Vec<u8>> {
        self.handle
            .join()
            .map_err(|_| InkError::export("export worker panicked"))?
    }
}

struct ClearOnDrop(Arc<AtomicBool>);

impl Drop for ClearOnDrop {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives a full twelve-frame export.
///
/// Frame rendering runs synchronously on the caller so the drawing state
/// cannot change mid-export; encoding and delivery move to a worker. At
/// most one export runs at a time.
pub struct Exporter {
    compositor: Compositor,
    in_flight: Arc<AtomicBool>,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter {
    pub fn new() -> Self {
        Self {
            compositor: Compositor::new(),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Render, encode, and deliver one looping animation.
    ///
    /// Returns an error without touching the sink when an export is
    /// already running. Delivery failure is logged but does not fail the
    /// job; the encoded blob is still returned from [`ExportJob::wait`].
    pub fn export(
        &mut self,
        store: &LayerStore,
        background: Option<&BackgroundRaster>,
        canvas: Canvas,
        mut sink: Box<dyn AnimationSink>,
        mut delivery: Box<dyn Delivery>,
    ) -> InkResult<ExportJob> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(InkError::export("an export is already in progress"));
        }
        let guard = ClearOnDrop(Arc::clone(&self.in_flight));

        self.render_frames(store, background, canvas, sink.as_mut())?;

        let handle = std::thread::spawn(move || {
            let _guard = guard;
            let blob = sink.finish()?;
            tracing::info!(bytes = blob.len(), "export encoded");
            if let Err(error) = delivery.deliver(&blob, "drawing.gif") {
                tracing::warn!(%error, "export delivery failed");
            }
            Ok(blob)
        });
        Ok(ExportJob { handle })
    }

    fn render_frames(
        &mut self,
        store: &LayerStore,
        background: Option<&BackgroundRaster>,
        canvas: Canvas,
        sink: &mut dyn AnimationSink,
    ) -> InkResult<()> {
        let (width, height, scale) = export_dimensions(canvas);
        tracing::info!(width, height, frames = EXPORT_FRAME_COUNT, "export started");

        sink.begin(&SinkConfig { width, height })?;
        for index in 0..EXPORT_FRAME_COUNT {
            let t = f64::from(index) / TIME_BUCKETS_PER_SEC;
            let frame = self
                .compositor
                .render_scaled(store, background, width, height, scale, t)?;
            sink.push_frame(index, &frame, FRAME_DELAY_MS)?;
            tracing::debug!(frame = index, "export frame rendered");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_cap_longest_edge_at_1000() {
        let (w, h, scale) = export_dimensions(Canvas::new(2000, 1000).unwrap());
        assert_eq!((w, h), (1000, 500));
        assert_eq!(scale, 0.5);

        let (w, h, scale) = export_dimensions(Canvas::new(800, 600).unwrap());
        assert_eq!((w, h), (800, 600));
        assert_eq!(scale, 1.0);
    }

    #[test]
    fn dimensions_round_and_stay_positive() {
        // 1500x333 scales by 2/3; height rounds rather than truncates.
        let (w, h, _) = export_dimensions(Canvas::new(1500, 333).unwrap());
        assert_eq!(w, 1000);
        assert_eq!(h, 222);

        let (w, h, _) = export_dimensions(Canvas::new(100_000, 1).unwrap());
        assert_eq!(w, 1000);
        assert_eq!(h, 1);
    }

    fn tiny_frame() -> FrameRgba {
        FrameRgba {
            width: 2,
            height: 2,
            data: vec![255u8; 16],
        }
    }

    #[test]
    fn gif_sink_enforces_frame_order() {
        let mut sink = GifSink::new();
        sink.begin(&SinkConfig {
            width: 2,
            height: 2,
        })
        .unwrap();
        sink.push_frame(0, &tiny_frame(), 125).unwrap();
        assert!(sink.push_frame(2, &tiny_frame(), 125).is_err());
    }

    #[test]
    fn gif_sink_rejects_mismatched_frames() {
        let mut sink = GifSink::new();
        assert!(sink.push_frame(0, &tiny_frame(), 125).is_err());

        sink.begin(&SinkConfig {
            width: 4,
            height: 4,
        })
        .unwrap();
        assert!(sink.push_frame(0, &tiny_frame(), 125).is_err());
    }

    #[test]
    fn gif_sink_emits_gif89a_blob() {
        let mut sink = Box::new(GifSink::new());
        sink.begin(&SinkConfig {
            width: 2,
            height: 2,
        })
        .unwrap();
        sink.push_frame(0, &tiny_frame(), 125).unwrap();
        sink.push_frame(1, &tiny_frame(), 125).unwrap();
        let blob = sink.finish().unwrap();
        assert!(blob.starts_with(b"GIF89a"));
    }
}

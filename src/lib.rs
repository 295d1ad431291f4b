//! Wobble Ink is a layered drawing engine with time-animated brushes and
//! looping GIF export.
//!
//! The surface is host-agnostic: a UI feeds pointer events into a
//! [`LayerStore`], redraws through a [`PreviewLoop`], and hands the store
//! to an [`Exporter`] when the user asks for a GIF.
//!
//! - Capture strokes into a [`LayerStore`] via a [`BrushConfig`]
//! - Render frames with a [`Compositor`] or drive a [`PreviewLoop`]
//! - Export a twelve-frame loop through an [`Exporter`] and [`AnimationSink`]
//!
//! Strokes store raw geometry only; wobble and the other effects are
//! evaluated at render time, so any instant can be re-rendered exactly.
#![forbid(unsafe_code)]

mod foundation;

/// GIF export pipeline and sinks.
pub mod export;
/// Strokes, layers, and the capture state machine.
pub mod model;
/// Quantized preview clock and redraw loop.
pub mod preview;
/// CPU rasterization and compositing.
pub mod render;

pub use crate::foundation::core::{Affine, BezPath, Canvas, Point, Rgba8, Vec2};
pub use crate::foundation::error::{InkError, InkResult};

pub use crate::export::{
    AnimationSink, CapturedExport, CapturingSink, Delivery, EXPORT_FRAME_COUNT, ExportJob,
    Exporter, FRAME_DELAY_MS, FileDelivery, GifSink, MAX_EXPORT_EDGE, SinkConfig,
    export_dimensions,
};
pub use crate::model::store::{CaptureState, INITIAL_LAYER_COUNT, Layer, LayerStore};
pub use crate::model::stroke::{
    BrushConfig, DEFAULT_WOBBLE_AMPLITUDE, DEFAULT_WOBBLE_SPEED, EffectFlags, Stroke, TonePattern,
    ToolKind,
};
pub use crate::preview::{Clock, PreviewLoop, SystemClock, TIME_BUCKETS_PER_SEC, quantize_time};
pub use crate::render::{BackgroundRaster, Compositor, FrameRgba};

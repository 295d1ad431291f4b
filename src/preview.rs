//! Live preview ticking on the quantized animation clock.
//!
//! Time advances in 1/8 s buckets, so wobble geometry holds still between
//! buckets and every renderer asking for the same wall-clock instant gets
//! bit-identical frames.

use crate::foundation::core::Canvas;
use crate::foundation::error::InkResult;
use crate::model::store::LayerStore;
use crate::render::{BackgroundRaster, Compositor, FrameRgba};

/// Animation clock granularity.
pub const TIME_BUCKETS_PER_SEC: f64 = 8.0;

/// Snap a wall-clock reading down to its 1/8 s bucket.
pub fn quantize_time(secs: f64) -> f64 {
    (secs * TIME_BUCKETS_PER_SEC).floor() / TIME_BUCKETS_PER_SEC
}

/// Wall-clock source, swappable for tests.
pub trait Clock {
    /// Seconds elapsed since some fixed origin.
    fn now_secs(&self) -> f64;
}

/// Monotonic clock counting from its construction.
pub struct SystemClock {
    epoch: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: std::time::Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

/// Continuous redraw driver.
pub struct PreviewLoop<C: Clock> {
    clock: C,
    compositor: Compositor,
}

impl PreviewLoop<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock::new())
    }
}

impl Default for PreviewLoop<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> PreviewLoop<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            compositor: Compositor::new(),
        }
    }

    /// Render one frame at the current quantized clock reading.
    pub fn tick(
        &mut self,
        store: &LayerStore,
        background: Option<&BackgroundRaster>,
        canvas: Canvas,
    ) -> InkResult<FrameRgba> {
        let t = quantize_time(self.clock.now_secs());
        self.compositor.render_frame(store, background, canvas, t)
    }

    /// Tick until `present` returns `false`.
    ///
    /// `present` receives each frame plus mutable store access, so a host
    /// can feed input events between frames. A failed tick is logged and
    /// skipped rather than tearing the loop down.
    pub fn run(
        &mut self,
        store: &mut LayerStore,
        background: Option<&BackgroundRaster>,
        canvas: Canvas,
        mut present: impl FnMut(&FrameRgba, &mut LayerStore) -> bool,
    ) -> InkResult<()> {
        loop {
            match self.tick(store, background, canvas) {
                Ok(frame) => {
                    if !present(&frame, store) {
                        return Ok(());
                    }
                }
                Err(error) => {
                    tracing::warn!(%error, "preview tick failed, frame skipped");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct ManualClock(Cell<f64>);

    impl Clock for ManualClock {
        fn now_secs(&self) -> f64 {
            self.0.get()
        }
    }

    #[test]
    fn quantize_snaps_down_to_eighths() {
        assert_eq!(quantize_time(0.0), 0.0);
        assert_eq!(quantize_time(0.124), 0.0);
        assert_eq!(quantize_time(0.125), 0.125);
        assert_eq!(quantize_time(0.999), 0.875);
        assert_eq!(quantize_time(2.51), 2.5);
    }

    #[test]
    fn ticks_within_one_bucket_are_identical() {
        let clock = ManualClock(Cell::new(0.3));
        let mut preview = PreviewLoop::with_clock(clock);
        let store = LayerStore::with_default_layers();
        let canvas = Canvas::new(8, 8).unwrap();

        let a = preview.tick(&store, None, canvas).unwrap();
        preview.clock.0.set(0.37);
        let b = preview.tick(&store, None, canvas).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn run_stops_when_present_declines() {
        let clock = ManualClock(Cell::new(0.0));
        let mut preview = PreviewLoop::with_clock(clock);
        let mut store = LayerStore::with_default_layers();
        let canvas = Canvas::new(4, 4).unwrap();

        let mut frames = 0u32;
        preview
            .run(&mut store, None, canvas, |_, _| {
                frames += 1;
                frames < 3
            })
            .unwrap();
        assert_eq!(frames, 3);
    }
}

use crate::foundation::core::Point;
use crate::foundation::error::{InkError, InkResult};
use crate::model::stroke::{BrushConfig, Stroke};

/// Layer count a fresh session starts with.
pub const INITIAL_LAYER_COUNT: usize = 3;

/// An ordered, independently hideable collection of strokes.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub name: String,
    strokes: Vec<Stroke>,
    visible: bool,
}

impl Layer {
    fn new(name: String) -> Self {
        Self {
            name,
            strokes: Vec::new(),
            visible: true,
        }
    }

    /// Strokes in creation (= paint) order.
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }
}

/// Stroke capture state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CaptureState {
    #[default]
    Idle,
    Capturing,
}

/// Ordered layers (index = z-order, bottom to top) with per-layer linear
/// undo history and the stroke capture state machine.
///
/// Exactly one layer is active at any time; capture appends to it only.
#[derive(Clone, Debug)]
pub struct LayerStore {
    layers: Vec<Layer>,
    redo: Vec<Vec<Stroke>>,
    active: usize,
    capture: CaptureState,
}

impl Default for LayerStore {
    fn default() -> Self {
        Self::with_default_layers()
    }
}

impl LayerStore {
    /// Store with [`INITIAL_LAYER_COUNT`] empty visible layers.
    pub fn with_default_layers() -> Self {
        let layers = (1..=INITIAL_LAYER_COUNT)
            .map(|i| Layer::new(format!("Layer {i}")))
            .collect::<Vec<_>>();
        let redo = vec![Vec::new(); INITIAL_LAYER_COUNT];
        Self {
            layers,
            redo,
            active: 0,
            capture: CaptureState::Idle,
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Select the active layer by index.
    pub fn set_active(&mut self, index: usize) -> InkResult<()> {
        if index >= self.layers.len() {
            return Err(InkError::validation(format!(
                "layer index {index} out of range (have {})",
                self.layers.len()
            )));
        }
        self.active = index;
        Ok(())
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture
    }

    /// Undone strokes waiting on a layer's redo stack.
    pub fn redo_len(&self, index: usize) -> usize {
        self.redo.get(index).map_or(0, Vec::len)
    }

    /// Start capturing a stroke on the active layer.
    ///
    /// Snapshots the brush configuration, seeds the point sequence with
    /// `start`, and clears the active layer's redo stack. A start while a
    /// capture is already open is ignored.
    pub fn begin_stroke(&mut self, config: &BrushConfig, start: Point) {
        if self.capture == CaptureState::Capturing {
            tracing::debug!("begin_stroke while capturing, ignored");
            return;
        }
        self.layers[self.active]
            .strokes
            .push(Stroke::begin(config, start));
        self.redo[self.active].clear();
        self.capture = CaptureState::Capturing;
    }

    /// Append a sampled position to the in-progress stroke, verbatim.
    pub fn extend_stroke(&mut self, position: Point) {
        if self.capture != CaptureState::Capturing {
            return;
        }
        if let Some(stroke) = self.layers[self.active].strokes.last_mut() {
            stroke.points.push(position);
        }
    }

    /// Finalize the in-progress stroke. The stroke is immutable afterwards.
    pub fn end_stroke(&mut self) {
        self.capture = CaptureState::Idle;
    }

    /// Pop the active layer's newest stroke onto its redo stack.
    ///
    /// No-op on an empty layer.
    pub fn undo(&mut self) {
        if let Some(stroke) = self.layers[self.active].strokes.pop() {
            self.redo[self.active].push(stroke);
        }
    }

    /// Restore the active layer's most recently undone stroke.
    ///
    /// No-op on an empty redo stack.
    pub fn redo(&mut self) {
        if let Some(stroke) = self.redo[self.active].pop() {
            self.layers[self.active].strokes.push(stroke);
        }
    }

    /// Drop every stroke on the active layer, including its redo stack.
    pub fn clear_active(&mut self) {
        self.layers[self.active].strokes.clear();
        self.redo[self.active].clear();
    }

    /// Toggle a layer's visibility.
    pub fn set_visible(&mut self, index: usize, visible: bool) -> InkResult<()> {
        let layer = self.layers.get_mut(index).ok_or_else(|| {
            InkError::validation(format!("layer index {index} out of range"))
        })?;
        layer.visible = visible;
        Ok(())
    }

    /// Swap two layers' z-order positions.
    ///
    /// The redo stacks travel with their layers so per-layer undo stays
    /// correct after a reorder, and the active index follows its layer.
    pub fn swap_layers(&mut self, a: usize, b: usize) -> InkResult<()> {
        let len = self.layers.len();
        if a >= len || b >= len {
            return Err(InkError::validation(format!(
                "layer swap indices ({a}, {b}) out of range (have {len})"
            )));
        }
        if a == b {
            return Ok(());
        }
        self.layers.swap(a, b);
        self.redo.swap(a, b);
        if self.active == a {
            self.active = b;
        } else if self.active == b {
            self.active = a;
        }
        Ok(())
    }

    /// Session reset: clear all strokes and redo stacks, keep the layers.
    pub fn reset(&mut self) {
        for layer in &mut self.layers {
            layer.strokes.clear();
        }
        for stack in &mut self.redo {
            stack.clear();
        }
        self.capture = CaptureState::Idle;
    }
}

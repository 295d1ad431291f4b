use crate::foundation::core::{Point, Rgba8};

/// Wobble phase speed used when a stroke snapshot carries no positive value.
pub const DEFAULT_WOBBLE_SPEED: f64 = 5.0;
/// Wobble displacement in pixels used when a stroke snapshot carries no positive value.
pub const DEFAULT_WOBBLE_AMPLITUDE: f64 = 2.0;

/// Drawing tool a stroke was captured with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ToolKind {
    /// Solid round-capped polyline.
    Solid,
    /// Polyline with an on/off dash pattern of twice the stroke width.
    Dashed,
    /// Closed polygon filled with a repeating tone pattern.
    ToneFill,
    /// Removes alpha under the path within its own layer.
    Eraser,
}

/// Fill texture for [`ToolKind::ToneFill`] strokes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TonePattern {
    Dot,
    Stripe,
    Solid,
}

/// Per-stroke effect toggles, snapshotted at capture time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EffectFlags {
    /// Time-driven sinusoidal path displacement.
    pub wobbly: bool,
    /// White halo under freehand strokes; colored border around tone fills.
    pub outlined: bool,
    /// Translucent black drop shadow at a fixed offset.
    pub shadowed: bool,
    /// Glow in the stroke color. Takes priority over `shadowed`.
    pub neon: bool,
}

/// Live brush configuration, owned by the host UI.
///
/// The store reads it once per capture start; strokes keep value-copy
/// snapshots and never observe later changes.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BrushConfig {
    pub tool: ToolKind,
    pub color: Rgba8,
    pub width: f64,
    pub effects: EffectFlags,
    pub wobble_amplitude: f64,
    pub wobble_speed: f64,
    pub pattern: TonePattern,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            tool: ToolKind::Solid,
            color: Rgba8::opaque(255, 183, 178),
            width: 5.0,
            effects: EffectFlags::default(),
            wobble_amplitude: DEFAULT_WOBBLE_AMPLITUDE,
            wobble_speed: DEFAULT_WOBBLE_SPEED,
            pattern: TonePattern::Dot,
        }
    }
}

/// One captured pen gesture: an append-only point sequence plus the style
/// parameters frozen at capture start.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Stroke {
    pub tool: ToolKind,
    pub effects: EffectFlags,
    pub color: Rgba8,
    pub width: f64,
    pub wobble_amplitude: f64,
    pub wobble_speed: f64,
    pub pattern: TonePattern,
    pub points: Vec<Point>,
}

impl Stroke {
    /// Snapshot the brush configuration and seed the point sequence.
    pub fn begin(config: &BrushConfig, start: Point) -> Self {
        Self {
            tool: config.tool,
            effects: config.effects,
            color: config.color,
            width: config.width,
            wobble_amplitude: config.wobble_amplitude,
            wobble_speed: config.wobble_speed,
            pattern: config.pattern,
            points: vec![start],
        }
    }

    /// Snapshotted wobble speed, falling back to the default when the
    /// snapshot holds a non-positive value.
    pub fn wobble_speed_or_default(&self) -> f64 {
        if self.wobble_speed > 0.0 {
            self.wobble_speed
        } else {
            DEFAULT_WOBBLE_SPEED
        }
    }

    /// Snapshotted wobble amplitude with the same fallback rule.
    pub fn wobble_amplitude_or_default(&self) -> f64 {
        if self.wobble_amplitude > 0.0 {
            self.wobble_amplitude
        } else {
            DEFAULT_WOBBLE_AMPLITUDE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_snapshots_config_by_value() {
        let mut config = BrushConfig {
            tool: ToolKind::Dashed,
            color: Rgba8::opaque(10, 20, 30),
            width: 8.0,
            ..BrushConfig::default()
        };
        let stroke = Stroke::begin(&config, Point::new(1.0, 2.0));

        config.color = Rgba8::opaque(0, 0, 0);
        config.width = 1.0;

        assert_eq!(stroke.tool, ToolKind::Dashed);
        assert_eq!(stroke.color, Rgba8::opaque(10, 20, 30));
        assert_eq!(stroke.width, 8.0);
        assert_eq!(stroke.points, vec![Point::new(1.0, 2.0)]);
    }

    #[test]
    fn wobble_parameters_fall_back_when_not_positive() {
        let mut stroke = Stroke::begin(&BrushConfig::default(), Point::ZERO);
        stroke.wobble_speed = 0.0;
        stroke.wobble_amplitude = -1.0;
        assert_eq!(stroke.wobble_speed_or_default(), DEFAULT_WOBBLE_SPEED);
        assert_eq!(
            stroke.wobble_amplitude_or_default(),
            DEFAULT_WOBBLE_AMPLITUDE
        );

        stroke.wobble_speed = 9.0;
        stroke.wobble_amplitude = 3.0;
        assert_eq!(stroke.wobble_speed_or_default(), 9.0);
        assert_eq!(stroke.wobble_amplitude_or_default(), 3.0);
    }
}

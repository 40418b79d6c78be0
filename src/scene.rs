//! Backend-independent description of one clock frame.
//!
//! The face is laid out in a unit square centred on the origin: backends map
//! it onto the viewport by scaling with (width, height) and translating by
//! (0.5, 0.5). Labels and markers are placed in device pixels.

use std::f64::consts::PI;

use glam::Vec2;
use serde::Deserialize;

use crate::core::clock::{hand_direction, ClockState, HandAngles, YAxis};
use crate::core::fps::fps_label;

pub const FACE_RADIUS: f32 = 0.42;
pub const LINE_WIDTH: f32 = 0.05;
pub const TICK_COUNT: usize = 12;

const MAJOR_TICK_INSET: f32 = 0.05;
const MINOR_TICK_INSET: f32 = MAJOR_TICK_INSET * 0.8;
const MINOR_TICK_WIDTH: f32 = 0.03;

pub const LABEL_ORIGIN: Vec2 = Vec2::new(0.0, 10.0);
pub const LABEL_SIZE: f32 = 11.0;
pub const MARKER_CENTER: Vec2 = Vec2::new(10.0, 10.0);
pub const MARKER_RADIUS: f32 = 3.0;

/// Straight-alpha colour with components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const GREEN: Rgba = Rgba::new(0.337, 0.612, 0.117, 0.9);
    pub const FACE: Rgba = Rgba::new(1.0, 1.0, 1.0, 0.8);
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const GREY: Rgba = Rgba::new(0.7, 0.7, 0.7, 0.8);
    pub const BLUE: Rgba = Rgba::new(0.117, 0.337, 0.612, 0.9);
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// 8-bit straight-alpha components
    pub fn to_rgba8(self) -> [u8; 4] {
        let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [
            quantize(self.r),
            quantize(self.g),
            quantize(self.b),
            quantize(self.a),
        ]
    }

    /// Colour components decoded from sRGB to linear light; alpha untouched
    pub fn to_linear(self) -> Self {
        let decode = |c: f32| {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        Self::new(decode(self.r), decode(self.g), decode(self.b), self.a)
    }
}

/// One drawing command
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Fill the whole viewport
    Background(Rgba),

    /// Filled disk in unit space
    FillCircle { center: Vec2, radius: f32, color: Rgba },

    /// Circle outline in unit space
    StrokeCircle { center: Vec2, radius: f32, width: f32, color: Rgba },

    /// Round-capped segment in unit space
    Line { from: Vec2, to: Vec2, width: f32, color: Rgba },

    /// Text with its baseline starting at `origin`, device pixels
    Label { text: String, origin: Vec2, size: f32, color: Rgba },

    /// Filled dot in device pixels, stands in for the label
    Marker { center: Vec2, radius: f32, color: Rgba },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStyle {
    /// Every third tick: longer and as thick as the outline
    Major,
    Minor,
}

impl TickStyle {
    pub fn for_index(index: usize) -> Self {
        if index % 3 == 0 {
            TickStyle::Major
        } else {
            TickStyle::Minor
        }
    }

    pub fn inset(self) -> f32 {
        match self {
            TickStyle::Major => MAJOR_TICK_INSET,
            TickStyle::Minor => MINOR_TICK_INSET,
        }
    }

    pub fn width(self) -> f32 {
        match self {
            TickStyle::Major => LINE_WIDTH,
            TickStyle::Minor => MINOR_TICK_WIDTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub index: usize,
    pub style: TickStyle,
    pub from: Vec2,
    pub to: Vec2,
}

impl Tick {
    fn new(index: usize) -> Self {
        let style = TickStyle::for_index(index);
        let angle = index as f64 * PI / 6.0;
        let direction = Vec2::new(angle.cos() as f32, angle.sin() as f32);

        Self {
            index,
            style,
            from: direction * (FACE_RADIUS - style.inset()),
            to: direction * FACE_RADIUS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandKind {
    Hour,
    Minute,
    Second,
}

impl HandKind {
    /// Length as a fraction of the face radius
    pub fn length(self) -> f32 {
        match self {
            HandKind::Second => 0.9,
            HandKind::Minute => 0.8,
            HandKind::Hour => 0.5,
        }
    }

    pub fn width(self) -> f32 {
        match self {
            HandKind::Second => LINE_WIDTH / 3.0,
            HandKind::Minute | HandKind::Hour => LINE_WIDTH,
        }
    }

    pub fn color(self) -> Rgba {
        match self {
            HandKind::Second => Rgba::GREY,
            HandKind::Minute => Rgba::BLUE,
            HandKind::Hour => Rgba::GREEN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hand {
    pub kind: HandKind,
    /// Radians clockwise from twelve o'clock
    pub angle: f64,
    pub tip: Vec2,
}

impl Hand {
    fn new(kind: HandKind, angle: f64, axis: YAxis) -> Self {
        let (x, y) = hand_direction(angle, axis);
        let length = kind.length() * FACE_RADIUS;

        Self {
            kind,
            angle,
            tip: Vec2::new(x as f32, y as f32) * length,
        }
    }
}

/// What to draw in the label corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LabelMode {
    /// "fps: N" text
    #[default]
    Text,
    /// Filled dot where the text would be
    Marker,
    /// Nothing
    Hidden,
}

impl LabelMode {
    /// Label command for this frame; text degrades to a marker on backends
    /// that cannot draw text
    pub fn resolve(self, fps: f32, supports_text: bool) -> Option<DrawOp> {
        match self {
            LabelMode::Text if supports_text => Some(DrawOp::Label {
                text: fps_label(fps),
                origin: LABEL_ORIGIN,
                size: LABEL_SIZE,
                color: Rgba::BLACK,
            }),
            LabelMode::Text | LabelMode::Marker => Some(DrawOp::Marker {
                center: MARKER_CENTER,
                radius: MARKER_RADIUS,
                color: Rgba::BLACK,
            }),
            LabelMode::Hidden => None,
        }
    }
}

/// Geometry of one clock frame
#[derive(Debug, Clone, PartialEq)]
pub struct ClockFace {
    pub time: ClockState,
    pub angles: HandAngles,
    pub ticks: [Tick; TICK_COUNT],
    /// Drawn in order: second, minute, hour
    pub hands: [Hand; 3],
}

impl ClockFace {
    pub fn new(time: ClockState, axis: YAxis) -> Self {
        let angles = time.angles();

        Self {
            time,
            angles,
            ticks: std::array::from_fn(Tick::new),
            hands: [
                Hand::new(HandKind::Second, angles.second_hand(), axis),
                Hand::new(HandKind::Minute, angles.minute_hand(), axis),
                Hand::new(HandKind::Hour, angles.hour_hand(), axis),
            ],
        }
    }

    pub fn hand(&self, kind: HandKind) -> &Hand {
        match kind {
            HandKind::Second => &self.hands[0],
            HandKind::Minute => &self.hands[1],
            HandKind::Hour => &self.hands[2],
        }
    }

    /// Full display list, back to front
    pub fn display_list(&self, overlay: Option<DrawOp>) -> Vec<DrawOp> {
        let mut ops = Vec::with_capacity(TICK_COUNT + 8);

        ops.push(DrawOp::Background(Rgba::GREEN));
        ops.push(DrawOp::FillCircle {
            center: Vec2::ZERO,
            radius: FACE_RADIUS,
            color: Rgba::FACE,
        });
        ops.push(DrawOp::StrokeCircle {
            center: Vec2::ZERO,
            radius: FACE_RADIUS,
            width: LINE_WIDTH,
            color: Rgba::BLACK,
        });

        ops.extend(self.ticks.iter().map(|tick| DrawOp::Line {
            from: tick.from,
            to: tick.to,
            width: tick.style.width(),
            color: Rgba::BLACK,
        }));

        ops.extend(self.hands.iter().map(|hand| DrawOp::Line {
            from: Vec2::ZERO,
            to: hand.tip,
            width: hand.kind.width(),
            color: hand.kind.color(),
        }));

        ops.push(DrawOp::FillCircle {
            center: Vec2::ZERO,
            radius: LINE_WIDTH / 3.0,
            color: Rgba::BLACK,
        });

        ops.extend(overlay);
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_at(h: u32, m: u32, s: u32, ms: u32) -> ClockFace {
        ClockFace::new(ClockState::new(h, m, s, ms), YAxis::Down)
    }

    #[test]
    fn test_twelve_ticks_every_third_major() {
        let face = face_at(0, 0, 0, 0);
        assert_eq!(face.ticks.len(), 12);

        for tick in &face.ticks {
            let expected = if [0, 3, 6, 9].contains(&tick.index) {
                TickStyle::Major
            } else {
                TickStyle::Minor
            };
            assert_eq!(tick.style, expected, "tick {}", tick.index);
        }
    }

    #[test]
    fn test_major_ticks_longer_and_thicker() {
        assert!(TickStyle::Major.inset() > TickStyle::Minor.inset());
        assert!(TickStyle::Major.width() > TickStyle::Minor.width());

        let face = face_at(0, 0, 0, 0);
        let length = |t: &Tick| (t.to - t.from).length();
        assert!(length(&face.ticks[0]) > length(&face.ticks[1]));
    }

    #[test]
    fn test_ticks_end_on_the_rim() {
        let face = face_at(0, 0, 0, 0);
        for tick in &face.ticks {
            assert!((tick.to.length() - FACE_RADIUS).abs() < 1e-6);
        }
    }

    #[test]
    fn test_hands_at_midnight_point_up() {
        let face = face_at(0, 0, 0, 0);
        for hand in &face.hands {
            assert!(hand.tip.x.abs() < 1e-6);
            assert!(hand.tip.y < 0.0, "y-down space points up with negative y");
        }

        let up = ClockFace::new(ClockState::new(0, 0, 0, 0), YAxis::Up);
        assert!(up.hand(HandKind::Hour).tip.y > 0.0);
    }

    #[test]
    fn test_hand_lengths() {
        let face = face_at(0, 0, 0, 0);
        let len = |kind| face.hand(kind).tip.length();
        assert!((len(HandKind::Second) - 0.9 * FACE_RADIUS).abs() < 1e-6);
        assert!((len(HandKind::Minute) - 0.8 * FACE_RADIUS).abs() < 1e-6);
        assert!((len(HandKind::Hour) - 0.5 * FACE_RADIUS).abs() < 1e-6);
    }

    #[test]
    fn test_display_list_order() {
        let ops = face_at(3, 15, 30, 500).display_list(LabelMode::Text.resolve(60.0, true));

        // background, disk, outline, 12 ticks, 3 hands, dot, label
        assert_eq!(ops.len(), 20);
        assert_eq!(ops[0], DrawOp::Background(Rgba::GREEN));
        assert!(matches!(ops[1], DrawOp::FillCircle { .. }));
        assert!(matches!(ops[2], DrawOp::StrokeCircle { .. }));
        let lines = ops.iter().filter(|op| matches!(op, DrawOp::Line { .. })).count();
        assert_eq!(lines, 15);
        assert!(matches!(ops[18], DrawOp::FillCircle { .. }));
        match &ops[19] {
            DrawOp::Label { text, .. } => assert_eq!(text, "fps: 60"),
            other => panic!("expected label, got {other:?}"),
        }
    }

    #[test]
    fn test_label_modes() {
        assert!(matches!(LabelMode::Text.resolve(1.0, true), Some(DrawOp::Label { .. })));
        assert!(matches!(LabelMode::Text.resolve(1.0, false), Some(DrawOp::Marker { .. })));
        assert!(matches!(LabelMode::Marker.resolve(1.0, true), Some(DrawOp::Marker { .. })));
        assert_eq!(LabelMode::Hidden.resolve(1.0, true), None);
    }

    #[test]
    fn test_rgba_quantizes() {
        assert_eq!(Rgba::BLACK.to_rgba8(), [0, 0, 0, 255]);
        assert_eq!(Rgba::FACE.to_rgba8(), [255, 255, 255, 204]);
    }

    #[test]
    fn test_linear_keeps_extremes() {
        let white = Rgba::WHITE.to_linear();
        assert!((white.r - 1.0).abs() < 1e-6);
        assert_eq!(Rgba::BLACK.to_linear().r, 0.0);
        assert_eq!(Rgba::GREY.to_linear().a, Rgba::GREY.a);
    }
}

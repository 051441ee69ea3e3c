use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    color::{Gradient, Rgb, HOVER_BRIGHTEN, PRESSED_BRIGHTEN},
    config::{CanvasConfig, LayoutConfig, LayoutMode},
    geometry::{build_hexagon, build_key, KeyDimensions, Point, Shape, ShapeKind},
    interaction::InteractionState,
    scale::frequency_label,
};

/// Characters bound to piano keys, in key order.
pub const PIANO_KEYS: &[char] = &[
    'A', 'W', 'S', 'E', 'D', 'F', 'T', 'G', 'Y', 'H', 'U', 'J', 'K', 'O', 'L', 'P', ';', '\'', 'Z',
    '3', 'X', '4', 'C', 'V', '5', 'B', '6', 'N', '7', 'M', ',', '8', '.',
];

/// Characters bound to hexagons, in scale order.
pub const HEXAGON_KEYS: &[char] = &[
    '1', '2', '3', '4', '5', '6', '7', '8', '9', '0', 'q', 'w', 'e', 'r', 't', 'y', 'u', 'i', 'o',
    'p', '[', ']', 'a', 's', 'd', 'f', 'g', 'h', 'j', 'k', 'l', ';', 'z', 'x', 'c', 'v', 'b', 'n',
    'm', ',', '.',
];

/// Top edge of the piano keys.
pub const PIANO_TOP: f64 = 10.0;
/// Largest hexagon radius.
pub const MAX_HEXAGON_SIZE: f64 = 30.0;
/// Left margin before the first hexagon.
pub const HEXAGON_MARGIN: f64 = 5.0;

/// Fill colour for each interaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateColors {
    pub up: Rgb,
    pub pressed: Rgb,
    pub hover: Rgb,
}

impl StateColors {
    pub const WHITE_KEY: StateColors = StateColors {
        up: Rgb::new(0xff, 0xff, 0xff),
        pressed: Rgb::new(0xaa, 0xaa, 0xaa),
        hover: Rgb::new(0xcc, 0xcc, 0xcc),
    };

    pub const BLACK_KEY: StateColors = StateColors {
        up: Rgb::new(0x00, 0x00, 0x00),
        pressed: Rgb::new(0xaa, 0xaa, 0xaa),
        hover: Rgb::new(0x55, 0x55, 0x55),
    };

    pub fn for_state(&self, state: InteractionState) -> Rgb {
        match state {
            InteractionState::Up => self.up,
            InteractionState::Down | InteractionState::PointerDown => self.pressed,
            InteractionState::Hover => self.hover,
        }
    }
}

/// One playable unit: outline, scale position and current interaction state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEntry {
    pub shape: Shape,
    pub index: usize,
    pub state: InteractionState,
    pub colors: StateColors,
}

impl KeyEntry {
    pub fn new(shape: Shape, index: usize, state: InteractionState, colors: StateColors) -> Self {
        Self {
            shape,
            index,
            state,
            colors,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.shape.kind
    }

    pub fn key(&self) -> Option<char> {
        self.shape.key
    }

    /// Colour the entry is painted with in its current state.
    pub fn fill(&self) -> Rgb {
        self.colors.for_state(self.state)
    }

    /// Case-insensitive match against the bound character.
    pub fn matches_key(&self, key: char) -> bool {
        self.shape
            .key
            .map(|bound| bound.to_lowercase().eq(key.to_lowercase()))
            .unwrap_or(false)
    }
}

/// Every key on screen, in scale order, plus the horizontal span they cover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub mode: LayoutMode,
    pub entries: Vec<KeyEntry>,
    pub width: f64,
}

impl Layout {
    /// Builds the layout for `frequencies`. All entries start `Up`.
    pub fn build(frequencies: &[f64], canvas: &CanvasConfig, config: &LayoutConfig) -> Self {
        match config.mode {
            LayoutMode::Piano => Self::piano(frequencies, canvas, &KeyDimensions::default()),
            LayoutMode::Hexagon => {
                Self::hexagons(frequencies, canvas, config.start_color, config.end_color)
            }
        }
    }

    /// Lays piano keys out left to right and centres the keyboard on the canvas.
    pub fn piano(frequencies: &[f64], canvas: &CanvasConfig, dims: &KeyDimensions) -> Self {
        let count = frequencies.len();
        let kinds: Vec<ShapeKind> = (0..count)
            .map(|i| ShapeKind::for_pitch_class(i, i + 1 == count))
            .collect();
        let width = keyboard_width(&kinds, dims);
        let start_x = ((canvas.width - width) / 2.0).max(0.0);

        let mut cursor = start_x;
        let entries = kinds
            .iter()
            .zip(frequencies)
            .enumerate()
            .map(|(index, (&kind, &frequency))| {
                let colors = if kind.is_black() {
                    StateColors::BLACK_KEY
                } else {
                    StateColors::WHITE_KEY
                };
                // black keys straddle the boundary the cursor sits on
                let left = if kind.is_black() {
                    cursor - dims.black_width / 2.0
                } else {
                    cursor
                };
                let shape = build_key(
                    kind,
                    Point::new(left, PIANO_TOP),
                    dims,
                    frequency_label(frequency),
                )
                .with_key(PIANO_KEYS.get(index).copied());
                if kind.advances_cursor() {
                    cursor += dims.white_width;
                }
                KeyEntry::new(shape, index, InteractionState::Up, colors)
            })
            .collect();

        debug!(count, width, start_x, "laid out piano keys");
        Self {
            mode: LayoutMode::Piano,
            entries,
            width,
        }
    }

    /// Lays hexagons out in one row across the vertical middle of the canvas,
    /// coloured along a gradient.
    pub fn hexagons(frequencies: &[f64], canvas: &CanvasConfig, start: Rgb, end: Rgb) -> Self {
        let count = frequencies.len();
        if count == 0 {
            return Self {
                mode: LayoutMode::Hexagon,
                entries: Vec::new(),
                width: 0.0,
            };
        }

        let size = (canvas.width / count as f64 / 2.0).min(MAX_HEXAGON_SIZE);
        let gradient = Gradient::new(start, end, count - 1);
        let middle = gradient.at(count.div_ceil(2).min(count - 1));
        let hover = middle.brighten(HOVER_BRIGHTEN);
        let pressed = middle.brighten(PRESSED_BRIGHTEN);

        let origin_x = size + HEXAGON_MARGIN;
        let mut x = origin_x;
        let y = canvas.height / 2.0;
        let entries = frequencies
            .iter()
            .enumerate()
            .map(|(index, &frequency)| {
                let fill = gradient.at(index);
                let shape = build_hexagon(
                    Point::new(x, y),
                    size,
                    frequency_label(frequency),
                    HEXAGON_KEYS.get(index).copied(),
                );
                x += shape.extents.width();
                KeyEntry::new(
                    shape,
                    index,
                    InteractionState::Up,
                    StateColors {
                        up: fill,
                        pressed,
                        hover,
                    },
                )
            })
            .collect();

        debug!(count, size, "laid out hexagons");
        Self {
            mode: LayoutMode::Hexagon,
            entries,
            width: x - origin_x,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&KeyEntry> {
        self.entries.get(index)
    }

    /// Index of the first entry bound to `key`, ignoring case.
    pub fn index_for_key(&self, key: char) -> Option<usize> {
        self.entries.iter().position(|entry| entry.matches_key(key))
    }
}

/// Sum of the white key widths among `kinds`.
pub fn keyboard_width(kinds: &[ShapeKind], dims: &KeyDimensions) -> f64 {
    kinds.iter().filter(|kind| kind.advances_cursor()).count() as f64 * dims.white_width
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frequencies(count: usize) -> Vec<f64> {
        (0..count).map(|i| 440.0 + i as f64 * 10.0).collect()
    }

    #[test]
    fn thirteen_piano_keys_span_eight_white_keys() {
        let canvas = CanvasConfig {
            width: 1_000.0,
            height: 400.0,
        };
        let layout = Layout::piano(&frequencies(13), &canvas, &KeyDimensions::default());

        assert_eq!(layout.len(), 13);
        assert_eq!(layout.width, 480.0);
        assert_eq!(layout.entries[0].shape.extents.min_x, 260.0);
        assert_eq!(layout.entries[12].kind(), ShapeKind::WhiteNoNotch);
        assert_eq!(layout.entries[12].shape.extents.max_x, 740.0);
        assert!(layout.entries.iter().all(|e| e.state == InteractionState::Up));
    }

    #[test]
    fn black_keys_sit_on_white_key_boundaries() {
        let canvas = CanvasConfig {
            width: 420.0,
            height: 400.0,
        };
        let layout = Layout::piano(&frequencies(5), &canvas, &KeyDimensions::default());

        // C C# D D# E: three white keys, 180 wide, centred at 120
        assert_eq!(layout.width, 180.0);
        let c_sharp = &layout.entries[1];
        assert_eq!(c_sharp.kind(), ShapeKind::BlackKey);
        assert_eq!(c_sharp.shape.extents.center().x, 180.0);
        let d_sharp = &layout.entries[3];
        assert_eq!(d_sharp.shape.extents.center().x, 240.0);
        assert_eq!(layout.entries[4].kind(), ShapeKind::WhiteLeftNotch);
    }

    #[test]
    fn narrow_canvas_pins_keyboard_to_left_edge() {
        let canvas = CanvasConfig {
            width: 100.0,
            height: 400.0,
        };
        let layout = Layout::piano(&frequencies(13), &canvas, &KeyDimensions::default());
        assert_eq!(layout.entries[0].shape.extents.min_x, 0.0);
    }

    #[test]
    fn keys_bind_characters_positionally() {
        let layout = Layout::piano(
            &frequencies(40),
            &CanvasConfig::default(),
            &KeyDimensions::default(),
        );

        assert_eq!(layout.entries[0].key(), Some('A'));
        assert_eq!(layout.entries[1].key(), Some('W'));
        assert_eq!(layout.entries[32].key(), Some('.'));
        assert_eq!(layout.entries[33].key(), None);
        assert_eq!(layout.index_for_key('w'), Some(1));
        assert_eq!(layout.index_for_key('!'), None);
    }

    #[test]
    fn labels_carry_frequencies() {
        let layout = Layout::piano(
            &[440.0, 466.16376],
            &CanvasConfig::default(),
            &KeyDimensions::default(),
        );
        assert_eq!(layout.entries[1].shape.label, "466.16");
    }

    #[test]
    fn hexagons_fill_a_row_with_gradient_colours() {
        let canvas = CanvasConfig {
            width: 1_300.0,
            height: 400.0,
        };
        let start = Rgb::new(0x11, 0x11, 0xff);
        let end = Rgb::new(0xff, 0x11, 0xff);
        let layout = Layout::hexagons(&frequencies(13), &canvas, start, end);

        assert_eq!(layout.len(), 13);
        let first = &layout.entries[0];
        assert_eq!(first.kind(), ShapeKind::HexSix);
        assert_eq!(first.colors.up, start);
        assert_eq!(layout.entries[12].colors.up, end);
        assert_eq!(first.key(), Some('1'));

        // size is capped at 30, centres advance by one hexagon width
        let c0 = first.shape.extents.center();
        let c1 = layout.entries[1].shape.extents.center();
        assert!((c0.x - 35.0).abs() < 1e-9);
        assert!((c1.x - c0.x - 60.0).abs() < 1e-9);
        assert!((c0.y - 200.0).abs() < 1e-9);
        assert!((layout.width - 13.0 * 60.0).abs() < 1e-6);

        let hover = layout.entries[3].colors.hover;
        assert_eq!(hover, layout.entries[9].colors.hover);
        assert_eq!(hover, Gradient::new(start, end, 12).at(7).brighten(HOVER_BRIGHTEN));
    }

    #[test]
    fn hexagons_shrink_on_narrow_canvas() {
        let canvas = CanvasConfig {
            width: 260.0,
            height: 100.0,
        };
        let layout = Layout::hexagons(&frequencies(13), &canvas, Rgb::BLACK, Rgb::WHITE);
        let size = layout.entries[0].shape.extents.width() / 2.0;
        assert!((size - 10.0).abs() < 1e-9);
    }

    #[test]
    fn empty_scale_builds_empty_layout() {
        let layout = Layout::build(&[], &CanvasConfig::default(), &LayoutConfig::default());
        assert!(layout.is_empty());
        assert_eq!(layout.width, 0.0);
    }

    #[test]
    fn entry_colour_tracks_state_changes() {
        let mut layout = Layout::piano(
            &frequencies(2),
            &CanvasConfig::default(),
            &KeyDimensions::default(),
        );
        let entry = &mut layout.entries[0];
        assert_eq!(entry.fill(), Rgb::WHITE);

        entry.state = InteractionState::PointerDown;
        assert_eq!(entry.fill(), StateColors::WHITE_KEY.pressed);

        // shapes carry no colour of their own that could go stale
        let json = serde_json::to_value(&entry.shape).unwrap();
        assert!(json.get("fill").is_none());
    }

    #[test]
    fn pressed_and_hover_colours_follow_state() {
        let colors = StateColors::WHITE_KEY;
        assert_eq!(colors.for_state(InteractionState::Up), Rgb::WHITE);
        assert_eq!(
            colors.for_state(InteractionState::Down),
            colors.for_state(InteractionState::PointerDown)
        );
        assert_eq!(colors.for_state(InteractionState::Hover), Rgb::new(0xcc, 0xcc, 0xcc));
    }
}

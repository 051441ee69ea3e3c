use serde::{Deserialize, Serialize};

use crate::{
    color::Rgb,
    geometry::{Extents, Point, ShapeKind},
    layout::{KeyEntry, Layout},
    Result,
};

/// Area in the top left corner reserved for the frequency readout.
pub const READOUT_AREA: Extents = Extents {
    min_x: 0.0,
    max_x: 200.0,
    min_y: 0.0,
    max_y: 40.0,
};
const READOUT_AT: Point = Point::new(40.0, 20.0);
const READOUT_FONT_PX: f64 = 25.0;
const KEY_FONT_PX: f64 = 23.0;
const KEY_LABEL_LIFT: f64 = 15.0;
const HEX_KEY_TICK: f64 = 10.0;
const HEX_KEY_TEXT_DROP: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Start,
    Center,
}

/// Saved pixels of a rectangle, restored to erase whatever was drawn over it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: u64,
    pub area: Extents,
}

/// Stateful 2D canvas the keyboard is painted on.
pub trait Surface {
    fn begin_path(&mut self);
    fn move_to(&mut self, point: Point);
    fn line_to(&mut self, point: Point);
    fn close_path(&mut self);
    fn stroke(&mut self, color: Rgb, width: f64);
    fn fill(&mut self, color: Rgb);
    fn fill_text(&mut self, text: &str, at: Point, font_px: f64, color: Rgb, align: TextAlign);
    fn clear_rect(&mut self, area: Extents);
    fn snapshot_rect(&mut self, area: Extents) -> Snapshot;
    fn restore_rect(&mut self, snapshot: &Snapshot);
}

/// Clears the canvas and paints every entry, black keys last so they sit on
/// top. Returns the snapshot of the empty readout area.
pub fn draw_layout(surface: &mut impl Surface, layout: &Layout, canvas: Extents) -> Snapshot {
    surface.clear_rect(canvas);
    let snapshot = surface.snapshot_rect(READOUT_AREA);

    let (black, white): (Vec<&KeyEntry>, Vec<&KeyEntry>) = layout
        .entries
        .iter()
        .partition(|entry| entry.kind().is_black());
    for entry in white.into_iter().chain(black) {
        draw_entry(surface, entry);
    }

    snapshot
}

/// Paints one entry in the colour of its current state.
pub fn draw_entry(surface: &mut impl Surface, entry: &KeyEntry) {
    let vertices = &entry.shape.vertices;
    let Some((first, rest)) = vertices.split_first() else {
        return;
    };

    surface.begin_path();
    surface.move_to(*first);
    for vertex in rest {
        surface.line_to(*vertex);
    }
    surface.close_path();
    surface.fill(entry.fill());
    surface.stroke(Rgb::BLACK, 1.0);

    match entry.kind() {
        ShapeKind::HexSix => draw_hexagon_text(surface, entry),
        _ => draw_key_text(surface, entry),
    }
}

/// Replaces the readout with `text`, or just erases it.
pub fn draw_readout(surface: &mut impl Surface, snapshot: &Snapshot, text: Option<&str>) {
    surface.restore_rect(snapshot);
    if let Some(text) = text {
        surface.fill_text(text, READOUT_AT, READOUT_FONT_PX, Rgb::WHITE, TextAlign::Start);
    }
}

/// Font size for the frequency label inside a hexagon of radius `size`.
pub fn hexagon_font_px(size: f64) -> f64 {
    match size {
        s if s >= 30.0 => 14.0,
        s if s >= 24.5 => 10.0,
        s if s >= 21.0 => 7.0,
        s if s >= 20.0 => 6.0,
        s if s >= 18.0 => 5.0,
        s if s >= 16.0 => 4.0,
        s if s >= 14.0 => 3.0,
        _ => 2.0,
    }
}

fn draw_key_text(surface: &mut impl Surface, entry: &KeyEntry) {
    let Some(key) = entry.key() else {
        return;
    };
    let extents = entry.shape.extents;
    let color = if entry.kind().is_black() {
        Rgb::WHITE
    } else {
        Rgb::BLACK
    };

    surface.fill_text(
        &key.to_string(),
        Point::new(extents.center().x, extents.max_y - KEY_LABEL_LIFT),
        KEY_FONT_PX,
        color,
        TextAlign::Center,
    );
}

fn draw_hexagon_text(surface: &mut impl Surface, entry: &KeyEntry) {
    let extents = entry.shape.extents;
    let center = extents.center();
    let size = extents.width() / 2.0;

    surface.fill_text(
        &entry.shape.label,
        Point::new(center.x, center.y + 2.0),
        hexagon_font_px(size),
        Rgb::WHITE,
        TextAlign::Center,
    );

    if let Some(key) = entry.key() {
        let bottom = extents.max_y;
        surface.begin_path();
        surface.move_to(Point::new(center.x, bottom));
        surface.line_to(Point::new(center.x, bottom + HEX_KEY_TICK));
        surface.stroke(Rgb::WHITE, 1.0);
        surface.fill_text(
            &key.to_string(),
            Point::new(center.x, bottom + HEX_KEY_TEXT_DROP),
            KEY_FONT_PX,
            Rgb::RED,
            TextAlign::Center,
        );
    }
}

/// One command issued to a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    BeginPath,
    MoveTo {
        point: Point,
    },
    LineTo {
        point: Point,
    },
    ClosePath,
    Stroke {
        color: Rgb,
        width: f64,
    },
    Fill {
        color: Rgb,
    },
    FillText {
        text: String,
        at: Point,
        font_px: f64,
        color: Rgb,
        align: TextAlign,
    },
    ClearRect {
        area: Extents,
    },
    SnapshotRect {
        snapshot: Snapshot,
    },
    RestoreRect {
        snapshot: Snapshot,
    },
}

/// Surface that records commands instead of rasterising them.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
    next_snapshot: u64,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drains the recorded commands.
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Fill colours in issue order.
    pub fn fills(&self) -> Vec<Rgb> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Fill { color } => Some(*color),
                _ => None,
            })
            .collect()
    }

    /// Text drawn, in issue order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.commands)?)
    }
}

impl Surface for RecordingSurface {
    fn begin_path(&mut self) {
        self.commands.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, point: Point) {
        self.commands.push(DrawCommand::MoveTo { point });
    }

    fn line_to(&mut self, point: Point) {
        self.commands.push(DrawCommand::LineTo { point });
    }

    fn close_path(&mut self) {
        self.commands.push(DrawCommand::ClosePath);
    }

    fn stroke(&mut self, color: Rgb, width: f64) {
        self.commands.push(DrawCommand::Stroke { color, width });
    }

    fn fill(&mut self, color: Rgb) {
        self.commands.push(DrawCommand::Fill { color });
    }

    fn fill_text(&mut self, text: &str, at: Point, font_px: f64, color: Rgb, align: TextAlign) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            at,
            font_px,
            color,
            align,
        });
    }

    fn clear_rect(&mut self, area: Extents) {
        self.commands.push(DrawCommand::ClearRect { area });
    }

    fn snapshot_rect(&mut self, area: Extents) -> Snapshot {
        let snapshot = Snapshot {
            id: self.next_snapshot,
            area,
        };
        self.next_snapshot += 1;
        self.commands.push(DrawCommand::SnapshotRect {
            snapshot: snapshot.clone(),
        });
        snapshot
    }

    fn restore_rect(&mut self, snapshot: &Snapshot) {
        self.commands.push(DrawCommand::RestoreRect {
            snapshot: snapshot.clone(),
        });
    }
}

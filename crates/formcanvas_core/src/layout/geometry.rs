//! Canvas geometry and the resize rules for each handle.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Narrowest width a resize may commit, in pixels.
pub const MIN_FIELD_WIDTH: f64 = 100.0;
/// Shortest height a resize may commit, in pixels.
pub const MIN_FIELD_HEIGHT: f64 = 40.0;
/// Size of a freshly dropped field.
pub const DEFAULT_FIELD_WIDTH: f64 = 200.0;
pub const DEFAULT_FIELD_HEIGHT: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(DEFAULT_FIELD_WIDTH, DEFAULT_FIELD_HEIGHT)
    }
}

/// Position plus size of a field box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(origin: Point, size: Size) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Resize handle; encodes which edges of the box move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeDirection {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl ResizeDirection {
    pub const ALL: [ResizeDirection; 8] = [
        Self::N,
        Self::S,
        Self::E,
        Self::W,
        Self::NE,
        Self::NW,
        Self::SE,
        Self::SW,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::N => "n",
            Self::S => "s",
            Self::E => "e",
            Self::W => "w",
            Self::NE => "ne",
            Self::NW => "nw",
            Self::SE => "se",
            Self::SW => "sw",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "n" => Some(Self::N),
            "s" => Some(Self::S),
            "e" => Some(Self::E),
            "w" => Some(Self::W),
            "ne" => Some(Self::NE),
            "nw" => Some(Self::NW),
            "se" => Some(Self::SE),
            "sw" => Some(Self::SW),
            _ => None,
        }
    }

    pub fn moves_north(self) -> bool {
        matches!(self, Self::N | Self::NE | Self::NW)
    }

    pub fn moves_south(self) -> bool {
        matches!(self, Self::S | Self::SE | Self::SW)
    }

    pub fn moves_east(self) -> bool {
        matches!(self, Self::E | Self::NE | Self::SE)
    }

    pub fn moves_west(self) -> bool {
        matches!(self, Self::W | Self::NW | Self::SW)
    }
}

impl Display for ResizeDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computes the box a resize gesture commits.
///
/// `pointer` is in surface-local coordinates. East/south handles place the
/// right/bottom edge under the pointer; west/north handles move the left/top
/// edge while the opposite edge stays fixed, including when the size floor
/// kicks in.
pub fn resize_bounds(
    direction: ResizeDirection,
    initial_position: Point,
    initial_size: Size,
    pointer: Point,
) -> Bounds {
    let mut bounds = Bounds::new(initial_position, initial_size);
    let delta_x = pointer.x - initial_position.x;
    let delta_y = pointer.y - initial_position.y;

    if direction.moves_east() {
        bounds.width = delta_x.max(MIN_FIELD_WIDTH);
    }
    if direction.moves_south() {
        bounds.height = delta_y.max(MIN_FIELD_HEIGHT);
    }
    if direction.moves_west() {
        bounds.width = (initial_size.width - delta_x).max(MIN_FIELD_WIDTH);
        bounds.x = initial_position.x + (initial_size.width - bounds.width);
    }
    if direction.moves_north() {
        bounds.height = (initial_size.height - delta_y).max(MIN_FIELD_HEIGHT);
        bounds.y = initial_position.y + (initial_size.height - bounds.height);
    }

    bounds
}

#[cfg(test)]
mod tests {
    use super::{resize_bounds, Point, ResizeDirection, Size};

    #[test]
    fn direction_parse_round_trips_every_handle() {
        for direction in ResizeDirection::ALL {
            assert_eq!(ResizeDirection::parse(direction.as_str()), Some(direction));
        }
        assert_eq!(ResizeDirection::parse("north"), None);
    }

    #[test]
    fn corner_handles_combine_edge_rules() {
        let bounds = resize_bounds(
            ResizeDirection::SW,
            Point::new(50.0, 50.0),
            Size::new(200.0, 100.0),
            Point::new(30.0, 180.0),
        );
        assert_eq!(bounds.x, 30.0);
        assert_eq!(bounds.width, 220.0);
        assert_eq!(bounds.y, 50.0);
        assert_eq!(bounds.height, 130.0);
    }

    #[test]
    fn west_floor_keeps_right_edge_in_place() {
        let bounds = resize_bounds(
            ResizeDirection::W,
            Point::new(10.0, 10.0),
            Size::new(150.0, 60.0),
            Point::new(400.0, 10.0),
        );
        assert_eq!(bounds.width, 100.0);
        assert_eq!(bounds.right(), 160.0);
    }
}

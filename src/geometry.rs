//! Geometry primitives shared by every layout stage.
//!
//! All spatial values are logical units. Every value that leaves a
//! computation boundary goes through [`round2`], so the same input always
//! produces the same bits regardless of how intermediate sums were ordered.

use serde::{Deserialize, Serialize, Serializer};

/// Round half-up to 2 decimal places.
///
/// `-0.0` is normalised to `0.0` so the canonical encoding never prints a
/// signed zero.
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0 + 0.5).floor() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Serializer that re-applies [`round2`] so hand-built values still encode
/// canonically.
pub(crate) fn serialize_rounded<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(round2(*value))
}

/// 2D coordinate (x grows rightward, y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    #[serde(serialize_with = "serialize_rounded")]
    pub x: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: round2(x),
            y: round2(y),
        }
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned rectangle; `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(serialize_with = "serialize_rounded")]
    pub x: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub y: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub width: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: round2(x),
            y: round2(y),
            width: round2(width),
            height: round2(height),
        }
    }

    /// Box spanning two corners given in any order.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let (left, right) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let (top, bottom) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        Self::new(left, top, right - left, bottom - top)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x
            && point.x <= self.right()
            && point.y >= self.y
            && point.y <= self.bottom()
    }

    /// True when the interiors overlap; touching edges do not intersect.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !(self.right() <= other.x
            || other.right() <= self.x
            || self.bottom() <= other.y
            || other.bottom() <= self.y)
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        BoundingBox::new(left, top, right - left, bottom - top)
    }

    /// Union over an iterator; `None` when it is empty.
    pub fn union_all<'a, I>(boxes: I) -> Option<BoundingBox>
    where
        I: IntoIterator<Item = &'a BoundingBox>,
    {
        boxes
            .into_iter()
            .fold(None, |acc: Option<BoundingBox>, b| match acc {
                Some(a) => Some(a.union(b)),
                None => Some(*b),
            })
    }
}

/// Half-open musical time span `[start_tick, end_tick)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickRange {
    pub start_tick: u32,
    pub end_tick: u32,
}

impl TickRange {
    pub fn new(start_tick: u32, end_tick: u32) -> Self {
        Self {
            start_tick,
            end_tick,
        }
    }

    pub fn contains(&self, tick: u32) -> bool {
        tick >= self.start_tick && tick < self.end_tick
    }

    pub fn len(&self) -> u32 {
        self.end_tick.saturating_sub(self.start_tick)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// RGBA colour, 8 bits per channel (`a = 255` is opaque).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 255,
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

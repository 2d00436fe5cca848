use serde::{Deserialize, Serialize};
use std::fmt;

/// A circle in image pixel coordinates (origin top-left, y down).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circle {
    pub center_x: u32,
    pub center_y: u32,
    pub radius: u32,
}

impl Circle {
    pub fn diameter(&self) -> u32 {
        self.radius * 2
    }
}

/// Axis-aligned box, `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x as f32 + self.width as f32 / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y as f32 + self.height as f32 / 2.0
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn translate(&self, dx: u32, dy: u32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        BoundingBox {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    /// Union of every box in `boxes`, or `None` when there are none.
    pub fn union_all<'a, I>(boxes: I) -> Option<BoundingBox>
    where
        I: IntoIterator<Item = &'a BoundingBox>,
    {
        boxes
            .into_iter()
            .fold(None, |acc: Option<BoundingBox>, b| match acc {
                None => Some(*b),
                Some(u) => Some(u.union(b)),
            })
    }
}

/// Rectangular search window, half-open: `[x1, x2) x [y1, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x1: u32,
    pub x2: u32,
    pub y1: u32,
    pub y2: u32,
}

impl Region {
    pub fn new(x1: u32, x2: u32, y1: u32, y2: u32) -> Self {
        Self { x1, x2, y1, y2 }
    }

    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.x1 + self.x2) as f32 / 2.0,
            (self.y1 + self.y2) as f32 / 2.0,
        )
    }

    /// Intersect with an image of the given size. `None` if nothing is left.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Region> {
        let clamped = Region {
            x1: self.x1.min(width),
            x2: self.x2.min(width),
            y1: self.y1.min(height),
            y2: self.y2.min(height),
        };
        if clamped.is_empty() { None } else { Some(clamped) }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x={}..{}, y={}..{}", self.x1, self.x2, self.y1, self.y2)
    }
}

/// A connected foreground component of a binary image.
#[derive(Debug, Clone)]
pub struct Contour {
    pub label: u32,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    pub pixel_count: u32,
}

impl Contour {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox {
            x: self.min_x,
            y: self.min_y,
            width: self.width(),
            height: self.height(),
        }
    }
}

/// Closed vocabulary of panel controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KnobName {
    Threshold,
    Ratio,
    Attack,
    Release,
    Gain,
}

impl KnobName {
    pub const ALL: [KnobName; 5] = [
        KnobName::Threshold,
        KnobName::Ratio,
        KnobName::Attack,
        KnobName::Release,
        KnobName::Gain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KnobName::Threshold => "Threshold",
            KnobName::Ratio => "Ratio",
            KnobName::Attack => "Attack",
            KnobName::Release => "Release",
            KnobName::Gain => "Gain",
        }
    }
}

impl fmt::Display for KnobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    Knob,
    Label,
    Meter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geometry {
    Circle(Circle),
    BoundingBox(BoundingBox),
}

/// A named, classified panel element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedFeature {
    pub name: String,
    pub kind: FeatureKind,
    pub geometry: Geometry,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x: u32, y: u32, width: u32, height: u32) -> BoundingBox {
        BoundingBox { x, y, width, height }
    }

    #[test]
    fn union_is_minimal_enclosing_box() {
        let boxes = [bbox(10, 40, 5, 5), bbox(30, 20, 10, 8), bbox(12, 35, 1, 30)];
        let u = BoundingBox::union_all(&boxes).unwrap();

        assert_eq!(u.x, boxes.iter().map(|b| b.x).min().unwrap());
        assert_eq!(u.y, boxes.iter().map(|b| b.y).min().unwrap());
        assert_eq!(u.right(), boxes.iter().map(|b| b.right()).max().unwrap());
        assert_eq!(u.bottom(), boxes.iter().map(|b| b.bottom()).max().unwrap());
    }

    #[test]
    fn union_of_nothing_is_none() {
        let none: [BoundingBox; 0] = [];
        assert_eq!(BoundingBox::union_all(&none), None);
    }

    #[test]
    fn union_of_single_box_is_that_box() {
        let b = bbox(3, 4, 0, 0);
        assert_eq!(BoundingBox::union_all([&b]), Some(b));
    }

    #[test]
    fn region_clamps_to_image() {
        let r = Region::new(90, 140, 10, 20);
        assert_eq!(r.clamp_to(100, 100), Some(Region::new(90, 100, 10, 20)));
        assert_eq!(Region::new(120, 140, 10, 20).clamp_to(100, 100), None);
    }
}

//! Geometry kernel: axis-aligned bounding boxes and spatial predicates.
//!
//! Coordinates use a bottom-left origin, so larger `y` values are higher on
//! the page. Every operation is pure; transformations return new boxes.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An axis-aligned rectangle with `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBBox")]
pub struct BBox {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

#[derive(Deserialize)]
struct RawBBox {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

impl TryFrom<RawBBox> for BBox {
    type Error = Error;

    fn try_from(raw: RawBBox) -> Result<Self> {
        BBox::new(raw.x0, raw.y0, raw.x1, raw.y1)
    }
}

/// Grouping axis for [`cluster_by_position`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Row bands: sorted top-to-bottom, compared on center y.
    Horizontal,
    /// Column bands: sorted left-to-right, compared on center x.
    Vertical,
}

impl BBox {
    /// Create a box, failing on inverted or non-finite coordinates.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Result<Self> {
        if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
            return Err(Error::MalformedInput(format!(
                "non-finite bbox ({}, {}, {}, {})",
                x0, y0, x1, y1
            )));
        }
        if x0 > x1 || y0 > y1 {
            return Err(Error::MalformedInput(format!(
                "inverted bbox ({}, {}, {}, {})",
                x0, y0, x1, y1
            )));
        }
        Ok(Self { x0, y0, x1, y1 })
    }

    /// Create a box from an `(x0, y0, x1, y1)` tuple.
    pub fn from_tuple(t: (f32, f32, f32, f32)) -> Result<Self> {
        Self::new(t.0, t.1, t.2, t.3)
    }

    /// Create a box from a `[x0, y0, x1, y1]` array.
    pub fn from_array(a: [f32; 4]) -> Result<Self> {
        Self::new(a[0], a[1], a[2], a[3])
    }

    /// Create a box of the given size centered on a point.
    pub fn from_center_size(cx: f32, cy: f32, width: f32, height: f32) -> Result<Self> {
        let hw = width / 2.0;
        let hh = height / 2.0;
        Self::new(cx - hw, cy - hh, cx + hw, cy + hh)
    }

    pub fn to_tuple(&self) -> (f32, f32, f32, f32) {
        (self.x0, self.y0, self.x1, self.y1)
    }

    pub fn x0(&self) -> f32 {
        self.x0
    }

    pub fn y0(&self) -> f32 {
        self.y0
    }

    pub fn x1(&self) -> f32 {
        self.x1
    }

    pub fn y1(&self) -> f32 {
        self.y1
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }

    pub fn center(&self) -> (f32, f32) {
        (self.center_x(), self.center_y())
    }

    pub fn top_left(&self) -> (f32, f32) {
        (self.x0, self.y1)
    }

    pub fn top_right(&self) -> (f32, f32) {
        (self.x1, self.y1)
    }

    pub fn bottom_left(&self) -> (f32, f32) {
        (self.x0, self.y0)
    }

    pub fn bottom_right(&self) -> (f32, f32) {
        (self.x1, self.y0)
    }

    /// Width over height; infinite for zero-height boxes.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height() == 0.0 {
            f32::INFINITY
        } else {
            self.width() / self.height()
        }
    }

    /// Aspect ratio within `tolerance` of 1.
    pub fn is_roughly_square(&self, tolerance: f32) -> bool {
        (self.aspect_ratio() - 1.0).abs() <= tolerance
    }

    /// A thin horizontal rule: at most `max_height` tall and wider than tall.
    pub fn is_horizontal_line(&self, max_height: f32) -> bool {
        self.height() <= max_height && self.width() > self.height()
    }

    /// A thin vertical rule: at most `max_width` wide and taller than wide.
    pub fn is_vertical_line(&self, max_width: f32) -> bool {
        self.width() <= max_width && self.height() > self.width()
    }

    /// Inclusive overlap test, widened by `tolerance` on every side.
    pub fn overlaps(&self, other: &BBox, tolerance: f32) -> bool {
        !(self.x1 + tolerance < other.x0
            || other.x1 + tolerance < self.x0
            || self.y1 + tolerance < other.y0
            || other.y1 + tolerance < self.y0)
    }

    pub fn contains_point(&self, x: f32, y: f32, tolerance: f32) -> bool {
        self.x0 - tolerance <= x
            && x <= self.x1 + tolerance
            && self.y0 - tolerance <= y
            && y <= self.y1 + tolerance
    }

    pub fn contains_bbox(&self, other: &BBox, tolerance: f32) -> bool {
        self.x0 - tolerance <= other.x0
            && other.x1 <= self.x1 + tolerance
            && self.y0 - tolerance <= other.y0
            && other.y1 <= self.y1 + tolerance
    }

    /// The shared region, or `None` when the boxes do not overlap.
    pub fn intersection(&self, other: &BBox) -> Option<BBox> {
        let x0 = self.x0.max(other.x0);
        let y0 = self.y0.max(other.y0);
        let x1 = self.x1.min(other.x1);
        let y1 = self.y1.min(other.y1);
        if x0 <= x1 && y0 <= y1 {
            Some(BBox { x0, y0, x1, y1 })
        } else {
            None
        }
    }

    /// The smallest box containing both.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn intersection_area(&self, other: &BBox) -> f32 {
        self.intersection(other).map(|b| b.area()).unwrap_or(0.0)
    }

    /// Intersection area divided by the smaller of the two areas.
    ///
    /// Returns 0 when the boxes are disjoint or the smaller box has no area.
    pub fn intersection_ratio(&self, other: &BBox) -> f32 {
        let min_area = self.area().min(other.area());
        if min_area == 0.0 {
            return 0.0;
        }
        self.intersection_area(other) / min_area
    }

    /// Euclidean distance from the box edge to a point (0 inside).
    pub fn distance_to_point(&self, x: f32, y: f32) -> f32 {
        let dx = (self.x0 - x).max(0.0).max(x - self.x1);
        let dy = (self.y0 - y).max(0.0).max(y - self.y1);
        (dx * dx + dy * dy).sqrt()
    }

    /// Euclidean gap between two boxes (0 when they overlap).
    pub fn distance_to_bbox(&self, other: &BBox) -> f32 {
        let dx = self.horizontal_distance(other);
        let dy = self.vertical_distance(other);
        (dx * dx + dy * dy).sqrt()
    }

    /// Horizontal gap between the boxes, 0 when their x ranges overlap.
    pub fn horizontal_distance(&self, other: &BBox) -> f32 {
        (self.x0 - other.x1).max(0.0).max(other.x0 - self.x1)
    }

    /// Vertical gap between the boxes, 0 when their y ranges overlap.
    pub fn vertical_distance(&self, other: &BBox) -> f32 {
        (self.y0 - other.y1).max(0.0).max(other.y0 - self.y1)
    }

    /// Bottom edges, top edges or vertical centers within `tolerance`.
    pub fn horizontally_aligned(&self, other: &BBox, tolerance: f32) -> bool {
        (self.y0 - other.y0).abs() <= tolerance
            || (self.y1 - other.y1).abs() <= tolerance
            || (self.center_y() - other.center_y()).abs() <= tolerance
    }

    /// Left edges, right edges or horizontal centers within `tolerance`.
    pub fn vertically_aligned(&self, other: &BBox, tolerance: f32) -> bool {
        (self.x0 - other.x0).abs() <= tolerance
            || (self.x1 - other.x1).abs() <= tolerance
            || (self.center_x() - other.center_x()).abs() <= tolerance
    }

    /// Two boxes sit on the same text line.
    ///
    /// True when their vertical overlap covers at least half of the shorter
    /// height, or when they are horizontally aligned within `tolerance`.
    pub fn same_line(&self, other: &BBox, tolerance: f32) -> bool {
        let overlap = self.y1.min(other.y1) - self.y0.max(other.y0);
        let min_height = self.height().min(other.height());
        if overlap > 0.0 && overlap >= 0.5 * min_height {
            return true;
        }
        self.horizontally_aligned(other, tolerance)
    }

    /// Two boxes belong to the same column: x ranges overlap, or left edges
    /// or centers are within `tolerance`.
    pub fn same_column(&self, other: &BBox, tolerance: f32) -> bool {
        let overlap = self.x1.min(other.x1) - self.x0.max(other.x0);
        overlap > 0.0
            || (self.x0 - other.x0).abs() <= tolerance
            || (self.center_x() - other.center_x()).abs() <= tolerance
    }

    pub fn translate(&self, dx: f32, dy: f32) -> BBox {
        BBox {
            x0: self.x0 + dx,
            y0: self.y0 + dy,
            x1: self.x1 + dx,
            y1: self.y1 + dy,
        }
    }

    /// Scale about the center.
    pub fn scale(&self, sx: f32, sy: f32) -> Result<BBox> {
        Self::from_center_size(
            self.center_x(),
            self.center_y(),
            self.width() * sx,
            self.height() * sy,
        )
    }

    /// Grow every side by `margin`. Negative margins shrink the box.
    pub fn expand(&self, margin: f32) -> Result<BBox> {
        Self::new(
            self.x0 - margin,
            self.y0 - margin,
            self.x1 + margin,
            self.y1 + margin,
        )
    }

    /// Snap outward to the nearest multiples of `pitch`.
    pub fn expand_to_grid(&self, pitch: f32) -> Result<BBox> {
        if pitch.is_nan() || pitch <= 0.0 {
            return Err(Error::MalformedInput(format!(
                "grid pitch must be positive, got {}",
                pitch
            )));
        }
        Self::new(
            (self.x0 / pitch).floor() * pitch,
            (self.y0 / pitch).floor() * pitch,
            (self.x1 / pitch).ceil() * pitch,
            (self.y1 / pitch).ceil() * pitch,
        )
    }
}

/// Union of all boxes, `None` for an empty list.
pub fn merge_bboxes<'a, I>(boxes: I) -> Option<BBox>
where
    I: IntoIterator<Item = &'a BBox>,
{
    boxes
        .into_iter()
        .copied()
        .reduce(|acc, b| acc.union(&b))
}

/// Chained clustering along one axis.
///
/// Boxes are sorted (top-to-bottom for [`Axis::Horizontal`], left-to-right
/// for [`Axis::Vertical`]) and each joins the current group when its center
/// is within `tolerance` of the last box added to that group. Long chains of
/// small steps therefore stay in a single group.
pub fn cluster_by_position(boxes: &[BBox], axis: Axis, tolerance: f32) -> Vec<Vec<BBox>> {
    let mut sorted: Vec<BBox> = boxes.to_vec();
    let key = |b: &BBox| match axis {
        Axis::Horizontal => b.center_y(),
        Axis::Vertical => b.center_x(),
    };
    match axis {
        Axis::Horizontal => sorted.sort_by(|a, b| {
            key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal)
        }),
        Axis::Vertical => sorted.sort_by(|a, b| {
            key(a).partial_cmp(&key(b)).unwrap_or(Ordering::Equal)
        }),
    }

    let mut clusters: Vec<Vec<BBox>> = Vec::new();
    for bbox in sorted {
        let joins = clusters
            .last()
            .and_then(|group| group.last())
            .is_some_and(|last| (key(last) - key(&bbox)).abs() <= tolerance);
        match clusters.last_mut() {
            Some(group) if joins => group.push(bbox),
            _ => clusters.push(vec![bbox]),
        }
    }
    clusters
}

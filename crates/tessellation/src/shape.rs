//! 2D outlines built from path segments, and their flattening into polygons.

use geom_kernel::Point2d;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TriangulationError};

/// Subdivision stops at this depth even if the flatness is not reached
/// (at most 2^16 line segments per curve).
const MAX_SUBDIVISION_DEPTH: u32 = 16;

/// Cubic control-point distance approximating a quarter circle.
const KAPPA: f64 = 0.552_284_749_830_793_4;

/// A closed polyline produced by flattening one subpath.
pub type Contour = Vec<Point2d>;

/// One drawing instruction of a 2D outline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathSegment {
    /// Start a new contour.
    MoveTo(Point2d),
    LineTo(Point2d),
    /// Quadratic Bezier: control point, end point.
    QuadTo(Point2d, Point2d),
    /// Cubic Bezier: two control points, end point.
    CubicTo(Point2d, Point2d, Point2d),
    /// Close the current contour back to its start.
    Close,
}

impl PathSegment {
    fn is_finite(&self) -> bool {
        match self {
            PathSegment::MoveTo(p) | PathSegment::LineTo(p) => p.is_finite(),
            PathSegment::QuadTo(c, p) => c.is_finite() && p.is_finite(),
            PathSegment::CubicTo(c1, c2, p) => c1.is_finite() && c2.is_finite() && p.is_finite(),
            PathSegment::Close => true,
        }
    }
}

/// A 2D outline made of one or more contours (subpaths).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shape2D {
    segments: Vec<PathSegment>,
}

impl Shape2D {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    pub fn move_to(mut self, x: f64, y: f64) -> Self {
        self.segments.push(PathSegment::MoveTo(Point2d::new(x, y)));
        self
    }

    pub fn line_to(mut self, x: f64, y: f64) -> Self {
        self.segments.push(PathSegment::LineTo(Point2d::new(x, y)));
        self
    }

    pub fn quad_to(mut self, cx: f64, cy: f64, x: f64, y: f64) -> Self {
        self.segments
            .push(PathSegment::QuadTo(Point2d::new(cx, cy), Point2d::new(x, y)));
        self
    }

    pub fn cubic_to(mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) -> Self {
        self.segments.push(PathSegment::CubicTo(
            Point2d::new(c1x, c1y),
            Point2d::new(c2x, c2y),
            Point2d::new(x, y),
        ));
        self
    }

    pub fn close(mut self) -> Self {
        self.segments.push(PathSegment::Close);
        self
    }

    /// Append all contours of `other` after this shape's contours.
    pub fn with_contours_of(mut self, other: &Shape2D) -> Self {
        self.segments.extend_from_slice(&other.segments);
        self
    }

    /// Axis-aligned rectangle; counter-clockwise for positive width and height.
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new()
            .move_to(x, y)
            .line_to(x + width, y)
            .line_to(x + width, y + height)
            .line_to(x, y + height)
            .close()
    }

    /// Closed polygon through `points` in the given order.
    pub fn polygon(points: &[Point2d]) -> Self {
        let mut shape = Self::new();
        for (i, p) in points.iter().enumerate() {
            shape.push(if i == 0 {
                PathSegment::MoveTo(*p)
            } else {
                PathSegment::LineTo(*p)
            });
        }
        if !points.is_empty() {
            shape.push(PathSegment::Close);
        }
        shape
    }

    /// Ellipse from four cubic arcs, counter-clockwise.
    pub fn ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> Self {
        let kx = rx * KAPPA;
        let ky = ry * KAPPA;
        Self::new()
            .move_to(cx + rx, cy)
            .cubic_to(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry)
            .cubic_to(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy)
            .cubic_to(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry)
            .cubic_to(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy)
            .close()
    }

    /// Rectangle with quarter-circle corners of `radius`, counter-clockwise.
    pub fn rounded_rectangle(x: f64, y: f64, width: f64, height: f64, radius: f64) -> Self {
        let r = radius.min(width * 0.5).min(height * 0.5).max(0.0);
        let k = r * KAPPA;
        let (x1, y1) = (x + width, y + height);
        Self::new()
            .move_to(x + r, y)
            .line_to(x1 - r, y)
            .cubic_to(x1 - r + k, y, x1, y + r - k, x1, y + r)
            .line_to(x1, y1 - r)
            .cubic_to(x1, y1 - r + k, x1 - r + k, y1, x1 - r, y1)
            .line_to(x + r, y1)
            .cubic_to(x + r - k, y1, x, y1 - r + k, x, y1 - r)
            .line_to(x, y + r)
            .cubic_to(x, y + r - k, x + r - k, y, x + r, y)
            .close()
    }

    /// Flatten every contour into a polyline whose distance to the original
    /// curves never exceeds `flatness`.
    ///
    /// Drawing after a `Close` without a `MoveTo` starts a new contour at the
    /// previous contour's start point. A trailing point equal to the
    /// contour's first point is dropped.
    pub fn flatten(&self, flatness: f64) -> Result<Vec<Contour>> {
        if !(flatness.is_finite() && flatness > 0.0) {
            return Err(TriangulationError::InvalidFlatness(flatness));
        }

        let mut contours = Vec::new();
        let mut current: Option<Contour> = None;
        let mut subpath_start: Option<Point2d> = None;

        for (index, segment) in self.segments.iter().enumerate() {
            if !segment.is_finite() {
                return Err(TriangulationError::NonFiniteCoordinate { segment: index });
            }

            if let PathSegment::MoveTo(p) = segment {
                finish_contour(current.take(), &mut contours);
                current = Some(vec![*p]);
                subpath_start = Some(*p);
                continue;
            }
            if let PathSegment::Close = segment {
                finish_contour(current.take(), &mut contours);
                continue;
            }

            let contour = match (&mut current, subpath_start) {
                (Some(contour), _) => contour,
                (None, Some(start)) => current.insert(vec![start]),
                (None, None) => return Err(TriangulationError::MissingMoveTo { segment: index }),
            };
            // A contour always holds at least its start point.
            let last = contour[contour.len() - 1];

            match *segment {
                PathSegment::LineTo(p) => contour.push(p),
                PathSegment::QuadTo(c, p) => flatten_quad(last, c, p, flatness, 0, contour),
                PathSegment::CubicTo(c1, c2, p) => flatten_cubic(last, c1, c2, p, flatness, 0, contour),
                PathSegment::MoveTo(_) | PathSegment::Close => {}
            }
        }
        finish_contour(current, &mut contours);

        Ok(contours)
    }
}

/// Shoelace area of a closed contour, positive when counter-clockwise.
pub fn contour_area(contour: &[Point2d]) -> f64 {
    let n = contour.len();
    (0..n)
        .map(|i| {
            let (a, b) = (contour[i], contour[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        * 0.5
}

/// Winding number of all `contours` around `p`, counter-clockwise loops
/// counting +1. Points on a boundary may go either way.
pub fn winding_number(contours: &[Contour], p: &Point2d) -> i32 {
    let mut winding = 0;
    for contour in contours {
        let n = contour.len();
        for i in 0..n {
            let (a, b) = (contour[i], contour[(i + 1) % n]);
            if a.y <= p.y {
                if b.y > p.y && Point2d::orient(&a, &b, p) > 0.0 {
                    winding += 1;
                }
            } else if b.y <= p.y && Point2d::orient(&a, &b, p) < 0.0 {
                winding -= 1;
            }
        }
    }
    winding
}

fn finish_contour(contour: Option<Contour>, contours: &mut Vec<Contour>) {
    let Some(mut contour) = contour else {
        return;
    };
    if contour.len() > 1 && contour.first() == contour.last() {
        contour.pop();
    }
    contours.push(contour);
}

fn midpoint(a: Point2d, b: Point2d) -> Point2d {
    a.lerp(&b, 0.5)
}

/// Pushes the flattened curve's points after `p0`, ending with `p2`.
fn flatten_quad(p0: Point2d, c: Point2d, p2: Point2d, flatness: f64, depth: u32, out: &mut Contour) {
    // The curve stays inside the control triangle, so the control point's
    // distance to the chord bounds the deviation.
    if depth >= MAX_SUBDIVISION_DEPTH || c.distance_to_segment(&p0, &p2) <= flatness {
        out.push(p2);
        return;
    }
    let q1 = midpoint(p0, c);
    let r1 = midpoint(c, p2);
    let m = midpoint(q1, r1);
    flatten_quad(p0, q1, m, flatness, depth + 1, out);
    flatten_quad(m, r1, p2, flatness, depth + 1, out);
}

fn flatten_cubic(
    p0: Point2d,
    c1: Point2d,
    c2: Point2d,
    p3: Point2d,
    flatness: f64,
    depth: u32,
    out: &mut Contour,
) {
    let deviation = c1.distance_to_segment(&p0, &p3).max(c2.distance_to_segment(&p0, &p3));
    if depth >= MAX_SUBDIVISION_DEPTH || deviation <= flatness {
        out.push(p3);
        return;
    }
    // de Casteljau split at t = 0.5.
    let a = midpoint(p0, c1);
    let b = midpoint(c1, c2);
    let c = midpoint(c2, p3);
    let ab = midpoint(a, b);
    let bc = midpoint(b, c);
    let m = midpoint(ab, bc);
    flatten_cubic(p0, a, ab, m, flatness, depth + 1, out);
    flatten_cubic(m, bc, c, p3, flatness, depth + 1, out);
}

//! Property-based tests for triangulation invariants using the `proptest` crate.

use proptest::prelude::*;

use geom_kernel::Point2d;
use geom_tessellation::{triangulate, Shape2D, TessellationPrimitive, TriangleFan, TriangleStrip};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

/// Axis-aligned rectangle as (x, y, width, height).
fn arb_rect() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    (-100.0f64..100.0, -100.0f64..100.0, 0.5f64..50.0, 0.5f64..50.0)
}

/// Relative placement of a hole inside a rectangle, as fractions.
fn arb_hole_fractions() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    (0.05f64..0.45, 0.05f64..0.45, 0.1f64..0.5, 0.1f64..0.5)
}

fn arb_flatness() -> impl Strategy<Value = f64> {
    0.0005f64..0.5
}

// ---------------------------------------------------------------------------
// 1. Fan law: n - 2 triangles, all sharing the first vertex
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn fan_shares_first_vertex(indices in prop::collection::vec(0usize..1000, 0..20)) {
        let fan = TriangleFan::new(indices.clone());
        let triangles = fan.triangles();
        prop_assert_eq!(triangles.len(), indices.len().saturating_sub(2));
        for (k, t) in triangles.iter().enumerate() {
            prop_assert_eq!(*t, [indices[0], indices[k + 1], indices[k + 2]]);
        }
    }
}

// ---------------------------------------------------------------------------
// 2. Strip over a zigzag keeps one winding
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn strip_winding_is_consistent(count in 3usize..30, width in 0.1f64..10.0) {
        let points: Vec<Point2d> = (0..count)
            .map(|i| Point2d::new((i / 2) as f64 * width, if i % 2 == 0 { 1.0 } else { 0.0 }))
            .collect();
        let strip = TriangleStrip::new((0..count).collect());
        for t in strip.triangles() {
            let o = Point2d::orient(&points[t[0]], &points[t[1]], &points[t[2]]);
            prop_assert!(o > 0.0, "triangle {:?} flipped", t);
        }
    }
}

// ---------------------------------------------------------------------------
// 3. Rectangles triangulate into two triangles covering their area
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn rectangle_area_preserved((x, y, w, h) in arb_rect(), flatness in arb_flatness()) {
        let tri = triangulate(&Shape2D::rectangle(x, y, w, h), flatness).unwrap();
        prop_assert_eq!(tri.triangle_count(), 2);
        prop_assert!((tri.area() - w * h).abs() < 1e-9 * (1.0 + w * h));
    }
}

// ---------------------------------------------------------------------------
// 4. A rectangular hole leaves a frame of eight valid triangles
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn frame_area_is_outer_minus_inner(
        (x, y, w, h) in arb_rect(),
        (fx, fy, fw, fh) in arb_hole_fractions(),
    ) {
        let (hx, hy, hw, hh) = (x + fx * w, y + fy * h, fw * w, fh * h);
        let hole = Shape2D::polygon(&[
            Point2d::new(hx, hy),
            Point2d::new(hx, hy + hh),
            Point2d::new(hx + hw, hy + hh),
            Point2d::new(hx + hw, hy),
        ]);
        let shape = Shape2D::rectangle(x, y, w, h).with_contours_of(&hole);
        let tri = triangulate(&shape, 0.01).unwrap();

        prop_assert_eq!(tri.triangle_count(), 8);
        let expected = w * h - hw * hh;
        prop_assert!((tri.area() - expected).abs() < 1e-6 * (1.0 + w * h),
            "area {} expected {}", tri.area(), expected);
        for i in 0..tri.triangle_count() {
            let [a, b, c] = tri.triangle_points(i).unwrap();
            prop_assert!((b - a).cross(&(c - a)).z < 0.0, "triangle {} not clockwise about +z", i);
        }
    }
}

// ---------------------------------------------------------------------------
// 5. Flattened circle vertices stay on the curve
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn circle_vertices_on_curve(r in 0.5f64..50.0, flatness in arb_flatness()) {
        let contours = Shape2D::ellipse(0.0, 0.0, r, r).flatten(flatness).unwrap();
        prop_assert_eq!(contours.len(), 1);
        for p in &contours[0] {
            let d = (p.x * p.x + p.y * p.y).sqrt();
            // Cubic arcs overshoot a true circle by under 0.03%.
            prop_assert!((d - r).abs() <= r * 3e-4 + 1e-12, "vertex {:?} off the circle", p);
        }
    }
}

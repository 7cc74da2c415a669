//! Outline triangulation: flattening, fill-rule tessellation and emission
//! of a primitive stream into [`TriangulationBuilder`].

use std::collections::HashMap;

use geom_kernel::{Point2d, Vec3};
use lyon_tessellation::geometry_builder::{FillGeometryBuilder, GeometryBuilder, GeometryBuilderError};
use lyon_tessellation::math::point;
use lyon_tessellation::path::Path;
use lyon_tessellation::{FillOptions, FillTessellator, FillVertex, VertexId};
use tracing::{debug, info, instrument, trace};

use crate::builder::{TessellationCallback, TriangulationBuilder};
use crate::config::{FillRule, TriangulatorConfig};
use crate::error::Result;
use crate::primitive::PrimitiveKind;
use crate::shape::{contour_area, Contour, Shape2D};
use crate::triangulation::Triangulation;

/// Turns 2D outlines into triangle meshes.
pub trait Triangulator {
    fn triangulate(&self, shape: &Shape2D) -> Result<Triangulation>;
}

/// Triangulator backed by lyon's sweep-line fill tessellator.
///
/// A single convex contour is emitted as one fan. Anything else, including
/// self-intersecting and overlapping contours, goes through
/// [`FillTessellator`] with the configured fill rule; vertices it creates
/// where edges cross are appended after the outline vertices. The engine
/// emits counter-clockwise about the configured (or inferred) normal and the
/// builder reverses each triangle, so output triangles are clockwise.
#[derive(Debug, Clone, Default)]
pub struct FillTriangulator {
    config: TriangulatorConfig,
}

impl FillTriangulator {
    pub fn new(config: TriangulatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TriangulatorConfig {
        &self.config
    }

    pub fn flatness(&self) -> f64 {
        self.config.flatness
    }

    pub fn set_flatness(&mut self, flatness: f64) {
        self.config.flatness = flatness;
    }

    pub fn normal(&self) -> Option<Vec3> {
        self.config.normal
    }

    pub fn set_normal(&mut self, normal: Option<Vec3>) {
        self.config.normal = normal;
    }

    pub fn fill_rule(&self) -> FillRule {
        self.config.fill_rule
    }

    pub fn set_fill_rule(&mut self, fill_rule: FillRule) {
        self.config.fill_rule = fill_rule;
    }

    /// Whether the engine emits counter-clockwise in the XY plane: along
    /// the normal's z sign, or the contours' summed area when none is set.
    fn counter_clockwise(&self, contours: &[Contour]) -> bool {
        match self.config.normal {
            Some(normal) => normal.z > 0.0,
            None => contours.iter().map(|c| contour_area(c)).sum::<f64>() >= 0.0,
        }
    }

    fn emit<C: TessellationCallback>(&self, contours: &[Contour], ccw: bool, callback: &mut C) {
        if let [contour] = contours {
            if is_convex(contour) {
                let n = contour.len();
                callback.begin(PrimitiveKind::Fan);
                if (contour_area(contour) > 0.0) == ccw {
                    (0..n).for_each(|i| callback.vertex(i));
                } else {
                    callback.vertex(0);
                    (1..n).rev().for_each(|i| callback.vertex(i));
                }
                callback.end();
                return;
            }
        }

        let points: Vec<Point2d> = contours.iter().flatten().copied().collect();
        let mut endpoints = HashMap::with_capacity(points.len());
        let mut builder = Path::builder();
        let mut next = 0;
        for contour in contours {
            let start = next;
            next += contour.len();
            if contour.len() < 2 {
                continue;
            }
            let lyon_point = |p: &Point2d| point(p.x as f32, p.y as f32);
            endpoints.insert(builder.begin(lyon_point(&contour[0])).to_usize(), start);
            for (i, p) in contour.iter().enumerate().skip(1) {
                endpoints.insert(builder.line_to(lyon_point(p)).to_usize(), start + i);
            }
            builder.end(true);
        }
        let path = builder.build();

        let options = FillOptions::default().with_fill_rule(self.config.fill_rule.into());
        let mut adapter = StreamAdapter {
            callback,
            endpoints,
            points,
            emitted: Vec::new(),
            counter_clockwise: ccw,
        };
        if let Err(e) = FillTessellator::new().tessellate_path(&path, &options, &mut adapter) {
            adapter.callback.error(format!("{e:?}"));
        }
    }
}

impl Triangulator for FillTriangulator {
    #[instrument(skip(self, shape), fields(segments = shape.segments().len(), flatness = self.config.flatness))]
    fn triangulate(&self, shape: &Shape2D) -> Result<Triangulation> {
        self.config.validate()?;
        let contours = shape.flatten(self.config.flatness)?;

        let mut vertices = Vec::new();
        let mut outlines = Vec::with_capacity(contours.len());
        for contour in &contours {
            let start = vertices.len();
            vertices.extend(contour.iter().map(|p| p.to_point3d(0.0)));
            outlines.push((start..vertices.len()).collect::<Vec<_>>());
        }

        let ccw = self.counter_clockwise(&contours);
        debug!(contours = contours.len(), fill_rule = ?self.config.fill_rule, ccw, "tessellating contours");

        let mut builder = TriangulationBuilder::new(vertices);
        self.emit(&contours, ccw, &mut builder);
        let triangulation = builder.finish(outlines)?;

        info!(
            vertices = triangulation.vertex_count(),
            triangles = triangulation.triangle_count(),
            contours = contours.len(),
            "triangulated outline"
        );
        Ok(triangulation)
    }
}

/// Forwards lyon's output as one triangle-list primitive, mapping path
/// endpoints back to outline vertex indices.
struct StreamAdapter<'a, C: TessellationCallback> {
    callback: &'a mut C,
    /// Path endpoint id to outline vertex index.
    endpoints: HashMap<usize, usize>,
    /// Outline vertices in index order.
    points: Vec<Point2d>,
    /// Outline vertex index and position of each lyon vertex id.
    emitted: Vec<(usize, Point2d)>,
    counter_clockwise: bool,
}

impl<C: TessellationCallback> GeometryBuilder for StreamAdapter<'_, C> {
    fn begin_geometry(&mut self) {
        self.callback.begin(PrimitiveKind::Triangles);
    }

    fn end_geometry(&mut self) {
        self.callback.end();
    }

    fn add_triangle(&mut self, a: VertexId, b: VertexId, c: VertexId) {
        let [(a, pa), (mut b, pb), (mut c, pc)] = [a, b, c].map(|id| self.emitted[id.0 as usize]);
        let orientation = Point2d::orient(&pa, &pb, &pc);
        if orientation != 0.0 && (orientation > 0.0) != self.counter_clockwise {
            std::mem::swap(&mut b, &mut c);
        }
        self.callback.vertex(a);
        self.callback.vertex(b);
        self.callback.vertex(c);
    }

    fn abort_geometry(&mut self) {
        self.callback.end();
    }
}

impl<C: TessellationCallback> FillGeometryBuilder for StreamAdapter<'_, C> {
    fn add_fill_vertex(&mut self, vertex: FillVertex) -> std::result::Result<VertexId, GeometryBuilderError> {
        let known = vertex
            .as_endpoint_id()
            .and_then(|id| self.endpoints.get(&id.to_usize()).copied());
        let entry = match known {
            Some(index) => (index, self.points[index]),
            None => {
                let p = vertex.position();
                let position = Point2d::new(f64::from(p.x), f64::from(p.y));
                let index = self.callback.combine(position.to_point3d(0.0));
                trace!(index, ?position, "vertex at an edge crossing");
                (index, position)
            }
        };
        let id = u32::try_from(self.emitted.len()).map_err(|_| GeometryBuilderError::TooManyVertices)?;
        self.emitted.push(entry);
        Ok(VertexId(id))
    }
}

/// Convex with every fan triangle from the first vertex turning the same way.
fn is_convex(contour: &[Point2d]) -> bool {
    let n = contour.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0;
    let turns = (0..n).map(|i| Point2d::orient(&contour[i], &contour[(i + 1) % n], &contour[(i + 2) % n]));
    let fans = (1..n - 1).map(|k| Point2d::orient(&contour[0], &contour[k], &contour[k + 1]));
    for value in turns.chain(fans) {
        if value == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = value.signum();
        } else if value.signum() != sign {
            return false;
        }
    }
    sign != 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use geom_kernel::Point3d;

    fn square(x: f64, y: f64, size: f64) -> Vec<Point2d> {
        vec![
            Point2d::new(x, y),
            Point2d::new(x + size, y),
            Point2d::new(x + size, y + size),
            Point2d::new(x, y + size),
        ]
    }

    /// Records the primitive stream instead of assembling triangles.
    #[derive(Default)]
    struct Recorder {
        kinds: Vec<PrimitiveKind>,
        indices: Vec<usize>,
        combined: Vec<Point3d>,
        next: usize,
        errors: Vec<String>,
    }

    impl TessellationCallback for Recorder {
        fn begin(&mut self, kind: PrimitiveKind) {
            self.kinds.push(kind);
        }

        fn vertex(&mut self, index: usize) {
            self.indices.push(index);
        }

        fn combine(&mut self, position: Point3d) -> usize {
            self.combined.push(position);
            self.next += 1;
            self.next - 1
        }

        fn end(&mut self) {}

        fn error(&mut self, message: String) {
            self.errors.push(message);
        }
    }

    fn record(contours: &[Contour], rule: FillRule) -> Recorder {
        let mut triangulator = FillTriangulator::default();
        triangulator.set_fill_rule(rule);
        let mut recorder = Recorder {
            next: contours.iter().map(Vec::len).sum(),
            ..Recorder::default()
        };
        triangulator.emit(contours, true, &mut recorder);
        recorder
    }

    #[test]
    fn test_convexity() {
        assert!(is_convex(&square(0.0, 0.0, 1.0)));
        let notch = vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(2.0, 0.0),
            Point2d::new(1.0, 0.5),
            Point2d::new(2.0, 2.0),
            Point2d::new(0.0, 2.0),
        ];
        assert!(!is_convex(&notch));
        // Pentagram: every turn has the same sign but the fan folds over.
        let star: Vec<Point2d> = [0, 2, 4, 1, 3]
            .iter()
            .map(|&k| {
                let a = std::f64::consts::TAU * k as f64 / 5.0;
                Point2d::new(a.cos(), a.sin())
            })
            .collect();
        assert!(!is_convex(&star));
    }

    #[test]
    fn test_single_convex_contour_is_one_fan() {
        let recorder = record(&[square(0.0, 0.0, 1.0)], FillRule::EvenOdd);
        assert_eq!(recorder.kinds, vec![PrimitiveKind::Fan]);
        assert_eq!(recorder.indices, vec![0, 1, 2, 3]);

        let clockwise: Vec<Point2d> = square(0.0, 0.0, 1.0).into_iter().rev().collect();
        let recorder = record(&[clockwise], FillRule::EvenOdd);
        assert_eq!(recorder.indices, vec![0, 3, 2, 1]);
    }

    #[test]
    fn test_engine_triangles_are_counter_clockwise() {
        let contours = vec![square(0.0, 0.0, 4.0), square(1.0, 1.0, 1.0)];
        let recorder = record(&contours, FillRule::EvenOdd);
        assert_eq!(recorder.kinds, vec![PrimitiveKind::Triangles]);
        assert!(recorder.errors.is_empty());
        assert!(recorder.combined.is_empty());
        let points: Vec<Point2d> = contours.concat();
        for t in recorder.indices.chunks_exact(3) {
            assert!(Point2d::orient(&points[t[0]], &points[t[1]], &points[t[2]]) > 0.0, "{t:?}");
        }
    }

    #[test]
    fn test_bow_tie_crossing_is_combined() {
        let bow_tie = vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(2.0, 2.0),
            Point2d::new(2.0, 0.0),
            Point2d::new(0.0, 2.0),
        ];
        let recorder = record(&[bow_tie], FillRule::NonZero);
        assert!(!recorder.combined.is_empty());
        for crossing in &recorder.combined {
            assert!((crossing.x - 1.0).abs() < 1e-6 && (crossing.y - 1.0).abs() < 1e-6);
        }
        assert!(recorder.indices.contains(&4));
        assert!(recorder.indices.len() >= 6 && recorder.indices.len() % 3 == 0);
    }

    #[test]
    fn test_setters_persist_between_calls() {
        let mut triangulator = FillTriangulator::default();
        triangulator.set_flatness(0.2);
        triangulator.set_normal(Some(-Vec3::Z));
        triangulator.set_fill_rule(FillRule::NonZero);
        assert_eq!(triangulator.flatness(), 0.2);
        assert_eq!(triangulator.normal(), Some(-Vec3::Z));
        assert_eq!(triangulator.fill_rule(), FillRule::NonZero);
        assert!(triangulator.triangulate(&Shape2D::rectangle(0.0, 0.0, 1.0, 1.0)).is_ok());
        assert_eq!(triangulator.flatness(), 0.2);
    }
}

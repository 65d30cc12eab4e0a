//! Curve linearization with orientation normalization.
//!
//! A curve is an ordered list of heterogeneous segments: plain line
//! segments, three-point circular arcs and arc strings. Linearization
//! turns the whole curve into one continuous polyline, approximating
//! each arc with a chord-error-bounded point sequence.
//!
//! Arc linearization is direction sensitive: the chords placed for a
//! clockwise traversal differ from those for a counter-clockwise
//! traversal of the same arc. The curve is therefore normalized to
//! clockwise before linearization and the resulting polyline is reversed
//! again afterwards, so callers always get back their original
//! orientation with deterministic intermediate results.
//!
//! Reversal never copies source coordinates: segments are walked through
//! [`PointView`], an index adapter over the original slice.

use crate::errors::{SpatialError, SpatialResult};
use crate::geometry::Coord;

/// Upper bound on generated points per arc, guarding against an error
/// tolerance far below the arc radius.
pub const MAX_ARC_STEPS: usize = 1024;

/// One segment of a curve.
#[derive(Debug, Clone, PartialEq)]
pub enum CurveSegment {
    /// A polyline segment, passed through unchanged.
    Line(Vec<Coord>),
    /// A circular arc through three distinct points.
    Arc { start: Coord, mid: Coord, end: Coord },
    /// A full circle through three distinct points, traversed from `p1`
    /// through `p2` and `p3` back to `p1`.
    Circle { p1: Coord, p2: Coord, p3: Coord },
    /// A chain of circular arcs: an odd number of points (at least 3),
    /// every consecutive point triple forming one arc.
    ArcString(Vec<Coord>),
}

/// Traversal direction of a curve in the XY plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Clockwise,
    CounterClockwise,
}

/// Non-copying view over a coordinate slice, optionally reversed.
#[derive(Clone, Copy)]
pub(crate) struct PointView<'a> {
    points: &'a [Coord],
    reversed: bool,
}

impl<'a> PointView<'a> {
    pub(crate) fn new(points: &'a [Coord], reversed: bool) -> Self {
        PointView { points, reversed }
    }

    pub(crate) fn len(&self) -> usize {
        self.points.len()
    }

    pub(crate) fn get(&self, index: usize) -> Coord {
        if self.reversed {
            self.points[self.points.len() - 1 - index]
        } else {
            self.points[index]
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}

/// Approximates one circular arc with a polyline.
///
/// This is the seam to the curve-geometry engine: given the arc's three
/// control points and a maximum allowed chord deviation, produce the
/// approximating points including both endpoints, in traversal order.
pub trait ArcLinearizer {
    fn linearize_arc(
        &self,
        start: Coord,
        mid: Coord,
        end: Coord,
        max_error: f64,
    ) -> SpatialResult<Vec<Coord>>;

    /// Approximates the full circle through three points, starting and
    /// ending at the first.
    fn linearize_circle(
        &self,
        p1: Coord,
        p2: Coord,
        p3: Coord,
        max_error: f64,
    ) -> SpatialResult<Vec<Coord>>;
}

/// Chord-error-bounded arc subdivision.
///
/// The circle through the three control points is subdivided into equal
/// angular steps small enough that the sagitta of each step stays within
/// the allowed error. Collinear control points degrade to the straight
/// chord. Z is interpolated linearly along the traversal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChordArcLinearizer;

impl ArcLinearizer for ChordArcLinearizer {
    fn linearize_arc(
        &self,
        start: Coord,
        mid: Coord,
        end: Coord,
        max_error: f64,
    ) -> SpatialResult<Vec<Coord>> {
        let (center, radius) = match circle_through(start, mid, end) {
            Some(circle) => circle,
            // Collinear control points: the arc degenerates to its chord.
            None => return Ok(vec![start, end]),
        };

        let ccw = signed_area2(start, mid, end) > 0.0;
        let start_angle = (start.y - center.y).atan2(start.x - center.x);
        let end_angle = (end.y - center.y).atan2(end.x - center.x);

        let tau = std::f64::consts::TAU;
        let sweep = if ccw {
            let s = (end_angle - start_angle).rem_euclid(tau);
            if s == 0.0 {
                tau
            } else {
                s
            }
        } else {
            let s = (start_angle - end_angle).rem_euclid(tau);
            if s == 0.0 {
                -tau
            } else {
                -s
            }
        };

        Ok(sample_arc(center, radius, start, end, start_angle, sweep, max_error))
    }

    fn linearize_circle(
        &self,
        p1: Coord,
        p2: Coord,
        p3: Coord,
        max_error: f64,
    ) -> SpatialResult<Vec<Coord>> {
        let (center, radius) = circle_through(p1, p2, p3).ok_or_else(|| {
            SpatialError::UnsupportedVariant(
                "Circle control points are collinear".to_string(),
            )
        })?;

        let ccw = signed_area2(p1, p2, p3) > 0.0;
        let start_angle = (p1.y - center.y).atan2(p1.x - center.x);
        let sweep = if ccw {
            std::f64::consts::TAU
        } else {
            -std::f64::consts::TAU
        };

        Ok(sample_arc(center, radius, p1, p1, start_angle, sweep, max_error))
    }
}

/// Samples an arc of `sweep` radians in equal angular steps whose
/// sagitta stays within `max_error`; the exact endpoints bracket the
/// generated points.
fn sample_arc(
    center: Coord,
    radius: f64,
    start: Coord,
    end: Coord,
    start_angle: f64,
    sweep: f64,
    max_error: f64,
) -> Vec<Coord> {
    let ratio = (1.0 - max_error / radius).clamp(-1.0, 1.0);
    let max_step = (2.0 * ratio.acos()).max(f64::EPSILON);
    let steps = ((sweep.abs() / max_step).ceil() as usize).clamp(1, MAX_ARC_STEPS);

    let mut points = Vec::with_capacity(steps + 1);
    points.push(start);
    for k in 1..steps {
        let t = k as f64 / steps as f64;
        let angle = start_angle + sweep * t;
        points.push(Coord::new(
            center.x + radius * angle.cos(),
            center.y + radius * angle.sin(),
            start.z + (end.z - start.z) * t,
        ));
    }
    points.push(end);
    points
}

/// Linearizes whole curves through an [`ArcLinearizer`], normalizing the
/// traversal direction before the direction-sensitive arc step and
/// restoring it afterwards.
pub struct CurveLinearizer<L: ArcLinearizer> {
    linearizer: L,
    max_error: f64,
}

impl<L: ArcLinearizer> CurveLinearizer<L> {
    /// Creates a curve linearizer with the given maximum chord error.
    pub fn new(linearizer: L, max_error: f64) -> SpatialResult<Self> {
        if !(max_error > 0.0) {
            return Err(SpatialError::Configuration(format!(
                "Maximum chord error must be positive, got {}",
                max_error
            )));
        }
        Ok(CurveLinearizer {
            linearizer,
            max_error,
        })
    }

    /// Linearizes `segments` into one continuous polyline whose
    /// orientation matches the input curve.
    ///
    /// Consecutive segments share their boundary point; it appears only
    /// once in the output.
    pub fn linearize(&self, segments: &[CurveSegment]) -> SpatialResult<Vec<Coord>> {
        if segments.is_empty() {
            return Ok(Vec::new());
        }

        let orientation = classify_orientation(segments)?;
        let reversed = orientation == Orientation::CounterClockwise;
        log::debug!(
            "Linearizing curve of {} segments, orientation {:?}",
            segments.len(),
            orientation
        );

        let mut polyline: Vec<Coord> = Vec::new();
        let ordered: Box<dyn Iterator<Item = &CurveSegment> + '_> = if reversed {
            Box::new(segments.iter().rev())
        } else {
            Box::new(segments.iter())
        };

        for segment in ordered {
            let points = self.linearize_segment(segment, reversed)?;
            let skip_shared = match (polyline.last(), points.first()) {
                (Some(last), Some(first)) => last == first,
                _ => false,
            };
            polyline.extend(points.into_iter().skip(if skip_shared { 1 } else { 0 }));
        }

        // Only the intermediate arc step is orientation-normalized; the
        // observable result keeps the input winding.
        if reversed {
            polyline.reverse();
        }
        Ok(polyline)
    }

    fn linearize_segment(
        &self,
        segment: &CurveSegment,
        reversed: bool,
    ) -> SpatialResult<Vec<Coord>> {
        match segment {
            CurveSegment::Line(points) => {
                Ok(PointView::new(points, reversed).iter().collect())
            }
            CurveSegment::Arc { start, mid, end } => {
                let (s, e) = if reversed { (*end, *start) } else { (*start, *end) };
                self.linearizer.linearize_arc(s, *mid, e, self.max_error)
            }
            CurveSegment::Circle { p1, p2, p3 } => {
                let (a, c) = if reversed { (*p3, *p1) } else { (*p1, *p3) };
                self.linearizer.linearize_circle(a, *p2, c, self.max_error)
            }
            CurveSegment::ArcString(points) => {
                if points.len() < 3 || points.len() % 2 == 0 {
                    return Err(SpatialError::UnsupportedVariant(format!(
                        "Arc string needs an odd point count of at least 3, got {}",
                        points.len()
                    )));
                }
                let view = PointView::new(points, reversed);
                let mut result: Vec<Coord> = Vec::new();
                let mut i = 0;
                while i + 2 < view.len() {
                    let arc = self.linearizer.linearize_arc(
                        view.get(i),
                        view.get(i + 1),
                        view.get(i + 2),
                        self.max_error,
                    )?;
                    let skip = if result.is_empty() { 0 } else { 1 };
                    result.extend(arc.into_iter().skip(skip));
                    i += 2;
                }
                Ok(result)
            }
        }
    }
}

/// Classifies the traversal direction of a curve.
///
/// If the curve contains an arc-string segment, the sign of the cross
/// product over its first control-point triple decides; otherwise the
/// shoelace sum over the curve's full control-point sequence does. A
/// degenerate (zero-area) curve counts as clockwise, which leaves the
/// processing order unchanged.
pub fn classify_orientation(segments: &[CurveSegment]) -> SpatialResult<Orientation> {
    for segment in segments {
        if let CurveSegment::ArcString(points) = segment {
            if points.len() < 3 {
                return Err(SpatialError::UnsupportedVariant(format!(
                    "Arc string needs an odd point count of at least 3, got {}",
                    points.len()
                )));
            }
            let area2 = signed_area2(points[0], points[1], points[2]);
            return Ok(if area2 > 0.0 {
                Orientation::CounterClockwise
            } else {
                Orientation::Clockwise
            });
        }
    }

    let mut sum = 0.0;
    let mut previous: Option<Coord> = None;
    for segment in segments {
        let triple;
        let points: &[Coord] = match segment {
            CurveSegment::Line(points) | CurveSegment::ArcString(points) => points,
            CurveSegment::Arc { start, mid, end } => {
                triple = [*start, *mid, *end];
                &triple
            }
            CurveSegment::Circle { p1, p2, p3 } => {
                triple = [*p1, *p2, *p3];
                &triple
            }
        };
        for point in points {
            if let Some(prev) = previous {
                sum += cross_2d(prev.x, prev.y, point.x, point.y);
            }
            previous = Some(*point);
        }
    }

    Ok(if sum > 0.0 {
        Orientation::CounterClockwise
    } else {
        Orientation::Clockwise
    })
}

fn cross_2d(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ax * by - ay * bx
}

/// Twice the signed area of the triangle (a, b, c); positive means
/// counter-clockwise.
fn signed_area2(a: Coord, b: Coord, c: Coord) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Center and radius of the circle through three points, or `None` when
/// they are (nearly) collinear.
fn circle_through(a: Coord, b: Coord, c: Coord) -> Option<(Coord, f64)> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    let scale = a.distance_xy(&b).max(b.distance_xy(&c)).max(1.0);
    if d.abs() < 1e-12 * scale * scale {
        return None;
    }

    let a2 = a.x * a.x + a.y * a.y;
    let b2 = b.x * b.x + b.y * b.y;
    let c2 = c.x * c.x + c.y * c.y;
    let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
    let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;

    let center = Coord::xy(ux, uy);
    let radius = center.distance_xy(&a);
    Some((center, radius))
}

#[cfg(test)]
mod tests {
    use super::*;

    const E: f64 = 0.01;

    fn linearizer() -> CurveLinearizer<ChordArcLinearizer> {
        CurveLinearizer::new(ChordArcLinearizer, E).unwrap()
    }

    fn xy(x: f64, y: f64) -> Coord {
        Coord::xy(x, y)
    }

    /// Builds the explicit reversed form of a curve: segments in reverse
    /// order, each with its point order flipped.
    fn reverse_curve(segments: &[CurveSegment]) -> Vec<CurveSegment> {
        segments
            .iter()
            .rev()
            .map(|segment| match segment {
                CurveSegment::Line(points) => {
                    CurveSegment::Line(points.iter().rev().copied().collect())
                }
                CurveSegment::Arc { start, mid, end } => CurveSegment::Arc {
                    start: *end,
                    mid: *mid,
                    end: *start,
                },
                CurveSegment::Circle { p1, p2, p3 } => CurveSegment::Circle {
                    p1: *p3,
                    p2: *p2,
                    p3: *p1,
                },
                CurveSegment::ArcString(points) => {
                    CurveSegment::ArcString(points.iter().rev().copied().collect())
                }
            })
            .collect()
    }

    #[test]
    fn test_invalid_max_error() {
        assert!(CurveLinearizer::new(ChordArcLinearizer, 0.0).is_err());
        assert!(CurveLinearizer::new(ChordArcLinearizer, -1.0).is_err());
    }

    #[test]
    fn test_empty_curve() {
        let result = linearizer().linearize(&[]).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_line_passes_through() {
        let curve = vec![CurveSegment::Line(vec![xy(0.0, 0.0), xy(1.0, 0.0), xy(2.0, 1.0)])];
        // Shoelace sum is negative, so no reversal happens.
        let result = linearizer().linearize(&curve).unwrap();
        assert_eq!(result, vec![xy(0.0, 0.0), xy(1.0, 0.0), xy(2.0, 1.0)]);
    }

    #[test]
    fn test_shared_boundary_point_written_once() {
        let curve = vec![
            CurveSegment::Line(vec![xy(0.0, 0.0), xy(1.0, 0.0)]),
            CurveSegment::Line(vec![xy(1.0, 0.0), xy(2.0, 0.0)]),
        ];
        let result = linearizer().linearize(&curve).unwrap();
        assert_eq!(result, vec![xy(0.0, 0.0), xy(1.0, 0.0), xy(2.0, 0.0)]);
    }

    #[test]
    fn test_line_then_clockwise_arc() {
        // Curve: line (P0, P1), then the clockwise upper half circle from
        // P1 = (0, 1) over P2 = (1, 0)... through (1,2)? Radius-1 circle
        // around (1, 1): from (0, 1) clockwise over (1, 2) to (2, 1).
        let p0 = xy(-1.0, 1.0);
        let p1 = xy(0.0, 1.0);
        let p2 = xy(1.0, 2.0);
        let p3 = xy(2.0, 1.0);
        let curve = vec![
            CurveSegment::Line(vec![p0, p1]),
            CurveSegment::Arc { start: p1, mid: p2, end: p3 },
        ];

        let result = linearizer().linearize(&curve).unwrap();

        assert_eq!(*result.first().unwrap(), p0);
        assert_eq!(*result.last().unwrap(), p3);
        assert!(result.len() > 4);

        // Every generated arc point stays within E of the true arc.
        let center = xy(1.0, 1.0);
        for point in &result[2..result.len() - 1] {
            let deviation = (point.distance_xy(&center) - 1.0).abs();
            assert!(deviation <= E, "point {} deviates {}", point, deviation);
        }
    }

    #[test]
    fn test_chord_error_bound() {
        // Quarter circle of radius 100; with E = 0.01 the subdivision
        // must be fine: check the sagitta of each generated chord.
        let start = xy(100.0, 0.0);
        let mid = xy(100.0 / 2f64.sqrt(), 100.0 / 2f64.sqrt());
        let end = xy(0.0, 100.0);
        let points = ChordArcLinearizer
            .linearize_arc(start, mid, end, E)
            .unwrap();

        assert!(points.len() >= 3);
        for pair in points.windows(2) {
            let chord_mid = xy((pair[0].x + pair[1].x) / 2.0, (pair[0].y + pair[1].y) / 2.0);
            let sagitta = 100.0 - chord_mid.distance_xy(&xy(0.0, 0.0));
            assert!(sagitta.abs() <= E * 1.01, "sagitta {} exceeds bound", sagitta);
        }
    }

    #[test]
    fn test_collinear_arc_degenerates_to_chord() {
        let points = ChordArcLinearizer
            .linearize_arc(xy(0.0, 0.0), xy(1.0, 1.0), xy(2.0, 2.0), E)
            .unwrap();
        assert_eq!(points, vec![xy(0.0, 0.0), xy(2.0, 2.0)]);
    }

    #[test]
    fn test_full_circle() {
        let start = xy(1.0, 0.0);
        let points = ChordArcLinearizer
            .linearize_circle(start, xy(0.0, 1.0), xy(-1.0, 0.0), E)
            .unwrap();

        assert_eq!(*points.first().unwrap(), start);
        assert_eq!(*points.last().unwrap(), start);
        assert!(points.len() > 8);
        for point in &points[..points.len() - 1] {
            let deviation = (point.distance_xy(&xy(0.0, 0.0)) - 1.0).abs();
            assert!(deviation <= 1e-9);
        }
    }

    #[test]
    fn test_collinear_circle_rejected() {
        let result = ChordArcLinearizer.linearize_circle(
            xy(0.0, 0.0),
            xy(1.0, 0.0),
            xy(2.0, 0.0),
            E,
        );
        assert!(matches!(result, Err(SpatialError::UnsupportedVariant(_))));
    }

    #[test]
    fn test_orientation_from_arc_string() {
        let ccw = vec![CurveSegment::ArcString(vec![
            xy(1.0, 0.0),
            xy(0.0, 1.0),
            xy(-1.0, 0.0),
        ])];
        assert_eq!(
            classify_orientation(&ccw).unwrap(),
            Orientation::CounterClockwise
        );

        let cw = vec![CurveSegment::ArcString(vec![
            xy(-1.0, 0.0),
            xy(0.0, 1.0),
            xy(1.0, 0.0),
        ])];
        assert_eq!(classify_orientation(&cw).unwrap(), Orientation::Clockwise);
    }

    #[test]
    fn test_orientation_shoelace() {
        let ccw_ring = vec![CurveSegment::Line(vec![
            xy(0.0, 0.0),
            xy(1.0, 0.0),
            xy(1.0, 1.0),
            xy(0.0, 1.0),
            xy(0.0, 0.0),
        ])];
        assert_eq!(
            classify_orientation(&ccw_ring).unwrap(),
            Orientation::CounterClockwise
        );

        let cw_ring = vec![CurveSegment::Line(vec![
            xy(0.0, 0.0),
            xy(0.0, 1.0),
            xy(1.0, 1.0),
            xy(1.0, 0.0),
            xy(0.0, 0.0),
        ])];
        assert_eq!(classify_orientation(&cw_ring).unwrap(), Orientation::Clockwise);
    }

    #[test]
    fn test_orientation_restoration() {
        // Linearizing a curve equals linearizing its reversed form and
        // reversing the output once more.
        let curve = vec![
            CurveSegment::Line(vec![xy(-2.0, 1.0), xy(0.0, 1.0)]),
            CurveSegment::Arc {
                start: xy(0.0, 1.0),
                mid: xy(1.0, 2.0),
                end: xy(2.0, 1.0),
            },
            CurveSegment::Line(vec![xy(2.0, 1.0), xy(3.0, 0.0)]),
        ];
        let reversed_curve = reverse_curve(&curve);

        let forward = linearizer().linearize(&curve).unwrap();
        let mut backward = linearizer().linearize(&reversed_curve).unwrap();
        backward.reverse();

        assert_eq!(forward.len(), backward.len());
        for (a, b) in forward.iter().zip(backward.iter()) {
            assert!(a.distance_xy(b) < 1e-9, "{} != {}", a, b);
        }
    }

    #[test]
    fn test_arc_string_even_point_count_rejected() {
        let curve = vec![CurveSegment::ArcString(vec![
            xy(0.0, 0.0),
            xy(1.0, 1.0),
            xy(2.0, 0.0),
            xy(3.0, -1.0),
        ])];
        let result = linearizer().linearize(&curve);
        assert!(matches!(result, Err(SpatialError::UnsupportedVariant(_))));
    }

    #[test]
    fn test_arc_string_chains_share_points() {
        // Two arcs chained: (0,0)-(1,1)-(2,0) and (2,0)-(3,-1)-(4,0).
        let curve = vec![CurveSegment::ArcString(vec![
            xy(0.0, 0.0),
            xy(1.0, 1.0),
            xy(2.0, 0.0),
            xy(3.0, -1.0),
            xy(4.0, 0.0),
        ])];
        let result = linearizer().linearize(&curve).unwrap();

        assert_eq!(*result.first().unwrap(), xy(0.0, 0.0));
        assert_eq!(*result.last().unwrap(), xy(4.0, 0.0));
        // The shared point (2, 0) appears exactly once.
        let shared = result
            .iter()
            .filter(|p| p.distance_xy(&xy(2.0, 0.0)) < 1e-9)
            .count();
        assert_eq!(shared, 1);
    }

    #[test]
    fn test_point_view_reversed_iteration() {
        let points = vec![xy(0.0, 0.0), xy(1.0, 0.0), xy(2.0, 0.0)];
        let view = PointView::new(&points, true);
        let collected: Vec<Coord> = view.iter().collect();
        assert_eq!(collected, vec![xy(2.0, 0.0), xy(1.0, 0.0), xy(0.0, 0.0)]);
        assert_eq!(view.len(), 3);
    }
}

//! Closest features between convex polytopes.
//!
//! A feature walk in the style of Mirtich's V-Clip. Each polytope
//! carries a current feature (vertex, edge, or face) and every
//! iteration either certifies the pair as closest using their Voronoi
//! regions or moves one pointer to a neighboring feature that is
//! strictly closer. For disjoint polytopes the walk terminates at the
//! global closest pair; for overlapping ones it reports a penetration
//! witness instead.
//!
//! Frame coherence makes the walk cheap. Reseeding from the previous
//! frame's features via [`vclip_from`] usually certifies in one or two
//! iterations.

use nalgebra::{Point3, Vector3};
use tracing::trace;

use keel_types::{Result, SimError};

use crate::polytope::{ConvexPolytope, EdgeId, FaceId, VertexId};
use crate::primitives::{closest_point_on_segment, GEOM_EPSILON};

/// Cap on walk iterations. A convex, closed, well-separated input
/// terminates in far fewer; hitting the cap means the inputs broke the
/// walk's invariants.
const MAX_ITERATIONS: usize = 256;

/// A feature of a convex polytope, as tracked by the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// A polytope vertex.
    Vertex(VertexId),
    /// A polytope edge.
    Edge(EdgeId),
    /// A polytope face.
    Face(FaceId),
}

/// Outcome of a closest-feature query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VClipStatus {
    /// The polytopes are disjoint.
    Separated {
        /// Closest point on the first polytope.
        point_a: Point3<f64>,
        /// Closest point on the second polytope.
        point_b: Point3<f64>,
        /// Distance between the closest points.
        distance: f64,
    },
    /// The polytopes overlap.
    Penetrating {
        /// Penetration depth along `normal`.
        depth: f64,
        /// Witness point inside the overlap.
        point: Point3<f64>,
        /// Unit direction that pushes the first polytope out of the
        /// second.
        normal: Vector3<f64>,
    },
}

/// Closest-feature pair and the separation or penetration it certifies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VClipResult {
    /// Terminal feature on the first polytope.
    pub feature_a: Feature,
    /// Terminal feature on the second polytope.
    pub feature_b: Feature,
    /// Separation or penetration certified by the features.
    pub status: VClipStatus,
}

impl VClipResult {
    /// Signed distance: positive separation, negative penetration
    /// depth.
    #[must_use]
    pub fn distance(&self) -> f64 {
        match self.status {
            VClipStatus::Separated { distance, .. } => distance,
            VClipStatus::Penetrating { depth, .. } => -depth,
        }
    }

    /// True when the polytopes overlap.
    #[must_use]
    pub fn is_penetrating(&self) -> bool {
        matches!(self.status, VClipStatus::Penetrating { .. })
    }
}

/// Plane between two Voronoi regions. Positive side belongs to the
/// neighbor the plane was built against.
#[derive(Debug, Clone, Copy)]
struct VoronoiPlane {
    point: Point3<f64>,
    normal: Vector3<f64>,
}

impl VoronoiPlane {
    fn signed_distance(&self, p: &Point3<f64>) -> f64 {
        (p - self.point).dot(&self.normal)
    }
}

/// Plane bounding `owner`'s Voronoi region against adjacent `neighbor`.
/// A point on the positive side has left the owner's region toward the
/// neighbor's.
fn voronoi_plane(poly: &ConvexPolytope, owner: Feature, neighbor: Feature) -> Result<VoronoiPlane> {
    match (owner, neighbor) {
        (Feature::Vertex(v), Feature::Edge(e)) => {
            let other = poly.edge_other_end(e, v)?;
            let point = poly.vertex_position(v);
            let along = poly.vertex_position(other) - point;
            Ok(VoronoiPlane {
                point,
                normal: unit(along)?,
            })
        }
        (Feature::Edge(e), Feature::Vertex(v)) => {
            let other = poly.edge_other_end(e, v)?;
            let point = poly.vertex_position(v);
            let along = point - poly.vertex_position(other);
            Ok(VoronoiPlane {
                point,
                normal: unit(along)?,
            })
        }
        (Feature::Edge(e), Feature::Face(f)) => {
            let (tail, _) = poly.edge_segment(e);
            let direction = poly.edge_direction_in_face(e, f)?;
            Ok(VoronoiPlane {
                point: tail,
                normal: poly.face_normal(f).cross(&direction),
            })
        }
        (Feature::Face(f), Feature::Edge(e)) => {
            let (tail, _) = poly.edge_segment(e);
            let direction = poly.edge_direction_in_face(e, f)?;
            Ok(VoronoiPlane {
                point: tail,
                normal: -poly.face_normal(f).cross(&direction),
            })
        }
        _ => Err(SimError::invalid_geometry(
            "no voronoi plane between non-adjacent features",
        )),
    }
}

fn unit(v: Vector3<f64>) -> Result<Vector3<f64>> {
    let length = v.norm();
    if length < GEOM_EPSILON {
        return Err(SimError::invalid_geometry(
            "cannot orient a zero-length direction",
        ));
    }
    Ok(v / length)
}

/// Result of clipping an edge against a Voronoi region.
#[derive(Debug, Clone, Copy)]
enum EdgeClip {
    /// The edge lies entirely outside the region; `by` is the neighbor
    /// whose plane excluded it.
    Excluded { by: Feature },
    /// Parameter interval of the edge that survived, with the neighbor
    /// features whose planes produced the bounds. `None` means the
    /// natural endpoint survived unclipped.
    Span {
        lambda_min: f64,
        lambda_max: f64,
        min_feature: Option<Feature>,
        max_feature: Option<Feature>,
    },
}

/// Clip the segment `tail..head` to the intersection of the negative
/// half-spaces of `planes`. Each plane is tagged with the neighbor
/// feature on its positive side.
fn clip_edge(
    tail: &Point3<f64>,
    head: &Point3<f64>,
    planes: &[(Feature, VoronoiPlane)],
) -> EdgeClip {
    let mut lambda_min = 0.0;
    let mut lambda_max = 1.0;
    let mut min_feature = None;
    let mut max_feature = None;

    for (neighbor, plane) in planes {
        let d_tail = plane.signed_distance(tail);
        let d_head = plane.signed_distance(head);

        if d_tail > 0.0 && d_head > 0.0 {
            return EdgeClip::Excluded { by: *neighbor };
        }
        if d_tail > 0.0 {
            let lambda = d_tail / (d_tail - d_head);
            if lambda > lambda_min {
                lambda_min = lambda;
                min_feature = Some(*neighbor);
                if lambda_min > lambda_max {
                    return EdgeClip::Excluded { by: *neighbor };
                }
            }
        } else if d_head > 0.0 {
            let lambda = d_tail / (d_tail - d_head);
            if lambda < lambda_max {
                lambda_max = lambda;
                max_feature = Some(*neighbor);
                if lambda_min > lambda_max {
                    return EdgeClip::Excluded { by: *neighbor };
                }
            }
        }
    }

    EdgeClip::Span {
        lambda_min,
        lambda_max,
        min_feature,
        max_feature,
    }
}

/// Sign of the distance-to-`target` derivative along an edge at
/// `edge_point`, moving in `edge_direction`. Zero when the point sits
/// on the target.
fn rate_toward_point(
    edge_point: &Point3<f64>,
    edge_direction: &Vector3<f64>,
    target: &Point3<f64>,
) -> f64 {
    let offset = edge_point - target;
    if offset.norm() < GEOM_EPSILON {
        0.0
    } else {
        edge_direction.dot(&offset)
    }
}

fn rate_toward_segment(
    edge_point: &Point3<f64>,
    edge_direction: &Vector3<f64>,
    seg_tail: &Point3<f64>,
    seg_head: &Point3<f64>,
) -> f64 {
    let closest = closest_point_on_segment(*seg_tail, *seg_head, edge_point);
    rate_toward_point(edge_point, edge_direction, &closest)
}

/// Closest points between two segments, after Ericson, Real-Time
/// Collision Detection, section 5.1.9.
fn closest_points_segments(
    p1: &Point3<f64>,
    q1: &Point3<f64>,
    p2: &Point3<f64>,
    q2: &Point3<f64>,
) -> (Point3<f64>, Point3<f64>) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);

    let (s, t) = if a < GEOM_EPSILON && e < GEOM_EPSILON {
        (0.0, 0.0)
    } else if a < GEOM_EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(&r);
        if e < GEOM_EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            let mut s = if denom.abs() > GEOM_EPSILON {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    (p1 + d1 * s, p2 + d2 * t)
}

/// One transition of the walk. Payload order matches the handler's
/// argument order; the dispatcher swaps when it called the handler
/// with the polytopes reversed.
#[derive(Debug, Clone, Copy)]
enum Step {
    Continue(Feature, Feature),
    Done {
        point_first: Point3<f64>,
        point_second: Point3<f64>,
    },
    Penetration {
        depth: f64,
        point: Point3<f64>,
        /// Pushes the first argument's polytope out of the second's.
        normal: Vector3<f64>,
    },
}

fn swapped(step: Step) -> Step {
    match step {
        Step::Continue(x, y) => Step::Continue(y, x),
        Step::Done {
            point_first,
            point_second,
        } => Step::Done {
            point_first: point_second,
            point_second: point_first,
        },
        Step::Penetration {
            depth,
            point,
            normal,
        } => Step::Penetration {
            depth,
            point,
            normal: -normal,
        },
    }
}

fn step_vertex_vertex(
    pa: &ConvexPolytope,
    va: VertexId,
    pb: &ConvexPolytope,
    vb: VertexId,
) -> Result<Step> {
    let pos_a = pa.vertex_position(va);
    let pos_b = pb.vertex_position(vb);

    if (pos_b - pos_a).norm() < GEOM_EPSILON {
        return Err(SimError::invalid_geometry(
            "coincident vertices leave the closest direction undefined",
        ));
    }

    for &e in pa.vertex_edges(va) {
        let plane = voronoi_plane(pa, Feature::Vertex(va), Feature::Edge(e))?;
        if plane.signed_distance(&pos_b) > GEOM_EPSILON {
            return Ok(Step::Continue(Feature::Edge(e), Feature::Vertex(vb)));
        }
    }
    for &e in pb.vertex_edges(vb) {
        let plane = voronoi_plane(pb, Feature::Vertex(vb), Feature::Edge(e))?;
        if plane.signed_distance(&pos_a) > GEOM_EPSILON {
            return Ok(Step::Continue(Feature::Vertex(va), Feature::Edge(e)));
        }
    }

    Ok(Step::Done {
        point_first: pos_a,
        point_second: pos_b,
    })
}

/// Vertex on the first polytope against an edge on the second.
fn step_vertex_edge(
    pv: &ConvexPolytope,
    v: VertexId,
    pe: &ConvexPolytope,
    e: EdgeId,
) -> Result<Step> {
    let pos_v = pv.vertex_position(v);
    let (tail_pos, head_pos) = pe.edge_segment(e);

    // Clip the edge against the vertex's cone.
    let mut planes = Vec::with_capacity(pv.vertex_edges(v).len());
    for &incident in pv.vertex_edges(v) {
        let plane = voronoi_plane(pv, Feature::Vertex(v), Feature::Edge(incident))?;
        planes.push((Feature::Edge(incident), plane));
    }

    match clip_edge(&tail_pos, &head_pos, &planes) {
        EdgeClip::Excluded { by } => Ok(Step::Continue(by, Feature::Edge(e))),
        EdgeClip::Span {
            lambda_min,
            lambda_max,
            min_feature,
            max_feature,
        } => {
            let along = head_pos - tail_pos;
            let direction = unit(along)?;

            if let Some(feature) = min_feature {
                let at_min = tail_pos + along * lambda_min;
                if rate_toward_point(&at_min, &direction, &pos_v) > 0.0 {
                    return Ok(Step::Continue(feature, Feature::Edge(e)));
                }
            }
            if let Some(feature) = max_feature {
                let at_max = tail_pos + along * lambda_max;
                if rate_toward_point(&at_max, &direction, &pos_v) < 0.0 {
                    return Ok(Step::Continue(feature, Feature::Edge(e)));
                }
            }

            // The vertex against the edge's own region.
            let (tail, head) = pe.edge_endpoints(e);
            for endpoint in [tail, head] {
                let plane = voronoi_plane(pe, Feature::Edge(e), Feature::Vertex(endpoint))?;
                if plane.signed_distance(&pos_v) > GEOM_EPSILON {
                    return Ok(Step::Continue(
                        Feature::Vertex(v),
                        Feature::Vertex(endpoint),
                    ));
                }
            }
            let (left, right) = pe.edge_faces(e);
            for face in [left, right] {
                let plane = voronoi_plane(pe, Feature::Edge(e), Feature::Face(face))?;
                if plane.signed_distance(&pos_v) > GEOM_EPSILON {
                    return Ok(Step::Continue(Feature::Vertex(v), Feature::Face(face)));
                }
            }

            Ok(Step::Done {
                point_first: pos_v,
                point_second: closest_point_on_segment(tail_pos, head_pos, &pos_v),
            })
        }
    }
}

/// Where a point that fell below a face plane actually sits relative
/// to the whole polytope.
enum LocalMin {
    /// Outside after all; the walk escapes toward this face.
    Escape(FaceId),
    /// Inside every face plane.
    Inside { depth: f64, face: FaceId },
}

fn classify_interior_point(point: &Point3<f64>, poly: &ConvexPolytope) -> Result<LocalMin> {
    let mut best: Option<(f64, FaceId)> = None;
    for f in poly.face_ids() {
        let (anchor, normal) = poly.face_plane(f);
        let d = (point - anchor).dot(&normal);
        if best.is_none_or(|(b, _)| d > b) {
            best = Some((d, f));
        }
    }
    let (d, f) = best.ok_or_else(|| SimError::invalid_geometry("polytope has no faces"))?;
    if d > 0.0 {
        Ok(LocalMin::Escape(f))
    } else {
        Ok(LocalMin::Inside { depth: -d, face: f })
    }
}

/// Vertex on the first polytope against a face on the second.
fn step_vertex_face(
    pv: &ConvexPolytope,
    v: VertexId,
    pf: &ConvexPolytope,
    f: FaceId,
) -> Result<Step> {
    let pos_v = pv.vertex_position(v);

    // Most violated wall of the face's prism wins.
    let mut worst: Option<(f64, EdgeId)> = None;
    for &boundary in pf.face_edges(f) {
        let plane = voronoi_plane(pf, Feature::Face(f), Feature::Edge(boundary))?;
        let d = plane.signed_distance(&pos_v);
        if d > GEOM_EPSILON && worst.is_none_or(|(w, _)| d > w) {
            worst = Some((d, boundary));
        }
    }
    if let Some((_, boundary)) = worst {
        return Ok(Step::Continue(Feature::Vertex(v), Feature::Edge(boundary)));
    }

    let (anchor, normal) = pf.face_plane(f);
    let height = (pos_v - anchor).dot(&normal);

    if height > 0.0 {
        // Above the face inside the prism. Descend along an incident
        // edge if one points toward the face plane.
        for &e in pv.vertex_edges(v) {
            let other = pv.edge_other_end(e, v)?;
            let toward = unit(pv.vertex_position(other) - pos_v)?;
            if toward.dot(&normal) < -GEOM_EPSILON {
                return Ok(Step::Continue(Feature::Edge(e), Feature::Face(f)));
            }
        }
        return Ok(Step::Done {
            point_first: pos_v,
            point_second: pos_v - normal * height,
        });
    }

    // Below the face plane inside the prism: either the vertex is
    // genuinely inside the other polytope, or it is outside through a
    // different face and the walk restarts there.
    match classify_interior_point(&pos_v, pf)? {
        LocalMin::Escape(face) => Ok(Step::Continue(Feature::Vertex(v), Feature::Face(face))),
        LocalMin::Inside { depth, face } => Ok(Step::Penetration {
            depth,
            point: pos_v,
            normal: pf.face_normal(face),
        }),
    }
}

fn edge_region_planes(
    poly: &ConvexPolytope,
    e: EdgeId,
) -> Result<[(Feature, VoronoiPlane); 4]> {
    let (tail, head) = poly.edge_endpoints(e);
    let (left, right) = poly.edge_faces(e);
    Ok([
        (
            Feature::Vertex(tail),
            voronoi_plane(poly, Feature::Edge(e), Feature::Vertex(tail))?,
        ),
        (
            Feature::Vertex(head),
            voronoi_plane(poly, Feature::Edge(e), Feature::Vertex(head))?,
        ),
        (
            Feature::Face(left),
            voronoi_plane(poly, Feature::Edge(e), Feature::Face(left))?,
        ),
        (
            Feature::Face(right),
            voronoi_plane(poly, Feature::Edge(e), Feature::Face(right))?,
        ),
    ])
}

/// Clip `other` against `owner_edge`'s region. On a transition the
/// OWNER's pointer moves; returns the new owner feature.
fn edge_edge_pass(
    owner_poly: &ConvexPolytope,
    owner_edge: EdgeId,
    other_poly: &ConvexPolytope,
    other_edge: EdgeId,
) -> Result<Option<Feature>> {
    let planes = edge_region_planes(owner_poly, owner_edge)?;
    let (tail_pos, head_pos) = other_poly.edge_segment(other_edge);
    let (owner_tail, owner_head) = owner_poly.edge_segment(owner_edge);

    match clip_edge(&tail_pos, &head_pos, &planes) {
        EdgeClip::Excluded { by } => Ok(Some(by)),
        EdgeClip::Span {
            lambda_min,
            lambda_max,
            min_feature,
            max_feature,
        } => {
            let along = head_pos - tail_pos;
            let direction = unit(along)?;
            if let Some(feature) = min_feature {
                let at_min = tail_pos + along * lambda_min;
                if rate_toward_segment(&at_min, &direction, &owner_tail, &owner_head) > 0.0 {
                    return Ok(Some(feature));
                }
            }
            if let Some(feature) = max_feature {
                let at_max = tail_pos + along * lambda_max;
                if rate_toward_segment(&at_max, &direction, &owner_tail, &owner_head) < 0.0 {
                    return Ok(Some(feature));
                }
            }
            Ok(None)
        }
    }
}

fn step_edge_edge(
    pa: &ConvexPolytope,
    ea: EdgeId,
    pb: &ConvexPolytope,
    eb: EdgeId,
) -> Result<Step> {
    if let Some(feature) = edge_edge_pass(pa, ea, pb, eb)? {
        return Ok(Step::Continue(feature, Feature::Edge(eb)));
    }
    if let Some(feature) = edge_edge_pass(pb, eb, pa, ea)? {
        return Ok(Step::Continue(Feature::Edge(ea), feature));
    }

    let (a_tail, a_head) = pa.edge_segment(ea);
    let (b_tail, b_head) = pb.edge_segment(eb);
    let (point_first, point_second) = closest_points_segments(&a_tail, &a_head, &b_tail, &b_head);
    Ok(Step::Done {
        point_first,
        point_second,
    })
}

/// Edge on the first polytope against a face on the second.
fn step_edge_face(
    pe: &ConvexPolytope,
    e: EdgeId,
    pf: &ConvexPolytope,
    f: FaceId,
) -> Result<Step> {
    let (tail_pos, head_pos) = pe.edge_segment(e);

    let boundary = pf.face_edges(f);
    let mut planes = Vec::with_capacity(boundary.len());
    for &be in boundary {
        let plane = voronoi_plane(pf, Feature::Face(f), Feature::Edge(be))?;
        planes.push((Feature::Edge(be), plane));
    }

    match clip_edge(&tail_pos, &head_pos, &planes) {
        EdgeClip::Excluded { by } => Ok(Step::Continue(Feature::Edge(e), by)),
        EdgeClip::Span {
            lambda_min,
            lambda_max,
            min_feature,
            max_feature,
        } => {
            let (anchor, normal) = pf.face_plane(f);
            let along = head_pos - tail_pos;
            let at_min = tail_pos + along * lambda_min;
            let at_max = tail_pos + along * lambda_max;
            let d_min = (at_min - anchor).dot(&normal);
            let d_max = (at_max - anchor).dot(&normal);

            // The surviving interval dips to or below the face plane:
            // the edge pierces the face.
            if d_min.min(d_max) <= 0.0 {
                let (depth, point) = if d_min <= d_max {
                    (-d_min, at_min)
                } else {
                    (-d_max, at_max)
                };
                return Ok(Step::Penetration {
                    depth,
                    point,
                    normal,
                });
            }

            // Both above: walk toward whichever end is nearer the
            // plane. A clipped end hands the face to the wall that
            // produced it; a natural end hands the edge to its vertex.
            let (tail, head) = pe.edge_endpoints(e);
            if d_min <= d_max {
                match min_feature {
                    Some(feature) => Ok(Step::Continue(Feature::Edge(e), feature)),
                    None => Ok(Step::Continue(Feature::Vertex(tail), Feature::Face(f))),
                }
            } else {
                match max_feature {
                    Some(feature) => Ok(Step::Continue(Feature::Edge(e), feature)),
                    None => Ok(Step::Continue(Feature::Vertex(head), Feature::Face(f))),
                }
            }
        }
    }
}

fn validate_seed(poly: &ConvexPolytope, feature: Feature) -> Result<()> {
    let in_range = match feature {
        Feature::Vertex(v) => v.0 < poly.vertex_count(),
        Feature::Edge(e) => e.0 < poly.edge_count(),
        Feature::Face(f) => f.0 < poly.face_count(),
    };
    if in_range {
        Ok(())
    } else {
        Err(SimError::invalid_geometry(
            "seed feature does not belong to this polytope",
        ))
    }
}

/// Closest features between two polytopes, walked from the default
/// seed.
pub fn vclip(a: &ConvexPolytope, b: &ConvexPolytope) -> Result<VClipResult> {
    vclip_from(
        a,
        b,
        Feature::Vertex(VertexId(0)),
        Feature::Vertex(VertexId(0)),
    )
}

/// Closest features between two polytopes, walked from a seed pair.
///
/// Seeding with the previous frame's terminal features exploits
/// coherence. Returns [`SimError::ConvergenceFailure`] if the walk
/// fails to terminate, which for valid convex input it does not.
pub fn vclip_from(
    a: &ConvexPolytope,
    b: &ConvexPolytope,
    seed_a: Feature,
    seed_b: Feature,
) -> Result<VClipResult> {
    validate_seed(a, seed_a)?;
    validate_seed(b, seed_b)?;

    let mut feature_a = seed_a;
    let mut feature_b = seed_b;

    for _ in 0..MAX_ITERATIONS {
        let step = match (feature_a, feature_b) {
            (Feature::Vertex(va), Feature::Vertex(vb)) => step_vertex_vertex(a, va, b, vb)?,
            (Feature::Vertex(v), Feature::Edge(e)) => step_vertex_edge(a, v, b, e)?,
            (Feature::Edge(e), Feature::Vertex(v)) => swapped(step_vertex_edge(b, v, a, e)?),
            (Feature::Vertex(v), Feature::Face(f)) => step_vertex_face(a, v, b, f)?,
            (Feature::Face(f), Feature::Vertex(v)) => swapped(step_vertex_face(b, v, a, f)?),
            (Feature::Edge(ea), Feature::Edge(eb)) => step_edge_edge(a, ea, b, eb)?,
            (Feature::Edge(e), Feature::Face(f)) => step_edge_face(a, e, b, f)?,
            (Feature::Face(f), Feature::Edge(e)) => swapped(step_edge_face(b, e, a, f)?),
            (Feature::Face(_), Feature::Face(_)) => {
                return Err(SimError::invalid_geometry(
                    "face-face feature pair is unreachable for convex input",
                ));
            }
        };

        match step {
            Step::Continue(next_a, next_b) => {
                trace!("feature walk: {:?} | {:?}", next_a, next_b);
                feature_a = next_a;
                feature_b = next_b;
            }
            Step::Done {
                point_first,
                point_second,
            } => {
                return Ok(VClipResult {
                    feature_a,
                    feature_b,
                    status: VClipStatus::Separated {
                        point_a: point_first,
                        point_b: point_second,
                        distance: (point_second - point_first).norm(),
                    },
                });
            }
            Step::Penetration {
                depth,
                point,
                normal,
            } => {
                return Ok(VClipResult {
                    feature_a,
                    feature_b,
                    status: VClipStatus::Penetrating {
                        depth,
                        point,
                        normal,
                    },
                });
            }
        }
    }

    Err(SimError::ConvergenceFailure {
        iterations: MAX_ITERATIONS,
    })
}

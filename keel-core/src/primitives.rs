//! Geometric primitives and intersection tests.
//!
//! Pure functions over points and vectors: ray casts against triangles,
//! boxes, planes, and spheres, closest-point projections, and the
//! sphere/capsule versus triangle contact kernels used by the narrow
//! phase. Everything works in world coordinates and carries no
//! simulation state.
//!
//! All tests share a single tolerance, [`GEOM_EPSILON`]. Degenerate
//! input (zero-area triangles, zero-length directions) is reported as
//! "no intersection" rather than panicking, and comparisons are written
//! so that NaN input also lands on the rejecting branch.

// Allow many_single_char_names - standard notation for Möller-Trumbore and barycentrics
// Allow similar_names - u/v and v0/v1/v2 are the textbook variable names here
// Allow suspicious_operation_groupings - false positive for quadratic discriminant formula b*b - a*c
#![allow(
    clippy::many_single_char_names,
    clippy::similar_names,
    clippy::suspicious_operation_groupings
)]

use nalgebra::{Point3, Vector3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::aabb::Aabb;

/// Tolerance shared by every geometric test in this crate.
///
/// Determinants, edge lengths, and cross-product magnitudes below this
/// value are treated as degenerate and reported as "no intersection."
pub const GEOM_EPSILON: f64 = 1e-7;

/// A triangle given by three vertices in world coordinates.
///
/// Winding is counter-clockwise when viewed from the front side, so the
/// geometric normal is `(b - a) × (c - a)`, normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Triangle {
    /// First vertex.
    pub a: Point3<f64>,
    /// Second vertex.
    pub b: Point3<f64>,
    /// Third vertex.
    pub c: Point3<f64>,
}

impl Triangle {
    /// Create a triangle from three vertices.
    #[must_use]
    pub const fn new(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Self {
        Self { a, b, c }
    }

    /// Unit normal of the triangle, or `None` if it has no area.
    #[must_use]
    pub fn normal(&self) -> Option<Vector3<f64>> {
        let cross = (self.b - self.a).cross(&(self.c - self.a));
        let length = cross.norm();
        if length > GEOM_EPSILON {
            Some(cross / length)
        } else {
            None
        }
    }

    /// Arithmetic mean of the three vertices.
    #[must_use]
    pub fn centroid(&self) -> Point3<f64> {
        Point3::from((self.a.coords + self.b.coords + self.c.coords) / 3.0)
    }

    /// Whether the triangle is too small or thin to have a usable normal.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.normal().is_none()
    }
}

/// Result of a ray-triangle intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayTriangleHit {
    /// Parametric distance along the ray direction to the hit.
    pub distance: f64,
    /// Hit point in world coordinates.
    pub point: Point3<f64>,
}

/// A contact between a sphere or capsule and a triangle.
#[derive(Debug, Clone, Copy)]
pub struct TriangleContact {
    /// Deepest point of the shape's overlap, on the triangle surface.
    pub point: Point3<f64>,
    /// Unit direction that pushes the shape out of the triangle.
    pub normal: Vector3<f64>,
    /// Overlap distance along `normal`. Always positive.
    pub depth: f64,
}

/// Safe vector normalization with fallback.
/// Returns the normalized vector if its norm exceeds [`GEOM_EPSILON`],
/// otherwise returns the fallback.
#[inline]
#[must_use]
pub fn safe_normalize(v: &Vector3<f64>, fallback: Vector3<f64>) -> Vector3<f64> {
    let n = v.norm();
    if n > GEOM_EPSILON {
        v / n
    } else {
        fallback
    }
}

/// Möller–Trumbore ray-triangle intersection.
///
/// Both triangle faces are hit; callers that care about sidedness check
/// the triangle normal against the ray direction themselves. Returns
/// `None` for a parallel ray, a hit behind the origin, or a hit outside
/// the triangle bounds.
#[must_use]
pub fn ray_triangle(
    ray_origin: Point3<f64>,
    ray_dir: &Vector3<f64>,
    a: Point3<f64>,
    b: Point3<f64>,
    c: Point3<f64>,
) -> Option<RayTriangleHit> {
    let edge1 = b - a;
    let edge2 = c - a;
    let h = ray_dir.cross(&edge2);
    let det = edge1.dot(&h);

    if !(det.abs() >= GEOM_EPSILON) {
        return None; // Ray parallel to triangle, or NaN
    }

    let f = 1.0 / det;
    let s = ray_origin - a;
    let u = f * s.dot(&h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * ray_dir.dot(&q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);

    if t < GEOM_EPSILON {
        return None; // Triangle behind the ray origin
    }

    Some(RayTriangleHit {
        distance: t,
        point: ray_origin + ray_dir * t,
    })
}

/// Ray-AABB intersection using the slab method.
///
/// Returns the parametric interval `(t_min, t_max)` over which the ray
/// is inside the box. `t_min` is negative when the origin starts inside.
/// Returns `None` when the ray misses or the box lies entirely behind
/// the origin.
#[must_use]
pub fn ray_aabb(
    ray_origin: Point3<f64>,
    ray_dir: &Vector3<f64>,
    aabb: &Aabb,
) -> Option<(f64, f64)> {
    let mut t_min = f64::NEG_INFINITY;
    let mut t_max = f64::INFINITY;

    for i in 0..3 {
        let origin_i = ray_origin[i];
        let dir_i = ray_dir[i];

        if dir_i.abs() < GEOM_EPSILON {
            // Ray parallel to slab
            if origin_i < aabb.min[i] || origin_i > aabb.max[i] {
                return None;
            }
        } else {
            let inv_dir = 1.0 / dir_i;
            let t1 = (aabb.min[i] - origin_i) * inv_dir;
            let t2 = (aabb.max[i] - origin_i) * inv_dir;
            let (t_near, t_far) = if t1 < t2 { (t1, t2) } else { (t2, t1) };

            t_min = t_min.max(t_near);
            t_max = t_max.min(t_far);

            if t_min > t_max {
                return None;
            }
        }
    }

    if t_max < 0.0 {
        return None; // Box entirely behind the origin
    }

    Some((t_min, t_max))
}

/// Ray-plane intersection.
///
/// The plane is defined by a point and a normal. Returns the parametric
/// distance to the plane, or `None` when the ray is parallel to it or
/// the plane lies behind the origin.
#[must_use]
pub fn ray_plane(
    ray_origin: Point3<f64>,
    ray_dir: &Vector3<f64>,
    plane_point: Point3<f64>,
    plane_normal: &Vector3<f64>,
) -> Option<f64> {
    let denom = plane_normal.dot(ray_dir);

    // Parallel to plane (or NaN)
    if !(denom.abs() >= GEOM_EPSILON) {
        return None;
    }

    let t = (plane_point - ray_origin).dot(plane_normal) / denom;
    if t < 0.0 {
        return None;
    }

    Some(t)
}

/// Ray-sphere intersection using the analytic quadratic formula.
///
/// The direction need not be unit length; the returned distance is
/// parametric along `ray_dir`.
#[must_use]
pub fn ray_sphere(
    ray_origin: Point3<f64>,
    ray_dir: &Vector3<f64>,
    center: Point3<f64>,
    radius: f64,
) -> Option<f64> {
    let oc = ray_origin - center;
    let a = ray_dir.norm_squared();
    if a < GEOM_EPSILON * GEOM_EPSILON {
        return None; // Zero-length direction
    }

    let b = oc.dot(ray_dir);
    let c = oc.dot(&oc) - radius * radius;
    let discriminant = b * b - a * c;

    // Check for miss OR NaN (NaN < 0.0 is false, so explicitly check)
    if !(discriminant >= 0.0) {
        return None;
    }

    let sqrt_d = discriminant.sqrt();

    // Try the near hit first
    let mut t = (-b - sqrt_d) / a;
    if t < 0.0 {
        // Near hit is behind, try far hit
        t = (-b + sqrt_d) / a;
    }

    if t < 0.0 {
        return None;
    }

    Some(t)
}

/// Closest point to `p` on the segment from `a` to `b`.
///
/// A zero-length segment returns `a`.
#[must_use]
pub fn closest_point_on_segment(a: Point3<f64>, b: Point3<f64>, p: &Point3<f64>) -> Point3<f64> {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < GEOM_EPSILON * GEOM_EPSILON {
        return a;
    }

    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Orthogonal projection of `p` onto a plane.
///
/// `plane_normal` must be unit length.
#[must_use]
pub fn closest_point_on_plane(
    p: &Point3<f64>,
    plane_point: Point3<f64>,
    plane_normal: &Vector3<f64>,
) -> Point3<f64> {
    let distance = (p - plane_point).dot(plane_normal);
    p - plane_normal * distance
}

/// In-plane projection of `p` onto a triangle, if it lands inside.
///
/// Returns `None` when the projected point falls outside the triangle
/// (callers fall back to the three edges) or the triangle is
/// degenerate.
#[must_use]
pub fn closest_point_on_triangle(
    p: &Point3<f64>,
    a: Point3<f64>,
    b: Point3<f64>,
    c: Point3<f64>,
) -> Option<Point3<f64>> {
    let v0 = b - a;
    let v1 = c - a;
    let normal = v0.cross(&v1);

    // By the Lagrange identity this is also the barycentric denominator.
    let denom = normal.norm_squared();
    if !(denom >= GEOM_EPSILON * GEOM_EPSILON) {
        return None; // Degenerate triangle, or NaN
    }

    let unit_normal = normal / denom.sqrt();
    let projected = p - unit_normal * (p - a).dot(&unit_normal);

    let v2 = projected - a;
    let d00 = v0.dot(&v0);
    let d01 = v0.dot(&v1);
    let d11 = v1.dot(&v1);
    let d20 = v2.dot(&v0);
    let d21 = v2.dot(&v1);

    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    let u = 1.0 - v - w;

    if u >= 0.0 && v >= 0.0 && w >= 0.0 {
        Some(projected)
    } else {
        None
    }
}

/// Closest point to `p` inside or on the box.
#[must_use]
pub fn closest_point_on_aabb(p: &Point3<f64>, aabb: &Aabb) -> Point3<f64> {
    Point3::new(
        p.x.clamp(aabb.min.x, aabb.max.x),
        p.y.clamp(aabb.min.y, aabb.max.y),
        p.z.clamp(aabb.min.z, aabb.max.z),
    )
}

/// Closest point on a triangle's surface, falling back to the nearest
/// edge when the in-plane projection lands outside.
fn closest_point_on_triangle_or_edges(
    p: &Point3<f64>,
    a: Point3<f64>,
    b: Point3<f64>,
    c: Point3<f64>,
) -> Point3<f64> {
    if let Some(projected) = closest_point_on_triangle(p, a, b, c) {
        return projected;
    }

    let mut best = closest_point_on_segment(a, b, p);
    let mut best_dist_sq = (p - best).norm_squared();
    for (start, end) in [(b, c), (c, a)] {
        let candidate = closest_point_on_segment(start, end, p);
        let dist_sq = (p - candidate).norm_squared();
        if dist_sq < best_dist_sq {
            best_dist_sq = dist_sq;
            best = candidate;
        }
    }
    best
}

/// Sphere versus triangle contact test.
///
/// Single-sided by default: a center behind the triangle plane produces
/// no contact, so bodies that have tunneled through thin geometry are
/// not yanked back. With `double_sided` the triangle pushes from both
/// faces and the contact normal flips to the side the center is on.
#[must_use]
pub fn sphere_triangle(
    center: Point3<f64>,
    radius: f64,
    a: Point3<f64>,
    b: Point3<f64>,
    c: Point3<f64>,
    double_sided: bool,
) -> Option<TriangleContact> {
    let cross = (b - a).cross(&(c - a));
    let area = cross.norm();
    if area < GEOM_EPSILON {
        return None; // Degenerate triangle
    }
    let mut plane_normal = cross / area;

    let mut signed_distance = (center - a).dot(&plane_normal);
    if double_sided && signed_distance < 0.0 {
        plane_normal = -plane_normal;
        signed_distance = -signed_distance;
    }

    // Behind a single-sided triangle (or NaN): no contact.
    if !(signed_distance >= 0.0) {
        return None;
    }
    if signed_distance > radius {
        return None;
    }

    let point = closest_point_on_triangle_or_edges(&center, a, b, c);
    let to_center = center - point;
    let distance = to_center.norm();
    if distance > radius {
        return None;
    }

    let normal = if distance > GEOM_EPSILON {
        to_center / distance
    } else {
        plane_normal
    };

    Some(TriangleContact {
        point,
        normal,
        depth: radius - distance,
    })
}

/// Capsule versus triangle contact test.
///
/// Picks the point on the capsule axis nearest the triangle by
/// intersecting the axis line with the triangle plane, then runs the
/// sphere test at that point. The reduction is approximate for long
/// capsules grazing an edge, which is accepted in exchange for reusing
/// the sphere kernel.
#[must_use]
pub fn capsule_triangle(
    base: Point3<f64>,
    tip: Point3<f64>,
    radius: f64,
    a: Point3<f64>,
    b: Point3<f64>,
    c: Point3<f64>,
    double_sided: bool,
) -> Option<TriangleContact> {
    let axis = tip - base;
    let axis_len = axis.norm();
    if axis_len < GEOM_EPSILON {
        // Degenerate capsule, treat as a sphere
        return sphere_triangle(base, radius, a, b, c, double_sided);
    }
    let axis_dir = axis / axis_len;

    let cross = (b - a).cross(&(c - a));
    let area = cross.norm();
    if area < GEOM_EPSILON {
        return None;
    }
    let plane_normal = cross / area;

    let denom = plane_normal.dot(&axis_dir);
    let plane_hit = if denom.abs() >= GEOM_EPSILON {
        let t = plane_normal.dot(&(a - base)) / denom;
        base + axis_dir * t
    } else {
        // Axis parallel to the triangle plane
        closest_point_on_plane(&base, a, &plane_normal)
    };

    let reference = closest_point_on_triangle_or_edges(&plane_hit, a, b, c);
    let center = closest_point_on_segment(base, tip, &reference);
    sphere_triangle(center, radius, a, b, c, double_sided)
}

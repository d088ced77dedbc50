//! Axis-aligned bounding boxes.
//!
//! [`Aabb`] is the workhorse of the broad phase: octree nodes, triangle
//! bounds, and collider bounds are all expressed as AABBs, and overlap
//! tests between them gate every narrow-phase query.

use nalgebra::{Point3, Vector3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::primitives::Triangle;

/// An axis-aligned bounding box.
///
/// `min` must be componentwise less than or equal to `max`. Constructors
/// uphold this; code building an `Aabb` literal is responsible for it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3<f64>,
    /// Maximum corner of the bounding box.
    pub max: Point3<f64>,
}

impl Aabb {
    /// Create a new AABB from minimum and maximum corners.
    #[must_use]
    pub const fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with the given half-extents.
    #[must_use]
    pub fn from_center(center: Point3<f64>, half_extents: Vector3<f64>) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Compute the bounding box of a triangle.
    #[must_use]
    pub fn from_triangle(triangle: &Triangle) -> Self {
        let mut aabb = Self::new(triangle.a, triangle.a);
        for p in [&triangle.b, &triangle.c] {
            aabb.min.x = aabb.min.x.min(p.x);
            aabb.min.y = aabb.min.y.min(p.y);
            aabb.min.z = aabb.min.z.min(p.z);
            aabb.max.x = aabb.max.x.max(p.x);
            aabb.max.y = aabb.max.y.max(p.y);
            aabb.max.z = aabb.max.z.max(p.z);
        }
        aabb
    }

    /// Compute the bounding box of a point set, or `None` for an empty set.
    #[must_use]
    pub fn from_points(points: &[Point3<f64>]) -> Option<Self> {
        let first = *points.first()?;
        let mut aabb = Self::new(first, first);
        for p in &points[1..] {
            aabb.min.x = aabb.min.x.min(p.x);
            aabb.min.y = aabb.min.y.min(p.y);
            aabb.min.z = aabb.min.z.min(p.z);
            aabb.max.x = aabb.max.x.max(p.x);
            aabb.max.y = aabb.max.y.max(p.y);
            aabb.max.z = aabb.max.z.max(p.z);
        }
        Some(aabb)
    }

    /// Center point of the box.
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    /// Half the extent of the box along each axis.
    #[must_use]
    pub fn half_extents(&self) -> Vector3<f64> {
        (self.max - self.min) * 0.5
    }

    /// Check if this AABB overlaps with another AABB.
    ///
    /// Boxes that merely touch on a face, edge, or corner count as
    /// overlapping.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Check if a point lies inside the box (boundary inclusive).
    #[must_use]
    pub fn contains_point(&self, point: &Point3<f64>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Expand this AABB by a margin on all sides.
    #[must_use]
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            min: Point3::new(
                self.min.x - margin,
                self.min.y - margin,
                self.min.z - margin,
            ),
            max: Point3::new(
                self.max.x + margin,
                self.max.y + margin,
                self.max.z + margin,
            ),
        }
    }

    /// The smallest box containing both `self` and `other`.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        Self {
            min: Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new(Point3::origin(), Point3::origin())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn overlapping_boxes_are_detected() {
        let a = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0));
        let b = Aabb::new(Point3::new(1.0, 1.0, 1.0), Point3::new(3.0, 3.0, 3.0));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn separated_boxes_do_not_overlap() {
        let a = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let b = Aabb::new(Point3::new(2.0, 0.0, 0.0), Point3::new(3.0, 1.0, 1.0));
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn touching_faces_count_as_overlap() {
        let a = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let b = Aabb::new(Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        assert!(a.overlaps(&b));
    }

    #[test]
    fn contains_point_is_boundary_inclusive() {
        let aabb = Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        assert!(aabb.contains_point(&Point3::origin()));
        assert!(aabb.contains_point(&Point3::new(1.0, 1.0, 1.0)));
        assert!(!aabb.contains_point(&Point3::new(1.0 + 1e-9, 0.0, 0.0)));
    }

    #[test]
    fn from_triangle_bounds_all_vertices() {
        let tri = Triangle::new(
            Point3::new(-1.0, 0.0, 2.0),
            Point3::new(3.0, -2.0, 0.0),
            Point3::new(0.0, 1.0, -1.0),
        );
        let aabb = Aabb::from_triangle(&tri);
        assert_relative_eq!(aabb.min.x, -1.0);
        assert_relative_eq!(aabb.min.y, -2.0);
        assert_relative_eq!(aabb.min.z, -1.0);
        assert_relative_eq!(aabb.max.x, 3.0);
        assert_relative_eq!(aabb.max.y, 1.0);
        assert_relative_eq!(aabb.max.z, 2.0);
        assert!(aabb.contains_point(&tri.a));
        assert!(aabb.contains_point(&tri.b));
        assert!(aabb.contains_point(&tri.c));
    }

    #[test]
    fn from_points_of_empty_slice_is_none() {
        assert!(Aabb::from_points(&[]).is_none());
    }

    #[test]
    fn from_points_bounds_the_set() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(-2.0, 5.0, 1.0),
            Point3::new(3.0, -1.0, -4.0),
        ];
        let aabb = Aabb::from_points(&points).unwrap();
        for p in &points {
            assert!(aabb.contains_point(p));
        }
        assert_relative_eq!(aabb.min.z, -4.0);
        assert_relative_eq!(aabb.max.y, 5.0);
    }

    #[test]
    fn merged_covers_both_inputs() {
        let a = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let b = Aabb::new(Point3::new(-3.0, 0.5, 0.0), Point3::new(0.5, 2.0, 0.5));
        let merged = a.merged(&b);
        assert!(merged.contains_point(&a.min));
        assert!(merged.contains_point(&a.max));
        assert!(merged.contains_point(&b.min));
        assert!(merged.contains_point(&b.max));
    }

    #[test]
    fn expanded_grows_in_every_direction() {
        let aabb = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let grown = aabb.expanded(0.5);
        assert_relative_eq!(grown.min.x, -0.5);
        assert_relative_eq!(grown.max.y, 1.5);
    }

    #[test]
    fn center_and_half_extents_round_trip() {
        let center = Point3::new(1.0, -2.0, 3.0);
        let half = Vector3::new(0.5, 1.5, 2.5);
        let aabb = Aabb::from_center(center, half);
        assert_relative_eq!(aabb.center(), center);
        assert_relative_eq!(aabb.half_extents(), half);
    }
}

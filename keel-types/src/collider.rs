//! Collider descriptions.
//!
//! A [`Collider`] binds a [`ColliderShape`] to at most one rigid body in
//! the slice handed to the physics step. A collider with no body is
//! static world geometry; mesh shapes are additionally baked into the
//! octree at load time and never re-tested per frame.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Geometric shape of a collider.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ColliderShape {
    /// Sphere with a local-space center offset from the body origin.
    Sphere {
        /// Sphere radius in meters.
        radius: f64,
        /// Center offset from the body origin, local coordinates.
        offset: Vector3<f64>,
    },
    /// Capsule: the Minkowski sum of a segment and a sphere.
    Capsule {
        /// First endpoint of the inner segment, local coordinates.
        a: Point3<f64>,
        /// Second endpoint of the inner segment, local coordinates.
        b: Point3<f64>,
        /// Capsule radius in meters.
        radius: f64,
    },
    /// Box with half-extents, collided as a convex polytope.
    Box {
        /// Half-extents along each local axis.
        half_extents: Vector3<f64>,
    },
    /// Indexed triangle mesh. Static only: baked into the octree once at
    /// load time (see `PhysicsWorld::add_mesh_indexed`).
    Mesh {
        /// Mesh vertices.
        vertices: Vec<Point3<f64>>,
        /// Triangle indices, three per triangle.
        indices: Vec<usize>,
    },
}

/// A shape attached to a body (or to the static world).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Collider {
    /// The collider's geometry.
    pub shape: ColliderShape,
    /// Index of the owning body in the slice passed to the step, or
    /// `None` for static world geometry.
    pub body: Option<usize>,
}

impl Collider {
    /// Create a collider attached to the body at `body_index`.
    #[must_use]
    pub fn new(shape: ColliderShape, body_index: usize) -> Self {
        Self {
            shape,
            body: Some(body_index),
        }
    }

    /// Create a static collider (not bound to any body).
    #[must_use]
    pub fn fixed(shape: ColliderShape) -> Self {
        Self { shape, body: None }
    }

    /// Sphere collider centered on the body origin.
    #[must_use]
    pub fn sphere(radius: f64, body_index: usize) -> Self {
        Self::new(
            ColliderShape::Sphere {
                radius,
                offset: Vector3::zeros(),
            },
            body_index,
        )
    }

    /// Capsule collider from local segment endpoints.
    #[must_use]
    pub fn capsule(a: Point3<f64>, b: Point3<f64>, radius: f64, body_index: usize) -> Self {
        Self::new(ColliderShape::Capsule { a, b, radius }, body_index)
    }

    /// Box collider from half-extents.
    #[must_use]
    pub fn cuboid(half_extents: Vector3<f64>, body_index: usize) -> Self {
        Self::new(ColliderShape::Box { half_extents }, body_index)
    }

    /// Validate shape parameters at creation time.
    pub fn validate(&self) -> crate::Result<()> {
        match &self.shape {
            ColliderShape::Sphere { radius, offset } => {
                if !radius.is_finite() || *radius <= 0.0 {
                    return Err(crate::SimError::invalid_geometry(
                        "sphere radius must be positive and finite",
                    ));
                }
                if !offset.iter().all(|x| x.is_finite()) {
                    return Err(crate::SimError::invalid_geometry(
                        "sphere offset must be finite",
                    ));
                }
            }
            ColliderShape::Capsule { a, b, radius } => {
                if !radius.is_finite() || *radius <= 0.0 {
                    return Err(crate::SimError::invalid_geometry(
                        "capsule radius must be positive and finite",
                    ));
                }
                let finite = a.coords.iter().all(|x| x.is_finite())
                    && b.coords.iter().all(|x| x.is_finite());
                if !finite {
                    return Err(crate::SimError::invalid_geometry(
                        "capsule endpoints must be finite",
                    ));
                }
            }
            ColliderShape::Box { half_extents } => {
                if half_extents.iter().any(|&h| !h.is_finite() || h <= 0.0) {
                    return Err(crate::SimError::invalid_geometry(
                        "box half-extents must be positive and finite",
                    ));
                }
            }
            ColliderShape::Mesh { vertices, indices } => {
                if indices.len() % 3 != 0 {
                    return Err(crate::SimError::invalid_geometry(
                        "mesh indices must come in groups of three",
                    ));
                }
                if let Some(&bad) = indices.iter().find(|&&i| i >= vertices.len()) {
                    return Err(crate::SimError::invalid_geometry(format!(
                        "mesh index {bad} out of bounds ({} vertices)",
                        vertices.len()
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let c = Collider::sphere(0.5, 3);
        assert_eq!(c.body, Some(3));
        assert!(c.validate().is_ok());

        let c = Collider::fixed(ColliderShape::Box {
            half_extents: Vector3::new(1.0, 1.0, 1.0),
        });
        assert_eq!(c.body, None);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_shapes() {
        let c = Collider::sphere(-1.0, 0);
        assert!(c.validate().is_err());

        let c = Collider::cuboid(Vector3::new(1.0, 0.0, 1.0), 0);
        assert!(c.validate().is_err());

        let c = Collider::capsule(Point3::origin(), Point3::new(0.0, 1.0, 0.0), 0.0, 0);
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_mesh_validation() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];

        let good = Collider::fixed(ColliderShape::Mesh {
            vertices: vertices.clone(),
            indices: vec![0, 1, 2],
        });
        assert!(good.validate().is_ok());

        let ragged = Collider::fixed(ColliderShape::Mesh {
            vertices: vertices.clone(),
            indices: vec![0, 1],
        });
        assert!(ragged.validate().is_err());

        let out_of_bounds = Collider::fixed(ColliderShape::Mesh {
            vertices,
            indices: vec![0, 1, 9],
        });
        assert!(out_of_bounds.validate().is_err());
    }
}

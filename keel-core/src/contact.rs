//! Narrow-phase contact generation.
//!
//! Turns collider geometry into [`Contact`] points for the solver.
//! Spheres and capsules collide against the baked triangle mesh through
//! the octree; analytic sphere-sphere and polytope box-box routines
//! cover the dynamic pairs. Contact normals always point from body B
//! toward body A, the direction that pushes A out of B.

use nalgebra::{Point3, UnitQuaternion, Vector3};
use tracing::{debug, trace};

use keel_types::{Collider, ColliderShape, Result, Rigidbody, SimError};

use crate::aabb::Aabb;
use crate::octree::Octree;
use crate::polytope::ConvexPolytope;
use crate::primitives::{capsule_triangle, safe_normalize, sphere_triangle, TriangleContact};
use crate::vclip::{vclip, VClipStatus};

/// A single narrow-phase contact point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Body on the pushed-out side, or `None` for static geometry.
    pub body_a: Option<usize>,
    /// Body on the other side, or `None` for static geometry.
    pub body_b: Option<usize>,
    /// World-space contact point.
    pub point: Point3<f64>,
    /// Unit normal pointing from B toward A.
    pub normal: Vector3<f64>,
    /// Penetration depth, positive while overlapping.
    pub depth: f64,
}

/// A collider resolved to world space against the current body slice.
enum WorldShape {
    Sphere {
        center: Point3<f64>,
        radius: f64,
    },
    Capsule {
        a: Point3<f64>,
        b: Point3<f64>,
        radius: f64,
    },
    Box {
        position: Point3<f64>,
        rotation: UnitQuaternion<f64>,
        half_extents: Vector3<f64>,
    },
    Mesh,
}

impl WorldShape {
    fn label(&self) -> &'static str {
        match self {
            WorldShape::Sphere { .. } => "sphere",
            WorldShape::Capsule { .. } => "capsule",
            WorldShape::Box { .. } => "box",
            WorldShape::Mesh => "mesh",
        }
    }
}

fn resolve(collider: &Collider, bodies: &[Rigidbody]) -> Result<WorldShape> {
    let (position, rotation) = match collider.body {
        Some(index) => {
            let body = bodies.get(index).ok_or(SimError::BodyIndexOutOfRange {
                index,
                len: bodies.len(),
            })?;
            (body.position, body.world_rotation())
        }
        None => (Point3::origin(), UnitQuaternion::identity()),
    };

    Ok(match &collider.shape {
        ColliderShape::Sphere { radius, offset } => WorldShape::Sphere {
            center: position + rotation * offset,
            radius: *radius,
        },
        ColliderShape::Capsule { a, b, radius } => WorldShape::Capsule {
            a: position + rotation * a.coords,
            b: position + rotation * b.coords,
            radius: *radius,
        },
        ColliderShape::Box { half_extents } => WorldShape::Box {
            position,
            rotation,
            half_extents: *half_extents,
        },
        ColliderShape::Mesh { .. } => WorldShape::Mesh,
    })
}

/// Generate contacts for every collider against the static mesh and
/// every collider pair with a supported narrow-phase routine.
///
/// Mesh contacts are capped per collider at `max_contacts_per_collider`,
/// keeping the deepest.
pub fn generate_contacts(
    bodies: &[Rigidbody],
    colliders: &[Collider],
    octree: &Octree,
    max_contacts_per_collider: usize,
) -> Result<Vec<Contact>> {
    let shapes = colliders
        .iter()
        .map(|c| resolve(c, bodies))
        .collect::<Result<Vec<_>>>()?;

    let mut contacts = Vec::new();

    // Dynamic shapes against the baked triangle mesh.
    for (collider, shape) in colliders.iter().zip(&shapes) {
        let Some(body_index) = collider.body else {
            continue;
        };
        let mut found = match shape {
            WorldShape::Sphere { center, radius } => sphere_mesh(octree, center, *radius),
            WorldShape::Capsule { a, b, radius } => capsule_mesh(octree, a, b, *radius),
            WorldShape::Box { .. } | WorldShape::Mesh => Vec::new(),
        };
        if found.len() > max_contacts_per_collider {
            found.sort_unstable_by(|x, y| y.depth.total_cmp(&x.depth));
            found.truncate(max_contacts_per_collider);
        }
        contacts.extend(found.into_iter().map(|c| Contact {
            body_a: Some(body_index),
            body_b: None,
            point: c.point,
            normal: c.normal,
            depth: c.depth,
        }));
    }

    // Collider pairs. Static-static pairs cannot produce an impulse and
    // are skipped outright.
    for i in 0..colliders.len() {
        for j in (i + 1)..colliders.len() {
            if colliders[i].body.is_none() && colliders[j].body.is_none() {
                continue;
            }
            let pair = collide_pair(
                &shapes[i],
                colliders[i].body,
                &shapes[j],
                colliders[j].body,
            )?;
            if let Some(contact) = pair {
                contacts.push(contact);
            }
        }
    }

    debug!(
        "narrow phase: {} contacts from {} colliders",
        contacts.len(),
        colliders.len()
    );
    Ok(contacts)
}

fn collide_pair(
    shape_a: &WorldShape,
    body_a: Option<usize>,
    shape_b: &WorldShape,
    body_b: Option<usize>,
) -> Result<Option<Contact>> {
    match (shape_a, shape_b) {
        (
            WorldShape::Sphere {
                center: center_a,
                radius: radius_a,
            },
            WorldShape::Sphere {
                center: center_b,
                radius: radius_b,
            },
        ) => Ok(sphere_sphere(
            center_a, *radius_a, center_b, *radius_b, body_a, body_b,
        )),
        (
            WorldShape::Box {
                position: pos_a,
                rotation: rot_a,
                half_extents: he_a,
            },
            WorldShape::Box {
                position: pos_b,
                rotation: rot_b,
                half_extents: he_b,
            },
        ) => box_box(
            (pos_a, rot_a, he_a),
            (pos_b, rot_b, he_b),
            body_a,
            body_b,
        ),
        (WorldShape::Mesh, _) | (_, WorldShape::Mesh) => Ok(None),
        (a, b) => {
            trace!(
                "no narrow-phase routine for {} against {}",
                a.label(),
                b.label()
            );
            Ok(None)
        }
    }
}

fn sphere_mesh(octree: &Octree, center: &Point3<f64>, radius: f64) -> Vec<TriangleContact> {
    let bounds = Aabb::from_center(*center, Vector3::repeat(radius));
    let mut found = Vec::new();
    for triangle in octree.query_aabb(&bounds) {
        if let Some(contact) =
            sphere_triangle(*center, radius, triangle.a, triangle.b, triangle.c, false)
        {
            found.push(contact);
        }
    }
    found
}

fn capsule_mesh(
    octree: &Octree,
    a: &Point3<f64>,
    b: &Point3<f64>,
    radius: f64,
) -> Vec<TriangleContact> {
    let Some(bounds) = Aabb::from_points(&[*a, *b]) else {
        return Vec::new();
    };
    let bounds = bounds.expanded(radius);
    let mut found = Vec::new();
    for triangle in octree.query_aabb(&bounds) {
        if let Some(contact) =
            capsule_triangle(*a, *b, radius, triangle.a, triangle.b, triangle.c, false)
        {
            found.push(contact);
        }
    }
    found
}

fn sphere_sphere(
    center_a: &Point3<f64>,
    radius_a: f64,
    center_b: &Point3<f64>,
    radius_b: f64,
    body_a: Option<usize>,
    body_b: Option<usize>,
) -> Option<Contact> {
    let delta = center_a - center_b;
    let distance = delta.norm();
    let total = radius_a + radius_b;
    if distance >= total {
        return None;
    }

    // Concentric spheres have no preferred direction; push up.
    let normal = safe_normalize(&delta, Vector3::y());
    let surface_a = center_a - normal * radius_a;
    let surface_b = center_b + normal * radius_b;
    Some(Contact {
        body_a,
        body_b,
        point: Point3::from((surface_a.coords + surface_b.coords) * 0.5),
        normal,
        depth: total - distance,
    })
}

fn box_box(
    a: (&Point3<f64>, &UnitQuaternion<f64>, &Vector3<f64>),
    b: (&Point3<f64>, &UnitQuaternion<f64>, &Vector3<f64>),
    body_a: Option<usize>,
    body_b: Option<usize>,
) -> Result<Option<Contact>> {
    let mut poly_a = ConvexPolytope::cuboid(*a.2)?;
    poly_a.set_pose(*a.0, *a.1);
    let mut poly_b = ConvexPolytope::cuboid(*b.2)?;
    poly_b.set_pose(*b.0, *b.1);

    let result = vclip(&poly_a, &poly_b)?;
    match result.status {
        VClipStatus::Penetrating {
            depth,
            point,
            normal,
        } => Ok(Some(Contact {
            body_a,
            body_b,
            point,
            normal,
            depth,
        })),
        VClipStatus::Separated { .. } => Ok(None),
    }
}

//! Physics simulation core: broad-phase octree, narrow-phase geometry,
//! V-Clip closest features, and the rigid-body stepping pipeline.
//!
//! This crate is the engine half of the keel workspace. It builds on
//! [`keel_types`] for the shared data types and on [`keel_constraint`]
//! for the sequential-impulse solver.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        PhysicsWorld                          │
//! │  Owns: octree over the static mesh, config, coupling rows    │
//! │  step(): contacts → force fold → solve → pose advance        │
//! └───────┬──────────────────┬──────────────────┬────────────────┘
//!         │                  │                  │
//!         ▼                  ▼                  ▼
//! ┌───────────────┐  ┌────────────────┐  ┌────────────────────────┐
//! │  Broad phase  │  │  Narrow phase  │  │  Solve and integrate   │
//! │  octree AABB  │  │ sphere/capsule │  │  keel-constraint rows, │
//! │  and ray      │  │ vs mesh;       │  │  semi-implicit Euler   │
//! │  queries      │  │ V-Clip for     │  │  in two halves around  │
//! │               │  │ box vs box     │  │  the solver            │
//! └───────────────┘  └────────────────┘  └────────────────────────┘
//! ```
//!
//! Bodies are owned by the caller, not the world: each frame hands a
//! `&mut [Rigidbody]` plus a collider list to [`PhysicsWorld::step`]
//! and reads the updated transforms back afterwards.
//!
//! # Quick Start
//!
//! ```
//! use keel_core::{PhysicsWorld, Triangle};
//! use keel_types::{Collider, Rigidbody};
//! use nalgebra::{Point3, Vector3};
//!
//! let mut world = PhysicsWorld::default();
//!
//! // A floor quad at y = 0, wound so the normals face up.
//! world.add_mesh(&[
//!     Triangle::new(
//!         Point3::new(-10.0, 0.0, -10.0),
//!         Point3::new(10.0, 0.0, 10.0),
//!         Point3::new(10.0, 0.0, -10.0),
//!     ),
//!     Triangle::new(
//!         Point3::new(-10.0, 0.0, -10.0),
//!         Point3::new(-10.0, 0.0, 10.0),
//!         Point3::new(10.0, 0.0, 10.0),
//!     ),
//! ]);
//!
//! // Drop a unit-mass sphere from two meters.
//! let mut bodies = vec![Rigidbody::sphere(Point3::new(0.0, 2.0, 0.0), 1.0, 0.5)];
//! let colliders = vec![Collider::sphere(0.5, 0)];
//!
//! for _ in 0..300 {
//!     world.step(&mut bodies, &colliders, 1.0 / 60.0).unwrap();
//! }
//!
//! // Resting on its radius.
//! assert!((bodies[0].position.y - 0.5).abs() < 0.01);
//!
//! // The baked mesh answers raycast queries too.
//! let hit = world
//!     .raycast(Point3::new(0.0, 5.0, 0.0), &Vector3::new(0.0, -1.0, 0.0))
//!     .unwrap();
//! assert!((hit.distance - 5.0).abs() < 1e-9);
//! ```
//!
//! # Closest Features
//!
//! The V-Clip walk is exposed directly for callers that want distances
//! and witness points rather than contacts:
//!
//! ```
//! use keel_core::{vclip, ConvexPolytope};
//! use nalgebra::{Point3, UnitQuaternion, Vector3};
//!
//! let mut a = ConvexPolytope::cuboid(Vector3::new(1.0, 1.0, 1.0)).unwrap();
//! let mut b = ConvexPolytope::cuboid(Vector3::new(1.0, 1.0, 1.0)).unwrap();
//! a.set_pose(Point3::origin(), UnitQuaternion::identity());
//! b.set_pose(Point3::new(0.0, 4.0, 0.0), UnitQuaternion::identity());
//!
//! let result = vclip(&a, &b).unwrap();
//! assert!(!result.is_penetrating());
//! assert!((result.distance() - 2.0).abs() < 1e-9);
//! ```
//!
//! # Error Handling
//!
//! Numerical degeneracy (near-zero denominators, non-finite impulses)
//! is absorbed locally: the primitive returns `None` or the solver
//! skips the row, a warning is logged, and the simulation continues.
//! Invalid geometry (open or non-convex polytopes, walks that cannot
//! make progress) is fatal for that query and surfaces as a
//! [`SimError`]. Zero or negative mass is a caller contract violation
//! that propagates `inf`/`NaN` instead of being checked per step;
//! `Rigidbody::validate` exists for creation-time hardening.

#![doc(html_root_url = "https://docs.rs/keel-core/0.4.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,      // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,        // Error docs added where non-obvious
    clippy::neg_cmp_op_on_partial_ord, // !(x >= eps) intentionally rejects NaN
)]

mod aabb;
mod contact;
mod integrator;
mod octree;
mod polytope;
mod primitives;
mod vclip;
mod world;

pub use aabb::Aabb;
pub use contact::{generate_contacts, Contact};
pub use integrator::{clamp_velocities, integrate, integrate_forces, integrate_positions};
pub use octree::{aabb_intersects_triangle, Octree, DEFAULT_MAX_DEPTH};
pub use polytope::{ConvexPolytope, EdgeId, FaceId, VertexId};
pub use primitives::{
    capsule_triangle, closest_point_on_aabb, closest_point_on_plane, closest_point_on_segment,
    closest_point_on_triangle, ray_aabb, ray_plane, ray_sphere, ray_triangle, safe_normalize,
    sphere_triangle, RayTriangleHit, Triangle, TriangleContact, GEOM_EPSILON,
};
pub use vclip::{vclip, vclip_from, Feature, VClipResult, VClipStatus};
pub use world::{PhysicsWorld, RaycastHit, StepSummary};

// Re-export the solver surface and shared types for convenience
pub use keel_constraint::{Constraint, Jacobian, SequentialImpulseSolver, SolverStats};
pub use keel_types::{
    Collider, ColliderShape, Result, Rigidbody, SimError, SimulationConfig, SolverConfig,
};

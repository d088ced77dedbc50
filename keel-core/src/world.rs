//! The physics world: baked static geometry, raycasts, and the step
//! orchestrator.
//!
//! [`PhysicsWorld`] owns what persists between frames (the octree over
//! the static triangle mesh, the configuration, registered coupling
//! rows). Rigid bodies do not live here: the caller owns them and hands
//! a `&mut [Rigidbody]` to each [`step`](PhysicsWorld::step), reading
//! the updated transforms back afterwards.
//!
//! One step runs the pipeline in a fixed order: validate inputs,
//! generate contacts against the pre-step poses, fold gravity and
//! accumulated forces into velocities, solve all constraint rows, then
//! advance poses from the corrected velocities. The force fold sits
//! between contact generation and the solve so resting contacts settle
//! at zero penetration instead of a gravity-rate offset.

use nalgebra::{Point3, Vector3};
use tracing::{debug, info};

use keel_constraint::{Constraint, SequentialImpulseSolver};
use keel_types::{Collider, Result, Rigidbody, SimError, SimulationConfig};

use crate::contact::generate_contacts;
use crate::integrator::{clamp_velocities, integrate_forces, integrate_positions};
use crate::octree::Octree;
use crate::primitives::{ray_triangle, Triangle, GEOM_EPSILON};

/// A raycast hit against the baked static mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// World-space hit point.
    pub point: Point3<f64>,
    /// Surface normal at the hit, flipped when needed to face the ray
    /// origin.
    pub normal: Vector3<f64>,
    /// Distance from the ray origin to the hit, in world units.
    pub distance: f64,
}

/// Per-step diagnostics returned by [`PhysicsWorld::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepSummary {
    /// Narrow-phase contacts generated this step.
    pub contacts: usize,
    /// Constraint rows handed to the solver (contacts plus couplings).
    pub constraints: usize,
    /// Non-finite impulses the solver discarded, counted per pass.
    pub discarded_impulses: usize,
}

/// Owner of the static collision geometry and the frame stepper.
#[derive(Debug, Clone)]
pub struct PhysicsWorld {
    config: SimulationConfig,
    octree: Octree,
    triangles: Vec<Triangle>,
    couplings: Vec<Constraint>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self {
            config: SimulationConfig::default(),
            octree: Octree::build_from_mesh(&[]),
            triangles: Vec::new(),
            couplings: Vec::new(),
        }
    }
}

impl PhysicsWorld {
    /// Create a world with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the configuration fails
    /// [`SimulationConfig::validate`].
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Number of triangles baked into the static mesh.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Bake triangles into the static collision mesh.
    ///
    /// The octree is rebuilt over everything added so far, so this
    /// belongs at load time, not in the frame loop.
    pub fn add_mesh(&mut self, triangles: &[Triangle]) {
        self.triangles.extend_from_slice(triangles);
        self.octree = Octree::build_from_mesh(&self.triangles);
        info!(
            "baked {} triangles into the static mesh ({} total)",
            triangles.len(),
            self.triangles.len()
        );
    }

    /// Bake an indexed triangle list, the `ColliderShape::Mesh` layout.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGeometry` when `indices` is not a whole number of
    /// triangles or references a vertex out of range; nothing is baked
    /// on failure.
    pub fn add_mesh_indexed(
        &mut self,
        vertices: &[Point3<f64>],
        indices: &[usize],
    ) -> Result<()> {
        if indices.len() % 3 != 0 {
            return Err(SimError::invalid_geometry(
                "mesh indices must come in groups of three",
            ));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i >= vertices.len()) {
            return Err(SimError::invalid_geometry(format!(
                "mesh index {bad} out of bounds ({} vertices)",
                vertices.len()
            )));
        }

        let triangles: Vec<Triangle> = indices
            .chunks_exact(3)
            .map(|tri| Triangle::new(vertices[tri[0]], vertices[tri[1]], vertices[tri[2]]))
            .collect();
        self.add_mesh(&triangles);
        Ok(())
    }

    /// Register a constraint row solved alongside contacts every step.
    ///
    /// The row is copied into each solve with a cleared impulse
    /// accumulator. A coupling naming a body index beyond the slice
    /// handed to [`step`](Self::step) is skipped by the solver rather
    /// than treated as an error, so couplings can outlive a shrinking
    /// body list.
    pub fn add_coupling(&mut self, coupling: Constraint) {
        self.couplings.push(coupling);
    }

    /// Drop all registered couplings.
    pub fn clear_couplings(&mut self) {
        self.couplings.clear();
    }

    /// Cast a ray against the baked static mesh.
    ///
    /// `dir` need not be normalized; the returned `distance` is measured
    /// in world units along the normalized direction, and the normal is
    /// flipped when needed to face the ray origin. Returns `None` on a
    /// miss or for a zero or non-finite direction.
    #[must_use]
    pub fn raycast(&self, origin: Point3<f64>, dir: &Vector3<f64>) -> Option<RaycastHit> {
        let length = dir.norm();
        if !(length > GEOM_EPSILON) {
            return None;
        }
        let unit = dir / length;

        let mut nearest: Option<RaycastHit> = None;
        for triangle in self.octree.query_ray(origin, &unit) {
            let Some(hit) = ray_triangle(origin, &unit, triangle.a, triangle.b, triangle.c)
            else {
                continue;
            };
            if nearest.is_some_and(|best| best.distance <= hit.distance) {
                continue;
            }
            let Some(normal) = triangle.normal() else {
                continue;
            };
            let normal = if normal.dot(&unit) > 0.0 { -normal } else { normal };
            nearest = Some(RaycastHit {
                point: hit.point,
                normal,
                distance: hit.distance,
            });
        }
        nearest
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// Phases, strictly ordered: validate inputs, generate contacts
    /// against the pre-step poses, fold gravity and accumulated forces
    /// into velocities, build and solve the constraint rows, then clamp
    /// velocities, advance poses, and renormalize orientations.
    ///
    /// # Errors
    ///
    /// `InvalidTimestep` for a non-positive or non-finite `dt`;
    /// `BodyIndexOutOfRange` when a collider names a body outside
    /// `bodies`; narrow-phase geometry errors propagate as-is. All
    /// errors return before the first body mutation.
    pub fn step(
        &mut self,
        bodies: &mut [Rigidbody],
        colliders: &[Collider],
        dt: f64,
    ) -> Result<StepSummary> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimError::InvalidTimestep(dt));
        }
        for collider in colliders {
            if let Some(index) = collider.body {
                if index >= bodies.len() {
                    return Err(SimError::BodyIndexOutOfRange {
                        index,
                        len: bodies.len(),
                    });
                }
            }
        }

        let contacts = generate_contacts(
            bodies,
            colliders,
            &self.octree,
            self.config.max_contacts_per_collider,
        )?;

        for body in bodies.iter_mut() {
            integrate_forces(body, &self.config.gravity, dt);
        }

        let mut rows = Vec::with_capacity(contacts.len() + self.couplings.len());
        for contact in &contacts {
            let r_a = match contact.body_a {
                Some(i) => contact.point - bodies[i].com_world(),
                None => Vector3::zeros(),
            };
            let r_b = match contact.body_b {
                Some(i) => contact.point - bodies[i].com_world(),
                None => Vector3::zeros(),
            };
            rows.push(Constraint::contact(
                contact.body_a,
                contact.body_b,
                contact.point,
                contact.normal,
                contact.depth,
                r_a,
                r_b,
            ));
        }
        for coupling in &self.couplings {
            rows.push(Constraint {
                lambda_accumulated: 0.0,
                ..*coupling
            });
        }

        let solver = SequentialImpulseSolver::new(self.config.solver);
        let stats = solver.solve(&mut rows, bodies, dt);

        for body in bodies.iter_mut() {
            clamp_velocities(
                body,
                self.config.max_linear_velocity,
                self.config.max_angular_velocity,
            );
            integrate_positions(body, dt);
            body.normalize_orientation();
        }

        debug!(
            "step: {} contacts, {} rows, {} impulses discarded",
            contacts.len(),
            stats.constraints,
            stats.discarded
        );

        Ok(StepSummary {
            contacts: contacts.len(),
            constraints: stats.constraints,
            discarded_impulses: stats.discarded,
        })
    }
}

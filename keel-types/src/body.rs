//! Rigid body state.
//!
//! [`Rigidbody`] is the unit of dynamic state: linear and angular motion,
//! force/torque accumulators, and the mass properties the integrator and
//! solver read. Bodies are owned by the caller (typically a scene graph
//! entity) and lent to the physics step as a mutable slice; nothing in
//! this crate stores them.
//!
//! The inertia model is deliberately reduced: a diagonal inertia vector
//! interpreted along world axes (principal axes assumed world-aligned).
//! This trades gyroscopic fidelity for a branch-free integrator and is
//! sufficient for the gameplay-style dynamics this engine targets.

use nalgebra::{Point3, Quaternion, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A rigid body with reduced (diagonal) inertia.
///
/// # Orientation representation
///
/// `orientation` is a raw quaternion, not a unit quaternion: the
/// integrator accumulates the first-order derivative `dt/2 · ω ⊗ q`
/// without renormalizing, so the stored value drifts slightly off unit
/// length between renormalizations. Call [`Rigidbody::normalize_orientation`]
/// periodically (the step orchestrator does this once per step) and use
/// [`Rigidbody::world_rotation`] when a unit rotation is required.
///
/// # Example
///
/// ```
/// use keel_types::Rigidbody;
/// use nalgebra::{Point3, Vector3};
///
/// let mut body = Rigidbody::sphere(Point3::new(0.0, 5.0, 0.0), 1.0, 0.5);
/// body.add_force(Vector3::new(10.0, 0.0, 0.0));
/// assert_eq!(body.force.x, 10.0);
/// body.clear_accumulators();
/// assert_eq!(body.force.x, 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rigidbody {
    /// Position of the body origin in world coordinates.
    pub position: Point3<f64>,
    /// Linear velocity (m/s).
    pub velocity: Vector3<f64>,
    /// Accumulated force for the current step (N). Cleared by integration.
    pub force: Vector3<f64>,
    /// Orientation as a raw (drifting) quaternion. See the type docs.
    pub orientation: Quaternion<f64>,
    /// Angular velocity (rad/s), world frame.
    pub angular_velocity: Vector3<f64>,
    /// Accumulated torque for the current step (N·m). Cleared by integration.
    pub torque: Vector3<f64>,
    /// Mass (kg). Must be positive for every body handed to the step;
    /// zero or negative mass propagates `inf`/`NaN` through integration.
    pub mass: f64,
    /// Diagonal inertia (kg·m²), principal axes assumed world-aligned.
    pub inertia: Vector3<f64>,
    /// Center-of-mass offset from the body origin, local coordinates.
    pub com_offset: Vector3<f64>,
    /// Per-body gravity multiplier (1 = full gravity, 0 = none).
    pub gravity_scale: f64,
}

impl Rigidbody {
    /// Create a body at rest with explicit mass and diagonal inertia.
    #[must_use]
    pub fn new(position: Point3<f64>, mass: f64, inertia: Vector3<f64>) -> Self {
        Self {
            position,
            velocity: Vector3::zeros(),
            force: Vector3::zeros(),
            orientation: Quaternion::identity(),
            angular_velocity: Vector3::zeros(),
            torque: Vector3::zeros(),
            mass,
            inertia,
            com_offset: Vector3::zeros(),
            gravity_scale: 1.0,
        }
    }

    /// Create a body with the inertia of a solid sphere: I = (2/5)·m·r².
    #[must_use]
    pub fn sphere(position: Point3<f64>, mass: f64, radius: f64) -> Self {
        let i = 0.4 * mass * radius * radius;
        Self::new(position, mass, Vector3::new(i, i, i))
    }

    /// Create a body with the inertia of a solid box.
    ///
    /// For full dimensions (x, y, z) = 2·`half_extents`:
    /// Ixx = m(y² + z²)/12, Iyy = m(x² + z²)/12, Izz = m(x² + y²)/12.
    #[must_use]
    pub fn cuboid(position: Point3<f64>, mass: f64, half_extents: Vector3<f64>) -> Self {
        let x2 = 4.0 * half_extents.x * half_extents.x;
        let y2 = 4.0 * half_extents.y * half_extents.y;
        let z2 = 4.0 * half_extents.z * half_extents.z;
        let inertia = Vector3::new(
            mass * (y2 + z2) / 12.0,
            mass * (x2 + z2) / 12.0,
            mass * (x2 + y2) / 12.0,
        );
        Self::new(position, mass, inertia)
    }

    /// Set the initial linear velocity.
    #[must_use]
    pub fn with_velocity(mut self, velocity: Vector3<f64>) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set the initial orientation.
    #[must_use]
    pub fn with_orientation(mut self, orientation: UnitQuaternion<f64>) -> Self {
        self.orientation = *orientation.quaternion();
        self
    }

    /// Set the center-of-mass offset (local coordinates).
    #[must_use]
    pub fn with_com_offset(mut self, com_offset: Vector3<f64>) -> Self {
        self.com_offset = com_offset;
        self
    }

    /// Set the gravity scale.
    #[must_use]
    pub fn with_gravity_scale(mut self, gravity_scale: f64) -> Self {
        self.gravity_scale = gravity_scale;
        self
    }

    /// Inverse mass. Zero or negative mass yields `inf`, which the
    /// solver's non-finite guard absorbs downstream.
    #[must_use]
    pub fn inverse_mass(&self) -> f64 {
        1.0 / self.mass
    }

    /// Componentwise inverse of the diagonal inertia.
    #[must_use]
    pub fn inverse_inertia(&self) -> Vector3<f64> {
        Vector3::new(
            1.0 / self.inertia.x,
            1.0 / self.inertia.y,
            1.0 / self.inertia.z,
        )
    }

    /// Orientation as a unit rotation (normalizes the stored quaternion).
    #[must_use]
    pub fn world_rotation(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_quaternion(self.orientation)
    }

    /// Center of mass in world coordinates.
    #[must_use]
    pub fn com_world(&self) -> Point3<f64> {
        self.position + self.world_rotation() * self.com_offset
    }

    /// Renormalize the orientation quaternion to counter integration drift.
    pub fn normalize_orientation(&mut self) {
        self.orientation.normalize_mut();
    }

    /// Accumulate a force through the center of mass.
    pub fn add_force(&mut self, force: Vector3<f64>) {
        self.force += force;
    }

    /// Accumulate a torque.
    pub fn add_torque(&mut self, torque: Vector3<f64>) {
        self.torque += torque;
    }

    /// Accumulate a force applied at a world-space point, inducing torque
    /// about the center of mass.
    pub fn add_force_at_point(&mut self, force: Vector3<f64>, world_point: Point3<f64>) {
        self.force += force;
        self.torque += (world_point - self.com_world()).cross(&force);
    }

    /// Clear the force and torque accumulators.
    pub fn clear_accumulators(&mut self) {
        self.force = Vector3::zeros();
        self.torque = Vector3::zeros();
    }

    /// Velocity of a world-space point rigidly attached to the body:
    /// `v + ω × (p - com)`.
    #[must_use]
    pub fn point_velocity(&self, world_point: Point3<f64>) -> Vector3<f64> {
        self.velocity + self.angular_velocity.cross(&(world_point - self.com_world()))
    }

    /// Apply an instantaneous impulse at a world-space point.
    ///
    /// `v += j/m` and `ω += ((p - com) × j)` scaled componentwise by the
    /// diagonal inverse inertia.
    pub fn add_impulse_at_point(&mut self, impulse: Vector3<f64>, world_point: Point3<f64>) {
        self.velocity += impulse * self.inverse_mass();
        let angular = (world_point - self.com_world()).cross(&impulse);
        self.angular_velocity += angular.component_mul(&self.inverse_inertia());
    }

    /// Check that every scalar in the body state is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.velocity.iter().all(|x| x.is_finite())
            && self.orientation.coords.iter().all(|x| x.is_finite())
            && self.angular_velocity.iter().all(|x| x.is_finite())
    }

    /// Validate mass properties at creation time.
    ///
    /// The hot path does not re-check these (zero mass propagates
    /// `inf`/`NaN` by design); careful callers validate once up front.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.mass.is_finite() || self.mass <= 0.0 {
            return Err(crate::SimError::invalid_body(
                "mass must be positive and finite",
            ));
        }

        if self.inertia.iter().any(|&i| !i.is_finite() || i <= 0.0) {
            return Err(crate::SimError::invalid_body(
                "inertia components must be positive and finite",
            ));
        }

        if !self.com_offset.iter().all(|x| x.is_finite()) {
            return Err(crate::SimError::invalid_body(
                "center-of-mass offset must be finite",
            ));
        }

        if !self.gravity_scale.is_finite() {
            return Err(crate::SimError::invalid_body(
                "gravity scale must be finite",
            ));
        }

        if !self.is_finite() {
            return Err(crate::SimError::invalid_body(
                "body state contains non-finite values",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sphere_inertia() {
        let body = Rigidbody::sphere(Point3::origin(), 1.0, 1.0);
        assert_relative_eq!(body.inertia.x, 0.4, epsilon = 1e-12);
        assert_relative_eq!(body.inertia.y, 0.4, epsilon = 1e-12);
        assert_relative_eq!(body.inertia.z, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_cuboid_inertia() {
        // 1×1×1 box with mass 12: each component = 12·(1+1)/12 = 2.
        let body = Rigidbody::cuboid(Point3::origin(), 12.0, Vector3::new(0.5, 0.5, 0.5));
        assert_relative_eq!(body.inertia.x, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_point_velocity_spin() {
        // Spinning about +Y at the origin: a point at +X moves toward -Z.
        let mut body = Rigidbody::sphere(Point3::origin(), 1.0, 0.5);
        body.angular_velocity = Vector3::new(0.0, 1.0, 0.0);

        let v = body.point_velocity(Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.z, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_point_velocity_with_com_offset() {
        let mut body =
            Rigidbody::sphere(Point3::origin(), 1.0, 0.5).with_com_offset(Vector3::new(1.0, 0.0, 0.0));
        body.angular_velocity = Vector3::new(0.0, 0.0, 1.0);

        // The COM sits at (1,0,0); the body origin is 1m to its -X side,
        // so spinning about +Z moves the origin toward -Y.
        let v = body.point_velocity(Point3::origin());
        assert_relative_eq!(v.y, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_impulse_at_com_is_linear_only() {
        let mut body = Rigidbody::sphere(Point3::origin(), 2.0, 0.5);
        body.add_impulse_at_point(Vector3::new(4.0, 0.0, 0.0), Point3::origin());

        assert_relative_eq!(body.velocity.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(body.angular_velocity.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_impulse_off_center_spins() {
        let mut body = Rigidbody::sphere(Point3::origin(), 1.0, 0.5);
        // Impulse along +Z applied at +X of the COM: torque = x̂ × ẑ = -ŷ.
        body.add_impulse_at_point(Vector3::new(0.0, 0.0, 1.0), Point3::new(1.0, 0.0, 0.0));

        assert!(body.angular_velocity.y < 0.0);
        assert_relative_eq!(body.velocity.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_force_at_point_induces_torque() {
        let mut body = Rigidbody::sphere(Point3::origin(), 1.0, 0.5);
        body.add_force_at_point(Vector3::new(0.0, 1.0, 0.0), Point3::new(1.0, 0.0, 0.0));

        assert_relative_eq!(body.force.y, 1.0, epsilon = 1e-12);
        // x̂ × ŷ = ẑ
        assert_relative_eq!(body.torque.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_validate() {
        let good = Rigidbody::sphere(Point3::origin(), 1.0, 0.5);
        assert!(good.validate().is_ok());

        let zero_mass = Rigidbody::new(Point3::origin(), 0.0, Vector3::new(1.0, 1.0, 1.0));
        assert!(zero_mass.validate().is_err());

        let bad_inertia = Rigidbody::new(Point3::origin(), 1.0, Vector3::new(1.0, 0.0, 1.0));
        assert!(bad_inertia.validate().is_err());

        let mut nan_state = Rigidbody::sphere(Point3::origin(), 1.0, 0.5);
        nan_state.velocity.x = f64::NAN;
        assert!(nan_state.validate().is_err());
    }

    #[test]
    fn test_zero_mass_propagates_inf() {
        let body = Rigidbody::new(Point3::origin(), 0.0, Vector3::new(1.0, 1.0, 1.0));
        assert!(body.inverse_mass().is_infinite());
    }

    #[test]
    fn test_normalize_orientation() {
        let mut body = Rigidbody::sphere(Point3::origin(), 1.0, 0.5);
        body.orientation = Quaternion::new(2.0, 0.0, 0.0, 0.0);
        body.normalize_orientation();
        assert_relative_eq!(body.orientation.norm(), 1.0, epsilon = 1e-12);
    }
}

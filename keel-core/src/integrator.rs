//! Semi-implicit Euler integration of rigid body state.
//!
//! Velocity is updated from forces and gravity first, then position
//! from the *new* velocity (symplectic ordering; plain explicit Euler
//! pumps energy into resting stacks). The two halves are exposed
//! separately because the step orchestrator runs the constraint solver
//! between them: forces load velocities before the solve, poses advance
//! from the corrected velocities after it. Orientation accumulates the
//! first-order quaternion derivative without renormalizing; the step
//! orchestrator renormalizes once per step, and
//! `Rigidbody::normalize_orientation` is public for callers stepping
//! bodies by hand.

use nalgebra::{Quaternion, Vector3};

use keel_types::Rigidbody;

/// Fold forces, torques, and gravity into the body's velocities.
///
/// Consumes the force/torque accumulators and clears them. Never
/// errors: zero or negative mass propagates `inf`/`NaN` into the
/// velocity, where the solver's non-finite guard picks it up.
pub fn integrate_forces(body: &mut Rigidbody, gravity: &Vector3<f64>, dt: f64) {
    let acceleration = body.force * body.inverse_mass() + gravity * body.gravity_scale;
    body.velocity += acceleration * dt;
    body.angular_velocity += body.torque.component_mul(&body.inverse_inertia()) * dt;
    body.clear_accumulators();
}

/// Advance position and orientation from the current velocities.
pub fn integrate_positions(body: &mut Rigidbody, dt: f64) {
    body.position += body.velocity * dt;

    // q += dt/2 · (ω,0) ⊗ q. The result drifts off unit length by
    // O((dt·|ω|)²) per step, which renormalization absorbs.
    let omega = Quaternion::from_parts(0.0, body.angular_velocity);
    body.orientation = body.orientation + omega * body.orientation * (0.5 * dt);
}

/// Advance one body by `dt` seconds: both halves back to back.
pub fn integrate(body: &mut Rigidbody, gravity: &Vector3<f64>, dt: f64) {
    integrate_forces(body, gravity, dt);
    integrate_positions(body, dt);
}

/// Cap linear and angular speed after integration. `None` disables a
/// clamp.
pub fn clamp_velocities(body: &mut Rigidbody, max_linear: Option<f64>, max_angular: Option<f64>) {
    if let Some(limit) = max_linear {
        let speed = body.velocity.norm();
        if speed > limit {
            body.velocity *= limit / speed;
        }
    }
    if let Some(limit) = max_angular {
        let speed = body.angular_velocity.norm();
        if speed > limit {
            body.angular_velocity *= limit / speed;
        }
    }
}

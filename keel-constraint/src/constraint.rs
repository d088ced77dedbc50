//! Constraint rows: Jacobians, contacts, and differential couplings.
//!
//! Every constraint the solver handles is a single scalar row of the form
//!
//! ```text
//! J * v + bias >= 0        (contacts)
//! J * v + bias  = 0        (couplings)
//! ```
//!
//! where `J` is a [`Jacobian`] mapping the stacked linear/angular velocities
//! of the two involved bodies to the constraint-violation rate, and `bias`
//! is the Baumgarte term derived from the positional error.
//!
//! Contacts and couplings share the same row representation. What
//! distinguishes them is the lower bound on the accumulated impulse:
//! contacts may only push (`min_impulse = 0`), couplings may pull in either
//! direction (`min_impulse = -inf`). One clamp rule in the solver serves
//! both.
//!
//! Rows are rebuilt from the current frame's contacts on every step and
//! discarded afterwards; there is no warm-starting.

use nalgebra::{Point3, Vector3};

/// Jacobian row for a two-body velocity constraint.
///
/// Twelve scalars: a linear and an angular block per body. The constraint
/// velocity is
///
/// ```text
/// J * v = lin_a . v_a + ang_a . w_a + lin_b . v_b + ang_b . w_b
/// ```
///
/// For a one-body constraint (contact with static geometry) the `_b` blocks
/// are still stored but carry zero weight in the effective mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jacobian {
    /// Linear block for body A.
    pub lin_a: Vector3<f64>,
    /// Angular block for body A.
    pub ang_a: Vector3<f64>,
    /// Linear block for body B.
    pub lin_b: Vector3<f64>,
    /// Angular block for body B.
    pub ang_b: Vector3<f64>,
}

impl Jacobian {
    /// Build a Jacobian from its four blocks.
    #[must_use]
    pub fn new(
        lin_a: Vector3<f64>,
        ang_a: Vector3<f64>,
        lin_b: Vector3<f64>,
        ang_b: Vector3<f64>,
    ) -> Self {
        Self {
            lin_a,
            ang_a,
            lin_b,
            ang_b,
        }
    }

    /// Contact Jacobian along `normal` with lever arms `r_a`, `r_b` from
    /// each body's center of mass to the contact point.
    ///
    /// `normal` points from body B toward body A, so the constraint velocity
    /// is the separation rate: positive when the bodies move apart.
    #[must_use]
    pub fn contact(normal: Vector3<f64>, r_a: Vector3<f64>, r_b: Vector3<f64>) -> Self {
        Self {
            lin_a: normal,
            ang_a: r_a.cross(&normal),
            lin_b: -normal,
            ang_b: -r_b.cross(&normal),
        }
    }

    /// Angular-only Jacobian, used by differential couplings that relate
    /// two bodies' angular velocities (e.g. a wheel-speed ratio).
    #[must_use]
    pub fn angular(ang_a: Vector3<f64>, ang_b: Vector3<f64>) -> Self {
        Self {
            lin_a: Vector3::zeros(),
            ang_a,
            lin_b: Vector3::zeros(),
            ang_b,
        }
    }

    /// Constraint velocity `J * v` for the given body velocities.
    #[must_use]
    pub fn velocity(
        &self,
        vel_a: &Vector3<f64>,
        ang_vel_a: &Vector3<f64>,
        vel_b: &Vector3<f64>,
        ang_vel_b: &Vector3<f64>,
    ) -> f64 {
        self.lin_a.dot(vel_a) + self.ang_a.dot(ang_vel_a) + self.lin_b.dot(vel_b)
            + self.ang_b.dot(ang_vel_b)
    }
}

/// A single velocity-constraint row between up to two bodies.
///
/// `body_a` / `body_b` index the body slice handed to the solver; `None`
/// binds that side to the static world (zero inverse mass, never moves).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    /// Index of body A in the solver's body slice, or `None` for static.
    pub body_a: Option<usize>,
    /// Index of body B in the solver's body slice, or `None` for static.
    pub body_b: Option<usize>,
    /// The constraint row.
    pub jacobian: Jacobian,
    /// Signed positional violation. Negative while a contact penetrates;
    /// zero for pure velocity constraints. Source of the Baumgarte bias.
    pub positional_error: f64,
    /// Impulse accumulated across solver iterations within one step.
    pub lambda_accumulated: f64,
    /// Lower bound on the accumulated impulse: `0.0` for contacts (push
    /// only), `-inf` for couplings (bilateral).
    pub min_impulse: f64,
    /// World-space contact point (diagnostic for contacts, origin for
    /// couplings).
    pub point: Point3<f64>,
    /// World-space contact normal (zero for couplings).
    pub normal: Vector3<f64>,
}

impl Constraint {
    /// Build a non-penetration contact row.
    ///
    /// * `normal` points from body B toward body A and must be unit length.
    /// * `depth` is the penetration depth reported by narrow-phase
    ///   (positive when overlapping); it is stored negated as the signed
    ///   positional violation.
    /// * `r_a` / `r_b` are lever arms from each body's world center of mass
    ///   to `point`. Pass zero for a static side.
    #[must_use]
    pub fn contact(
        body_a: Option<usize>,
        body_b: Option<usize>,
        point: Point3<f64>,
        normal: Vector3<f64>,
        depth: f64,
        r_a: Vector3<f64>,
        r_b: Vector3<f64>,
    ) -> Self {
        Self {
            body_a,
            body_b,
            jacobian: Jacobian::contact(normal, r_a, r_b),
            positional_error: -depth,
            lambda_accumulated: 0.0,
            min_impulse: 0.0,
            point,
            normal,
        }
    }

    /// Build a bilateral coupling row between two dynamic bodies.
    ///
    /// The solver drives `J * v` toward zero with no impulse bound in
    /// either direction. Used for differential couplings such as locking
    /// two wheel speeds through a ratio:
    ///
    /// ```
    /// use keel_constraint::{Constraint, Jacobian};
    /// use nalgebra::Vector3;
    ///
    /// // w_left.x - w_right.x = 0
    /// let row = Constraint::coupling(
    ///     0,
    ///     1,
    ///     Jacobian::angular(Vector3::x(), -Vector3::x()),
    /// );
    /// assert!(row.min_impulse.is_infinite());
    /// ```
    #[must_use]
    pub fn coupling(body_a: usize, body_b: usize, jacobian: Jacobian) -> Self {
        Self {
            body_a: Some(body_a),
            body_b: Some(body_b),
            jacobian,
            positional_error: 0.0,
            lambda_accumulated: 0.0,
            min_impulse: f64::NEG_INFINITY,
            point: Point3::origin(),
            normal: Vector3::zeros(),
        }
    }

    /// Whether this row is a contact (bounded below at zero impulse).
    #[must_use]
    pub fn is_contact(&self) -> bool {
        self.min_impulse == 0.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_contact_jacobian_blocks() {
        let normal = Vector3::y();
        let r_a = Vector3::new(0.3, -0.5, 0.0);
        let r_b = Vector3::zeros();

        let j = Jacobian::contact(normal, r_a, r_b);

        assert_relative_eq!(j.lin_a, normal, epsilon = 1e-12);
        assert_relative_eq!(j.lin_b, -normal, epsilon = 1e-12);
        // r_a x n = (0.3, -0.5, 0) x (0, 1, 0) = (0, 0, 0.3)
        assert_relative_eq!(j.ang_a, Vector3::new(0.0, 0.0, 0.3), epsilon = 1e-12);
        assert_relative_eq!(j.ang_b, Vector3::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn test_jacobian_velocity_is_separation_rate() {
        // Contact below the body, normal up. Body falling -> negative rate.
        let j = Jacobian::contact(Vector3::y(), Vector3::new(0.0, -0.5, 0.0), Vector3::zeros());

        let falling = j.velocity(
            &Vector3::new(0.0, -2.0, 0.0),
            &Vector3::zeros(),
            &Vector3::zeros(),
            &Vector3::zeros(),
        );
        assert_relative_eq!(falling, -2.0, epsilon = 1e-12);

        let rising = j.velocity(
            &Vector3::new(0.0, 1.5, 0.0),
            &Vector3::zeros(),
            &Vector3::zeros(),
            &Vector3::zeros(),
        );
        assert_relative_eq!(rising, 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_contact_constructor() {
        let c = Constraint::contact(
            Some(0),
            None,
            Point3::new(0.0, 0.0, 0.0),
            Vector3::y(),
            0.02,
            Vector3::new(0.0, -0.5, 0.0),
            Vector3::zeros(),
        );

        assert_eq!(c.body_a, Some(0));
        assert_eq!(c.body_b, None);
        assert_relative_eq!(c.positional_error, -0.02, epsilon = 1e-12);
        assert_eq!(c.min_impulse, 0.0);
        assert_eq!(c.lambda_accumulated, 0.0);
        assert!(c.is_contact());
    }

    #[test]
    fn test_coupling_constructor() {
        let c = Constraint::coupling(2, 5, Jacobian::angular(Vector3::x(), -Vector3::x()));

        assert_eq!(c.body_a, Some(2));
        assert_eq!(c.body_b, Some(5));
        assert_eq!(c.positional_error, 0.0);
        assert!(c.min_impulse.is_infinite() && c.min_impulse < 0.0);
        assert!(!c.is_contact());
    }

    #[test]
    fn test_angular_jacobian_has_no_linear_part() {
        let j = Jacobian::angular(Vector3::x(), Vector3::new(-2.0, 0.0, 0.0));

        assert_eq!(j.lin_a, Vector3::zeros());
        assert_eq!(j.lin_b, Vector3::zeros());

        // Pure translation must not register on an angular row.
        let rate = j.velocity(
            &Vector3::new(3.0, 1.0, -2.0),
            &Vector3::zeros(),
            &Vector3::new(-1.0, 4.0, 0.5),
            &Vector3::zeros(),
        );
        assert_relative_eq!(rate, 0.0, epsilon = 1e-12);
    }
}

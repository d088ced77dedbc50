//! Sequential impulse solver with a fixed iteration count.
//!
//! This is a projected Gauss-Seidel solver: it sweeps the constraint rows
//! in order, computes a corrective impulse per row from the bodies'
//! *current* velocities, applies it immediately, and repeats for a fixed
//! number of passes. Within one step, impulses therefore compound: later
//! rows see the velocity changes earlier rows made.
//!
//! Fixed iteration counts (no convergence-based early exit) keep the cost
//! per step predictable and the results reproducible for identical inputs.
//!
//! # Per-Row Update
//!
//! ```text
//! k_eff  = 1 / sum(J_i^2 * w_i)          (w = per-DOF inverse mass)
//! bias   = bias_factor / dt * min(C + slop, 0)
//! lambda = -k_eff * (J*v + bias)
//! ```
//!
//! The *accumulated* impulse is clamped against the row's lower bound
//! (0 for contacts, -inf for couplings), and the clamped increment is
//! applied to the body velocities as `dv_i = w_i * J_i * lambda`.
//!
//! # Non-Finite Impulses
//!
//! A row whose computed impulse is NaN or infinite (corrupted body state,
//! zero timestep) is discarded for that pass with a `tracing::warn!`.
//! Body velocities are never written from a non-finite impulse.

use keel_types::{Rigidbody, SolverConfig};
use nalgebra::Vector3;

use crate::constraint::{Constraint, Jacobian};

/// Denominators below this are treated as singular (both sides immovable
/// along the row). A NaN denominator fails the comparison and lands here
/// as well.
const SINGULAR_MASS_EPSILON: f64 = 1e-12;

/// Outcome of solving a single constraint row once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImpulseOutcome {
    /// An impulse was applied; carries the clamped increment.
    Applied(f64),
    /// Row skipped: singular effective mass or body index out of range.
    Skipped,
    /// Computed impulse was non-finite and was discarded.
    Discarded,
}

/// Statistics from one solver invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    /// Number of full passes over the constraint list.
    pub iterations: usize,
    /// Number of constraint rows solved.
    pub constraints: usize,
    /// Non-finite impulses discarded, counted per pass.
    pub discarded: usize,
    /// Rows skipped for singular effective mass, counted per pass.
    pub skipped: usize,
}

/// Mass and velocity terms for one side of a constraint row.
///
/// A `None` body index resolves to the static world: zero inverse mass
/// and inertia, zero velocity.
#[derive(Debug, Clone, Copy)]
struct SideState {
    inv_mass: f64,
    inv_inertia: Vector3<f64>,
    velocity: Vector3<f64>,
    angular_velocity: Vector3<f64>,
}

impl SideState {
    fn fixed() -> Self {
        Self {
            inv_mass: 0.0,
            inv_inertia: Vector3::zeros(),
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
        }
    }

    fn from_body(body: &Rigidbody) -> Self {
        Self {
            inv_mass: body.inverse_mass(),
            inv_inertia: body.inverse_inertia(),
            velocity: body.velocity,
            angular_velocity: body.angular_velocity,
        }
    }
}

fn side_state(bodies: &[Rigidbody], index: Option<usize>) -> Option<SideState> {
    match index {
        Some(i) => bodies.get(i).map(SideState::from_body),
        None => Some(SideState::fixed()),
    }
}

/// Effective mass of a constraint row: `1 / sum(J_i^2 * w_i)` where `w`
/// is the per-DOF inverse mass (scalar inverse mass for the linear block,
/// diagonal inverse inertia for the angular block).
///
/// Returns `None` when the denominator is singular, meaning no finite
/// impulse can change the constraint velocity and the row must be skipped.
#[must_use]
pub fn effective_mass(
    jacobian: &Jacobian,
    inv_mass_a: f64,
    inv_inertia_a: &Vector3<f64>,
    inv_mass_b: f64,
    inv_inertia_b: &Vector3<f64>,
) -> Option<f64> {
    let k = inv_mass_a * jacobian.lin_a.norm_squared()
        + jacobian
            .ang_a
            .component_mul(&jacobian.ang_a)
            .dot(inv_inertia_a)
        + inv_mass_b * jacobian.lin_b.norm_squared()
        + jacobian
            .ang_b
            .component_mul(&jacobian.ang_b)
            .dot(inv_inertia_b);

    if k > SINGULAR_MASS_EPSILON {
        Some(1.0 / k)
    } else {
        None
    }
}

/// Solve a single constraint row once against current body velocities.
///
/// Computes the Baumgarte-biased impulse, clamps the accumulated impulse
/// at `constraint.min_impulse`, and applies the increment to the involved
/// bodies. See the module docs for the update equations.
pub fn solve_constraint(
    constraint: &mut Constraint,
    bodies: &mut [Rigidbody],
    dt: f64,
    bias_factor: f64,
    penetration_slop: f64,
) -> ImpulseOutcome {
    let Some(a) = side_state(bodies, constraint.body_a) else {
        return ImpulseOutcome::Skipped;
    };
    let Some(b) = side_state(bodies, constraint.body_b) else {
        return ImpulseOutcome::Skipped;
    };

    let Some(k_eff) = effective_mass(
        &constraint.jacobian,
        a.inv_mass,
        &a.inv_inertia,
        b.inv_mass,
        &b.inv_inertia,
    ) else {
        return ImpulseOutcome::Skipped;
    };

    // Slop forgives violations smaller than itself; only deeper
    // penetration feeds the bias.
    let violation = (constraint.positional_error + penetration_slop).min(0.0);
    let bias = bias_factor / dt * violation;

    let jv = constraint.jacobian.velocity(
        &a.velocity,
        &a.angular_velocity,
        &b.velocity,
        &b.angular_velocity,
    );

    let lambda = -k_eff * (jv + bias);
    if !lambda.is_finite() {
        tracing::warn!(
            "discarding non-finite impulse ({}) on constraint between bodies {:?} and {:?}",
            lambda,
            constraint.body_a,
            constraint.body_b
        );
        return ImpulseOutcome::Discarded;
    }

    // Clamp the accumulated impulse, not the raw increment: earlier
    // passes may have over-applied and this pass may legitimately remove
    // impulse, but the running total never crosses the bound.
    let new_total = (constraint.lambda_accumulated + lambda).max(constraint.min_impulse);
    let applied = new_total - constraint.lambda_accumulated;
    constraint.lambda_accumulated = new_total;

    if let Some(i) = constraint.body_a {
        apply_impulse(
            &mut bodies[i],
            &constraint.jacobian.lin_a,
            &constraint.jacobian.ang_a,
            applied,
        );
    }
    if let Some(i) = constraint.body_b {
        apply_impulse(
            &mut bodies[i],
            &constraint.jacobian.lin_b,
            &constraint.jacobian.ang_b,
            applied,
        );
    }

    ImpulseOutcome::Applied(applied)
}

fn apply_impulse(body: &mut Rigidbody, lin: &Vector3<f64>, ang: &Vector3<f64>, lambda: f64) {
    body.velocity += lin * (body.inverse_mass() * lambda);
    body.angular_velocity += ang.component_mul(&body.inverse_inertia()) * lambda;
}

/// Fixed-iteration sequential impulse solver.
///
/// # Example
///
/// ```
/// use keel_constraint::{Constraint, SequentialImpulseSolver};
/// use keel_types::Rigidbody;
/// use nalgebra::{Point3, Vector3};
///
/// // One body falling onto a static contact directly below its center.
/// let mut bodies = vec![
///     Rigidbody::sphere(Point3::new(0.0, 0.5, 0.0), 1.0, 0.5)
///         .with_velocity(Vector3::new(0.0, -3.0, 0.0)),
/// ];
/// let mut rows = vec![Constraint::contact(
///     Some(0),
///     None,
///     Point3::origin(),
///     Vector3::y(),
///     0.0,
///     Vector3::new(0.0, -0.5, 0.0),
///     Vector3::zeros(),
/// )];
///
/// let solver = SequentialImpulseSolver::default();
/// let stats = solver.solve(&mut rows, &mut bodies, 1.0 / 60.0);
///
/// assert_eq!(stats.constraints, 1);
/// assert!(bodies[0].velocity.y.abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct SequentialImpulseSolver {
    config: SolverConfig,
}

impl Default for SequentialImpulseSolver {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

impl SequentialImpulseSolver {
    /// Create a solver with the given configuration.
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Get the solver configuration.
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Get mutable access to the solver configuration.
    pub fn config_mut(&mut self) -> &mut SolverConfig {
        &mut self.config
    }

    /// Run the configured number of passes over `constraints`, mutating
    /// body velocities in place.
    ///
    /// Accumulated impulses live in the rows themselves; pass rows with
    /// `lambda_accumulated == 0` for a cold solve (the orchestrator
    /// rebuilds rows every step, so this holds by construction).
    pub fn solve(
        &self,
        constraints: &mut [Constraint],
        bodies: &mut [Rigidbody],
        dt: f64,
    ) -> SolverStats {
        if constraints.is_empty() {
            return SolverStats::default();
        }

        let mut stats = SolverStats {
            iterations: self.config.iterations,
            constraints: constraints.len(),
            discarded: 0,
            skipped: 0,
        };

        for _ in 0..self.config.iterations {
            for constraint in constraints.iter_mut() {
                match solve_constraint(
                    constraint,
                    bodies,
                    dt,
                    self.config.bias_factor,
                    self.config.penetration_slop,
                ) {
                    ImpulseOutcome::Applied(_) => {}
                    ImpulseOutcome::Skipped => stats.skipped += 1,
                    ImpulseOutcome::Discarded => stats.discarded += 1,
                }
            }
        }

        stats
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    const DT: f64 = 1.0 / 60.0;

    fn floor_contact(body: usize, depth: f64) -> Constraint {
        Constraint::contact(
            Some(body),
            None,
            Point3::origin(),
            Vector3::y(),
            depth,
            Vector3::new(0.0, -0.5, 0.0),
            Vector3::zeros(),
        )
    }

    #[test]
    fn test_effective_mass_linear_only() {
        let j = Jacobian::contact(Vector3::y(), Vector3::zeros(), Vector3::zeros());
        // Body A with mass 0.5 against the static world: k = 2.
        let k_eff = effective_mass(&j, 2.0, &Vector3::zeros(), 0.0, &Vector3::zeros());
        assert_relative_eq!(k_eff.unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_effective_mass_singular_when_both_fixed() {
        let j = Jacobian::contact(Vector3::y(), Vector3::zeros(), Vector3::zeros());
        let k_eff = effective_mass(&j, 0.0, &Vector3::zeros(), 0.0, &Vector3::zeros());
        assert!(k_eff.is_none());
    }

    #[test]
    fn test_head_on_contact_stops_approach() {
        let mut bodies = vec![Rigidbody::sphere(Point3::new(0.0, 0.5, 0.0), 1.0, 0.5)
            .with_velocity(Vector3::new(0.0, -1.0, 0.0))];
        let mut rows = vec![floor_contact(0, 0.0)];

        let solver = SequentialImpulseSolver::default();
        solver.solve(&mut rows, &mut bodies, DT);

        assert_relative_eq!(bodies[0].velocity.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(rows[0].lambda_accumulated, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_penetration_bias_pushes_out() {
        // At rest with 1 cm penetration: the Baumgarte term alone must
        // produce an outward velocity of bias_factor / dt * depth.
        let mut bodies = vec![Rigidbody::sphere(Point3::new(0.0, 0.49, 0.0), 1.0, 0.5)];
        let mut rows = vec![floor_contact(0, 0.01)];

        let solver = SequentialImpulseSolver::default();
        solver.solve(&mut rows, &mut bodies, DT);

        let expected = 0.2 / DT * 0.01;
        assert_relative_eq!(bodies[0].velocity.y, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_contact_never_pulls() {
        // Separating body: the row would need a negative impulse, which
        // the contact bound forbids.
        let mut bodies = vec![Rigidbody::sphere(Point3::new(0.0, 0.5, 0.0), 1.0, 0.5)
            .with_velocity(Vector3::new(0.0, 2.0, 0.0))];
        let mut rows = vec![floor_contact(0, 0.0)];

        let solver = SequentialImpulseSolver::default();
        solver.solve(&mut rows, &mut bodies, DT);

        assert_relative_eq!(bodies[0].velocity.y, 2.0, epsilon = 1e-12);
        assert_eq!(rows[0].lambda_accumulated, 0.0);
    }

    #[test]
    fn test_accumulated_impulse_stays_non_negative() {
        // Alternate approach and bias over several passes; the clamp must
        // hold the running total at or above zero throughout.
        let mut bodies = vec![Rigidbody::sphere(Point3::new(0.0, 0.5, 0.0), 1.0, 0.5)
            .with_velocity(Vector3::new(0.0, -0.5, 0.0))];
        let mut rows = vec![floor_contact(0, 0.005)];

        let solver = SequentialImpulseSolver::new(SolverConfig::default().with_iterations(10));
        solver.solve(&mut rows, &mut bodies, DT);

        assert!(rows[0].lambda_accumulated >= 0.0);
    }

    #[test]
    fn test_nan_velocity_discards_row() {
        let mut bodies = vec![Rigidbody::sphere(Point3::origin(), 1.0, 0.5)
            .with_velocity(Vector3::new(f64::NAN, 0.0, 0.0))];
        let mut rows = vec![Constraint::contact(
            Some(0),
            None,
            Point3::origin(),
            Vector3::x(),
            0.0,
            Vector3::zeros(),
            Vector3::zeros(),
        )];

        let solver = SequentialImpulseSolver::default();
        let stats = solver.solve(&mut rows, &mut bodies, DT);

        assert_eq!(stats.discarded, stats.iterations);
        assert_eq!(rows[0].lambda_accumulated, 0.0);
        // The row must not leak NaN into the angular state.
        assert!(bodies[0].angular_velocity.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_body_index_out_of_range_is_skipped() {
        let mut bodies = vec![Rigidbody::sphere(Point3::origin(), 1.0, 0.5)];
        let mut rows = vec![floor_contact(7, 0.0)];

        let solver = SequentialImpulseSolver::default();
        let stats = solver.solve(&mut rows, &mut bodies, DT);

        assert_eq!(stats.skipped, stats.iterations);
    }

    #[test]
    fn test_coupling_equalizes_spin() {
        // Lock two wheels' spin about X at a 1:1 ratio. Equal inertias
        // converge to the average in a single pass.
        let mut bodies = vec![
            Rigidbody::new(Point3::origin(), 1.0, Vector3::new(1.0, 1.0, 1.0)),
            Rigidbody::new(Point3::new(2.0, 0.0, 0.0), 1.0, Vector3::new(1.0, 1.0, 1.0)),
        ];
        bodies[0].angular_velocity = Vector3::new(2.0, 0.0, 0.0);

        let mut rows = vec![Constraint::coupling(
            0,
            1,
            Jacobian::angular(Vector3::x(), -Vector3::x()),
        )];

        let solver = SequentialImpulseSolver::default();
        solver.solve(&mut rows, &mut bodies, DT);

        assert_relative_eq!(bodies[0].angular_velocity.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(bodies[1].angular_velocity.x, 1.0, epsilon = 1e-9);
        // The coupling pulled: accumulated impulse went negative.
        assert!(rows[0].lambda_accumulated < 0.0);
    }

    #[test]
    fn test_fixed_iteration_count_reported() {
        let mut bodies = vec![Rigidbody::sphere(Point3::origin(), 1.0, 0.5)];
        let mut rows = vec![floor_contact(0, 0.0)];

        let solver = SequentialImpulseSolver::new(SolverConfig::default().with_iterations(3));
        let stats = solver.solve(&mut rows, &mut bodies, DT);

        assert_eq!(stats.iterations, 3);
        assert_eq!(stats.constraints, 1);
    }

    #[test]
    fn test_empty_constraint_list() {
        let mut bodies = vec![Rigidbody::sphere(Point3::origin(), 1.0, 0.5)];
        let solver = SequentialImpulseSolver::default();
        let stats = solver.solve(&mut [], &mut bodies, DT);

        assert_eq!(stats, SolverStats::default());
    }
}

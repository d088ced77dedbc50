//! Velocity-constraint rows and the sequential impulse solver.
//!
//! This crate turns contacts (and differential couplings) into scalar
//! constraint rows and solves them with a fixed-iteration projected
//! Gauss-Seidel sweep, mutating body velocities in place.
//!
//! # Constraint Formulation
//!
//! Each row restricts the relative velocity of up to two bodies along a
//! single direction:
//!
//! ```text
//! J * v + bias >= 0      (contacts: push apart, never pull)
//! J * v + bias  = 0      (couplings: bilateral)
//! ```
//!
//! `J` is the row's [`Jacobian`]; `bias` is the Baumgarte stabilization
//! term that converts positional error (penetration) into a corrective
//! velocity over the next step. The only difference between the two row
//! kinds is the lower bound on the accumulated impulse, so the solver
//! treats every row identically.
//!
//! # Solving
//!
//! [`SequentialImpulseSolver`] runs a configured number of passes over
//! all rows. Per row it computes the effective mass, the biased impulse,
//! clamps the accumulated impulse against the row's bound, and applies
//! the increment immediately so later rows observe it.
//!
//! # Example
//!
//! ```
//! use keel_constraint::{Constraint, SequentialImpulseSolver};
//! use keel_types::Rigidbody;
//! use nalgebra::{Point3, Vector3};
//!
//! let mut bodies = vec![
//!     Rigidbody::sphere(Point3::new(0.0, 0.5, 0.0), 1.0, 0.5)
//!         .with_velocity(Vector3::new(0.0, -1.0, 0.0)),
//! ];
//!
//! // Contact with the static floor, directly below the center of mass.
//! let mut rows = vec![Constraint::contact(
//!     Some(0),
//!     None,
//!     Point3::origin(),
//!     Vector3::y(),
//!     0.0,
//!     Vector3::new(0.0, -0.5, 0.0),
//!     Vector3::zeros(),
//! )];
//!
//! let solver = SequentialImpulseSolver::default();
//! solver.solve(&mut rows, &mut bodies, 1.0 / 60.0);
//!
//! // The approach velocity has been absorbed.
//! assert!(bodies[0].velocity.y.abs() < 1e-9);
//! ```

#![doc(html_root_url = "https://docs.rs/keel-constraint/0.4.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn)]

mod constraint;
mod solver;

pub use constraint::{Constraint, Jacobian};
pub use solver::{
    effective_mass, solve_constraint, ImpulseOutcome, SequentialImpulseSolver, SolverStats,
};

// Re-export the types rows are built from
pub use keel_types::{Rigidbody, SolverConfig};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};

    #[test]
    fn test_contact_and_coupling_share_the_row_type() {
        let contact = Constraint::contact(
            Some(0),
            None,
            Point3::origin(),
            Vector3::y(),
            0.01,
            Vector3::zeros(),
            Vector3::zeros(),
        );
        let coupling = Constraint::coupling(0, 1, Jacobian::angular(Vector3::x(), -Vector3::x()));

        assert!(contact.is_contact());
        assert!(!coupling.is_contact());
    }
}

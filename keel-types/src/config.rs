//! Configuration types for the simulation.
//!
//! [`SimulationConfig`] carries everything the stepping pipeline needs that
//! is not per-body state: gravity, solver tuning, and safety clamps. The
//! timestep is *not* configuration; callers pass `dt` to each step so the
//! frame loop stays in charge of pacing.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Main configuration for a simulation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationConfig {
    /// Gravitational acceleration applied to every dynamic body (m/s²),
    /// scaled per-body by its gravity scale.
    pub gravity: Vector3<f64>,
    /// Constraint solver configuration.
    pub solver: SolverConfig,
    /// Maximum linear speed (m/s). Bodies exceeding this are clamped
    /// after integration. `None` disables the clamp.
    pub max_linear_velocity: Option<f64>,
    /// Maximum angular speed (rad/s). `None` disables the clamp.
    pub max_angular_velocity: Option<f64>,
    /// Upper bound on contacts kept per collider per step. Deepest
    /// contacts win when the bound is exceeded.
    pub max_contacts_per_collider: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gravity: Vector3::new(0.0, -9.82, 0.0),
            solver: SolverConfig::default(),
            max_linear_velocity: Some(200.0),
            max_angular_velocity: Some(100.0),
            max_contacts_per_collider: 8,
        }
    }
}

impl SimulationConfig {
    /// Create a configuration for real-time use: fewer solver passes,
    /// stiffer positional correction.
    #[must_use]
    pub fn realtime() -> Self {
        Self {
            solver: SolverConfig::realtime(),
            ..Default::default()
        }
    }

    /// Create a high-accuracy configuration: more solver passes, gentler
    /// positional correction.
    #[must_use]
    pub fn high_accuracy() -> Self {
        Self {
            solver: SolverConfig::high_accuracy(),
            ..Default::default()
        }
    }

    /// Set the gravity vector.
    #[must_use]
    pub fn with_gravity(mut self, gravity: Vector3<f64>) -> Self {
        self.gravity = gravity;
        self
    }

    /// Disable gravity entirely.
    #[must_use]
    pub fn zero_gravity(mut self) -> Self {
        self.gravity = Vector3::zeros();
        self
    }

    /// Set the solver configuration.
    #[must_use]
    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Remove the velocity clamps.
    #[must_use]
    pub fn unlimited(mut self) -> Self {
        self.max_linear_velocity = None;
        self.max_angular_velocity = None;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.gravity.iter().all(|g| g.is_finite()) {
            return Err(crate::SimError::invalid_config("gravity must be finite"));
        }

        if let Some(v) = self.max_linear_velocity {
            if !v.is_finite() || v <= 0.0 {
                return Err(crate::SimError::invalid_config(
                    "max_linear_velocity must be positive and finite",
                ));
            }
        }

        if let Some(v) = self.max_angular_velocity {
            if !v.is_finite() || v <= 0.0 {
                return Err(crate::SimError::invalid_config(
                    "max_angular_velocity must be positive and finite",
                ));
            }
        }

        if self.max_contacts_per_collider == 0 {
            return Err(crate::SimError::invalid_config(
                "max_contacts_per_collider must be at least 1",
            ));
        }

        self.solver.validate()?;

        Ok(())
    }
}

/// Configuration for the sequential-impulse solver.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverConfig {
    /// Number of full Gauss–Seidel passes over the constraint list per
    /// step. Fixed count, no convergence-based early exit.
    pub iterations: usize,
    /// Baumgarte stabilization factor. The positional bias added to a
    /// constraint's velocity target is `bias_factor / dt * C`.
    pub bias_factor: f64,
    /// Penetration depth ignored by the bias term (m). Leaves a thin
    /// tolerance layer so resting contacts do not jitter.
    pub penetration_slop: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iterations: 5,
            bias_factor: 0.2,
            penetration_slop: 0.0,
        }
    }
}

impl SolverConfig {
    /// Real-time preset: fewer passes, stronger correction.
    #[must_use]
    pub fn realtime() -> Self {
        Self {
            iterations: 4,
            bias_factor: 0.3,
            penetration_slop: 0.001,
        }
    }

    /// High-accuracy preset: more passes, gentler correction.
    #[must_use]
    pub fn high_accuracy() -> Self {
        Self {
            iterations: 16,
            bias_factor: 0.1,
            penetration_slop: 0.0,
        }
    }

    /// Set the iteration count.
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the Baumgarte factor.
    #[must_use]
    pub fn with_bias_factor(mut self, bias_factor: f64) -> Self {
        self.bias_factor = bias_factor;
        self
    }

    /// Validate the solver configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if self.iterations == 0 {
            return Err(crate::SimError::invalid_config(
                "iterations must be at least 1",
            ));
        }

        if !self.bias_factor.is_finite() || !(0.0..=1.0).contains(&self.bias_factor) {
            return Err(crate::SimError::invalid_config(
                "bias_factor must be in [0, 1]",
            ));
        }

        if !self.penetration_slop.is_finite() || self.penetration_slop < 0.0 {
            return Err(crate::SimError::invalid_config(
                "penetration_slop cannot be negative",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.gravity.y, -9.82, epsilon = 1e-12);
        assert_eq!(config.solver.iterations, 5);
    }

    #[test]
    fn test_config_presets() {
        let realtime = SimulationConfig::realtime();
        assert!(realtime.validate().is_ok());
        assert!(realtime.solver.iterations < SolverConfig::high_accuracy().iterations);

        let accurate = SimulationConfig::high_accuracy();
        assert_eq!(accurate.solver.iterations, 16);
        assert!(accurate.solver.bias_factor < realtime.solver.bias_factor);
    }

    #[test]
    fn test_config_builder() {
        let config = SimulationConfig::default()
            .zero_gravity()
            .with_solver(SolverConfig::default().with_iterations(10))
            .unlimited();

        assert_relative_eq!(config.gravity.norm(), 0.0, epsilon = 1e-12);
        assert_eq!(config.solver.iterations, 10);
        assert_eq!(config.max_linear_velocity, None);
    }

    #[test]
    fn test_config_validation() {
        let mut config = SimulationConfig::default();
        assert!(config.validate().is_ok());

        config.gravity.y = f64::NAN;
        assert!(config.validate().is_err());

        config.gravity.y = -9.82;
        config.max_linear_velocity = Some(-1.0);
        assert!(config.validate().is_err());

        config.max_linear_velocity = Some(100.0);
        config.max_contacts_per_collider = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_solver_validation() {
        let mut solver = SolverConfig::default();
        assert!(solver.validate().is_ok());

        solver.iterations = 0;
        assert!(solver.validate().is_err());

        solver.iterations = 5;
        solver.bias_factor = 1.5;
        assert!(solver.validate().is_err());

        solver.bias_factor = 0.2;
        solver.penetration_slop = -0.01;
        assert!(solver.validate().is_err());
    }
}

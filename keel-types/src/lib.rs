//! Core types for the keel physics simulation.
//!
//! This crate provides the data types shared by the collision and solver
//! crates:
//!
//! - [`Rigidbody`] - Linear/angular state, force accumulators, mass properties
//! - [`Collider`] / [`ColliderShape`] - Shapes bound to bodies or static world
//! - [`SimulationConfig`] / [`SolverConfig`] - Gravity, solver tuning, clamps
//! - [`SimError`] - The error taxonomy for the whole simulation
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They have no collision detection, no
//! integration, no solving. They are the common language between:
//!
//! - The stepping pipeline (`keel-core`)
//! - The constraint solver (`keel-constraint`)
//! - Callers that own the bodies (scene graphs, gameplay code, tests)
//!
//! # Coordinate System
//!
//! - Y: up (gravity defaults to `(0, -9.82, 0)`)
//! - Right-handed
//!
//! # Example
//!
//! ```
//! use keel_types::{Rigidbody, Collider, SimulationConfig};
//! use nalgebra::Point3;
//!
//! let body = Rigidbody::sphere(Point3::new(0.0, 5.0, 0.0), 1.0, 0.5);
//! let collider = Collider::sphere(0.5, 0);
//! let config = SimulationConfig::default();
//!
//! assert!(body.validate().is_ok());
//! assert!(collider.validate().is_ok());
//! assert!(config.validate().is_ok());
//! ```

#![doc(html_root_url = "https://docs.rs/keel-types/0.4.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,        // Error docs added where non-obvious
)]

mod body;
mod collider;
mod config;
mod error;

pub use body::Rigidbody;
pub use collider::{Collider, ColliderShape};
pub use config::{SimulationConfig, SolverConfig};
pub use error::SimError;

// Re-export math types for convenience
pub use nalgebra::{Point3, Quaternion, UnitQuaternion, Vector3};

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;

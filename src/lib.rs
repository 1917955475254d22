#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_doc_code_examples)]
#![warn(clippy::missing_docs_in_private_items)]
#![doc = include_str!("../README.md")]

pub mod config;
pub mod domain;
pub mod errors;
pub mod evaluator;
pub mod geometry;
pub mod oc;
pub mod optimizer;
pub mod penalization;
pub mod plane;
mod solver;
pub mod truss;

pub use config::OptimizationConfig;
pub use domain::{mean_density, uniform_densities, ElementId};
pub use errors::{
    ConfigError, EvaluationError, ExtractionError, ModelError, OptimizationError,
};
pub use evaluator::{ClosureEvaluator, FeEvaluator, SedSample, StiffnessAssignment};
pub use geometry::{force, point, Force, GridNode, PlanarForce, Point};
pub use oc::{OcStep, SED_FLOOR};
pub use optimizer::{optimize, IterationRecord, OptimizationResult, Termination};
pub use penalization::SimpLaw;
pub use plane::{Edge, PlaneStressGrid};
pub use truss::Truss;

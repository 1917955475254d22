//! Error types produced while configuring, evaluating or optimising a design domain.

use petgraph::graph::{EdgeIndex, NodeIndex};
use thiserror::Error;

use crate::domain::ElementId;

/// Error returned when an [`OptimizationConfig`](crate::OptimizationConfig) is rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Returned when the target volume fraction lies outside `(0, 1]`.
    #[error("volume fraction must lie in (0, 1] (received {0})")]
    VolumeFraction(f64),
    /// Returned when the penalization exponent is below one.
    #[error("penalty must be at least 1 (received {0})")]
    Penalty(f64),
    /// Returned when the base elastic modulus is zero, negative or not finite.
    #[error("base modulus must be positive (received {0})")]
    BaseModulus(f64),
    /// Returned when the move limit lies outside `(0, 1]`.
    #[error("move limit must lie in (0, 1] (received {0})")]
    MoveLimit(f64),
    /// Returned when the convergence tolerance is zero, negative or not finite.
    #[error("tolerance must be positive (received {0})")]
    Tolerance(f64),
    /// Returned when no outer iterations are allowed.
    #[error("at least one optimization iteration is required")]
    MaxIterations,
    /// Returned when no bisection iterations are allowed.
    #[error("at least one bisection iteration is required")]
    MaxBisectionIterations,
    /// Returned when the wall-clock budget is negative or not finite.
    #[error("time budget must be a non-negative number of seconds (received {0})")]
    TimeBudget(f64),
    /// Returned when a configuration document cannot be parsed.
    #[error("invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),
    /// Returned when a configuration file cannot be read.
    #[error("unable to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to extract a strain energy density for a single element.
///
/// These are recovered by the optimizer, which substitutes a floor value for the
/// affected element and keeps iterating.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ExtractionError {
    /// The analysis produced no result for the element.
    #[error("no result available for element {0}")]
    Missing(ElementId),
    /// The analysis produced a value that is NaN or infinite.
    #[error("element {element} produced a non-finite strain energy density ({value})")]
    NonFinite {
        /// Identifier of the affected element.
        element: ElementId,
        /// Rejected value.
        value: f64,
    },
    /// Backend specific failure description.
    #[error("element {element}: {reason}")]
    Backend {
        /// Identifier of the affected element.
        element: ElementId,
        /// Message reported by the backend.
        reason: String,
    },
}

/// Unrecoverable failure of a structural analysis.
///
/// Without a structural state there is no meaningful density update, so the optimizer
/// stops when it receives one of these.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EvaluationError {
    /// Returned when the reduced stiffness matrix cannot be factorised.
    #[error("stiffness matrix is singular; check supports and connectivity")]
    SingularStiffness,
    /// Returned when the number of stiffness values or results does not match the domain.
    #[error("expected {expected} elements but received {actual}")]
    ElementCountMismatch {
        /// Number of elements in the design domain.
        expected: usize,
        /// Number of entries received.
        actual: usize,
    },
    /// Returned when an entry does not belong to the element at its position.
    #[error("position {position} holds element {actual} but element {expected} was expected")]
    ElementOrderMismatch {
        /// Position within the ordered design domain.
        position: usize,
        /// Element that belongs at `position`.
        expected: ElementId,
        /// Element that was found instead.
        actual: ElementId,
    },
    /// Returned when a truss member has no cross-sectional area.
    #[error("member {0:?} has no cross-sectional area")]
    MissingArea(EdgeIndex),
    /// Returned when a truss member spans zero distance.
    #[error("member {0:?} has zero length")]
    ZeroLengthMember(EdgeIndex),
    /// Backend specific failure description.
    #[error("analysis backend failed: {0}")]
    Backend(String),
}

/// Error returned when editing one of the bundled structural models with invalid input.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ModelError {
    /// Returned when a joint cannot be found in the truss.
    #[error("joint {0:?} does not exist in this truss")]
    UnknownJoint(NodeIndex),
    /// Returned when a member cannot be found in the truss.
    #[error("member {0:?} does not exist in this truss")]
    UnknownMember(EdgeIndex),
    /// Returned when a grid node lies outside the grid.
    #[error("node ({ix}, {iy}) lies outside the grid")]
    UnknownNode {
        /// Column of the node.
        ix: usize,
        /// Row of the node.
        iy: usize,
    },
    /// Returned when a grid has no elements in one direction.
    #[error("grid must have at least one element in each direction")]
    EmptyGrid,
    /// Returned when a physical property is not strictly positive and finite.
    #[error("{name} must be positive (received {value})")]
    NonPositive {
        /// Name of the rejected property.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// Returned when the Poisson ratio would make the material law singular.
    #[error("Poisson ratio must lie in (-1, 0.5) (received {0})")]
    PoissonRatio(f64),
}

/// Error returned when an optimization run cannot start.
#[derive(Debug, Error)]
pub enum OptimizationError {
    /// Returned when the configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Returned when the evaluator exposes no elements.
    #[error("design domain has no elements")]
    EmptyDomain,
    /// Returned when the initial density vector does not match the design domain.
    #[error("expected {expected} initial densities but received {actual}")]
    DensityLength {
        /// Number of elements in the design domain.
        expected: usize,
        /// Number of densities supplied.
        actual: usize,
    },
    /// Returned when an initial density lies outside `[0, 1]`.
    #[error("initial density of element {element} must lie in [0, 1] (received {value})")]
    DensityOutOfBounds {
        /// Identifier of the offending element.
        element: ElementId,
        /// Rejected density.
        value: f64,
    },
}

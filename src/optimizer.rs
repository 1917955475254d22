//! Iteration driver coupling the density update to repeated structural analyses.

use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::OptimizationConfig;
use crate::domain::{mean_density, ElementId};
use crate::errors::{EvaluationError, ExtractionError, OptimizationError};
use crate::evaluator::{FeEvaluator, SedSample, StiffnessAssignment};
use crate::oc::{self, SED_FLOOR};
use crate::penalization::SimpLaw;

/// Summary of one outer iteration.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IterationRecord {
    /// Zero-based iteration index.
    pub iteration: usize,
    /// Largest density change produced by the update.
    pub change: f64,
    /// Mean density after the update.
    pub mean_density: f64,
    /// Bisection steps used by the update.
    pub bisection_iterations: usize,
    /// Whether the bisection bracket closed within its step cap.
    pub bisection_converged: bool,
    /// Elements whose strain energy density was replaced by the floor value.
    pub fallback_elements: Vec<ElementId>,
    /// Largest floored strain energy density before normalization.
    pub sed_scale: f64,
}

/// Reason an optimization run stopped.
#[derive(Clone, Debug, PartialEq)]
pub enum Termination {
    /// The density change dropped below the tolerance.
    Converged,
    /// The iteration limit was reached first.
    IterationLimit,
    /// The wall-clock budget ran out before the next iteration.
    TimeBudget,
    /// The structural analysis failed and the run could not continue.
    EvaluatorFailed(EvaluationError),
}

/// Densities and history returned by [`optimize`].
#[derive(Clone, Debug, PartialEq)]
pub struct OptimizationResult {
    /// Elements of the design domain in order.
    pub elements: Vec<ElementId>,
    /// Final densities, all within `[0, 1]`.
    pub densities: Vec<f64>,
    /// One record per completed iteration.
    pub history: Vec<IterationRecord>,
    /// Why the run stopped.
    pub termination: Termination,
}

impl OptimizationResult {
    /// Whether the run stopped because the design converged.
    #[must_use]
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }

    /// Number of completed iterations.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.history.len()
    }

    /// Mean of the final densities.
    #[must_use]
    pub fn volume_fraction(&self) -> f64 {
        mean_density(&self.densities)
    }

    /// Final densities paired with their elements.
    pub fn densities_by_element(&self) -> impl Iterator<Item = (ElementId, f64)> + '_ {
        self.elements
            .iter()
            .copied()
            .zip(self.densities.iter().copied())
    }

    /// History as JSON, one object per line.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if a record cannot be encoded.
    pub fn history_json(&self) -> Result<String, serde_json::Error> {
        let mut lines = Vec::with_capacity(self.history.len());
        for record in &self.history {
            lines.push(serde_json::to_string(record)?);
        }
        Ok(lines.join("\n"))
    }
}

/// Strain energy densities ready for the update.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedSed {
    /// Floored values divided by their maximum, in domain order.
    pub values: Vec<f64>,
    /// Maximum floored value the others were divided by.
    pub scale: f64,
    /// Elements that fell back to the floor value.
    pub fallback_elements: Vec<ElementId>,
}

/// Run the SIMP optimality criteria loop.
///
/// Every iteration assigns penalized stiffness, analyses the structure once, replaces
/// missing strain energy densities with [`SED_FLOOR`], normalizes them and updates the
/// densities. The run stops on convergence, on the iteration limit, when the configured
/// time budget is spent, or when the analysis fails as a whole. In every case the
/// returned densities are the last valid design.
///
/// # Errors
///
/// Returns [`OptimizationError`] when the configuration or the initial densities are
/// invalid. Analysis failures during the run are reported through
/// [`OptimizationResult::termination`] instead.
pub fn optimize<E: FeEvaluator>(
    evaluator: &mut E,
    initial: Vec<f64>,
    config: &OptimizationConfig,
) -> Result<OptimizationResult, OptimizationError> {
    config.validate()?;
    let elements = evaluator.elements().to_vec();
    validate_initial(&elements, &initial)?;

    let law = SimpLaw::from(config);
    let budget = config.time_budget();
    let started = Instant::now();
    let mut densities = initial;
    let mut history = Vec::new();

    let termination = loop {
        if history.len() >= config.max_iterations {
            info!(
                "optimization stopped after {} iterations without converging",
                history.len()
            );
            break Termination::IterationLimit;
        }
        if budget.is_some_and(|budget| started.elapsed() >= budget) {
            warn!(
                "optimization stopped after {} iterations: time budget exhausted",
                history.len()
            );
            break Termination::TimeBudget;
        }

        let iteration = history.len();
        let stiffness: Vec<StiffnessAssignment> = elements
            .iter()
            .zip(law.moduli(&densities))
            .map(|(&element, modulus)| StiffnessAssignment { element, modulus })
            .collect();

        let samples = match evaluator.evaluate(&stiffness) {
            Ok(samples) => samples,
            Err(err) => {
                error!("iteration {iteration}: structural analysis failed: {err}");
                break Termination::EvaluatorFailed(err);
            }
        };
        let sed = match normalize_sed(&elements, samples) {
            Ok(sed) => sed,
            Err(err) => {
                error!("iteration {iteration}: analysis results rejected: {err}");
                break Termination::EvaluatorFailed(err);
            }
        };

        let step = oc::update_with_limit(
            &densities,
            &sed.values,
            config.volume_fraction,
            config.move_limit,
            config.tolerance,
            config.max_bisection_iterations,
        );
        if !step.converged {
            warn!(
                "iteration {iteration}: bisection stopped after {} steps without closing the bracket",
                step.iterations
            );
        }
        densities = step.densities;

        let record = IterationRecord {
            iteration,
            change: step.change,
            mean_density: mean_density(&densities),
            bisection_iterations: step.iterations,
            bisection_converged: step.converged,
            fallback_elements: sed.fallback_elements,
            sed_scale: sed.scale,
        };
        info!(
            "iteration {}: change in densities = {:.4e}, volume fraction = {:.3}",
            iteration + 1,
            record.change,
            record.mean_density
        );
        debug!("iteration {iteration}: lambda = {:.4e}", step.lambda);
        history.push(record);

        if step.change < config.tolerance {
            info!("optimization converged after {} iterations", history.len());
            break Termination::Converged;
        }
    };

    Ok(OptimizationResult {
        elements,
        densities,
        history,
        termination,
    })
}

/// Pair analysis samples with the domain, substitute the floor for failed elements,
/// then floor and normalize every value by the maximum.
///
/// # Errors
///
/// Returns [`EvaluationError::ElementCountMismatch`] or
/// [`EvaluationError::ElementOrderMismatch`] when the samples do not follow the domain.
pub fn normalize_sed(
    elements: &[ElementId],
    samples: Vec<SedSample>,
) -> Result<NormalizedSed, EvaluationError> {
    if samples.len() != elements.len() {
        return Err(EvaluationError::ElementCountMismatch {
            expected: elements.len(),
            actual: samples.len(),
        });
    }

    let mut raw = Vec::with_capacity(samples.len());
    let mut fallback_elements = Vec::new();
    for (position, (expected, sample)) in elements.iter().zip(samples).enumerate() {
        if sample.element != *expected {
            return Err(EvaluationError::ElementOrderMismatch {
                position,
                expected: *expected,
                actual: sample.element,
            });
        }
        let value = sample.value.and_then(|value| {
            if value.is_finite() {
                Ok(value)
            } else {
                Err(ExtractionError::NonFinite {
                    element: sample.element,
                    value,
                })
            }
        });
        match value {
            Ok(value) => raw.push(value),
            Err(err) => {
                warn!("unable to extract strain energy density: {err}; using floor value");
                fallback_elements.push(sample.element);
                raw.push(SED_FLOOR);
            }
        }
    }

    let scale = raw
        .par_iter_mut()
        .map(|value| {
            *value = value.max(SED_FLOOR);
            *value
        })
        .reduce(|| SED_FLOOR, f64::max);
    raw.par_iter_mut().for_each(|value| *value /= scale);

    Ok(NormalizedSed {
        values: raw,
        scale,
        fallback_elements,
    })
}

/// Reject initial densities that do not describe a design of this domain.
fn validate_initial(elements: &[ElementId], initial: &[f64]) -> Result<(), OptimizationError> {
    if elements.is_empty() {
        return Err(OptimizationError::EmptyDomain);
    }
    if initial.len() != elements.len() {
        return Err(OptimizationError::DensityLength {
            expected: elements.len(),
            actual: initial.len(),
        });
    }
    for (&element, &value) in elements.iter().zip(initial) {
        if !(0.0..=1.0).contains(&value) {
            return Err(OptimizationError::DensityOutOfBounds { element, value });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn normalization_floors_and_scales() {
        let elements = ElementId::sequence(3);
        let samples = vec![
            SedSample::ok(ElementId(0), 4.0),
            SedSample::ok(ElementId(1), -2.0),
            SedSample::ok(ElementId(2), 2.0),
        ];
        let sed = normalize_sed(&elements, samples).expect("samples accepted");
        assert_relative_eq!(sed.scale, 4.0);
        assert_relative_eq!(sed.values[0], 1.0);
        assert_relative_eq!(sed.values[1], SED_FLOOR / 4.0);
        assert_relative_eq!(sed.values[2], 0.5);
        assert!(sed.fallback_elements.is_empty());
    }

    #[test]
    fn non_finite_values_fall_back_to_the_floor() {
        let elements = ElementId::sequence(2);
        let samples = vec![
            SedSample::ok(ElementId(0), f64::NAN),
            SedSample::ok(ElementId(1), 2.0),
        ];
        let sed = normalize_sed(&elements, samples).expect("samples accepted");
        assert_eq!(sed.fallback_elements, vec![ElementId(0)]);
        assert_relative_eq!(sed.scale, 2.0);
    }

    #[test]
    fn failed_samples_fall_back_to_the_floor() {
        let elements = ElementId::sequence(2);
        let samples = vec![
            SedSample::failed(ElementId(0), ExtractionError::Missing(ElementId(0))),
            SedSample::ok(ElementId(1), 3.0),
        ];
        let sed = normalize_sed(&elements, samples).expect("samples accepted");
        assert_eq!(sed.fallback_elements, vec![ElementId(0)]);
        assert_relative_eq!(sed.values[0], SED_FLOOR / 3.0);
        assert_relative_eq!(sed.values[1], 1.0);
    }

    #[test]
    fn all_failed_samples_normalize_to_one() {
        let elements = ElementId::sequence(2);
        let samples = elements
            .iter()
            .map(|&element| SedSample::failed(element, ExtractionError::Missing(element)))
            .collect();
        let sed = normalize_sed(&elements, samples).expect("samples accepted");
        assert_eq!(sed.values, vec![1.0, 1.0]);
        assert_eq!(sed.fallback_elements.len(), 2);
    }

    #[test]
    fn misordered_samples_are_rejected() {
        let elements = ElementId::sequence(2);
        let samples = vec![SedSample::ok(ElementId(1), 1.0), SedSample::ok(ElementId(0), 1.0)];
        let error = normalize_sed(&elements, samples).expect_err("order mismatch detected");
        assert!(matches!(
            error,
            EvaluationError::ElementOrderMismatch { position: 0, .. }
        ));
    }

    #[test]
    fn initial_densities_are_validated() {
        let elements = ElementId::sequence(2);
        assert!(matches!(
            validate_initial(&[], &[]),
            Err(OptimizationError::EmptyDomain)
        ));
        assert!(matches!(
            validate_initial(&elements, &[0.5]),
            Err(OptimizationError::DensityLength { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            validate_initial(&elements, &[0.5, f64::NAN]),
            Err(OptimizationError::DensityOutOfBounds { element: ElementId(1), .. })
        ));
        validate_initial(&elements, &[0.0, 1.0]).expect("bounds are inclusive");
    }
}

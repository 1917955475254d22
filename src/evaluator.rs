//! Contract between the optimizer and a structural analysis backend.

use crate::domain::ElementId;
use crate::errors::{EvaluationError, ExtractionError};

/// Stiffness assigned to one element before an analysis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StiffnessAssignment {
    /// Element receiving the stiffness.
    pub element: ElementId,
    /// Elastic modulus of the element.
    pub modulus: f64,
}

/// Strain energy density reported for one element after an analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct SedSample {
    /// Element the value belongs to.
    pub element: ElementId,
    /// Extracted value, or the reason it could not be extracted.
    pub value: Result<f64, ExtractionError>,
}

impl SedSample {
    /// Successful sample.
    #[must_use]
    pub const fn ok(element: ElementId, value: f64) -> Self {
        Self {
            element,
            value: Ok(value),
        }
    }

    /// Failed sample.
    #[must_use]
    pub const fn failed(element: ElementId, error: ExtractionError) -> Self {
        Self {
            element,
            value: Err(error),
        }
    }
}

/// Linear static analysis that turns element stiffness into strain energy density.
///
/// Implementations may keep and mutate an internal structural model, but the optimizer
/// treats a call as a function from stiffness values to strain energy densities.
pub trait FeEvaluator {
    /// Elements of the design domain in their stable order.
    fn elements(&self) -> &[ElementId];

    /// Analyse the structure with the given stiffness, one entry per element in the
    /// order of [`FeEvaluator::elements`].
    ///
    /// A sample must be returned for every element. Elements whose value cannot be
    /// extracted are reported through [`SedSample::value`].
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError`] when the analysis as a whole fails.
    fn evaluate(
        &mut self,
        stiffness: &[StiffnessAssignment],
    ) -> Result<Vec<SedSample>, EvaluationError>;
}

impl<E: FeEvaluator + ?Sized> FeEvaluator for &mut E {
    fn elements(&self) -> &[ElementId] {
        (**self).elements()
    }

    fn evaluate(
        &mut self,
        stiffness: &[StiffnessAssignment],
    ) -> Result<Vec<SedSample>, EvaluationError> {
        (**self).evaluate(stiffness)
    }
}

/// Adapter turning a closure into an [`FeEvaluator`].
///
/// # Examples
/// ```
/// use simpx::{ClosureEvaluator, ElementId, FeEvaluator, SedSample, StiffnessAssignment};
///
/// let mut evaluator = ClosureEvaluator::new(ElementId::sequence(2), |stiffness: &[StiffnessAssignment]| {
///     Ok(stiffness
///         .iter()
///         .map(|entry| SedSample::ok(entry.element, 1.0 / entry.modulus))
///         .collect())
/// });
/// let assignment = [
///     StiffnessAssignment { element: ElementId(0), modulus: 2.0 },
///     StiffnessAssignment { element: ElementId(1), modulus: 4.0 },
/// ];
/// let samples = evaluator.evaluate(&assignment).expect("closure succeeds");
/// assert_eq!(samples[1].value, Ok(0.25));
/// ```
pub struct ClosureEvaluator<F> {
    /// Elements of the design domain.
    elements: Vec<ElementId>,
    /// Analysis callback.
    analyse: F,
}

impl<F> ClosureEvaluator<F>
where
    F: FnMut(&[StiffnessAssignment]) -> Result<Vec<SedSample>, EvaluationError>,
{
    /// Wrap `analyse` for the given ordered elements.
    pub fn new(elements: Vec<ElementId>, analyse: F) -> Self {
        Self { elements, analyse }
    }
}

impl<F> FeEvaluator for ClosureEvaluator<F>
where
    F: FnMut(&[StiffnessAssignment]) -> Result<Vec<SedSample>, EvaluationError>,
{
    fn elements(&self) -> &[ElementId] {
        &self.elements
    }

    fn evaluate(
        &mut self,
        stiffness: &[StiffnessAssignment],
    ) -> Result<Vec<SedSample>, EvaluationError> {
        (self.analyse)(stiffness)
    }
}

/// Check that `stiffness` covers `elements` in order.
///
/// Backends call this before mutating their model.
///
/// # Errors
///
/// Returns [`EvaluationError::ElementCountMismatch`] or
/// [`EvaluationError::ElementOrderMismatch`].
pub fn check_assignment(
    elements: &[ElementId],
    stiffness: &[StiffnessAssignment],
) -> Result<(), EvaluationError> {
    if elements.len() != stiffness.len() {
        return Err(EvaluationError::ElementCountMismatch {
            expected: elements.len(),
            actual: stiffness.len(),
        });
    }
    for (position, (expected, entry)) in elements.iter().zip(stiffness).enumerate() {
        if *expected != entry.element {
            return Err(EvaluationError::ElementOrderMismatch {
                position,
                expected: *expected,
                actual: entry.element,
            });
        }
    }
    Ok(())
}

/// Turn a raw value into a sample, flagging NaN and infinities.
#[must_use]
pub fn finite_sample(element: ElementId, value: f64) -> SedSample {
    if value.is_finite() {
        SedSample::ok(element, value)
    } else {
        SedSample::failed(element, ExtractionError::NonFinite { element, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(ids: &[usize]) -> Vec<StiffnessAssignment> {
        ids.iter()
            .map(|&id| StiffnessAssignment {
                element: ElementId(id),
                modulus: 1.0,
            })
            .collect()
    }

    #[test]
    fn assignment_must_match_domain_order() {
        let elements = ElementId::sequence(3);
        check_assignment(&elements, &assignment(&[0, 1, 2])).expect("ordered assignment");

        let error = check_assignment(&elements, &assignment(&[0, 2, 1]))
            .expect_err("swapped elements rejected");
        assert_eq!(
            error,
            EvaluationError::ElementOrderMismatch {
                position: 1,
                expected: ElementId(1),
                actual: ElementId(2),
            }
        );

        let error =
            check_assignment(&elements, &assignment(&[0, 1])).expect_err("short assignment");
        assert_eq!(
            error,
            EvaluationError::ElementCountMismatch {
                expected: 3,
                actual: 2,
            }
        );
    }

    #[test]
    fn non_finite_values_become_extraction_failures() {
        let sample = finite_sample(ElementId(4), f64::INFINITY);
        assert!(matches!(
            sample.value,
            Err(ExtractionError::NonFinite { element: ElementId(4), .. })
        ));
        assert_eq!(finite_sample(ElementId(1), 0.5).value, Ok(0.5));
    }
}

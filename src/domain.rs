//! Identity of the elements that make up a design domain.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a design element.
///
/// Densities, stiffness values and strain energy densities are always paired with the
/// element they belong to so that the correspondence can be checked rather than assumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub usize);

impl ElementId {
    /// Return the raw index of the element.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Create the identifiers `0..count` in order.
    ///
    /// # Examples
    /// ```
    /// use simpx::ElementId;
    ///
    /// let ids = ElementId::sequence(3);
    /// assert_eq!(ids, vec![ElementId(0), ElementId(1), ElementId(2)]);
    /// ```
    #[must_use]
    pub fn sequence(count: usize) -> Vec<Self> {
        (0..count).map(ElementId).collect()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Create an initial density vector with every element at `volume_fraction`.
#[must_use]
pub fn uniform_densities(count: usize, volume_fraction: f64) -> Vec<f64> {
    vec![volume_fraction; count]
}

/// Mean of a density vector, zero for an empty domain.
#[must_use]
pub fn mean_density(densities: &[f64]) -> f64 {
    if densities.is_empty() {
        return 0.0;
    }
    densities.iter().sum::<f64>() / densities.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_ids_display_with_hash() {
        assert_eq!(ElementId(7).to_string(), "#7");
    }

    #[test]
    fn mean_of_empty_domain_is_zero() {
        assert_eq!(mean_density(&[]), 0.0);
        assert!((mean_density(&uniform_densities(4, 0.3)) - 0.3).abs() < 1.0e-12);
    }
}

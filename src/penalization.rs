//! SIMP material interpolation.

use rayon::prelude::*;

use crate::config::OptimizationConfig;

/// Power-law stiffness interpolation `E(ρ) = ρ^p · E0`.
///
/// Intermediate densities contribute little stiffness for their volume, which pushes the
/// optimizer toward solid/void designs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimpLaw {
    /// Penalization exponent `p`.
    pub penalty: f64,
    /// Modulus of fully dense material `E0`.
    pub base_modulus: f64,
}

impl SimpLaw {
    /// Create a law from an exponent and a base modulus.
    #[must_use]
    pub const fn new(penalty: f64, base_modulus: f64) -> Self {
        Self {
            penalty,
            base_modulus,
        }
    }

    /// Penalized modulus of a single element.
    ///
    /// # Examples
    /// ```
    /// use simpx::SimpLaw;
    ///
    /// let law = SimpLaw::new(3.0, 200.0);
    /// assert!((law.modulus(0.5) - 25.0).abs() < 1.0e-12);
    /// assert_eq!(law.modulus(1.0), 200.0);
    /// ```
    #[must_use]
    pub fn modulus(&self, density: f64) -> f64 {
        density.powf(self.penalty) * self.base_modulus
    }

    /// Penalized modulus of every element, in domain order.
    #[must_use]
    pub fn moduli(&self, densities: &[f64]) -> Vec<f64> {
        densities
            .par_iter()
            .map(|&density| self.modulus(density))
            .collect()
    }
}

impl From<&OptimizationConfig> for SimpLaw {
    fn from(config: &OptimizationConfig) -> Self {
        Self::new(config.penalty, config.base_modulus)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn void_and_solid_map_to_bounds() {
        let law = SimpLaw::new(3.0, 210_000.0);
        assert_eq!(law.modulus(0.0), 0.0);
        assert_relative_eq!(law.modulus(1.0), 210_000.0);
    }

    #[test]
    fn intermediate_density_is_penalized() {
        let law = SimpLaw::from(&OptimizationConfig::default());
        let moduli = law.moduli(&[0.25, 0.5, 0.75]);
        assert_relative_eq!(moduli[0], 0.015_625 * 210_000.0, max_relative = 1.0e-12);
        assert_relative_eq!(moduli[1], 0.125 * 210_000.0, max_relative = 1.0e-12);
        assert_relative_eq!(moduli[2], 0.421_875 * 210_000.0, max_relative = 1.0e-12);
        for (density, modulus) in [0.25, 0.5, 0.75].iter().zip(&moduli) {
            assert!(*modulus < density * 210_000.0);
        }
    }
}

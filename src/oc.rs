//! Optimality criteria density update.
//!
//! The update searches for the Lagrange multiplier of the volume constraint by bisection.
//! For every trial multiplier `λ` each element receives the candidate density
//! `ρ · sqrt(sed / λ)`, clipped first to the move limit around the current density and
//! then to `[0, 1]`. The volume of the candidate is non-increasing in `λ`, so the bracket
//! `[0, sum(sed)]` can be halved until it is narrower than the tolerance.

/// Smallest strain energy density used anywhere in the update.
pub const SED_FLOOR: f64 = 1.0e-12;

/// Bisection steps allowed inside one update unless configured otherwise.
pub const DEFAULT_MAX_BISECTION_ITERATIONS: usize = 50;

/// Result of one optimality criteria update.
#[derive(Clone, Debug, PartialEq)]
pub struct OcStep {
    /// Updated densities, in domain order.
    pub densities: Vec<f64>,
    /// Largest absolute change of any density.
    pub change: f64,
    /// Multiplier that produced `densities`.
    pub lambda: f64,
    /// Number of bisection steps performed.
    pub iterations: usize,
    /// Whether the multiplier bracket shrank below the tolerance.
    pub converged: bool,
}

/// Update densities with the default bisection cap.
///
/// `sed` should be positive; entries below [`SED_FLOOR`] (including zero and NaN) are
/// treated as the floor.
///
/// # Panics
///
/// Panics when `densities` and `sed` differ in length, when `move_limit` is negative or
/// NaN, or when a density is NaN.
///
/// # Examples
/// ```
/// use simpx::oc;
///
/// let step = oc::update(&[0.5, 0.5], &[1.0, 100.0], 0.5, 0.3, 1.0e-4);
/// assert!(step.densities[1] > step.densities[0]);
/// assert!((step.densities.iter().sum::<f64>() - 1.0).abs() < 1.0e-3);
/// ```
#[must_use]
pub fn update(
    densities: &[f64],
    sed: &[f64],
    volume_fraction: f64,
    move_limit: f64,
    tolerance: f64,
) -> OcStep {
    update_with_limit(
        densities,
        sed,
        volume_fraction,
        move_limit,
        tolerance,
        DEFAULT_MAX_BISECTION_ITERATIONS,
    )
}

/// Update densities, performing at most `max_iterations` bisection steps.
///
/// The last candidate is returned even when the bracket never closes; it always
/// respects the move limit and the `[0, 1]` bounds.
///
/// # Panics
///
/// Panics when `densities` and `sed` differ in length, when `move_limit` is negative or
/// NaN, or when a density is NaN.
#[must_use]
pub fn update_with_limit(
    densities: &[f64],
    sed: &[f64],
    volume_fraction: f64,
    move_limit: f64,
    tolerance: f64,
    max_iterations: usize,
) -> OcStep {
    assert_eq!(
        densities.len(),
        sed.len(),
        "one strain energy density per element is required"
    );
    let sed: Vec<f64> = sed.iter().map(|&value| value.max(SED_FLOOR)).collect();
    let target_volume = volume_fraction * densities.len() as f64;

    let mut lower = 0.0;
    let mut upper: f64 = sed.iter().sum();
    let mut lambda;
    let mut candidate;
    let mut iterations = 0;
    loop {
        lambda = (0.5 * (lower + upper)).max(f64::MIN_POSITIVE);
        candidate = candidate_densities(densities, &sed, lambda, move_limit);
        iterations += 1;

        let volume: f64 = candidate.iter().sum();
        if volume > target_volume {
            lower = lambda;
        } else {
            upper = lambda;
        }

        if upper - lower <= tolerance || iterations >= max_iterations {
            break;
        }
    }

    let change = densities
        .iter()
        .zip(&candidate)
        .map(|(old, new)| (new - old).abs())
        .fold(0.0, f64::max)
        .min(move_limit);

    OcStep {
        densities: candidate,
        change,
        lambda,
        iterations,
        converged: upper - lower <= tolerance,
    }
}

/// Candidate densities for a trial multiplier, move limit first and box bounds second.
fn candidate_densities(densities: &[f64], sed: &[f64], lambda: f64, move_limit: f64) -> Vec<f64> {
    densities
        .iter()
        .zip(sed)
        .map(|(&density, &energy)| {
            let ideal = density * (energy / lambda).sqrt();
            ideal
                .clamp(density - move_limit, density + move_limit)
                .clamp(0.0, 1.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const TOL: f64 = 1.0e-4;

    /// Deterministic pseudo-random values in `[0, 1)`.
    fn samples(seed: u64, count: usize) -> Vec<f64> {
        let mut state = seed;
        (0..count)
            .map(|_| {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                (state >> 11) as f64 / (1u64 << 53) as f64
            })
            .collect()
    }

    fn assert_valid(old: &[f64], step: &OcStep, move_limit: f64) {
        for (before, after) in old.iter().zip(&step.densities) {
            assert!((0.0..=1.0).contains(after), "density {after} out of bounds");
            assert!(
                (after - before).abs() <= move_limit + 1.0e-12,
                "move limit violated: {before} -> {after}"
            );
        }
    }

    #[test]
    fn uniform_energy_at_target_is_stationary() {
        let old = [0.5; 4];
        let step = update(&old, &[1.0; 4], 0.5, 1.0, TOL);
        for density in &step.densities {
            assert_relative_eq!(*density, 0.5, epsilon = 1.0e-3);
        }
        assert!(step.change < 1.0e-3);
        assert!(step.converged);
    }

    #[test]
    fn higher_energy_element_keeps_more_material() {
        let old = [0.5, 0.5];
        let step = update(&old, &[1.0, 100.0], 0.5, 0.3, TOL);
        assert!(step.densities[1] > step.densities[0]);
        assert_relative_eq!(step.densities.iter().sum::<f64>(), 1.0, epsilon = 1.0e-3);
        assert_valid(&old, &step, 0.3);
    }

    #[test]
    fn tight_move_limit_bounds_every_change() {
        let old = samples(3, 32);
        let sed: Vec<f64> = samples(11, 32).iter().map(|value| value * 1.0e3).collect();
        let step = update(&old, &sed, 0.3, 0.01, TOL);
        assert_valid(&old, &step, 0.01);
        assert!(step.change <= 0.01 + 1.0e-12);
    }

    #[test]
    fn reported_change_never_exceeds_move_limit() {
        let old = [0.5, 0.5];
        let step = update(&old, &[1.0e-6, 1.0], 0.5, 0.01, TOL);
        assert_relative_eq!(step.densities[0], 0.49, epsilon = 1.0e-15);
        assert!(step.change <= 0.01);
    }

    #[test]
    #[should_panic]
    fn nan_move_limit_panics() {
        let _ = update(&[0.5, 0.5], &[1.0, 1.0], 0.5, f64::NAN, TOL);
    }

    #[test]
    fn zero_energy_does_not_divide_by_zero() {
        let old = [0.5, 0.5, 0.5];
        let step = update(&old, &[0.0, 1.0, 0.5], 0.5, 0.2, TOL);
        assert!(step.densities.iter().all(|density| density.is_finite()));
        assert_valid(&old, &step, 0.2);
        assert!(step.densities[0] < step.densities[1]);

        let all_zero = update(&old, &[0.0; 3], 0.5, 0.2, TOL);
        assert!(all_zero.densities.iter().all(|density| density.is_finite()));
        assert_valid(&old, &all_zero, 0.2);
    }

    #[test]
    fn update_is_pure() {
        let old = samples(5, 16);
        let sed = samples(9, 16);
        let first = update(&old, &sed, 0.4, 0.2, TOL);
        let second = update(&old, &sed, 0.4, 0.2, TOL);
        assert_eq!(first, second);
    }

    #[test]
    fn bisection_cap_still_yields_valid_densities() {
        let old = samples(21, 24);
        let sed = samples(42, 24);
        let step = update_with_limit(&old, &sed, 0.5, 0.2, 1.0e-30, 3);
        assert_eq!(step.iterations, 3);
        assert!(!step.converged);
        assert_valid(&old, &step, 0.2);
    }

    #[test]
    fn bounds_and_move_limit_hold_for_random_inputs() {
        for seed in 0..20 {
            let old = samples(seed, 20);
            let sed = samples(seed + 100, 20);
            let move_limit = 0.05 + 0.5 * samples(seed + 200, 1)[0];
            let step = update(&old, &sed, 0.5, move_limit, TOL);
            assert_valid(&old, &step, move_limit);
            assert!(step.iterations <= DEFAULT_MAX_BISECTION_ITERATIONS);
        }
    }

    #[test]
    fn degenerate_bracket_still_produces_a_candidate() {
        let old = [0.2, 0.8];
        let step = update(&old, &[SED_FLOOR, SED_FLOOR], 0.5, 0.1, TOL);
        assert_eq!(step.iterations, 1);
        assert_eq!(step.densities.len(), 2);
        assert_valid(&old, &step, 0.1);
    }
}

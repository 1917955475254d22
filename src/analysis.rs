use simpx::{
    optimize, uniform_densities, FeEvaluator, OptimizationConfig, OptimizationError,
    OptimizationResult, PlaneStressGrid,
};

/// Outcome of the plate optimization together with what is needed to draw it.
#[derive(Debug, Clone)]
pub struct OptimizationSummary {
    /// Number of elements along X and Y.
    pub shape: (usize, usize),
    /// Compliance of the last analysed design.
    pub compliance: f64,
    /// Densities, history and termination of the run.
    pub result: OptimizationResult,
}

/// Optimize the plate starting from a uniform design at the target volume fraction.
pub fn run_optimization(
    grid: &mut PlaneStressGrid,
    config: &OptimizationConfig,
) -> Result<OptimizationSummary, OptimizationError> {
    let initial = uniform_densities(grid.elements().len(), config.volume_fraction);
    let result = optimize(grid, initial, config)?;
    Ok(OptimizationSummary {
        shape: grid.shape(),
        compliance: grid.compliance(),
        result,
    })
}

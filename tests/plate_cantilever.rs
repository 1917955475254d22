#![warn(clippy::pedantic)]

use simpx::{
    optimize, uniform_densities, Edge, FeEvaluator, OptimizationConfig, PlanarForce,
    PlaneStressGrid, SimpLaw, StiffnessAssignment, Termination,
};

fn build_plate(config: &OptimizationConfig) -> PlaneStressGrid {
    let mut grid = PlaneStressGrid::new(20, 6, 50.0).expect("valid grid");
    grid.set_min_modulus(config.base_modulus * 1.0e-9)
        .expect("positive modulus");
    grid.fix_edge(Edge::Left);
    grid.distribute_edge_load(Edge::Right, PlanarForce::new(0.0, -1_000.0));
    grid
}

fn compliance_of(grid: &mut PlaneStressGrid, densities: &[f64], config: &OptimizationConfig) -> f64 {
    let law = SimpLaw::from(config);
    let stiffness: Vec<StiffnessAssignment> = grid
        .elements()
        .iter()
        .zip(law.moduli(densities))
        .map(|(&element, modulus)| StiffnessAssignment { element, modulus })
        .collect();
    grid.evaluate(&stiffness).expect("plate is supported");
    grid.compliance()
}

#[test]
fn optimized_plate_is_stiffer_at_same_volume() {
    let config = OptimizationConfig {
        max_iterations: 30,
        tolerance: 1.0e-5,
        ..OptimizationConfig::default()
    };
    let mut grid = build_plate(&config);
    let initial = uniform_densities(grid.elements().len(), config.volume_fraction);
    let initial_compliance = compliance_of(&mut grid, &initial, &config);

    let result = optimize(&mut grid, initial, &config).expect("valid inputs");
    assert!(matches!(
        result.termination,
        Termination::Converged | Termination::IterationLimit
    ));
    assert!(result.densities.iter().all(|d| (0.0..=1.0).contains(d)));
    assert!((result.volume_fraction() - 0.5).abs() < 0.02);
    assert!(result
        .history
        .iter()
        .all(|record| record.fallback_elements.is_empty()));

    let optimized_compliance = compliance_of(&mut grid, &result.densities, &config);
    assert!(optimized_compliance < initial_compliance);
}

#[test]
fn material_gathers_at_clamped_fibres() {
    let config = OptimizationConfig {
        max_iterations: 30,
        tolerance: 1.0e-5,
        ..OptimizationConfig::default()
    };
    let mut grid = build_plate(&config);
    let initial = uniform_densities(grid.elements().len(), config.volume_fraction);
    let result = optimize(&mut grid, initial, &config).expect("valid inputs");

    let (_, nely) = grid.shape();
    for ey in [0, nely - 1] {
        let element = grid.element_at(0, ey).expect("corner element exists");
        assert!(result.densities[element.index()] > 0.5);
    }
}

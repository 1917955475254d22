use simpx::{
    optimize, uniform_densities, Edge, FeEvaluator, GridNode, OptimizationConfig, PlanarForce,
    PlaneStressGrid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = OptimizationConfig::from_json_str(
        r#"{ "volume_fraction": 0.4, "max_iterations": 40, "time_budget_secs": 60.0 }"#,
    )?;

    // 600 x 200 plate clamped on the left and loaded at mid-height on the right
    let mut grid = PlaneStressGrid::new(30, 10, 20.0)?;
    grid.set_min_modulus(config.base_modulus * 1.0e-9)?;
    grid.fix_edge(Edge::Left);
    let (nelx, nely) = grid.shape();
    grid.set_load(GridNode::new(nelx, nely / 2), PlanarForce::new(0.0, -1_000.0))?;

    let initial = uniform_densities(grid.elements().len(), config.volume_fraction);
    let result = optimize(&mut grid, initial, &config)?;

    for record in &result.history {
        println!(
            "it. {:3}  change {:.4}  volume {:.3}",
            record.iteration + 1,
            record.change,
            record.mean_density
        );
    }
    println!("{:?}, compliance {:.4e}", result.termination, grid.compliance());
    let solid = result
        .densities_by_element()
        .filter(|&(_, density)| density > 0.5)
        .count();
    println!("{solid} of {} elements are solid", result.elements.len());

    Ok(())
}

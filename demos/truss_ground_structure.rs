use simpx::{force, optimize, point, FeEvaluator, OptimizationConfig, Truss};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Three columns of two joints in the XY plane, left column clamped
    let mut truss = Truss::new();
    let mut joints = Vec::new();
    for ix in 0..3 {
        for iy in 0..2 {
            let joint = truss.add_joint(point(f64::from(ix), f64::from(iy), 0.0));
            truss.set_support(joint, [ix == 0, ix == 0, true])?;
            joints.push(joint);
        }
    }
    truss.set_load(joints[4], force(0.0, -10_000.0, 0.0))?;

    // Connect every pair of neighbouring joints, diagonals included
    let mut members = Vec::new();
    for (i, &start) in joints.iter().enumerate() {
        for &end in &joints[i + 1..] {
            let a = start.index();
            let b = end.index();
            let (dx, dy) = ((a / 2).abs_diff(b / 2), (a % 2).abs_diff(b % 2));
            if dx <= 1 && dy <= 1 {
                members.push((start, end, truss.add_member(start, end)?));
            }
        }
    }
    truss.set_area_for_all(1.0e-3)?;
    truss.set_min_modulus(1.0)?;

    let config = OptimizationConfig {
        volume_fraction: 0.4,
        base_modulus: 210.0e9,
        ..OptimizationConfig::default()
    };
    let initial = vec![config.volume_fraction; truss.elements().len()];
    let result = optimize(&mut truss, initial, &config)?;

    println!(
        "{:?} after {} iterations",
        result.termination,
        result.iterations()
    );
    for (start, end, member) in members {
        if let Some(element) = truss.element_of(member) {
            println!(
                "member {} -> {}: density {:.3}",
                start.index(),
                end.index(),
                result.densities[element.index()]
            );
        }
    }

    Ok(())
}

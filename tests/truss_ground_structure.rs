#![warn(clippy::pedantic)]

use approx::assert_relative_eq;
use petgraph::graph::{EdgeIndex, NodeIndex};
use simpx::{force, optimize, point, FeEvaluator, OptimizationConfig, Termination, Truss};

#[derive(Debug, Clone, Copy)]
struct GroundStructure {
    loaded_joint: NodeIndex,
    horizontal: EdgeIndex,
    diagonal: EdgeIndex,
}

/// Two bars meeting at a joint pulled along the horizontal bar; the diagonal carries
/// no force.
fn build_ground_structure() -> (Truss, GroundStructure) {
    let mut truss = Truss::new();
    let lower = truss.add_joint(point(0.0, 0.0, 0.0));
    let upper = truss.add_joint(point(0.0, 1.0, 0.0));
    let loaded_joint = truss.add_joint(point(1.0, 0.0, 0.0));
    truss
        .set_support(lower, [true, true, true])
        .expect("support applied");
    truss
        .set_support(upper, [true, true, true])
        .expect("support applied");
    truss
        .set_support(loaded_joint, [false, false, true])
        .expect("support applied");
    truss
        .set_load(loaded_joint, force(1_000.0, 0.0, 0.0))
        .expect("load applied");

    let horizontal = truss.add_member(lower, loaded_joint).expect("joints exist");
    let diagonal = truss.add_member(upper, loaded_joint).expect("joints exist");
    truss.set_area_for_all(0.01).expect("area accepted");
    truss.set_min_modulus(1.0).expect("modulus accepted");

    (
        truss,
        GroundStructure {
            loaded_joint,
            horizontal,
            diagonal,
        },
    )
}

#[test]
fn members_map_to_elements_in_order() {
    let (truss, geometry) = build_ground_structure();
    assert_eq!(truss.member_count(), 2);
    assert_eq!(truss.elements().len(), 2);
    assert_eq!(truss.element_of(geometry.horizontal).map(|e| e.index()), Some(0));
    assert_eq!(truss.element_of(geometry.diagonal).map(|e| e.index()), Some(1));
}

#[test]
fn unloaded_member_is_removed() {
    let (mut truss, geometry) = build_ground_structure();
    let config = OptimizationConfig {
        base_modulus: 200.0e9,
        ..OptimizationConfig::default()
    };

    let result = optimize(&mut truss, vec![0.5, 0.5], &config).expect("valid inputs");
    assert_eq!(result.termination, Termination::Converged);
    assert!(result.iterations() <= 6);

    let horizontal = truss.element_of(geometry.horizontal).expect("member exists");
    let diagonal = truss.element_of(geometry.diagonal).expect("member exists");
    assert!(result.densities[horizontal.index()] > 0.99);
    assert!(result.densities[diagonal.index()] < 0.01);
    assert_relative_eq!(result.volume_fraction(), 0.5, epsilon = 1.0e-3);

    // The last analysis used a design whose horizontal bar is already nearly solid.
    let displacement = truss
        .joint_displacement(geometry.loaded_joint)
        .expect("joint exists");
    assert_relative_eq!(
        displacement.x,
        1_000.0 / (0.01 * 200.0e9),
        max_relative = 1.0e-3
    );
    assert_relative_eq!(
        truss.member_strain(geometry.diagonal).expect("member exists"),
        0.0,
        epsilon = 1.0e-12
    );
}

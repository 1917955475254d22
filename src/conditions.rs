use simpx::{Edge, ModelError, OptimizationConfig, PlanarForce, PlaneStressGrid};

/// Geometry, section and load of the cantilever plate demonstration, in N and mm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlateProperties {
    /// Span of the plate along X.
    pub length: f64,
    /// Depth of the plate along Y.
    pub height: f64,
    /// Side length of the square elements.
    pub element_size: f64,
    /// Shell thickness.
    pub thickness: f64,
    /// Poisson ratio of the steel.
    pub poisson_ratio: f64,
    /// Total vertical load spread along the free edge.
    pub tip_load: f64,
}

impl Default for PlateProperties {
    fn default() -> Self {
        Self {
            length: 1_000.0,
            height: 300.0,
            element_size: 25.0,
            thickness: 5.0,
            poisson_ratio: 0.2,
            tip_load: -1_000.0,
        }
    }
}

impl PlateProperties {
    /// Number of elements along X and Y.
    pub fn divisions(&self) -> (usize, usize) {
        (
            (self.length / self.element_size).round() as usize,
            (self.height / self.element_size).round() as usize,
        )
    }
}

/// Mesh the plate, clamp the left edge and load the right edge.
///
/// Void elements keep a billionth of the base modulus so the stiffness matrix stays
/// invertible.
pub fn build_cantilever_plate(
    properties: &PlateProperties,
    config: &OptimizationConfig,
) -> Result<PlaneStressGrid, ModelError> {
    let (nelx, nely) = properties.divisions();
    let mut grid = PlaneStressGrid::new(nelx, nely, properties.element_size)?;
    grid.set_thickness(properties.thickness)?;
    grid.set_poisson_ratio(properties.poisson_ratio)?;
    grid.set_min_modulus(config.base_modulus * 1.0e-9)?;

    grid.fix_edge(Edge::Left);
    grid.distribute_edge_load(Edge::Right, PlanarForce::new(0.0, properties.tip_load));
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use simpx::FeEvaluator;

    #[test]
    fn plate_matches_tutorial_layout() {
        let properties = PlateProperties::default();
        assert_eq!(properties.divisions(), (40, 12));
        let grid = build_cantilever_plate(&properties, &OptimizationConfig::default())
            .expect("plate builds");
        assert_eq!(grid.elements().len(), 480);
        assert_eq!(grid.shape(), (40, 12));
    }
}

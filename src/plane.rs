//! Structured grid of bilinear plane-stress elements.
//!
//! Nodes are numbered column by column, `ix * (nely + 1) + iy`, with `iy` counted upward
//! from the bottom edge. Elements follow the same column-major order, `ex * nely + ey`,
//! and their four corners are taken counter-clockwise from the lower left.

use nalgebra::{DMatrix, DVector, SMatrix, SVector, Vector2};

use crate::domain::ElementId;
use crate::errors::{EvaluationError, ModelError};
use crate::evaluator::{check_assignment, finite_sample, FeEvaluator, SedSample, StiffnessAssignment};
use crate::geometry::{GridNode, PlanarForce};
use crate::solver::{scatter, solve_displacements};

/// Edge of the rectangular grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    /// Nodes with `ix == 0`.
    Left,
    /// Nodes with `ix == nelx`.
    Right,
    /// Nodes with `iy == 0`.
    Bottom,
    /// Nodes with `iy == nely`.
    Top,
}

/// Plane-stress stiffness of a square bilinear element with unit modulus and thickness.
///
/// The matrix does not depend on the side length of the square.
#[must_use]
pub fn unit_element_stiffness(poisson_ratio: f64) -> SMatrix<f64, 8, 8> {
    let nu = poisson_ratio;
    let k = [
        0.5 - nu / 6.0,
        0.125 + nu / 8.0,
        -0.25 - nu / 12.0,
        -0.125 + 3.0 * nu / 8.0,
        -0.25 + nu / 12.0,
        -0.125 - nu / 8.0,
        nu / 6.0,
        0.125 - 3.0 * nu / 8.0,
    ];
    #[rustfmt::skip]
    let pattern = [
        [0, 1, 2, 3, 4, 5, 6, 7],
        [1, 0, 7, 6, 5, 4, 3, 2],
        [2, 7, 0, 5, 6, 3, 4, 1],
        [3, 6, 5, 0, 7, 2, 1, 4],
        [4, 5, 6, 7, 0, 1, 2, 3],
        [5, 4, 3, 2, 1, 0, 7, 6],
        [6, 3, 4, 1, 2, 7, 0, 5],
        [7, 2, 1, 4, 3, 6, 5, 0],
    ];
    let scale = 1.0 / (1.0 - nu * nu);
    SMatrix::from_fn(|row, col| scale * k[pattern[row][col]])
}

/// Rectangular design domain meshed with square plane-stress elements.
///
/// # Examples
/// ```
/// use simpx::{Edge, FeEvaluator, PlanarForce, PlaneStressGrid};
///
/// let mut grid = PlaneStressGrid::new(6, 2, 10.0).expect("valid grid");
/// grid.fix_edge(Edge::Left);
/// grid.distribute_edge_load(Edge::Right, PlanarForce::new(0.0, -1.0));
/// assert_eq!(grid.elements().len(), 12);
/// assert_eq!(grid.node_count(), 21);
/// ```
#[derive(Clone, Debug)]
pub struct PlaneStressGrid {
    /// Number of elements along X.
    nelx: usize,
    /// Number of elements along Y.
    nely: usize,
    /// Side length of each element.
    element_size: f64,
    /// Out-of-plane thickness.
    thickness: f64,
    /// Smallest modulus used in the analysis.
    min_modulus: f64,
    /// Element stiffness for unit modulus and thickness.
    unit_stiffness: SMatrix<f64, 8, 8>,
    /// Restrained X and Y degrees of freedom per node.
    supports: Vec<[bool; 2]>,
    /// Point load per node.
    loads: Vec<PlanarForce>,
    /// Design elements in column-major order.
    elements: Vec<ElementId>,
    /// Nodal displacements of the last analysis.
    displacements: DVector<f64>,
}

impl PlaneStressGrid {
    /// Create an unsupported, unloaded grid of `nelx × nely` elements.
    ///
    /// Thickness defaults to 5 and the Poisson ratio to 0.2.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptyGrid`] when either count is zero and
    /// [`ModelError::NonPositive`] when `element_size` is not strictly positive.
    pub fn new(nelx: usize, nely: usize, element_size: f64) -> Result<Self, ModelError> {
        if nelx == 0 || nely == 0 {
            return Err(ModelError::EmptyGrid);
        }
        check_positive("element size", element_size)?;
        let node_count = (nelx + 1) * (nely + 1);
        Ok(Self {
            nelx,
            nely,
            element_size,
            thickness: 5.0,
            min_modulus: 1.0e-6,
            unit_stiffness: unit_element_stiffness(0.2),
            supports: vec![[false; 2]; node_count],
            loads: vec![PlanarForce::default(); node_count],
            elements: ElementId::sequence(nelx * nely),
            displacements: DVector::zeros(2 * node_count),
        })
    }

    /// Number of elements along X and Y.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.nelx, self.nely)
    }

    /// Number of nodes in the grid.
    #[must_use]
    pub fn node_count(&self) -> usize {
        (self.nelx + 1) * (self.nely + 1)
    }

    /// Set the out-of-plane thickness.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NonPositive`] when `thickness` is not strictly positive.
    pub fn set_thickness(&mut self, thickness: f64) -> Result<(), ModelError> {
        check_positive("thickness", thickness)?;
        self.thickness = thickness;
        Ok(())
    }

    /// Set the Poisson ratio of the material.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::PoissonRatio`] outside `(-1, 0.5)`.
    pub fn set_poisson_ratio(&mut self, poisson_ratio: f64) -> Result<(), ModelError> {
        if !(poisson_ratio > -1.0 && poisson_ratio < 0.5) {
            return Err(ModelError::PoissonRatio(poisson_ratio));
        }
        self.unit_stiffness = unit_element_stiffness(poisson_ratio);
        Ok(())
    }

    /// Set the smallest modulus the analysis will use for any element.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NonPositive`] when `modulus` is not strictly positive.
    pub fn set_min_modulus(&mut self, modulus: f64) -> Result<(), ModelError> {
        check_positive("minimum modulus", modulus)?;
        self.min_modulus = modulus;
        Ok(())
    }

    /// Element at column `ex` and row `ey`.
    #[must_use]
    pub fn element_at(&self, ex: usize, ey: usize) -> Option<ElementId> {
        (ex < self.nelx && ey < self.nely).then(|| ElementId(ex * self.nely + ey))
    }

    /// Nodes along one edge, in increasing order.
    #[must_use]
    pub fn edge_nodes(&self, edge: Edge) -> Vec<GridNode> {
        match edge {
            Edge::Left => (0..=self.nely).map(|iy| GridNode::new(0, iy)).collect(),
            Edge::Right => (0..=self.nely)
                .map(|iy| GridNode::new(self.nelx, iy))
                .collect(),
            Edge::Bottom => (0..=self.nelx).map(|ix| GridNode::new(ix, 0)).collect(),
            Edge::Top => (0..=self.nelx)
                .map(|ix| GridNode::new(ix, self.nely))
                .collect(),
        }
    }

    /// Restrain the X and Y degrees of freedom of a node.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownNode`] when `node` lies outside the grid.
    pub fn set_support(&mut self, node: GridNode, support: [bool; 2]) -> Result<(), ModelError> {
        let id = self.node_id(node)?;
        self.supports[id] = support;
        Ok(())
    }

    /// Clamp every node along an edge.
    pub fn fix_edge(&mut self, edge: Edge) {
        for node in self.edge_nodes(edge) {
            let id = self.node_index(node);
            self.supports[id] = [true, true];
        }
    }

    /// Replace the point load on a node.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownNode`] when `node` lies outside the grid.
    pub fn set_load(&mut self, node: GridNode, load: PlanarForce) -> Result<(), ModelError> {
        let id = self.node_id(node)?;
        self.loads[id] = load;
        Ok(())
    }

    /// Spread a total force uniformly along an edge.
    ///
    /// Each element side carries an equal share, split between its two end nodes, so
    /// corner nodes receive half the load of interior nodes. The loads are added to any
    /// already present.
    pub fn distribute_edge_load(&mut self, edge: Edge, total: PlanarForce) {
        let nodes = self.edge_nodes(edge);
        let segments = (nodes.len() - 1) as f64;
        let last = nodes.len() - 1;
        for (position, node) in nodes.into_iter().enumerate() {
            let share = if position == 0 || position == last {
                0.5 / segments
            } else {
                1.0 / segments
            };
            let id = self.node_index(node);
            let load = total.scaled(share);
            self.loads[id].x += load.x;
            self.loads[id].y += load.y;
        }
    }

    /// Displacement of a node in the last analysis.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownNode`] when `node` lies outside the grid.
    pub fn node_displacement(&self, node: GridNode) -> Result<Vector2<f64>, ModelError> {
        let id = self.node_id(node)?;
        Ok(Vector2::new(
            self.displacements[2 * id],
            self.displacements[2 * id + 1],
        ))
    }

    /// External work `fᵀu` of the last analysis.
    #[must_use]
    pub fn compliance(&self) -> f64 {
        self.loads
            .iter()
            .enumerate()
            .map(|(id, load)| {
                load.to_vector().dot(&Vector2::new(
                    self.displacements[2 * id],
                    self.displacements[2 * id + 1],
                ))
            })
            .sum()
    }

    /// Checked node index.
    fn node_id(&self, node: GridNode) -> Result<usize, ModelError> {
        if node.ix > self.nelx || node.iy > self.nely {
            return Err(ModelError::UnknownNode {
                ix: node.ix,
                iy: node.iy,
            });
        }
        Ok(self.node_index(node))
    }

    /// Node index of a node known to lie in the grid.
    fn node_index(&self, node: GridNode) -> usize {
        node.ix * (self.nely + 1) + node.iy
    }

    /// Degrees of freedom of an element, corners counter-clockwise from the lower left.
    fn element_dofs(&self, element: ElementId) -> [usize; 8] {
        let ex = element.index() / self.nely;
        let ey = element.index() % self.nely;
        let corners = [
            self.node_index(GridNode::new(ex, ey)),
            self.node_index(GridNode::new(ex + 1, ey)),
            self.node_index(GridNode::new(ex + 1, ey + 1)),
            self.node_index(GridNode::new(ex, ey + 1)),
        ];
        let mut dofs = [0; 8];
        for (slot, node) in corners.iter().enumerate() {
            dofs[2 * slot] = 2 * node;
            dofs[2 * slot + 1] = 2 * node + 1;
        }
        dofs
    }

    /// Assemble the global stiffness matrix for the given element moduli.
    fn build_stiffness_matrix(&self, moduli: &[f64]) -> DMatrix<f64> {
        let dof = 2 * self.node_count();
        let mut matrix = DMatrix::zeros(dof, dof);
        for (&element, &modulus) in self.elements.iter().zip(moduli) {
            let dofs = self.element_dofs(element);
            scatter(&mut matrix, &self.unit_stiffness, &dofs, modulus * self.thickness);
        }
        matrix
    }

    /// Assemble the global nodal load vector.
    fn build_load_vector(&self) -> DVector<f64> {
        let mut load = DVector::zeros(2 * self.node_count());
        for (id, force) in self.loads.iter().enumerate() {
            load[2 * id] = force.x;
            load[2 * id + 1] = force.y;
        }
        load
    }

    /// Determine the indices corresponding to unconstrained degrees of freedom.
    fn collect_free_dofs(&self) -> Vec<usize> {
        self.supports
            .iter()
            .enumerate()
            .flat_map(|(id, support)| {
                (0..2)
                    .filter(move |&axis| !support[axis])
                    .map(move |axis| 2 * id + axis)
            })
            .collect()
    }

    /// Strain energy density `½ E uᵀ K̂ u / h²` of one element.
    fn strain_energy_density(&self, element: ElementId, modulus: f64) -> f64 {
        let dofs = self.element_dofs(element);
        let local = SVector::<f64, 8>::from_fn(|slot, _| self.displacements[dofs[slot]]);
        let energy = local.dot(&(self.unit_stiffness * local));
        0.5 * modulus * energy / (self.element_size * self.element_size)
    }
}

impl FeEvaluator for PlaneStressGrid {
    fn elements(&self) -> &[ElementId] {
        &self.elements
    }

    fn evaluate(
        &mut self,
        stiffness: &[StiffnessAssignment],
    ) -> Result<Vec<SedSample>, EvaluationError> {
        check_assignment(&self.elements, stiffness)?;
        let moduli: Vec<f64> = stiffness
            .iter()
            .map(|entry| entry.modulus.max(self.min_modulus))
            .collect();
        let matrix = self.build_stiffness_matrix(&moduli);
        let load = self.build_load_vector();
        let free_dofs = self.collect_free_dofs();
        self.displacements = solve_displacements(&matrix, &load, &free_dofs)?;

        Ok(self
            .elements
            .iter()
            .zip(&moduli)
            .map(|(&element, &modulus)| {
                finite_sample(element, self.strain_energy_density(element, modulus))
            })
            .collect())
    }
}

/// Reject zero, negative and non-finite physical properties.
fn check_positive(name: &'static str, value: f64) -> Result<(), ModelError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ModelError::NonPositive { name, value })
    }
}

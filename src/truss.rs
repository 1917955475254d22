//! Pin-jointed ground structure whose members are design elements.

use nalgebra::{DMatrix, DVector, SMatrix, Vector3};
use petgraph::graph::{EdgeIndex, Graph, NodeIndex};

use crate::domain::ElementId;
use crate::errors::{EvaluationError, ModelError};
use crate::evaluator::{check_assignment, finite_sample, FeEvaluator, SedSample, StiffnessAssignment};
use crate::geometry::{Force, Point};
use crate::solver::{scatter, solve_displacements};

/// Internal representation of a truss joint.
#[derive(Clone, Debug)]
struct Joint {
    /// Position of the joint.
    position: Point,
    /// Indicator for each translational degree of freedom that is restrained.
    support: [bool; 3],
    /// External load applied to the joint.
    load: Force,
    /// Solved displacement of the joint.
    displacement: Vector3<f64>,
}

impl Joint {
    /// Create a free, unloaded joint at `position`.
    fn new(position: Point) -> Self {
        Self {
            position,
            support: [false; 3],
            load: Force::default(),
            displacement: Vector3::zeros(),
        }
    }
}

/// Internal representation of a truss member.
#[derive(Clone, Debug)]
struct Member {
    /// Cross-sectional area.
    area: Option<f64>,
    /// Elastic modulus used by the last analysis.
    modulus: f64,
    /// Axial strain after analysis.
    strain: f64,
}

/// Truss whose member stiffness is driven by the optimizer.
///
/// Members cannot be removed, so the element of a member is always
/// `ElementId(member.index())`.
#[derive(Debug)]
pub struct Truss {
    /// Underlying graph storage for joints and members.
    graph: Graph<Joint, Member>,
    /// Design elements, one per member in insertion order.
    elements: Vec<ElementId>,
    /// Smallest modulus used in the analysis, keeps void members from detaching joints.
    min_modulus: f64,
}

impl Default for Truss {
    fn default() -> Self {
        Self::new()
    }
}

impl Truss {
    /// Create an empty truss.
    ///
    /// # Examples
    /// ```
    /// use simpx::Truss;
    ///
    /// let truss = Truss::new();
    /// assert_eq!(truss.joint_count(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            elements: Vec::new(),
            min_modulus: 1.0e-6,
        }
    }

    /// Return the number of joints in the truss.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of members in the truss.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Add a new joint to the truss.
    pub fn add_joint(&mut self, position: Point) -> NodeIndex {
        self.graph.add_node(Joint::new(position))
    }

    /// Connect two joints with a new member, which becomes the next design element.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownJoint`] when either joint is not part of this truss.
    pub fn add_member(&mut self, start: NodeIndex, end: NodeIndex) -> Result<EdgeIndex, ModelError> {
        for joint in [start, end] {
            if self.graph.node_weight(joint).is_none() {
                return Err(ModelError::UnknownJoint(joint));
            }
        }
        let member = self.graph.add_edge(
            start,
            end,
            Member {
                area: None,
                modulus: 0.0,
                strain: 0.0,
            },
        );
        self.elements.push(ElementId(member.index()));
        Ok(member)
    }

    /// Set the restraint state for a joint, X, Y and Z in order.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownJoint`] when `joint` is not part of this truss.
    pub fn set_support(&mut self, joint: NodeIndex, support: [bool; 3]) -> Result<(), ModelError> {
        let node = self
            .graph
            .node_weight_mut(joint)
            .ok_or(ModelError::UnknownJoint(joint))?;
        node.support = support;
        Ok(())
    }

    /// Apply a point load to a joint.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownJoint`] when `joint` is not part of this truss.
    pub fn set_load(&mut self, joint: NodeIndex, load: Force) -> Result<(), ModelError> {
        let node = self
            .graph
            .node_weight_mut(joint)
            .ok_or(ModelError::UnknownJoint(joint))?;
        node.load = load;
        Ok(())
    }

    /// Set the cross-sectional area of a member.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownMember`] when `member` is not part of this truss and
    /// [`ModelError::NonPositive`] when `area` is not strictly positive.
    pub fn set_member_area(&mut self, member: EdgeIndex, area: f64) -> Result<(), ModelError> {
        let edge = self
            .graph
            .edge_weight_mut(member)
            .ok_or(ModelError::UnknownMember(member))?;
        if !(area > 0.0 && area.is_finite()) {
            return Err(ModelError::NonPositive { name: "area", value: area });
        }
        edge.area = Some(area);
        Ok(())
    }

    /// Set the same cross-sectional area on every member.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NonPositive`] when `area` is not strictly positive.
    pub fn set_area_for_all(&mut self, area: f64) -> Result<(), ModelError> {
        if !(area > 0.0 && area.is_finite()) {
            return Err(ModelError::NonPositive { name: "area", value: area });
        }
        for member in self.graph.edge_weights_mut() {
            member.area = Some(area);
        }
        Ok(())
    }

    /// Set the smallest modulus the analysis will use for any member.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NonPositive`] when `modulus` is not strictly positive.
    pub fn set_min_modulus(&mut self, modulus: f64) -> Result<(), ModelError> {
        if !(modulus > 0.0 && modulus.is_finite()) {
            return Err(ModelError::NonPositive {
                name: "minimum modulus",
                value: modulus,
            });
        }
        self.min_modulus = modulus;
        Ok(())
    }

    /// Design element corresponding to a member.
    #[must_use]
    pub fn element_of(&self, member: EdgeIndex) -> Option<ElementId> {
        self.graph
            .edge_weight(member)
            .map(|_| ElementId(member.index()))
    }

    /// Retrieve the displacement of a joint after analysis.
    #[must_use]
    pub fn joint_displacement(&self, joint: NodeIndex) -> Option<Vector3<f64>> {
        self.graph.node_weight(joint).map(|joint| joint.displacement)
    }

    /// Retrieve the axial strain of a member after analysis.
    #[must_use]
    pub fn member_strain(&self, member: EdgeIndex) -> Option<f64> {
        self.graph.edge_weight(member).map(|member| member.strain)
    }

    /// Retrieve the strain energy density `½ E ε²` of a member after analysis.
    #[must_use]
    pub fn member_strain_energy_density(&self, member: EdgeIndex) -> Option<f64> {
        self.graph
            .edge_weight(member)
            .map(|member| 0.5 * member.modulus * member.strain * member.strain)
    }

    /// External work `fᵀu` of the last analysis.
    #[must_use]
    pub fn compliance(&self) -> f64 {
        self.graph
            .node_weights()
            .map(|joint| joint.load.to_vector().dot(&joint.displacement))
            .sum()
    }

    /// Analyse the truss with the given member moduli, indexed by member.
    fn analyse(&mut self, moduli: &[f64]) -> Result<(), EvaluationError> {
        for (member, &modulus) in self.graph.edge_weights_mut().zip(moduli) {
            member.modulus = modulus.max(self.min_modulus);
        }
        let stiffness = self.build_stiffness_matrix()?;
        let load = self.build_load_vector();
        let free_dofs = self.collect_free_dofs();
        let displacements = solve_displacements(&stiffness, &load, &free_dofs)?;
        self.store_joint_displacements(&displacements);
        self.update_member_strains(&displacements);
        Ok(())
    }

    /// Unit vector and length of a member.
    fn direction(&self, edge: EdgeIndex) -> Result<(Vector3<f64>, f64), EvaluationError> {
        let (start, end) = self
            .graph
            .edge_endpoints(edge)
            .ok_or_else(|| EvaluationError::Backend(format!("member {edge:?} has no endpoints")))?;
        let delta = self.graph[end].position.to_vector() - self.graph[start].position.to_vector();
        let length = delta.norm();
        if length == 0.0 {
            return Err(EvaluationError::ZeroLengthMember(edge));
        }
        Ok((delta / length, length))
    }

    /// Global degrees of freedom of a member's end joints.
    fn member_dofs(&self, edge: EdgeIndex) -> Option<[usize; 6]> {
        let (start, end) = self.graph.edge_endpoints(edge)?;
        let start_idx = start.index() * 3;
        let end_idx = end.index() * 3;
        Some([
            start_idx,
            start_idx + 1,
            start_idx + 2,
            end_idx,
            end_idx + 1,
            end_idx + 2,
        ])
    }

    /// Assemble the global stiffness matrix for the current moduli.
    fn build_stiffness_matrix(&self) -> Result<DMatrix<f64>, EvaluationError> {
        let dof = self.joint_count() * 3;
        let mut matrix = DMatrix::zeros(dof, dof);
        for edge in self.graph.edge_indices() {
            let member = &self.graph[edge];
            let area = member.area.ok_or(EvaluationError::MissingArea(edge))?;
            let (direction, length) = self.direction(edge)?;
            let dofs = self
                .member_dofs(edge)
                .ok_or_else(|| EvaluationError::Backend(format!("member {edge:?} has no endpoints")))?;

            let projection = direction * direction.transpose();
            let mut local = SMatrix::<f64, 6, 6>::zeros();
            local.fixed_view_mut::<3, 3>(0, 0).copy_from(&projection);
            local.fixed_view_mut::<3, 3>(3, 3).copy_from(&projection);
            local.fixed_view_mut::<3, 3>(0, 3).copy_from(&(-projection));
            local.fixed_view_mut::<3, 3>(3, 0).copy_from(&(-projection));

            scatter(&mut matrix, &local, &dofs, member.modulus * area / length);
        }
        Ok(matrix)
    }

    /// Assemble the global nodal load vector.
    fn build_load_vector(&self) -> DVector<f64> {
        let mut load = DVector::zeros(self.joint_count() * 3);
        for node in self.graph.node_indices() {
            let joint = &self.graph[node];
            let base = node.index() * 3;
            load[base] = joint.load.x;
            load[base + 1] = joint.load.y;
            load[base + 2] = joint.load.z;
        }
        load
    }

    /// Determine the indices corresponding to unconstrained degrees of freedom.
    fn collect_free_dofs(&self) -> Vec<usize> {
        let mut free = Vec::new();
        for node in self.graph.node_indices() {
            let joint = &self.graph[node];
            let base = node.index() * 3;
            for axis in 0..3 {
                if !joint.support[axis] {
                    free.push(base + axis);
                }
            }
        }
        free
    }

    /// Persist solved joint displacements back to the graph representation.
    fn store_joint_displacements(&mut self, displacements: &DVector<f64>) {
        for node in self.graph.node_indices() {
            let base = node.index() * 3;
            self.graph[node].displacement = Vector3::new(
                displacements[base],
                displacements[base + 1],
                displacements[base + 2],
            );
        }
    }

    /// Compute member axial strains from the joint displacements.
    fn update_member_strains(&mut self, displacements: &DVector<f64>) {
        let edges: Vec<EdgeIndex> = self.graph.edge_indices().collect();
        for edge in edges {
            let strain = match (self.direction(edge), self.member_dofs(edge)) {
                (Ok((direction, length)), Some(dofs)) => {
                    let start = Vector3::new(
                        displacements[dofs[0]],
                        displacements[dofs[1]],
                        displacements[dofs[2]],
                    );
                    let end = Vector3::new(
                        displacements[dofs[3]],
                        displacements[dofs[4]],
                        displacements[dofs[5]],
                    );
                    direction.dot(&(end - start)) / length
                }
                _ => f64::NAN,
            };
            self.graph[edge].strain = strain;
        }
    }
}

impl FeEvaluator for Truss {
    fn elements(&self) -> &[ElementId] {
        &self.elements
    }

    fn evaluate(
        &mut self,
        stiffness: &[StiffnessAssignment],
    ) -> Result<Vec<SedSample>, EvaluationError> {
        check_assignment(&self.elements, stiffness)?;
        let moduli: Vec<f64> = stiffness.iter().map(|entry| entry.modulus).collect();
        self.analyse(&moduli)?;
        Ok(self
            .graph
            .edge_indices()
            .map(|edge| {
                let member = &self.graph[edge];
                let sed = 0.5 * member.modulus * member.strain * member.strain;
                finite_sample(ElementId(edge.index()), sed)
            })
            .collect())
    }
}

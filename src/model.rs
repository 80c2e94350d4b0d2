//! Truss model - named-entity container compiled into a [`Structure`]

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::analysis::{self, AnalysisOptions, StepRecord};
use crate::elements::{Bar, Node, Support};
use crate::error::{TrussError, TrussResult};
use crate::loads::NodeLoad;
use crate::math::{Dimension, Vec as FEVec};
use crate::results::{AnalysisResults, AnalysisSummary, BarForce, NodeDisplacement, Reactions};
use crate::structure::{BarElement, BoundaryConditions, Structure};

/// Global translation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// A pin-jointed truss model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrussModel {
    /// Plane or space truss
    pub dimension: Dimension,
    /// Nodes in the model
    pub nodes: HashMap<String, Node>,
    /// Bars in the model
    pub bars: HashMap<String, Bar>,
    /// Support conditions at nodes
    pub supports: HashMap<String, Support>,
    /// Node loads
    pub node_loads: HashMap<String, Vec<NodeLoad>>,

    /// Node names in insertion order, which fixes DOF numbering
    node_order: Vec<String>,
    /// Bar names in insertion order
    bar_order: Vec<String>,

    /// Results of the last analysis
    #[serde(skip)]
    solution: Option<AnalysisResults>,
}

impl Default for TrussModel {
    fn default() -> Self {
        Self::new(Dimension::Two)
    }
}

impl TrussModel {
    /// Create a new empty model
    pub fn new(dimension: Dimension) -> Self {
        Self {
            dimension,
            nodes: HashMap::new(),
            bars: HashMap::new(),
            supports: HashMap::new(),
            node_loads: HashMap::new(),
            node_order: Vec::new(),
            bar_order: Vec::new(),
            solution: None,
        }
    }

    /// Create an empty plane truss
    pub fn planar() -> Self {
        Self::new(Dimension::Two)
    }

    /// Create an empty space truss
    pub fn space() -> Self {
        Self::new(Dimension::Three)
    }

    // ========================
    // Model Building Methods
    // ========================

    /// Add a node to the model
    pub fn add_node(&mut self, name: &str, mut node: Node) -> TrussResult<()> {
        if self.nodes.contains_key(name) {
            return Err(TrussError::DuplicateName(name.to_string()));
        }
        if !node.is_finite() {
            return Err(TrussError::InvalidInput(format!(
                "node '{}' has non-finite coordinates",
                name
            )));
        }
        if self.dimension == Dimension::Two && node.z != 0.0 {
            return Err(TrussError::InvalidInput(format!(
                "node '{}' of a plane truss has z = {}",
                name, node.z
            )));
        }
        node.id = Some(self.node_order.len());
        self.nodes.insert(name.to_string(), node);
        self.node_order.push(name.to_string());
        self.solution = None;
        Ok(())
    }

    /// Add a bar to the model
    pub fn add_bar(&mut self, name: &str, bar: Bar) -> TrussResult<()> {
        // Validate nodes exist
        if !self.nodes.contains_key(&bar.i_node) {
            return Err(TrussError::NodeNotFound(bar.i_node.clone()));
        }
        if !self.nodes.contains_key(&bar.j_node) {
            return Err(TrussError::NodeNotFound(bar.j_node.clone()));
        }
        if self.bars.contains_key(name) {
            return Err(TrussError::DuplicateName(name.to_string()));
        }
        if bar.i_node == bar.j_node {
            return Err(TrussError::InvalidTopology(format!(
                "bar '{}' connects node '{}' to itself",
                name, bar.i_node
            )));
        }
        if !(bar.e.is_finite() && bar.e > 0.0) || !(bar.a.is_finite() && bar.a > 0.0) {
            return Err(TrussError::InvalidInput(format!(
                "bar '{}' needs positive E and A (got E={}, A={})",
                name, bar.e, bar.a
            )));
        }

        self.bars.insert(name.to_string(), bar);
        self.bar_order.push(name.to_string());
        self.solution = None;
        Ok(())
    }

    /// Add a support condition, replacing any previous one at the node
    pub fn add_support(&mut self, node_name: &str, support: Support) -> TrussResult<()> {
        if !self.nodes.contains_key(node_name) {
            return Err(TrussError::NodeNotFound(node_name.to_string()));
        }
        if self.dimension == Dimension::Two && support.enforced_dz.is_some_and(|v| v != 0.0) {
            return Err(TrussError::InvalidInput(format!(
                "support at '{}' enforces a Z displacement on a plane truss",
                node_name
            )));
        }
        self.supports.insert(node_name.to_string(), support);
        self.solution = None;
        Ok(())
    }

    /// Add a node load; several loads on one node are summed
    pub fn add_node_load(&mut self, node_name: &str, load: NodeLoad) -> TrussResult<()> {
        if !self.nodes.contains_key(node_name) {
            return Err(TrussError::NodeNotFound(node_name.to_string()));
        }
        if !load.as_array().iter().all(|v| v.is_finite()) {
            return Err(TrussError::InvalidInput(format!(
                "load on '{}' is not finite",
                node_name
            )));
        }
        if self.dimension == Dimension::Two && load.fz != 0.0 {
            return Err(TrussError::InvalidInput(format!(
                "load on '{}' has a Z component in a plane truss",
                node_name
            )));
        }
        self.node_loads
            .entry(node_name.to_string())
            .or_default()
            .push(load);
        self.solution = None;
        Ok(())
    }

    /// Global DOF index of a node direction
    pub fn dof(&self, node_name: &str, axis: Axis) -> TrussResult<usize> {
        let node = self
            .nodes
            .get(node_name)
            .ok_or_else(|| TrussError::NodeNotFound(node_name.to_string()))?;
        let nd = self.dimension.dofs_per_node();
        if axis.index() >= nd {
            return Err(TrussError::InvalidInput(format!(
                "axis {:?} does not exist in a plane truss",
                axis
            )));
        }
        let id = self.block_index(node_name, node)?;
        Ok(id * nd + axis.index())
    }

    /// Node names in DOF order
    pub fn node_names(&self) -> &[String] {
        &self.node_order
    }

    /// Bar names in element order
    pub fn bar_names(&self) -> &[String] {
        &self.bar_order
    }

    /// Position of a node's DOF block; deserialized nodes fall back to the
    /// insertion order
    fn block_index(&self, name: &str, node: &Node) -> TrussResult<usize> {
        node.id
            .or_else(|| self.node_order.iter().position(|n| n == name))
            .ok_or_else(|| TrussError::InvalidTopology(format!("node '{}' has no DOF block", name)))
    }

    fn node(&self, name: &str) -> TrussResult<&Node> {
        self.nodes
            .get(name)
            .ok_or_else(|| TrussError::NodeNotFound(name.to_string()))
    }

    /// Node coordinates in DOF order
    pub fn coordinates(&self) -> TrussResult<Vec<[f64; 3]>> {
        self.node_order
            .iter()
            .map(|name| self.node(name).map(Node::coords))
            .collect()
    }

    // ========================
    // Compilation
    // ========================

    /// Compile the model into assembled tables
    pub fn build(&self) -> TrussResult<Structure> {
        let nd = self.dimension.dofs_per_node();
        let n_dofs = self.node_order.len() * nd;

        let mut elements = Vec::with_capacity(self.bar_order.len());
        for name in &self.bar_order {
            let bar = self
                .bars
                .get(name)
                .ok_or_else(|| TrussError::BarNotFound(name.clone()))?;
            let i_node = self.node(&bar.i_node)?;
            let j_node = self.node(&bar.j_node)?;

            let mut edof = Vec::with_capacity(2 * nd);
            for node_name in [&bar.i_node, &bar.j_node] {
                let first = self.dof(node_name, Axis::X)?;
                edof.extend(first..first + nd);
            }

            elements.push(BarElement::new(
                name,
                i_node.coords(),
                j_node.coords(),
                bar.e,
                bar.a,
                edof,
                self.dimension,
            )?);
        }

        let mut supports = BoundaryConditions::new();
        let mut loads = FEVec::zeros(n_dofs);
        for name in &self.node_order {
            let first = self.dof(name, Axis::X)?;
            if let Some(support) = self.supports.get(name) {
                for (k, value) in support.prescribed(nd) {
                    supports.push(first + k, value);
                }
            }
            if let Some(node_loads) = self.node_loads.get(name) {
                let total = node_loads
                    .iter()
                    .fold(NodeLoad::default(), |acc, load| acc.combined(load));
                for (k, value) in total.as_array().iter().take(nd).enumerate() {
                    loads[first + k] += value;
                }
            }
        }

        Structure::new(self.dimension, n_dofs, elements, supports, loads)
    }

    // ========================
    // Analysis Methods
    // ========================

    /// Run linear static analysis
    pub fn analyze_linear(&mut self) -> TrussResult<&AnalysisResults> {
        self.analyze(&AnalysisOptions::linear())
    }

    /// Run analysis with custom options
    pub fn analyze(&mut self, options: &AnalysisOptions) -> TrussResult<&AnalysisResults> {
        self.analyze_observed(options, &mut |_: &StepRecord| {})
    }

    /// Run analysis, passing every completed step to `observer`
    pub fn analyze_observed(
        &mut self,
        options: &AnalysisOptions,
        observer: &mut dyn FnMut(&StepRecord),
    ) -> TrussResult<&AnalysisResults> {
        self.solution = None;
        let structure = self.build()?;
        let results = analysis::run_observed(&structure, options, observer)?;
        Ok(&*self.solution.insert(results))
    }

    // ========================
    // Result Access Methods
    // ========================

    /// Results of the last analysis
    pub fn results(&self) -> TrussResult<&AnalysisResults> {
        self.solution.as_ref().ok_or(TrussError::NotAnalyzed)
    }

    fn node_index(&self, node_name: &str) -> TrussResult<usize> {
        self.block_index(node_name, self.node(node_name)?)
    }

    /// Get node displacement
    pub fn node_displacement(&self, node_name: &str) -> TrussResult<NodeDisplacement> {
        let index = self.node_index(node_name)?;
        self.results()?
            .node_displacement(index)
            .ok_or(TrussError::NotAnalyzed)
    }

    /// Get node reactions
    pub fn node_reactions(&self, node_name: &str) -> TrussResult<Reactions> {
        let index = self.node_index(node_name)?;
        self.results()?
            .node_reactions(index)
            .ok_or(TrussError::NotAnalyzed)
    }

    /// Deformed position of a node
    pub fn deformed_position(&self, node_name: &str) -> TrussResult<[f64; 3]> {
        let node = self.node(node_name)?;
        let d = self.node_displacement(node_name)?;
        Ok([node.x + d.dx, node.y + d.dy, node.z + d.dz])
    }

    /// All node positions moved by `scale` times their displacements, in DOF order
    pub fn deformed_shape(&self, scale: f64) -> TrussResult<Vec<[f64; 3]>> {
        self.results()?.deformed_coordinates(&self.coordinates()?, scale)
    }

    /// Get bar axial force and stress
    pub fn bar_force(&self, bar_name: &str) -> TrussResult<BarForce> {
        let index = self
            .bar_order
            .iter()
            .position(|name| name == bar_name)
            .ok_or_else(|| TrussError::BarNotFound(bar_name.to_string()))?;
        self.results()?
            .bar_force(index)
            .ok_or(TrussError::NotAnalyzed)
    }

    /// Get analysis summary
    pub fn summary(&self) -> TrussResult<AnalysisSummary> {
        let results = self.results()?;
        let structure = self.build()?;
        Ok(results.summary_named(&structure, &self.node_order))
    }

    /// Check if model has been analyzed
    pub fn is_analyzed(&self) -> bool {
        self.solution.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tie_bar() -> TrussModel {
        let mut model = TrussModel::planar();
        model.add_node("N1", Node::planar(0.0, 0.0)).unwrap();
        model.add_node("N2", Node::planar(2.0, 0.0)).unwrap();
        model.add_bar("B1", Bar::new("N1", "N2", 100.0, 0.5)).unwrap();
        model.add_support("N1", Support::pinned()).unwrap();
        model.add_support("N2", Support::roller_y()).unwrap();
        model.add_node_load("N2", NodeLoad::fx(5.0)).unwrap();
        model
    }

    #[test]
    fn test_dof_numbering_follows_insertion_order() {
        let mut model = TrussModel::space();
        model.add_node("B", Node::new(0.0, 0.0, 0.0)).unwrap();
        model.add_node("A", Node::new(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(model.dof("B", Axis::Z).unwrap(), 2);
        assert_eq!(model.dof("A", Axis::X).unwrap(), 3);
        assert_eq!(model.node_names(), &["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn test_builder_validation() {
        let mut model = tie_bar();
        assert!(matches!(
            model.add_node("N1", Node::planar(5.0, 5.0)),
            Err(TrussError::DuplicateName(_))
        ));
        assert!(matches!(
            model.add_node("N3", Node::new(0.0, 0.0, 1.0)),
            Err(TrussError::InvalidInput(_))
        ));
        assert!(matches!(
            model.add_bar("B2", Bar::new("N1", "N9", 1.0, 1.0)),
            Err(TrussError::NodeNotFound(_))
        ));
        assert!(matches!(
            model.add_bar("B2", Bar::new("N1", "N2", -1.0, 1.0)),
            Err(TrussError::InvalidInput(_))
        ));
        assert!(matches!(
            model.add_node_load("N2", NodeLoad::fz(1.0)),
            Err(TrussError::InvalidInput(_))
        ));
        assert!(matches!(model.dof("N1", Axis::Z), Err(TrussError::InvalidInput(_))));
    }

    #[test]
    fn test_build_structure() {
        let structure = tie_bar().build().unwrap();
        assert_eq!(structure.n_dofs(), 4);
        assert_eq!(structure.elements()[0].edof, vec![0, 1, 2, 3]);
        assert_eq!(structure.supports().dofs(), &[0, 1, 3]);
        assert_eq!(structure.loads()[2], 5.0);
    }

    #[test]
    fn test_linear_tie_bar() {
        let mut model = tie_bar();
        assert!(matches!(model.node_displacement("N2"), Err(TrussError::NotAnalyzed)));

        model.analyze_linear().unwrap();

        // u = P L / (E A)
        let d = model.node_displacement("N2").unwrap();
        assert_relative_eq!(d.dx, 0.2, epsilon = 1e-12);
        let rxn = model.node_reactions("N1").unwrap();
        assert_relative_eq!(rxn.fx, -5.0, epsilon = 1e-12);

        let force = model.bar_force("B1").unwrap();
        assert_relative_eq!(force.axial, 5.0, epsilon = 1e-12);
        assert_relative_eq!(force.stress, 10.0, epsilon = 1e-12);
        assert!(force.is_tension());

        let pos = model.deformed_position("N2").unwrap();
        assert_relative_eq!(pos[0], 2.2, epsilon = 1e-12);

        // Doubled displacements, nodes in insertion order
        let shape = model.deformed_shape(2.0).unwrap();
        assert_eq!(shape.len(), 2);
        assert_eq!(shape[0], [0.0, 0.0, 0.0]);
        assert_relative_eq!(shape[1][0], 2.4, epsilon = 1e-12);

        let summary = model.summary().unwrap();
        assert_eq!(summary.max_disp_node, "N2");
        assert_eq!(summary.max_axial_bar, "B1");
        assert_eq!(summary.free_dofs, 1);
        assert_eq!(summary.num_steps, 1);
    }

    #[test]
    fn test_model_edit_clears_results() {
        let mut model = tie_bar();
        model.analyze_linear().unwrap();
        assert!(model.is_analyzed());
        model.add_node_load("N2", NodeLoad::fx(1.0)).unwrap();
        assert!(!model.is_analyzed());
        assert!(matches!(model.deformed_shape(1.0), Err(TrussError::NotAnalyzed)));
    }

    #[test]
    fn test_enforced_support_displacement() {
        let mut model = TrussModel::planar();
        model.add_node("N1", Node::planar(0.0, 0.0)).unwrap();
        model.add_node("N2", Node::planar(1.0, 0.0)).unwrap();
        model.add_bar("B1", Bar::new("N1", "N2", 10.0, 1.0)).unwrap();
        model.add_support("N1", Support::pinned()).unwrap();
        model
            .add_support("N2", Support::roller_y().with_enforced_dx(0.01))
            .unwrap();

        model.analyze_linear().unwrap();
        assert_relative_eq!(model.node_displacement("N2").unwrap().dx, 0.01);
        assert_relative_eq!(model.bar_force("B1").unwrap().axial, 0.1, epsilon = 1e-12);
        assert_relative_eq!(model.node_reactions("N2").unwrap().fx, 0.1, epsilon = 1e-12);
    }
}

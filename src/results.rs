//! Result types for truss analysis

use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisType, NonConvergence, PathPoint, StepRecord};
use crate::error::{TrussError, TrussResult};
use crate::math::{Dimension, Vec as FEVec};
use crate::structure::Structure;

/// Displacement results at a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDisplacement {
    /// Displacement in X direction
    pub dx: f64,
    /// Displacement in Y direction
    pub dy: f64,
    /// Displacement in Z direction (zero for plane trusses)
    pub dz: f64,
}

impl NodeDisplacement {
    /// Create from array [DX, DY, DZ]
    pub fn from_array(arr: [f64; 3]) -> Self {
        Self {
            dx: arr[0],
            dy: arr[1],
            dz: arr[2],
        }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.dx, self.dy, self.dz]
    }

    /// Get translation magnitude
    pub fn translation_magnitude(&self) -> f64 {
        (self.dx.powi(2) + self.dy.powi(2) + self.dz.powi(2)).sqrt()
    }
}

/// Reaction forces at a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Reactions {
    /// Reaction force in X direction
    pub fx: f64,
    /// Reaction force in Y direction
    pub fy: f64,
    /// Reaction force in Z direction
    pub fz: f64,
}

impl Reactions {
    /// Create from array [FX, FY, FZ]
    pub fn from_array(arr: [f64; 3]) -> Self {
        Self {
            fx: arr[0],
            fy: arr[1],
            fz: arr[2],
        }
    }

    /// Get total force magnitude
    pub fn force_magnitude(&self) -> f64 {
        (self.fx.powi(2) + self.fy.powi(2) + self.fz.powi(2)).sqrt()
    }
}

/// Axial force and stress in a bar
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BarForce {
    /// Axial force (positive = tension)
    pub axial: f64,
    /// Axial stress N / A
    pub stress: f64,
}

impl BarForce {
    pub fn is_tension(&self) -> bool {
        self.axial > 0.0
    }
}

/// Outcome of one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResults {
    /// Analysis that produced these results
    pub analysis: AnalysisType,
    pub dimension: Dimension,
    /// Final displacement vector q
    pub displacements: FEVec,
    /// Final reaction vector R (nonzero at prescribed DOFs only)
    pub reactions: FEVec,
    /// Final bar axial forces
    pub axial_forces: FEVec,
    /// Final bar stresses
    pub stresses: FEVec,
    /// One record per completed step
    pub steps: Vec<StepRecord>,
    /// Equilibrium path samples at the tracked DOF
    pub path: Vec<PathPoint>,
    /// Steps accepted without convergence
    pub warnings: Vec<NonConvergence>,
    /// DOF sampled for the equilibrium path
    pub tracked_dof: Option<usize>,
    /// Displacement control ended at its step cap before reaching the load
    pub step_cap_reached: bool,
}

impl AnalysisResults {
    fn node_block(&self, v: &FEVec, node: usize) -> Option<[f64; 3]> {
        let nd = self.dimension.dofs_per_node();
        let start = node * nd;
        if start + nd > v.len() {
            return None;
        }
        let mut out = [0.0; 3];
        out[..nd].copy_from_slice(&v.as_slice()[start..start + nd]);
        Some(out)
    }

    /// Number of nodes covered by the results
    pub fn num_nodes(&self) -> usize {
        self.displacements.len() / self.dimension.dofs_per_node()
    }

    /// Displacement of the node with the given index
    pub fn node_displacement(&self, node: usize) -> Option<NodeDisplacement> {
        self.node_block(&self.displacements, node)
            .map(NodeDisplacement::from_array)
    }

    /// Reactions at the node with the given index
    pub fn node_reactions(&self, node: usize) -> Option<Reactions> {
        self.node_block(&self.reactions, node).map(Reactions::from_array)
    }

    /// Displacements reshaped per node
    pub fn nodal_displacements(&self) -> Vec<NodeDisplacement> {
        (0..self.num_nodes())
            .filter_map(|node| self.node_displacement(node))
            .collect()
    }

    /// Reactions reshaped per node
    pub fn nodal_reactions(&self) -> Vec<Reactions> {
        (0..self.num_nodes())
            .filter_map(|node| self.node_reactions(node))
            .collect()
    }

    /// Axial force and stress of the bar with the given index
    pub fn bar_force(&self, bar: usize) -> Option<BarForce> {
        if bar >= self.axial_forces.len() {
            return None;
        }
        Some(BarForce {
            axial: self.axial_forces[bar],
            stress: self.stresses[bar],
        })
    }

    /// Node coordinates moved by `scale` times the nodal displacements
    pub fn deformed_coordinates(&self, coords: &[[f64; 3]], scale: f64) -> TrussResult<Vec<[f64; 3]>> {
        if coords.len() != self.num_nodes() {
            return Err(TrussError::InvalidInput(format!(
                "{} coordinates given for {} nodes",
                coords.len(),
                self.num_nodes()
            )));
        }
        Ok(coords
            .iter()
            .zip(self.nodal_displacements())
            .map(|(c, d)| {
                [
                    c[0] + scale * d.dx,
                    c[1] + scale * d.dy,
                    c[2] + scale * d.dz,
                ]
            })
            .collect())
    }

    /// `(displacement, force)` pairs of the equilibrium path
    pub fn equilibrium_path(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.path.iter().map(|p| (p.displacement, p.force))
    }

    /// Equilibrium path reduced to the origin and the final point of each step
    pub fn step_path(&self) -> Vec<(f64, f64)> {
        self.path
            .iter()
            .enumerate()
            .filter(|(i, p)| self.path.get(i + 1).map_or(true, |next| next.step != p.step))
            .map(|(_, p)| (p.displacement, p.force))
            .collect()
    }

    /// Total corrector iterations over all steps
    pub fn total_iterations(&self) -> usize {
        self.steps.iter().map(|s| s.iterations).sum()
    }

    /// Whether every step converged and the run was not truncated
    pub fn converged(&self) -> bool {
        self.warnings.is_empty() && !self.step_cap_reached
    }

    /// Accumulated load factor of the last step (force control and linear)
    pub fn final_load_factor(&self) -> Option<f64> {
        self.steps.last().and_then(|s| s.load_factor)
    }

    /// Summary with nodes named `N1, N2, ...` in DOF order
    pub fn summary(&self, structure: &Structure) -> AnalysisSummary {
        let names: Vec<String> = (0..self.num_nodes()).map(|i| format!("N{}", i + 1)).collect();
        self.summary_named(structure, &names)
    }

    /// Summary using the given node names, indexed by DOF block
    pub fn summary_named(&self, structure: &Structure, node_names: &[String]) -> AnalysisSummary {
        let mut summary = AnalysisSummary {
            analysis: self.analysis.label().to_string(),
            num_nodes: structure.n_nodes(),
            num_bars: structure.elements().len(),
            total_dofs: structure.n_dofs(),
            free_dofs: structure.free_dofs(),
            num_steps: self.steps.len(),
            total_iterations: self.total_iterations(),
            non_converged_steps: self.warnings.len(),
            step_cap_reached: self.step_cap_reached,
            ..Default::default()
        };

        let name = |i: usize| {
            node_names
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("N{}", i + 1))
        };

        // Find max displacement
        for (i, disp) in self.nodal_displacements().iter().enumerate() {
            let mag = disp.translation_magnitude();
            if mag > summary.max_displacement {
                summary.max_displacement = mag;
                summary.max_disp_node = name(i);
            }
        }

        // Find max reaction
        for (i, rxn) in self.nodal_reactions().iter().enumerate() {
            let mag = rxn.force_magnitude();
            if mag > summary.max_reaction {
                summary.max_reaction = mag;
                summary.max_reaction_node = name(i);
            }
        }

        // Find max bar force
        for (bar, (n, sigma)) in structure
            .elements()
            .iter()
            .zip(self.axial_forces.iter().zip(self.stresses.iter()))
        {
            if n.abs() > summary.max_axial {
                summary.max_axial = n.abs();
                summary.max_axial_bar = bar.name.clone();
            }
            summary.max_stress = summary.max_stress.max(sigma.abs());
        }

        summary
    }
}

/// Summary of analysis results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Analysis label
    pub analysis: String,
    /// Maximum displacement
    pub max_displacement: f64,
    /// Node with maximum displacement
    pub max_disp_node: String,
    /// Maximum reaction force
    pub max_reaction: f64,
    /// Node with maximum reaction
    pub max_reaction_node: String,
    /// Maximum bar axial force magnitude
    pub max_axial: f64,
    /// Bar with maximum axial force
    pub max_axial_bar: String,
    /// Maximum bar stress magnitude
    pub max_stress: f64,
    /// Total number of nodes
    pub num_nodes: usize,
    /// Total number of bars
    pub num_bars: usize,
    /// Total DOFs
    pub total_dofs: usize,
    /// Free DOFs (unknown)
    pub free_dofs: usize,
    /// Completed steps
    pub num_steps: usize,
    /// Corrector iterations over all steps
    pub total_iterations: usize,
    /// Steps accepted without convergence
    pub non_converged_steps: usize,
    /// Displacement control ended at its step cap
    pub step_cap_reached: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn results_2d() -> AnalysisResults {
        AnalysisResults {
            analysis: AnalysisType::Linear,
            dimension: Dimension::Two,
            displacements: FEVec::from_vec(vec![0.0, 0.0, 0.3, -0.4]),
            reactions: FEVec::from_vec(vec![-1.0, 2.0, 0.0, 0.0]),
            axial_forces: FEVec::from_vec(vec![-4.0]),
            stresses: FEVec::from_vec(vec![-2.0]),
            steps: Vec::new(),
            path: vec![
                PathPoint { step: 0, iteration: 0, displacement: 0.0, force: 0.0 },
                PathPoint { step: 1, iteration: 0, displacement: 0.1, force: 1.0 },
                PathPoint { step: 1, iteration: 1, displacement: 0.1, force: 0.8 },
                PathPoint { step: 1, iteration: 1, displacement: 0.12, force: 1.0 },
            ],
            warnings: Vec::new(),
            tracked_dof: Some(2),
            step_cap_reached: false,
        }
    }

    #[test]
    fn test_nodal_views() {
        let r = results_2d();
        assert_eq!(r.num_nodes(), 2);
        let d = r.node_displacement(1).unwrap();
        assert_relative_eq!(d.translation_magnitude(), 0.5, epsilon = 1e-12);
        assert_eq!(d.dz, 0.0);
        assert_eq!(r.node_reactions(0).unwrap().fy, 2.0);
        assert!(r.node_displacement(2).is_none());
        assert!(!r.bar_force(0).unwrap().is_tension());
    }

    #[test]
    fn test_deformed_coordinates() {
        let r = results_2d();
        let coords = [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0]];
        let deformed = r.deformed_coordinates(&coords, 1.0).unwrap();
        assert_relative_eq!(deformed[1][0], 1.3, epsilon = 1e-12);
        assert_relative_eq!(deformed[1][1], 0.6, epsilon = 1e-12);
        assert!(r.deformed_coordinates(&coords[..1], 1.0).is_err());
    }

    #[test]
    fn test_step_path_keeps_last_point_of_each_step() {
        let r = results_2d();
        assert_eq!(r.equilibrium_path().count(), 4);
        assert_eq!(r.step_path(), vec![(0.0, 0.0), (0.12, 1.0)]);
    }
}

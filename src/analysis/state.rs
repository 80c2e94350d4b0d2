//! Solver state and per-step bookkeeping

use serde::{Deserialize, Serialize};

use super::AnalysisType;
use crate::math::{forces, Vec as FEVec};
use crate::results::AnalysisResults;
use crate::structure::Structure;

/// Mutable quantities of one analysis, threaded by value between steps
#[derive(Debug, Clone)]
pub(crate) struct AnalysisState {
    /// Accumulated displacements
    pub q: FEVec,
    /// Accumulated reactions at prescribed DOFs
    pub reactions: FEVec,
    /// Bar axial forces consistent with `q`
    pub axial_forces: FEVec,
    /// Currently applied external load
    pub applied: FEVec,
}

impl AnalysisState {
    pub fn new(structure: &Structure) -> Self {
        let n = structure.n_dofs();
        Self {
            q: FEVec::zeros(n),
            reactions: FEVec::zeros(n),
            axial_forces: FEVec::zeros(structure.elements().len()),
            applied: FEVec::zeros(n),
        }
    }

    /// Add a solved displacement increment and its reaction increment
    pub fn accumulate(mut self, dq: &FEVec, dr: &FEVec) -> Self {
        self.q += dq;
        self.reactions += dr;
        self
    }

    /// Recompute the nonlinear axial forces from the current displacements
    pub fn with_updated_forces(mut self, structure: &Structure) -> Self {
        self.axial_forces = forces::axial_forces(structure, &self.q);
        self
    }

    /// External load plus reactions, the force side of the equilibrium path
    pub fn external_force(&self) -> FEVec {
        &self.applied + &self.reactions
    }
}

/// One `(displacement, force)` sample of the equilibrium path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    /// Step index, 0 for the origin
    pub step: usize,
    /// Iteration index, 0 for the predictor
    pub iteration: usize,
    pub displacement: f64,
    pub force: f64,
}

/// Converged (or accepted) state at the end of a step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// 1-based step index
    pub step: usize,
    /// Accumulated load fraction (force control only)
    pub load_factor: Option<f64>,
    pub displacements: FEVec,
    pub axial_forces: FEVec,
    pub reactions: FEVec,
    /// Corrector iterations performed
    pub iterations: usize,
    pub converged: bool,
    /// Residual norm of the last iteration
    pub residual_norm: f64,
    /// Displacement increment norm of the last iteration
    pub increment_norm: f64,
    /// Residual norm of every corrector iteration, in order
    pub residual_history: Vec<f64>,
}

/// A step accepted after exhausting the iteration cap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NonConvergence {
    pub step: usize,
    pub iterations: usize,
    pub residual_norm: f64,
    pub increment_norm: f64,
}

/// Outcome of the corrector loop of one step
#[derive(Debug, Clone, Default)]
pub(crate) struct Convergence {
    pub iterations: usize,
    pub converged: bool,
    pub residual_norm: f64,
    pub increment_norm: f64,
    pub residual_history: Vec<f64>,
}

/// Collects step records, path samples and warnings during one analysis
pub(crate) struct History<'a> {
    tracked_dof: Option<usize>,
    log_steps: bool,
    observer: &'a mut dyn FnMut(&StepRecord),
    pub steps: Vec<StepRecord>,
    pub path: Vec<PathPoint>,
    pub warnings: Vec<NonConvergence>,
}

impl<'a> History<'a> {
    /// Start a history; the path begins at the unloaded origin
    pub fn new(
        tracked_dof: Option<usize>,
        log_steps: bool,
        observer: &'a mut dyn FnMut(&StepRecord),
    ) -> Self {
        let path = match tracked_dof {
            Some(_) => vec![PathPoint {
                step: 0,
                iteration: 0,
                displacement: 0.0,
                force: 0.0,
            }],
            None => Vec::new(),
        };
        Self {
            tracked_dof,
            log_steps,
            observer,
            steps: Vec::new(),
            path,
            warnings: Vec::new(),
        }
    }

    /// Sample the path at the tracked DOF
    pub fn sample(&mut self, step: usize, iteration: usize, q: &FEVec, force: &FEVec) {
        if let Some(dof) = self.tracked_dof {
            self.path.push(PathPoint {
                step,
                iteration,
                displacement: q[dof],
                force: force[dof],
            });
        }
    }

    /// Record a finished step and notify the observer
    pub fn finish_step(
        &mut self,
        step: usize,
        load_factor: Option<f64>,
        state: &AnalysisState,
        convergence: Convergence,
    ) {
        if !convergence.converged {
            log::warn!(
                "Step {} did not converge in {} iterations (residual {:.3e}, increment {:.3e}); accepting",
                step,
                convergence.iterations,
                convergence.residual_norm,
                convergence.increment_norm
            );
            self.warnings.push(NonConvergence {
                step,
                iterations: convergence.iterations,
                residual_norm: convergence.residual_norm,
                increment_norm: convergence.increment_norm,
            });
        }

        let record = StepRecord {
            step,
            load_factor,
            displacements: state.q.clone(),
            axial_forces: state.axial_forces.clone(),
            reactions: state.reactions.clone(),
            iterations: convergence.iterations,
            converged: convergence.converged,
            residual_norm: convergence.residual_norm,
            increment_norm: convergence.increment_norm,
            residual_history: convergence.residual_history,
        };

        if self.log_steps {
            match self.tracked_dof {
                Some(dof) => log::info!(
                    "Step {}: {} iterations, residual {:.3e}, q[{}] = {:.6e}, F[{}] = {:.6e}",
                    step,
                    record.iterations,
                    record.residual_norm,
                    dof,
                    state.q[dof],
                    dof,
                    state.external_force()[dof]
                ),
                None => log::info!(
                    "Step {}: {} iterations, residual {:.3e}",
                    step,
                    record.iterations,
                    record.residual_norm
                ),
            }
        }

        (self.observer)(&record);
        self.steps.push(record);
    }

    /// Package the final state and the collected history
    pub fn into_results(
        self,
        structure: &Structure,
        analysis: &AnalysisType,
        state: AnalysisState,
        step_cap_reached: bool,
    ) -> AnalysisResults {
        let stresses = state.axial_forces.component_div(&structure.areas());
        AnalysisResults {
            analysis: analysis.clone(),
            dimension: structure.dimension(),
            displacements: state.q,
            reactions: state.reactions,
            axial_forces: state.axial_forces,
            stresses,
            steps: self.steps,
            path: self.path,
            warnings: self.warnings,
            tracked_dof: self.tracked_dof,
            step_cap_reached,
        }
    }
}

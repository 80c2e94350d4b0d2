//! Analysis types, options and the incremental solver
//!
//! Every analysis starts from a zero analysis state,
//! owns it for the duration of the call and hands the converged values back as
//! [`AnalysisResults`]. Nonlinear analyses run a Newton-Raphson corrector after
//! each predictor and stop iterating once both the residual norm and the
//! displacement increment norm drop below their tolerances.

mod displacement_control;
mod force_control;
mod linear;
mod newton;
mod state;

use serde::{Deserialize, Serialize};

use crate::error::{TrussError, TrussResult};
use crate::results::AnalysisResults;
use crate::structure::Structure;

pub use state::{NonConvergence, PathPoint, StepRecord};

/// How the reference load is split into increments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LoadSchedule {
    /// `increments` equal steps of `1 / increments` each
    Uniform { increments: usize },
    /// Explicit load fractions, one per step
    Fractions(Vec<f64>),
}

impl LoadSchedule {
    /// Per-step load fractions
    pub fn fractions(&self) -> Vec<f64> {
        match self {
            LoadSchedule::Uniform { increments } => {
                vec![1.0 / *increments as f64; *increments]
            }
            LoadSchedule::Fractions(fractions) => fractions.clone(),
        }
    }

    fn validate(&self) -> TrussResult<()> {
        match self {
            LoadSchedule::Uniform { increments: 0 } => Err(TrussError::InvalidInput(
                "force control needs at least one load increment".to_string(),
            )),
            LoadSchedule::Fractions(fractions) if fractions.is_empty() => Err(
                TrussError::InvalidInput("load schedule is empty".to_string()),
            ),
            LoadSchedule::Fractions(fractions) if fractions.iter().any(|f| !f.is_finite()) => {
                Err(TrussError::InvalidInput(
                    "load schedule contains a non-finite fraction".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Force-controlled incrementation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceControl {
    pub schedule: LoadSchedule,
}

/// Which DOFs a displacement-controlled analysis drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMode {
    /// Every loaded, unsupported DOF is driven; no force is applied
    Proportional,
    /// One DOF is driven; the remaining loads are applied as dead loads
    SingleDof(usize),
}

/// Displacement-controlled incrementation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplacementControl {
    /// Displacement increment magnitude per step; its sign follows the
    /// reference load at each controlled DOF
    pub increment: f64,
    pub mode: ControlMode,
    /// Step cap for paths that never reach the reference load
    pub max_steps: usize,
    /// Relative tolerance on reaching the reference load
    pub load_tolerance: f64,
}

impl DisplacementControl {
    pub fn new(increment: f64, mode: ControlMode) -> Self {
        Self {
            increment,
            mode,
            max_steps: 1000,
            load_tolerance: 1e-6,
        }
    }

    fn validate(&self) -> TrussResult<()> {
        if !self.increment.is_finite() || self.increment == 0.0 {
            return Err(TrussError::InvalidInput(format!(
                "displacement increment must be finite and nonzero (got {})",
                self.increment
            )));
        }
        if self.max_steps == 0 {
            return Err(TrussError::InvalidInput(
                "displacement control needs at least one step".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.load_tolerance) {
            return Err(TrussError::InvalidInput(format!(
                "load tolerance must lie in [0, 1) (got {})",
                self.load_tolerance
            )));
        }
        Ok(())
    }
}

/// Type of structural analysis to perform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisType {
    /// Small-displacement linear static analysis
    Linear,
    /// Incremental load with Newton-Raphson equilibrium iterations
    ForceControlled(ForceControl),
    /// Incremental prescribed displacement with Newton-Raphson iterations
    DisplacementControlled(DisplacementControl),
}

impl Default for AnalysisType {
    fn default() -> Self {
        Self::Linear
    }
}

impl AnalysisType {
    /// Short label used in logs and summaries
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisType::Linear => "linear",
            AnalysisType::ForceControlled(_) => "force-controlled",
            AnalysisType::DisplacementControlled(_) => "displacement-controlled",
        }
    }
}

/// Options for structural analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Type of analysis
    pub analysis_type: AnalysisType,
    /// Maximum Newton iterations per step
    pub max_iterations: usize,
    /// Convergence tolerance on the residual norm
    pub residual_tolerance: f64,
    /// Convergence tolerance on the displacement increment norm
    pub displacement_tolerance: f64,
    /// DOF sampled for the equilibrium path (None = automatic)
    pub tracked_dof: Option<usize>,
    /// Enable per-step progress output
    pub log: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            analysis_type: AnalysisType::Linear,
            max_iterations: 40,
            residual_tolerance: 1e-4,
            displacement_tolerance: 1e-4,
            tracked_dof: None,
            log: false,
        }
    }
}

impl AnalysisOptions {
    /// Create options for linear analysis
    pub fn linear() -> Self {
        Self::default()
    }

    /// Create options for force control with `increments` equal load steps
    pub fn force_controlled(increments: usize) -> Self {
        Self::force_schedule_of(LoadSchedule::Uniform { increments })
    }

    /// Create options for force control with explicit load fractions
    pub fn force_schedule(fractions: Vec<f64>) -> Self {
        Self::force_schedule_of(LoadSchedule::Fractions(fractions))
    }

    fn force_schedule_of(schedule: LoadSchedule) -> Self {
        Self {
            analysis_type: AnalysisType::ForceControlled(ForceControl { schedule }),
            ..Self::default()
        }
    }

    /// Create options for displacement control
    pub fn displacement_controlled(increment: f64, mode: ControlMode) -> Self {
        Self {
            analysis_type: AnalysisType::DisplacementControlled(DisplacementControl::new(
                increment, mode,
            )),
            ..Self::default()
        }
    }

    /// Enable logging
    pub fn with_logging(mut self) -> Self {
        self.log = true;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Set residual and displacement tolerances
    pub fn with_tolerances(mut self, residual: f64, displacement: f64) -> Self {
        self.residual_tolerance = residual;
        self.displacement_tolerance = displacement;
        self
    }

    /// Sample the equilibrium path at `dof`
    pub fn with_tracked_dof(mut self, dof: usize) -> Self {
        self.tracked_dof = Some(dof);
        self
    }

    /// Set the displacement-control step cap (ignored by other analyses)
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        if let AnalysisType::DisplacementControlled(control) = &mut self.analysis_type {
            control.max_steps = max_steps;
        }
        self
    }

    /// Set the displacement-control load tolerance (ignored by other analyses)
    pub fn with_load_tolerance(mut self, tolerance: f64) -> Self {
        if let AnalysisType::DisplacementControlled(control) = &mut self.analysis_type {
            control.load_tolerance = tolerance;
        }
        self
    }

    /// Check option values before any work is done
    pub fn validate(&self) -> TrussResult<()> {
        if self.max_iterations == 0 {
            return Err(TrussError::InvalidInput(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        for (name, tol) in [
            ("residual", self.residual_tolerance),
            ("displacement", self.displacement_tolerance),
        ] {
            if !(tol.is_finite() && tol > 0.0) {
                return Err(TrussError::InvalidInput(format!(
                    "{} tolerance must be positive (got {})",
                    name, tol
                )));
            }
        }
        match &self.analysis_type {
            AnalysisType::Linear => Ok(()),
            AnalysisType::ForceControlled(control) => control.schedule.validate(),
            AnalysisType::DisplacementControlled(control) => control.validate(),
        }
    }
}

/// Run the analysis selected by `options` on `structure`
pub fn run(structure: &Structure, options: &AnalysisOptions) -> TrussResult<AnalysisResults> {
    run_observed(structure, options, &mut |_: &StepRecord| {})
}

/// Run an analysis, passing every completed step to `observer`
pub fn run_observed(
    structure: &Structure,
    options: &AnalysisOptions,
    observer: &mut dyn FnMut(&StepRecord),
) -> TrussResult<AnalysisResults> {
    options.validate()?;
    if let Some(dof) = options.tracked_dof {
        if dof >= structure.n_dofs() {
            return Err(TrussError::InvalidInput(format!(
                "tracked DOF {} is outside the {} structure DOFs",
                dof,
                structure.n_dofs()
            )));
        }
    }

    log::info!(
        "Starting {} analysis: {} bars, {} DOFs ({} free)",
        options.analysis_type.label(),
        structure.elements().len(),
        structure.n_dofs(),
        structure.free_dofs()
    );

    let results = match &options.analysis_type {
        AnalysisType::Linear => linear::solve(structure, options, observer)?,
        AnalysisType::ForceControlled(control) => {
            force_control::solve(structure, options, control, observer)?
        }
        AnalysisType::DisplacementControlled(control) => {
            displacement_control::solve(structure, options, control, observer)?
        }
    };

    log::info!(
        "Finished {} analysis: {} steps, {} iterations, {} warnings",
        options.analysis_type.label(),
        results.steps.len(),
        results.total_iterations(),
        results.warnings.len()
    );
    Ok(results)
}

/// DOF with the largest reference load magnitude, if any load is applied
pub(crate) fn default_tracked_dof(structure: &Structure) -> Option<usize> {
    structure
        .loads()
        .iter()
        .enumerate()
        .filter(|(_, q)| **q != 0.0)
        .fold(None, |best: Option<(usize, f64)>, (dof, q)| match best {
            Some((_, max)) if max >= q.abs() => best,
            _ => Some((dof, q.abs())),
        })
        .map(|(dof, _)| dof)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = AnalysisOptions::default();
        assert_eq!(options.analysis_type, AnalysisType::Linear);
        assert_eq!(options.max_iterations, 40);
        assert_eq!(options.residual_tolerance, 1e-4);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_uniform_schedule() {
        let schedule = LoadSchedule::Uniform { increments: 4 };
        assert_eq!(schedule.fractions(), vec![0.25; 4]);
    }

    #[test]
    fn test_builder_methods() {
        let options = AnalysisOptions::displacement_controlled(-0.005, ControlMode::Proportional)
            .with_max_steps(90)
            .with_tolerances(1e-6, 1e-8)
            .with_tracked_dof(3)
            .with_logging();

        match &options.analysis_type {
            AnalysisType::DisplacementControlled(control) => {
                assert_eq!(control.max_steps, 90);
                assert_eq!(control.load_tolerance, 1e-6);
            }
            other => panic!("unexpected analysis type {other:?}"),
        }
        assert_eq!(options.tracked_dof, Some(3));
        assert!(options.log);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_invalid_options_rejected() {
        assert!(AnalysisOptions::force_controlled(0).validate().is_err());
        assert!(AnalysisOptions::force_schedule(vec![]).validate().is_err());
        assert!(AnalysisOptions::linear().with_max_iter(0).validate().is_err());
        assert!(AnalysisOptions::linear()
            .with_tolerances(0.0, 1e-4)
            .validate()
            .is_err());
        assert!(
            AnalysisOptions::displacement_controlled(0.0, ControlMode::Proportional)
                .validate()
                .is_err()
        );
    }
}

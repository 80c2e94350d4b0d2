//! Displacement-controlled incremental analysis
//!
//! The controlled DOFs receive prescribed displacement increments as extra
//! Dirichlet conditions. The load they carry shows up as the reaction at those
//! DOFs, so the analysis can follow equilibrium paths past limit points where
//! force control fails.

use super::newton::{correct, predict};
use super::state::{AnalysisState, History};
use super::{AnalysisOptions, ControlMode, DisplacementControl, StepRecord};
use crate::error::{TrussError, TrussResult};
use crate::math::Vec as FEVec;
use crate::results::AnalysisResults;
use crate::structure::{BoundaryConditions, Structure};

/// A DOF driven by prescribed increments
#[derive(Debug, Clone, Copy)]
struct ControlledDof {
    dof: usize,
    /// Reference load at the DOF
    target: f64,
    /// Increment still to be applied each step, zero once the target is reached
    remaining: f64,
}

impl ControlledDof {
    fn new(dof: usize, target: f64, increment: f64) -> Self {
        Self {
            dof,
            target,
            remaining: increment.abs() * target.signum(),
        }
    }

    /// Whether the reaction has reached the reference load in its direction
    fn reached(&self, reactions: &FEVec, tolerance: f64) -> bool {
        reactions[self.dof] * self.target.signum() >= self.target.abs() * (1.0 - tolerance)
    }
}

/// Choose the controlled DOFs and the load applied alongside them.
///
/// A rejected `SingleDof` choice is an `InvalidControlDof` naming that DOF.
/// Proportional mode names no DOF, so a structure without any loaded free DOF
/// is reported as `InvalidInput` about the load vector instead.
fn controlled_dofs(
    structure: &Structure,
    control: &DisplacementControl,
) -> TrussResult<(Vec<ControlledDof>, FEVec)> {
    let q_ref = structure.loads();
    let supports = structure.supports();
    let n = structure.n_dofs();

    match control.mode {
        ControlMode::Proportional => {
            let controlled: Vec<ControlledDof> = (0..n)
                .filter(|&dof| q_ref[dof] != 0.0 && !supports.contains(dof))
                .map(|dof| ControlledDof::new(dof, q_ref[dof], control.increment))
                .collect();
            if controlled.is_empty() {
                return Err(TrussError::InvalidInput(
                    "proportional displacement control needs at least one loaded free DOF"
                        .to_string(),
                ));
            }
            Ok((controlled, FEVec::zeros(n)))
        }
        ControlMode::SingleDof(dof) => {
            let reason = if dof >= n {
                Some(format!("outside the {} structure DOFs", n))
            } else if supports.contains(dof) {
                Some("DOF is supported".to_string())
            } else if q_ref[dof] == 0.0 {
                Some("no reference load at this DOF".to_string())
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(TrussError::InvalidControlDof { dof, reason });
            }

            let mut dead_load = q_ref.clone();
            dead_load[dof] = 0.0;
            Ok((
                vec![ControlledDof::new(dof, q_ref[dof], control.increment)],
                dead_load,
            ))
        }
    }
}

/// Supports extended by every controlled DOF at its remaining increment
fn with_controlled(base: &BoundaryConditions, controlled: &[ControlledDof]) -> BoundaryConditions {
    let mut driven = BoundaryConditions::new();
    for c in controlled {
        driven.push(c.dof, c.remaining);
    }
    base.extended(&driven)
}

/// Drive the controlled DOFs until each carries its reference load.
///
/// Step 1 applies the enforced support displacements and any dead load in the
/// predictor. The corrector holds both the supports and the controlled DOFs.
/// The loop ends when every controlled DOF has reached its reference load, or
/// at `max_steps`, in which case the results are flagged as truncated.
pub(crate) fn solve(
    structure: &Structure,
    options: &AnalysisOptions,
    control: &DisplacementControl,
    observer: &mut dyn FnMut(&StepRecord),
) -> TrussResult<AnalysisResults> {
    let (mut controlled, dead_load) = controlled_dofs(structure, control)?;
    let tracked = options.tracked_dof.or(Some(controlled[0].dof));
    let mut history = History::new(tracked, options.log, observer);

    log::debug!(
        "Controlling DOFs {:?} with increment {}",
        controlled.iter().map(|c| c.dof).collect::<Vec<_>>(),
        control.increment
    );

    let supports = structure.supports();
    let held_supports = supports.homogeneous();
    let zero_load = FEVec::zeros(structure.n_dofs());

    let mut state = AnalysisState::new(structure);
    let mut step = 0;

    while controlled.iter().any(|c| c.remaining != 0.0) {
        if step == control.max_steps {
            log::warn!(
                "Displacement control stopped at the {} step cap before reaching the reference load",
                control.max_steps
            );
            return Ok(history.into_results(structure, &options.analysis_type, state, true));
        }
        step += 1;

        let (base, rhs) = if step == 1 {
            state.applied = dead_load.clone();
            (supports.clone(), &dead_load)
        } else {
            (held_supports.clone(), &zero_load)
        };
        let prescribed = with_controlled(&base, &controlled);
        state = predict(structure, state, rhs, &prescribed, step, &mut history)?;

        let held: Vec<ControlledDof> = controlled
            .iter()
            .map(|c| ControlledDof { remaining: 0.0, ..*c })
            .collect();
        let (next, convergence) = correct(
            structure,
            state,
            &with_controlled(&held_supports, &held),
            options,
            step,
            &mut history,
        )?;
        state = next;

        for c in controlled.iter_mut() {
            if c.remaining != 0.0 && c.reached(&state.reactions, control.load_tolerance) {
                log::debug!("Controlled DOF {} reached its reference load at step {}", c.dof, step);
                c.remaining = 0.0;
            }
        }
        history.finish_step(step, None, &state, convergence);
    }

    Ok(history.into_results(structure, &options.analysis_type, state, false))
}

//! Predictor solve and Newton-Raphson corrector shared by the nonlinear analyses

use super::state::{AnalysisState, Convergence, History};
use super::AnalysisOptions;
use crate::error::TrussResult;
use crate::math::{forces, solve_prescribed, stiffness, Vec as FEVec};
use crate::structure::{BoundaryConditions, Structure};

/// Tangent predictor: solve `K_T dq = rhs` under `prescribed` and accumulate.
///
/// Errors carry the step context with iteration 0.
pub(crate) fn predict(
    structure: &Structure,
    state: AnalysisState,
    rhs: &FEVec,
    prescribed: &BoundaryConditions,
    step: usize,
    history: &mut History<'_>,
) -> TrussResult<AnalysisState> {
    let kt = stiffness::global_tangent_stiffness(structure, &state.q, &state.axial_forces);
    let (dq, dr) = solve_prescribed(&kt, rhs, prescribed).map_err(|e| e.at_step(step, 0))?;
    let state = state.accumulate(&dq, &dr);

    history.sample(step, 0, &state.q, &state.external_force());
    Ok(state)
}

/// Equilibrium iterations with the DOFs in `held` kept at zero increment.
///
/// Each iteration recomputes the axial forces, rebuilds the tangent, solves for
/// the residual and accumulates. The loop stops once both the residual norm and
/// the increment norm fall below tolerance, or at the iteration cap, in which
/// case the step is returned unconverged.
pub(crate) fn correct(
    structure: &Structure,
    mut state: AnalysisState,
    held: &BoundaryConditions,
    options: &AnalysisOptions,
    step: usize,
    history: &mut History<'_>,
) -> TrussResult<(AnalysisState, Convergence)> {
    let mut outcome = Convergence::default();

    for iteration in 1..=options.max_iterations {
        state = state.with_updated_forces(structure);
        let kt = stiffness::global_tangent_stiffness(structure, &state.q, &state.axial_forces);
        let res = forces::residual(
            structure,
            &state.q,
            &state.axial_forces,
            &state.applied,
            &state.reactions,
        );

        // Internal force at the current configuration
        history.sample(step, iteration, &state.q, &(state.external_force() - &res));

        let (dq, dr) =
            solve_prescribed(&kt, &res, held).map_err(|e| e.at_step(step, iteration))?;
        state = state.accumulate(&dq, &dr);
        history.sample(step, iteration, &state.q, &state.external_force());

        outcome.iterations = iteration;
        outcome.residual_norm = res.norm();
        outcome.increment_norm = dq.norm();
        outcome.residual_history.push(outcome.residual_norm);

        log::debug!(
            "Step {} iteration {}: |res| = {:.3e}, |dq| = {:.3e}",
            step,
            iteration,
            outcome.residual_norm,
            outcome.increment_norm
        );

        if outcome.residual_norm < options.residual_tolerance
            && outcome.increment_norm < options.displacement_tolerance
        {
            outcome.converged = true;
            break;
        }
    }

    Ok((state.with_updated_forces(structure), outcome))
}

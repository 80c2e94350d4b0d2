//! Small-displacement linear static analysis

use super::state::{AnalysisState, Convergence, History};
use super::{default_tracked_dof, AnalysisOptions, StepRecord};
use crate::error::TrussResult;
use crate::math::{forces, solve_prescribed, stiffness};
use crate::results::AnalysisResults;
use crate::structure::Structure;

/// One partitioned solve with `K_0`, the full reference load and the full
/// support values
pub(crate) fn solve(
    structure: &Structure,
    options: &AnalysisOptions,
    observer: &mut dyn FnMut(&StepRecord),
) -> TrussResult<AnalysisResults> {
    let tracked = options.tracked_dof.or_else(|| default_tracked_dof(structure));
    let mut history = History::new(tracked, options.log, observer);

    let k0 = stiffness::global_linear_stiffness(structure);
    let (q, reactions) =
        solve_prescribed(&k0, structure.loads(), structure.supports()).map_err(|e| e.at_step(1, 0))?;

    let mut state = AnalysisState::new(structure);
    state.applied = structure.loads().clone();
    state = state.accumulate(&q, &reactions);
    state.axial_forces = forces::axial_forces_linear(structure, &state.q);

    let residual = state.external_force() - &k0 * &state.q;
    history.sample(1, 0, &state.q, &state.external_force());
    history.finish_step(
        1,
        Some(1.0),
        &state,
        Convergence {
            iterations: 0,
            converged: true,
            residual_norm: residual.norm(),
            increment_norm: state.q.norm(),
            residual_history: Vec::new(),
        },
    );

    Ok(history.into_results(structure, &options.analysis_type, state, false))
}

//! Force-controlled incremental analysis

use super::newton::{correct, predict};
use super::state::{AnalysisState, History};
use super::{default_tracked_dof, AnalysisOptions, ForceControl, StepRecord};
use crate::error::TrussResult;
use crate::results::AnalysisResults;
use crate::structure::Structure;

/// Apply the reference load in the scheduled fractions.
///
/// Each step adds `fraction * Q_ref` to the applied load and imposes the same
/// fraction of the enforced support displacements in the predictor. The
/// corrector then holds the supports fixed.
pub(crate) fn solve(
    structure: &Structure,
    options: &AnalysisOptions,
    control: &ForceControl,
    observer: &mut dyn FnMut(&StepRecord),
) -> TrussResult<AnalysisResults> {
    let tracked = options.tracked_dof.or_else(|| default_tracked_dof(structure));
    let mut history = History::new(tracked, options.log, observer);

    let q_ref = structure.loads();
    let supports = structure.supports();
    let held = supports.homogeneous();

    let mut state = AnalysisState::new(structure);
    let mut load_factor = 0.0;

    for (index, fraction) in control.schedule.fractions().into_iter().enumerate() {
        let step = index + 1;
        let delta_q = q_ref * fraction;
        load_factor += fraction;

        state.applied += &delta_q;
        state = predict(
            structure,
            state,
            &delta_q,
            &supports.scaled(fraction),
            step,
            &mut history,
        )?;

        let (next, convergence) = correct(structure, state, &held, options, step, &mut history)?;
        state = next;
        history.finish_step(step, Some(load_factor), &state, convergence);
    }

    Ok(history.into_results(structure, &options.analysis_type, state, false))
}

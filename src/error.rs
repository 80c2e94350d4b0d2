//! Error types for the truss solver

use thiserror::Error;

/// Main error type for truss analysis
#[derive(Error, Debug)]
pub enum TrussError {
    #[error("Node '{0}' not found in model")]
    NodeNotFound(String),

    #[error("Bar '{0}' not found in model")]
    BarNotFound(String),

    #[error("Duplicate name '{0}' already exists")]
    DuplicateName(String),

    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    #[error("Singular stiffness matrix over {free_dofs} free DOFs - structure is a mechanism or has insufficient supports")]
    SingularSystem { free_dofs: usize },

    #[error("Invalid control DOF {dof}: {reason}")]
    InvalidControlDof { dof: usize, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Model has not been analyzed")]
    NotAnalyzed,

    #[error("Analysis failed at step {step}, iteration {iteration}: {source}")]
    StepFailed {
        step: usize,
        iteration: usize,
        #[source]
        source: Box<TrussError>,
    },
}

impl TrussError {
    /// Attach step/iteration context to a solver-level error.
    ///
    /// Iteration 0 is the predictor of the step.
    pub fn at_step(self, step: usize, iteration: usize) -> Self {
        match self {
            already @ TrussError::StepFailed { .. } => already,
            other => TrussError::StepFailed {
                step,
                iteration,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, skipping step context wrappers
    pub fn root_cause(&self) -> &TrussError {
        match self {
            TrussError::StepFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type for truss operations
pub type TrussResult<T> = Result<T, TrussError>;

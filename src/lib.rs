//! Truss Solver - static analysis of pin-jointed trusses
//!
//! This library analyzes 2D and 3D trusses built from axial bars, supporting:
//! - Linear static analysis
//! - Geometrically nonlinear analysis (large displacements, Green-Lagrange
//!   strain) with force-controlled load increments
//! - Displacement-controlled incrementation that follows snap-through paths
//! - Enforced support displacements
//! - Equilibrium path tracing and per-step convergence records
//!
//! ## Example
//! ```rust
//! use truss_solver::prelude::*;
//!
//! let mut model = TrussModel::planar();
//!
//! // Shallow two-bar truss
//! model.add_node("A", Node::planar(0.0, 0.0)).unwrap();
//! model.add_node("B", Node::planar(1.0, 0.2)).unwrap();
//! model.add_node("C", Node::planar(2.0, 0.0)).unwrap();
//!
//! model.add_bar("AB", Bar::new("A", "B", 1.0e4, 1.0)).unwrap();
//! model.add_bar("BC", Bar::new("B", "C", 1.0e4, 1.0)).unwrap();
//!
//! model.add_support("A", Support::pinned()).unwrap();
//! model.add_support("C", Support::pinned()).unwrap();
//! model.add_node_load("B", NodeLoad::fy(-10.0)).unwrap();
//!
//! // Five equal load steps with Newton-Raphson equilibrium iterations
//! let results = model.analyze(&AnalysisOptions::force_controlled(5)).unwrap();
//! assert_eq!(results.steps.len(), 5);
//!
//! let displacement = model.node_displacement("B").unwrap();
//! assert!(displacement.dy < 0.0);
//! ```

pub mod analysis;
pub mod elements;
pub mod error;
pub mod loads;
pub mod math;
pub mod model;
pub mod results;
pub mod structure;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{
        AnalysisOptions, AnalysisType, ControlMode, DisplacementControl, ForceControl,
        LoadSchedule, NonConvergence, PathPoint, StepRecord,
    };
    pub use crate::elements::{Bar, Node, Support};
    pub use crate::error::{TrussError, TrussResult};
    pub use crate::loads::NodeLoad;
    pub use crate::math::Dimension;
    pub use crate::model::{Axis, TrussModel};
    pub use crate::results::{
        AnalysisResults, AnalysisSummary, BarForce, NodeDisplacement, Reactions,
    };
    pub use crate::structure::{BoundaryConditions, ElementTables, Structure};
}

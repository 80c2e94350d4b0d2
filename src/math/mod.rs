//! Mathematical utilities for truss calculations

pub mod forces;
pub mod kinematics;
pub mod partition;
pub mod stiffness;

use nalgebra::{DMatrix, DVector};

pub use kinematics::{BarKinematics, Dimension};
pub use partition::solve_prescribed;

pub type Mat = DMatrix<f64>;
pub type Vec = DVector<f64>;

/// Smallest admissible bar length
pub const MIN_LENGTH: f64 = 1e-10;

/// Check whether a square matrix equals its transpose within `tol`
pub fn is_symmetric(k: &Mat, tol: f64) -> bool {
    if !k.is_square() {
        return false;
    }
    let n = k.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            if (k[(i, j)] - k[(j, i)]).abs() > tol {
                return false;
            }
        }
    }
    true
}

/// Gather the entries of `a` at the given global DOFs
pub fn extract_element(edof: &[usize], a: &Vec) -> Vec {
    Vec::from_iterator(edof.len(), edof.iter().map(|&dof| a[dof]))
}

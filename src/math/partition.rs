//! Partitioned solution of `K a = f` with prescribed DOFs

use super::{Mat, Vec as FEVec};
use crate::error::{TrussError, TrussResult};
use crate::structure::BoundaryConditions;

/// Pivots smaller than this fraction of the largest pivot mark a singular system
const SINGULAR_PIVOT_RATIO: f64 = 1e-12;

/// Solve `K a = f` where the DOFs in `bc` are prescribed.
///
/// Free DOFs satisfy `K_ff a_f = f_f - K_fp v`; prescribed DOFs take their
/// values `v`. Returns the full solution `a` and the vector `R = K a - f`,
/// which holds the reactions at prescribed DOFs and vanishes (to round-off) at
/// free DOFs.
pub fn solve_prescribed(k: &Mat, f: &FEVec, bc: &BoundaryConditions) -> TrussResult<(FEVec, FEVec)> {
    let n = k.nrows();
    if !k.is_square() || f.len() != n {
        return Err(TrussError::InvalidInput(format!(
            "system of size {}x{} does not match load vector of length {}",
            k.nrows(),
            k.ncols(),
            f.len()
        )));
    }

    // Prescribed value per DOF, None for free DOFs
    let mut prescribed: std::vec::Vec<Option<f64>> = vec![None; n];
    for (dof, value) in bc.iter() {
        if dof >= n {
            return Err(TrussError::InvalidInput(format!(
                "prescribed DOF {} is outside the {} system DOFs",
                dof, n
            )));
        }
        match prescribed[dof] {
            Some(existing) if existing != value => {
                return Err(TrussError::InvalidInput(format!(
                    "DOF {} prescribed twice with values {} and {}",
                    dof, existing, value
                )));
            }
            _ => prescribed[dof] = Some(value),
        }
    }

    let free_dofs: std::vec::Vec<usize> = (0..n).filter(|&i| prescribed[i].is_none()).collect();

    let mut a = FEVec::zeros(n);
    for (dof, value) in prescribed.iter().enumerate() {
        if let Some(v) = value {
            a[dof] = *v;
        }
    }

    if !free_dofs.is_empty() {
        let n_free = free_dofs.len();
        let mut k_ff = Mat::zeros(n_free, n_free);
        let mut f_f = FEVec::zeros(n_free);

        for (i, &di) in free_dofs.iter().enumerate() {
            f_f[i] = f[di];
            for (j, &dj) in free_dofs.iter().enumerate() {
                k_ff[(i, j)] = k[(di, dj)];
            }
            // Move known displacements to the right-hand side
            for (dj, value) in prescribed.iter().enumerate() {
                if let Some(v) = value {
                    f_f[i] -= k[(di, dj)] * v;
                }
            }
        }

        let a_f = solve_free_block(k_ff, &f_f)?;
        for (i, &di) in free_dofs.iter().enumerate() {
            a[di] = a_f[i];
        }
    }

    let r = k * &a - f;
    Ok((a, r))
}

/// LU solve of the free block, rejecting singular or numerically singular systems
fn solve_free_block(k_ff: Mat, f_f: &FEVec) -> TrussResult<FEVec> {
    let n_free = k_ff.nrows();
    let singular = || TrussError::SingularSystem { free_dofs: n_free };

    let lu = k_ff.lu();
    let pivots = lu.u().diagonal();
    let largest = pivots.amax();
    let smallest = pivots.iter().fold(f64::INFINITY, |m, p| m.min(p.abs()));

    if !largest.is_finite() || largest == 0.0 || smallest <= SINGULAR_PIVOT_RATIO * largest {
        return Err(singular());
    }

    let a_f = lu.solve(f_f).ok_or_else(singular)?;
    if a_f.iter().any(|v| !v.is_finite()) {
        return Err(singular());
    }
    Ok(a_f)
}

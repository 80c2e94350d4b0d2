//! Element stiffness matrices and global assembly
//!
//! Local element DOFs are ordered `[u1, v1(, w1), u2, v2(, w2)]` where `u` runs
//! along the undeformed bar axis. With `d = (du, dv[, dw])` the displacement of
//! node 2 relative to node 1 in local axes, the tangent stiffness of a bar is
//!
//! ```text
//! Ke_T = Ke_0 + Ke_u + Ke_sigma
//! Ke_0     = G^T (EA/L) [[ P, -P], [-P,  P]] G      P = e1 e1^T
//! Ke_u     = G^T        [[ C, -C], [-C,  C]] G      C = EA/L^2 C1 + EA/L^3 d d^T
//! Ke_sigma = G^T (N/L)  [[ I, -I], [-I,  I]] G
//! ```
//!
//! with `C1[0][0] = 2 du`, `C1[0][k] = C1[k][0] = d_k`.

use super::kinematics::BarKinematics;
use super::{extract_element, Mat, Vec as FEVec};
use crate::structure::Structure;

/// Expand a node-level block `C` into the bar pattern `[[C, -C], [-C, C]]`
fn bar_pattern(c: &Mat) -> Mat {
    let nd = c.nrows();
    let mut k = Mat::zeros(2 * nd, 2 * nd);
    for i in 0..nd {
        for j in 0..nd {
            let v = c[(i, j)];
            k[(i, j)] = v;
            k[(i, j + nd)] = -v;
            k[(i + nd, j)] = -v;
            k[(i + nd, j + nd)] = v;
        }
    }
    k
}

/// Linear elastic stiffness of a bar in global coordinates
pub fn bar_ke_0(kin: &BarKinematics, ea: f64) -> Mat {
    let nd = kin.nd();
    let mut c = Mat::zeros(nd, nd);
    c[(0, 0)] = ea / kin.length;
    kin.rotate_matrix(&bar_pattern(&c))
}

/// Initial-displacement stiffness of a bar in global coordinates
///
/// `q_e` holds the bar's current global displacements.
pub fn bar_ke_u(kin: &BarKinematics, ea: f64, q_e: &FEVec) -> Mat {
    let nd = kin.nd();
    let l = kin.length;
    let d = kin.relative_local(q_e);

    let mut c1 = Mat::zeros(nd, nd);
    c1[(0, 0)] = 2.0 * d[0];
    for k in 1..nd {
        c1[(0, k)] = d[k];
        c1[(k, 0)] = d[k];
    }
    let c2 = &d * d.transpose();

    let c = c1 * (ea / (l * l)) + c2 * (ea / (l * l * l));
    kin.rotate_matrix(&bar_pattern(&c))
}

/// Geometric (stress) stiffness of a bar carrying axial force `n`
pub fn bar_ke_sigma(kin: &BarKinematics, n: f64) -> Mat {
    let c = Mat::identity(kin.nd(), kin.nd()) * (n / kin.length);
    kin.rotate_matrix(&bar_pattern(&c))
}

/// Tangent stiffness `Ke_0 + Ke_u + Ke_sigma` of a bar
pub fn bar_ke_t(kin: &BarKinematics, ea: f64, q_e: &FEVec, n: f64) -> Mat {
    bar_ke_0(kin, ea) + bar_ke_u(kin, ea, q_e) + bar_ke_sigma(kin, n)
}

/// Scatter an element matrix into the global matrix according to `edof`
pub fn assemble(k: &mut Mat, edof: &[usize], ke: &Mat) {
    for (a, &row) in edof.iter().enumerate() {
        for (b, &col) in edof.iter().enumerate() {
            k[(row, col)] += ke[(a, b)];
        }
    }
}

/// Assemble the global linear stiffness matrix `K_0`
pub fn global_linear_stiffness(structure: &Structure) -> Mat {
    let n = structure.n_dofs();
    let mut k = Mat::zeros(n, n);
    for bar in structure.elements() {
        let ke = bar_ke_0(&bar.kinematics, bar.ea());
        assemble(&mut k, &bar.edof, &ke);
    }
    k
}

/// Assemble the global tangent stiffness `K_T` at displacement `q` with
/// current bar axial forces `axial_forces`
pub fn global_tangent_stiffness(structure: &Structure, q: &FEVec, axial_forces: &FEVec) -> Mat {
    let n = structure.n_dofs();
    let mut k = Mat::zeros(n, n);
    for (i, bar) in structure.elements().iter().enumerate() {
        let q_e = extract_element(&bar.edof, q);
        let ke = bar_ke_t(&bar.kinematics, bar.ea(), &q_e, axial_forces[i]);
        assemble(&mut k, &bar.edof, &ke);
    }
    k
}

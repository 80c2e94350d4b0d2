//! Bar axial forces, internal force vector and residual

use super::kinematics::BarKinematics;
use super::{extract_element, Vec as FEVec};
use crate::structure::Structure;

/// Green-Lagrange axial force of a bar
///
/// `N = EA (B0 + B1/2) q_local = EA (du/L + |d|^2 / (2 L^2))`
pub fn bar_axial_force(kin: &BarKinematics, ea: f64, q_e: &FEVec) -> f64 {
    let l = kin.length;
    let d = kin.relative_local(q_e);
    ea * (d[0] / l + 0.5 * d.norm_squared() / (l * l))
}

/// Small-displacement axial force `N = EA B0 q_local = EA du / L`
pub fn bar_axial_force_linear(kin: &BarKinematics, ea: f64, q_e: &FEVec) -> f64 {
    let d = kin.relative_local(q_e);
    ea * d[0] / kin.length
}

/// Global end forces of a bar carrying axial force `n` in its current
/// configuration
pub fn bar_internal_force(kin: &BarKinematics, q_e: &FEVec, n: f64) -> FEVec {
    let nd = kin.nd();
    let d = kin.relative_local(q_e);

    // Deformed axis direction scaled by the undeformed length
    let mut c = d / kin.length;
    c[0] += 1.0;

    let mut f_local = FEVec::zeros(2 * nd);
    for k in 0..nd {
        f_local[k] = -n * c[k];
        f_local[nd + k] = n * c[k];
    }
    kin.rotate_vector(&f_local)
}

/// Nonlinear axial force of every bar at displacement `q`
pub fn axial_forces(structure: &Structure, q: &FEVec) -> FEVec {
    FEVec::from_iterator(
        structure.elements().len(),
        structure.elements().iter().map(|bar| {
            let q_e = extract_element(&bar.edof, q);
            bar_axial_force(&bar.kinematics, bar.ea(), &q_e)
        }),
    )
}

/// Linearized axial force of every bar at displacement `q`
pub fn axial_forces_linear(structure: &Structure, q: &FEVec) -> FEVec {
    FEVec::from_iterator(
        structure.elements().len(),
        structure.elements().iter().map(|bar| {
            let q_e = extract_element(&bar.edof, q);
            bar_axial_force_linear(&bar.kinematics, bar.ea(), &q_e)
        }),
    )
}

/// Assemble the global internal force vector
pub fn internal_force_vector(structure: &Structure, q: &FEVec, axial_forces: &FEVec) -> FEVec {
    let mut f = FEVec::zeros(structure.n_dofs());
    for (i, bar) in structure.elements().iter().enumerate() {
        let q_e = extract_element(&bar.edof, q);
        let fe = bar_internal_force(&bar.kinematics, &q_e, axial_forces[i]);
        for (a, &dof) in bar.edof.iter().enumerate() {
            f[dof] += fe[a];
        }
    }
    f
}

/// Out-of-balance force `Q + R - F(q)`
pub fn residual(
    structure: &Structure,
    q: &FEVec,
    axial_forces: &FEVec,
    applied: &FEVec,
    reactions: &FEVec,
) -> FEVec {
    applied + reactions - internal_force_vector(structure, q, axial_forces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Dimension;
    use approx::assert_relative_eq;

    #[test]
    fn test_axial_force_pure_stretch() {
        let kin = BarKinematics::new(&[0.0, 0.0, 0.0], &[1.0, 0.0, 0.0], Dimension::Two).unwrap();
        let q = FEVec::from_vec(vec![0.0, 0.0, 0.1, 0.0]);
        assert_relative_eq!(bar_axial_force_linear(&kin, 1.0, &q), 0.1, epsilon = 1e-12);
        assert_relative_eq!(bar_axial_force(&kin, 1.0, &q), 0.105, epsilon = 1e-12);
    }

    #[test]
    fn test_rigid_rotation_is_stress_free() {
        // Rotate a unit bar by 30 degrees about node 1: exact Green-Lagrange strain is zero
        let kin = BarKinematics::new(&[0.0, 0.0, 0.0], &[1.0, 0.0, 0.0], Dimension::Two).unwrap();
        let theta = 30f64.to_radians();
        let q = FEVec::from_vec(vec![0.0, 0.0, theta.cos() - 1.0, theta.sin()]);
        assert_relative_eq!(bar_axial_force(&kin, 5.0, &q), 0.0, epsilon = 1e-12);
        assert!(bar_axial_force_linear(&kin, 5.0, &q).abs() > 0.1);
    }

    #[test]
    fn test_internal_force_along_deformed_axis() {
        let kin = BarKinematics::new(&[0.0, 0.0, 0.0], &[0.0, 0.0, 2.0], Dimension::Three).unwrap();
        let q = FEVec::from_vec(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.2]);
        let n = bar_axial_force(&kin, 10.0, &q);
        let f = bar_internal_force(&kin, &q, n);

        // End forces are equal and opposite along global Z
        assert_relative_eq!(f[2], -n * 1.1, epsilon = 1e-12);
        assert_relative_eq!(f[5], n * 1.1, epsilon = 1e-12);
        for i in [0, 1, 3, 4] {
            assert_relative_eq!(f[i], 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_linear_axial_force_is_pure() {
        let kin = BarKinematics::new(&[0.2, 0.1, 0.0], &[1.4, 0.9, 0.0], Dimension::Two).unwrap();
        let q = FEVec::from_vec(vec![0.01, -0.02, 0.03, 0.04]);
        let first = bar_axial_force_linear(&kin, 3.0, &q);
        let second = bar_axial_force_linear(&kin, 3.0, &q);
        assert_eq!(first.to_bits(), second.to_bits());
    }
}

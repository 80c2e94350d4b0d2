//! Bar element kinematics: length and direction-cosine transformation

use serde::{Deserialize, Serialize};

use super::{Mat, Vec as FEVec, MIN_LENGTH};
use crate::error::{TrussError, TrussResult};

/// Spatial dimension of a truss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Dimension {
    /// Plane truss, 2 DOFs per node (ux, uy)
    #[default]
    Two,
    /// Space truss, 3 DOFs per node (ux, uy, uz)
    Three,
}

impl Dimension {
    /// Number of translational DOFs owned by each node
    pub fn dofs_per_node(self) -> usize {
        match self {
            Dimension::Two => 2,
            Dimension::Three => 3,
        }
    }

    /// Number of DOFs of a two-node bar
    pub fn element_dofs(self) -> usize {
        2 * self.dofs_per_node()
    }
}

/// Euclidean distance between bar end points.
///
/// Fails with `InvalidTopology` for coincident end points.
pub fn length(p0: &[f64; 3], p1: &[f64; 3]) -> TrussResult<f64> {
    let dx = p1[0] - p0[0];
    let dy = p1[1] - p0[1];
    let dz = p1[2] - p0[2];
    let l = (dx * dx + dy * dy + dz * dz).sqrt();

    if !l.is_finite() || l < MIN_LENGTH {
        return Err(TrussError::InvalidTopology(format!(
            "zero-length bar between {:?} and {:?}",
            p0, p1
        )));
    }
    Ok(l)
}

/// Compute the transformation matrix G of a bar.
///
/// G maps global element displacements `[u1, v1(, w1), u2, v2(, w2)]` into the
/// local frame whose first axis runs from `p0` to `p1`. It is block diagonal
/// with one rotation block per node and satisfies `G^T G = I`.
pub fn transform(p0: &[f64; 3], p1: &[f64; 3], dimension: Dimension) -> TrussResult<Mat> {
    let l = length(p0, p1)?;
    let n = [(p1[0] - p0[0]) / l, (p1[1] - p0[1]) / l, (p1[2] - p0[2]) / l];

    let r = match dimension {
        Dimension::Two => {
            if n[2].abs() > 1e-12 {
                return Err(TrussError::InvalidTopology(format!(
                    "plane bar between {:?} and {:?} leaves the XY plane",
                    p0, p1
                )));
            }
            Mat::from_row_slice(2, 2, &[n[0], n[1], -n[1], n[0]])
        }
        Dimension::Three => {
            let (t1, t2) = transverse_axes(&n);
            #[rustfmt::skip]
            let r = Mat::from_row_slice(3, 3, &[
                n[0],  n[1],  n[2],
                t1[0], t1[1], t1[2],
                t2[0], t2[1], t2[2],
            ]);
            r
        }
    };

    let nd = dimension.dofs_per_node();
    let mut g = Mat::zeros(2 * nd, 2 * nd);
    for block in 0..2 {
        let offset = block * nd;
        for row in 0..nd {
            for col in 0..nd {
                g[(offset + row, offset + col)] = r[(row, col)];
            }
        }
    }
    Ok(g)
}

/// Two unit vectors completing `n` to a right-handed orthonormal triad.
///
/// The helper axis is the global axis least aligned with `n`, so the cross
/// product never degenerates.
fn transverse_axes(n: &[f64; 3]) -> ([f64; 3], [f64; 3]) {
    let abs = [n[0].abs(), n[1].abs(), n[2].abs()];
    let helper = if abs[0] <= abs[1] && abs[0] <= abs[2] {
        [1.0, 0.0, 0.0]
    } else if abs[1] <= abs[2] {
        [0.0, 1.0, 0.0]
    } else {
        [0.0, 0.0, 1.0]
    };

    let t1 = normalize(cross(&helper, n));
    let t2 = cross(n, &t1);
    (t1, t2)
}

fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize(v: [f64; 3]) -> [f64; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    [v[0] / len, v[1] / len, v[2] / len]
}

/// Geometry of one bar, computed once when the structure is built
#[derive(Debug, Clone)]
pub struct BarKinematics {
    /// Spatial dimension
    pub dimension: Dimension,
    /// Undeformed length
    pub length: f64,
    /// Global-to-local transformation matrix
    pub g: Mat,
}

impl BarKinematics {
    pub fn new(p0: &[f64; 3], p1: &[f64; 3], dimension: Dimension) -> TrussResult<Self> {
        Ok(Self {
            dimension,
            length: length(p0, p1)?,
            g: transform(p0, p1, dimension)?,
        })
    }

    /// DOFs per node of this bar
    pub fn nd(&self) -> usize {
        self.dimension.dofs_per_node()
    }

    /// Local element displacements `G * q_e`
    pub fn to_local(&self, q_global: &FEVec) -> FEVec {
        &self.g * q_global
    }

    /// Relative displacement of node 2 with respect to node 1 in local axes:
    /// `(du, dv[, dw])`
    pub fn relative_local(&self, q_global: &FEVec) -> FEVec {
        let ql = self.to_local(q_global);
        let nd = self.nd();
        FEVec::from_iterator(nd, (0..nd).map(|k| ql[nd + k] - ql[k]))
    }

    /// Rotate a local element matrix into global axes: `G^T K G`
    pub fn rotate_matrix(&self, k_local: &Mat) -> Mat {
        self.g.transpose() * k_local * &self.g
    }

    /// Rotate a local element vector into global axes: `G^T f`
    pub fn rotate_vector(&self, f_local: &FEVec) -> FEVec {
        self.g.transpose() * f_local
    }
}

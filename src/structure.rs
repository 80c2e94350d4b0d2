//! Assembled structure tables consumed by every analysis
//!
//! A [`Structure`] is the compiled form of a truss: per-bar geometry and
//! stiffness, the DOF topology, the prescribed DOFs and the reference load
//! vector. It is built either from a [`TrussModel`](crate::model::TrussModel)
//! or directly from raw element tables with [`Structure::from_tables`].

use serde::{Deserialize, Serialize};

use crate::error::{TrussError, TrussResult};
use crate::math::{BarKinematics, Dimension, Vec as FEVec};

/// Prescribed DOFs with their values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryConditions {
    dofs: Vec<usize>,
    values: Vec<f64>,
}

impl BoundaryConditions {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Homogeneous conditions (all values zero) on the given DOFs
    pub fn fixed(dofs: &[usize]) -> Self {
        Self {
            dofs: dofs.to_vec(),
            values: vec![0.0; dofs.len()],
        }
    }

    /// Prescribe `value` at `dof`
    pub fn push(&mut self, dof: usize, value: f64) {
        self.dofs.push(dof);
        self.values.push(value);
    }

    /// Same DOFs with every value set to zero
    pub fn homogeneous(&self) -> Self {
        Self::fixed(&self.dofs)
    }

    /// Same DOFs with every value multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            dofs: self.dofs.clone(),
            values: self.values.iter().map(|v| v * factor).collect(),
        }
    }

    /// Union with another set, `other` appended after `self`
    pub fn extended(&self, other: &BoundaryConditions) -> Self {
        let mut bc = self.clone();
        for (dof, value) in other.iter() {
            bc.push(dof, value);
        }
        bc
    }

    pub fn dofs(&self) -> &[usize] {
        &self.dofs
    }

    pub fn contains(&self, dof: usize) -> bool {
        self.dofs.contains(&dof)
    }

    /// Iterate `(dof, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.dofs.iter().copied().zip(self.values.iter().copied())
    }
}

/// One bar of the assembled structure
#[derive(Debug, Clone)]
pub struct BarElement {
    /// Bar name (the model name, or `"E<n>"` for table input)
    pub name: String,
    /// Start point [X, Y, Z]
    pub start: [f64; 3],
    /// End point [X, Y, Z]
    pub end: [f64; 3],
    /// Young's modulus
    pub e: f64,
    /// Cross-section area
    pub a: f64,
    /// Global DOFs of the bar, 0-based
    pub edof: Vec<usize>,
    /// Length and transformation matrix
    pub kinematics: BarKinematics,
}

impl BarElement {
    /// Build a bar, validating its properties and geometry
    pub fn new(
        name: &str,
        start: [f64; 3],
        end: [f64; 3],
        e: f64,
        a: f64,
        edof: Vec<usize>,
        dimension: Dimension,
    ) -> TrussResult<Self> {
        if !(e.is_finite() && e > 0.0) || !(a.is_finite() && a > 0.0) {
            return Err(TrussError::InvalidInput(format!(
                "bar '{}' needs positive E and A (got E={}, A={})",
                name, e, a
            )));
        }
        if edof.len() != dimension.element_dofs() {
            return Err(TrussError::InvalidTopology(format!(
                "bar '{}' has {} DOFs, expected {}",
                name,
                edof.len(),
                dimension.element_dofs()
            )));
        }
        let kinematics = BarKinematics::new(&start, &end, dimension).map_err(|err| match err {
            TrussError::InvalidTopology(msg) => {
                TrussError::InvalidTopology(format!("bar '{}': {}", name, msg))
            }
            other => other,
        })?;

        Ok(Self {
            name: name.to_string(),
            start,
            end,
            e,
            a,
            edof,
            kinematics,
        })
    }

    /// Axial stiffness EA
    pub fn ea(&self) -> f64 {
        self.e * self.a
    }

    pub fn length(&self) -> f64 {
        self.kinematics.length
    }
}

/// Raw per-element tables as produced by external model builders.
///
/// Row `i` of each table describes element `i`. Topology rows hold 1-based
/// global DOF indices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementTables {
    /// `[x1, x2]` per element
    pub ex: Vec<[f64; 2]>,
    /// `[y1, y2]` per element
    pub ey: Vec<[f64; 2]>,
    /// `[z1, z2]` per element, required for space trusses
    pub ez: Option<Vec<[f64; 2]>>,
    /// `[E, A]` per element
    pub ep: Vec<[f64; 2]>,
    /// 1-based global DOFs per element (4 or 6 entries)
    pub edof: Vec<Vec<usize>>,
}

/// Compiled truss ready for analysis
#[derive(Debug, Clone)]
pub struct Structure {
    dimension: Dimension,
    n_dofs: usize,
    elements: Vec<BarElement>,
    supports: BoundaryConditions,
    loads: FEVec,
}

impl Structure {
    /// Assemble a structure from already validated parts
    pub fn new(
        dimension: Dimension,
        n_dofs: usize,
        elements: Vec<BarElement>,
        supports: BoundaryConditions,
        loads: FEVec,
    ) -> TrussResult<Self> {
        if loads.len() != n_dofs {
            return Err(TrussError::InvalidInput(format!(
                "load vector has {} entries for {} DOFs",
                loads.len(),
                n_dofs
            )));
        }
        for bar in &elements {
            if let Some(&dof) = bar.edof.iter().find(|&&dof| dof >= n_dofs) {
                return Err(TrussError::InvalidTopology(format!(
                    "bar '{}' references DOF {} outside the {} structure DOFs",
                    bar.name, dof, n_dofs
                )));
            }
        }
        if let Some(dof) = supports.dofs().iter().find(|&&dof| dof >= n_dofs) {
            return Err(TrussError::InvalidTopology(format!(
                "support DOF {} outside the {} structure DOFs",
                dof, n_dofs
            )));
        }
        if loads.iter().any(|v| !v.is_finite()) {
            return Err(TrussError::InvalidInput("load vector is not finite".to_string()));
        }

        Ok(Self {
            dimension,
            n_dofs,
            elements,
            supports,
            loads,
        })
    }

    /// Build a structure from raw tables.
    ///
    /// `supports` lists 1-based blocked DOFs and `loads` is the dense external
    /// force vector, whose length defines the total DOF count.
    pub fn from_tables(
        dimension: Dimension,
        tables: &ElementTables,
        supports: &[usize],
        loads: &[f64],
    ) -> TrussResult<Self> {
        let n_elements = tables.ex.len();
        if tables.ey.len() != n_elements
            || tables.ep.len() != n_elements
            || tables.edof.len() != n_elements
        {
            return Err(TrussError::InvalidTopology(format!(
                "element tables disagree on element count: ex={}, ey={}, ep={}, edof={}",
                n_elements,
                tables.ey.len(),
                tables.ep.len(),
                tables.edof.len()
            )));
        }

        let ez = match (dimension, &tables.ez) {
            (Dimension::Three, Some(ez)) if ez.len() == n_elements => Some(ez),
            (Dimension::Three, Some(ez)) => {
                return Err(TrussError::InvalidTopology(format!(
                    "ez table has {} rows for {} elements",
                    ez.len(),
                    n_elements
                )))
            }
            (Dimension::Three, None) => {
                return Err(TrussError::InvalidInput(
                    "space truss requires z coordinates".to_string(),
                ))
            }
            (Dimension::Two, _) => None,
        };

        let n_dofs = loads.len();
        let mut elements = Vec::with_capacity(n_elements);
        for i in 0..n_elements {
            let name = format!("E{}", i + 1);
            let z = ez.map(|ez| ez[i]).unwrap_or([0.0, 0.0]);
            let start = [tables.ex[i][0], tables.ey[i][0], z[0]];
            let end = [tables.ex[i][1], tables.ey[i][1], z[1]];
            let edof = to_zero_based(&tables.edof[i], n_dofs)
                .map_err(|msg| TrussError::InvalidTopology(format!("element {}: {}", name, msg)))?;
            let [e, a] = tables.ep[i];
            elements.push(BarElement::new(&name, start, end, e, a, edof, dimension)?);
        }

        let support_dofs = to_zero_based(supports, n_dofs)
            .map_err(|msg| TrussError::InvalidTopology(format!("supports: {}", msg)))?;

        Self::new(
            dimension,
            n_dofs,
            elements,
            BoundaryConditions::fixed(&support_dofs),
            FEVec::from_column_slice(loads),
        )
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Total number of DOFs
    pub fn n_dofs(&self) -> usize {
        self.n_dofs
    }

    /// Number of nodes implied by the DOF count
    pub fn n_nodes(&self) -> usize {
        self.n_dofs / self.dimension.dofs_per_node()
    }

    pub fn elements(&self) -> &[BarElement] {
        &self.elements
    }

    /// Support conditions, including enforced support displacements
    pub fn supports(&self) -> &BoundaryConditions {
        &self.supports
    }

    /// Reference external load vector
    pub fn loads(&self) -> &FEVec {
        &self.loads
    }

    /// Cross-section areas, in element order
    pub fn areas(&self) -> FEVec {
        FEVec::from_iterator(self.elements.len(), self.elements.iter().map(|bar| bar.a))
    }

    /// Number of unconstrained DOFs
    pub fn free_dofs(&self) -> usize {
        let mut blocked = self.supports.dofs().to_vec();
        blocked.sort_unstable();
        blocked.dedup();
        self.n_dofs - blocked.len()
    }
}

fn to_zero_based(dofs: &[usize], n_dofs: usize) -> Result<Vec<usize>, String> {
    dofs.iter()
        .map(|&dof| {
            if dof == 0 || dof > n_dofs {
                Err(format!("DOF {} is outside 1..={}", dof, n_dofs))
            } else {
                Ok(dof - 1)
            }
        })
        .collect()
}

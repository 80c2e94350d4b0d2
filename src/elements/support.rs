//! Support conditions

use serde::{Deserialize, Serialize};

/// Translational restraints at a node.
///
/// A restrained direction may carry an enforced displacement; otherwise it is
/// held at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Support {
    /// Restrained in X translation
    pub dx: bool,
    /// Restrained in Y translation
    pub dy: bool,
    /// Restrained in Z translation
    pub dz: bool,

    /// Enforced displacement in X (if dx is true and this is Some)
    pub enforced_dx: Option<f64>,
    /// Enforced displacement in Y
    pub enforced_dy: Option<f64>,
    /// Enforced displacement in Z
    pub enforced_dz: Option<f64>,
}

impl Support {
    /// Create a pinned support (all translations restrained)
    pub fn pinned() -> Self {
        Self::with_restraints(true, true, true)
    }

    /// Create a roller support (Y translation restrained only)
    pub fn roller_y() -> Self {
        Self::with_restraints(false, true, false)
    }

    /// Create a roller support (X translation restrained only)
    pub fn roller_x() -> Self {
        Self::with_restraints(true, false, false)
    }

    /// Create a roller support (Z translation restrained only)
    pub fn roller_z() -> Self {
        Self::with_restraints(false, false, true)
    }

    /// Create a support with specific restraints
    pub fn with_restraints(dx: bool, dy: bool, dz: bool) -> Self {
        Self {
            dx,
            dy,
            dz,
            ..Default::default()
        }
    }

    /// Set an enforced displacement in X
    pub fn with_enforced_dx(mut self, value: f64) -> Self {
        self.enforced_dx = Some(value);
        self.dx = true;
        self
    }

    /// Set an enforced displacement in Y
    pub fn with_enforced_dy(mut self, value: f64) -> Self {
        self.enforced_dy = Some(value);
        self.dy = true;
        self
    }

    /// Set an enforced displacement in Z
    pub fn with_enforced_dz(mut self, value: f64) -> Self {
        self.enforced_dz = Some(value);
        self.dz = true;
        self
    }

    /// Restraint flags [DX, DY, DZ]
    pub fn restraints(&self) -> [bool; 3] {
        [self.dx, self.dy, self.dz]
    }

    /// Get enforced displacement array [DX, DY, DZ]
    pub fn enforced_displacements(&self) -> [Option<f64>; 3] {
        [self.enforced_dx, self.enforced_dy, self.enforced_dz]
    }

    /// Prescribed `(direction, value)` pairs for the first `dofs_per_node`
    /// directions
    pub fn prescribed(&self, dofs_per_node: usize) -> Vec<(usize, f64)> {
        let restraints = self.restraints();
        let enforced = self.enforced_displacements();
        (0..dofs_per_node.min(3))
            .filter(|&k| restraints[k])
            .map(|k| (k, enforced[k].unwrap_or(0.0)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pinned_support() {
        let support = Support::pinned();
        assert!(support.dx && support.dy && support.dz);
        assert_eq!(support.prescribed(3).len(), 3);
        assert_eq!(support.prescribed(2), vec![(0, 0.0), (1, 0.0)]);
    }

    #[test]
    fn test_roller_support() {
        let support = Support::roller_y();
        assert!(!support.dx && support.dy && !support.dz);
        assert_eq!(support.prescribed(3), vec![(1, 0.0)]);
    }

    #[test]
    fn test_enforced_displacement() {
        let support = Support::roller_x().with_enforced_dy(-0.01);
        assert!(support.dy);
        assert_eq!(support.enforced_dy, Some(-0.01));
        assert_eq!(support.prescribed(2), vec![(0, 0.0), (1, -0.01)]);
    }
}

//! Node loads - forces applied directly to nodes

use serde::{Deserialize, Serialize};

/// A reference force applied directly to a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeLoad {
    /// Force in X direction (N)
    pub fx: f64,
    /// Force in Y direction (N)
    pub fy: f64,
    /// Force in Z direction (N)
    pub fz: f64,
}

impl NodeLoad {
    /// Create a force node load
    pub fn force(fx: f64, fy: f64, fz: f64) -> Self {
        Self { fx, fy, fz }
    }

    /// Create a load in X direction
    pub fn fx(value: f64) -> Self {
        Self::force(value, 0.0, 0.0)
    }

    /// Create a load in Y direction
    pub fn fy(value: f64) -> Self {
        Self::force(0.0, value, 0.0)
    }

    /// Create a load in Z direction
    pub fn fz(value: f64) -> Self {
        Self::force(0.0, 0.0, value)
    }

    /// Get the load as an array [FX, FY, FZ]
    pub fn as_array(&self) -> [f64; 3] {
        [self.fx, self.fy, self.fz]
    }

    /// Component-wise sum, used when several loads target one node
    pub fn combined(&self, other: &NodeLoad) -> Self {
        Self::force(self.fx + other.fx, self.fy + other.fy, self.fz + other.fz)
    }
}

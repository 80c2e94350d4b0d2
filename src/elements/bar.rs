//! Bar element - an axial member between two nodes

use serde::{Deserialize, Serialize};

/// A pin-ended bar carrying axial force only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    /// Start node name
    pub i_node: String,
    /// End node name
    pub j_node: String,
    /// Young's modulus
    pub e: f64,
    /// Cross-section area
    pub a: f64,
}

impl Bar {
    /// Create a new bar
    pub fn new(i_node: &str, j_node: &str, e: f64, a: f64) -> Self {
        Self {
            i_node: i_node.to_string(),
            j_node: j_node.to_string(),
            e,
            a,
        }
    }

    /// Axial stiffness EA
    pub fn ea(&self) -> f64 {
        self.e * self.a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_axial_stiffness() {
        let bar = Bar::new("N1", "N2", 210e9, 2e-3);
        assert_eq!(bar.i_node, "N1");
        assert!((bar.ea() - 4.2e8).abs() < 1e-3);
    }
}

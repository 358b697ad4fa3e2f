//! 2D continuum elements: the CST/Q4 plane-stress/strain pair and the DKT
//! plate-bending triangle.

use serde::{Deserialize, Serialize};

pub use crate::math::plane::PlaneCondition;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TriangleElement {
    pub id: u64,
    pub node_ids: [u64; 3],
    pub material_id: u64,
    pub thickness: f64,
    pub condition: PlaneCondition,
}

impl TriangleElement {
    pub fn new(id: u64, node_ids: [u64; 3], material_id: u64, thickness: f64) -> Self {
        Self { id, node_ids, material_id, thickness, condition: PlaneCondition::Stress }
    }

    /// Vertices must not be collinear: signed area nonzero.
    pub fn validate(&self, x: &[f64; 3], y: &[f64; 3]) -> Result<(), String> {
        if self.thickness <= 0.0 {
            return Err(format!("triangle {} must have positive thickness", self.id));
        }
        let area2 = (x[1] - x[0]) * (y[2] - y[0]) - (x[2] - x[0]) * (y[1] - y[0]);
        if area2.abs() < 1e-12 {
            return Err(format!("triangle {} vertices are collinear", self.id));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuadElement {
    pub id: u64,
    pub node_ids: [u64; 4],
    pub material_id: u64,
    pub thickness: f64,
    pub condition: PlaneCondition,
}

impl QuadElement {
    pub fn new(id: u64, node_ids: [u64; 4], material_id: u64, thickness: f64) -> Self {
        Self { id, node_ids, material_id, thickness, condition: PlaneCondition::Stress }
    }

    /// Convex and counter-clockwise: every consecutive cross product has the
    /// same (positive) sign.
    pub fn validate(&self, x: &[f64; 4], y: &[f64; 4]) -> Result<(), String> {
        if self.thickness <= 0.0 {
            return Err(format!("quad {} must have positive thickness", self.id));
        }
        let mut signs = [0.0; 4];
        for i in 0..4 {
            let j = (i + 1) % 4;
            let k = (i + 2) % 4;
            let ax = x[j] - x[i];
            let ay = y[j] - y[i];
            let bx = x[k] - x[j];
            let by = y[k] - y[j];
            signs[i] = ax * by - ay * bx;
        }
        if signs.iter().any(|&s| s <= 0.0) {
            return Err(format!("quad {} is not convex and counter-clockwise", self.id));
        }
        Ok(())
    }
}

/// DKT plate-bending triangle. Distinct from `TriangleElement`: 9 bending
/// DOFs (`w, θx, θy` per node) rather than 6 membrane DOFs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DktElement {
    pub id: u64,
    pub node_ids: [u64; 3],
    pub material_id: u64,
    pub thickness: f64,
}

impl DktElement {
    pub fn new(id: u64, node_ids: [u64; 3], material_id: u64, thickness: f64) -> Self {
        Self { id, node_ids, material_id, thickness }
    }

    pub fn validate(&self, x: &[f64; 3], y: &[f64; 3]) -> Result<(), String> {
        if self.thickness <= 0.0 {
            return Err(format!("plate triangle {} must have positive thickness", self.id));
        }
        let area2 = (x[1] - x[0]) * (y[2] - y[0]) - (x[2] - x[0]) * (y[1] - y[0]);
        if area2.abs() < 1e-12 {
            return Err(format!("plate triangle {} vertices are collinear", self.id));
        }
        Ok(())
    }
}

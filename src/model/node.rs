//! Node entity: position, per-DOF constraints/springs, and applied nodal loads.

use serde::{Deserialize, Serialize};

/// Per-DOF support condition. A spring on a DOF **replaces** a rigid
/// constraint on that DOF: the assembler adds stiffness to the diagonal
/// instead of eliminating the row/column.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Constraints {
    pub x: bool,
    pub y: bool,
    pub rotation: bool,
    pub spring_x: Option<f64>,
    pub spring_y: Option<f64>,
    pub spring_rot: Option<f64>,
}

impl Constraints {
    pub fn free() -> Self {
        Self::default()
    }

    pub fn fixed() -> Self {
        Self { x: true, y: true, rotation: true, ..Default::default() }
    }

    pub fn pinned() -> Self {
        Self { x: true, y: true, rotation: false, ..Default::default() }
    }

    pub fn roller_y() -> Self {
        Self { x: false, y: true, rotation: false, ..Default::default() }
    }

    pub fn roller_x() -> Self {
        Self { x: true, y: false, rotation: false, ..Default::default() }
    }

    /// Whether the given 0=x/1=y/2=rotation DOF is eliminated from the
    /// reduced system: constrained **and** carrying no spring on that DOF.
    pub fn is_eliminated(&self, dof: usize) -> bool {
        match dof {
            0 => self.x && self.spring_x.is_none(),
            1 => self.y && self.spring_y.is_none(),
            2 => self.rotation && self.spring_rot.is_none(),
            _ => unreachable!("node DOF index out of range"),
        }
    }

    pub fn spring(&self, dof: usize) -> Option<f64> {
        match dof {
            0 => self.spring_x,
            1 => self.spring_y,
            2 => self.spring_rot,
            _ => unreachable!("node DOF index out of range"),
        }
    }
}

/// Applied loads at a node. `fz` is the transverse (plate, w-DOF) load; when
/// absent, `fy` is reused for the w DOF in plate-only analyses.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NodeLoads {
    pub fx: f64,
    pub fy: f64,
    pub fz: Option<f64>,
    pub moment: f64,
}

impl NodeLoads {
    /// The load that drives the plate w-DOF: `fz` if present, else `fy`.
    pub fn transverse_for_plate(&self) -> f64 {
        self.fz.unwrap_or(self.fy)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub constraints: Constraints,
    pub loads: NodeLoads,
}

impl Node {
    pub fn new(id: u64, x: f64, y: f64) -> Self {
        Self { id, x, y, constraints: Constraints::free(), loads: NodeLoads::default() }
    }

    pub fn distance_to(&self, other: &Node) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spring_disables_elimination() {
        let mut c = Constraints::pinned();
        assert!(c.is_eliminated(0));
        c.spring_x = Some(1e6);
        assert!(!c.is_eliminated(0));
    }

    #[test]
    fn distance_is_euclidean() {
        let n1 = Node::new(1, 0.0, 0.0);
        let n2 = Node::new(2, 3.0, 4.0);
        assert!((n1.distance_to(&n2) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn plate_load_falls_back_to_fy() {
        let loads = NodeLoads { fx: 0.0, fy: -1000.0, fz: None, moment: 0.0 };
        assert_eq!(loads.transverse_for_plate(), -1000.0);
    }
}

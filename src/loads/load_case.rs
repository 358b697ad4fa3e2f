//! Load cases: a named group of nodal, distributed, and thermal loads that
//! can be applied to a model or superposed into a combination.

use serde::{Deserialize, Serialize};

use crate::model::{DistributedLoad, ThermalLoad};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadCaseType {
    Dead,
    Live,
    Wind,
    Snow,
    Thermal,
    User,
}

/// A nodal point load entry within a case, targeting `node_id`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CaseNodeLoad {
    pub node_id: u64,
    pub fx: f64,
    pub fy: f64,
    pub fz: Option<f64>,
    pub moment: f64,
}

/// A distributed load entry within a case, targeting `beam_id`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CaseDistributedLoad {
    pub beam_id: u64,
    pub load: DistributedLoad,
}

/// A thermal load entry within a case, targeting `beam_id`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CaseThermalLoad {
    pub beam_id: u64,
    pub load: ThermalLoad,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadCase {
    pub id: u64,
    pub name: String,
    pub case_type: LoadCaseType,
    pub color: String,
    pub point_loads: Vec<CaseNodeLoad>,
    pub distributed_loads: Vec<CaseDistributedLoad>,
    pub thermal_loads: Vec<CaseThermalLoad>,
}

impl LoadCase {
    pub fn new(id: u64, name: impl Into<String>, case_type: LoadCaseType) -> Self {
        Self {
            id,
            name: name.into(),
            case_type,
            color: "#808080".to_string(),
            point_loads: Vec::new(),
            distributed_loads: Vec::new(),
            thermal_loads: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_case_starts_empty() {
        let case = LoadCase::new(1, "Dead", LoadCaseType::Dead);
        assert!(case.point_loads.is_empty());
        assert!(case.distributed_loads.is_empty());
        assert!(case.thermal_loads.is_empty());
    }
}

//! 2D frame (beam) element: geometry, distributed/point/thermal loads, and
//! end releases.

use serde::{Deserialize, Serialize};

use super::section::BeamSection;

/// Axes the distributed load components are given in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordSystem {
    Local,
    Global,
}

/// A uniform or trapezoidal distributed load over `[start_t, end_t] * L`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DistributedLoad {
    pub qx_start: f64,
    pub qy_start: f64,
    pub qx_end: Option<f64>,
    pub qy_end: Option<f64>,
    pub start_t: f64,
    pub end_t: f64,
    pub coord_system: CoordSystem,
}

impl DistributedLoad {
    pub fn uniform(qx: f64, qy: f64) -> Self {
        Self {
            qx_start: qx,
            qy_start: qy,
            qx_end: None,
            qy_end: None,
            start_t: 0.0,
            end_t: 1.0,
            coord_system: CoordSystem::Local,
        }
    }

    pub fn qx_end(&self) -> f64 {
        self.qx_end.unwrap_or(self.qx_start)
    }

    pub fn qy_end(&self) -> f64 {
        self.qy_end.unwrap_or(self.qy_start)
    }

    /// Full span and not trapezoidal.
    pub fn is_full_span_uniform(&self) -> bool {
        self.start_t == 0.0 && self.end_t == 1.0 && self.qx_end() == self.qx_start && self.qy_end() == self.qy_start
    }
}

/// A point load at local position `t ∈ [0, 1]` along the member.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BeamPointLoad {
    pub t: f64,
    pub fx: f64,
    pub fy: f64,
}

/// Thermal action: a uniform rise, a top/bottom gradient, or both.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ThermalLoad {
    pub delta_t_uniform: Option<f64>,
    pub delta_t_top: Option<f64>,
    pub delta_t_bottom: Option<f64>,
}

/// End releases at each node: `[axial, shear, moment]` local DOFs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EndReleases {
    pub start_moment: bool,
    pub end_moment: bool,
    pub start_axial: bool,
    pub end_axial: bool,
    pub start_shear: bool,
    pub end_shear: bool,
}

impl EndReleases {
    pub fn pin_start() -> Self {
        Self { start_moment: true, ..Default::default() }
    }

    pub fn pin_end() -> Self {
        Self { end_moment: true, ..Default::default() }
    }

    pub fn pin_both() -> Self {
        Self { start_moment: true, end_moment: true, ..Default::default() }
    }

    /// Local DOF order `[u1, v1, θ1, u2, v2, θ2]`.
    pub fn as_array(&self) -> [bool; 6] {
        [
            self.start_axial,
            self.start_shear,
            self.start_moment,
            self.end_axial,
            self.end_shear,
            self.end_moment,
        ]
    }

    pub fn any(&self) -> bool {
        self.as_array().iter().any(|&r| r)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeamElement {
    pub id: u64,
    pub node_ids: [u64; 2],
    pub material_id: u64,
    pub section: BeamSection,
    pub profile_name: Option<String>,
    pub distributed_load: Option<DistributedLoad>,
    pub point_loads: Vec<BeamPointLoad>,
    pub end_releases: Option<EndReleases>,
    pub thermal_load: Option<ThermalLoad>,
}

impl BeamElement {
    pub fn new(id: u64, node_ids: [u64; 2], material_id: u64, section: BeamSection) -> Self {
        Self {
            id,
            node_ids,
            material_id,
            section,
            profile_name: None,
            distributed_load: None,
            point_loads: Vec::new(),
            end_releases: None,
            thermal_load: None,
        }
    }

    pub fn with_distributed_load(mut self, load: DistributedLoad) -> Self {
        self.distributed_load = Some(load);
        self
    }

    pub fn with_end_releases(mut self, releases: EndReleases) -> Self {
        self.end_releases = Some(releases);
        self
    }

    /// Validate the invariants from the data model: distinct endpoints,
    /// nonzero length (given node coordinates), and the release array having
    /// no contradictory entries.
    pub fn validate(&self, length: f64) -> Result<(), String> {
        if self.node_ids[0] == self.node_ids[1] {
            return Err("beam endpoints must be distinct nodes".to_string());
        }
        if length <= 1e-10 {
            return Err(format!("beam {} has zero length", self.id));
        }
        if let Some(dl) = &self.distributed_load {
            if !(dl.end_t > dl.start_t) {
                return Err("distributed load end_t must exceed start_t".to_string());
            }
            if dl.start_t < 0.0 || dl.end_t > 1.0 {
                return Err("distributed load start_t/end_t must lie in [0, 1]".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_length() {
        let b = BeamElement::new(1, [1, 1], 1, BeamSection::default());
        assert!(b.validate(0.0).is_err());
    }

    #[test]
    fn end_release_array_matches_local_dof_order() {
        let r = EndReleases::pin_start();
        assert_eq!(r.as_array(), [false, false, true, false, false, false]);
    }

    #[test]
    fn uniform_distributed_load_is_full_span() {
        let d = DistributedLoad::uniform(0.0, -1000.0);
        assert!(d.is_full_span_uniform());
    }
}

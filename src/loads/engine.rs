//! Applies a load case (or a factored combination of load cases) onto a
//! model snapshot ahead of assembly. Pure mutation: no analysis happens here.

use std::collections::BTreeMap;

use crate::error::{FEAError, FEAResult};
use crate::model::{DistributedLoad, Model, NodeLoads, ThermalLoad};

use super::load_case::LoadCase;
use super::load_combo::LoadCombination;

/// Overwrites `node.loads`, `beam.distributed_load`, and `beam.thermal_load`
/// from the entries in `case`.
pub fn apply_load_case_to_mesh(model: &mut Model, case: &LoadCase) -> FEAResult<()> {
    for entry in &case.point_loads {
        let node = model.nodes.get_mut(&entry.node_id).ok_or(FEAError::NodeNotFound(entry.node_id))?;
        node.loads = NodeLoads { fx: entry.fx, fy: entry.fy, fz: entry.fz, moment: entry.moment };
    }
    for entry in &case.distributed_loads {
        let beam = model.beams.get_mut(&entry.beam_id).ok_or(FEAError::BeamNotFound(entry.beam_id))?;
        beam.distributed_load = Some(entry.load);
    }
    for entry in &case.thermal_loads {
        let beam = model.beams.get_mut(&entry.beam_id).ok_or(FEAError::BeamNotFound(entry.beam_id))?;
        beam.thermal_load = Some(entry.load);
    }
    Ok(())
}

/// Applies the factored sum of every load case listed in `combo`'s factor
/// map. Per-node and per-beam contributions are superposed (scalar sum of
/// factor * value) before writing, so a node or beam touched by several
/// member cases sees the combined total rather than the last case's write.
pub fn apply_combination_to_mesh(
    model: &mut Model,
    combo: &LoadCombination,
    cases: &BTreeMap<u64, LoadCase>,
) -> FEAResult<()> {
    let mut node_totals: BTreeMap<u64, NodeLoads> = BTreeMap::new();
    let mut dist_totals: BTreeMap<u64, DistributedLoad> = BTreeMap::new();
    let mut thermal_totals: BTreeMap<u64, ThermalLoad> = BTreeMap::new();

    for (&case_id, &factor) in &combo.factors {
        if factor.abs() < 1e-10 {
            continue;
        }
        let case = cases.get(&case_id).ok_or(FEAError::LoadCaseNotFound(case_id))?;

        for entry in &case.point_loads {
            let acc = node_totals.entry(entry.node_id).or_insert(NodeLoads::default());
            acc.fx += factor * entry.fx;
            acc.fy += factor * entry.fy;
            acc.moment += factor * entry.moment;
            if let Some(fz) = entry.fz {
                acc.fz = Some(acc.fz.unwrap_or(0.0) + factor * fz);
            }
        }
        for entry in &case.distributed_loads {
            let acc = dist_totals.entry(entry.beam_id).or_insert_with(|| DistributedLoad::uniform(0.0, 0.0));
            acc.qx_start += factor * entry.load.qx_start;
            acc.qy_start += factor * entry.load.qy_start;
            acc.qx_end = Some(acc.qx_end() + factor * entry.load.qx_end());
            acc.qy_end = Some(acc.qy_end() + factor * entry.load.qy_end());
            acc.start_t = entry.load.start_t;
            acc.end_t = entry.load.end_t;
            acc.coord_system = entry.load.coord_system;
        }
        for entry in &case.thermal_loads {
            let acc = thermal_totals.entry(entry.beam_id).or_insert_with(ThermalLoad::default);
            acc.delta_t_uniform =
                Some(acc.delta_t_uniform.unwrap_or(0.0) + factor * entry.load.delta_t_uniform.unwrap_or(0.0));
            acc.delta_t_top =
                Some(acc.delta_t_top.unwrap_or(0.0) + factor * entry.load.delta_t_top.unwrap_or(0.0));
            acc.delta_t_bottom =
                Some(acc.delta_t_bottom.unwrap_or(0.0) + factor * entry.load.delta_t_bottom.unwrap_or(0.0));
        }
    }

    for (node_id, loads) in node_totals {
        let node = model.nodes.get_mut(&node_id).ok_or(FEAError::NodeNotFound(node_id))?;
        node.loads = loads;
    }
    for (beam_id, load) in dist_totals {
        let beam = model.beams.get_mut(&beam_id).ok_or(FEAError::BeamNotFound(beam_id))?;
        beam.distributed_load = Some(load);
    }
    for (beam_id, load) in thermal_totals {
        let beam = model.beams.get_mut(&beam_id).ok_or(FEAError::BeamNotFound(beam_id))?;
        beam.thermal_load = Some(load);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loads::load_case::{CaseNodeLoad, LoadCaseType};
    use crate::loads::load_combo::CombinationType;
    use crate::model::BeamSection;

    fn two_node_model() -> (Model, u64, u64) {
        let mut model = Model::new();
        let n1 = model.add_node(0.0, 0.0);
        let n2 = model.add_node(4.0, 0.0);
        model
            .add_beam(crate::model::BeamElement::new(0, [n1, n2], 1, BeamSection::default()))
            .unwrap();
        (model, n1, n2)
    }

    #[test]
    fn applying_a_case_overwrites_node_loads() {
        let (mut model, _n1, n2) = two_node_model();
        let mut case = LoadCase::new(1, "Live", LoadCaseType::Live);
        case.point_loads.push(CaseNodeLoad { node_id: n2, fx: 0.0, fy: -2000.0, fz: None, moment: 0.0 });
        apply_load_case_to_mesh(&mut model, &case).unwrap();
        assert_eq!(model.get_node(n2).unwrap().loads.fy, -2000.0);
    }

    #[test]
    fn combination_superposes_factored_node_loads() {
        let (mut model, _n1, n2) = two_node_model();
        let mut dead = LoadCase::new(1, "Dead", LoadCaseType::Dead);
        dead.point_loads.push(CaseNodeLoad { node_id: n2, fx: 0.0, fy: -1000.0, fz: None, moment: 0.0 });
        let mut live = LoadCase::new(2, "Live", LoadCaseType::Live);
        live.point_loads.push(CaseNodeLoad { node_id: n2, fx: 0.0, fy: -1000.0, fz: None, moment: 0.0 });
        let mut cases = BTreeMap::new();
        cases.insert(1, dead);
        cases.insert(2, live);
        let combo =
            LoadCombination::new(1, "1.35D + 1.5L", CombinationType::Uls).with_factor(1, 1.35).with_factor(2, 1.5);
        apply_combination_to_mesh(&mut model, &combo, &cases).unwrap();
        assert!((model.get_node(n2).unwrap().loads.fy - (-1.35 * 1000.0 - 1.5 * 1000.0)).abs() < 1e-9);
    }
}

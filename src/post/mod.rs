//! Post-processor: per-beam internal-force stations, per-continuum stress
//! recovery, DKT centroidal moments, global stress ranges, and the
//! combination envelope reduction.

use std::collections::BTreeMap;

use crate::assembler::{AnalysisKind, DofMap};
use crate::math::beam as beam_math;
use crate::math::dkt as dkt_math;
use crate::math::plane::{self, constitutive_matrix};
use crate::model::{CoordSystem, Model};
use crate::solver::SolverResult;

/// Internal-force stations and their signed maxima for one beam. Maxima are
/// `max(|·|, 1e-10)` so downstream unity checks never divide by
/// an exact zero.
#[derive(Debug, Clone)]
pub struct BeamForces {
    pub stations: [beam_math::Station; 21],
    pub max_n: f64,
    pub max_v: f64,
    pub max_m: f64,
}

/// Stress recovery for one CST/Q4 continuum element.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ContinuumStress {
    pub sx: f64,
    pub sy: f64,
    pub txy: f64,
    pub von_mises: f64,
    pub principal_1: f64,
    pub principal_2: f64,
    pub principal_angle: f64,
}

impl ContinuumStress {
    fn from_components(sx: f64, sy: f64, txy: f64) -> Self {
        let (principal_1, principal_2, principal_angle) = plane::principal_stresses(sx, sy, txy);
        Self { sx, sy, txy, von_mises: plane::von_mises(sx, sy, txy), principal_1, principal_2, principal_angle }
    }
}

/// Centroidal bending/twisting moments for one DKT element.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct DktMoments {
    pub mx: f64,
    pub my: f64,
    pub mxy: f64,
}

/// Inclusive `[min, max]` span of one scalar result component across every
/// element of its kind, used by the UI to colour-scale contour plots.
#[derive(Debug, Clone, Copy)]
pub struct StressRange {
    pub min: f64,
    pub max: f64,
}

impl StressRange {
    fn from_values(values: impl Iterator<Item = f64>) -> Option<Self> {
        values.fold(None, |acc, v| match acc {
            None => Some(StressRange { min: v, max: v }),
            Some(r) => Some(StressRange { min: r.min.min(v), max: r.max.max(v) }),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct StressRanges {
    pub von_mises: Option<StressRange>,
    pub principal_1: Option<StressRange>,
    pub principal_2: Option<StressRange>,
}

/// Everything derived from a single [`SolverResult`]: per-beam internal
/// forces, per-continuum stresses, per-DKT moments, and global ranges.
#[derive(Debug, Clone, Default)]
pub struct PostResult {
    pub beam_forces: BTreeMap<u64, BeamForces>,
    pub continuum_stresses: BTreeMap<u64, ContinuumStress>,
    pub dkt_moments: BTreeMap<u64, DktMoments>,
    pub stress_ranges: StressRanges,
}

/// Runs every post-processing pass appropriate for `kind` against a solved
/// result.
pub fn process(model: &Model, kind: AnalysisKind, result: &SolverResult) -> PostResult {
    let mut post = PostResult::default();

    if matches!(kind, AnalysisKind::Frame | AnalysisKind::Mixed) {
        process_beams(model, &result.dof_map, &result.displacements, &mut post);
    }
    if matches!(kind, AnalysisKind::Continuum | AnalysisKind::Mixed) {
        process_continuum(model, &result.dof_map, &result.displacements, &mut post);
    }
    if matches!(kind, AnalysisKind::PlateBending) {
        process_dkt(model, &result.dof_map, &result.displacements, &mut post);
    }

    post.stress_ranges.von_mises =
        StressRange::from_values(post.continuum_stresses.values().map(|s| s.von_mises));
    post.stress_ranges.principal_1 =
        StressRange::from_values(post.continuum_stresses.values().map(|s| s.principal_1));
    post.stress_ranges.principal_2 =
        StressRange::from_values(post.continuum_stresses.values().map(|s| s.principal_2));

    post
}

fn node_uv(dof_map: &DofMap, u: &nalgebra::DVector<f64>, node_id: u64) -> Option<(f64, f64)> {
    let base = dof_map.base(node_id)?;
    Some((u[base], u[base + 1]))
}

fn beam_local_displacements(
    dof_map: &DofMap,
    u: &nalgebra::DVector<f64>,
    node_ids: [u64; 2],
    alpha: f64,
) -> Option<beam_math::Vec6> {
    let base1 = dof_map.base(node_ids[0])?;
    let base2 = dof_map.base(node_ids[1])?;
    let global = beam_math::Vec6::new(u[base1], u[base1 + 1], u[base1 + 2], u[base2], u[base2 + 1], u[base2 + 2]);
    let t = beam_math::transformation_matrix(alpha);
    Some(t * global)
}

fn process_beams(model: &Model, dof_map: &DofMap, u: &nalgebra::DVector<f64>, post: &mut PostResult) {
    for beam in model.beams.values() {
        let Ok(n1) = model.get_node(beam.node_ids[0]) else { continue };
        let Ok(n2) = model.get_node(beam.node_ids[1]) else { continue };
        let length = n1.distance_to(n2);
        if length <= 1e-10 {
            continue;
        }
        let Some(material) = model.materials.get(&beam.material_id) else { continue };
        let alpha = (n2.y - n1.y).atan2(n2.x - n1.x);
        let Some(u_local) = beam_local_displacements(dof_map, u, beam.node_ids, alpha) else { continue };

        let k_local = beam_math::local_stiffness(material.e, beam.section.a, beam.section.i, length);
        let fer_local = crate::assembler::beam_equivalent_loads(beam, material, length, alpha);
        let f_local = k_local * u_local - fer_local;

        let n1_force = -f_local[0];
        let v1_force = -f_local[1];
        let m1_force = -f_local[2];

        let (axial, transverse) = distributed_spans(beam, length, alpha);
        let points: Vec<beam_math::PointLoad> = beam
            .point_loads
            .iter()
            .map(|p| beam_math::PointLoad { x: p.t.clamp(0.0, 1.0) * length, px: p.fx, py: p.fy })
            .collect();

        let stations = beam_math::stations(length, n1_force, v1_force, m1_force, axial, transverse, &points);
        let max_n = stations.iter().map(|s| s.n.abs()).fold(0.0_f64, f64::max).max(1e-10);
        let max_v = stations.iter().map(|s| s.v.abs()).fold(0.0_f64, f64::max).max(1e-10);
        let max_m = stations.iter().map(|s| s.m.abs()).fold(0.0_f64, f64::max).max(1e-10);

        post.beam_forces.insert(beam.id, BeamForces { stations, max_n, max_v, max_m });
    }
}

fn distributed_spans(
    beam: &crate::model::BeamElement,
    length: f64,
    alpha: f64,
) -> (beam_math::DistributedSpan, beam_math::DistributedSpan) {
    let Some(dl) = &beam.distributed_load else {
        return (beam_math::DistributedSpan::default(), beam_math::DistributedSpan::default());
    };
    let (qx_start, qx_end, qy_start, qy_end) = match dl.coord_system {
        CoordSystem::Local => (dl.qx_start, dl.qx_end(), dl.qy_start, dl.qy_end()),
        CoordSystem::Global => {
            let (qx_s, qy_s) = beam_math::project_to_local(alpha, dl.qx_start, dl.qy_start);
            let (qx_e, qy_e) = beam_math::project_to_local(alpha, dl.qx_end(), dl.qy_end());
            (qx_s, qx_e, qy_s, qy_e)
        }
    };
    let a = dl.start_t * length;
    let b = dl.end_t * length;
    (
        beam_math::DistributedSpan { qx_start, qx_end, qy_start: 0.0, qy_end: 0.0, a, b },
        beam_math::DistributedSpan { qx_start: 0.0, qx_end: 0.0, qy_start, qy_end, a, b },
    )
}

fn process_continuum(model: &Model, dof_map: &DofMap, u: &nalgebra::DVector<f64>, post: &mut PostResult) {
    for tri in model.triangles.values() {
        let Some(material) = model.materials.get(&tri.material_id) else { continue };
        let (mut x, mut y) = ([0.0; 3], [0.0; 3]);
        let mut ok = true;
        let mut u_local = plane::Vec6::zeros();
        for (i, &id) in tri.node_ids.iter().enumerate() {
            let Ok(n) = model.get_node(id) else {
                ok = false;
                break;
            };
            x[i] = n.x;
            y[i] = n.y;
            let Some((uu, vv)) = node_uv(dof_map, u, id) else {
                ok = false;
                break;
            };
            u_local[2 * i] = uu;
            u_local[2 * i + 1] = vv;
        }
        if !ok {
            continue;
        }
        let d = constitutive_matrix(material.e, material.nu, tri.condition);
        let sigma = plane::cst_stress(&x, &y, &d, &u_local);
        post.continuum_stresses
            .insert(tri.id, ContinuumStress::from_components(sigma[0], sigma[1], sigma[2]));
    }

    for quad in model.quads.values() {
        let Some(material) = model.materials.get(&quad.material_id) else { continue };
        let (mut x, mut y) = ([0.0; 4], [0.0; 4]);
        let mut ok = true;
        let mut u_local = plane::Vec8::zeros();
        for (i, &id) in quad.node_ids.iter().enumerate() {
            let Ok(n) = model.get_node(id) else {
                ok = false;
                break;
            };
            x[i] = n.x;
            y[i] = n.y;
            let Some((uu, vv)) = node_uv(dof_map, u, id) else {
                ok = false;
                break;
            };
            u_local[2 * i] = uu;
            u_local[2 * i + 1] = vv;
        }
        if !ok {
            continue;
        }
        let d = constitutive_matrix(material.e, material.nu, quad.condition);
        let sigma = plane::q4_stress(&x, &y, &d, &u_local);
        post.continuum_stresses
            .insert(quad.id, ContinuumStress::from_components(sigma[0], sigma[1], sigma[2]));
    }
}

fn process_dkt(model: &Model, dof_map: &DofMap, u: &nalgebra::DVector<f64>, post: &mut PostResult) {
    for plate in model.dkt_elements.values() {
        let Some(material) = model.materials.get(&plate.material_id) else { continue };
        let (mut x, mut y) = ([0.0; 3], [0.0; 3]);
        let mut ok = true;
        let mut u_local = dkt_math::Vec9::zeros();
        for (i, &id) in plate.node_ids.iter().enumerate() {
            let Ok(n) = model.get_node(id) else {
                ok = false;
                break;
            };
            x[i] = n.x;
            y[i] = n.y;
            let Some(base) = dof_map.base(id) else {
                ok = false;
                break;
            };
            u_local[3 * i] = u[base];
            u_local[3 * i + 1] = u[base + 1];
            u_local[3 * i + 2] = u[base + 2];
        }
        if !ok {
            continue;
        }
        let db = dkt_math::bending_constitutive_matrix(material.e, material.nu, plate.thickness);
        let m = dkt_math::centroidal_moments(&x, &y, &db, &u_local);
        post.dkt_moments.insert(plate.id, DktMoments { mx: m[0], my: m[1], mxy: m[2] });
    }
}

/// Componentwise envelope across several combination results sharing the
/// same DOF mapping: `min`/`max` per displacement DOF, and per-beam
/// `{minN, maxN, minV, maxV, minM, maxM}` across stations. A beam absent
/// from one result contributes 0 at that result, not `±∞`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BeamEnvelope {
    pub min_n: f64,
    pub max_n: f64,
    pub min_v: f64,
    pub max_v: f64,
    pub min_m: f64,
    pub max_m: f64,
}

#[derive(Debug, Clone)]
pub struct Envelope {
    pub min_displacements: nalgebra::DVector<f64>,
    pub max_displacements: nalgebra::DVector<f64>,
    pub beams: BTreeMap<u64, BeamEnvelope>,
}

pub fn envelope(results: &[SolverResult], posts: &[PostResult]) -> Option<Envelope> {
    let first = results.first()?;
    let n = first.displacements.len();

    let mut min_displacements = first.displacements.clone();
    let mut max_displacements = first.displacements.clone();
    for result in &results[1..] {
        for i in 0..n {
            min_displacements[i] = min_displacements[i].min(result.displacements[i]);
            max_displacements[i] = max_displacements[i].max(result.displacements[i]);
        }
    }

    let mut beam_ids: std::collections::BTreeSet<u64> = std::collections::BTreeSet::new();
    for post in posts {
        beam_ids.extend(post.beam_forces.keys().copied());
    }

    let mut beams = BTreeMap::new();
    for id in beam_ids {
        let mut env = BeamEnvelope { min_n: 0.0, max_n: 0.0, min_v: 0.0, max_v: 0.0, min_m: 0.0, max_m: 0.0 };
        for post in posts {
            let (n_vals, v_vals, m_vals): (std::vec::Vec<f64>, std::vec::Vec<f64>, std::vec::Vec<f64>) =
                match post.beam_forces.get(&id) {
                    Some(bf) => (
                        bf.stations.iter().map(|s| s.n).collect(),
                        bf.stations.iter().map(|s| s.v).collect(),
                        bf.stations.iter().map(|s| s.m).collect(),
                    ),
                    None => (vec![0.0], vec![0.0], vec![0.0]),
                };
            for &v in &n_vals {
                env.min_n = env.min_n.min(v);
                env.max_n = env.max_n.max(v);
            }
            for &v in &v_vals {
                env.min_v = env.min_v.min(v);
                env.max_v = env.max_v.max(v);
            }
            for &v in &m_vals {
                env.min_m = env.min_m.min(v);
                env.max_m = env.max_m.max(v);
            }
        }
        beams.insert(id, env);
    }

    Some(Envelope { min_displacements, max_displacements, beams })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::AnalysisKind;
    use crate::model::{BeamElement, BeamSection, Constraints};
    use crate::solver::{solve, CancellationToken, SolveOptions};
    use approx::assert_relative_eq;

    fn cantilever() -> Model {
        let mut model = Model::new();
        let n1 = model.add_node(0.0, 0.0);
        let n2 = model.add_node(2.0, 0.0);
        model.nodes.get_mut(&n1).unwrap().constraints = Constraints::fixed();
        model.nodes.get_mut(&n2).unwrap().loads.fy = -10000.0;
        let section = BeamSection::new(5.38e-3, 8.36e-5, 0.3);
        model.add_beam(BeamElement::new(0, [n1, n2], 1, section)).unwrap();
        model
    }

    #[test]
    fn cantilever_max_shear_equals_tip_load() {
        let model = cantilever();
        let cancel = CancellationToken::new();
        let result = solve(&model, AnalysisKind::Frame, &SolveOptions::default(), &cancel).unwrap();
        let post = process(&model, AnalysisKind::Frame, &result);
        let forces = &post.beam_forces[&1];
        assert_relative_eq!(forces.max_v, 10000.0, epsilon = 1.0);
    }

    #[test]
    fn cantilever_max_moment_equals_reaction_moment() {
        let model = cantilever();
        let cancel = CancellationToken::new();
        let result = solve(&model, AnalysisKind::Frame, &SolveOptions::default(), &cancel).unwrap();
        let post = process(&model, AnalysisKind::Frame, &result);
        let forces = &post.beam_forces[&1];
        assert_relative_eq!(forces.max_m, 20000.0, epsilon = 1.0);
    }

    #[test]
    fn envelope_zero_fills_beams_absent_from_some_combinations() {
        let model = cantilever();
        let cancel = CancellationToken::new();
        let result = solve(&model, AnalysisKind::Frame, &SolveOptions::default(), &cancel).unwrap();
        let post = process(&model, AnalysisKind::Frame, &result);
        // Second "combination" has no beam forces recorded at all; the
        // envelope must still include 0 in the beam's range rather than
        // dropping it or treating it as unbounded.
        let env = envelope(&[result.clone(), result.clone()], &[post.clone(), PostResult::default()]).unwrap();
        let forces = &env.beams[&1];
        assert!(forces.min_v <= 0.0);
        assert!(forces.max_v >= 0.0);
    }
}

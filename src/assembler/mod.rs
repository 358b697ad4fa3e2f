//! Assembler: active-DOF mapping, global stiffness/force assembly, and the
//! constrained-DOF list handed to the solver.
//!
//! Generalizes a single fixed-DOF-per-node frame assembly into four distinct
//! 2D analysis kinds, each with its own DOFs-per-node count.

use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector};

use crate::error::Warning;
use crate::math::plane::{cst_expand_to_9, q4_expand_to_12, constitutive_matrix};
use crate::math::{beam as beam_math, dkt as dkt_math};
use crate::model::{BeamElement, CoordSystem, Model};

/// Which slice of the model is being analyzed, and with how many DOFs per
/// active node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Beam elements only. DOFs `(u, v, θ)`.
    Frame,
    /// Plane-stress/strain continuum elements (CST/Q4) only. DOFs `(u, v)`.
    Continuum,
    /// DKT plate-bending triangles only. DOFs `(w, θx, θy)`.
    PlateBending,
    /// Beams plus membrane continuum elements sharing frame-compatible DOFs
    /// `(u, v, θ)`; continuum stiffness is expanded with a zero-stiffness θ
    /// row/col. Pure-membrane nodes are stabilised in θ.
    Mixed,
}

impl AnalysisKind {
    pub fn dofs_per_node(self) -> usize {
        match self {
            AnalysisKind::Frame => 3,
            AnalysisKind::Continuum => 2,
            AnalysisKind::PlateBending => 3,
            AnalysisKind::Mixed => 3,
        }
    }
}

/// Insertion-ordered (by ascending node id, since `Model` stores nodes in a
/// `BTreeMap`) map from node id to its base DOF index, restricted to nodes
/// actually referenced by an element of the analysis kind in question.
/// Keeping disconnected nodes out of the map is what prevents null-stiffness
/// DOFs from making K singular.
#[derive(Debug, Clone, Default)]
pub struct DofMap {
    pub kind_dofs: usize,
    index: BTreeMap<u64, usize>,
}

impl DofMap {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn total_dofs(&self) -> usize {
        self.index.len() * self.kind_dofs
    }

    pub fn base(&self, node_id: u64) -> Option<usize> {
        self.index.get(&node_id).map(|&i| i * self.kind_dofs)
    }

    pub fn contains(&self, node_id: u64) -> bool {
        self.index.contains_key(&node_id)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.index.keys().copied()
    }
}

/// Builds the active-node DOF map for `kind`: every node referenced by at
/// least one element of that kind gets a DOF block, in ascending id order.
pub fn build_dof_map(model: &Model, kind: AnalysisKind) -> DofMap {
    let mut active: std::collections::BTreeSet<u64> = std::collections::BTreeSet::new();
    match kind {
        AnalysisKind::Frame => {
            for b in model.beams.values() {
                active.extend(b.node_ids);
            }
        }
        AnalysisKind::Continuum => {
            for t in model.triangles.values() {
                active.extend(t.node_ids);
            }
            for q in model.quads.values() {
                active.extend(q.node_ids);
            }
        }
        AnalysisKind::PlateBending => {
            for p in model.dkt_elements.values() {
                active.extend(p.node_ids);
            }
        }
        AnalysisKind::Mixed => {
            for b in model.beams.values() {
                active.extend(b.node_ids);
            }
            for t in model.triangles.values() {
                active.extend(t.node_ids);
            }
            for q in model.quads.values() {
                active.extend(q.node_ids);
            }
        }
    }
    let mut index = BTreeMap::new();
    for (i, id) in active.into_iter().enumerate() {
        index.insert(id, i);
    }
    DofMap { kind_dofs: kind.dofs_per_node(), index }
}

/// The assembled global system, ready for the solver to reduce and solve.
pub struct Assembly {
    pub k: DMatrix<f64>,
    pub f: DVector<f64>,
    pub dof_map: DofMap,
    /// DOF indices eliminated by a rigid constraint with no spring on the
    /// same DOF.
    pub constrained: Vec<usize>,
    pub warnings: Vec<Warning>,
}

/// Stabilisation coefficient applied to θ DOFs of membrane-only nodes in a
/// `Mixed` analysis: `1e-6 * max|K_diag|`. Not load-bearing in
/// magnitude, only in being small relative to the largest diagonal entry.
const PLATE_STABILISATION_FACTOR: f64 = 1e-6;

/// Assembles `K` and `F` for `kind`. Degenerate elements (zero length/area,
/// missing material) are skipped with a [`Warning`]; assembly of the rest of
/// the structure continues.
pub fn assemble(model: &Model, kind: AnalysisKind) -> Assembly {
    let dof_map = build_dof_map(model, kind);
    let n = dof_map.total_dofs();
    let mut k = DMatrix::zeros(n, n);
    let mut f = DVector::zeros(n);
    let mut warnings = Vec::new();

    match kind {
        AnalysisKind::Frame => {
            assemble_beams(model, &dof_map, &mut k, &mut f, &mut warnings);
        }
        AnalysisKind::Continuum => {
            assemble_continuum(model, &dof_map, &mut k, &mut warnings, false);
        }
        AnalysisKind::PlateBending => {
            assemble_dkt(model, &dof_map, &mut k, &mut warnings);
        }
        AnalysisKind::Mixed => {
            assemble_beams(model, &dof_map, &mut k, &mut f, &mut warnings);
            assemble_continuum(model, &dof_map, &mut k, &mut warnings, true);
            stabilise_membrane_only_rotations(model, &dof_map, &mut k);
        }
    }

    assemble_nodal_loads(model, kind, &dof_map, &mut f);
    let constrained = constrained_dofs(model, kind, &dof_map, &mut k);

    Assembly { k, f, dof_map, constrained, warnings }
}

fn scatter_add(k: &mut DMatrix<f64>, dofs: &[usize], local: &DMatrix<f64>) {
    for (i, &di) in dofs.iter().enumerate() {
        for (j, &dj) in dofs.iter().enumerate() {
            k[(di, dj)] += local[(i, j)];
        }
    }
}

fn beam_dofs(dof_map: &DofMap, beam: &BeamElement) -> Option<[usize; 6]> {
    let b1 = dof_map.base(beam.node_ids[0])?;
    let b2 = dof_map.base(beam.node_ids[1])?;
    Some([b1, b1 + 1, b1 + 2, b2, b2 + 1, b2 + 2])
}

fn assemble_beams(
    model: &Model,
    dof_map: &DofMap,
    k: &mut DMatrix<f64>,
    f: &mut DVector<f64>,
    warnings: &mut Vec<Warning>,
) {
    for beam in model.beams.values() {
        let Ok(n1) = model.get_node(beam.node_ids[0]) else { continue };
        let Ok(n2) = model.get_node(beam.node_ids[1]) else { continue };
        let length = n1.distance_to(n2);
        if length <= 1e-10 {
            warnings.push(Warning::ZeroLengthBeam(beam.id));
            continue;
        }
        let Some(material) = model.materials.get(&beam.material_id) else {
            warnings.push(Warning::MissingMaterial(beam.id));
            continue;
        };
        let Some(dofs) = beam_dofs(dof_map, beam) else { continue };

        let alpha = (n2.y - n1.y).atan2(n2.x - n1.x);
        let k_local = beam_math::local_stiffness(material.e, beam.section.a, beam.section.i, length);
        let released = beam.end_releases.unwrap_or_default().as_array();
        let k_condensed = beam_math::apply_releases(&k_local, &released);
        let t = beam_math::transformation_matrix(alpha);
        let k_global = t.transpose() * k_condensed * t;

        let k_global_dyn = DMatrix::from_fn(6, 6, |i, j| k_global[(i, j)]);
        scatter_add(k, &dofs, &k_global_dyn);

        let fer_local = beam_equivalent_loads(beam, material, length, alpha);
        let fer_condensed = beam_math::apply_fer_releases(&fer_local, &k_local, &released);
        let fer_global = t.transpose() * fer_condensed;
        for (i, &di) in dofs.iter().enumerate() {
            f[di] += fer_global[i];
        }
    }
}

/// Sums every local-axis equivalent nodal load contribution for one beam:
/// distributed (uniform/trapezoidal/partial, projected from global axes if
/// needed), point loads, and thermal loads. Shared with the post-processor's
/// internal-force recovery, which needs the same uncondensed load vector.
pub(crate) fn beam_equivalent_loads(
    beam: &BeamElement,
    material: &crate::model::Material,
    length: f64,
    alpha: f64,
) -> beam_math::Vec6 {
    let mut fer = beam_math::Vec6::zeros();

    if let Some(dl) = &beam.distributed_load {
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
        let full_span = dl.start_t <= 1e-9 && dl.end_t >= 1.0 - 1e-9;
        let is_uniform = (qx_start - qx_end).abs() < 1e-12 && (qy_start - qy_end).abs() < 1e-12;

        fer += if full_span && is_uniform {
            beam_math::fer_uniform(qx_start, qy_start, length)
        } else if full_span {
            beam_math::fer_trapezoidal(qx_start, qx_end, qy_start, qy_end, length)
        } else if is_uniform {
            beam_math::fer_partial_uniform(qx_start, qy_start, a, b, length)
        } else {
            beam_math::fer_partial_trapezoidal(qx_start, qx_end, qy_start, qy_end, a, b, length)
        };
    }

    for p in &beam.point_loads {
        let x = p.t.clamp(0.0, 1.0) * length;
        fer += beam_math::fer_point_axial(p.fx, x, length);
        fer += beam_math::fer_point_transverse(p.fy, x, length);
    }

    if let Some(th) = &beam.thermal_load {
        let alpha_t = material.alpha.unwrap_or(0.0);
        if let Some(dt) = th.delta_t_uniform {
            fer += beam_math::fer_thermal_uniform(material.e, beam.section.a, alpha_t, dt);
        }
        if let (Some(top), Some(bot)) = (th.delta_t_top, th.delta_t_bottom) {
            fer += beam_math::fer_thermal_gradient(
                material.e,
                beam.section.a,
                beam.section.i,
                alpha_t,
                top,
                bot,
                beam.section.h,
            );
        }
    }

    fer
}

fn assemble_continuum(
    model: &Model,
    dof_map: &DofMap,
    k: &mut DMatrix<f64>,
    warnings: &mut Vec<Warning>,
    expand_for_mixed: bool,
) {
    for tri in model.triangles.values() {
        let Some((x, y)) = node_coords_3(model, &tri.node_ids) else { continue };
        let area2 = (x[1] - x[0]) * (y[2] - y[0]) - (x[2] - x[0]) * (y[1] - y[0]);
        if area2.abs() < 1e-12 {
            warnings.push(Warning::ZeroAreaElement(tri.id));
            continue;
        }
        let Some(material) = model.materials.get(&tri.material_id) else {
            warnings.push(Warning::MissingMaterial(tri.id));
            continue;
        };
        let d = constitutive_matrix(material.e, material.nu, tri.condition);
        let k6 = crate::math::plane::cst_stiffness(&x, &y, &d, tri.thickness);

        if expand_for_mixed {
            let Some(dofs) = node_dofs_n::<3>(dof_map, &tri.node_ids, 3) else { continue };
            let k9 = cst_expand_to_9(&k6);
            let k9_dyn = DMatrix::from_fn(9, 9, |i, j| k9[(i, j)]);
            scatter_add(k, &dofs, &k9_dyn);
        } else {
            let Some(dofs) = node_dofs_n::<3>(dof_map, &tri.node_ids, 2) else { continue };
            let k6_dyn = DMatrix::from_fn(6, 6, |i, j| k6[(i, j)]);
            scatter_add(k, &dofs, &k6_dyn);
        }
    }

    for quad in model.quads.values() {
        let Some((x, y)) = node_coords_4(model, &quad.node_ids) else { continue };
        if quad_area(&x, &y).abs() < 1e-12 {
            warnings.push(Warning::ZeroAreaElement(quad.id));
            continue;
        }
        let Some(material) = model.materials.get(&quad.material_id) else {
            warnings.push(Warning::MissingMaterial(quad.id));
            continue;
        };
        let d = constitutive_matrix(material.e, material.nu, quad.condition);
        let k8 = crate::math::plane::q4_stiffness(&x, &y, &d, quad.thickness);

        if expand_for_mixed {
            let Some(dofs) = node_dofs_n::<4>(dof_map, &quad.node_ids, 3) else { continue };
            let k12 = q4_expand_to_12(&k8);
            let k12_dyn = DMatrix::from_fn(12, 12, |i, j| k12[(i, j)]);
            scatter_add(k, &dofs, &k12_dyn);
        } else {
            let Some(dofs) = node_dofs_n::<4>(dof_map, &quad.node_ids, 2) else { continue };
            let k8_dyn = DMatrix::from_fn(8, 8, |i, j| k8[(i, j)]);
            scatter_add(k, &dofs, &k8_dyn);
        }
    }
}

fn assemble_dkt(model: &Model, dof_map: &DofMap, k: &mut DMatrix<f64>, warnings: &mut Vec<Warning>) {
    for plate in model.dkt_elements.values() {
        let Some((x, y)) = node_coords_3(model, &plate.node_ids) else { continue };
        let area2 = (x[1] - x[0]) * (y[2] - y[0]) - (x[2] - x[0]) * (y[1] - y[0]);
        if area2.abs() < 1e-12 {
            warnings.push(Warning::ZeroAreaElement(plate.id));
            continue;
        }
        let Some(material) = model.materials.get(&plate.material_id) else {
            warnings.push(Warning::MissingMaterial(plate.id));
            continue;
        };
        let Some(dofs) = node_dofs_n::<3>(dof_map, &plate.node_ids, 3) else { continue };
        let db = dkt_math::bending_constitutive_matrix(material.e, material.nu, plate.thickness);
        let k9 = dkt_math::stiffness(&x, &y, &db);
        let k9_dyn = DMatrix::from_fn(9, 9, |i, j| k9[(i, j)]);
        scatter_add(k, &dofs, &k9_dyn);
    }
}

fn node_coords_3(model: &Model, ids: &[u64; 3]) -> Option<([f64; 3], [f64; 3])> {
    let mut x = [0.0; 3];
    let mut y = [0.0; 3];
    for (i, &id) in ids.iter().enumerate() {
        let n = model.nodes.get(&id)?;
        x[i] = n.x;
        y[i] = n.y;
    }
    Some((x, y))
}

fn node_coords_4(model: &Model, ids: &[u64; 4]) -> Option<([f64; 4], [f64; 4])> {
    let mut x = [0.0; 4];
    let mut y = [0.0; 4];
    for (i, &id) in ids.iter().enumerate() {
        let n = model.nodes.get(&id)?;
        x[i] = n.x;
        y[i] = n.y;
    }
    Some((x, y))
}

fn quad_area(x: &[f64; 4], y: &[f64; 4]) -> f64 {
    0.5 * ((x[0] * y[1] - x[1] * y[0]) + (x[1] * y[2] - x[2] * y[1]) + (x[2] * y[3] - x[3] * y[2])
        + (x[3] * y[0] - x[0] * y[3]))
}

/// Global DOF indices for `N` element nodes, each contributing
/// `node_dofs_per_node` consecutive DOFs starting at its base index in
/// `dof_map` (which may use a different `dofs_per_node` than the element,
/// e.g. a 2-DOF continuum element assembled into a 3-DOF mixed analysis).
fn node_dofs_n<const N: usize>(
    dof_map: &DofMap,
    ids: &[u64; N],
    node_dofs_per_node: usize,
) -> Option<Vec<usize>> {
    let mut dofs = Vec::with_capacity(N * node_dofs_per_node);
    for &id in ids {
        let base = dof_map.base(id)?;
        for d in 0..node_dofs_per_node {
            dofs.push(base + d);
        }
    }
    Some(dofs)
}

/// Adds `1e-6 * max|K_diag|` to the θ DOF of any active node in a `Mixed`
/// analysis that is touched only by continuum (membrane) elements, never by
/// a beam — those θ DOFs otherwise carry zero stiffness and would leave K
/// singular.
fn stabilise_membrane_only_rotations(model: &Model, dof_map: &DofMap, k: &mut DMatrix<f64>) {
    let mut frame_nodes: std::collections::BTreeSet<u64> = std::collections::BTreeSet::new();
    for b in model.beams.values() {
        frame_nodes.extend(b.node_ids);
    }
    let max_diag = (0..k.nrows()).map(|i| k[(i, i)].abs()).fold(0.0_f64, f64::max);
    let bump = PLATE_STABILISATION_FACTOR * max_diag.max(1.0);
    for id in dof_map.node_ids() {
        if frame_nodes.contains(&id) {
            continue;
        }
        let theta_dof = dof_map.base(id).unwrap() + 2;
        k[(theta_dof, theta_dof)] += bump;
    }
}

fn assemble_nodal_loads(model: &Model, kind: AnalysisKind, dof_map: &DofMap, f: &mut DVector<f64>) {
    for id in dof_map.node_ids() {
        let Some(node) = model.nodes.get(&id) else { continue };
        let base = dof_map.base(id).unwrap();
        match kind {
            AnalysisKind::Frame | AnalysisKind::Mixed => {
                f[base] += node.loads.fx;
                f[base + 1] += node.loads.fy;
                f[base + 2] += node.loads.moment;
            }
            AnalysisKind::Continuum => {
                f[base] += node.loads.fx;
                f[base + 1] += node.loads.fy;
            }
            AnalysisKind::PlateBending => {
                f[base] += node.loads.transverse_for_plate();
            }
        }
    }
}

/// Builds the list of eliminated DOF indices and applies spring stiffness to
/// `k`'s diagonal for every DOF carrying a spring.
fn constrained_dofs(model: &Model, kind: AnalysisKind, dof_map: &DofMap, k: &mut DMatrix<f64>) -> Vec<usize> {
    let mut constrained = Vec::new();
    for id in dof_map.node_ids() {
        let Some(node) = model.nodes.get(&id) else { continue };
        let base = dof_map.base(id).unwrap();
        let c = &node.constraints;
        match kind {
            AnalysisKind::Frame | AnalysisKind::Mixed => {
                if c.is_eliminated(0) {
                    constrained.push(base);
                } else if let Some(kx) = c.spring_x {
                    k[(base, base)] += kx;
                }
                if c.is_eliminated(1) {
                    constrained.push(base + 1);
                } else if let Some(ky) = c.spring_y {
                    k[(base + 1, base + 1)] += ky;
                }
                if c.is_eliminated(2) {
                    constrained.push(base + 2);
                } else if let Some(kr) = c.spring_rot {
                    k[(base + 2, base + 2)] += kr;
                }
            }
            AnalysisKind::Continuum => {
                if c.is_eliminated(0) {
                    constrained.push(base);
                } else if let Some(kx) = c.spring_x {
                    k[(base, base)] += kx;
                }
                if c.is_eliminated(1) {
                    constrained.push(base + 1);
                } else if let Some(ky) = c.spring_y {
                    k[(base + 1, base + 1)] += ky;
                }
            }
            AnalysisKind::PlateBending => {
                // y -> w, rotation -> both theta_x and theta_y.
                if c.is_eliminated(1) {
                    constrained.push(base);
                } else if let Some(ky) = c.spring_y {
                    k[(base, base)] += ky;
                }
                if c.is_eliminated(2) {
                    constrained.push(base + 1);
                    constrained.push(base + 2);
                } else if let Some(kr) = c.spring_rot {
                    k[(base + 1, base + 1)] += kr;
                    k[(base + 2, base + 2)] += kr;
                }
            }
        }
    }
    constrained.sort_unstable();
    constrained
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BeamSection, Constraints};
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
    fn dof_map_excludes_disconnected_nodes() {
        let mut model = cantilever();
        model.add_node(99.0, 99.0);
        let dof_map = build_dof_map(&model, AnalysisKind::Frame);
        assert_eq!(dof_map.len(), 2);
    }

    #[test]
    fn cantilever_assembly_is_symmetric_and_has_two_constrained_dofs() {
        let model = cantilever();
        let assembly = assemble(&model, AnalysisKind::Frame);
        assert!(assembly.warnings.is_empty());
        assert_eq!(assembly.constrained.len(), 3);
        for i in 0..assembly.k.nrows() {
            for j in 0..assembly.k.ncols() {
                assert_relative_eq!(assembly.k[(i, j)], assembly.k[(j, i)], epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn zero_length_beam_is_skipped_with_warning() {
        let mut model = Model::new();
        let n1 = model.add_node(0.0, 0.0);
        let n2 = model.add_node(1.0, 0.0);
        model.add_beam(BeamElement::new(0, [n1, n2], 1, BeamSection::default())).unwrap();
        // Collapse the beam after construction to exercise the assembler's
        // own degeneracy guard (not just `Model::add_beam`'s).
        model.nodes.get_mut(&n2).unwrap().x = 0.0;
        let assembly = assemble(&model, AnalysisKind::Frame);
        assert_eq!(assembly.warnings, vec![Warning::ZeroLengthBeam(1)]);
    }

    #[test]
    fn spring_support_adds_diagonal_stiffness_not_elimination() {
        let mut model = cantilever();
        model.nodes.get_mut(&model.beams[&1].node_ids[1]).unwrap().constraints.spring_y = Some(5e5);
        model.nodes.get_mut(&model.beams[&1].node_ids[1]).unwrap().constraints.y = true;
        let assembly = assemble(&model, AnalysisKind::Frame);
        // Tip node's v-DOF should not be eliminated (the spring takes over).
        let tip_base = assembly.dof_map.base(model.beams[&1].node_ids[1]).unwrap();
        assert!(!assembly.constrained.contains(&(tip_base + 1)));
    }
}

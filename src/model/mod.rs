//! The structural model: an entity store with identity-stable ids, cascading
//! deletion, and mid-span beam splitting.

pub mod beam;
pub mod continuum;
pub mod material;
pub mod node;
pub mod plate_region;
pub mod section;
pub mod sub_node;

pub use beam::{BeamElement, BeamPointLoad, CoordSystem, DistributedLoad, EndReleases, ThermalLoad};
pub use continuum::{DktElement, PlaneCondition, QuadElement, TriangleElement};
pub use material::{ConcreteGrade, Material, ReinforcementGrade, SteelGrade, BAR_DIAMETERS_MM};
pub use node::{Constraints, Node, NodeLoads};
pub use plate_region::{BoundingBox, PlateElementType, PlateRegion, RegionEdges};
pub use section::BeamSection;
pub use sub_node::SubNode;

use std::collections::BTreeMap;

use crate::error::{FEAError, FEAResult};

/// Node ids `>= PLATE_NODE_ID_START` are reserved for a separate allocation
/// sequence used by plate-region meshing.
pub const PLATE_NODE_ID_START: u64 = 1000;

/// The model owns every entity by id; `BTreeMap` keeps entity ids (and thus
/// assembly scatter order) deterministic rather than hash-ordered.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Model {
    pub nodes: BTreeMap<u64, Node>,
    pub materials: BTreeMap<u64, Material>,
    pub beams: BTreeMap<u64, BeamElement>,
    pub triangles: BTreeMap<u64, TriangleElement>,
    pub quads: BTreeMap<u64, QuadElement>,
    pub dkt_elements: BTreeMap<u64, DktElement>,
    pub plate_regions: BTreeMap<u64, PlateRegion>,
    pub sub_nodes: BTreeMap<u64, SubNode>,

    next_node_id: u64,
    next_plate_node_id: u64,
    next_material_id: u64,
    next_beam_id: u64,
    next_element_id: u64,
    next_plate_region_id: u64,
    next_sub_node_id: u64,
}

impl Model {
    /// A new model seeded with the default steel (id 1) and concrete (id 2)
    /// materials; user-added materials start at id 10.
    pub fn new() -> Self {
        let mut materials = BTreeMap::new();
        materials.insert(1, Material::default_steel());
        materials.insert(2, Material::default_concrete());
        Self {
            nodes: BTreeMap::new(),
            materials,
            beams: BTreeMap::new(),
            triangles: BTreeMap::new(),
            quads: BTreeMap::new(),
            dkt_elements: BTreeMap::new(),
            plate_regions: BTreeMap::new(),
            sub_nodes: BTreeMap::new(),
            next_node_id: 1,
            next_plate_node_id: PLATE_NODE_ID_START,
            next_material_id: 10,
            next_beam_id: 1,
            next_element_id: 1,
            next_plate_region_id: 1,
            next_sub_node_id: 1,
        }
    }

    // ---- id allocation ----

    pub fn alloc_node_id(&mut self) -> u64 {
        let id = self.next_node_id;
        self.next_node_id += 1;
        id
    }

    pub fn alloc_plate_node_id(&mut self) -> u64 {
        let id = self.next_plate_node_id;
        self.next_plate_node_id += 1;
        id
    }

    pub fn alloc_material_id(&mut self) -> u64 {
        let id = self.next_material_id;
        self.next_material_id += 1;
        id
    }

    pub fn alloc_beam_id(&mut self) -> u64 {
        let id = self.next_beam_id;
        self.next_beam_id += 1;
        id
    }

    pub fn alloc_element_id(&mut self) -> u64 {
        let id = self.next_element_id;
        self.next_element_id += 1;
        id
    }

    pub fn alloc_plate_region_id(&mut self) -> u64 {
        let id = self.next_plate_region_id;
        self.next_plate_region_id += 1;
        id
    }

    pub fn alloc_sub_node_id(&mut self) -> u64 {
        let id = self.next_sub_node_id;
        self.next_sub_node_id += 1;
        id
    }

    /// Restore id sequences from a deserialized project file: each sequence
    /// resumes at `max(id) + 1`, falling back to its default start.
    pub fn resync_id_sequences(&mut self) {
        let (plate_nodes, plain_nodes) =
            self.nodes.keys().partition::<Vec<_>, _>(|&&id| id >= PLATE_NODE_ID_START);
        self.next_node_id = plain_nodes.iter().map(|&&id| id).max().map_or(1, |m| m + 1);
        self.next_plate_node_id =
            plate_nodes.iter().map(|&&id| id).max().map_or(PLATE_NODE_ID_START, |m| m + 1);
        self.next_material_id = self.materials.keys().copied().max().map_or(10, |m| m + 1).max(10);
        self.next_beam_id = self.beams.keys().copied().max().map_or(1, |m| m + 1);
        let next_triangle = self.triangles.keys().copied().max().map_or(1, |m| m + 1);
        let next_quad = self.quads.keys().copied().max().map_or(1, |m| m + 1);
        let next_dkt = self.dkt_elements.keys().copied().max().map_or(1, |m| m + 1);
        self.next_element_id = next_triangle.max(next_quad).max(next_dkt);
        self.next_plate_region_id = self.plate_regions.keys().copied().max().map_or(1, |m| m + 1);
        self.next_sub_node_id = self.sub_nodes.keys().copied().max().map_or(1, |m| m + 1);
    }

    // ---- creation ----

    pub fn add_node(&mut self, x: f64, y: f64) -> u64 {
        let id = self.alloc_node_id();
        self.nodes.insert(id, Node::new(id, x, y));
        id
    }

    pub fn add_material(&mut self, material: Material) -> FEAResult<u64> {
        if material.e <= 0.0 {
            return Err(FEAError::Validation("material E must be positive".into()));
        }
        if !(material.nu > -1.0 && material.nu < 0.5) {
            return Err(FEAError::Validation("material nu must lie in (-1, 0.5)".into()));
        }
        self.materials.insert(material.id, material);
        Ok(material.id)
    }

    pub fn add_beam(&mut self, mut beam: BeamElement) -> FEAResult<u64> {
        let n1 = self.get_node(beam.node_ids[0])?;
        let n2 = self.get_node(beam.node_ids[1])?;
        let length = n1.distance_to(n2);
        beam.validate(length).map_err(FEAError::Validation)?;
        self.require_material(beam.material_id)?;
        let id = self.alloc_beam_id();
        beam.id = id;
        self.beams.insert(id, beam);
        Ok(id)
    }

    pub fn add_triangle(&mut self, mut triangle: TriangleElement) -> FEAResult<u64> {
        let coords = self.triangle_coords(&triangle.node_ids)?;
        triangle.validate(&coords.0, &coords.1).map_err(FEAError::Validation)?;
        self.require_material(triangle.material_id)?;
        let id = self.alloc_element_id();
        triangle.id = id;
        self.triangles.insert(id, triangle);
        Ok(id)
    }

    pub fn add_quad(&mut self, mut quad: QuadElement) -> FEAResult<u64> {
        let coords = self.quad_coords(&quad.node_ids)?;
        quad.validate(&coords.0, &coords.1).map_err(FEAError::Validation)?;
        self.require_material(quad.material_id)?;
        let id = self.alloc_element_id();
        quad.id = id;
        self.quads.insert(id, quad);
        Ok(id)
    }

    pub fn add_dkt(&mut self, mut plate: DktElement) -> FEAResult<u64> {
        let coords = self.triangle_coords(&plate.node_ids)?;
        plate.validate(&coords.0, &coords.1).map_err(FEAError::Validation)?;
        self.require_material(plate.material_id)?;
        let id = self.alloc_element_id();
        plate.id = id;
        self.dkt_elements.insert(id, plate);
        Ok(id)
    }

    pub fn add_plate_region(&mut self, mut region: PlateRegion) -> FEAResult<u64> {
        region.validate().map_err(FEAError::Validation)?;
        self.require_material(region.material_id)?;
        let id = self.alloc_plate_region_id();
        region.id = id;
        self.plate_regions.insert(id, region);
        Ok(id)
    }

    // ---- retrieval ----

    pub fn get_node(&self, id: u64) -> FEAResult<&Node> {
        self.nodes.get(&id).ok_or(FEAError::NodeNotFound(id))
    }

    pub fn get_material(&self, id: u64) -> FEAResult<&Material> {
        self.materials.get(&id).ok_or(FEAError::MaterialNotFound(id))
    }

    pub fn get_beam(&self, id: u64) -> FEAResult<&BeamElement> {
        self.beams.get(&id).ok_or(FEAError::BeamNotFound(id))
    }

    fn require_material(&self, id: u64) -> FEAResult<()> {
        self.materials.get(&id).map(|_| ()).ok_or(FEAError::MaterialNotFound(id))
    }

    fn triangle_coords(&self, node_ids: &[u64; 3]) -> FEAResult<([f64; 3], [f64; 3])> {
        let mut x = [0.0; 3];
        let mut y = [0.0; 3];
        for (k, &nid) in node_ids.iter().enumerate() {
            let n = self.get_node(nid)?;
            x[k] = n.x;
            y[k] = n.y;
        }
        Ok((x, y))
    }

    fn quad_coords(&self, node_ids: &[u64; 4]) -> FEAResult<([f64; 4], [f64; 4])> {
        let mut x = [0.0; 4];
        let mut y = [0.0; 4];
        for (k, &nid) in node_ids.iter().enumerate() {
            let n = self.get_node(nid)?;
            x[k] = n.x;
            y[k] = n.y;
        }
        Ok((x, y))
    }

    /// First node within Euclidean `tol` of `(x, y)`, if any.
    pub fn find_node_at(&self, x: f64, y: f64, tol: f64) -> Option<u64> {
        self.nodes
            .values()
            .find(|n| ((n.x - x).powi(2) + (n.y - y).powi(2)).sqrt() <= tol)
            .map(|n| n.id)
    }

    // ---- cascading deletion ----

    /// Removes a node and cascades: any beam/2D element/plate region
    /// referencing it is deleted, and any sub-node tied to it is deleted.
    pub fn remove_node(&mut self, id: u64) -> FEAResult<()> {
        if !self.nodes.contains_key(&id) {
            return Err(FEAError::NodeNotFound(id));
        }
        let beam_ids: Vec<u64> =
            self.beams.values().filter(|b| b.node_ids.contains(&id)).map(|b| b.id).collect();
        for bid in beam_ids {
            self.remove_beam(bid)?;
        }
        let tri_ids: Vec<u64> =
            self.triangles.values().filter(|t| t.node_ids.contains(&id)).map(|t| t.id).collect();
        for tid in tri_ids {
            self.remove_element(tid);
        }
        let quad_ids: Vec<u64> =
            self.quads.values().filter(|q| q.node_ids.contains(&id)).map(|q| q.id).collect();
        for qid in quad_ids {
            self.remove_element(qid);
        }
        let dkt_ids: Vec<u64> =
            self.dkt_elements.values().filter(|p| p.node_ids.contains(&id)).map(|p| p.id).collect();
        for did in dkt_ids {
            self.remove_element(did);
        }
        let region_ids: Vec<u64> =
            self.plate_regions.values().filter(|r| r.node_ids.contains(&id)).map(|r| r.id).collect();
        for rid in region_ids {
            self.remove_plate_region(rid);
        }
        let sub_node_ids: Vec<u64> =
            self.sub_nodes.values().filter(|s| s.references_node(id)).map(|s| s.id).collect();
        for sid in sub_node_ids {
            self.sub_nodes.remove(&sid);
        }
        self.nodes.remove(&id);
        Ok(())
    }

    /// Removes a beam. Never removes its endpoint nodes directly; call
    /// `sweep_orphan_nodes` afterwards to drop nodes left unreferenced.
    pub fn remove_beam(&mut self, id: u64) -> FEAResult<()> {
        self.beams.remove(&id).ok_or(FEAError::BeamNotFound(id))?;
        self.sweep_orphan_nodes();
        Ok(())
    }

    /// Removes a 2D element (triangle, quad, or DKT plate) by id.
    pub fn remove_element(&mut self, id: u64) {
        self.triangles.remove(&id);
        self.quads.remove(&id);
        self.dkt_elements.remove(&id);
        self.sweep_orphan_nodes();
    }

    /// Removes a plate region, its generated elements, and any generated
    /// node not referenced by anything else.
    pub fn remove_plate_region(&mut self, id: u64) {
        if let Some(region) = self.plate_regions.remove(&id) {
            for eid in &region.element_ids {
                self.triangles.remove(eid);
                self.quads.remove(eid);
                self.dkt_elements.remove(eid);
            }
        }
        self.sweep_orphan_nodes();
    }

    /// Removes any node not referenced by any element or plate region.
    fn sweep_orphan_nodes(&mut self) {
        let mut referenced: std::collections::BTreeSet<u64> = std::collections::BTreeSet::new();
        for b in self.beams.values() {
            referenced.extend(b.node_ids);
        }
        for t in self.triangles.values() {
            referenced.extend(t.node_ids);
        }
        for q in self.quads.values() {
            referenced.extend(q.node_ids);
        }
        for p in self.dkt_elements.values() {
            referenced.extend(p.node_ids);
        }
        for r in self.plate_regions.values() {
            referenced.extend(r.node_ids.iter().copied());
        }
        let orphans: Vec<u64> =
            self.nodes.keys().copied().filter(|id| !referenced.contains(id)).collect();
        for id in orphans {
            self.nodes.remove(&id);
        }
    }

    // ---- mid-span beam splitting ----

    /// Splits `beam_id` at local position `t` (clamped to `[0.01, 0.99]`). If
    /// a node already sits within 0.01 m of the interpolated point,
    /// `optional_load` is superposed onto that node instead and no split
    /// occurs. Otherwise a new node replaces the beam with two child beams
    /// that keep the outer end releases and share continuity at the new
    /// inner node.
    pub fn split_beam_at(
        &mut self,
        beam_id: u64,
        t: f64,
        optional_load: Option<NodeLoads>,
    ) -> FEAResult<SplitOutcome> {
        let t = t.clamp(0.01, 0.99);
        let beam = self.get_beam(beam_id)?.clone();
        let n1 = self.get_node(beam.node_ids[0])?.clone();
        let n2 = self.get_node(beam.node_ids[1])?.clone();
        let px = n1.x + t * (n2.x - n1.x);
        let py = n1.y + t * (n2.y - n1.y);

        if let Some(existing) = self.find_node_at(px, py, 0.01) {
            if let Some(load) = optional_load {
                let node = self.nodes.get_mut(&existing).expect("found node exists");
                node.loads.fx += load.fx;
                node.loads.fy += load.fy;
                node.loads.moment += load.moment;
                if let Some(fz) = load.fz {
                    node.loads.fz = Some(node.loads.fz.unwrap_or(0.0) + fz);
                }
            }
            return Ok(SplitOutcome::Superposed { node_id: existing });
        }

        let mid_id = self.add_node(px, py);
        if let Some(load) = optional_load {
            self.nodes.get_mut(&mid_id).expect("just inserted").loads = load;
        }

        let releases = beam.end_releases.unwrap_or_default();
        let start_releases = EndReleases { start_moment: releases.start_moment, ..Default::default() };
        let end_releases = EndReleases { end_moment: releases.end_moment, ..Default::default() };

        let mut child_a =
            BeamElement::new(0, [beam.node_ids[0], mid_id], beam.material_id, beam.section.clone());
        child_a.profile_name = beam.profile_name.clone();
        child_a.distributed_load = beam.distributed_load;
        child_a.thermal_load = beam.thermal_load;
        child_a.end_releases = Some(start_releases);

        let mut child_b =
            BeamElement::new(0, [mid_id, beam.node_ids[1]], beam.material_id, beam.section.clone());
        child_b.profile_name = beam.profile_name.clone();
        child_b.distributed_load = beam.distributed_load;
        child_b.thermal_load = beam.thermal_load;
        child_b.end_releases = Some(end_releases);

        self.beams.remove(&beam_id);
        let child_a_id = self.add_beam(child_a)?;
        let child_b_id = self.add_beam(child_b)?;

        Ok(SplitOutcome::Split { mid_node_id: mid_id, child_beam_ids: [child_a_id, child_b_id] })
    }

    /// The reversible variant of `split_beam_at`: performs the split and
    /// records a `SubNode` so it can be undone with `remove_sub_node`.
    pub fn add_sub_node(&mut self, beam_id: u64, t: f64) -> FEAResult<u64> {
        let beam = self.get_beam(beam_id)?.clone();
        let outcome = self.split_beam_at(beam_id, t, None)?;
        let (mid_node_id, child_beam_ids) = match outcome {
            SplitOutcome::Split { mid_node_id, child_beam_ids } => (mid_node_id, child_beam_ids),
            SplitOutcome::Superposed { .. } => {
                return Err(FEAError::Validation(
                    "cannot record a sub-node: a node already exists at this split point".into(),
                ))
            }
        };
        let id = self.alloc_sub_node_id();
        let sub_node = SubNode::new(
            id,
            beam_id,
            t.clamp(0.01, 0.99),
            mid_node_id,
            beam.node_ids[0],
            beam.node_ids[1],
            child_beam_ids,
        );
        self.sub_nodes.insert(id, sub_node);
        Ok(id)
    }

    /// Undoes `add_sub_node`: recreates the original beam by aggregating
    /// properties from one surviving child, combining both children's end
    /// releases, and removes the inserted mid-node.
    pub fn remove_sub_node(&mut self, sub_node_id: u64) -> FEAResult<u64> {
        let sub_node = self.sub_nodes.get(&sub_node_id).ok_or(FEAError::SubNodeNotFound(sub_node_id))?.clone();
        let child_a = self.get_beam(sub_node.child_beam_ids[0])?.clone();
        let child_b = self.get_beam(sub_node.child_beam_ids[1])?.clone();

        let start_moment =
            child_a.end_releases.map(|r| r.start_moment).unwrap_or(false);
        let end_moment = child_b.end_releases.map(|r| r.end_moment).unwrap_or(false);
        let combined_releases = EndReleases { start_moment, end_moment, ..Default::default() };

        let mut restored = BeamElement::new(
            0,
            [sub_node.original_beam_start, sub_node.original_beam_end],
            child_a.material_id,
            child_a.section.clone(),
        );
        restored.profile_name = child_a.profile_name.clone();
        restored.distributed_load = child_a.distributed_load;
        restored.thermal_load = child_a.thermal_load;
        if combined_releases.any() {
            restored.end_releases = Some(combined_releases);
        }

        self.beams.remove(&sub_node.child_beam_ids[0]);
        self.beams.remove(&sub_node.child_beam_ids[1]);
        self.nodes.remove(&sub_node.node_id);
        self.sub_nodes.remove(&sub_node_id);

        self.add_beam(restored)
    }

    /// Linearly re-interpolates every sub-node mesh position belonging to a
    /// beam whose endpoint `moved_node_id` has moved.
    pub fn update_sub_node_positions(&mut self, moved_node_id: u64) -> FEAResult<()> {
        let affected: Vec<u64> = self
            .sub_nodes
            .values()
            .filter(|s| s.original_beam_start == moved_node_id || s.original_beam_end == moved_node_id)
            .map(|s| s.id)
            .collect();
        for sid in affected {
            let sub_node = self.sub_nodes.get(&sid).expect("id from own iteration").clone();
            let start = self.get_node(sub_node.original_beam_start)?.clone();
            let end = self.get_node(sub_node.original_beam_end)?.clone();
            let x = start.x + sub_node.t * (end.x - start.x);
            let y = start.y + sub_node.t * (end.y - start.y);
            if let Some(mid) = self.nodes.get_mut(&sub_node.node_id) {
                mid.x = x;
                mid.y = y;
            }
        }
        Ok(())
    }
}

/// Outcome of `split_beam_at`.
#[derive(Debug, Clone, Copy)]
pub enum SplitOutcome {
    Split { mid_node_id: u64, child_beam_ids: [u64; 2] },
    Superposed { node_id: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_beam(model: &mut Model) -> u64 {
        let n1 = model.add_node(0.0, 0.0);
        let n2 = model.add_node(4.0, 0.0);
        model.add_beam(BeamElement::new(0, [n1, n2], 1, BeamSection::default())).unwrap()
    }

    #[test]
    fn new_model_seeds_default_materials() {
        let model = Model::new();
        assert!(model.materials.contains_key(&1));
        assert!(model.materials.contains_key(&2));
    }

    #[test]
    fn split_beam_creates_mid_node_and_two_children() {
        let mut model = Model::new();
        let beam_id = two_node_beam(&mut model);
        let outcome = model.split_beam_at(beam_id, 0.5, None).unwrap();
        match outcome {
            SplitOutcome::Split { mid_node_id, child_beam_ids } => {
                let mid = model.get_node(mid_node_id).unwrap();
                assert!((mid.x - 2.0).abs() < 1e-9);
                assert_eq!(model.beams.len(), 2);
                assert!(model.get_beam(child_beam_ids[0]).is_ok());
                assert!(model.get_beam(child_beam_ids[1]).is_ok());
            }
            SplitOutcome::Superposed { .. } => panic!("expected a split"),
        }
        assert!(model.get_beam(beam_id).is_err());
    }

    #[test]
    fn split_near_existing_node_superposes_load_instead() {
        let mut model = Model::new();
        let n1 = model.add_node(0.0, 0.0);
        let n2 = model.add_node(4.0, 0.0);
        let mid = model.add_node(2.0, 0.0);
        model.add_beam(BeamElement::new(0, [n1, mid], 1, BeamSection::default())).unwrap();
        let beam_id = model.add_beam(BeamElement::new(0, [mid, n2], 1, BeamSection::default())).unwrap();
        let load = NodeLoads { fx: 0.0, fy: -500.0, fz: None, moment: 0.0 };
        let outcome = model.split_beam_at(beam_id, 0.5, Some(load)).unwrap();
        match outcome {
            SplitOutcome::Superposed { node_id } => {
                assert_eq!(node_id, mid);
                assert_eq!(model.get_node(mid).unwrap().loads.fy, -500.0);
            }
            SplitOutcome::Split { .. } => panic!("expected superposition"),
        }
    }

    #[test]
    fn sub_node_round_trip_restores_original_beam() {
        let mut model = Model::new();
        let n1 = model.add_node(0.0, 0.0);
        let n2 = model.add_node(6.0, 0.0);
        let beam_id = model
            .add_beam(
                BeamElement::new(0, [n1, n2], 1, BeamSection::default())
                    .with_distributed_load(DistributedLoad::uniform(0.0, -1000.0)),
            )
            .unwrap();
        let sub_node_id = model.add_sub_node(beam_id, 0.5).unwrap();
        let restored_id = model.remove_sub_node(sub_node_id).unwrap();

        let restored = model.get_beam(restored_id).unwrap();
        assert_eq!(restored.node_ids, [n1, n2]);
        assert_eq!(restored.material_id, 1);
        assert!(restored.distributed_load.is_some());
        assert_eq!(model.beams.len(), 1);
    }

    #[test]
    fn removing_node_cascades_to_beams_and_sweeps_orphans() {
        let mut model = Model::new();
        let n1 = model.add_node(0.0, 0.0);
        let n2 = model.add_node(4.0, 0.0);
        model.add_beam(BeamElement::new(0, [n1, n2], 1, BeamSection::default())).unwrap();
        model.remove_node(n1).unwrap();
        assert!(model.beams.is_empty());
        assert!(model.nodes.get(&n2).is_none(), "orphaned far node should be swept");
    }

    #[test]
    fn find_node_at_respects_tolerance() {
        let mut model = Model::new();
        let n1 = model.add_node(1.0, 1.0);
        assert_eq!(model.find_node_at(1.005, 1.0, 0.01), Some(n1));
        assert_eq!(model.find_node_at(2.0, 2.0, 0.01), None);
    }
}

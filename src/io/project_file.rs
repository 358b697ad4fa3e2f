//! The JSON project file: mesh, load cases, load combinations, and
//! whatever passthrough project metadata the UI wants echoed back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};
use crate::loads::{CombinationType, LoadCase, LoadCombination};
use crate::model::{
    BeamElement, BeamSection, DktElement, Material, Model, Node, PlateRegion, QuadElement,
    SubNode, TriangleElement,
};

/// The only version this engine currently accepts on load.
pub const PROJECT_FILE_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// `Triangle | Quad | Dkt`, tagged so a single `elements[]` array can mix all
/// three without a discriminated wrapper type per kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ElementDto {
    Triangle(TriangleElement),
    Quad(QuadElement),
    Dkt(DktElement),
}

/// A named cross-section in the section-picker library. Beams still carry
/// their own `section` inline; this is purely a lookup table for the name a
/// beam's `profile_name` refers to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedSection {
    pub name: String,
    pub section: BeamSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshData {
    pub nodes: Vec<Node>,
    pub elements: Vec<ElementDto>,
    pub beam_elements: Vec<BeamElement>,
    pub materials: Vec<Material>,
    pub sections: Vec<NamedSection>,
    pub plate_regions: Vec<PlateRegion>,
    pub sub_nodes: Vec<SubNode>,
    /// Rendering-only node-id pairs (every beam's endpoints); fully derived
    /// from `beam_elements` on save and ignored on load.
    pub edges: Vec<[u64; 2]>,
}

/// `factors` serialises as an array of `[load_case_id, factor]` pairs rather
/// than an object, so the file stays valid JSON regardless of how large ids
/// get and so key order is explicit rather than incidental to a JSON
/// object's (unspecified) key order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadCombinationDto {
    pub id: u64,
    pub name: String,
    pub combo_type: CombinationType,
    pub factors: Vec<(u64, f64)>,
}

impl From<&LoadCombination> for LoadCombinationDto {
    fn from(combo: &LoadCombination) -> Self {
        Self {
            id: combo.id,
            name: combo.name.clone(),
            combo_type: combo.combo_type,
            factors: combo.factors.iter().map(|(&id, &factor)| (id, factor)).collect(),
        }
    }
}

impl From<LoadCombinationDto> for LoadCombination {
    fn from(dto: LoadCombinationDto) -> Self {
        let mut combo = LoadCombination::new(dto.id, dto.name, dto.combo_type);
        combo.factors = dto.factors.into_iter().collect();
        combo
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub version: String,
    pub project_info: ProjectInfo,
    pub mesh: MeshData,
    pub load_cases: Vec<LoadCase>,
    pub load_combinations: Vec<LoadCombinationDto>,
    /// UI-owned grid/snap settings. The engine neither reads nor computes
    /// this; it is only round-tripped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structural_grid: Option<serde_json::Value>,
}

/// Flattens `model`'s entity arenas plus the load state into the file shape.
pub fn to_project_file(
    model: &Model,
    project_info: ProjectInfo,
    load_cases: &BTreeMap<u64, LoadCase>,
    load_combinations: &[LoadCombination],
) -> ProjectFile {
    let elements = model
        .triangles
        .values()
        .cloned()
        .map(ElementDto::Triangle)
        .chain(model.quads.values().cloned().map(ElementDto::Quad))
        .chain(model.dkt_elements.values().cloned().map(ElementDto::Dkt))
        .collect();

    let mut sections = Vec::new();
    let mut seen_profiles = std::collections::BTreeSet::new();
    for beam in model.beams.values() {
        if let Some(name) = &beam.profile_name {
            if seen_profiles.insert(name.clone()) {
                sections.push(NamedSection { name: name.clone(), section: beam.section.clone() });
            }
        }
    }

    let edges = model.beams.values().map(|b| b.node_ids).collect();

    let mesh = MeshData {
        nodes: model.nodes.values().cloned().collect(),
        elements,
        beam_elements: model.beams.values().cloned().collect(),
        materials: model.materials.values().cloned().collect(),
        sections,
        plate_regions: model.plate_regions.values().cloned().collect(),
        sub_nodes: model.sub_nodes.values().cloned().collect(),
        edges,
    };

    ProjectFile {
        version: PROJECT_FILE_VERSION.to_string(),
        project_info,
        mesh,
        load_cases: load_cases.values().cloned().collect(),
        load_combinations: load_combinations.iter().map(LoadCombinationDto::from).collect(),
        structural_grid: None,
    }
}

/// Rebuilds a `Model` plus load state from a deserialized project file,
/// resyncing every id sequence to `max(id) + 1` so subsequently-added
/// entities never collide with the restored ones.
pub fn from_project_file(
    file: &ProjectFile,
) -> FEAResult<(Model, BTreeMap<u64, LoadCase>, Vec<LoadCombination>)> {
    if file.version != PROJECT_FILE_VERSION {
        return Err(FEAError::Validation(format!(
            "unsupported project file version '{}', expected '{PROJECT_FILE_VERSION}'",
            file.version
        )));
    }

    let mut model = Model::new();
    model.nodes = file.mesh.nodes.iter().cloned().map(|n| (n.id, n)).collect();
    model.materials = file.mesh.materials.iter().cloned().map(|m| (m.id, m)).collect();
    model.beams = file.mesh.beam_elements.iter().cloned().map(|b| (b.id, b)).collect();

    let mut triangles = BTreeMap::new();
    let mut quads = BTreeMap::new();
    let mut dkt_elements = BTreeMap::new();
    for element in &file.mesh.elements {
        match element {
            ElementDto::Triangle(t) => {
                triangles.insert(t.id, t.clone());
            }
            ElementDto::Quad(q) => {
                quads.insert(q.id, q.clone());
            }
            ElementDto::Dkt(d) => {
                dkt_elements.insert(d.id, d.clone());
            }
        }
    }
    model.triangles = triangles;
    model.quads = quads;
    model.dkt_elements = dkt_elements;
    model.plate_regions = file.mesh.plate_regions.iter().cloned().map(|r| (r.id, r)).collect();
    model.sub_nodes = file.mesh.sub_nodes.iter().cloned().map(|s| (s.id, s)).collect();
    model.resync_id_sequences();

    let load_cases = file.load_cases.iter().cloned().map(|c| (c.id, c)).collect();
    let load_combinations = file.load_combinations.iter().cloned().map(LoadCombination::into).collect();

    Ok((model, load_cases, load_combinations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loads::LoadCaseType;
    use crate::model::Constraints;

    fn sample_model() -> Model {
        let mut model = Model::new();
        let n1 = model.add_node(0.0, 0.0);
        let n2 = model.add_node(4.0, 0.0);
        let mut fixed = model.get_node(n1).unwrap().clone();
        fixed.constraints = Constraints::fixed();
        model.nodes.insert(n1, fixed);
        model.add_beam(BeamElement::new(0, [n1, n2], 1, BeamSection::rectangular(0.2, 0.4))).unwrap();
        model
    }

    #[test]
    fn round_trips_nodes_beams_and_materials() {
        let model = sample_model();
        let mut cases = BTreeMap::new();
        cases.insert(1, LoadCase::new(1, "Dead", LoadCaseType::Dead));
        let combo = LoadCombination::new(1, "1.0D", CombinationType::Sls).with_factor(1, 1.0);

        let file = to_project_file(&model, ProjectInfo { name: "Test".into(), description: None }, &cases, &[combo]);
        let json = serde_json::to_string(&file).unwrap();
        let parsed: ProjectFile = serde_json::from_str(&json).unwrap();
        let (restored, restored_cases, restored_combos) = from_project_file(&parsed).unwrap();

        assert_eq!(restored.nodes.len(), model.nodes.len());
        assert_eq!(restored.beams.len(), model.beams.len());
        assert_eq!(restored_cases.len(), 1);
        assert_eq!(restored_combos[0].factor(1), 1.0);
    }

    #[test]
    fn load_combination_factors_serialise_as_pair_arrays() {
        let combo = LoadCombination::new(1, "ULS", CombinationType::Uls).with_factor(7, 1.35);
        let dto = LoadCombinationDto::from(&combo);
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["factors"], serde_json::json!([[7, 1.35]]));
    }

    #[test]
    fn rejects_unknown_version() {
        let model = sample_model();
        let mut file = to_project_file(&model, ProjectInfo::default(), &BTreeMap::new(), &[]);
        file.version = "0.9.0".to_string();
        assert!(from_project_file(&file).is_err());
    }

    #[test]
    fn resyncs_id_sequences_after_load() {
        let model = sample_model();
        let file = to_project_file(&model, ProjectInfo::default(), &BTreeMap::new(), &[]);
        let (mut restored, _, _) = from_project_file(&file).unwrap();
        let new_node = restored.add_node(9.0, 9.0);
        assert!(new_node > model.nodes.keys().copied().max().unwrap());
    }
}

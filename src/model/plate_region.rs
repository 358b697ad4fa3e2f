//! Plate-region meshing metadata: a rectangular (or polygonal) area subdivided
//! into a grid of continuum elements, generated once and tracked by id so it
//! can be regenerated or deleted as a unit.

use serde::{Deserialize, Serialize};

use super::continuum::PlaneCondition;

/// Axis-aligned bounding box in the xy plane.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }
}

/// What kind of elements a region generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlateElementType {
    PlaneStress,
    PlaneStrain,
    PlateBending,
}

impl PlateElementType {
    pub fn plane_condition(&self) -> Option<PlaneCondition> {
        match self {
            PlateElementType::PlaneStress => Some(PlaneCondition::Stress),
            PlateElementType::PlaneStrain => Some(PlaneCondition::Strain),
            PlateElementType::PlateBending => None,
        }
    }
}

/// Boundary node ids along each of the four sides of the generated grid, in
/// increasing coordinate order, used to stitch adjacent regions or beams.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionEdges {
    pub bottom: Vec<u64>,
    pub top: Vec<u64>,
    pub left: Vec<u64>,
    pub right: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlateRegion {
    pub id: u64,
    pub bbox: BoundingBox,
    pub divisions_x: u32,
    pub divisions_y: u32,
    pub material_id: u64,
    pub thickness: f64,
    pub element_type: PlateElementType,
    pub node_ids: Vec<u64>,
    pub corner_node_ids: [u64; 4],
    pub element_ids: Vec<u64>,
    pub edges: RegionEdges,
    pub is_polygon: bool,
    pub polygon: Option<Vec<(f64, f64)>>,
    pub voids: Option<Vec<Vec<(f64, f64)>>>,
}

impl PlateRegion {
    pub fn new(
        id: u64,
        bbox: BoundingBox,
        divisions_x: u32,
        divisions_y: u32,
        material_id: u64,
        thickness: f64,
        element_type: PlateElementType,
    ) -> Self {
        Self {
            id,
            bbox,
            divisions_x,
            divisions_y,
            material_id,
            thickness,
            element_type,
            node_ids: Vec::new(),
            corner_node_ids: [0; 4],
            element_ids: Vec::new(),
            edges: RegionEdges::default(),
            is_polygon: false,
            polygon: None,
            voids: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.thickness <= 0.0 {
            return Err(format!("plate region {} must have positive thickness", self.id));
        }
        if self.divisions_x == 0 || self.divisions_y == 0 {
            return Err(format!("plate region {} needs at least one division per axis", self.id));
        }
        if self.bbox.width() <= 0.0 || self.bbox.height() <= 0.0 {
            return Err(format!("plate region {} has a degenerate bounding box", self.id));
        }
        Ok(())
    }

    /// Grid node position `(i, j)` with `i in 0..=divisions_x`, `j in 0..=divisions_y`.
    pub fn grid_point(&self, i: u32, j: u32) -> (f64, f64) {
        let x = self.bbox.x_min + self.bbox.width() * (i as f64) / (self.divisions_x as f64);
        let y = self.bbox.y_min + self.bbox.height() * (j as f64) / (self.divisions_y as f64);
        (x, y)
    }

    pub fn node_count(&self) -> usize {
        ((self.divisions_x + 1) * (self.divisions_y + 1)) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> PlateRegion {
        PlateRegion::new(
            1,
            BoundingBox { x_min: 0.0, y_min: 0.0, x_max: 4.0, y_max: 2.0 },
            4,
            2,
            1,
            0.2,
            PlateElementType::PlaneStress,
        )
    }

    #[test]
    fn grid_point_spans_bbox_corners() {
        let r = region();
        assert_eq!(r.grid_point(0, 0), (0.0, 0.0));
        assert_eq!(r.grid_point(4, 2), (4.0, 2.0));
    }

    #[test]
    fn node_count_matches_division_grid() {
        let r = region();
        assert_eq!(r.node_count(), 5 * 3);
    }

    #[test]
    fn rejects_zero_divisions() {
        let mut r = region();
        r.divisions_x = 0;
        assert!(r.validate().is_err());
    }
}

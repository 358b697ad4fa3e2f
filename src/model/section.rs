//! Cross-section properties for 2D frame elements.

use serde::{Deserialize, Serialize};

/// `A > 0, I > 0, h > 0` are checked at construction. Secondary properties
/// used by the steel code checks (`Wy`, `It`, `Iw`) are derived lazily from
/// geometry when missing; a check that needs one of these and finds neither
/// a supplied value nor a derivable one is skipped rather than treated as
/// zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeamSection {
    pub a: f64,
    pub i: f64,
    pub h: f64,
    pub b: Option<f64>,
    pub tw: Option<f64>,
    pub tf: Option<f64>,
    pub iz: Option<f64>,
    pub wy: Option<f64>,
    pub wz: Option<f64>,
    pub wply: Option<f64>,
    pub wplz: Option<f64>,
    pub it: Option<f64>,
    pub iw: Option<f64>,
}

impl BeamSection {
    pub fn new(a: f64, i: f64, h: f64) -> Self {
        Self {
            a,
            i,
            h,
            b: None,
            tw: None,
            tf: None,
            iz: None,
            wy: None,
            wz: None,
            wply: None,
            wplz: None,
            it: None,
            iw: None,
        }
    }

    pub fn rectangular(width: f64, depth: f64) -> Self {
        let a = width * depth;
        let i = width * depth.powi(3) / 12.0;
        let iz = depth * width.powi(3) / 12.0;
        let (long_side, short_side) = if width > depth { (width, depth) } else { (depth, width) };
        let it = long_side * short_side.powi(3) / 3.0 * (1.0 - 0.63 * short_side / long_side);
        Self {
            a,
            i,
            h: depth,
            b: Some(width),
            tw: None,
            tf: None,
            iz: Some(iz),
            wy: Some(width * depth.powi(2) / 6.0),
            wz: Some(depth * width.powi(2) / 6.0),
            wply: Some(width * depth.powi(2) / 4.0),
            wplz: Some(depth * width.powi(2) / 4.0),
            it: Some(it),
            iw: Some(0.0),
        }
    }

    /// Wide-flange (I-section) geometry, matching the properties the steel
    /// checks (§4.H.1) need for shear area and LTB.
    pub fn wide_flange(depth: f64, flange_width: f64, flange_thickness: f64, web_thickness: f64) -> Self {
        let bf = flange_width;
        let tf = flange_thickness;
        let tw = web_thickness;
        let d = depth;
        let hw = d - 2.0 * tf;

        let a = 2.0 * bf * tf + hw * tw;
        let i = (bf * d.powi(3) - (bf - tw) * hw.powi(3)) / 12.0;
        let iz = (2.0 * tf * bf.powi(3) + hw * tw.powi(3)) / 12.0;
        let it = (2.0 * bf * tf.powi(3) + hw * tw.powi(3)) / 3.0;
        // Warping constant, I-section approximation: Iw = Iz * (h - tf)^2 / 4.
        let iw = iz * (d - tf).powi(2) / 4.0;
        let wply = bf * tf * (d - tf) + tw * hw.powi(2) / 4.0;
        let wplz = tf * bf.powi(2) / 2.0 + hw * tw.powi(2) / 4.0;

        Self {
            a,
            i,
            h: d,
            b: Some(bf),
            tw: Some(tw),
            tf: Some(tf),
            iz: Some(iz),
            wy: Some(i / (d / 2.0)),
            wz: Some(iz / (bf / 2.0)),
            wply: Some(wply),
            wplz: Some(wplz),
            it: Some(it),
            iw: Some(iw),
        }
    }

    /// Elastic section modulus, derived from `I/(h/2)` if not supplied (4.H.1).
    pub fn elastic_modulus(&self) -> f64 {
        self.wy.unwrap_or(self.i / (self.h / 2.0))
    }

    /// Shear area for an I-section (`max(hw*tw, 0.5A)`) or `0.6A` otherwise.
    pub fn shear_area(&self) -> f64 {
        match (self.tw, self.tf) {
            (Some(tw), Some(tf)) => {
                let hw = self.h - 2.0 * tf;
                (hw * tw).max(0.5 * self.a)
            }
            _ => 0.6 * self.a,
        }
    }

    pub fn radius_of_gyration_y(&self) -> f64 {
        (self.i / self.a).sqrt()
    }
}

impl Default for BeamSection {
    fn default() -> Self {
        Self::rectangular(0.2, 0.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rectangular_matches_closed_form() {
        let s = BeamSection::rectangular(0.3, 0.5);
        assert_relative_eq!(s.a, 0.15, epsilon = 1e-12);
        assert_relative_eq!(s.i, 0.3 * 0.5_f64.powi(3) / 12.0, epsilon = 1e-12);
    }

    #[test]
    fn elastic_modulus_falls_back_when_missing() {
        let s = BeamSection::new(0.01, 8e-5, 0.3);
        assert_relative_eq!(s.elastic_modulus(), 8e-5 / 0.15, epsilon = 1e-9);
    }
}

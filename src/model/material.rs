//! Material properties and the Eurocode grade presets used by the code checks.

use serde::{Deserialize, Serialize};

/// `E > 0`, `-1 < nu < 0.5` are checked at construction (`Model::add_material`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Material {
    pub id: u64,
    pub e: f64,
    pub nu: f64,
    pub rho: f64,
    pub alpha: Option<f64>,
}

impl Material {
    pub fn new(id: u64, e: f64, nu: f64, rho: f64) -> Self {
        Self { id, e, nu, rho, alpha: None }
    }

    pub fn with_expansion_coefficient(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn g(&self) -> f64 {
        self.e / (2.0 * (1.0 + self.nu))
    }

    /// Default steel material seeded at id 1 on `Model::new()`.
    pub fn default_steel() -> Self {
        Self::new(1, 210e9, 0.3, 7850.0).with_expansion_coefficient(1.2e-5)
    }

    /// Default concrete (C30/37) material seeded at id 2 on `Model::new()`.
    pub fn default_concrete() -> Self {
        Self::new(2, 33e9, 0.2, 2500.0).with_expansion_coefficient(1.0e-5)
    }
}

/// EN 1993-1-1 steel grade: yield strength and partial factors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SteelGrade {
    pub name: &'static str,
    /// Yield strength, Pa.
    pub fy: f64,
    pub gamma_m0: f64,
    pub gamma_m1: f64,
}

impl SteelGrade {
    pub const S235: SteelGrade = SteelGrade { name: "S235", fy: 235e6, gamma_m0: 1.0, gamma_m1: 1.0 };
    pub const S275: SteelGrade = SteelGrade { name: "S275", fy: 275e6, gamma_m0: 1.0, gamma_m1: 1.0 };
    pub const S355: SteelGrade = SteelGrade { name: "S355", fy: 355e6, gamma_m0: 1.0, gamma_m1: 1.0 };
}

/// EN 1992-1-1 concrete grade.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConcreteGrade {
    pub name: &'static str,
    /// Characteristic cylinder compressive strength, Pa.
    pub fck: f64,
    /// Design compressive strength, Pa.
    pub fcd: f64,
    /// Mean axial tensile strength, Pa.
    pub fctm: f64,
    /// Secant modulus of elasticity, Pa.
    pub ecm: f64,
}

impl ConcreteGrade {
    pub const C20_25: ConcreteGrade =
        ConcreteGrade { name: "C20/25", fck: 20e6, fcd: 20e6 / 1.5, fctm: 2.2e6, ecm: 30e9 };
    pub const C25_30: ConcreteGrade =
        ConcreteGrade { name: "C25/30", fck: 25e6, fcd: 25e6 / 1.5, fctm: 2.6e6, ecm: 31e9 };
    pub const C30_37: ConcreteGrade =
        ConcreteGrade { name: "C30/37", fck: 30e6, fcd: 30e6 / 1.5, fctm: 2.9e6, ecm: 33e9 };
    pub const C35_45: ConcreteGrade =
        ConcreteGrade { name: "C35/45", fck: 35e6, fcd: 35e6 / 1.5, fctm: 3.2e6, ecm: 34e9 };
}

/// Reinforcement grade, e.g. B500 weldable ribbed bar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReinforcementGrade {
    pub name: &'static str,
    pub fyk: f64,
    pub fyd: f64,
    pub es: f64,
}

impl ReinforcementGrade {
    pub const B500: ReinforcementGrade =
        ReinforcementGrade { name: "B500", fyk: 500e6, fyd: 500e6 / 1.15, es: 200e9 };
}

/// Standard EN 1992-1-1 bar diameter series, mm.
pub const BAR_DIAMETERS_MM: [f64; 11] = [6.0, 8.0, 10.0, 12.0, 14.0, 16.0, 20.0, 25.0, 28.0, 32.0, 40.0];

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_materials_have_expected_ids() {
        assert_eq!(Material::default_steel().id, 1);
        assert_eq!(Material::default_concrete().id, 2);
    }

    #[test]
    fn shear_modulus_from_isotropic_relation() {
        let m = Material::new(10, 210e9, 0.3, 7850.0);
        assert_relative_eq!(m.g(), 210e9 / 2.6, epsilon = 1e-3);
    }
}

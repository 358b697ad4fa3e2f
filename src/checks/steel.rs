//! EN 1993-1-1 steel cross-section, buckling, lateral-torsional buckling and
//! deflection unity checks.

use serde::{Deserialize, Serialize};

use crate::checks::CheckStatus;
use crate::model::{BeamSection, SteelGrade};
use crate::post::BeamForces;

/// Imperfection factors, Table 6.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucklingCurve {
    A0,
    A,
    B,
    C,
    D,
}

impl BucklingCurve {
    pub fn imperfection_factor(self) -> f64 {
        match self {
            BucklingCurve::A0 => 0.13,
            BucklingCurve::A => 0.21,
            BucklingCurve::B => 0.34,
            BucklingCurve::C => 0.49,
            BucklingCurve::D => 0.76,
        }
    }
}

/// `χ = 1/(Φ+√(Φ²−λ̄²))`, clamped to `≤ 1` (6.3.1.2 / 6.3.2.2, shared formula).
fn phi_chi(lambda_bar: f64, alpha: f64) -> (f64, f64) {
    let phi = 0.5 * (1.0 + alpha * (lambda_bar - 0.2) + lambda_bar * lambda_bar);
    let discriminant = (phi * phi - lambda_bar * lambda_bar).max(0.0);
    let chi = (1.0 / (phi + discriminant.sqrt())).min(1.0);
    (phi, chi)
}

/// Flexural buckling about the in-plane axis (6.3.1), evaluated when `NEd > 0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BucklingCheck {
    pub curve: BucklingCurve,
    pub n_cr: f64,
    pub lambda_bar: f64,
    pub phi: f64,
    pub chi: f64,
    pub n_b_rd: f64,
    pub uc: f64,
}

/// Lateral-torsional buckling (6.3.2), evaluated when `MEd > 0` and `Iz, It, Iw`
/// are available.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LtbCheck {
    pub curve: BucklingCurve,
    pub m_cr: f64,
    pub lambda_bar_lt: f64,
    pub chi_lt: f64,
    pub m_b_rd: f64,
    pub uc: f64,
}

/// Design forces and section/material data for one steel member check.
///
/// `n_ed`, `v_ed`, `m_ed` are the governing magnitudes, already maximised over
/// both ends and the internal stations: `max(|N1|,|N2|,|maxN|)` etc.
/// [`SteelCheckInputs::from_beam_forces`] derives them directly from
/// [`BeamForces`], whose `max_n/max_v/max_m` are themselves maxima over all
/// 21 stations including both ends.
#[derive(Debug, Clone, Copy)]
pub struct SteelCheckInputs<'a> {
    pub section: &'a BeamSection,
    pub grade: SteelGrade,
    pub e: f64,
    pub length: f64,
    pub n_ed: f64,
    pub v_ed: f64,
    pub m_ed: f64,
    pub max_deflection: Option<f64>,
    pub deflection_limit_divisor: f64,
}

impl<'a> SteelCheckInputs<'a> {
    pub fn from_beam_forces(
        section: &'a BeamSection,
        grade: SteelGrade,
        e: f64,
        length: f64,
        forces: &BeamForces,
        max_deflection: Option<f64>,
    ) -> Self {
        Self {
            section,
            grade,
            e,
            length,
            n_ed: forces.max_n,
            v_ed: forces.max_v,
            m_ed: forces.max_m,
            max_deflection,
            deflection_limit_divisor: 250.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoverningSteelCheck {
    Axial,
    Shear,
    Bending,
    BendingAxialInteraction,
    BendingShearInteraction,
    FlexuralBuckling,
    LateralTorsionalBuckling,
    Deflection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SteelCheckResult {
    pub n_t_rd: f64,
    pub n_c_rd: f64,
    pub m_c_rd: f64,
    pub v_c_rd: f64,
    pub uc_n: f64,
    pub uc_v: f64,
    pub uc_m: f64,
    pub uc_mn: f64,
    pub uc_mv: f64,
    pub buckling: Option<BucklingCheck>,
    pub ltb: Option<LtbCheck>,
    pub uc_deflection: Option<f64>,
    pub governing: GoverningSteelCheck,
    pub governing_uc: f64,
    pub status: CheckStatus,
}

/// Picks the flexural buckling curve from `h/b` and `tf`, Table 6.2 (rolled
/// I/H sections, buckling about the major axis — the only axis a planar
/// frame element can buckle about).
fn buckling_curve(section: &BeamSection) -> BucklingCurve {
    let Some(b) = section.b else { return BucklingCurve::B };
    let tf = section.tf.unwrap_or(0.0);
    if section.h / b > 1.2 {
        if tf <= 0.040 {
            BucklingCurve::A
        } else {
            BucklingCurve::B
        }
    } else {
        BucklingCurve::B
    }
}

fn flexural_buckling(inputs: &SteelCheckInputs) -> Option<BucklingCheck> {
    if inputs.n_ed <= 0.0 || inputs.length <= 0.0 {
        return None;
    }
    let fy = inputs.grade.fy;
    let n_cr = std::f64::consts::PI.powi(2) * inputs.e * inputs.section.i / inputs.length.powi(2);
    if n_cr <= 0.0 {
        return None;
    }
    let lambda_bar = (inputs.section.a * fy / n_cr).sqrt();
    let curve = buckling_curve(inputs.section);
    let (phi, chi) = phi_chi(lambda_bar, curve.imperfection_factor());
    let n_b_rd = chi * inputs.section.a * fy / inputs.grade.gamma_m1;
    Some(BucklingCheck { curve, n_cr, lambda_bar, phi, chi, n_b_rd, uc: inputs.n_ed / n_b_rd })
}

fn lateral_torsional_buckling(inputs: &SteelCheckInputs) -> Option<LtbCheck> {
    if inputs.m_ed <= 0.0 || inputs.length <= 0.0 {
        return None;
    }
    let section = inputs.section;
    let b = section.b?;
    let iz = section.iz?;
    let it = section.it?;
    let iw = section.iw?;
    let fy = inputs.grade.fy;
    let g = 81e9;
    let k = 1.0;
    let c1 = 1.0;
    let l = inputs.length;

    let term1 = c1 * std::f64::consts::PI.powi(2) * inputs.e * iz / (k * l).powi(2);
    let term2 = (iw / iz + (k * l).powi(2) * g * it / (std::f64::consts::PI.powi(2) * inputs.e * iz)).max(0.0);
    let m_cr = term1 * term2.sqrt();
    if m_cr <= 0.0 {
        return None;
    }

    let wy = section.elastic_modulus();
    let lambda_bar_lt = (wy * fy / m_cr).sqrt();
    let curve = if section.h / b > 2.0 { BucklingCurve::A } else { BucklingCurve::B };
    let (_, chi_lt) = phi_chi(lambda_bar_lt, curve.imperfection_factor());
    let m_b_rd = chi_lt * wy * fy / inputs.grade.gamma_m1;
    Some(LtbCheck { curve, m_cr, lambda_bar_lt, chi_lt, m_b_rd, uc: inputs.m_ed / m_b_rd })
}

/// Runs the full EN 1993-1-1 unity check suite for one member.
pub fn check(inputs: &SteelCheckInputs) -> SteelCheckResult {
    let section = inputs.section;
    let fy = inputs.grade.fy;
    let gamma_m0 = inputs.grade.gamma_m0;

    let n_t_rd = section.a * fy / gamma_m0;
    let n_c_rd = section.a * fy / gamma_m0;
    let m_c_rd = section.elastic_modulus() * fy / gamma_m0;
    let v_c_rd = section.shear_area() * (fy / 3.0_f64.sqrt()) / gamma_m0;

    let uc_n = inputs.n_ed / n_c_rd;
    let uc_v = inputs.v_ed / v_c_rd;
    let uc_m = inputs.m_ed / m_c_rd;
    let uc_mn = uc_n + uc_m;

    let uc_mv = if inputs.v_ed > 0.5 * v_c_rd {
        let rho = (2.0 * inputs.v_ed / v_c_rd - 1.0).powi(2);
        let m_v_rd = m_c_rd * (1.0 - rho);
        inputs.m_ed / m_v_rd
    } else {
        uc_m
    };

    let buckling = flexural_buckling(inputs);
    let ltb = lateral_torsional_buckling(inputs);
    let uc_deflection = inputs
        .max_deflection
        .map(|d| d.abs() / (inputs.length / inputs.deflection_limit_divisor));

    let mut governing = GoverningSteelCheck::Bending;
    let mut governing_uc = uc_m;
    let mut consider = |uc: f64, which: GoverningSteelCheck| {
        if uc > governing_uc {
            governing_uc = uc;
            governing = which;
        }
    };
    consider(uc_n, GoverningSteelCheck::Axial);
    consider(uc_v, GoverningSteelCheck::Shear);
    consider(uc_mn, GoverningSteelCheck::BendingAxialInteraction);
    consider(uc_mv, GoverningSteelCheck::BendingShearInteraction);
    if let Some(b) = &buckling {
        consider(b.uc, GoverningSteelCheck::FlexuralBuckling);
    }
    if let Some(l) = &ltb {
        consider(l.uc, GoverningSteelCheck::LateralTorsionalBuckling);
    }
    if let Some(d) = uc_deflection {
        consider(d, GoverningSteelCheck::Deflection);
    }

    SteelCheckResult {
        n_t_rd,
        n_c_rd,
        m_c_rd,
        v_c_rd,
        uc_n,
        uc_v,
        uc_m,
        uc_mn,
        uc_mv,
        buckling,
        ltb,
        uc_deflection,
        governing,
        governing_uc,
        status: CheckStatus::from_unity(governing_uc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ipe200() -> BeamSection {
        // IPE 200, h=200mm, b=100mm, tw=5.6mm, tf=8.5mm.
        BeamSection::wide_flange(0.200, 0.100, 0.0085, 0.0056)
    }

    #[test]
    fn s6_bending_and_shear_unity() {
        let section = ipe200();
        let inputs = SteelCheckInputs {
            section: &section,
            grade: SteelGrade::S235,
            e: 210e9,
            length: 6.0,
            n_ed: 0.0,
            v_ed: 30_000.0,
            m_ed: 45_000.0,
            max_deflection: None,
            deflection_limit_divisor: 250.0,
        };
        let result = check(&inputs);

        assert_relative_eq!(result.m_c_rd, section.elastic_modulus() * 235e6, epsilon = 1e-6);
        assert!(result.uc_m > 0.9 && result.uc_m < 1.1, "uc_m = {}", result.uc_m);
        assert!(result.uc_v < 0.2, "uc_v = {}", result.uc_v);
        assert_eq!(result.governing, GoverningSteelCheck::Bending);
        assert!(result.buckling.is_none(), "NEd = 0, buckling must be skipped");
    }

    #[test]
    fn doubling_forces_doubles_every_uc_except_shear_interaction() {
        let section = ipe200();
        let base = SteelCheckInputs {
            section: &section,
            grade: SteelGrade::S235,
            e: 210e9,
            length: 6.0,
            n_ed: 10_000.0,
            v_ed: 20_000.0,
            m_ed: 20_000.0,
            max_deflection: None,
            deflection_limit_divisor: 250.0,
        };
        let doubled = SteelCheckInputs { n_ed: 20_000.0, v_ed: 40_000.0, m_ed: 40_000.0, ..base };

        let r1 = check(&base);
        let r2 = check(&doubled);
        assert_relative_eq!(r2.uc_n, 2.0 * r1.uc_n, epsilon = 1e-9);
        assert_relative_eq!(r2.uc_v, 2.0 * r1.uc_v, epsilon = 1e-9);
        assert_relative_eq!(r2.uc_m, 2.0 * r1.uc_m, epsilon = 1e-9);
    }

    #[test]
    fn missing_warping_constant_skips_ltb_rather_than_defaulting_to_zero() {
        let section = BeamSection::new(5.38e-3, 8.36e-5, 0.3);
        let inputs = SteelCheckInputs {
            section: &section,
            grade: SteelGrade::S235,
            e: 210e9,
            length: 4.0,
            n_ed: 0.0,
            v_ed: 0.0,
            m_ed: 30_000.0,
            max_deflection: None,
            deflection_limit_divisor: 250.0,
        };
        let result = check(&inputs);
        assert!(result.ltb.is_none());
    }
}

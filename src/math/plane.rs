//! Plane-stress/strain continuum elements: the 3-node constant-strain
//! triangle (CST) and the 4-node isoparametric quadrilateral (Q4).
//!
//! The Q4 element uses a general bilinear isoparametric map driven by actual
//! node coordinates, integrated with a 2x2 Gauss rule.

use nalgebra::{Matrix2, Matrix3, SMatrix, SVector};
use serde::{Deserialize, Serialize};

pub type Mat3 = Matrix3<f64>;
pub type Mat6 = SMatrix<f64, 6, 6>;
pub type Vec6 = SVector<f64, 6>;
pub type Mat8 = SMatrix<f64, 8, 8>;
pub type Vec8 = SVector<f64, 8>;
pub type Mat9 = SMatrix<f64, 9, 9>;
pub type Mat12 = SMatrix<f64, 12, 12>;

/// Which in-plane condition the constitutive matrix represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaneCondition {
    Stress,
    Strain,
}

/// Plane-stress or plane-strain constitutive matrix `D`.
pub fn constitutive_matrix(e: f64, nu: f64, condition: PlaneCondition) -> Mat3 {
    match condition {
        PlaneCondition::Stress => {
            let factor = e / (1.0 - nu * nu);
            Mat3::new(
                factor, factor * nu, 0.0,
                factor * nu, factor, 0.0,
                0.0, 0.0, factor * (1.0 - nu) / 2.0,
            )
        }
        PlaneCondition::Strain => {
            let factor = e / ((1.0 + nu) * (1.0 - 2.0 * nu));
            Mat3::new(
                factor * (1.0 - nu), factor * nu, 0.0,
                factor * nu, factor * (1.0 - nu), 0.0,
                0.0, 0.0, factor * (1.0 - 2.0 * nu) / 2.0,
            )
        }
    }
}

fn triangle_area(x: &[f64; 3], y: &[f64; 3]) -> f64 {
    0.5 * ((x[1] - x[0]) * (y[2] - y[0]) - (x[2] - x[0]) * (y[1] - y[0]))
}

/// Constant strain-displacement matrix for a CST, and the (signed) area.
/// DOF order `[u1, v1, u2, v2, u3, v3]`.
pub fn cst_b_matrix(x: &[f64; 3], y: &[f64; 3]) -> (SMatrix<f64, 3, 6>, f64) {
    let area = triangle_area(x, y);
    let b = [y[1] - y[2], y[2] - y[0], y[0] - y[1]];
    let c = [x[2] - x[1], x[0] - x[2], x[1] - x[0]];

    let two_a = 2.0 * area;
    #[rustfmt::skip]
    let data = [
        b[0] / two_a, 0.0,          b[1] / two_a, 0.0,          b[2] / two_a, 0.0,
        0.0,          c[0] / two_a, 0.0,          c[1] / two_a, 0.0,          c[2] / two_a,
        c[0] / two_a, b[0] / two_a, c[1] / two_a, b[1] / two_a, c[2] / two_a, b[2] / two_a,
    ];
    (SMatrix::<f64, 3, 6>::from_row_slice(&data), area)
}

/// CST local stiffness: `Ke = t * A * B^T D B`.
pub fn cst_stiffness(x: &[f64; 3], y: &[f64; 3], d: &Mat3, thickness: f64) -> Mat6 {
    let (b, area) = cst_b_matrix(x, y);
    b.transpose() * d * b * (thickness * area.abs())
}

/// Stress recovery `sigma = D * B * u_e` (constant over the element).
pub fn cst_stress(x: &[f64; 3], y: &[f64; 3], d: &Mat3, u: &Vec6) -> SVector<f64, 3> {
    let (b, _) = cst_b_matrix(x, y);
    d * b * u
}

/// Von Mises equivalent stress from the 2D stress state `(sx, sy, txy)`.
pub fn von_mises(sx: f64, sy: f64, txy: f64) -> f64 {
    (sx * sx - sx * sy + sy * sy + 3.0 * txy * txy).sqrt()
}

/// Principal stresses `(s1, s2)` and the principal angle, via Mohr's circle.
pub fn principal_stresses(sx: f64, sy: f64, txy: f64) -> (f64, f64, f64) {
    let avg = (sx + sy) / 2.0;
    let radius = (((sx - sy) / 2.0).powi(2) + txy * txy).sqrt();
    let angle = 0.5 * (2.0 * txy).atan2(sx - sy);
    (avg + radius, avg - radius, angle)
}

const GAUSS_2X2: [(f64, f64); 4] = {
    let g = 0.5773502691896258; // 1/sqrt(3)
    [(-g, -g), (g, -g), (g, g), (-g, g)]
};

fn q4_shape_derivatives(r: f64, s: f64) -> ([f64; 4], [f64; 4], [f64; 4]) {
    let n = [
        (1.0 - r) * (1.0 - s) / 4.0,
        (1.0 + r) * (1.0 - s) / 4.0,
        (1.0 + r) * (1.0 + s) / 4.0,
        (1.0 - r) * (1.0 + s) / 4.0,
    ];
    let dn_dr = [-(1.0 - s) / 4.0, (1.0 - s) / 4.0, (1.0 + s) / 4.0, -(1.0 + s) / 4.0];
    let dn_ds = [-(1.0 - r) / 4.0, -(1.0 + r) / 4.0, (1.0 + r) / 4.0, (1.0 - r) / 4.0];
    (n, dn_dr, dn_ds)
}

fn q4_jacobian(x: &[f64; 4], y: &[f64; 4], dn_dr: &[f64; 4], dn_ds: &[f64; 4]) -> Matrix2<f64> {
    let dx_dr: f64 = dn_dr.iter().zip(x).map(|(d, xi)| d * xi).sum();
    let dy_dr: f64 = dn_dr.iter().zip(y).map(|(d, yi)| d * yi).sum();
    let dx_ds: f64 = dn_ds.iter().zip(x).map(|(d, xi)| d * xi).sum();
    let dy_ds: f64 = dn_ds.iter().zip(y).map(|(d, yi)| d * yi).sum();
    Matrix2::new(dx_dr, dy_dr, dx_ds, dy_ds)
}

/// B-matrix (3x8) at natural coordinates `(r, s)` for a general (convex,
/// counter-clockwise) quadrilateral, plus the Jacobian determinant.
pub fn q4_b_matrix(x: &[f64; 4], y: &[f64; 4], r: f64, s: f64) -> (SMatrix<f64, 3, 8>, f64) {
    let (_n, dn_dr, dn_ds) = q4_shape_derivatives(r, s);
    let j = q4_jacobian(x, y, &dn_dr, &dn_ds);
    let det = j.determinant();
    let j_inv = j.try_inverse().unwrap_or_else(Matrix2::identity);

    let mut dn_dx = [0.0; 4];
    let mut dn_dy = [0.0; 4];
    for i in 0..4 {
        // [dN/dx; dN/dy] = J^-1 * [dN/dr; dN/ds]
        dn_dx[i] = j_inv[(0, 0)] * dn_dr[i] + j_inv[(0, 1)] * dn_ds[i];
        dn_dy[i] = j_inv[(1, 0)] * dn_dr[i] + j_inv[(1, 1)] * dn_ds[i];
    }

    #[rustfmt::skip]
    let data = [
        dn_dx[0], 0.0,       dn_dx[1], 0.0,       dn_dx[2], 0.0,       dn_dx[3], 0.0,
        0.0,      dn_dy[0],  0.0,      dn_dy[1],  0.0,      dn_dy[2],  0.0,      dn_dy[3],
        dn_dy[0], dn_dx[0],  dn_dy[1], dn_dx[1],  dn_dy[2], dn_dx[2],  dn_dy[3], dn_dx[3],
    ];
    (SMatrix::<f64, 3, 8>::from_row_slice(&data), det)
}

/// Q4 local stiffness via 2x2 Gauss integration, weight 1 at each point.
pub fn q4_stiffness(x: &[f64; 4], y: &[f64; 4], d: &Mat3, thickness: f64) -> Mat8 {
    let mut k = Mat8::zeros();
    for &(r, s) in &GAUSS_2X2 {
        let (b, det) = q4_b_matrix(x, y, r, s);
        k += b.transpose() * d * b * (thickness * det.abs());
    }
    k
}

/// Stress recovery at the element centroid (`r = s = 0`).
pub fn q4_stress(x: &[f64; 4], y: &[f64; 4], d: &Mat3, u: &Vec8) -> SVector<f64, 3> {
    let (b, _) = q4_b_matrix(x, y, 0.0, 0.0);
    d * b * u
}

/// Pad an 8-DOF `(u,v)` quad matrix to 12 DOFs `(u,v,theta)` for mixed
/// beam/plate assembly: inserted theta rows/cols carry zero stiffness.
pub fn q4_expand_to_12(k8: &Mat8) -> Mat12 {
    let mut k12 = Mat12::zeros();
    let map = [0usize, 1, 3, 4, 6, 7, 9, 10];
    for (i, &gi) in map.iter().enumerate() {
        for (j, &gj) in map.iter().enumerate() {
            k12[(gi, gj)] = k8[(i, j)];
        }
    }
    k12
}

/// Pad a 6-DOF `(u,v)` triangle matrix to 9 DOFs `(u,v,theta)`, the CST
/// counterpart of [`q4_expand_to_12`] for mixed beam/plate assembly.
pub fn cst_expand_to_9(k6: &Mat6) -> Mat9 {
    let mut k9 = Mat9::zeros();
    let map = [0usize, 1, 3, 4, 6, 7];
    for (i, &gi) in map.iter().enumerate() {
        for (j, &gj) in map.iter().enumerate() {
            k9[(gi, gj)] = k6[(i, j)];
        }
    }
    k9
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cst_stiffness_is_symmetric() {
        let x = [0.0, 1.0, 0.0];
        let y = [0.0, 0.0, 1.0];
        let d = constitutive_matrix(210e9, 0.3, PlaneCondition::Stress);
        let k = cst_stiffness(&x, &y, &d, 0.01);
        for i in 0..6 {
            for j in 0..6 {
                assert_relative_eq!(k[(i, j)], k[(j, i)], epsilon = 1e-3);
            }
        }
    }

    #[test]
    fn q4_reduces_to_expected_symmetry_on_unit_square() {
        let x = [0.0, 1.0, 1.0, 0.0];
        let y = [0.0, 0.0, 1.0, 1.0];
        let d = constitutive_matrix(210e9, 0.3, PlaneCondition::Stress);
        let k = q4_stiffness(&x, &y, &d, 0.01);
        for i in 0..8 {
            for j in 0..8 {
                assert_relative_eq!(k[(i, j)], k[(j, i)], epsilon = 1e-3);
            }
        }
    }

    /// A skewed (trapezoidal) quad has a non-symmetric Jacobian, so a B-matrix
    /// built from J^-T instead of J^-1 would pass the unit-square test above
    /// but still be wrong here.
    #[test]
    fn q4_skewed_quad_stiffness_is_symmetric_and_passes_rigid_body_check() {
        let x = [0.0, 2.0, 1.5, 0.2];
        let y = [0.0, 0.0, 1.0, 1.2];
        let d = constitutive_matrix(210e9, 0.3, PlaneCondition::Stress);
        let k = q4_stiffness(&x, &y, &d, 0.01);

        for i in 0..8 {
            for j in 0..8 {
                assert_relative_eq!(k[(i, j)], k[(j, i)], epsilon = 1e-3);
            }
        }

        // Rigid-body translation in x (every node's u = 1, v = 0) must produce
        // zero nodal forces: Ke * u_rigid = 0. A swapped-derivative B-matrix
        // breaks this invariant for a non-rectangular quad.
        let u_rigid = Vec8::from_row_slice(&[1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
        let f = k * u_rigid;
        for i in 0..8 {
            assert_relative_eq!(f[i], 0.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn von_mises_uniaxial_matches_axial_stress() {
        assert_relative_eq!(von_mises(100.0, 0.0, 0.0), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn principal_stresses_match_uniaxial() {
        let (s1, s2, _) = principal_stresses(100.0, 0.0, 0.0);
        assert_relative_eq!(s1, 100.0, epsilon = 1e-9);
        assert_relative_eq!(s2, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn expanded_triangle_has_zero_theta_stiffness() {
        let x = [0.0, 1.0, 0.0];
        let y = [0.0, 0.0, 1.0];
        let d = constitutive_matrix(210e9, 0.3, PlaneCondition::Stress);
        let k6 = cst_stiffness(&x, &y, &d, 0.01);
        let k9 = cst_expand_to_9(&k6);
        for theta_row in [2, 5, 8] {
            for j in 0..9 {
                assert_relative_eq!(k9[(theta_row, j)], 0.0, epsilon = 1e-12);
            }
        }
    }
}

//! DKT (discrete Kirchhoff triangle) plate-bending element, Batoz–Bathe–Ho
//! formulation. 9 DOFs per element: `[w1, θx1, θy1, w2, θx2, θy2, w3, θx3, θy3]`.

use nalgebra::{Matrix3, SMatrix, SVector};

pub type Mat3 = Matrix3<f64>;
pub type Mat9 = SMatrix<f64, 9, 9>;
pub type Vec9 = SVector<f64, 9>;

/// Bending constitutive matrix `Db = E t^3 / (12(1-nu^2)) * [[1,nu,0],[nu,1,0],[0,0,(1-nu)/2]]`.
pub fn bending_constitutive_matrix(e: f64, nu: f64, t: f64) -> Mat3 {
    let factor = e * t.powi(3) / (12.0 * (1.0 - nu * nu));
    Mat3::new(
        factor, factor * nu, 0.0,
        factor * nu, factor, 0.0,
        0.0, 0.0, factor * (1.0 - nu) / 2.0,
    )
}

fn triangle_area(x: &[f64; 3], y: &[f64; 3]) -> f64 {
    0.5 * ((x[1] - x[0]) * (y[2] - y[0]) - (x[2] - x[0]) * (y[1] - y[0]))
}

struct SideParams {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
}

fn side_params(xk: f64, yk: f64, lk2: f64) -> SideParams {
    SideParams {
        a: -xk / lk2,
        b: 0.75 * xk * yk / lk2,
        c: (0.25 * xk * xk - 0.5 * yk * yk) / lk2,
        d: -yk / lk2,
        e: (0.25 * yk * yk - 0.5 * xk * xk) / lk2,
    }
}

/// B-matrix (3x9, curvatures `[kx, ky, kxy]`) at area coordinates
/// `(l1, l2, l3)`, plus the (signed) triangle area.
pub fn b_matrix(x: &[f64; 3], y: &[f64; 3], l1: f64, l2: f64, l3: f64) -> (SMatrix<f64, 3, 9>, f64) {
    let area = triangle_area(x, y);

    // Side 4: nodes 2-3. Side 5: nodes 3-1. Side 6: nodes 1-2.
    let x23 = x[1] - x[2];
    let y23 = y[1] - y[2];
    let l4_2 = x23 * x23 + y23 * y23;
    let x31 = x[2] - x[0];
    let y31 = y[2] - y[0];
    let l5_2 = x31 * x31 + y31 * y31;
    let x12 = x[0] - x[1];
    let y12 = y[0] - y[1];
    let l6_2 = x12 * x12 + y12 * y12;

    let s4 = side_params(x23, y23, l4_2);
    let s5 = side_params(x31, y31, l5_2);
    let s6 = side_params(x12, y12, l6_2);

    // Quadratic (6-node) shape functions and their area-coordinate derivatives.
    let n_dl1 = [4.0 * l1 - 1.0, 0.0, 0.0, 0.0, 4.0 * l3, 4.0 * l2];
    let n_dl2 = [0.0, 4.0 * l2 - 1.0, 0.0, 4.0 * l3, 0.0, 4.0 * l1];
    let n_dl3 = [0.0, 0.0, 4.0 * l3 - 1.0, 4.0 * l2, 4.0 * l1, 0.0];
    // index order: [N1, N2, N3, N4, N5, N6]

    let hx_dl = |dn: &[f64; 6]| -> [f64; 9] {
        let (n1, n2, n3, n4, n5, n6) = (dn[0], dn[1], dn[2], dn[3], dn[4], dn[5]);
        [
            1.5 * (s6.a * n6 - s5.a * n5),
            s5.b * n5 + s6.b * n6,
            n1 - s5.c * n5 - s6.c * n6,
            1.5 * (s4.a * n4 - s6.a * n6),
            s6.b * n6 + s4.b * n4,
            n2 - s6.c * n6 - s4.c * n4,
            1.5 * (s5.a * n5 - s4.a * n4),
            s4.b * n4 + s5.b * n5,
            n3 - s4.c * n4 - s5.c * n5,
        ]
    };
    let hy_dl = |dn: &[f64; 6]| -> [f64; 9] {
        let (n1, n2, n3, n4, n5, n6) = (dn[0], dn[1], dn[2], dn[3], dn[4], dn[5]);
        [
            1.5 * (s6.d * n6 - s5.d * n5),
            -n1 + s5.e * n5 + s6.e * n6,
            -s5.b * n5 - s6.b * n6,
            1.5 * (s4.d * n4 - s6.d * n6),
            -n2 + s6.e * n6 + s4.e * n4,
            -s6.b * n6 - s4.b * n4,
            1.5 * (s5.d * n5 - s4.d * n4),
            -n3 + s4.e * n4 + s5.e * n5,
            -s4.b * n4 - s5.b * n5,
        ]
    };

    let hx_dl1 = hx_dl(&n_dl1);
    let hx_dl2 = hx_dl(&n_dl2);
    let hx_dl3 = hx_dl(&n_dl3);
    let hy_dl1 = hy_dl(&n_dl1);
    let hy_dl2 = hy_dl(&n_dl2);
    let hy_dl3 = hy_dl(&n_dl3);

    let two_a = 2.0 * area;
    let dl_dx = [y23 / two_a, y31 / two_a, y12 / two_a];
    let dl_dy = [-x23 / two_a, -x31 / two_a, -x12 / two_a];

    let mut data = [0.0; 27];
    for m in 0..9 {
        let hx_x = hx_dl1[m] * dl_dx[0] + hx_dl2[m] * dl_dx[1] + hx_dl3[m] * dl_dx[2];
        let hx_y = hx_dl1[m] * dl_dy[0] + hx_dl2[m] * dl_dy[1] + hx_dl3[m] * dl_dy[2];
        let hy_x = hy_dl1[m] * dl_dx[0] + hy_dl2[m] * dl_dx[1] + hy_dl3[m] * dl_dx[2];
        let hy_y = hy_dl1[m] * dl_dy[0] + hy_dl2[m] * dl_dy[1] + hy_dl3[m] * dl_dy[2];

        data[m] = hx_x;
        data[9 + m] = hy_y;
        data[18 + m] = hx_y + hy_x;
    }

    (SMatrix::<f64, 3, 9>::from_row_slice(&data), area)
}

/// Three-point Gauss rule on area coordinates, weight 1/3 each.
pub const GAUSS_POINTS: [(f64, f64, f64); 3] = [
    (2.0 / 3.0, 1.0 / 6.0, 1.0 / 6.0),
    (1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0),
    (1.0 / 6.0, 1.0 / 6.0, 2.0 / 3.0),
];

/// Element bending stiffness `Ke = A * sum_gp w_gp * Bb^T Db Bb`.
pub fn stiffness(x: &[f64; 3], y: &[f64; 3], db: &Mat3) -> Mat9 {
    let mut k = Mat9::zeros();
    let area = triangle_area(x, y).abs();
    for &(l1, l2, l3) in &GAUSS_POINTS {
        let (b, _) = b_matrix(x, y, l1, l2, l3);
        k += b.transpose() * db * b * (area / 3.0);
    }
    k
}

/// Centroidal moments `{mx, my, mxy} = Db * Bb(1/3, 1/3, 1/3) * u_e`.
pub fn centroidal_moments(x: &[f64; 3], y: &[f64; 3], db: &Mat3, u: &Vec9) -> SVector<f64, 3> {
    let (b, _) = b_matrix(x, y, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0);
    db * b * u
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn stiffness_is_symmetric() {
        let x = [0.0, 1.0, 0.0];
        let y = [0.0, 0.0, 1.0];
        let db = bending_constitutive_matrix(30e9, 0.2, 0.2);
        let k = stiffness(&x, &y, &db);
        for i in 0..9 {
            for j in 0..9 {
                assert_relative_eq!(k[(i, j)], k[(j, i)], epsilon = 1e-2);
            }
        }
    }

    #[test]
    fn stiffness_has_three_rigid_body_zero_modes() {
        // Rigid translation in w (all w=1, rotations 0) must produce zero force.
        let x = [0.0, 2.0, 0.5];
        let y = [0.0, 0.3, 1.7];
        let db = bending_constitutive_matrix(30e9, 0.2, 0.2);
        let k = stiffness(&x, &y, &db);
        let mut rigid = Vec9::zeros();
        rigid[0] = 1.0;
        rigid[3] = 1.0;
        rigid[6] = 1.0;
        let f = k * rigid;
        for i in 0..9 {
            assert_relative_eq!(f[i], 0.0, epsilon = 1e-3);
        }
    }
}

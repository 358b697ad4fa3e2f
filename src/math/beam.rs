//! 2D Euler–Bernoulli frame element: local stiffness, transformation,
//! equivalent nodal load kernels, end-release condensation, and internal
//! force recovery along the member.
//!
//! DOF order, both local and global: `[u1, v1, θ1, u2, v2, θ2]`.

use nalgebra::{DMatrix, DVector, SMatrix, SVector};

use super::simpson;

pub type Mat6 = SMatrix<f64, 6, 6>;
pub type Vec6 = SVector<f64, 6>;

/// Local 6x6 stiffness for a prismatic Euler–Bernoulli beam.
pub fn local_stiffness(e: f64, a: f64, i: f64, l: f64) -> Mat6 {
    let l2 = l * l;
    let l3 = l2 * l;

    let ea_l = e * a / l;
    let ei_l3 = 12.0 * e * i / l3;
    let ei_l2 = 6.0 * e * i / l2;
    let ei_l = e * i / l;

    #[rustfmt::skip]
    let data = [
        ea_l,   0.0,        0.0,         -ea_l,  0.0,        0.0,
        0.0,    ei_l3,      ei_l2,        0.0,   -ei_l3,     ei_l2,
        0.0,    ei_l2,      4.0*ei_l,     0.0,   -ei_l2,     2.0*ei_l,
        -ea_l,  0.0,        0.0,          ea_l,  0.0,        0.0,
        0.0,   -ei_l3,     -ei_l2,        0.0,    ei_l3,    -ei_l2,
        0.0,    ei_l2,      2.0*ei_l,     0.0,   -ei_l2,     4.0*ei_l,
    ];

    Mat6::from_row_slice(&data)
}

/// Transformation from local to global coordinates: rotates `(u, v)` at each
/// node by `alpha = atan2(dy, dx)`; `θ` is unaffected.
pub fn transformation_matrix(alpha: f64) -> Mat6 {
    let c = alpha.cos();
    let s = alpha.sin();

    #[rustfmt::skip]
    let data = [
        c,   s,   0.0,  0.0,  0.0, 0.0,
        -s,  c,   0.0,  0.0,  0.0, 0.0,
        0.0, 0.0, 1.0,  0.0,  0.0, 0.0,
        0.0, 0.0, 0.0,  c,    s,   0.0,
        0.0, 0.0, 0.0,  -s,   c,   0.0,
        0.0, 0.0, 0.0,  0.0,  0.0, 1.0,
    ];

    Mat6::from_row_slice(&data)
}

/// Project a distributed load given in global axes onto the member's local
/// axes, given the member angle `alpha`.
pub fn project_to_local(alpha: f64, qx_global: f64, qy_global: f64) -> (f64, f64) {
    let c = alpha.cos();
    let s = alpha.sin();
    let qx_local = qx_global * c + qy_global * s;
    let qy_local = -qx_global * s + qy_global * c;
    (qx_local, qy_local)
}

/// Static condensation of a released local stiffness matrix via the Schur
/// complement `K11 - K12 * inv(K22) * K21`.
pub fn apply_releases(k: &Mat6, released: &[bool; 6]) -> Mat6 {
    let keep: std::vec::Vec<usize> = (0..6).filter(|&i| !released[i]).collect();
    let drop: std::vec::Vec<usize> = (0..6).filter(|&i| released[i]).collect();

    if drop.is_empty() {
        return *k;
    }

    let n1 = keep.len();
    let n2 = drop.len();

    let mut k11 = DMatrix::zeros(n1, n1);
    let mut k12 = DMatrix::zeros(n1, n2);
    let mut k21 = DMatrix::zeros(n2, n1);
    let mut k22 = DMatrix::zeros(n2, n2);

    for (i, &ki) in keep.iter().enumerate() {
        for (j, &kj) in keep.iter().enumerate() {
            k11[(i, j)] = k[(ki, kj)];
        }
        for (j, &dj) in drop.iter().enumerate() {
            k12[(i, j)] = k[(ki, dj)];
        }
    }
    for (i, &di) in drop.iter().enumerate() {
        for (j, &kj) in keep.iter().enumerate() {
            k21[(i, j)] = k[(di, kj)];
        }
        for (j, &dj) in drop.iter().enumerate() {
            k22[(i, j)] = k[(di, dj)];
        }
    }

    let k22_inv = match k22.clone().try_inverse() {
        Some(inv) => inv,
        None => return *k,
    };

    let condensed = &k11 - &k12 * &k22_inv * &k21;

    let mut result = Mat6::zeros();
    for (i, &ki) in keep.iter().enumerate() {
        for (j, &kj) in keep.iter().enumerate() {
            result[(ki, kj)] = condensed[(i, j)];
        }
    }
    result
}

/// Static condensation of the equivalent nodal load vector for the same
/// released DOFs, using the *uncondensed* local stiffness. Must be applied
/// before `k` itself is condensed.
pub fn apply_fer_releases(fer: &Vec6, k: &Mat6, released: &[bool; 6]) -> Vec6 {
    let keep: std::vec::Vec<usize> = (0..6).filter(|&i| !released[i]).collect();
    let drop: std::vec::Vec<usize> = (0..6).filter(|&i| released[i]).collect();

    if drop.is_empty() {
        return *fer;
    }

    let n1 = keep.len();
    let n2 = drop.len();

    let mut k12 = DMatrix::zeros(n1, n2);
    let mut k22 = DMatrix::zeros(n2, n2);
    for (i, &ki) in keep.iter().enumerate() {
        for (j, &dj) in drop.iter().enumerate() {
            k12[(i, j)] = k[(ki, dj)];
        }
    }
    for (i, &di) in drop.iter().enumerate() {
        for (j, &dj) in drop.iter().enumerate() {
            k22[(i, j)] = k[(di, dj)];
        }
    }

    let mut fer1 = DVector::zeros(n1);
    let mut fer2 = DVector::zeros(n2);
    for (i, &ki) in keep.iter().enumerate() {
        fer1[i] = fer[ki];
    }
    for (i, &di) in drop.iter().enumerate() {
        fer2[i] = fer[di];
    }

    let k22_inv = match k22.clone().try_inverse() {
        Some(inv) => inv,
        None => return *fer,
    };

    let condensed = &fer1 - &k12 * &k22_inv * &fer2;

    let mut result = Vec6::zeros();
    for (i, &ki) in keep.iter().enumerate() {
        result[ki] = condensed[i];
    }
    result
}

/// Equivalent nodal loads for a full-span uniform load (local axes).
pub fn fer_uniform(qx: f64, qy: f64, l: f64) -> Vec6 {
    Vec6::new(
        qx * l / 2.0,
        qy * l / 2.0,
        qy * l * l / 12.0,
        qx * l / 2.0,
        qy * l / 2.0,
        -qy * l * l / 12.0,
    )
}

/// Equivalent nodal loads for a full-span trapezoidal load: superposes the
/// uniform component `q_start` with the triangular component `q_end - q_start`.
pub fn fer_trapezoidal(qx_start: f64, qx_end: f64, qy_start: f64, qy_end: f64, l: f64) -> Vec6 {
    let uniform = fer_uniform(qx_start, qy_start, l);
    let dqx = qx_end - qx_start;
    let dqy = qy_end - qy_start;

    let triangular = Vec6::new(
        dqx * l / 6.0,
        3.0 * dqy * l / 20.0,
        dqy * l * l / 30.0,
        dqx * l / 3.0,
        7.0 * dqy * l / 20.0,
        -dqy * l * l / 20.0,
    );

    uniform + triangular
}

fn hermite_antideriv(x: f64, l: f64) -> [f64; 4] {
    let l2 = l * l;
    let l3 = l2 * l;
    let x2 = x * x;
    let x3 = x2 * x;
    let x4 = x3 * x;
    [
        x - x3 / l2 + x4 / (2.0 * l3),
        x2 / 2.0 - 2.0 * x3 / (3.0 * l) + x4 / (4.0 * l2),
        x3 / l2 - x4 / (2.0 * l3),
        -x3 / (3.0 * l) + x4 / (4.0 * l2),
    ]
}

fn axial_antideriv(x: f64, l: f64) -> [f64; 2] {
    [x - x * x / (2.0 * l), x * x / (2.0 * l)]
}

/// Equivalent nodal loads for a uniform load acting only over `[a, b]`
/// (`0 <= a < b <= l`), by analytically integrating the Hermite (transverse)
/// and linear (axial) shape functions over the loaded span.
pub fn fer_partial_uniform(qx: f64, qy: f64, a: f64, b: f64, l: f64) -> Vec6 {
    let [n1a, n2a, n3a, n4a] = hermite_antideriv(a, l);
    let [n1b, n2b, n3b, n4b] = hermite_antideriv(b, l);
    let [m1a, m2a] = axial_antideriv(a, l);
    let [m1b, m2b] = axial_antideriv(b, l);

    Vec6::new(
        qx * (m1b - m1a),
        qy * (n1b - n1a),
        qy * (n2b - n2a),
        qx * (m2b - m2a),
        qy * (n3b - n3a),
        qy * (n4b - n4a),
    )
}

/// Equivalent nodal loads for a trapezoidal load acting only over `[a, b]`,
/// via Simpson's rule with 20 sub-intervals integrating `q(x) * N_i(x)`.
pub fn fer_partial_trapezoidal(
    qx_start: f64,
    qx_end: f64,
    qy_start: f64,
    qy_end: f64,
    a: f64,
    b: f64,
    l: f64,
) -> Vec6 {
    let span = b - a;
    if span <= 0.0 {
        return Vec6::zeros();
    }
    let qy_at = |x: f64| {
        let t = (x - a) / span;
        qy_start + (qy_end - qy_start) * t
    };
    let qx_at = |x: f64| {
        let t = (x - a) / span;
        qx_start + (qx_end - qx_start) * t
    };

    let n1 = |x: f64| 1.0 - 3.0 * (x / l).powi(2) + 2.0 * (x / l).powi(3);
    let n2 = |x: f64| x - 2.0 * x * x / l + x * x * x / (l * l);
    let n3 = |x: f64| 3.0 * (x / l).powi(2) - 2.0 * (x / l).powi(3);
    let n4 = |x: f64| -x * x / l + x * x * x / (l * l);
    let m1 = |x: f64| 1.0 - x / l;
    let m2 = |x: f64| x / l;

    Vec6::new(
        simpson(|u| qx_at(a + u) * m1(a + u), span, 20),
        simpson(|u| qy_at(a + u) * n1(a + u), span, 20),
        simpson(|u| qy_at(a + u) * n2(a + u), span, 20),
        simpson(|u| qx_at(a + u) * m2(a + u), span, 20),
        simpson(|u| qy_at(a + u) * n3(a + u), span, 20),
        simpson(|u| qy_at(a + u) * n4(a + u), span, 20),
    )
}

/// Equivalent nodal loads for a concentrated transverse load `py` at local
/// position `x`: `Py * N_i(x)` for the same Hermite shape functions used in
/// [`fer_partial_trapezoidal`]. Spec.md's closed-form list (uniform,
/// trapezoidal, partial) doesn't enumerate point loads separately, but the
/// data model carries `BeamElement::point_loads`; this is the standard
/// consistent-load extension of the same Hermite basis.
pub fn fer_point_transverse(py: f64, x: f64, l: f64) -> Vec6 {
    let n1 = 1.0 - 3.0 * (x / l).powi(2) + 2.0 * (x / l).powi(3);
    let n2 = x - 2.0 * x * x / l + x * x * x / (l * l);
    let n3 = 3.0 * (x / l).powi(2) - 2.0 * (x / l).powi(3);
    let n4 = -x * x / l + x * x * x / (l * l);
    Vec6::new(0.0, py * n1, py * n2, 0.0, py * n3, py * n4)
}

/// Equivalent nodal loads for a concentrated axial load `px` at local
/// position `x`, via the linear axial shape functions.
pub fn fer_point_axial(px: f64, x: f64, l: f64) -> Vec6 {
    Vec6::new(px * (1.0 - x / l), 0.0, 0.0, px * (x / l), 0.0, 0.0)
}

/// Equivalent nodal loads for a uniform temperature rise `delta_t` (no
/// moments); "equal and opposite" axial forces at the two ends.
pub fn fer_thermal_uniform(e: f64, a: f64, alpha: f64, delta_t: f64) -> Vec6 {
    let n_th = e * a * alpha * delta_t;
    Vec6::new(-n_th, 0.0, 0.0, n_th, 0.0, 0.0)
}

/// Equivalent nodal loads for a thermal gradient between the top and bottom
/// fibres, section depth `h`: axial term from the mean rise plus fixed-end
/// moments from the gradient.
pub fn fer_thermal_gradient(
    e: f64,
    a: f64,
    i: f64,
    alpha: f64,
    delta_t_top: f64,
    delta_t_bot: f64,
    h: f64,
) -> Vec6 {
    let mean = (delta_t_top + delta_t_bot) / 2.0;
    let mut fer = fer_thermal_uniform(e, a, alpha, mean);
    let m_th = e * i * alpha * (delta_t_top - delta_t_bot) / h;
    fer[2] = -m_th;
    fer[5] = m_th;
    fer
}

/// A piecewise-linear distributed load acting on `[a, b] ⊆ [0, l]` in local
/// axes; zero outside the span.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistributedSpan {
    pub qx_start: f64,
    pub qx_end: f64,
    pub qy_start: f64,
    pub qy_end: f64,
    pub a: f64,
    pub b: f64,
}

/// A concentrated point load at local position `x` along the member.
#[derive(Debug, Clone, Copy)]
pub struct PointLoad {
    pub x: f64,
    pub px: f64,
    pub py: f64,
}

fn dist_integral_1(start: f64, end: f64, a: f64, b: f64, x: f64) -> f64 {
    if x <= a || b <= a {
        return 0.0;
    }
    let c = x.min(b);
    let u = c - a;
    let span = b - a;
    let slope = (end - start) / span;
    start * u + slope * u * u / 2.0
}

fn dist_integral_2(start: f64, end: f64, a: f64, b: f64, x: f64) -> f64 {
    if x <= a || b <= a {
        return 0.0;
    }
    let c = x.min(b);
    let u = c - a;
    let span = b - a;
    let slope = (end - start) / span;
    let big_x = x - a;
    start * big_x * u + (slope * big_x - start) * u * u / 2.0 - slope * u * u * u / 3.0
}

/// Internal forces at one of the 21 equispaced stations.
#[derive(Debug, Clone, Copy)]
pub struct Station {
    pub x: f64,
    pub n: f64,
    pub v: f64,
    pub m: f64,
}

/// Internal force diagrams at 21 equispaced stations along the member.
///
/// `n1`, `v1`, `m1` are the local end forces at node 1 (`m1` already carrying
/// the sign flip relative to the stiffness-computed `f_local[2]`, per the
/// sagging-positive convention). Axial force is positive in tension; shear
/// positive causes clockwise rotation of the element; moment positive gives
/// tension on the bottom fibre.
pub fn stations(
    l: f64,
    n1: f64,
    v1: f64,
    m1: f64,
    axial: DistributedSpan,
    transverse: DistributedSpan,
    points: &[PointLoad],
) -> [Station; 21] {
    let mut out = [Station { x: 0.0, n: 0.0, v: 0.0, m: 0.0 }; 21];
    for (i, station) in out.iter_mut().enumerate() {
        let x = l * i as f64 / 20.0;

        let axial_points: f64 = points.iter().filter(|p| p.x <= x).map(|p| p.px).sum();
        let transverse_points: f64 = points.iter().filter(|p| p.x <= x).map(|p| p.py).sum();
        let moment_points: f64 = points
            .iter()
            .filter(|p| p.x <= x)
            .map(|p| p.py * (x - p.x))
            .sum();

        let n = n1 + dist_integral_1(axial.qx_start, axial.qx_end, axial.a, axial.b, x) - axial_points;
        let v = v1
            + dist_integral_1(transverse.qy_start, transverse.qy_end, transverse.a, transverse.b, x)
            - transverse_points;
        let m = m1 + v1 * x
            + dist_integral_2(transverse.qy_start, transverse.qy_end, transverse.a, transverse.b, x)
            - moment_points;

        *station = Station { x, n, v, m };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn stiffness_is_symmetric() {
        let k = local_stiffness(210e9, 5.38e-3, 8.36e-5, 2.0);
        for i in 0..6 {
            for j in 0..6 {
                assert_relative_eq!(k[(i, j)], k[(j, i)], epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn cantilever_tip_deflection_matches_closed_form() {
        // S1: cantilever, fixed at node 1, point load at node 2.
        let e = 210e9;
        let a = 5.38e-3;
        let i = 8.36e-5;
        let l = 2.0;
        let k = local_stiffness(e, a, i, l);

        // Retain v2, theta2 (indices 4, 5); u1,v1,theta1,u2 are fixed/zero.
        let k_red = DMatrix::from_row_slice(
            2,
            2,
            &[k[(4, 4)], k[(4, 5)], k[(5, 4)], k[(5, 5)]],
        );
        let f = DVector::from_vec(vec![-10000.0, 0.0]);
        let lu = k_red.lu();
        let u = lu.solve(&f).unwrap();

        let expected = -10000.0 * l * l * l / (3.0 * e * i);
        assert_relative_eq!(u[0], expected, epsilon = 1e-3 * expected.abs());
    }

    #[test]
    fn uniform_reduces_trapezoidal_when_equal_ends() {
        let u = fer_uniform(1.0, 2.0, 3.0);
        let t = fer_trapezoidal(1.0, 1.0, 2.0, 2.0, 3.0);
        for i in 0..6 {
            assert_relative_eq!(u[i], t[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn partial_full_span_matches_uniform() {
        let full = fer_uniform(1.0, 2.0, 4.0);
        let partial = fer_partial_uniform(1.0, 2.0, 0.0, 4.0, 4.0);
        for i in 0..6 {
            assert_relative_eq!(full[i], partial[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn point_transverse_load_at_midspan_splits_evenly() {
        let fer = fer_point_transverse(-1000.0, 2.0, 4.0);
        assert_relative_eq!(fer[1], fer[4], epsilon = 1e-9);
        assert_relative_eq!(fer[2], -fer[5], epsilon = 1e-9);
    }

    #[test]
    fn releases_are_noop_with_no_releases() {
        let k = local_stiffness(210e9, 5.38e-3, 8.36e-5, 2.0);
        let k2 = apply_releases(&k, &[false; 6]);
        for i in 0..6 {
            for j in 0..6 {
                assert_relative_eq!(k[(i, j)], k2[(i, j)], epsilon = 1e-9);
            }
        }
    }
}

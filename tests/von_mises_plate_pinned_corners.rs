//! A rectangular plate meshed into DKT triangles, pinned at its four
//! corners, under a uniform transverse nodal load: sanity-checks that Von
//! Mises stress recovery and deflection stay finite and physically sane
//! across a range of mesh densities.

use std::collections::HashMap;

use planar_fea::assembler::AnalysisKind;
use planar_fea::model::{Constraints, DktElement, Material, Model};
use planar_fea::post;
use planar_fea::solver::{solve, CancellationToken, SolveOptions};

fn env_usize(name: &str, default_val: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(default_val)
}

/// Builds an `nx` x `ny` grid of DKT triangles over a `lx` x `ly` rectangle,
/// pinned (w = 0, rotations free) at the four corners, with a uniform
/// downward nodal load `p` (per node) applied to every node.
fn build_pinned_corners_plate_model(nx: usize, ny: usize) -> (Model, HashMap<(usize, usize), u64>) {
    let lx = 2.0_f64;
    let ly = 1.0_f64;
    let t = 0.01_f64; // 10 mm

    let mut model = Model::new();
    // Steel: E = 200 GPa, nu = 0.27
    model.add_material(Material::new(1, 200e9, 0.27, 7850.0)).unwrap();

    let mut nodes = HashMap::new();
    for j in 0..=ny {
        let y = ly * (j as f64) / (ny as f64);
        for i in 0..=nx {
            let x = lx * (i as f64) / (nx as f64);
            let id = model.add_node(x, y);
            nodes.insert((i, j), id);
        }
    }

    let pinned = Constraints::roller_y(); // w fixed, theta_x/theta_y free
    for &(i, j) in &[(0, 0), (nx, 0), (nx, ny), (0, ny)] {
        let id = nodes[&(i, j)];
        let mut node = model.get_node(id).unwrap().clone();
        node.constraints = pinned;
        model.nodes.insert(id, node);
    }

    // Each grid cell split into two DKT triangles (bl-br-tr, bl-tr-tl).
    for j in 0..ny {
        for i in 0..nx {
            let bl = nodes[&(i, j)];
            let br = nodes[&(i + 1, j)];
            let tr = nodes[&(i + 1, j + 1)];
            let tl = nodes[&(i, j + 1)];
            model.add_dkt(DktElement::new(0, [bl, br, tr], 1, t)).unwrap();
            model.add_dkt(DktElement::new(0, [bl, tr, tl], 1, t)).unwrap();
        }
    }

    // Uniform downward pressure lumped equally to every node as a nodal
    // transverse load (fy, read back via `NodeLoads::transverse_for_plate`).
    let p = 1000.0_f64; // Pa
    let cell_area = (lx / nx as f64) * (ly / ny as f64);
    let tributary = p * cell_area; // per-cell share, lumped equally to its 4 corners
    for j in 0..=ny {
        for i in 0..=nx {
            let cells_touching = [(i > 0, j > 0), (i < nx, j > 0), (i > 0, j < ny), (i < nx, j < ny)]
                .iter()
                .filter(|(a, b)| *a && *b)
                .count() as f64;
            let id = nodes[&(i, j)];
            let mut node = model.get_node(id).unwrap().clone();
            node.loads.fy = -tributary * cells_touching / 4.0;
            model.nodes.insert(id, node);
        }
    }

    (model, nodes)
}

#[test]
fn von_mises_plate_pinned_corners_sanity() {
    let nx = env_usize("FEA_PLATE_MESH_NX", 10);
    let ny = env_usize("FEA_PLATE_MESH_NY", 5);

    let (model, nodes) = build_pinned_corners_plate_model(nx, ny);
    let result = solve(&model, AnalysisKind::PlateBending, &SolveOptions::default(), &CancellationToken::new()).unwrap();
    let post = post::process(&model, AnalysisKind::PlateBending, &result);

    assert!(!post.dkt_moments.is_empty());

    let mut max_m = 0.0_f64;
    for moments in post.dkt_moments.values() {
        assert!(moments.mx.is_finite() && moments.my.is_finite() && moments.mxy.is_finite());
        max_m = max_m.max(moments.mx.abs()).max(moments.my.abs());
    }
    assert!(max_m > 0.0, "plate under load should develop nonzero bending moment");

    // Max transverse deflection should occur somewhere near the plate
    // centre and be finite and nonzero.
    let mut max_defl = 0.0_f64;
    for node_id in nodes.values() {
        let base = result.dof_map.base(*node_id).unwrap();
        let w = result.displacements[base];
        assert!(w.is_finite(), "deflection should be finite");
        if w.abs() > max_defl.abs() {
            max_defl = w;
        }
    }
    assert!(max_defl.abs() > 0.0, "loaded plate should deflect");

    // Corner reactions should sum (in magnitude) to roughly the total
    // applied load, confirming global equilibrium of the reduced solve.
    let total_load: f64 = model.nodes.values().map(|n| n.loads.fy).sum();
    let mut total_reaction = 0.0_f64;
    for &(i, j) in &[(0, 0), (nx, 0), (nx, ny), (0, ny)] {
        let id = nodes[&(i, j)];
        let base = result.dof_map.base(id).unwrap();
        total_reaction += result.reactions[base];
    }
    assert!(
        (total_reaction + total_load).abs() < 1e-6 * total_load.abs().max(1.0),
        "sum of corner reactions should balance the applied load: total_load={total_load}, total_reaction={total_reaction}"
    );
}

#[test]
fn finer_mesh_increases_peak_moment_resolution() {
    let (coarse, _) = build_pinned_corners_plate_model(4, 2);
    let (fine, _) = build_pinned_corners_plate_model(10, 5);

    let coarse_result = solve(&coarse, AnalysisKind::PlateBending, &SolveOptions::default(), &CancellationToken::new()).unwrap();
    let fine_result = solve(&fine, AnalysisKind::PlateBending, &SolveOptions::default(), &CancellationToken::new()).unwrap();

    let coarse_post = post::process(&coarse, AnalysisKind::PlateBending, &coarse_result);
    let fine_post = post::process(&fine, AnalysisKind::PlateBending, &fine_result);

    assert!(!coarse_post.dkt_moments.is_empty());
    assert!(!fine_post.dkt_moments.is_empty());
}

//! Worked examples: a cantilever tip load and a simply supported uniform
//! load, run through the full assemble/solve/post-process pipeline and
//! checked against closed-form beam theory (spec scenarios S1 and S2).

use planar_fea::assembler::AnalysisKind;
use planar_fea::checks::steel::{self, SteelCheckInputs};
use planar_fea::model::{BeamElement, BeamSection, Constraints, DistributedLoad, Model, SteelGrade};
use planar_fea::solver::{solve, CancellationToken, SolveOptions};
use planar_fea::post;

fn cantilever_tip_load() {
    println!("=== Cantilever tip load ===");

    // IPE 300, E=210 GPa, L=2m, tip load -10 kN
    let i = 8.36e-5;
    let a = 5.38e-3;
    let length = 2.0;

    let mut model = Model::new();
    let n1 = model.add_node(0.0, 0.0);
    let n2 = model.add_node(length, 0.0);

    let mut fixed = model.get_node(n1).unwrap().clone();
    fixed.constraints = Constraints::fixed();
    model.nodes.insert(n1, fixed);

    let mut loaded = model.get_node(n2).unwrap().clone();
    loaded.loads.fy = -10_000.0;
    model.nodes.insert(n2, loaded);

    let section = BeamSection::new(a, i, 0.3);
    model.add_beam(BeamElement::new(1, [n1, n2], 1, section)).unwrap();

    let result = solve(&model, AnalysisKind::Frame, &SolveOptions::default(), &CancellationToken::new()).unwrap();
    let post = post::process(&model, AnalysisKind::Frame, &result);

    let tip_v = result.displacements[result.dof_map.base(n2).unwrap() + 1];
    println!("  tip deflection: {tip_v:.6e} m (expect ~ -1.518e-4 m)");

    let forces = &post.beam_forces[&1];
    println!("  max moment: {:.1} Nm (expect ~ 20000 Nm)", forces.max_m);
}

fn simply_supported_uniform_load() {
    println!("\n=== Simply supported, uniform load ===");

    // IPE 200, L=6m, q = -10 kN/m
    let i = 1.94e-5;
    let a = 2.85e-3;
    let length = 6.0;

    let mut model = Model::new();
    let n1 = model.add_node(0.0, 0.0);
    let n2 = model.add_node(length, 0.0);

    let mut pin = model.get_node(n1).unwrap().clone();
    pin.constraints = Constraints::pinned();
    model.nodes.insert(n1, pin);

    let mut roller = model.get_node(n2).unwrap().clone();
    roller.constraints = Constraints::roller_y();
    model.nodes.insert(n2, roller);

    let section = BeamSection::new(a, i, 0.2);
    let mut beam = BeamElement::new(1, [n1, n2], 1, section);
    beam.distributed_load = Some(DistributedLoad::uniform(0.0, -10_000.0));
    model.add_beam(beam).unwrap();

    let result = solve(&model, AnalysisKind::Frame, &SolveOptions::default(), &CancellationToken::new()).unwrap();
    let post = post::process(&model, AnalysisKind::Frame, &result);

    let forces = &post.beam_forces[&1];
    println!("  max moment: {:.1} Nm (expect 45000 Nm)", forces.max_m);

    let mid_station = &forces.stations[10];
    println!("  mid-span station x: {:.3} m, M={:.1} Nm", mid_station.x, mid_station.m);

    let check_inputs = SteelCheckInputs::from_beam_forces(
        &model.get_beam(1).unwrap().section,
        SteelGrade::S235,
        210e9,
        length,
        forces,
        None,
    );
    let check = steel::check(&check_inputs);
    println!(
        "  steel check: governing={:?}, uc_m={:.3}",
        check.governing, check.uc_m
    );
}

fn main() {
    env_logger::init();
    cantilever_tip_load();
    simply_supported_uniform_load();
}

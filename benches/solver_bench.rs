//! Benchmarks for the assembler and solver hot paths: a single cantilever
//! and a multi-story frame of varying size.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use planar_fea::assembler::AnalysisKind;
use planar_fea::model::{BeamElement, BeamSection, Constraints, DistributedLoad, Model};
use planar_fea::solver::{solve, CancellationToken, SolveOptions};

fn create_cantilever_model() -> Model {
    let mut model = Model::new();
    let n1 = model.add_node(0.0, 0.0);
    let n2 = model.add_node(10.0, 0.0);

    let mut fixed = model.get_node(n1).unwrap().clone();
    fixed.constraints = Constraints::fixed();
    model.nodes.insert(n1, fixed);

    let mut loaded = model.get_node(n2).unwrap().clone();
    loaded.loads.fy = -10_000.0;
    model.nodes.insert(n2, loaded);

    model.add_beam(BeamElement::new(0, [n1, n2], 1, BeamSection::rectangular(0.3, 0.5))).unwrap();
    model
}

fn create_multi_story_frame(stories: usize, bays: usize) -> Model {
    let mut model = Model::new();
    let story_height = 3.5;
    let bay_width = 6.0;

    let mut nodes = std::collections::HashMap::new();
    for story in 0..=stories {
        for bay in 0..=bays {
            let x = bay as f64 * bay_width;
            let y = story as f64 * story_height;
            let id = model.add_node(x, y);
            nodes.insert((story, bay), id);
        }
    }

    for &(story, bay) in nodes.keys().collect::<Vec<_>>().iter().copied() {
        if story == 0 {
            let id = nodes[&(story, bay)];
            let mut fixed = model.get_node(id).unwrap().clone();
            fixed.constraints = Constraints::fixed();
            model.nodes.insert(id, fixed);
        }
    }

    let column_section = BeamSection::rectangular(0.4, 0.4);
    let beam_section = BeamSection::rectangular(0.3, 0.6);

    for story in 0..stories {
        for bay in 0..=bays {
            let bottom = nodes[&(story, bay)];
            let top = nodes[&(story + 1, bay)];
            model.add_beam(BeamElement::new(0, [bottom, top], 1, column_section.clone())).unwrap();
        }
    }

    for story in 1..=stories {
        for bay in 0..bays {
            let left = nodes[&(story, bay)];
            let right = nodes[&(story, bay + 1)];
            let mut beam = BeamElement::new(0, [left, right], 1, beam_section.clone());
            beam.distributed_load = Some(DistributedLoad::uniform(0.0, -50_000.0));
            model.add_beam(beam).unwrap();
        }
    }

    model
}

fn benchmark_cantilever(c: &mut Criterion) {
    c.bench_function("cantilever_frame_solve", |b| {
        b.iter(|| {
            let model = create_cantilever_model();
            let result =
                solve(&model, AnalysisKind::Frame, &SolveOptions::default(), &CancellationToken::new()).unwrap();
            black_box(&result);
        })
    });
}

fn benchmark_small_frame(c: &mut Criterion) {
    c.bench_function("frame_3story_2bay_solve", |b| {
        b.iter(|| {
            let model = create_multi_story_frame(3, 2);
            let result =
                solve(&model, AnalysisKind::Frame, &SolveOptions::default(), &CancellationToken::new()).unwrap();
            black_box(&result);
        })
    });
}

fn benchmark_medium_frame(c: &mut Criterion) {
    c.bench_function("frame_10story_5bay_solve", |b| {
        b.iter(|| {
            let model = create_multi_story_frame(10, 5);
            let result =
                solve(&model, AnalysisKind::Frame, &SolveOptions::default(), &CancellationToken::new()).unwrap();
            black_box(&result);
        })
    });
}

fn benchmark_sparse_backend(c: &mut Criterion) {
    c.bench_function("frame_10story_5bay_sparse_solve", |b| {
        b.iter(|| {
            let model = create_multi_story_frame(10, 5);
            let mut options = SolveOptions::default();
            options.backend = planar_fea::solver::SolverBackend::Sparse;
            let result = solve(&model, AnalysisKind::Frame, &options, &CancellationToken::new()).unwrap();
            black_box(&result);
        })
    });
}

criterion_group!(benches, benchmark_cantilever, benchmark_small_frame, benchmark_medium_frame, benchmark_sparse_backend);
criterion_main!(benches);

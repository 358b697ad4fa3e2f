//! Reduce/solve/expand/reactions pipeline, single-case and combination
//! solve paths, and cooperative cancellation.
//!
//! A partition-reduce-expand shape built on the assembler's
//! analysis-kind-agnostic [`Assembly`] rather than one fixed per-element DOF
//! layout.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nalgebra::DVector;

use crate::assembler::{self, AnalysisKind, Assembly, DofMap};
use crate::error::{FEAError, FEAResult, Warning};
use crate::loads::{self, LoadCase, LoadCombination};
use crate::math::solve_symmetric;
use crate::model::Model;

/// Cooperative cancellation, checked between assembly, reduction, and
/// solve phases so a tripped token short-circuits before the next expensive
/// step rather than after it.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> FEAResult<()> {
        if self.is_cancelled() {
            Err(FEAError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Which backend solves the reduced system. Dense LU is the default; sparse
/// Cholesky is an alternate path for large plate/continuum meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverBackend {
    #[default]
    Dense,
    Sparse,
}

/// How a combination's factored loads reach the solved result: applied to
/// the model before a single solve, or solved per member case and linearly
/// combined afterward. Both must agree to solver tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinationStrategy {
    #[default]
    Factored,
    PostSolveSuperposition,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SolveOptions {
    pub backend: SolverBackend,
    pub combination_strategy: CombinationStrategy,
}

/// The raw output of one solve: full (unreduced) displacement and reaction
/// vectors over the active DOF map, plus any element-skip warnings raised
/// during assembly.
#[derive(Debug, Clone)]
pub struct SolverResult {
    pub dof_map: DofMap,
    pub displacements: DVector<f64>,
    pub reactions: DVector<f64>,
    pub warnings: Vec<Warning>,
}

/// Solves `model` for `kind` as a single load case (no combination factors
/// applied) — the caller is responsible for having already mutated
/// `node.loads`/`beam.distributed_load`/`beam.thermal_load` via
/// [`loads::apply_load_case_to_mesh`] if a named case is in play.
pub fn solve(model: &Model, kind: AnalysisKind, options: &SolveOptions, cancel: &CancellationToken) -> FEAResult<SolverResult> {
    cancel.check()?;
    let assembly = assembler::assemble(model, kind);
    cancel.check()?;
    reduce_solve_expand(assembly, options, cancel)
}

fn reduce_solve_expand(assembly: Assembly, options: &SolveOptions, cancel: &CancellationToken) -> FEAResult<SolverResult> {
    let Assembly { k, f, dof_map, constrained, warnings } = assembly;
    let n = dof_map.total_dofs();

    let mut is_constrained = vec![false; n];
    for &c in &constrained {
        is_constrained[c] = true;
    }
    let free: Vec<usize> = (0..n).filter(|&i| !is_constrained[i]).collect();

    let k_reduced = k.select_rows(&free).select_columns(&free);
    let f_reduced = DVector::from_iterator(free.len(), free.iter().map(|&i| f[i]));

    cancel.check()?;

    let u_reduced = match options.backend {
        SolverBackend::Dense => solve_symmetric(&k_reduced, &f_reduced)
            .ok_or_else(|| FEAError::Singular("stiffness matrix is singular on the free DOFs".to_string()))?,
        SolverBackend::Sparse => solve_sparse(&k_reduced, &f_reduced)?,
    };

    cancel.check()?;

    let mut displacements = DVector::zeros(n);
    for (i, &dof) in free.iter().enumerate() {
        displacements[dof] = u_reduced[i];
    }

    let reactions_full = &k * &displacements - &f;
    let mut reactions = DVector::zeros(n);
    for &c in &constrained {
        reactions[c] = reactions_full[c];
    }

    Ok(SolverResult { dof_map, displacements, reactions, warnings })
}

fn solve_sparse(k: &nalgebra::DMatrix<f64>, f: &DVector<f64>) -> FEAResult<DVector<f64>> {
    use crate::math::sparse::{SparseCholeskySolver, SparseMatrixBuilder};

    let n = k.nrows();
    let mut builder = SparseMatrixBuilder::new(n);
    for i in 0..n {
        for j in 0..n {
            builder.add(i, j, k[(i, j)]);
        }
    }
    let csr = builder.to_csr();
    let mut solver = SparseCholeskySolver::new(&csr)
        .ok_or_else(|| FEAError::Singular("sparse stiffness matrix is not positive definite".to_string()))?;
    solver
        .factorize()
        .map_err(|e| FEAError::Singular(format!("sparse factorisation failed: {e}")))?;
    Ok(solver.solve(f))
}

/// Solves one named load combination under the strategy in `options`: either
/// applies the factored superposition of its member cases to a cloned model
/// and runs a single solve, or solves each member case independently and
/// combines the results afterward.
pub fn solve_combination(
    model: &Model,
    kind: AnalysisKind,
    combo: &LoadCombination,
    cases: &BTreeMap<u64, LoadCase>,
    options: &SolveOptions,
    cancel: &CancellationToken,
) -> FEAResult<SolverResult> {
    match options.combination_strategy {
        CombinationStrategy::Factored => {
            let mut snapshot = model.clone();
            loads::apply_combination_to_mesh(&mut snapshot, combo, cases)?;
            solve(&snapshot, kind, options, cancel)
        }
        CombinationStrategy::PostSolveSuperposition => {
            let mut accumulated: Option<SolverResult> = None;
            for (&case_id, &factor) in &combo.factors {
                if factor == 0.0 {
                    continue;
                }
                let Some(case) = cases.get(&case_id) else { continue };
                let mut snapshot = model.clone();
                loads::apply_load_case_to_mesh(&mut snapshot, case)?;
                let case_result = solve(&snapshot, kind, options, cancel)?;
                accumulated = Some(match accumulated {
                    None => scale(case_result, factor),
                    Some(acc) => add(acc, scale(case_result, factor)),
                });
            }
            accumulated.ok_or_else(|| {
                FEAError::Validation(format!("combination {} has no nonzero member cases", combo.id))
            })
        }
    }
}

fn scale(mut result: SolverResult, factor: f64) -> SolverResult {
    result.displacements *= factor;
    result.reactions *= factor;
    result
}

fn add(mut a: SolverResult, b: SolverResult) -> SolverResult {
    a.displacements += b.displacements;
    a.reactions += b.reactions;
    a.warnings.extend(b.warnings);
    a
}

/// Solves every combination in `combos` against `model`, one worker thread
/// per combination — independent solves are embarrassingly parallel. Each
/// thread consumes a read-only `Arc<Model>` snapshot; no mutable state is
/// shared. Returns results in the same order as `combos`.
pub fn solve_combinations_parallel(
    model: Arc<Model>,
    kind: AnalysisKind,
    combos: Vec<LoadCombination>,
    cases: Arc<BTreeMap<u64, LoadCase>>,
    options: SolveOptions,
    cancel: CancellationToken,
) -> Vec<FEAResult<SolverResult>> {
    let (tx, rx) = std::sync::mpsc::channel();
    let n = combos.len();

    for (index, combo) in combos.into_iter().enumerate() {
        let model = Arc::clone(&model);
        let cases = Arc::clone(&cases);
        let options = options.clone();
        let cancel = cancel.clone();
        let tx = tx.clone();
        std::thread::spawn(move || {
            let result = solve_combination(&model, kind, &combo, &cases, &options, &cancel);
            let _ = tx.send((index, result));
        });
    }
    drop(tx);

    let mut slots: Vec<Option<FEAResult<SolverResult>>> = (0..n).map(|_| None).collect();
    for (index, result) in rx {
        slots[index] = Some(result);
    }
    slots
        .into_iter()
        .map(|s| s.unwrap_or_else(|| Err(FEAError::Cancelled)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BeamElement, BeamSection, Constraints};
    use approx::assert_relative_eq;

    fn cantilever() -> Model {
        let mut model = Model::new();
        let n1 = model.add_node(0.0, 0.0);
        let n2 = model.add_node(2.0, 0.0);
        model.nodes.get_mut(&n1).unwrap().constraints = Constraints::fixed();
        model.nodes.get_mut(&n2).unwrap().loads.fy = -10000.0;
        let section = BeamSection::new(5.38e-3, 8.36e-5, 0.3);
        model.add_beam(BeamElement::new(0, [n1, n2], 1, section)).unwrap();
        model
    }

    #[test]
    fn cantilever_tip_deflects_downward_under_tip_load() {
        let model = cantilever();
        let cancel = CancellationToken::new();
        let result = solve(&model, AnalysisKind::Frame, &SolveOptions::default(), &cancel).unwrap();
        let tip_base = result.dof_map.base(2).unwrap();
        assert!(result.displacements[tip_base + 1] < 0.0);
    }

    #[test]
    fn reactions_balance_applied_load() {
        let model = cantilever();
        let cancel = CancellationToken::new();
        let result = solve(&model, AnalysisKind::Frame, &SolveOptions::default(), &cancel).unwrap();
        let fixed_base = result.dof_map.base(1).unwrap();
        assert_relative_eq!(result.reactions[fixed_base + 1], 10000.0, epsilon = 1e-6);
    }

    #[test]
    fn unsupported_structure_is_singular() {
        let mut model = Model::new();
        let n1 = model.add_node(0.0, 0.0);
        let n2 = model.add_node(2.0, 0.0);
        model.nodes.get_mut(&n2).unwrap().loads.fy = -1000.0;
        let section = BeamSection::new(5.38e-3, 8.36e-5, 0.3);
        model.add_beam(BeamElement::new(0, [n1, n2], 1, section)).unwrap();
        let cancel = CancellationToken::new();
        let result = solve(&model, AnalysisKind::Frame, &SolveOptions::default(), &cancel);
        assert!(matches!(result, Err(FEAError::Singular(_))));
    }

    #[test]
    fn cancelled_token_short_circuits() {
        let model = cantilever();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = solve(&model, AnalysisKind::Frame, &SolveOptions::default(), &cancel);
        assert!(matches!(result, Err(FEAError::Cancelled)));
    }

    #[test]
    fn factored_and_post_solve_combination_agree() {
        use crate::loads::{CaseNodeLoad, LoadCase, LoadCaseType, LoadCombination};

        let model = {
            let mut m = Model::new();
            let n1 = m.add_node(0.0, 0.0);
            let n2 = m.add_node(2.0, 0.0);
            m.nodes.get_mut(&n1).unwrap().constraints = Constraints::fixed();
            let section = BeamSection::new(5.38e-3, 8.36e-5, 0.3);
            m.add_beam(BeamElement::new(0, [n1, n2], 1, section)).unwrap();
            m
        };

        let mut dead = LoadCase::new(1, "Dead", LoadCaseType::Dead);
        dead.point_loads.push(CaseNodeLoad { node_id: 2, fx: 0.0, fy: -5000.0, fz: None, moment: 0.0 });
        let mut live = LoadCase::new(2, "Live", LoadCaseType::Live);
        live.point_loads.push(CaseNodeLoad { node_id: 2, fx: 0.0, fy: -3000.0, fz: None, moment: 0.0 });

        let mut cases = BTreeMap::new();
        cases.insert(1, dead);
        cases.insert(2, live);

        let combo = LoadCombination::new(1, "1.35D+1.5L", crate::loads::CombinationType::Uls)
            .with_factor(1, 1.35)
            .with_factor(2, 1.5);

        let cancel = CancellationToken::new();
        let factored = solve_combination(
            &model,
            AnalysisKind::Frame,
            &combo,
            &cases,
            &SolveOptions { backend: SolverBackend::Dense, combination_strategy: CombinationStrategy::Factored },
            &cancel,
        )
        .unwrap();
        let post_solve = solve_combination(
            &model,
            AnalysisKind::Frame,
            &combo,
            &cases,
            &SolveOptions {
                backend: SolverBackend::Dense,
                combination_strategy: CombinationStrategy::PostSolveSuperposition,
            },
            &cancel,
        )
        .unwrap();

        for i in 0..factored.displacements.len() {
            assert_relative_eq!(factored.displacements[i], post_solve.displacements[i], epsilon = 1e-6);
        }
    }
}

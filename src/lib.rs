//! planar-fea - a native Rust 2D structural finite-element analysis engine
//!
//! This library analyzes planar (2D) structures built from:
//! - Frame elements (beams with end releases, distributed/point/thermal loads)
//! - Continuum elements (constant-strain triangles, 4-node isoparametric quads)
//! - Plate-bending elements (discrete Kirchhoff triangles)
//! - Mixed frame/continuum structures sharing nodes
//!
//! ## Example
//! ```rust
//! use planar_fea::prelude::*;
//!
//! let mut model = Model::new();
//! let n1 = model.add_node(0.0, 0.0);
//! let n2 = model.add_node(4.0, 0.0);
//!
//! let mut loaded = model.get_node(n2).unwrap().clone();
//! loaded.loads.fy = -10_000.0;
//! model.nodes.insert(n2, loaded);
//!
//! let mut fixed = model.get_node(n1).unwrap().clone();
//! fixed.constraints = Constraints::fixed();
//! model.nodes.insert(n1, fixed);
//!
//! model
//!     .add_beam(BeamElement::new(0, [n1, n2], 1, BeamSection::rectangular(0.2, 0.4)))
//!     .unwrap();
//!
//! let result = solve(
//!     &model,
//!     AnalysisKind::Frame,
//!     &SolveOptions::default(),
//!     &CancellationToken::new(),
//! )
//! .unwrap();
//! let post = post::process(&model, AnalysisKind::Frame, &result);
//! assert!(post.beam_forces[&1].max_m > 0.0);
//! ```

pub mod assembler;
pub mod checks;
pub mod error;
pub mod io;
pub mod loads;
pub mod math;
pub mod model;
pub mod post;
pub mod solver;

// Re-export common types
pub mod prelude {
    pub use crate::assembler::{assemble, AnalysisKind, Assembly, DofMap};
    pub use crate::error::{FEAError, FEAResult, Warning};
    pub use crate::loads::{CaseNodeLoad, CombinationType, LoadCase, LoadCombination};
    pub use crate::model::{
        BeamElement, BeamPointLoad, BeamSection, Constraints, CoordSystem, DistributedLoad,
        DktElement, EndReleases, Material, Model, Node, NodeLoads, PlaneCondition, QuadElement,
        ThermalLoad, TriangleElement,
    };
    pub use crate::post::{self, PostResult};
    pub use crate::solver::{
        solve, solve_combination, CancellationToken, CombinationStrategy, SolveOptions,
        SolverBackend, SolverResult,
    };
}

//! Load cases, combinations, and the pure engine that applies them to a model.

pub mod engine;
pub mod load_case;
pub mod load_combo;

pub use engine::{apply_combination_to_mesh, apply_load_case_to_mesh};
pub use load_case::{CaseDistributedLoad, CaseNodeLoad, CaseThermalLoad, LoadCase, LoadCaseType};
pub use load_combo::{CombinationType, LoadCombination};

//! Project I/O: the JSON project-file contract (spec §6) that sits above
//! the load-case engine and code checks, consumed by the excluded GUI.

pub mod project_file;

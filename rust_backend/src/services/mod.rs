//! Service layer for orchestration.
//!
//! Services sit between the repositories and the binary: they fetch history,
//! drive the delay computation and hand results to a sink.

pub mod overlap_check;

pub use overlap_check::{run_overlap_check, write_records, RunReport, DUMP_HEADER};

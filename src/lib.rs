//! convstat - decoder for time-stepping convergence study statistics files
//!
//! Benchmark drivers for the Kuramoto-Sivashinsky and Lorenz convergence
//! studies write one flat text matrix per run. This library validates the
//! caller's `(P, T, layout)` descriptor against a file and re-indexes it into
//! parameter slices (fixed period) or period slices (fixed parameter), with
//! percent-error and summary helpers for downstream analysis.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod decoder;
pub mod layout;
pub mod matrix;
pub mod output;
pub mod table;

pub use decoder::{decode_by_parameter, decode_by_period, DecodeError, ParameterSlice, PeriodSlice};
pub use layout::{BlockLayout, Layout, Quantity};
pub use matrix::SliceMatrix;
pub use table::RawTable;

//! # latentdist
//!
//! Batch Euclidean distances between W+ latents.
//!
//! Every participant in a table is compared against two sex-matched
//! "stranger" latents and, optionally, against a named friend. Distances
//! are the L2 norm between flattened `(18, 512)` latents, and the input
//! table is written back with `u1distance`, `u2distance` and `fdistance`.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! latentdist --input source.csv --latent-dir ptraw --reference-dir .
//! ```
//!
//! Expects `ptraw/<name>_01_latent.pt` (or `.npy`) per participant and
//! `fu1/fu2/mu1/mu2_01_latent.pt` in the reference directory.
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use latentdist::prelude::*;
//!
//! let config = BatchConfig {
//!     input: "participants.csv".into(),
//!     summary: Some("summary.json".into()),
//!     ..BatchConfig::default()
//! };
//! let report = latentdist::run(&config).unwrap();
//! println!("{}", report);
//! ```
//!
//! ## Crate Structure
//!
//! - `latentdist-core` - latent decoding (`.pt`, `.npy`), W+ canonicalization, distance, references
//! - `latentdist-batch` - tables, per-row orchestration, reports

// Re-export core types
pub use latentdist_core::{
    euclidean_distance, normalize,
    CanonicalVector, RawVector, VectorPayload,
    VectorLoader, LoadOptions, VectorFormat,
    LatentLayout, ReferenceSet, Sex, StrangerKey, StrangerDistances,
    Error, Result,
};

// Re-export batch layer
pub use latentdist_batch::{
    run, BatchConfig, BatchError, BatchOrchestrator, BatchRun, BatchCounters,
    ParticipantRecord, Records, Table, Report, ReportBuilder, Summary,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        euclidean_distance, normalize,
        CanonicalVector, RawVector,
        VectorLoader, LoadOptions,
        LatentLayout, ReferenceSet, Sex,
        BatchConfig, BatchOrchestrator, ReportBuilder, Report, Summary,
        Error, BatchError,
    };
}

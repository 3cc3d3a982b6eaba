//! # latentdist Batch
//!
//! Batch layer over [`latentdist_core`]: reads a participant table, computes
//! per-row stranger and peer distances, and writes the table back with
//! `u1distance`, `u2distance` and `fdistance` columns plus summary statistics.
//!
//! A row that cannot be computed (missing latent, invalid sex, undecodable
//! file) is counted and skipped; it never aborts the batch. Only missing
//! prerequisites (input table, latent directory, stranger references) are
//! errors.

pub mod error;
pub mod config;
pub mod table;
pub mod record;
pub mod orchestrator;
pub mod report;
pub mod runner;

pub use error::{BatchError, Result};
pub use config::BatchConfig;
pub use table::{Table, TableFormat};
pub use record::{ParticipantRecord, Records};
pub use orchestrator::{
    BatchCounters, BatchOrchestrator, BatchRun, FailureReason, PeerOutcome, RowResult,
};
pub use report::{ColumnStats, ColumnSummary, GroupSummary, Report, ReportBuilder, Summary};
pub use runner::run;

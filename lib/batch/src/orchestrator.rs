//! Per-row distance computation
//!
//! Each row moves through resolve -> categorize -> load -> compare. Any
//! failure ends the row with a [`FailureReason`] and the batch moves on;
//! only missing prerequisites (handled before the batch starts) are fatal.
//! Peer comparisons run after the stranger distances are recorded and
//! fail independently of them.

use crate::record::ParticipantRecord;
use latentdist_core::{
    euclidean_distance, CanonicalVector, LatentLayout, ReferenceSet, StrangerDistances,
    VectorLoader,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

/// Why a row (or its peer comparison) produced no distance
#[derive(Debug)]
pub enum FailureReason {
    FileNotFound(PathBuf),
    InvalidCategory(Option<String>),
    Computation(latentdist_core::Error),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::FileNotFound(path) => write!(f, "file not found - {}", path.display()),
            FailureReason::InvalidCategory(Some(value)) => {
                write!(f, "invalid sex value - {}", value)
            }
            FailureReason::InvalidCategory(None) => write!(f, "missing sex value"),
            FailureReason::Computation(e) => write!(f, "computation failed - {}", e),
        }
    }
}

#[derive(Debug)]
pub enum PeerOutcome {
    /// No peer column, blank peer, or the row failed before comparison
    NotRequested,
    Recorded(f64),
    Failed { peer: String, reason: FailureReason },
}

#[derive(Debug)]
pub struct RowResult {
    pub stranger: Result<StrangerDistances, FailureReason>,
    pub peer: PeerOutcome,
}

impl RowResult {
    fn failed(reason: FailureReason) -> Self {
        Self {
            stranger: Err(reason),
            peer: PeerOutcome::NotRequested,
        }
    }

    pub fn is_success(&self) -> bool {
        self.stranger.is_ok()
    }

    pub fn u1(&self) -> Option<f64> {
        self.stranger.as_ref().ok().map(|d| d.u1)
    }

    pub fn u2(&self) -> Option<f64> {
        self.stranger.as_ref().ok().map(|d| d.u2)
    }

    pub fn peer_distance(&self) -> Option<f64> {
        match self.peer {
            PeerOutcome::Recorded(d) => Some(d),
            _ => None,
        }
    }
}

/// Success and failure counts for both comparison kinds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounters {
    pub stranger_ok: usize,
    pub stranger_failed: usize,
    pub peer_ok: usize,
    pub peer_failed: usize,
}

impl BatchCounters {
    pub fn record(&mut self, row: &RowResult) {
        if row.is_success() {
            self.stranger_ok += 1;
        } else {
            self.stranger_failed += 1;
        }
        match row.peer {
            PeerOutcome::Recorded(_) => self.peer_ok += 1,
            PeerOutcome::Failed { .. } => self.peer_failed += 1,
            PeerOutcome::NotRequested => {}
        }
    }
}

/// Results of one batch, in input row order
#[derive(Debug, Default)]
pub struct BatchRun {
    pub rows: Vec<RowResult>,
    pub counters: BatchCounters,
}

impl BatchRun {
    pub fn u1_column(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(RowResult::u1).collect()
    }

    pub fn u2_column(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(RowResult::u2).collect()
    }

    pub fn peer_column(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(RowResult::peer_distance).collect()
    }
}

pub struct BatchOrchestrator {
    references: ReferenceSet,
    layout: LatentLayout,
    loader: VectorLoader,
    with_peers: bool,
}

impl BatchOrchestrator {
    pub fn new(references: ReferenceSet, layout: LatentLayout, loader: VectorLoader) -> Self {
        Self {
            references,
            layout,
            loader,
            with_peers: true,
        }
    }

    /// Disable peer comparisons, e.g. when the table has no peer column
    pub fn with_peers(mut self, enabled: bool) -> Self {
        self.with_peers = enabled;
        self
    }

    /// Process every record sequentially; never aborts on a bad row
    pub fn run(&self, records: &[ParticipantRecord]) -> BatchRun {
        let total = records.len();
        let mut run = BatchRun {
            rows: Vec::with_capacity(total),
            counters: BatchCounters::default(),
        };

        for (idx, record) in records.iter().enumerate() {
            let row = self.process(record);
            log_row(idx + 1, total, record, &row);
            run.counters.record(&row);
            run.rows.push(row);
        }
        run
    }

    pub fn process(&self, record: &ParticipantRecord) -> RowResult {
        let path = match self.layout.resolve(&record.name) {
            Some(path) => path,
            None => {
                let expected = self.layout.expected(&record.name);
                return RowResult::failed(FailureReason::FileNotFound(expected));
            }
        };
        let sex = match record.category() {
            Some(sex) => sex,
            None => return RowResult::failed(FailureReason::InvalidCategory(record.sex.clone())),
        };
        let participant = match self.loader.load_canonical(&path) {
            Ok(vector) => vector,
            Err(e) => return RowResult::failed(FailureReason::Computation(e)),
        };

        let stranger = self.references.distances(sex, &participant);
        let peer = match record.peer() {
            Some(peer) if self.with_peers => self.compare_peer(&participant, peer),
            _ => PeerOutcome::NotRequested,
        };

        RowResult {
            stranger: Ok(stranger),
            peer,
        }
    }

    fn compare_peer(&self, participant: &CanonicalVector, peer: &str) -> PeerOutcome {
        let result = self
            .layout
            .resolve(peer)
            .ok_or_else(|| FailureReason::FileNotFound(self.layout.expected(peer)))
            .and_then(|path| {
                self.loader
                    .load_canonical(&path)
                    .map_err(FailureReason::Computation)
            });

        match result {
            Ok(vector) => PeerOutcome::Recorded(euclidean_distance(participant, &vector)),
            Err(reason) => PeerOutcome::Failed {
                peer: peer.to_string(),
                reason,
            },
        }
    }
}

fn log_row(n: usize, total: usize, record: &ParticipantRecord, row: &RowResult) {
    match &row.stranger {
        Ok(d) => {
            let peer = match row.peer {
                PeerOutcome::Recorded(f) => format!(", f={:.4}", f),
                _ => String::new(),
            };
            info!(
                "[{}/{}] {} ({}): u1={:.4}, u2={:.4}{}",
                n,
                total,
                record.name,
                record.sex.as_deref().unwrap_or(""),
                d.u1,
                d.u2,
                peer
            );
        }
        Err(reason) => warn!("[{}/{}] {}: {}", n, total, record.name, reason),
    }
    if let PeerOutcome::Failed { peer, reason } = &row.peer {
        warn!("[{}/{}] {}: peer {} unavailable, {}", n, total, record.name, peer, reason);
    }
}

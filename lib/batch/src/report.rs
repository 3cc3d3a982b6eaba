//! Summary statistics over a finished batch

use crate::orchestrator::{BatchCounters, BatchRun, RowResult};
use crate::record::{ParticipantRecord, PEER_COLUMN, U1_COLUMN, U2_COLUMN};
use crate::{BatchError, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` below two values
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

impl ColumnStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let std = (count > 1).then(|| {
            let sq = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>();
            let var = sq / (count - 1) as f64;
            var.sqrt()
        });
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self { count, mean, std, min, max })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Summary {
    NoData,
    Stats(ColumnStats),
}

impl Summary {
    pub fn of(values: &[f64]) -> Self {
        ColumnStats::from_values(values).map_or(Summary::NoData, Summary::Stats)
    }

    pub fn stats(&self) -> Option<&ColumnStats> {
        match self {
            Summary::Stats(stats) => Some(stats),
            Summary::NoData => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub summary: Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Raw sex value as it appears in the table
    pub sex: String,
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub total_rows: usize,
    pub with_peers: bool,
    pub counters: BatchCounters,
    pub columns: Vec<ColumnSummary>,
    pub groups: Vec<GroupSummary>,
}

impl Report {
    pub fn column(&self, name: &str) -> Option<&Summary> {
        self.columns.iter().find(|c| c.column == name).map(|c| &c.summary)
    }

    pub fn group(&self, sex: &str) -> Option<&GroupSummary> {
        self.groups.iter().find(|g| g.sex == sex)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
            .write(|file| serde_json::to_writer_pretty(file, self))
            .map_err(|e| BatchError::Write {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

pub struct ReportBuilder<'a> {
    records: &'a [ParticipantRecord],
    run: &'a BatchRun,
    with_peers: bool,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(records: &'a [ParticipantRecord], run: &'a BatchRun) -> Self {
        Self {
            records,
            run,
            with_peers: true,
        }
    }

    pub fn with_peers(mut self, enabled: bool) -> Self {
        self.with_peers = enabled;
        self
    }

    pub fn build(&self) -> Report {
        let all: Vec<&RowResult> = self.run.rows.iter().collect();

        // first-seen order, missing values skipped
        let mut groups: Vec<(&str, Vec<&RowResult>)> = Vec::new();
        for (record, row) in self.records.iter().zip(&self.run.rows) {
            let sex = match record.sex.as_deref() {
                Some(sex) => sex,
                None => continue,
            };
            match groups.iter_mut().find(|(s, _)| *s == sex) {
                Some((_, rows)) => rows.push(row),
                None => groups.push((sex, vec![row])),
            }
        }

        Report {
            total_rows: self.records.len(),
            with_peers: self.with_peers,
            counters: self.run.counters,
            columns: self.summarize(&all),
            groups: groups
                .into_iter()
                .map(|(sex, rows)| GroupSummary {
                    sex: sex.to_string(),
                    rows: rows.len(),
                    columns: self.summarize(&rows),
                })
                .collect(),
        }
    }

    fn summarize(&self, rows: &[&RowResult]) -> Vec<ColumnSummary> {
        let column = |name: &str, pick: fn(&RowResult) -> Option<f64>| {
            let values: Vec<f64> = rows.iter().filter_map(|row| pick(row)).collect();
            ColumnSummary {
                column: name.to_string(),
                summary: Summary::of(&values),
            }
        };

        let mut columns = vec![column(U1_COLUMN, RowResult::u1), column(U2_COLUMN, RowResult::u2)];
        if self.with_peers {
            columns.push(column(PEER_COLUMN, RowResult::peer_distance));
        }
        columns
    }
}

impl fmt::Display for ColumnStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mean={:.4}, ", self.mean)?;
        match self.std {
            Some(std) => write!(f, "std={:.4}, ", std)?,
            None => write!(f, "std=n/a, ")?,
        }
        write!(f, "min={:.4}, max={:.4} (n={})", self.min, self.max, self.count)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::Stats(stats) => fmt::Display::fmt(stats, f),
            Summary::NoData => f.write_str("no data"),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total rows: {}", self.total_rows)?;
        writeln!(f, "Stranger distances computed: {}", self.counters.stranger_ok)?;
        writeln!(f, "Failed rows: {}", self.counters.stranger_failed)?;
        if self.with_peers {
            writeln!(f, "Peer distances computed: {}", self.counters.peer_ok)?;
            writeln!(f, "Peer distances failed: {}", self.counters.peer_failed)?;
        }

        writeln!(f, "Distance statistics:")?;
        for c in &self.columns {
            writeln!(f, "  {}: {}", c.column, c.summary)?;
        }

        writeln!(f, "By sex:")?;
        for g in &self.groups {
            writeln!(f, "  {} (rows={}):", g.sex, g.rows)?;
            for c in &g.columns {
                writeln!(f, "    {}: {}", c.column, c.summary)?;
            }
        }
        Ok(())
    }
}

use crate::config::BatchConfig;
use crate::orchestrator::BatchOrchestrator;
use crate::record::{Records, PEER_COLUMN, U1_COLUMN, U2_COLUMN};
use crate::report::{Report, ReportBuilder};
use crate::table::Table;
use crate::{BatchError, Result};
use latentdist_core::{ReferenceSet, VectorLoader};
use tracing::{info, warn};

/// Run a whole batch: check prerequisites, compute every row, write the
/// augmented table (and the JSON summary if configured)
///
/// Only missing prerequisites are errors; row failures end up in the
/// returned report.
pub fn run(config: &BatchConfig) -> Result<Report> {
    if !config.input.is_file() {
        return Err(BatchError::MissingInput(config.input.clone()));
    }
    if !config.latent_dir.is_dir() {
        return Err(BatchError::MissingDirectory(config.latent_dir.clone()));
    }

    let loader = VectorLoader::new(config.load_options());
    let references = ReferenceSet::load(&config.reference_layout(), &loader)?;
    info!("All stranger references loaded");

    let mut table = Table::read(&config.input)?;
    info!(
        rows = table.len(),
        columns = ?table.headers(),
        "Read {}",
        config.input.display()
    );

    let records = Records::from_table(&table)?;
    if !records.has_peer_column {
        warn!("No 'fname' column, peer distances will be skipped");
    }

    let orchestrator = BatchOrchestrator::new(references, config.participant_layout(), loader)
        .with_peers(records.has_peer_column);
    let batch = orchestrator.run(&records.records);

    table.set_column(U1_COLUMN, &batch.u1_column());
    table.set_column(U2_COLUMN, &batch.u2_column());
    if records.has_peer_column {
        table.set_column(PEER_COLUMN, &batch.peer_column());
    }
    table.write(&config.output)?;
    info!("Results written to {}", config.output.display());

    let report = ReportBuilder::new(&records.records, &batch)
        .with_peers(records.has_peer_column)
        .build();
    if let Some(path) = &config.summary {
        report.write_json(path)?;
        info!("Summary written to {}", path.display());
    }
    Ok(report)
}

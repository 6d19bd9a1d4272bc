//! Single-run orchestration: prune, ingest, aggregate, render, persist
//!
//! One invocation is one batch run; the external scheduler (typically a
//! logrotate prerotate hook) provides the retry cadence. No locking is done
//! against concurrent runs.

use crate::config::Config;
use crate::input::{ensure_log_file, LogScanner, ScanError};
use crate::output;
use crate::persistence::{JournalStore, PersistenceError, SqliteJournal};
use crate::registry::RegistryLookup;
use crate::whitelist;
use chrono::{Duration, Local};
use std::fs::File;
use std::io::BufReader;
use thiserror::Error;

/// Errors that abort a run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Journal error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Log scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Counters reported after a completed run
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    /// Journal rows removed by age-based pruning
    pub pruned: usize,
    /// New events ingested from the log
    pub ingested: usize,
    /// IPs selected into the directive
    pub selected: usize,
}

/// Execute one full whitelist run
pub fn run(config: &Config, registry: &dyn RegistryLookup) -> Result<RunSummary, PipelineError> {
    ensure_log_file(&config.log_path)?;

    let journal = SqliteJournal::open(&config.db_path)?;
    let mut summary = RunSummary::default();

    // Prune before ingesting so the store stays bounded
    let cutoff = Local::now().naive_local() - Duration::days(config.records_max_age_days);
    summary.pruned = journal.prune(cutoff)?;
    if summary.pruned > 0 {
        log::info!("Pruned {} journal rows older than {} days", summary.pruned, config.records_max_age_days);
    }

    summary.ingested = ingest(&journal, config)?;
    log::info!("Ingested {} new login events from {:?}", summary.ingested, config.log_path);

    let usage = journal.aggregate()?;
    let selected = whitelist::select_ips(&usage);
    summary.selected = selected.len();

    let report = whitelist::render_report(&usage, registry);
    let directive = whitelist::render_directive(&selected);

    output::persist(&report, &directive, &config.draft_path)?;
    log::info!(
        "Draft written to {:?} ({} IPs selected of {} seen)",
        config.draft_path,
        summary.selected,
        usage.len()
    );

    Ok(summary)
}

/// Scan the log from the journal's resume cursor and append new events
fn ingest(journal: &dyn JournalStore, config: &Config) -> Result<usize, PipelineError> {
    let cursor = journal.max_timestamp()?;
    let reader = BufReader::new(File::open(&config.log_path)?);

    let mut count = 0;
    for event in LogScanner::new(reader, cursor) {
        let event = event?;
        journal.append(&event)?;
        count += 1;
    }
    Ok(count)
}

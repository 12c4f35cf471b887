//! symdex host library logic.
//!
//! The host owns the process lifecycle of the index: it builds the
//! [`SharedIndex`] from configuration at startup, reports what it opened,
//! and disposes it when the process is asked to stop.

pub mod config;

use serde::Serialize;
use std::path::PathBuf;
use symdex_db::{IndexSummary, OpenReport, SharedIndex};

/// What the host found when it opened the index.
#[derive(Debug, Clone, Serialize)]
pub struct StartupReport {
    /// Directory holding the database files.
    pub state_dir: PathBuf,
    /// Connection string the pool was built from.
    pub connection: String,
    /// How the open went.
    pub open: OpenReport,
    /// Table row counts.
    pub summary: IndexSummary,
}

/// Builds the index handle described by `config`. Does no I/O.
pub fn build_index(config: &config::Config) -> SharedIndex {
    SharedIndex::new(
        config.index.resolved_state_dir(),
        config.index.preferences.clone(),
    )
}

/// Opens the index and describes it.
///
/// Returns `None` if the store cannot be opened or summarized; the cause has
/// already been logged.
pub fn startup_report(index: &SharedIndex) -> Option<StartupReport> {
    let store = index.get()?;
    let summary = match store.summary() {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!(error = %e, "failed to summarize index store");
            return None;
        }
    };

    Some(StartupReport {
        state_dir: index.state_dir().to_path_buf(),
        connection: store.connection_string().to_string(),
        open: store.open_report(),
        summary,
    })
}

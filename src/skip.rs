//! Skip list generation: remote listing, then local scanning, then output.
//!
//! The remote stage always runs first. If it fails, the targets header is
//! never opened and nothing is written to the output.

use anyhow::Result;
use std::collections::BTreeSet;
use std::io::Write;

use crate::config::ResolvedConfig;
use crate::release;
use crate::report;
use crate::targets::{self, TargetDeclaration};

/// Everything learned during one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipReport {
    /// Identifiers published in the release.
    pub remote_targets: BTreeSet<String>,
    /// Declarations found in the local header, in file order.
    pub declarations: Vec<TargetDeclaration>,
    /// Sorted, duplicate-free file names to exclude from the release build.
    pub skip_list: Vec<String>,
}

/// Runs both stages and returns the resulting skip list with its inputs.
pub fn generate_skip_list(config: &ResolvedConfig) -> Result<SkipReport> {
    let remote_targets =
        release::fetch_remote_targets(&config.release_url, config.token.as_deref())?;

    let scan = targets::scan_targets_file(&config.targets_file, &remote_targets)?;

    Ok(SkipReport {
        remote_targets,
        declarations: scan.declarations,
        skip_list: scan.skip_list,
    })
}

/// Generates the skip list and writes the rendered report to `out`.
pub fn run(config: &ResolvedConfig, out: &mut dyn Write) -> Result<SkipReport> {
    let skip_report = generate_skip_list(config)?;
    out.write_all(report::render_report(&skip_report.skip_list).as_bytes())?;
    out.flush()?;
    Ok(skip_report)
}

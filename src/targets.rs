//! Local target scanning.
//!
//! Reads the firmware `targets.h` header and pairs each `#ifdef TARGET`
//! block with the `FILE_NAME` string defined inside it. The header is flat
//! in practice, so the scan keeps a single pending identifier instead of a
//! real preprocessor stack: nested or malformed blocks are not detected, and
//! only the most recent unconsumed `#ifdef` is ever paired.
//!
//! The file is streamed line-by-line; nothing but the declarations found is
//! kept in memory.

use anyhow::{Context, Result, bail};
use regex::Regex;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::sync::LazyLock;

use crate::output;

static BLOCK_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#ifdef\s+(\w+)").expect("block start pattern is valid"));

static FILE_NAME_DEFINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*#define\s+FILE_NAME\s+"([^"]+)""#).expect("FILE_NAME pattern is valid")
});

static BLOCK_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#endif").expect("block end pattern is valid"));

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A target declared in the local header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDeclaration {
    /// The `#ifdef` symbol guarding the block, uppercased.
    pub identifier: String,
    /// The trimmed `FILE_NAME` string defined inside the block.
    pub file_name: String,
}

/// Outcome of scanning the local header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetScan {
    /// Declarations found in the header, in file order.
    pub declarations: Vec<TargetDeclaration>,
    /// Sorted, duplicate-free file names missing from the release.
    pub skip_list: Vec<String>,
}

/// The shape of a single header line, as far as the scan cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// `#ifdef X`, carrying `X` uppercased.
    BlockStart(String),
    /// `#define FILE_NAME "..."`, carrying the trimmed string content.
    FileName(String),
    /// `#endif`.
    BlockEnd,
    Other,
}

/// Scanner state between lines.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ScanState {
    NoPending,
    Pending(String),
}

/// Classifies a header line. Block starts take precedence over the other
/// shapes, then `FILE_NAME` definitions, then block ends.
pub fn classify_line(line: &str) -> LineKind {
    if let Some(caps) = BLOCK_START.captures(line) {
        return LineKind::BlockStart(caps[1].to_uppercase());
    }
    if let Some(caps) = FILE_NAME_DEFINE.captures(line) {
        return LineKind::FileName(caps[1].trim().to_string());
    }
    if BLOCK_END.is_match(line) {
        return LineKind::BlockEnd;
    }
    LineKind::Other
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

/// Extracts every `(identifier, FILE_NAME)` pair from a header, in file order.
///
/// A `FILE_NAME` definition consumes the pending identifier, so a second
/// definition in the same block is ignored. A definition with no pending
/// identifier is ignored as well.
pub fn parse_declarations<R: BufRead>(reader: R) -> Result<Vec<TargetDeclaration>> {
    let mut state = ScanState::NoPending;
    let mut declarations = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read targets header line {}", i + 1))?;

        state = match (classify_line(&line), state) {
            (LineKind::BlockStart(identifier), _) => ScanState::Pending(identifier),
            (LineKind::FileName(file_name), ScanState::Pending(identifier)) => {
                declarations.push(TargetDeclaration {
                    identifier,
                    file_name,
                });
                ScanState::NoPending
            }
            (LineKind::FileName(_), ScanState::NoPending) => ScanState::NoPending,
            (LineKind::BlockEnd, _) => ScanState::NoPending,
            (LineKind::Other, state) => state,
        };
    }

    Ok(declarations)
}

/// Returns the file names of declarations missing from `remote`, sorted and
/// without duplicates.
pub fn skip_list(declarations: &[TargetDeclaration], remote: &BTreeSet<String>) -> Vec<String> {
    declarations
        .iter()
        .filter(|decl| !remote.contains(&decl.identifier))
        .map(|decl| decl.file_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Reads the declarations from a header file on disk.
pub fn read_declarations(path: &Path) -> Result<Vec<TargetDeclaration>> {
    if !path.exists() {
        bail!("Targets file not found: {}", path.display());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open targets file: {}", path.display()))?;
    parse_declarations(BufReader::new(file))
        .with_context(|| format!("Failed to scan targets file: {}", path.display()))
}

/// Scans a header file and returns its declarations with the skip list
/// against `remote`.
pub fn scan_targets_file(path: &Path, remote: &BTreeSet<String>) -> Result<TargetScan> {
    let declarations = read_declarations(path)?;
    report_decisions_to(
        &mut io::stdout(),
        &declarations,
        remote,
        output::is_stdout_tty(),
    );
    let skipped = skip_list(&declarations, remote);

    Ok(TargetScan {
        declarations,
        skip_list: skipped,
    })
}

/// Writes one verbose detail line per declaration with its keep/skip decision.
fn report_decisions_to(
    w: &mut dyn Write,
    declarations: &[TargetDeclaration],
    remote: &BTreeSet<String>,
    is_tty: bool,
) {
    for decl in declarations {
        let decision = if remote.contains(&decl.identifier) {
            "keep"
        } else {
            "skip"
        };
        output::verbose_detail_to_with_tty(
            w,
            &format!("{decision} {} ({})", decl.identifier, decl.file_name),
            is_tty,
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

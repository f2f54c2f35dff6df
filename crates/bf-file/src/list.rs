//! Filter-list index parsing
//!
//! The filter list is a plaintext index, one entry per line:
//!
//! ```text
//! # comment
//! HPFILTER <path>
//! FILTER <f1> ... <f9> <path>
//! LATEREVERB <f1> ... <f9> <path>
//! DIRECTIVITY <f1> ... <f9> <path>
//! <f1> ... <f9> <path>          (legacy: implicit FILTER)
//! ```
//!
//! `f1` is azimuth, `f2` elevation; the remaining fields are opaque. Paths
//! are taken verbatim and resolved relative to the process working
//! directory. The parser is pure — whether an entry kind is actually loaded
//! (headphone filtering off, splitting off) is the store's decision.

use std::path::{Path, PathBuf};

use bf_core::{POSE_FIELDS, Pose};

use crate::{FileError, FileResult};

/// One parsed line of the filter list.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterListEntry {
    Headphone { path: PathBuf },
    Directional { pose: Pose, path: PathBuf },
    LateReverb { pose: Pose, path: PathBuf },
    Directivity { pose: Pose, path: PathBuf },
}

/// Parse a filter list file into its entries.
///
/// Comment lines (`#`) and blank lines are skipped. Unknown entry kinds,
/// wrong field counts, and non-integer fields are errors naming the
/// offending line.
pub fn parse_filter_list<P: AsRef<Path>>(path: P) -> FileResult<Vec<FilterListEntry>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(FileError::NotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;

    let mut entries = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        entries.push(parse_line(trimmed, line_no)?);
    }
    Ok(entries)
}

fn parse_line(line: &str, line_no: usize) -> FileResult<FilterListEntry> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let kind = tokens[0];

    match kind {
        "HPFILTER" => {
            if tokens.len() != 2 {
                return Err(invalid(line_no, "HPFILTER expects exactly one path"));
            }
            Ok(FilterListEntry::Headphone {
                path: PathBuf::from(tokens[1]),
            })
        }
        "FILTER" => {
            let (pose, path) = parse_pose_entry(&tokens[1..], line_no)?;
            Ok(FilterListEntry::Directional { pose, path })
        }
        "LATEREVERB" => {
            let (pose, path) = parse_pose_entry(&tokens[1..], line_no)?;
            Ok(FilterListEntry::LateReverb { pose, path })
        }
        "DIRECTIVITY" => {
            let (pose, path) = parse_pose_entry(&tokens[1..], line_no)?;
            Ok(FilterListEntry::Directivity { pose, path })
        }
        // Legacy form: a line starting with a digit is an implicit FILTER.
        // Old lists carry fewer than nine fields; missing ones are zero.
        _ if kind.chars().next().is_some_and(|c| c.is_ascii_digit()) => {
            let (pose, path) = parse_legacy_entry(&tokens, line_no)?;
            Ok(FilterListEntry::Directional { pose, path })
        }
        _ => Err(invalid(
            line_no,
            &format!("unknown entry kind `{kind}`"),
        )),
    }
}

/// Parse `<f1> ... <f9> <path>` from the remaining tokens.
fn parse_pose_entry(tokens: &[&str], line_no: usize) -> FileResult<(Pose, PathBuf)> {
    if tokens.len() != POSE_FIELDS + 1 {
        return Err(invalid(
            line_no,
            &format!(
                "expected {POSE_FIELDS} pose fields and a path, found {} tokens",
                tokens.len()
            ),
        ));
    }

    let mut fields = [0i32; POSE_FIELDS];
    for (field, token) in fields.iter_mut().zip(tokens) {
        *field = token
            .parse()
            .map_err(|_| invalid(line_no, &format!("invalid pose field `{token}`")))?;
    }

    Ok((
        Pose::from_fields(fields),
        PathBuf::from(tokens[POSE_FIELDS]),
    ))
}

/// Parse a legacy `<f1> ... <fk> <path>` line with 2 ≤ k ≤ 9 fields.
fn parse_legacy_entry(tokens: &[&str], line_no: usize) -> FileResult<(Pose, PathBuf)> {
    let field_count = tokens.len() - 1;
    if !(2..=POSE_FIELDS).contains(&field_count) {
        return Err(invalid(
            line_no,
            &format!("expected 2 to {POSE_FIELDS} pose fields and a path"),
        ));
    }

    let mut fields = [0i32; POSE_FIELDS];
    for (field, token) in fields.iter_mut().zip(&tokens[..field_count]) {
        *field = token
            .parse()
            .map_err(|_| invalid(line_no, &format!("invalid pose field `{token}`")))?;
    }

    Ok((Pose::from_fields(fields), PathBuf::from(tokens[field_count])))
}

fn invalid(line: usize, reason: &str) -> FileError {
    FileError::InvalidEntry {
        line,
        reason: reason.to_string(),
    }
}

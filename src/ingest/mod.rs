//! Checkpoint log ingestion.
//!
//! Reads the comma-separated logs the trace recorder writes and turns them
//! into per-instance [`StreamSet`]s.
//!
//! # Log Format
//!
//! ```text
//! Model, Instance, t, objVal, Status
//! MIP,berlin52,5,7598.0,9
//! MIP,berlin52,10,7542.0,2
//! ```
//!
//! - One file per solver, or one interleaved file whose rows cycle
//!   MIP, CP, ALNS (round-robin recording)
//! - `objVal` is `inf` until the solver finds a feasible solution
//! - Whitespace around fields is ignored
//!
//! # Example
//!
//! ```ignore
//! use solver_trace_features::ingest::load_streams;
//!
//! let grouped = load_streams(&config.source, |id| config.is_skipped(id))?;
//! for set in grouped.sets {
//!     println!("{}: {} records", set.instance_id, set.total_records());
//! }
//! ```

mod grouping;
mod writer;

pub use grouping::{group_streams, GroupedStreams, StreamSet};
pub use writer::CheckpointLogWriter;

use crate::config::LogSource;
use crate::error::{DatasetError, Result};
use crate::schema::{CheckpointRecord, Objective, SolverKind, SOLVER_COUNT};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// One parsed log row.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    /// Model name column, as written
    pub model: String,

    /// Parsed checkpoint
    pub record: CheckpointRecord,
}

fn parse_row(row: &StringRecord, source_name: &str) -> Result<LogRow> {
    let line = row.position().map_or(0, |p| p.line());
    let bad = |what: &str| {
        DatasetError::malformed(source_name, format!("line {line}: {what}"))
    };

    if row.len() != 5 {
        return Err(bad(&format!("expected 5 fields, found {}", row.len())));
    }

    let instance_id = &row[1];
    if instance_id.is_empty() {
        return Err(bad("empty instance id"));
    }

    let elapsed_time: f64 = row[2]
        .parse()
        .map_err(|_| bad(&format!("elapsed time {:?} is not a number", &row[2])))?;
    if !elapsed_time.is_finite() || elapsed_time < 0.0 {
        return Err(bad(&format!("elapsed time {elapsed_time} must be finite and >= 0")));
    }

    let objective = Objective::parse(&row[3])
        .ok_or_else(|| bad(&format!("objective {:?} is not a number", &row[3])))?;

    let status_code: i32 = row[4]
        .parse()
        .map_err(|_| bad(&format!("status {:?} is not an integer", &row[4])))?;

    Ok(LogRow {
        model: row[0].to_string(),
        record: CheckpointRecord::new(instance_id, elapsed_time, objective, status_code),
    })
}

/// Parse all rows of a log (the header row is skipped).
pub fn read_rows<R: Read>(reader: R, source_name: &str) -> Result<Vec<LogRow>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let row = result.map_err(|e| DatasetError::malformed(source_name, e.to_string()))?;
        rows.push(parse_row(&row, source_name)?);
    }
    Ok(rows)
}

fn check_model(row: &LogRow, expected: SolverKind, source_name: &str) -> Result<()> {
    match SolverKind::from_name(&row.model) {
        Some(kind) if kind != expected => Err(DatasetError::malformed(
            source_name,
            format!(
                "row for instance {} belongs to {kind}, expected {expected}",
                row.record.instance_id
            ),
        )),
        Some(_) => Ok(()),
        None => Err(DatasetError::malformed(
            source_name,
            format!("unknown model name {:?}", row.model),
        )),
    }
}

/// Read one solver's log, checking that every row names `expected`.
pub fn read_solver_log_from<R: Read>(
    reader: R,
    expected: SolverKind,
    source_name: &str,
) -> Result<Vec<CheckpointRecord>> {
    read_rows(reader, source_name)?
        .into_iter()
        .map(|row| {
            check_model(&row, expected, source_name)?;
            Ok(row.record)
        })
        .collect()
}

/// Read one solver's log file.
pub fn read_solver_log<P: AsRef<Path>>(path: P, expected: SolverKind) -> Result<Vec<CheckpointRecord>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    read_solver_log_from(file, expected, &path.display().to_string())
}

/// Split an interleaved round-robin log into per-solver record lists.
///
/// Row `i` (after the header) belongs to solver `i mod 3` in column order.
pub fn read_interleaved_from<R: Read>(
    reader: R,
    source_name: &str,
) -> Result<[Vec<CheckpointRecord>; SOLVER_COUNT]> {
    let mut logs: [Vec<CheckpointRecord>; SOLVER_COUNT] = Default::default();
    for (i, row) in read_rows(reader, source_name)?.into_iter().enumerate() {
        let kind = SolverKind::ALL[i % SOLVER_COUNT];
        check_model(&row, kind, source_name)?;
        logs[kind.index()].push(row.record);
    }
    Ok(logs)
}

/// Read an interleaved round-robin log file.
pub fn read_interleaved<P: AsRef<Path>>(path: P) -> Result<[Vec<CheckpointRecord>; SOLVER_COUNT]> {
    let path = path.as_ref();
    let file = File::open(path)?;
    read_interleaved_from(file, &path.display().to_string())
}

/// Read the logs named by `source` and group them per instance.
pub fn load_streams<F>(source: &LogSource, is_skipped: F) -> Result<GroupedStreams>
where
    F: Fn(&str) -> bool,
{
    match source {
        LogSource::PerSolver { mip, cp, alns } => {
            let logs = [
                read_solver_log(mip, SolverKind::Mip)?,
                read_solver_log(cp, SolverKind::Cp)?,
                read_solver_log(alns, SolverKind::Alns)?,
            ];
            info!(
                mip = logs[0].len(),
                cp = logs[1].len(),
                alns = logs[2].len(),
                "read per-solver checkpoint logs"
            );
            let names = [mip, cp, alns].map(|p| p.display().to_string());
            group_streams(
                logs,
                [names[0].as_str(), names[1].as_str(), names[2].as_str()],
                is_skipped,
            )
        }
        LogSource::Interleaved { path } => {
            let logs = read_interleaved(path)?;
            info!(
                rows = logs.iter().map(Vec::len).sum::<usize>(),
                "read interleaved checkpoint log"
            );
            let name = path.display().to_string();
            group_streams(logs, [name.as_str(); SOLVER_COUNT], is_skipped)
        }
    }
}

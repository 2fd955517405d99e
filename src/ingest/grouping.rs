//! Per-instance grouping with a strict three-way join.
//!
//! Each solver log is a flat list of rows in file order. Grouping buckets the
//! rows by instance while keeping the within-instance order, then checks that
//! all three logs describe the same instances in the same order. Nothing is
//! re-sorted: a row whose elapsed time goes backwards is a malformed log.

use crate::error::{DatasetError, Result};
use crate::schema::{CheckpointRecord, SolverKind, SOLVER_COUNT};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// The three checkpoint queues of one instance, consumed front to back by the
/// synchronizer.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSet {
    /// Instance identifier
    pub instance_id: String,

    /// Queues indexed by [`SolverKind::index`]
    pub queues: [VecDeque<CheckpointRecord>; SOLVER_COUNT],
}

impl StreamSet {
    /// Create a stream set from per-solver record lists.
    pub fn new(instance_id: impl Into<String>, queues: [Vec<CheckpointRecord>; SOLVER_COUNT]) -> Self {
        Self {
            instance_id: instance_id.into(),
            queues: queues.map(VecDeque::from),
        }
    }

    /// Queue of one solver.
    pub fn queue(&self, kind: SolverKind) -> &VecDeque<CheckpointRecord> {
        &self.queues[kind.index()]
    }

    /// Total records across the three queues.
    pub fn total_records(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }
}

/// Result of grouping the three logs.
#[derive(Debug, Clone, Default)]
pub struct GroupedStreams {
    /// Stream sets in order of first appearance
    pub sets: Vec<StreamSet>,

    /// Instance ids dropped because they are on the skip list
    pub excluded: Vec<String>,
}

/// Records of one solver log, bucketed by instance in first-appearance order.
struct Buckets {
    order: Vec<String>,
    records: HashMap<String, Vec<CheckpointRecord>>,
}

fn bucket(source_name: &str, records: Vec<CheckpointRecord>) -> Result<Buckets> {
    let mut order = Vec::new();
    let mut buckets: HashMap<String, Vec<CheckpointRecord>> = HashMap::new();

    for record in records {
        if !buckets.contains_key(&record.instance_id) {
            order.push(record.instance_id.clone());
        }
        let bucket = buckets.entry(record.instance_id.clone()).or_default();

        if let Some(last) = bucket.last() {
            if record.elapsed_time < last.elapsed_time {
                return Err(DatasetError::malformed(
                    source_name,
                    format!(
                        "elapsed time goes backwards for instance {} ({} after {})",
                        record.instance_id, record.elapsed_time, last.elapsed_time
                    ),
                ));
            }
        }
        bucket.push(record);
    }

    Ok(Buckets {
        order,
        records: buckets,
    })
}

/// Partition three solver logs into per-instance stream sets.
///
/// `logs` and `source_names` are indexed by [`SolverKind::index`]. Instances for
/// which `is_skipped` returns true are removed from all three logs before the
/// join and reported in [`GroupedStreams::excluded`].
///
/// # Errors
///
/// [`DatasetError::MalformedLog`] if an instance is missing from one of the
/// logs, if the logs list instances in different orders, or if elapsed time
/// decreases within one (instance, solver) stream.
pub fn group_streams<F>(
    logs: [Vec<CheckpointRecord>; SOLVER_COUNT],
    source_names: [&str; SOLVER_COUNT],
    is_skipped: F,
) -> Result<GroupedStreams>
where
    F: Fn(&str) -> bool,
{
    let mut excluded: Vec<String> = Vec::new();
    let mut per_solver = Vec::with_capacity(SOLVER_COUNT);

    for (records, name) in logs.into_iter().zip(source_names) {
        let kept: Vec<CheckpointRecord> = records
            .into_iter()
            .filter(|r| {
                if is_skipped(&r.instance_id) {
                    if !excluded.contains(&r.instance_id) {
                        excluded.push(r.instance_id.clone());
                    }
                    false
                } else {
                    true
                }
            })
            .collect();
        per_solver.push(bucket(name, kept)?);
    }

    let reference = &per_solver[SolverKind::Mip.index()].order;
    for kind in [SolverKind::Cp, SolverKind::Alns] {
        let other = &per_solver[kind.index()];
        if let Some(missing) = reference.iter().find(|id| !other.records.contains_key(*id)) {
            return Err(DatasetError::malformed(
                source_names[kind.index()],
                format!("instance {missing} present in the MIP log is missing from the {kind} log"),
            ));
        }
        if let Some(extra) = other
            .order
            .iter()
            .find(|id| !per_solver[SolverKind::Mip.index()].records.contains_key(*id))
        {
            return Err(DatasetError::malformed(
                source_names[SolverKind::Mip.index()],
                format!("instance {extra} present in the {kind} log is missing from the MIP log"),
            ));
        }
        if other.order != *reference {
            return Err(DatasetError::malformed(
                source_names[kind.index()],
                "instances appear in a different order than in the MIP log",
            ));
        }
    }

    let order = per_solver[SolverKind::Mip.index()].order.clone();
    let mut sets = Vec::with_capacity(order.len());
    for instance_id in order {
        let queues = [0, 1, 2].map(|i| {
            per_solver[i]
                .records
                .remove(&instance_id)
                .unwrap_or_default()
        });
        sets.push(StreamSet::new(instance_id, queues));
    }

    debug!(
        instances = sets.len(),
        excluded = excluded.len(),
        "grouped checkpoint logs"
    );

    Ok(GroupedStreams { sets, excluded })
}

//! Transfer strategy selection.
//!
//! Picks exactly one plan from the probe result and the size of any existing
//! `.part` file. An in-progress partial download is always finished with a
//! single resumed stream, never restarted into parallel chunks.

mod chunks;

pub use chunks::{split_chunks, Chunk};

use crate::probe::RemoteDescriptor;

/// How the bytes of one request are fetched. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferPlan {
    /// One unranged GET for the whole resource.
    FullSequential,
    /// One ranged GET for `[offset, total)`, appended to the existing `.part`.
    ResumeFromOffset { offset: u64, total: u64 },
    /// Parallel ranged GETs covering `[0, total)` exactly once.
    ConcurrentChunks { total: u64, chunks: Vec<Chunk> },
}

/// Plan kind without the payload, for logging and outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    FullSequential,
    ResumeFromOffset,
    ConcurrentChunks,
}

impl TransferPlan {
    pub fn strategy(&self) -> Strategy {
        match self {
            TransferPlan::FullSequential => Strategy::FullSequential,
            TransferPlan::ResumeFromOffset { .. } => Strategy::ResumeFromOffset,
            TransferPlan::ConcurrentChunks { .. } => Strategy::ConcurrentChunks,
        }
    }
}

impl std::fmt::Display for TransferPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferPlan::FullSequential => write!(f, "single stream"),
            TransferPlan::ResumeFromOffset { offset, total } => {
                write!(f, "resume from byte {} of {}", offset, total)
            }
            TransferPlan::ConcurrentChunks { total, chunks } => {
                write!(f, "{} concurrent chunks over {} bytes", chunks.len(), total)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanOptions {
    /// Minimum known size for a concurrent download.
    pub concurrent_threshold: u64,
    /// Chunk count for a concurrent download; below 2 disables it.
    pub concurrent_parts: usize,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            concurrent_threshold: 20 * 1024 * 1024,
            concurrent_parts: 4,
        }
    }
}

/// Chooses the plan for a request. `part_len` is the size of the existing
/// `.part` file, 0 if there is none.
pub fn select_plan(remote: &RemoteDescriptor, part_len: u64, opts: &PlanOptions) -> TransferPlan {
    let total = match remote.total_size {
        Some(total) if remote.supports_ranges => total,
        _ => return TransferPlan::FullSequential,
    };

    if part_len > 0 && part_len < total {
        return TransferPlan::ResumeFromOffset {
            offset: part_len,
            total,
        };
    }

    if total >= opts.concurrent_threshold && opts.concurrent_parts >= 2 {
        let chunks = split_chunks(total, opts.concurrent_parts);
        if chunks.len() >= 2 {
            return TransferPlan::ConcurrentChunks { total, chunks };
        }
    }

    TransferPlan::FullSequential
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    fn ranged(total: u64) -> RemoteDescriptor {
        RemoteDescriptor {
            total_size: Some(total),
            supports_ranges: true,
        }
    }

    #[test]
    fn resume_when_part_is_shorter_than_total() {
        let plan = select_plan(&ranged(10 * MIB), 5 * MIB, &PlanOptions::default());
        assert_eq!(
            plan,
            TransferPlan::ResumeFromOffset {
                offset: 5 * MIB,
                total: 10 * MIB
            }
        );
    }

    #[test]
    fn resume_beats_concurrent_chunks() {
        let plan = select_plan(&ranged(50 * MIB), 1, &PlanOptions::default());
        assert_eq!(plan.strategy(), Strategy::ResumeFromOffset);
    }

    #[test]
    fn large_ranged_resource_goes_concurrent() {
        let plan = select_plan(&ranged(50 * MIB), 0, &PlanOptions::default());
        match plan {
            TransferPlan::ConcurrentChunks { total, chunks } => {
                assert_eq!(total, 50 * MIB);
                assert_eq!(chunks.len(), 4);
            }
            other => panic!("expected concurrent plan, got {:?}", other),
        }
    }

    #[test]
    fn threshold_is_inclusive() {
        let plan = select_plan(&ranged(20 * MIB), 0, &PlanOptions::default());
        assert_eq!(plan.strategy(), Strategy::ConcurrentChunks);
        let plan = select_plan(&ranged(20 * MIB - 1), 0, &PlanOptions::default());
        assert_eq!(plan, TransferPlan::FullSequential);
    }

    #[test]
    fn no_ranges_is_always_sequential() {
        let remote = RemoteDescriptor {
            total_size: Some(500 * MIB),
            supports_ranges: false,
        };
        assert_eq!(select_plan(&remote, 0, &PlanOptions::default()), TransferPlan::FullSequential);
        assert_eq!(select_plan(&remote, MIB, &PlanOptions::default()), TransferPlan::FullSequential);
    }

    #[test]
    fn unknown_size_is_sequential() {
        let remote = RemoteDescriptor {
            total_size: None,
            supports_ranges: true,
        };
        assert_eq!(select_plan(&remote, MIB, &PlanOptions::default()), TransferPlan::FullSequential);
    }

    #[test]
    fn oversized_or_complete_part_restarts() {
        let opts = PlanOptions::default();
        assert_eq!(select_plan(&ranged(MIB), MIB, &opts), TransferPlan::FullSequential);
        assert_eq!(select_plan(&ranged(MIB), 2 * MIB, &opts), TransferPlan::FullSequential);
    }

    #[test]
    fn single_part_disables_concurrency() {
        let opts = PlanOptions {
            concurrent_threshold: 0,
            concurrent_parts: 1,
        };
        assert_eq!(select_plan(&ranged(50 * MIB), 0, &opts), TransferPlan::FullSequential);
    }
}

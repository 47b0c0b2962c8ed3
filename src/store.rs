// Immutable snapshot of the four portal tables plus the join indexes the
// rollup needs. A refresh builds a new store; readers keep whichever
// `Arc<RecordStore>` they started with.
use crate::types::{Allocation, CompletedWork, Expenditure, RecommendedWork};
use std::collections::HashMap;
use tracing::debug;

/// Rows dropped while building the store because their identity key was
/// already taken (first row wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub duplicate_allocations: usize,
    pub duplicate_works: usize,
    pub duplicate_completions: usize,
}

#[derive(Debug, Default)]
pub struct RecordStore {
    allocations: Vec<Allocation>,
    works: Vec<RecommendedWork>,
    expenditures: Vec<Expenditure>,
    completions: Vec<CompletedWork>,
    allocation_by_mp: HashMap<String, usize>,
    work_by_id: HashMap<String, usize>,
    completion_by_work: HashMap<String, usize>,
    stats: StoreStats,
}

impl RecordStore {
    pub fn new(
        allocations: Vec<Allocation>,
        works: Vec<RecommendedWork>,
        expenditures: Vec<Expenditure>,
        completions: Vec<CompletedWork>,
    ) -> Self {
        let mut stats = StoreStats::default();

        let mut kept_allocations = Vec::with_capacity(allocations.len());
        let mut allocation_by_mp = HashMap::with_capacity(allocations.len());
        for a in allocations {
            if allocation_by_mp.contains_key(&a.mp_name) {
                debug!(mp = %a.mp_name, "dropping duplicate allocation row");
                stats.duplicate_allocations += 1;
                continue;
            }
            allocation_by_mp.insert(a.mp_name.clone(), kept_allocations.len());
            kept_allocations.push(a);
        }

        let mut kept_works = Vec::with_capacity(works.len());
        let mut work_by_id = HashMap::with_capacity(works.len());
        for w in works {
            if work_by_id.contains_key(&w.work_id) {
                debug!(work_id = %w.work_id, "dropping duplicate recommended work");
                stats.duplicate_works += 1;
                continue;
            }
            work_by_id.insert(w.work_id.clone(), kept_works.len());
            kept_works.push(w);
        }

        let mut kept_completions = Vec::with_capacity(completions.len());
        let mut completion_by_work = HashMap::with_capacity(completions.len());
        for c in completions {
            if completion_by_work.contains_key(&c.work_id) {
                debug!(work_id = %c.work_id, "dropping duplicate completion");
                stats.duplicate_completions += 1;
                continue;
            }
            completion_by_work.insert(c.work_id.clone(), kept_completions.len());
            kept_completions.push(c);
        }

        Self {
            allocations: kept_allocations,
            works: kept_works,
            expenditures,
            completions: kept_completions,
            allocation_by_mp,
            work_by_id,
            completion_by_work,
            stats,
        }
    }

    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    pub fn works(&self) -> &[RecommendedWork] {
        &self.works
    }

    pub fn expenditures(&self) -> &[Expenditure] {
        &self.expenditures
    }

    pub fn completions(&self) -> &[CompletedWork] {
        &self.completions
    }

    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    pub fn allocation(&self, mp_name: &str) -> Option<&Allocation> {
        self.allocation_by_mp.get(mp_name).map(|&i| &self.allocations[i])
    }

    pub fn work(&self, work_id: &str) -> Option<&RecommendedWork> {
        self.work_by_id.get(work_id).map(|&i| &self.works[i])
    }

    pub fn completion(&self, work_id: &str) -> Option<&CompletedWork> {
        self.completion_by_work.get(work_id).map(|&i| &self.completions[i])
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
            && self.works.is_empty()
            && self.expenditures.is_empty()
            && self.completions.is_empty()
    }
}

use crate::analytics::{self, MpSortKey};
use crate::config::EngineConfig;
use crate::flags;
use crate::metrics;
use crate::rollup::ScopeFilter;
use crate::store::RecordStore;
use crate::types::{
    CategoryMetrics, Flag, GlobalStats, MpDetail, MpMetrics, ScopeMetrics, SearchHit, StateMetrics,
    TopBottom, TrendPoint, VendorDetail, VendorMetrics,
};
use std::sync::Arc;

/// Read-only metrics over one record store snapshot.
///
/// The engine holds no mutable state. Cloning it is cheap and clones share
/// the same snapshot, so it can be handed to concurrent request handlers.
#[derive(Debug, Clone)]
pub struct Engine {
    store: Arc<RecordStore>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(store: Arc<RecordStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Same configuration over a refreshed store.
    pub fn with_store(&self, store: Arc<RecordStore>) -> Self {
        Self {
            store,
            config: self.config.clone(),
        }
    }

    pub fn compute_scope(&self, filter: &ScopeFilter) -> ScopeMetrics {
        metrics::compute_scope(&self.store, filter)
    }

    pub fn rank_categories(
        &self,
        categories: &[CategoryMetrics],
        limit: usize,
    ) -> Vec<CategoryMetrics> {
        flags::rank_categories(categories, limit)
    }

    pub fn flag_categories(&self, categories: &[CategoryMetrics]) -> Vec<Flag> {
        flags::flag_categories(categories, &self.config.thresholds)
    }

    pub fn monthly_trends(&self, filter: &ScopeFilter) -> Vec<TrendPoint> {
        analytics::monthly_trends(&self.store, filter)
    }

    pub fn global_stats(&self, filter: &ScopeFilter) -> GlobalStats {
        analytics::global_stats(&self.store, filter)
    }

    pub fn rank_mps(&self, mps: &[MpMetrics], key: MpSortKey, limit: usize) -> Vec<MpMetrics> {
        analytics::rank_mps(mps, key, limit)
    }

    pub fn rank_vendors(&self, vendors: &[VendorMetrics], limit: usize) -> Vec<VendorMetrics> {
        analytics::rank_vendors(vendors, limit)
    }

    pub fn top_bottom(&self, scope: &ScopeMetrics, limit: usize) -> TopBottom {
        analytics::top_bottom(scope, limit)
    }

    pub fn state_rollup(&self, months: Option<u32>) -> Vec<StateMetrics> {
        analytics::state_rollup(&self.store, months)
    }

    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        analytics::search(&self.store, query, limit)
    }

    pub fn mp_detail(&self, name: &str) -> Option<MpDetail> {
        analytics::mp_detail(&self.store, name)
    }

    pub fn vendor_detail(&self, name: &str) -> VendorDetail {
        analytics::vendor_detail(&self.store, name)
    }
}

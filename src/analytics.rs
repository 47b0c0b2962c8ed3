// Dashboard-style queries built on the rollup: headline stats, per-state
// rollup, rankings, search, and MP / vendor drill-downs.
use crate::metrics::{completion_pct, compute_scope, utilization_pct};
use crate::rollup::{rollup, scoped_rows, ScopeFilter, UNSPECIFIED_CATEGORY};
use crate::store::RecordStore;
use crate::trends::{bucket_by_month, YearMonth};
use crate::types::{
    GlobalStats, MpDetail, MpMetrics, ScopeMetrics, SearchHit, StateMetrics, TopBottom, TrendPoint,
    VendorDetail, VendorMetrics, VendorPayment, WorkStatus, WorkSummary,
};
use crate::util::parse_portal_date;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};

pub const MIN_SEARCH_LEN: usize = 2;
pub const DEFAULT_SEARCH_LIMIT: usize = 20;
pub const RECENT_WORKS_LIMIT: usize = 50;
pub const VENDOR_PAYMENTS_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MpSortKey {
    #[default]
    Expenditure,
    Completion,
    Transparency,
}

impl std::str::FromStr for MpSortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expenditure" => Ok(MpSortKey::Expenditure),
            "completion" => Ok(MpSortKey::Completion),
            "transparency" => Ok(MpSortKey::Transparency),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

fn desc_f64(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

pub fn global_stats(store: &RecordStore, filter: &ScopeFilter) -> GlobalStats {
    let r = rollup(store, filter);
    let t = &r.totals;
    GlobalStats {
        total_allocated_paise: t.allocated_paise,
        total_spent_paise: t.spent_paise,
        total_works_recommended: t.recommended_count,
        total_works_completed: t.completed_count,
        utilization_pct: utilization_pct(t.spent_paise, t.allocated_paise),
        completion_pct: completion_pct(t.completed_count, t.recommended_count),
    }
}

/// MPs ordered by the chosen key, descending, at most `limit`.
pub fn rank_mps(mps: &[MpMetrics], key: MpSortKey, limit: usize) -> Vec<MpMetrics> {
    let mut ranked = mps.to_vec();
    match key {
        MpSortKey::Expenditure => ranked.sort_by(|a, b| b.spent_paise.cmp(&a.spent_paise)),
        MpSortKey::Completion => {
            ranked.sort_by(|a, b| desc_f64(a.completion_pct, b.completion_pct))
        }
        MpSortKey::Transparency => {
            ranked.sort_by(|a, b| desc_f64(a.transparency_pct, b.transparency_pct))
        }
    }
    ranked.truncate(limit);
    ranked
}

pub fn rank_vendors(vendors: &[VendorMetrics], limit: usize) -> Vec<VendorMetrics> {
    let mut ranked = vendors.to_vec();
    ranked.sort_by(|a, b| b.received_paise.cmp(&a.received_paise));
    ranked.truncate(limit);
    ranked
}

/// Biggest spenders, smallest spenders among allocated MPs, and the MPs
/// with the most proofs uploaded.
pub fn top_bottom(scope: &ScopeMetrics, limit: usize) -> TopBottom {
    let mut top_spenders = scope.mp_metrics.clone();
    top_spenders.sort_by(|a, b| b.spent_paise.cmp(&a.spent_paise));
    top_spenders.truncate(limit);

    let mut zero_spenders: Vec<MpMetrics> = scope
        .mp_metrics
        .iter()
        .filter(|m| m.allocated_paise > 0)
        .cloned()
        .collect();
    zero_spenders.sort_by(|a, b| a.spent_paise.cmp(&b.spent_paise));
    zero_spenders.truncate(limit);

    let mut top_transparent = scope.mp_metrics.clone();
    top_transparent.sort_by(|a, b| b.with_proof_count.cmp(&a.with_proof_count));
    top_transparent.truncate(limit);

    TopBottom {
        top_spenders,
        zero_spenders,
        top_transparent,
    }
}

/// One row per state that has allocations, largest allocation first.
pub fn state_rollup(store: &RecordStore, months: Option<u32>) -> Vec<StateMetrics> {
    let states: BTreeSet<&str> = store
        .allocations()
        .iter()
        .map(|a| a.state.as_str())
        .filter(|s| !s.is_empty())
        .collect();

    let mut rows: Vec<StateMetrics> = states
        .into_iter()
        .map(|state| {
            let filter = ScopeFilter {
                state: Some(state.to_string()),
                months,
                ..ScopeFilter::default()
            };
            let t = rollup(store, &filter).totals;
            StateMetrics {
                state: state.to_string(),
                allocated_paise: t.allocated_paise,
                spent_paise: t.spent_paise,
                works_recommended: t.recommended_count,
                works_completed: t.completed_count,
                utilization_pct: utilization_pct(t.spent_paise, t.allocated_paise),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.allocated_paise.cmp(&a.allocated_paise));
    rows
}

/// Case-insensitive substring match on MP name or constituency. Queries
/// shorter than `MIN_SEARCH_LEN` characters match nothing.
pub fn search(store: &RecordStore, query: &str, limit: usize) -> Vec<SearchHit> {
    let needle = query.trim().to_lowercase();
    if needle.chars().count() < MIN_SEARCH_LEN {
        return Vec::new();
    }
    let mut seen = HashSet::new();
    store
        .allocations()
        .iter()
        .filter(|a| {
            a.mp_name.to_lowercase().contains(&needle)
                || a.constituency.to_lowercase().contains(&needle)
        })
        .map(|a| SearchHit {
            name: a.mp_name.clone(),
            state: a.state.clone(),
            constituency: a.constituency.clone(),
        })
        .filter(|hit| seen.insert(hit.clone()))
        .take(limit)
        .collect()
}

/// Newest first; rows whose date does not parse go last in input order.
fn by_date_desc(a: Option<&str>, b: Option<&str>) -> Ordering {
    let da = a.and_then(parse_portal_date);
    let db = b.and_then(parse_portal_date);
    match (da, db) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Headline metrics plus the most recent works of one allocated MP.
/// `None` when the MP has no allocation row.
pub fn mp_detail(store: &RecordStore, name: &str) -> Option<MpDetail> {
    store.allocation(name)?;
    let metrics = compute_scope(store, &ScopeFilter::mp(name))
        .mp_metrics
        .into_iter()
        .find(|m| m.name == name)?;

    let mut works: Vec<_> = store.works().iter().filter(|w| w.mp_name == name).collect();
    works.sort_by(|a, b| {
        by_date_desc(
            a.recommendation_date.as_deref(),
            b.recommendation_date.as_deref(),
        )
    });
    let recent_works = works
        .into_iter()
        .take(RECENT_WORKS_LIMIT)
        .map(|w| {
            let done = store.completion(&w.work_id);
            WorkSummary {
                work_id: w.work_id.clone(),
                description: w.description.clone(),
                recommended_paise: w.recommended_paise,
                recommendation_date: w.recommendation_date.clone(),
                status: if done.is_some() {
                    WorkStatus::Completed
                } else {
                    WorkStatus::InProgress
                },
                completion_date: done.and_then(|c| c.completion_date.clone()),
                attach_id: done.and_then(|c| c.attach_id.clone()),
                actual_paise: done.map(|c| c.actual_paise),
            }
        })
        .collect();

    Some(MpDetail {
        metrics,
        recent_works,
    })
}

/// Most recent payments to one vendor.
pub fn vendor_detail(store: &RecordStore, name: &str) -> VendorDetail {
    let mut payments: Vec<_> = store
        .expenditures()
        .iter()
        .filter(|e| e.vendor == name)
        .collect();
    payments.sort_by(|a, b| {
        by_date_desc(a.expenditure_date.as_deref(), b.expenditure_date.as_deref())
    });
    VendorDetail {
        name: name.to_string(),
        payments: payments
            .into_iter()
            .take(VENDOR_PAYMENTS_LIMIT)
            .map(|e| {
                let work = e.work_id.as_deref().and_then(|id| store.work(id));
                VendorPayment {
                    mp_name: work.map(|w| w.mp_name.clone()).or_else(|| e.mp_name.clone()),
                    category: e
                        .category
                        .clone()
                        .or_else(|| work.and_then(|w| w.category.clone()))
                        .unwrap_or_else(|| UNSPECIFIED_CATEGORY.to_string()),
                    amount_paise: e.disbursed_paise,
                    date: e.expenditure_date.clone(),
                    state: e.state.clone(),
                }
            })
            .collect(),
    }
}

/// Monthly spend and completion counts for the scope, over the union of
/// months in which either happened. Quiet months are absent.
pub fn monthly_trends(store: &RecordStore, filter: &ScopeFilter) -> Vec<TrendPoint> {
    let rows = scoped_rows(store, filter);
    let spend = bucket_by_month(
        rows.expenditures.iter().copied(),
        |e| e.expenditure_date.as_deref(),
        |e| e.disbursed_paise,
    );
    let completed = bucket_by_month(
        rows.completions.iter().copied(),
        |c| c.completion_date.as_deref(),
        |_| 1usize,
    );

    let mut merged: BTreeMap<YearMonth, TrendPoint> = BTreeMap::new();
    for p in spend.series {
        merged
            .entry(p.month)
            .or_insert(TrendPoint {
                month: p.month,
                spent_paise: 0,
                completed: 0,
            })
            .spent_paise += p.value;
    }
    for p in completed.series {
        merged
            .entry(p.month)
            .or_insert(TrendPoint {
                month: p.month,
                spent_paise: 0,
                completed: 0,
            })
            .completed += p.value;
    }
    merged.into_values().collect()
}

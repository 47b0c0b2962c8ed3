// Join & rollup over the record store.
//
// Every in-scope row lands in exactly one scope total. Rows that cannot be
// joined to an allocated MP or to a recommended work are left out of the
// per-MP / per-category groups that need that side and tallied in
// `ReferenceStats` instead.
use crate::store::RecordStore;
use crate::trends::{MonthWindow, YearMonth};
use crate::types::{
    Allocation, CompletedWork, Expenditure, RecommendedWork, ReferenceStats, ScopeTotals,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::debug;

pub const UNSPECIFIED_CATEGORY: &str = "Unspecified";

/// Narrows which records take part in an aggregation. All fields are
/// exact, case-sensitive matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ScopeFilter {
    pub state: Option<String>,
    pub mp: Option<String>,
    pub vendor: Option<String>,
    /// Trailing calendar months, anchored at the latest month in the data.
    pub months: Option<u32>,
}

impl ScopeFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn state(state: impl Into<String>) -> Self {
        Self {
            state: Some(state.into()),
            ..Self::default()
        }
    }

    pub fn mp(mp: impl Into<String>) -> Self {
        Self {
            mp: Some(mp.into()),
            ..Self::default()
        }
    }

    pub fn vendor(vendor: impl Into<String>) -> Self {
        Self {
            vendor: Some(vendor.into()),
            ..Self::default()
        }
    }

    pub fn with_months(mut self, months: u32) -> Self {
        self.months = Some(months);
        self
    }

    /// The national baseline for this scope: same time window, no
    /// state/MP/vendor narrowing.
    pub fn national(&self) -> Self {
        Self {
            months: self.months,
            ..Self::default()
        }
    }

    pub fn is_national(&self) -> bool {
        self.state.is_none() && self.mp.is_none() && self.vendor.is_none()
    }
}

/// Which dated rows a rollup admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeScope {
    Lifetime,
    Window(MonthWindow),
    /// A window was requested but the data has no parseable dates.
    Empty,
}

impl TimeScope {
    pub fn for_filter(store: &RecordStore, filter: &ScopeFilter) -> Self {
        match filter.months {
            None => TimeScope::Lifetime,
            Some(n) => match latest_activity_month(store) {
                Some(end) => TimeScope::Window(MonthWindow::trailing(end, n)),
                None => TimeScope::Empty,
            },
        }
    }

    pub fn admits(&self, date: Option<&str>) -> bool {
        match self {
            TimeScope::Lifetime => true,
            TimeScope::Window(w) => date
                .and_then(YearMonth::from_portal_date)
                .is_some_and(|ym| w.contains(ym)),
            TimeScope::Empty => false,
        }
    }
}

/// Latest month with a parseable expenditure or completion date. Time
/// windows are anchored here rather than at the wall clock so a static
/// dataset always yields the same window.
pub fn latest_activity_month(store: &RecordStore) -> Option<YearMonth> {
    let exp = store
        .expenditures()
        .iter()
        .filter_map(|e| e.expenditure_date.as_deref());
    let comp = store
        .completions()
        .iter()
        .filter_map(|c| c.completion_date.as_deref());
    exp.chain(comp).filter_map(YearMonth::from_portal_date).max()
}

/// Per-vendor amounts kept in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorLedger {
    index: HashMap<String, usize>,
    entries: Vec<(String, i64)>,
}

impl VendorLedger {
    pub fn add(&mut self, vendor: &str, amount: i64) {
        match self.index.get(vendor) {
            Some(&i) => self.entries[i].1 += amount,
            None => {
                self.index.insert(vendor.to_string(), self.entries.len());
                self.entries.push((vendor.to_string(), amount));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn amounts(&self) -> Vec<i64> {
        self.entries.iter().map(|(_, a)| *a).collect()
    }

    pub fn entries(&self) -> &[(String, i64)] {
        &self.entries
    }
}

#[derive(Debug, Clone)]
pub struct MpAggregate<'a> {
    pub allocation: &'a Allocation,
    pub spent_paise: i64,
    pub recommended_count: usize,
    pub completed_count: usize,
    pub with_proof_count: usize,
    pub vendors: VendorLedger,
}

impl<'a> MpAggregate<'a> {
    fn new(allocation: &'a Allocation) -> Self {
        Self {
            allocation,
            spent_paise: 0,
            recommended_count: 0,
            completed_count: 0,
            with_proof_count: 0,
            vendors: VendorLedger::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VendorAggregate {
    pub received_paise: i64,
    pub payment_count: usize,
    pub mps: BTreeSet<String>,
    pub categories: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryAggregate {
    pub spend_paise: i64,
    pub recommended_count: usize,
    pub completed_count: usize,
    pub with_proof_count: usize,
    pub vendors: VendorLedger,
}

#[derive(Debug, Clone)]
pub struct Rollup<'a> {
    pub time: TimeScope,
    pub mps: BTreeMap<&'a str, MpAggregate<'a>>,
    pub vendors: BTreeMap<&'a str, VendorAggregate>,
    pub categories: BTreeMap<&'a str, CategoryAggregate>,
    pub totals: ScopeTotals,
    pub references: ReferenceStats,
}

/// Resolved owner of a row: the MP and state it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner<'a> {
    pub mp: Option<&'a str>,
    pub state: Option<&'a str>,
}

/// MP comes from the recommended work when it exists, otherwise from the
/// row itself. State prefers the MP's allocation, then the work, then the
/// row.
pub fn resolve_owner<'a>(
    store: &'a RecordStore,
    work_id: Option<&str>,
    row_mp: Option<&'a str>,
    row_state: Option<&'a str>,
) -> Owner<'a> {
    let work = work_id.and_then(|id| store.work(id));
    let mp = work
        .map(|w| w.mp_name.as_str())
        .filter(|s| !s.is_empty())
        .or(row_mp);
    let state = mp
        .and_then(|m| store.allocation(m))
        .map(|a| a.state.as_str())
        .filter(|s| !s.is_empty())
        .or_else(|| work.and_then(|w| w.state.as_deref()))
        .or(row_state);
    Owner { mp, state }
}

/// Scope predicates for each table. Time windows are checked separately so
/// callers can still count rows with unparseable dates.
pub struct ScopeMatcher<'a, 'f> {
    store: &'a RecordStore,
    filter: &'f ScopeFilter,
    /// Works touched by the filtered vendor over their whole lifetime.
    vendor_works: Option<HashSet<&'a str>>,
    pub time: TimeScope,
}

impl<'a, 'f> ScopeMatcher<'a, 'f> {
    pub fn new(store: &'a RecordStore, filter: &'f ScopeFilter) -> Self {
        let vendor_works = filter.vendor.as_ref().map(|v| {
            store
                .expenditures()
                .iter()
                .filter(|e| &e.vendor == v)
                .filter_map(|e| e.work_id.as_deref())
                .collect()
        });
        Self {
            store,
            filter,
            vendor_works,
            time: TimeScope::for_filter(store, filter),
        }
    }

    fn owner_matches(&self, owner: &Owner<'_>) -> bool {
        if let Some(state) = &self.filter.state {
            if owner.state != Some(state.as_str()) {
                return false;
            }
        }
        if let Some(mp) = &self.filter.mp {
            if owner.mp != Some(mp.as_str()) {
                return false;
            }
        }
        true
    }

    fn work_in_vendor_scope(&self, work_id: &str) -> bool {
        self.vendor_works
            .as_ref()
            .map_or(true, |set| set.contains(work_id))
    }

    /// Allocated MPs listed even without activity. Under a vendor
    /// narrowing only MPs that paid the vendor appear, so none are seeded.
    pub fn allocation(&self, a: &'a Allocation) -> bool {
        self.filter.vendor.is_none()
            && self.owner_matches(&Owner {
                mp: Some(a.mp_name.as_str()),
                state: Some(a.state.as_str()),
            })
    }

    pub fn work(&self, w: &'a RecommendedWork) -> Option<Owner<'a>> {
        if !self.work_in_vendor_scope(&w.work_id) {
            return None;
        }
        let owner = resolve_owner(self.store, Some(&w.work_id), None, w.state.as_deref());
        self.owner_matches(&owner).then_some(owner)
    }

    pub fn expenditure(&self, e: &'a Expenditure) -> Option<Owner<'a>> {
        if let Some(v) = &self.filter.vendor {
            if &e.vendor != v {
                return None;
            }
        }
        let owner = resolve_owner(
            self.store,
            e.work_id.as_deref(),
            e.mp_name.as_deref(),
            e.state.as_deref(),
        );
        self.owner_matches(&owner).then_some(owner)
    }

    pub fn completion(&self, c: &'a CompletedWork) -> Option<Owner<'a>> {
        if !self.work_in_vendor_scope(&c.work_id) {
            return None;
        }
        let owner = resolve_owner(
            self.store,
            Some(&c.work_id),
            c.mp_name.as_deref(),
            c.state.as_deref(),
        );
        self.owner_matches(&owner).then_some(owner)
    }
}

/// In-scope dated rows, time window applied.
#[derive(Debug, Clone, Default)]
pub struct ScopedRows<'a> {
    pub expenditures: Vec<&'a Expenditure>,
    pub completions: Vec<&'a CompletedWork>,
}

pub fn scoped_rows<'a>(store: &'a RecordStore, filter: &ScopeFilter) -> ScopedRows<'a> {
    let scope = ScopeMatcher::new(store, filter);
    ScopedRows {
        expenditures: store
            .expenditures()
            .iter()
            .filter(|&e| scope.expenditure(e).is_some())
            .filter(|e| scope.time.admits(e.expenditure_date.as_deref()))
            .collect(),
        completions: store
            .completions()
            .iter()
            .filter(|&c| scope.completion(c).is_some())
            .filter(|c| scope.time.admits(c.completion_date.as_deref()))
            .collect(),
    }
}

/// Group the store's rows for `filter` by MP, vendor, and category.
pub fn rollup<'a>(store: &'a RecordStore, filter: &ScopeFilter) -> Rollup<'a> {
    let scope = ScopeMatcher::new(store, filter);
    let time = scope.time;
    let mut out = Rollup {
        time,
        mps: BTreeMap::new(),
        vendors: BTreeMap::new(),
        categories: BTreeMap::new(),
        totals: ScopeTotals::default(),
        references: ReferenceStats::default(),
    };

    for a in store.allocations() {
        if scope.allocation(a) {
            out.mps.insert(a.mp_name.as_str(), MpAggregate::new(a));
        }
    }

    for w in store.works() {
        let Some(owner) = scope.work(w) else {
            continue;
        };
        out.totals.recommended_count += 1;
        let category = w.category.as_deref().unwrap_or(UNSPECIFIED_CATEGORY);
        out.categories.entry(category).or_default().recommended_count += 1;
        match mp_entry(&mut out, store, owner.mp) {
            Some(mp) => mp.recommended_count += 1,
            None => out.references.unallocated_rows += 1,
        }
    }

    for e in store.expenditures() {
        let Some(owner) = scope.expenditure(e) else {
            continue;
        };
        let date = e.expenditure_date.as_deref();
        if date.and_then(YearMonth::from_portal_date).is_none() {
            debug!(vendor = %e.vendor, date = ?date, "expenditure date did not parse");
            out.references.unparsed_dates += 1;
        }
        if !time.admits(date) {
            continue;
        }

        let amount = e.disbursed_paise;
        out.totals.spent_paise += amount;
        out.totals.expenditure_rows += 1;

        let work = e.work_id.as_deref().and_then(|id| store.work(id));
        let category = e
            .category
            .as_deref()
            .or_else(|| work.and_then(|w| w.category.as_deref()))
            .unwrap_or(UNSPECIFIED_CATEGORY);
        let cat = out.categories.entry(category).or_default();
        cat.spend_paise += amount;
        cat.vendors.add(&e.vendor, amount);

        let vendor = out.vendors.entry(e.vendor.as_str()).or_default();
        vendor.received_paise += amount;
        vendor.payment_count += 1;
        *vendor.categories.entry(category.to_string()).or_default() += amount;
        if let Some(mp) = owner.mp {
            vendor.mps.insert(mp.to_string());
        }

        if owner.mp.is_none() {
            debug!(vendor = %e.vendor, work_id = ?e.work_id, "expenditure has no resolvable MP");
            out.references.orphan_expenditures += 1;
            continue;
        }
        match mp_entry(&mut out, store, owner.mp) {
            Some(mp) => {
                mp.spent_paise += amount;
                mp.vendors.add(&e.vendor, amount);
            }
            None => out.references.unallocated_rows += 1,
        }
    }

    for c in store.completions() {
        let Some(owner) = scope.completion(c) else {
            continue;
        };
        let date = c.completion_date.as_deref();
        if date.and_then(YearMonth::from_portal_date).is_none() {
            debug!(work_id = %c.work_id, date = ?date, "completion date did not parse");
            out.references.unparsed_dates += 1;
        }
        if !time.admits(date) {
            continue;
        }

        let proof = c.has_proof();
        out.totals.completed_count += 1;
        if proof {
            out.totals.with_proof_count += 1;
        }

        match store.work(&c.work_id) {
            Some(w) => {
                let category = w.category.as_deref().unwrap_or(UNSPECIFIED_CATEGORY);
                let cat = out.categories.entry(category).or_default();
                cat.completed_count += 1;
                if proof {
                    cat.with_proof_count += 1;
                }
            }
            None => {
                debug!(work_id = %c.work_id, "completion references an unknown work");
                out.references.orphan_completions += 1;
            }
        }

        if owner.mp.is_none() {
            continue;
        }
        match mp_entry(&mut out, store, owner.mp) {
            Some(mp) => {
                mp.completed_count += 1;
                if proof {
                    mp.with_proof_count += 1;
                }
            }
            None => out.references.unallocated_rows += 1,
        }
    }

    out.totals.allocated_paise = out.mps.values().map(|m| m.allocation.allocated_paise).sum();
    out
}

/// The aggregate for an allocated MP, created on first use. `None` when the
/// MP is unknown or has no allocation row.
fn mp_entry<'r, 'a>(
    out: &'r mut Rollup<'a>,
    store: &'a RecordStore,
    mp: Option<&str>,
) -> Option<&'r mut MpAggregate<'a>> {
    let allocation = store.allocation(mp?)?;
    Some(
        out.mps
            .entry(allocation.mp_name.as_str())
            .or_insert_with(|| MpAggregate::new(allocation)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloc(name: &str, state: &str) -> Allocation {
        Allocation {
            mp_name: name.to_string(),
            constituency: String::new(),
            state: state.to_string(),
            allocated_paise: 1_000,
        }
    }

    fn work(id: &str, mp: &str, category: &str) -> RecommendedWork {
        RecommendedWork {
            work_id: id.to_string(),
            mp_name: mp.to_string(),
            state: None,
            category: Some(category.to_string()),
            description: String::new(),
            recommended_paise: 0,
            recommendation_date: None,
            attach_id: None,
        }
    }

    fn pay(work_id: Option<&str>, vendor: &str, amount: i64, date: &str) -> Expenditure {
        Expenditure {
            work_id: work_id.map(str::to_string),
            mp_name: None,
            state: None,
            vendor: vendor.to_string(),
            category: None,
            disbursed_paise: amount,
            expenditure_date: Some(date.to_string()),
        }
    }

    fn done(work_id: &str, date: &str) -> CompletedWork {
        CompletedWork {
            work_id: work_id.to_string(),
            mp_name: None,
            state: None,
            actual_paise: 0,
            completion_date: Some(date.to_string()),
            attach_id: None,
        }
    }

    fn store() -> RecordStore {
        RecordStore::new(
            vec![alloc("A", "Goa"), alloc("B", "Assam")],
            vec![work("w1", "A", "Roads"), work("w2", "B", "Water"), work("w3", "Ghost", "Roads")],
            vec![
                pay(Some("w1"), "V1", 100, "10-Jan-2026"),
                pay(Some("w2"), "V2", 50, "10-Mar-2026"),
                pay(Some("w3"), "V1", 30, "10-Mar-2026"),
                pay(Some("nope"), "V3", 20, "garbage"),
            ],
            vec![done("w1", "01-Feb-2026"), done("missing", "01-Mar-2026")],
        )
    }

    #[test]
    fn orphans_count_in_totals_but_not_in_joins() {
        let s = store();
        let r = rollup(&s, &ScopeFilter::all());
        assert_eq!(r.totals.spent_paise, 200);
        assert_eq!(r.totals.completed_count, 2);
        assert_eq!(r.references.orphan_expenditures, 1);
        assert_eq!(r.references.orphan_completions, 1);
        // w3 belongs to an MP without allocation: once as a work, once as a payment.
        assert_eq!(r.references.unallocated_rows, 2);
        assert_eq!(r.references.unparsed_dates, 1);
        assert_eq!(r.mps["A"].spent_paise, 100);
        assert_eq!(r.categories["Roads"].spend_paise, 130);
        assert_eq!(r.categories[UNSPECIFIED_CATEGORY].spend_paise, 20);
        assert_eq!(r.vendors["V1"].mps.len(), 2);
    }

    #[test]
    fn state_filter_uses_allocation_state() {
        let s = store();
        let r = rollup(&s, &ScopeFilter::state("Goa"));
        assert_eq!(r.mps.len(), 1);
        assert_eq!(r.totals.spent_paise, 100);
        assert_eq!(r.totals.recommended_count, 1);
        assert_eq!(r.totals.allocated_paise, 1_000);
    }

    #[test]
    fn months_window_is_anchored_to_latest_data_month() {
        let s = store();
        assert_eq!(latest_activity_month(&s), YearMonth::new(2026, 3));
        let r = rollup(&s, &ScopeFilter::all().with_months(1));
        // Only March rows; the unparseable payment is dropped from the window.
        assert_eq!(r.totals.spent_paise, 80);
        assert_eq!(r.totals.completed_count, 1);
        // Recommendations are lifetime.
        assert_eq!(r.totals.recommended_count, 3);
    }

    #[test]
    fn vendor_filter_limits_works_to_vendor_touched_ones() {
        let s = store();
        let r = rollup(&s, &ScopeFilter::vendor("V1"));
        assert_eq!(r.totals.spent_paise, 130);
        assert_eq!(r.totals.recommended_count, 2);
        assert_eq!(r.mps.keys().copied().collect::<Vec<_>>(), vec!["A"]);
    }

    #[test]
    fn ledger_keeps_first_seen_order() {
        let mut l = VendorLedger::default();
        l.add("b", 1);
        l.add("a", 2);
        l.add("b", 3);
        assert_eq!(l.entries(), &[("b".to_string(), 4), ("a".to_string(), 2)]);
    }

    #[test]
    fn empty_store_window_admits_nothing() {
        let s = RecordStore::default();
        let t = TimeScope::for_filter(&s, &ScopeFilter::all().with_months(6));
        assert_eq!(t, TimeScope::Empty);
        assert!(!t.admits(Some("01-Jan-2026")));
    }
}

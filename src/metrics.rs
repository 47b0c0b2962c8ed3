// Derived metrics over a rollup: utilization, completion, transparency,
// vendor concentration, and category lift against the national baseline.
//
// Values stay unrounded here. `reports` rounds at the presentation edge.
use crate::rollup::{rollup, CategoryAggregate, MpAggregate, Rollup, ScopeFilter, VendorAggregate};
use crate::store::RecordStore;
use crate::types::{CategoryAmount, CategoryMetrics, MpMetrics, ScopeMetrics, VendorMetrics};
use crate::util::{pct_of_counts, pct_of_paise, ratio};
use std::collections::BTreeMap;

/// `spent / allocated * 100`; 0 when nothing was allocated. Net negative
/// spend counts as nothing spent.
pub fn utilization_pct(spent_paise: i64, allocated_paise: i64) -> f64 {
    pct_of_paise(spent_paise.max(0), allocated_paise)
}

/// `completed / recommended * 100`; 0 when nothing was recommended.
pub fn completion_pct(completed: usize, recommended: usize) -> f64 {
    pct_of_counts(completed, recommended)
}

/// `completed with proof / completed * 100`; 0 when nothing was completed.
pub fn transparency_pct(with_proof: usize, completed: usize) -> f64 {
    pct_of_counts(with_proof, completed)
}

/// Share of the total captured by the `n` largest amounts.
///
/// Only positive amounts are ranked or totalled, so the result stays in
/// `0..=100` and never shrinks as `n` grows. Ranking uses a stable sort so
/// equal amounts keep their input order. `n` beyond the number of amounts
/// takes them all.
pub fn top_n_share_pct(amounts: &[i64], n: usize) -> f64 {
    let mut ranked: Vec<i64> = amounts.iter().copied().filter(|&a| a > 0).collect();
    ranked.sort_by(|a, b| b.cmp(a));
    let total: i64 = ranked.iter().sum();
    let top: i64 = ranked.iter().take(n).sum();
    pct_of_paise(top, total)
}

/// Scope share over national share. `None` when the category has no
/// national spend.
pub fn lift_vs_national(scope_share_pct: f64, national_share_pct: f64) -> Option<f64> {
    ratio(scope_share_pct, national_share_pct)
}

/// Full metric set for one scope. Never fails: a scope matching nothing
/// comes back with empty lists and zeroed totals.
pub fn compute_scope(store: &RecordStore, filter: &ScopeFilter) -> ScopeMetrics {
    let scoped = rollup(store, filter);
    let national_shares = if filter.is_national() {
        category_shares(&scoped)
    } else {
        category_shares(&rollup(store, &filter.national()))
    };

    let mp_metrics = scoped.mps.values().map(mp_metrics).collect();
    let vendor_metrics = scoped
        .vendors
        .iter()
        .map(|(name, agg)| vendor_metrics(name, agg))
        .collect();
    let category_metrics = scoped
        .categories
        .iter()
        .map(|(name, agg)| {
            let share = pct_of_paise(agg.spend_paise, scoped.totals.spent_paise);
            let national = national_shares.get(name).copied().unwrap_or(0.0);
            category_metrics(name, agg, share, national)
        })
        .collect();

    ScopeMetrics {
        mp_metrics,
        vendor_metrics,
        category_metrics,
        totals: scoped.totals.clone(),
        references: scoped.references.clone(),
    }
}

fn category_shares<'a>(r: &Rollup<'a>) -> BTreeMap<&'a str, f64> {
    r.categories
        .iter()
        .map(|(name, agg)| (*name, pct_of_paise(agg.spend_paise, r.totals.spent_paise)))
        .collect()
}

pub fn mp_metrics(agg: &MpAggregate<'_>) -> MpMetrics {
    let a = agg.allocation;
    let vendor_amounts = agg.vendors.amounts();
    MpMetrics {
        name: a.mp_name.clone(),
        state: a.state.clone(),
        constituency: a.constituency.clone(),
        allocated_paise: a.allocated_paise,
        spent_paise: agg.spent_paise,
        utilization_pct: utilization_pct(agg.spent_paise, a.allocated_paise),
        recommended_count: agg.recommended_count,
        completed_count: agg.completed_count,
        with_proof_count: agg.with_proof_count,
        completion_pct: completion_pct(agg.completed_count, agg.recommended_count),
        transparency_pct: transparency_pct(agg.with_proof_count, agg.completed_count),
        vendor_count: agg.vendors.len(),
        top1_vendor_share_pct: top_n_share_pct(&vendor_amounts, 1),
        top3_vendor_share_pct: top_n_share_pct(&vendor_amounts, 3),
    }
}

pub fn vendor_metrics(name: &str, agg: &VendorAggregate) -> VendorMetrics {
    let mut categories: Vec<CategoryAmount> = agg
        .categories
        .iter()
        .map(|(category, amount)| CategoryAmount {
            category: category.clone(),
            amount_paise: *amount,
        })
        .collect();
    // BTreeMap order is by name; a stable sort keeps that for equal amounts.
    categories.sort_by(|a, b| b.amount_paise.cmp(&a.amount_paise));

    let mp_count = agg.mps.len();
    VendorMetrics {
        name: name.to_string(),
        received_paise: agg.received_paise,
        payment_count: agg.payment_count,
        mp_count,
        amount_per_mp_paise: if mp_count == 0 {
            0.0
        } else {
            agg.received_paise as f64 / mp_count as f64
        },
        categories,
    }
}

pub fn category_metrics(
    name: &str,
    agg: &CategoryAggregate,
    share_pct: f64,
    national_share_pct: f64,
) -> CategoryMetrics {
    let vendor_amounts = agg.vendors.amounts();
    CategoryMetrics {
        category: name.to_string(),
        spend_paise: agg.spend_paise,
        share_pct,
        national_share_pct,
        lift: lift_vs_national(share_pct, national_share_pct),
        recommended_count: agg.recommended_count,
        completed_count: agg.completed_count,
        with_proof_count: agg.with_proof_count,
        completion_pct: completion_pct(agg.completed_count, agg.recommended_count),
        transparency_pct: transparency_pct(agg.with_proof_count, agg.completed_count),
        vendor_count: agg.vendors.len(),
        top1_vendor_share_pct: top_n_share_pct(&vendor_amounts, 1),
        top3_vendor_share_pct: top_n_share_pct(&vendor_amounts, 3),
    }
}

// Presentation edge: turn engine output into display rows. This is the
// only place values are rounded or rendered as rupees.
use crate::types::{
    CategoryMetrics, CategoryRow, Flag, FlagRow, MpMetrics, MpRankingRow, Severity, StateMetrics,
    StateRow, TrendPoint, TrendRow, VendorMetrics, VendorRankingRow,
};
use crate::util::{format_number, format_rupees};

pub fn mp_ranking_rows(mps: &[MpMetrics]) -> Vec<MpRankingRow> {
    mps.iter()
        .enumerate()
        .map(|(idx, m)| MpRankingRow {
            rank: idx + 1,
            name: m.name.clone(),
            state: m.state.clone(),
            allocated: format_rupees(m.allocated_paise),
            spent: format_rupees(m.spent_paise),
            utilization_pct: format_number(m.utilization_pct, 2),
            completion_pct: format_number(m.completion_pct, 2),
            transparency_pct: format_number(m.transparency_pct, 2),
            top3_vendor_share_pct: format_number(m.top3_vendor_share_pct, 2),
        })
        .collect()
}

pub fn vendor_ranking_rows(vendors: &[VendorMetrics]) -> Vec<VendorRankingRow> {
    vendors
        .iter()
        .enumerate()
        .map(|(idx, v)| VendorRankingRow {
            rank: idx + 1,
            name: v.name.clone(),
            received: format_rupees(v.received_paise),
            payments: v.payment_count,
            mp_count: v.mp_count,
            amount_per_mp: format_number(v.amount_per_mp_paise / 100.0, 2),
            top_category: v
                .categories
                .first()
                .map(|c| c.category.clone())
                .unwrap_or_default(),
        })
        .collect()
}

pub fn category_rows(categories: &[CategoryMetrics]) -> Vec<CategoryRow> {
    categories
        .iter()
        .map(|c| CategoryRow {
            category: c.category.clone(),
            spend: format_rupees(c.spend_paise),
            share_pct: format_number(c.share_pct, 2),
            lift: c
                .lift
                .map(|l| format_number(l, 2))
                .unwrap_or_else(|| "n/a".to_string()),
            completion_pct: format_number(c.completion_pct, 2),
            transparency_pct: format_number(c.transparency_pct, 2),
            top3_vendor_share_pct: format_number(c.top3_vendor_share_pct, 2),
        })
        .collect()
}

pub fn flag_rows(flags: &[Flag]) -> Vec<FlagRow> {
    flags
        .iter()
        .map(|f| FlagRow {
            severity: match f.severity {
                Severity::High => "HIGH".to_string(),
                Severity::Warning => "WARNING".to_string(),
            },
            code: f.code.as_str().to_string(),
            category: f.category.clone(),
            detail: f.detail.clone(),
        })
        .collect()
}

pub fn trend_rows(points: &[TrendPoint]) -> Vec<TrendRow> {
    points
        .iter()
        .map(|p| TrendRow {
            month: p.month.to_string(),
            spent: format_rupees(p.spent_paise),
            completed: p.completed,
        })
        .collect()
}

pub fn state_rows(states: &[StateMetrics]) -> Vec<StateRow> {
    states
        .iter()
        .map(|s| StateRow {
            state: s.state.clone(),
            allocated: format_rupees(s.allocated_paise),
            spent: format_rupees(s.spent_paise),
            works_recommended: s.works_recommended,
            works_completed: s.works_completed,
            utilization_pct: format_number(s.utilization_pct, 2),
        })
        .collect()
}

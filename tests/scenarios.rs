use approx::assert_relative_eq;
use mplads_report::analytics::MpSortKey;
use mplads_report::loader::{
    self, ALLOCATIONS_FILE, ALLOCATIONS_KEY, COMPLETED_FILE, COMPLETED_KEY, EXPENDITURE_FILE,
    EXPENDITURE_KEY, RECOMMENDED_FILE, RECOMMENDED_KEY,
};
use mplads_report::types::{
    Allocation, CompletedWork, Expenditure, FlagCode, RecommendedWork, ScopeTotals, SummaryDocument,
};
use mplads_report::{output, reports, Engine, EngineConfig, RecordStore, ScopeFilter};
use serde_json::json;
use std::fs;
use std::sync::Arc;

fn alloc(mp: &str, state: &str, rupees: i64) -> Allocation {
    Allocation {
        mp_name: mp.to_string(),
        constituency: format!("{mp} Constituency"),
        state: state.to_string(),
        allocated_paise: rupees * 100,
    }
}

fn work(id: &str, mp: &str, category: &str) -> RecommendedWork {
    RecommendedWork {
        work_id: id.to_string(),
        mp_name: mp.to_string(),
        state: None,
        category: Some(category.to_string()),
        description: format!("work {id}"),
        recommended_paise: 0,
        recommendation_date: Some("01-Dec-2025".to_string()),
        attach_id: None,
    }
}

fn pay(mp: &str, vendor: &str, category: &str, rupees: i64, date: &str) -> Expenditure {
    Expenditure {
        work_id: None,
        mp_name: Some(mp.to_string()),
        state: None,
        vendor: vendor.to_string(),
        category: Some(category.to_string()),
        disbursed_paise: rupees * 100,
        expenditure_date: Some(date.to_string()),
    }
}

fn done(id: &str, proof: bool, date: &str) -> CompletedWork {
    CompletedWork {
        work_id: id.to_string(),
        mp_name: None,
        state: None,
        actual_paise: 0,
        completion_date: Some(date.to_string()),
        attach_id: proof.then(|| format!("ATT-{id}")),
    }
}

fn engine(store: RecordStore) -> Engine {
    Engine::new(Arc::new(store), EngineConfig::default())
}

struct Rows {
    allocations: Vec<Allocation>,
    works: Vec<RecommendedWork>,
    expenditures: Vec<Expenditure>,
    completions: Vec<CompletedWork>,
}

impl Rows {
    fn store(&self) -> RecordStore {
        RecordStore::new(
            self.allocations.clone(),
            self.works.clone(),
            self.expenditures.clone(),
            self.completions.clone(),
        )
    }
}

// MP X in Delhi spends 40% of its allocation, one payment carrying an
// impossible date. MP Y has ten works, three completed, one with proof.
fn delhi() -> Rows {
    let works = (1..=10).map(|i| work(&format!("Y-{i}"), "Y", "Schools")).collect();
    Rows {
        allocations: vec![alloc("X", "Delhi", 1_000_000), alloc("Y", "Delhi", 500_000)],
        works,
        expenditures: vec![
            pay("X", "Acme Builders", "Roads", 250_000, "09-Jan-2026"),
            pay("X", "Metro Works", "Roads", 150_000, "31-Feb-2026"),
            pay("Y", "Acme Builders", "Schools", 80_000, "15-Mar-2026"),
            pay("Y", "Small Co", "Schools", 20_000, "15-Mar-2026"),
        ],
        completions: vec![
            done("Y-1", true, "20-Mar-2026"),
            done("Y-2", false, "20-Mar-2026"),
            done("Y-3", false, "02-Feb-2026"),
        ],
    }
}

// Kerala spends 60% on Roads while the country spends 20%.
fn two_states() -> Rows {
    Rows {
        allocations: vec![alloc("K", "Kerala", 50_000_000), alloc("G", "Goa", 100_000_000)],
        works: vec![],
        expenditures: vec![
            pay("K", "Kerala Roads Ltd", "Roads", 15_000_000, "15-Mar-2026"),
            pay("K", "Kerala Schools Ltd", "Schools", 10_000_000, "15-Mar-2026"),
            pay("G", "Goa Roads Ltd", "Roads", 5_000_000, "15-Mar-2026"),
            pay("G", "Goa Schools Ltd", "Schools", 70_000_000, "15-Mar-2026"),
        ],
        completions: vec![],
    }
}

#[test]
fn utilization_is_spent_over_allocated() {
    let e = engine(delhi().store());
    let m = e.compute_scope(&ScopeFilter::mp("X"));
    assert_eq!(m.mp_metrics.len(), 1);
    assert_eq!(m.mp_metrics[0].spent_paise, 40_000_000);
    assert_relative_eq!(m.mp_metrics[0].utilization_pct, 40.0, epsilon = 1e-9);
}

#[test]
fn completion_and_transparency_for_one_mp() {
    let e = engine(delhi().store());
    let m = e.compute_scope(&ScopeFilter::mp("Y"));
    let y = &m.mp_metrics[0];
    assert_eq!(y.recommended_count, 10);
    assert_eq!(y.completed_count, 3);
    assert_relative_eq!(y.completion_pct, 30.0, epsilon = 1e-9);
    assert_relative_eq!(y.transparency_pct, 100.0 / 3.0, epsilon = 1e-9);
}

#[test]
fn state_share_three_times_national_is_a_lift_outlier() {
    let e = engine(two_states().store());
    let m = e.compute_scope(&ScopeFilter::state("Kerala"));
    let roads = m
        .category_metrics
        .iter()
        .find(|c| c.category == "Roads")
        .unwrap();
    assert_relative_eq!(roads.share_pct, 60.0, epsilon = 1e-9);
    assert_relative_eq!(roads.national_share_pct, 20.0, epsilon = 1e-9);
    assert_relative_eq!(roads.lift.unwrap(), 3.0, epsilon = 1e-9);

    let flags = e.flag_categories(&m.category_metrics);
    assert!(flags
        .iter()
        .any(|f| f.code == FlagCode::LiftOutlier && f.category == "Roads"));
}

#[test]
fn unknown_state_yields_empty_scope() {
    let e = engine(delhi().store());
    let filter = ScopeFilter::state("NoSuchState");
    let m = e.compute_scope(&filter);
    assert!(m.mp_metrics.is_empty());
    assert!(m.vendor_metrics.is_empty());
    assert!(m.category_metrics.is_empty());
    assert_eq!(m.totals, ScopeTotals::default());
    assert!(e.flag_categories(&m.category_metrics).is_empty());
    assert!(e.monthly_trends(&filter).is_empty());

    let stats = e.global_stats(&filter);
    assert_eq!(stats.total_spent_paise, 0);
    assert_eq!(stats.utilization_pct, 0.0);
}

#[test]
fn impossible_date_is_left_out_of_trends_only() {
    let e = engine(delhi().store());
    let filter = ScopeFilter::mp("X");

    let trends = e.monthly_trends(&filter);
    assert_eq!(trends.len(), 1);
    assert_eq!(trends[0].month.to_string(), "2026-01");
    assert_eq!(trends[0].spent_paise, 25_000_000);

    let m = e.compute_scope(&filter);
    assert_eq!(m.mp_metrics[0].spent_paise, 40_000_000);
    let metro = m
        .vendor_metrics
        .iter()
        .find(|v| v.name == "Metro Works")
        .unwrap();
    assert_eq!(metro.received_paise, 15_000_000);
    assert_eq!(m.references.unparsed_dates, 1);
}

#[test]
fn trends_are_chronological_without_gaps_filled() {
    let e = engine(delhi().store());
    let months: Vec<String> = e
        .monthly_trends(&ScopeFilter::all())
        .iter()
        .map(|p| p.month.to_string())
        .collect();
    assert_eq!(months, vec!["2026-01", "2026-02", "2026-03"]);
}

#[test]
fn trailing_window_anchors_at_latest_month() {
    let e = engine(delhi().store());
    let m = e.compute_scope(&ScopeFilter::all().with_months(1));
    // Only March: Y's two payments and two of its completions.
    assert_eq!(m.totals.spent_paise, 10_000_000);
    assert_eq!(m.totals.completed_count, 2);
    // Allocations are not time-bound.
    assert_eq!(m.totals.allocated_paise, 150_000_000);
}

#[test]
fn full_scope_category_shares_sum_to_hundred() {
    for rows in [delhi(), two_states()] {
        let m = engine(rows.store()).compute_scope(&ScopeFilter::all());
        let total: f64 = m.category_metrics.iter().map(|c| c.share_pct).sum();
        assert_relative_eq!(total, 100.0, epsilon = 1e-9);
    }
}

#[test]
fn top_three_share_never_below_top_one() {
    let m = engine(delhi().store()).compute_scope(&ScopeFilter::all());
    for mp in &m.mp_metrics {
        assert!(mp.top3_vendor_share_pct >= mp.top1_vendor_share_pct);
    }
    for c in &m.category_metrics {
        assert!(c.top3_vendor_share_pct >= c.top1_vendor_share_pct);
    }
}

#[test]
fn reversal_and_zero_rows_keep_ratios_in_range() {
    let store = RecordStore::new(
        vec![alloc("Z", "Goa", 1_000), alloc("W", "Goa", 10_000)],
        vec![],
        vec![
            pay("Z", "Acme Builders", "Roads", -500, "09-Jan-2026"),
            pay("Z", "Acme Builders", "Roads", 0, "09-Jan-2026"),
            pay("W", "Acme Builders", "Roads", 1_000, "09-Jan-2026"),
            pay("W", "Beta Infra", "Roads", -400, "09-Jan-2026"),
            pay("W", "Gamma Works", "Roads", 300, "09-Jan-2026"),
        ],
        vec![],
    );
    let m = engine(store).compute_scope(&ScopeFilter::all());

    for mp in &m.mp_metrics {
        assert!(mp.utilization_pct.is_finite() && mp.utilization_pct >= 0.0);
        assert!((0.0..=100.0).contains(&mp.top1_vendor_share_pct));
        assert!(mp.top3_vendor_share_pct >= mp.top1_vendor_share_pct);
        assert!(mp.top3_vendor_share_pct <= 100.0);
    }
    for c in &m.category_metrics {
        assert!((0.0..=100.0).contains(&c.share_pct));
        assert!(c.top3_vendor_share_pct >= c.top1_vendor_share_pct);
    }

    let z = m.mp_metrics.iter().find(|mp| mp.name == "Z").unwrap();
    assert_eq!(z.utilization_pct, 0.0);
    assert_eq!(z.top1_vendor_share_pct, 0.0);
    let w = m.mp_metrics.iter().find(|mp| mp.name == "W").unwrap();
    assert_relative_eq!(w.top1_vendor_share_pct, 100.0 * 1_000.0 / 1_300.0, epsilon = 1e-9);
    assert_relative_eq!(w.top3_vendor_share_pct, 100.0, epsilon = 1e-9);
}

#[test]
fn repeated_calls_are_byte_identical() {
    let e = engine(delhi().store());
    let filter = ScopeFilter::state("Delhi");
    let a = serde_json::to_string(&e.compute_scope(&filter)).unwrap();
    let b = serde_json::to_string(&e.compute_scope(&filter)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn shuffled_rows_give_identical_output() {
    let mut rows = delhi();
    rows.allocations.extend(two_states().allocations);
    rows.expenditures.extend(two_states().expenditures);

    let summarize = |store: RecordStore| {
        let e = engine(store);
        let m = e.compute_scope(&ScopeFilter::all());
        let flags = e.flag_categories(&m.category_metrics);
        (
            serde_json::to_string(&m).unwrap(),
            serde_json::to_string(&flags).unwrap(),
            serde_json::to_string(&e.monthly_trends(&ScopeFilter::all())).unwrap(),
        )
    };
    let baseline = summarize(rows.store());

    rows.allocations.reverse();
    rows.works.reverse();
    rows.expenditures.rotate_left(3);
    rows.completions.reverse();
    assert_eq!(summarize(rows.store()), baseline);

    rows.expenditures.reverse();
    rows.works.rotate_left(4);
    assert_eq!(summarize(rows.store()), baseline);
}

#[test]
fn vendor_narrowing_keeps_only_paying_mps() {
    let e = engine(delhi().store());
    let m = e.compute_scope(&ScopeFilter::vendor("Metro Works"));
    let names: Vec<&str> = m.mp_metrics.iter().map(|mp| mp.name.as_str()).collect();
    assert_eq!(names, vec!["X"]);
    assert_eq!(m.totals.spent_paise, 15_000_000);
}

fn wrap(key: &str, rows: serde_json::Value) -> String {
    json!({ key: rows.to_string() }).to_string()
}

#[test]
fn exports_on_disk_produce_every_report() {
    let data = tempfile::tempdir().unwrap();
    let d = data.path();
    fs::write(
        d.join(ALLOCATIONS_FILE),
        wrap(
            ALLOCATIONS_KEY,
            json!([
                {
                    "MP_NAME": "X",
                    "STATE_NAME": "Delhi",
                    "CONSTITUENCY": "New Delhi",
                    "ALLOCATED_AMT": 1000000
                }
            ]),
        ),
    )
    .unwrap();
    fs::write(
        d.join(RECOMMENDED_FILE),
        wrap(
            RECOMMENDED_KEY,
            json!([
                {
                    "WORK_RECOMMENDATION_DTL_ID": 11,
                    "MP_NAME": "X",
                    "ACTIVITY_NAME": "Roads",
                    "RECOMMENDED_AMOUNT": 300000
                },
                {
                    "WORK_RECOMMENDATION_DTL_ID": 12,
                    "MP_NAME": "X",
                    "ACTIVITY_NAME": "Roads",
                    "RECOMMENDED_AMOUNT": 200000
                }
            ]),
        ),
    )
    .unwrap();
    fs::write(
        d.join(EXPENDITURE_FILE),
        wrap(
            EXPENDITURE_KEY,
            json!([
                {
                    "WORK_RECOMMENDATION_DTL_ID": 11,
                    "VENDOR_NAME": "Acme Builders",
                    "FUND_DISBURSED_AMT": "250000",
                    "EXPENDITURE_DATE": "09-Jan-2026"
                },
                {
                    "WORK_RECOMMENDATION_DTL_ID": 12,
                    "VENDOR_NAME": "Acme Builders",
                    "FUND_DISBURSED_AMT": 150000,
                    "EXPENDITURE_DATE": "12-Feb-2026"
                },
                {
                    "WORK_RECOMMENDATION_DTL_ID": 12,
                    "VENDOR_NAME": "Acme Builders",
                    "FUND_DISBURSED_AMT": "-150,000",
                    "EXPENDITURE_DATE": "14-Feb-2026"
                }
            ]),
        ),
    )
    .unwrap();
    fs::write(
        d.join(COMPLETED_FILE),
        wrap(
            COMPLETED_KEY,
            json!([
                {
                    "WORK_RECOMMENDATION_DTL_ID": 11,
                    "ACTUAL_END_DATE": "20-Feb-2026",
                    "ATTACH_ID": 901
                }
            ]),
        ),
    )
    .unwrap();

    let (store, report) = loader::load_store(d).unwrap();
    assert_eq!(report.parse_errors(), 0);
    assert_eq!(report.expenditures.negative_amounts, 1);
    let e = engine(store);
    let filter = ScopeFilter::all();
    let scope = e.compute_scope(&filter);

    let x = &scope.mp_metrics[0];
    assert_relative_eq!(x.utilization_pct, 40.0, epsilon = 1e-9);
    assert_relative_eq!(x.completion_pct, 50.0, epsilon = 1e-9);
    assert_relative_eq!(x.transparency_pct, 100.0, epsilon = 1e-9);

    let out = tempfile::tempdir().unwrap();
    let ranked = e.rank_mps(&scope.mp_metrics, MpSortKey::Expenditure, 10);
    let mp_rows = reports::mp_ranking_rows(&ranked);
    output::write_csv(&out.path().join("mps.csv"), &mp_rows).unwrap();
    let trend_rows = reports::trend_rows(&e.monthly_trends(&filter));
    output::write_csv(&out.path().join("trends.csv"), &trend_rows).unwrap();

    let mps_csv = fs::read_to_string(out.path().join("mps.csv")).unwrap();
    assert!(mps_csv.starts_with("Rank,MP,State,Allocated,Spent,UtilizationPct"));
    assert!(mps_csv.contains("\"1,000,000.00\""));
    let trends_csv = fs::read_to_string(out.path().join("trends.csv")).unwrap();
    assert_eq!(trends_csv.lines().count(), 3);

    let summary = SummaryDocument {
        stats: e.global_stats(&filter),
        flags: e.flag_categories(&scope.category_metrics),
        trends: e.monthly_trends(&filter),
        scope,
    };
    let path = out.path().join("summary.json");
    output::write_json(&path, &summary).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    let back: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(back["stats"]["total_spent_paise"], 40_000_000);
    assert_eq!(back["trends"][0]["month"], "2026-01");
}

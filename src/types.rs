use crate::trends::YearMonth;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::Tabled;

// ---------------------------------------------------------------------------
// Raw portal rows. Every column is optional and loosely typed; the loader
// turns them into the clean records below.
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RawAllocationRow {
    #[serde(rename = "MP_NAME")]
    pub mp_name: Option<Value>,
    #[serde(rename = "CONSTITUENCY")]
    pub constituency: Option<Value>,
    #[serde(rename = "STATE_NAME")]
    pub state_name: Option<Value>,
    #[serde(rename = "ALLOCATED_AMT")]
    pub allocated_amt: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RawRecommendedRow {
    #[serde(rename = "WORK_RECOMMENDATION_DTL_ID")]
    pub work_id: Option<Value>,
    #[serde(rename = "MP_NAME")]
    pub mp_name: Option<Value>,
    #[serde(rename = "STATE_NAME")]
    pub state_name: Option<Value>,
    #[serde(rename = "ACTIVITY_NAME", alias = "WORK_CATEGORY")]
    pub activity_name: Option<Value>,
    #[serde(rename = "WORK_DESCRIPTION")]
    pub work_description: Option<Value>,
    #[serde(rename = "RECOMMENDED_AMOUNT")]
    pub recommended_amount: Option<Value>,
    #[serde(rename = "RECOMMENDATION_DATE")]
    pub recommendation_date: Option<Value>,
    #[serde(rename = "ATTACH_ID")]
    pub attach_id: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RawExpenditureRow {
    #[serde(rename = "WORK_RECOMMENDATION_DTL_ID")]
    pub work_id: Option<Value>,
    #[serde(rename = "MP_NAME")]
    pub mp_name: Option<Value>,
    #[serde(rename = "STATE_NAME")]
    pub state_name: Option<Value>,
    #[serde(rename = "VENDOR_NAME")]
    pub vendor_name: Option<Value>,
    #[serde(rename = "ACTIVITY_NAME")]
    pub activity_name: Option<Value>,
    #[serde(rename = "FUND_DISBURSED_AMT")]
    pub fund_disbursed_amt: Option<Value>,
    #[serde(rename = "EXPENDITURE_DATE")]
    pub expenditure_date: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RawCompletedRow {
    #[serde(rename = "WORK_RECOMMENDATION_DTL_ID")]
    pub work_id: Option<Value>,
    #[serde(rename = "MP_NAME")]
    pub mp_name: Option<Value>,
    #[serde(rename = "STATE_NAME")]
    pub state_name: Option<Value>,
    #[serde(rename = "ACTUAL_AMOUNT")]
    pub actual_amount: Option<Value>,
    #[serde(rename = "ACTUAL_END_DATE")]
    pub actual_end_date: Option<Value>,
    #[serde(rename = "ATTACH_ID")]
    pub attach_id: Option<Value>,
}

// ---------------------------------------------------------------------------
// Clean records held by the `RecordStore`. Amounts are integer paise.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub mp_name: String,
    pub constituency: String,
    pub state: String,
    pub allocated_paise: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendedWork {
    pub work_id: String,
    pub mp_name: String,
    pub state: Option<String>,
    pub category: Option<String>,
    pub description: String,
    pub recommended_paise: i64,
    pub recommendation_date: Option<String>,
    pub attach_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expenditure {
    pub work_id: Option<String>,
    pub mp_name: Option<String>,
    pub state: Option<String>,
    pub vendor: String,
    pub category: Option<String>,
    pub disbursed_paise: i64,
    pub expenditure_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedWork {
    pub work_id: String,
    pub mp_name: Option<String>,
    pub state: Option<String>,
    pub actual_paise: i64,
    pub completion_date: Option<String>,
    pub attach_id: Option<String>,
}

impl CompletedWork {
    pub fn has_proof(&self) -> bool {
        self.attach_id.is_some()
    }
}

// ---------------------------------------------------------------------------
// Derived metrics. Plain numbers only; rounding and currency rendering are
// left to `reports`.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MpMetrics {
    pub name: String,
    pub state: String,
    pub constituency: String,
    pub allocated_paise: i64,
    pub spent_paise: i64,
    pub utilization_pct: f64,
    pub recommended_count: usize,
    pub completed_count: usize,
    pub with_proof_count: usize,
    pub completion_pct: f64,
    pub transparency_pct: f64,
    pub vendor_count: usize,
    pub top1_vendor_share_pct: f64,
    pub top3_vendor_share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryAmount {
    pub category: String,
    pub amount_paise: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorMetrics {
    pub name: String,
    pub received_paise: i64,
    pub payment_count: usize,
    pub mp_count: usize,
    /// Received amount spread over the distinct MPs paying this vendor.
    /// A large value with a small `mp_count` is the outlier pattern.
    pub amount_per_mp_paise: f64,
    pub categories: Vec<CategoryAmount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryMetrics {
    pub category: String,
    pub spend_paise: i64,
    pub share_pct: f64,
    pub national_share_pct: f64,
    /// `None` when the category has no national spend.
    pub lift: Option<f64>,
    pub recommended_count: usize,
    pub completed_count: usize,
    pub with_proof_count: usize,
    pub completion_pct: f64,
    pub transparency_pct: f64,
    pub vendor_count: usize,
    pub top1_vendor_share_pct: f64,
    pub top3_vendor_share_pct: f64,
}

/// Scope-wide totals. Orphan rows are included here even when they could
/// not be attributed to an MP or category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScopeTotals {
    pub allocated_paise: i64,
    pub spent_paise: i64,
    pub recommended_count: usize,
    pub completed_count: usize,
    pub with_proof_count: usize,
    pub expenditure_rows: usize,
}

/// Tally of rows that could not take part in every join.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReferenceStats {
    /// Expenditures whose work id and MP could not be resolved.
    pub orphan_expenditures: usize,
    /// Completions whose work id is absent from the recommended works.
    pub orphan_completions: usize,
    /// Works (or payments) attributed to an MP with no allocation row.
    pub unallocated_rows: usize,
    /// Dated rows whose date text did not parse.
    pub unparsed_dates: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScopeMetrics {
    pub mp_metrics: Vec<MpMetrics>,
    pub vendor_metrics: Vec<VendorMetrics>,
    pub category_metrics: Vec<CategoryMetrics>,
    pub totals: ScopeTotals,
    pub references: ReferenceStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    // Declaration order is the report order.
    High,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagCode {
    HighSpendLowTransparency,
    LiftOutlier,
    VendorConcentration,
}

impl FlagCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagCode::HighSpendLowTransparency => "HIGH_SPEND_LOW_TRANSPARENCY",
            FlagCode::LiftOutlier => "LIFT_OUTLIER",
            FlagCode::VendorConcentration => "VENDOR_CONCENTRATION",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flag {
    pub code: FlagCode,
    pub severity: Severity,
    pub category: String,
    pub title: String,
    pub detail: String,
    #[serde(skip)]
    pub spend_paise: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyPoint<V> {
    pub month: YearMonth,
    pub value: V,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub month: YearMonth,
    pub spent_paise: i64,
    pub completed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GlobalStats {
    pub total_allocated_paise: i64,
    pub total_spent_paise: i64,
    pub total_works_recommended: usize,
    pub total_works_completed: usize,
    pub utilization_pct: f64,
    pub completion_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateMetrics {
    pub state: String,
    pub allocated_paise: i64,
    pub spent_paise: i64,
    pub works_recommended: usize,
    pub works_completed: usize,
    pub utilization_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopBottom {
    pub top_spenders: Vec<MpMetrics>,
    pub zero_spenders: Vec<MpMetrics>,
    pub top_transparent: Vec<MpMetrics>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SearchHit {
    pub name: String,
    pub state: String,
    pub constituency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    Completed,
    InProgress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkSummary {
    pub work_id: String,
    pub description: String,
    pub recommended_paise: i64,
    pub recommendation_date: Option<String>,
    pub status: WorkStatus,
    pub completion_date: Option<String>,
    pub attach_id: Option<String>,
    pub actual_paise: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MpDetail {
    pub metrics: MpMetrics,
    pub recent_works: Vec<WorkSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorPayment {
    pub mp_name: Option<String>,
    pub category: String,
    pub amount_paise: i64,
    pub date: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorDetail {
    pub name: String,
    pub payments: Vec<VendorPayment>,
}

// ---------------------------------------------------------------------------
// Rendered report rows (CSV + console preview). All values pre-formatted.
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MpRankingRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "MP")]
    #[tabled(rename = "MP")]
    pub name: String,
    #[serde(rename = "State")]
    #[tabled(rename = "State")]
    pub state: String,
    #[serde(rename = "Allocated")]
    #[tabled(rename = "Allocated")]
    pub allocated: String,
    #[serde(rename = "Spent")]
    #[tabled(rename = "Spent")]
    pub spent: String,
    #[serde(rename = "UtilizationPct")]
    #[tabled(rename = "UtilizationPct")]
    pub utilization_pct: String,
    #[serde(rename = "CompletionPct")]
    #[tabled(rename = "CompletionPct")]
    pub completion_pct: String,
    #[serde(rename = "TransparencyPct")]
    #[tabled(rename = "TransparencyPct")]
    pub transparency_pct: String,
    #[serde(rename = "Top3VendorSharePct")]
    #[tabled(rename = "Top3VendorSharePct")]
    pub top3_vendor_share_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct VendorRankingRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Vendor")]
    #[tabled(rename = "Vendor")]
    pub name: String,
    #[serde(rename = "Received")]
    #[tabled(rename = "Received")]
    pub received: String,
    #[serde(rename = "Payments")]
    #[tabled(rename = "Payments")]
    pub payments: usize,
    #[serde(rename = "MPs")]
    #[tabled(rename = "MPs")]
    pub mp_count: usize,
    #[serde(rename = "AmountPerMP")]
    #[tabled(rename = "AmountPerMP")]
    pub amount_per_mp: String,
    #[serde(rename = "TopCategory")]
    #[tabled(rename = "TopCategory")]
    pub top_category: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CategoryRow {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Spend")]
    #[tabled(rename = "Spend")]
    pub spend: String,
    #[serde(rename = "SharePct")]
    #[tabled(rename = "SharePct")]
    pub share_pct: String,
    #[serde(rename = "Lift")]
    #[tabled(rename = "Lift")]
    pub lift: String,
    #[serde(rename = "CompletionPct")]
    #[tabled(rename = "CompletionPct")]
    pub completion_pct: String,
    #[serde(rename = "TransparencyPct")]
    #[tabled(rename = "TransparencyPct")]
    pub transparency_pct: String,
    #[serde(rename = "Top3VendorSharePct")]
    #[tabled(rename = "Top3VendorSharePct")]
    pub top3_vendor_share_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct FlagRow {
    #[serde(rename = "Severity")]
    #[tabled(rename = "Severity")]
    pub severity: String,
    #[serde(rename = "Code")]
    #[tabled(rename = "Code")]
    pub code: String,
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Detail")]
    #[tabled(rename = "Detail")]
    pub detail: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct TrendRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "Spent")]
    #[tabled(rename = "Spent")]
    pub spent: String,
    #[serde(rename = "Completed")]
    #[tabled(rename = "Completed")]
    pub completed: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct StateRow {
    #[serde(rename = "State")]
    #[tabled(rename = "State")]
    pub state: String,
    #[serde(rename = "Allocated")]
    #[tabled(rename = "Allocated")]
    pub allocated: String,
    #[serde(rename = "Spent")]
    #[tabled(rename = "Spent")]
    pub spent: String,
    #[serde(rename = "WorksRecommended")]
    #[tabled(rename = "WorksRecommended")]
    pub works_recommended: usize,
    #[serde(rename = "WorksCompleted")]
    #[tabled(rename = "WorksCompleted")]
    pub works_completed: usize,
    #[serde(rename = "UtilizationPct")]
    #[tabled(rename = "UtilizationPct")]
    pub utilization_pct: String,
}

/// Machine-readable companion to the CSV reports.
#[derive(Debug, Serialize)]
pub struct SummaryDocument {
    pub stats: GlobalStats,
    pub scope: ScopeMetrics,
    pub flags: Vec<Flag>,
    pub trends: Vec<TrendPoint>,
}

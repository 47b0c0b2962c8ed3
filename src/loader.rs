use crate::error::LoadError;
use crate::store::{RecordStore, StoreStats};
use crate::types::{
    Allocation, CompletedWork, Expenditure, RawAllocationRow, RawCompletedRow, RawExpenditureRow,
    RawRecommendedRow, RecommendedWork,
};
use crate::util::{to_paise, value_to_f64, value_to_text};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

pub const ALLOCATIONS_FILE: &str = "allocated_limit.json";
pub const EXPENDITURE_FILE: &str = "total_expenditure.json";
pub const RECOMMENDED_FILE: &str = "total_works_recommended.json";
pub const COMPLETED_FILE: &str = "total_works_completed.json";

pub const ALLOCATIONS_KEY: &str = "Allocated Limit";
pub const EXPENDITURE_KEY: &str = "Total Expenditure";
pub const RECOMMENDED_KEY: &str = "Total Works Recommended";
pub const COMPLETED_KEY: &str = "Total Works Completed";

const UNKNOWN_VENDOR: &str = "Unknown Vendor";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    /// The export file was absent; the table was loaded empty.
    pub missing: bool,
    /// Amounts below zero (portal reversal rows), stored as 0.
    pub negative_amounts: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub allocations: TableReport,
    pub recommended: TableReport,
    pub expenditures: TableReport,
    pub completed: TableReport,
    pub store: StoreStats,
}

impl LoadReport {
    pub fn parse_errors(&self) -> usize {
        self.allocations.parse_errors
            + self.recommended.parse_errors
            + self.expenditures.parse_errors
            + self.completed.parse_errors
    }
}

/// Load the four portal exports from `dir` into a fresh `RecordStore`.
///
/// A missing file yields an empty table (partial refreshes are normal); a
/// present but malformed file is an error.
pub fn load_store(dir: &Path) -> Result<(RecordStore, LoadReport), LoadError> {
    let mut report = LoadReport::default();

    let (allocations, r) =
        load_table(&dir.join(ALLOCATIONS_FILE), ALLOCATIONS_KEY, clean_allocation)?;
    report.allocations = r;
    let (works, r) =
        load_table(&dir.join(RECOMMENDED_FILE), RECOMMENDED_KEY, clean_recommended)?;
    report.recommended = r;
    let (expenditures, r) =
        load_table(&dir.join(EXPENDITURE_FILE), EXPENDITURE_KEY, clean_expenditure)?;
    report.expenditures = r;
    let (completions, r) =
        load_table(&dir.join(COMPLETED_FILE), COMPLETED_KEY, clean_completed)?;
    report.completed = r;

    let store = RecordStore::new(allocations, works, expenditures, completions);
    report.store = store.stats().clone();
    info!(
        allocations = store.allocations().len(),
        works = store.works().len(),
        expenditures = store.expenditures().len(),
        completions = store.completions().len(),
        parse_errors = report.parse_errors(),
        "record store loaded"
    );
    Ok((store, report))
}

fn load_table<R, T, F>(
    path: &Path,
    key: &str,
    clean: F,
) -> Result<(Vec<T>, TableReport), LoadError>
where
    R: DeserializeOwned,
    F: Fn(R, &mut TableReport) -> Option<T>,
{
    let mut report = TableReport::default();
    if !path.exists() {
        warn!(path = %path.display(), "export file missing, table left empty");
        report.missing = true;
        return Ok((Vec::new(), report));
    }
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = extract_rows(path, key, &text)?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        report.total_rows += 1;
        let raw: R = match serde_json::from_value(row) {
            Ok(r) => r,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping undecodable row");
                report.parse_errors += 1;
                continue;
            }
        };
        match clean(raw, &mut report) {
            Some(rec) => out.push(rec),
            None => report.parse_errors += 1,
        }
    }
    report.loaded_rows = out.len();
    info!(
        path = %path.display(),
        rows = report.loaded_rows,
        skipped = report.parse_errors,
        negative = report.negative_amounts,
        "loaded export"
    );
    Ok((out, report))
}

/// The portal wraps each table as `{"<key>": "<JSON string of rows>"}`.
/// Bare arrays and already-decoded inner arrays are accepted too.
pub fn extract_rows(path: &Path, key: &str, text: &str) -> Result<Vec<Value>, LoadError> {
    let outer: Value = serde_json::from_str(text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let inner = match outer {
        Value::Array(rows) => return Ok(rows),
        Value::Object(mut map) => map.remove(key).ok_or_else(|| LoadError::MissingKey {
            path: path.to_path_buf(),
            key: key.to_string(),
        })?,
        _ => {
            return Err(LoadError::InnerJson {
                path: path.to_path_buf(),
                key: key.to_string(),
                reason: "top level is neither an object nor an array".to_string(),
            })
        }
    };
    let inner = match inner {
        Value::String(s) => serde_json::from_str(&s).map_err(|e| LoadError::InnerJson {
            path: path.to_path_buf(),
            key: key.to_string(),
            reason: e.to_string(),
        })?,
        other => other,
    };
    match inner {
        Value::Array(rows) => Ok(rows),
        Value::Null => Ok(Vec::new()),
        _ => Err(LoadError::InnerJson {
            path: path.to_path_buf(),
            key: key.to_string(),
            reason: "payload is not an array".to_string(),
        }),
    }
}

/// Amounts are non-negative paise. Reversal rows keep their other columns
/// but contribute nothing, and are counted on the table report.
fn amount_paise(v: Option<&Value>, report: &mut TableReport) -> i64 {
    let paise = to_paise(value_to_f64(v));
    if paise < 0 {
        debug!(paise, "negative amount stored as 0");
        report.negative_amounts += 1;
        return 0;
    }
    paise
}

fn clean_allocation(row: RawAllocationRow, report: &mut TableReport) -> Option<Allocation> {
    let mp_name = value_to_text(row.mp_name.as_ref())?;
    Some(Allocation {
        mp_name,
        constituency: value_to_text(row.constituency.as_ref()).unwrap_or_default(),
        state: value_to_text(row.state_name.as_ref()).unwrap_or_default(),
        allocated_paise: amount_paise(row.allocated_amt.as_ref(), report),
    })
}

fn clean_recommended(row: RawRecommendedRow, report: &mut TableReport) -> Option<RecommendedWork> {
    let work_id = value_to_text(row.work_id.as_ref())?;
    Some(RecommendedWork {
        work_id,
        mp_name: value_to_text(row.mp_name.as_ref()).unwrap_or_default(),
        state: value_to_text(row.state_name.as_ref()),
        category: value_to_text(row.activity_name.as_ref()),
        description: value_to_text(row.work_description.as_ref()).unwrap_or_default(),
        recommended_paise: amount_paise(row.recommended_amount.as_ref(), report),
        recommendation_date: value_to_text(row.recommendation_date.as_ref()),
        attach_id: value_to_text(row.attach_id.as_ref()),
    })
}

fn clean_expenditure(row: RawExpenditureRow, report: &mut TableReport) -> Option<Expenditure> {
    // Payments with neither a work id nor an MP are still kept: they count
    // towards vendor and scope totals.
    Some(Expenditure {
        work_id: value_to_text(row.work_id.as_ref()),
        mp_name: value_to_text(row.mp_name.as_ref()),
        state: value_to_text(row.state_name.as_ref()),
        vendor: value_to_text(row.vendor_name.as_ref())
            .unwrap_or_else(|| UNKNOWN_VENDOR.to_string()),
        category: value_to_text(row.activity_name.as_ref()),
        disbursed_paise: amount_paise(row.fund_disbursed_amt.as_ref(), report),
        expenditure_date: value_to_text(row.expenditure_date.as_ref()),
    })
}

fn clean_completed(row: RawCompletedRow, report: &mut TableReport) -> Option<CompletedWork> {
    let work_id = value_to_text(row.work_id.as_ref())?;
    Some(CompletedWork {
        work_id,
        mp_name: value_to_text(row.mp_name.as_ref()),
        state: value_to_text(row.state_name.as_ref()),
        actual_paise: amount_paise(row.actual_amount.as_ref(), report),
        completion_date: value_to_text(row.actual_end_date.as_ref()),
        attach_id: value_to_text(row.attach_id.as_ref()),
    })
}

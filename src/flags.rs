// Advisory flags over category metrics.
//
// Each rule looks at one category at a time; a category can raise several
// flags. Output is ordered high severity first, then by spend (largest
// first), then by category name and rule, so identical input always gives
// an identical list.
use crate::config::Thresholds;
use crate::types::{CategoryMetrics, Flag, FlagCode, Severity};
use std::cmp::Ordering;

/// Categories by spend, largest first, at most `limit` of them. Equal spend
/// keeps the input order.
pub fn rank_categories(categories: &[CategoryMetrics], limit: usize) -> Vec<CategoryMetrics> {
    let mut ranked = categories.to_vec();
    ranked.sort_by(|a, b| b.spend_paise.cmp(&a.spend_paise));
    ranked.truncate(limit.min(ranked.len()));
    ranked
}

/// Nearest-rank percentile of `values` (`p` in 0..=100). `None` for an
/// empty slice.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let p = p.clamp(0.0, 100.0);
    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    Some(sorted[rank.clamp(1, sorted.len()) - 1])
}

pub fn flag_categories(categories: &[CategoryMetrics], thresholds: &Thresholds) -> Vec<Flag> {
    let spending_shares: Vec<f64> = categories
        .iter()
        .filter(|c| c.spend_paise > 0)
        .map(|c| c.share_pct)
        .collect();
    let share_cutoff = percentile(&spending_shares, thresholds.spend_share_percentile);

    let mut flags = Vec::new();
    for c in categories {
        if let Some(cutoff) = share_cutoff {
            if c.spend_paise > 0
                && c.share_pct >= cutoff
                && c.transparency_pct < thresholds.transparency_floor_pct
            {
                flags.push(Flag {
                    code: FlagCode::HighSpendLowTransparency,
                    severity: Severity::High,
                    category: c.category.clone(),
                    title: "High spend with little completion proof".to_string(),
                    detail: format!(
                        "{:.1}% of spend (cutoff {:.1}%), only {:.1}% of {} completed \
                         works carry proof",
                        c.share_pct,
                        cutoff,
                        c.transparency_pct,
                        c.completed_count
                    ),
                    spend_paise: c.spend_paise,
                });
            }
        }

        if let Some(lift) = c.lift {
            let outlier =
                lift >= thresholds.lift_multiple || lift <= 1.0 / thresholds.lift_multiple;
            if outlier && c.spend_paise >= thresholds.materiality_floor_paise {
                let direction = if lift >= 1.0 { "over" } else { "under" };
                flags.push(Flag {
                    code: FlagCode::LiftOutlier,
                    severity: Severity::Warning,
                    category: c.category.clone(),
                    title: format!("Category {}-represented against national spend", direction),
                    detail: format!(
                        "{:.1}% of scope spend vs {:.1}% nationally (lift {:.2}x)",
                        c.share_pct, c.national_share_pct, lift
                    ),
                    spend_paise: c.spend_paise,
                });
            }
        }

        if c.spend_paise > 0 && c.top3_vendor_share_pct >= thresholds.concentration_warning_pct {
            let severity = if c.top3_vendor_share_pct >= thresholds.concentration_high_pct {
                Severity::High
            } else {
                Severity::Warning
            };
            flags.push(Flag {
                code: FlagCode::VendorConcentration,
                severity,
                category: c.category.clone(),
                title: "Spend concentrated in few vendors".to_string(),
                detail: format!(
                    "top 3 of {} vendors received {:.1}% of spend (top vendor {:.1}%)",
                    c.vendor_count, c.top3_vendor_share_pct, c.top1_vendor_share_pct
                ),
                spend_paise: c.spend_paise,
            });
        }
    }

    flags.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| b.spend_paise.cmp(&a.spend_paise))
            .then_with(|| a.category.cmp(&b.category))
            .then_with(|| a.code.cmp(&b.code))
    });
    flags
}

// MPLADS report binary.
//
// - Option [1] loads the four portal exports and prints diagnostics.
// - Option [2] computes the scope metrics, writes the CSV reports and a
//   JSON summary, and previews each report on the console.
// - Option [3] searches representatives and shows one MP's detail.
// `--batch` runs [1] then [2] once and exits.
use clap::Parser;
use mplads_report::analytics::{MpSortKey, DEFAULT_SEARCH_LIMIT};
use mplads_report::types::SummaryDocument;
use mplads_report::util::{format_int, format_number, format_rupees};
use mplads_report::{loader, output, reports, Engine, EngineConfig, ScopeFilter};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// MPLADS portal metrics report
#[derive(Parser, Debug, Clone)]
#[command(name = "mplads_report")]
#[command(about = "Utilization, completion, transparency and vendor reports over MPLADS exports")]
struct Args {
    /// Directory holding the four portal JSON exports
    #[arg(long, env = "MPLADS_DATA_DIR", default_value = "data/raw")]
    data_dir: PathBuf,

    /// Directory the CSV / JSON reports are written to
    #[arg(long, env = "MPLADS_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// JSON file overriding the flag thresholds
    #[arg(long, env = "MPLADS_THRESHOLDS")]
    thresholds: Option<PathBuf>,

    /// Restrict reports to one state
    #[arg(long)]
    state: Option<String>,

    /// Restrict reports to one MP
    #[arg(long)]
    mp: Option<String>,

    /// Restrict reports to one vendor
    #[arg(long)]
    vendor: Option<String>,

    /// Only the trailing N months of expenditure and completions
    #[arg(long)]
    months: Option<u32>,

    /// Rows per ranking report
    #[arg(long, default_value_t = 100)]
    limit: usize,

    /// MP ranking order: expenditure, completion, transparency
    #[arg(long, default_value = "expenditure")]
    sort_by: MpSortKey,

    /// Load and generate once, without the menu
    #[arg(long)]
    batch: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn scope(&self) -> ScopeFilter {
        ScopeFilter {
            state: self.state.clone(),
            mp: self.mp.clone(),
            vendor: self.vendor.clone(),
            months: self.months,
        }
    }
}

// Per-run state: the engine over the most recently loaded snapshot.
struct AppState {
    config: EngineConfig,
    engine: Option<Engine>,
}

/// Prompt and read one trimmed line. `None` once stdin is closed.
fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

/// `Y` returns to the menu, `N` (or a closed stdin) ends the session.
fn prompt_back_to_menu() -> bool {
    loop {
        let Some(answer) = read_line("Back to Report Selection (Y/N): ") else {
            return false;
        };
        match answer.to_ascii_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Please answer Y or N."),
        }
    }
}

/// Handle option [1]: load the exports into a fresh snapshot.
fn handle_load(args: &Args, state: &mut AppState) {
    match loader::load_store(&args.data_dir) {
        Ok((store, report)) => {
            println!(
                "Processing dataset... ({} allocations, {} works, {} payments, {} completions)",
                format_int(report.allocations.loaded_rows),
                format_int(report.recommended.loaded_rows),
                format_int(report.expenditures.loaded_rows),
                format_int(report.completed.loaded_rows)
            );
            println!(
                "Skipped {} rows that failed to parse.",
                format_int(report.parse_errors())
            );
            let dupes = report.store.duplicate_allocations
                + report.store.duplicate_works
                + report.store.duplicate_completions;
            if dupes > 0 {
                println!("Info: dropped {} duplicate rows.", format_int(dupes));
            }
            println!();
            let store = Arc::new(store);
            state.engine = Some(match &state.engine {
                Some(engine) => engine.with_store(store),
                None => Engine::new(store, state.config.clone()),
            });
        }
        Err(e) => {
            error!("failed to load exports: {}", e);
            eprintln!("Failed to load data: {}\n", e);
        }
    }
}

/// Write one report to `out_dir` and preview its first rows.
fn emit<T>(out_dir: &Path, title: &str, file: &str, rows: &[T], preview: usize)
where
    T: serde::Serialize + tabled::Tabled + Clone,
{
    if let Err(e) = output::write_csv(&out_dir.join(file), rows) {
        error!(%file, "report not written: {}", e);
    }
    println!("{}\n", title);
    output::preview_table_rows(rows, preview);
    println!("({} rows written to {})\n", rows.len(), file);
}

/// Handle option [2]: compute the scope and write every report.
fn handle_generate_reports(args: &Args, state: &AppState) {
    let Some(engine) = &state.engine else {
        println!("No data loaded yet. Choose option 1 first.\n");
        return;
    };
    let filter = args.scope();
    info!(?filter, out_dir = %args.out_dir.display(), "generating reports");
    let out = args.out_dir.as_path();

    let scope = engine.compute_scope(&filter);
    let stats = engine.global_stats(&filter);
    let flags = engine.flag_categories(&scope.category_metrics);
    let trends = engine.monthly_trends(&filter);

    emit(
        out,
        "Report 1: MP Fund Utilization Ranking",
        "report1_mp_ranking.csv",
        &reports::mp_ranking_rows(&engine.rank_mps(&scope.mp_metrics, args.sort_by, args.limit)),
        3,
    );
    emit(
        out,
        "Report 2: Top Vendors by Amount Received",
        "report2_vendor_ranking.csv",
        &reports::vendor_ranking_rows(&engine.rank_vendors(&scope.vendor_metrics, args.limit)),
        3,
    );
    emit(
        out,
        "Report 3: Category Spend, Lift and Transparency",
        "report3_category_radar.csv",
        &reports::category_rows(&engine.rank_categories(&scope.category_metrics, args.limit)),
        3,
    );
    emit(out, "Report 4: Category Flags", "report4_flags.csv", &reports::flag_rows(&flags), 5);
    emit(
        out,
        "Report 5: Monthly Spend and Completions (months without activity omitted)",
        "report5_monthly_trends.csv",
        &reports::trend_rows(&trends),
        3,
    );
    emit(
        out,
        "Report 6: State Summary",
        "report6_state_summary.csv",
        &reports::state_rows(&engine.state_rollup(filter.months)),
        3,
    );

    println!(
        "Totals: allocated {}, spent {} ({}%), {}% of recommended works completed\n",
        format_rupees(stats.total_allocated_paise),
        format_rupees(stats.total_spent_paise),
        format_number(stats.utilization_pct, 2),
        format_number(stats.completion_pct, 2)
    );
    let summary = SummaryDocument {
        stats,
        scope,
        flags,
        trends,
    };
    if let Err(e) = output::write_json(&out.join("summary.json"), &summary) {
        error!("summary.json not written: {}", e);
    }
}

/// Handle option [3]: search MPs by name or constituency, then show the
/// first hit in detail.
fn handle_search(state: &AppState) {
    let Some(engine) = &state.engine else {
        println!("No data loaded yet. Choose option 1 first.\n");
        return;
    };
    let Some(query) = read_line("Search MP or constituency: ") else {
        return;
    };
    let hits = engine.search(&query, DEFAULT_SEARCH_LIMIT);
    if hits.is_empty() {
        println!("No matches.\n");
        return;
    }
    for (i, h) in hits.iter().enumerate() {
        println!("[{}] {} ({}, {})", i + 1, h.name, h.constituency, h.state);
    }
    let Some(detail) = engine.mp_detail(&hits[0].name) else {
        return;
    };
    let m = &detail.metrics;
    println!(
        "\n{}: spent {} of {} ({}%), {} of {} works completed, {} with proof\n",
        m.name,
        format_rupees(m.spent_paise),
        format_rupees(m.allocated_paise),
        format_number(m.utilization_pct, 2),
        m.completed_count,
        m.recommended_count,
        m.with_proof_count
    );
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("mplads_report={},warn", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = match &args.thresholds {
        Some(path) => match EngineConfig::from_json_file(path) {
            Ok(c) => c,
            Err(e) => {
                error!("configuration error: {}", e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };
    let mut state = AppState {
        config,
        engine: None,
    };

    if args.batch {
        handle_load(&args, &mut state);
        if state.engine.is_none() {
            std::process::exit(1);
        }
        handle_generate_reports(&args, &state);
        return;
    }

    loop {
        println!("Select Option:");
        println!("[1] Load the data files");
        println!("[2] Generate Reports");
        println!("[3] Search MPs\n");
        let Some(choice) = read_line("Enter choice: ") else {
            break;
        };
        match choice.as_str() {
            "1" => {
                handle_load(&args, &mut state);
            }
            "2" => {
                println!();
                handle_generate_reports(&args, &state);
                if !prompt_back_to_menu() {
                    break;
                }
            }
            "3" => {
                handle_search(&state);
            }
            _ => {
                println!("Invalid choice. Please enter 1, 2 or 3.\n");
            }
        }
    }
}

use clap::{Parser, Subcommand};
use loginsight::capabilities::{Capabilities, StaticCapabilities};
use loginsight::notes::{self, DailyDigest, WeeklyDigest};
use loginsight::report::{self, ReportContent, ReportKind, ReportMetadata};
use loginsight::settings::Settings;
use loginsight::{patterns, scanner, tabular, InsightError};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing_subscriber::EnvFilter;

fn init_parallelism() {
    static START: Once = Once::new();
    START.call_once(|| {
        let n = num_cpus::get();
        let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
    });
}

#[derive(Parser, Debug)]
#[command(name = "loginsight", version, about = "Log statistics and note summaries as JSON reports")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a log or text file (CSV files get a tabular description)
    Scan {
        input: PathBuf,
        /// Pattern document (JSON); overrides LOGINSIGHT_PATTERNS
        #[arg(long = "patterns")]
        patterns: Option<PathBuf>,
        /// Scan in parallel chunks of this many lines; holds up to this many
        /// lines per worker thread in memory
        #[arg(long = "chunk-lines")]
        chunk_lines: Option<usize>,
    },
    /// Summarize one day of JSONL notes
    Digest { input: PathBuf },
    /// Roll up a week of daily JSONL notes named YYYY-MM-DD.jsonl
    Weekly {
        /// Directory holding the daily files
        #[arg(long = "dir")]
        dir: PathBuf,
        /// ISO week, e.g. 2024-W05
        #[arg(long = "week", conflicts_with = "date")]
        week: Option<String>,
        /// Any day of the week (YYYY-MM-DD); defaults to today
        #[arg(long = "date")]
        date: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let settings = Settings::from_env();
    let caps = StaticCapabilities::from_settings(&settings);

    let report = match cli.command {
        Command::Scan { input, patterns, chunk_lines } => {
            let pattern_path = patterns.or_else(|| settings.patterns_path.clone());
            run_scan(&input, pattern_path.as_deref(), chunk_lines, &caps)?
        }
        Command::Digest { input } => {
            let read = notes::read_notes_file(&input)?;
            let digest = DailyDigest::from_entries(&read.entries, &settings.default_topic);
            report::assemble(
                ReportKind::Notes,
                ReportMetadata::now(input.display().to_string(), caps.snapshot()),
                ReportContent::Daily(digest),
            )
        }
        Command::Weekly { dir, week, date } => {
            let span = match (week, date) {
                (Some(w), _) => notes::week_for_iso(&w)?,
                (None, Some(d)) => notes::week_containing(notes::parse_date(&d)?),
                (None, None) => notes::week_containing(chrono::Local::now().date_naive()),
            };
            let mut days = Vec::with_capacity(span.days.len());
            for day in &span.days {
                let path = dir.join(format!("{}.jsonl", day.format("%Y-%m-%d")));
                let entries = match notes::read_notes_file(&path) {
                    Ok(read) => read.entries,
                    Err(InsightError::NotFound(_)) => Vec::new(),
                    Err(e) => return Err(e.into()),
                };
                days.push(DailyDigest::from_entries(&entries, &settings.default_topic));
            }
            let weekly = WeeklyDigest::from_days(span.week_id.clone(), &days);
            report::assemble(
                ReportKind::WeeklyNotes,
                ReportMetadata::now(span.week_id, caps.snapshot()),
                ReportContent::Weekly(weekly),
            )
        }
    };

    println!("{}", report.to_json_pretty()?);
    Ok(())
}

fn run_scan(
    input: &Path,
    pattern_path: Option<&Path>,
    chunk_lines: Option<usize>,
    caps: &StaticCapabilities,
) -> anyhow::Result<report::Report> {
    if !input.exists() {
        return Err(InsightError::NotFound(input.to_path_buf()).into());
    }
    let metadata = ReportMetadata::now(input.display().to_string(), caps.snapshot());
    let is_csv = input.extension().is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv && caps.supports_tabular_input() {
        let summary = tabular::describe_csv_file(input)?;
        return Ok(report::assemble(ReportKind::Tabular, metadata, ReportContent::Table(summary)));
    }

    let load = patterns::load_from_path(pattern_path);
    let set = load.into_set();
    let stats = match chunk_lines {
        Some(n) => {
            init_parallelism();
            scanner::scan_file_parallel(input, &set, n)?
        }
        None => scanner::scan_file(input, &set)?,
    };
    Ok(report::assemble(ReportKind::Log, metadata, ReportContent::Scan(stats)))
}

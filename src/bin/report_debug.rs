//! Debug wrapper that runs a raw payload through the normalizer and prints
//! what the dashboard would see.
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use clap::Parser;
use dataqa_report::history;
use dataqa_report::normalize::NormalizeOptions;
use dataqa_report::{Report, SessionContext, normalize_with};
use serde_json::Value;

/// Normalize a Data QA payload and dump the canonical report
#[derive(Parser, Debug)]
#[command(name = "report_debug")]
#[command(version, about, long_about = None)]
#[command(after_help = "Examples:
  report_debug run.json                    Normalize a raw results payload
  report_debug --history records.json      Adapt stored history records first
  cat run.json | report_debug --summary    Just the reconciled summary
")]
struct Cli {
    /// Payload file (reads stdin when omitted)
    input: Option<PathBuf>,

    /// Treat the input as an array of stored history records
    #[arg(long)]
    history: bool,

    /// Print only the reconciled summary block
    #[arg(long)]
    summary: bool,

    /// Cap sample rows kept per test (0 keeps everything)
    #[arg(long)]
    sample_cap: Option<usize>,

    // === Context overrides ===
    /// Project id to stamp on the report
    #[arg(long)]
    project_id: Option<String>,

    /// Execution id to stamp on the report
    #[arg(long)]
    execution_id: Option<String>,

    /// Comparison mode hint (e.g. "scd", "config")
    #[arg(long)]
    comparison_mode: Option<String>,

    /// Fallback executor name
    #[arg(long)]
    executed_by: Option<String>,
}

fn main() {
    if let Err(err) = main_impl() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn main_impl() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let payload = read_payload(cli.input.as_deref())?;
    let ctx = build_context(&cli);
    let opts = cli
        .sample_cap
        .map_or_else(NormalizeOptions::default, |cap| NormalizeOptions {
            sample_preview_cap: effective_sample_cap(cap),
        });

    if cli.history {
        let Value::Array(records) = payload else {
            bail!("--history expects a JSON array of stored records");
        };
        let (adapted, failures) = history::adapt_all(&records);
        for (index, err) in &failures {
            eprintln!("record {index}: {err}");
        }
        if adapted.is_empty() {
            eprintln!("No usable records in input");
        }
        for mut record in adapted {
            record.context = ctx.merged_over(&record.context);
            let report = record
                .normalize_with(&opts)
                .context("adapted record did not normalize")?;
            print_report(&report, cli.summary)?;
        }
        return Ok(());
    }

    let report = normalize_with(&payload, &ctx, &opts)
        .context("payload did not match any known results shape")?;
    print_report(&report, cli.summary)
}

fn read_payload(path: Option<&std::path::Path>) -> Result<Value> {
    let data = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            if io::stdin().is_terminal() {
                bail!("No input provided. Pass a file or pipe JSON via stdin");
            }
            let mut data = String::new();
            io::stdin().read_to_string(&mut data)?;
            data
        }
    };
    serde_json::from_str(&data).context("input is not valid JSON")
}

/// `--sample-cap 0` means "keep everything"; the library treats the cap as
/// a plain truncation bound, so uncapped maps to the largest bound.
fn effective_sample_cap(cap: usize) -> usize {
    if cap == 0 { usize::MAX } else { cap }
}

fn build_context(cli: &Cli) -> SessionContext {
    let mut ctx = SessionContext::default();
    if let Some(project_id) = &cli.project_id {
        ctx = ctx.with_project_id(project_id);
    }
    if let Some(execution_id) = &cli.execution_id {
        ctx = ctx.with_execution_id(execution_id);
    }
    if let Some(mode) = &cli.comparison_mode {
        ctx = ctx.with_comparison_mode(mode);
    }
    if let Some(executed_by) = &cli.executed_by {
        ctx = ctx.with_executed_by(executed_by);
    }
    ctx
}

fn print_report(report: &Report, summary_only: bool) -> Result<()> {
    if summary_only {
        println!("{}", serde_json::to_string_pretty(&report.summary)?);
    } else {
        println!("{}", serde_json::to_string_pretty(report)?);
    }
    Ok(())
}

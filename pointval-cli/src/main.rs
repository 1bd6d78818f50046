//! PointVal CLI: browse the program catalog and value loyalty balances.
//!
//! Commands:
//! - `programs`: list the catalog (all, popular only, or matching a search)
//! - `value`: walk a session through the wizard for the given balances and print the report
//! - `replay`: run a scripted wizard session from a TOML file

mod script;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pointval_core::{
    format_money, group_thousands, Direction, Program, ProgramCatalog, Session, ValuationMode,
};
use pointval_report::{
    export_report, write_chart_csv_to, write_email_json, EmailReport, MarkdownReportGenerator,
    ReportComposer, ReportPayload,
};

use crate::script::{replay, Outcome, Script};

#[derive(Parser)]
#[command(
    name = "pointval",
    about = "PointVal CLI: what are your loyalty points worth?"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). POINTVAL_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Program catalog TOML. Defaults to the bundled illustrative catalog.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List programs in the catalog.
    Programs {
        /// Only programs flagged popular.
        #[arg(long, default_value_t = false)]
        popular: bool,

        /// Case-insensitive match on name or id.
        #[arg(long)]
        search: Option<String>,
    },
    /// Value balances given as PROGRAM=POINTS (e.g. chase-ur=80000).
    Value {
        #[arg(required = true)]
        balances: Vec<String>,

        /// Valuation mode.
        #[arg(long, default_value = "travel")]
        mode: ValuationMode,

        /// Output format for stdout.
        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,

        /// Also write report.json, chart.csv and report.md here.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Write an email payload (email.json) for this recipient. Needs --output-dir.
        #[arg(long, requires = "output_dir")]
        email: Option<String>,
    },
    /// Replay a scripted wizard session.
    Replay {
        /// Path to the TOML script.
        #[arg(long)]
        script: PathBuf,

        /// Exit non-zero if any step is rejected.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Markdown,
    Json,
    Csv,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let catalog = Arc::new(load_catalog(cli.catalog.as_deref())?);

    match cli.command {
        Commands::Programs { popular, search } => run_programs(&catalog, popular, search),
        Commands::Value {
            balances,
            mode,
            format,
            output_dir,
            email,
        } => run_value(catalog, &balances, mode, format, output_dir, email),
        Commands::Replay { script, strict } => run_replay(catalog, &script, strict),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("POINTVAL_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_catalog(path: Option<&Path>) -> Result<ProgramCatalog> {
    let catalog = match path {
        Some(path) => ProgramCatalog::from_path(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => ProgramCatalog::bundled().context("Bundled catalog is invalid")?,
    };
    info!(
        programs = catalog.len(),
        fingerprint = catalog.fingerprint().short(),
        "catalog ready"
    );
    Ok(catalog)
}

fn run_programs(catalog: &ProgramCatalog, popular: bool, search: Option<String>) -> Result<()> {
    let programs: Vec<&Program> = match (popular, search.as_deref()) {
        (true, Some(query)) => catalog
            .search(query)
            .into_iter()
            .filter(|p| p.popular)
            .collect(),
        (true, None) => catalog.popular(),
        (false, Some(query)) => catalog.search(query),
        (false, None) => catalog.list().iter().collect(),
    };

    if programs.is_empty() {
        println!("No programs match.");
        return Ok(());
    }

    println!(
        "{:<26} {:<40} {:>10} {:>10}",
        "ID", "NAME", "TRAVEL/100", "CASH/100"
    );
    for program in programs {
        let marker = if program.popular { " *" } else { "" };
        println!(
            "{:<26} {:<40} {:>10.2} {:>10.2}",
            program.id.as_str(),
            format!("{}{}", program.name, marker),
            program.rate.travel * 100.0,
            program.rate.cash * 100.0,
        );
    }
    println!("\n* popular · currency {}", catalog.currency());
    Ok(())
}

/// Split `PROGRAM=POINTS`, allowing `,` and `_` as digit separators.
fn parse_balance(entry: &str) -> Result<(String, f64)> {
    let Some((id, points)) = entry.split_once('=') else {
        bail!("expected PROGRAM=POINTS, got '{entry}'");
    };
    let id = id.trim();
    if id.is_empty() {
        bail!("missing program id in '{entry}'");
    }
    let cleaned: String = points
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();
    let points: f64 = cleaned
        .parse()
        .with_context(|| format!("invalid points '{points}' for {id}"))?;
    Ok((id.to_string(), points))
}

fn run_value(
    catalog: Arc<ProgramCatalog>,
    balances: &[String],
    mode: ValuationMode,
    format: OutputFormat,
    output_dir: Option<PathBuf>,
    email: Option<String>,
) -> Result<()> {
    let entries = balances
        .iter()
        .map(|b| parse_balance(b))
        .collect::<Result<Vec<_>>>()?;

    let mut session = Session::new(catalog);
    session.switch_mode(mode);

    session.transition(Direction::Forward)?;
    for (id, _) in &entries {
        if !session.add(id)? {
            warn!(program = %id, "program listed more than once; last balance wins");
        }
    }
    session.transition(Direction::Forward)?;
    for (id, points) in &entries {
        session.set_points(id, *points)?;
    }
    session.transition(Direction::Forward)?;

    let payload = ReportComposer::compose_inputs(&session.report_inputs()?)?;
    print_report(&payload, format)?;

    if let Some(dir) = output_dir {
        let paths = export_report(&dir, &payload, true)?;
        eprintln!("Report written to {}", paths.report_json.display());
        if let Some(recipient) = email {
            let email_path = dir.join("email.json");
            write_email_json(&email_path, &EmailReport::new(payload, recipient))?;
            eprintln!("Email payload written to {}", email_path.display());
        }
    }
    Ok(())
}

fn print_report(payload: &ReportPayload, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Markdown => print!("{}", MarkdownReportGenerator.generate(payload)),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(payload).context("Failed to serialize report")?
        ),
        OutputFormat::Csv => write_chart_csv_to(std::io::stdout().lock(), payload)?,
    }
    Ok(())
}

fn run_replay(catalog: Arc<ProgramCatalog>, path: &Path, strict: bool) -> Result<()> {
    let script = Script::from_path(path)?;
    let mut session = Session::new(catalog);
    let records = replay(&mut session, &script);

    for record in &records {
        match &record.outcome {
            Outcome::Applied(msg) => println!("[{:>2}] {:<32} ok: {}", record.index, record.action, msg),
            Outcome::Rejected(msg) => {
                println!("[{:>2}] {:<32} rejected: {}", record.index, record.action, msg)
            }
            Outcome::Reported(payload) => {
                println!("[{:>2}] {:<32} report {}", record.index, record.action, payload.report_id);
                print!("{}", MarkdownReportGenerator.generate(payload));
            }
            Outcome::Emailed(email) => println!(
                "[{:>2}] {:<32} email to {}: {}",
                record.index, record.action, email.recipient, email.subject
            ),
        }
    }

    let snapshot = session.snapshot()?;
    let currency = session.catalog().currency();
    println!(
        "\nFinal step: {} · mode: {} · programs: {} · points: {} · value: {}",
        snapshot.step,
        snapshot.mode,
        snapshot.selections.len(),
        group_thousands(snapshot.totals.total_points),
        format_money(snapshot.totals.total_value, currency),
    );

    let rejected = records.iter().filter(|r| r.is_rejected()).count();
    if strict && rejected > 0 {
        bail!("{rejected} step(s) rejected");
    }
    Ok(())
}

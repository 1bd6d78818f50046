//! Report artifact export (JSON, chart CSV, markdown).

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::composer::ReportPayload;
use crate::email::EmailReport;
use crate::markdown::MarkdownReportGenerator;

/// Paths written by [`export_report`].
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub report_json: PathBuf,
    pub chart_csv: PathBuf,
    pub report_markdown: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ChartRow<'a> {
    program_id: &'a str,
    label: &'a str,
    points: u64,
    rate: f64,
    value: f64,
    share: f64,
}

pub fn export_report(
    output_dir: impl AsRef<Path>,
    payload: &ReportPayload,
    include_markdown: bool,
) -> Result<ArtifactPaths> {
    let output_dir = output_dir.as_ref();
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output dir {}", output_dir.display()))?;

    let report_json = output_dir.join("report.json");
    write_report_json(&report_json, payload)?;

    let chart_csv = output_dir.join("chart.csv");
    write_chart_csv(&chart_csv, payload)?;

    let report_markdown = if include_markdown {
        let path = output_dir.join("report.md");
        let report = MarkdownReportGenerator.generate(payload);
        std::fs::write(&path, report)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        Some(path)
    } else {
        None
    };

    info!(
        report_id = %payload.report_id,
        dir = %output_dir.display(),
        "report exported"
    );

    Ok(ArtifactPaths {
        report_json,
        chart_csv,
        report_markdown,
    })
}

pub fn write_report_json(path: &Path, payload: &ReportPayload) -> Result<()> {
    let json = serde_json::to_string_pretty(payload).context("Failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report JSON {}", path.display()))?;
    Ok(())
}

pub fn load_report_json(path: &Path) -> Result<ReportPayload> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report JSON {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse report JSON {}", path.display()))
}

/// One row per program: the data behind both charts.
pub fn write_chart_csv(path: &Path, payload: &ReportPayload) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create chart CSV {}", path.display()))?;
    write_chart_csv_to(file, payload)
}

pub fn write_chart_csv_to<W: Write>(out: W, payload: &ReportPayload) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for (line, slice) in payload.lines.iter().zip(&payload.pie_chart) {
        writer
            .serialize(ChartRow {
                program_id: line.program_id.as_str(),
                label: &line.name,
                points: line.points,
                rate: line.rate,
                value: line.value,
                share: slice.share,
            })
            .context("Failed to write chart row")?;
    }
    writer.flush().context("Failed to flush chart CSV")?;
    Ok(())
}

pub fn write_email_json(path: &Path, email: &EmailReport) -> Result<()> {
    let json = serde_json::to_string_pretty(email).context("Failed to serialize email report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write email JSON {}", path.display()))?;
    Ok(())
}

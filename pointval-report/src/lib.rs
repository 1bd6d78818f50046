//! PointVal Report: turns a finished wizard session into output.
//!
//! This crate builds on `pointval-core` to provide:
//! - Report composition (bar and pie chart series that add up to the totals)
//! - Markdown summaries
//! - Email payloads for the report-by-email form
//! - Artifact export (JSON, CSV, markdown)

pub mod composer;
pub mod email;
pub mod export;
pub mod markdown;

pub use composer::{
    report_id, ChartPoint, PieSlice, ReportComposer, ReportError, ReportPayload, SCHEMA_VERSION,
    SUM_TOLERANCE,
};
pub use email::EmailReport;
pub use export::{
    export_report, load_report_json, write_chart_csv, write_chart_csv_to, write_email_json,
    write_report_json, ArtifactPaths,
};
pub use markdown::MarkdownReportGenerator;

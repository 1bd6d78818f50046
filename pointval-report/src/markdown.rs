//! Markdown report generator.

use pointval_core::{format_money, group_thousands};

use crate::composer::ReportPayload;

pub struct MarkdownReportGenerator;

impl MarkdownReportGenerator {
    pub fn generate(&self, payload: &ReportPayload) -> String {
        let currency = payload.currency.as_str();
        let mut report = format!(
            "# Points Value Report\n\n\
Report ID: `{}`\n\n\
Generated: {}\n\n\
## Summary\n\
- Valuation: {}\n\
- Programs: {}\n\
- Total points: {}\n\
- Total value: {}\n",
            payload.report_id,
            payload.generated_at.format("%Y-%m-%d %H:%M UTC"),
            payload.mode.label(),
            payload.lines.len(),
            group_thousands(payload.totals.total_points),
            format_money(payload.totals.total_value, currency),
        );

        report.push_str("\n## Breakdown\n\n");
        report.push_str(&format!(
            "| Program | Points | Value per 100 pts ({currency}) | Value | Share |\n"
        ));
        report.push_str("|---------|--------|------------------------|-------|-------|\n");
        for (line, slice) in payload.lines.iter().zip(&payload.pie_chart) {
            report.push_str(&format!(
                "| {} | {} | {:.2} | {} | {:.1}% |\n",
                escape_cell(&line.name),
                group_thousands(line.points),
                line.rate * 100.0,
                format_money(line.value, currency),
                slice.share * 100.0
            ));
        }

        // Largest holding, if any program carries value
        if let Some(top) = payload
            .lines
            .iter()
            .filter(|l| l.value > 0.0)
            .max_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(std::cmp::Ordering::Equal))
        {
            report.push_str(&format!(
                "\nMost valuable balance: {} ({})\n",
                top.name,
                format_money(top.value, currency)
            ));
        }

        report.push_str(&format!(
            "\n---\nRates from catalog `{}`. Amounts are estimates rounded to two decimals.\n",
            payload.catalog_fingerprint.short()
        ));
        report
    }
}

/// Table cells cannot contain a bare pipe.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

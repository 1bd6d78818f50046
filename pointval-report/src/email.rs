//! Email report payload handed to the dispatch collaborator.
//!
//! The recipient is taken as given; address validation belongs to the form
//! that collected it.

use serde::{Deserialize, Serialize};

use pointval_core::format_money;

use crate::composer::ReportPayload;
use crate::markdown::MarkdownReportGenerator;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailReport {
    pub recipient: String,
    pub subject: String,
    pub body_markdown: String,
    pub payload: ReportPayload,
}

impl EmailReport {
    pub fn new(payload: ReportPayload, recipient: impl Into<String>) -> Self {
        let subject = format!(
            "Your points are worth {} ({})",
            format_money(payload.totals.total_value, &payload.currency),
            payload.mode.as_str()
        );
        let body_markdown = MarkdownReportGenerator.generate(&payload);
        Self {
            recipient: recipient.into(),
            subject,
            body_markdown,
            payload,
        }
    }
}

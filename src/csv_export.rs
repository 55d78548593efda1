//! Tabular export: summary statistics, issue breakdown and raw feedback as
//! three stacked CSV sections.

use crate::error::ExportError;
use crate::models::Sentiment;
use crate::report::{self, ReportInput};

pub const SUMMARY_SECTION: &str = "Summary Statistics";
pub const BREAKDOWN_SECTION: &str = "Issue Breakdown";
pub const RECORDS_SECTION: &str = "Feedback Records";

pub fn render_csv(input: &ReportInput<'_>) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    let view = input.view;
    let counts = &view.sentiment_counts;

    writer.write_record([SUMMARY_SECTION])?;
    writer.write_record(["Metric", "Value"])?;
    writer.write_record(["Scope".to_string(), input.scope_label()])?;
    writer.write_record([
        "Generated At".to_string(),
        report::format_timestamp(input.generated_at),
    ])?;
    writer.write_record(["Total Responses".to_string(), view.total_count.to_string()])?;
    for sentiment in Sentiment::ALL {
        writer.write_record([
            format!("{} Responses", sentiment.label()),
            counts.get(sentiment).to_string(),
        ])?;
        writer.write_record([
            format!("{} Share", sentiment.label()),
            report::format_percentage(counts.percentage(sentiment)),
        ])?;
    }
    writer.write_record([
        "Sentiment Score".to_string(),
        format!("{:.2}", view.sentiment_score),
    ])?;
    writer.write_record(["Active Issues".to_string(), view.active_issues().to_string()])?;

    writer.write_record([BREAKDOWN_SECTION])?;
    writer.write_record(["Issue ID", "Issue", "Total", "Positive", "Negative", "Neutral"])?;
    for issue in view.per_issue.values() {
        writer.write_record([
            issue.issue_id.clone(),
            issue.title.clone(),
            issue.counts.total().to_string(),
            issue.counts.positive.to_string(),
            issue.counts.negative.to_string(),
            issue.counts.neutral.to_string(),
        ])?;
    }

    writer.write_record([RECORDS_SECTION])?;
    writer.write_record(["ID", "Issue", "Feedback", "Sentiment", "Submitted At", "Role"])?;
    for record in input.records.iter() {
        let submitted_at = report::format_timestamp(record.submitted_at);
        writer.write_record([
            record.id.as_str(),
            record.issue_title.as_str(),
            record.text.as_str(),
            record.sentiment.label(),
            submitted_at.as_str(),
            record.metadata.role.as_deref().unwrap_or(""),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|err| ExportError::Buffer(err.error().to_string()))
}

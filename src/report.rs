use std::fmt::Write;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::aggregate::filter_records;
use crate::catalog;
use crate::error::ExportError;
use crate::models::{AggregatedView, FeedbackRecord, IssueBreakdown, Sentiment};

pub const TOP_ISSUE_COUNT: usize = 3;

/// Everything an exporter renders: the records in scope, their aggregate,
/// and the generation time printed in the header.
pub struct ReportInput<'a> {
    pub records: Vec<&'a FeedbackRecord>,
    pub view: &'a AggregatedView,
    pub generated_at: DateTime<Utc>,
}

impl<'a> ReportInput<'a> {
    /// Narrows `records` to the view's issue filter.
    pub fn new(
        records: &'a [FeedbackRecord],
        view: &'a AggregatedView,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            records: filter_records(records, view.filter.as_deref()),
            view,
            generated_at,
        }
    }

    pub fn scope_label(&self) -> String {
        catalog::scope_label(self.view.filter.as_deref())
    }

    pub fn top_issues(&self) -> Vec<&'a IssueBreakdown> {
        self.view
            .issues_by_volume()
            .into_iter()
            .take(TOP_ISSUE_COUNT)
            .collect()
    }

    pub fn dominant_sentiment(&self) -> Option<Sentiment> {
        self.view.sentiment_counts.dominant()
    }
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

pub fn format_percentage(value: f64) -> String {
    format!("{value:.1}%")
}

pub fn dominant_label(sentiment: Option<Sentiment>) -> &'static str {
    sentiment.map(|s| s.label()).unwrap_or("No feedback yet")
}

/// Writes a fully rendered report; the target is replaced only once every
/// byte is on disk.
pub fn write_report(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    crate::store::write_atomic(path, bytes)?;
    Ok(())
}

/// Markdown dashboard printed by the CLI.
pub fn build_dashboard(input: &ReportInput<'_>) -> String {
    let view = input.view;
    let counts = &view.sentiment_counts;
    let mut output = String::new();

    let _ = writeln!(output, "# Public Opinion Dashboard");
    let _ = writeln!(
        output,
        "Scope: {} (generated {})",
        input.scope_label(),
        format_timestamp(input.generated_at)
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Key Metrics");
    let _ = writeln!(output, "- Total responses: {}", view.total_count);
    let _ = writeln!(output, "- Sentiment score: {}", view.score_display());
    let _ = writeln!(output, "- Active issues: {}", view.active_issues());

    let _ = writeln!(output);
    let _ = writeln!(output, "## Sentiment Distribution");
    for sentiment in Sentiment::ALL {
        let _ = writeln!(
            output,
            "- {}: {} ({})",
            sentiment.label(),
            counts.get(sentiment),
            format_percentage(counts.percentage(sentiment))
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Response Timeline");
    for bucket in view.timeline.iter() {
        let _ = writeln!(
            output,
            "- {}: +{} / -{} / ~{}",
            bucket.label(),
            bucket.counts.positive,
            bucket.counts.negative,
            bucket.counts.neutral
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Issue Breakdown");
    if view.per_issue.is_empty() {
        let _ = writeln!(output, "No feedback recorded yet.");
    } else {
        for issue in view.issues_by_volume() {
            let _ = writeln!(
                output,
                "- {} ({} responses: {} positive, {} negative, {} neutral)",
                issue.title,
                issue.counts.total(),
                issue.counts.positive,
                issue.counts.negative,
                issue.counts.neutral
            );
        }
    }

    let mut recent = input.records.clone();
    recent.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Feedback");
    if recent.is_empty() {
        let _ = writeln!(output, "No feedback for this scope.");
    } else {
        for record in recent.iter().take(5) {
            let _ = writeln!(
                output,
                "- [{}] {} on {}: {}",
                record.sentiment,
                record
                    .metadata
                    .role
                    .as_deref()
                    .filter(|role| !role.is_empty())
                    .unwrap_or("Anonymous"),
                format_timestamp(record.submitted_at),
                record.text
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Key Insights");
    let _ = writeln!(
        output,
        "- Dominant sentiment: {}",
        dominant_label(input.dominant_sentiment())
    );
    for (rank, issue) in input.top_issues().iter().enumerate() {
        let _ = writeln!(
            output,
            "- #{} by volume: {} ({} responses)",
            rank + 1,
            issue.title,
            issue.counts.total()
        );
    }

    output
}

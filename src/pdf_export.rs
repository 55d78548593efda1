use crate::models::Sentiment;
use crate::pdf::{Font, Page, PdfDocument, Rule, TextRun, PAGE_HEIGHT, PAGE_WIDTH};
use crate::report::{self, ReportInput};

const MARGIN: f32 = 50.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const FOOTER_Y: f32 = 30.0;
/// Lowest baseline allowed for body text.
const BOTTOM_LIMIT: f32 = MARGIN + 10.0;
const INDENT: f32 = 14.0;

#[derive(Debug, Clone, Copy)]
struct Style {
    font: Font,
    size: f32,
    leading: f32,
}

const TITLE: Style = Style {
    font: Font::Bold,
    size: 20.0,
    leading: 28.0,
};
const HEADING: Style = Style {
    font: Font::Bold,
    size: 14.0,
    leading: 22.0,
};
const BODY: Style = Style {
    font: Font::Regular,
    size: 10.0,
    leading: 14.0,
};
const LABEL: Style = Style {
    font: Font::Bold,
    size: 10.0,
    leading: 14.0,
};
const SMALL: Style = Style {
    font: Font::Regular,
    size: 9.0,
    leading: 12.0,
};

/// Content-driven page layout: lines are placed top-down and a new page is
/// opened whenever the next line would drop below [`BOTTOM_LIMIT`].
struct Layout {
    pages: Vec<Page>,
    cursor: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            cursor: PAGE_HEIGHT - MARGIN,
        }
    }

    fn page(&mut self) -> &mut Page {
        // `pages` always holds at least the first page.
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn ensure_space(&mut self, height: f32) {
        if self.cursor - height < BOTTOM_LIMIT {
            self.pages.push(Page::default());
            self.cursor = PAGE_HEIGHT - MARGIN;
        }
    }

    fn text(&mut self, style: Style, indent: f32, text: &str) {
        let measure = |line: &str| style.font.text_width(line, style.size);
        for line in wrap(text, CONTENT_WIDTH - indent, measure) {
            self.ensure_space(style.leading);
            self.cursor -= style.leading;
            let y = self.cursor;
            self.page().runs.push(TextRun {
                x: MARGIN + indent,
                y,
                size: style.size,
                font: style.font,
                text: line,
            });
        }
    }

    fn gap(&mut self, height: f32) {
        self.cursor -= height;
    }

    fn rule(&mut self) {
        self.ensure_space(8.0);
        self.cursor -= 6.0;
        let y = self.cursor;
        self.page().rules.push(Rule {
            x1: MARGIN,
            x2: PAGE_WIDTH - MARGIN,
            y,
        });
        self.cursor -= 2.0;
    }

    fn heading(&mut self, title: &str) {
        self.gap(8.0);
        // Keep a heading together with at least one body line.
        self.ensure_space(HEADING.leading + BODY.leading);
        self.text(HEADING, 0.0, title);
        self.rule();
    }

    fn finish(mut self) -> Vec<Page> {
        let total = self.pages.len();
        for (index, page) in self.pages.iter_mut().enumerate() {
            page.runs.push(TextRun {
                x: MARGIN,
                y: FOOTER_Y,
                size: SMALL.size,
                font: SMALL.font,
                text: format!("PulseView Feedback Report - Page {} of {}", index + 1, total),
            });
        }
        self.pages
    }
}

/// Greedy word wrap to `max_width` as reported by `measure`. Explicit line
/// breaks are kept and words wider than a line are split.
pub fn wrap(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            for chunk in split_word(word, max_width, &measure) {
                if current.is_empty() {
                    current = chunk;
                    continue;
                }
                let candidate = format!("{current} {chunk}");
                if measure(&candidate) > max_width {
                    lines.push(std::mem::replace(&mut current, chunk));
                } else {
                    current = candidate;
                }
            }
        }

        lines.push(current);
    }

    lines
}

/// Splits `word` into pieces no wider than `max_width`; a single glyph that
/// is wider still gets a piece of its own.
fn split_word(word: &str, max_width: f32, measure: &impl Fn(&str) -> f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();

    for ch in word.chars() {
        piece.push(ch);
        if measure(&piece) > max_width && piece.chars().count() > 1 {
            piece.pop();
            pieces.push(std::mem::take(&mut piece));
            piece.push(ch);
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }

    pieces
}

fn build_document(input: &ReportInput<'_>) -> PdfDocument {
    let view = input.view;
    let counts = &view.sentiment_counts;
    let mut layout = Layout::new();

    layout.text(TITLE, 0.0, "PulseView Feedback Report");
    layout.text(
        BODY,
        0.0,
        &format!("Generated: {}", report::format_timestamp(input.generated_at)),
    );
    layout.text(BODY, 0.0, &format!("Scope: {}", input.scope_label()));

    layout.heading("Executive Summary");
    layout.text(BODY, 0.0, &format!("Total responses: {}", view.total_count));
    for sentiment in Sentiment::ALL {
        layout.text(
            BODY,
            INDENT,
            &format!(
                "{}: {} ({})",
                sentiment.label(),
                counts.get(sentiment),
                report::format_percentage(counts.percentage(sentiment))
            ),
        );
    }
    layout.text(
        BODY,
        0.0,
        &format!(
            "Sentiment score: {} ({:.2} on a -1 to 1 scale)",
            view.score_display(),
            view.sentiment_score
        ),
    );
    layout.text(BODY, 0.0, &format!("Active issues: {}", view.active_issues()));

    layout.heading("Issue Breakdown");
    if view.per_issue.is_empty() {
        layout.text(BODY, 0.0, "No feedback recorded yet.");
    }
    for issue in view.per_issue.values() {
        layout.text(LABEL, 0.0, &format!("[{}] {}", issue.issue_id, issue.title));
        layout.text(
            BODY,
            INDENT,
            &format!(
                "{} responses: {} positive, {} negative, {} neutral",
                issue.counts.total(),
                issue.counts.positive,
                issue.counts.negative,
                issue.counts.neutral
            ),
        );
    }

    layout.heading("Feedback Records");
    if input.records.is_empty() {
        layout.text(BODY, 0.0, "No feedback for this scope.");
    }
    for record in input.records.iter() {
        layout.text(
            LABEL,
            0.0,
            &format!(
                "#{} | {} | {}",
                record.id,
                record.sentiment.label(),
                report::format_timestamp(record.submitted_at)
            ),
        );
        let title = if record.issue_title.is_empty() {
            record.issue_id.as_str()
        } else {
            record.issue_title.as_str()
        };
        layout.text(SMALL, INDENT, &format!("Issue: {title}"));
        layout.text(BODY, INDENT, &record.text);

        let respondent: Vec<&str> = [
            record.metadata.name.as_deref(),
            record.metadata.age_range.as_deref(),
            record.metadata.role.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|value| !value.is_empty())
        .collect();
        if !respondent.is_empty() {
            layout.text(SMALL, INDENT, &format!("Respondent: {}", respondent.join(", ")));
        }
        layout.gap(6.0);
    }

    layout.heading("Key Insights");
    layout.text(
        BODY,
        0.0,
        &format!(
            "Dominant sentiment: {}",
            report::dominant_label(input.dominant_sentiment())
        ),
    );
    let top = input.top_issues();
    if !top.is_empty() {
        layout.text(BODY, 0.0, "Top issues by volume:");
    }
    for (rank, issue) in top.iter().enumerate() {
        layout.text(
            BODY,
            INDENT,
            &format!("{}. {} ({} responses)", rank + 1, issue.title, issue.counts.total()),
        );
    }

    let mut document = PdfDocument::new("PulseView Feedback Report");
    document.pages = layout.finish();
    document
}

pub fn render_pdf(input: &ReportInput<'_>) -> Vec<u8> {
    build_document(input).to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_at;
    use crate::models::{FeedbackRecord, Metadata};
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

    fn records(count: usize, text: &str) -> Vec<FeedbackRecord> {
        let base = Utc.with_ymd_and_hms(2026, 10, 19, 6, 0, 0).unwrap();
        (0..count)
            .map(|i| FeedbackRecord {
                id: format!("{}", 1_000 + i),
                issue_id: ((i % 6) + 1).to_string(),
                issue_title: String::new(),
                text: text.to_string(),
                sentiment: Sentiment::ALL[i % 3],
                submitted_at: base - Duration::hours(i as i64),
                metadata: Metadata {
                    name: Some("Ravi".to_string()),
                    age_range: None,
                    role: Some(String::new()),
                },
            })
            .collect()
    }

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn wrap_respects_width_and_line_breaks() {
        let chars = |line: &str| line.chars().count() as f32;
        let lines = wrap("the quick brown fox jumps over the lazy dog", 10.0, chars);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps over", "the lazy", "dog"]);
        assert!(lines.iter().all(|line| line.chars().count() <= 10));

        assert_eq!(wrap("one\r\ntwo", 20.0, chars), vec!["one", "two"]);
        assert_eq!(wrap("abcdefghij", 4.0, chars), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("", 10.0, chars), vec![""]);
        assert_eq!(wrap("ab", 0.5, chars), vec!["a", "b"]);
    }

    #[test]
    fn small_report_fits_one_page() {
        let records = records(2, "Short note");
        let view = aggregate_at(&records, None, today(), &Utc);
        let input = ReportInput::new(&records, &view, generated_at());
        let document = build_document(&input);

        assert_eq!(document.pages.len(), 1);
        let texts: Vec<&str> = document.pages[0].runs.iter().map(|run| run.text.as_str()).collect();
        assert!(texts.contains(&"PulseView Feedback Report"));
        assert!(texts.contains(&"Generated: 2026-10-19 09:00 UTC"));
        assert!(texts.contains(&"Respondent: Ravi"));
        assert!(texts.contains(&"PulseView Feedback Report - Page 1 of 1"));
    }

    #[test]
    fn long_reports_paginate_within_margins() {
        let text =
            "Monsoon drainage keeps failing in our ward and nobody answers complaints. ".repeat(12);
        let records = records(40, text.trim());
        let view = aggregate_at(&records, None, today(), &Utc);
        let input = ReportInput::new(&records, &view, generated_at());
        let document = build_document(&input);

        assert!(document.pages.len() > 3);
        let total = document.pages.len();
        for (index, page) in document.pages.iter().enumerate() {
            let footer = format!("PulseView Feedback Report - Page {} of {}", index + 1, total);
            assert!(page.runs.iter().any(|run| run.text == footer));
            for run in page.runs.iter().filter(|run| run.y != FOOTER_Y) {
                assert!(run.y >= BOTTOM_LIMIT && run.y <= PAGE_HEIGHT - MARGIN);
                let limit = CONTENT_WIDTH - (run.x - MARGIN);
                assert!(run.font.text_width(&run.text, run.size) <= limit);
            }
        }
    }

    #[test]
    fn wide_bold_glyphs_stay_inside_margins() {
        let wide = "W".repeat(120);
        let words = "WWWW MMMM ".repeat(40);
        let mut layout = Layout::new();
        layout.text(LABEL, INDENT, &wide);
        layout.text(TITLE, 0.0, words.trim());
        let pages = layout.finish();

        let runs: Vec<&TextRun> = pages
            .iter()
            .flat_map(|page| page.runs.iter())
            .filter(|run| run.y != FOOTER_Y)
            .collect();
        assert!(runs.len() > 4);
        for run in runs.iter() {
            let limit = CONTENT_WIDTH - (run.x - MARGIN);
            assert!(run.font.text_width(&run.text, run.size) <= limit);
        }

        let label_text: String = runs
            .iter()
            .filter(|run| run.size == LABEL.size)
            .map(|run| run.text.as_str())
            .collect();
        assert_eq!(label_text, wide);
    }

    #[test]
    fn rendering_is_deterministic() {
        let records = records(25, "Heat waves and smog on the same week");
        let view = aggregate_at(&records, Some("2"), today(), &Utc);
        let input = ReportInput::new(&records, &view, generated_at());
        assert_eq!(render_pdf(&input), render_pdf(&input));
    }

    #[test]
    fn empty_scope_still_renders() {
        let records = records(3, "anything");
        let view = aggregate_at(&records, Some("nonexistent"), today(), &Utc);
        let input = ReportInput::new(&records, &view, generated_at());
        let document = build_document(&input);
        let texts: Vec<&str> = document
            .pages
            .iter()
            .flat_map(|page| page.runs.iter())
            .map(|run| run.text.as_str())
            .collect();
        assert!(texts.contains(&"No feedback for this scope."));
        assert!(texts.contains(&"Total responses: 0"));
        assert!(render_pdf(&input).starts_with(b"%PDF-1.4"));
    }
}

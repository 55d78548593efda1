use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Low => write!(f, "low"),
            Urgency::Medium => write!(f, "medium"),
            Urgency::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub urgency: Urgency,
    pub response_count: u32,
    pub trending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];

    pub fn label(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Negative => write!(f, "negative"),
            Sentiment::Neutral => write!(f, "neutral"),
        }
    }
}

/// Optional respondent details.
///
/// `None` means the field was never supplied and is left out of the stored
/// JSON; `Some(String::new())` means it was supplied blank and is stored as
/// `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "age", default, skip_serializing_if = "Option::is_none")]
    pub age_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// One stored opinion. Field names on disk follow the browser storage layout
/// so existing blobs load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: String,
    #[serde(rename = "issueId")]
    pub issue_id: String,
    #[serde(rename = "issue")]
    pub issue_title: String,
    #[serde(rename = "feedback")]
    pub text: String,
    pub sentiment: Sentiment,
    #[serde(rename = "timestamp")]
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SentimentCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentCounts {
    pub fn record(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Negative => self.negative += 1,
            Sentiment::Neutral => self.neutral += 1,
        }
    }

    pub fn get(&self, sentiment: Sentiment) -> usize {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Negative => self.negative,
            Sentiment::Neutral => self.neutral,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }

    /// Share of `sentiment` in percent, 0 for an empty set.
    pub fn percentage(&self, sentiment: Sentiment) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.get(sentiment) as f64 * 100.0 / total as f64
        }
    }

    /// Most frequent sentiment; ties go to the earlier entry of
    /// [`Sentiment::ALL`]. `None` when nothing was counted.
    pub fn dominant(&self) -> Option<Sentiment> {
        if self.total() == 0 {
            return None;
        }
        let mut best = Sentiment::Positive;
        for sentiment in Sentiment::ALL {
            if self.get(sentiment) > self.get(best) {
                best = sentiment;
            }
        }
        Some(best)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineBucket {
    pub date: NaiveDate,
    pub counts: SentimentCounts,
}

impl TimelineBucket {
    /// Chart label, e.g. "Oct 19".
    pub fn label(&self) -> String {
        self.date.format("%b %-d").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueBreakdown {
    pub issue_id: String,
    pub title: String,
    pub counts: SentimentCounts,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedView {
    pub filter: Option<String>,
    pub total_count: usize,
    pub sentiment_counts: SentimentCounts,
    pub timeline: Vec<TimelineBucket>,
    pub sentiment_score: f64,
    pub per_issue: BTreeMap<String, IssueBreakdown>,
}

impl AggregatedView {
    /// Number of distinct issues that have received feedback.
    pub fn active_issues(&self) -> usize {
        self.per_issue.len()
    }

    /// Score as a signed whole percentage: "+33", "-50", "0".
    pub fn score_display(&self) -> String {
        let scaled = (self.sentiment_score * 100.0).round() as i64;
        if scaled > 0 {
            format!("+{scaled}")
        } else {
            scaled.to_string()
        }
    }

    /// Issues ordered by response volume, largest first, ties by id.
    pub fn issues_by_volume(&self) -> Vec<&IssueBreakdown> {
        let mut issues: Vec<&IssueBreakdown> = self.per_issue.values().collect();
        issues.sort_by(|a, b| {
            b.counts
                .total()
                .cmp(&a.counts.total())
                .then_with(|| a.issue_id.cmp(&b.issue_id))
        });
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record_with(metadata: Metadata) -> FeedbackRecord {
        FeedbackRecord {
            id: "1729339200000".to_string(),
            issue_id: "2".to_string(),
            issue_title: "Should AI tools be allowed in college assignments?".to_string(),
            text: "Only with clear disclosure".to_string(),
            sentiment: Sentiment::Neutral,
            submitted_at: Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap(),
            metadata,
        }
    }

    #[test]
    fn serializes_with_browser_field_names() {
        let json = serde_json::to_value(record_with(Metadata::default())).unwrap();
        assert_eq!(json["issueId"], "2");
        assert_eq!(json["feedback"], "Only with clear disclosure");
        assert_eq!(json["sentiment"], "neutral");
        assert!(json["timestamp"].as_str().unwrap().starts_with("2026-10-18T09:30:00"));
        assert_eq!(json["metadata"], serde_json::json!({}));
    }

    #[test]
    fn metadata_keeps_absent_and_empty_apart() {
        let metadata = Metadata {
            name: None,
            age_range: Some(String::new()),
            role: Some("Student".to_string()),
        };
        let record = record_with(metadata);
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("\"name\""));
        assert!(json.contains("\"age\":\"\""));

        let parsed: FeedbackRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn loads_browser_blob_entry() {
        let raw = r#"{"id":"1","issueId":"1","issue":"Housing","feedback":"Too expensive",
            "sentiment":"negative","timestamp":"2026-10-18T10:00:00.000Z",
            "metadata":{"role":"Professional"}}"#;
        let record: FeedbackRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.sentiment, Sentiment::Negative);
        assert_eq!(record.metadata.role.as_deref(), Some("Professional"));
        assert_eq!(record.metadata.name, None);
    }

    #[test]
    fn percentages_and_dominant_handle_empty_counts() {
        let empty = SentimentCounts::default();
        assert_eq!(empty.percentage(Sentiment::Positive), 0.0);
        assert_eq!(empty.dominant(), None);

        let counts = SentimentCounts {
            positive: 1,
            negative: 2,
            neutral: 2,
        };
        assert_eq!(counts.dominant(), Some(Sentiment::Negative));
        assert!((counts.percentage(Sentiment::Neutral) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn timeline_label_matches_chart_format() {
        let bucket = TimelineBucket {
            date: NaiveDate::from_ymd_opt(2026, 10, 9).unwrap(),
            counts: SentimentCounts::default(),
        };
        assert_eq!(bucket.label(), "Oct 9");
    }
}

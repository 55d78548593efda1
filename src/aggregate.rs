use std::collections::BTreeMap;

use chrono::{Duration, Local, NaiveDate, TimeZone};

use crate::catalog::{self, ALL_ISSUES};
use crate::models::{
    AggregatedView, FeedbackRecord, IssueBreakdown, SentimentCounts, TimelineBucket,
};

pub const TIMELINE_DAYS: i64 = 7;

/// Aggregates against the local calendar, with today taken from the clock.
pub fn aggregate(records: &[FeedbackRecord], filter: Option<&str>) -> AggregatedView {
    aggregate_at(records, filter, Local::now().date_naive(), &Local)
}

/// Aggregates with an explicit "today" and the zone used to bucket
/// submission times into calendar days.
pub fn aggregate_at<Tz: TimeZone>(
    records: &[FeedbackRecord],
    filter: Option<&str>,
    today: NaiveDate,
    tz: &Tz,
) -> AggregatedView {
    let filtered = filter_records(records, filter);
    let sentiment_counts = count_sentiments(filtered.iter().copied());
    let total_count = filtered.len();

    AggregatedView {
        filter: normalize_filter(filter).map(str::to_string),
        total_count,
        sentiment_counts,
        timeline: build_timeline(&filtered, today, tz),
        sentiment_score: sentiment_score(&sentiment_counts),
        per_issue: breakdown_by_issue(records),
    }
}

fn normalize_filter(filter: Option<&str>) -> Option<&str> {
    filter.filter(|value| *value != ALL_ISSUES)
}

/// Records matching the issue filter; `None` and `"all"` keep everything.
pub fn filter_records<'a>(
    records: &'a [FeedbackRecord],
    filter: Option<&str>,
) -> Vec<&'a FeedbackRecord> {
    match normalize_filter(filter) {
        None => records.iter().collect(),
        Some(issue_id) => records
            .iter()
            .filter(|record| record.issue_id == issue_id)
            .collect(),
    }
}

pub fn count_sentiments<'a>(
    records: impl IntoIterator<Item = &'a FeedbackRecord>,
) -> SentimentCounts {
    let mut counts = SentimentCounts::default();
    for record in records {
        counts.record(record.sentiment);
    }
    counts
}

/// Net sentiment in [-1, 1]; neutral only widens the denominator.
pub fn sentiment_score(counts: &SentimentCounts) -> f64 {
    let total = counts.total();
    if total == 0 {
        return 0.0;
    }
    (counts.positive as f64 - counts.negative as f64) / total as f64
}

fn build_timeline<Tz: TimeZone>(
    records: &[&FeedbackRecord],
    today: NaiveDate,
    tz: &Tz,
) -> Vec<TimelineBucket> {
    let start = today - Duration::days(TIMELINE_DAYS - 1);
    let mut buckets: Vec<TimelineBucket> = (0..TIMELINE_DAYS)
        .map(|offset| TimelineBucket {
            date: start + Duration::days(offset),
            counts: SentimentCounts::default(),
        })
        .collect();

    for record in records {
        let day = record.submitted_at.with_timezone(tz).date_naive();
        if day < start || day > today {
            continue;
        }
        let index = (day - start).num_days() as usize;
        buckets[index].counts.record(record.sentiment);
    }

    buckets
}

/// Counts per issue over every record, independent of any filter.
///
/// Catalog issues are keyed by id. Records whose id is no longer in the
/// catalog are grouped under the title stored with them, or under their id
/// when that title is empty; the group keeps the first id seen.
pub fn breakdown_by_issue(records: &[FeedbackRecord]) -> BTreeMap<String, IssueBreakdown> {
    let mut map: BTreeMap<String, IssueBreakdown> = BTreeMap::new();

    for record in records {
        let (key, title) = group_of(record);
        let entry = map.entry(key).or_insert_with(|| IssueBreakdown {
            issue_id: record.issue_id.clone(),
            title,
            counts: SentimentCounts::default(),
        });
        entry.counts.record(record.sentiment);
    }

    map
}

/// Group key and display title for one record.
fn group_of(record: &FeedbackRecord) -> (String, String) {
    if let Some(issue) = catalog::find(&record.issue_id) {
        return (record.issue_id.clone(), issue.title.to_string());
    }
    let title = if record.issue_title.is_empty() {
        record.issue_id.clone()
    } else {
        record.issue_title.clone()
    };
    (title.clone(), title)
}

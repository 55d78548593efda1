use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::catalog;
use crate::error::{SubmitError, ValidationError};
use crate::models::{FeedbackRecord, Metadata};
use crate::sentiment::SentimentClassifier;
use crate::store::{BlobStorage, FeedbackStore};

pub const MAX_FEEDBACK_CHARS: usize = 1000;

pub struct SubmissionFlow<'a, S, C> {
    store: &'a FeedbackStore<S>,
    classifier: &'a C,
}

impl<'a, S, C> SubmissionFlow<'a, S, C>
where
    S: BlobStorage,
    C: SentimentClassifier,
{
    pub fn new(store: &'a FeedbackStore<S>, classifier: &'a C) -> Self {
        Self { store, classifier }
    }

    /// Validates and classifies one opinion, then appends it to the store.
    pub async fn submit(
        &self,
        issue_id: &str,
        text: &str,
        metadata: Metadata,
    ) -> Result<FeedbackRecord, SubmitError> {
        let record = build_record(issue_id, text, metadata, self.classifier, Utc::now())?;
        self.store.append(record.clone()).await?;
        info!(
            id = %record.id,
            issue_id = %record.issue_id,
            sentiment = %record.sentiment,
            "feedback recorded"
        );
        Ok(record)
    }
}

/// Builds the record a submission would store, without touching storage.
pub fn build_record<C: SentimentClassifier + ?Sized>(
    issue_id: &str,
    text: &str,
    metadata: Metadata,
    classifier: &C,
    now: DateTime<Utc>,
) -> Result<FeedbackRecord, ValidationError> {
    let text = validate_text(text)?;

    let issue_title = match catalog::find(issue_id) {
        Some(issue) => issue.title.to_string(),
        None => {
            warn!(issue_id, "feedback submitted for an issue outside the catalog");
            String::new()
        }
    };

    Ok(FeedbackRecord {
        id: now.timestamp_millis().to_string(),
        issue_id: issue_id.to_string(),
        issue_title,
        sentiment: classifier.classify(text),
        text: text.to_string(),
        submitted_at: now,
        metadata: trim_metadata(metadata),
    })
}

fn validate_text(text: &str) -> Result<&str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyFeedback);
    }

    let len = trimmed.chars().count();
    if len > MAX_FEEDBACK_CHARS {
        return Err(ValidationError::FeedbackTooLong {
            len,
            max: MAX_FEEDBACK_CHARS,
        });
    }

    Ok(trimmed)
}

fn trim_metadata(metadata: Metadata) -> Metadata {
    let trim = |value: Option<String>| value.map(|value| value.trim().to_string());
    Metadata {
        name: trim(metadata.name),
        age_range: trim(metadata.age_range),
        role: trim(metadata.role),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sentiment;
    use crate::sentiment::{FixedClassifier, RandomClassifier};
    use crate::store::MemoryStorage;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()
    }

    #[test]
    fn stores_trimmed_text_and_catalog_title() {
        let classifier = FixedClassifier(Sentiment::Positive);
        let record = build_record(
            "2",
            "  Allow it with disclosure  \n",
            Metadata::default(),
            &classifier,
            fixed_now(),
        )
        .unwrap();

        assert_eq!(record.text, "Allow it with disclosure");
        assert_eq!(record.issue_title, "Should AI tools be allowed in college assignments?");
        assert_eq!(record.sentiment, Sentiment::Positive);
        assert_eq!(record.id, fixed_now().timestamp_millis().to_string());
        assert_eq!(record.submitted_at, fixed_now());
    }

    #[test]
    fn random_classifier_yields_known_sentiment() {
        let classifier = RandomClassifier::with_seed(11);
        for text in ["a", " padded ", "line\nbreak"] {
            let record =
                build_record("1", text, Metadata::default(), &classifier, fixed_now()).unwrap();
            assert_eq!(record.text, text.trim());
            assert!(Sentiment::ALL.contains(&record.sentiment));
        }
    }

    #[test]
    fn rejects_blank_and_oversized_text() {
        let classifier = FixedClassifier(Sentiment::Neutral);
        let blank = build_record("1", " \t\n", Metadata::default(), &classifier, fixed_now());
        assert_eq!(blank.unwrap_err(), ValidationError::EmptyFeedback);

        let long = "é".repeat(MAX_FEEDBACK_CHARS + 1);
        let err = build_record("1", &long, Metadata::default(), &classifier, fixed_now()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::FeedbackTooLong {
                len: MAX_FEEDBACK_CHARS + 1,
                max: MAX_FEEDBACK_CHARS
            }
        );

        let at_limit = "é".repeat(MAX_FEEDBACK_CHARS);
        assert!(build_record("1", &at_limit, Metadata::default(), &classifier, fixed_now()).is_ok());
    }

    #[test]
    fn unknown_issue_keeps_empty_title() {
        let classifier = FixedClassifier(Sentiment::Neutral);
        let record =
            build_record("99", "Orphan opinion", Metadata::default(), &classifier, fixed_now()).unwrap();
        assert_eq!(record.issue_id, "99");
        assert_eq!(record.issue_title, "");
    }

    #[test]
    fn metadata_is_trimmed_but_absence_is_kept() {
        let classifier = FixedClassifier(Sentiment::Neutral);
        let metadata = Metadata {
            name: Some("  Asha ".to_string()),
            age_range: Some("   ".to_string()),
            role: None,
        };
        let record = build_record("3", "Fix drains", metadata, &classifier, fixed_now()).unwrap();
        assert_eq!(record.metadata.name.as_deref(), Some("Asha"));
        assert_eq!(record.metadata.age_range.as_deref(), Some(""));
        assert_eq!(record.metadata.role, None);
    }

    #[tokio::test]
    async fn empty_submission_leaves_store_unchanged() {
        let store = FeedbackStore::new(MemoryStorage::new());
        let before = store.load().await.unwrap().len();

        let classifier = FixedClassifier(Sentiment::Positive);
        let flow = SubmissionFlow::new(&store, &classifier);
        let result = flow.submit("1", "", Metadata::default()).await;

        assert!(matches!(
            result,
            Err(SubmitError::Validation(ValidationError::EmptyFeedback))
        ));
        assert_eq!(store.load().await.unwrap().len(), before);
    }

    #[tokio::test]
    async fn successful_submission_appends_exactly_once() {
        let store = FeedbackStore::new(MemoryStorage::new());
        let before = store.load().await.unwrap().len();

        let classifier = FixedClassifier(Sentiment::Negative);
        let flow = SubmissionFlow::new(&store, &classifier);
        let record = flow
            .submit("6", "Heat waves are getting worse", Metadata::default())
            .await
            .unwrap();

        let records = store.load().await.unwrap();
        assert_eq!(records.len(), before + 1);
        assert_eq!(records.last(), Some(&record));
        assert_eq!(record.sentiment, Sentiment::Negative);
    }
}

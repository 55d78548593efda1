use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::Sentiment;

/// Assigns a sentiment label to submitted text.
pub trait SentimentClassifier {
    fn classify(&self, text: &str) -> Sentiment;
}

/// Placeholder classifier that ignores the text and draws a label at random:
/// negative 30% of the time, otherwise positive or neutral with equal odds.
pub struct RandomClassifier {
    rng: Mutex<StdRng>,
}

impl RandomClassifier {
    pub const NEGATIVE_PROBABILITY: f64 = 0.3;

    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentClassifier for RandomClassifier {
    fn classify(&self, _text: &str) -> Sentiment {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if rng.gen_bool(1.0 - Self::NEGATIVE_PROBABILITY) {
            if rng.gen_bool(0.5) {
                Sentiment::Positive
            } else {
                Sentiment::Neutral
            }
        } else {
            Sentiment::Negative
        }
    }
}

/// Always returns the same label.
pub struct FixedClassifier(pub Sentiment);

impl SentimentClassifier for FixedClassifier {
    fn classify(&self, _text: &str) -> Sentiment {
        self.0
    }
}

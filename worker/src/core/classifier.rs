//! Multinomial naive Bayes intent classifier

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Laplace smoothing used when none is given
pub const DEFAULT_ALPHA: f64 = 1.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct ClassStats {
    documents: u64,
    feature_total: u64,
    feature_counts: BTreeMap<String, u64>,
}

/// Best class for one input
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// `None` when the model has no classes
    pub intent: Option<String>,
    /// Input features seen during training
    pub known_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaiveBayes {
    alpha: f64,
    documents: u64,
    vocabulary: BTreeSet<String>,
    classes: BTreeMap<String, ClassStats>,
}

impl Default for NaiveBayes {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}

impl NaiveBayes {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            documents: 0,
            vocabulary: BTreeSet::new(),
            classes: BTreeMap::new(),
        }
    }

    pub fn train(&mut self, intent: &str, features: &[String]) {
        self.documents += 1;
        let stats = self.classes.entry(intent.to_string()).or_default();
        stats.documents += 1;
        for feature in features {
            stats.feature_total += 1;
            *stats.feature_counts.entry(feature.clone()).or_insert(0) += 1;
            self.vocabulary.insert(feature.clone());
        }
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Highest log-posterior class; ties go to the lexicographically first
    ///
    /// Features outside the vocabulary are skipped. With no known features
    /// the result is decided by the class priors alone.
    pub fn predict(&self, features: &[String]) -> Prediction {
        let known: Vec<&String> = features.iter().filter(|f| self.vocabulary.contains(*f)).collect();
        let vocabulary = self.vocabulary.len() as f64;

        let mut best: Option<(&String, f64)> = None;
        for (intent, stats) in &self.classes {
            let prior = (stats.documents as f64 / self.documents as f64).ln();
            let denominator = stats.feature_total as f64 + self.alpha * vocabulary;
            let likelihood: f64 = known
                .iter()
                .map(|f| {
                    let count = stats.feature_counts.get(*f).copied().unwrap_or(0) as f64;
                    ((count + self.alpha) / denominator).ln()
                })
                .sum();
            let score = prior + likelihood;

            if best.map_or(true, |(_, top)| score > top) {
                best = Some((intent, score));
            }
        }

        Prediction {
            intent: best.map(|(intent, _)| intent.clone()),
            known_features: known.len(),
        }
    }
}

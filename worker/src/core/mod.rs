//! Pure training logic: corpus loading, feature extraction, classification

pub mod classifier;
pub mod corpus;
pub mod features;

pub use classifier::{NaiveBayes, Prediction};
pub use corpus::{Corpus, Sample, UtteranceField};
pub use features::{extract_features, normalize};

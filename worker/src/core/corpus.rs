//! MASSIVE-style corpus loading
//!
//! One JSON object per line. Only `train` and `test` partitions are used;
//! `dev` lines are parsed but ignored.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;

use crate::error::{WorkerError, WorkerResult};

/// Which text field of a record to train and evaluate on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceField {
    Plain,
    /// Slot-annotated text (`annot_utt`)
    Annotated,
}

impl UtteranceField {
    pub fn from_use_annot(use_annot: bool) -> Self {
        if use_annot {
            Self::Annotated
        } else {
            Self::Plain
        }
    }
}

#[derive(Debug, Deserialize)]
struct Record {
    partition: String,
    intent: String,
    utt: String,
    #[serde(default)]
    annot_utt: Option<String>,
}

/// One labelled utterance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sample {
    pub intent: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    pub train: Vec<Sample>,
    pub test: Vec<Sample>,
}

impl Corpus {
    /// Read a corpus file, choosing the text field per record
    pub fn load(path: &Path, field: UtteranceField) -> WorkerResult<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => WorkerError::DatasetMissing {
                path: path.to_path_buf(),
            },
            _ => WorkerError::IoError(e),
        })?;

        let mut corpus = Corpus::default();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let invalid = |message: String| WorkerError::InvalidDataset {
                path: path.to_path_buf(),
                line: index + 1,
                message,
            };
            let record: Record = serde_json::from_str(&line).map_err(|e| invalid(e.to_string()))?;
            let is_train = match record.partition.as_str() {
                "train" => true,
                "test" => false,
                _ => continue,
            };

            let text = match field {
                UtteranceField::Plain => record.utt,
                UtteranceField::Annotated => record
                    .annot_utt
                    .ok_or_else(|| invalid("missing annot_utt".to_string()))?,
            };
            let sample = Sample {
                intent: record.intent,
                text,
            };

            if is_train {
                corpus.train.push(sample);
            } else {
                corpus.test.push(sample);
            }
        }

        Ok(corpus)
    }

    /// Rewrite every sample's text in place
    pub fn map_text(&mut self, f: impl Fn(&str) -> String) {
        for sample in self.train.iter_mut().chain(self.test.iter_mut()) {
            sample.text = f(&sample.text);
        }
    }

    /// Drop empty and repeated training samples, keeping first occurrences
    ///
    /// Test samples are left alone so accuracy stays over the full test set.
    pub fn clean(&mut self) {
        let mut seen = HashSet::new();
        self.train
            .retain(|s| !s.text.is_empty() && seen.insert((s.intent.clone(), s.text.clone())));
    }
}

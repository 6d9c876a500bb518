//! Baseline job executor: train, evaluate and persist one locale model

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use shared::{process_debug, ProcessId, TaskId};

use crate::core::{extract_features, normalize, Corpus, NaiveBayes, UtteranceField};
use crate::error::{WorkerError, WorkerResult};
use crate::traits::{JobExecutor, JobOutcome};

/// Intent used when an utterance shares no feature with the training set
pub const DEFAULT_FALLBACK_INTENT: &str = "general_quirky";

/// What gets written to `<model_dir>/<task>[_annot]_model.zjson`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub task: TaskId,
    pub use_annot: bool,
    pub fallback_intent: String,
    pub accuracy: f64,
    pub trained_at: DateTime<Utc>,
    pub classifier: NaiveBayes,
}

impl ModelArtifact {
    /// Classify raw text the same way the test set was scored
    pub fn classify(&self, text: &str) -> String {
        self.classify_features(&extract_features(&normalize(text)))
    }

    pub fn classify_features(&self, features: &[String]) -> String {
        let prediction = self.classifier.predict(features);
        match prediction.intent {
            Some(intent) if prediction.known_features > 0 => intent,
            _ => self.fallback_intent.clone(),
        }
    }
}

/// Read an artifact written by [`BaselineExecutor`]
pub fn load_artifact(path: &Path) -> WorkerResult<ModelArtifact> {
    let reader = BufReader::new(ZlibDecoder::new(File::open(path)?));
    Ok(serde_json::from_reader(reader)?)
}

#[derive(Debug, Clone)]
pub struct BaselineExecutor {
    dataset_dir: PathBuf,
    model_dir: PathBuf,
    use_annot: bool,
    fallback_intent: String,
}

impl BaselineExecutor {
    pub fn new(dataset_dir: impl Into<PathBuf>, model_dir: impl Into<PathBuf>) -> Self {
        Self {
            dataset_dir: dataset_dir.into(),
            model_dir: model_dir.into(),
            use_annot: false,
            fallback_intent: DEFAULT_FALLBACK_INTENT.to_string(),
        }
    }

    pub fn with_use_annot(mut self, use_annot: bool) -> Self {
        self.use_annot = use_annot;
        self
    }

    pub fn with_fallback_intent(mut self, intent: impl Into<String>) -> Self {
        self.fallback_intent = intent.into();
        self
    }

    pub fn dataset_path(&self, task: &TaskId) -> PathBuf {
        self.dataset_dir.join(format!("{task}.jsonl"))
    }

    pub fn artifact_path(&self, task: &TaskId) -> PathBuf {
        let suffix = if self.use_annot { "_annot_model" } else { "_model" };
        self.model_dir.join(format!("{task}{suffix}.zjson"))
    }

    /// Blocking body of a job
    fn train_and_evaluate(&self, task: &TaskId) -> WorkerResult<JobOutcome> {
        let mut corpus = Corpus::load(&self.dataset_path(task), UtteranceField::from_use_annot(self.use_annot))?;
        corpus.map_text(normalize);
        corpus.clean();

        if corpus.train.is_empty() {
            return Err(WorkerError::execution(task, "no training utterances"));
        }
        if corpus.test.is_empty() {
            return Err(WorkerError::execution(task, "no test utterances"));
        }

        let mut classifier = NaiveBayes::default();
        for sample in &corpus.train {
            classifier.train(&sample.intent, &extract_features(&sample.text));
        }
        process_debug!(
            ProcessId::current(),
            "🧠 {}: {} intents, {} features, {} training samples",
            task,
            classifier.class_count(),
            classifier.vocabulary_size(),
            corpus.train.len()
        );

        let mut artifact = ModelArtifact {
            task: task.clone(),
            use_annot: self.use_annot,
            fallback_intent: self.fallback_intent.clone(),
            accuracy: 0.0,
            trained_at: Utc::now(),
            classifier,
        };

        // Test text is already normalized, so score on features directly
        let good = corpus
            .test
            .iter()
            .filter(|sample| artifact.classify_features(&extract_features(&sample.text)) == sample.intent)
            .count();
        artifact.accuracy = good as f64 / corpus.test.len() as f64 * 100.0;

        let artifact_path = self.artifact_path(task);
        self.write_artifact(&artifact_path, &artifact)?;

        Ok(JobOutcome {
            accuracy: artifact.accuracy,
            artifact_path,
        })
    }

    fn write_artifact(&self, path: &Path, artifact: &ModelArtifact) -> WorkerResult<()> {
        fs::create_dir_all(&self.model_dir)?;
        let mut encoder = ZlibEncoder::new(BufWriter::new(File::create(path)?), Compression::default());
        serde_json::to_writer(&mut encoder, artifact)?;
        encoder.finish()?.flush()?;
        Ok(())
    }
}

#[async_trait]
impl JobExecutor for BaselineExecutor {
    async fn execute(&self, task: &TaskId) -> WorkerResult<JobOutcome> {
        let executor = self.clone();
        let task = task.clone();
        tokio::task::spawn_blocking(move || executor.train_and_evaluate(&task)).await?
    }
}

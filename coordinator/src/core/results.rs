//! Result collection and the final run report

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::TaskResult;
use uuid::Uuid;

/// Arithmetic mean of all accuracies, NaN when there are none
pub fn mean_accuracy(results: &[TaskResult]) -> f64 {
    if results.is_empty() {
        return f64::NAN;
    }
    results.iter().map(|r| r.accuracy).sum::<f64>() / results.len() as f64
}

/// Append-only collection of task results, in arrival order
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    results: Vec<TaskResult>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: TaskResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Sort by task identifier and reduce to the mean accuracy
    pub fn finalize(mut self) -> (Vec<TaskResult>, f64) {
        self.results.sort_by(|a, b| a.task.cmp(&b.task));
        let mean = mean_accuracy(&self.results);
        (self.results, mean)
    }
}

/// Deterministic summary of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub pool_size: u32,
    pub tasks_enqueued: usize,
    pub tasks_assigned: usize,
    /// Sorted by task identifier
    pub results: Vec<TaskResult>,
    /// NaN when no task completed; written as `null` in JSON
    #[serde(with = "nan_as_null")]
    pub mean_accuracy: f64,
}

impl RunReport {
    /// Task identifiers in report order
    pub fn task_names(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.task.as_str()).collect()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Run {} ({} of {} tasks completed, pool of {})",
            self.run_id,
            self.results.len(),
            self.tasks_enqueued,
            self.pool_size
        )?;
        for result in &self.results {
            writeln!(f, "  {:<8} {:>6.2}", result.task, result.accuracy)?;
        }
        write!(f, "Mean accuracy: {:.2}", self.mean_accuracy)
    }
}

/// JSON has no NaN, so an undefined mean round-trips through `null`
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

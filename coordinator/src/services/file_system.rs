//! Real file system service implementation
//!
//! Discovers locale datasets under the dataset root and writes the run
//! report with an atomic rename so a partial report is never observed.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::core::RunReport;
use crate::error::{CoordinatorError, CoordinatorResult};
use crate::traits::FileSystem;
use shared::{process_debug, process_warn, ProcessId, TaskId};

/// Dataset files carry one JSON object per line
const DATASET_EXTENSION: &str = "jsonl";

/// Real file system implementation
pub struct RealFileSystem {
    /// Directory holding one `<locale>.jsonl` file per task
    dataset_dir: PathBuf,
}

impl RealFileSystem {
    /// Create file system service reading datasets from `./data`
    pub fn new() -> Self {
        Self {
            dataset_dir: PathBuf::from("./data"),
        }
    }

    /// Create with custom dataset directory
    pub fn with_dataset_dir(dataset_dir: PathBuf) -> Self {
        Self { dataset_dir }
    }

    fn fs_error(operation: &str, path: &Path) -> CoordinatorError {
        CoordinatorError::FileSystemError {
            operation: operation.to_string(),
            path: path.display().to_string(),
        }
    }
}

impl Default for RealFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileSystem for RealFileSystem {
    async fn discover_tasks(&self) -> CoordinatorResult<Vec<TaskId>> {
        let mut entries = fs::read_dir(&self.dataset_dir)
            .await
            .map_err(|_| Self::fs_error("read_dir", &self.dataset_dir))?;

        let mut tasks = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|_| Self::fs_error("read_dir", &self.dataset_dir))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DATASET_EXTENSION) {
                continue;
            }
            if !entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                process_warn!(ProcessId::current(), "⚠️ Skipping dataset with non UTF-8 name: {}", path.display());
                continue;
            };
            match TaskId::new(stem) {
                Ok(task) => tasks.push(task),
                Err(e) => process_warn!(ProcessId::current(), "⚠️ Skipping {}: {}", path.display(), e),
            }
        }

        tasks.sort();
        process_debug!(
            ProcessId::current(),
            "📁 Found {} datasets in {}",
            tasks.len(),
            self.dataset_dir.display()
        );
        Ok(tasks)
    }

    async fn write_report(&self, path: &Path, report: &RunReport) -> CoordinatorResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|_| Self::fs_error("create_dir_all", parent))?;
        }

        let content = serde_json::to_string_pretty(report)?;

        // Write to a sibling and rename into place
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, content)
            .await
            .map_err(|_| Self::fs_error("write", &temp_path))?;
        fs::rename(&temp_path, path)
            .await
            .map_err(|_| Self::fs_error("rename", path))?;

        process_debug!(ProcessId::current(), "💾 Report written to {}", path.display());
        Ok(())
    }
}

//! Test fixtures and data for coordinator tests
//!
//! This module provides consistent test data and fixtures used across all test suites.

use std::path::PathBuf;

use coordinator::RunConfig;
use shared::TaskId;

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// Locales used throughout the scenarios
    pub const EN_US: &'static str = "en-US";
    pub const ES_ES: &'static str = "es-ES";
    pub const FR_FR: &'static str = "fr-FR";
    pub const DE_DE: &'static str = "de-DE";

    /// Standard configuration values
    pub const DEFAULT_POOL_SIZE: u32 = 2;
    pub const DEFAULT_ACCURACY: f64 = 75.0;

    /// Upper bound for any simulated run
    pub const RUN_TIMEOUT_MS: u64 = 5_000;

    pub fn task(id: &str) -> TaskId {
        TaskId::new(id).unwrap()
    }

    pub fn tasks(ids: &[&str]) -> Vec<TaskId> {
        ids.iter().map(|id| Self::task(id)).collect()
    }

    /// `count` distinct synthetic locales
    pub fn many_tasks(count: usize) -> Vec<TaskId> {
        (0..count).map(|i| Self::task(&format!("x{i:02}-XX"))).collect()
    }

    /// Run configuration with an explicit allow-list
    pub fn config(tasks: Vec<TaskId>, pool_size: u32) -> RunConfig {
        RunConfig {
            tasks: Some(tasks),
            pool_size,
            dataset_dir: PathBuf::from("./data"),
            model_dir: PathBuf::from("./models"),
            use_annot: false,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            worker_bin: PathBuf::from("worker"),
            report_path: None,
            log_level: "debug".to_string(),
        }
    }

    /// Run configuration that discovers its tasks
    pub fn discovery_config(pool_size: u32) -> RunConfig {
        RunConfig {
            tasks: None,
            ..Self::config(Vec::new(), pool_size)
        }
    }
}

//! Test fixtures and data for worker tests

use std::fs;
use std::path::Path;

use serde_json::json;
use shared::TaskId;

pub struct TestFixtures;

impl TestFixtures {
    pub const EN_US: &'static str = "en-US";
    pub const ES_ES: &'static str = "es-ES";

    pub fn task(id: &str) -> TaskId {
        TaskId::new(id).unwrap()
    }

    /// One MASSIVE-style record as a JSON line
    pub fn record(partition: &str, intent: &str, utt: &str, annot_utt: &str) -> String {
        json!({
            "id": "0",
            "locale": "en-US",
            "partition": partition,
            "scenario": intent.split('_').next().unwrap_or(intent),
            "intent": intent,
            "utt": utt,
            "annot_utt": annot_utt,
        })
        .to_string()
    }

    /// A small, cleanly separable two-intent corpus
    ///
    /// Every test utterance is classified correctly, the last one through
    /// the fallback intent.
    pub fn separable_corpus() -> Vec<String> {
        vec![
            Self::record("train", "alarm_set", "Wake me up at seven", "wake me up at [time : seven]"),
            Self::record("train", "alarm_set", "Set an alarm for six am", "set an alarm for [time : six am]"),
            Self::record("train", "alarm_set", "Set an alarm for six am", "set an alarm for [time : six am]"),
            Self::record("train", "alarm_set", "alarm for tomorrow morning", "alarm for [date : tomorrow] [timeofday : morning]"),
            Self::record("train", "weather_query", "Is it raining today?", "is it raining [date : today]"),
            Self::record("train", "weather_query", "What is the weather like", "what is the weather like"),
            Self::record("train", "weather_query", "weather forecast for tomorrow", "weather forecast for [date : tomorrow]"),
            Self::record("dev", "weather_query", "any snow", "any snow"),
            Self::record("test", "alarm_set", "set an alarm at seven", "set an alarm at [time : seven]"),
            Self::record("test", "weather_query", "What is the weather today", "what is the weather [date : today]"),
            Self::record("test", "general_quirky", "tell jokes please", "tell jokes please"),
        ]
    }

    /// Same corpus with the test partition removed
    pub fn corpus_without_tests() -> Vec<String> {
        Self::separable_corpus()
            .into_iter()
            .filter(|line| !line.contains(r#""partition":"test""#))
            .collect()
    }

    pub fn write_dataset(dir: &Path, task: &str, lines: &[String]) {
        fs::write(dir.join(format!("{task}.jsonl")), lines.join("\n")).unwrap();
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::GenerationError;

/// Options for the generation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Records produced per call (per worker in batch mode).
    pub record_count: u64,
    /// Repetition factor for array-valued templates and fields.
    pub nested_array_size: usize,
    /// Number of concurrent workers used by batch runs.
    pub worker_count: usize,
    /// Column delimiter for CSV output.
    pub delimiter: String,
    /// Optional seed; makes random values reproducible across runs.
    pub seed: Option<u64>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            record_count: 5,
            nested_array_size: 0,
            worker_count: 2,
            delimiter: ",".to_string(),
            seed: None,
        }
    }
}

impl GenerateOptions {
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.worker_count == 0 {
            return Err(GenerationError::InvalidOptions(
                "worker_count must be > 0".to_string(),
            ));
        }
        self.delimiter_byte()?;
        Ok(())
    }

    /// CSV delimiter as a single byte.
    pub fn delimiter_byte(&self) -> Result<u8, GenerationError> {
        match self.delimiter.as_bytes() {
            [byte] => Ok(*byte),
            _ => Err(GenerationError::InvalidOptions(format!(
                "delimiter must be a single byte, got '{}'",
                self.delimiter
            ))),
        }
    }
}

/// Report for a generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub records_requested: u64,
    pub records_generated: u64,
    pub function_usage: BTreeMap<String, u64>,
    pub fallback_count: u64,
    pub unsupported_count: u64,
    pub worker_failures: u64,
    pub duration_ms: u64,
}

impl GenerationReport {
    pub fn new(run_id: String) -> Self {
        Self {
            run_id,
            ..Self::default()
        }
    }

    pub fn record_function_usage(&mut self, name: &str) {
        *self.function_usage.entry(name.to_string()).or_insert(0) += 1;
    }

    pub fn record_fallback(&mut self) {
        self.fallback_count += 1;
    }

    pub fn record_unsupported(&mut self) {
        self.unsupported_count += 1;
    }

    pub fn record_worker_failure(&mut self) {
        self.worker_failures += 1;
    }

    /// Fold a worker's counters into this report.
    pub fn merge(&mut self, other: GenerationReport) {
        self.records_requested += other.records_requested;
        self.records_generated += other.records_generated;
        for (name, count) in other.function_usage {
            *self.function_usage.entry(name).or_insert(0) += count;
        }
        self.fallback_count += other.fallback_count;
        self.unsupported_count += other.unsupported_count;
        self.worker_failures += other.worker_failures;
    }
}

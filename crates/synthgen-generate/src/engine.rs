use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{error, info, warn};

use crate::errors::GenerationError;
use crate::functions::EvalContext;
use crate::model::{GenerateOptions, GenerationReport};
use crate::output::csv::{header_line, row_line};
use crate::state::GeneratorState;
use crate::template::Template;
use crate::walker;

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Serialized lines: JSON records, or a CSV header followed by rows.
    pub records: Vec<String>,
    pub report: GenerationReport,
}

/// Entry point for generating records from template text.
///
/// The engine owns the sequence and cursor state, so consecutive runs on the
/// same engine continue the same `seq` and `datetime_seq` streams.
#[derive(Debug, Clone)]
pub struct GenerationEngine {
    options: GenerateOptions,
    state: Arc<GeneratorState>,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self::with_state(options, Arc::new(GeneratorState::new()))
    }

    pub fn with_state(options: GenerateOptions, state: Arc<GeneratorState>) -> Self {
        Self { options, state }
    }

    pub fn state(&self) -> &Arc<GeneratorState> {
        &self.state
    }

    /// Generate `record_count` JSON records on the calling thread.
    pub fn run(&self, template_text: &str) -> Result<GenerationResult, GenerationError> {
        self.options.validate()?;
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let template = Template::parse(template_text)?;

        info!(
            run_id = %run_id,
            records = self.options.record_count,
            nested = self.options.nested_array_size,
            "generation started"
        );

        let mut report = GenerationReport::new(run_id.clone());
        let mut rng = worker_rng(self.options.seed, "run");
        let records = {
            let mut ctx = EvalContext::new(
                &self.state,
                &mut rng,
                self.options.nested_array_size,
                &mut report,
            );
            walker::generate(template.root(), self.options.record_count, &mut ctx)
        };

        report.records_requested = self.options.record_count;
        report.records_generated = records.len() as u64;
        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            records = report.records_generated,
            fallbacks = report.fallback_count,
            duration_ms = report.duration_ms,
            "generation finished"
        );

        Ok(GenerationResult { records, report })
    }

    /// Like [`run`](Self::run), but failures are logged and yield no records.
    pub fn generate(&self, template_text: &str) -> Vec<String> {
        match self.run(template_text) {
            Ok(result) => result.records,
            Err(err) => {
                error!(error = %err, "generation failed");
                Vec::new()
            }
        }
    }

    /// Generate a CSV header plus one row per record.
    ///
    /// Each record is evaluated once and then laid out by top-level key.
    pub fn run_csv(&self, template_text: &str) -> Result<GenerationResult, GenerationError> {
        self.options.validate()?;
        let delimiter = self.options.delimiter_byte()?;
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let template = Template::parse(template_text)?;
        let keys = template.keys()?;

        info!(
            run_id = %run_id,
            records = self.options.record_count,
            columns = keys.len(),
            "csv generation started"
        );

        let mut report = GenerationReport::new(run_id.clone());
        let mut rng = worker_rng(self.options.seed, "run");
        let rows = {
            let mut ctx = EvalContext::new(
                &self.state,
                &mut rng,
                self.options.nested_array_size,
                &mut report,
            );
            walker::generate_records(template.root(), self.options.record_count, &mut ctx)
        };

        let mut records = Vec::with_capacity(rows.len() + 1);
        records.push(header_line(&keys, delimiter)?);
        for row in &rows {
            records.push(row_line(row, &keys, delimiter)?);
        }

        report.records_requested = self.options.record_count;
        report.records_generated = rows.len() as u64;
        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            rows = report.records_generated,
            duration_ms = report.duration_ms,
            "csv generation finished"
        );

        Ok(GenerationResult { records, report })
    }

    pub fn generate_csv(&self, template_text: &str) -> Vec<String> {
        match self.run_csv(template_text) {
            Ok(result) => result.records,
            Err(err) => {
                error!(error = %err, "csv generation failed");
                Vec::new()
            }
        }
    }

    /// Run `worker_count` blocking workers, each producing `record_count`
    /// events, and concatenate their output in worker order.
    pub async fn run_batch(
        &self,
        template_text: &str,
    ) -> Result<GenerationResult, GenerationError> {
        self.options.validate()?;
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let template = Arc::new(Template::parse(template_text)?);
        let workers = self.options.worker_count;
        let record_count = self.options.record_count;
        let nested = self.options.nested_array_size;

        if !template.root().is_object() {
            warn!(run_id = %run_id, "batch generation needs an object template");
        }
        info!(
            run_id = %run_id,
            workers,
            records_per_worker = record_count,
            "batch generation started"
        );

        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let template = Arc::clone(&template);
            let state = Arc::clone(&self.state);
            let seed = self.options.seed;
            let run_id = run_id.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                let mut report = GenerationReport::new(run_id);
                let mut rng = worker_rng(seed, &format!("worker-{index}"));
                let events = {
                    let mut ctx = EvalContext::new(&state, &mut rng, nested, &mut report);
                    walker::generate_events(template.root(), record_count, &mut ctx)
                };
                report.records_requested = record_count;
                report.records_generated = events.len() as u64;
                (events, report)
            }));
        }

        let mut report = GenerationReport::new(run_id.clone());
        let mut records = Vec::new();
        for (index, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok((events, worker_report)) => {
                    records.extend(events);
                    report.merge(worker_report);
                }
                Err(err) => {
                    error!(run_id = %run_id, worker = index, error = %err, "worker failed");
                    report.records_requested += record_count;
                    report.record_worker_failure();
                }
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            records = report.records_generated,
            worker_failures = report.worker_failures,
            duration_ms = report.duration_ms,
            "batch generation finished"
        );

        Ok(GenerationResult { records, report })
    }

    pub async fn generate_batch(&self, template_text: &str) -> Vec<String> {
        match self.run_batch(template_text).await {
            Ok(result) => result.records,
            Err(err) => {
                error!(error = %err, "batch generation failed");
                Vec::new()
            }
        }
    }
}

/// One-shot JSON generation with fresh state and an unseeded RNG.
pub fn generate(template_text: &str, record_count: u64, nested_array_size: usize) -> Vec<String> {
    let options = GenerateOptions {
        record_count,
        nested_array_size,
        ..GenerateOptions::default()
    };
    GenerationEngine::new(options).generate(template_text)
}

fn worker_rng(seed: Option<u64>, key: &str) -> ChaCha8Rng {
    let seed = match seed {
        Some(seed) => hash_seed(seed, key),
        None => rand::random(),
    };
    ChaCha8Rng::seed_from_u64(seed)
}

fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_seeds_differ_per_key() {
        assert_ne!(hash_seed(7, "worker-0"), hash_seed(7, "worker-1"));
        assert_eq!(hash_seed(7, "worker-0"), hash_seed(7, "worker-0"));
    }
}

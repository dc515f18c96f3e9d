mod logging;
mod settings;

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use synthgen_generate::{
    GenerateOptions, GenerationEngine, GenerationError, GenerationResult, Template,
};
use thiserror::Error;
use tracing::{info, warn};

use logging::{LogFormat, init_logging};
use settings::load_settings;

/// Template used when `--template` points at a missing file.
const DEFAULT_TEMPLATE: &str = include_str!("../templates/template.json");

#[derive(Debug, Error)]
pub enum CliError {
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("logging error: {0}")]
    Logging(String),
}

#[derive(Parser, Debug)]
#[command(name = "synthgen", version, about = "Template-driven synthetic data generator")]
struct Cli {
    /// Optional TOML settings file.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Log output format.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Emit JSON records, one per line.
    Json(JsonArgs),
    /// Emit a CSV header and one row per record.
    Csv(CsvArgs),
}

#[derive(Args, Debug)]
struct JsonArgs {
    /// Template for generating synthetic data.
    #[arg(short, long)]
    template: PathBuf,
    /// Records per worker.
    #[arg(short = 'n', long = "count")]
    record_count: Option<u64>,
    /// Repetitions of array elements.
    #[arg(short = 'a', long = "nested")]
    nested_array_size: Option<usize>,
    /// Number of concurrent workers.
    #[arg(short = 'x', long = "workers")]
    worker_count: Option<usize>,
    /// Seed for reproducible random values.
    #[arg(long)]
    seed: Option<u64>,
    /// Write records here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Write the generation report as JSON.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CsvArgs {
    /// Template for generating synthetic data.
    #[arg(short, long)]
    template: PathBuf,
    /// Number of rows.
    #[arg(short = 'n', long = "count")]
    record_count: Option<u64>,
    /// Column delimiter.
    #[arg(short, long)]
    delimiter: Option<String>,
    /// Seed for reproducible random values.
    #[arg(long)]
    seed: Option<u64>,
    /// Write rows here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;
    init_logging(cli.log_format.unwrap_or(settings.log_format))?;

    match cli.command {
        Command::Json(args) => run_json(args, settings.generate).await,
        Command::Csv(args) => run_csv(args, settings.generate),
    }
}

async fn run_json(args: JsonArgs, mut options: GenerateOptions) -> Result<(), CliError> {
    if let Some(count) = args.record_count {
        options.record_count = count;
    }
    if let Some(nested) = args.nested_array_size {
        options.nested_array_size = nested;
    }
    if let Some(workers) = args.worker_count {
        options.worker_count = workers;
    }
    if args.seed.is_some() {
        options.seed = args.seed;
    }

    let template = load_template(&args.template)?;
    let engine = GenerationEngine::new(options);
    let result = if is_array_template(&template) {
        warn!("array templates produce a single record, generating without workers");
        engine.run(&template)?
    } else {
        engine.run_batch(&template).await?
    };
    write_records(&result, args.out.as_deref())?;

    if let Some(path) = args.report {
        std::fs::write(&path, serde_json::to_vec_pretty(&result.report)?)?;
        info!(path = %path.display(), "report written");
    }
    Ok(())
}

fn run_csv(args: CsvArgs, mut options: GenerateOptions) -> Result<(), CliError> {
    if let Some(count) = args.record_count {
        options.record_count = count;
    }
    if let Some(delimiter) = args.delimiter {
        options.delimiter = delimiter;
    }
    if args.seed.is_some() {
        options.seed = args.seed;
    }

    let template = load_template(&args.template)?;
    let engine = GenerationEngine::new(options);
    let result = engine.run_csv(&template)?;
    write_records(&result, args.out.as_deref())
}

fn load_template(path: &Path) -> Result<String, CliError> {
    if path.exists() {
        return Ok(std::fs::read_to_string(path)?);
    }
    warn!(path = %path.display(), "template not found, using bundled default");
    Ok(DEFAULT_TEMPLATE.to_string())
}

fn is_array_template(text: &str) -> bool {
    Template::parse(text).is_ok_and(|template| template.root().is_array())
}

fn write_records(result: &GenerationResult, out: Option<&Path>) -> Result<(), CliError> {
    match out {
        Some(path) => {
            let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
            for line in &result.records {
                writeln!(file, "{line}")?;
            }
            file.flush()?;
            info!(
                path = %path.display(),
                records = result.report.records_generated,
                "records written"
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            for line in &result.records {
                writeln!(stdout, "{line}")?;
            }
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_templates_skip_the_worker_pool() {
        assert!(is_array_template(r#"[{"a":"int(1,2)"}]"#));
        assert!(!is_array_template(r#"{"a":"int(1,2)"}"#));
        assert!(!is_array_template("[broken"));
    }

    #[test]
    fn bundled_template_is_an_object() {
        let template = Template::parse(DEFAULT_TEMPLATE).expect("bundled template");
        assert!(template.root().is_object());
    }
}

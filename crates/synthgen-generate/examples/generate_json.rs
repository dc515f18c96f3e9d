use std::env;
use std::path::PathBuf;

use synthgen_generate::{GenerateOptions, GenerationEngine};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let mut template_path: Option<PathBuf> = None;
    let mut options = GenerateOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--template" => template_path = args.next().map(PathBuf::from),
            "--count" => {
                options.record_count = args.next().ok_or("missing --count value")?.parse()?
            }
            "--nested" => {
                options.nested_array_size = args.next().ok_or("missing --nested value")?.parse()?
            }
            "--seed" => options.seed = Some(args.next().ok_or("missing --seed value")?.parse()?),
            _ => {
                if template_path.is_none() {
                    template_path = Some(PathBuf::from(arg));
                } else {
                    return Err("unexpected argument".into());
                }
            }
        }
    }

    let template_path = template_path.ok_or("missing --template path")?;
    let template = std::fs::read_to_string(&template_path)?;

    let engine = GenerationEngine::new(options);
    let result = engine.run(&template)?;
    for record in &result.records {
        println!("{record}");
    }
    eprintln!("{}", serde_json::to_string_pretty(&result.report)?);
    Ok(())
}

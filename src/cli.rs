use crate::config::{load_config, LayoutConfig};
use crate::layout::{generate, GenerationResult};
use crate::xml::Document;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "bpmndi",
    version,
    about = "Generate BPMN diagram interchange (shapes and edges) for a process model"
)]
pub struct Args {
    /// BPMN document to annotate (rewritten in place unless --output is set)
    pub input: PathBuf,

    /// Write the augmented document to a different path
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Layout config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,
}

pub fn run() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let output = args.output.clone().unwrap_or_else(|| args.input.clone());

    let result = process(&args.input, &output, &config)?;
    println!(
        "{}: {} shapes, {} edges",
        output.display(),
        result.shapes,
        result.edges
    );
    Ok(())
}

/// Read one document, run the layout engine, and write the result. Nothing is
/// written when generation fails.
pub fn process(input: &Path, output: &Path, config: &LayoutConfig) -> Result<GenerationResult> {
    let contents = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let mut doc = Document::parse(&contents)
        .with_context(|| format!("failed to parse {}", input.display()))?;
    let result = generate(&mut doc, config)?;
    std::fs::write(output, doc.to_xml())
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(result)
}

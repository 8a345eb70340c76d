//! tensorvm-opt
//!
//! Runs a registered pipeline over a JSON-serialized program tree.
//!
//! # Usage
//!
//! ```bash
//! # Full lowering, options from TENSORVM__* environment variables
//! tensorvm-opt model.json -o lowered.json
//!
//! # Options from a YAML file, strict resolution
//! tensorvm-opt model.json --config team.yaml --strict
//!
//! # Show the stage list without running it
//! TENSORVM__SCHEDULING__EXECUTION_MODEL=host-only tensorvm-opt --print-pipeline
//! ```
//!
//! Exit status: 0 on success, 1 on a stage failure, 2 on a configuration
//! error (reported before any stage runs).

use anyhow::Context;
use clap::Parser;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tensorvm_compiler::config::PipelineOptions;
use tensorvm_compiler::pipeline::{
    ConverterRegistry, PipelineExecutor, PipelineHooks, PipelineRegistry, TRANSFORMATION_PIPELINE,
};
use tensorvm_compiler::{CompilerError, ProgramTree};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tensorvm-opt")]
#[command(about = "Lower a tensorvm program tree through a registered pipeline", long_about = None)]
struct Cli {
    /// Input program tree (JSON); `-` reads stdin
    #[arg(default_value = "-")]
    input: String,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Registered pipeline to run
    #[arg(short, long, default_value = TRANSFORMATION_PIPELINE)]
    pipeline: String,

    /// YAML options file (v1 schema); environment variables are used otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fail on missing prerequisites instead of disabling the feature
    #[arg(long)]
    strict: bool,

    /// Print the stage list and exit
    #[arg(long)]
    print_pipeline: bool,

    /// Print the resolved options and exit
    #[arg(long)]
    print_options: bool,

    /// List registered pipelines and exit
    #[arg(long)]
    list_pipelines: bool,

    /// Print per-stage timings to stderr
    #[arg(long)]
    timings: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(report_failure(&err)),
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let registry = PipelineRegistry::builtin();

    if cli.list_pipelines {
        for registration in registry.iter() {
            println!("{:<40} {}", registration.name, registration.description);
        }
        return Ok(());
    }

    let registration = registry.get(&cli.pipeline).map_err(CompilerError::from)?;

    let mut options = match &cli.config {
        Some(path) => PipelineOptions::from_yaml_file(path),
        None => PipelineOptions::from_env(),
    }
    .map_err(CompilerError::from)?;
    if cli.strict {
        options = options.strict_mode(true);
    }

    let hooks = PipelineHooks::empty();
    let resolved = options
        .resolve(&hooks, &ConverterRegistry::builtin())
        .map_err(CompilerError::from)?;

    if cli.print_options {
        println!("{}", resolved.summary());
        println!("{}", resolved.provenance_summary());
        return Ok(());
    }

    let stages = registration.build(&resolved, &hooks);
    if cli.print_pipeline {
        println!("{}", stages.to_pipeline_string());
        return Ok(());
    }

    let mut tree = read_tree(&cli.input)?;
    let report = PipelineExecutor::new(hooks)
        .run(&stages, &mut tree)
        .map_err(CompilerError::from)?;
    if cli.timings {
        eprintln!("{}", report.summary());
    }

    let rendered = tree.to_json_pretty().map_err(CompilerError::from)?;
    match &cli.output {
        Some(path) => std::fs::write(path, rendered + "\n")
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", rendered).context("failed to write stdout")?;
        }
    }
    Ok(())
}

fn read_tree(input: &str) -> anyhow::Result<ProgramTree> {
    let source = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input))?
    };
    Ok(ProgramTree::from_json(&source).map_err(CompilerError::from)?)
}

/// Print the failure to stderr; returns the exit status
fn report_failure(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<CompilerError>() {
        Some(CompilerError::Pipeline(pipeline_err)) if !pipeline_err.is_config() => {
            for diagnostic in pipeline_err.diagnostics() {
                eprintln!("{}", diagnostic);
            }
            if let Some(stage) = pipeline_err.stage_name() {
                eprintln!("note: pipeline halted at stage '{}'", stage);
            }
            1
        }
        Some(compiler_err) => {
            eprintln!("error: {}", compiler_err);
            compiler_err.exit_code()
        }
        None => {
            eprintln!("error: {:#}", err);
            1
        }
    }
}

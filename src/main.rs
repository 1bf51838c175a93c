use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use uispec_compiler::config::{load_config, merge_with_cli_args, CliOverrides, Config, PlannerKind};
use uispec_compiler::{check, hash_document, telemetry, CompileFailure};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to config file (overrides default location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile an OpenAPI document into UISpecs
    Compile(CompileArgs),

    /// Parse, validate and resolve only
    Check(SpecArg),

    /// Print the canonical hash and compile id
    Hash {
        #[command(flatten)]
        spec: SpecArg,

        /// Per-author token mixed into the compile id
        #[arg(long)]
        session_token: Option<String>,
    },
}

#[derive(ClapArgs, Debug)]
struct SpecArg {
    /// Path to the OpenAPI specification file (YAML or JSON)
    #[arg(short, long)]
    spec: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct CompileArgs {
    /// Path to the OpenAPI specification file (YAML or JSON)
    #[arg(short, long)]
    spec: Option<PathBuf>,

    /// Output directory for compiled specs
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Per-author token mixed into the compile id
    #[arg(long)]
    session_token: Option<String>,

    /// Planner implementation
    #[arg(long, value_enum)]
    planner: Option<PlannerKind>,

    /// UiPlanIR JSON file answered by the fixture planner
    #[arg(long)]
    fixture: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    telemetry::init();
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Compile(cli) => {
            let config = merge_with_cli_args(
                config,
                CliOverrides {
                    spec: cli.spec,
                    output: cli.output,
                    session_token: cli.session_token,
                    planner: cli.planner,
                    fixture: cli.fixture,
                },
            );
            compile(config).await
        }
        Command::Check(spec) => {
            let text = read_spec(&spec.spec)?;
            match check(&text) {
                Ok(doc) => {
                    println!("ok (OpenAPI {})", doc.version.as_str());
                    Ok(ExitCode::SUCCESS)
                }
                Err(failure) => report_failure(&failure),
            }
        }
        Command::Hash { spec, session_token } => {
            let text = read_spec(&spec.spec)?;
            match hash_document(&text, session_token.as_deref()) {
                Ok(hash) => {
                    println!("{}", hash.hash);
                    println!("{}", hash.id);
                    Ok(ExitCode::SUCCESS)
                }
                Err(failure) => report_failure(&failure),
            }
        }
    }
}

async fn compile(config: Config) -> Result<ExitCode> {
    let spec_path = config
        .spec
        .clone()
        .ok_or_else(|| anyhow::anyhow!("No input source specified. Use --spec"))?;

    eprintln!("📖 Reading input from: {:?}", spec_path);
    let text = read_spec(&spec_path)?;

    let metrics = config.metrics_sink();
    let compiler = config.build_compiler(metrics.clone())?;
    eprintln!("🔧 Compiling with '{:?}' planner...", config.planner.kind);

    let result = compiler.compile(&text, config.session_token.as_deref()).await;
    metrics.shutdown().await;
    let artifact = match result {
        Ok(artifact) => artifact,
        Err(failure) => return report_failure(&failure),
    };

    let output_dir = config.output.join(&artifact.id);
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    write_json(&output_dir.join("result.json"), &artifact)?;
    for (slug, spec) in &artifact.specs {
        let path = output_dir.join(format!("{}.json", slug));
        write_json(&path, spec)?;
        eprintln!("✅ Generated: {:?}", path);
    }

    eprintln!("🎉 Compiled {} resource(s)", artifact.specs.len());
    println!("{}", artifact.id);
    Ok(ExitCode::SUCCESS)
}

fn read_spec(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read spec file: {:?}", path))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).with_context(|| format!("Failed to write output file: {:?}", path))
}

fn report_failure(failure: &CompileFailure) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(failure)?);
    Ok(ExitCode::FAILURE)
}

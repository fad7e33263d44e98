//! Mamdani - multi-stage fuzzy inference
//!
//! Command-line interface: load a JSON system description, run one inference
//! over the given crisp inputs and print the outputs.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use indexmap::IndexMap;
use tracing_subscriber::EnvFilter;

use mamdani::{
    CrispInputs, ExecutionTrace, FuzzyError, InferenceEngine, InferenceResult, LogLevel,
    MamdaniConfig, OutputFormat, SystemDefinition,
};

#[derive(Parser)]
#[command(name = "mamdani")]
#[command(author = "Mamdani Rust Authors")]
#[command(version = "0.1.0")]
#[command(about = "Multi-stage Mamdani fuzzy inference engine", long_about = None)]
struct Cli {
    /// JSON system description
    #[arg(value_name = "SYSTEM", required_unless_present = "init_config")]
    system: Option<PathBuf>,

    /// Crisp input value; `-` or `none` marks it as missing
    #[arg(short, long = "input", value_name = "NAME=VALUE")]
    inputs: Vec<String>,

    /// JSON object mapping input names to numbers or null
    #[arg(long = "inputs", value_name = "FILE")]
    inputs_file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Print the execution trace
    #[arg(long)]
    trace: bool,

    /// Configuration file (defaults to the standard search paths)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print a default configuration file and exit
    #[arg(long = "init-config")]
    init_config: bool,

    /// Validate the system description and print the stage order
    #[arg(long)]
    check: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// Plain text
    Text,
    /// JSON object
    Json,
    /// Markdown table
    Markdown,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Markdown => OutputFormat::Markdown,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let status = err
                .downcast_ref::<FuzzyError>()
                .map(|e| e.code.exit_status())
                .unwrap_or(1);
            eprintln!("Error: {:#}", err);
            ExitCode::from(u8::try_from(status).unwrap_or(1))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.init_config {
        print!("{}", MamdaniConfig::default_config_content());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => {
            let mut config = MamdaniConfig::load_from_file(path).map_err(FuzzyError::from)?;
            config.apply_env_overrides();
            config
        }
        None => MamdaniConfig::load().map_err(FuzzyError::from)?,
    };
    if cli.verbose {
        config.general.log_level = LogLevel::Verbose;
    }
    if cli.quiet {
        config.general.log_level = LogLevel::Quiet;
    }
    if let Some(format) = cli.format {
        config.general.format = format.into();
    }
    if cli.trace {
        config.general.show_trace = true;
    }

    init_logging(config.general.log_level);

    let Some(system_path) = &cli.system else {
        bail!("no system description given");
    };
    let system = SystemDefinition::from_file(system_path)
        .map_err(FuzzyError::from)
        .with_context(|| format!("Failed to load system: {}", system_path.display()))?;
    let mut engine = InferenceEngine::new(&system, config.inference.clone())?;

    if cli.check {
        println!("System OK: {}", system_path.display());
        for (position, stage) in engine.stages().iter().enumerate() {
            println!(
                "  {}. {} -> {} (priority {}, {} rules)",
                position + 1,
                stage.name,
                stage.output,
                stage.priority,
                stage.rules.len()
            );
        }
        return Ok(());
    }

    let mut inputs = CrispInputs::new();
    if let Some(path) = &cli.inputs_file {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read inputs file: {}", path.display()))?;
        let values: IndexMap<String, Option<f64>> = serde_json::from_str(&content)
            .with_context(|| format!("Invalid inputs file: {}", path.display()))?;
        inputs.extend(values);
    }
    for arg in &cli.inputs {
        let (name, value) = parse_input(arg)?;
        inputs.insert(name, value);
    }

    let result = engine.infer(&inputs)?;
    print!(
        "{}",
        render(&result, engine.trace(), config.general.format, config.general.show_trace)
    );
    Ok(())
}

fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.filter_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Parse `NAME=VALUE`; `-`, `none` and `null` mean the value is missing
fn parse_input(arg: &str) -> Result<(String, Option<f64>), FuzzyError> {
    let invalid = |reason: &str| {
        FuzzyError::parse(format!("invalid input '{}': {}", arg, reason))
            .with_code(mamdani::ErrorCode::InvalidInputArgument)
            .with_hint("expected NAME=VALUE, e.g. -i income=42.5")
    };

    let (name, value) = arg.split_once('=').ok_or_else(|| invalid("missing '='"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid("empty name"));
    }

    let value = value.trim();
    match value.to_lowercase().as_str() {
        "-" | "none" | "null" => Ok((name.to_string(), None)),
        _ => {
            let number: f64 = value.parse().map_err(|_| invalid("not a number"))?;
            Ok((name.to_string(), Some(number)))
        }
    }
}

fn render(
    result: &InferenceResult,
    trace: &ExecutionTrace,
    format: OutputFormat,
    show_trace: bool,
) -> String {
    let mut output = String::new();

    match format {
        OutputFormat::Text => {
            for (name, value) in result {
                match value {
                    Some(v) => output.push_str(&format!("{} = {:.4}\n", name, v)),
                    None => output.push_str(&format!("{} = none\n", name)),
                }
            }
            if show_trace {
                output.push('\n');
                output.push_str(&trace.to_text());
            }
        }
        OutputFormat::Markdown => {
            output.push_str("## Results\n\n| Output | Value |\n|---|---|\n");
            for (name, value) in result {
                match value {
                    Some(v) => output.push_str(&format!("| {} | {:.4} |\n", name, v)),
                    None => output.push_str(&format!("| {} | _none_ |\n", name)),
                }
            }
            if show_trace {
                output.push('\n');
                output.push_str(&trace.to_markdown());
            }
        }
        OutputFormat::Json => {
            let value = if show_trace {
                serde_json::json!({ "results": result, "trace": trace.entries() })
            } else {
                serde_json::json!({ "results": result })
            };
            output.push_str(&serde_json::to_string_pretty(&value).unwrap_or_default());
            output.push('\n');
        }
    }

    output
}

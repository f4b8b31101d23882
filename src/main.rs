use std::{fs, path::PathBuf, process::ExitCode};

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use computed_props::{
    ExpressionError,
    config::EngineConfig,
    dependencies::{extract_dependencies, get_used_functions},
    interpreter::{
        evaluator::core::Context,
        lexer::tokenize,
        validate::validate_expression,
        value::json::property_map_from_json,
    },
    parse,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// computed-props checks, analyzes and evaluates computed property
/// expressions.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Treat the expression argument as the path of a file holding the
    /// expression.
    #[arg(short, long, global = true)]
    file: bool,

    /// Engine limits as a TOML file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and validate an expression, printing every problem found.
    Check { expression: String },
    /// Evaluate an expression against a JSON object of `self` properties.
    Eval {
        expression: String,

        /// Properties as inline JSON, e.g. '{"price": 10}'.
        #[arg(long, conflicts_with = "props_file")]
        props: Option<String>,

        /// Properties read from a JSON file.
        #[arg(long)]
        props_file: Option<PathBuf>,

        /// Print only the result, as JSON, for use in pipelines.
        #[arg(short, long)]
        pipe_mode: bool,
    },
    /// Print the properties and functions an expression uses.
    Deps { expression: String },
    /// Print the token stream of an expression.
    Tokens { expression: String },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter)
                             .with_writer(std::io::stderr)
                             .init();

    let args = Args::parse();
    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

fn run(args: &Args) -> anyhow::Result<ExitCode> {
    let config = match &args.config {
        Some(path) => {
            EngineConfig::load(path).with_context(|| format!("loading {}", path.display()))?
        },
        None => EngineConfig::default(),
    };
    debug!(?config, "engine config");
    let registry = config.registry();

    match &args.command {
        Command::Check { expression } => {
            let source = read_source(expression, args.file)?;
            let expression = match parse(&source) {
                Ok(expression) => expression,
                Err(e) => return Ok(report(&e, &source)),
            };
            let validation = validate_expression(&expression, &registry);
            if validation.is_valid() {
                println!("ok: {expression}");
                return Ok(ExitCode::SUCCESS);
            }
            for error in &validation.errors {
                eprintln!("{}", error.format_with_source(&source));
            }
            Ok(ExitCode::FAILURE)
        },
        Command::Eval { expression,
                        props,
                        props_file,
                        pipe_mode, } => {
            let source = read_source(expression, args.file)?;
            let json = match (props, props_file) {
                (Some(text), _) => serde_json::from_str(text).context("parsing --props")?,
                (None, Some(path)) => {
                    let text = fs::read_to_string(path).with_context(|| {
                                   format!("reading the properties file {}", path.display())
                               })?;
                    serde_json::from_str(&text)
                        .with_context(|| format!("parsing {}", path.display()))?
                },
                (None, None) => serde_json::Value::Object(serde_json::Map::new()),
            };
            let Some(properties) = property_map_from_json(&json) else {
                bail!("properties must be a JSON object");
            };
            info!(properties = properties.len(), "evaluating");

            let expression = match parse(&source) {
                Ok(expression) => expression,
                Err(e) => return Ok(report(&e, &source)),
            };
            let context = Context::new(properties).with_config(&config)
                                                  .with_registry(&registry);
            match context.eval(&expression) {
                Ok(value) if *pipe_mode => println!("{}", value.to_json()),
                Ok(value) => println!("{value}"),
                Err(e) => return Ok(report(&e, &source)),
            }
            Ok(ExitCode::SUCCESS)
        },
        Command::Deps { expression } => {
            let source = read_source(expression, args.file)?;
            let expression = match parse(&source) {
                Ok(expression) => expression,
                Err(e) => return Ok(report(&e, &source)),
            };
            for dependency in extract_dependencies(&expression) {
                let marker =
                    if dependency.has_collection_traversal() { "  (collection)" } else { "" };
                println!("{dependency}{marker}");
            }
            let functions = get_used_functions(&expression);
            if !functions.is_empty() {
                println!("functions: {}", functions.join(", "));
            }
            Ok(ExitCode::SUCCESS)
        },
        Command::Tokens { expression } => {
            let source = read_source(expression, args.file)?;
            match tokenize(&source) {
                Ok(tokens) => {
                    for token in tokens {
                        println!("{:>4}..{:<4} {:?}", token.span.start, token.span.end, token.kind);
                    }
                    Ok(ExitCode::SUCCESS)
                },
                Err(e) => Ok(report(&e, &source)),
            }
        },
    }
}

fn read_source(contents: &str, is_file: bool) -> anyhow::Result<String> {
    if is_file {
        fs::read_to_string(contents).with_context(|| {
                                        format!("Failed to read the input file '{contents}'. \
                                                 Perhaps this file does not exist?")
                                    })
    } else {
        Ok(contents.to_string())
    }
}

fn report(error: &ExpressionError, source: &str) -> ExitCode {
    eprintln!("{}", error.format_with_source(source));
    ExitCode::FAILURE
}

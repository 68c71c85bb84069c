//! pgray - render PostgreSQL EXPLAIN output as a plan graph
//!
//! Reads `EXPLAIN` or `EXPLAIN (FORMAT JSON)` output from a file or stdin and
//! prints the node/edge graph, the parsed plan, or an indented tree.

mod logging;
mod render;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use pgray_plan::{InputFormat, RootPolicy, Visualizer, VisualizerConfig};
use std::io::Read;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(
    name = "pgray",
    version,
    about = "Turn PostgreSQL EXPLAIN output into a plan graph"
)]
struct Cli {
    /// EXPLAIN output to read; stdin when absent or "-"
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Input format
    #[arg(long, value_enum, default_value_t = InputArg::Auto)]
    input: InputArg,

    /// What to print
    #[arg(long, value_enum, default_value_t = OutputArg::Graph)]
    output: OutputArg,

    /// Keep every top-level step of text plans under a synthetic root
    #[arg(long)]
    forest: bool,

    /// Drop "Planning Time:" and "Execution Time:" lines from text plans
    #[arg(long)]
    skip_summary: bool,

    /// TOML configuration file
    #[arg(long, value_name = "FILE", env = "PGRAY_CONFIG")]
    config: Option<PathBuf>,

    /// Print JSON on a single line
    #[arg(long)]
    compact: bool,

    /// Log plan parsing to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Write logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InputArg {
    Auto,
    Json,
    Text,
}

impl From<InputArg> for InputFormat {
    fn from(arg: InputArg) -> Self {
        match arg {
            InputArg::Auto => InputFormat::Auto,
            InputArg::Json => InputFormat::Json,
            InputArg::Text => InputFormat::Text,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputArg {
    /// Node and edge lists as JSON
    Graph,
    /// Indented node summaries
    Tree,
    /// Parsed plan in EXPLAIN (FORMAT JSON) shape
    Plan,
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = logging::init(logging_config(&cli)) {
        eprintln!("warning: logging unavailable: {err}");
    }

    if let Err(err) = run(cli) {
        tracing::debug!("pgray failed: {err:#}");
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let input = read_input(cli.file.as_deref())?;
    let visualizer = Visualizer::new(config);
    let format = InputFormat::from(cli.input);

    let rendered = match cli.output {
        OutputArg::Graph => {
            let visualization = visualizer.visualize(&input, format)?;
            render::graph_document(&visualization, cli.compact)?
        }
        OutputArg::Tree => {
            let visualization = visualizer.visualize(&input, format)?;
            render::render_tree(&visualization.graph)
        }
        OutputArg::Plan => {
            let parsed = visualizer.parse_plan(&input, format)?;
            let doc = render::plan_document(
                parsed.root.as_ref(),
                parsed.planning_time_ms,
                parsed.execution_time_ms,
            );
            if cli.compact {
                serde_json::to_string(&doc)?
            } else {
                serde_json::to_string_pretty(&doc)?
            }
        }
    };

    println!("{}", rendered.trim_end());
    Ok(())
}

fn logging_config(cli: &Cli) -> logging::LoggingConfig {
    let mut config = if cli.verbose {
        logging::LoggingConfig::verbose()
    } else {
        logging::LoggingConfig::default()
    };
    config.json = cli.log_json;
    config
}

/// Reads the configuration file, then applies command-line overrides
fn load_config(cli: &Cli) -> Result<VisualizerConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            VisualizerConfig::from_toml_str(&source)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => VisualizerConfig::default(),
    };

    if cli.forest {
        config.text.roots = RootPolicy::Forest;
    }
    if cli.skip_summary {
        config.text.skip_summary_lines = true;
    }
    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}

fn read_input(file: Option<&std::path::Path>) -> Result<String> {
    match file {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("failed to read stdin")?;
            Ok(input)
        }
    }
}

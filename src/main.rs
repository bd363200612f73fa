use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dci_core::{DciConfig, OutputFormat};
use dci_graph::{compute_coupling, CallGraph};
use dci_report::summary::CouplingSummary;
use dci_traces::TraceParser;

#[derive(Parser)]
#[command(
    name = "dci",
    version,
    about = "Relative service coupling from distributed traces",
    long_about = "dci folds caller -> callee calls observed in Zipkin-style span files into a\n\
                   service call graph and scores every service by the share of other services\n\
                   it depends on at runtime (the Dynamic Coupling Index).\n\n\
                   Examples:\n  \
                     dci analyze traces.json                 Print a coupling summary\n  \
                     dci analyze a.json b.json --csv dci.csv Merge traces, write CSV scores\n  \
                     dci analyze traces.json --graphml g.graphml --dot g.dot\n  \
                     dci analyze traces.json --format json   Machine-readable summary\n  \
                     dci init                                Write a default .dci.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .dci.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for the summary.\n\n\
                       Formats:\n  \
                         text      Human-readable summary (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Compute coupling scores from one or more trace files
    #[command(long_about = "Compute coupling scores from one or more trace files.\n\n\
        All files are merged into a single call graph before scoring. The\n\
        summary is printed to stdout; --csv, --graphml and --dot additionally\n\
        write the scores and graph to files. Fails if no service-to-service\n\
        call is found.")]
    Analyze {
        /// Span files (JSON array of spans, or array of traces)
        #[arg(required = true)]
        traces: Vec<PathBuf>,

        /// Write `Service,DCI,Status` rows to this file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write a GraphML graph (Gephi, yEd) to this file
        #[arg(long)]
        graphml: Option<PathBuf>,

        /// Write a Graphviz DOT graph to this file
        #[arg(long)]
        dot: Option<PathBuf>,
    },
    /// Create a default .dci.toml configuration file
    #[command(long_about = "Create a default .dci.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .dci.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

const CONFIG_FILE: &str = ".dci.toml";

const DEFAULT_CONFIG: &str = r#"# DCI Configuration

[traces]
# Span fields naming the calling and the called service
# caller_field = "localEndpoint"
# callee_field = "remoteEndpoint"

[report]
# Decimal places of scores in CSV and summaries
# decimals = 3
# Rows shown per list in text and markdown summaries
# limit = 20

[graphml]
# Circular layout of exported nodes
# center_x = 200.0
# center_y = 200.0
# radius = 100.0
"#;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false),
        )
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<DciConfig> {
    let config = match path {
        Some(path) => DciConfig::from_file(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to load config {}", path.display()))?,
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                DciConfig::from_file(default_path)
                    .into_diagnostic()
                    .wrap_err("failed to load .dci.toml")?
            } else {
                DciConfig::default()
            }
        }
    };
    Ok(config)
}

fn analyze(
    config: &DciConfig,
    format: OutputFormat,
    traces: &[PathBuf],
    csv: Option<&Path>,
    graphml: Option<&Path>,
    dot: Option<&Path>,
) -> Result<()> {
    let parser = TraceParser::new(&config.traces);
    let mut graph = CallGraph::new();
    let mut spans = 0;
    for path in traces {
        let parsed = parser
            .parse_file(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to parse trace file {}", path.display()))?;
        spans += parsed.total_spans;
        graph.extend(parsed.records);
    }
    tracing::info!(
        files = traces.len(),
        spans,
        services = graph.total_services(),
        edges = graph.edge_count(),
        "built call graph"
    );

    if graph.edge_count() == 0 {
        miette::bail!(miette::miette!(
            help = format!(
                "Check that spans carry `{}.serviceName` and `{}.serviceName`, \
                 or set caller_field / callee_field under [traces] in .dci.toml",
                config.traces.caller_field, config.traces.callee_field
            ),
            "No service-to-service calls found in {spans} span(s)"
        ));
    }

    let scores = compute_coupling(&graph);

    if let Some(path) = csv {
        dci_report::csv::write_scores_file(&scores, config.report.decimals, path)
            .into_diagnostic()?;
        eprintln!("DCI scores written to {}", path.display());
    }
    if let Some(path) = graphml {
        dci_report::graphml::write_graphml_file(&graph, &scores, &config.graphml, path)
            .into_diagnostic()?;
        eprintln!("GraphML written to {}", path.display());
    }
    if let Some(path) = dot {
        dci_report::dot::write_dot_file(&graph, &scores, path).into_diagnostic()?;
        eprintln!("DOT graph written to {}", path.display());
    }

    let summary = CouplingSummary::from_scores(&graph, &scores)
        .with_limit(config.report.limit)
        .with_decimals(config.report.decimals);
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).into_diagnostic()?
            );
        }
        OutputFormat::Markdown => print!("{}", summary.to_markdown()),
        OutputFormat::Text => print!("{summary}"),
    }
    Ok(())
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Analyze {
            ref traces,
            ref csv,
            ref graphml,
            ref dot,
        } => {
            let config = load_config(cli.config.as_deref())?;
            tracing::debug!(format = %cli.format, ?config, "resolved configuration");
            analyze(
                &config,
                cli.format,
                traces,
                csv.as_deref(),
                graphml.as_deref(),
                dot.as_deref(),
            )?;
        }
        Command::Init => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!(".dci.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .dci.toml with default configuration");
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "dci", &mut std::io::stdout());
        }
    }

    Ok(())
}

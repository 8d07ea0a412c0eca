use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use dflow_core::{
    analyze_program, AnalysisKind, ControlFlowGraph, ControlFlowShape, EngineConfig, Program,
    WorklistOrder,
};
use dflow_emit::{DotEmitter, EmitterConfig, FactEmitter, JsonFormatter, OutputFormat};
use dflow_parser::Syntax;
use indexmap::IndexMap;
use serde::Serialize;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "dflow")]
#[command(about = "Worklist dataflow analyses and CFG inspection for Bril programs")]
#[command(version)]
struct Cli {
    /// Log more to stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print IN/OUT facts per block for every function.
    Analyze {
        #[arg(value_enum)]
        analysis: AnalysisArg,

        /// Program to read; stdin when omitted.
        input: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "auto")]
        syntax: SyntaxArg,

        #[arg(long, value_enum, default_value = "text")]
        format: FormatArg,

        #[arg(long, value_enum, default_value = "fifo")]
        order: OrderArg,

        /// Seed for `--order shuffled`.
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Do not queue a block that is already waiting.
        #[arg(long)]
        dedup: bool,
    },

    /// Print the control-flow graph of every function.
    Cfg {
        input: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "auto")]
        syntax: SyntaxArg,

        #[arg(long, value_enum, default_value = "dot")]
        format: FormatArg,
    },

    /// Print path lengths, reverse postorder, back edges and reducibility.
    Shape {
        input: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "auto")]
        syntax: SyntaxArg,

        #[arg(long, value_enum, default_value = "text")]
        format: FormatArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AnalysisArg {
    Defined,
    Live,
    Cprop,
    Rdefs,
    Available,
}

impl From<AnalysisArg> for AnalysisKind {
    fn from(arg: AnalysisArg) -> Self {
        match arg {
            AnalysisArg::Defined => AnalysisKind::Defined,
            AnalysisArg::Live => AnalysisKind::Live,
            AnalysisArg::Cprop => AnalysisKind::Cprop,
            AnalysisArg::Rdefs => AnalysisKind::Rdefs,
            AnalysisArg::Available => AnalysisKind::Available,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SyntaxArg {
    Auto,
    Json,
    Text,
}

impl From<SyntaxArg> for Syntax {
    fn from(arg: SyntaxArg) -> Self {
        match arg {
            SyntaxArg::Auto => Syntax::Auto,
            SyntaxArg::Json => Syntax::Json,
            SyntaxArg::Text => Syntax::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
    Dot,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Dot => OutputFormat::Dot,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrderArg {
    Fifo,
    Lifo,
    Shuffled,
}

impl OrderArg {
    fn with_seed(self, seed: u64) -> WorklistOrder {
        match self {
            OrderArg::Fifo => WorklistOrder::Fifo,
            OrderArg::Lifo => WorklistOrder::Lifo,
            OrderArg::Shuffled => WorklistOrder::Shuffled { seed },
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let use_colors = !cli.no_color && std::io::stdout().is_terminal();
    if !use_colors {
        colored::control::set_override(false);
    }
    let emitter_config = EmitterConfig {
        use_colors,
        ..EmitterConfig::default()
    };

    let outcome = match cli.command {
        Commands::Analyze {
            analysis,
            input,
            syntax,
            format,
            order,
            seed,
            dedup,
        } => {
            let engine = EngineConfig::default()
                .with_order(order.with_seed(seed))
                .with_dedup(dedup);
            cmd_analyze(
                analysis.into(),
                input,
                syntax,
                format.into(),
                &engine,
                emitter_config,
            )
        }
        Commands::Cfg {
            input,
            syntax,
            format,
        } => cmd_cfg(input, syntax, format.into(), emitter_config),
        Commands::Shape {
            input,
            syntax,
            format,
        } => cmd_shape(input, syntax, format.into()),
    };

    match outcome {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn load(input: Option<PathBuf>, syntax: SyntaxArg) -> Result<Program> {
    let program = dflow_parser::load(input.as_deref(), syntax.into()).with_context(|| {
        match &input {
            Some(path) => format!("could not load {}", path.display()),
            None => "could not load program from stdin".to_string(),
        }
    })?;
    info!(functions = program.functions.len(), "loaded program");
    Ok(program)
}

fn report_failure(function: &str, err: &dyn std::fmt::Display) {
    eprintln!("{} @{}: {}", "error:".red().bold(), function, err);
}

/// Returns the number of functions that could not be analyzed.
fn cmd_analyze(
    kind: AnalysisKind,
    input: Option<PathBuf>,
    syntax: SyntaxArg,
    format: OutputFormat,
    engine: &EngineConfig,
    emitter_config: EmitterConfig,
) -> Result<usize> {
    if format == OutputFormat::Dot {
        bail!("`--format dot` is only available for `dflow cfg`");
    }
    let program = load(input, syntax)?;

    let mut reports = Vec::new();
    let mut failures = 0;
    for (name, result) in analyze_program(&program, kind, engine) {
        match result {
            Ok(report) => reports.push(report),
            Err(err) => {
                report_failure(&name, &err);
                failures += 1;
            }
        }
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => JsonFormatter::format_object(&mut out, &reports)?,
        OutputFormat::Text | OutputFormat::Dot => {
            FactEmitter::new(emitter_config).emit_all(&reports, &mut out)?
        }
    }
    out.flush()?;
    Ok(failures)
}

#[derive(Serialize)]
struct FunctionGraph<'a> {
    function: &'a str,
    successors: IndexMap<&'a str, Vec<&'a str>>,
}

fn cmd_cfg(
    input: Option<PathBuf>,
    syntax: SyntaxArg,
    format: OutputFormat,
    emitter_config: EmitterConfig,
) -> Result<usize> {
    let program = load(input, syntax)?;
    let dot = DotEmitter::new(EmitterConfig {
        use_colors: false,
        ..emitter_config
    });

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut graphs = Vec::new();
    let mut failures = 0;
    for function in &program.functions {
        match ControlFlowGraph::from_function(function) {
            Ok(cfg) => graphs.push((function.name.as_str(), cfg)),
            Err(err) => {
                report_failure(&function.name, &err);
                failures += 1;
            }
        }
    }

    match format {
        OutputFormat::Json => {
            let listing: Vec<FunctionGraph<'_>> = graphs
                .iter()
                .map(|(name, cfg)| FunctionGraph {
                    function: name,
                    successors: cfg.successor_map(),
                })
                .collect();
            JsonFormatter::format_object(&mut out, &listing)?;
        }
        OutputFormat::Text | OutputFormat::Dot => {
            for (name, cfg) in &graphs {
                dot.emit_graph(name, cfg, &mut out)?;
            }
        }
    }
    out.flush()?;
    Ok(failures)
}

#[derive(Serialize)]
struct FunctionShape<'a> {
    function: &'a str,
    #[serde(flatten)]
    shape: ControlFlowShape,
}

fn cmd_shape(input: Option<PathBuf>, syntax: SyntaxArg, format: OutputFormat) -> Result<usize> {
    if format == OutputFormat::Dot {
        bail!("`--format dot` is only available for `dflow cfg`");
    }
    let program = load(input, syntax)?;

    let mut shapes = Vec::new();
    let mut failures = 0;
    for function in &program.functions {
        match ControlFlowGraph::from_function(function) {
            Ok(cfg) => shapes.push(FunctionShape {
                function: &function.name,
                shape: ControlFlowShape::analyze(&cfg),
            }),
            Err(err) => {
                report_failure(&function.name, &err);
                failures += 1;
            }
        }
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if format == OutputFormat::Json {
        JsonFormatter::format_object(&mut out, &shapes)?;
    } else {
        for entry in &shapes {
            write_shape(&mut out, entry)?;
        }
    }
    out.flush()?;
    Ok(failures)
}

fn write_shape<W: Write>(out: &mut W, entry: &FunctionShape<'_>) -> Result<()> {
    let shape = &entry.shape;
    let lengths: Vec<String> = shape
        .path_lengths
        .iter()
        .map(|(name, len)| format!("{}: {}", name, len))
        .collect();
    let edges: Vec<String> = shape
        .back_edges
        .iter()
        .map(|(from, to)| format!("{} -> {}", from, to))
        .collect();

    writeln!(out, "Function: {}", entry.function)?;
    writeln!(out, "Path lengths: {{{}}}", lengths.join(", "))?;
    writeln!(out, "Reverse postorder: {}", shape.reverse_postorder.join(", "))?;
    if edges.is_empty() {
        writeln!(out, "Back edges: none")?;
    } else {
        writeln!(out, "Back edges: {}", edges.join(", "))?;
    }
    writeln!(
        out,
        "Reducible: {}",
        if shape.reducible { "yes" } else { "no" }
    )?;
    Ok(())
}

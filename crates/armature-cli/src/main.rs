use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use uuid::Uuid;

use armature_checkpoint::CheckpointManager;
use armature_graph::{load_graph, topological_sort, validate, Graph, Severity};
use armature_pipeline::compile_workflow;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "armature")]
#[command(about = "Plan, checkpoint and compile repository generation graphs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a graph file for structural defects.
    Validate(ValidateArgs),
    /// Print the generation order of a graph file.
    Order(OrderArgs),
    /// Compile the graph's delta into a workflow document.
    Compile(CompileArgs),
    /// Show generation progress recorded in a checkpoint.
    Status(StatusArgs),
    /// Reset a node and its downstream closure to pending.
    Resume(ResumeArgs),
}

#[derive(clap::Args, Debug)]
struct ValidateArgs {
    #[arg(long)]
    graph: PathBuf,
}

#[derive(clap::Args, Debug)]
struct OrderArgs {
    #[arg(long)]
    graph: PathBuf,
}

#[derive(clap::Args, Debug)]
struct CompileArgs {
    #[arg(long)]
    graph: PathBuf,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct StatusArgs {
    #[arg(long)]
    graph: PathBuf,
    #[arg(long)]
    checkpoint: PathBuf,
}

#[derive(clap::Args, Debug)]
struct ResumeArgs {
    #[arg(long)]
    graph: PathBuf,
    #[arg(long)]
    checkpoint: PathBuf,
    #[arg(long)]
    node: Uuid,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("armature=info,warn")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Validate(args) => validate_command(args),
        Commands::Order(args) => order_command(args),
        Commands::Compile(args) => compile_command(args),
        Commands::Status(args) => status_command(args),
        Commands::Resume(args) => resume_command(args),
    };

    match result {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(1)
        }
    }
}

fn validate_command(args: ValidateArgs) -> Result<ExitCode, String> {
    let graph = read_graph(&args.graph)?;
    let diagnostics = validate(&graph);

    if diagnostics.is_empty() {
        println!("graph is structurally valid ({} nodes, {} edges)", graph.node_count(), graph.edge_count());
        return Ok(ExitCode::SUCCESS);
    }

    let mut errors = 0usize;
    for diagnostic in &diagnostics {
        let severity = match diagnostic.severity {
            Severity::Error => {
                errors += 1;
                "error"
            }
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        let subject = diagnostic
            .node_id
            .map(|id| format!(" [node {id}]"))
            .or_else(|| {
                diagnostic
                    .edge
                    .map(|(from, to)| format!(" [edge {from} -> {to}]"))
            })
            .unwrap_or_default();
        println!("{severity}: {}: {}{subject}", diagnostic.rule, diagnostic.message);
    }

    if errors > 0 {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn order_command(args: OrderArgs) -> Result<ExitCode, String> {
    let graph = read_graph(&args.graph)?;
    let order = topological_sort(&graph).map_err(|error| error.to_string())?;
    for id in order {
        let name = graph.node(id).map(|node| node.name.as_str()).unwrap_or("?");
        println!("{id}  {name}");
    }
    Ok(ExitCode::SUCCESS)
}

fn compile_command(args: CompileArgs) -> Result<ExitCode, String> {
    let graph = read_graph(&args.graph)?;
    let document = compile_workflow(&graph);
    match args.out {
        Some(path) => {
            fs::write(&path, document)
                .map_err(|error| format!("failed writing '{}': {error}", path.display()))?;
            println!("workflow written to {}", path.display());
        }
        None => print!("{document}"),
    }
    Ok(ExitCode::SUCCESS)
}

fn status_command(args: StatusArgs) -> Result<ExitCode, String> {
    let graph = read_graph(&args.graph)?;
    let manager = CheckpointManager::load_checkpoint(&args.checkpoint, graph)
        .map_err(|error| error.to_string())?;

    for (id, record) in &manager.state().nodes {
        let name = manager
            .graph()
            .node(*id)
            .map(|node| node.name.as_str())
            .unwrap_or("?");
        let reason = record
            .failure_reason
            .as_deref()
            .map(|reason| format!(" ({reason})"))
            .unwrap_or_default();
        println!(
            "{:<12} retries={} {name}{reason}",
            record.status.to_string(),
            record.retry_count
        );
    }

    let todo = manager.nodes_to_process();
    println!("pending work: {} of {} nodes", todo.len(), manager.graph().node_count());
    Ok(ExitCode::SUCCESS)
}

fn resume_command(args: ResumeArgs) -> Result<ExitCode, String> {
    let graph = read_graph(&args.graph)?;
    let mut manager = CheckpointManager::load_checkpoint(&args.checkpoint, graph)
        .map_err(|error| error.to_string())?;

    let reset = manager
        .resume_from_node(args.node)
        .map_err(|error| error.to_string())?;
    println!("reset {} node(s) to pending:", reset.len());
    for id in reset {
        let name = manager
            .graph()
            .node(id)
            .map(|node| node.name.as_str())
            .unwrap_or("?");
        println!("{id}  {name}");
    }
    Ok(ExitCode::SUCCESS)
}

fn read_graph(path: &Path) -> Result<Graph, String> {
    load_graph(path).map_err(|error| error.to_string())
}

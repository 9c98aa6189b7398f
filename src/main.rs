use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::info;
use sysds_graph::{
    ConverterRegistry, GraphError, GraphValidator, ValidatorProperties, graph_to_dot,
    load_graph_from_path, load_signature_from_path, render_binding,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Validate SystemDS operator graphs and generate builtin bindings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a JSON graph snapshot and optionally export or convert it.
    Validate {
        /// Path to a JSON file holding a GraphInfo snapshot.
        graph: PathBuf,
        /// Skip checking builtin calls against their DML signatures.
        #[arg(long)]
        skip_signatures: bool,
        /// Optional path to write a Graphviz DOT export of the graph.
        #[arg(long)]
        export_dot: Option<PathBuf>,
        /// Convert the graph to a different format (`dml` or `json`).
        #[arg(long)]
        convert: Option<String>,
        /// Variable prefix used for DML output.
        #[arg(long, default_value = "V")]
        variable_prefix: String,
        /// Path to write the converted graph (stdout if omitted).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Generate a Rust binding from the function header of a DML script.
    Generate {
        /// DML script declaring the builtin function.
        script: PathBuf,
        /// Path to write the binding source (stdout if omitted).
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn write_output(path: Option<&PathBuf>, data: &[u8], format: &str) -> Result<(), GraphError> {
    match path {
        Some(path) => std::fs::write(path, data).map_err(|err| GraphError::export(path, err)),
        None => std::io::stdout()
            .write_all(data)
            .map_err(|err| GraphError::ConversionFailed {
                format: format.to_string(),
                reason: err.to_string(),
            }),
    }
}

fn validate(
    graph_path: PathBuf,
    skip_signatures: bool,
    export_dot: Option<PathBuf>,
    convert: Option<String>,
    variable_prefix: String,
    output: Option<PathBuf>,
) -> Result<(), GraphError> {
    let graph = load_graph_from_path(&graph_path)?;
    let properties = ValidatorProperties {
        check_signatures: !skip_signatures,
    };
    let artifacts = GraphValidator::new(&graph, properties).validate()?;
    info!(
        "validated {} nodes, {} reachable",
        graph.nodes.len(),
        artifacts.reachable_nodes.len()
    );

    if convert.is_none() {
        println!(
            "Validated graph from `{}` with {} nodes and {} outputs.",
            graph_path.display(),
            graph.nodes.len(),
            graph.outputs.len()
        );
        println!("Local inputs:");
        for id in &artifacts.local_inputs {
            if let Some(local) = graph.node(*id).and_then(|node| node.local_data.as_ref()) {
                println!("  - node {}: {}x{}", id, local.rows, local.cols);
            }
        }
        println!("Dependency fan-out:");
        let mut fan_out: Vec<_> = artifacts.node_to_dependent_operations.iter().collect();
        fan_out.sort_by_key(|(id, _)| **id);
        for (id, deps) in fan_out {
            println!("  - node {} -> {}", id, deps.join(", "));
        }
    }

    if let Some(dot_path) = export_dot {
        let dot = graph_to_dot(&graph);
        std::fs::write(&dot_path, dot).map_err(|err| GraphError::export(dot_path.clone(), err))?;
        info!("exported Graphviz DOT to `{}`", dot_path.display());
    }

    if let Some(format) = convert {
        let converted =
            ConverterRegistry::with_variable_prefix(&variable_prefix).convert(&format, &graph)?;
        write_output(output.as_ref(), &converted.data, converted.format)?;
        info!(
            "converted graph to `{}` ({})",
            converted.format, converted.content_type
        );
    }
    Ok(())
}

fn generate(script: PathBuf, output: Option<PathBuf>) -> Result<(), GraphError> {
    let signature = load_signature_from_path(&script)?;
    info!(
        "generating binding for `{}` with {} parameters",
        signature.name,
        signature.params.len()
    );
    let source = render_binding(&signature)?;
    write_output(output.as_ref(), source.as_bytes(), "rust")
}

fn run() -> Result<(), GraphError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Validate {
            graph,
            skip_signatures,
            export_dot,
            convert,
            variable_prefix,
            output,
        } => validate(
            graph,
            skip_signatures,
            export_dot,
            convert,
            variable_prefix,
            output,
        ),
        Command::Generate { script, output } => generate(script, output),
    }
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

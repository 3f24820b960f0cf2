//! CLI entry point for the `gmem` command-line tool.
//!
//! Seed, validate, and count operations over a JSONL node/edge file.
//! Exit codes: 0 ok, 1 usage error, 2 I/O or parse failure.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};

use graph_memory::persist::{EdgeRecord, NodeRecord};
use graph_memory::{
    EngineConfig, GraphError, GraphResult, MemoryEngine, StorageConfig, TemporalRelationship,
};

#[derive(Parser)]
#[command(
    name = "gmem",
    about = "graph-memory CLI — knowledge-graph memory for conversational agents"
)]
struct Cli {
    /// Output JSON instead of text
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a JSONL file into a storage directory through the engine
    Seed {
        /// Path to the JSONL file (node and edge records, one per line)
        file: PathBuf,
        /// Storage directory
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
    /// Parse a JSONL file and check edge endpoints against node ids
    Validate {
        /// Path to the JSONL file
        file: PathBuf,
    },
    /// Count the node and edge records in a JSONL file
    Count {
        /// Path to the JSONL file
        file: PathBuf,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version land here too; they are not usage errors.
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) {
                let _ = err.print();
                process::exit(0);
            }
            let _ = err.print();
            process::exit(1);
        }
    };

    if cli.verbose {
        // env_logger is only available in dev/test builds
        eprintln!("Verbose mode enabled");
    }

    let result = match &cli.command {
        Commands::Seed { file, data_dir } => cmd_seed(file, data_dir, cli.json),
        Commands::Validate { file } => cmd_validate(file, cli.json),
        Commands::Count { file } => cmd_count(file, cli.json),
    };

    match result {
        Ok(()) => {}
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(2);
        }
    }
}

/// Parse a mixed JSONL file into node and edge records. Lines with a
/// `source` field are edges, the rest are nodes.
fn read_records(path: &Path) -> GraphResult<(Vec<NodeRecord>, Vec<EdgeRecord>)> {
    let reader = BufReader::new(File::open(path)?);
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value = serde_json::from_str(&line)?;
        if value.get("source").is_some() {
            edges.push(serde_json::from_value::<EdgeRecord>(value)?);
        } else {
            nodes.push(serde_json::from_value::<NodeRecord>(value)?);
        }
    }
    Ok((nodes, edges))
}

fn cmd_seed(file: &Path, data_dir: &Path, json: bool) -> GraphResult<()> {
    let (nodes, edges) = read_records(file)?;

    let config = EngineConfig {
        storage: Some(StorageConfig {
            dir: data_dir.to_path_buf(),
            ..StorageConfig::default()
        }),
        ..EngineConfig::default()
    };
    let mut engine = MemoryEngine::new(config)?;

    let mut nodes_seeded = 0usize;
    for record in nodes {
        engine.store_node_direct(record.into_node())?;
        nodes_seeded += 1;
    }

    let mut edges_seeded = 0usize;
    for record in edges {
        if record.valid_from.is_some() {
            let spec = TemporalRelationship {
                valid_from: record.valid_from,
                valid_until: record.valid_until,
                temporal_type: record.temporal_type,
                edge: record.into_edge(),
            };
            engine.add_temporal_relationship(spec)?;
        } else {
            engine.store_edge_direct(record.into_edge())?;
        }
        edges_seeded += 1;
    }

    let report = engine.snapshot()?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "nodes_seeded": nodes_seeded,
                "edges_seeded": edges_seeded,
                "node_records_written": report.nodes.written,
                "edge_records_written": report.edges.written,
                "data_dir": data_dir.display().to_string(),
            })
        );
    } else {
        println!(
            "Seeded {} nodes and {} edges into {}",
            nodes_seeded,
            edges_seeded,
            data_dir.display()
        );
    }
    Ok(())
}

fn cmd_validate(file: &Path, json: bool) -> GraphResult<()> {
    let (nodes, edges) = read_records(file)?;

    let node_ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let mut dangling = Vec::new();
    for edge in &edges {
        if !node_ids.contains(edge.source.as_str()) {
            dangling.push(format!("edge {} references missing node {}", edge.id, edge.source));
        }
        if !node_ids.contains(edge.target.as_str()) {
            dangling.push(format!("edge {} references missing node {}", edge.id, edge.target));
        }
    }

    if json {
        println!(
            "{}",
            serde_json::json!({
                "nodes": nodes.len(),
                "edges": edges.len(),
                "issues": dangling,
            })
        );
    } else {
        println!("Nodes: {}", nodes.len());
        println!("Edges: {}", edges.len());
        for issue in &dangling {
            println!("  {issue}");
        }
    }

    if dangling.is_empty() {
        Ok(())
    } else {
        Err(GraphError::InvalidArgument(format!(
            "{} dangling edge endpoint(s)",
            dangling.len()
        )))
    }
}

fn cmd_count(file: &Path, json: bool) -> GraphResult<()> {
    let (nodes, edges) = read_records(file)?;
    if json {
        println!(
            "{}",
            serde_json::json!({"nodes": nodes.len(), "edges": edges.len()})
        );
    } else {
        println!("Nodes: {}", nodes.len());
        println!("Edges: {}", edges.len());
    }
    Ok(())
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "eth-graph-loader")]
#[command(about = "Loads address and transaction CSV files into a Neo4j graph")]
pub struct Cli {
    /// Address node file, overrides NODES_CSV_PATH
    #[arg(long, global = true)]
    pub nodes: Option<PathBuf>,
    /// Transaction edge file, overrides EDGES_CSV_PATH
    #[arg(long, global = true)]
    pub edges: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Node pass, then edge pass (the default)
    Import,
    /// Node pass only
    Nodes,
    /// Edge pass only
    Edges,
    Stats,
    Query {
        #[arg(short, long)]
        address: String,
        #[arg(short, long)]
        limit: Option<u32>,
    },
}

use anyhow::Result;
use clap::Parser;
use eth_graph_loader::cli::{Cli, Commands};
use eth_graph_loader::{Config, GraphStore, Importer, Neo4jStore, PassSummary};

fn print_summary(summary: &PassSummary) {
    println!(
        "Loaded {} rows in the {} pass ({:.2?})",
        summary.rows, summary.pass, summary.elapsed
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let nodes_path = cli.nodes.unwrap_or_else(|| config.nodes_csv_path.clone());
    let edges_path = cli.edges.unwrap_or_else(|| config.edges_csv_path.clone());
    let importer = Importer::new(Neo4jStore::new(&config), config.progress_interval);

    match cli.command.unwrap_or(Commands::Import) {
        Commands::Import => {
            for summary in importer.run(&nodes_path, &edges_path).await? {
                print_summary(&summary);
            }
        }
        Commands::Nodes => {
            print_summary(&importer.import_address_nodes(&nodes_path).await?);
        }
        Commands::Edges => {
            print_summary(&importer.import_transactions(&edges_path).await?);
        }
        Commands::Stats => {
            let stats = importer.store().stats().await?;
            println!("Graph Statistics:");
            println!("Address nodes (addressId): {}", stats.address_nodes_by_id);
            println!("Address nodes (address): {}", stats.address_nodes_by_address);
            println!("Transactions: {}", stats.transactions);
            println!("SENT relationships: {}", stats.sent_relationships);
            println!("RECEIVED_BY relationships: {}", stats.received_relationships);
        }
        Commands::Query { address, limit } => {
            let transactions = importer
                .store()
                .transactions_for(&address, limit.unwrap_or(100))
                .await?;

            for transaction in transactions {
                println!("{}", serde_json::to_string_pretty(&transaction)?);
            }
        }
    }

    Ok(())
}

use log::{error, info};
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::error::ImportError;
use crate::graph::GraphStore;
use crate::loader;
use crate::writer::GraphWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    AddressNodes,
    Transactions,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::AddressNodes => f.write_str("address node"),
            Pass::Transactions => f.write_str("transaction"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub pass: Pass,
    pub rows: usize,
    pub elapsed: Duration,
}

pub struct Importer<S: GraphStore> {
    store: S,
    progress_interval: usize,
}

impl<S: GraphStore> Importer<S> {
    /// `progress_interval` of 0 turns off progress lines.
    pub fn new(store: S, progress_interval: usize) -> Self {
        Self {
            store,
            progress_interval,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Node pass followed by edge pass. The edge pass does not start if the
    /// node pass fails.
    pub async fn run(
        &self,
        nodes_path: &Path,
        edges_path: &Path,
    ) -> Result<Vec<PassSummary>, ImportError> {
        let nodes = self.import_address_nodes(nodes_path).await?;
        let transactions = self.import_transactions(edges_path).await?;
        Ok(vec![nodes, transactions])
    }

    pub async fn import_address_nodes(&self, path: &Path) -> Result<PassSummary, ImportError> {
        self.run_pass(Pass::AddressNodes, path).await
    }

    pub async fn import_transactions(&self, path: &Path) -> Result<PassSummary, ImportError> {
        self.run_pass(Pass::Transactions, path).await
    }

    async fn run_pass(&self, pass: Pass, path: &Path) -> Result<PassSummary, ImportError> {
        let started = Instant::now();
        let records = loader::read_records(path)?;
        let total = records.len();
        info!("Starting {} pass over {} rows from {}", pass, total, path.display());

        // Dropping the session at the end of this scope releases the
        // connection, on the error paths too.
        let mut session = self.store.open_session().await?;
        let mut writer = GraphWriter::new(&mut session);

        for (index, record) in records.iter().enumerate() {
            let row = index + 1;
            let result = match pass {
                Pass::AddressNodes => writer.upsert_address_node(record).await,
                Pass::Transactions => writer.upsert_transaction_edge(record).await,
            };

            if let Err(source) = result {
                error!("{} pass aborted at row {} of {}: {}", pass, row, total, source);
                return Err(ImportError::Row { row, source });
            }

            if self.progress_interval > 0 && row % self.progress_interval == 0 {
                info!("{} pass: {}/{} rows written", pass, row, total);
            }
        }

        let elapsed = started.elapsed();
        info!("Finished {} pass: {} rows in {:.2?}", pass, total, elapsed);
        Ok(PassSummary {
            pass,
            rows: total,
            elapsed,
        })
    }
}

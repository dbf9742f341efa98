pub mod memory;
pub mod neo4j;

use async_trait::async_trait;

use crate::error::WriteError;
use crate::models::{AddressNode, GraphStats, TransactionEdge, TransactionSummary};

pub use memory::MemoryGraph;
pub use neo4j::Neo4jStore;

#[async_trait]
pub trait GraphStore: Send + Sync {
    type Session: GraphSession;

    /// The session's connection is released when it is dropped.
    async fn open_session(&self) -> Result<Self::Session, WriteError>;

    async fn stats(&self) -> Result<GraphStats, WriteError>;

    /// Transactions sent or received by `address`, newest block first.
    async fn transactions_for(
        &self,
        address: &str,
        limit: u32,
    ) -> Result<Vec<TransactionSummary>, WriteError>;
}

#[async_trait]
pub trait GraphSession: Send {
    /// Merges an `:Address` on `addressId`, setting `type` only on creation.
    async fn merge_address_node(&mut self, node: &AddressNode) -> Result<(), WriteError>;

    /// Merges both endpoints on `address` and creates a new `:Transaction`
    /// linked by `SENT` and `RECEIVED_BY`.
    async fn create_transaction(&mut self, edge: &TransactionEdge) -> Result<(), WriteError>;
}

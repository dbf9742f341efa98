use async_trait::async_trait;
use log::debug;
use neo4rs::{query, BoltNull, BoltType, ConfigBuilder, Graph, Query};

use super::{GraphSession, GraphStore};
use crate::config::Config;
use crate::error::WriteError;
use crate::models::{AddressNode, FieldValue, GraphStats, TransactionEdge, TransactionSummary};

const MERGE_ADDRESS: &str = r#"
MERGE (n:Address {addressId: $addressId})
ON CREATE SET n.type = $type
"#;

const CREATE_TRANSACTION: &str = r#"
MERGE (from:Address {address: $from_address})
MERGE (to:Address {address: $to_address})
CREATE (t:Transaction {
    hash: $hash,
    value: $value,
    input: $input,
    transaction_index: $transaction_index,
    gas: $gas,
    gas_used: $gas_used,
    gas_price: $gas_price,
    transaction_fee: $transaction_fee,
    block_number: $block_number,
    block_hash: $block_hash,
    block_timestamp: $block_timestamp
})
CREATE (from)-[:SENT]->(t)
CREATE (t)-[:RECEIVED_BY]->(to)
"#;

const TRANSACTIONS_FOR_ADDRESS: &str = r#"
MATCH (sender:Address)-[:SENT]->(t:Transaction)-[:RECEIVED_BY]->(receiver:Address)
WHERE sender.address = $address OR receiver.address = $address
RETURN coalesce(toString(t.hash), '') AS hash,
       coalesce(toString(sender.address), '') AS from_address,
       coalesce(toString(receiver.address), '') AS to_address,
       coalesce(toString(t.value), '') AS value,
       toInteger(t.block_number) AS block_number,
       coalesce(toString(t.block_timestamp), '') AS block_timestamp
ORDER BY block_number DESC
LIMIT $limit
"#;

/// Connection parameters for a Neo4j server. Nothing is opened until a
/// session or a read asks for it.
pub struct Neo4jStore {
    uri: String,
    user: String,
    password: String,
}

impl Neo4jStore {
    pub fn new(config: &Config) -> Self {
        Self {
            uri: config.neo4j_uri.clone(),
            user: config.neo4j_user.clone(),
            password: config.neo4j_password.clone(),
        }
    }

    async fn connect(&self) -> Result<Graph, WriteError> {
        let config = ConfigBuilder::default()
            .uri(self.uri.as_str())
            .user(self.user.as_str())
            .password(self.password.as_str())
            .max_connections(1)
            .build()
            .map_err(|e| WriteError::StoreUnavailable(format!("invalid connection settings: {}", e)))?;

        let graph = Graph::connect(config)
            .await
            .map_err(|e| WriteError::StoreUnavailable(format!("{} ({})", e, self.uri)))?;
        debug!("Opened Neo4j connection to {}", self.uri);
        Ok(graph)
    }

    async fn count(graph: &Graph, cypher: &str) -> Result<i64, WriteError> {
        let mut rows = graph.execute(query(cypher)).await.map_err(classify)?;
        match rows.next().await.map_err(classify)? {
            Some(row) => row
                .get::<i64>("count")
                .map_err(|e| WriteError::Query(e.to_string())),
            None => Ok(0),
        }
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    type Session = Neo4jSession;

    async fn open_session(&self) -> Result<Neo4jSession, WriteError> {
        let graph = self.connect().await?;
        Ok(Neo4jSession {
            graph,
            uri: self.uri.clone(),
        })
    }

    async fn stats(&self) -> Result<GraphStats, WriteError> {
        let graph = self.connect().await?;
        Ok(GraphStats {
            address_nodes_by_id: Self::count(
                &graph,
                "MATCH (n:Address) WHERE n.addressId IS NOT NULL RETURN count(n) AS count",
            )
            .await?,
            address_nodes_by_address: Self::count(
                &graph,
                "MATCH (n:Address) WHERE n.address IS NOT NULL RETURN count(n) AS count",
            )
            .await?,
            transactions: Self::count(&graph, "MATCH (t:Transaction) RETURN count(t) AS count")
                .await?,
            sent_relationships: Self::count(
                &graph,
                "MATCH (:Address)-[r:SENT]->(:Transaction) RETURN count(r) AS count",
            )
            .await?,
            received_relationships: Self::count(
                &graph,
                "MATCH (:Transaction)-[r:RECEIVED_BY]->(:Address) RETURN count(r) AS count",
            )
            .await?,
        })
    }

    async fn transactions_for(
        &self,
        address: &str,
        limit: u32,
    ) -> Result<Vec<TransactionSummary>, WriteError> {
        let graph = self.connect().await?;
        let q = query(TRANSACTIONS_FOR_ADDRESS)
            .param("address", address)
            .param("limit", i64::from(limit));

        let mut rows = graph.execute(q).await.map_err(classify)?;
        let mut transactions = Vec::new();
        while let Some(row) = rows.next().await.map_err(classify)? {
            let field = |key: &str| {
                row.get::<String>(key)
                    .map_err(|e| WriteError::Query(format!("{}: {}", key, e)))
            };
            transactions.push(TransactionSummary {
                hash: field("hash")?,
                from_address: field("from_address")?,
                to_address: field("to_address")?,
                value: field("value")?,
                block_number: row
                    .get::<Option<i64>>("block_number")
                    .map_err(|e| WriteError::Query(format!("block_number: {}", e)))?,
                block_timestamp: field("block_timestamp")?,
            });
        }

        Ok(transactions)
    }
}

/// A single-connection handle used for the writes of one pass.
pub struct Neo4jSession {
    graph: Graph,
    uri: String,
}

impl Neo4jSession {
    /// Runs `q` in its own write transaction and waits for the commit.
    async fn write(&mut self, q: Query) -> Result<(), WriteError> {
        let mut txn = self.graph.start_txn().await.map_err(classify)?;
        txn.run(q).await.map_err(classify)?;
        txn.commit().await.map_err(classify)
    }
}

impl Drop for Neo4jSession {
    fn drop(&mut self) {
        debug!("Releasing Neo4j connection to {}", self.uri);
    }
}

#[async_trait]
impl GraphSession for Neo4jSession {
    async fn merge_address_node(&mut self, node: &AddressNode) -> Result<(), WriteError> {
        let q = query(MERGE_ADDRESS)
            .param("addressId", bolt(&node.address_id))
            .param("type", bolt(&node.node_type));
        self.write(q).await
    }

    async fn create_transaction(&mut self, edge: &TransactionEdge) -> Result<(), WriteError> {
        let mut q = query(CREATE_TRANSACTION)
            .param("from_address", bolt(&edge.from_address))
            .param("to_address", bolt(&edge.to_address));
        for (key, value) in edge.properties() {
            q = q.param(key, bolt(value));
        }
        self.write(q).await
    }
}

fn bolt(value: &FieldValue) -> BoltType {
    match value {
        FieldValue::Integer(n) => BoltType::from(*n),
        FieldValue::Float(x) => BoltType::from(*x),
        FieldValue::Text(s) => BoltType::from(s.as_str()),
        FieldValue::Null => BoltType::Null(BoltNull),
    }
}

/// Sorts a driver failure into the write error taxonomy by its server code
/// or transport symptom.
fn classify(err: neo4rs::Error) -> WriteError {
    let detail = format!("{:?}", err);
    classify_detail(detail)
}

fn classify_detail(detail: String) -> WriteError {
    let lower = detail.to_lowercase();
    if lower.contains("constraintvalidationfailed") || lower.contains("already exists with label") {
        WriteError::ConstraintViolation(detail)
    } else if lower.contains("connection")
        || lower.contains("broken pipe")
        || lower.contains("reset")
        || lower.contains("ioerror")
        || lower.contains("serviceunavailable")
    {
        WriteError::StoreUnavailable(detail)
    } else {
        WriteError::Query(detail)
    }
}

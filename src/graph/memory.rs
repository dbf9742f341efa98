use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{GraphSession, GraphStore};
use crate::error::WriteError;
use crate::models::{AddressNode, FieldValue, GraphStats, TransactionEdge, TransactionSummary};

/// Property an `:Address` node was merged on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKey {
    AddressId,
    Address,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredAddress {
    pub key: AddressKey,
    pub value: FieldValue,
    pub node_type: Option<FieldValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredTransaction {
    /// Non-null properties, as a property graph stores them.
    pub properties: HashMap<String, FieldValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipKind {
    Sent,
    ReceivedBy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relationship {
    pub kind: RelationshipKind,
    /// Index into `GraphState::addresses`.
    pub address: usize,
    /// Index into `GraphState::transactions`.
    pub transaction: usize,
}

#[derive(Debug, Clone, Default)]
pub struct GraphState {
    pub addresses: Vec<StoredAddress>,
    pub transactions: Vec<StoredTransaction>,
    pub relationships: Vec<Relationship>,
    pub open_sessions: usize,
    pub sessions_opened: usize,
    writes: usize,
    fail_after_writes: Option<usize>,
    unique_transaction_hash: bool,
}

impl GraphState {
    pub fn address(&self, key: AddressKey, value: &FieldValue) -> Option<&StoredAddress> {
        self.addresses
            .iter()
            .find(|a| a.key == key && &a.value == value)
    }

    pub fn transactions_with_hash(&self, hash: &FieldValue) -> usize {
        self.transactions
            .iter()
            .filter(|t| t.properties.get("hash") == Some(hash))
            .count()
    }

    fn merge_address(
        &mut self,
        key: AddressKey,
        value: &FieldValue,
        node_type: Option<&FieldValue>,
    ) -> Result<usize, WriteError> {
        if value.is_null() {
            return Err(WriteError::Query(format!(
                "Cannot merge node using null property value for {:?}",
                key
            )));
        }
        if let Some(index) = self
            .addresses
            .iter()
            .position(|a| a.key == key && &a.value == value)
        {
            return Ok(index);
        }
        self.addresses.push(StoredAddress {
            key,
            value: value.clone(),
            node_type: node_type.filter(|t| !t.is_null()).cloned(),
        });
        Ok(self.addresses.len() - 1)
    }

    fn begin_write(&mut self) -> Result<(), WriteError> {
        if let Some(limit) = self.fail_after_writes {
            if self.writes >= limit {
                return Err(WriteError::StoreUnavailable(
                    "connection closed by peer".to_string(),
                ));
            }
        }
        self.writes += 1;
        Ok(())
    }
}

/// In-process graph store with the same merge and create semantics as the
/// Neo4j statements. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    state: Arc<Mutex<GraphState>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write after the first `writes` fails as if the connection dropped.
    pub fn fail_after_writes(self, writes: usize) -> Self {
        self.lock().fail_after_writes = Some(writes);
        self
    }

    /// Rejects a second `:Transaction` with an existing `hash`.
    pub fn with_unique_transaction_hash(self) -> Self {
        self.lock().unique_transaction_hash = true;
        self
    }

    pub fn snapshot(&self) -> GraphState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, GraphState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    type Session = MemorySession;

    async fn open_session(&self) -> Result<MemorySession, WriteError> {
        let mut state = self.lock();
        state.open_sessions += 1;
        state.sessions_opened += 1;
        Ok(MemorySession {
            state: Arc::clone(&self.state),
        })
    }

    async fn stats(&self) -> Result<GraphStats, WriteError> {
        let state = self.lock();
        let count_keyed =
            |key: AddressKey| state.addresses.iter().filter(|a| a.key == key).count() as i64;
        let count_rel = |kind: RelationshipKind| {
            state
                .relationships
                .iter()
                .filter(|r| r.kind == kind)
                .count() as i64
        };
        Ok(GraphStats {
            address_nodes_by_id: count_keyed(AddressKey::AddressId),
            address_nodes_by_address: count_keyed(AddressKey::Address),
            transactions: state.transactions.len() as i64,
            sent_relationships: count_rel(RelationshipKind::Sent),
            received_relationships: count_rel(RelationshipKind::ReceivedBy),
        })
    }

    async fn transactions_for(
        &self,
        address: &str,
        limit: u32,
    ) -> Result<Vec<TransactionSummary>, WriteError> {
        let state = self.lock();
        // The query parameter is a string, so only text-typed addresses match.
        let wanted = FieldValue::from(address);
        let endpoint = |transaction: usize, kind: RelationshipKind| {
            state
                .relationships
                .iter()
                .find(|r| r.transaction == transaction && r.kind == kind)
                .map(|r| &state.addresses[r.address].value)
        };
        let text = |value: Option<&FieldValue>| value.map(|v| v.to_string()).unwrap_or_default();

        let mut matches: Vec<TransactionSummary> = state
            .transactions
            .iter()
            .enumerate()
            .filter_map(|(index, t)| {
                let from = endpoint(index, RelationshipKind::Sent);
                let to = endpoint(index, RelationshipKind::ReceivedBy);
                if from != Some(&wanted) && to != Some(&wanted) {
                    return None;
                }
                Some(TransactionSummary {
                    hash: text(t.properties.get("hash")),
                    from_address: text(from),
                    to_address: text(to),
                    value: text(t.properties.get("value")),
                    block_number: match t.properties.get("block_number") {
                        Some(FieldValue::Integer(n)) => Some(*n),
                        Some(other) => other.to_string().parse().ok(),
                        None => None,
                    },
                    block_timestamp: text(t.properties.get("block_timestamp")),
                })
            })
            .collect();

        matches.sort_by(|a, b| b.block_number.cmp(&a.block_number));
        matches.truncate(limit as usize);
        Ok(matches)
    }
}

pub struct MemorySession {
    state: Arc<Mutex<GraphState>>,
}

impl MemorySession {
    fn lock(&self) -> MutexGuard<'_, GraphState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        let mut state = self.lock();
        state.open_sessions = state.open_sessions.saturating_sub(1);
    }
}

#[async_trait]
impl GraphSession for MemorySession {
    async fn merge_address_node(&mut self, node: &AddressNode) -> Result<(), WriteError> {
        let mut state = self.lock();
        state.begin_write()?;
        state.merge_address(AddressKey::AddressId, &node.address_id, Some(&node.node_type))?;
        Ok(())
    }

    async fn create_transaction(&mut self, edge: &TransactionEdge) -> Result<(), WriteError> {
        let mut state = self.lock();
        state.begin_write()?;

        if state.unique_transaction_hash && state.transactions_with_hash(&edge.hash) > 0 {
            return Err(WriteError::ConstraintViolation(format!(
                "Node already exists with label `Transaction` and property `hash` = {}",
                edge.hash
            )));
        }

        // Both endpoints are checked before anything is written, like a
        // statement that fails as a whole.
        if edge.from_address.is_null() || edge.to_address.is_null() {
            return Err(WriteError::Query(
                "Cannot merge node using null property value for address".to_string(),
            ));
        }
        let from = state.merge_address(AddressKey::Address, &edge.from_address, None)?;
        let to = state.merge_address(AddressKey::Address, &edge.to_address, None)?;

        let properties = edge
            .properties()
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        state.transactions.push(StoredTransaction { properties });
        let transaction = state.transactions.len() - 1;

        state.relationships.push(Relationship {
            kind: RelationshipKind::Sent,
            address: from,
            transaction,
        });
        state.relationships.push(Relationship {
            kind: RelationshipKind::ReceivedBy,
            address: to,
            transaction,
        });
        Ok(())
    }
}

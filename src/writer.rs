use crate::error::UpsertError;
use crate::graph::GraphSession;
use crate::models::{AddressNode, Record, TransactionEdge};

/// Turns records into graph writes over a borrowed session.
///
/// Each call parses the record into its entity first, then applies exactly
/// one write. Nothing is written for a record that fails to parse.
pub struct GraphWriter<'s, S: GraphSession> {
    session: &'s mut S,
}

impl<'s, S: GraphSession> GraphWriter<'s, S> {
    pub fn new(session: &'s mut S) -> Self {
        Self { session }
    }

    pub async fn upsert_address_node(&mut self, record: &Record) -> Result<(), UpsertError> {
        let node = AddressNode::try_from(record)?;
        self.session.merge_address_node(&node).await?;
        Ok(())
    }

    pub async fn upsert_transaction_edge(&mut self, record: &Record) -> Result<(), UpsertError> {
        let edge = TransactionEdge::try_from(record)?;
        self.session.create_transaction(&edge).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordError;
    use crate::graph::memory::AddressKey;
    use crate::graph::{GraphStore, MemoryGraph};
    use crate::models::{ColumnType, FieldValue};

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), FieldValue::parse(v, ColumnType::infer([*v]))))
            .collect()
    }

    fn edge_record(hash: &str) -> Record {
        record(&[
            ("from_address", "0xA"),
            ("to_address", "0xB"),
            ("hash", hash),
            ("value", "100"),
            ("input", "0x"),
            ("transaction_index", "0"),
            ("gas", "21000"),
            ("gas_used", "21000"),
            ("gas_price", "1000000000"),
            ("transaction_fee", "21000000000000"),
            ("block_number", "17000000"),
            ("block_hash", "0xbeef"),
            ("block_timestamp", "1681000000"),
        ])
    }

    #[tokio::test]
    async fn type_is_set_only_on_creation() {
        let graph = MemoryGraph::new();
        let mut session = graph.open_session().await.unwrap();
        let mut writer = GraphWriter::new(&mut session);

        writer
            .upsert_address_node(&record(&[("addressId", "0xA"), ("type", "wallet")]))
            .await
            .unwrap();
        writer
            .upsert_address_node(&record(&[("addressId", "0xA"), ("type", "contract")]))
            .await
            .unwrap();

        let state = graph.snapshot();
        assert_eq!(state.addresses.len(), 1);
        let node = state.address(AddressKey::AddressId, &"0xA".into()).unwrap();
        assert_eq!(node.node_type, Some(FieldValue::from("wallet")));
    }

    #[tokio::test]
    async fn repeated_edges_duplicate_transactions_but_not_endpoints() {
        let graph = MemoryGraph::new();
        let mut session = graph.open_session().await.unwrap();
        let mut writer = GraphWriter::new(&mut session);

        writer.upsert_transaction_edge(&edge_record("0xdead")).await.unwrap();
        writer.upsert_transaction_edge(&edge_record("0xdead")).await.unwrap();

        let state = graph.snapshot();
        assert_eq!(state.addresses.len(), 2);
        assert_eq!(state.transactions.len(), 2);
        assert_eq!(state.transactions_with_hash(&"0xdead".into()), 2);
        assert_eq!(state.relationships.len(), 4);
    }

    #[tokio::test]
    async fn endpoints_are_created_without_type() {
        let graph = MemoryGraph::new();
        let mut session = graph.open_session().await.unwrap();
        GraphWriter::new(&mut session)
            .upsert_transaction_edge(&edge_record("0x01"))
            .await
            .unwrap();

        let state = graph.snapshot();
        for address in ["0xA", "0xB"] {
            let node = state.address(AddressKey::Address, &address.into()).unwrap();
            assert_eq!(node.node_type, None);
        }
        assert!(state.address(AddressKey::AddressId, &"0xA".into()).is_none());
    }

    #[tokio::test]
    async fn missing_column_writes_nothing() {
        let graph = MemoryGraph::new();
        let mut session = graph.open_session().await.unwrap();
        let mut incomplete = edge_record("0x02");
        incomplete.remove("gas_price");

        let err = GraphWriter::new(&mut session)
            .upsert_transaction_edge(&incomplete)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            UpsertError::Record(RecordError::MissingColumn("gas_price"))
        ));
        assert!(graph.snapshot().transactions.is_empty());
    }

    #[tokio::test]
    async fn constraint_violation_surfaces() {
        let graph = MemoryGraph::new().with_unique_transaction_hash();
        let mut session = graph.open_session().await.unwrap();
        let mut writer = GraphWriter::new(&mut session);

        writer.upsert_transaction_edge(&edge_record("0xdead")).await.unwrap();
        let err = writer
            .upsert_transaction_edge(&edge_record("0xdead"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            UpsertError::Write(crate::error::WriteError::ConstraintViolation(_))
        ));
        assert_eq!(graph.snapshot().transactions.len(), 1);
    }
}

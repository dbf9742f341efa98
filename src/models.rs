use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::error::RecordError;

/// One data row of a delimited file, keyed by column name.
pub type Record = HashMap<String, FieldValue>;

/// A cell value with its best-effort inferred type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Null,
}

/// Type shared by every cell of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
}

impl ColumnType {
    /// Picks one type for a column from its raw cells. Empty cells are
    /// ignored here and become nulls.
    ///
    /// A column of whole numbers that overflows `i64` stays text, so wei
    /// amounts keep their full precision and every row agrees on the type.
    pub fn infer<'a, I>(cells: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut integers = true;
        let mut whole = true;
        let mut floats = true;

        for cell in cells.into_iter().filter(|c| !c.is_empty()) {
            integers &= cell.parse::<i64>().is_ok();
            whole &= is_whole_number(cell);
            floats &= cell.parse::<f64>().map(f64::is_finite).unwrap_or(false);
        }

        if integers {
            ColumnType::Integer
        } else if whole {
            ColumnType::Text
        } else if floats {
            ColumnType::Float
        } else {
            ColumnType::Text
        }
    }
}

fn is_whole_number(cell: &str) -> bool {
    let digits = cell.strip_prefix('-').unwrap_or(cell);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl FieldValue {
    /// Reads a raw cell as its column's type. `ColumnType::infer` guarantees
    /// every non-empty cell parses; anything that does not is kept as text.
    pub fn parse(raw: &str, column: ColumnType) -> Self {
        if raw.is_empty() {
            return FieldValue::Null;
        }
        match column {
            ColumnType::Integer => raw
                .parse()
                .map(FieldValue::Integer)
                .unwrap_or_else(|_| FieldValue::Text(raw.to_string())),
            ColumnType::Float => raw
                .parse()
                .map(FieldValue::Float)
                .unwrap_or_else(|_| FieldValue::Text(raw.to_string())),
            ColumnType::Text => FieldValue::Text(raw.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

fn column(record: &Record, name: &'static str) -> Result<FieldValue, RecordError> {
    record
        .get(name)
        .cloned()
        .ok_or(RecordError::MissingColumn(name))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressNode {
    pub address_id: FieldValue,
    pub node_type: FieldValue,
}

impl TryFrom<&Record> for AddressNode {
    type Error = RecordError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        Ok(Self {
            address_id: column(record, "addressId")?,
            node_type: column(record, "type")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionEdge {
    pub from_address: FieldValue,
    pub to_address: FieldValue,
    pub hash: FieldValue,
    pub value: FieldValue,
    pub input: FieldValue,
    pub transaction_index: FieldValue,
    pub gas: FieldValue,
    pub gas_used: FieldValue,
    pub gas_price: FieldValue,
    pub transaction_fee: FieldValue,
    pub block_number: FieldValue,
    pub block_hash: FieldValue,
    pub block_timestamp: FieldValue,
}

impl TransactionEdge {
    /// Properties stored on the transaction node, in write order.
    pub fn properties(&self) -> [(&'static str, &FieldValue); 11] {
        [
            ("hash", &self.hash),
            ("value", &self.value),
            ("input", &self.input),
            ("transaction_index", &self.transaction_index),
            ("gas", &self.gas),
            ("gas_used", &self.gas_used),
            ("gas_price", &self.gas_price),
            ("transaction_fee", &self.transaction_fee),
            ("block_number", &self.block_number),
            ("block_hash", &self.block_hash),
            ("block_timestamp", &self.block_timestamp),
        ]
    }
}

impl TryFrom<&Record> for TransactionEdge {
    type Error = RecordError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        Ok(Self {
            from_address: column(record, "from_address")?,
            to_address: column(record, "to_address")?,
            hash: column(record, "hash")?,
            value: column(record, "value")?,
            input: column(record, "input")?,
            transaction_index: column(record, "transaction_index")?,
            gas: column(record, "gas")?,
            gas_used: column(record, "gas_used")?,
            gas_price: column(record, "gas_price")?,
            transaction_fee: column(record, "transaction_fee")?,
            block_number: column(record, "block_number")?,
            block_hash: column(record, "block_hash")?,
            block_timestamp: column(record, "block_timestamp")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphStats {
    pub address_nodes_by_id: i64,
    pub address_nodes_by_address: i64,
    pub transactions: i64,
    pub sent_relationships: i64,
    pub received_relationships: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionSummary {
    pub hash: String,
    pub from_address: String,
    pub to_address: String,
    pub value: String,
    pub block_number: Option<i64>,
    pub block_timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_one_type_per_column() {
        assert_eq!(ColumnType::infer(["42", "-7", ""]), ColumnType::Integer);
        assert_eq!(ColumnType::infer(["1", "1.5"]), ColumnType::Float);
        assert_eq!(ColumnType::infer(["0xdead", "12"]), ColumnType::Text);
        assert_eq!(ColumnType::infer(["NaN", "1.0"]), ColumnType::Text);
        assert_eq!(ColumnType::infer(["", ""]), ColumnType::Integer);
    }

    #[test]
    fn large_wei_amounts_stay_exact() {
        let column = ColumnType::infer(["1000000000000000000", "10000000000000000000"]);
        assert_eq!(column, ColumnType::Text);
        assert_eq!(
            FieldValue::parse("1000000000000000000", column),
            FieldValue::Text("1000000000000000000".into())
        );
    }

    #[test]
    fn empty_cell_is_null_in_any_column() {
        for column in [ColumnType::Integer, ColumnType::Float, ColumnType::Text] {
            assert_eq!(FieldValue::parse("", column), FieldValue::Null);
        }
    }

    #[test]
    fn address_node_requires_both_columns() {
        let mut record = Record::new();
        record.insert("addressId".into(), "0xA".into());
        assert!(matches!(
            AddressNode::try_from(&record),
            Err(RecordError::MissingColumn("type"))
        ));

        record.insert("type".into(), "wallet".into());
        let node = AddressNode::try_from(&record).unwrap();
        assert_eq!(node.address_id, FieldValue::from("0xA"));
        assert_eq!(node.node_type, FieldValue::from("wallet"));
    }
}

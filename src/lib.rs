pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod importer;
pub mod loader;
pub mod models;
pub mod writer;

pub use config::Config;
pub use error::{ImportError, LoadError, RecordError, UpsertError, WriteError};
pub use graph::{GraphSession, GraphStore, MemoryGraph, Neo4jStore};
pub use importer::{Importer, Pass, PassSummary};
pub use models::{AddressNode, FieldValue, Record, TransactionEdge};

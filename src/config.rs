use anyhow::Result;
use config::Environment;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub nodes_csv_path: PathBuf,
    pub edges_csv_path: PathBuf,
    pub progress_interval: usize,
}

impl Config {
    /// Reads `.env` if present, then the process environment.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_environment(Environment::default())
    }

    fn from_environment(environment: Environment) -> Result<Self> {
        let config = ::config::Config::builder()
            .set_default("neo4j_uri", "127.0.0.1:7687")?
            .set_default("neo4j_user", "neo4j")?
            .set_default("neo4j_password", "neo4j")?
            .set_default("nodes_csv_path", "nodes.csv")?
            .set_default("edges_csv_path", "relationships.csv")?
            .set_default("progress_interval", 1000)?
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_environment() {
        let config =
            Config::from_environment(Environment::with_prefix("ETH_GRAPH_LOADER_TEST_UNSET"))
                .unwrap();
        assert_eq!(config.neo4j_uri, "127.0.0.1:7687");
        assert_eq!(config.neo4j_user, "neo4j");
        assert_eq!(config.nodes_csv_path, PathBuf::from("nodes.csv"));
        assert_eq!(config.edges_csv_path, PathBuf::from("relationships.csv"));
        assert_eq!(config.progress_interval, 1000);
    }
}

use serde::{Deserialize, Serialize};

use crate::error::ProofError;

pub const DEFAULT_CHUNK_SIZE: usize = 100;

const ENV_PARALLELIZE: &str = "UNLYNX_PARALLELIZE";
const ENV_CHUNK_SIZE: &str = "UNLYNX_CHUNK_SIZE";

/// Controls how vector and map proofs are fanned out across worker threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProverConfig {
    /// Run proof creation on the rayon pool instead of the calling thread.
    pub parallelize: bool,
    /// Number of consecutive vector elements handled by one worker.
    pub chunk_size: usize,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            parallelize: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ProverConfig {
    pub fn sequential() -> Self {
        Self {
            parallelize: false,
            ..Self::default()
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Build a config from `UNLYNX_PARALLELIZE` and `UNLYNX_CHUNK_SIZE`, falling back to defaults.
    pub fn from_env() -> Result<Self, ProofError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ProofError> {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_PARALLELIZE) {
            config.parallelize = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(ProofError::InvalidInput(format!(
                        "{ENV_PARALLELIZE} must be a boolean, got {other:?}"
                    )))
                }
            };
        }
        if let Some(raw) = lookup(ENV_CHUNK_SIZE) {
            config.chunk_size = raw.trim().parse().map_err(|_| {
                ProofError::InvalidInput(format!(
                    "{ENV_CHUNK_SIZE} must be a positive integer, got {raw:?}"
                ))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ProofError> {
        if self.chunk_size == 0 {
            return Err(ProofError::InvalidInput(
                "chunk size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = ProverConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ProverConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = ProverConfig::from_lookup(lookup(&[
            (ENV_PARALLELIZE, "off"),
            (ENV_CHUNK_SIZE, " 7 "),
        ]))
        .unwrap();
        assert!(!config.parallelize);
        assert_eq!(config.chunk_size, 7);
    }

    #[test]
    fn rejects_zero_chunk_and_garbage() {
        assert!(ProverConfig::from_lookup(lookup(&[(ENV_CHUNK_SIZE, "0")])).is_err());
        assert!(ProverConfig::from_lookup(lookup(&[(ENV_PARALLELIZE, "maybe")])).is_err());
    }

    #[test]
    fn deserializes_partial_json() {
        let config: ProverConfig = serde_json::from_str(r#"{"chunk_size": 4}"#).unwrap();
        assert!(config.parallelize);
        assert_eq!(config.chunk_size, 4);
    }
}

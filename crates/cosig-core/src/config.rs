//! Log and witness registries loaded from JSON configuration.

use std::collections::BTreeMap;
use std::path::Path;

use cosig_note::{ErrorKind, KeyId, LogId, NoteError, NoteVerifier, WitnessId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Config is not valid JSON for the expected shape.
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A public key string could not be parsed.
    #[error("invalid key for {id}: {source}")]
    Key {
        /// Entry the key belongs to.
        id: String,
        /// Parse failure.
        #[source]
        source: NoteError,
    },
    /// Two entries are configured with the same key.
    #[error("{id} uses the same key as {other}")]
    SharedKey {
        /// Entry that reuses the key.
        id: String,
        /// Entry the key was first configured for.
        other: String,
    },
    /// The same identifier appears twice.
    #[error("duplicate {what} id {id}")]
    Duplicate {
        /// "log" or "witness".
        what: &'static str,
        /// Repeated identifier.
        id: String,
    },
}

impl ConfigError {
    /// Classifies the error within the shared taxonomy.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidConfig
    }
}

/// One configured log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log identifier.
    pub id: LogId,
    /// Expected checkpoint origin line.
    pub origin: String,
    /// Log verifier key string.
    pub public_key: String,
}

/// One configured witness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessConfig {
    /// Witness identifier.
    pub id: WitnessId,
    /// Witness verifier key string.
    pub public_key: String,
}

/// On-disk configuration: the logs and witnesses a deployment knows about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Configured logs.
    #[serde(default)]
    pub logs: Vec<LogConfig>,
    /// Configured witnesses.
    #[serde(default)]
    pub witnesses: Vec<WitnessConfig>,
}

impl Config {
    /// Parses configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Builds the log registry, parsing every verifier key.
    pub fn log_registry(&self) -> Result<LogRegistry, ConfigError> {
        let mut logs = BTreeMap::new();
        for entry in &self.logs {
            let verifier = parse_key(entry.id.as_str(), &entry.public_key)?;
            let info = LogInfo {
                origin: entry.origin.clone(),
                verifier,
            };
            if logs.insert(entry.id.clone(), info).is_some() {
                return Err(ConfigError::Duplicate {
                    what: "log",
                    id: entry.id.to_string(),
                });
            }
        }
        Ok(LogRegistry { logs })
    }

    /// Builds the witness registry, parsing every verifier key.
    ///
    /// Each witness needs a key of its own: a key identity shared with a
    /// log or with another witness is rejected.
    pub fn witness_registry(&self) -> Result<WitnessRegistry, ConfigError> {
        let mut owners: BTreeMap<KeyId, String> = BTreeMap::new();
        for entry in &self.logs {
            let verifier = parse_key(entry.id.as_str(), &entry.public_key)?;
            owners.insert(verifier.key_id(), format!("log {}", entry.id));
        }
        let mut witnesses = BTreeMap::new();
        for entry in &self.witnesses {
            let verifier = parse_key(entry.id.as_str(), &entry.public_key)?;
            if witnesses.contains_key(&entry.id) {
                return Err(ConfigError::Duplicate {
                    what: "witness",
                    id: entry.id.to_string(),
                });
            }
            if let Some(other) = owners.insert(verifier.key_id(), format!("witness {}", entry.id)) {
                return Err(ConfigError::SharedKey {
                    id: format!("witness {}", entry.id),
                    other,
                });
            }
            witnesses.insert(entry.id.clone(), verifier);
        }
        Ok(WitnessRegistry { witnesses })
    }
}

fn parse_key(id: &str, key: &str) -> Result<NoteVerifier, ConfigError> {
    NoteVerifier::parse(key).map_err(|source| ConfigError::Key {
        id: id.to_string(),
        source,
    })
}

/// What is known about a configured log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogInfo {
    /// Expected checkpoint origin.
    pub origin: String,
    /// Verifier for the log's own signature.
    pub verifier: NoteVerifier,
}

/// Immutable map from log identifier to origin and verifier.
#[derive(Debug, Clone, Default)]
pub struct LogRegistry {
    logs: BTreeMap<LogId, LogInfo>,
}

impl LogRegistry {
    /// Looks up a log.
    pub fn get(&self, id: &LogId) -> Option<&LogInfo> {
        self.logs.get(id)
    }

    /// Configured log identifiers, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &LogId> {
        self.logs.keys()
    }

    /// Number of configured logs.
    pub fn len(&self) -> usize {
        self.logs.len()
    }

    /// True if no logs are configured.
    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

impl FromIterator<(LogId, LogInfo)> for LogRegistry {
    fn from_iter<I: IntoIterator<Item = (LogId, LogInfo)>>(iter: I) -> Self {
        Self {
            logs: iter.into_iter().collect(),
        }
    }
}

/// Immutable map from witness identifier to verifier.
#[derive(Debug, Clone, Default)]
pub struct WitnessRegistry {
    witnesses: BTreeMap<WitnessId, NoteVerifier>,
}

impl WitnessRegistry {
    /// Looks up a witness verifier.
    pub fn get(&self, id: &WitnessId) -> Option<&NoteVerifier> {
        self.witnesses.get(id)
    }

    /// Finds the witness whose verifier key name is `name`.
    pub fn by_key_name(&self, name: &str) -> Option<&WitnessId> {
        self.witnesses
            .iter()
            .find(|(_, v)| v.name() == name)
            .map(|(id, _)| id)
    }

    /// Every configured witness, sorted by identifier.
    pub fn iter(&self) -> impl Iterator<Item = (&WitnessId, &NoteVerifier)> {
        self.witnesses.iter()
    }

    /// Number of configured witnesses.
    pub fn len(&self) -> usize {
        self.witnesses.len()
    }

    /// True if no witnesses are configured.
    pub fn is_empty(&self) -> bool {
        self.witnesses.is_empty()
    }
}

impl FromIterator<(WitnessId, NoteVerifier)> for WitnessRegistry {
    fn from_iter<I: IntoIterator<Item = (WitnessId, NoteVerifier)>>(iter: I) -> Self {
        Self {
            witnesses: iter.into_iter().collect(),
        }
    }
}

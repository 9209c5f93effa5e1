//! JSON configuration for `dashhaorch`.
//!
//! ```json
//! {
//!   "enis": ["eni0"],
//!   "ha_pairs": {
//!     "pair0": {
//!       "peer_dpu_ipv4": "10.0.0.2", "peer_dpu_ipv6": "fd00::2",
//!       "peer_npu_ipv4": "10.0.1.2", "peer_npu_ipv6": "fd00:1::2",
//!       "npu_tunnel_dst_port": 4789,
//!       "npu_tunnel_src_port_min": 49152, "npu_tunnel_src_port_max": 53247,
//!       "dp_channel_dst_port": 4790,
//!       "dp_channel_src_port_min": 53248, "dp_channel_src_port_max": 57343,
//!       "dp_channel_probe_interval_ms": 100
//!     }
//!   },
//!   "ha_sessions": {
//!     "eni0": { "eni": "eni0", "ha_pair": "pair0", "ha_role": "active" }
//!   }
//! }
//! ```
//!
//! Row values may be JSON strings, numbers or booleans; they are handed to
//! the orch as table field strings. Every HA pair field is mandatory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dash_ha::{FieldValue, KeyOpFieldsValues};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{table} row {key}: field {field} must be a string, number or boolean")]
    InvalidValue {
        table: &'static str,
        key: String,
        field: String,
    },
}

pub type Row = BTreeMap<String, serde_json::Value>;

/// Contents of a `dashhaorch` config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashHaConfigFile {
    /// ENI names to provision before sessions are applied.
    pub enis: Vec<String>,
    pub ha_pairs: BTreeMap<String, Row>,
    pub ha_sessions: BTreeMap<String, Row>,
}

fn row_to_fvs(table: &'static str, key: &str, row: &Row) -> Result<Vec<FieldValue>, ConfigError> {
    row.iter()
        .map(|(field, value)| {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        table,
                        key: key.to_string(),
                        field: field.clone(),
                    })
                }
            };
            Ok((field.clone(), value))
        })
        .collect()
}

impl DashHaConfigFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// SET entries for `DASH_HA_PAIR_TABLE`, in key order.
    pub fn pair_entries(&self) -> Result<Vec<KeyOpFieldsValues>, ConfigError> {
        self.ha_pairs
            .iter()
            .map(|(key, row)| {
                let fvs = row_to_fvs("ha_pairs", key, row)?;
                Ok(KeyOpFieldsValues::set(key.as_str(), fvs))
            })
            .collect()
    }

    /// SET entries for `DASH_HA_SESSION_TABLE`, in key order.
    pub fn session_entries(&self) -> Result<Vec<KeyOpFieldsValues>, ConfigError> {
        self.ha_sessions
            .iter()
            .map(|(key, row)| {
                let fvs = row_to_fvs("ha_sessions", key, row)?;
                Ok(KeyOpFieldsValues::set(key.as_str(), fvs))
            })
            .collect()
    }
}

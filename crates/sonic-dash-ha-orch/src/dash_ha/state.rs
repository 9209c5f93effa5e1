//! Process-local ENI directory and HA session state table.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError, RwLock};

use sonic_sai_dash_ha::EniOid;

use super::orch::DashHaOrchCallbacks;
use super::types::FieldValue;

/// [`DashHaOrchCallbacks`] backed by in-memory maps.
///
/// ENIs are added by whoever owns them; session state rows are kept keyed by
/// session name, fields sorted.
#[derive(Debug, Default)]
pub struct LocalHaState {
    enis: RwLock<HashMap<String, EniOid>>,
    rows: Mutex<BTreeMap<String, BTreeMap<String, String>>>,
}

impl LocalHaState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_eni(&self, name: impl Into<String>, oid: EniOid) {
        self.enis
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), oid);
    }

    pub fn remove_eni(&self, name: &str) -> Option<EniOid> {
        self.enis
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    /// Copy of the session state table.
    pub fn rows(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn row(&self, key: &str) -> Option<BTreeMap<String, String>> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl DashHaOrchCallbacks for LocalHaState {
    fn get_eni_id(&self, eni: &str) -> Option<EniOid> {
        self.enis
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(eni)
            .copied()
    }

    fn write_session_state(&self, key: &str, fvs: &[FieldValue]) {
        // Rows are rewritten whole; fields absent from `fvs` are dropped.
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), fvs.iter().cloned().collect());
    }

    fn remove_session_state(&self, key: &str) {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

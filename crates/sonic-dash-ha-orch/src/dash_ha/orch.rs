//! DashHaOrch implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use sonic_sai_dash_ha::types::RawSaiObjectId;
use sonic_sai_dash_ha::{
    DashHaApi, DashHaApiExt, DashHaRole, DashHaSessionAttr, EniOid, HaScopeEventData,
    HaScopeEventNotification, HaSessionConfig, HaSessionStat, SaiError, SaiStatus, StatsMode,
    SwitchHaExtension, SwitchOid,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::audit_log;

use super::types::{
    changed_pair_field, parse_pair_fields, FieldValue, HaPairInfo, HaSessionFields,
    HaSessionInfo, HaTable, KeyOpFieldsValues, Operation, TaskStatus, FIELD_ENI, FIELD_HA_PAIR,
};

const SOURCE: &str = "DashHaOrch";

/// DASH HA orchestrator error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashHaOrchError {
    /// Malformed table entry, or the orch is not wired up.
    #[error("Invalid DASH HA config: {0}")]
    InvalidConfig(String),
    #[error("HA pair not found: {0}")]
    PairNotFound(String),
    #[error("HA session not found: {0}")]
    SessionNotFound(String),
    /// Pair removal while sessions still reference it.
    #[error("HA pair {pair} is still used by {sessions:?}")]
    PairInUse { pair: String, sessions: Vec<String> },
    /// SET that changes a field fixed at creation.
    #[error("{key}: field {field} cannot change after creation")]
    ImmutableField { key: String, field: &'static str },
    #[error("SAI error: {0}")]
    Sai(#[from] SaiError),
}

impl DashHaOrchError {
    /// Returns true if the entry that caused this error should be kept and
    /// retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            DashHaOrchError::PairInUse { .. } => true,
            DashHaOrchError::Sai(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// SAI status behind this error, if it came from the adapter.
    pub fn sai_status(&self) -> Option<SaiStatus> {
        match self {
            DashHaOrchError::Sai(e) => Some(e.status()),
            _ => None,
        }
    }
}

/// Callbacks for DashHaOrch operations.
pub trait DashHaOrchCallbacks: Send + Sync {
    /// Resolves an ENI name to its SAI object ID.
    fn get_eni_id(&self, eni: &str) -> Option<EniOid>;

    /// Writes a session row to the HA session state table.
    fn write_session_state(&self, key: &str, fvs: &[FieldValue]);

    /// Removes a session row from the HA session state table.
    fn remove_session_state(&self, key: &str);
}

/// DASH HA orchestrator configuration.
#[derive(Debug, Clone, Default)]
pub struct DashHaOrchConfig {
    /// Switch the pairs and sessions are created on.
    pub switch_id: SwitchOid,
}

impl DashHaOrchConfig {
    pub fn with_switch_id(mut self, switch_id: SwitchOid) -> Self {
        self.switch_id = switch_id;
        self
    }
}

/// DASH HA orchestrator statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashHaOrchStats {
    pub pairs_created: u64,
    pub pairs_removed: u64,
    pub sessions_created: u64,
    pub sessions_removed: u64,
    /// Roles written to the adapter on existing sessions.
    pub role_changes: u64,
    /// HA scope events drained from the event queue.
    pub ha_scope_events: u64,
    /// Entries parked waiting for a dependency.
    pub deferrals: u64,
    /// Parked entries applied by a later retry.
    pub retries_resolved: u64,
    /// Entries dropped because of an error.
    pub errors: u64,
}

/// Orchestrates HA pairs and HA sessions.
///
/// Entries for `DASH_HA_PAIR_TABLE` and `DASH_HA_SESSION_TABLE` arrive
/// through [`DashHaOrch::do_task`]. A session whose pair or ENI is not known
/// yet is parked and retried whenever a pair is created or a session is
/// removed, or when [`DashHaOrch::retry_pending`] is called.
pub struct DashHaOrch {
    config: DashHaOrchConfig,
    api: Arc<dyn DashHaApi>,
    callbacks: Option<Arc<dyn DashHaOrchCallbacks>>,
    /// Pair table key to pair.
    pairs: HashMap<String, HaPairInfo>,
    /// Session table key to session.
    sessions: HashMap<String, HaSessionInfo>,
    /// Reverse map from session OID (which is also its HA scope id) to key.
    oid_to_session: HashMap<RawSaiObjectId, String>,
    /// Parked entries, latest per key. Pair entries sort first.
    pending: BTreeMap<(HaTable, String), KeyOpFieldsValues>,
    /// Filled by the HA scope event callback, drained by
    /// [`DashHaOrch::process_ha_scope_events`].
    events: Arc<Mutex<Vec<HaScopeEventData>>>,
    stats: DashHaOrchStats,
}

impl std::fmt::Debug for DashHaOrch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashHaOrch")
            .field("config", &self.config)
            .field("pairs_count", &self.pairs.len())
            .field("sessions_count", &self.sessions.len())
            .field("pending_count", &self.pending.len())
            .field("stats", &self.stats)
            .finish()
    }
}

fn audit_failure(
    category: AuditCategory,
    action: &str,
    key: &str,
    object_type: &str,
    err: &DashHaOrchError,
) {
    let mut record = AuditRecord::new(category, SOURCE, action)
        .with_object_id(key)
        .with_object_type(object_type)
        .with_error(err.to_string());
    if let Some(status) = err.sai_status() {
        record = record.with_sai_status(status);
    }
    if matches!(err, DashHaOrchError::ImmutableField { .. }) {
        record = record.with_outcome(AuditOutcome::Denied);
    }
    audit_log!(record);
}

impl DashHaOrch {
    /// Creates a new DashHaOrch driving `api`.
    pub fn new(config: DashHaOrchConfig, api: Arc<dyn DashHaApi>) -> Self {
        Self {
            config,
            api,
            callbacks: None,
            pairs: HashMap::new(),
            sessions: HashMap::new(),
            oid_to_session: HashMap::new(),
            pending: BTreeMap::new(),
            events: Arc::new(Mutex::new(Vec::new())),
            stats: DashHaOrchStats::default(),
        }
    }

    /// Sets the callbacks for this orch.
    pub fn set_callbacks(&mut self, callbacks: Arc<dyn DashHaOrchCallbacks>) {
        self.callbacks = Some(callbacks);
    }

    pub fn config(&self) -> &DashHaOrchConfig {
        &self.config
    }

    pub fn stats(&self) -> &DashHaOrchStats {
        &self.stats
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn get_pair(&self, key: &str) -> Option<&HaPairInfo> {
        self.pairs.get(key)
    }

    pub fn get_session(&self, key: &str) -> Option<&HaSessionInfo> {
        self.sessions.get(key)
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&String, &HaPairInfo)> {
        self.pairs.iter()
    }

    pub fn sessions(&self) -> impl Iterator<Item = (&String, &HaSessionInfo)> {
        self.sessions.iter()
    }

    /// Parked entries, in retry order.
    pub fn pending_entries(&self) -> impl Iterator<Item = (HaTable, &KeyOpFieldsValues)> {
        self.pending.iter().map(|((table, _), entry)| (*table, entry))
    }

    /// Gets a session by its SAI OID.
    pub fn get_session_by_oid(&self, oid: RawSaiObjectId) -> Option<&HaSessionInfo> {
        self.oid_to_session
            .get(&oid)
            .and_then(|key| self.sessions.get(key))
    }

    /// Applies a batch of table entries.
    ///
    /// Returns the entries that were dropped, with their error. Entries that
    /// wait on a dependency, or failed with a retryable error, are parked
    /// instead.
    pub fn do_task(
        &mut self,
        table: HaTable,
        entries: Vec<KeyOpFieldsValues>,
    ) -> Vec<(String, DashHaOrchError)> {
        let mut failed = Vec::new();
        for entry in entries {
            let pending_key = (table, entry.key.clone());
            let superseded = self.pending.remove(&pending_key);

            if entry.op.is_del() && superseded.is_some() && !self.exists(table, &entry.key) {
                info!("Dropped parked {} entry {}", table, entry.key);
                continue;
            }

            match self.process_entry(table, &entry) {
                Ok(TaskStatus::Done) => {
                    let unblocks = matches!(
                        (table, entry.op),
                        (HaTable::Pair, Operation::Set) | (HaTable::Session, Operation::Del)
                    );
                    if unblocks && !self.pending.is_empty() {
                        self.retry_pending();
                    }
                }
                Ok(TaskStatus::Pending) => {
                    self.stats.deferrals += 1;
                    self.pending.insert(pending_key, entry);
                }
                Err(e) if e.is_retryable() => {
                    warn!("Parking {} entry {}: {}", table, entry.key, e);
                    self.stats.deferrals += 1;
                    self.pending.insert(pending_key, entry);
                }
                Err(e) => {
                    warn!("Dropping {} {} entry {}: {}", table, entry.op, entry.key, e);
                    self.stats.errors += 1;
                    failed.push((entry.key, e));
                }
            }
        }
        failed
    }

    /// Re-applies parked entries until no more progress is made.
    ///
    /// Returns the number of entries applied.
    pub fn retry_pending(&mut self) -> usize {
        let mut resolved = 0;
        loop {
            let mut progressed = false;
            let keys: Vec<(HaTable, String)> = self.pending.keys().cloned().collect();
            for pending_key in keys {
                let Some(entry) = self.pending.remove(&pending_key) else {
                    continue;
                };
                match self.process_entry(pending_key.0, &entry) {
                    Ok(TaskStatus::Done) => {
                        debug!("Applied parked {} entry {}", pending_key.0, entry.key);
                        resolved += 1;
                        progressed = true;
                    }
                    Ok(TaskStatus::Pending) => {
                        self.pending.insert(pending_key, entry);
                    }
                    Err(e) if e.is_retryable() => {
                        self.pending.insert(pending_key, entry);
                    }
                    Err(e) => {
                        warn!("Dropping parked {} entry {}: {}", pending_key.0, entry.key, e);
                        self.stats.errors += 1;
                        progressed = true;
                    }
                }
            }
            if !progressed {
                break;
            }
        }
        self.stats.retries_resolved += resolved as u64;
        resolved
    }

    fn exists(&self, table: HaTable, key: &str) -> bool {
        match table {
            HaTable::Pair => self.pairs.contains_key(key),
            HaTable::Session => self.sessions.contains_key(key),
        }
    }

    fn process_entry(
        &mut self,
        table: HaTable,
        entry: &KeyOpFieldsValues,
    ) -> Result<TaskStatus, DashHaOrchError> {
        match (table, entry.op) {
            (HaTable::Pair, Operation::Set) => self.set_pair(&entry.key, &entry.fvs),
            (HaTable::Pair, Operation::Del) => self.remove_pair(&entry.key),
            (HaTable::Session, Operation::Set) => self.set_session(&entry.key, &entry.fvs),
            (HaTable::Session, Operation::Del) => self.remove_session(&entry.key),
        }
    }

    fn set_pair(&mut self, key: &str, fvs: &[FieldValue]) -> Result<TaskStatus, DashHaOrchError> {
        let config = parse_pair_fields(fvs).map_err(|e| {
            let err = DashHaOrchError::InvalidConfig(format!("{}: {}", key, e));
            audit_failure(AuditCategory::ConfigurationChange, "parse_ha_pair", key, "dash_ha_pair", &err);
            err
        })?;

        if let Some(existing) = self.pairs.get(key) {
            return match changed_pair_field(&existing.config, &config) {
                None => {
                    debug!("HA pair {} unchanged", key);
                    Ok(TaskStatus::Done)
                }
                Some(field) => {
                    let err = DashHaOrchError::ImmutableField {
                        key: key.to_string(),
                        field,
                    };
                    audit_failure(AuditCategory::ResourceModify, "set_ha_pair", key, "dash_ha_pair", &err);
                    Err(err)
                }
            };
        }

        let oid = self
            .api
            .create_ha_pair(self.config.switch_id, &config)
            .map_err(|e| {
                let err = DashHaOrchError::from(e);
                audit_failure(AuditCategory::ResourceCreate, "create_ha_pair", key, "dash_ha_pair", &err);
                err
            })?;

        self.pairs.insert(
            key.to_string(),
            HaPairInfo {
                oid,
                config: config.clone(),
            },
        );
        self.stats.pairs_created += 1;
        info!("Created HA pair {} ({})", key, oid);

        let audit_record = AuditRecord::new(AuditCategory::ResourceCreate, SOURCE, "create_ha_pair")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(key)
            .with_object_type("dash_ha_pair")
            .with_sai_status(SaiStatus::Success)
            .with_details(serde_json::json!({
                "sai_oid": format!("0x{:x}", oid.as_raw()),
                "peer_dpu_ipv4": config.peer_dpu_ipv4.to_string(),
                "peer_dpu_ipv6": config.peer_dpu_ipv6.to_string(),
                "peer_npu_ipv4": config.peer_npu_ipv4.to_string(),
                "peer_npu_ipv6": config.peer_npu_ipv6.to_string(),
                "npu_tunnel_dst_port": config.npu_tunnel_dst_port,
                "npu_tunnel_src_ports": config.npu_tunnel_src_ports.to_string(),
                "dp_channel_dst_port": config.dp_channel_dst_port,
                "dp_channel_src_ports": config.dp_channel_src_ports.to_string(),
                "dp_channel_probe_interval_ms": config.dp_channel_probe_interval_ms,
            }));
        audit_log!(audit_record);

        Ok(TaskStatus::Done)
    }

    fn remove_pair(&mut self, key: &str) -> Result<TaskStatus, DashHaOrchError> {
        let oid = match self.pairs.get(key) {
            Some(info) => info.oid,
            None => {
                let err = DashHaOrchError::PairNotFound(key.to_string());
                audit_failure(AuditCategory::ResourceDelete, "remove_ha_pair", key, "dash_ha_pair", &err);
                return Err(err);
            }
        };

        let mut users: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.pair_name == key)
            .map(|(k, _)| k.clone())
            .collect();
        if !users.is_empty() {
            users.sort();
            return Err(DashHaOrchError::PairInUse {
                pair: key.to_string(),
                sessions: users,
            });
        }

        if let Err(e) = self.api.remove_dash_ha_pair(oid) {
            let err = if e.status() == SaiStatus::ObjectInUse {
                DashHaOrchError::PairInUse {
                    pair: key.to_string(),
                    sessions: Vec::new(),
                }
            } else {
                DashHaOrchError::from(e)
            };
            audit_failure(AuditCategory::ResourceDelete, "remove_ha_pair", key, "dash_ha_pair", &err);
            return Err(err);
        }

        self.pairs.remove(key);
        self.stats.pairs_removed += 1;
        info!("Removed HA pair {} ({})", key, oid);

        let audit_record = AuditRecord::new(AuditCategory::ResourceDelete, SOURCE, "remove_ha_pair")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(key)
            .with_object_type("dash_ha_pair")
            .with_sai_status(SaiStatus::Success)
            .with_details(serde_json::json!({
                "sai_oid": format!("0x{:x}", oid.as_raw()),
            }));
        audit_log!(audit_record);

        Ok(TaskStatus::Done)
    }

    fn set_session(&mut self, key: &str, fvs: &[FieldValue]) -> Result<TaskStatus, DashHaOrchError> {
        let fields = HaSessionFields::parse(fvs).map_err(|e| {
            let err = DashHaOrchError::InvalidConfig(format!("{}: {}", key, e));
            audit_failure(AuditCategory::ConfigurationChange, "parse_ha_session", key, "dash_ha_session", &err);
            err
        })?;

        if self.sessions.contains_key(key) {
            return self.update_session(key, &fields);
        }

        let Some(pair_oid) = self.pairs.get(&fields.ha_pair).map(|p| p.oid) else {
            debug!("HA session {} waits for HA pair {}", key, fields.ha_pair);
            return Ok(TaskStatus::Pending);
        };

        let callbacks = self
            .callbacks
            .clone()
            .ok_or_else(|| DashHaOrchError::InvalidConfig("No callbacks set".to_string()))?;

        let Some(eni) = callbacks.get_eni_id(&fields.eni) else {
            debug!("HA session {} waits for ENI {}", key, fields.eni);
            return Ok(TaskStatus::Pending);
        };

        let mut sai_config = HaSessionConfig::new(eni, pair_oid);
        if let Some(role) = fields.ha_role {
            sai_config = sai_config.with_role(role);
        }

        let oid = self
            .api
            .create_ha_session(self.config.switch_id, &sai_config)
            .map_err(|e| {
                let err = DashHaOrchError::from(e);
                audit_failure(AuditCategory::ResourceCreate, "create_ha_session", key, "dash_ha_session", &err);
                err
            })?;

        let info = HaSessionInfo::new(oid, &fields, eni);
        callbacks.write_session_state(key, &info.state_field_values());
        let role = info.role;
        self.sessions.insert(key.to_string(), info);
        self.oid_to_session.insert(oid.as_raw(), key.to_string());
        self.stats.sessions_created += 1;
        info!("Created HA session {} ({}) role {}", key, oid, role);

        let audit_record = AuditRecord::new(AuditCategory::ResourceCreate, SOURCE, "create_ha_session")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(key)
            .with_object_type("dash_ha_session")
            .with_sai_status(SaiStatus::Success)
            .with_details(serde_json::json!({
                "sai_oid": format!("0x{:x}", oid.as_raw()),
                "eni": fields.eni,
                "eni_oid": format!("0x{:x}", eni.as_raw()),
                "ha_pair": fields.ha_pair,
                "ha_pair_oid": format!("0x{:x}", pair_oid.as_raw()),
                "ha_role": role.config_string(),
            }));
        audit_log!(audit_record);

        Ok(TaskStatus::Done)
    }

    /// SET on an existing session. Only the role may change.
    fn update_session(
        &mut self,
        key: &str,
        fields: &HaSessionFields,
    ) -> Result<TaskStatus, DashHaOrchError> {
        let (oid, old_role) = match self.sessions.get(key) {
            Some(info) => {
                let changed = if info.eni_name != fields.eni {
                    Some(FIELD_ENI)
                } else if info.pair_name != fields.ha_pair {
                    Some(FIELD_HA_PAIR)
                } else {
                    None
                };
                if let Some(field) = changed {
                    let err = DashHaOrchError::ImmutableField {
                        key: key.to_string(),
                        field,
                    };
                    audit_failure(AuditCategory::ResourceModify, "set_ha_session", key, "dash_ha_session", &err);
                    return Err(err);
                }
                (info.oid, info.role)
            }
            None => return Err(DashHaOrchError::SessionNotFound(key.to_string())),
        };

        let role = match fields.ha_role {
            Some(role) if role != old_role => role,
            _ => {
                debug!("HA session {} unchanged", key);
                return Ok(TaskStatus::Done);
            }
        };

        self.api.set_ha_role(oid, role).map_err(|e| {
            let err = DashHaOrchError::from(e);
            audit_failure(AuditCategory::ResourceModify, "set_ha_role", key, "dash_ha_session", &err);
            err
        })?;

        let fvs = match self.sessions.get_mut(key) {
            Some(info) => {
                info.role = role;
                info.state_field_values()
            }
            None => return Err(DashHaOrchError::SessionNotFound(key.to_string())),
        };
        if let Some(callbacks) = &self.callbacks {
            callbacks.write_session_state(key, &fvs);
        }
        self.stats.role_changes += 1;
        info!("HA session {} role {} -> {}", key, old_role, role);

        let audit_record = AuditRecord::new(AuditCategory::ResourceModify, SOURCE, "set_ha_role")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(key)
            .with_object_type("dash_ha_session")
            .with_sai_status(SaiStatus::Success)
            .with_details(serde_json::json!({
                "sai_oid": format!("0x{:x}", oid.as_raw()),
                "old_role": old_role.config_string(),
                "new_role": role.config_string(),
            }));
        audit_log!(audit_record);

        Ok(TaskStatus::Done)
    }

    fn remove_session(&mut self, key: &str) -> Result<TaskStatus, DashHaOrchError> {
        let (oid, pair_name) = match self.sessions.get(key) {
            Some(info) => (info.oid, info.pair_name.clone()),
            None => {
                let err = DashHaOrchError::SessionNotFound(key.to_string());
                audit_failure(AuditCategory::ResourceDelete, "remove_ha_session", key, "dash_ha_session", &err);
                return Err(err);
            }
        };

        self.api.remove_dash_ha_session(oid).map_err(|e| {
            let err = DashHaOrchError::from(e);
            audit_failure(AuditCategory::ResourceDelete, "remove_ha_session", key, "dash_ha_session", &err);
            err
        })?;

        self.sessions.remove(key);
        self.oid_to_session.remove(&oid.as_raw());
        self.stats.sessions_removed += 1;
        if let Some(callbacks) = &self.callbacks {
            callbacks.remove_session_state(key);
        }
        info!("Removed HA session {} ({})", key, oid);

        let audit_record = AuditRecord::new(AuditCategory::ResourceDelete, SOURCE, "remove_ha_session")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(key)
            .with_object_type("dash_ha_session")
            .with_sai_status(SaiStatus::Success)
            .with_details(serde_json::json!({
                "sai_oid": format!("0x{:x}", oid.as_raw()),
                "ha_pair": pair_name,
            }));
        audit_log!(audit_record);

        Ok(TaskStatus::Done)
    }

    /// Returns the callback that feeds HA scope events into this orch.
    ///
    /// The callback only queues; events are applied by
    /// [`DashHaOrch::process_ha_scope_events`].
    pub fn ha_scope_event_handler(&self) -> HaScopeEventNotification {
        let queue = Arc::clone(&self.events);
        Arc::new(move |events: &[HaScopeEventData]| {
            queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend_from_slice(events);
        })
    }

    /// Registers [`DashHaOrch::ha_scope_event_handler`] on the switch.
    pub fn register_ha_scope_events(
        &self,
        switch: &dyn SwitchHaExtension,
    ) -> Result<(), DashHaOrchError> {
        switch.set_ha_scope_event_notify(self.config.switch_id, Some(self.ha_scope_event_handler()))?;
        info!("Registered HA scope event handler on {}", self.config.switch_id);
        Ok(())
    }

    /// Applies queued HA scope events to the observed session state.
    ///
    /// Returns the number of events applied. Events for unknown scopes or
    /// without a role are logged and skipped.
    pub fn process_ha_scope_events(&mut self) -> usize {
        let events = std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner));

        let mut applied = 0;
        for event in events {
            self.stats.ha_scope_events += 1;
            let Some(key) = self.oid_to_session.get(&event.ha_scope_id.as_raw()).cloned() else {
                warn!("{} for unknown HA scope {}", event.event_type, event.ha_scope_id);
                continue;
            };
            let role = event
                .attrs
                .iter()
                .find(|a| a.id == DashHaSessionAttr::HaRole.as_raw())
                .and_then(|a| a.value.as_s32())
                .and_then(DashHaRole::from_raw);
            let Some(role) = role else {
                warn!("{} for {} carries no HA role", event.event_type, key);
                continue;
            };

            let (fvs, previous) = match self.sessions.get_mut(&key) {
                Some(info) => {
                    let previous = info.observed_role.replace(role);
                    info.last_update = Some(Utc::now());
                    (info.state_field_values(), previous)
                }
                None => continue,
            };
            if let Some(callbacks) = &self.callbacks {
                callbacks.write_session_state(&key, &fvs);
            }
            applied += 1;
            info!("HA scope {} reports role {}", key, role);

            let audit_record = AuditRecord::new(AuditCategory::HaStateChange, SOURCE, "ha_scope_event")
                .with_outcome(AuditOutcome::Success)
                .with_object_id(&key)
                .with_object_type("dash_ha_scope")
                .with_details(serde_json::json!({
                    "event": event.event_type.sai_name(),
                    "ha_scope_id": format!("0x{:x}", event.ha_scope_id.as_raw()),
                    "previous_role": previous.map(|r| r.config_string()),
                    "ha_role": role.config_string(),
                }));
            audit_log!(audit_record);
        }
        applied
    }

    /// Reads every HA session counter, keyed by SAI stat name.
    ///
    /// With `clear` the counters are read and reset in one call.
    pub fn read_counters(
        &self,
        key: &str,
        clear: bool,
    ) -> Result<BTreeMap<String, u64>, DashHaOrchError> {
        let oid = self
            .sessions
            .get(key)
            .map(|info| info.oid)
            .ok_or_else(|| DashHaOrchError::SessionNotFound(key.to_string()))?;
        let mode = if clear {
            StatsMode::ReadAndClear
        } else {
            StatsMode::Read
        };

        let values = self
            .api
            .get_session_counters(oid, HaSessionStat::ALL, mode)
            .map_err(|e| {
                let err = DashHaOrchError::from(e);
                audit_failure(AuditCategory::SaiOperation, "get_ha_session_stats", key, "dash_ha_session", &err);
                err
            })?;

        if clear {
            let audit_record =
                AuditRecord::new(AuditCategory::SaiOperation, SOURCE, "clear_ha_session_stats")
                    .with_outcome(AuditOutcome::Success)
                    .with_object_id(key)
                    .with_object_type("dash_ha_session")
                    .with_sai_status(SaiStatus::Success)
                    .with_details(serde_json::json!({
                        "sai_oid": format!("0x{:x}", oid.as_raw()),
                        "mode": mode.to_string(),
                        "counters": values.len(),
                    }));
            audit_log!(audit_record);
        }

        Ok(values
            .into_iter()
            .map(|(stat, value)| (stat.sai_name().to_string(), value))
            .collect())
    }
}

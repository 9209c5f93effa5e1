//! One-shot run of DashHaOrch against the in-memory adapter.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use sonic_sai_dash_ha::{SwitchAttrExtensionRange, VirtualDashHa};
use thiserror::Error;
use tracing::info;

use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::audit_log;
use crate::config::{ConfigError, DashHaConfigFile};
use crate::dash_ha::{
    DashHaOrch, DashHaOrchConfig, DashHaOrchError, HaPairInfo, HaSessionInfo, HaTable,
    LocalHaState,
};

/// Base-header `SAI_SWITCH_ATTR_END` assumed when none is given.
pub const DEFAULT_SWITCH_ATTR_END: u32 = 0x0000_0200;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Orch(#[from] DashHaOrchError),
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub switch_attr_end: u32,
    /// Include every session's counters in the report.
    pub dump_counters: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            switch_attr_end: DEFAULT_SWITCH_ATTR_END,
            dump_counters: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairReport {
    pub oid: String,
    pub peer_dpu_ipv4: String,
    pub peer_dpu_ipv6: String,
    pub peer_npu_ipv4: String,
    pub peer_npu_ipv6: String,
    pub npu_tunnel_dst_port: u16,
    pub npu_tunnel_src_ports: String,
    pub dp_channel_dst_port: u16,
    pub dp_channel_src_ports: String,
    pub dp_channel_probe_interval_ms: u32,
}

impl From<&HaPairInfo> for PairReport {
    fn from(info: &HaPairInfo) -> Self {
        let c = &info.config;
        Self {
            oid: format!("0x{:x}", info.oid.as_raw()),
            peer_dpu_ipv4: c.peer_dpu_ipv4.to_string(),
            peer_dpu_ipv6: c.peer_dpu_ipv6.to_string(),
            peer_npu_ipv4: c.peer_npu_ipv4.to_string(),
            peer_npu_ipv6: c.peer_npu_ipv6.to_string(),
            npu_tunnel_dst_port: c.npu_tunnel_dst_port,
            npu_tunnel_src_ports: c.npu_tunnel_src_ports.to_string(),
            dp_channel_dst_port: c.dp_channel_dst_port,
            dp_channel_src_ports: c.dp_channel_src_ports.to_string(),
            dp_channel_probe_interval_ms: c.dp_channel_probe_interval_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub oid: String,
    pub eni: String,
    pub ha_pair: String,
    pub ha_role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_ha_role: Option<String>,
}

impl From<&HaSessionInfo> for SessionReport {
    fn from(info: &HaSessionInfo) -> Self {
        Self {
            oid: format!("0x{:x}", info.oid.as_raw()),
            eni: info.eni_name.clone(),
            ha_pair: info.pair_name.clone(),
            ha_role: info.role.config_string().to_string(),
            observed_ha_role: info.observed_role.map(|r| r.config_string().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryError {
    pub table: &'static str,
    pub key: String,
    pub error: String,
}

/// What a run left behind.
#[derive(Debug, Clone, Serialize)]
pub struct DashHaReport {
    pub switch_id: String,
    /// Id of `SAI_SWITCH_ATTR_HA_SCOPE_EVENT_NOTIFY` for the configured
    /// `SAI_SWITCH_ATTR_END`.
    pub ha_scope_event_notify_attr: String,
    pub ha_pairs: BTreeMap<String, PairReport>,
    pub ha_sessions: BTreeMap<String, SessionReport>,
    /// `TABLE:key` of entries still waiting on a dependency.
    pub pending: Vec<String>,
    pub errors: Vec<EntryError>,
    /// The HA session state table.
    pub state: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counters: Option<BTreeMap<String, BTreeMap<String, u64>>>,
}

/// Applies `config` to a fresh in-memory adapter and reports the result.
///
/// Entry-level failures are collected in [`DashHaReport::errors`]; only a
/// broken document or adapter aborts the run.
pub fn run(config: &DashHaConfigFile, options: &RunOptions) -> Result<DashHaReport, RunError> {
    let pair_entries = config.pair_entries()?;
    let session_entries = config.session_entries()?;

    let vs = Arc::new(VirtualDashHa::new());
    let range = SwitchAttrExtensionRange::new(options.switch_attr_end);
    let state = Arc::new(LocalHaState::new());
    for eni in &config.enis {
        let oid = vs.register_eni().map_err(DashHaOrchError::from)?;
        state.add_eni(eni.as_str(), oid);
    }

    let mut orch = DashHaOrch::new(
        DashHaOrchConfig::default().with_switch_id(vs.switch_id()),
        vs.clone(),
    );
    orch.set_callbacks(state.clone());
    orch.register_ha_scope_events(vs.as_ref())?;

    let audit_record = AuditRecord::new(AuditCategory::ConfigurationChange, "dashhaorch", "apply_config")
        .with_outcome(AuditOutcome::InProgress)
        .with_details(serde_json::json!({
            "enis": config.enis.len(),
            "ha_pairs": pair_entries.len(),
            "ha_sessions": session_entries.len(),
        }));
    audit_log!(audit_record);

    let mut errors = Vec::new();
    for (table, entries) in [
        (HaTable::Pair, pair_entries),
        (HaTable::Session, session_entries),
    ] {
        for (key, e) in orch.do_task(table, entries) {
            errors.push(EntryError {
                table: table.table_name(),
                key,
                error: e.to_string(),
            });
        }
    }
    let events = orch.process_ha_scope_events();
    info!(
        "Applied config: {} pairs, {} sessions, {} pending, {} errors, {} events",
        orch.pair_count(),
        orch.session_count(),
        orch.pending_count(),
        errors.len(),
        events
    );

    let counters = if options.dump_counters {
        let mut all = BTreeMap::new();
        for (key, _) in orch.sessions() {
            all.insert(key.clone(), orch.read_counters(key, false)?);
        }
        Some(all)
    } else {
        None
    };

    Ok(DashHaReport {
        switch_id: format!("0x{:x}", vs.switch_id().as_raw()),
        ha_scope_event_notify_attr: format!("0x{:x}", range.ha_scope_event_notify()),
        ha_pairs: orch
            .pairs()
            .map(|(k, info)| (k.clone(), PairReport::from(info)))
            .collect(),
        ha_sessions: orch
            .sessions()
            .map(|(k, info)| (k.clone(), SessionReport::from(info)))
            .collect(),
        pending: orch
            .pending_entries()
            .map(|(table, entry)| format!("{}:{}", table, entry.key))
            .collect(),
        errors,
        state: state.rows(),
        counters,
    })
}

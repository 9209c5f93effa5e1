//! Virtual DASH HA adapter.
//!
//! An in-memory [`DashHaApi`] implementation playing the role of SONiC's
//! virtual switch: it enforces the same metadata rules and device checks a
//! hardware adapter would and keeps per-session counters that tests can
//! drive through [`VirtualDashHa::increment_stat`] and
//! [`VirtualDashHa::record_latency`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use log::{debug, info, warn};

use crate::api::{DashHaApi, HaPairConfig, HaSessionConfig, StatsMode};
use crate::attr::{find_attr, AttrValue, SaiAttrId, SaiAttribute};
use crate::error::{SaiError, SaiResult};
use crate::meta;
use crate::schema::{
    DashHaPairAttr, DashHaRole, DashHaSessionAttr, DASH_HA_PAIR_SCHEMA, DASH_HA_SESSION_SCHEMA,
};
use crate::stats::{classify_stat_id, HaSessionStat, SaiStatId, StatBlock, StatIdClass, StatKind};
use crate::switch::{HaScopeEventData, HaScopeEventNotification, SwitchHaExtension};
use crate::types::{
    DashHaPairOid, DashHaSessionOid, DashObjectKind, EniOid, HaScopeOid, SwitchOid,
};

/// Latency samples of one ENI pipeline block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LatencyAccumulator {
    total_ns: u128,
    samples: u64,
    min_ns: Option<u64>,
    max_ns: Option<u64>,
}

impl LatencyAccumulator {
    fn record(&mut self, ns: u64) {
        self.total_ns += u128::from(ns);
        self.samples += 1;
        self.min_ns = Some(self.min_ns.map_or(ns, |m| m.min(ns)));
        self.max_ns = Some(self.max_ns.map_or(ns, |m| m.max(ns)));
    }

    fn read(&self, kind: StatKind) -> u64 {
        match kind {
            StatKind::AverageLatencyNs => {
                if self.samples == 0 {
                    0
                } else {
                    u64::try_from(self.total_ns / u128::from(self.samples)).unwrap_or(u64::MAX)
                }
            }
            StatKind::MinLatencyNs => self.min_ns.unwrap_or(0),
            StatKind::MaxLatencyNs => self.max_ns.unwrap_or(0),
            StatKind::Counter => 0,
        }
    }

    fn clear(&mut self, kind: StatKind) {
        match kind {
            StatKind::AverageLatencyNs => {
                self.total_ns = 0;
                self.samples = 0;
            }
            StatKind::MinLatencyNs => self.min_ns = None,
            StatKind::MaxLatencyNs => self.max_ns = None,
            StatKind::Counter => {}
        }
    }
}

#[derive(Debug)]
struct PairEntry {
    config: HaPairConfig,
    sessions: usize,
}

#[derive(Debug)]
struct SessionEntry {
    eni: EniOid,
    ha_pair: DashHaPairOid,
    role: DashHaRole,
    counters: HashMap<HaSessionStat, u64>,
    latency: HashMap<StatBlock, LatencyAccumulator>,
}

impl SessionEntry {
    fn read(&self, stat: HaSessionStat) -> u64 {
        let kind = stat.kind();
        if kind.is_latency() {
            self.latency
                .get(&stat.block())
                .map_or(0, |acc| acc.read(kind))
        } else {
            self.counters.get(&stat).copied().unwrap_or(0)
        }
    }

    fn clear(&mut self, stat: HaSessionStat) {
        let kind = stat.kind();
        if kind.is_latency() {
            if let Some(acc) = self.latency.get_mut(&stat.block()) {
                acc.clear(kind);
            }
        } else {
            self.counters.remove(&stat);
        }
    }
}

#[derive(Default)]
struct VsState {
    next_index: u64,
    enis: HashSet<EniOid>,
    pairs: HashMap<DashHaPairOid, PairEntry>,
    sessions: HashMap<DashHaSessionOid, SessionEntry>,
    eni_sessions: HashMap<EniOid, DashHaSessionOid>,
    ha_scope_notify: Option<HaScopeEventNotification>,
}

impl VsState {
    fn allocate(&mut self, kind: DashObjectKind) -> u64 {
        self.next_index += 1;
        kind.make_oid(self.next_index)
    }

    fn session_mut(&mut self, session: DashHaSessionOid) -> SaiResult<&mut SessionEntry> {
        self.sessions
            .get_mut(&session)
            .ok_or_else(|| SaiError::invalid_object_id(session.as_raw()))
    }
}

/// In-memory DASH HA adapter for a single switch.
pub struct VirtualDashHa {
    switch_id: SwitchOid,
    state: Mutex<VsState>,
}

impl VirtualDashHa {
    /// Creates an adapter with its own switch object.
    pub fn new() -> Self {
        Self {
            switch_id: SwitchOid::from_raw_unchecked(DashObjectKind::Switch.make_oid(1)),
            state: Mutex::new(VsState::default()),
        }
    }

    /// Returns the switch this adapter serves.
    pub fn switch_id(&self) -> SwitchOid {
        self.switch_id
    }

    fn lock(&self) -> SaiResult<MutexGuard<'_, VsState>> {
        self.state
            .lock()
            .map_err(|_| SaiError::internal("virtual adapter state poisoned"))
    }

    fn check_switch(&self, switch_id: SwitchOid) -> SaiResult<()> {
        if switch_id != self.switch_id {
            return Err(SaiError::invalid_object_id(switch_id.as_raw()));
        }
        Ok(())
    }

    /// Creates an ENI that HA sessions can bind to.
    pub fn register_eni(&self) -> SaiResult<EniOid> {
        let mut state = self.lock()?;
        let eni = EniOid::from_raw_unchecked(state.allocate(DashObjectKind::Eni));
        state.enis.insert(eni);
        debug!("Registered ENI {}", eni);
        Ok(eni)
    }

    /// Removes an ENI. Fails while an HA session is bound to it.
    pub fn unregister_eni(&self, eni: EniOid) -> SaiResult<()> {
        let mut state = self.lock()?;
        if !state.enis.contains(&eni) {
            return Err(SaiError::invalid_object_id(eni.as_raw()));
        }
        if let Some(session) = state.eni_sessions.get(&eni) {
            return Err(SaiError::object_in_use(format!(
                "ENI {} bound to HA session {}",
                eni, session
            )));
        }
        state.enis.remove(&eni);
        Ok(())
    }

    /// Number of live HA pairs.
    pub fn pair_count(&self) -> SaiResult<usize> {
        Ok(self.lock()?.pairs.len())
    }

    /// Number of live HA sessions.
    pub fn session_count(&self) -> SaiResult<usize> {
        Ok(self.lock()?.sessions.len())
    }

    /// Adds `delta` to an event counter of a session.
    pub fn increment_stat(
        &self,
        session: DashHaSessionOid,
        stat: HaSessionStat,
        delta: u64,
    ) -> SaiResult<()> {
        if stat.kind().is_latency() {
            return Err(SaiError::invalid_parameter(format!(
                "{} is a latency gauge, use record_latency",
                stat
            )));
        }
        let mut state = self.lock()?;
        let entry = state.session_mut(session)?;
        let counter = entry.counters.entry(stat).or_insert(0);
        *counter = counter.saturating_add(delta);
        Ok(())
    }

    /// Records one latency sample for an ENI pipeline block.
    pub fn record_latency(
        &self,
        session: DashHaSessionOid,
        block: StatBlock,
        latency_ns: u64,
    ) -> SaiResult<()> {
        if !block.is_eni_pipeline() {
            return Err(SaiError::invalid_parameter(format!(
                "{} has no latency gauges",
                block
            )));
        }
        let mut state = self.lock()?;
        let entry = state.session_mut(session)?;
        entry.latency.entry(block).or_default().record(latency_ns);
        Ok(())
    }

    fn resolve_stats(counter_ids: &[SaiStatId]) -> SaiResult<Vec<HaSessionStat>> {
        if counter_ids.is_empty() {
            return Err(SaiError::invalid_parameter("empty counter list"));
        }
        counter_ids
            .iter()
            .map(|id| match classify_stat_id(*id) {
                StatIdClass::Counter(stat) => Ok(stat),
                StatIdClass::Custom => Err(SaiError::not_supported(format!(
                    "custom HA session stat 0x{:x}",
                    id
                ))),
                StatIdClass::Marker | StatIdClass::Unknown => Err(SaiError::invalid_parameter(
                    format!("0x{:x} is not an HA session stat", id),
                )),
            })
            .collect()
    }

    fn check_pair_ranges(config: &HaPairConfig, attrs: &[SaiAttribute]) -> SaiResult<()> {
        let index_of = |attr: DashHaPairAttr| find_attr(attrs, attr.as_raw()).map_or(0, |(i, _)| i);

        if !config.npu_tunnel_src_ports.is_valid() {
            return Err(SaiError::invalid_attr_value(
                index_of(DashHaPairAttr::NpuTunnelSrcPortMax),
                format!(
                    "NPU tunnel source port max {} below min {}",
                    config.npu_tunnel_src_ports.max, config.npu_tunnel_src_ports.min
                ),
            ));
        }
        if !config.dp_channel_src_ports.is_valid() {
            return Err(SaiError::invalid_attr_value(
                index_of(DashHaPairAttr::DpChannelSrcPortMax),
                format!(
                    "DP channel source port max {} below min {}",
                    config.dp_channel_src_ports.max, config.dp_channel_src_ports.min
                ),
            ));
        }
        if config.dp_channel_probe_interval_ms == 0 {
            return Err(SaiError::invalid_attr_value(
                index_of(DashHaPairAttr::DpChannelProbeIntervalInMs),
                "DP channel probe interval must be non-zero",
            ));
        }
        Ok(())
    }
}

impl Default for VirtualDashHa {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for VirtualDashHa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("VirtualDashHa");
        s.field("switch_id", &self.switch_id);
        match self.state.lock() {
            Ok(state) => s
                .field("enis", &state.enis.len())
                .field("pairs", &state.pairs.len())
                .field("sessions", &state.sessions.len())
                .field("ha_scope_notify", &state.ha_scope_notify.is_some()),
            Err(_) => s.field("state", &"<poisoned>"),
        };
        s.finish()
    }
}

impl DashHaApi for VirtualDashHa {
    fn create_dash_ha_pair(
        &self,
        switch_id: SwitchOid,
        attrs: &[SaiAttribute],
    ) -> SaiResult<DashHaPairOid> {
        self.check_switch(switch_id)?;
        meta::validate_create(&DASH_HA_PAIR_SCHEMA, attrs)?;
        let config = HaPairConfig::from_attributes(attrs)?;
        Self::check_pair_ranges(&config, attrs)?;

        let mut state = self.lock()?;
        let pair = DashHaPairOid::from_raw_unchecked(state.allocate(DashObjectKind::DashHaPair));
        info!(
            "Created HA pair {} peer DPU {} / {}",
            pair, config.peer_dpu_ipv4, config.peer_dpu_ipv6
        );
        state.pairs.insert(
            pair,
            PairEntry {
                config,
                sessions: 0,
            },
        );
        Ok(pair)
    }

    fn remove_dash_ha_pair(&self, pair: DashHaPairOid) -> SaiResult<()> {
        let mut state = self.lock()?;
        let entry = state
            .pairs
            .get(&pair)
            .ok_or_else(|| SaiError::invalid_object_id(pair.as_raw()))?;
        if entry.sessions > 0 {
            warn!(
                "HA pair {} still referenced by {} session(s)",
                pair, entry.sessions
            );
            return Err(SaiError::object_in_use(format!(
                "HA pair {} referenced by {} session(s)",
                pair, entry.sessions
            )));
        }
        state.pairs.remove(&pair);
        info!("Removed HA pair {}", pair);
        Ok(())
    }

    fn set_dash_ha_pair_attribute(&self, pair: DashHaPairOid, attr: &SaiAttribute) -> SaiResult<()> {
        let state = self.lock()?;
        if !state.pairs.contains_key(&pair) {
            return Err(SaiError::invalid_object_id(pair.as_raw()));
        }
        // Every pair attribute is create-only, so validation rejects all of
        // them; the status depends on whether the id is known.
        meta::validate_set(&DASH_HA_PAIR_SCHEMA, attr).map(|_| ())
    }

    fn get_dash_ha_pair_attribute(
        &self,
        pair: DashHaPairOid,
        ids: &[SaiAttrId],
    ) -> SaiResult<Vec<SaiAttribute>> {
        let state = self.lock()?;
        let entry = state
            .pairs
            .get(&pair)
            .ok_or_else(|| SaiError::invalid_object_id(pair.as_raw()))?;
        meta::validate_get(&DASH_HA_PAIR_SCHEMA, ids)?;

        let all = entry.config.to_attributes();
        ids.iter()
            .map(|id| {
                find_attr(&all, *id)
                    .map(|(_, a)| *a)
                    .ok_or_else(|| SaiError::internal(format!("pair attribute 0x{:x} not stored", id)))
            })
            .collect()
    }

    fn create_dash_ha_session(
        &self,
        switch_id: SwitchOid,
        attrs: &[SaiAttribute],
    ) -> SaiResult<DashHaSessionOid> {
        self.check_switch(switch_id)?;
        meta::validate_create(&DASH_HA_SESSION_SCHEMA, attrs)?;
        let config = HaSessionConfig::from_attributes(attrs)?;

        let mut state = self.lock()?;
        if !state.enis.contains(&config.eni) {
            return Err(SaiError::invalid_object_id(config.eni.as_raw()));
        }
        if !state.pairs.contains_key(&config.ha_pair) {
            return Err(SaiError::invalid_object_id(config.ha_pair.as_raw()));
        }
        if let Some(existing) = state.eni_sessions.get(&config.eni) {
            return Err(SaiError::already_exists(format!(
                "HA session {} for ENI {}",
                existing, config.eni
            )));
        }

        let session =
            DashHaSessionOid::from_raw_unchecked(state.allocate(DashObjectKind::DashHaSession));
        let role = config.role.unwrap_or_default();
        state.sessions.insert(
            session,
            SessionEntry {
                eni: config.eni,
                ha_pair: config.ha_pair,
                role,
                counters: HashMap::new(),
                latency: HashMap::new(),
            },
        );
        state.eni_sessions.insert(config.eni, session);
        if let Some(pair) = state.pairs.get_mut(&config.ha_pair) {
            pair.sessions += 1;
        }
        info!(
            "Created HA session {} ENI {} pair {} role {}",
            session, config.eni, config.ha_pair, role
        );
        Ok(session)
    }

    fn remove_dash_ha_session(&self, session: DashHaSessionOid) -> SaiResult<()> {
        let mut state = self.lock()?;
        let entry = state
            .sessions
            .remove(&session)
            .ok_or_else(|| SaiError::invalid_object_id(session.as_raw()))?;
        state.eni_sessions.remove(&entry.eni);
        if let Some(pair) = state.pairs.get_mut(&entry.ha_pair) {
            pair.sessions = pair.sessions.saturating_sub(1);
        }
        info!("Removed HA session {}", session);
        Ok(())
    }

    fn set_dash_ha_session_attribute(
        &self,
        session: DashHaSessionOid,
        attr: &SaiAttribute,
    ) -> SaiResult<()> {
        let (event, notify) = {
            let mut state = self.lock()?;
            let entry = state.session_mut(session)?;
            meta::validate_set(&DASH_HA_SESSION_SCHEMA, attr)?;

            let role = attr
                .value
                .as_s32()
                .and_then(DashHaRole::from_raw)
                .ok_or_else(|| SaiError::invalid_attr_value(0, "invalid HA role"))?;
            if entry.role == role {
                return Ok(());
            }
            info!(
                "HA session {} role {} -> {}",
                session, entry.role, role
            );
            entry.role = role;

            let event = HaScopeEventData::state_changed(
                HaScopeOid::from_raw_unchecked(session.as_raw()),
                vec![DashHaSessionAttr::HaRole.attr(AttrValue::S32(role.as_raw()))],
            );
            (event, state.ha_scope_notify.clone())
        };

        if let Some(notify) = notify {
            debug!("Emitting {} for {}", event.event_type, event.ha_scope_id);
            notify(std::slice::from_ref(&event));
        }
        Ok(())
    }

    fn get_dash_ha_session_attribute(
        &self,
        session: DashHaSessionOid,
        ids: &[SaiAttrId],
    ) -> SaiResult<Vec<SaiAttribute>> {
        let state = self.lock()?;
        let entry = state
            .sessions
            .get(&session)
            .ok_or_else(|| SaiError::invalid_object_id(session.as_raw()))?;
        meta::validate_get(&DASH_HA_SESSION_SCHEMA, ids)?;

        Ok(ids
            .iter()
            .filter_map(|id| DashHaSessionAttr::from_raw(*id))
            .map(|attr| match attr {
                DashHaSessionAttr::EniId => attr.attr(AttrValue::ObjectId(entry.eni.as_raw())),
                DashHaSessionAttr::HaPairId => {
                    attr.attr(AttrValue::ObjectId(entry.ha_pair.as_raw()))
                }
                DashHaSessionAttr::HaRole => attr.attr(AttrValue::S32(entry.role.as_raw())),
            })
            .collect())
    }

    fn get_ha_session_stats_ext(
        &self,
        session: DashHaSessionOid,
        counter_ids: &[SaiStatId],
        mode: StatsMode,
    ) -> SaiResult<Vec<u64>> {
        if mode.is_bulk() {
            return Err(SaiError::not_supported(format!("{} on HA session stats", mode)));
        }
        let stats = Self::resolve_stats(counter_ids)?;

        let mut state = self.lock()?;
        let entry = state.session_mut(session)?;
        let values: Vec<u64> = stats.iter().map(|s| entry.read(*s)).collect();
        if mode.clears() {
            for stat in &stats {
                entry.clear(*stat);
            }
        }
        Ok(values)
    }

    fn clear_ha_session_stats(
        &self,
        session: DashHaSessionOid,
        counter_ids: &[SaiStatId],
    ) -> SaiResult<()> {
        let stats = Self::resolve_stats(counter_ids)?;
        let mut state = self.lock()?;
        let entry = state.session_mut(session)?;
        for stat in stats {
            entry.clear(stat);
        }
        debug!("Cleared {} counter(s) on HA session {}", counter_ids.len(), session);
        Ok(())
    }
}

impl SwitchHaExtension for VirtualDashHa {
    fn set_ha_scope_event_notify(
        &self,
        switch_id: SwitchOid,
        notify: Option<HaScopeEventNotification>,
    ) -> SaiResult<()> {
        self.check_switch(switch_id)?;
        let mut state = self.lock()?;
        info!(
            "HA scope event notification {} on switch {}",
            if notify.is_some() { "registered" } else { "cleared" },
            switch_id
        );
        state.ha_scope_notify = notify;
        Ok(())
    }

    fn has_ha_scope_event_notify(&self, switch_id: SwitchOid) -> SaiResult<bool> {
        self.check_switch(switch_id)?;
        Ok(self.lock()?.ha_scope_notify.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_accumulator() {
        let mut acc = LatencyAccumulator::default();
        assert_eq!(acc.read(StatKind::AverageLatencyNs), 0);
        assert_eq!(acc.read(StatKind::MinLatencyNs), 0);

        for ns in [300, 100, 200] {
            acc.record(ns);
        }
        assert_eq!(acc.read(StatKind::AverageLatencyNs), 200);
        assert_eq!(acc.read(StatKind::MinLatencyNs), 100);
        assert_eq!(acc.read(StatKind::MaxLatencyNs), 300);

        acc.clear(StatKind::MinLatencyNs);
        assert_eq!(acc.read(StatKind::MinLatencyNs), 0);
        assert_eq!(acc.read(StatKind::MaxLatencyNs), 300);
        acc.record(50);
        assert_eq!(acc.read(StatKind::MinLatencyNs), 50);
        assert_eq!(acc.read(StatKind::AverageLatencyNs), 162);
    }

    #[test]
    fn test_resolve_stats() {
        assert_eq!(
            VirtualDashHa::resolve_stats(&[0x10000, 0x30106]).unwrap(),
            vec![
                HaSessionStat::N2dPacketsIn,
                HaSessionStat::InlineFlowCreationAverageLatencyInNs
            ]
        );
        assert!(matches!(
            VirtualDashHa::resolve_stats(&[]),
            Err(SaiError::InvalidParameter { .. })
        ));
        assert!(matches!(
            VirtualDashHa::resolve_stats(&[0x20000]),
            Err(SaiError::InvalidParameter { .. })
        ));
        assert!(matches!(
            VirtualDashHa::resolve_stats(&[0x10000, 0x1000_0000]),
            Err(SaiError::NotSupported { .. })
        ));
    }

    #[test]
    fn test_foreign_switch_rejected() {
        let vs = VirtualDashHa::new();
        let other = SwitchOid::from_raw_unchecked(DashObjectKind::Switch.make_oid(99));
        let err = vs.create_dash_ha_session(other, &[]).unwrap_err();
        assert_eq!(err, SaiError::invalid_object_id(other.as_raw()));
        assert!(vs.set_ha_scope_event_notify(other, None).is_err());
    }
}

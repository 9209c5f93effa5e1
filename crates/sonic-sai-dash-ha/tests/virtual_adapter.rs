//! Behavior of the virtual DASH HA adapter through the public API.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use sonic_sai_dash_ha::api::PortRange;
use sonic_sai_dash_ha::{
    AttrValue, DashHaApi, DashHaApiExt, DashHaPairAttr, DashHaPairOid, DashHaRole,
    DashHaSessionAttr, DashHaSessionOid, EniOid, HaPairConfig, HaScopeEvent, HaScopeEventData,
    HaSessionConfig, HaSessionStat, SaiAttribute, SaiStatus, StatBlock, StatsMode, SwitchHaExtension,
    VirtualDashHa,
};

fn pair_config() -> HaPairConfig {
    HaPairConfig {
        peer_dpu_ipv4: Ipv4Addr::new(10, 1, 0, 2),
        peer_dpu_ipv6: "fd00:1::2".parse().unwrap(),
        peer_npu_ipv4: Ipv4Addr::new(10, 2, 0, 2),
        peer_npu_ipv6: Ipv6Addr::LOCALHOST,
        npu_tunnel_dst_port: 4789,
        npu_tunnel_src_ports: PortRange::new(49152, 53247),
        dp_channel_dst_port: 4790,
        dp_channel_src_ports: PortRange::new(53248, 57343),
        dp_channel_probe_interval_ms: 100,
    }
}

struct Fixture {
    vs: VirtualDashHa,
    eni: EniOid,
    pair: DashHaPairOid,
}

impl Fixture {
    fn new() -> Self {
        let vs = VirtualDashHa::new();
        let eni = vs.register_eni().unwrap();
        let pair = vs.create_ha_pair(vs.switch_id(), &pair_config()).unwrap();
        Self { vs, eni, pair }
    }

    fn session(&self) -> DashHaSessionOid {
        self.vs
            .create_ha_session(self.vs.switch_id(), &HaSessionConfig::new(self.eni, self.pair))
            .unwrap()
    }
}

#[test]
fn test_pair_get_returns_created_values() {
    let fx = Fixture::new();
    assert_eq!(fx.vs.get_ha_pair(fx.pair).unwrap(), pair_config());

    let attrs = fx
        .vs
        .get_dash_ha_pair_attribute(
            fx.pair,
            &[
                DashHaPairAttr::DpChannelProbeIntervalInMs.as_raw(),
                DashHaPairAttr::PeerDpuIpv4.as_raw(),
            ],
        )
        .unwrap();
    assert_eq!(attrs[0].value, AttrValue::U32(100));
    assert_eq!(attrs[1].value, AttrValue::Ip4(Ipv4Addr::new(10, 1, 0, 2)));
}

#[test]
fn test_pair_attributes_are_create_only() {
    let fx = Fixture::new();
    for attr in DashHaPairAttr::ALL {
        let value = fx.vs.get_dash_ha_pair_attribute(fx.pair, &[attr.as_raw()]).unwrap()[0];
        let err = fx.vs.set_dash_ha_pair_attribute(fx.pair, &value).unwrap_err();
        assert_eq!(err.status(), SaiStatus::InvalidParameter, "{}", attr.sai_name());
    }

    let unknown = SaiAttribute::new(DashHaPairAttr::ALL.len() as u32, AttrValue::U16(1));
    let err = fx.vs.set_dash_ha_pair_attribute(fx.pair, &unknown).unwrap_err();
    assert_eq!(err.status(), SaiStatus::UnknownAttribute(0));
}

#[test]
fn test_pair_device_checks() {
    let vs = VirtualDashHa::new();

    let mut config = pair_config();
    config.npu_tunnel_src_ports = PortRange::new(2000, 1000);
    let err = vs.create_ha_pair(vs.switch_id(), &config).unwrap_err();
    assert_eq!(
        err.status(),
        SaiStatus::InvalidAttrValue(DashHaPairAttr::NpuTunnelSrcPortMax.as_raw() as u16)
    );

    let mut config = pair_config();
    config.dp_channel_src_ports = PortRange::new(2000, 1000);
    let err = vs.create_ha_pair(vs.switch_id(), &config).unwrap_err();
    assert_eq!(err.status(), SaiStatus::InvalidAttrValue(9));

    let mut config = pair_config();
    config.dp_channel_probe_interval_ms = 0;
    let err = vs.create_ha_pair(vs.switch_id(), &config).unwrap_err();
    assert_eq!(err.status(), SaiStatus::InvalidAttrValue(10));

    // Equal bounds are a one-port range.
    let mut config = pair_config();
    config.npu_tunnel_src_ports = PortRange::new(5000, 5000);
    assert!(vs.create_ha_pair(vs.switch_id(), &config).is_ok());
    assert_eq!(vs.pair_count().unwrap(), 1);
}

#[test]
fn test_session_role_defaults_to_dead_and_is_settable() {
    let fx = Fixture::new();
    let session = fx.session();

    let config = fx.vs.get_ha_session(session).unwrap();
    assert_eq!(config.eni, fx.eni);
    assert_eq!(config.ha_pair, fx.pair);
    assert_eq!(config.role, Some(DashHaRole::Dead));

    for role in DashHaRole::ALL {
        fx.vs.set_ha_role(session, role).unwrap();
        assert_eq!(fx.vs.get_ha_role(session).unwrap(), role);
    }

    let err = fx
        .vs
        .set_dash_ha_session_attribute(session, &DashHaSessionAttr::HaRole.attr(AttrValue::S32(7)))
        .unwrap_err();
    assert_eq!(err.status(), SaiStatus::InvalidAttrValue(0));

    let err = fx
        .vs
        .set_dash_ha_session_attribute(
            session,
            &DashHaSessionAttr::HaPairId.attr(AttrValue::ObjectId(fx.pair.as_raw())),
        )
        .unwrap_err();
    assert_eq!(err.status(), SaiStatus::InvalidParameter);
}

#[test]
fn test_session_create_with_explicit_role() {
    let fx = Fixture::new();
    let session = fx
        .vs
        .create_ha_session(
            fx.vs.switch_id(),
            &HaSessionConfig::new(fx.eni, fx.pair).with_role(DashHaRole::Standby),
        )
        .unwrap();
    assert_eq!(fx.vs.get_ha_role(session).unwrap(), DashHaRole::Standby);
}

#[test]
fn test_session_references() {
    let fx = Fixture::new();

    let missing_pair = DashHaPairOid::from_raw(0x2_0000_0000_00ff).unwrap();
    let err = fx
        .vs
        .create_ha_session(fx.vs.switch_id(), &HaSessionConfig::new(fx.eni, missing_pair))
        .unwrap_err();
    assert_eq!(err.status(), SaiStatus::InvalidObjectId);

    let session = fx.session();
    let err = fx
        .vs
        .create_ha_session(fx.vs.switch_id(), &HaSessionConfig::new(fx.eni, fx.pair))
        .unwrap_err();
    assert_eq!(err.status(), SaiStatus::ItemAlreadyExists);

    let err = fx.vs.remove_dash_ha_pair(fx.pair).unwrap_err();
    assert_eq!(err.status(), SaiStatus::ObjectInUse);
    let err = fx.vs.unregister_eni(fx.eni).unwrap_err();
    assert_eq!(err.status(), SaiStatus::ObjectInUse);

    fx.vs.remove_dash_ha_session(session).unwrap();
    fx.vs.remove_dash_ha_pair(fx.pair).unwrap();
    fx.vs.unregister_eni(fx.eni).unwrap();

    let err = fx.vs.remove_dash_ha_session(session).unwrap_err();
    assert_eq!(err.status(), SaiStatus::InvalidObjectId);
    let err = fx.vs.get_ha_pair(fx.pair).unwrap_err();
    assert_eq!(err.status(), SaiStatus::InvalidObjectId);
    assert_eq!(fx.vs.session_count().unwrap(), 0);
}

#[test]
fn test_counters_read_and_clear() {
    let fx = Fixture::new();
    let session = fx.session();

    fx.vs
        .increment_stat(session, HaSessionStat::N2dPacketsIn, 10)
        .unwrap();
    fx.vs
        .increment_stat(session, HaSessionStat::N2dPacketsIn, 5)
        .unwrap();
    fx.vs
        .increment_stat(session, HaSessionStat::D2dProbePacketsOut, 3)
        .unwrap();

    let stats = [HaSessionStat::N2dPacketsIn, HaSessionStat::D2dProbePacketsOut];
    assert_eq!(
        fx.vs
            .get_session_counters(session, &stats, StatsMode::Read)
            .unwrap(),
        vec![
            (HaSessionStat::N2dPacketsIn, 15),
            (HaSessionStat::D2dProbePacketsOut, 3)
        ]
    );

    let ids: Vec<u32> = stats.iter().map(|s| s.as_raw()).collect();
    assert_eq!(
        fx.vs
            .get_ha_session_stats_ext(session, &ids, StatsMode::ReadAndClear)
            .unwrap(),
        vec![15, 3]
    );
    assert_eq!(fx.vs.get_ha_session_stats(session, &ids).unwrap(), vec![0, 0]);

    fx.vs
        .increment_stat(session, HaSessionStat::N2dPacketsIn, 1)
        .unwrap();
    fx.vs
        .clear_session_counters(session, &[HaSessionStat::N2dPacketsIn])
        .unwrap();
    assert_eq!(fx.vs.get_ha_session_stats(session, &ids[..1]).unwrap(), vec![0]);
}

#[test]
fn test_latency_gauges() {
    let fx = Fixture::new();
    let session = fx.session();

    for ns in [1_000, 4_000, 7_000] {
        fx.vs
            .record_latency(session, StatBlock::InlineFlowCreation, ns)
            .unwrap();
    }
    let stats = [
        HaSessionStat::InlineFlowCreationAverageLatencyInNs,
        HaSessionStat::InlineFlowCreationMinLatencyInNs,
        HaSessionStat::InlineFlowCreationMaxLatencyInNs,
        HaSessionStat::FlowAgingAverageLatencyInNs,
    ];
    let values: Vec<u64> = fx
        .vs
        .get_session_counters(session, &stats, StatsMode::Read)
        .unwrap()
        .into_iter()
        .map(|(_, v)| v)
        .collect();
    assert_eq!(values, vec![4_000, 1_000, 7_000, 0]);

    let err = fx
        .vs
        .record_latency(session, StatBlock::N2dTunnel, 10)
        .unwrap_err();
    assert_eq!(err.status(), SaiStatus::InvalidParameter);
    let err = fx
        .vs
        .increment_stat(session, HaSessionStat::FlowAgingMaxLatencyInNs, 1)
        .unwrap_err();
    assert_eq!(err.status(), SaiStatus::InvalidParameter);
}

#[test]
fn test_stat_id_errors() {
    let fx = Fixture::new();
    let session = fx.session();

    let err = fx
        .vs
        .get_ha_session_stats(session, &[0x1000_0000])
        .unwrap_err();
    assert_eq!(err.status(), SaiStatus::NotSupported);

    let err = fx.vs.get_ha_session_stats(session, &[0x20000]).unwrap_err();
    assert_eq!(err.status(), SaiStatus::InvalidParameter);

    let err = fx.vs.get_ha_session_stats(session, &[]).unwrap_err();
    assert_eq!(err.status(), SaiStatus::InvalidParameter);

    let err = fx
        .vs
        .get_ha_session_stats_ext(session, &[0x10000], StatsMode::BulkRead)
        .unwrap_err();
    assert_eq!(err.status(), SaiStatus::NotSupported);
}

#[test]
fn test_role_change_emits_one_event() {
    let fx = Fixture::new();
    let session = fx.session();

    let events: Arc<Mutex<Vec<HaScopeEventData>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    fx.vs
        .set_ha_scope_event_notify(
            fx.vs.switch_id(),
            Some(Arc::new(move |batch: &[HaScopeEventData]| {
                sink.lock().unwrap().extend_from_slice(batch);
            })),
        )
        .unwrap();
    assert!(fx.vs.has_ha_scope_event_notify(fx.vs.switch_id()).unwrap());

    fx.vs.set_ha_role(session, DashHaRole::Active).unwrap();
    // Same role again: no state change.
    fx.vs.set_ha_role(session, DashHaRole::Active).unwrap();

    let received = events.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].event_type, HaScopeEvent::StateChanged);
    assert_eq!(received[0].ha_scope_id.as_raw(), session.as_raw());
    assert_eq!(
        received[0].attrs,
        vec![DashHaSessionAttr::HaRole.attr(AttrValue::S32(DashHaRole::Active.as_raw()))]
    );

    fx.vs
        .set_ha_scope_event_notify(fx.vs.switch_id(), None)
        .unwrap();
    fx.vs.set_ha_role(session, DashHaRole::Standby).unwrap();
    assert_eq!(events.lock().unwrap().len(), 1);
}

#[test]
fn test_callback_may_reenter_adapter() {
    let fx = Arc::new(Fixture::new());
    let session = fx.session();

    let seen = Arc::new(Mutex::new(None));
    let (fx2, seen2) = (fx.clone(), seen.clone());
    fx.vs
        .set_ha_scope_event_notify(
            fx.vs.switch_id(),
            Some(Arc::new(move |batch: &[HaScopeEventData]| {
                let id = DashHaSessionOid::from_raw_unchecked(batch[0].ha_scope_id.as_raw());
                *seen2.lock().unwrap() = fx2.vs.get_ha_role(id).ok();
            })),
        )
        .unwrap();

    fx.vs.set_ha_role(session, DashHaRole::Standalone).unwrap();
    assert_eq!(*seen.lock().unwrap(), Some(DashHaRole::Standalone));
}

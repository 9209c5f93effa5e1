//! The exported C method table, driven through the foreign wrapper.
//!
//! The exported entries share one process-wide slot, so every test here is
//! serialized.

use std::ffi::c_void;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::ptr;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use once_cell::sync::Lazy;
use pretty_assertions::assert_eq;
use serial_test::serial;
use sonic_sai_dash_ha::api::PortRange;
use sonic_sai_dash_ha::ffi::types::{attr_from_raw, sai_attribute_value_t, sai_dash_ha_api_t};
use sonic_sai_dash_ha::ffi::{
    dash_ha_api_table, install_dash_ha_api, is_dash_ha_api_installed, sai_attribute_t,
    sai_dash_ha_api_query, sai_dash_ha_set_switch_attribute, sai_ha_scope_event_data_t,
    uninstall_dash_ha_api, ForeignDashHaApi,
};
use sonic_sai_dash_ha::schema::DASH_HA_SESSION_SCHEMA;
use sonic_sai_dash_ha::{
    AttrValue, DashHaApi, DashHaApiExt, DashHaRole, DashHaSessionAttr, HaPairConfig, HaScopeEvent,
    HaScopeEventData, HaSessionConfig, HaSessionStat, SaiStatus, StatsMode,
    SwitchAttrExtensionRange, SwitchHaExtension, VirtualDashHa,
};

const SWITCH_ATTR_END: u32 = 0x0000_0200;

fn install() -> Arc<VirtualDashHa> {
    let vs = Arc::new(VirtualDashHa::new());
    install_dash_ha_api(vs.clone(), SwitchAttrExtensionRange::new(SWITCH_ATTR_END));
    vs
}

fn foreign() -> ForeignDashHaApi {
    let mut table: *const sai_dash_ha_api_t = ptr::null();
    let status = unsafe { sai_dash_ha_api_query(&mut table) };
    assert_eq!(status, SaiStatus::Success.as_raw());
    unsafe { ForeignDashHaApi::from_table(*table) }
}

fn pair_config() -> HaPairConfig {
    HaPairConfig {
        peer_dpu_ipv4: Ipv4Addr::new(192, 168, 0, 2),
        peer_dpu_ipv6: Ipv6Addr::new(0xfd00, 0, 0, 0, 0, 0, 0, 2),
        peer_npu_ipv4: Ipv4Addr::new(192, 168, 1, 2),
        peer_npu_ipv6: Ipv6Addr::new(0xfd00, 1, 0, 0, 0, 0, 0, 2),
        npu_tunnel_dst_port: 4789,
        npu_tunnel_src_ports: PortRange::new(1000, 2000),
        dp_channel_dst_port: 4790,
        dp_channel_src_ports: PortRange::new(3000, 4000),
        dp_channel_probe_interval_ms: 250,
    }
}

#[test]
#[serial]
fn test_query_requires_installed_adapter() {
    uninstall_dash_ha_api();
    let mut table: *const sai_dash_ha_api_t = ptr::null();
    assert_eq!(
        unsafe { sai_dash_ha_api_query(&mut table) },
        SaiStatus::Uninitialized.as_raw()
    );
    assert_eq!(
        unsafe { sai_dash_ha_api_query(ptr::null_mut()) },
        SaiStatus::InvalidParameter.as_raw()
    );

    // The table itself is static; its entries report the missing adapter.
    let remove = dash_ha_api_table().remove_dash_ha_pair.unwrap();
    assert_eq!(unsafe { remove(1) }, SaiStatus::Uninitialized.as_raw());
}

#[test]
#[serial]
fn test_round_trip_through_c_table() {
    let vs = install();
    let api = foreign();
    let switch = vs.switch_id();
    let eni = vs.register_eni().unwrap();

    let pair = api.create_ha_pair(switch, &pair_config()).unwrap();
    assert_eq!(api.get_ha_pair(pair).unwrap(), pair_config());

    let session = api
        .create_ha_session(switch, &HaSessionConfig::new(eni, pair))
        .unwrap();
    assert_eq!(api.get_ha_role(session).unwrap(), DashHaRole::Dead);
    api.set_ha_role(session, DashHaRole::SwitchingToActive).unwrap();
    assert_eq!(vs.get_ha_role(session).unwrap(), DashHaRole::SwitchingToActive);

    vs.increment_stat(session, HaSessionStat::N2dBytesIn, 1500).unwrap();
    let ids = [HaSessionStat::N2dBytesIn.as_raw()];
    assert_eq!(api.get_ha_session_stats(session, &ids).unwrap(), vec![1500]);
    assert_eq!(
        api.get_ha_session_stats_ext(session, &ids, StatsMode::ReadAndClear)
            .unwrap(),
        vec![1500]
    );
    assert_eq!(api.get_ha_session_stats(session, &ids).unwrap(), vec![0]);
    vs.increment_stat(session, HaSessionStat::N2dBytesIn, 7).unwrap();
    api.clear_ha_session_stats(session, &ids).unwrap();
    assert_eq!(vs.get_ha_session_stats(session, &ids).unwrap(), vec![0]);

    assert_eq!(
        api.remove_dash_ha_pair(pair).unwrap_err().status(),
        SaiStatus::ObjectInUse
    );
    api.remove_dash_ha_session(session).unwrap();
    api.remove_dash_ha_pair(pair).unwrap();

    uninstall_dash_ha_api();
}

#[test]
#[serial]
fn test_statuses_cross_the_boundary() {
    let vs = install();
    let api = foreign();

    let mut attrs = pair_config().to_attributes();
    attrs.remove(3);
    assert_eq!(
        api.create_dash_ha_pair(vs.switch_id(), &attrs)
            .unwrap_err()
            .status(),
        SaiStatus::MandatoryAttributeMissing
    );

    let mut config = pair_config();
    config.dp_channel_probe_interval_ms = 0;
    assert_eq!(
        api.create_ha_pair(vs.switch_id(), &config).unwrap_err().status(),
        SaiStatus::InvalidAttrValue(10)
    );

    let create = dash_ha_api_table().create_dash_ha_pair.unwrap();
    let raw: Vec<sai_attribute_t> = Vec::new();
    assert_eq!(
        unsafe { create(ptr::null_mut(), vs.switch_id().as_raw(), 0, raw.as_ptr()) },
        SaiStatus::InvalidParameter.as_raw()
    );

    let get_ext = dash_ha_api_table().get_ha_session_stats_ext.unwrap();
    let mut out = [0u64; 1];
    let id = HaSessionStat::N2dPacketsIn.as_raw();
    assert_eq!(
        unsafe { get_ext(1, 1, &id, 3, out.as_mut_ptr()) },
        SaiStatus::InvalidParameter.as_raw()
    );

    uninstall_dash_ha_api();
}

static EVENTS: Lazy<Mutex<Vec<(i32, u64, Vec<AttrValue>)>>> = Lazy::new(|| Mutex::new(Vec::new()));

unsafe extern "C" fn on_ha_scope_event(count: u32, data: *const sai_ha_scope_event_data_t) {
    let events = std::slice::from_raw_parts(data, count as usize);
    let mut sink = EVENTS.lock().unwrap();
    for event in events {
        let attrs = std::slice::from_raw_parts(event.attr, event.attr_count as usize);
        let values = attrs
            .iter()
            .enumerate()
            .map(|(i, a)| attr_from_raw(&DASH_HA_SESSION_SCHEMA, i, a).unwrap().value)
            .collect();
        sink.push((event.event_type, event.ha_scope_id, values));
    }
}

fn notify_attr(ptr: *mut c_void) -> sai_attribute_t {
    let mut value = sai_attribute_value_t::default();
    value.ptr = ptr;
    sai_attribute_t {
        id: SwitchAttrExtensionRange::new(SWITCH_ATTR_END).ha_scope_event_notify(),
        value,
    }
}

#[test]
#[serial]
fn test_ha_scope_callback_through_switch_attribute() {
    EVENTS.lock().unwrap().clear();
    let vs = install();
    let switch = vs.switch_id().as_raw();

    let callback: unsafe extern "C" fn(u32, *const sai_ha_scope_event_data_t) = on_ha_scope_event;
    let attr = notify_attr(callback as *mut c_void);
    assert_eq!(
        unsafe { sai_dash_ha_set_switch_attribute(switch, &attr) },
        SaiStatus::Success.as_raw()
    );
    assert!(vs.has_ha_scope_event_notify(vs.switch_id()).unwrap());

    let eni = vs.register_eni().unwrap();
    let pair = vs.create_ha_pair(vs.switch_id(), &pair_config()).unwrap();
    let session = vs
        .create_ha_session(vs.switch_id(), &HaSessionConfig::new(eni, pair))
        .unwrap();
    vs.set_ha_role(session, DashHaRole::Active).unwrap();

    assert_eq!(
        *EVENTS.lock().unwrap(),
        vec![(0, session.as_raw(), vec![AttrValue::S32(1)])]
    );

    let clear = notify_attr(ptr::null_mut());
    assert_eq!(
        unsafe { sai_dash_ha_set_switch_attribute(switch, &clear) },
        SaiStatus::Success.as_raw()
    );
    assert!(!vs.has_ha_scope_event_notify(vs.switch_id()).unwrap());

    let mut unknown = notify_attr(ptr::null_mut());
    unknown.id += 1;
    assert_eq!(
        unsafe { sai_dash_ha_set_switch_attribute(switch, &unknown) },
        SaiStatus::UnknownAttribute(0).as_raw()
    );

    uninstall_dash_ha_api();
}

static REENTERED: Lazy<Mutex<Vec<(i32, i32)>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Reads the role back through the table, uninstalls the adapter, then
/// tries again.
unsafe extern "C" fn on_event_reenter(count: u32, data: *const sai_ha_scope_event_data_t) {
    let table = dash_ha_api_table();
    let get = table.get_dash_ha_session_attribute.unwrap();
    for event in std::slice::from_raw_parts(data, count as usize) {
        let mut attr = sai_attribute_t::request(DashHaSessionAttr::HaRole.as_raw());
        let status = get(event.ha_scope_id, 1, &mut attr);
        REENTERED.lock().unwrap().push((status, attr.value.s32));

        uninstall_dash_ha_api();
        let mut attr = sai_attribute_t::request(DashHaSessionAttr::HaRole.as_raw());
        let status = get(event.ha_scope_id, 1, &mut attr);
        REENTERED.lock().unwrap().push((status, -1));
    }
}

#[test]
#[serial]
fn test_callback_may_reenter_table() {
    REENTERED.lock().unwrap().clear();
    let vs = install();
    let switch = vs.switch_id().as_raw();
    let callback: unsafe extern "C" fn(u32, *const sai_ha_scope_event_data_t) = on_event_reenter;
    let attr = notify_attr(callback as *mut c_void);
    assert_eq!(
        unsafe { sai_dash_ha_set_switch_attribute(switch, &attr) },
        SaiStatus::Success.as_raw()
    );

    let eni = vs.register_eni().unwrap();
    let pair = vs.create_ha_pair(vs.switch_id(), &pair_config()).unwrap();
    let session = vs
        .create_ha_session(vs.switch_id(), &HaSessionConfig::new(eni, pair))
        .unwrap();

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let api = foreign();
        let _ = tx.send(api.set_ha_role(session, DashHaRole::Active));
    });
    let result = rx
        .recv_timeout(Duration::from_secs(10))
        .expect("set_ha_role through the C table did not return");
    assert_eq!(result, Ok(()));

    assert_eq!(
        *REENTERED.lock().unwrap(),
        vec![
            (SaiStatus::Success.as_raw(), DashHaRole::Active.as_raw()),
            (SaiStatus::Uninitialized.as_raw(), -1),
        ]
    );
    assert!(!is_dash_ha_api_installed());
    assert_eq!(vs.get_ha_role(session).unwrap(), DashHaRole::Active);
}

#[test]
#[serial]
fn test_foreign_wrapper_registers_ha_scope_callback() {
    let vs = install();
    let api = unsafe {
        foreign().with_switch_attribute(
            sai_dash_ha_set_switch_attribute,
            SwitchAttrExtensionRange::new(SWITCH_ATTR_END),
        )
    };

    let seen: Arc<Mutex<Vec<HaScopeEventData>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    api.set_ha_scope_event_notify(
        vs.switch_id(),
        Some(Arc::new(move |events: &[HaScopeEventData]| {
            sink.lock().unwrap().extend_from_slice(events)
        })),
    )
    .unwrap();
    assert!(api.has_ha_scope_event_notify(vs.switch_id()).unwrap());
    assert!(vs.has_ha_scope_event_notify(vs.switch_id()).unwrap());

    let eni = vs.register_eni().unwrap();
    let pair = api.create_ha_pair(vs.switch_id(), &pair_config()).unwrap();
    let session = api
        .create_ha_session(vs.switch_id(), &HaSessionConfig::new(eni, pair))
        .unwrap();
    api.set_ha_role(session, DashHaRole::Standby).unwrap();

    {
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].event_type, HaScopeEvent::StateChanged);
        assert_eq!(seen[0].ha_scope_id.as_raw(), session.as_raw());
        assert_eq!(
            seen[0].attrs,
            vec![DashHaSessionAttr::HaRole.attr(AttrValue::S32(DashHaRole::Standby.as_raw()))]
        );
    }

    api.set_ha_scope_event_notify(vs.switch_id(), None).unwrap();
    assert!(!api.has_ha_scope_event_notify(vs.switch_id()).unwrap());
    assert!(!vs.has_ha_scope_event_notify(vs.switch_id()).unwrap());

    api.set_ha_role(session, DashHaRole::Active).unwrap();
    assert_eq!(seen.lock().unwrap().len(), 1);

    uninstall_dash_ha_api();
}

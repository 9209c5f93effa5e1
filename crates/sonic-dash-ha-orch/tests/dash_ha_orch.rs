//! DashHaOrch end to end against the in-memory adapter.

use std::io::Write;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use sonic_dash_ha_orch::dash_ha::{FIELD_HA_ROLE, FIELD_OBSERVED_HA_ROLE};
use sonic_dash_ha_orch::{
    run, DashHaConfigFile, DashHaOrch, DashHaOrchConfig, HaTable, KeyOpFieldsValues, LocalHaState,
    RunOptions,
};
use sonic_sai_dash_ha::{DashHaApiExt, DashHaRole, HaSessionStat, VirtualDashHa};

const CONFIG: &str = r#"{
    "enis": ["eni0", "eni1"],
    "ha_pairs": {
        "pair0": {
            "peer_dpu_ipv4": "10.0.0.2",
            "peer_dpu_ipv6": "fd00::2",
            "peer_npu_ipv4": "10.0.1.2",
            "peer_npu_ipv6": "fd00:1::2",
            "npu_tunnel_dst_port": 4789,
            "npu_tunnel_src_port_min": 49152,
            "npu_tunnel_src_port_max": 53247,
            "dp_channel_dst_port": 4790,
            "dp_channel_src_port_min": 53248,
            "dp_channel_src_port_max": 57343,
            "dp_channel_probe_interval_ms": 500
        }
    },
    "ha_sessions": {
        "s0": { "eni": "eni0", "ha_pair": "pair0", "ha_role": "active" },
        "s1": { "eni": "eni1", "ha_pair": "pair0" },
        "s2": { "eni": "eni2", "ha_pair": "pair0" }
    }
}"#;

fn pair_row() -> Vec<(&'static str, &'static str)> {
    vec![
        ("peer_dpu_ipv4", "10.0.0.2"),
        ("peer_dpu_ipv6", "fd00::2"),
        ("peer_npu_ipv4", "10.0.1.2"),
        ("peer_npu_ipv6", "fd00:1::2"),
        ("npu_tunnel_dst_port", "4789"),
        ("npu_tunnel_src_port_min", "49152"),
        ("npu_tunnel_src_port_max", "53247"),
        ("dp_channel_dst_port", "4790"),
        ("dp_channel_src_port_min", "53248"),
        ("dp_channel_src_port_max", "57343"),
        ("dp_channel_probe_interval_ms", "100"),
    ]
}

fn write_config(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn test_run_from_config_file() {
    let file = write_config(CONFIG);
    let config = DashHaConfigFile::load(file.path()).unwrap();
    let report = run(
        &config,
        &RunOptions {
            switch_attr_end: 0x300,
            dump_counters: true,
        },
    )
    .unwrap();

    assert_eq!(report.ha_scope_event_notify_attr, "0x300");
    assert_eq!(report.ha_pairs.len(), 1);
    let pair = &report.ha_pairs["pair0"];
    assert_eq!(pair.npu_tunnel_src_ports, "49152-53247");
    assert_eq!(pair.dp_channel_probe_interval_ms, 500);

    assert_eq!(report.ha_sessions.len(), 2);
    assert_eq!(report.ha_sessions["s0"].ha_role, "active");
    assert_eq!(report.ha_sessions["s1"].ha_role, "dead");
    // eni2 was never provisioned.
    assert_eq!(report.pending, vec!["DASH_HA_SESSION_TABLE:s2".to_string()]);
    assert!(report.errors.is_empty());

    assert_eq!(report.state["s0"][FIELD_HA_ROLE], "active");
    let counters = report.counters.as_ref().unwrap();
    assert_eq!(counters["s1"].len(), HaSessionStat::ALL.len());
    assert!(counters["s1"].values().all(|v| *v == 0));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["ha_sessions"]["s1"]["eni"], "eni1");
    assert!(json["ha_sessions"]["s1"].get("observed_ha_role").is_none());
}

#[test]
fn test_run_reports_entry_errors() {
    let config = DashHaConfigFile::parse(
        r#"{
            "enis": ["eni0"],
            "ha_pairs": {
                "bad": {
                    "peer_dpu_ipv4": "10.0.0.2",
                    "peer_dpu_ipv6": "fd00::2",
                    "peer_npu_ipv4": "10.0.1.2",
                    "peer_npu_ipv6": "fd00:1::2",
                    "npu_tunnel_dst_port": 4789,
                    "npu_tunnel_src_port_min": 10,
                    "npu_tunnel_src_port_max": 1,
                    "dp_channel_dst_port": 4790,
                    "dp_channel_src_port_min": 53248,
                    "dp_channel_src_port_max": 57343,
                    "dp_channel_probe_interval_ms": 100
                },
                "partial": { "npu_tunnel_src_port_min": 1, "npu_tunnel_src_port_max": 2 },
                "typo": { "peer_dpu": "10.0.0.1" }
            },
            "ha_sessions": { "s0": { "eni": "eni0" } }
        }"#,
    )
    .unwrap();
    let report = run(&config, &RunOptions::default()).unwrap();

    let failed: Vec<(&str, &str)> = report
        .errors
        .iter()
        .map(|e| (e.table, e.key.as_str()))
        .collect();
    assert_eq!(
        failed,
        vec![
            ("DASH_HA_PAIR_TABLE", "bad"),
            ("DASH_HA_PAIR_TABLE", "partial"),
            ("DASH_HA_PAIR_TABLE", "typo"),
            ("DASH_HA_SESSION_TABLE", "s0"),
        ]
    );
    assert!(report.errors[0].error.contains("SAI"));
    assert!(report.errors[1]
        .error
        .contains("missing mandatory HA pair field peer_dpu_ipv4"));
    assert!(report.errors[2].error.contains("unknown HA pair field peer_dpu"));
    assert!(report.ha_pairs.is_empty());
    assert!(report.counters.is_none());
}

#[test]
fn test_switchover_is_reflected_in_state() {
    let vs = Arc::new(VirtualDashHa::new());
    let state = Arc::new(LocalHaState::new());
    state.add_eni("eni0", vs.register_eni().unwrap());

    let mut orch = DashHaOrch::new(
        DashHaOrchConfig::default().with_switch_id(vs.switch_id()),
        vs.clone(),
    );
    orch.set_callbacks(state.clone());
    orch.register_ha_scope_events(vs.as_ref()).unwrap();

    // Session first: it waits for the pair.
    orch.do_task(
        HaTable::Session,
        vec![KeyOpFieldsValues::set(
            "eni0",
            [("eni", "eni0"), ("ha_pair", "pair0"), ("ha_role", "standby")],
        )],
    );
    orch.do_task(
        HaTable::Pair,
        vec![KeyOpFieldsValues::set(
            "pair0",
            pair_row(),
        )],
    );
    assert_eq!(orch.pending_count(), 0);
    let oid = orch.get_session("eni0").unwrap().oid;
    assert_eq!(vs.get_ha_role(oid).unwrap(), DashHaRole::Standby);

    // Planned switchover driven from the table.
    orch.do_task(
        HaTable::Session,
        vec![KeyOpFieldsValues::set(
            "eni0",
            [("eni", "eni0"), ("ha_pair", "pair0"), ("ha_role", "switching_to_active")],
        )],
    );
    assert_eq!(orch.process_ha_scope_events(), 1);
    let row = state.row("eni0").unwrap();
    assert_eq!(row[FIELD_HA_ROLE], "switching_to_active");
    assert_eq!(row[FIELD_OBSERVED_HA_ROLE], "switching_to_active");

    // Peer lost: the data plane goes standalone on its own.
    vs.set_ha_role(oid, DashHaRole::Standalone).unwrap();
    assert_eq!(orch.process_ha_scope_events(), 1);
    let row = state.row("eni0").unwrap();
    assert_eq!(row[FIELD_HA_ROLE], "switching_to_active");
    assert_eq!(row[FIELD_OBSERVED_HA_ROLE], "standalone");

    orch.do_task(HaTable::Session, vec![KeyOpFieldsValues::del("eni0")]);
    orch.do_task(HaTable::Pair, vec![KeyOpFieldsValues::del("pair0")]);
    assert!(state.rows().is_empty());
    assert_eq!(vs.session_count().unwrap(), 0);
    assert_eq!(vs.pair_count().unwrap(), 0);
    assert_eq!(orch.stats().sessions_removed, 1);
    assert_eq!(orch.stats().pairs_removed, 1);
}

//! DASH HA table entries and per-object bookkeeping.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sonic_sai_dash_ha::api::PortRange;
use sonic_sai_dash_ha::{DashHaPairOid, DashHaRole, DashHaSessionOid, EniOid, HaPairConfig};

pub const APP_DASH_HA_PAIR_TABLE_NAME: &str = "DASH_HA_PAIR_TABLE";
pub const APP_DASH_HA_SESSION_TABLE_NAME: &str = "DASH_HA_SESSION_TABLE";
pub const STATE_DASH_HA_SESSION_TABLE_NAME: &str = "DASH_HA_SESSION_STATE";

pub const FIELD_PEER_DPU_IPV4: &str = "peer_dpu_ipv4";
pub const FIELD_PEER_DPU_IPV6: &str = "peer_dpu_ipv6";
pub const FIELD_PEER_NPU_IPV4: &str = "peer_npu_ipv4";
pub const FIELD_PEER_NPU_IPV6: &str = "peer_npu_ipv6";
pub const FIELD_NPU_TUNNEL_DST_PORT: &str = "npu_tunnel_dst_port";
pub const FIELD_NPU_TUNNEL_SRC_PORT_MIN: &str = "npu_tunnel_src_port_min";
pub const FIELD_NPU_TUNNEL_SRC_PORT_MAX: &str = "npu_tunnel_src_port_max";
pub const FIELD_DP_CHANNEL_DST_PORT: &str = "dp_channel_dst_port";
pub const FIELD_DP_CHANNEL_SRC_PORT_MIN: &str = "dp_channel_src_port_min";
pub const FIELD_DP_CHANNEL_SRC_PORT_MAX: &str = "dp_channel_src_port_max";
pub const FIELD_DP_CHANNEL_PROBE_INTERVAL_MS: &str = "dp_channel_probe_interval_ms";

pub const FIELD_ENI: &str = "eni";
pub const FIELD_HA_PAIR: &str = "ha_pair";
pub const FIELD_HA_ROLE: &str = "ha_role";

pub const FIELD_OBSERVED_HA_ROLE: &str = "observed_ha_role";
pub const FIELD_LAST_UPDATE: &str = "last_update";

/// Table operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Set,
    Del,
}

impl Operation {
    pub fn is_set(&self) -> bool {
        matches!(self, Operation::Set)
    }

    pub fn is_del(&self) -> bool {
        matches!(self, Operation::Del)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Set => f.write_str("SET"),
            Operation::Del => f.write_str("DEL"),
        }
    }
}

pub type FieldValue = (String, String);

/// One change to a DASH HA table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOpFieldsValues {
    pub key: String,
    pub op: Operation,
    /// Empty for `Del`.
    pub fvs: Vec<FieldValue>,
}

impl KeyOpFieldsValues {
    pub fn new(key: impl Into<String>, op: Operation, fvs: Vec<FieldValue>) -> Self {
        Self {
            key: key.into(),
            op,
            fvs,
        }
    }

    pub fn set<K, V>(key: impl Into<String>, fvs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let fvs = fvs.into_iter().map(|(f, v)| (f.into(), v.into())).collect();
        Self::new(key, Operation::Set, fvs)
    }

    pub fn del(key: impl Into<String>) -> Self {
        Self::new(key, Operation::Del, vec![])
    }

    /// Returns the last value written for `field`.
    pub fn get_field(&self, field: &str) -> Option<&str> {
        self.fvs
            .iter()
            .rev()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.as_str())
    }
}

/// The two tables the orch consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HaTable {
    Pair,
    Session,
}

impl HaTable {
    pub fn table_name(&self) -> &'static str {
        match self {
            HaTable::Pair => APP_DASH_HA_PAIR_TABLE_NAME,
            HaTable::Session => APP_DASH_HA_SESSION_TABLE_NAME,
        }
    }
}

impl fmt::Display for HaTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Result of handling one table entry that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Applied (or nothing to do).
    Done,
    /// Waiting for a dependency; kept for retry.
    Pending,
}

fn parse_field<T: FromStr>(field: &str, value: &str) -> Result<T, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("invalid value '{}' for field {}", value, field))
}

/// Every `DASH_HA_PAIR_TABLE` field, in attribute id order. All of them are
/// mandatory.
pub const PAIR_FIELDS: [&str; 11] = [
    FIELD_PEER_DPU_IPV4,
    FIELD_PEER_DPU_IPV6,
    FIELD_PEER_NPU_IPV4,
    FIELD_PEER_NPU_IPV6,
    FIELD_NPU_TUNNEL_DST_PORT,
    FIELD_NPU_TUNNEL_SRC_PORT_MIN,
    FIELD_NPU_TUNNEL_SRC_PORT_MAX,
    FIELD_DP_CHANNEL_DST_PORT,
    FIELD_DP_CHANNEL_SRC_PORT_MIN,
    FIELD_DP_CHANNEL_SRC_PORT_MAX,
    FIELD_DP_CHANNEL_PROBE_INTERVAL_MS,
];

fn required<T>(value: Option<T>, field: &str) -> Result<T, String> {
    value.ok_or_else(|| format!("missing mandatory HA pair field {}", field))
}

/// Builds an HA pair configuration from table fields.
///
/// Every field in [`PAIR_FIELDS`] must be present. Unknown fields are
/// rejected.
pub fn parse_pair_fields(fvs: &[FieldValue]) -> Result<HaPairConfig, String> {
    let mut peer_dpu_ipv4 = None;
    let mut peer_dpu_ipv6 = None;
    let mut peer_npu_ipv4 = None;
    let mut peer_npu_ipv6 = None;
    let mut npu_tunnel_dst_port = None;
    let mut npu_tunnel_src_port_min = None;
    let mut npu_tunnel_src_port_max = None;
    let mut dp_channel_dst_port = None;
    let mut dp_channel_src_port_min = None;
    let mut dp_channel_src_port_max = None;
    let mut dp_channel_probe_interval_ms = None;

    for (field, value) in fvs {
        match field.as_str() {
            FIELD_PEER_DPU_IPV4 => peer_dpu_ipv4 = Some(parse_field::<Ipv4Addr>(field, value)?),
            FIELD_PEER_DPU_IPV6 => peer_dpu_ipv6 = Some(parse_field::<Ipv6Addr>(field, value)?),
            FIELD_PEER_NPU_IPV4 => peer_npu_ipv4 = Some(parse_field::<Ipv4Addr>(field, value)?),
            FIELD_PEER_NPU_IPV6 => peer_npu_ipv6 = Some(parse_field::<Ipv6Addr>(field, value)?),
            FIELD_NPU_TUNNEL_DST_PORT => npu_tunnel_dst_port = Some(parse_field(field, value)?),
            FIELD_NPU_TUNNEL_SRC_PORT_MIN => {
                npu_tunnel_src_port_min = Some(parse_field(field, value)?)
            }
            FIELD_NPU_TUNNEL_SRC_PORT_MAX => {
                npu_tunnel_src_port_max = Some(parse_field(field, value)?)
            }
            FIELD_DP_CHANNEL_DST_PORT => dp_channel_dst_port = Some(parse_field(field, value)?),
            FIELD_DP_CHANNEL_SRC_PORT_MIN => {
                dp_channel_src_port_min = Some(parse_field(field, value)?)
            }
            FIELD_DP_CHANNEL_SRC_PORT_MAX => {
                dp_channel_src_port_max = Some(parse_field(field, value)?)
            }
            FIELD_DP_CHANNEL_PROBE_INTERVAL_MS => {
                dp_channel_probe_interval_ms = Some(parse_field(field, value)?)
            }
            other => return Err(format!("unknown HA pair field {}", other)),
        }
    }

    Ok(HaPairConfig {
        peer_dpu_ipv4: required(peer_dpu_ipv4, FIELD_PEER_DPU_IPV4)?,
        peer_dpu_ipv6: required(peer_dpu_ipv6, FIELD_PEER_DPU_IPV6)?,
        peer_npu_ipv4: required(peer_npu_ipv4, FIELD_PEER_NPU_IPV4)?,
        peer_npu_ipv6: required(peer_npu_ipv6, FIELD_PEER_NPU_IPV6)?,
        npu_tunnel_dst_port: required(npu_tunnel_dst_port, FIELD_NPU_TUNNEL_DST_PORT)?,
        npu_tunnel_src_ports: PortRange::new(
            required(npu_tunnel_src_port_min, FIELD_NPU_TUNNEL_SRC_PORT_MIN)?,
            required(npu_tunnel_src_port_max, FIELD_NPU_TUNNEL_SRC_PORT_MAX)?,
        ),
        dp_channel_dst_port: required(dp_channel_dst_port, FIELD_DP_CHANNEL_DST_PORT)?,
        dp_channel_src_ports: PortRange::new(
            required(dp_channel_src_port_min, FIELD_DP_CHANNEL_SRC_PORT_MIN)?,
            required(dp_channel_src_port_max, FIELD_DP_CHANNEL_SRC_PORT_MAX)?,
        ),
        dp_channel_probe_interval_ms: required(
            dp_channel_probe_interval_ms,
            FIELD_DP_CHANNEL_PROBE_INTERVAL_MS,
        )?,
    })
}

/// Returns the first table field whose value differs between two pair
/// configurations.
pub fn changed_pair_field(old: &HaPairConfig, new: &HaPairConfig) -> Option<&'static str> {
    let ports = |old: PortRange, new: PortRange, min: &'static str, max: &'static str| {
        if old.min != new.min {
            Some(min)
        } else if old.max != new.max {
            Some(max)
        } else {
            None
        }
    };

    if old.peer_dpu_ipv4 != new.peer_dpu_ipv4 {
        return Some(FIELD_PEER_DPU_IPV4);
    }
    if old.peer_dpu_ipv6 != new.peer_dpu_ipv6 {
        return Some(FIELD_PEER_DPU_IPV6);
    }
    if old.peer_npu_ipv4 != new.peer_npu_ipv4 {
        return Some(FIELD_PEER_NPU_IPV4);
    }
    if old.peer_npu_ipv6 != new.peer_npu_ipv6 {
        return Some(FIELD_PEER_NPU_IPV6);
    }
    if old.npu_tunnel_dst_port != new.npu_tunnel_dst_port {
        return Some(FIELD_NPU_TUNNEL_DST_PORT);
    }
    if let Some(field) = ports(
        old.npu_tunnel_src_ports,
        new.npu_tunnel_src_ports,
        FIELD_NPU_TUNNEL_SRC_PORT_MIN,
        FIELD_NPU_TUNNEL_SRC_PORT_MAX,
    ) {
        return Some(field);
    }
    if old.dp_channel_dst_port != new.dp_channel_dst_port {
        return Some(FIELD_DP_CHANNEL_DST_PORT);
    }
    if let Some(field) = ports(
        old.dp_channel_src_ports,
        new.dp_channel_src_ports,
        FIELD_DP_CHANNEL_SRC_PORT_MIN,
        FIELD_DP_CHANNEL_SRC_PORT_MAX,
    ) {
        return Some(field);
    }
    if old.dp_channel_probe_interval_ms != new.dp_channel_probe_interval_ms {
        return Some(FIELD_DP_CHANNEL_PROBE_INTERVAL_MS);
    }
    None
}

/// Fields of a `DASH_HA_SESSION_TABLE` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaSessionFields {
    /// ENI name.
    pub eni: String,
    /// Key of the row in `DASH_HA_PAIR_TABLE`.
    pub ha_pair: String,
    pub ha_role: Option<DashHaRole>,
}

impl HaSessionFields {
    pub fn parse(fvs: &[FieldValue]) -> Result<Self, String> {
        let mut eni = None;
        let mut ha_pair = None;
        let mut ha_role = None;
        for (field, value) in fvs {
            match field.as_str() {
                FIELD_ENI => eni = Some(value.trim().to_string()),
                FIELD_HA_PAIR => ha_pair = Some(value.trim().to_string()),
                FIELD_HA_ROLE => ha_role = Some(value.trim().parse::<DashHaRole>()?),
                other => return Err(format!("unknown HA session field {}", other)),
            }
        }

        let eni = eni
            .filter(|s| !s.is_empty())
            .ok_or_else(|| format!("missing field {}", FIELD_ENI))?;
        let ha_pair = ha_pair
            .filter(|s| !s.is_empty())
            .ok_or_else(|| format!("missing field {}", FIELD_HA_PAIR))?;
        Ok(Self {
            eni,
            ha_pair,
            ha_role,
        })
    }
}

/// An HA pair programmed through SAI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaPairInfo {
    pub oid: DashHaPairOid,
    pub config: HaPairConfig,
}

/// An HA session programmed through SAI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaSessionInfo {
    pub oid: DashHaSessionOid,
    pub eni_name: String,
    pub eni: EniOid,
    pub pair_name: String,
    /// Role last written to the adapter.
    pub role: DashHaRole,
    /// Role last reported by an HA scope event.
    pub observed_role: Option<DashHaRole>,
    pub last_update: Option<DateTime<Utc>>,
}

impl HaSessionInfo {
    pub fn new(oid: DashHaSessionOid, fields: &HaSessionFields, eni: EniOid) -> Self {
        Self {
            oid,
            eni_name: fields.eni.clone(),
            eni,
            pair_name: fields.ha_pair.clone(),
            role: fields.ha_role.unwrap_or_default(),
            observed_role: None,
            last_update: None,
        }
    }

    /// Row written to the session state table.
    pub fn state_field_values(&self) -> Vec<FieldValue> {
        let mut fvs = vec![
            (FIELD_ENI.to_string(), self.eni_name.clone()),
            (FIELD_HA_PAIR.to_string(), self.pair_name.clone()),
            (FIELD_HA_ROLE.to_string(), self.role.config_string().to_string()),
        ];
        if let Some(observed) = self.observed_role {
            fvs.push((
                FIELD_OBSERVED_HA_ROLE.to_string(),
                observed.config_string().to_string(),
            ));
        }
        if let Some(ts) = self.last_update {
            fvs.push((FIELD_LAST_UPDATE.to_string(), ts.to_rfc3339()));
        }
        fvs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pair_fvs() -> Vec<FieldValue> {
        [
            (FIELD_PEER_DPU_IPV4, "10.1.0.2"),
            (FIELD_PEER_DPU_IPV6, "fd00:1::2"),
            (FIELD_PEER_NPU_IPV4, "10.2.0.2"),
            (FIELD_PEER_NPU_IPV6, "fc00::2"),
            (FIELD_NPU_TUNNEL_DST_PORT, "4789"),
            (FIELD_NPU_TUNNEL_SRC_PORT_MIN, "49152"),
            (FIELD_NPU_TUNNEL_SRC_PORT_MAX, "53247"),
            (FIELD_DP_CHANNEL_DST_PORT, " 4790 "),
            (FIELD_DP_CHANNEL_SRC_PORT_MIN, "53248"),
            (FIELD_DP_CHANNEL_SRC_PORT_MAX, "57343"),
            (FIELD_DP_CHANNEL_PROBE_INTERVAL_MS, "500"),
        ]
        .into_iter()
        .map(|(f, v)| (f.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_parse_pair_fields() {
        let config = parse_pair_fields(&pair_fvs()).unwrap();
        assert_eq!(config.peer_dpu_ipv4, Ipv4Addr::new(10, 1, 0, 2));
        assert_eq!(config.peer_dpu_ipv6, "fd00:1::2".parse::<Ipv6Addr>().unwrap());
        assert_eq!(config.peer_npu_ipv4, Ipv4Addr::new(10, 2, 0, 2));
        assert_eq!(config.peer_npu_ipv6, "fc00::2".parse::<Ipv6Addr>().unwrap());
        assert_eq!(config.npu_tunnel_dst_port, 4789);
        assert_eq!(config.npu_tunnel_src_ports, PortRange::new(49152, 53247));
        assert_eq!(config.dp_channel_dst_port, 4790);
        assert_eq!(config.dp_channel_src_ports, PortRange::new(53248, 57343));
        assert_eq!(config.dp_channel_probe_interval_ms, 500);
    }

    #[test]
    fn test_parse_pair_fields_requires_every_field() {
        for field in PAIR_FIELDS {
            let fvs: Vec<FieldValue> = pair_fvs().into_iter().filter(|(f, _)| f != field).collect();
            assert_eq!(
                parse_pair_fields(&fvs).unwrap_err(),
                format!("missing mandatory HA pair field {}", field)
            );
        }

        let only_ports = vec![
            (FIELD_NPU_TUNNEL_SRC_PORT_MIN.to_string(), "1".to_string()),
            (FIELD_NPU_TUNNEL_SRC_PORT_MAX.to_string(), "2".to_string()),
        ];
        assert!(parse_pair_fields(&only_ports).is_err());
        assert!(parse_pair_fields(&[]).is_err());
    }

    #[test]
    fn test_parse_pair_fields_rejects_bad_input() {
        let mut bad_port = pair_fvs();
        bad_port.push((FIELD_DP_CHANNEL_DST_PORT.to_string(), "70000".to_string()));
        assert!(parse_pair_fields(&bad_port)
            .unwrap_err()
            .contains(FIELD_DP_CHANNEL_DST_PORT));

        let bad_ip = vec![(FIELD_PEER_DPU_IPV4.to_string(), "fc00::1".to_string())];
        assert!(parse_pair_fields(&bad_ip)
            .unwrap_err()
            .starts_with("invalid value"));

        let mut unknown = pair_fvs();
        unknown.push(("vni".to_string(), "100".to_string()));
        assert_eq!(
            parse_pair_fields(&unknown).unwrap_err(),
            "unknown HA pair field vni"
        );
    }

    #[test]
    fn test_changed_pair_field() {
        let old = parse_pair_fields(&pair_fvs()).unwrap();
        assert_eq!(changed_pair_field(&old, &old.clone()), None);

        let mut new = old.clone();
        new.npu_tunnel_src_ports.max = 60000;
        assert_eq!(
            changed_pair_field(&old, &new),
            Some(FIELD_NPU_TUNNEL_SRC_PORT_MAX)
        );

        let mut new = old.clone();
        new.dp_channel_probe_interval_ms = 100;
        assert_eq!(
            changed_pair_field(&old, &new),
            Some(FIELD_DP_CHANNEL_PROBE_INTERVAL_MS)
        );
    }

    #[test]
    fn test_parse_session_fields() {
        let fields = HaSessionFields::parse(&[
            (FIELD_ENI.into(), "eni0".into()),
            (FIELD_HA_PAIR.into(), "pair0".into()),
            (FIELD_HA_ROLE.into(), "Standby".into()),
        ])
        .unwrap();
        assert_eq!(fields.eni, "eni0");
        assert_eq!(fields.ha_pair, "pair0");
        assert_eq!(fields.ha_role, Some(DashHaRole::Standby));

        let no_role =
            HaSessionFields::parse(&[(FIELD_ENI.into(), "eni0".into()), (FIELD_HA_PAIR.into(), "p".into())])
                .unwrap();
        assert_eq!(no_role.ha_role, None);

        assert_eq!(
            HaSessionFields::parse(&[(FIELD_ENI.into(), "eni0".into())]).unwrap_err(),
            "missing field ha_pair"
        );
        assert!(HaSessionFields::parse(&[
            (FIELD_ENI.into(), "eni0".into()),
            (FIELD_HA_PAIR.into(), "pair0".into()),
            (FIELD_HA_ROLE.into(), "primary".into()),
        ])
        .is_err());
    }

    #[test]
    fn test_entry_field_lookup_takes_last_value() {
        let entry = KeyOpFieldsValues::set("s0", [("ha_role", "active"), ("ha_role", "standby")]);
        assert_eq!(entry.op, Operation::Set);
        assert_eq!(entry.get_field("ha_role"), Some("standby"));
        assert_eq!(entry.get_field("eni"), None);
        assert!(KeyOpFieldsValues::del("s0").op.is_del());
    }
}

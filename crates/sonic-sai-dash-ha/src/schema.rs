//! Attribute schemas of the DASH HA pair and HA session objects, and the HA
//! role enumeration.
//!
//! Numeric ids match `saiexperimentaldashha.h` exactly.

use std::fmt;
use std::str::FromStr;

use crate::attr::{
    AttrDefault, AttrFlags, AttrMetadata, AttrValue, AttrValueType, SaiAttrId, SaiAttribute,
};

/// Base of the vendor custom attribute range shared by both objects.
pub const SAI_DASH_HA_ATTR_CUSTOM_RANGE_START: SaiAttrId = 0x1000_0000;

/// End marker of the vendor custom attribute range.
pub const SAI_DASH_HA_ATTR_CUSTOM_RANGE_END: SaiAttrId = 0x1000_0001;

/// Returns true if `id` lies in the vendor custom attribute range.
pub fn is_custom_attr(id: SaiAttrId) -> bool {
    id >= SAI_DASH_HA_ATTR_CUSTOM_RANGE_START
}

// ============================================================================
// HA role
// ============================================================================

/// HA role of an ENI (`sai_dash_ha_role_t`).
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum DashHaRole {
    /// Initial role of every ENI.
    #[default]
    Dead = 0,
    /// Makes flow decisions and processes traffic.
    Active = 1,
    /// Flow store; accepts flow replication requests.
    Standby = 2,
    /// Acts like active but does not replicate flows.
    Standalone = 3,
    /// Acts like active but still accepts flow replication requests.
    SwitchingToActive = 4,
}

impl DashHaRole {
    pub const ALL: [DashHaRole; 5] = [
        DashHaRole::Dead,
        DashHaRole::Active,
        DashHaRole::Standby,
        DashHaRole::Standalone,
        DashHaRole::SwitchingToActive,
    ];

    const RAW_VALUES: [i32; 5] = [0, 1, 2, 3, 4];

    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(DashHaRole::Dead),
            1 => Some(DashHaRole::Active),
            2 => Some(DashHaRole::Standby),
            3 => Some(DashHaRole::Standalone),
            4 => Some(DashHaRole::SwitchingToActive),
            _ => None,
        }
    }

    pub fn sai_name(&self) -> &'static str {
        match self {
            DashHaRole::Dead => "SAI_DASH_HA_ROLE_DEAD",
            DashHaRole::Active => "SAI_DASH_HA_ROLE_ACTIVE",
            DashHaRole::Standby => "SAI_DASH_HA_ROLE_STANDBY",
            DashHaRole::Standalone => "SAI_DASH_HA_ROLE_STANDALONE",
            DashHaRole::SwitchingToActive => "SAI_DASH_HA_ROLE_SWITCHING_TO_ACTIVE",
        }
    }

    /// Returns the config string used in APPL_DB / STATE_DB.
    pub fn config_string(&self) -> &'static str {
        match self {
            DashHaRole::Dead => "dead",
            DashHaRole::Active => "active",
            DashHaRole::Standby => "standby",
            DashHaRole::Standalone => "standalone",
            DashHaRole::SwitchingToActive => "switching_to_active",
        }
    }

    /// Returns true for roles that make flow decisions.
    pub fn makes_flow_decisions(&self) -> bool {
        matches!(
            self,
            DashHaRole::Active | DashHaRole::Standalone | DashHaRole::SwitchingToActive
        )
    }

    /// Returns true for roles that accept flow replication requests.
    pub fn accepts_flow_replication(&self) -> bool {
        matches!(self, DashHaRole::Standby | DashHaRole::SwitchingToActive)
    }
}

impl FromStr for DashHaRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        let name = lower.strip_prefix("sai_dash_ha_role_").unwrap_or(&lower);
        match name {
            "dead" => Ok(DashHaRole::Dead),
            "active" => Ok(DashHaRole::Active),
            "standby" => Ok(DashHaRole::Standby),
            "standalone" => Ok(DashHaRole::Standalone),
            "switching_to_active" => Ok(DashHaRole::SwitchingToActive),
            _ => Err(format!("Unknown HA role: {}", s)),
        }
    }
}

impl fmt::Display for DashHaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_string())
    }
}

// ============================================================================
// Object schemas
// ============================================================================

/// Attribute schema of one object type.
#[derive(Debug)]
pub struct ObjectSchema {
    /// SAI object type name, e.g. `SAI_OBJECT_TYPE_DASH_HA_PAIR`.
    pub object_type: &'static str,
    pub attrs: &'static [AttrMetadata],
    /// One past the last standard attribute id (`*_ATTR_END`).
    pub attr_end: SaiAttrId,
}

impl ObjectSchema {
    /// Returns the metadata of a standard attribute.
    pub fn lookup(&self, id: SaiAttrId) -> Option<&'static AttrMetadata> {
        self.attrs.iter().find(|m| m.id == id)
    }

    /// Iterates over mandatory-on-create attributes.
    pub fn mandatory(&self) -> impl Iterator<Item = &'static AttrMetadata> {
        self.attrs.iter().filter(|m| m.flags.is_mandatory_on_create())
    }
}

const fn mandatory_create_only(
    id: SaiAttrId,
    name: &'static str,
    value_type: AttrValueType,
) -> AttrMetadata {
    AttrMetadata {
        id,
        name,
        value_type,
        flags: AttrFlags::MandatoryOnCreateCreateOnly,
        default: AttrDefault::Disabled,
        allow_null: false,
        allowed_s32: &[],
    }
}

/// Attribute ids of the HA pair object (`sai_dash_ha_pair_attr_t`).
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashHaPairAttr {
    PeerDpuIpv4 = 0,
    PeerDpuIpv6 = 1,
    PeerNpuIpv4 = 2,
    PeerNpuIpv6 = 3,
    NpuTunnelDstPort = 4,
    NpuTunnelSrcPortMin = 5,
    NpuTunnelSrcPortMax = 6,
    DpChannelDstPort = 7,
    DpChannelSrcPortMin = 8,
    DpChannelSrcPortMax = 9,
    DpChannelProbeIntervalInMs = 10,
}

impl DashHaPairAttr {
    pub const START: SaiAttrId = 0;
    pub const END: SaiAttrId = 11;
    pub const CUSTOM_RANGE_START: SaiAttrId = SAI_DASH_HA_ATTR_CUSTOM_RANGE_START;
    pub const CUSTOM_RANGE_END: SaiAttrId = SAI_DASH_HA_ATTR_CUSTOM_RANGE_END;

    pub const ALL: [DashHaPairAttr; 11] = [
        DashHaPairAttr::PeerDpuIpv4,
        DashHaPairAttr::PeerDpuIpv6,
        DashHaPairAttr::PeerNpuIpv4,
        DashHaPairAttr::PeerNpuIpv6,
        DashHaPairAttr::NpuTunnelDstPort,
        DashHaPairAttr::NpuTunnelSrcPortMin,
        DashHaPairAttr::NpuTunnelSrcPortMax,
        DashHaPairAttr::DpChannelDstPort,
        DashHaPairAttr::DpChannelSrcPortMin,
        DashHaPairAttr::DpChannelSrcPortMax,
        DashHaPairAttr::DpChannelProbeIntervalInMs,
    ];

    pub const fn as_raw(self) -> SaiAttrId {
        self as SaiAttrId
    }

    pub fn from_raw(id: SaiAttrId) -> Option<Self> {
        Self::ALL.get(usize::try_from(id).ok()?).copied()
    }

    pub fn metadata(self) -> &'static AttrMetadata {
        &DASH_HA_PAIR_ATTR_METADATA[self as usize]
    }

    pub fn sai_name(self) -> &'static str {
        self.metadata().name
    }

    /// Builds an attribute with this id.
    pub fn attr(self, value: AttrValue) -> SaiAttribute {
        SaiAttribute::new(self, value)
    }
}

impl From<DashHaPairAttr> for SaiAttrId {
    fn from(attr: DashHaPairAttr) -> Self {
        attr.as_raw()
    }
}

static DASH_HA_PAIR_ATTR_METADATA: [AttrMetadata; 11] = [
    mandatory_create_only(0, "SAI_DASH_HA_PAIR_ATTR_PEER_DPU_IPV4", AttrValueType::Ip4),
    mandatory_create_only(1, "SAI_DASH_HA_PAIR_ATTR_PEER_DPU_IPV6", AttrValueType::Ip6),
    mandatory_create_only(2, "SAI_DASH_HA_PAIR_ATTR_PEER_NPU_IPV4", AttrValueType::Ip4),
    mandatory_create_only(3, "SAI_DASH_HA_PAIR_ATTR_PEER_NPU_IPV6", AttrValueType::Ip6),
    mandatory_create_only(4, "SAI_DASH_HA_PAIR_ATTR_NPU_TUNNEL_DST_PORT", AttrValueType::U16),
    mandatory_create_only(5, "SAI_DASH_HA_PAIR_ATTR_NPU_TUNNEL_SRC_PORT_MIN", AttrValueType::U16),
    mandatory_create_only(6, "SAI_DASH_HA_PAIR_ATTR_NPU_TUNNEL_SRC_PORT_MAX", AttrValueType::U16),
    mandatory_create_only(7, "SAI_DASH_HA_PAIR_ATTR_DP_CHANNEL_DST_PORT", AttrValueType::U16),
    mandatory_create_only(8, "SAI_DASH_HA_PAIR_ATTR_DP_CHANNEL_SRC_PORT_MIN", AttrValueType::U16),
    mandatory_create_only(9, "SAI_DASH_HA_PAIR_ATTR_DP_CHANNEL_SRC_PORT_MAX", AttrValueType::U16),
    mandatory_create_only(
        10,
        "SAI_DASH_HA_PAIR_ATTR_DP_CHANNEL_PROBE_INTERVAL_IN_MS",
        AttrValueType::U32,
    ),
];

/// Schema of `SAI_OBJECT_TYPE_DASH_HA_PAIR`.
pub static DASH_HA_PAIR_SCHEMA: ObjectSchema = ObjectSchema {
    object_type: "SAI_OBJECT_TYPE_DASH_HA_PAIR",
    attrs: &DASH_HA_PAIR_ATTR_METADATA,
    attr_end: DashHaPairAttr::END,
};

/// Attribute ids of the HA session object (`sai_dash_ha_session_attr_t`).
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashHaSessionAttr {
    EniId = 0,
    HaPairId = 1,
    HaRole = 2,
}

impl DashHaSessionAttr {
    pub const START: SaiAttrId = 0;
    pub const END: SaiAttrId = 3;
    pub const CUSTOM_RANGE_START: SaiAttrId = SAI_DASH_HA_ATTR_CUSTOM_RANGE_START;
    pub const CUSTOM_RANGE_END: SaiAttrId = SAI_DASH_HA_ATTR_CUSTOM_RANGE_END;

    pub const ALL: [DashHaSessionAttr; 3] = [
        DashHaSessionAttr::EniId,
        DashHaSessionAttr::HaPairId,
        DashHaSessionAttr::HaRole,
    ];

    pub const fn as_raw(self) -> SaiAttrId {
        self as SaiAttrId
    }

    pub fn from_raw(id: SaiAttrId) -> Option<Self> {
        Self::ALL.get(usize::try_from(id).ok()?).copied()
    }

    pub fn metadata(self) -> &'static AttrMetadata {
        &DASH_HA_SESSION_ATTR_METADATA[self as usize]
    }

    pub fn sai_name(self) -> &'static str {
        self.metadata().name
    }

    pub fn attr(self, value: AttrValue) -> SaiAttribute {
        SaiAttribute::new(self, value)
    }
}

impl From<DashHaSessionAttr> for SaiAttrId {
    fn from(attr: DashHaSessionAttr) -> Self {
        attr.as_raw()
    }
}

// The header annotates HA_ROLE as `sai_ip6_t`; the value is a
// `sai_dash_ha_role_t` and is carried as s32.
static DASH_HA_SESSION_ATTR_METADATA: [AttrMetadata; 3] = [
    mandatory_create_only(0, "SAI_DASH_HA_SESSION_ATTR_ENI_ID", AttrValueType::ObjectId),
    mandatory_create_only(1, "SAI_DASH_HA_SESSION_ATTR_HA_PAIR_ID", AttrValueType::ObjectId),
    AttrMetadata {
        id: 2,
        name: "SAI_DASH_HA_SESSION_ATTR_HA_ROLE",
        value_type: AttrValueType::S32,
        flags: AttrFlags::CreateAndSet,
        default: AttrDefault::Value(AttrValue::S32(DashHaRole::Dead.as_raw())),
        allow_null: false,
        allowed_s32: &DashHaRole::RAW_VALUES,
    },
];

/// Schema of `SAI_OBJECT_TYPE_DASH_HA_SESSION`.
pub static DASH_HA_SESSION_SCHEMA: ObjectSchema = ObjectSchema {
    object_type: "SAI_OBJECT_TYPE_DASH_HA_SESSION",
    attrs: &DASH_HA_SESSION_ATTR_METADATA,
    attr_end: DashHaSessionAttr::END,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_attr_ids_are_exact() {
        assert_eq!(DashHaPairAttr::PeerDpuIpv4.as_raw(), DashHaPairAttr::START);
        assert_eq!(DashHaPairAttr::PeerNpuIpv6.as_raw(), 3);
        assert_eq!(DashHaPairAttr::DpChannelProbeIntervalInMs.as_raw(), 10);
        assert_eq!(DashHaPairAttr::END, 11);
        assert_eq!(DashHaPairAttr::CUSTOM_RANGE_START, 0x1000_0000);
        assert_eq!(DashHaPairAttr::CUSTOM_RANGE_END, 0x1000_0001);

        for (i, attr) in DashHaPairAttr::ALL.iter().enumerate() {
            assert_eq!(attr.as_raw() as usize, i);
            assert_eq!(attr.metadata().id, attr.as_raw());
            assert_eq!(DashHaPairAttr::from_raw(attr.as_raw()), Some(*attr));
        }
        assert_eq!(DashHaPairAttr::from_raw(DashHaPairAttr::END), None);
    }

    #[test]
    fn test_pair_attrs_all_mandatory_create_only() {
        assert_eq!(DASH_HA_PAIR_SCHEMA.mandatory().count(), 11);
        for meta in DASH_HA_PAIR_SCHEMA.attrs {
            assert!(meta.flags.is_create_only(), "{}", meta.name);
            assert_eq!(meta.default, AttrDefault::Disabled);
        }
        assert_eq!(
            DashHaPairAttr::NpuTunnelSrcPortMax.sai_name(),
            "SAI_DASH_HA_PAIR_ATTR_NPU_TUNNEL_SRC_PORT_MAX"
        );
        assert_eq!(
            DashHaPairAttr::DpChannelProbeIntervalInMs.metadata().value_type,
            AttrValueType::U32
        );
    }

    #[test]
    fn test_session_schema() {
        assert_eq!(DashHaSessionAttr::EniId.as_raw(), 0);
        assert_eq!(DashHaSessionAttr::HaPairId.as_raw(), 1);
        assert_eq!(DashHaSessionAttr::HaRole.as_raw(), 2);
        assert_eq!(DashHaSessionAttr::END, 3);

        let mandatory: Vec<_> = DASH_HA_SESSION_SCHEMA.mandatory().map(|m| m.id).collect();
        assert_eq!(mandatory, vec![0, 1]);

        let role = DashHaSessionAttr::HaRole.metadata();
        assert!(role.flags.is_settable());
        assert_eq!(role.default, AttrDefault::Value(AttrValue::S32(0)));
        assert!(role.allows_s32(4));
        assert!(!role.allows_s32(5));
        assert!(!role.allows_s32(-1));
        assert!(!DashHaSessionAttr::EniId.metadata().allow_null);
    }

    #[test]
    fn test_custom_range_does_not_overlap_standard_ids() {
        for meta in DASH_HA_PAIR_SCHEMA.attrs.iter().chain(DASH_HA_SESSION_SCHEMA.attrs) {
            assert!(!is_custom_attr(meta.id));
        }
        assert!(DashHaPairAttr::END < SAI_DASH_HA_ATTR_CUSTOM_RANGE_START);
        assert!(is_custom_attr(0x1000_0000));
    }

    #[test]
    fn test_role_conversions() {
        assert_eq!(DashHaRole::default(), DashHaRole::Dead);
        for role in DashHaRole::ALL {
            assert_eq!(DashHaRole::from_raw(role.as_raw()), Some(role));
            assert_eq!(role.config_string().parse::<DashHaRole>().unwrap(), role);
            assert_eq!(role.sai_name().parse::<DashHaRole>().unwrap(), role);
        }
        assert_eq!(DashHaRole::from_raw(5), None);
        assert_eq!(DashHaRole::SwitchingToActive.as_raw(), 4);
        assert!("primary".parse::<DashHaRole>().is_err());
    }

    #[test]
    fn test_role_behaviour() {
        assert!(DashHaRole::Active.makes_flow_decisions());
        assert!(!DashHaRole::Active.accepts_flow_replication());
        assert!(DashHaRole::Standby.accepts_flow_replication());
        assert!(!DashHaRole::Standby.makes_flow_decisions());
        assert!(DashHaRole::SwitchingToActive.makes_flow_decisions());
        assert!(DashHaRole::SwitchingToActive.accepts_flow_replication());
        assert!(!DashHaRole::Dead.makes_flow_decisions());
        assert!(!DashHaRole::Standalone.accepts_flow_replication());
    }
}

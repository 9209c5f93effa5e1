//! Safe Rust bindings for the SAI DASH high-availability extension.
//!
//! DASH HA binds an ENI's flow state to a pair of redundant DPUs. This crate
//! covers the experimental SAI surface for it: the HA pair and HA session
//! objects, their counters, the eleven-entry `sai_dash_ha_api_t` and the
//! switch-level HA scope event notification.
//!
//! # Architecture
//!
//! - [`types`]: type-safe object IDs
//! - [`error`]: `sai_status_t` and the [`SaiError`] type
//! - [`attr`]: attribute values and metadata
//! - [`schema`]: attribute ids, the HA role enum and per-object schemas
//! - [`stats`]: HA session counter ids
//! - [`meta`]: attribute list validation shared by every adapter
//! - [`api`]: the [`DashHaApi`] trait and typed helpers
//! - [`switch`]: the HA scope event extension of the switch object
//! - [`vs`]: in-memory adapter
//! - [`ffi`]: C ABI export and import
//!
//! # Example
//!
//! ```
//! use std::net::{Ipv4Addr, Ipv6Addr};
//!
//! use sonic_sai_dash_ha::api::PortRange;
//! use sonic_sai_dash_ha::{DashHaApiExt, DashHaRole, HaPairConfig, HaSessionConfig, VirtualDashHa};
//!
//! let vs = VirtualDashHa::new();
//! let switch = vs.switch_id();
//! let eni = vs.register_eni().unwrap();
//!
//! let pair = vs
//!     .create_ha_pair(
//!         switch,
//!         &HaPairConfig {
//!             peer_dpu_ipv4: Ipv4Addr::new(10, 0, 0, 2),
//!             peer_dpu_ipv6: Ipv6Addr::LOCALHOST,
//!             peer_npu_ipv4: Ipv4Addr::new(10, 0, 1, 2),
//!             peer_npu_ipv6: Ipv6Addr::LOCALHOST,
//!             npu_tunnel_dst_port: 4789,
//!             npu_tunnel_src_ports: PortRange::new(49152, 53247),
//!             dp_channel_dst_port: 4790,
//!             dp_channel_src_ports: PortRange::new(53248, 57343),
//!             dp_channel_probe_interval_ms: 100,
//!         },
//!     )
//!     .unwrap();
//! let session = vs
//!     .create_ha_session(switch, &HaSessionConfig::new(eni, pair))
//!     .unwrap();
//!
//! assert_eq!(vs.get_ha_role(session).unwrap(), DashHaRole::Dead);
//! vs.set_ha_role(session, DashHaRole::Active).unwrap();
//! assert_eq!(vs.get_ha_role(session).unwrap(), DashHaRole::Active);
//! ```

pub mod api;
pub mod attr;
pub mod error;
pub mod ffi;
pub mod meta;
pub mod schema;
pub mod stats;
pub mod switch;
pub mod types;
pub mod vs;

pub use api::{DashHaApi, DashHaApiExt, HaPairConfig, HaSessionConfig, StatsMode};
pub use attr::{AttrValue, SaiAttrId, SaiAttribute};
pub use error::{SaiError, SaiResult, SaiStatus, SaiStatusExt};
pub use schema::{DashHaPairAttr, DashHaRole, DashHaSessionAttr};
pub use stats::{HaSessionStat, SaiStatId, StatBlock};
pub use switch::{
    HaScopeEvent, HaScopeEventData, HaScopeEventNotification, SwitchAttrExtensionRange,
    SwitchHaExtension,
};
pub use types::{
    DashHaPairKind, DashHaPairOid, DashHaSessionKind, DashHaSessionOid, EniKind, EniOid,
    HaScopeKind, HaScopeOid, SaiObjectId, SaiObjectKind, SwitchKind, SwitchOid,
};
pub use vs::VirtualDashHa;

//! DashHaOrch - DASH high-availability orchestration.
//!
//! Programs HA pairs and HA sessions through the SAI DASH HA API and tracks
//! the HA scope state the data plane reports back.
//!
//! # Architecture
//!
//! ```text
//! APPL_DB:DASH_HA_PAIR_TABLE ────┐
//! APPL_DB:DASH_HA_SESSION_TABLE ─┤
//!                                ▼
//!                           DashHaOrch ───> sai_dash_ha_api_t
//!                                │  ▲
//!                                │  └── SAI_SWITCH_ATTR_HA_SCOPE_EVENT_NOTIFY
//!                                ▼
//!                   STATE_DB:DASH_HA_SESSION_STATE
//! ```
//!
//! # Ordering
//!
//! Sessions reference a pair by table key and an ENI by name. A session
//! that arrives before either is parked and applied once both exist. A pair
//! DEL while sessions still use it is parked the same way and completes
//! after the last session is removed.

mod orch;
mod state;
mod types;

pub use orch::{DashHaOrch, DashHaOrchCallbacks, DashHaOrchConfig, DashHaOrchError, DashHaOrchStats};
pub use state::LocalHaState;
pub use types::{
    changed_pair_field, parse_pair_fields, FieldValue, HaPairInfo, HaSessionFields, HaSessionInfo,
    HaTable, KeyOpFieldsValues, Operation, TaskStatus, APP_DASH_HA_PAIR_TABLE_NAME, PAIR_FIELDS,
    APP_DASH_HA_SESSION_TABLE_NAME, FIELD_DP_CHANNEL_DST_PORT, FIELD_DP_CHANNEL_PROBE_INTERVAL_MS,
    FIELD_DP_CHANNEL_SRC_PORT_MAX, FIELD_DP_CHANNEL_SRC_PORT_MIN, FIELD_ENI, FIELD_HA_PAIR,
    FIELD_HA_ROLE, FIELD_LAST_UPDATE, FIELD_NPU_TUNNEL_DST_PORT, FIELD_NPU_TUNNEL_SRC_PORT_MAX,
    FIELD_NPU_TUNNEL_SRC_PORT_MIN, FIELD_OBSERVED_HA_ROLE, FIELD_PEER_DPU_IPV4,
    FIELD_PEER_DPU_IPV6, FIELD_PEER_NPU_IPV4, FIELD_PEER_NPU_IPV6, STATE_DASH_HA_SESSION_TABLE_NAME,
};

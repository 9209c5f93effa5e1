//! HA session statistics counter ids (`sai_ha_session_stat_t`).
//!
//! Counters are partitioned into reserved numeric blocks:
//!
//! ```text
//! 0x10000        NPU-to-DPU tunnel
//! 0x20000        DPU-to-DPU tunnel
//! 0x30000        ENI pipeline
//!   0x30100        inline flow creation
//!   0x30200        inline flow update
//!   0x30300        inline flow deletion
//!   0x30400        flow aging
//! 0x10000000     vendor custom range
//! ```

use std::fmt;
use std::ops::Range;

/// Raw `sai_stat_id_t`.
pub type SaiStatId = u32;

pub const SAI_HA_SESSION_N2D_TUNNEL_ENI_STAT_START: SaiStatId = 0x10000;
pub const SAI_HA_SESSION_N2D_TUNNEL_ENI_STAT_END: SaiStatId = 0x1000A;
pub const SAI_HA_SESSION_D2D_TUNNEL_ENI_STAT_START: SaiStatId = 0x20000;
pub const SAI_HA_SESSION_D2D_TUNNEL_ENI_STAT_END: SaiStatId = 0x20007;
pub const SAI_HA_SESSION_ENI_PIPELINE_STAT_START: SaiStatId = 0x30000;
pub const SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_CREATION_STAT_START: SaiStatId = 0x30100;
pub const SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_CREATION_STAT_END: SaiStatId = 0x3010D;
pub const SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_UPDATE_STAT_START: SaiStatId = 0x30200;
pub const SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_UPDATE_STAT_END: SaiStatId = 0x3020E;
pub const SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_DELETION_STAT_START: SaiStatId = 0x30300;
pub const SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_DELETION_STAT_END: SaiStatId = 0x3030C;
pub const SAI_HA_SESSION_ENI_PIPELINE_FLOW_AGING_STAT_START: SaiStatId = 0x30400;
pub const SAI_HA_SESSION_ENI_PIPELINE_FLOW_AGING_STAT_END: SaiStatId = 0x3040C;
pub const SAI_HA_SESSION_ENI_PIPELINE_STAT_END: SaiStatId = 0x3040D;
pub const SAI_DASH_HA_SESSION_STAT_CUSTOM_RANGE_START: SaiStatId = 0x1000_0000;
pub const SAI_DASH_HA_SESSION_STAT_CUSTOM_RANGE_END: SaiStatId = 0x1000_0001;

/// Counter block a stat id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatBlock {
    N2dTunnel,
    D2dTunnel,
    InlineFlowCreation,
    InlineFlowUpdate,
    InlineFlowDeletion,
    FlowAging,
}

impl StatBlock {
    pub const ALL: [StatBlock; 6] = [
        StatBlock::N2dTunnel,
        StatBlock::D2dTunnel,
        StatBlock::InlineFlowCreation,
        StatBlock::InlineFlowUpdate,
        StatBlock::InlineFlowDeletion,
        StatBlock::FlowAging,
    ];

    /// Value of the block's `*_STAT_START` marker.
    pub fn start(&self) -> SaiStatId {
        match self {
            StatBlock::N2dTunnel => SAI_HA_SESSION_N2D_TUNNEL_ENI_STAT_START,
            StatBlock::D2dTunnel => SAI_HA_SESSION_D2D_TUNNEL_ENI_STAT_START,
            StatBlock::InlineFlowCreation => {
                SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_CREATION_STAT_START
            }
            StatBlock::InlineFlowUpdate => SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_UPDATE_STAT_START,
            StatBlock::InlineFlowDeletion => {
                SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_DELETION_STAT_START
            }
            StatBlock::FlowAging => SAI_HA_SESSION_ENI_PIPELINE_FLOW_AGING_STAT_START,
        }
    }

    /// Value of the block's `*_STAT_END` marker.
    pub fn end(&self) -> SaiStatId {
        match self {
            StatBlock::N2dTunnel => SAI_HA_SESSION_N2D_TUNNEL_ENI_STAT_END,
            StatBlock::D2dTunnel => SAI_HA_SESSION_D2D_TUNNEL_ENI_STAT_END,
            StatBlock::InlineFlowCreation => SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_CREATION_STAT_END,
            StatBlock::InlineFlowUpdate => SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_UPDATE_STAT_END,
            StatBlock::InlineFlowDeletion => SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_DELETION_STAT_END,
            StatBlock::FlowAging => SAI_HA_SESSION_ENI_PIPELINE_FLOW_AGING_STAT_END,
        }
    }

    /// Ids of the counters in this block.
    ///
    /// The D2D start marker is not itself a counter.
    pub fn counter_range(&self) -> Range<SaiStatId> {
        match self {
            StatBlock::D2dTunnel => self.start() + 1..self.end(),
            _ => self.start()..self.end(),
        }
    }

    /// Returns true for the ENI pipeline sub-blocks, which carry latency
    /// gauges.
    pub fn is_eni_pipeline(&self) -> bool {
        !matches!(self, StatBlock::N2dTunnel | StatBlock::D2dTunnel)
    }

    pub fn name(&self) -> &'static str {
        match self {
            StatBlock::N2dTunnel => "n2d_tunnel",
            StatBlock::D2dTunnel => "d2d_tunnel",
            StatBlock::InlineFlowCreation => "inline_flow_creation",
            StatBlock::InlineFlowUpdate => "inline_flow_update",
            StatBlock::InlineFlowDeletion => "inline_flow_deletion",
            StatBlock::FlowAging => "flow_aging",
        }
    }
}

impl fmt::Display for StatBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a counter accumulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    /// Monotonic event count.
    Counter,
    /// Mean of latency samples, in nanoseconds.
    AverageLatencyNs,
    /// Smallest latency sample, in nanoseconds.
    MinLatencyNs,
    /// Largest latency sample, in nanoseconds.
    MaxLatencyNs,
}

impl StatKind {
    pub fn is_latency(&self) -> bool {
        !matches!(self, StatKind::Counter)
    }
}

macro_rules! ha_session_stats {
    ($( $variant:ident = $value:literal, $name:literal, $block:ident, $kind:ident; )*) => {
        /// HA session counter ids.
        #[repr(u32)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum HaSessionStat {
            $( $variant = $value, )*
        }

        impl HaSessionStat {
            /// Every standard counter, in id order.
            pub const ALL: &'static [HaSessionStat] = &[ $( HaSessionStat::$variant, )* ];

            pub fn from_raw(id: SaiStatId) -> Option<Self> {
                match id {
                    $( $value => Some(HaSessionStat::$variant), )*
                    _ => None,
                }
            }

            /// Full SAI enum name.
            pub fn sai_name(&self) -> &'static str {
                match self {
                    $( HaSessionStat::$variant => $name, )*
                }
            }

            pub fn block(&self) -> StatBlock {
                match self {
                    $( HaSessionStat::$variant => StatBlock::$block, )*
                }
            }

            pub fn kind(&self) -> StatKind {
                match self {
                    $( HaSessionStat::$variant => StatKind::$kind, )*
                }
            }
        }
    };
}

ha_session_stats! {
    N2dPacketsIn = 0x10000, "SAI_HA_SESSION_N2D_TUNNEL_ENI_STAT_PACKETS_IN", N2dTunnel, Counter;
    N2dPacketsOut = 0x10001, "SAI_HA_SESSION_N2D_TUNNEL_ENI_STAT_PACKETS_OUT", N2dTunnel, Counter;
    N2dBytesIn = 0x10002, "SAI_HA_SESSION_N2D_TUNNEL_ENI_STAT_BYTES_IN", N2dTunnel, Counter;
    N2dBytesOut = 0x10003, "SAI_HA_SESSION_N2D_TUNNEL_ENI_STAT_BYTES_OUT", N2dTunnel, Counter;
    N2dDiscardsIn = 0x10004, "SAI_HA_SESSION_N2D_TUNNEL_ENI_STAT_DISCARDS_IN", N2dTunnel, Counter;
    N2dDiscardsOut = 0x10005, "SAI_HA_SESSION_N2D_TUNNEL_ENI_STAT_DISCARDS_OUT", N2dTunnel, Counter;
    N2dErrorIn = 0x10006, "SAI_HA_SESSION_N2D_TUNNEL_ENI_STAT_ERROR_IN", N2dTunnel, Counter;
    N2dErrorOut = 0x10007, "SAI_HA_SESSION_N2D_TUNNEL_ENI_STAT_ERROR_OUT", N2dTunnel, Counter;
    N2dOversizeIn = 0x10008, "SAI_HA_SESSION_N2D_TUNNEL_ENI_STAT_OVERSIZE_IN", N2dTunnel, Counter;
    N2dOversizeOut = 0x10009, "SAI_HA_SESSION_N2D_TUNNEL_ENI_STAT_OVERSIZE_OUT", N2dTunnel, Counter;

    D2dInlineSyncPacketsIn = 0x20001, "SAI_HA_SESSION_D2D_TUNNEL_ENI_STAT_INLINE_SYNC_PACKETS_IN", D2dTunnel, Counter;
    D2dInlineSyncPacketsOut = 0x20002, "SAI_HA_SESSION_D2D_TUNNEL_ENI_STAT_INLINE_SYNC_PACKETS_OUT", D2dTunnel, Counter;
    D2dMetaSyncPacketsIn = 0x20003, "SAI_HA_SESSION_D2D_TUNNEL_ENI_STAT_META_SYNC_PACKETS_IN", D2dTunnel, Counter;
    D2dMetaSyncPacketsOut = 0x20004, "SAI_HA_SESSION_D2D_TUNNEL_ENI_STAT_META_SYNC_PACKETS_OUT", D2dTunnel, Counter;
    D2dProbePacketsIn = 0x20005, "SAI_HA_SESSION_D2D_TUNNEL_ENI_STAT_PROBE_PACKETS_IN", D2dTunnel, Counter;
    D2dProbePacketsOut = 0x20006, "SAI_HA_SESSION_D2D_TUNNEL_ENI_STAT_PROBE_PACKETS_OUT", D2dTunnel, Counter;

    InlineFlowCreationReqSent = 0x30100, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_CREATION_STAT_REQ_SENT", InlineFlowCreation, Counter;
    InlineFlowCreationReqRecv = 0x30101, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_CREATION_STAT_REQ_RECV", InlineFlowCreation, Counter;
    InlineFlowCreationReqAckSent = 0x30102, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_CREATION_STAT_REQ_ACK_SENT", InlineFlowCreation, Counter;
    InlineFlowCreationReqAckRecv = 0x30103, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_CREATION_STAT_REQ_ACK_RECV", InlineFlowCreation, Counter;
    InlineFlowCreationStandbyFlowCreated = 0x30104, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_CREATION_STAT_STANDBY_FLOW_CREATED", InlineFlowCreation, Counter;
    InlineFlowCreationActiveFlowCreated = 0x30105, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_CREATION_STAT_ACTIVE_FLOW_CREATED", InlineFlowCreation, Counter;
    InlineFlowCreationAverageLatencyInNs = 0x30106, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_CREATION_STAT_AVERAGE_LATENCY_IN_NS", InlineFlowCreation, AverageLatencyNs;
    InlineFlowCreationMinLatencyInNs = 0x30107, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_CREATION_STAT_MIN_LATENCY_IN_NS", InlineFlowCreation, MinLatencyNs;
    InlineFlowCreationMaxLatencyInNs = 0x30108, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_CREATION_STAT_MAX_LATENCY_IN_NS", InlineFlowCreation, MaxLatencyNs;
    InlineFlowCreationFailed = 0x30109, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_CREATION_STAT_FAILED", InlineFlowCreation, Counter;
    InlineFlowCreationFailedOom = 0x3010A, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_CREATION_STAT_FAILED_OOM", InlineFlowCreation, Counter;
    InlineFlowCreationFailedFlowConflicts = 0x3010B, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_CREATION_STAT_FAILED_FLOW_CONFLICTS", InlineFlowCreation, Counter;
    InlineFlowCreationFlowOverrided = 0x3010C, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_CREATION_STAT_FLOW_OVERRIDED", InlineFlowCreation, Counter;

    InlineFlowUpdateReqSent = 0x30200, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_UPDATE_STAT_REQ_SENT", InlineFlowUpdate, Counter;
    InlineFlowUpdateReqRecv = 0x30201, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_UPDATE_STAT_REQ_RECV", InlineFlowUpdate, Counter;
    InlineFlowUpdateReqAckSent = 0x30202, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_UPDATE_STAT_REQ_ACK_SENT", InlineFlowUpdate, Counter;
    InlineFlowUpdateReqAckRecv = 0x30203, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_UPDATE_STAT_REQ_ACK_RECV", InlineFlowUpdate, Counter;
    InlineFlowUpdateStandbyFlowUpdated = 0x30204, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_UPDATE_STAT_STANDBY_FLOW_UPDATED", InlineFlowUpdate, Counter;
    InlineFlowUpdateActiveFlowUpdated = 0x30205, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_UPDATE_STAT_ACTIVE_FLOW_UPDATED", InlineFlowUpdate, Counter;
    InlineFlowUpdateAverageLatencyInNs = 0x30206, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_UPDATE_STAT_AVERAGE_LATENCY_IN_NS", InlineFlowUpdate, AverageLatencyNs;
    InlineFlowUpdateMinLatencyInNs = 0x30207, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_UPDATE_STAT_MIN_LATENCY_IN_NS", InlineFlowUpdate, MinLatencyNs;
    InlineFlowUpdateMaxLatencyInNs = 0x30208, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_UPDATE_STAT_MAX_LATENCY_IN_NS", InlineFlowUpdate, MaxLatencyNs;
    InlineFlowUpdateFailed = 0x30209, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_UPDATE_STAT_FAILED", InlineFlowUpdate, Counter;
    InlineFlowUpdateFailedOom = 0x3020A, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_UPDATE_STAT_FAILED_OOM", InlineFlowUpdate, Counter;
    InlineFlowUpdateFailedFlowNotFound = 0x3020B, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_UPDATE_STAT_FAILED_FLOW_NOT_FOUND", InlineFlowUpdate, Counter;
    InlineFlowUpdateFailedFlowConflicts = 0x3020C, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_UPDATE_STAT_FAILED_FLOW_CONFLICTS", InlineFlowUpdate, Counter;
    InlineFlowUpdateFlowOverrided = 0x3020D, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_UPDATE_STAT_FLOW_OVERRIDED", InlineFlowUpdate, Counter;

    InlineFlowDeletionReqSent = 0x30300, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_DELETION_STAT_REQ_SENT", InlineFlowDeletion, Counter;
    InlineFlowDeletionReqRecv = 0x30301, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_DELETION_STAT_REQ_RECV", InlineFlowDeletion, Counter;
    InlineFlowDeletionReqAckSent = 0x30302, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_DELETION_STAT_REQ_ACK_SENT", InlineFlowDeletion, Counter;
    InlineFlowDeletionReqAckRecv = 0x30303, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_DELETION_STAT_REQ_ACK_RECV", InlineFlowDeletion, Counter;
    InlineFlowDeletionStandbyFlowDeleted = 0x30304, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_DELETION_STAT_STANDBY_FLOW_DELETED", InlineFlowDeletion, Counter;
    InlineFlowDeletionActiveFlowDeleted = 0x30305, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_DELETION_STAT_ACTIVE_FLOW_DELETED", InlineFlowDeletion, Counter;
    InlineFlowDeletionAverageLatencyInNs = 0x30306, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_DELETION_STAT_AVERAGE_LATENCY_IN_NS", InlineFlowDeletion, AverageLatencyNs;
    InlineFlowDeletionMinLatencyInNs = 0x30307, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_DELETION_STAT_MIN_LATENCY_IN_NS", InlineFlowDeletion, MinLatencyNs;
    InlineFlowDeletionMaxLatencyInNs = 0x30308, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_DELETION_STAT_MAX_LATENCY_IN_NS", InlineFlowDeletion, MaxLatencyNs;
    InlineFlowDeletionFailed = 0x30309, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_DELETION_STAT_FAILED", InlineFlowDeletion, Counter;
    InlineFlowDeletionFailedOom = 0x3030A, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_DELETION_STAT_FAILED_OOM", InlineFlowDeletion, Counter;
    InlineFlowDeletionFailedFlowNotFound = 0x3030B, "SAI_HA_SESSION_ENI_PIPELINE_INLINE_FLOW_DELETION_STAT_FAILED_FLOW_NOT_FOUND", InlineFlowDeletion, Counter;

    FlowAgingReqSent = 0x30400, "SAI_HA_SESSION_ENI_PIPELINE_FLOW_AGING_STAT_REQ_SENT", FlowAging, Counter;
    FlowAgingReqRecv = 0x30401, "SAI_HA_SESSION_ENI_PIPELINE_FLOW_AGING_STAT_REQ_RECV", FlowAging, Counter;
    FlowAgingReqAckSent = 0x30402, "SAI_HA_SESSION_ENI_PIPELINE_FLOW_AGING_STAT_REQ_ACK_SENT", FlowAging, Counter;
    FlowAgingReqAckRecv = 0x30403, "SAI_HA_SESSION_ENI_PIPELINE_FLOW_AGING_STAT_REQ_ACK_RECV", FlowAging, Counter;
    FlowAgingStandbyFlowDeleted = 0x30404, "SAI_HA_SESSION_ENI_PIPELINE_FLOW_AGING_STAT_STANDBY_FLOW_DELETED", FlowAging, Counter;
    FlowAgingActiveFlowDeleted = 0x30405, "SAI_HA_SESSION_ENI_PIPELINE_FLOW_AGING_STAT_ACTIVE_FLOW_DELETED", FlowAging, Counter;
    FlowAgingAverageLatencyInNs = 0x30406, "SAI_HA_SESSION_ENI_PIPELINE_FLOW_AGING_STAT_AVERAGE_LATENCY_IN_NS", FlowAging, AverageLatencyNs;
    FlowAgingMinLatencyInNs = 0x30407, "SAI_HA_SESSION_ENI_PIPELINE_FLOW_AGING_STAT_MIN_LATENCY_IN_NS", FlowAging, MinLatencyNs;
    FlowAgingMaxLatencyInNs = 0x30408, "SAI_HA_SESSION_ENI_PIPELINE_FLOW_AGING_STAT_MAX_LATENCY_IN_NS", FlowAging, MaxLatencyNs;
    FlowAgingFailed = 0x30409, "SAI_HA_SESSION_ENI_PIPELINE_FLOW_AGING_STAT_FAILED", FlowAging, Counter;
    FlowAgingFailedOom = 0x3040A, "SAI_HA_SESSION_ENI_PIPELINE_FLOW_AGING_STAT_FAILED_OOM", FlowAging, Counter;
    FlowAgingFailedFlowNotFound = 0x3040B, "SAI_HA_SESSION_ENI_PIPELINE_FLOW_AGING_STAT_FAILED_FLOW_NOT_FOUND", FlowAging, Counter;
}

impl HaSessionStat {
    pub const fn as_raw(self) -> SaiStatId {
        self as SaiStatId
    }

    /// Returns the latency gauge of the given kind in a pipeline block.
    pub fn latency_stat(block: StatBlock, kind: StatKind) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.block() == block && s.kind() == kind && kind.is_latency())
    }
}

impl From<HaSessionStat> for SaiStatId {
    fn from(stat: HaSessionStat) -> Self {
        stat.as_raw()
    }
}

impl fmt::Display for HaSessionStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sai_name())
    }
}

/// Classification of a raw stat id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatIdClass {
    /// A standard counter.
    Counter(HaSessionStat),
    /// A block start/end marker that names no counter.
    Marker,
    /// Vendor custom range.
    Custom,
    /// Not defined anywhere.
    Unknown,
}

/// Classifies a raw stat id.
pub fn classify_stat_id(id: SaiStatId) -> StatIdClass {
    if let Some(stat) = HaSessionStat::from_raw(id) {
        return StatIdClass::Counter(stat);
    }
    if id >= SAI_DASH_HA_SESSION_STAT_CUSTOM_RANGE_START {
        return StatIdClass::Custom;
    }
    let is_marker = id == SAI_HA_SESSION_ENI_PIPELINE_STAT_START
        || id == SAI_HA_SESSION_ENI_PIPELINE_STAT_END
        || StatBlock::ALL
            .iter()
            .any(|b| id == b.start() || id == b.end());
    if is_marker {
        StatIdClass::Marker
    } else {
        StatIdClass::Unknown
    }
}

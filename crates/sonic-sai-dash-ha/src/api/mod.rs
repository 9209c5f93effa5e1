//! The DASH HA API (`sai_dash_ha_api_t`) as a Rust trait.
//!
//! [`DashHaApi`] mirrors the eleven entries of the C dispatch table one to
//! one and works on raw attribute lists. [`DashHaApiExt`] layers typed
//! helpers on top of it and is implemented for every adapter.
//!
//! - [`pair`]: HA pair configuration
//! - [`session`]: HA session configuration

pub mod pair;
pub mod session;

use std::fmt;

use crate::attr::{AttrValue, SaiAttrId, SaiAttribute};
use crate::error::{SaiError, SaiResult};
use crate::schema::{DashHaPairAttr, DashHaRole, DashHaSessionAttr};
use crate::stats::{HaSessionStat, SaiStatId};
use crate::types::{DashHaPairOid, DashHaSessionOid, SwitchOid};

pub use pair::{HaPairConfig, PortRange};
pub use session::HaSessionConfig;

/// Counter read mode (`sai_stats_mode_t`).
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatsMode {
    /// Read counters.
    #[default]
    Read = 1,
    /// Read counters, then reset them.
    ReadAndClear = 2,
    BulkRead = 4,
    BulkClear = 8,
    BulkReadAndClear = 16,
}

impl StatsMode {
    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            1 => Some(StatsMode::Read),
            2 => Some(StatsMode::ReadAndClear),
            4 => Some(StatsMode::BulkRead),
            8 => Some(StatsMode::BulkClear),
            16 => Some(StatsMode::BulkReadAndClear),
            _ => None,
        }
    }

    /// Returns true for the bulk modes, which apply to bulk stats calls only.
    pub fn is_bulk(&self) -> bool {
        matches!(
            self,
            StatsMode::BulkRead | StatsMode::BulkClear | StatsMode::BulkReadAndClear
        )
    }

    pub fn clears(&self) -> bool {
        matches!(self, StatsMode::ReadAndClear | StatsMode::BulkReadAndClear)
    }
}

impl fmt::Display for StatsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatsMode::Read => "SAI_STATS_MODE_READ",
            StatsMode::ReadAndClear => "SAI_STATS_MODE_READ_AND_CLEAR",
            StatsMode::BulkRead => "SAI_STATS_MODE_BULK_READ",
            StatsMode::BulkClear => "SAI_STATS_MODE_BULK_CLEAR",
            StatsMode::BulkReadAndClear => "SAI_STATS_MODE_BULK_READ_AND_CLEAR",
        })
    }
}

/// The DASH HA method table.
///
/// Implementations must run metadata validation (see [`crate::meta`]) so
/// that every adapter reports malformed requests the same way.
pub trait DashHaApi: Send + Sync {
    /// Creates an HA pair on `switch_id`.
    fn create_dash_ha_pair(
        &self,
        switch_id: SwitchOid,
        attrs: &[SaiAttribute],
    ) -> SaiResult<DashHaPairOid>;

    /// Removes an HA pair.
    fn remove_dash_ha_pair(&self, pair: DashHaPairOid) -> SaiResult<()>;

    /// Sets one HA pair attribute.
    fn set_dash_ha_pair_attribute(&self, pair: DashHaPairOid, attr: &SaiAttribute)
        -> SaiResult<()>;

    /// Reads HA pair attributes, returned in request order.
    fn get_dash_ha_pair_attribute(
        &self,
        pair: DashHaPairOid,
        ids: &[SaiAttrId],
    ) -> SaiResult<Vec<SaiAttribute>>;

    /// Creates an HA session on `switch_id`.
    fn create_dash_ha_session(
        &self,
        switch_id: SwitchOid,
        attrs: &[SaiAttribute],
    ) -> SaiResult<DashHaSessionOid>;

    /// Removes an HA session.
    fn remove_dash_ha_session(&self, session: DashHaSessionOid) -> SaiResult<()>;

    /// Sets one HA session attribute.
    fn set_dash_ha_session_attribute(
        &self,
        session: DashHaSessionOid,
        attr: &SaiAttribute,
    ) -> SaiResult<()>;

    /// Reads HA session attributes, returned in request order.
    fn get_dash_ha_session_attribute(
        &self,
        session: DashHaSessionOid,
        ids: &[SaiAttrId],
    ) -> SaiResult<Vec<SaiAttribute>>;

    /// Reads HA session counters, returned in request order.
    fn get_ha_session_stats(
        &self,
        session: DashHaSessionOid,
        counter_ids: &[SaiStatId],
    ) -> SaiResult<Vec<u64>> {
        self.get_ha_session_stats_ext(session, counter_ids, StatsMode::Read)
    }

    /// Reads HA session counters with an explicit mode.
    fn get_ha_session_stats_ext(
        &self,
        session: DashHaSessionOid,
        counter_ids: &[SaiStatId],
        mode: StatsMode,
    ) -> SaiResult<Vec<u64>>;

    /// Resets HA session counters.
    fn clear_ha_session_stats(
        &self,
        session: DashHaSessionOid,
        counter_ids: &[SaiStatId],
    ) -> SaiResult<()>;
}

/// Typed helpers over [`DashHaApi`].
pub trait DashHaApiExt: DashHaApi {
    /// Creates an HA pair from a typed configuration.
    fn create_ha_pair(&self, switch_id: SwitchOid, config: &HaPairConfig) -> SaiResult<DashHaPairOid> {
        self.create_dash_ha_pair(switch_id, &config.to_attributes())
    }

    /// Reads back the full configuration of an HA pair.
    fn get_ha_pair(&self, pair: DashHaPairOid) -> SaiResult<HaPairConfig> {
        let ids: Vec<SaiAttrId> = DashHaPairAttr::ALL.iter().map(|a| a.as_raw()).collect();
        let attrs = self.get_dash_ha_pair_attribute(pair, &ids)?;
        HaPairConfig::from_attributes(&attrs)
    }

    /// Creates an HA session from a typed configuration.
    fn create_ha_session(
        &self,
        switch_id: SwitchOid,
        config: &HaSessionConfig,
    ) -> SaiResult<DashHaSessionOid> {
        self.create_dash_ha_session(switch_id, &config.to_attributes())
    }

    /// Reads back the full configuration of an HA session, role included.
    fn get_ha_session(&self, session: DashHaSessionOid) -> SaiResult<HaSessionConfig> {
        let ids: Vec<SaiAttrId> = DashHaSessionAttr::ALL.iter().map(|a| a.as_raw()).collect();
        let attrs = self.get_dash_ha_session_attribute(session, &ids)?;
        HaSessionConfig::from_attributes(&attrs)
    }

    /// Changes the HA role of a session.
    fn set_ha_role(&self, session: DashHaSessionOid, role: DashHaRole) -> SaiResult<()> {
        self.set_dash_ha_session_attribute(
            session,
            &DashHaSessionAttr::HaRole.attr(AttrValue::S32(role.as_raw())),
        )
    }

    /// Reads the HA role of a session.
    fn get_ha_role(&self, session: DashHaSessionOid) -> SaiResult<DashHaRole> {
        let attrs =
            self.get_dash_ha_session_attribute(session, &[DashHaSessionAttr::HaRole.as_raw()])?;
        attrs
            .first()
            .and_then(|a| a.value.as_s32())
            .and_then(DashHaRole::from_raw)
            .ok_or_else(|| SaiError::internal(format!("adapter returned no HA role for {}", session)))
    }

    /// Reads typed counters, paired with their values.
    fn get_session_counters(
        &self,
        session: DashHaSessionOid,
        stats: &[HaSessionStat],
        mode: StatsMode,
    ) -> SaiResult<Vec<(HaSessionStat, u64)>> {
        let ids: Vec<SaiStatId> = stats.iter().map(|s| s.as_raw()).collect();
        let values = self.get_ha_session_stats_ext(session, &ids, mode)?;
        if values.len() != stats.len() {
            return Err(SaiError::internal(format!(
                "adapter returned {} counters, {} requested",
                values.len(),
                stats.len()
            )));
        }
        Ok(stats.iter().copied().zip(values).collect())
    }

    /// Resets typed counters.
    fn clear_session_counters(
        &self,
        session: DashHaSessionOid,
        stats: &[HaSessionStat],
    ) -> SaiResult<()> {
        let ids: Vec<SaiStatId> = stats.iter().map(|s| s.as_raw()).collect();
        self.clear_ha_session_stats(session, &ids)
    }
}

impl<T: DashHaApi + ?Sized> DashHaApiExt for T {}

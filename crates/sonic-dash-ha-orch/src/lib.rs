//! SONiC DASH HA orchestration.
//!
//! Consumes the DASH HA pair and session tables, programs them through a
//! [`sonic_sai_dash_ha::DashHaApi`] implementation and keeps the HA session
//! state table in step with the HA scope events the switch reports.

pub mod audit;
pub mod config;
pub mod dash_ha;
pub mod runner;

pub use config::{ConfigError, DashHaConfigFile};
pub use dash_ha::{
    DashHaOrch, DashHaOrchCallbacks, DashHaOrchConfig, DashHaOrchError, DashHaOrchStats,
    HaTable, KeyOpFieldsValues, LocalHaState, Operation,
};
pub use runner::{run, DashHaReport, RunError, RunOptions};

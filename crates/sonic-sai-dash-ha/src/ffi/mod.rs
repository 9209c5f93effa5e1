//! C ABI for the DASH HA API.
//!
//! - [`types`]: `#[repr(C)]` SAI types and value conversions
//! - [`export`]: serve a Rust adapter through `sai_dash_ha_api_t`
//! - [`import`]: drive a C `sai_dash_ha_api_t` through [`crate::DashHaApi`]
//!
//! # Safety
//!
//! Exported entries check every pointer they dereference and return
//! `SAI_STATUS_INVALID_PARAMETER` for null ones. Buffers handed to HA scope
//! callbacks are only valid for the duration of the callback.

pub mod export;
pub mod import;
pub mod types;

pub use export::{
    dash_ha_api_table, install_dash_ha_api, is_dash_ha_api_installed, sai_dash_ha_api_query,
    sai_dash_ha_set_switch_attribute, uninstall_dash_ha_api,
};
pub use import::ForeignDashHaApi;
pub use types::{
    sai_attribute_t, sai_attribute_value_t, sai_dash_ha_api_t, sai_ha_scope_event_data_t,
    sai_ha_scope_event_notification_fn, sai_status_t,
};

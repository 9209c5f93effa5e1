//! Wraps a C `sai_dash_ha_api_t` as a Rust [`DashHaApi`].
//!
//! With a switch attribute setter attached, the wrapper also registers HA
//! scope callbacks ([`SwitchHaExtension`]). C callbacks carry no context, so
//! the registered Rust callback lives in a process-wide slot that a single
//! `extern "C"` trampoline dispatches to.

use std::fmt;
use std::sync::RwLock;

use once_cell::sync::Lazy;

use super::types::*;
use crate::api::{DashHaApi, StatsMode};
use crate::attr::{SaiAttrId, SaiAttribute};
use crate::error::{SaiError, SaiResult, SaiStatus, SaiStatusExt};
use crate::schema::{DASH_HA_PAIR_SCHEMA, DASH_HA_SESSION_SCHEMA};
use crate::stats::SaiStatId;
use crate::switch::{
    HaScopeEvent, HaScopeEventData, HaScopeEventNotification, SwitchAttrExtensionRange,
    SwitchHaExtension,
};
use crate::types::{DashHaPairOid, DashHaSessionOid, HaScopeOid, SwitchOid};

static FOREIGN_HA_SCOPE_NOTIFY: Lazy<RwLock<Option<HaScopeEventNotification>>> =
    Lazy::new(|| RwLock::new(None));

fn store_notify(notify: Option<HaScopeEventNotification>) {
    match FOREIGN_HA_SCOPE_NOTIFY.write() {
        Ok(mut slot) => *slot = notify,
        Err(poisoned) => *poisoned.into_inner() = notify,
    }
}

fn registered_notify() -> Option<HaScopeEventNotification> {
    FOREIGN_HA_SCOPE_NOTIFY
        .read()
        .ok()
        .and_then(|slot| slot.clone())
}

fn event_from_raw(raw: &sai_ha_scope_event_data_t) -> Option<HaScopeEventData> {
    let event_type = match HaScopeEvent::from_raw(raw.event_type) {
        Some(event_type) => event_type,
        None => {
            log::debug!("Ignoring unknown HA scope event type {}", raw.event_type);
            return None;
        }
    };
    let attrs: &[sai_attribute_t] = if raw.attr.is_null() || raw.attr_count == 0 {
        &[]
    } else {
        // SAFETY: the library passes attr_count valid attributes for the
        // duration of the callback.
        unsafe { std::slice::from_raw_parts(raw.attr, raw.attr_count as usize) }
    };
    let attrs = attrs
        .iter()
        .enumerate()
        .filter_map(|(index, a)| match attr_from_raw(&DASH_HA_SESSION_SCHEMA, index, a) {
            Ok(attr) => Some(attr),
            Err(e) => {
                log::debug!("Dropping HA scope event attribute 0x{:x}: {}", a.id, e);
                None
            }
        })
        .collect();
    Some(HaScopeEventData {
        event_type,
        ha_scope_id: HaScopeOid::from_raw_unchecked(raw.ha_scope_id),
        attrs,
    })
}

unsafe extern "C" fn ha_scope_event_trampoline(count: u32, data: *const sai_ha_scope_event_data_t) {
    let notify = match registered_notify() {
        Some(notify) => notify,
        None => return,
    };
    if data.is_null() || count == 0 {
        return;
    }
    let events: Vec<HaScopeEventData> = std::slice::from_raw_parts(data, count as usize)
        .iter()
        .filter_map(event_from_raw)
        .collect();
    if !events.is_empty() {
        notify(&events);
    }
}

/// A DASH HA method table obtained from a SAI library.
#[derive(Clone, Copy)]
pub struct ForeignDashHaApi {
    table: sai_dash_ha_api_t,
    set_switch_attribute: sai_generic_set_fn,
    range: Option<SwitchAttrExtensionRange>,
}

impl ForeignDashHaApi {
    /// Wraps a method table.
    ///
    /// # Safety
    ///
    /// Every non-null entry must follow the SAI calling convention for its
    /// slot and stay valid for the lifetime of the wrapper.
    pub unsafe fn from_table(table: sai_dash_ha_api_t) -> Self {
        Self {
            table,
            set_switch_attribute: None,
            range: None,
        }
    }

    /// Attaches the library's switch attribute setter, used to register HA
    /// scope callbacks at `range`.
    ///
    /// # Safety
    ///
    /// `set_switch_attribute` must follow the signature of
    /// `sai_switch_api_t::set_switch_attribute` and stay valid for the
    /// lifetime of the wrapper.
    pub unsafe fn with_switch_attribute(
        mut self,
        set_switch_attribute: unsafe extern "C" fn(
            sai_object_id_t,
            *const sai_attribute_t,
        ) -> sai_status_t,
        range: SwitchAttrExtensionRange,
    ) -> Self {
        self.set_switch_attribute = Some(set_switch_attribute);
        self.range = Some(range);
        self
    }

    pub fn table(&self) -> &sai_dash_ha_api_t {
        &self.table
    }
}

impl fmt::Debug for ForeignDashHaApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignDashHaApi")
            .field("table", &self.table)
            .field("set_switch_attribute", &self.set_switch_attribute.is_some())
            .field("range", &self.range)
            .finish()
    }
}

fn entry<T>(slot: Option<T>, name: &str) -> SaiResult<T> {
    slot.ok_or_else(|| {
        log::debug!("DASH HA table entry {} is null", name);
        SaiError::from_status(SaiStatus::NotImplemented)
    })
}

fn count(len: usize, what: &str) -> SaiResult<u32> {
    u32::try_from(len).map_err(|_| SaiError::invalid_parameter(format!("too many {}", what)))
}

impl DashHaApi for ForeignDashHaApi {
    fn create_dash_ha_pair(
        &self,
        switch_id: SwitchOid,
        attrs: &[SaiAttribute],
    ) -> SaiResult<DashHaPairOid> {
        let f = entry(self.table.create_dash_ha_pair, "create_dash_ha_pair")?;
        let raw: Vec<sai_attribute_t> = attrs.iter().map(attr_to_raw).collect();
        let mut oid: sai_object_id_t = 0;
        unsafe { f(&mut oid, switch_id.as_raw(), count(raw.len(), "attributes")?, raw.as_ptr()) }
            .to_result()?;
        Ok(DashHaPairOid::from_raw_unchecked(oid))
    }

    fn remove_dash_ha_pair(&self, pair: DashHaPairOid) -> SaiResult<()> {
        let f = entry(self.table.remove_dash_ha_pair, "remove_dash_ha_pair")?;
        unsafe { f(pair.as_raw()) }.to_result()
    }

    fn set_dash_ha_pair_attribute(&self, pair: DashHaPairOid, attr: &SaiAttribute) -> SaiResult<()> {
        let f = entry(self.table.set_dash_ha_pair_attribute, "set_dash_ha_pair_attribute")?;
        let raw = attr_to_raw(attr);
        unsafe { f(pair.as_raw(), &raw) }.to_result()
    }

    fn get_dash_ha_pair_attribute(
        &self,
        pair: DashHaPairOid,
        ids: &[SaiAttrId],
    ) -> SaiResult<Vec<SaiAttribute>> {
        let f = entry(self.table.get_dash_ha_pair_attribute, "get_dash_ha_pair_attribute")?;
        let mut raw: Vec<sai_attribute_t> = ids.iter().map(|id| sai_attribute_t::request(*id)).collect();
        unsafe { f(pair.as_raw(), count(raw.len(), "attributes")?, raw.as_mut_ptr()) }
            .to_result()?;
        raw.iter()
            .enumerate()
            .map(|(index, a)| attr_from_raw(&DASH_HA_PAIR_SCHEMA, index, a))
            .collect()
    }

    fn create_dash_ha_session(
        &self,
        switch_id: SwitchOid,
        attrs: &[SaiAttribute],
    ) -> SaiResult<DashHaSessionOid> {
        let f = entry(self.table.create_dash_ha_session, "create_dash_ha_session")?;
        let raw: Vec<sai_attribute_t> = attrs.iter().map(attr_to_raw).collect();
        let mut oid: sai_object_id_t = 0;
        unsafe { f(&mut oid, switch_id.as_raw(), count(raw.len(), "attributes")?, raw.as_ptr()) }
            .to_result()?;
        Ok(DashHaSessionOid::from_raw_unchecked(oid))
    }

    fn remove_dash_ha_session(&self, session: DashHaSessionOid) -> SaiResult<()> {
        let f = entry(self.table.remove_dash_ha_session, "remove_dash_ha_session")?;
        unsafe { f(session.as_raw()) }.to_result()
    }

    fn set_dash_ha_session_attribute(
        &self,
        session: DashHaSessionOid,
        attr: &SaiAttribute,
    ) -> SaiResult<()> {
        let f = entry(
            self.table.set_dash_ha_session_attribute,
            "set_dash_ha_session_attribute",
        )?;
        let raw = attr_to_raw(attr);
        unsafe { f(session.as_raw(), &raw) }.to_result()
    }

    fn get_dash_ha_session_attribute(
        &self,
        session: DashHaSessionOid,
        ids: &[SaiAttrId],
    ) -> SaiResult<Vec<SaiAttribute>> {
        let f = entry(
            self.table.get_dash_ha_session_attribute,
            "get_dash_ha_session_attribute",
        )?;
        let mut raw: Vec<sai_attribute_t> = ids.iter().map(|id| sai_attribute_t::request(*id)).collect();
        unsafe { f(session.as_raw(), count(raw.len(), "attributes")?, raw.as_mut_ptr()) }
            .to_result()?;
        raw.iter()
            .enumerate()
            .map(|(index, a)| attr_from_raw(&DASH_HA_SESSION_SCHEMA, index, a))
            .collect()
    }

    fn get_ha_session_stats(
        &self,
        session: DashHaSessionOid,
        counter_ids: &[SaiStatId],
    ) -> SaiResult<Vec<u64>> {
        let f = entry(self.table.get_ha_session_stats, "get_ha_session_stats")?;
        let mut counters = vec![0u64; counter_ids.len()];
        unsafe {
            f(
                session.as_raw(),
                count(counter_ids.len(), "counters")?,
                counter_ids.as_ptr(),
                counters.as_mut_ptr(),
            )
        }
        .to_result()?;
        Ok(counters)
    }

    fn get_ha_session_stats_ext(
        &self,
        session: DashHaSessionOid,
        counter_ids: &[SaiStatId],
        mode: StatsMode,
    ) -> SaiResult<Vec<u64>> {
        let f = entry(self.table.get_ha_session_stats_ext, "get_ha_session_stats_ext")?;
        let mut counters = vec![0u64; counter_ids.len()];
        unsafe {
            f(
                session.as_raw(),
                count(counter_ids.len(), "counters")?,
                counter_ids.as_ptr(),
                mode.as_raw(),
                counters.as_mut_ptr(),
            )
        }
        .to_result()?;
        Ok(counters)
    }

    fn clear_ha_session_stats(
        &self,
        session: DashHaSessionOid,
        counter_ids: &[SaiStatId],
    ) -> SaiResult<()> {
        let f = entry(self.table.clear_ha_session_stats, "clear_ha_session_stats")?;
        unsafe {
            f(
                session.as_raw(),
                count(counter_ids.len(), "counters")?,
                counter_ids.as_ptr(),
            )
        }
        .to_result()
    }
}

impl SwitchHaExtension for ForeignDashHaApi {
    fn set_ha_scope_event_notify(
        &self,
        switch_id: SwitchOid,
        notify: Option<HaScopeEventNotification>,
    ) -> SaiResult<()> {
        let (f, range) = match (self.set_switch_attribute, self.range) {
            (Some(f), Some(range)) => (f, range),
            _ => {
                log::debug!("No switch attribute setter attached to the DASH HA table");
                return Err(SaiError::from_status(SaiStatus::NotImplemented));
            }
        };

        let mut value = sai_attribute_value_t::default();
        value.ptr = if notify.is_some() {
            let trampoline: unsafe extern "C" fn(u32, *const sai_ha_scope_event_data_t) =
                ha_scope_event_trampoline;
            trampoline as *mut std::ffi::c_void
        } else {
            std::ptr::null_mut()
        };
        let attr = sai_attribute_t {
            id: range.ha_scope_event_notify(),
            value,
        };

        // The slot is filled first so events raised during registration
        // reach the new callback.
        let registering = notify.is_some();
        if registering {
            store_notify(notify);
        }
        let result = unsafe { f(switch_id.as_raw(), &attr) }.to_result();
        if !registering || result.is_err() {
            store_notify(None);
        }
        result
    }

    fn has_ha_scope_event_notify(&self, _switch_id: SwitchOid) -> SaiResult<bool> {
        Ok(registered_notify().is_some())
    }
}

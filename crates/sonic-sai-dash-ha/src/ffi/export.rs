//! Exposes a Rust [`DashHaApi`] as a C `sai_dash_ha_api_t`.
//!
//! One adapter is installed process-wide with [`install_dash_ha_api`]. The
//! `extern "C"` entries of [`dash_ha_api_table`] check their pointers,
//! decode attribute lists against the object schema and forward to the
//! installed adapter. Every entry returns `SAI_STATUS_UNINITIALIZED` while
//! nothing is installed.

use std::ffi::c_void;
use std::slice;
use std::sync::{Arc, RwLock};

use log::{debug, info};
use once_cell::sync::Lazy;

use super::types::*;
use crate::api::{DashHaApi, StatsMode};
use crate::attr::{SaiAttrId, SaiAttribute};
use crate::error::{SaiError, SaiResult, SaiStatus};
use crate::schema::{ObjectSchema, DASH_HA_PAIR_SCHEMA, DASH_HA_SESSION_SCHEMA};
use crate::switch::{
    HaScopeEventData, HaScopeEventNotification, SwitchAttrExtension, SwitchAttrExtensionRange,
    SwitchHaExtension,
};
use crate::types::{DashHaPairOid, DashHaSessionOid, SwitchOid};

#[derive(Clone)]
struct Installed {
    api: Arc<dyn DashHaApi>,
    switch: Arc<dyn SwitchHaExtension>,
    range: SwitchAttrExtensionRange,
}

static INSTALLED: Lazy<RwLock<Option<Installed>>> = Lazy::new(|| RwLock::new(None));

/// Installs `adapter` behind the C entry points, replacing any previous one.
pub fn install_dash_ha_api<T>(adapter: Arc<T>, range: SwitchAttrExtensionRange)
where
    T: DashHaApi + SwitchHaExtension + 'static,
{
    let installed = Installed {
        api: adapter.clone(),
        switch: adapter,
        range,
    };
    match INSTALLED.write() {
        Ok(mut slot) => *slot = Some(installed),
        Err(poisoned) => *poisoned.into_inner() = Some(installed),
    }
    info!(
        "DASH HA API installed, HA scope event attribute 0x{:x}",
        range.ha_scope_event_notify()
    );
}

/// Removes the installed adapter.
pub fn uninstall_dash_ha_api() {
    match INSTALLED.write() {
        Ok(mut slot) => *slot = None,
        Err(poisoned) => *poisoned.into_inner() = None,
    }
    info!("DASH HA API uninstalled");
}

/// Returns true while an adapter is installed.
pub fn is_dash_ha_api_installed() -> bool {
    INSTALLED.read().map(|slot| slot.is_some()).unwrap_or(false)
}

fn status_of(result: SaiResult<()>) -> sai_status_t {
    match result {
        Ok(()) => SaiStatus::Success.as_raw(),
        Err(e) => {
            debug!("DASH HA call failed: {}", e);
            e.status().as_raw()
        }
    }
}

/// Runs `f` against a snapshot of the installed adapter.
///
/// The slot lock is released before `f` runs, so HA scope callbacks fired
/// by the adapter may re-enter the table or (un)install an adapter.
fn with_installed<F>(f: F) -> sai_status_t
where
    F: FnOnce(&Installed) -> SaiResult<()>,
{
    let installed = match INSTALLED.read() {
        Ok(slot) => slot.clone(),
        Err(_) => return SaiStatus::Failure.as_raw(),
    };
    match installed {
        Some(installed) => status_of(f(&installed)),
        None => SaiStatus::Uninitialized.as_raw(),
    }
}

/// Views a C array as a slice; a zero count accepts a null pointer.
unsafe fn raw_slice<'a, T>(ptr: *const T, count: u32, what: &str) -> SaiResult<&'a [T]> {
    if count == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(SaiError::invalid_parameter(format!("{} is null", what)));
    }
    Ok(slice::from_raw_parts(ptr, count as usize))
}

unsafe fn raw_slice_mut<'a, T>(ptr: *mut T, count: u32, what: &str) -> SaiResult<&'a mut [T]> {
    if count == 0 {
        return Err(SaiError::invalid_parameter(format!("{} count is zero", what)));
    }
    if ptr.is_null() {
        return Err(SaiError::invalid_parameter(format!("{} is null", what)));
    }
    Ok(slice::from_raw_parts_mut(ptr, count as usize))
}

fn decode_attrs(schema: &ObjectSchema, raw: &[sai_attribute_t]) -> SaiResult<Vec<SaiAttribute>> {
    raw.iter()
        .enumerate()
        .map(|(index, attr)| attr_from_raw(schema, index, attr))
        .collect()
}

unsafe fn create(
    schema: &'static ObjectSchema,
    object_id: *mut sai_object_id_t,
    switch_id: sai_object_id_t,
    attr_count: u32,
    attr_list: *const sai_attribute_t,
    call: impl FnOnce(&dyn DashHaApi, SwitchOid, &[SaiAttribute]) -> SaiResult<u64>,
) -> sai_status_t {
    with_installed(|installed| {
        if object_id.is_null() {
            return Err(SaiError::invalid_parameter("object_id is null"));
        }
        let attrs = decode_attrs(schema, raw_slice(attr_list, attr_count, "attr_list")?)?;
        let oid = call(
            installed.api.as_ref(),
            SwitchOid::from_raw_unchecked(switch_id),
            &attrs,
        )?;
        *object_id = oid;
        Ok(())
    })
}

unsafe fn set(
    schema: &'static ObjectSchema,
    attr: *const sai_attribute_t,
    call: impl FnOnce(&dyn DashHaApi, &SaiAttribute) -> SaiResult<()>,
) -> sai_status_t {
    with_installed(|installed| {
        let raw = attr
            .as_ref()
            .ok_or_else(|| SaiError::invalid_parameter("attr is null"))?;
        let attr = attr_from_raw(schema, 0, raw)?;
        call(installed.api.as_ref(), &attr)
    })
}

unsafe fn get(
    attr_count: u32,
    attr_list: *mut sai_attribute_t,
    call: impl FnOnce(&dyn DashHaApi, &[SaiAttrId]) -> SaiResult<Vec<SaiAttribute>>,
) -> sai_status_t {
    with_installed(|installed| {
        let list = raw_slice_mut(attr_list, attr_count, "attr_list")?;
        let ids: Vec<SaiAttrId> = list.iter().map(|a| a.id).collect();
        let values = call(installed.api.as_ref(), &ids)?;
        if values.len() != list.len() {
            return Err(SaiError::internal("adapter returned a short attribute list"));
        }
        for (slot, value) in list.iter_mut().zip(values) {
            *slot = attr_to_raw(&value);
        }
        Ok(())
    })
}

unsafe extern "C" fn create_dash_ha_pair(
    object_id: *mut sai_object_id_t,
    switch_id: sai_object_id_t,
    attr_count: u32,
    attr_list: *const sai_attribute_t,
) -> sai_status_t {
    create(
        &DASH_HA_PAIR_SCHEMA,
        object_id,
        switch_id,
        attr_count,
        attr_list,
        |api, switch, attrs| Ok(api.create_dash_ha_pair(switch, attrs)?.as_raw()),
    )
}

unsafe extern "C" fn remove_dash_ha_pair(object_id: sai_object_id_t) -> sai_status_t {
    with_installed(|installed| {
        installed
            .api
            .remove_dash_ha_pair(DashHaPairOid::from_raw_unchecked(object_id))
    })
}

unsafe extern "C" fn set_dash_ha_pair_attribute(
    object_id: sai_object_id_t,
    attr: *const sai_attribute_t,
) -> sai_status_t {
    set(&DASH_HA_PAIR_SCHEMA, attr, |api, attr| {
        api.set_dash_ha_pair_attribute(DashHaPairOid::from_raw_unchecked(object_id), attr)
    })
}

unsafe extern "C" fn get_dash_ha_pair_attribute(
    object_id: sai_object_id_t,
    attr_count: u32,
    attr_list: *mut sai_attribute_t,
) -> sai_status_t {
    get(attr_count, attr_list, |api, ids| {
        api.get_dash_ha_pair_attribute(DashHaPairOid::from_raw_unchecked(object_id), ids)
    })
}

unsafe extern "C" fn create_dash_ha_session(
    object_id: *mut sai_object_id_t,
    switch_id: sai_object_id_t,
    attr_count: u32,
    attr_list: *const sai_attribute_t,
) -> sai_status_t {
    create(
        &DASH_HA_SESSION_SCHEMA,
        object_id,
        switch_id,
        attr_count,
        attr_list,
        |api, switch, attrs| Ok(api.create_dash_ha_session(switch, attrs)?.as_raw()),
    )
}

unsafe extern "C" fn remove_dash_ha_session(object_id: sai_object_id_t) -> sai_status_t {
    with_installed(|installed| {
        installed
            .api
            .remove_dash_ha_session(DashHaSessionOid::from_raw_unchecked(object_id))
    })
}

unsafe extern "C" fn set_dash_ha_session_attribute(
    object_id: sai_object_id_t,
    attr: *const sai_attribute_t,
) -> sai_status_t {
    set(&DASH_HA_SESSION_SCHEMA, attr, |api, attr| {
        api.set_dash_ha_session_attribute(DashHaSessionOid::from_raw_unchecked(object_id), attr)
    })
}

unsafe extern "C" fn get_dash_ha_session_attribute(
    object_id: sai_object_id_t,
    attr_count: u32,
    attr_list: *mut sai_attribute_t,
) -> sai_status_t {
    get(attr_count, attr_list, |api, ids| {
        api.get_dash_ha_session_attribute(DashHaSessionOid::from_raw_unchecked(object_id), ids)
    })
}

unsafe fn read_stats(
    object_id: sai_object_id_t,
    number_of_counters: u32,
    counter_ids: *const sai_stat_id_t,
    mode: Option<StatsMode>,
    counters: *mut u64,
) -> sai_status_t {
    with_installed(|installed| {
        let ids = raw_slice(counter_ids, number_of_counters, "counter_ids")?;
        let out = raw_slice_mut(counters, number_of_counters, "counters")?;
        let session = DashHaSessionOid::from_raw_unchecked(object_id);
        let values = match mode {
            Some(mode) => installed.api.get_ha_session_stats_ext(session, ids, mode)?,
            None => installed.api.get_ha_session_stats(session, ids)?,
        };
        if values.len() != out.len() {
            return Err(SaiError::internal("adapter returned a short counter list"));
        }
        out.copy_from_slice(&values);
        Ok(())
    })
}

unsafe extern "C" fn get_ha_session_stats(
    object_id: sai_object_id_t,
    number_of_counters: u32,
    counter_ids: *const sai_stat_id_t,
    counters: *mut u64,
) -> sai_status_t {
    read_stats(object_id, number_of_counters, counter_ids, None, counters)
}

unsafe extern "C" fn get_ha_session_stats_ext(
    object_id: sai_object_id_t,
    number_of_counters: u32,
    counter_ids: *const sai_stat_id_t,
    mode: sai_stats_mode_t,
    counters: *mut u64,
) -> sai_status_t {
    match StatsMode::from_raw(mode) {
        Some(mode) => read_stats(object_id, number_of_counters, counter_ids, Some(mode), counters),
        None => SaiStatus::InvalidParameter.as_raw(),
    }
}

unsafe extern "C" fn clear_ha_session_stats(
    object_id: sai_object_id_t,
    number_of_counters: u32,
    counter_ids: *const sai_stat_id_t,
) -> sai_status_t {
    with_installed(|installed| {
        let ids = raw_slice(counter_ids, number_of_counters, "counter_ids")?;
        installed
            .api
            .clear_ha_session_stats(DashHaSessionOid::from_raw_unchecked(object_id), ids)
    })
}

static DASH_HA_API: sai_dash_ha_api_t = sai_dash_ha_api_t {
    create_dash_ha_pair: Some(create_dash_ha_pair),
    remove_dash_ha_pair: Some(remove_dash_ha_pair),
    set_dash_ha_pair_attribute: Some(set_dash_ha_pair_attribute),
    get_dash_ha_pair_attribute: Some(get_dash_ha_pair_attribute),
    create_dash_ha_session: Some(create_dash_ha_session),
    remove_dash_ha_session: Some(remove_dash_ha_session),
    set_dash_ha_session_attribute: Some(set_dash_ha_session_attribute),
    get_dash_ha_session_attribute: Some(get_dash_ha_session_attribute),
    get_ha_session_stats: Some(get_ha_session_stats),
    get_ha_session_stats_ext: Some(get_ha_session_stats_ext),
    clear_ha_session_stats: Some(clear_ha_session_stats),
};

/// Returns the exported method table.
pub fn dash_ha_api_table() -> &'static sai_dash_ha_api_t {
    &DASH_HA_API
}

/// Hands out the DASH HA method table.
///
/// # Safety
///
/// - `api_method_table` must be null or valid for a pointer write
#[no_mangle]
pub unsafe extern "C" fn sai_dash_ha_api_query(
    api_method_table: *mut *const sai_dash_ha_api_t,
) -> sai_status_t {
    if api_method_table.is_null() {
        return SaiStatus::InvalidParameter.as_raw();
    }
    if !is_dash_ha_api_installed() {
        return SaiStatus::Uninitialized.as_raw();
    }
    *api_method_table = &DASH_HA_API;
    SaiStatus::Success.as_raw()
}

/// Wraps a C HA scope callback as a [`HaScopeEventNotification`].
///
/// Event attributes are marshalled into buffers that live for the duration
/// of the call.
fn foreign_notification(
    callback: unsafe extern "C" fn(u32, *const sai_ha_scope_event_data_t),
) -> HaScopeEventNotification {
    Arc::new(move |events: &[HaScopeEventData]| {
        let mut attr_buffers: Vec<Vec<sai_attribute_t>> = events
            .iter()
            .map(|e| e.attrs.iter().map(attr_to_raw).collect())
            .collect();
        let data: Vec<sai_ha_scope_event_data_t> = events
            .iter()
            .zip(attr_buffers.iter_mut())
            .map(|(event, attrs)| sai_ha_scope_event_data_t {
                event_type: event.event_type.as_raw(),
                ha_scope_id: event.ha_scope_id.as_raw(),
                attr_count: attrs.len() as u32,
                attr: attrs.as_mut_ptr(),
            })
            .collect();
        // SAFETY: the callback was registered through the switch attribute
        // and the buffers outlive the call.
        unsafe { callback(data.len() as u32, data.as_ptr()) };
    })
}

/// Sets a DASH HA switch extension attribute on the installed adapter.
///
/// `SAI_SWITCH_ATTR_HA_SCOPE_EVENT_NOTIFY` takes a
/// `sai_ha_scope_event_notification_fn` in the `ptr` member; null clears
/// the callback.
///
/// # Safety
///
/// - `attr` must be null or point to a valid `sai_attribute_t`
/// - a non-null `ptr` must be a function of the notification signature
#[no_mangle]
pub unsafe extern "C" fn sai_dash_ha_set_switch_attribute(
    switch_id: sai_object_id_t,
    attr: *const sai_attribute_t,
) -> sai_status_t {
    with_installed(|installed| {
        let raw = attr
            .as_ref()
            .ok_or_else(|| SaiError::invalid_parameter("attr is null"))?;
        match installed.range.lookup(raw.id) {
            Some(SwitchAttrExtension::HaScopeEventNotify) => {
                let ptr: *mut c_void = raw.value.ptr;
                let notify = if ptr.is_null() {
                    None
                } else {
                    let callback = std::mem::transmute::<
                        *mut c_void,
                        unsafe extern "C" fn(u32, *const sai_ha_scope_event_data_t),
                    >(ptr);
                    Some(foreign_notification(callback))
                };
                installed
                    .switch
                    .set_ha_scope_event_notify(SwitchOid::from_raw_unchecked(switch_id), notify)
            }
            None => Err(SaiError::UnknownAttribute { index: 0, id: raw.id }),
        }
    })
}

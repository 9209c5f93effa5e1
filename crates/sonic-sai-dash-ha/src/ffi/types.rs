//! `#[repr(C)]` mirrors of the SAI types used by the DASH HA headers.
//!
//! `sai_attribute_value_t` only carries the members these headers use. When
//! the full SAI headers are available, the `generate-bindings` build gives
//! the complete union.

#![allow(non_camel_case_types)]

use std::ffi::c_void;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::attr::{AttrValue, AttrValueType, SaiAttribute};
use crate::error::{attr_index, SaiError, SaiResult};
use crate::schema::{is_custom_attr, ObjectSchema};

pub type sai_status_t = i32;
pub type sai_object_id_t = u64;
pub type sai_attr_id_t = u32;
pub type sai_stat_id_t = u32;
pub type sai_stats_mode_t = i32;
pub type sai_ha_scope_event_t = i32;
/// IPv4 address in network byte order.
pub type sai_ip4_t = u32;
pub type sai_ip6_t = [u8; 16];
pub type sai_pointer_t = *mut c_void;

/// Attribute value union.
#[repr(C)]
#[derive(Clone, Copy)]
pub union sai_attribute_value_t {
    pub u16: u16,
    pub u32: u32,
    pub s32: i32,
    pub oid: sai_object_id_t,
    pub ip4: sai_ip4_t,
    pub ip6: sai_ip6_t,
    pub ptr: sai_pointer_t,
}

impl Default for sai_attribute_value_t {
    fn default() -> Self {
        // ip6 is the widest member; this initializes every byte.
        sai_attribute_value_t { ip6: [0; 16] }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct sai_attribute_t {
    pub id: sai_attr_id_t,
    pub value: sai_attribute_value_t,
}

impl sai_attribute_t {
    /// An attribute slot with only the id filled in, as passed to get.
    pub fn request(id: sai_attr_id_t) -> Self {
        Self {
            id,
            value: sai_attribute_value_t::default(),
        }
    }
}

/// HA scope event record.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct sai_ha_scope_event_data_t {
    pub event_type: sai_ha_scope_event_t,
    pub ha_scope_id: sai_object_id_t,
    pub attr_count: u32,
    pub attr: *mut sai_attribute_t,
}

/// HA scope event callback.
pub type sai_ha_scope_event_notification_fn =
    Option<unsafe extern "C" fn(count: u32, data: *const sai_ha_scope_event_data_t)>;

pub type sai_generic_create_fn = Option<
    unsafe extern "C" fn(
        object_id: *mut sai_object_id_t,
        switch_id: sai_object_id_t,
        attr_count: u32,
        attr_list: *const sai_attribute_t,
    ) -> sai_status_t,
>;
pub type sai_generic_remove_fn =
    Option<unsafe extern "C" fn(object_id: sai_object_id_t) -> sai_status_t>;
pub type sai_generic_set_fn = Option<
    unsafe extern "C" fn(object_id: sai_object_id_t, attr: *const sai_attribute_t) -> sai_status_t,
>;
pub type sai_generic_get_fn = Option<
    unsafe extern "C" fn(
        object_id: sai_object_id_t,
        attr_count: u32,
        attr_list: *mut sai_attribute_t,
    ) -> sai_status_t,
>;
pub type sai_generic_get_stats_fn = Option<
    unsafe extern "C" fn(
        object_id: sai_object_id_t,
        number_of_counters: u32,
        counter_ids: *const sai_stat_id_t,
        counters: *mut u64,
    ) -> sai_status_t,
>;
pub type sai_generic_get_stats_ext_fn = Option<
    unsafe extern "C" fn(
        object_id: sai_object_id_t,
        number_of_counters: u32,
        counter_ids: *const sai_stat_id_t,
        mode: sai_stats_mode_t,
        counters: *mut u64,
    ) -> sai_status_t,
>;
pub type sai_generic_clear_stats_fn = Option<
    unsafe extern "C" fn(
        object_id: sai_object_id_t,
        number_of_counters: u32,
        counter_ids: *const sai_stat_id_t,
    ) -> sai_status_t,
>;

pub type sai_create_dash_ha_pair_fn = sai_generic_create_fn;
pub type sai_remove_dash_ha_pair_fn = sai_generic_remove_fn;
pub type sai_set_dash_ha_pair_attribute_fn = sai_generic_set_fn;
pub type sai_get_dash_ha_pair_attribute_fn = sai_generic_get_fn;
pub type sai_create_dash_ha_session_fn = sai_generic_create_fn;
pub type sai_remove_dash_ha_session_fn = sai_generic_remove_fn;
pub type sai_set_dash_ha_session_attribute_fn = sai_generic_set_fn;
pub type sai_get_dash_ha_session_attribute_fn = sai_generic_get_fn;
pub type sai_get_ha_session_stats_fn = sai_generic_get_stats_fn;
pub type sai_get_ha_session_stats_ext_fn = sai_generic_get_stats_ext_fn;
pub type sai_clear_ha_session_stats_fn = sai_generic_clear_stats_fn;

/// DASH HA method table. Field order is part of the ABI.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct sai_dash_ha_api_t {
    pub create_dash_ha_pair: sai_create_dash_ha_pair_fn,
    pub remove_dash_ha_pair: sai_remove_dash_ha_pair_fn,
    pub set_dash_ha_pair_attribute: sai_set_dash_ha_pair_attribute_fn,
    pub get_dash_ha_pair_attribute: sai_get_dash_ha_pair_attribute_fn,
    pub create_dash_ha_session: sai_create_dash_ha_session_fn,
    pub remove_dash_ha_session: sai_remove_dash_ha_session_fn,
    pub set_dash_ha_session_attribute: sai_set_dash_ha_session_attribute_fn,
    pub get_dash_ha_session_attribute: sai_get_dash_ha_session_attribute_fn,
    pub get_ha_session_stats: sai_get_ha_session_stats_fn,
    pub get_ha_session_stats_ext: sai_get_ha_session_stats_ext_fn,
    pub clear_ha_session_stats: sai_clear_ha_session_stats_fn,
}

// ============================================================================
// Conversions
// ============================================================================

pub fn ip4_to_raw(addr: Ipv4Addr) -> sai_ip4_t {
    u32::from_ne_bytes(addr.octets())
}

pub fn ip4_from_raw(raw: sai_ip4_t) -> Ipv4Addr {
    Ipv4Addr::from(raw.to_ne_bytes())
}

/// Encodes a typed value into the union.
pub fn value_to_raw(value: &AttrValue) -> sai_attribute_value_t {
    let mut raw = sai_attribute_value_t::default();
    match *value {
        AttrValue::Ip4(v) => raw.ip4 = ip4_to_raw(v),
        AttrValue::Ip6(v) => raw.ip6 = v.octets(),
        AttrValue::U16(v) => raw.u16 = v,
        AttrValue::U32(v) => raw.u32 = v,
        AttrValue::S32(v) => raw.s32 = v,
        AttrValue::ObjectId(v) => raw.oid = v,
    }
    raw
}

pub fn attr_to_raw(attr: &SaiAttribute) -> sai_attribute_t {
    sai_attribute_t {
        id: attr.id,
        value: value_to_raw(&attr.value),
    }
}

/// Decodes the union member named by `value_type`.
///
/// Pointer values have no [`AttrValue`] form and are rejected.
pub fn value_from_raw(
    index: usize,
    value_type: AttrValueType,
    raw: &sai_attribute_value_t,
) -> SaiResult<AttrValue> {
    // SAFETY: every member is plain data; the schema names the member the
    // caller wrote.
    let value = unsafe {
        match value_type {
            AttrValueType::Ip4 => AttrValue::Ip4(ip4_from_raw(raw.ip4)),
            AttrValueType::Ip6 => AttrValue::Ip6(Ipv6Addr::from(raw.ip6)),
            AttrValueType::U16 => AttrValue::U16(raw.u16),
            AttrValueType::U32 => AttrValue::U32(raw.u32),
            AttrValueType::S32 => AttrValue::S32(raw.s32),
            AttrValueType::ObjectId => AttrValue::ObjectId(raw.oid),
            AttrValueType::Pointer => {
                return Err(SaiError::invalid_attr_value(
                    index,
                    "pointer attributes are not carried as values",
                ))
            }
        }
    };
    Ok(value)
}

/// Decodes one attribute of `schema` at list position `index`.
pub fn attr_from_raw(
    schema: &ObjectSchema,
    index: usize,
    raw: &sai_attribute_t,
) -> SaiResult<SaiAttribute> {
    let meta = match schema.lookup(raw.id) {
        Some(meta) => meta,
        None if is_custom_attr(raw.id) => {
            return Err(SaiError::AttrNotSupported {
                index: attr_index(index),
                id: raw.id,
            })
        }
        None => {
            return Err(SaiError::UnknownAttribute {
                index: attr_index(index),
                id: raw.id,
            })
        }
    };
    Ok(SaiAttribute::new(
        raw.id,
        value_from_raw(index, meta.value_type, &raw.value)?,
    ))
}

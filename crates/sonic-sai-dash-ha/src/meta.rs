//! Metadata validation of attribute lists.
//!
//! Every adapter runs these checks before touching device state, so the
//! status an application receives for a malformed request does not depend on
//! which adapter is installed.

use std::collections::HashSet;

use crate::attr::{AttrDefault, AttrMetadata, AttrValue, SaiAttrId, SaiAttribute};
use crate::error::{attr_index, SaiError, SaiResult};
use crate::schema::{is_custom_attr, ObjectSchema};
use crate::types::SAI_NULL_OBJECT_ID;

fn resolve(schema: &ObjectSchema, index: usize, id: SaiAttrId) -> SaiResult<&'static AttrMetadata> {
    match schema.lookup(id) {
        Some(meta) => Ok(meta),
        None if is_custom_attr(id) => Err(SaiError::AttrNotSupported {
            index: attr_index(index),
            id,
        }),
        None => Err(SaiError::UnknownAttribute {
            index: attr_index(index),
            id,
        }),
    }
}

/// Checks a single value against its metadata. `index` is the position of
/// the attribute in the caller's list.
pub fn validate_value(index: usize, meta: &AttrMetadata, value: &AttrValue) -> SaiResult<()> {
    if value.value_type() != meta.value_type {
        return Err(SaiError::invalid_attr_value(
            index,
            format!(
                "{} expects {}, got {}",
                meta.name,
                meta.value_type,
                value.value_type()
            ),
        ));
    }
    match *value {
        AttrValue::ObjectId(SAI_NULL_OBJECT_ID) if !meta.allow_null => Err(
            SaiError::invalid_attr_value(index, format!("{} does not allow null", meta.name)),
        ),
        AttrValue::S32(v) if !meta.allows_s32(v) => Err(SaiError::invalid_attr_value(
            index,
            format!("{} value {} out of range", meta.name, v),
        )),
        _ => Ok(()),
    }
}

/// Validates a create request.
pub fn validate_create(schema: &ObjectSchema, attrs: &[SaiAttribute]) -> SaiResult<()> {
    let mut seen = HashSet::with_capacity(attrs.len());
    for (index, attr) in attrs.iter().enumerate() {
        if !seen.insert(attr.id) {
            return Err(SaiError::invalid_parameter(format!(
                "duplicate attribute 0x{:x} at #{} for {}",
                attr.id, index, schema.object_type
            )));
        }
        let meta = resolve(schema, index, attr.id)?;
        validate_value(index, meta, &attr.value)?;
    }

    if let Some(missing) = schema.mandatory().find(|m| !seen.contains(&m.id)) {
        return Err(SaiError::mandatory_missing(missing.name));
    }
    Ok(())
}

/// Validates a set request.
pub fn validate_set(schema: &ObjectSchema, attr: &SaiAttribute) -> SaiResult<&'static AttrMetadata> {
    let meta = resolve(schema, 0, attr.id)?;
    if !meta.flags.is_settable() {
        return Err(SaiError::invalid_parameter(format!(
            "{} is {} and cannot be set",
            meta.name, meta.flags
        )));
    }
    validate_value(0, meta, &attr.value)?;
    Ok(meta)
}

/// Validates a get request and returns the metadata of each requested id.
pub fn validate_get(
    schema: &ObjectSchema,
    ids: &[SaiAttrId],
) -> SaiResult<Vec<&'static AttrMetadata>> {
    if ids.is_empty() {
        return Err(SaiError::invalid_parameter(format!(
            "empty attribute list for {}",
            schema.object_type
        )));
    }
    ids.iter()
        .enumerate()
        .map(|(index, id)| resolve(schema, index, *id))
        .collect()
}

/// Returns the value an unset attribute reads back as.
pub fn default_value(meta: &AttrMetadata) -> Option<AttrValue> {
    match meta.default {
        AttrDefault::Value(v) => Some(v),
        AttrDefault::Disabled | AttrDefault::Null => None,
    }
}

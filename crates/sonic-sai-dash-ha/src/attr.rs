//! Attribute values and attribute metadata.
//!
//! SAI headers annotate every attribute with `@type`, `@flags`, `@default`
//! and `@allownull`. [`AttrMetadata`] carries those annotations at runtime so
//! that the validation in [`crate::meta`] can enforce them.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::types::RawSaiObjectId;

/// Raw `sai_attr_id_t`.
pub type SaiAttrId = u32;

/// Value type of an attribute (the header's `@type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrValueType {
    Ip4,
    Ip6,
    U16,
    U32,
    /// 32-bit enum value.
    S32,
    ObjectId,
    /// Function pointer, used only by notification attributes.
    Pointer,
}

impl AttrValueType {
    /// Returns the SAI C type name.
    pub fn sai_type_name(&self) -> &'static str {
        match self {
            AttrValueType::Ip4 => "sai_ip4_t",
            AttrValueType::Ip6 => "sai_ip6_t",
            AttrValueType::U16 => "sai_uint16_t",
            AttrValueType::U32 => "sai_uint32_t",
            AttrValueType::S32 => "sai_int32_t",
            AttrValueType::ObjectId => "sai_object_id_t",
            AttrValueType::Pointer => "sai_pointer_t",
        }
    }
}

impl fmt::Display for AttrValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sai_type_name())
    }
}

/// A typed attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrValue {
    Ip4(Ipv4Addr),
    Ip6(Ipv6Addr),
    U16(u16),
    U32(u32),
    S32(i32),
    ObjectId(RawSaiObjectId),
}

impl AttrValue {
    /// Returns the value type of this value.
    pub fn value_type(&self) -> AttrValueType {
        match self {
            AttrValue::Ip4(_) => AttrValueType::Ip4,
            AttrValue::Ip6(_) => AttrValueType::Ip6,
            AttrValue::U16(_) => AttrValueType::U16,
            AttrValue::U32(_) => AttrValueType::U32,
            AttrValue::S32(_) => AttrValueType::S32,
            AttrValue::ObjectId(_) => AttrValueType::ObjectId,
        }
    }

    pub fn as_ip4(&self) -> Option<Ipv4Addr> {
        match *self {
            AttrValue::Ip4(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ip6(&self) -> Option<Ipv6Addr> {
        match *self {
            AttrValue::Ip6(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<u16> {
        match *self {
            AttrValue::U16(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            AttrValue::U32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_s32(&self) -> Option<i32> {
        match *self {
            AttrValue::S32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_oid(&self) -> Option<RawSaiObjectId> {
        match *self {
            AttrValue::ObjectId(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Ip4(v) => v.fmt(f),
            AttrValue::Ip6(v) => v.fmt(f),
            AttrValue::U16(v) => v.fmt(f),
            AttrValue::U32(v) => v.fmt(f),
            AttrValue::S32(v) => v.fmt(f),
            AttrValue::ObjectId(v) => write!(f, "oid:0x{:x}", v),
        }
    }
}

/// Access flags of an attribute (the header's `@flags`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrFlags {
    /// `MANDATORY_ON_CREATE | CREATE_ONLY`
    MandatoryOnCreateCreateOnly,
    /// `CREATE_ONLY`
    CreateOnly,
    /// `CREATE_AND_SET`
    CreateAndSet,
}

impl AttrFlags {
    pub fn is_mandatory_on_create(&self) -> bool {
        matches!(self, AttrFlags::MandatoryOnCreateCreateOnly)
    }

    pub fn is_create_only(&self) -> bool {
        matches!(
            self,
            AttrFlags::MandatoryOnCreateCreateOnly | AttrFlags::CreateOnly
        )
    }

    pub fn is_settable(&self) -> bool {
        matches!(self, AttrFlags::CreateAndSet)
    }
}

impl fmt::Display for AttrFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AttrFlags::MandatoryOnCreateCreateOnly => "MANDATORY_ON_CREATE | CREATE_ONLY",
            AttrFlags::CreateOnly => "CREATE_ONLY",
            AttrFlags::CreateAndSet => "CREATE_AND_SET",
        })
    }
}

/// Default value of an attribute (the header's `@default`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrDefault {
    /// `@default disabled`: no default, the attribute must be supplied.
    Disabled,
    /// A concrete default value.
    Value(AttrValue),
    /// `@default NULL` for pointer attributes.
    Null,
}

/// Runtime form of one attribute's header annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrMetadata {
    pub id: SaiAttrId,
    /// Full SAI enum name, e.g. `SAI_DASH_HA_SESSION_ATTR_HA_ROLE`.
    pub name: &'static str,
    pub value_type: AttrValueType,
    pub flags: AttrFlags,
    pub default: AttrDefault,
    /// `@allownull` for object id attributes.
    pub allow_null: bool,
    /// Legal values for enum attributes. Empty means unrestricted.
    pub allowed_s32: &'static [i32],
}

impl AttrMetadata {
    /// Returns true if `value` is one of the legal enum values.
    pub fn allows_s32(&self, value: i32) -> bool {
        self.allowed_s32.is_empty() || self.allowed_s32.contains(&value)
    }
}

/// A single attribute: id plus typed value (the safe `sai_attribute_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SaiAttribute {
    pub id: SaiAttrId,
    pub value: AttrValue,
}

impl SaiAttribute {
    pub fn new(id: impl Into<SaiAttrId>, value: AttrValue) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}

impl fmt::Display for SaiAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}={}", self.id, self.value)
    }
}

/// Looks up the first attribute with the given id.
pub fn find_attr(attrs: &[SaiAttribute], id: SaiAttrId) -> Option<(usize, &SaiAttribute)> {
    attrs.iter().enumerate().find(|(_, a)| a.id == id)
}

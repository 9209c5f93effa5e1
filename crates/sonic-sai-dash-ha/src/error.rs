//! SAI status codes and error types.
//!
//! Every dispatch-table entry returns a single `sai_status_t`. This module
//! models that code precisely (including the attribute-indexed families such
//! as `SAI_STATUS_INVALID_ATTR_VALUE_0 + n`) and converts it to and from
//! Rust's `Result`.

use std::fmt;
use thiserror::Error;

use crate::types::RawSaiObjectId;

/// Raw `sai_status_t`.
pub type RawSaiStatus = i32;

const INVALID_ATTRIBUTE_BASE: i32 = 0x0001_0000;
const INVALID_ATTR_VALUE_BASE: i32 = 0x0002_0000;
const ATTR_NOT_IMPLEMENTED_BASE: i32 = 0x0003_0000;
const UNKNOWN_ATTRIBUTE_BASE: i32 = 0x0004_0000;
const ATTR_NOT_SUPPORTED_BASE: i32 = 0x0005_0000;
const ATTR_INDEX_MASK: i32 = 0xFFFF;

/// SAI status codes.
///
/// The attribute-indexed variants carry the position of the offending
/// attribute in the caller's attribute list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaiStatus {
    Success,
    Failure,
    NotSupported,
    NoMemory,
    InsufficientResources,
    InvalidParameter,
    ItemAlreadyExists,
    ItemNotFound,
    BufferOverflow,
    InvalidPortNumber,
    InvalidPortMember,
    InvalidVlanId,
    Uninitialized,
    TableFull,
    MandatoryAttributeMissing,
    NotImplemented,
    AddrNotFound,
    ObjectInUse,
    InvalidObjectType,
    InvalidObjectId,
    InvalidNvStorage,
    NvStorageFull,
    SwUpgradeVersionMismatch,
    NotExecuted,
    StageMismatch,
    InvalidAttribute(u16),
    InvalidAttrValue(u16),
    AttrNotImplemented(u16),
    UnknownAttribute(u16),
    AttrNotSupported(u16),
}

impl SaiStatus {
    /// Creates a SaiStatus from a raw `sai_status_t`.
    ///
    /// Codes that are not defined by SAI collapse to `Failure`.
    pub fn from_raw(status: RawSaiStatus) -> Self {
        match status {
            0 => SaiStatus::Success,
            -1 => SaiStatus::Failure,
            -2 => SaiStatus::NotSupported,
            -3 => SaiStatus::NoMemory,
            -4 => SaiStatus::InsufficientResources,
            -5 => SaiStatus::InvalidParameter,
            -6 => SaiStatus::ItemAlreadyExists,
            -7 => SaiStatus::ItemNotFound,
            -8 => SaiStatus::BufferOverflow,
            -9 => SaiStatus::InvalidPortNumber,
            -10 => SaiStatus::InvalidPortMember,
            -11 => SaiStatus::InvalidVlanId,
            -12 => SaiStatus::Uninitialized,
            -13 => SaiStatus::TableFull,
            -14 => SaiStatus::MandatoryAttributeMissing,
            -15 => SaiStatus::NotImplemented,
            -16 => SaiStatus::AddrNotFound,
            -17 => SaiStatus::ObjectInUse,
            -18 => SaiStatus::InvalidObjectType,
            -19 => SaiStatus::InvalidObjectId,
            -20 => SaiStatus::InvalidNvStorage,
            -21 => SaiStatus::NvStorageFull,
            -22 => SaiStatus::SwUpgradeVersionMismatch,
            -23 => SaiStatus::NotExecuted,
            -24 => SaiStatus::StageMismatch,
            s if s < 0 => {
                let code = s.wrapping_neg();
                let index = (code & ATTR_INDEX_MASK) as u16;
                match code & !ATTR_INDEX_MASK {
                    INVALID_ATTRIBUTE_BASE => SaiStatus::InvalidAttribute(index),
                    INVALID_ATTR_VALUE_BASE => SaiStatus::InvalidAttrValue(index),
                    ATTR_NOT_IMPLEMENTED_BASE => SaiStatus::AttrNotImplemented(index),
                    UNKNOWN_ATTRIBUTE_BASE => SaiStatus::UnknownAttribute(index),
                    ATTR_NOT_SUPPORTED_BASE => SaiStatus::AttrNotSupported(index),
                    _ => SaiStatus::Failure,
                }
            }
            _ => SaiStatus::Failure,
        }
    }

    /// Returns the raw `sai_status_t` value.
    pub fn as_raw(&self) -> RawSaiStatus {
        match *self {
            SaiStatus::Success => 0,
            SaiStatus::Failure => -1,
            SaiStatus::NotSupported => -2,
            SaiStatus::NoMemory => -3,
            SaiStatus::InsufficientResources => -4,
            SaiStatus::InvalidParameter => -5,
            SaiStatus::ItemAlreadyExists => -6,
            SaiStatus::ItemNotFound => -7,
            SaiStatus::BufferOverflow => -8,
            SaiStatus::InvalidPortNumber => -9,
            SaiStatus::InvalidPortMember => -10,
            SaiStatus::InvalidVlanId => -11,
            SaiStatus::Uninitialized => -12,
            SaiStatus::TableFull => -13,
            SaiStatus::MandatoryAttributeMissing => -14,
            SaiStatus::NotImplemented => -15,
            SaiStatus::AddrNotFound => -16,
            SaiStatus::ObjectInUse => -17,
            SaiStatus::InvalidObjectType => -18,
            SaiStatus::InvalidObjectId => -19,
            SaiStatus::InvalidNvStorage => -20,
            SaiStatus::NvStorageFull => -21,
            SaiStatus::SwUpgradeVersionMismatch => -22,
            SaiStatus::NotExecuted => -23,
            SaiStatus::StageMismatch => -24,
            SaiStatus::InvalidAttribute(i) => -(INVALID_ATTRIBUTE_BASE + i32::from(i)),
            SaiStatus::InvalidAttrValue(i) => -(INVALID_ATTR_VALUE_BASE + i32::from(i)),
            SaiStatus::AttrNotImplemented(i) => -(ATTR_NOT_IMPLEMENTED_BASE + i32::from(i)),
            SaiStatus::UnknownAttribute(i) => -(UNKNOWN_ATTRIBUTE_BASE + i32::from(i)),
            SaiStatus::AttrNotSupported(i) => -(ATTR_NOT_SUPPORTED_BASE + i32::from(i)),
        }
    }

    /// Returns the attribute index carried by attribute-indexed codes.
    pub fn attr_index(&self) -> Option<u16> {
        match *self {
            SaiStatus::InvalidAttribute(i)
            | SaiStatus::InvalidAttrValue(i)
            | SaiStatus::AttrNotImplemented(i)
            | SaiStatus::UnknownAttribute(i)
            | SaiStatus::AttrNotSupported(i) => Some(i),
            _ => None,
        }
    }

    /// Returns true if the status indicates success.
    pub fn is_success(&self) -> bool {
        *self == SaiStatus::Success
    }

    /// Returns true if the status indicates an error.
    pub fn is_error(&self) -> bool {
        *self != SaiStatus::Success
    }

    /// Converts to a Result, returning Ok(()) for success.
    pub fn into_result(self) -> SaiResult<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(SaiError::from_status(self))
        }
    }
}

impl fmt::Display for SaiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SaiStatus::Success => "SAI_STATUS_SUCCESS",
            SaiStatus::Failure => "SAI_STATUS_FAILURE",
            SaiStatus::NotSupported => "SAI_STATUS_NOT_SUPPORTED",
            SaiStatus::NoMemory => "SAI_STATUS_NO_MEMORY",
            SaiStatus::InsufficientResources => "SAI_STATUS_INSUFFICIENT_RESOURCES",
            SaiStatus::InvalidParameter => "SAI_STATUS_INVALID_PARAMETER",
            SaiStatus::ItemAlreadyExists => "SAI_STATUS_ITEM_ALREADY_EXISTS",
            SaiStatus::ItemNotFound => "SAI_STATUS_ITEM_NOT_FOUND",
            SaiStatus::BufferOverflow => "SAI_STATUS_BUFFER_OVERFLOW",
            SaiStatus::InvalidPortNumber => "SAI_STATUS_INVALID_PORT_NUMBER",
            SaiStatus::InvalidPortMember => "SAI_STATUS_INVALID_PORT_MEMBER",
            SaiStatus::InvalidVlanId => "SAI_STATUS_INVALID_VLAN_ID",
            SaiStatus::Uninitialized => "SAI_STATUS_UNINITIALIZED",
            SaiStatus::TableFull => "SAI_STATUS_TABLE_FULL",
            SaiStatus::MandatoryAttributeMissing => "SAI_STATUS_MANDATORY_ATTRIBUTE_MISSING",
            SaiStatus::NotImplemented => "SAI_STATUS_NOT_IMPLEMENTED",
            SaiStatus::AddrNotFound => "SAI_STATUS_ADDR_NOT_FOUND",
            SaiStatus::ObjectInUse => "SAI_STATUS_OBJECT_IN_USE",
            SaiStatus::InvalidObjectType => "SAI_STATUS_INVALID_OBJECT_TYPE",
            SaiStatus::InvalidObjectId => "SAI_STATUS_INVALID_OBJECT_ID",
            SaiStatus::InvalidNvStorage => "SAI_STATUS_INVALID_NV_STORAGE",
            SaiStatus::NvStorageFull => "SAI_STATUS_NV_STORAGE_FULL",
            SaiStatus::SwUpgradeVersionMismatch => "SAI_STATUS_SW_UPGRADE_VERSION_MISMATCH",
            SaiStatus::NotExecuted => "SAI_STATUS_NOT_EXECUTED",
            SaiStatus::StageMismatch => "SAI_STATUS_STAGE_MISMATCH",
            SaiStatus::InvalidAttribute(i) => return write!(f, "SAI_STATUS_INVALID_ATTRIBUTE_{}", i),
            SaiStatus::InvalidAttrValue(i) => return write!(f, "SAI_STATUS_INVALID_ATTR_VALUE_{}", i),
            SaiStatus::AttrNotImplemented(i) => {
                return write!(f, "SAI_STATUS_ATTR_NOT_IMPLEMENTED_{}", i)
            }
            SaiStatus::UnknownAttribute(i) => return write!(f, "SAI_STATUS_UNKNOWN_ATTRIBUTE_{}", i),
            SaiStatus::AttrNotSupported(i) => {
                return write!(f, "SAI_STATUS_ATTR_NOT_SUPPORTED_{}", i)
            }
        };
        write!(f, "{}", s)
    }
}

/// Clamps an attribute list position into the 16-bit index space of the
/// attribute-indexed status codes.
pub(crate) fn attr_index(position: usize) -> u16 {
    u16::try_from(position).unwrap_or(u16::MAX)
}

/// Error type for SAI operations.
///
/// Each variant maps back to exactly one [`SaiStatus`] via
/// [`SaiError::status`], which is what the C ABI layer returns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaiError {
    /// Status reported by an adapter without further context.
    #[error("SAI operation failed: {status}")]
    Status { status: SaiStatus },

    /// A mandatory-on-create attribute was not supplied.
    #[error("Mandatory attribute missing: {attr}")]
    MandatoryAttributeMissing { attr: String },

    /// The attribute at `index` carries an invalid value.
    #[error("Invalid value for attribute #{index}: {message}")]
    InvalidAttrValue { index: u16, message: String },

    /// The attribute id at `index` is not part of the object's schema.
    #[error("Unknown attribute #{index}: id 0x{id:x}")]
    UnknownAttribute { index: u16, id: u32 },

    /// The attribute id at `index` is valid but not supported here.
    #[error("Attribute #{index} not supported: id 0x{id:x}")]
    AttrNotSupported { index: u16, id: u32 },

    /// Invalid parameter passed to SAI API.
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// The object id does not name a live object of the expected type.
    #[error("Invalid object id: 0x{oid:016x}")]
    InvalidObjectId { oid: RawSaiObjectId },

    /// The item already exists.
    #[error("Item already exists: {item}")]
    AlreadyExists { item: String },

    /// Object is in use and cannot be removed.
    #[error("Object in use: {object}")]
    ObjectInUse { object: String },

    /// The requested feature is not supported by the SAI implementation.
    #[error("Feature not supported: {feature}")]
    NotSupported { feature: String },

    /// No adapter is installed.
    #[error("SAI not initialized")]
    Uninitialized,

    /// Internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SaiError {
    /// Creates an error from a SAI status code.
    pub fn from_status(status: SaiStatus) -> Self {
        match status {
            SaiStatus::Success => SaiError::Internal {
                message: "from_status called with success status".to_string(),
            },
            SaiStatus::Uninitialized => SaiError::Uninitialized,
            _ => SaiError::Status { status },
        }
    }

    /// Returns the status code this error is reported as.
    pub fn status(&self) -> SaiStatus {
        match self {
            SaiError::Status { status } => *status,
            SaiError::MandatoryAttributeMissing { .. } => SaiStatus::MandatoryAttributeMissing,
            SaiError::InvalidAttrValue { index, .. } => SaiStatus::InvalidAttrValue(*index),
            SaiError::UnknownAttribute { index, .. } => SaiStatus::UnknownAttribute(*index),
            SaiError::AttrNotSupported { index, .. } => SaiStatus::AttrNotSupported(*index),
            SaiError::InvalidParameter { .. } => SaiStatus::InvalidParameter,
            SaiError::InvalidObjectId { .. } => SaiStatus::InvalidObjectId,
            SaiError::AlreadyExists { .. } => SaiStatus::ItemAlreadyExists,
            SaiError::ObjectInUse { .. } => SaiStatus::ObjectInUse,
            SaiError::NotSupported { .. } => SaiStatus::NotSupported,
            SaiError::Uninitialized => SaiStatus::Uninitialized,
            SaiError::Internal { .. } => SaiStatus::Failure,
        }
    }

    /// Creates a mandatory attribute missing error.
    pub fn mandatory_missing(attr: impl Into<String>) -> Self {
        SaiError::MandatoryAttributeMissing { attr: attr.into() }
    }

    /// Creates an invalid attribute value error for list position `index`.
    pub fn invalid_attr_value(index: usize, message: impl Into<String>) -> Self {
        SaiError::InvalidAttrValue {
            index: attr_index(index),
            message: message.into(),
        }
    }

    /// Creates a not supported error with a feature description.
    pub fn not_supported(feature: impl Into<String>) -> Self {
        SaiError::NotSupported {
            feature: feature.into(),
        }
    }

    /// Creates an invalid parameter error with a message.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        SaiError::InvalidParameter {
            message: message.into(),
        }
    }

    /// Creates an invalid object id error.
    pub fn invalid_object_id(oid: RawSaiObjectId) -> Self {
        SaiError::InvalidObjectId { oid }
    }

    /// Creates an already exists error.
    pub fn already_exists(item: impl Into<String>) -> Self {
        SaiError::AlreadyExists { item: item.into() }
    }

    /// Creates an object in use error.
    pub fn object_in_use(object: impl Into<String>) -> Self {
        SaiError::ObjectInUse {
            object: object.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        SaiError::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.status(),
            SaiStatus::InsufficientResources | SaiStatus::NoMemory | SaiStatus::NotExecuted
        )
    }
}

/// Result type for SAI operations.
pub type SaiResult<T> = Result<T, SaiError>;

/// Extension trait for converting raw SAI status codes.
pub trait SaiStatusExt {
    /// Converts a raw status code to a Result.
    fn to_result(self) -> SaiResult<()>;
}

impl SaiStatusExt for RawSaiStatus {
    fn to_result(self) -> SaiResult<()> {
        SaiStatus::from_raw(self).into_result()
    }
}

//! Type-safe SAI object IDs for the DASH HA object family.
//!
//! An HA session references an ENI and an HA pair by object id. Giving each
//! kind its own Rust type makes it impossible to pass a pair id where an ENI
//! id is expected.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

/// Raw SAI object ID type (matches sai_object_id_t in C).
pub type RawSaiObjectId = u64;

/// The null object ID (SAI_NULL_OBJECT_ID).
pub const SAI_NULL_OBJECT_ID: RawSaiObjectId = 0;

/// Object kinds known to this crate.
///
/// The discriminant is a crate-local tag used by the virtual adapter to
/// stamp the object kind into the upper bits of the ids it allocates. It is
/// not a `sai_object_type_t` value.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashObjectKind {
    Switch = 1,
    DashHaPair = 2,
    DashHaSession = 3,
    Eni = 4,
    HaScope = 5,
}

impl DashObjectKind {
    const SHIFT: u32 = 48;

    /// Returns the kind tag encoded in `raw`, if any.
    pub fn from_oid(raw: RawSaiObjectId) -> Option<Self> {
        match (raw >> Self::SHIFT) as u8 {
            1 => Some(Self::Switch),
            2 => Some(Self::DashHaPair),
            3 => Some(Self::DashHaSession),
            4 => Some(Self::Eni),
            5 => Some(Self::HaScope),
            _ => None,
        }
    }

    /// Builds a raw id carrying this kind tag and the given index.
    pub fn make_oid(self, index: u64) -> RawSaiObjectId {
        ((self as u64) << Self::SHIFT) | (index & ((1 << Self::SHIFT) - 1))
    }
}

/// Marker trait for SAI object kinds.
pub trait SaiObjectKind: Send + Sync + 'static {
    /// Crate-local kind tag.
    const KIND: DashObjectKind;

    /// Returns the SAI object type name for debugging.
    fn type_name() -> &'static str;
}

/// A type-safe SAI object ID.
///
/// # Examples
///
/// ```
/// use sonic_sai_dash_ha::{DashHaPairOid, EniOid};
///
/// let pair = DashHaPairOid::from_raw(0x2_0000_0000_0001).unwrap();
/// let eni = EniOid::from_raw(0x4_0000_0000_0001).unwrap();
/// assert_ne!(pair.as_raw(), eni.as_raw());
///
/// // This would fail to compile:
/// // fn takes_pair(p: DashHaPairOid) {}
/// // takes_pair(eni);
/// ```
#[derive(Clone, Copy)]
pub struct SaiObjectId<T: SaiObjectKind> {
    raw: RawSaiObjectId,
    _marker: PhantomData<T>,
}

impl<T: SaiObjectKind> SaiObjectId<T> {
    /// The null object ID.
    pub const NULL: Self = Self {
        raw: SAI_NULL_OBJECT_ID,
        _marker: PhantomData,
    };

    /// Creates a new object ID from a raw value.
    ///
    /// Returns `None` if the raw value is the null object ID.
    pub fn from_raw(raw: RawSaiObjectId) -> Option<Self> {
        if raw == SAI_NULL_OBJECT_ID {
            None
        } else {
            Some(Self::from_raw_unchecked(raw))
        }
    }

    /// Creates a new object ID from a raw value, including null.
    pub const fn from_raw_unchecked(raw: RawSaiObjectId) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Returns the raw object ID value.
    pub const fn as_raw(&self) -> RawSaiObjectId {
        self.raw
    }

    /// Returns true if this is a null object ID.
    pub const fn is_null(&self) -> bool {
        self.raw == SAI_NULL_OBJECT_ID
    }

    /// Returns true if this is a valid (non-null) object ID.
    pub const fn is_valid(&self) -> bool {
        self.raw != SAI_NULL_OBJECT_ID
    }

    /// Returns true if the id carries this kind's tag.
    pub fn has_kind_tag(&self) -> bool {
        DashObjectKind::from_oid(self.raw) == Some(T::KIND)
    }
}

impl<T: SaiObjectKind> fmt::Debug for SaiObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:016x})", T::type_name(), self.raw)
    }
}

impl<T: SaiObjectKind> fmt::Display for SaiObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "oid:0x{:x}", self.raw)
    }
}

impl<T: SaiObjectKind> PartialEq for SaiObjectId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T: SaiObjectKind> Eq for SaiObjectId<T> {}

impl<T: SaiObjectKind> Hash for SaiObjectId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T: SaiObjectKind> Default for SaiObjectId<T> {
    fn default() -> Self {
        Self::NULL
    }
}

macro_rules! define_object_kind {
    ($name:ident, $kind:ident, $type_name:literal, $oid_alias:ident) => {
        #[doc = concat!("Marker type for ", $type_name, " objects.")]
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl SaiObjectKind for $name {
            const KIND: DashObjectKind = DashObjectKind::$kind;

            fn type_name() -> &'static str {
                $type_name
            }
        }

        #[doc = concat!("Object ID of a ", $type_name, ".")]
        pub type $oid_alias = SaiObjectId<$name>;
    };
}

define_object_kind!(SwitchKind, Switch, "Switch", SwitchOid);
define_object_kind!(DashHaPairKind, DashHaPair, "DashHaPair", DashHaPairOid);
define_object_kind!(DashHaSessionKind, DashHaSession, "DashHaSession", DashHaSessionOid);
define_object_kind!(EniKind, Eni, "Eni", EniOid);
define_object_kind!(HaScopeKind, HaScope, "HaScope", HaScopeOid);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oid_creation() {
        let pair = DashHaPairOid::from_raw(0x2_0000_0000_0001).unwrap();
        assert_eq!(pair.as_raw(), 0x2_0000_0000_0001);
        assert!(pair.is_valid());
        assert!(!pair.is_null());
        assert!(pair.has_kind_tag());
    }

    #[test]
    fn test_null_oid() {
        assert!(EniOid::from_raw(0).is_none());
        assert!(EniOid::NULL.is_null());
        assert_eq!(EniOid::default(), EniOid::NULL);
    }

    #[test]
    fn test_oid_debug() {
        let session = DashHaSessionOid::from_raw(0x3_0000_0000_0007).unwrap();
        let debug = format!("{:?}", session);
        assert!(debug.contains("DashHaSession"));
        assert!(debug.contains("0x0003000000000007"));
        assert_eq!(session.to_string(), "oid:0x3000000000007");
    }

    #[test]
    fn test_kind_tag_round_trip() {
        let raw = DashObjectKind::Eni.make_oid(42);
        assert_eq!(DashObjectKind::from_oid(raw), Some(DashObjectKind::Eni));
        assert_eq!(raw & 0xFFFF, 42);
        assert_eq!(DashObjectKind::from_oid(0x99 << 48), None);

        let eni = EniOid::from_raw(raw).unwrap();
        assert!(eni.has_kind_tag());
        let wrong = DashHaPairOid::from_raw(raw).unwrap();
        assert!(!wrong.has_kind_tag());
    }
}

//! Switch-level HA scope event notification.
//!
//! The DASH HA extension appends one attribute to the switch object,
//! `SAI_SWITCH_ATTR_HA_SCOPE_EVENT_NOTIFY`, placed at the start of the switch
//! extension range. The range begins at the base header's
//! `SAI_SWITCH_ATTR_END`, which is supplied by the caller.

use std::fmt;
use std::sync::Arc;

use crate::attr::{AttrDefault, AttrFlags, AttrMetadata, AttrValueType, SaiAttrId, SaiAttribute};
use crate::error::SaiResult;
use crate::types::{HaScopeOid, SwitchOid};

/// HA scope event types (`sai_ha_scope_event_t`).
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HaScopeEvent {
    /// HA scope state changed.
    StateChanged = 0,
}

impl HaScopeEvent {
    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(HaScopeEvent::StateChanged),
            _ => None,
        }
    }

    pub fn sai_name(&self) -> &'static str {
        match self {
            HaScopeEvent::StateChanged => "SAI_HA_SCOPE_STATE_CHANGED",
        }
    }
}

impl fmt::Display for HaScopeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sai_name())
    }
}

/// One HA scope event record (`sai_ha_scope_event_data_t`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaScopeEventData {
    pub event_type: HaScopeEvent,
    pub ha_scope_id: HaScopeOid,
    /// Attributes of the HA scope that changed.
    pub attrs: Vec<SaiAttribute>,
}

impl HaScopeEventData {
    pub fn state_changed(ha_scope_id: HaScopeOid, attrs: Vec<SaiAttribute>) -> Self {
        Self {
            event_type: HaScopeEvent::StateChanged,
            ha_scope_id,
            attrs,
        }
    }
}

/// Callback invoked with a batch of HA scope events
/// (`sai_ha_scope_event_notification_fn`).
pub type HaScopeEventNotification = Arc<dyn Fn(&[HaScopeEventData]) + Send + Sync>;

/// Location of the switch extension attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwitchAttrExtensionRange {
    start: SaiAttrId,
}

impl SwitchAttrExtensionRange {
    /// Builds the range from the base header's `SAI_SWITCH_ATTR_END`.
    pub const fn new(switch_attr_end: SaiAttrId) -> Self {
        Self {
            start: switch_attr_end,
        }
    }

    /// Like [`new`](Self::new), but `None` when the range would run past
    /// the attribute id space.
    pub const fn try_new(switch_attr_end: SaiAttrId) -> Option<Self> {
        match switch_attr_end.checked_add(1) {
            Some(_) => Some(Self::new(switch_attr_end)),
            None => None,
        }
    }

    /// `SAI_SWITCH_ATTR_EXTENSIONS_RANGE_START`
    pub const fn start(&self) -> SaiAttrId {
        self.start
    }

    /// Id of `SAI_SWITCH_ATTR_HA_SCOPE_EVENT_NOTIFY`.
    pub const fn ha_scope_event_notify(&self) -> SaiAttrId {
        self.start
    }

    /// `SAI_SWITCH_ATTR_EXTENSIONS_RANGE_END`
    ///
    /// Saturates at `u32::MAX`.
    pub const fn end(&self) -> SaiAttrId {
        self.start.saturating_add(1)
    }

    pub fn contains(&self, id: SaiAttrId) -> bool {
        self.lookup(id).is_some()
    }

    /// Resolves an attribute id to the extension it names.
    pub fn lookup(&self, id: SaiAttrId) -> Option<SwitchAttrExtension> {
        if id == self.ha_scope_event_notify() {
            Some(SwitchAttrExtension::HaScopeEventNotify)
        } else {
            None
        }
    }
}

/// Switch attributes added by the DASH HA extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchAttrExtension {
    HaScopeEventNotify,
}

impl SwitchAttrExtension {
    pub fn metadata(&self, range: SwitchAttrExtensionRange) -> AttrMetadata {
        match self {
            SwitchAttrExtension::HaScopeEventNotify => AttrMetadata {
                id: range.ha_scope_event_notify(),
                name: "SAI_SWITCH_ATTR_HA_SCOPE_EVENT_NOTIFY",
                value_type: AttrValueType::Pointer,
                flags: AttrFlags::CreateAndSet,
                default: AttrDefault::Null,
                allow_null: true,
                allowed_s32: &[],
            },
        }
    }
}

/// Switch-side half of the HA extension: registration of the HA scope
/// event callback.
pub trait SwitchHaExtension: Send + Sync {
    /// Sets or clears (`None`) the HA scope event callback of a switch.
    fn set_ha_scope_event_notify(
        &self,
        switch_id: SwitchOid,
        notify: Option<HaScopeEventNotification>,
    ) -> SaiResult<()>;

    /// Returns true if a callback is registered on the switch.
    fn has_ha_scope_event_notify(&self, switch_id: SwitchOid) -> SaiResult<bool>;
}

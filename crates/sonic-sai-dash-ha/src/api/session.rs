//! Typed HA session configuration.

use crate::attr::{find_attr, AttrValue, SaiAttribute};
use crate::error::{SaiError, SaiResult};
use crate::schema::{DashHaRole, DashHaSessionAttr};
use crate::types::{DashHaPairOid, EniOid};

/// HA session configuration.
///
/// `role` is `None` when the session is created without an explicit role,
/// in which case the adapter applies the default (`Dead`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HaSessionConfig {
    pub eni: EniOid,
    pub ha_pair: DashHaPairOid,
    pub role: Option<DashHaRole>,
}

impl HaSessionConfig {
    pub fn new(eni: EniOid, ha_pair: DashHaPairOid) -> Self {
        Self {
            eni,
            ha_pair,
            role: None,
        }
    }

    pub fn with_role(mut self, role: DashHaRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Returns the create attribute list.
    pub fn to_attributes(&self) -> Vec<SaiAttribute> {
        let mut attrs = vec![
            DashHaSessionAttr::EniId.attr(AttrValue::ObjectId(self.eni.as_raw())),
            DashHaSessionAttr::HaPairId.attr(AttrValue::ObjectId(self.ha_pair.as_raw())),
        ];
        if let Some(role) = self.role {
            attrs.push(DashHaSessionAttr::HaRole.attr(AttrValue::S32(role.as_raw())));
        }
        attrs
    }

    /// Rebuilds a configuration from an attribute list. A missing role
    /// attribute leaves `role` unset.
    pub fn from_attributes(attrs: &[SaiAttribute]) -> SaiResult<Self> {
        let oid = |attr: DashHaSessionAttr| -> SaiResult<u64> {
            let (index, a) = find_attr(attrs, attr.as_raw())
                .ok_or_else(|| SaiError::mandatory_missing(attr.sai_name()))?;
            a.value
                .as_oid()
                .ok_or_else(|| SaiError::invalid_attr_value(index, attr.sai_name()))
        };

        let role = match find_attr(attrs, DashHaSessionAttr::HaRole.as_raw()) {
            Some((index, a)) => {
                let role = a
                    .value
                    .as_s32()
                    .and_then(DashHaRole::from_raw)
                    .ok_or_else(|| SaiError::invalid_attr_value(index, "invalid HA role"))?;
                Some(role)
            }
            None => None,
        };

        Ok(Self {
            eni: EniOid::from_raw_unchecked(oid(DashHaSessionAttr::EniId)?),
            ha_pair: DashHaPairOid::from_raw_unchecked(oid(DashHaSessionAttr::HaPairId)?),
            role,
        })
    }
}

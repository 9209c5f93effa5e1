//! Typed HA pair configuration.
//!
//! [`HaPairConfig`] is the attribute list of `SAI_OBJECT_TYPE_DASH_HA_PAIR`
//! in struct form. Every field is mandatory on create and immutable
//! afterwards.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::attr::{find_attr, AttrValue, SaiAttribute};
use crate::error::{SaiError, SaiResult};
use crate::schema::DashHaPairAttr;

/// Inclusive UDP source port range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRange {
    pub min: u16,
    pub max: u16,
}

impl PortRange {
    pub const fn new(min: u16, max: u16) -> Self {
        Self { min, max }
    }

    /// Returns false when `min` exceeds `max`.
    pub const fn is_valid(&self) -> bool {
        self.min <= self.max
    }

    pub fn contains(&self, port: u16) -> bool {
        (self.min..=self.max).contains(&port)
    }

    /// Number of ports in the range, zero when invalid.
    pub fn len(&self) -> u32 {
        if self.is_valid() {
            u32::from(self.max - self.min) + 1
        } else {
            0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// HA pair configuration. There are no defaults: every field is a
/// mandatory create attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaPairConfig {
    pub peer_dpu_ipv4: Ipv4Addr,
    pub peer_dpu_ipv6: Ipv6Addr,
    pub peer_npu_ipv4: Ipv4Addr,
    pub peer_npu_ipv6: Ipv6Addr,
    /// Destination port of the NPU-to-DPU tunnel.
    pub npu_tunnel_dst_port: u16,
    pub npu_tunnel_src_ports: PortRange,
    /// Destination port of the DPU-to-DPU data plane channel.
    pub dp_channel_dst_port: u16,
    pub dp_channel_src_ports: PortRange,
    pub dp_channel_probe_interval_ms: u32,
}

impl HaPairConfig {
    /// Returns the create attribute list, in attribute id order.
    pub fn to_attributes(&self) -> Vec<SaiAttribute> {
        vec![
            DashHaPairAttr::PeerDpuIpv4.attr(AttrValue::Ip4(self.peer_dpu_ipv4)),
            DashHaPairAttr::PeerDpuIpv6.attr(AttrValue::Ip6(self.peer_dpu_ipv6)),
            DashHaPairAttr::PeerNpuIpv4.attr(AttrValue::Ip4(self.peer_npu_ipv4)),
            DashHaPairAttr::PeerNpuIpv6.attr(AttrValue::Ip6(self.peer_npu_ipv6)),
            DashHaPairAttr::NpuTunnelDstPort.attr(AttrValue::U16(self.npu_tunnel_dst_port)),
            DashHaPairAttr::NpuTunnelSrcPortMin.attr(AttrValue::U16(self.npu_tunnel_src_ports.min)),
            DashHaPairAttr::NpuTunnelSrcPortMax.attr(AttrValue::U16(self.npu_tunnel_src_ports.max)),
            DashHaPairAttr::DpChannelDstPort.attr(AttrValue::U16(self.dp_channel_dst_port)),
            DashHaPairAttr::DpChannelSrcPortMin.attr(AttrValue::U16(self.dp_channel_src_ports.min)),
            DashHaPairAttr::DpChannelSrcPortMax.attr(AttrValue::U16(self.dp_channel_src_ports.max)),
            DashHaPairAttr::DpChannelProbeIntervalInMs
                .attr(AttrValue::U32(self.dp_channel_probe_interval_ms)),
        ]
    }

    /// Rebuilds a configuration from a full attribute list.
    pub fn from_attributes(attrs: &[SaiAttribute]) -> SaiResult<Self> {
        let value = |attr: DashHaPairAttr| -> SaiResult<(usize, AttrValue)> {
            find_attr(attrs, attr.as_raw())
                .map(|(index, a)| (index, a.value))
                .ok_or_else(|| SaiError::mandatory_missing(attr.sai_name()))
        };
        let mismatch =
            |index: usize, attr: DashHaPairAttr| SaiError::invalid_attr_value(index, attr.sai_name());

        let ip4 = |attr: DashHaPairAttr| -> SaiResult<Ipv4Addr> {
            let (index, v) = value(attr)?;
            v.as_ip4().ok_or_else(|| mismatch(index, attr))
        };
        let ip6 = |attr: DashHaPairAttr| -> SaiResult<Ipv6Addr> {
            let (index, v) = value(attr)?;
            v.as_ip6().ok_or_else(|| mismatch(index, attr))
        };
        let port = |attr: DashHaPairAttr| -> SaiResult<u16> {
            let (index, v) = value(attr)?;
            v.as_u16().ok_or_else(|| mismatch(index, attr))
        };

        let interval = {
            let attr = DashHaPairAttr::DpChannelProbeIntervalInMs;
            let (index, v) = value(attr)?;
            v.as_u32().ok_or_else(|| mismatch(index, attr))?
        };

        Ok(Self {
            peer_dpu_ipv4: ip4(DashHaPairAttr::PeerDpuIpv4)?,
            peer_dpu_ipv6: ip6(DashHaPairAttr::PeerDpuIpv6)?,
            peer_npu_ipv4: ip4(DashHaPairAttr::PeerNpuIpv4)?,
            peer_npu_ipv6: ip6(DashHaPairAttr::PeerNpuIpv6)?,
            npu_tunnel_dst_port: port(DashHaPairAttr::NpuTunnelDstPort)?,
            npu_tunnel_src_ports: PortRange::new(
                port(DashHaPairAttr::NpuTunnelSrcPortMin)?,
                port(DashHaPairAttr::NpuTunnelSrcPortMax)?,
            ),
            dp_channel_dst_port: port(DashHaPairAttr::DpChannelDstPort)?,
            dp_channel_src_ports: PortRange::new(
                port(DashHaPairAttr::DpChannelSrcPortMin)?,
                port(DashHaPairAttr::DpChannelSrcPortMax)?,
            ),
            dp_channel_probe_interval_ms: interval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> HaPairConfig {
        HaPairConfig {
            peer_dpu_ipv4: Ipv4Addr::new(10, 1, 0, 2),
            peer_dpu_ipv6: "fd00::2".parse().unwrap(),
            peer_npu_ipv4: Ipv4Addr::new(10, 2, 0, 2),
            peer_npu_ipv6: "fd01::2".parse().unwrap(),
            npu_tunnel_dst_port: 4789,
            npu_tunnel_src_ports: PortRange::new(49152, 53247),
            dp_channel_dst_port: 4790,
            dp_channel_src_ports: PortRange::new(53248, 65535),
            dp_channel_probe_interval_ms: 100,
        }
    }

    #[test]
    fn test_attribute_order_matches_ids() {
        let attrs = sample().to_attributes();
        assert_eq!(attrs.len(), 11);
        for (i, attr) in attrs.iter().enumerate() {
            assert_eq!(attr.id as usize, i);
        }
    }

    #[test]
    fn test_from_attributes_any_order() {
        let mut attrs = sample().to_attributes();
        attrs.reverse();
        assert_eq!(HaPairConfig::from_attributes(&attrs).unwrap(), sample());
    }

    #[test]
    fn test_from_attributes_missing() {
        let mut attrs = sample().to_attributes();
        attrs.pop();
        let err = HaPairConfig::from_attributes(&attrs).unwrap_err();
        assert_eq!(
            err,
            SaiError::mandatory_missing("SAI_DASH_HA_PAIR_ATTR_DP_CHANNEL_PROBE_INTERVAL_IN_MS")
        );
    }

    #[test]
    fn test_port_range() {
        let r = PortRange::new(10, 20);
        assert!(r.is_valid());
        assert!(r.contains(10));
        assert!(r.contains(20));
        assert!(!r.contains(21));
        assert_eq!(r.len(), 11);
        assert_eq!(r.to_string(), "10-20");

        let bad = PortRange::new(20, 10);
        assert!(!bad.is_valid());
        assert!(bad.is_empty());
        assert_eq!(PortRange::new(0, u16::MAX).len(), 65536);
    }
}

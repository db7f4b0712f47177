//! Node ID IE.

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::{Error, Result};
use crate::pfcp::ie::{Ie, IeType};

/// PFCP node identity: IPv4, IPv6, or FQDN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeId {
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    Fqdn(String),
}

impl NodeId {
    pub fn marshal(&self) -> Vec<u8> {
        let mut data = Vec::new();
        match self {
            NodeId::Ipv4(addr) => {
                data.push(0);
                data.extend_from_slice(&addr.octets());
            }
            NodeId::Ipv6(addr) => {
                data.push(1);
                data.extend_from_slice(&addr.octets());
            }
            NodeId::Fqdn(fqdn) => {
                data.push(2);
                data.extend_from_slice(fqdn.as_bytes());
            }
        }
        data
    }

    pub fn unmarshal(payload: &[u8]) -> Result<Self> {
        let (&kind, rest) = payload
            .split_first()
            .ok_or_else(|| Error::Protocol("empty Node ID payload".into()))?;
        match kind {
            0 => {
                let octets: [u8; 4] = rest
                    .try_into()
                    .map_err(|_| Error::Protocol("Node ID IPv4 needs 4 bytes".into()))?;
                Ok(NodeId::Ipv4(Ipv4Addr::from(octets)))
            }
            1 => {
                let octets: [u8; 16] = rest
                    .try_into()
                    .map_err(|_| Error::Protocol("Node ID IPv6 needs 16 bytes".into()))?;
                Ok(NodeId::Ipv6(Ipv6Addr::from(octets)))
            }
            2 => {
                let fqdn = std::str::from_utf8(rest)
                    .map_err(|_| Error::Protocol("Node ID FQDN is not UTF-8".into()))?;
                Ok(NodeId::Fqdn(fqdn.to_string()))
            }
            other => Err(Error::Protocol(format!("unknown Node ID type {other}"))),
        }
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::NodeId, self.marshal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_roundtrip() {
        let node = NodeId::Ipv4("10.0.0.1".parse().unwrap());
        assert_eq!(NodeId::unmarshal(&node.marshal()).unwrap(), node);
    }

    #[test]
    fn fqdn_roundtrip() {
        let node = NodeId::Fqdn("upf.5gc.example.org".into());
        assert_eq!(NodeId::unmarshal(&node.marshal()).unwrap(), node);
    }

    #[test]
    fn short_ipv4_is_rejected() {
        assert!(NodeId::unmarshal(&[0, 10, 0]).is_err());
    }
}

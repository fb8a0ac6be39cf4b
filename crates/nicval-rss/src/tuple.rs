use core::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use bitflags::bitflags;

use crate::error::{HashInputError, TupleField};
use crate::key::{IPV4_INPUT_BITS, IPV6_INPUT_BITS};

/// Transport protocol carried by a synthetic packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum L4Protocol {
    Tcp,
    Udp,
    Sctp,
    Icmp,
    /// Any other IP protocol number.
    Other(u8),
}

impl L4Protocol {
    pub fn from_ip_proto(proto: u8) -> Self {
        match proto {
            1 | 58 => L4Protocol::Icmp,
            6 => L4Protocol::Tcp,
            17 => L4Protocol::Udp,
            132 => L4Protocol::Sctp,
            other => L4Protocol::Other(other),
        }
    }
}

bitflags! {
    /// Transport protocols whose 4-tuple the device feeds into the Toeplitz hash.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct HashedProtocols: u8 {
        const TCP = 1 << 0;
        const UDP = 1 << 1;
        const SCTP = 1 << 2;
    }
}

impl Default for HashedProtocols {
    fn default() -> Self {
        HashedProtocols::TCP | HashedProtocols::UDP
    }
}

impl HashedProtocols {
    pub fn hashes(self, protocol: L4Protocol) -> bool {
        match protocol {
            L4Protocol::Tcp => self.contains(HashedProtocols::TCP),
            L4Protocol::Udp => self.contains(HashedProtocols::UDP),
            L4Protocol::Sctp => self.contains(HashedProtocols::SCTP),
            L4Protocol::Icmp | L4Protocol::Other(_) => false,
        }
    }
}

/// Header fields of one synthetic packet, as described by the traffic generator.
///
/// Every field is optional: non-hashed traffic (ICMP, ARP-ish probes) routinely lacks ports, and a
/// tuple that claims a hashed protocol without them is rejected when it is hashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PacketTuple {
    pub src_addr: Option<IpAddr>,
    pub dst_addr: Option<IpAddr>,
    pub src_port: Option<u16>,
    pub dst_port: Option<u16>,
    pub protocol: L4Protocol,
}

impl PacketTuple {
    pub fn tcp(src: impl Into<IpAddr>, src_port: u16, dst: impl Into<IpAddr>, dst_port: u16) -> Self {
        Self::with_ports(L4Protocol::Tcp, src.into(), src_port, dst.into(), dst_port)
    }

    pub fn udp(src: impl Into<IpAddr>, src_port: u16, dst: impl Into<IpAddr>, dst_port: u16) -> Self {
        Self::with_ports(L4Protocol::Udp, src.into(), src_port, dst.into(), dst_port)
    }

    pub fn icmp(src: impl Into<IpAddr>, dst: impl Into<IpAddr>) -> Self {
        Self {
            src_addr: Some(src.into()),
            dst_addr: Some(dst.into()),
            src_port: None,
            dst_port: None,
            protocol: L4Protocol::Icmp,
        }
    }

    fn with_ports(
        protocol: L4Protocol,
        src: IpAddr,
        src_port: u16,
        dst: IpAddr,
        dst_port: u16,
    ) -> Self {
        Self {
            src_addr: Some(src),
            dst_addr: Some(dst),
            src_port: Some(src_port),
            dst_port: Some(dst_port),
            protocol,
        }
    }

    /// Validates the fields the hash needs and returns them in Toeplitz input form.
    pub fn hash_input(&self) -> Result<HashTuple, HashInputError> {
        let src = self
            .src_addr
            .ok_or(HashInputError::MissingField(TupleField::SrcAddr))?;
        let dst = self
            .dst_addr
            .ok_or(HashInputError::MissingField(TupleField::DstAddr))?;
        let src_port = self
            .src_port
            .ok_or(HashInputError::MissingField(TupleField::SrcPort))?;
        let dst_port = self
            .dst_port
            .ok_or(HashInputError::MissingField(TupleField::DstPort))?;

        match (src, dst) {
            (IpAddr::V4(src), IpAddr::V4(dst)) => Ok(HashTuple::V4 {
                src,
                dst,
                src_port,
                dst_port,
            }),
            (IpAddr::V6(src), IpAddr::V6(dst)) => Ok(HashTuple::V6 {
                src,
                dst,
                src_port,
                dst_port,
            }),
            _ => Err(HashInputError::MixedAddressFamilies),
        }
    }
}

/// A fully populated 4-tuple of a single address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashTuple {
    V4 {
        src: Ipv4Addr,
        dst: Ipv4Addr,
        src_port: u16,
        dst_port: u16,
    },
    V6 {
        src: Ipv6Addr,
        dst: Ipv6Addr,
        src_port: u16,
        dst_port: u16,
    },
}

/// Largest Toeplitz input in bytes (IPv6 4-tuple).
pub const MAX_INPUT_LEN: usize = IPV6_INPUT_BITS / 8;

impl HashTuple {
    pub fn input_bits(&self) -> usize {
        match self {
            HashTuple::V4 { .. } => IPV4_INPUT_BITS,
            HashTuple::V6 { .. } => IPV6_INPUT_BITS,
        }
    }

    /// Serializes the tuple in network byte order: source address, destination address, source
    /// port, destination port. Returns the buffer and the number of bytes used.
    pub fn to_input_bytes(&self) -> ([u8; MAX_INPUT_LEN], usize) {
        let mut buf = [0u8; MAX_INPUT_LEN];
        let (addr_len, src_port, dst_port) = match self {
            HashTuple::V4 {
                src,
                dst,
                src_port,
                dst_port,
            } => {
                buf[0..4].copy_from_slice(&src.octets());
                buf[4..8].copy_from_slice(&dst.octets());
                (8, *src_port, *dst_port)
            }
            HashTuple::V6 {
                src,
                dst,
                src_port,
                dst_port,
            } => {
                buf[0..16].copy_from_slice(&src.octets());
                buf[16..32].copy_from_slice(&dst.octets());
                (32, *src_port, *dst_port)
            }
        };
        buf[addr_len..addr_len + 2].copy_from_slice(&src_port.to_be_bytes());
        buf[addr_len + 2..addr_len + 4].copy_from_slice(&dst_port.to_be_bytes());
        (buf, addr_len + 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_input_is_network_order() {
        let tuple = PacketTuple::tcp(
            Ipv4Addr::new(66, 9, 149, 187),
            2794,
            Ipv4Addr::new(161, 142, 100, 80),
            1766,
        );
        let (buf, len) = tuple.hash_input().unwrap().to_input_bytes();
        assert_eq!(len, 12);
        assert_eq!(
            &buf[..len],
            &[66, 9, 149, 187, 161, 142, 100, 80, 0x0a, 0xea, 0x06, 0xe6]
        );
    }

    #[test]
    fn missing_fields_are_reported_in_input_order() {
        let mut tuple = PacketTuple::udp(
            Ipv4Addr::new(10, 0, 0, 1),
            1000,
            Ipv4Addr::new(10, 0, 0, 2),
            2000,
        );
        tuple.dst_port = None;
        assert_eq!(
            tuple.hash_input(),
            Err(HashInputError::MissingField(TupleField::DstPort))
        );
        tuple.src_addr = None;
        assert_eq!(
            tuple.hash_input(),
            Err(HashInputError::MissingField(TupleField::SrcAddr))
        );
    }

    #[test]
    fn mixed_families_are_rejected() {
        let tuple = PacketTuple::tcp(Ipv4Addr::LOCALHOST, 1, Ipv6Addr::LOCALHOST, 2);
        assert_eq!(
            tuple.hash_input(),
            Err(HashInputError::MixedAddressFamilies)
        );
    }

    #[test]
    fn default_hashed_protocols_are_tcp_and_udp() {
        let hashed = HashedProtocols::default();
        assert!(hashed.hashes(L4Protocol::Tcp));
        assert!(hashed.hashes(L4Protocol::Udp));
        assert!(!hashed.hashes(L4Protocol::Sctp));
        assert!(!hashed.hashes(L4Protocol::Icmp));
        assert!(!hashed.hashes(L4Protocol::Other(47)));
        assert_eq!(L4Protocol::from_ip_proto(132), L4Protocol::Sctp);
    }
}

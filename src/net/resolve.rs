//! Endpoint resolution.
//!
//! Only literal addresses are accepted. There is no DNS lookup: `localhost`
//! is an error, `127.0.0.1` and `::1` are not.

use super::NetError;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

/// Turn a textual address and a port into a socket endpoint.
///
/// IPv4 is tried first, then IPv6. The family of the result is decided
/// only by which parse succeeded.
pub fn resolve(address: &str, port: u16) -> Result<SocketAddr, NetError> {
    if let Ok(ip) = address.parse::<Ipv4Addr>() {
        return Ok(SocketAddr::V4(SocketAddrV4::new(ip, port)));
    }

    if let Ok(ip) = address.parse::<Ipv6Addr>() {
        return Ok(SocketAddr::V6(SocketAddrV6::new(ip, port, 0, 0)));
    }

    Err(NetError::AddressFamily {
        address: address.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_ipv4() {
        let addr = resolve("127.0.0.1", 9999).unwrap();
        assert!(addr.is_ipv4());
        assert_eq!(addr.port(), 9999);
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
    }

    #[test]
    fn test_resolve_ipv6() {
        let addr = resolve("::1", 8080).unwrap();
        assert!(addr.is_ipv6());
        assert_eq!(addr.port(), 8080);
        assert!(addr.ip().is_loopback());
    }

    #[test]
    fn test_mapped_ipv4_is_ipv6() {
        let addr = resolve("::ffff:127.0.0.1", 1).unwrap();
        assert!(addr.is_ipv6());
    }

    #[test]
    fn test_port_is_big_endian_on_the_wire() {
        let addr = resolve("10.0.0.1", 0x1234).unwrap();
        assert_eq!(addr.port().to_be_bytes(), [0x12, 0x34]);
    }

    #[test]
    fn test_resolve_rejects_non_literals() {
        for address in ["not-an-address", "localhost", "", "256.0.0.1", "127.0.0.1:80"] {
            match resolve(address, 9999) {
                Err(NetError::AddressFamily { address: reported }) => {
                    assert_eq!(reported, address)
                }
                other => panic!("unexpected for {address:?}: {:?}", other),
            }
        }
    }
}

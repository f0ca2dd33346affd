//! Session Frame codec for the UDP relay.
//!
//! A client-originated datagram carries its own return address so the relay
//! knows where to redirect the payload:
//!
//! `[1 byte L][L bytes: UTF-8 "host:port"][remaining bytes: payload]`
//!
//! The relay only decodes; `encode` is the client half of the convention and
//! keeps the round-trip property testable in one place.

use thiserror::Error;

/// Maximum embedded-address length representable by the 1-byte prefix.
pub const MAX_ADDR_LEN: usize = 255;

/// Largest datagram the relay reads off the socket.
pub const MAX_DATAGRAM_LEN: usize = 8192;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("empty datagram")]
    Empty,
    #[error("address length {len} exceeds remaining {remaining} bytes")]
    AddrTruncated { len: usize, remaining: usize },
    #[error("embedded address is not valid utf-8")]
    AddrNotUtf8,
    #[error("address length {0} exceeds the 1-byte prefix maximum")]
    AddrTooLong(usize),
}

/// Split a client-originated datagram into its embedded return address and payload.
pub fn decode(datagram: &[u8]) -> Result<(&str, &[u8]), FrameError> {
    let (&len, rest) = datagram.split_first().ok_or(FrameError::Empty)?;
    let len = len as usize;
    if len > rest.len() {
        return Err(FrameError::AddrTruncated {
            len,
            remaining: rest.len(),
        });
    }
    let (addr, payload) = rest.split_at(len);
    let addr = std::str::from_utf8(addr).map_err(|_| FrameError::AddrNotUtf8)?;
    Ok((addr, payload))
}

/// Frame a return address and payload into a datagram for the relay.
pub fn encode(addr: &str, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let addr = addr.as_bytes();
    if addr.len() > MAX_ADDR_LEN {
        return Err(FrameError::AddrTooLong(addr.len()));
    }
    let mut out = Vec::with_capacity(1 + addr.len() + payload.len());
    out.push(addr.len() as u8);
    out.extend_from_slice(addr);
    out.extend_from_slice(payload);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let buf = encode("1.2.3.4:56", b"hello").unwrap();
        assert_eq!(buf[0], 10);

        let (addr, payload) = decode(&buf).unwrap();
        assert_eq!(addr, "1.2.3.4:56");
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn roundtrip_empty_payload() {
        let buf = encode("127.0.0.1:1", b"").unwrap();
        let (addr, payload) = decode(&buf).unwrap();
        assert_eq!(addr, "127.0.0.1:1");
        assert!(payload.is_empty());
    }

    #[test]
    fn roundtrip_max_len_address() {
        let addr = "a".repeat(MAX_ADDR_LEN);
        let buf = encode(&addr, b"x").unwrap();
        let (got, payload) = decode(&buf).unwrap();
        assert_eq!(got, addr);
        assert_eq!(payload, b"x");
    }

    #[test]
    fn encode_rejects_oversized_address() {
        let addr = "a".repeat(MAX_ADDR_LEN + 1);
        assert_eq!(
            encode(&addr, b"").unwrap_err(),
            FrameError::AddrTooLong(MAX_ADDR_LEN + 1)
        );
    }

    #[test]
    fn decode_rejects_empty_datagram() {
        assert_eq!(decode(&[]).unwrap_err(), FrameError::Empty);
    }

    #[test]
    fn decode_rejects_truncated_address() {
        // L = 255 but only one byte follows the prefix.
        assert_eq!(
            decode(&[0xff, b'x']).unwrap_err(),
            FrameError::AddrTruncated {
                len: 255,
                remaining: 1
            }
        );
    }

    #[test]
    fn decode_rejects_non_utf8_address() {
        assert_eq!(
            decode(&[2, 0xc3, 0x28, b'p']).unwrap_err(),
            FrameError::AddrNotUtf8
        );
    }

    #[test]
    fn decode_address_only_frame() {
        // L consuming the whole datagram leaves an empty payload, which is legal.
        let (addr, payload) = decode(&[3, b'a', b':', b'1']).unwrap();
        assert_eq!(addr, "a:1");
        assert!(payload.is_empty());
    }
}

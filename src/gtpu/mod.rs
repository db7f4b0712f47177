//! GTP-U (N3) codec.
//!
//! The header is 8 bytes, extended by 4 optional bytes (sequence, N-PDU
//! number, next-extension-header type) whenever any of the E/S/PN flags is
//! set. Length is big-endian and excludes the mandatory 8 bytes. This core
//! emits plain G-PDUs and answers Echo Requests; extension headers in
//! received packets are skipped, not interpreted.

use crate::error::{Error, Result};

/// Registered GTP-U port.
pub const GTPU_PORT: u16 = 2152;

pub const MSG_ECHO_REQUEST: u8 = 1;
pub const MSG_ECHO_RESPONSE: u8 = 2;
pub const MSG_ERROR_INDICATION: u8 = 26;
pub const MSG_END_MARKER: u8 = 254;
pub const MSG_G_PDU: u8 = 255;

const FLAG_PN: u8 = 0x01;
const FLAG_S: u8 = 0x02;
const FLAG_E: u8 = 0x04;
const FLAG_PT: u8 = 0x10;
const VERSION_SHIFT: u8 = 5;

/// Parsed GTP-U header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GtpuHeader {
    pub message_type: u8,
    pub teid: u32,
    /// Payload bytes after the mandatory 8-byte header (per the wire field).
    pub length: u16,
    pub sequence: Option<u16>,
    pub n_pdu: Option<u8>,
    pub next_extension: Option<u8>,
    /// Total header bytes consumed, 8 or 12.
    pub header_len: usize,
}

impl GtpuHeader {
    pub fn new(message_type: u8, teid: u32, payload_len: u16) -> Self {
        GtpuHeader {
            message_type,
            teid,
            length: payload_len,
            sequence: None,
            n_pdu: None,
            next_extension: None,
            header_len: 8,
        }
    }

    pub fn with_sequence(mut self, sequence: u16) -> Self {
        self.sequence = Some(sequence);
        // Optional bytes count toward the wire length field.
        self.length += 4;
        self.header_len = 12;
        self
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.header_len);
        let has_opt = self.sequence.is_some() || self.n_pdu.is_some() || self.next_extension.is_some();
        let mut flags = (1 << VERSION_SHIFT) | FLAG_PT;
        if self.sequence.is_some() {
            flags |= FLAG_S;
        }
        if self.n_pdu.is_some() {
            flags |= FLAG_PN;
        }
        if self.next_extension.is_some() {
            flags |= FLAG_E;
        }
        buf.push(flags);
        buf.push(self.message_type);
        buf.extend_from_slice(&self.length.to_be_bytes());
        buf.extend_from_slice(&self.teid.to_be_bytes());
        if has_opt {
            buf.extend_from_slice(&self.sequence.unwrap_or(0).to_be_bytes());
            buf.push(self.n_pdu.unwrap_or(0));
            buf.push(self.next_extension.unwrap_or(0));
        }
        buf
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        if data.len() < 8 {
            return Err(Error::Protocol("GTP-U header too short".into()));
        }
        let flags = data[0];
        let version = flags >> VERSION_SHIFT;
        if version != 1 {
            return Err(Error::Protocol(format!("unsupported GTP version {version}")));
        }
        if flags & FLAG_PT == 0 {
            return Err(Error::Protocol("GTP' (PT=0) is not supported".into()));
        }

        let message_type = data[1];
        let length = u16::from_be_bytes([data[2], data[3]]);
        let teid = u32::from_be_bytes(data[4..8].try_into().unwrap());

        let has_opt = flags & (FLAG_E | FLAG_S | FLAG_PN) != 0;
        let (sequence, n_pdu, next_extension, header_len) = if has_opt {
            if data.len() < 12 {
                return Err(Error::Protocol("GTP-U optional header truncated".into()));
            }
            let seq = u16::from_be_bytes([data[8], data[9]]);
            (
                (flags & FLAG_S != 0).then_some(seq),
                (flags & FLAG_PN != 0).then_some(data[10]),
                (flags & FLAG_E != 0).then_some(data[11]),
                12,
            )
        } else {
            (None, None, None, 8)
        };

        Ok(GtpuHeader {
            message_type,
            teid,
            length,
            sequence,
            n_pdu,
            next_extension,
            header_len,
        })
    }

    /// Payload bytes following this header within `datagram`.
    pub fn payload<'a>(&self, datagram: &'a [u8]) -> &'a [u8] {
        &datagram[self.header_len.min(datagram.len())..]
    }
}

/// Wraps an inner IP packet in a plain G-PDU header toward `teid`.
pub fn encapsulate(teid: u32, inner: &[u8]) -> Vec<u8> {
    let header = GtpuHeader::new(MSG_G_PDU, teid, inner.len() as u16);
    let mut buf = header.marshal();
    buf.extend_from_slice(inner);
    buf
}

/// Builds an Echo Response mirroring the request's sequence number if any.
pub fn echo_response(request: &GtpuHeader) -> Vec<u8> {
    let mut header = GtpuHeader::new(MSG_ECHO_RESPONSE, 0, 0);
    if let Some(seq) = request.sequence {
        header = header.with_sequence(seq);
    }
    header.marshal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_gpdu_roundtrip() {
        let inner = [0x45, 0x00, 0x00, 0x14];
        let datagram = encapsulate(0x000003e9, &inner);
        assert_eq!(datagram[0], 0x30); // version 1, PT, no optional flags

        let header = GtpuHeader::unmarshal(&datagram).unwrap();
        assert_eq!(header.message_type, MSG_G_PDU);
        assert_eq!(header.teid, 0x3e9);
        assert_eq!(header.length as usize, inner.len());
        assert_eq!(header.header_len, 8);
        assert_eq!(header.payload(&datagram), inner);
    }

    #[test]
    fn sequence_flag_adds_optional_bytes() {
        let header = GtpuHeader::new(MSG_G_PDU, 7, 0).with_sequence(0x1234);
        let bytes = header.marshal();
        assert_eq!(bytes.len(), 12);
        assert_eq!(bytes[0] & FLAG_S, FLAG_S);

        let parsed = GtpuHeader::unmarshal(&bytes).unwrap();
        assert_eq!(parsed.sequence, Some(0x1234));
        assert_eq!(parsed.header_len, 12);
    }

    #[test]
    fn pn_and_e_flags_consume_optional_bytes() {
        // Hand-build a header with E and PN set but not S.
        let bytes = [
            0x35, MSG_G_PDU, 0, 4, 0, 0, 0, 9, // flags E|PN, teid 9
            0xaa, 0xbb, 0x07, 0x85, // seq (ignored), n-pdu, next-ext
        ];
        let parsed = GtpuHeader::unmarshal(&bytes).unwrap();
        assert_eq!(parsed.sequence, None);
        assert_eq!(parsed.n_pdu, Some(0x07));
        assert_eq!(parsed.next_extension, Some(0x85));
        assert_eq!(parsed.header_len, 12);
    }

    #[test]
    fn echo_exchange() {
        let request = GtpuHeader::new(MSG_ECHO_REQUEST, 0, 0).with_sequence(5);
        let reply = echo_response(&GtpuHeader::unmarshal(&request.marshal()).unwrap());
        let parsed = GtpuHeader::unmarshal(&reply).unwrap();
        assert_eq!(parsed.message_type, MSG_ECHO_RESPONSE);
        assert_eq!(parsed.sequence, Some(5));
    }

    #[test]
    fn malformed_headers_are_rejected() {
        assert!(GtpuHeader::unmarshal(&[0x30, 1, 0]).is_err());
        // version 2
        assert!(GtpuHeader::unmarshal(&[0x50, 1, 0, 0, 0, 0, 0, 1]).is_err());
        // optional flags but truncated
        assert!(GtpuHeader::unmarshal(&[0x32, 255, 0, 0, 0, 0, 0, 1]).is_err());
    }
}

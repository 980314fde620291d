//! DNS message header.
//!
//! ```text
//!   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |                      ID                       |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |QR|   Opcode  |AA|TC|RD|RA|   Z    |   RCODE   |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |                    QDCOUNT                    |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |                    ANCOUNT                    |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |                    NSCOUNT                    |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |                    ARCOUNT                    |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! ```

use std::fmt;

use bytes::{BufMut, BytesMut};

use super::wire::WireReader;
use crate::error::ProtoError;

/// Size of the DNS header in bytes.
pub const HEADER_SIZE: usize = 12;

/// Opcode of a standard query.
pub const OPCODE_QUERY: u8 = 0;

/// Response status carried in the low four bits of the flags word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResponseCode {
    #[default]
    NoError = 0,
    /// The name server was unable to interpret the query.
    FormatError = 1,
    /// The name server failed while processing the query.
    ServerFailure = 2,
    /// The queried domain name does not exist.
    NameError = 3,
    /// The name server does not support the requested kind of query.
    NotImplemented = 4,
    /// The name server refuses to answer for policy reasons.
    Refused = 5,
}

impl TryFrom<u8> for ResponseCode {
    type Error = ProtoError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::NoError,
            1 => Self::FormatError,
            2 => Self::ServerFailure,
            3 => Self::NameError,
            4 => Self::NotImplemented,
            5 => Self::Refused,
            other => {
                return Err(ProtoError::UnknownEnumValue {
                    field: "RCODE",
                    value: u16::from(other),
                });
            }
        })
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoError => "NOERROR",
            Self::FormatError => "FORMERR",
            Self::ServerFailure => "SERVFAIL",
            Self::NameError => "NXDOMAIN",
            Self::NotImplemented => "NOTIMP",
            Self::Refused => "REFUSED",
        })
    }
}

/// The fixed 12-byte header at the start of every DNS message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    /// Packet identifier; responses echo the query's id.
    pub id: u16,
    /// `true` for responses.
    pub qr: bool,
    /// Kind of query (4 bits).
    pub opcode: u8,
    /// Authoritative answer.
    pub aa: bool,
    /// Truncation.
    pub tc: bool,
    /// Recursion desired.
    pub rd: bool,
    /// Recursion available.
    pub ra: bool,
    /// Reserved (3 bits).
    pub z: u8,
    pub rcode: ResponseCode,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl Header {
    /// Creates a standard query header with the given id and no sections.
    pub fn new(id: u16) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    fn flags(&self) -> u16 {
        (u16::from(self.qr) << 15)
            | (u16::from(self.opcode & 0x0F) << 11)
            | (u16::from(self.aa) << 10)
            | (u16::from(self.tc) << 9)
            | (u16::from(self.rd) << 8)
            | (u16::from(self.ra) << 7)
            | (u16::from(self.z & 0x07) << 4)
            | u16::from(self.rcode as u8)
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.reserve(HEADER_SIZE);
        buf.put_u16(self.id);
        buf.put_u16(self.flags());
        buf.put_u16(self.qdcount);
        buf.put_u16(self.ancount);
        buf.put_u16(self.nscount);
        buf.put_u16(self.arcount);
    }

    pub fn decode(reader: &mut WireReader<'_>) -> Result<Self, ProtoError> {
        let (header, rcode) = Self::decode_fields(reader)?;
        Ok(Self {
            rcode: ResponseCode::try_from(rcode)?,
            ..header
        })
    }

    /// Like [`Header::decode`], but leaves `rcode` at `NoError` whatever the
    /// RCODE bits hold.
    pub fn decode_ignoring_rcode(reader: &mut WireReader<'_>) -> Result<Self, ProtoError> {
        Ok(Self::decode_fields(reader)?.0)
    }

    fn decode_fields(reader: &mut WireReader<'_>) -> Result<(Self, u8), ProtoError> {
        let id = reader.read_u16()?;
        let flags = reader.read_u16()?;
        let qdcount = reader.read_u16()?;
        let ancount = reader.read_u16()?;
        let nscount = reader.read_u16()?;
        let arcount = reader.read_u16()?;

        // the masks keep every shifted field within a u8
        let header = Self {
            id,
            qr: flags & 0x8000 != 0,
            opcode: ((flags >> 11) & 0x0F) as u8,
            aa: flags & 0x0400 != 0,
            tc: flags & 0x0200 != 0,
            rd: flags & 0x0100 != 0,
            ra: flags & 0x0080 != 0,
            z: ((flags >> 4) & 0x07) as u8,
            rcode: ResponseCode::NoError,
            qdcount,
            ancount,
            nscount,
            arcount,
        };
        Ok((header, (flags & 0x0F) as u8))
    }

    /// Derives the header of a response to this query.
    ///
    /// Echoes id, opcode and the AA/TC/RD/RA/Z bits, sets QR, and answers
    /// `NOTIMP` to anything but a standard query. All counts start at zero.
    pub fn to_response(&self) -> Self {
        Self {
            qr: true,
            rcode: if self.opcode == OPCODE_QUERY {
                ResponseCode::NoError
            } else {
                ResponseCode::NotImplemented
            },
            qdcount: 0,
            ancount: 0,
            nscount: 0,
            arcount: 0,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(header: &Header) -> Vec<u8> {
        let mut buf = BytesMut::new();
        header.encode(&mut buf);
        buf.to_vec()
    }

    #[test]
    fn should_pack_flags_in_network_order() {
        let header = Header {
            id: 1234,
            qr: true,
            opcode: 2,
            aa: true,
            tc: false,
            rd: true,
            ra: true,
            z: 0b101,
            rcode: ResponseCode::Refused,
            qdcount: 1,
            ancount: 2,
            nscount: 3,
            arcount: 4,
        };

        assert_eq!(
            encode(&header),
            vec![
                0x04, 0xd2, // id
                0x95, 0xd5, // 1 0010 1 0 1 | 1 101 0101
                0, 1, 0, 2, 0, 3, 0, 4,
            ]
        );
    }

    #[test]
    fn should_round_trip_every_field() {
        let header = Header {
            id: 0xbeef,
            qr: false,
            opcode: 15,
            aa: false,
            tc: true,
            rd: false,
            ra: true,
            z: 7,
            rcode: ResponseCode::NameError,
            qdcount: 65535,
            ancount: 0,
            nscount: 12,
            arcount: 1,
        };

        let bytes = encode(&header);
        assert_eq!(bytes.len(), HEADER_SIZE);

        let decoded = Header::decode(&mut WireReader::new(&bytes)).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn should_fail_on_short_header() {
        let bytes = [0u8; 11];
        let err = Header::decode(&mut WireReader::new(&bytes)).unwrap_err();
        assert!(matches!(err, ProtoError::Truncated { .. }));
    }

    #[test]
    fn should_reject_unknown_rcode() {
        let bytes = [0, 1, 0x80, 0x09, 0, 0, 0, 0, 0, 0, 0, 0];
        let err = Header::decode(&mut WireReader::new(&bytes)).unwrap_err();
        assert_eq!(
            err,
            ProtoError::UnknownEnumValue {
                field: "RCODE",
                value: 9
            }
        );
    }

    #[test]
    fn should_read_remaining_fields_past_unknown_rcode() {
        let bytes = [0x10, 0x92, 0x01, 0x09, 0, 1, 0, 0, 0, 0, 0, 0];

        let header = Header::decode_ignoring_rcode(&mut WireReader::new(&bytes)).unwrap();
        assert_eq!(header.id, 4242);
        assert!(header.rd);
        assert_eq!(header.qdcount, 1);
        assert_eq!(header.rcode, ResponseCode::NoError);
    }

    #[test]
    fn should_derive_response_for_standard_query() {
        let query = Header {
            id: 42,
            rd: true,
            z: 2,
            qdcount: 3,
            ancount: 1,
            ..Header::default()
        };

        let response = query.to_response();
        assert_eq!(response.id, 42);
        assert!(response.qr);
        assert!(response.rd);
        assert_eq!(response.z, 2);
        assert_eq!(response.opcode, OPCODE_QUERY);
        assert_eq!(response.rcode, ResponseCode::NoError);
        assert_eq!(
            (
                response.qdcount,
                response.ancount,
                response.nscount,
                response.arcount
            ),
            (0, 0, 0, 0)
        );
    }

    #[test]
    fn should_answer_not_implemented_for_other_opcodes() {
        for opcode in 1..=15 {
            let query = Header {
                opcode,
                ..Header::new(7)
            };
            let response = query.to_response();
            assert!(response.qr);
            assert_eq!(response.opcode, opcode);
            assert_eq!(response.rcode, ResponseCode::NotImplemented);
        }
    }
}

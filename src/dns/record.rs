//! Resource records, shared by the answer, authority and additional sections.
//!
//! ```text
//!   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! /                      NAME                     /
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |                      TYPE                     |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |                     CLASS                     |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |                      TTL                      |
//! |                                               |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |                   RDLENGTH                    |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--|
//! /                     RDATA                     /
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! ```

use std::fmt;
use std::net::Ipv4Addr;

use bytes::{BufMut, BytesMut};

use super::name::Name;
use super::question::{RecordClass, RecordType};
use super::wire::WireReader;
use crate::error::ProtoError;

/// Type-directed record data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RData {
    A(Ipv4Addr),
    Ns(Name),
    /// Raw octets of any other record type.
    Other(Vec<u8>),
}

impl RData {
    /// The record type this data is the payload of, when it is type-specific.
    pub const fn record_type(&self) -> Option<RecordType> {
        match self {
            Self::A(_) => Some(RecordType::A),
            Self::Ns(_) => Some(RecordType::NS),
            Self::Other(_) => None,
        }
    }

    /// Whether this data is a valid payload for a record of type `rtype`.
    pub fn is_valid_for(&self, rtype: RecordType) -> bool {
        match self.record_type() {
            Some(own) => own == rtype,
            None => !matches!(rtype, RecordType::A | RecordType::NS),
        }
    }

    fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtoError> {
        match self {
            Self::A(addr) => buf.put_slice(&addr.octets()),
            Self::Ns(name) => name.encode(buf)?,
            Self::Other(data) => buf.put_slice(data),
        }
        Ok(())
    }

    fn decode(
        reader: &mut WireReader<'_>,
        rtype: RecordType,
        rdlength: usize,
    ) -> Result<Self, ProtoError> {
        let start = reader.position();
        // the whole RDATA must be present whatever its interpretation
        reader.read_bytes(rdlength)?;
        reader.set_position(start);

        let rdata = match rtype {
            RecordType::A => {
                if rdlength != 4 {
                    return Err(ProtoError::RDataLength {
                        rtype: "A",
                        expected: 4,
                        actual: rdlength,
                    });
                }
                Self::A(Ipv4Addr::from(reader.read_array::<4>()?))
            }
            RecordType::NS => {
                let name = Name::decode(reader)?;
                let consumed = reader.position() - start;
                if consumed > rdlength {
                    return Err(ProtoError::RDataLength {
                        rtype: "NS",
                        expected: rdlength,
                        actual: consumed,
                    });
                }
                Self::Ns(name)
            }
            _ => Self::Other(reader.read_bytes(rdlength)?.to_vec()),
        };

        reader.set_position(start + rdlength);
        Ok(rdata)
    }
}

impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A(addr) => fmt::Display::fmt(addr, f),
            Self::Ns(name) => fmt::Display::fmt(name, f),
            Self::Other(data) => {
                for byte in data {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// A resource record with flat name/type/class/ttl fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: Name,
    pub rtype: RecordType,
    pub class: RecordClass,
    /// Seconds the record may be cached.
    pub ttl: u32,
    pub rdata: RData,
}

impl Record {
    pub fn new(
        name: impl Into<Name>,
        rtype: RecordType,
        class: RecordClass,
        ttl: u32,
        rdata: RData,
    ) -> Self {
        Self {
            name: name.into(),
            rtype,
            class,
            ttl,
            rdata,
        }
    }

    /// Shorthand for an `IN A` record.
    pub fn a(name: impl Into<Name>, ttl: u32, addr: Ipv4Addr) -> Self {
        Self::new(name, RecordType::A, RecordClass::IN, ttl, RData::A(addr))
    }

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtoError> {
        if !self.rdata.is_valid_for(self.rtype) {
            return Err(ProtoError::RDataTypeMismatch {
                rtype: self.rtype.into(),
            });
        }

        self.name.encode(buf)?;
        buf.put_u16(self.rtype.into());
        buf.put_u16(self.class.into());
        buf.put_u32(self.ttl);

        // RDLENGTH is back-filled once the RDATA size is known
        let length_at = buf.len();
        buf.put_u16(0);
        self.rdata.encode(buf)?;
        let rdlength = buf.len() - length_at - 2;
        let rdlength = u16::try_from(rdlength).map_err(|_| ProtoError::RDataLength {
            rtype: "RDATA",
            expected: usize::from(u16::MAX),
            actual: rdlength,
        })?;
        buf[length_at..length_at + 2].copy_from_slice(&rdlength.to_be_bytes());
        Ok(())
    }

    pub fn decode(reader: &mut WireReader<'_>) -> Result<Self, ProtoError> {
        let name = Name::decode(reader)?;
        let rtype = RecordType::try_from(reader.read_u16()?)?;
        let class = RecordClass::try_from(reader.read_u16()?)?;
        let ttl = reader.read_u32()?;
        let rdlength = usize::from(reader.read_u16()?);
        let rdata = RData::decode(reader, rtype, rdlength)?;

        Ok(Self {
            name,
            rtype,
            class,
            ttl,
            rdata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(record: &Record) -> Vec<u8> {
        let mut buf = BytesMut::new();
        record.encode(&mut buf).unwrap();
        buf.to_vec()
    }

    #[test]
    fn should_encode_a_record_with_four_byte_rdata() {
        let record = Record::a("example.com", 300, Ipv4Addr::new(93, 184, 216, 34));

        let mut expected = b"\x07example\x03com\x00".to_vec();
        expected.extend_from_slice(&[0, 1, 0, 1]); // A IN
        expected.extend_from_slice(&[0, 0, 0x01, 0x2c]); // ttl 300
        expected.extend_from_slice(&[0, 4, 93, 184, 216, 34]);

        assert_eq!(encode(&record), expected);
    }

    #[test]
    fn should_round_trip_each_rdata_variant() {
        let records = [
            Record::a("example.com", 60, Ipv4Addr::new(1, 2, 3, 4)),
            Record::new(
                "example.com",
                RecordType::NS,
                RecordClass::IN,
                86400,
                RData::Ns(Name::from("a.iana-servers.net")),
            ),
            Record::new(
                "example.com",
                RecordType::TXT,
                RecordClass::IN,
                0,
                RData::Other(b"\x05hello".to_vec()),
            ),
        ];

        for record in records {
            let bytes = encode(&record);
            let mut reader = WireReader::new(&bytes);
            assert_eq!(Record::decode(&mut reader).unwrap(), record);
            assert_eq!(reader.remaining(), 0);
        }
    }

    #[test]
    fn should_decode_compressed_ns_rdata() {
        // 0: example.com, 13: record owned by ptr(0) whose NS is ns1 + ptr(0)
        let mut wire = b"\x07example\x03com\x00".to_vec();
        wire.extend_from_slice(&[0xc0, 0x00, 0, 2, 0, 1, 0, 0, 0, 60, 0, 6]);
        wire.extend_from_slice(b"\x03ns1\xc0\x00");
        wire.push(0x2a);

        let mut reader = WireReader::new(&wire);
        reader.set_position(13);
        let record = Record::decode(&mut reader).unwrap();

        assert_eq!(record.name, Name::from("example.com"));
        assert_eq!(record.rdata, RData::Ns(Name::from("ns1.example.com")));
        assert_eq!(reader.read_u8().unwrap(), 0x2a);
    }

    #[test]
    fn should_reject_ns_rdata_overrunning_rdlength() {
        let mut wire = b"\x00\x00\x02\x00\x01\x00\x00\x00\x3c\x00\x03".to_vec();
        wire.extend_from_slice(b"\x03ns1\x00");

        let err = Record::decode(&mut WireReader::new(&wire)).unwrap_err();
        assert_eq!(
            err,
            ProtoError::RDataLength {
                rtype: "NS",
                expected: 3,
                actual: 5
            }
        );
    }

    #[test]
    fn should_reject_a_record_with_wrong_length() {
        let wire = b"\x00\x00\x01\x00\x01\x00\x00\x00\x3c\x00\x03\x01\x02\x03";
        let err = Record::decode(&mut WireReader::new(wire)).unwrap_err();
        assert!(matches!(err, ProtoError::RDataLength { rtype: "A", .. }));
    }

    #[test]
    fn should_report_truncated_rdata() {
        let wire = b"\x00\x00\x10\x00\x01\x00\x00\x00\x3c\x00\x08abc";
        let err = Record::decode(&mut WireReader::new(wire)).unwrap_err();
        assert!(matches!(err, ProtoError::Truncated { .. }));
    }

    #[test]
    fn should_refuse_to_encode_mismatched_rdata() {
        let record = Record::new(
            "example.com",
            RecordType::NS,
            RecordClass::IN,
            60,
            RData::A(Ipv4Addr::LOCALHOST),
        );
        assert_eq!(
            record.encode(&mut BytesMut::new()),
            Err(ProtoError::RDataTypeMismatch { rtype: 2 })
        );
    }

    #[test]
    fn should_display_rdata() {
        assert_eq!(RData::A(Ipv4Addr::new(1, 2, 3, 4)).to_string(), "1.2.3.4");
        assert_eq!(RData::Other(vec![0xde, 0xad]).to_string(), "dead");
    }
}

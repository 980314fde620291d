//! Question section entries and the TYPE/CLASS enumerations.

use std::fmt;

use bytes::{BufMut, BytesMut};

use super::name::Name;
use super::wire::WireReader;
use crate::error::ProtoError;

/// Declares a `u16`-backed wire enum with checked decoding.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[allow(clippy::upper_case_acronyms)]
        #[repr(u16)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value,)+
        }

        impl TryFrom<u16> for $name {
            type Error = ProtoError;

            fn try_from(value: u16) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    other => Err(ProtoError::UnknownEnumValue {
                        field: $field,
                        value: other,
                    }),
                }
            }
        }

        impl From<$name> for u16 {
            fn from(value: $name) -> Self {
                value as u16
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(match self {
                    $(Self::$variant => stringify!($variant),)+
                })
            }
        }
    };
}

wire_enum! {
    /// Record type (TYPE / QTYPE).
    RecordType, "QTYPE" {
        /// IPv4 host address.
        A = 1,
        /// Authoritative name server.
        NS = 2,
        MD = 3,
        MF = 4,
        /// Canonical name for an alias.
        CNAME = 5,
        /// Start of a zone of authority.
        SOA = 6,
        MB = 7,
        MG = 8,
        MR = 9,
        NULL = 10,
        WKS = 11,
        /// Domain name pointer.
        PTR = 12,
        HINFO = 13,
        MINFO = 14,
        /// Mail exchange.
        MX = 15,
        /// Text strings.
        TXT = 16,
        /// IPv6 host address.
        AAAA = 28,
    }
}

wire_enum! {
    /// Record class (CLASS / QCLASS).
    RecordClass, "QCLASS" {
        /// Internet.
        IN = 1,
        CS = 2,
        CH = 3,
        HS = 4,
    }
}

/// One entry of the question section.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Question {
    pub name: Name,
    pub qtype: RecordType,
    pub qclass: RecordClass,
}

impl Question {
    pub fn new(name: impl Into<Name>, qtype: RecordType, qclass: RecordClass) -> Self {
        Self {
            name: name.into(),
            qtype,
            qclass,
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtoError> {
        self.name.encode(buf)?;
        buf.put_u16(self.qtype.into());
        buf.put_u16(self.qclass.into());
        Ok(())
    }

    pub fn decode(reader: &mut WireReader<'_>) -> Result<Self, ProtoError> {
        let name = Name::decode(reader)?;
        let qtype = RecordType::try_from(reader.read_u16()?)?;
        let qclass = RecordClass::try_from(reader.read_u16()?)?;
        Ok(Self {
            name,
            qtype,
            qclass,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_encode_name_type_and_class() {
        let question = Question::new("codecrafters.io", RecordType::A, RecordClass::IN);
        let mut buf = BytesMut::new();
        question.encode(&mut buf).unwrap();

        assert_eq!(
            buf.to_vec(),
            b"\x0ccodecrafters\x02io\x00\x00\x01\x00\x01".to_vec()
        );
    }

    #[test]
    fn should_round_trip_question() {
        let question = Question::new("mail.example.org", RecordType::MX, RecordClass::CH);
        let mut buf = BytesMut::new();
        question.encode(&mut buf).unwrap();

        let decoded = Question::decode(&mut WireReader::new(&buf)).unwrap();
        assert_eq!(decoded, question);
    }

    #[test]
    fn should_name_offending_field_for_unknown_values() {
        let unknown_type = b"\x00\x00\x63\x00\x01";
        assert_eq!(
            Question::decode(&mut WireReader::new(unknown_type)),
            Err(ProtoError::UnknownEnumValue {
                field: "QTYPE",
                value: 99
            })
        );

        let unknown_class = b"\x00\x00\x1c\x00\xff";
        assert_eq!(
            Question::decode(&mut WireReader::new(unknown_class)),
            Err(ProtoError::UnknownEnumValue {
                field: "QCLASS",
                value: 255
            })
        );
    }

    #[test]
    fn should_convert_record_types_both_ways() {
        assert_eq!(RecordType::try_from(28u16), Ok(RecordType::AAAA));
        assert_eq!(u16::from(RecordType::TXT), 16);
        assert_eq!(RecordType::CNAME.to_string(), "CNAME");
        assert!(RecordType::try_from(17u16).is_err());
    }

    #[test]
    fn should_fail_when_fixed_fields_are_missing() {
        let wire = b"\x00\x00\x01";
        let err = Question::decode(&mut WireReader::new(wire)).unwrap_err();
        assert!(matches!(err, ProtoError::Truncated { .. }));
    }
}

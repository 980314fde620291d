//! Domain names and their label-sequence wire encoding.
//!
//! ```text
//!  +---+---+---+---+---+---+---+---+---+---+---+----+
//!  | 3 | a | b | c | 2 | d | e | 3 | c | o | m | \0 |
//!  +---+---+---+---+---+---+---+---+---+---+---+----+
//! ```
//!
//! Decoding follows compression pointers (RFC 1035 section 4.1.4). Encoding
//! never compresses.

use std::fmt;

use bytes::{BufMut, BytesMut};

use super::wire::WireReader;
use crate::error::ProtoError;

/// Maximum length of a single label.
pub const MAX_LABEL_LEN: usize = 63;

/// Maximum wire length of a name, length octets included.
pub const MAX_NAME_LEN: usize = 255;

/// Maximum number of pointers followed while decoding one name.
const MAX_POINTER_JUMPS: usize = 64;

const POINTER_MASK: u8 = 0xC0;

/// A domain name held as its dot-joined bytes, without a trailing dot.
///
/// The root name is the empty string. Construction never fails; length
/// rules are checked when the name is encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(Vec<u8>);

impl Name {
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Builds a name from dot-joined bytes. A single trailing dot is dropped.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let mut bytes = bytes.into();
        if bytes.last() == Some(&b'.') {
            bytes.pop();
        }
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// ASCII-lowercased copy; DNS names compare case-insensitively.
    pub fn to_lowercase(&self) -> Self {
        Self(self.0.to_ascii_lowercase())
    }

    /// Iterates over the labels, left to right. The root name has none.
    pub fn labels(&self) -> impl Iterator<Item = &[u8]> {
        let labels = (!self.is_root()).then(|| self.0.split(|&b| b == b'.'));
        labels.into_iter().flatten()
    }

    /// Checks the label and total length rules, returning the wire length.
    pub fn wire_len(&self) -> Result<usize, ProtoError> {
        let mut len = 1;
        for label in self.labels() {
            if label.is_empty() {
                return Err(ProtoError::EmptyLabel {
                    name: self.to_string(),
                });
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(ProtoError::LabelTooLong {
                    length: label.len(),
                });
            }
            len += label.len() + 1;
        }
        if len > MAX_NAME_LEN {
            return Err(ProtoError::NameTooLong { length: len });
        }
        Ok(len)
    }

    /// Appends the uncompressed label sequence to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtoError> {
        let len = self.wire_len()?;
        buf.reserve(len);
        for label in self.labels() {
            // wire_len() bounds every label to 63 bytes
            buf.put_u8(label.len() as u8);
            buf.put_slice(label);
        }
        buf.put_u8(0);
        Ok(())
    }

    /// Reads a possibly compressed name at the reader's position.
    ///
    /// After a pointer the reader resumes right behind the first pointer
    /// encountered; a pointer always ends the name at the original position.
    pub fn decode(reader: &mut WireReader<'_>) -> Result<Self, ProtoError> {
        let mut name = Vec::new();
        let mut wire_len = 1;
        let mut resume_at = None;
        let mut jumps = 0;

        loop {
            let offset = reader.position();
            let len = reader.read_u8()?;

            match len & POINTER_MASK {
                0x00 if len == 0 => break,
                0x00 => {
                    let label = reader.read_bytes(usize::from(len))?;
                    // names are kept dot-joined, so a dot inside a label cannot round-trip
                    if label.contains(&b'.') {
                        return Err(ProtoError::DotInLabel { offset });
                    }
                    wire_len += label.len() + 1;
                    if wire_len > MAX_NAME_LEN {
                        return Err(ProtoError::NameTooLong { length: wire_len });
                    }
                    if !name.is_empty() {
                        name.push(b'.');
                    }
                    name.extend_from_slice(label);
                }
                POINTER_MASK => {
                    let low = reader.read_u8()?;
                    let target = usize::from(u16::from_be_bytes([len & !POINTER_MASK, low]));
                    if target >= offset {
                        return Err(ProtoError::InvalidPointer { offset, target });
                    }
                    jumps += 1;
                    if jumps > MAX_POINTER_JUMPS {
                        return Err(ProtoError::PointerLoop { offset });
                    }
                    resume_at.get_or_insert(reader.position());
                    reader.set_position(target);
                }
                _ => return Err(ProtoError::InvalidLabelType { label: len, offset }),
            }
        }

        if let Some(pos) = resume_at {
            reader.set_position(pos);
        }
        Ok(Self(name))
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Self::from_bytes(value.as_bytes())
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Self::from_bytes(value.into_bytes())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

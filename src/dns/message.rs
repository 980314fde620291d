//! Whole DNS messages.
//!
//! ```text
//! +---------------------+
//! |        Header       |
//! +---------------------+
//! |       Question      | the question for the name server
//! +---------------------+
//! |        Answer       | RRs answering the question
//! +---------------------+
//! |      Authority      | RRs pointing toward an authority
//! +---------------------+
//! |      Additional     | RRs holding additional information
//! +---------------------+
//! ```

use bytes::{Bytes, BytesMut};

use super::header::{HEADER_SIZE, Header, ResponseCode};
use super::question::Question;
use super::record::Record;
use super::wire::WireReader;
use crate::error::ProtoError;

/// Maximum DNS message size over UDP.
pub const MAX_UDP_DNS_SIZE: usize = 512;

/// A DNS message whose header counts always match its sections.
///
/// Sections can only grow through the `add_*` methods, which bump the
/// matching header count in the same call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    header: Header,
    questions: Vec<Question>,
    answers: Vec<Record>,
    authorities: Vec<Record>,
    additionals: Vec<Record>,
}

impl Message {
    /// Creates an empty message. The header's counts are reset to zero.
    pub fn new(header: Header) -> Self {
        Self {
            header: Header {
                qdcount: 0,
                ancount: 0,
                nscount: 0,
                arcount: 0,
                ..header
            },
            ..Self::default()
        }
    }

    /// Starts the response to `query`, echoing its questions.
    pub fn response_to(query: &Self) -> Self {
        let mut response = Self::new(query.header.to_response());
        for question in &query.questions {
            response.add_question(question.clone());
        }
        response
    }

    pub const fn header(&self) -> &Header {
        &self.header
    }

    pub const fn id(&self) -> u16 {
        self.header.id
    }

    pub fn set_id(&mut self, id: u16) -> &mut Self {
        self.header.id = id;
        self
    }

    pub const fn response_code(&self) -> ResponseCode {
        self.header.rcode
    }

    pub fn set_response_code(&mut self, rcode: ResponseCode) -> &mut Self {
        self.header.rcode = rcode;
        self
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &[Record] {
        &self.answers
    }

    pub fn authorities(&self) -> &[Record] {
        &self.authorities
    }

    pub fn additionals(&self) -> &[Record] {
        &self.additionals
    }

    pub fn add_question(&mut self, question: Question) -> &mut Self {
        self.questions.push(question);
        self.header.qdcount += 1;
        self
    }

    pub fn add_answer(&mut self, record: Record) -> &mut Self {
        self.answers.push(record);
        self.header.ancount += 1;
        self
    }

    pub fn add_authority(&mut self, record: Record) -> &mut Self {
        self.authorities.push(record);
        self.header.nscount += 1;
        self
    }

    pub fn add_additional(&mut self, record: Record) -> &mut Self {
        self.additionals.push(record);
        self.header.arcount += 1;
        self
    }

    /// Encodes header, questions, answers, authorities and additionals in order.
    pub fn to_bytes(&self) -> Result<Bytes, ProtoError> {
        let mut buf = BytesMut::with_capacity(MAX_UDP_DNS_SIZE);
        self.header.encode(&mut buf);
        for question in &self.questions {
            question.encode(&mut buf)?;
        }
        for record in self
            .answers
            .iter()
            .chain(&self.authorities)
            .chain(&self.additionals)
        {
            record.encode(&mut buf)?;
        }
        Ok(buf.freeze())
    }

    /// Decodes a message, reading exactly as many entries as the header declares.
    ///
    /// Every section is read through one cursor over the full buffer so that
    /// compression pointers resolve against absolute offsets. Bytes after the
    /// last declared record are ignored.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ProtoError> {
        let mut reader = WireReader::new(data);
        let header = Header::decode(&mut reader)?;

        let questions = (0..header.qdcount)
            .map(|_| Question::decode(&mut reader))
            .collect::<Result<Vec<_>, _>>()?;
        let mut records = |count: u16| {
            (0..count)
                .map(|_| Record::decode(&mut reader))
                .collect::<Result<Vec<_>, _>>()
        };
        let answers = records(header.ancount)?;
        let authorities = records(header.nscount)?;
        let additionals = records(header.arcount)?;

        Ok(Self {
            header,
            questions,
            answers,
            authorities,
            additionals,
        })
    }

    /// Reads just the header, for answering requests whose body is malformed.
    ///
    /// The RCODE bits of a request carry no meaning and are not validated.
    pub fn peek_header(data: &[u8]) -> Result<Header, ProtoError> {
        Header::decode_ignoring_rcode(&mut WireReader::new(
            data.get(..HEADER_SIZE).unwrap_or(data),
        ))
    }
}

//! Raw DNS wire-format codec (RFC 1035 §4.1, restricted subset).
//!
//! Decodes a single-question query buffer and builds A-record answers
//! directly in wire format. No compression-pointer decoding: a QNAME
//! containing a pointer label is rejected cleanly rather than misparsed.

use std::net::Ipv4Addr;
use thiserror::Error;

/// Fixed DNS header size in bytes.
pub const HEADER_LEN: usize = 12;

/// Maximum label length permitted by RFC 1035 §2.3.4.
const MAX_LABEL_LEN: usize = 63;

/// Flags word for every synthesized answer: QR=1, RD=1, RA=1, RCODE=0.
const ANSWER_FLAGS: u16 = 0x8180;

/// TTL stamped on every synthesized A record.
const ANSWER_TTL: u32 = 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("header too short: {0} bytes")]
    MalformedHeader(usize),

    #[error("label overruns the buffer")]
    TruncatedLabel,

    #[error("name ends without a zero terminator")]
    TruncatedName,

    #[error("question section truncated before type/class")]
    TruncatedQuestion,

    #[error("compression pointers are not supported")]
    CompressedName,

    #[error("invalid label: {0}")]
    InvalidLabel(String),

    #[error("invalid IPv4 address: {0}")]
    InvalidAddress(String),
}

/// Fixed 12-byte DNS message header, big-endian on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DnsHeader {
    pub id: u16,
    pub flags: u16,
    pub qd_count: u16,
    pub an_count: u16,
    pub ns_count: u16,
    pub ar_count: u16,
}

impl DnsHeader {
    pub fn parse(buf: &[u8]) -> Result<Self, WireError> {
        if buf.len() < HEADER_LEN {
            return Err(WireError::MalformedHeader(buf.len()));
        }
        Ok(Self {
            id: u16::from_be_bytes([buf[0], buf[1]]),
            flags: u16::from_be_bytes([buf[2], buf[3]]),
            qd_count: u16::from_be_bytes([buf[4], buf[5]]),
            an_count: u16::from_be_bytes([buf[6], buf[7]]),
            ns_count: u16::from_be_bytes([buf[8], buf[9]]),
            ar_count: u16::from_be_bytes([buf[10], buf[11]]),
        })
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.id.to_be_bytes());
        out.extend_from_slice(&self.flags.to_be_bytes());
        out.extend_from_slice(&self.qd_count.to_be_bytes());
        out.extend_from_slice(&self.an_count.to_be_bytes());
        out.extend_from_slice(&self.ns_count.to_be_bytes());
        out.extend_from_slice(&self.ar_count.to_be_bytes());
    }
}

/// A decoded single A/IN question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    pub id: u16,
    pub domain: String,
}

/// Outcome of decoding a query buffer. The non-`Question` variants are
/// routing conditions, not errors: the caller must proxy them upstream
/// instead of answering locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedQuery {
    /// Single question, QTYPE=A, QCLASS=IN. Answerable locally.
    Question(QuestionRecord),
    /// QDCOUNT is not 1. The question section is left unparsed.
    MultiQuestion { id: u16 },
    /// Single question with a QTYPE/QCLASS this codec does not answer.
    UnsupportedType { id: u16, qtype: u16, qclass: u16 },
}

/// Decodes a raw query datagram.
///
/// Errors mean the buffer is malformed and must be dropped without a
/// response. `Ok` values that are not [`DecodedQuery::Question`] must be
/// forwarded upstream verbatim.
pub fn decode_query(buf: &[u8]) -> Result<DecodedQuery, WireError> {
    let header = DnsHeader::parse(buf)?;

    if header.qd_count != 1 {
        return Ok(DecodedQuery::MultiQuestion { id: header.id });
    }

    let mut pos = HEADER_LEN;
    let mut domain = String::new();

    loop {
        if pos >= buf.len() {
            return Err(WireError::TruncatedName);
        }
        let label_len = buf[pos] as usize;
        if label_len == 0 {
            pos += 1;
            break;
        }
        if label_len & 0xC0 != 0 {
            return Err(WireError::CompressedName);
        }
        pos += 1;
        if pos + label_len > buf.len() {
            return Err(WireError::TruncatedLabel);
        }
        if !domain.is_empty() {
            domain.push('.');
        }
        // QNAME labels are octet strings; non-UTF-8 bytes are replaced
        // rather than rejected, matching how the name is only ever used
        // for logging and rebuilt label-by-label on encode.
        domain.push_str(&String::from_utf8_lossy(&buf[pos..pos + label_len]));
        pos += label_len;
    }

    if pos + 4 > buf.len() {
        return Err(WireError::TruncatedQuestion);
    }
    let qtype = u16::from_be_bytes([buf[pos], buf[pos + 1]]);
    let qclass = u16::from_be_bytes([buf[pos + 2], buf[pos + 3]]);

    if qtype != 1 || qclass != 1 {
        return Ok(DecodedQuery::UnsupportedType {
            id: header.id,
            qtype,
            qclass,
        });
    }

    Ok(DecodedQuery::Question(QuestionRecord {
        id: header.id,
        domain,
    }))
}

/// Builds a complete answer datagram for a single A/IN question.
///
/// The question section is rebuilt from `domain` and the answer record
/// refers back to it with a name pointer to offset 12. Output is fully
/// deterministic in its inputs.
pub fn build_answer(id: u16, domain: &str, addr: Ipv4Addr) -> Result<Vec<u8>, WireError> {
    let header = DnsHeader {
        id,
        flags: ANSWER_FLAGS,
        qd_count: 1,
        an_count: 1,
        ns_count: 0,
        ar_count: 0,
    };

    let mut out = Vec::with_capacity(HEADER_LEN + domain.len() + 22);
    header.write(&mut out);

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(WireError::InvalidLabel(format!(
                "empty label in {:?}",
                domain
            )));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(WireError::InvalidLabel(format!(
                "label {:?} exceeds {} bytes",
                label, MAX_LABEL_LEN
            )));
        }
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    out.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]); // QTYPE=A, QCLASS=IN

    // Answer RR: pointer to the question name, TYPE=A, CLASS=IN.
    out.extend_from_slice(&[0xC0, 0x0C, 0x00, 0x01, 0x00, 0x01]);
    out.extend_from_slice(&ANSWER_TTL.to_be_bytes());
    out.extend_from_slice(&4u16.to_be_bytes());
    out.extend_from_slice(&addr.octets());

    Ok(out)
}

/// Parses a dotted-decimal IPv4 string strictly: exactly four components,
/// each a bare decimal `u8`.
pub fn parse_ipv4(s: &str) -> Result<Ipv4Addr, WireError> {
    let mut octets = [0u8; 4];
    let mut count = 0;
    for part in s.split('.') {
        if count == 4 {
            return Err(WireError::InvalidAddress(s.to_string()));
        }
        octets[count] = part
            .parse::<u8>()
            .map_err(|_| WireError::InvalidAddress(s.to_string()))?;
        count += 1;
    }
    if count != 4 {
        return Err(WireError::InvalidAddress(s.to_string()));
    }
    Ok(Ipv4Addr::from(octets))
}

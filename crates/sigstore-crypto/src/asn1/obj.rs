use super::length::{read_length, write_length};
use super::tag::Asn1Tag;
use super::universal;
use crate::error::{Error, Result};
use crate::stream::ByteStream;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use const_oid::ObjectIdentifier;

/// Nesting limit for constructed values
pub const MAX_DEPTH: usize = 64;

/// One node of a DER tree
///
/// `value` always holds the content octets. For constructed nodes, and for
/// OCTET STRINGs whose content happened to parse as DER, `subs` holds the
/// decoded children, and the content octets are exactly their concatenated
/// encodings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asn1Obj {
    pub tag: Asn1Tag,
    value: Vec<u8>,
    subs: Vec<Asn1Obj>,
}

impl Asn1Obj {
    /// Parse a single DER object that spans the whole buffer
    pub fn parse_buffer(bytes: &[u8]) -> Result<Self> {
        let mut stream = ByteStream::from_bytes(bytes);
        let obj = Self::parse_stream(&mut stream, 0)?;
        if stream.remaining() != 0 {
            return Err(Error::Asn1(format!(
                "{} trailing bytes after top-level object",
                stream.remaining()
            )));
        }
        Ok(obj)
    }

    fn parse_stream(stream: &mut ByteStream, depth: usize) -> Result<Self> {
        if depth > MAX_DEPTH {
            return Err(Error::Asn1(format!("nesting deeper than {MAX_DEPTH}")));
        }

        let tag = Asn1Tag::read(stream)?;
        let len = read_length(stream)?;
        let available = stream.remaining();
        if len > available {
            return Err(Error::Asn1(format!(
                "{tag} declares {len} content bytes but only {available} remain"
            )));
        }
        let value = stream.get_block(len)?.to_vec();

        let subs = if tag.constructed {
            Self::parse_children(&value, depth + 1)?
        } else if tag.is_universal(universal::OCTET_STRING) {
            // embedded structures (extension values, SCT lists) are not
            // announced by the tag, so try and keep the raw bytes on failure
            Self::parse_children(&value, depth + 1).unwrap_or_default()
        } else {
            Vec::new()
        };

        Ok(Self { tag, value, subs })
    }

    fn parse_children(content: &[u8], depth: usize) -> Result<Vec<Self>> {
        let mut stream = ByteStream::from_bytes(content);
        let mut subs = Vec::new();
        while stream.remaining() > 0 {
            subs.push(Self::parse_stream(&mut stream, depth)?);
        }
        Ok(subs)
    }

    /// Encode this node, reproducing parsed bytes exactly
    pub fn to_der(&self) -> Vec<u8> {
        let mut stream = ByteStream::new();
        self.encode(&mut stream);
        stream.into_inner()
    }

    fn encode(&self, stream: &mut ByteStream) {
        self.tag.write(stream);
        write_length(stream, self.value.len());
        stream.append_block(&self.value);
    }

    /// Content octets
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Decoded children
    pub fn subs(&self) -> &[Asn1Obj] {
        &self.subs
    }

    /// Child at `index`, or a decode error naming the missing position
    pub fn sub(&self, index: usize) -> Result<&Asn1Obj> {
        self.subs.get(index).ok_or_else(|| {
            Error::Asn1(format!(
                "{} has {} elements, expected at least {}",
                self.tag,
                self.subs.len(),
                index + 1
            ))
        })
    }

    /// First child carrying the given context-specific tag number
    pub fn find_context(&self, number: u32) -> Option<&Asn1Obj> {
        self.subs.iter().find(|s| s.tag.is_context(number))
    }

    fn expect_universal(&self, number: u32, name: &str) -> Result<()> {
        if self.tag.is_universal(number) {
            Ok(())
        } else {
            Err(Error::Asn1(format!("expected {name}, found {}", self.tag)))
        }
    }

    pub fn to_boolean(&self) -> Result<bool> {
        self.expect_universal(universal::BOOLEAN, "BOOLEAN")?;
        match self.value.as_slice() {
            [b] => Ok(*b != 0),
            _ => Err(Error::Asn1("BOOLEAN must be one byte".into())),
        }
    }

    /// Decode a signed INTEGER that fits in 64 bits
    pub fn to_integer(&self) -> Result<i64> {
        self.expect_universal(universal::INTEGER, "INTEGER")?;
        if self.value.is_empty() || self.value.len() > 8 {
            return Err(Error::Asn1(format!(
                "INTEGER of {} bytes does not fit in 64 bits",
                self.value.len()
            )));
        }
        let negative = self.value[0] & 0x80 != 0;
        let mut buf = if negative { [0xffu8; 8] } else { [0u8; 8] };
        buf[8 - self.value.len()..].copy_from_slice(&self.value);
        Ok(i64::from_be_bytes(buf))
    }

    /// Raw two's-complement content of an INTEGER of any size
    pub fn to_integer_bytes(&self) -> Result<&[u8]> {
        self.expect_universal(universal::INTEGER, "INTEGER")?;
        Ok(&self.value)
    }

    /// Decode an OBJECT IDENTIFIER to dotted-decimal
    pub fn to_oid(&self) -> Result<String> {
        self.expect_universal(universal::OBJECT_IDENTIFIER, "OBJECT IDENTIFIER")?;
        let oid = ObjectIdentifier::from_bytes(&self.value)
            .map_err(|e| Error::Asn1(format!("invalid OBJECT IDENTIFIER: {e}")))?;
        Ok(oid.to_string())
    }

    /// Decode a UTCTime or GeneralizedTime in the `Z` form DER requires
    pub fn to_date(&self) -> Result<DateTime<Utc>> {
        let utc_time = self.tag.is_universal(universal::UTC_TIME);
        if !utc_time && !self.tag.is_universal(universal::GENERALIZED_TIME) {
            return Err(Error::Asn1(format!(
                "expected UTCTime or GeneralizedTime, found {}",
                self.tag
            )));
        }

        let text = std::str::from_utf8(&self.value)
            .ok()
            .filter(|t| t.is_ascii())
            .ok_or_else(|| Error::Asn1("time value is not ASCII".into()))?;

        let (year, rest) = if utc_time {
            if text.len() != 13 {
                return Err(Error::Asn1(format!("malformed UTCTime {text:?}")));
            }
            let yy = digits(&text[..2])?;
            // RFC 5280: two-digit years of 50 and above are 19xx
            (if yy >= 50 { 1900 + yy } else { 2000 + yy }, &text[2..])
        } else {
            if text.len() != 15 {
                return Err(Error::Asn1(format!("malformed GeneralizedTime {text:?}")));
            }
            (digits(&text[..4])?, &text[4..])
        };

        if !rest.ends_with('Z') {
            return Err(Error::Asn1(format!("time {text:?} is not in UTC")));
        }
        Utc.with_ymd_and_hms(
            year as i32,
            digits(&rest[0..2])?,
            digits(&rest[2..4])?,
            digits(&rest[4..6])?,
            digits(&rest[6..8])?,
            digits(&rest[8..10])?,
        )
        .single()
        .ok_or_else(|| Error::Asn1(format!("invalid calendar time {text:?}")))
    }

    /// Content of a BIT STRING, without the leading unused-bits octet
    pub fn to_bit_string(&self) -> Result<&[u8]> {
        self.expect_universal(universal::BIT_STRING, "BIT STRING")?;
        match self.value.split_first() {
            Some((unused, bits)) if *unused < 8 => Ok(bits),
            _ => Err(Error::Asn1("malformed BIT STRING".into())),
        }
    }

    /// Decode any of the character string types used in certificates
    pub fn to_text(&self) -> Result<String> {
        let is_string = [
            universal::UTF8_STRING,
            universal::PRINTABLE_STRING,
            universal::IA5_STRING,
        ]
        .iter()
        .any(|n| self.tag.is_universal(*n));
        if !is_string {
            return Err(Error::Asn1(format!("expected a string, found {}", self.tag)));
        }
        String::from_utf8(self.value.clone())
            .map_err(|e| Error::Asn1(format!("string is not UTF-8: {e}")))
    }

    /// A primitive node with the given content
    pub fn new(tag: Asn1Tag, value: Vec<u8>) -> Self {
        Self {
            tag,
            value,
            subs: Vec::new(),
        }
    }

    /// A node whose content is the encoding of `subs`
    pub fn constructed(tag: Asn1Tag, subs: Vec<Asn1Obj>) -> Self {
        let mut stream = ByteStream::new();
        for sub in &subs {
            sub.encode(&mut stream);
        }
        Self {
            tag,
            value: stream.into_inner(),
            subs,
        }
    }

    pub fn sequence(subs: Vec<Asn1Obj>) -> Self {
        Self::constructed(Asn1Tag::universal(universal::SEQUENCE, true), subs)
    }

    pub fn set(subs: Vec<Asn1Obj>) -> Self {
        Self::constructed(Asn1Tag::universal(universal::SET, true), subs)
    }

    pub fn from_bool(value: bool) -> Self {
        let byte = if value { 0xff } else { 0x00 };
        Self::new(Asn1Tag::universal(universal::BOOLEAN, false), vec![byte])
    }

    pub fn from_u64(value: u64) -> Self {
        let bytes = value.to_be_bytes();
        let skip = bytes.iter().take_while(|b| **b == 0).count().min(7);
        let mut content = Vec::with_capacity(9);
        if bytes[skip] & 0x80 != 0 {
            content.push(0);
        }
        content.extend_from_slice(&bytes[skip..]);
        Self::new(Asn1Tag::universal(universal::INTEGER, false), content)
    }

    pub fn from_oid(oid: &str) -> Result<Self> {
        let oid = ObjectIdentifier::new(oid)
            .map_err(|e| Error::Asn1(format!("invalid OBJECT IDENTIFIER {oid:?}: {e}")))?;
        Ok(Self::new(
            Asn1Tag::universal(universal::OBJECT_IDENTIFIER, false),
            oid.as_bytes().to_vec(),
        ))
    }

    pub fn null() -> Self {
        Self::new(Asn1Tag::universal(universal::NULL, false), Vec::new())
    }

    pub fn octet_string(bytes: Vec<u8>) -> Self {
        Self::new(Asn1Tag::universal(universal::OCTET_STRING, false), bytes)
    }

    /// A BIT STRING with no unused bits
    pub fn bit_string(bytes: &[u8]) -> Self {
        let mut content = Vec::with_capacity(bytes.len() + 1);
        content.push(0);
        content.extend_from_slice(bytes);
        Self::new(Asn1Tag::universal(universal::BIT_STRING, false), content)
    }

    pub fn utf8_string(text: &str) -> Self {
        Self::new(
            Asn1Tag::universal(universal::UTF8_STRING, false),
            text.as_bytes().to_vec(),
        )
    }

    /// UTCTime for years 1950 through 2049, GeneralizedTime otherwise
    pub fn from_date(at: DateTime<Utc>) -> Self {
        if (1950..2050).contains(&at.year()) {
            Self::new(
                Asn1Tag::universal(universal::UTC_TIME, false),
                at.format("%y%m%d%H%M%SZ").to_string().into_bytes(),
            )
        } else {
            Self::new(
                Asn1Tag::universal(universal::GENERALIZED_TIME, false),
                at.format("%Y%m%d%H%M%SZ").to_string().into_bytes(),
            )
        }
    }
}

fn digits(text: &str) -> Result<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Asn1(format!("expected digits, found {text:?}")));
    }
    text.parse()
        .map_err(|_| Error::Asn1(format!("expected digits, found {text:?}")))
}

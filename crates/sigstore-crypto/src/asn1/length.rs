use crate::error::{Error, Result};
use crate::stream::ByteStream;

/// Longest long-form length accepted, in bytes
const MAX_LENGTH_OCTETS: u8 = 4;

/// Read a definite DER length
///
/// Indefinite lengths and non-minimal long forms are rejected so that
/// re-encoding reproduces the input.
pub(crate) fn read_length(stream: &mut ByteStream) -> Result<usize> {
    let first = stream.get_u8()?;
    if first < 0x80 {
        return Ok(first as usize);
    }

    let count = first & 0x7f;
    if count == 0 {
        return Err(Error::Asn1("indefinite length is not supported".into()));
    }
    if count > MAX_LENGTH_OCTETS {
        return Err(Error::Asn1(format!("length field of {count} bytes is too long")));
    }

    let mut len = 0usize;
    for _ in 0..count {
        len = (len << 8) | stream.get_u8()? as usize;
    }
    if len < 0x80 || len >> (8 * (count as usize - 1)) == 0 {
        return Err(Error::Asn1(format!("non-minimal length encoding for {len}")));
    }
    Ok(len)
}

/// Append a minimal definite DER length
pub(crate) fn write_length(stream: &mut ByteStream, len: usize) {
    if len < 0x80 {
        stream.append_u8(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    stream.append_u8(0x80 | (bytes.len() - skip) as u8);
    stream.append_block(&bytes[skip..]);
}

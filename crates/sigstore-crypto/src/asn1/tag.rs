use crate::error::{Error, Result};
use crate::stream::ByteStream;
use std::fmt;

/// Tag class, from the top two bits of the identifier octet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagClass {
    Universal,
    Application,
    ContextSpecific,
    Private,
}

/// A decoded identifier octet (or octets, for high tag numbers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Asn1Tag {
    pub class: TagClass,
    pub constructed: bool,
    pub number: u32,
}

impl Asn1Tag {
    pub const fn universal(number: u32, constructed: bool) -> Self {
        Self {
            class: TagClass::Universal,
            constructed,
            number,
        }
    }

    pub const fn context(number: u32, constructed: bool) -> Self {
        Self {
            class: TagClass::ContextSpecific,
            constructed,
            number,
        }
    }

    /// True for a universal tag with the given number
    pub fn is_universal(&self, number: u32) -> bool {
        self.class == TagClass::Universal && self.number == number
    }

    /// True for a context-specific tag with the given number
    pub fn is_context(&self, number: u32) -> bool {
        self.class == TagClass::ContextSpecific && self.number == number
    }

    pub(crate) fn read(stream: &mut ByteStream) -> Result<Self> {
        let first = stream.get_u8()?;
        let class = match first >> 6 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        };
        let constructed = first & 0x20 != 0;

        let mut number = u32::from(first & 0x1f);
        if number == 0x1f {
            // high tag number form, base-128 with continuation bit
            number = 0;
            loop {
                let b = stream.get_u8()?;
                if number == 0 && b == 0x80 {
                    return Err(Error::Asn1("non-minimal tag number encoding".into()));
                }
                if number > (u32::MAX >> 7) {
                    return Err(Error::Asn1("tag number too large".into()));
                }
                number = (number << 7) | u32::from(b & 0x7f);
                if b & 0x80 == 0 {
                    break;
                }
            }
            if number < 0x1f {
                return Err(Error::Asn1(format!(
                    "tag number {number} must use the short form"
                )));
            }
        }

        Ok(Self {
            class,
            constructed,
            number,
        })
    }

    pub(crate) fn write(&self, stream: &mut ByteStream) {
        let class_bits = match self.class {
            TagClass::Universal => 0x00,
            TagClass::Application => 0x40,
            TagClass::ContextSpecific => 0x80,
            TagClass::Private => 0xc0,
        };
        let constructed_bit = if self.constructed { 0x20 } else { 0x00 };

        if self.number < 0x1f {
            stream.append_u8(class_bits | constructed_bit | self.number as u8);
            return;
        }

        stream.append_u8(class_bits | constructed_bit | 0x1f);
        let mut groups = Vec::new();
        let mut n = self.number;
        loop {
            groups.push((n & 0x7f) as u8);
            n >>= 7;
            if n == 0 {
                break;
            }
        }
        let last = groups.len() - 1;
        for (i, group) in groups.iter().rev().enumerate() {
            let more = if i < last { 0x80 } else { 0x00 };
            stream.append_u8(group | more);
        }
    }
}

impl fmt::Display for Asn1Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = match self.class {
            TagClass::Universal => "UNIVERSAL",
            TagClass::Application => "APPLICATION",
            TagClass::ContextSpecific => "CONTEXT",
            TagClass::Private => "PRIVATE",
        };
        write!(f, "[{} {}]", class, self.number)
    }
}

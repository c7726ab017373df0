//! Minimal DER decoder and encoder
//!
//! Certificates are parsed into a generic tree of [`Asn1Obj`] nodes rather
//! than into a fixed schema, so that unknown structures survive untouched and
//! re-encode to the exact bytes that were signed.

mod length;
mod obj;
mod tag;

pub use obj::{Asn1Obj, MAX_DEPTH};
pub use tag::{Asn1Tag, TagClass};

/// Universal tag numbers used by X.509
pub mod universal {
    pub const BOOLEAN: u32 = 0x01;
    pub const INTEGER: u32 = 0x02;
    pub const BIT_STRING: u32 = 0x03;
    pub const OCTET_STRING: u32 = 0x04;
    pub const NULL: u32 = 0x05;
    pub const OBJECT_IDENTIFIER: u32 = 0x06;
    pub const UTF8_STRING: u32 = 0x0c;
    pub const SEQUENCE: u32 = 0x10;
    pub const SET: u32 = 0x11;
    pub const PRINTABLE_STRING: u32 = 0x13;
    pub const IA5_STRING: u32 = 0x16;
    pub const UTC_TIME: u32 = 0x17;
    pub const GENERALIZED_TIME: u32 = 0x18;
}

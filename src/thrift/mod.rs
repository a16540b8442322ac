//! Byte-level Thrift Compact Protocol primitives.
//!
//! This is not a general-purpose Thrift implementation: it exposes exactly
//! the subset the index builder and splicer need — a reader that reports
//! byte offsets as it walks a buffer, and a writer that emits the handful
//! of primitives (`list-begin`, `i32`, `i64`) the splicer patches in.
//! Everything else (maps, doubles, nested nested structs the splicer never
//! touches) only needs to be *skipped*, which the reader does generically
//! using the wire-embedded type tag — no knowledge of `FileMetaData`'s
//! Thrift IDL is required to skip a field.

pub mod reader;
pub mod writer;

pub use reader::{CompactReader, FieldHeader};

/// Thrift Compact Protocol type codes (the low nibble of a field header or
/// list/set header, and the `type` byte of a map header).
pub mod ty {
    pub const STOP: u8 = 0x00;
    pub const BOOLEAN_TRUE: u8 = 0x01;
    pub const BOOLEAN_FALSE: u8 = 0x02;
    pub const BYTE: u8 = 0x03;
    pub const I16: u8 = 0x04;
    pub const I32: u8 = 0x05;
    pub const I64: u8 = 0x06;
    pub const DOUBLE: u8 = 0x07;
    pub const BINARY: u8 = 0x08;
    pub const LIST: u8 = 0x09;
    pub const SET: u8 = 0x0A;
    pub const MAP: u8 = 0x0B;
    pub const STRUCT: u8 = 0x0C;
}

/// Maximum bytes a varint may occupy before we treat it as corrupt input.
/// A 64-bit value needs at most 10 groups of 7 bits.
pub(crate) const MAX_VARINT_BYTES: usize = 10;

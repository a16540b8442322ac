#![forbid(unsafe_code)]
//! A sidecar index for Parquet footer metadata.
//!
//! Re-reading the same large Parquet file's footer over and over to pull out
//! a handful of row groups and columns wastes most of the parse: a standard
//! reader must walk the whole Thrift-encoded `FileMetaData` before it can
//! hand back anything. This crate precomputes, once, the byte offsets of
//! every list element and patchable field inside that Thrift stream and
//! stores them next to the original bytes in an index file. Reading a
//! projection is then a copy-and-splice over those offsets rather than a
//! full decode: [`read_metadata`] returns a new, valid Thrift Compact
//! `FileMetaData` byte stream containing only the requested row groups and
//! columns, which any Parquet library can parse like an ordinary footer.
//!
//! The crate does not open Parquet files or parse the resulting bytes into
//! a `FileMetaData` object — callers hand it footer bytes extracted by
//! whatever Parquet library they use and parse the returned bytes with that
//! same library. See [`index`] for the index format and [`thrift`] for the
//! Thrift Compact Protocol primitives the builder and splicer are built on.

#[macro_use]
pub mod error;
pub mod index;
pub mod thrift;

pub use error::{PalletJackError, Result};
pub use index::{
    generate_index, generate_index_to_vec, read_metadata, read_metadata_from_path, Index,
    ProjectionSpec,
};

/// 4-byte magic identifying the sidecar index format this crate reads and writes.
///
/// The sole version marker: any other 4 bytes at the start of an index file
/// is rejected outright, no backward-compatibility layer is attempted.
pub const MAGIC: [u8; 4] = *b"PJ_2";

/// Guard against CPU/memory-bomb Thrift payloads (malicious or corrupt footers).
pub const MAX_STRING_LEN: u32 = 100_000_000;
/// Guard against CPU/memory-bomb Thrift payloads (malicious or corrupt footers).
pub const MAX_CONTAINER_LEN: u32 = 1_000_000;

//! The on-disk index layout (§6.1): a fixed 20-byte header followed by the
//! offset tables of §3.2, the column-name blob, and the verbatim original
//! footer bytes.
//!
//! All integers are little-endian on disk regardless of host endianness —
//! every read/write here goes through `to_le_bytes`/`from_le_bytes`
//! explicitly rather than transmuting the buffer, so this code behaves
//! identically on big- and little-endian hosts.

use crate::error::Result;
use crate::MAGIC;

/// Size in bytes of the fixed-width file header.
pub const HEADER_LEN: usize = 20;

/// The four `uint32` counters at the head of an index file, plus the magic
/// that gates the whole format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataHeader {
    pub row_groups: u32,
    pub columns: u32,
    pub column_names_length: u32,
    pub metadata_length: u32,
}

impl DataHeader {
    /// `num_rows_offsets`: always 2 elements (start, end of field 3's value).
    pub fn num_rows_offsets_len(&self) -> usize {
        2
    }

    /// `row_numbers`: one entry per row group.
    pub fn row_numbers_len(&self) -> usize {
        self.row_groups as usize
    }

    /// `schema_offsets`: list header + root + C columns + list end.
    pub fn schema_offsets_len(&self) -> usize {
        self.columns as usize + 3
    }

    /// `schema_num_children_offsets`: a (start, end) pair per schema element,
    /// root included.
    pub fn schema_num_children_offsets_len(&self) -> usize {
        (self.columns as usize + 1) * 2
    }

    /// `row_groups_offsets`: list header + R row groups + list end.
    pub fn row_groups_offsets_len(&self) -> usize {
        self.row_groups as usize + 2
    }

    /// `column_orders_offsets`: same shape as schema_offsets minus the extra
    /// root slot (column_orders has no root element).
    pub fn column_orders_offsets_len(&self) -> usize {
        self.columns as usize + 2
    }

    /// Per-row-group column-chunk offset table length (list header + C
    /// columns + list end).
    pub fn column_chunks_per_row_group_len(&self) -> usize {
        self.columns as usize + 2
    }

    /// `column_chunks_offsets`: one such table per row group, flattened.
    pub fn column_chunks_offsets_len(&self) -> usize {
        self.row_groups as usize * self.column_chunks_per_row_group_len()
    }

    fn u32_table_elements(&self) -> usize {
        self.num_rows_offsets_len()
            + self.row_numbers_len()
            + self.schema_offsets_len()
            + self.schema_num_children_offsets_len()
            + self.row_groups_offsets_len()
            + self.column_orders_offsets_len()
            + self.column_chunks_offsets_len()
    }

    /// Total byte size of everything after the 20-byte header: the `uint32`
    /// tables, the column-name blob, and the footer metadata.
    pub fn body_size(&self) -> usize {
        self.u32_table_elements() * 4 + self.column_names_length as usize + self.metadata_length as usize
    }

    /// Total on-disk size of the index file, header included.
    pub fn total_size(&self) -> usize {
        HEADER_LEN + self.body_size()
    }

    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(&MAGIC);
        out[4..8].copy_from_slice(&self.row_groups.to_le_bytes());
        out[8..12].copy_from_slice(&self.columns.to_le_bytes());
        out[12..16].copy_from_slice(&self.column_names_length.to_le_bytes());
        out[16..20].copy_from_slice(&self.metadata_length.to_le_bytes());
        out
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_LEN {
            return Err(format_err!(
                "index header truncated: need {} bytes, have {}",
                HEADER_LEN,
                buf.len()
            ));
        }
        if buf[0..4] != MAGIC {
            return Err(format_err!(
                "unexpected index magic {:?}, expected {:?} (wrong format version?)",
                &buf[0..4],
                MAGIC
            ));
        }
        Ok(DataHeader {
            row_groups: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            columns: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            column_names_length: u32::from_le_bytes(buf[12..16].try_into().unwrap()),
            metadata_length: u32::from_le_bytes(buf[16..20].try_into().unwrap()),
        })
    }
}

/// Byte offset (within the file, header included) of each body section.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SectionOffsets {
    pub num_rows_offsets: usize,
    pub row_numbers: usize,
    pub schema_offsets: usize,
    pub schema_num_children_offsets: usize,
    pub row_groups_offsets: usize,
    pub column_orders_offsets: usize,
    pub column_chunks_offsets: usize,
    pub column_names: usize,
    pub metadata: usize,
}

impl SectionOffsets {
    pub(crate) fn compute(header: &DataHeader) -> Self {
        let mut pos = HEADER_LEN;
        let num_rows_offsets = pos;
        pos += header.num_rows_offsets_len() * 4;
        let row_numbers = pos;
        pos += header.row_numbers_len() * 4;
        let schema_offsets = pos;
        pos += header.schema_offsets_len() * 4;
        let schema_num_children_offsets = pos;
        pos += header.schema_num_children_offsets_len() * 4;
        let row_groups_offsets = pos;
        pos += header.row_groups_offsets_len() * 4;
        let column_orders_offsets = pos;
        pos += header.column_orders_offsets_len() * 4;
        let column_chunks_offsets = pos;
        pos += header.column_chunks_offsets_len() * 4;
        let column_names = pos;
        pos += header.column_names_length as usize;
        let metadata = pos;
        SectionOffsets {
            num_rows_offsets,
            row_numbers,
            schema_offsets,
            schema_num_children_offsets,
            row_groups_offsets,
            column_orders_offsets,
            column_chunks_offsets,
            column_names,
            metadata,
        }
    }
}

/// Decodes `count` little-endian `u32`s starting at `bytes[off..]`.
pub(crate) fn read_u32_table(bytes: &[u8], off: usize, count: usize) -> Result<Vec<u32>> {
    let end = off
        .checked_add(count * 4)
        .ok_or_else(|| format_err!("offset table overflow"))?;
    if end > bytes.len() {
        return Err(format_err!(
            "index file truncated: offset table needs {} bytes at {}, file has {}",
            count * 4,
            off,
            bytes.len()
        ));
    }
    Ok(bytes[off..end]
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
        .collect())
}

/// Writes `values` as little-endian `u32`s into `out`.
pub(crate) fn write_u32_table(out: &mut Vec<u8>, values: &[u32]) {
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip() {
        let h = DataHeader {
            row_groups: 10,
            columns: 5,
            column_names_length: 42,
            metadata_length: 1000,
        };
        let bytes = h.to_bytes();
        let back = DataHeader::from_bytes(&bytes).unwrap();
        assert_eq!(h, back);
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut bytes = DataHeader {
            row_groups: 1,
            columns: 1,
            column_names_length: 0,
            metadata_length: 0,
        }
        .to_bytes();
        bytes[3] = b'1'; // PJ_1 instead of PJ_2
        assert!(DataHeader::from_bytes(&bytes).is_err());
    }

    #[test]
    fn section_offsets_sum_to_body_size() {
        let h = DataHeader {
            row_groups: 3,
            columns: 4,
            column_names_length: 20,
            metadata_length: 500,
        };
        let off = SectionOffsets::compute(&h);
        assert_eq!(off.metadata + h.metadata_length as usize, h.total_size());
    }
}

//! Index generation (§4.3): a single pass over the original Thrift-encoded
//! `FileMetaData` bytes that collects the offset table of §3.2 and writes
//! it out ahead of the verbatim footer bytes.
//!
//! The walk assumes — as every known Parquet writer produces — that a
//! struct's fields are encoded in ascending field-id order. Thrift Compact's
//! delta field-id encoding does not strictly require this, but the splicer
//! (§4.4) depends on it to patch fields in a single left-to-right pass, so
//! we treat a struct whose fields arrive out of order as malformed input
//! rather than attempt to handle it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::index::layout::{write_u32_table, DataHeader};
use crate::thrift::reader::CompactReader;

struct Collected {
    num_rows_offsets: [u32; 2],
    row_numbers: Vec<u32>,
    schema_offsets: Vec<u32>,
    schema_num_children_offsets: Vec<u32>,
    row_groups_offsets: Vec<u32>,
    column_orders_offsets: Vec<u32>,
    column_chunks_offsets: Vec<u32>,
    column_names: Vec<u8>,
    num_columns: u32,
    num_row_groups: u32,
}

/// Walks one `SchemaElement` list (field 2 of `FileMetaData`): the root
/// element followed by `C` columns in depth-first tree order. Returns
/// `(schema_offsets, schema_num_children_offsets, column_names, num_columns)`.
fn collect_schema(reader: &mut CompactReader) -> Result<(Vec<u32>, Vec<u32>, Vec<u8>, u32)> {
    let list_start = reader.position();
    let (_elem_ty, size) = reader.read_list_header()?;
    if size == 0 {
        return Err(validation_err!(
            "schema list is empty; expected at least a root element"
        ));
    }

    let mut schema_offsets = Vec::with_capacity(size as usize + 2);
    schema_offsets.push(list_start as u32);
    let mut schema_num_children_offsets = Vec::with_capacity(size as usize * 2);
    let mut column_names = Vec::new();

    for i in 0..size {
        let elem_start = reader.position();
        schema_offsets.push(elem_start as u32);

        let mut num_children_pair = [0u32, 0u32];
        let mut name: Option<Vec<u8>> = None;
        reader.walk_struct(|r, fh| match fh.id {
            5 => {
                let start = r.position();
                r.skip_value(fh.ty, false)?;
                num_children_pair = [start as u32, r.position() as u32];
                Ok(())
            }
            4 if i > 0 => {
                name = Some(r.read_binary_bytes()?.to_vec());
                Ok(())
            }
            _ => r.skip_value(fh.ty, false),
        })?;

        schema_num_children_offsets.push(num_children_pair[0]);
        schema_num_children_offsets.push(num_children_pair[1]);

        if i > 0 {
            let name = name
                .ok_or_else(|| validation_err!("schema element {} has no name field (id 4)", i))?;
            column_names.extend_from_slice(&name);
            column_names.push(0);
        }
    }

    let list_end = reader.position();
    schema_offsets.push(list_end as u32);

    Ok((
        schema_offsets,
        schema_num_children_offsets,
        column_names,
        size - 1,
    ))
}

/// Walks one `RowGroup` struct starting at `base`, returning the column
/// chunk offset table (relative to `base`, per §3.2) and the row group's
/// `num_rows` value.
fn collect_row_group(
    reader: &mut CompactReader,
    base: usize,
    num_columns: u32,
) -> Result<(Vec<u32>, u32)> {
    let mut column_chunks_rel = vec![0u32; num_columns as usize + 2];
    let mut row_count: Option<i64> = None;
    let mut columns_seen = false;

    reader.walk_struct(|r, fh| match fh.id {
        1 => {
            columns_seen = true;
            let list_start = r.position();
            let (_elem_ty, size) = r.read_list_header()?;
            if size != num_columns {
                return Err(validation_err!(
                    "row group declares {} column chunks but schema has {} columns",
                    size,
                    num_columns
                ));
            }
            column_chunks_rel[0] = (list_start - base) as u32;
            for c in 0..size as usize {
                let elem_start = r.position();
                column_chunks_rel[1 + c] = (elem_start - base) as u32;
                r.walk_struct(|r2, f2| r2.skip_value(f2.ty, false))?;
            }
            column_chunks_rel[1 + size as usize] = (r.position() - base) as u32;
            Ok(())
        }
        3 => {
            row_count = Some(r.read_i64()?);
            Ok(())
        }
        _ => r.skip_value(fh.ty, false),
    })?;

    if !columns_seen {
        return Err(validation_err!(
            "row group has no columns field (id 1)"
        ));
    }
    let row_count =
        row_count.ok_or_else(|| validation_err!("row group has no num_rows field (id 3)"))?;
    let row_count = u32::try_from(row_count)
        .map_err(|_| validation_err!("row group num_rows {} does not fit in u32", row_count))?;

    Ok((column_chunks_rel, row_count))
}

fn collect_offsets(footer: &[u8]) -> Result<Collected> {
    let mut reader = CompactReader::new(footer);
    let mut last_field_id = 0i16;

    let mut num_rows_offsets = [0u32, 0];
    let mut num_rows_seen = false;
    let mut schema_offsets = Vec::new();
    let mut schema_num_children_offsets = Vec::new();
    let mut column_names = Vec::new();
    let mut num_columns = 0u32;
    let mut schema_seen = false;
    let mut row_groups_offsets = Vec::new();
    let mut row_numbers = Vec::new();
    let mut column_chunks_offsets = Vec::new();
    let mut column_orders_offsets: Option<Vec<u32>> = None;

    while let Some(fh) = reader.read_field_header(&mut last_field_id)? {
        match fh.id {
            2 => {
                let (so, snco, names, c) = collect_schema(&mut reader)?;
                schema_offsets = so;
                schema_num_children_offsets = snco;
                column_names = names;
                num_columns = c;
                schema_seen = true;
            }
            3 => {
                let start = reader.position();
                reader.skip_value(fh.ty, false)?;
                num_rows_offsets = [start as u32, reader.position() as u32];
                num_rows_seen = true;
            }
            4 => {
                if !schema_seen {
                    return Err(validation_err!(
                        "row_groups field (id 4) encountered before schema field (id 2)"
                    ));
                }
                let list_start = reader.position();
                let (_elem_ty, size) = reader.read_list_header()?;
                row_groups_offsets.push(list_start as u32);
                for _ in 0..size {
                    let rg_start = reader.position();
                    row_groups_offsets.push(rg_start as u32);
                    let (cc_rel, row_count) = collect_row_group(&mut reader, rg_start, num_columns)?;
                    column_chunks_offsets.extend_from_slice(&cc_rel);
                    row_numbers.push(row_count);
                }
                row_groups_offsets.push(reader.position() as u32);
            }
            7 => {
                if !schema_seen {
                    return Err(validation_err!(
                        "column_orders field (id 7) encountered before schema field (id 2)"
                    ));
                }
                let list_start = reader.position();
                let (_elem_ty, size) = reader.read_list_header()?;
                let mut offsets = Vec::with_capacity(size as usize + 2);
                offsets.push(list_start as u32);
                for _ in 0..size {
                    offsets.push(reader.position() as u32);
                    reader.walk_struct(|r, f| r.skip_value(f.ty, false))?;
                }
                offsets.push(reader.position() as u32);
                column_orders_offsets = Some(offsets);
            }
            _ => reader.skip_value(fh.ty, false)?,
        }
    }

    if !schema_seen {
        return Err(validation_err!("metadata has no schema field (id 2)"));
    }
    if !num_rows_seen {
        return Err(validation_err!("metadata has no num_rows field (id 3)"));
    }
    if row_groups_offsets.is_empty() {
        return Err(validation_err!("metadata has no row_groups field (id 4)"));
    }

    let num_row_groups = row_numbers.len() as u32;
    let column_orders_offsets =
        column_orders_offsets.unwrap_or_else(|| vec![0u32; num_columns as usize + 2]);

    Ok(Collected {
        num_rows_offsets,
        row_numbers,
        schema_offsets,
        schema_num_children_offsets,
        row_groups_offsets,
        column_orders_offsets,
        column_chunks_offsets,
        column_names,
        num_columns,
        num_row_groups,
    })
}

/// The validation pass described in §4.3: every table the walk produced
/// must have exactly the shape a `DataHeader` with this many row groups and
/// columns predicts, and every `num_children` offset pair must be either
/// both zero (field absent) or a well-formed non-empty span.
fn validate(c: &Collected) -> Result<()> {
    let expect = DataHeader {
        row_groups: c.num_row_groups,
        columns: c.num_columns,
        column_names_length: 0,
        metadata_length: 0,
    };

    if c.row_numbers.len() != expect.row_numbers_len() {
        return Err(validation_err!(
            "row_numbers has {} entries, expected {}",
            c.row_numbers.len(),
            expect.row_numbers_len()
        ));
    }
    if c.schema_offsets.len() != expect.schema_offsets_len() {
        return Err(validation_err!(
            "schema_offsets has {} entries, expected {}",
            c.schema_offsets.len(),
            expect.schema_offsets_len()
        ));
    }
    if c.schema_num_children_offsets.len() != expect.schema_num_children_offsets_len() {
        return Err(validation_err!(
            "schema_num_children_offsets has {} entries, expected {}",
            c.schema_num_children_offsets.len(),
            expect.schema_num_children_offsets_len()
        ));
    }
    if c.row_groups_offsets.len() != expect.row_groups_offsets_len() {
        return Err(validation_err!(
            "row_groups_offsets has {} entries, expected {}",
            c.row_groups_offsets.len(),
            expect.row_groups_offsets_len()
        ));
    }
    if c.column_orders_offsets.len() != expect.column_orders_offsets_len() {
        return Err(validation_err!(
            "column_orders_offsets has {} entries, expected {}",
            c.column_orders_offsets.len(),
            expect.column_orders_offsets_len()
        ));
    }
    if c.column_chunks_offsets.len() != expect.column_chunks_offsets_len() {
        return Err(validation_err!(
            "column_chunks_offsets has {} entries, expected {}",
            c.column_chunks_offsets.len(),
            expect.column_chunks_offsets_len()
        ));
    }
    for pair in c.schema_num_children_offsets.chunks_exact(2) {
        let (start, end) = (pair[0], pair[1]);
        if (start == 0) != (end == 0) {
            return Err(validation_err!(
                "num_children offset pair ({}, {}) is neither absent nor well-formed",
                start,
                end
            ));
        }
        if start != 0 && start >= end {
            return Err(validation_err!(
                "num_children offset pair ({}, {}) does not span a value",
                start,
                end
            ));
        }
    }

    Ok(())
}

fn build_index_bytes(footer: &[u8], c: Collected) -> Vec<u8> {
    let header = DataHeader {
        row_groups: c.num_row_groups,
        columns: c.num_columns,
        column_names_length: c.column_names.len() as u32,
        metadata_length: footer.len() as u32,
    };

    let mut out = Vec::with_capacity(header.total_size());
    out.extend_from_slice(&header.to_bytes());
    write_u32_table(&mut out, &c.num_rows_offsets);
    write_u32_table(&mut out, &c.row_numbers);
    write_u32_table(&mut out, &c.schema_offsets);
    write_u32_table(&mut out, &c.schema_num_children_offsets);
    write_u32_table(&mut out, &c.row_groups_offsets);
    write_u32_table(&mut out, &c.column_orders_offsets);
    write_u32_table(&mut out, &c.column_chunks_offsets);
    out.extend_from_slice(&c.column_names);
    out.extend_from_slice(footer);
    out
}

/// Builds the sidecar index for `footer` (the exact Thrift-encoded
/// `FileMetaData` bytes extracted by an external Parquet library) and
/// returns it as an in-memory buffer, without touching the filesystem.
pub fn generate_index_to_vec(footer: &[u8]) -> Result<Vec<u8>> {
    let collected = collect_offsets(footer)?;
    validate(&collected)?;
    Ok(build_index_bytes(footer, collected))
}

/// Builds the sidecar index for `footer` and writes it to `index_path`.
///
/// The write is buffered (matching the reference implementation's 4 MiB
/// stream buffer) but not atomic: callers who need atomic replacement of an
/// existing index should write to a temporary path and rename it into
/// place (§4.3, §5).
pub fn generate_index<P: AsRef<Path>>(footer: &[u8], index_path: P) -> Result<()> {
    let bytes = generate_index_to_vec(footer)?;
    let file = File::create(index_path)?;
    let mut writer = BufWriter::with_capacity(4 * 1024 * 1024, file);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::thrift::ty;
    use crate::thrift::writer;

    /// Hand-assembles a minimal but structurally valid Thrift Compact
    /// `FileMetaData` buffer: `version`, a flat schema (root + N leaf
    /// columns), `num_rows`, `row_groups` rows each with N column chunks,
    /// `created_by`, and (optionally) `column_orders`. Good enough to drive
    /// the builder and splicer without needing a real Parquet file.
    pub fn build_footer(row_counts: &[i64], column_names: &[&str], with_column_orders: bool) -> Vec<u8> {
        let mut buf = Vec::new();

        // field 1: version (i32), delta=1
        push_field_header(&mut buf, 1, ty::I32);
        push_i32(&mut buf, 1);

        // field 2: schema (list<struct>), delta=1
        push_field_header(&mut buf, 1, ty::LIST);
        push_list_begin(&mut buf, ty::STRUCT, (column_names.len() + 1) as u32);
        // root element: field 5 num_children (i32)
        push_field_header(&mut buf, 5, ty::I32);
        push_i32(&mut buf, column_names.len() as i32);
        push_stop(&mut buf);
        for name in column_names {
            // leaf element: field 4 name (binary)
            push_field_header(&mut buf, 4, ty::BINARY);
            push_binary(&mut buf, name.as_bytes());
            push_stop(&mut buf);
        }

        // field 3: num_rows (i64), delta=1
        push_field_header(&mut buf, 1, ty::I64);
        push_i64(&mut buf, row_counts.iter().sum());

        // field 4: row_groups (list<struct>), delta=1
        push_field_header(&mut buf, 1, ty::LIST);
        push_list_begin(&mut buf, ty::STRUCT, row_counts.len() as u32);
        for &rows in row_counts {
            // RowGroup: field 1 columns (list<struct>)
            push_field_header(&mut buf, 1, ty::LIST);
            push_list_begin(&mut buf, ty::STRUCT, column_names.len() as u32);
            for (i, _) in column_names.iter().enumerate() {
                // ColumnChunk: field 3 file_offset (i64), a stand-in payload unique per column
                push_field_header(&mut buf, 3, ty::I64);
                push_i64(&mut buf, 1000 + i as i64);
                push_stop(&mut buf);
            }
            // RowGroup: field 3 num_rows (i64), delta=2 (skips field 2 total_byte_size)
            push_field_header(&mut buf, 2, ty::I64);
            push_i64(&mut buf, rows);
            push_stop(&mut buf);
        }

        // field 6: created_by (binary), delta=2 (skips field 5 key_value_metadata)
        push_field_header(&mut buf, 2, ty::BINARY);
        push_binary(&mut buf, b"test-writer version 1.0");

        if with_column_orders {
            // field 7: column_orders (list<struct>), delta=1
            push_field_header(&mut buf, 1, ty::LIST);
            push_list_begin(&mut buf, ty::STRUCT, column_names.len() as u32);
            for _ in column_names {
                // ColumnOrder union: field 1 TYPE_ORDER (empty struct)
                push_field_header(&mut buf, 1, ty::STRUCT);
                push_stop(&mut buf);
                push_stop(&mut buf);
            }
        }

        push_stop(&mut buf); // end of FileMetaData
        buf
    }

    fn push_field_header(buf: &mut Vec<u8>, delta: u8, ty: u8) {
        buf.push((delta << 4) | ty);
    }

    fn push_stop(buf: &mut Vec<u8>) {
        buf.push(ty::STOP);
    }

    fn push_i32(buf: &mut Vec<u8>, v: i32) {
        let mut tmp = [0u8; 8];
        let n = writer::write_i32(&mut tmp, 0, v).unwrap();
        buf.extend_from_slice(&tmp[..n]);
    }

    fn push_i64(buf: &mut Vec<u8>, v: i64) {
        let mut tmp = [0u8; 10];
        let n = writer::write_i64(&mut tmp, 0, v).unwrap();
        buf.extend_from_slice(&tmp[..n]);
    }

    fn push_list_begin(buf: &mut Vec<u8>, elem_type: u8, size: u32) {
        let mut tmp = [0u8; 8];
        let n = writer::write_list_begin(&mut tmp, 0, elem_type, size).unwrap();
        buf.extend_from_slice(&tmp[..n]);
    }

    fn push_binary(buf: &mut Vec<u8>, bytes: &[u8]) {
        write_varint_u32(buf, bytes.len() as u32);
        buf.extend_from_slice(bytes);
    }

    fn write_varint_u32(buf: &mut Vec<u8>, mut v: u32) {
        loop {
            let mut b = (v & 0x7F) as u8;
            v >>= 7;
            if v != 0 {
                b |= 0x80;
            }
            buf.push(b);
            if v == 0 {
                break;
            }
        }
    }

    #[test]
    fn builds_index_for_single_row_group() {
        let footer = build_footer(&[100], &["a", "b", "c"], false);
        let index = generate_index_to_vec(&footer).unwrap();
        let header = DataHeader::from_bytes(&index).unwrap();
        assert_eq!(header.row_groups, 1);
        assert_eq!(header.columns, 3);
        assert_eq!(header.metadata_length as usize, footer.len());
    }

    #[test]
    fn builds_index_with_ten_row_groups() {
        let counts: Vec<i64> = (1..=10).map(|n| n * 100).collect();
        let footer = build_footer(&counts, &["a", "b", "c", "d", "e"], true);
        let index = generate_index_to_vec(&footer).unwrap();
        let header = DataHeader::from_bytes(&index).unwrap();
        assert_eq!(header.row_groups, 10);
        assert_eq!(header.columns, 5);
    }

    #[test]
    fn generating_twice_is_byte_identical() {
        let footer = build_footer(&[10, 20, 30], &["x", "y"], true);
        let a = generate_index_to_vec(&footer).unwrap();
        let b = generate_index_to_vec(&footer).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_truncated_footer() {
        let footer = build_footer(&[10], &["a"], false);
        let truncated = &footer[..footer.len() - 3];
        assert!(generate_index_to_vec(truncated).is_err());
    }
}

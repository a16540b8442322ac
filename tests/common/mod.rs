//! Shared fixture for the integration tests: hand-assembles a minimal but
//! structurally valid Thrift Compact `FileMetaData` buffer using only
//! `palletjack`'s public Thrift primitives, the same way a real Parquet
//! reader's footer bytes would look on the wire.

use palletjack::thrift::{ty, writer, CompactReader};

/// Decodes the `num_rows` field (id 3) out of a Thrift Compact `FileMetaData`
/// buffer, the same way a real Parquet reader would when it parses spliced
/// bytes — used by the integration tests to check the splicer's sum law
/// (spec §8 invariant 3) instead of only checking the `row_groups`/`columns`
/// counts in the re-derived index header.
pub fn decode_num_rows(metadata: &[u8]) -> i64 {
    let mut reader = CompactReader::new(metadata);
    let mut last_field_id = 0i16;
    loop {
        let fh = reader
            .read_field_header(&mut last_field_id)
            .unwrap()
            .expect("num_rows field (id 3) not found before STOP");
        if fh.id == 3 {
            return reader.read_i64().unwrap();
        }
        reader.skip_value(fh.ty, false).unwrap();
    }
}

pub fn build_footer(row_counts: &[i64], column_names: &[&str], with_column_orders: bool) -> Vec<u8> {
    let mut buf = Vec::new();

    push_field_header(&mut buf, 1, ty::I32);
    push_i32(&mut buf, 1);

    push_field_header(&mut buf, 1, ty::LIST);
    push_list_begin(&mut buf, ty::STRUCT, (column_names.len() + 1) as u32);
    push_field_header(&mut buf, 5, ty::I32);
    push_i32(&mut buf, column_names.len() as i32);
    push_stop(&mut buf);
    for name in column_names {
        push_field_header(&mut buf, 4, ty::BINARY);
        push_binary(&mut buf, name.as_bytes());
        push_stop(&mut buf);
    }

    push_field_header(&mut buf, 1, ty::I64);
    push_i64(&mut buf, row_counts.iter().sum());

    push_field_header(&mut buf, 1, ty::LIST);
    push_list_begin(&mut buf, ty::STRUCT, row_counts.len() as u32);
    for &rows in row_counts {
        push_field_header(&mut buf, 1, ty::LIST);
        push_list_begin(&mut buf, ty::STRUCT, column_names.len() as u32);
        for (i, _) in column_names.iter().enumerate() {
            push_field_header(&mut buf, 3, ty::I64);
            push_i64(&mut buf, 1000 + i as i64);
            push_stop(&mut buf);
        }
        push_field_header(&mut buf, 2, ty::I64);
        push_i64(&mut buf, rows);
        push_stop(&mut buf);
    }

    push_field_header(&mut buf, 2, ty::BINARY);
    push_binary(&mut buf, b"test-writer version 1.0");

    if with_column_orders {
        push_field_header(&mut buf, 1, ty::LIST);
        push_list_begin(&mut buf, ty::STRUCT, column_names.len() as u32);
        for _ in column_names {
            push_field_header(&mut buf, 1, ty::STRUCT);
            push_stop(&mut buf);
            push_stop(&mut buf);
        }
    }

    push_stop(&mut buf);
    buf
}

fn push_field_header(buf: &mut Vec<u8>, delta: u8, field_ty: u8) {
    buf.push((delta << 4) | field_ty);
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

//! The projection splicer (§4.4): copies contiguous spans of the original
//! Thrift-encoded `FileMetaData` verbatim and patches in freshly written
//! list headers, counts, and sums at the handful of places a projection
//! changes. No Thrift value is ever decoded-and-reencoded in full; the
//! output is byte-identical to the original everywhere it isn't projected,
//! which preserves every field the splicer doesn't know about (forward
//! compatibility, §9).

use crate::error::Result;
use crate::thrift::{ty, writer};

use super::Index;

/// Builds the projected `FileMetaData` bytes for `index`, selecting
/// `row_groups` and `columns` (both already validated to be in range; empty
/// means "no filtering on this axis").
pub(crate) fn splice(index: &Index, row_groups: &[u32], columns: &[u32]) -> Result<Vec<u8>> {
    let src = index.metadata();
    let r = index.row_groups();
    let c = index.columns();

    let filter_rows = !row_groups.is_empty();
    let filter_cols = !columns.is_empty();

    let mut out = Vec::with_capacity(src.len());
    let mut p: usize = 0;

    // --- field 2: schema ---
    if filter_cols {
        let so = &index.schema_offsets;
        out.extend_from_slice(&src[p..so[0] as usize]);

        append_list_begin(&mut out, ty::STRUCT, columns.len() as u32 + 1)?;
        p = so[1] as usize;

        let nc = &index.schema_num_children_offsets;
        let (nc_start, nc_end) = (nc[0] as usize, nc[1] as usize);
        if nc_start == 0 && nc_end == 0 {
            return Err(validation_err!(
                "schema root element has no num_children field; cannot project columns"
            ));
        }
        out.extend_from_slice(&src[p..nc_start]);
        append_i32(&mut out, columns.len() as i32)?;
        p = nc_end;

        out.extend_from_slice(&src[p..so[2] as usize]);

        for &col in columns {
            let start = so[2 + col as usize] as usize;
            let end = so[3 + col as usize] as usize;
            out.extend_from_slice(&src[start..end]);
        }
        p = so[c as usize + 2] as usize;
    }

    // --- field 3: num_rows ---
    if filter_rows {
        let nro = &index.num_rows_offsets;
        out.extend_from_slice(&src[p..nro[0] as usize]);
        let sum: i64 = row_groups
            .iter()
            .map(|&g| index.row_numbers[g as usize] as i64)
            .sum();
        append_i64(&mut out, sum)?;
        p = nro[1] as usize;
    }

    // --- field 4: row_groups ---
    let rgo = &index.row_groups_offsets;
    if filter_rows {
        out.extend_from_slice(&src[p..rgo[0] as usize]);
        append_list_begin(&mut out, ty::STRUCT, row_groups.len() as u32)?;
    } else {
        out.extend_from_slice(&src[p..rgo[1] as usize]);
    }

    let selected: Vec<u32> = if filter_rows {
        row_groups.to_vec()
    } else {
        (0..r).collect()
    };
    for &g in &selected {
        let base = rgo[1 + g as usize] as usize;
        let end = rgo[2 + g as usize] as usize;
        if filter_cols {
            let cc = index.column_chunks_offsets_for(g as usize);
            out.extend_from_slice(&src[base..base + cc[0] as usize]);
            append_list_begin(&mut out, ty::STRUCT, columns.len() as u32)?;
            for &col in columns {
                let start = base + cc[1 + col as usize] as usize;
                let chunk_end = base + cc[2 + col as usize] as usize;
                out.extend_from_slice(&src[start..chunk_end]);
            }
            let tail_start = base + cc[c as usize + 1] as usize;
            out.extend_from_slice(&src[tail_start..end]);
        } else {
            out.extend_from_slice(&src[base..end]);
        }
    }
    p = rgo[rgo.len() - 1] as usize;

    // --- field 7: column_orders ---
    if filter_cols && index.column_orders_offsets[0] != 0 {
        let co = &index.column_orders_offsets;
        out.extend_from_slice(&src[p..co[0] as usize]);
        append_list_begin(&mut out, ty::STRUCT, columns.len() as u32)?;
        for &col in columns {
            let start = co[1 + col as usize] as usize;
            let end = co[2 + col as usize] as usize;
            out.extend_from_slice(&src[start..end]);
        }
        p = co[c as usize + 1] as usize;
    }

    out.extend_from_slice(&src[p..src.len()]);

    Ok(out)
}

fn append_list_begin(out: &mut Vec<u8>, elem_type: u8, size: u32) -> Result<()> {
    let mut tmp = [0u8; 8];
    let n = writer::write_list_begin(&mut tmp, 0, elem_type, size)?;
    out.extend_from_slice(&tmp[..n]);
    Ok(())
}

fn append_i32(out: &mut Vec<u8>, value: i32) -> Result<()> {
    let mut tmp = [0u8; 8];
    let n = writer::write_i32(&mut tmp, 0, value)?;
    out.extend_from_slice(&tmp[..n]);
    Ok(())
}

fn append_i64(out: &mut Vec<u8>, value: i64) -> Result<()> {
    let mut tmp = [0u8; 10];
    let n = writer::write_i64(&mut tmp, 0, value)?;
    out.extend_from_slice(&tmp[..n]);
    Ok(())
}

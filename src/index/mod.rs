//! The sidecar index: its on-disk layout (§6.1), the builder that produces
//! it from a Parquet footer (§4.3), and the splicer that turns a loaded
//! index plus a projection spec back into a standalone Thrift Compact
//! `FileMetaData` buffer (§4.4).

pub(crate) mod builder;
pub(crate) mod layout;
mod splicer;

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::Result;

pub use builder::{generate_index, generate_index_to_vec};
use layout::{read_u32_table, DataHeader, SectionOffsets, HEADER_LEN};

/// Which row groups and columns a [`read_metadata`] call should keep.
///
/// An empty `row_groups` selects all row groups, in their original order; an
/// empty `column_indices`/`column_names` selects all columns. At most one of
/// `column_indices`/`column_names` may be non-empty — requesting both is an
/// [`crate::error::PalletJackError::ArgumentError`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionSpec {
    pub row_groups: Vec<u32>,
    pub column_indices: Vec<u32>,
    pub column_names: Vec<String>,
}

impl ProjectionSpec {
    /// The no-op projection: every row group, every column, in original order.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_row_groups(mut self, row_groups: impl Into<Vec<u32>>) -> Self {
        self.row_groups = row_groups.into();
        self
    }

    pub fn with_column_indices(mut self, column_indices: impl Into<Vec<u32>>) -> Self {
        self.column_indices = column_indices.into();
        self
    }

    pub fn with_column_names<S: Into<String>>(mut self, column_names: impl IntoIterator<Item = S>) -> Self {
        self.column_names = column_names.into_iter().map(Into::into).collect();
        self
    }
}

/// A sidecar index loaded into memory: the parsed header, the decoded
/// offset tables of §3.2, and the verbatim original footer bytes.
///
/// Immutable once loaded — callers may share one `Index` across many
/// [`read_metadata`]/[`Index::read`] calls (§5).
pub struct Index {
    header: DataHeader,
    bytes: Vec<u8>,
    num_rows_offsets: [u32; 2],
    row_numbers: Vec<u32>,
    schema_offsets: Vec<u32>,
    schema_num_children_offsets: Vec<u32>,
    row_groups_offsets: Vec<u32>,
    column_orders_offsets: Vec<u32>,
    column_chunks_offsets: Vec<u32>,
    column_names_offset: usize,
    metadata_offset: usize,
}

impl Index {
    /// Parses an index file already read into memory.
    pub fn load(bytes: Vec<u8>) -> Result<Self> {
        let header = DataHeader::from_bytes(&bytes)?;
        if bytes.len() != header.total_size() {
            return Err(format_err!(
                "index file is {} bytes, header declares {}",
                bytes.len(),
                header.total_size()
            ));
        }
        let off = SectionOffsets::compute(&header);

        let num_rows_offsets_vec = read_u32_table(&bytes, off.num_rows_offsets, header.num_rows_offsets_len())?;
        let num_rows_offsets = [num_rows_offsets_vec[0], num_rows_offsets_vec[1]];
        let row_numbers = read_u32_table(&bytes, off.row_numbers, header.row_numbers_len())?;
        let schema_offsets = read_u32_table(&bytes, off.schema_offsets, header.schema_offsets_len())?;
        let schema_num_children_offsets = read_u32_table(
            &bytes,
            off.schema_num_children_offsets,
            header.schema_num_children_offsets_len(),
        )?;
        let row_groups_offsets =
            read_u32_table(&bytes, off.row_groups_offsets, header.row_groups_offsets_len())?;
        let column_orders_offsets = read_u32_table(
            &bytes,
            off.column_orders_offsets,
            header.column_orders_offsets_len(),
        )?;
        let column_chunks_offsets = read_u32_table(
            &bytes,
            off.column_chunks_offsets,
            header.column_chunks_offsets_len(),
        )?;

        Ok(Index {
            header,
            bytes,
            num_rows_offsets,
            row_numbers,
            schema_offsets,
            schema_num_children_offsets,
            row_groups_offsets,
            column_orders_offsets,
            column_chunks_offsets,
            column_names_offset: off.column_names,
            metadata_offset: off.metadata,
        })
    }

    /// Reads and parses an index file from disk.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path.as_ref())
            .map_err(|e| io_err!("opening index file {:?}: {}", path.as_ref(), e))?;
        let mut bytes = Vec::with_capacity(HEADER_LEN);
        file.read_to_end(&mut bytes)
            .map_err(|e| io_err!("reading index file {:?}: {}", path.as_ref(), e))?;
        Self::load(bytes)
    }

    pub fn row_groups(&self) -> u32 {
        self.header.row_groups
    }

    pub fn columns(&self) -> u32 {
        self.header.columns
    }

    /// The verbatim original Thrift-encoded `FileMetaData` bytes.
    pub fn metadata(&self) -> &[u8] {
        &self.bytes[self.metadata_offset..self.metadata_offset + self.header.metadata_length as usize]
    }

    fn column_names_blob(&self) -> &[u8] {
        &self.bytes[self.column_names_offset..self.column_names_offset + self.header.column_names_length as usize]
    }

    /// Column names in schema order, split out of the null-terminated blob.
    pub fn column_names(&self) -> Result<Vec<&str>> {
        self.column_names_blob()
            .split(|&b| b == 0)
            .take(self.header.columns as usize)
            .map(|s| {
                std::str::from_utf8(s)
                    .map_err(|e| format_err!("column name is not valid UTF-8: {}", e))
            })
            .collect()
    }

    fn resolve_column_names(&self, names: &[String]) -> Result<Vec<u32>> {
        let known = self.column_names()?;
        let mut by_name: HashMap<&str, u32> = HashMap::with_capacity(known.len());
        for (i, name) in known.iter().enumerate() {
            by_name.insert(name, i as u32);
        }
        names
            .iter()
            .map(|name| {
                by_name
                    .get(name.as_str())
                    .copied()
                    .ok_or_else(|| argument_err!("no column named '{}' in schema", name))
            })
            .collect()
    }

    fn column_chunks_offsets_for(&self, row_group: usize) -> &[u32] {
        let per = self.header.column_chunks_per_row_group_len();
        &self.column_chunks_offsets[row_group * per..(row_group + 1) * per]
    }

    /// Produces a standalone Thrift Compact `FileMetaData` buffer containing
    /// only `spec`'s selected row groups and columns (§4.4).
    pub fn read(&self, spec: &ProjectionSpec) -> Result<Vec<u8>> {
        if !spec.column_indices.is_empty() && !spec.column_names.is_empty() {
            return Err(argument_err!(
                "cannot specify both column_indices and column_names"
            ));
        }
        let columns = if !spec.column_names.is_empty() {
            self.resolve_column_names(&spec.column_names)?
        } else {
            spec.column_indices.clone()
        };

        for &g in &spec.row_groups {
            if g >= self.header.row_groups {
                return Err(range_err!(
                    "requested row group {} but only 0..{} are available",
                    g,
                    self.header.row_groups
                ));
            }
        }
        for &c in &columns {
            if c >= self.header.columns {
                return Err(range_err!(
                    "requested column {} but only 0..{} are available",
                    c,
                    self.header.columns
                ));
            }
        }

        splicer::splice(self, &spec.row_groups, &columns)
    }
}

/// Loads `index_bytes` and returns the projected `FileMetaData` bytes for
/// `spec` (§6.2).
pub fn read_metadata(index_bytes: &[u8], spec: &ProjectionSpec) -> Result<Vec<u8>> {
    Index::load(index_bytes.to_vec())?.read(spec)
}

/// Loads the index at `index_path` and returns the projected `FileMetaData`
/// bytes for `spec` (§6.2).
pub fn read_metadata_from_path<P: AsRef<Path>>(index_path: P, spec: &ProjectionSpec) -> Result<Vec<u8>> {
    Index::load_from_path(index_path)?.read(spec)
}

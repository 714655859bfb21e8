//! Read-direction buffer serializer for bulk data transfer.
//!
//! Converts a `WorksheetXml` and `SharedStringTable` into a compact binary
//! buffer that can be transferred to JavaScript as a single `Buffer` object,
//! avoiding per-cell napi object creation overhead.
//!
//! Binary format (little-endian throughout):
//!
//! ```text
//! HEADER (16 bytes)
//!   magic:     u32  = 0x534B5244 ("SKRD")
//!   version:   u16  = 1
//!   row_count: u32  = number of rows
//!   col_count: u16  = number of columns
//!   flags:     u32  = bit 0: 1=sparse, 0=dense
//!
//! ROW INDEX (row_count * 8 bytes)
//!   per row: row_number (u32) + offset (u32) into CELL DATA
//!   offset = 0xFFFFFFFF for empty rows
//!
//! STRING TABLE
//!   count:     u32
//!   blob_size: u32
//!   offsets:   u32[count] (byte offset within blob)
//!   blob:      concatenated UTF-8 strings (blob_size bytes)
//!
//! CELL DATA
//!   Dense:  row_count * col_count * 9 bytes
//!     per cell: type (u8) + payload (8 bytes)
//!   Sparse: variable length
//!     per row: cell_count (u16) + cell_count * 11 bytes
//!       per cell: col (u16) + type (u8) + payload (8 bytes)
//! ```

use std::collections::HashMap;

use crate::error::Result;
use crate::sst::SharedStringTable;
use crate::utils::cell_ref::cell_name_to_coordinates;
use sheetkit_xml::worksheet::{CellTypeTag, WorksheetXml};

pub const MAGIC: u32 = 0x534B5244;
pub const VERSION: u16 = 1;
pub const HEADER_SIZE: usize = 16;
pub const CELL_STRIDE: usize = 9;

pub const TYPE_EMPTY: u8 = 0x00;
pub const TYPE_NUMBER: u8 = 0x01;
pub const TYPE_STRING: u8 = 0x02;
pub const TYPE_BOOL: u8 = 0x03;
pub const TYPE_DATE: u8 = 0x04;
pub const TYPE_ERROR: u8 = 0x05;
pub const TYPE_FORMULA: u8 = 0x06;
pub const TYPE_RICH_STRING: u8 = 0x07;

pub const FLAG_SPARSE: u32 = 0x01;

const SPARSE_DENSITY_THRESHOLD: f64 = 0.30;
const EMPTY_ROW_OFFSET: u32 = 0xFFFF_FFFF;
const SPARSE_CELL_STRIDE: usize = 11;

/// Serialize a worksheet's cell data into a compact binary buffer.
///
/// Reads cell data directly from `WorksheetXml` sheet data, resolving shared
/// string references via `sst`. The resulting buffer uses either dense or
/// sparse layout depending on cell density relative to the bounding rectangle.
pub fn sheet_to_raw_buffer(ws: &WorksheetXml, sst: &SharedStringTable) -> Result<Vec<u8>> {
    let rows = &ws.sheet_data.rows;

    if rows.is_empty() {
        return Ok(write_empty_buffer());
    }

    let (min_row, max_row, min_col, max_col, total_cells) = scan_dimensions(ws)?;

    if total_cells == 0 {
        return Ok(write_empty_buffer());
    }

    let row_count = (max_row - min_row + 1) as usize;
    let col_count = (max_col - min_col + 1) as usize;

    let total_grid = row_count * col_count;
    let density = total_cells as f64 / total_grid as f64;
    let sparse = density < SPARSE_DENSITY_THRESHOLD;

    let mut string_table = StringTableBuilder::from_sst(sst);

    let cell_entries = collect_cell_entries(ws, sst, min_col, &mut string_table)?;

    let flags: u32 = if sparse { FLAG_SPARSE } else { 0 };

    let row_index_size = row_count * 8;
    let string_section = string_table.encode();
    let cell_data = if sparse {
        encode_sparse_cells(&cell_entries, min_row, max_row)
    } else {
        encode_dense_cells(&cell_entries, min_row, row_count, col_count)
    };
    let row_index = build_row_index(&cell_entries, min_row, max_row, col_count, sparse);

    let total_size = HEADER_SIZE + row_index_size + string_section.len() + cell_data.len();
    let mut buf = Vec::with_capacity(total_size);

    buf.extend_from_slice(&MAGIC.to_le_bytes());
    buf.extend_from_slice(&VERSION.to_le_bytes());
    buf.extend_from_slice(&(row_count as u32).to_le_bytes());
    buf.extend_from_slice(&(col_count as u16).to_le_bytes());
    buf.extend_from_slice(&flags.to_le_bytes());

    buf.extend_from_slice(&row_index);
    buf.extend_from_slice(&string_section);
    buf.extend_from_slice(&cell_data);

    Ok(buf)
}

fn write_empty_buffer() -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE);
    buf.extend_from_slice(&MAGIC.to_le_bytes());
    buf.extend_from_slice(&VERSION.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf
}

struct CellEntry {
    col: u32,
    type_tag: u8,
    payload: [u8; 8],
}

struct RowEntries {
    row_num: u32,
    cells: Vec<CellEntry>,
}

fn scan_dimensions(ws: &WorksheetXml) -> Result<(u32, u32, u32, u32, usize)> {
    let mut min_row = u32::MAX;
    let mut max_row = 0u32;
    let mut min_col = u32::MAX;
    let mut max_col = 0u32;
    let mut total_cells = 0usize;

    for row in &ws.sheet_data.rows {
        if row.cells.is_empty() {
            continue;
        }
        min_row = min_row.min(row.r);
        max_row = max_row.max(row.r);

        for cell in &row.cells {
            let col = resolve_col(cell)?;
            min_col = min_col.min(col);
            max_col = max_col.max(col);
            total_cells += 1;
        }
    }

    if total_cells == 0 {
        return Ok((1, 1, 1, 1, 0));
    }

    Ok((min_row, max_row, min_col, max_col, total_cells))
}

fn resolve_col(cell: &sheetkit_xml::worksheet::Cell) -> Result<u32> {
    if cell.col > 0 {
        return Ok(cell.col);
    }
    let (col, _row) = cell_name_to_coordinates(cell.r.as_str())?;
    Ok(col)
}

fn collect_cell_entries(
    ws: &WorksheetXml,
    sst: &SharedStringTable,
    min_col: u32,
    string_table: &mut StringTableBuilder,
) -> Result<Vec<RowEntries>> {
    let mut result = Vec::with_capacity(ws.sheet_data.rows.len());

    for row in &ws.sheet_data.rows {
        if row.cells.is_empty() {
            continue;
        }

        let mut cells = Vec::with_capacity(row.cells.len());
        for cell in &row.cells {
            let col = resolve_col(cell)?;
            let relative_col = col - min_col;
            let (type_tag, payload) = encode_cell_value(cell, sst, string_table)?;
            cells.push(CellEntry {
                col: relative_col,
                type_tag,
                payload,
            });
        }

        result.push(RowEntries {
            row_num: row.r,
            cells,
        });
    }

    Ok(result)
}

fn encode_cell_value(
    cell: &sheetkit_xml::worksheet::Cell,
    sst: &SharedStringTable,
    string_table: &mut StringTableBuilder,
) -> Result<(u8, [u8; 8])> {
    let mut payload = [0u8; 8];

    if cell.f.is_some() {
        let formula_expr = cell
            .f
            .as_ref()
            .and_then(|f| f.value.as_deref())
            .unwrap_or("");
        let idx = string_table.intern(formula_expr);
        payload[..4].copy_from_slice(&(idx as u32).to_le_bytes());
        return Ok((TYPE_FORMULA, payload));
    }

    match cell.t {
        CellTypeTag::SharedString => {
            if let Some(ref v) = cell.v {
                if let Ok(sst_idx) = v.parse::<usize>() {
                    let text = sst.get(sst_idx).unwrap_or("");
                    let idx = string_table.intern(text);
                    payload[..4].copy_from_slice(&(idx as u32).to_le_bytes());
                    if sst.get_rich_text(sst_idx).is_some() {
                        return Ok((TYPE_RICH_STRING, payload));
                    }
                    return Ok((TYPE_STRING, payload));
                }
            }
            Ok((TYPE_EMPTY, payload))
        }
        CellTypeTag::Boolean => {
            if let Some(ref v) = cell.v {
                payload[0] = if v == "1" || v.eq_ignore_ascii_case("true") {
                    1
                } else {
                    0
                };
            }
            Ok((TYPE_BOOL, payload))
        }
        CellTypeTag::Error => {
            let error_text = cell.v.as_deref().unwrap_or("#VALUE!");
            let idx = string_table.intern(error_text);
            payload[..4].copy_from_slice(&(idx as u32).to_le_bytes());
            Ok((TYPE_ERROR, payload))
        }
        CellTypeTag::InlineString => {
            let text = cell
                .is
                .as_ref()
                .and_then(|is| is.t.as_deref())
                .or(cell.v.as_deref())
                .unwrap_or("");
            let idx = string_table.intern(text);
            payload[..4].copy_from_slice(&(idx as u32).to_le_bytes());
            Ok((TYPE_STRING, payload))
        }
        CellTypeTag::Date => {
            if let Some(ref v) = cell.v {
                if let Ok(n) = v.parse::<f64>() {
                    payload.copy_from_slice(&n.to_le_bytes());
                    return Ok((TYPE_DATE, payload));
                }
            }
            Ok((TYPE_EMPTY, payload))
        }
        CellTypeTag::FormulaString => {
            if let Some(ref v) = cell.v {
                let idx = string_table.intern(v);
                payload[..4].copy_from_slice(&(idx as u32).to_le_bytes());
                return Ok((TYPE_STRING, payload));
            }
            Ok((TYPE_EMPTY, payload))
        }
        CellTypeTag::None | CellTypeTag::Number => {
            if let Some(ref v) = cell.v {
                if let Ok(n) = v.parse::<f64>() {
                    payload.copy_from_slice(&n.to_le_bytes());
                    return Ok((TYPE_NUMBER, payload));
                }
            }
            Ok((TYPE_EMPTY, payload))
        }
    }
}

struct StringTableBuilder {
    strings: Vec<String>,
    index_map: HashMap<String, usize>,
}

impl StringTableBuilder {
    fn from_sst(sst: &SharedStringTable) -> Self {
        let count = sst.len();
        let mut strings = Vec::with_capacity(count);
        let mut index_map = HashMap::with_capacity(count);

        for i in 0..count {
            if let Some(s) = sst.get(i) {
                let owned = s.to_string();
                index_map.entry(owned.clone()).or_insert(i);
                strings.push(owned);
            }
        }

        Self { strings, index_map }
    }

    fn intern(&mut self, s: &str) -> usize {
        if let Some(&idx) = self.index_map.get(s) {
            return idx;
        }
        let idx = self.strings.len();
        self.strings.push(s.to_string());
        self.index_map.insert(s.to_string(), idx);
        idx
    }

    /// Encode the string table section: count(u32) + blob_size(u32) + offsets(u32[count]) + blob.
    fn encode(&self) -> Vec<u8> {
        let count = self.strings.len() as u32;
        if count == 0 {
            let mut buf = Vec::with_capacity(8);
            buf.extend_from_slice(&0u32.to_le_bytes());
            buf.extend_from_slice(&0u32.to_le_bytes());
            return buf;
        }

        let mut blob = Vec::new();
        let mut offsets = Vec::with_capacity(self.strings.len());
        for s in &self.strings {
            offsets.push(blob.len() as u32);
            blob.extend_from_slice(s.as_bytes());
        }
        let blob_size = blob.len() as u32;

        let total = 4 + 4 + self.strings.len() * 4 + blob.len();
        let mut buf = Vec::with_capacity(total);
        buf.extend_from_slice(&count.to_le_bytes());
        buf.extend_from_slice(&blob_size.to_le_bytes());
        for off in &offsets {
            buf.extend_from_slice(&off.to_le_bytes());
        }
        buf.extend_from_slice(&blob);
        buf
    }
}

fn encode_dense_cells(
    row_entries: &[RowEntries],
    min_row: u32,
    row_count: usize,
    col_count: usize,
) -> Vec<u8> {
    let total = row_count * col_count * CELL_STRIDE;
    let mut buf = vec![0u8; total];

    for re in row_entries {
        let row_offset = (re.row_num - min_row) as usize;
        for ce in &re.cells {
            let cell_idx = row_offset * col_count + ce.col as usize;
            let pos = cell_idx * CELL_STRIDE;
            buf[pos] = ce.type_tag;
            buf[pos + 1..pos + 9].copy_from_slice(&ce.payload);
        }
    }

    buf
}

fn encode_sparse_cells(row_entries: &[RowEntries], min_row: u32, max_row: u32) -> Vec<u8> {
    let total_rows = (max_row - min_row + 1) as usize;
    let mut entries_by_row: Vec<Option<&RowEntries>> = vec![None; total_rows];
    for re in row_entries {
        let idx = (re.row_num - min_row) as usize;
        entries_by_row[idx] = Some(re);
    }

    let mut buf = Vec::new();
    for entry in &entries_by_row {
        match entry {
            Some(re) => {
                let count = re.cells.len() as u16;
                buf.extend_from_slice(&count.to_le_bytes());
                for ce in &re.cells {
                    buf.extend_from_slice(&(ce.col as u16).to_le_bytes());
                    buf.push(ce.type_tag);
                    buf.extend_from_slice(&ce.payload);
                }
            }
            None => {
                buf.extend_from_slice(&0u16.to_le_bytes());
            }
        }
    }

    buf
}

fn build_row_index(
    row_entries: &[RowEntries],
    min_row: u32,
    max_row: u32,
    col_count: usize,
    sparse: bool,
) -> Vec<u8> {
    let total_rows = (max_row - min_row + 1) as usize;
    let mut index = Vec::with_capacity(total_rows * 8);

    let mut entries_map: HashMap<u32, &RowEntries> = HashMap::new();
    for re in row_entries {
        entries_map.insert(re.row_num, re);
    }

    if sparse {
        let mut sparse_offset = 0u32;
        for row_num in min_row..=max_row {
            index.extend_from_slice(&row_num.to_le_bytes());
            if let Some(re) = entries_map.get(&row_num) {
                if re.cells.is_empty() {
                    index.extend_from_slice(&EMPTY_ROW_OFFSET.to_le_bytes());
                    sparse_offset += 2;
                } else {
                    index.extend_from_slice(&sparse_offset.to_le_bytes());
                    sparse_offset += 2 + (re.cells.len() as u32) * SPARSE_CELL_STRIDE as u32;
                }
            } else {
                index.extend_from_slice(&EMPTY_ROW_OFFSET.to_le_bytes());
                sparse_offset += 2;
            }
        }
    } else {
        for row_num in min_row..=max_row {
            index.extend_from_slice(&row_num.to_le_bytes());
            if entries_map.contains_key(&row_num) {
                let offset = ((row_num - min_row) as usize * col_count * CELL_STRIDE) as u32;
                index.extend_from_slice(&offset.to_le_bytes());
            } else {
                index.extend_from_slice(&EMPTY_ROW_OFFSET.to_le_bytes());
            }
        }
    }

    index
}

//! Read-direction buffer serializer v2 for bulk data transfer.
//!
//! Converts a `WorksheetXml` and `SharedStringTable` into a compact binary
//! buffer with inline strings, eliminating the global string table that v1
//! required. This allows incremental (row-by-row) decoding on the JS side
//! without eagerly materializing all strings upfront.
//!
//! Binary format (little-endian throughout):
//!
//! ```text
//! HEADER (16 bytes)
//!   magic:     u32  = 0x534B5232 ("SKR2")
//!   version:   u16  = 2
//!   row_count: u32  = number of rows
//!   col_count: u16  = number of columns
//!   flags:     u32  = bit 0: always 0 (v2 is always sparse)
//!                      bits 16..31: min_col (1-based)
//!
//! ROW INDEX (row_count * 8 bytes)
//!   per row: row_number (u32) + byte_offset (u32) into CELL DATA section
//!   offset = 0xFFFFFFFF for empty rows
//!
//! CELL DATA (variable length)
//!   per row: cell_count (u16) + cells
//!   per cell: col (u16) + type (u8) + payload
//!     0x00 (empty):  0 bytes
//!     0x01 (number): 8 bytes (f64 LE)
//!     0x02 (string): 4 bytes (len u32 LE) + N bytes (UTF-8)
//!     0x03 (bool):   1 byte
//!     0x04 (date):   8 bytes (f64 LE, Excel serial)
//!     0x05 (error):  4 bytes (len u32 LE) + N bytes (UTF-8)
//!     0x06 (formula): 4 bytes (len u32 LE) + N bytes (UTF-8, cached formula text)
//!     0x07 (rich):   4 bytes (len u32 LE) + N bytes (UTF-8)
//! ```

use crate::error::Result;
use crate::sst::SharedStringTable;
use crate::utils::cell_ref::cell_name_to_coordinates;
use sheetkit_xml::worksheet::{CellTypeTag, WorksheetXml};

pub const MAGIC_V2: u32 = 0x534B5232;
pub const VERSION_V2: u16 = 2;
pub const HEADER_SIZE: usize = 16;

pub const TYPE_EMPTY: u8 = 0x00;
pub const TYPE_NUMBER: u8 = 0x01;
pub const TYPE_STRING: u8 = 0x02;
pub const TYPE_BOOL: u8 = 0x03;
pub const TYPE_DATE: u8 = 0x04;
pub const TYPE_ERROR: u8 = 0x05;
pub const TYPE_FORMULA: u8 = 0x06;
pub const TYPE_RICH_STRING: u8 = 0x07;

const EMPTY_ROW_OFFSET: u32 = 0xFFFF_FFFF;

/// A cell entry with inline string data (variable-length payload).
struct CellEntryV2 {
    col: u16,
    type_tag: u8,
    payload: CellPayload,
}

enum CellPayload {
    Empty,
    Number(f64),
    Bool(u8),
    Str(String),
}

impl CellPayload {
    fn byte_size(&self) -> usize {
        match self {
            CellPayload::Empty => 0,
            CellPayload::Number(_) => 8,
            CellPayload::Bool(_) => 1,
            CellPayload::Str(s) => 4 + s.len(),
        }
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        match self {
            CellPayload::Empty => {}
            CellPayload::Number(n) => {
                buf.extend_from_slice(&n.to_le_bytes());
            }
            CellPayload::Bool(b) => {
                buf.push(*b);
            }
            CellPayload::Str(s) => {
                buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
                buf.extend_from_slice(s.as_bytes());
            }
        }
    }
}

struct RowEntriesV2 {
    row_num: u32,
    cells: Vec<CellEntryV2>,
}

impl RowEntriesV2 {
    /// Byte size of the cell data for this row (cell_count u16 + all cells).
    fn byte_size(&self) -> usize {
        // cell_count (2 bytes) + each cell (col u16 + type u8 + payload)
        let mut size = 2usize;
        for cell in &self.cells {
            size += 2 + 1 + cell.payload.byte_size();
        }
        size
    }
}

/// Serialize a worksheet's cell data into a compact binary buffer using v2 format.
///
/// The v2 format inlines all string data with each cell, eliminating the global
/// string table. This enables incremental row-by-row decoding without eagerly
/// decoding all strings.
pub fn sheet_to_raw_buffer_v2(ws: &WorksheetXml, sst: &SharedStringTable) -> Result<Vec<u8>> {
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

    let cell_entries = collect_cell_entries_v2(ws, sst, min_col)?;

    let flags: u32 = (min_col & 0xFFFF) << 16;

    let row_index_size = row_count * 8;

    let cell_data = encode_cell_data_v2(&cell_entries, min_row, max_row);
    let row_index = build_row_index_v2(&cell_entries, min_row, max_row);

    let total_size = HEADER_SIZE + row_index_size + cell_data.len();
    let mut buf = Vec::with_capacity(total_size);

    buf.extend_from_slice(&MAGIC_V2.to_le_bytes());
    buf.extend_from_slice(&VERSION_V2.to_le_bytes());
    buf.extend_from_slice(&(row_count as u32).to_le_bytes());
    buf.extend_from_slice(&(col_count as u16).to_le_bytes());
    buf.extend_from_slice(&flags.to_le_bytes());

    buf.extend_from_slice(&row_index);
    buf.extend_from_slice(&cell_data);

    Ok(buf)
}

fn write_empty_buffer() -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE);
    buf.extend_from_slice(&MAGIC_V2.to_le_bytes());
    buf.extend_from_slice(&VERSION_V2.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf
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

fn collect_cell_entries_v2(
    ws: &WorksheetXml,
    sst: &SharedStringTable,
    min_col: u32,
) -> Result<Vec<RowEntriesV2>> {
    let mut result = Vec::with_capacity(ws.sheet_data.rows.len());

    for row in &ws.sheet_data.rows {
        if row.cells.is_empty() {
            continue;
        }

        let mut cells = Vec::with_capacity(row.cells.len());
        for cell in &row.cells {
            let col = resolve_col(cell)?;
            let relative_col = (col - min_col) as u16;
            let (type_tag, payload) = encode_cell_value_v2(cell, sst)?;
            cells.push(CellEntryV2 {
                col: relative_col,
                type_tag,
                payload,
            });
        }

        result.push(RowEntriesV2 {
            row_num: row.r,
            cells,
        });
    }

    Ok(result)
}

fn encode_cell_value_v2(
    cell: &sheetkit_xml::worksheet::Cell,
    sst: &SharedStringTable,
) -> Result<(u8, CellPayload)> {
    if cell.f.is_some() {
        let formula_expr = cell
            .f
            .as_ref()
            .and_then(|f| f.value.as_deref())
            .unwrap_or("");
        return Ok((TYPE_FORMULA, CellPayload::Str(formula_expr.to_string())));
    }

    match cell.t {
        CellTypeTag::SharedString => {
            if let Some(ref v) = cell.v {
                if let Ok(sst_idx) = v.parse::<usize>() {
                    let text = sst.get(sst_idx).unwrap_or("");
                    if sst.get_rich_text(sst_idx).is_some() {
                        return Ok((TYPE_RICH_STRING, CellPayload::Str(text.to_string())));
                    }
                    return Ok((TYPE_STRING, CellPayload::Str(text.to_string())));
                }
            }
            Ok((TYPE_EMPTY, CellPayload::Empty))
        }
        CellTypeTag::Boolean => {
            let b = if let Some(ref v) = cell.v {
                if v == "1" || v.eq_ignore_ascii_case("true") {
                    1u8
                } else {
                    0u8
                }
            } else {
                0u8
            };
            Ok((TYPE_BOOL, CellPayload::Bool(b)))
        }
        CellTypeTag::Error => {
            let error_text = cell.v.as_deref().unwrap_or("#VALUE!");
            Ok((TYPE_ERROR, CellPayload::Str(error_text.to_string())))
        }
        CellTypeTag::InlineString => {
            let text = cell
                .is
                .as_ref()
                .and_then(|is| is.t.as_deref())
                .or(cell.v.as_deref())
                .unwrap_or("");
            Ok((TYPE_STRING, CellPayload::Str(text.to_string())))
        }
        CellTypeTag::Date => {
            if let Some(ref v) = cell.v {
                if let Ok(n) = v.parse::<f64>() {
                    return Ok((TYPE_DATE, CellPayload::Number(n)));
                }
            }
            Ok((TYPE_EMPTY, CellPayload::Empty))
        }
        CellTypeTag::FormulaString => {
            if let Some(ref v) = cell.v {
                return Ok((TYPE_STRING, CellPayload::Str(v.clone())));
            }
            Ok((TYPE_EMPTY, CellPayload::Empty))
        }
        CellTypeTag::None | CellTypeTag::Number => {
            if let Some(ref v) = cell.v {
                if let Ok(n) = v.parse::<f64>() {
                    return Ok((TYPE_NUMBER, CellPayload::Number(n)));
                }
            }
            Ok((TYPE_EMPTY, CellPayload::Empty))
        }
    }
}

fn encode_cell_data_v2(row_entries: &[RowEntriesV2], min_row: u32, max_row: u32) -> Vec<u8> {
    let total_rows = (max_row - min_row + 1) as usize;
    let mut entries_by_row: Vec<Option<&RowEntriesV2>> = vec![None; total_rows];
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
                for cell in &re.cells {
                    buf.extend_from_slice(&cell.col.to_le_bytes());
                    buf.push(cell.type_tag);
                    cell.payload.write_to(&mut buf);
                }
            }
            None => {
                buf.extend_from_slice(&0u16.to_le_bytes());
            }
        }
    }

    buf
}

fn build_row_index_v2(row_entries: &[RowEntriesV2], min_row: u32, max_row: u32) -> Vec<u8> {
    let total_rows = (max_row - min_row + 1) as usize;
    let mut index = Vec::with_capacity(total_rows * 8);

    let mut entries_by_row: Vec<Option<&RowEntriesV2>> = vec![None; total_rows];
    for re in row_entries {
        let idx = (re.row_num - min_row) as usize;
        entries_by_row[idx] = Some(re);
    }

    let mut byte_offset = 0u32;
    for (i, entry) in entries_by_row.iter().enumerate() {
        let row_num = min_row + i as u32;
        index.extend_from_slice(&row_num.to_le_bytes());
        match entry {
            Some(re) => {
                if re.cells.is_empty() {
                    index.extend_from_slice(&EMPTY_ROW_OFFSET.to_le_bytes());
                    byte_offset += 2; // just the cell_count u16
                } else {
                    index.extend_from_slice(&byte_offset.to_le_bytes());
                    byte_offset += re.byte_size() as u32;
                }
            }
            None => {
                index.extend_from_slice(&EMPTY_ROW_OFFSET.to_le_bytes());
                byte_offset += 2; // empty row writes cell_count=0
            }
        }
    }

    index
}

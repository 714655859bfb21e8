//! Table and auto-filter management utilities.
//!
//! Provides functions for setting and removing auto-filters on worksheets.

use crate::error::Result;
use sheetkit_xml::worksheet::{AutoFilter, WorksheetXml};

/// Configuration for a table.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// The table name (used internally).
    pub name: String,
    /// The display name shown in the UI.
    pub display_name: String,
    /// The cell range (e.g. "A1:D10").
    pub range: String,
    /// Column definitions.
    pub columns: Vec<TableColumn>,
    /// Whether to show the header row.
    pub show_header_row: bool,
    /// The table style name (e.g. "TableStyleMedium2").
    pub style_name: Option<String>,
    /// Whether to enable auto-filter on the table.
    pub auto_filter: bool,
}

/// A column within a table.
#[derive(Debug, Clone)]
pub struct TableColumn {
    /// The column header name.
    pub name: String,
}

/// Set an auto-filter on a worksheet for the given cell range.
pub fn set_auto_filter(ws: &mut WorksheetXml, range: &str) -> Result<()> {
    ws.auto_filter = Some(AutoFilter {
        reference: range.to_string(),
    });
    Ok(())
}

/// Remove any auto-filter from a worksheet.
pub fn remove_auto_filter(ws: &mut WorksheetXml) {
    ws.auto_filter = None;
}

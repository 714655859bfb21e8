//! Page layout settings for worksheets.
//!
//! Provides functions for configuring page margins, page setup (paper size,
//! orientation, scaling), header/footer, print options, and page breaks.

use sheetkit_xml::worksheet::{
    Break, HeaderFooter, PageMargins, PageSetup, PrintOptions, RowBreaks, WorksheetXml,
};

use crate::error::Result;

// -- Default margin values (inches, matching Excel defaults) --

/// Default left margin in inches.
pub const DEFAULT_MARGIN_LEFT: f64 = 0.7;
/// Default right margin in inches.
pub const DEFAULT_MARGIN_RIGHT: f64 = 0.7;
/// Default top margin in inches.
pub const DEFAULT_MARGIN_TOP: f64 = 0.75;
/// Default bottom margin in inches.
pub const DEFAULT_MARGIN_BOTTOM: f64 = 0.75;
/// Default header margin in inches.
pub const DEFAULT_MARGIN_HEADER: f64 = 0.3;
/// Default footer margin in inches.
pub const DEFAULT_MARGIN_FOOTER: f64 = 0.3;

/// Page margin configuration in inches.
#[derive(Debug, Clone)]
pub struct PageMarginsConfig {
    /// Left margin in inches.
    pub left: f64,
    /// Right margin in inches.
    pub right: f64,
    /// Top margin in inches.
    pub top: f64,
    /// Bottom margin in inches.
    pub bottom: f64,
    /// Header margin in inches.
    pub header: f64,
    /// Footer margin in inches.
    pub footer: f64,
}

impl Default for PageMarginsConfig {
    fn default() -> Self {
        Self {
            left: DEFAULT_MARGIN_LEFT,
            right: DEFAULT_MARGIN_RIGHT,
            top: DEFAULT_MARGIN_TOP,
            bottom: DEFAULT_MARGIN_BOTTOM,
            header: DEFAULT_MARGIN_HEADER,
            footer: DEFAULT_MARGIN_FOOTER,
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    fn as_str(&self) -> &str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "portrait" => Some(Orientation::Portrait),
            "landscape" => Some(Orientation::Landscape),
            _ => None,
        }
    }
}

/// Standard paper sizes. The numeric values follow the OOXML specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperSize {
    Letter = 1,
    Tabloid = 3,
    Legal = 5,
    A3 = 8,
    A4 = 9,
    A5 = 11,
    B4 = 12,
    B5 = 13,
}

impl PaperSize {
    fn as_u32(self) -> u32 {
        self as u32
    }

    /// Convert from a numeric paper size value.
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            1 => Some(PaperSize::Letter),
            3 => Some(PaperSize::Tabloid),
            5 => Some(PaperSize::Legal),
            8 => Some(PaperSize::A3),
            9 => Some(PaperSize::A4),
            11 => Some(PaperSize::A5),
            12 => Some(PaperSize::B4),
            13 => Some(PaperSize::B5),
            _ => None,
        }
    }
}

/// Set page margins on a worksheet.
pub fn set_page_margins(ws: &mut WorksheetXml, margins: &PageMarginsConfig) -> Result<()> {
    ws.page_margins = Some(PageMargins {
        left: margins.left,
        right: margins.right,
        top: margins.top,
        bottom: margins.bottom,
        header: margins.header,
        footer: margins.footer,
    });
    Ok(())
}

/// Get page margins from a worksheet, returning defaults if not set.
pub fn get_page_margins(ws: &WorksheetXml) -> PageMarginsConfig {
    match &ws.page_margins {
        Some(pm) => PageMarginsConfig {
            left: pm.left,
            right: pm.right,
            top: pm.top,
            bottom: pm.bottom,
            header: pm.header,
            footer: pm.footer,
        },
        None => PageMarginsConfig::default(),
    }
}

/// Set page setup options on a worksheet.
///
/// Only non-`None` parameters are applied; existing values for `None`
/// parameters are preserved.
pub fn set_page_setup(
    ws: &mut WorksheetXml,
    orientation: Option<Orientation>,
    paper_size: Option<PaperSize>,
    scale: Option<u32>,
    fit_to_width: Option<u32>,
    fit_to_height: Option<u32>,
) -> Result<()> {
    let setup = ws.page_setup.get_or_insert(PageSetup {
        paper_size: None,
        orientation: None,
        scale: None,
        fit_to_width: None,
        fit_to_height: None,
        first_page_number: None,
        horizontal_dpi: None,
        vertical_dpi: None,
        r_id: None,
    });

    if let Some(o) = orientation {
        setup.orientation = Some(o.as_str().to_string());
    }
    if let Some(ps) = paper_size {
        setup.paper_size = Some(ps.as_u32());
    }
    if let Some(s) = scale {
        setup.scale = Some(s);
    }
    if let Some(w) = fit_to_width {
        setup.fit_to_width = Some(w);
    }
    if let Some(h) = fit_to_height {
        setup.fit_to_height = Some(h);
    }
    Ok(())
}

/// Get the current orientation, if set.
pub fn get_orientation(ws: &WorksheetXml) -> Option<Orientation> {
    ws.page_setup
        .as_ref()
        .and_then(|ps| ps.orientation.as_deref())
        .and_then(Orientation::from_str)
}

/// Get the current paper size, if set.
pub fn get_paper_size(ws: &WorksheetXml) -> Option<PaperSize> {
    ws.page_setup
        .as_ref()
        .and_then(|ps| ps.paper_size)
        .and_then(PaperSize::from_u32)
}

/// Get the current scale, if set.
pub fn get_scale(ws: &WorksheetXml) -> Option<u32> {
    ws.page_setup.as_ref().and_then(|ps| ps.scale)
}

/// Get the current fit-to-width value, if set.
pub fn get_fit_to_width(ws: &WorksheetXml) -> Option<u32> {
    ws.page_setup.as_ref().and_then(|ps| ps.fit_to_width)
}

/// Get the current fit-to-height value, if set.
pub fn get_fit_to_height(ws: &WorksheetXml) -> Option<u32> {
    ws.page_setup.as_ref().and_then(|ps| ps.fit_to_height)
}

/// Set header and footer text for printing.
///
/// Both parameters are optional. Pass `None` to leave a field unchanged.
/// Excel header/footer text uses special formatting codes (e.g., `&L`, `&C`,
/// `&R` for left/center/right sections).
pub fn set_header_footer(
    ws: &mut WorksheetXml,
    header: Option<&str>,
    footer: Option<&str>,
) -> Result<()> {
    let hf = ws.header_footer.get_or_insert(HeaderFooter {
        odd_header: None,
        odd_footer: None,
    });
    if let Some(h) = header {
        hf.odd_header = Some(h.to_string());
    }
    if let Some(f) = footer {
        hf.odd_footer = Some(f.to_string());
    }
    Ok(())
}

/// Get the header and footer text.
///
/// Returns `(header, footer)` where each may be `None` if not set.
pub fn get_header_footer(ws: &WorksheetXml) -> (Option<String>, Option<String>) {
    match &ws.header_footer {
        Some(hf) => (hf.odd_header.clone(), hf.odd_footer.clone()),
        None => (None, None),
    }
}

/// Set print options on a worksheet.
///
/// Only non-`None` parameters are applied; existing values for `None`
/// parameters are preserved.
pub fn set_print_options(
    ws: &mut WorksheetXml,
    grid_lines: Option<bool>,
    headings: Option<bool>,
    h_centered: Option<bool>,
    v_centered: Option<bool>,
) -> Result<()> {
    let opts = ws.print_options.get_or_insert(PrintOptions {
        grid_lines: None,
        headings: None,
        horizontal_centered: None,
        vertical_centered: None,
    });
    if let Some(gl) = grid_lines {
        opts.grid_lines = Some(gl);
    }
    if let Some(h) = headings {
        opts.headings = Some(h);
    }
    if let Some(hc) = h_centered {
        opts.horizontal_centered = Some(hc);
    }
    if let Some(vc) = v_centered {
        opts.vertical_centered = Some(vc);
    }
    Ok(())
}

/// Get print options from a worksheet.
///
/// Returns `(grid_lines, headings, horizontal_centered, vertical_centered)`.
pub fn get_print_options(
    ws: &WorksheetXml,
) -> (Option<bool>, Option<bool>, Option<bool>, Option<bool>) {
    match &ws.print_options {
        Some(po) => (
            po.grid_lines,
            po.headings,
            po.horizontal_centered,
            po.vertical_centered,
        ),
        None => (None, None, None, None),
    }
}

/// Insert a horizontal page break before the given 1-based row number.
///
/// If a break already exists at this row, the call is a no-op.
pub fn insert_page_break(ws: &mut WorksheetXml, row: u32) -> Result<()> {
    let rb = ws.row_breaks.get_or_insert_with(|| RowBreaks {
        count: None,
        manual_break_count: None,
        brk: vec![],
    });

    // Avoid duplicate breaks.
    if rb.brk.iter().any(|b| b.id == row) {
        return Ok(());
    }

    rb.brk.push(Break {
        id: row,
        max: Some(16383),
        man: Some(true),
    });

    // Sort breaks by row number.
    rb.brk.sort_by_key(|b| b.id);

    let count = rb.brk.len() as u32;
    rb.count = Some(count);
    rb.manual_break_count = Some(count);

    Ok(())
}

/// Remove a horizontal page break at the given 1-based row number.
///
/// If no break exists at this row, the call is a no-op.
pub fn remove_page_break(ws: &mut WorksheetXml, row: u32) -> Result<()> {
    if let Some(rb) = &mut ws.row_breaks {
        rb.brk.retain(|b| b.id != row);
        if rb.brk.is_empty() {
            ws.row_breaks = None;
        } else {
            let count = rb.brk.len() as u32;
            rb.count = Some(count);
            rb.manual_break_count = Some(count);
        }
    }
    Ok(())
}

/// Get all row page break positions (1-based row numbers).
pub fn get_page_breaks(ws: &WorksheetXml) -> Vec<u32> {
    match &ws.row_breaks {
        Some(rb) => rb.brk.iter().map(|b| b.id).collect(),
        None => vec![],
    }
}

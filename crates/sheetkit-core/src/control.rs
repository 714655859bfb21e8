//! Form control support for Excel worksheets.
//!
//! Excel uses legacy VML (Vector Markup Language) drawing parts for form
//! controls such as buttons, check boxes, option buttons, spin buttons,
//! scroll bars, group boxes, and labels. This module generates the VML
//! markup needed to add form controls and parses existing VML to read
//! them back.

use crate::error::{Error, Result};
use crate::utils::cell_ref::cell_name_to_coordinates;

/// Form control types.
#[derive(Debug, Clone, PartialEq)]
pub enum FormControlType {
    Button,
    CheckBox,
    OptionButton,
    SpinButton,
    ScrollBar,
    GroupBox,
    Label,
}

impl FormControlType {
    /// Return the VML ObjectType string for x:ClientData.
    pub fn object_type(&self) -> &str {
        match self {
            FormControlType::Button => "Button",
            FormControlType::CheckBox => "Checkbox",
            FormControlType::OptionButton => "Radio",
            FormControlType::SpinButton => "Spin",
            FormControlType::ScrollBar => "Scroll",
            FormControlType::GroupBox => "GBox",
            FormControlType::Label => "Label",
        }
    }

    /// Parse an ObjectType string back into a FormControlType.
    pub fn from_object_type(s: &str) -> Option<Self> {
        match s {
            "Button" => Some(FormControlType::Button),
            "Checkbox" => Some(FormControlType::CheckBox),
            "Radio" => Some(FormControlType::OptionButton),
            "Spin" => Some(FormControlType::SpinButton),
            "Scroll" => Some(FormControlType::ScrollBar),
            "GBox" => Some(FormControlType::GroupBox),
            "Label" => Some(FormControlType::Label),
            _ => None,
        }
    }

    /// Parse a user-facing type string into a FormControlType.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "button" => Ok(FormControlType::Button),
            "checkbox" | "check_box" | "check" => Ok(FormControlType::CheckBox),
            "optionbutton" | "option_button" | "radio" | "radiobutton" | "radio_button" => {
                Ok(FormControlType::OptionButton)
            }
            "spinbutton" | "spin_button" | "spin" | "spinner" => Ok(FormControlType::SpinButton),
            "scrollbar" | "scroll_bar" | "scroll" => Ok(FormControlType::ScrollBar),
            "groupbox" | "group_box" | "group" => Ok(FormControlType::GroupBox),
            "label" => Ok(FormControlType::Label),
            _ => Err(Error::InvalidArgument(format!(
                "unknown form control type: {s}"
            ))),
        }
    }
}

/// Configuration for adding a form control to a worksheet.
#[derive(Debug, Clone)]
pub struct FormControlConfig {
    /// The type of form control.
    pub control_type: FormControlType,
    /// Anchor cell (top-left corner), e.g. "B2".
    pub cell: String,
    /// Width in points. Uses a sensible default per control type if None.
    pub width: Option<f64>,
    /// Height in points. Uses a sensible default per control type if None.
    pub height: Option<f64>,
    /// Display text (Button, CheckBox, OptionButton, GroupBox, Label).
    pub text: Option<String>,
    /// VBA macro name (Button only).
    pub macro_name: Option<String>,
    /// Linked cell reference for value binding (CheckBox, OptionButton, SpinButton, ScrollBar).
    pub cell_link: Option<String>,
    /// Initial checked state (CheckBox, OptionButton).
    pub checked: Option<bool>,
    /// Minimum value (SpinButton, ScrollBar).
    pub min_value: Option<u32>,
    /// Maximum value (SpinButton, ScrollBar).
    pub max_value: Option<u32>,
    /// Step increment (SpinButton, ScrollBar).
    pub increment: Option<u32>,
    /// Page increment (ScrollBar only).
    pub page_increment: Option<u32>,
    /// Current value (SpinButton, ScrollBar).
    pub current_value: Option<u32>,
    /// Enable 3D shading (default true for most controls).
    pub three_d: Option<bool>,
}

impl FormControlConfig {
    /// Create a Button configuration.
    pub fn button(cell: &str, text: &str) -> Self {
        Self {
            control_type: FormControlType::Button,
            cell: cell.to_string(),
            width: None,
            height: None,
            text: Some(text.to_string()),
            macro_name: None,
            cell_link: None,
            checked: None,
            min_value: None,
            max_value: None,
            increment: None,
            page_increment: None,
            current_value: None,
            three_d: None,
        }
    }

    /// Create a CheckBox configuration.
    pub fn checkbox(cell: &str, text: &str) -> Self {
        Self {
            control_type: FormControlType::CheckBox,
            cell: cell.to_string(),
            width: None,
            height: None,
            text: Some(text.to_string()),
            macro_name: None,
            cell_link: None,
            checked: None,
            min_value: None,
            max_value: None,
            increment: None,
            page_increment: None,
            current_value: None,
            three_d: None,
        }
    }

    /// Create a SpinButton configuration.
    pub fn spin_button(cell: &str, min: u32, max: u32) -> Self {
        Self {
            control_type: FormControlType::SpinButton,
            cell: cell.to_string(),
            width: None,
            height: None,
            text: None,
            macro_name: None,
            cell_link: None,
            checked: None,
            min_value: Some(min),
            max_value: Some(max),
            increment: Some(1),
            page_increment: None,
            current_value: Some(min),
            three_d: None,
        }
    }

    /// Create a ScrollBar configuration.
    pub fn scroll_bar(cell: &str, min: u32, max: u32) -> Self {
        Self {
            control_type: FormControlType::ScrollBar,
            cell: cell.to_string(),
            width: None,
            height: None,
            text: None,
            macro_name: None,
            cell_link: None,
            checked: None,
            min_value: Some(min),
            max_value: Some(max),
            increment: Some(1),
            page_increment: Some(10),
            current_value: Some(min),
            three_d: None,
        }
    }

    /// Validate the configuration for correctness.
    pub fn validate(&self) -> Result<()> {
        cell_name_to_coordinates(&self.cell)?;

        if let Some(ref cl) = self.cell_link {
            cell_name_to_coordinates(cl)?;
        }

        if let (Some(min), Some(max)) = (self.min_value, self.max_value) {
            if min > max {
                return Err(Error::InvalidArgument(format!(
                    "min_value ({min}) must not exceed max_value ({max})"
                )));
            }
        }

        if let Some(inc) = self.increment {
            if inc == 0 {
                return Err(Error::InvalidArgument(
                    "increment must be greater than 0".to_string(),
                ));
            }
        }

        if let Some(page_inc) = self.page_increment {
            if page_inc == 0 {
                return Err(Error::InvalidArgument(
                    "page_increment must be greater than 0".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Information about an existing form control, returned when querying.
#[derive(Debug, Clone, PartialEq)]
pub struct FormControlInfo {
    pub control_type: FormControlType,
    pub cell: String,
    pub text: Option<String>,
    pub macro_name: Option<String>,
    pub cell_link: Option<String>,
    pub checked: Option<bool>,
    pub current_value: Option<u32>,
    pub min_value: Option<u32>,
    pub max_value: Option<u32>,
    pub increment: Option<u32>,
    pub page_increment: Option<u32>,
}

/// Default dimensions (width, height) in points for each control type.
fn default_dimensions(ct: &FormControlType) -> (f64, f64) {
    match ct {
        FormControlType::Button => (72.0, 24.0),
        FormControlType::CheckBox => (72.0, 18.0),
        FormControlType::OptionButton => (72.0, 18.0),
        FormControlType::SpinButton => (15.75, 30.0),
        FormControlType::ScrollBar => (15.75, 60.0),
        FormControlType::GroupBox => (120.0, 72.0),
        FormControlType::Label => (72.0, 18.0),
    }
}

/// VML shapetype id for form controls (differs from comments which use t202).
const FORM_CONTROL_SHAPETYPE_ID: &str = "_x0000_t201";

/// Build the VML anchor string from a cell reference and optional dimensions.
///
/// The anchor format is: col1, col1Off, row1, row1Off, col2, col2Off, row2, row2Off.
/// Offsets are in units of 1/1024 column width or 1/256 row height.
fn build_control_anchor(cell: &str, width_pt: f64, height_pt: f64) -> Result<String> {
    let (col, row) = cell_name_to_coordinates(cell)?;
    let col0 = col - 1;
    let row0 = row - 1;

    // Approximate column and row span from point dimensions.
    // Standard column width is ~64 pixels (~48pt), standard row height ~15pt.
    let col_span = ((width_pt / 48.0).ceil() as u32).max(1);
    let row_span = ((height_pt / 15.0).ceil() as u32).max(1);

    let col2 = col0 + col_span;
    let row2 = row0 + row_span;

    Ok(format!("{col0}, 15, {row0}, 10, {col2}, 63, {row2}, 24"))
}

/// Build a complete VML drawing document containing form control shapes.
///
/// `controls` is a list of FormControlConfig entries that have been validated.
/// `start_shape_id` is the starting shape ID (usually 1025).
/// Returns the VML XML string.
pub fn build_form_control_vml(controls: &[FormControlConfig], start_shape_id: usize) -> String {
    use std::fmt::Write;

    let mut shapes = String::new();
    for (i, config) in controls.iter().enumerate() {
        let shape_id = start_shape_id + i;
        let (default_w, default_h) = default_dimensions(&config.control_type);
        let width = config.width.unwrap_or(default_w);
        let height = config.height.unwrap_or(default_h);

        let anchor = match build_control_anchor(&config.cell, width, height) {
            Ok(a) => a,
            Err(_) => continue,
        };

        write_form_control_shape(&mut shapes, shape_id, i + 1, &anchor, config);
    }

    let mut doc = String::with_capacity(1024 + shapes.len());
    doc.push_str("<xml xmlns:v=\"urn:schemas-microsoft-com:vml\"");
    doc.push_str(" xmlns:o=\"urn:schemas-microsoft-com:office:office\"");
    doc.push_str(" xmlns:x=\"urn:schemas-microsoft-com:office:excel\">\n");
    doc.push_str(" <o:shapelayout v:ext=\"edit\">\n");
    doc.push_str("  <o:idmap v:ext=\"edit\" data=\"1\"/>\n");
    doc.push_str(" </o:shapelayout>\n");

    // Form control shapetype (t201).
    let _ = write!(
        doc,
        " <v:shapetype id=\"{}\" coordsize=\"21600,21600\" o:spt=\"201\" \
         path=\"m,l,21600r21600,l21600,xe\">\n\
         \x20 <v:stroke joinstyle=\"miter\"/>\n\
         \x20 <v:path gradientshapeok=\"t\" o:connecttype=\"rect\"/>\n\
         </v:shapetype>\n",
        FORM_CONTROL_SHAPETYPE_ID,
    );

    doc.push_str(&shapes);
    doc.push_str("</xml>\n");
    doc
}

/// Write a single VML form control shape element.
fn write_form_control_shape(
    out: &mut String,
    shape_id: usize,
    z_index: usize,
    anchor: &str,
    config: &FormControlConfig,
) {
    use std::fmt::Write;

    let _ = write!(out, " <v:shape id=\"_x0000_s{shape_id}\"");
    let _ = write!(out, " type=\"#{FORM_CONTROL_SHAPETYPE_ID}\"");
    let _ = write!(
        out,
        " style=\"position:absolute;z-index:{z_index};visibility:visible\""
    );

    match config.control_type {
        FormControlType::Button => {
            out.push_str(" fillcolor=\"buttonFace\" o:insetmode=\"auto\">\n");
            out.push_str("  <v:fill color2=\"buttonFace\" o:detectmouseclick=\"t\"/>\n");
            out.push_str("  <o:lock v:ext=\"edit\" rotation=\"t\"/>\n");
            if let Some(ref text) = config.text {
                let _ = write!(
                    out,
                    "  <v:textbox>\n\
                     \x20  <div style=\"text-align:center\">\
                     <font face=\"Calibri\" size=\"220\" color=\"#000000\">{text}</font>\
                     </div>\n\
                     \x20 </v:textbox>\n"
                );
            }
        }
        FormControlType::CheckBox | FormControlType::OptionButton => {
            out.push_str(" fillcolor=\"window\" o:insetmode=\"auto\">\n");
            out.push_str("  <v:fill color2=\"window\"/>\n");
            if let Some(ref text) = config.text {
                let _ = write!(
                    out,
                    "  <v:textbox>\n\
                     \x20  <div>{text}</div>\n\
                     \x20 </v:textbox>\n"
                );
            }
        }
        FormControlType::SpinButton | FormControlType::ScrollBar => {
            out.push_str(" fillcolor=\"buttonFace\" o:insetmode=\"auto\">\n");
            out.push_str("  <v:fill color2=\"buttonFace\"/>\n");
        }
        FormControlType::GroupBox => {
            out.push_str(" filled=\"f\" stroked=\"f\" o:insetmode=\"auto\">\n");
            if let Some(ref text) = config.text {
                let _ = write!(
                    out,
                    "  <v:textbox>\n\
                     \x20  <div>{text}</div>\n\
                     \x20 </v:textbox>\n"
                );
            }
        }
        FormControlType::Label => {
            out.push_str(" filled=\"f\" stroked=\"f\" o:insetmode=\"auto\">\n");
            if let Some(ref text) = config.text {
                let _ = write!(
                    out,
                    "  <v:textbox>\n\
                     \x20  <div>{text}</div>\n\
                     \x20 </v:textbox>\n"
                );
            }
        }
    }

    // x:ClientData element with control-specific properties.
    let object_type = config.control_type.object_type();
    let _ = writeln!(out, "  <x:ClientData ObjectType=\"{object_type}\">");
    let _ = writeln!(out, "   <x:Anchor>{anchor}</x:Anchor>");
    out.push_str("   <x:PrintObject>False</x:PrintObject>\n");
    out.push_str("   <x:AutoFill>False</x:AutoFill>\n");

    if let Some(ref macro_name) = config.macro_name {
        let _ = writeln!(out, "   <x:FmlaMacro>{macro_name}</x:FmlaMacro>");
    }

    if let Some(ref cell_link) = config.cell_link {
        let _ = writeln!(out, "   <x:FmlaLink>{cell_link}</x:FmlaLink>");
    }

    if let Some(checked) = config.checked {
        let val = if checked { 1 } else { 0 };
        let _ = writeln!(out, "   <x:Checked>{val}</x:Checked>");
    }

    if let Some(val) = config.current_value {
        let _ = writeln!(out, "   <x:Val>{val}</x:Val>");
    }

    if let Some(min) = config.min_value {
        let _ = writeln!(out, "   <x:Min>{min}</x:Min>");
    }

    if let Some(max) = config.max_value {
        let _ = writeln!(out, "   <x:Max>{max}</x:Max>");
    }

    if let Some(inc) = config.increment {
        let _ = writeln!(out, "   <x:Inc>{inc}</x:Inc>");
    }

    if let Some(page_inc) = config.page_increment {
        let _ = writeln!(out, "   <x:Page>{page_inc}</x:Page>");
    }

    // 3D shading: default is true for most controls. Write NoThreeD only when explicitly false.
    let three_d = config.three_d.unwrap_or(true);
    if !three_d {
        out.push_str("   <x:NoThreeD/>\n");
    }

    out.push_str("  </x:ClientData>\n");
    out.push_str(" </v:shape>\n");
}

/// Parse form controls from a VML drawing XML string.
///
/// Scans for `<x:ClientData ObjectType="...">` elements and extracts
/// control properties. Returns a list of FormControlInfo.
pub fn parse_form_controls(vml_xml: &str) -> Vec<FormControlInfo> {
    let mut controls = Vec::new();

    let mut search_from = 0;
    while let Some(shape_start) = vml_xml[search_from..].find("<v:shape ") {
        let abs_start = search_from + shape_start;
        let shape_end = match vml_xml[abs_start..].find("</v:shape>") {
            Some(pos) => abs_start + pos + "</v:shape>".len(),
            None => break,
        };
        let shape_xml = &vml_xml[abs_start..shape_end];

        // Skip non-form-control shapes (e.g. comment shapes use ObjectType="Note").
        if let Some(info) = parse_single_control(shape_xml) {
            controls.push(info);
        }
        search_from = shape_end;
    }

    controls
}

/// Parse a single v:shape element into a FormControlInfo, if it is a form control.
fn parse_single_control(shape_xml: &str) -> Option<FormControlInfo> {
    // Find the ClientData element.
    let cd_start = shape_xml.find("<x:ClientData ")?;
    let cd_end = shape_xml
        .find("</x:ClientData>")
        .map(|p| p + "</x:ClientData>".len())?;
    let cd_xml = &shape_xml[cd_start..cd_end];

    // Extract ObjectType attribute.
    let obj_type = extract_attr(cd_xml, "ObjectType")?;
    let control_type = FormControlType::from_object_type(&obj_type)?;

    // Skip Note types (comments).
    if obj_type == "Note" {
        return None;
    }

    let cell = extract_anchor_cell(cd_xml).unwrap_or_default();
    let text = extract_textbox_text(shape_xml);
    let macro_name = extract_element(cd_xml, "x:FmlaMacro");
    let cell_link = extract_element(cd_xml, "x:FmlaLink");
    let checked = extract_element(cd_xml, "x:Checked").and_then(|v| match v.as_str() {
        "1" => Some(true),
        "0" => Some(false),
        _ => None,
    });
    let current_value = extract_element(cd_xml, "x:Val").and_then(|v| v.parse().ok());
    let min_value = extract_element(cd_xml, "x:Min").and_then(|v| v.parse().ok());
    let max_value = extract_element(cd_xml, "x:Max").and_then(|v| v.parse().ok());
    let increment = extract_element(cd_xml, "x:Inc").and_then(|v| v.parse().ok());
    let page_increment = extract_element(cd_xml, "x:Page").and_then(|v| v.parse().ok());

    Some(FormControlInfo {
        control_type,
        cell,
        text,
        macro_name,
        cell_link,
        checked,
        current_value,
        min_value,
        max_value,
        increment,
        page_increment,
    })
}

/// Extract an XML attribute value from a tag.
fn extract_attr(xml: &str, attr: &str) -> Option<String> {
    let pattern = format!("{attr}=\"");
    let start = xml.find(&pattern)?;
    let val_start = start + pattern.len();
    let end = xml[val_start..].find('"')?;
    Some(xml[val_start..val_start + end].to_string())
}

/// Extract text content of an XML element like `<tag>content</tag>`.
fn extract_element(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = xml.find(&open)?;
    let content_start = start + open.len();
    let end = xml[content_start..].find(&close)?;
    let text = xml[content_start..content_start + end].trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Extract textbox text from a v:shape element.
fn extract_textbox_text(shape_xml: &str) -> Option<String> {
    let tb_start = shape_xml.find("<v:textbox>")?;
    let tb_end = shape_xml.find("</v:textbox>")?;
    let tb_content = &shape_xml[tb_start + "<v:textbox>".len()..tb_end];

    // Text is inside a <div> or <font> element; extract plain text.
    let mut text = String::new();
    let mut in_tag = false;
    for ch in tb_content.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    let trimmed = text.trim().to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Extract the anchor cell reference from x:Anchor element.
///
/// The anchor format is "col1, col1Off, row1, row1Off, col2, col2Off, row2, row2Off".
/// We derive the cell from col1 (0-based) and row1 (0-based).
fn extract_anchor_cell(cd_xml: &str) -> Option<String> {
    let anchor_text = extract_element(cd_xml, "x:Anchor")?;
    let parts: Vec<&str> = anchor_text.split(',').map(|s| s.trim()).collect();
    if parts.len() < 4 {
        return None;
    }
    let col0: u32 = parts[0].parse().ok()?;
    let row0: u32 = parts[2].parse().ok()?;
    crate::utils::cell_ref::coordinates_to_cell_name(col0 + 1, row0 + 1).ok()
}

/// Merge new form control VML into existing VML bytes (for sheets that
/// already have VML content from comments or other controls).
///
/// This appends new shape elements before the closing `</xml>` tag and
/// updates the shapetype if needed.
pub fn merge_vml_controls(
    existing_vml: &[u8],
    controls: &[FormControlConfig],
    start_shape_id: usize,
) -> Vec<u8> {
    let existing_str = String::from_utf8_lossy(existing_vml);

    // Generate shape elements for the new controls.
    let mut shapes = String::new();
    for (i, config) in controls.iter().enumerate() {
        let shape_id = start_shape_id + i;
        let (default_w, default_h) = default_dimensions(&config.control_type);
        let width = config.width.unwrap_or(default_w);
        let height = config.height.unwrap_or(default_h);

        if let Ok(anchor) = build_control_anchor(&config.cell, width, height) {
            write_form_control_shape(&mut shapes, shape_id, shape_id, &anchor, config);
        }
    }

    // Check if the form control shapetype already exists.
    let shapetype_exists = existing_str.contains(FORM_CONTROL_SHAPETYPE_ID);

    let shapetype_xml = if !shapetype_exists {
        format!(
            " <v:shapetype id=\"{FORM_CONTROL_SHAPETYPE_ID}\" coordsize=\"21600,21600\" \
             o:spt=\"201\" path=\"m,l,21600r21600,l21600,xe\">\n\
             \x20 <v:stroke joinstyle=\"miter\"/>\n\
             \x20 <v:path gradientshapeok=\"t\" o:connecttype=\"rect\"/>\n\
             </v:shapetype>\n"
        )
    } else {
        String::new()
    };

    // Insert before closing </xml>.
    if let Some(close_pos) = existing_str.rfind("</xml>") {
        let mut result =
            String::with_capacity(existing_str.len() + shapetype_xml.len() + shapes.len());
        result.push_str(&existing_str[..close_pos]);
        result.push_str(&shapetype_xml);
        result.push_str(&shapes);
        result.push_str("</xml>\n");
        result.into_bytes()
    } else {
        // Malformed VML; return new VML document.
        build_form_control_vml(controls, start_shape_id).into_bytes()
    }
}

impl FormControlInfo {
    /// Convert a parsed `FormControlInfo` back to a `FormControlConfig`.
    ///
    /// This is used during VML hydration to reconstruct the config list from
    /// existing VML data so that subsequent add/delete operations work correctly.
    pub fn to_config(&self) -> FormControlConfig {
        FormControlConfig {
            control_type: self.control_type.clone(),
            cell: self.cell.clone(),
            width: None,
            height: None,
            text: self.text.clone(),
            macro_name: self.macro_name.clone(),
            cell_link: self.cell_link.clone(),
            checked: self.checked,
            min_value: self.min_value,
            max_value: self.max_value,
            increment: self.increment,
            page_increment: self.page_increment,
            current_value: self.current_value,
            three_d: None,
        }
    }
}

/// Count existing VML shapes in VML bytes to determine the next shape ID.
pub fn count_vml_shapes(vml_bytes: &[u8]) -> usize {
    let vml_str = String::from_utf8_lossy(vml_bytes);
    vml_str.matches("<v:shape ").count()
}

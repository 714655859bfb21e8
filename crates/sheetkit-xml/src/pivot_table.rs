//! Pivot table XML schema structures.
//!
//! Represents `xl/pivotTables/pivotTable{N}.xml` in the OOXML package.

use serde::{Deserialize, Serialize};

/// Root element for a pivot table definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "pivotTableDefinition")]
pub struct PivotTableDefinition {
    #[serde(rename = "@xmlns")]
    pub xmlns: String,

    #[serde(rename = "@name")]
    pub name: String,

    #[serde(rename = "@cacheId")]
    pub cache_id: u32,

    #[serde(rename = "@dataOnRows", skip_serializing_if = "Option::is_none")]
    pub data_on_rows: Option<bool>,

    #[serde(
        rename = "@applyNumberFormats",
        skip_serializing_if = "Option::is_none"
    )]
    pub apply_number_formats: Option<bool>,

    #[serde(
        rename = "@applyBorderFormats",
        skip_serializing_if = "Option::is_none"
    )]
    pub apply_border_formats: Option<bool>,

    #[serde(rename = "@applyFontFormats", skip_serializing_if = "Option::is_none")]
    pub apply_font_formats: Option<bool>,

    #[serde(
        rename = "@applyPatternFormats",
        skip_serializing_if = "Option::is_none"
    )]
    pub apply_pattern_formats: Option<bool>,

    #[serde(
        rename = "@applyAlignmentFormats",
        skip_serializing_if = "Option::is_none"
    )]
    pub apply_alignment_formats: Option<bool>,

    #[serde(
        rename = "@applyWidthHeightFormats",
        skip_serializing_if = "Option::is_none"
    )]
    pub apply_width_height_formats: Option<bool>,

    #[serde(rename = "location")]
    pub location: PivotLocation,

    #[serde(rename = "pivotFields")]
    pub pivot_fields: PivotFields,

    #[serde(rename = "rowFields", skip_serializing_if = "Option::is_none")]
    pub row_fields: Option<FieldList>,

    #[serde(rename = "colFields", skip_serializing_if = "Option::is_none")]
    pub col_fields: Option<FieldList>,

    #[serde(rename = "dataFields", skip_serializing_if = "Option::is_none")]
    pub data_fields: Option<DataFields>,
}

/// Location of the pivot table within the worksheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotLocation {
    #[serde(rename = "@ref")]
    pub reference: String,

    #[serde(rename = "@firstHeaderRow")]
    pub first_header_row: u32,

    #[serde(rename = "@firstDataRow")]
    pub first_data_row: u32,

    #[serde(rename = "@firstDataCol")]
    pub first_data_col: u32,
}

/// Container for pivot field definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotFields {
    #[serde(rename = "@count", skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    #[serde(rename = "pivotField", default)]
    pub fields: Vec<PivotFieldDef>,
}

/// Individual pivot field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotFieldDef {
    #[serde(rename = "@axis", skip_serializing_if = "Option::is_none")]
    pub axis: Option<String>,

    #[serde(rename = "@dataField", skip_serializing_if = "Option::is_none")]
    pub data_field: Option<bool>,

    #[serde(rename = "@showAll", skip_serializing_if = "Option::is_none")]
    pub show_all: Option<bool>,

    #[serde(rename = "items", skip_serializing_if = "Option::is_none")]
    pub items: Option<FieldItems>,
}

/// Container for field items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldItems {
    #[serde(rename = "@count", skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    #[serde(rename = "item", default)]
    pub items: Vec<FieldItem>,
}

/// Individual field item entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldItem {
    #[serde(rename = "@t", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,

    #[serde(rename = "@x", skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

/// List of field references (used for row and column fields).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldList {
    #[serde(rename = "@count", skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    #[serde(rename = "field", default)]
    pub fields: Vec<FieldRef>,
}

/// Reference to a pivot field by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRef {
    #[serde(rename = "@x")]
    pub index: i32,
}

/// Container for data fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFields {
    #[serde(rename = "@count", skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    #[serde(rename = "dataField", default)]
    pub fields: Vec<DataFieldDef>,
}

/// Individual data field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFieldDef {
    #[serde(rename = "@name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "@fld")]
    pub field_index: u32,

    #[serde(rename = "@subtotal", skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<String>,

    #[serde(rename = "@baseField", skip_serializing_if = "Option::is_none")]
    pub base_field: Option<i32>,

    #[serde(rename = "@baseItem", skip_serializing_if = "Option::is_none")]
    pub base_item: Option<u32>,
}

//! Shape insertion and management.
//!
//! Provides types for configuring preset geometry shapes in worksheets
//! and helpers for building the corresponding drawing XML structures.

use sheetkit_xml::drawing::{
    AExt, BodyPr, CNvPr, CNvSpPr, ClientData, Ln, LstStyle, MarkerType, NvSpPr, Offset, Paragraph,
    PrstGeom, RunProperties, Shape, ShapeSpPr, SolidFill, SrgbClr, TextRun, TwoCellAnchor, TxBody,
    Xfrm,
};

use crate::error::{Error, Result};
use crate::utils::cell_ref::cell_name_to_coordinates;

/// Preset geometry shape types supported by OOXML.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeType {
    Rect,
    RoundRect,
    Ellipse,
    Triangle,
    Diamond,
    Pentagon,
    Hexagon,
    Octagon,
    RightArrow,
    LeftArrow,
    UpArrow,
    DownArrow,
    LeftRightArrow,
    UpDownArrow,
    Star4,
    Star5,
    Star6,
    FlowchartProcess,
    FlowchartDecision,
    FlowchartTerminator,
    FlowchartData,
    Heart,
    Lightning,
    Plus,
    Minus,
    Cloud,
    Callout1,
    Callout2,
}

impl ShapeType {
    /// Return the OOXML preset geometry string for this shape type.
    pub fn preset_name(&self) -> &str {
        match self {
            ShapeType::Rect => "rect",
            ShapeType::RoundRect => "roundRect",
            ShapeType::Ellipse => "ellipse",
            ShapeType::Triangle => "triangle",
            ShapeType::Diamond => "diamond",
            ShapeType::Pentagon => "pentagon",
            ShapeType::Hexagon => "hexagon",
            ShapeType::Octagon => "octagon",
            ShapeType::RightArrow => "rightArrow",
            ShapeType::LeftArrow => "leftArrow",
            ShapeType::UpArrow => "upArrow",
            ShapeType::DownArrow => "downArrow",
            ShapeType::LeftRightArrow => "leftRightArrow",
            ShapeType::UpDownArrow => "upDownArrow",
            ShapeType::Star4 => "star4",
            ShapeType::Star5 => "star5",
            ShapeType::Star6 => "star6",
            ShapeType::FlowchartProcess => "flowChartProcess",
            ShapeType::FlowchartDecision => "flowChartDecision",
            ShapeType::FlowchartTerminator => "flowChartTerminator",
            ShapeType::FlowchartData => "flowChartInputOutput",
            ShapeType::Heart => "heart",
            ShapeType::Lightning => "lightningBolt",
            ShapeType::Plus => "mathPlus",
            ShapeType::Minus => "mathMinus",
            ShapeType::Cloud => "cloud",
            ShapeType::Callout1 => "wedgeRectCallout",
            ShapeType::Callout2 => "wedgeRoundRectCallout",
        }
    }

    /// Parse a string into a `ShapeType`.
    ///
    /// Accepts both the camelCase OOXML preset names and simplified lowercase
    /// identifiers (e.g., `"rect"`, `"roundRect"`, `"ellipse"`).
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "rect" | "rectangle" => Ok(ShapeType::Rect),
            "roundrect" | "roundedrectangle" => Ok(ShapeType::RoundRect),
            "ellipse" | "circle" | "oval" => Ok(ShapeType::Ellipse),
            "triangle" => Ok(ShapeType::Triangle),
            "diamond" => Ok(ShapeType::Diamond),
            "pentagon" => Ok(ShapeType::Pentagon),
            "hexagon" => Ok(ShapeType::Hexagon),
            "octagon" => Ok(ShapeType::Octagon),
            "rightarrow" => Ok(ShapeType::RightArrow),
            "leftarrow" => Ok(ShapeType::LeftArrow),
            "uparrow" => Ok(ShapeType::UpArrow),
            "downarrow" => Ok(ShapeType::DownArrow),
            "leftrightarrow" => Ok(ShapeType::LeftRightArrow),
            "updownarrow" => Ok(ShapeType::UpDownArrow),
            "star4" => Ok(ShapeType::Star4),
            "star5" => Ok(ShapeType::Star5),
            "star6" => Ok(ShapeType::Star6),
            "flowchartprocess" => Ok(ShapeType::FlowchartProcess),
            "flowchartdecision" => Ok(ShapeType::FlowchartDecision),
            "flowchartterminator" => Ok(ShapeType::FlowchartTerminator),
            "flowchartdata" => Ok(ShapeType::FlowchartData),
            "heart" => Ok(ShapeType::Heart),
            "lightning" | "lightningbolt" => Ok(ShapeType::Lightning),
            "plus" | "mathplus" => Ok(ShapeType::Plus),
            "minus" | "mathminus" => Ok(ShapeType::Minus),
            "cloud" => Ok(ShapeType::Cloud),
            "callout1" | "wedgerectcallout" => Ok(ShapeType::Callout1),
            "callout2" | "wedgeroundrectcallout" => Ok(ShapeType::Callout2),
            _ => Err(Error::Internal(format!("unknown shape type: {s}"))),
        }
    }
}

/// Configuration for inserting a shape into a worksheet.
#[derive(Debug, Clone)]
pub struct ShapeConfig {
    /// Preset geometry shape type.
    pub shape_type: ShapeType,
    /// Top-left anchor cell (e.g., `"B2"`).
    pub from_cell: String,
    /// Bottom-right anchor cell (e.g., `"F10"`).
    pub to_cell: String,
    /// Optional text content displayed inside the shape.
    pub text: Option<String>,
    /// Optional fill color as a hex string (e.g., `"4472C4"`).
    pub fill_color: Option<String>,
    /// Optional line/border color as a hex string (e.g., `"2F528F"`).
    pub line_color: Option<String>,
    /// Optional line width in points. Converted to EMU internally.
    pub line_width: Option<f64>,
}

/// Points-to-EMU conversion factor. 1 point = 12700 EMU.
const EMU_PER_POINT: f64 = 12700.0;

/// Build a `TwoCellAnchor` containing a shape.
///
/// The shape spans from `config.from_cell` to `config.to_cell`. An
/// incrementing `shape_id` is used for the non-visual properties.
pub fn build_shape_anchor(config: &ShapeConfig, shape_id: u32) -> Result<TwoCellAnchor> {
    let (from_col, from_row) = cell_name_to_coordinates(&config.from_cell)?;
    let (to_col, to_row) = cell_name_to_coordinates(&config.to_cell)?;

    let from_marker = MarkerType {
        col: from_col - 1,
        col_off: 0,
        row: from_row - 1,
        row_off: 0,
    };
    let to_marker = MarkerType {
        col: to_col - 1,
        col_off: 0,
        row: to_row - 1,
        row_off: 0,
    };

    let solid_fill = config.fill_color.as_ref().map(|color| SolidFill {
        srgb_clr: SrgbClr { val: color.clone() },
    });

    let ln = if config.line_color.is_some() || config.line_width.is_some() {
        Some(Ln {
            w: config.line_width.map(|pts| (pts * EMU_PER_POINT) as u64),
            solid_fill: config.line_color.as_ref().map(|color| SolidFill {
                srgb_clr: SrgbClr { val: color.clone() },
            }),
        })
    } else {
        None
    };

    let tx_body = config.text.as_ref().map(|text| TxBody {
        body_pr: BodyPr {},
        lst_style: LstStyle {},
        paragraphs: vec![Paragraph {
            runs: vec![TextRun {
                r_pr: Some(RunProperties {
                    lang: Some("en-US".to_string()),
                    sz: None,
                }),
                t: text.clone(),
            }],
        }],
    });

    let shape = Shape {
        nv_sp_pr: NvSpPr {
            c_nv_pr: CNvPr {
                id: shape_id,
                name: format!("Shape {}", shape_id),
            },
            c_nv_sp_pr: CNvSpPr {},
        },
        sp_pr: ShapeSpPr {
            xfrm: Xfrm {
                off: Offset { x: 0, y: 0 },
                ext: AExt { cx: 0, cy: 0 },
            },
            prst_geom: PrstGeom {
                prst: config.shape_type.preset_name().to_string(),
            },
            solid_fill,
            ln,
        },
        tx_body,
    };

    Ok(TwoCellAnchor {
        from: from_marker,
        to: to_marker,
        graphic_frame: None,
        pic: None,
        shape: Some(shape),
        client_data: ClientData {},
    })
}

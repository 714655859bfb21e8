//! Sparkline creation and management.

use crate::error::{Error, Result};

/// Sparkline type.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SparklineType {
    /// Line sparkline (default).
    #[default]
    Line,
    /// Column (bar) sparkline.
    Column,
    /// Win/Loss sparkline.
    WinLoss,
}

impl SparklineType {
    /// Return the OOXML string representation.
    pub fn as_str(&self) -> &str {
        match self {
            SparklineType::Line => "line",
            SparklineType::Column => "column",
            SparklineType::WinLoss => "stacked",
        }
    }

    /// Parse from OOXML string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "line" => Some(SparklineType::Line),
            "column" => Some(SparklineType::Column),
            "stacked" | "winloss" => Some(SparklineType::WinLoss),
            _ => None,
        }
    }
}

/// Configuration for creating a sparkline group.
#[derive(Debug, Clone)]
pub struct SparklineConfig {
    /// Data source range (e.g., "Sheet1!A1:A10").
    pub data_range: String,
    /// Cell where the sparkline is rendered (e.g., "B1").
    pub location: String,
    /// Sparkline type.
    pub sparkline_type: SparklineType,
    /// Show data markers.
    pub markers: bool,
    /// Highlight high point.
    pub high_point: bool,
    /// Highlight low point.
    pub low_point: bool,
    /// Highlight first point.
    pub first_point: bool,
    /// Highlight last point.
    pub last_point: bool,
    /// Highlight negative values.
    pub negative_points: bool,
    /// Show horizontal axis.
    pub show_axis: bool,
    /// Line weight in points (for line sparklines).
    pub line_weight: Option<f64>,
    /// Style preset index (0-35).
    pub style: Option<u32>,
}

impl SparklineConfig {
    /// Create a simple sparkline config.
    pub fn new(data_range: &str, location: &str) -> Self {
        Self {
            data_range: data_range.to_string(),
            location: location.to_string(),
            sparkline_type: SparklineType::Line,
            markers: false,
            high_point: false,
            low_point: false,
            first_point: false,
            last_point: false,
            negative_points: false,
            show_axis: false,
            line_weight: None,
            style: None,
        }
    }
}

/// A sparkline group configuration for adding to worksheets.
#[derive(Debug, Clone)]
pub struct SparklineGroupConfig {
    /// Sparklines in this group (all share the same settings).
    pub sparklines: Vec<SparklineConfig>,
    /// Sparkline type for the group.
    pub sparkline_type: SparklineType,
    /// Show data markers.
    pub markers: bool,
    /// Highlight high point.
    pub high_point: bool,
    /// Highlight low point.
    pub low_point: bool,
    /// Line weight in points.
    pub line_weight: Option<f64>,
}

/// Convert a SparklineConfig to the XML representation.
pub(crate) fn config_to_xml_group(
    config: &SparklineConfig,
) -> sheetkit_xml::sparkline::SparklineGroup {
    use sheetkit_xml::sparkline::*;

    SparklineGroup {
        sparkline_type: match config.sparkline_type {
            SparklineType::Line => None,
            _ => Some(config.sparkline_type.as_str().to_string()),
        },
        markers: if config.markers { Some(true) } else { None },
        high: if config.high_point { Some(true) } else { None },
        low: if config.low_point { Some(true) } else { None },
        first: if config.first_point { Some(true) } else { None },
        last: if config.last_point { Some(true) } else { None },
        negative: if config.negative_points {
            Some(true)
        } else {
            None
        },
        display_x_axis: if config.show_axis { Some(true) } else { None },
        line_weight: config.line_weight,
        min_axis_type: None,
        max_axis_type: None,
        sparklines: SparklineList {
            items: vec![Sparkline {
                formula: config.data_range.clone(),
                sqref: config.location.clone(),
            }],
        },
    }
}

/// Validate a sparkline configuration.
pub fn validate_sparkline_config(config: &SparklineConfig) -> Result<()> {
    if config.data_range.is_empty() {
        return Err(Error::Internal("sparkline data range is empty".to_string()));
    }
    if config.location.is_empty() {
        return Err(Error::Internal("sparkline location is empty".to_string()));
    }
    if let Some(weight) = config.line_weight {
        if weight <= 0.0 {
            return Err(Error::Internal(
                "sparkline line weight must be positive".to_string(),
            ));
        }
    }
    if let Some(style) = config.style {
        if style > 35 {
            return Err(Error::Internal(format!(
                "sparkline style {} out of range (0-35)",
                style
            )));
        }
    }
    Ok(())
}

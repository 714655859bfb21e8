//! Comments XML schema structures.
//!
//! Represents `xl/comments{N}.xml` in the OOXML package.

use serde::{Deserialize, Serialize};

use crate::namespaces;

/// Comments root element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "comments")]
pub struct Comments {
    #[serde(rename = "@xmlns")]
    pub xmlns: String,

    #[serde(rename = "authors")]
    pub authors: Authors,

    #[serde(rename = "commentList")]
    pub comment_list: CommentList,
}

/// Authors container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authors {
    #[serde(rename = "author", default)]
    pub authors: Vec<String>,
}

/// Comment list container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentList {
    #[serde(rename = "comment", default)]
    pub comments: Vec<Comment>,
}

/// Individual comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "@ref")]
    pub r#ref: String,

    #[serde(rename = "@authorId")]
    pub author_id: u32,

    #[serde(rename = "text")]
    pub text: CommentText,
}

/// Comment text content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentText {
    #[serde(rename = "r", default)]
    pub runs: Vec<CommentRun>,
}

/// A text run within a comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRun {
    #[serde(rename = "rPr", skip_serializing_if = "Option::is_none")]
    pub rpr: Option<CommentRunProperties>,

    #[serde(rename = "t")]
    pub t: String,
}

/// Run properties for comment text formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRunProperties {
    #[serde(rename = "b", skip_serializing_if = "Option::is_none")]
    pub b: Option<BoldFlag>,

    #[serde(rename = "sz", skip_serializing_if = "Option::is_none")]
    pub sz: Option<FontSize>,
}

/// Bold flag element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoldFlag;

/// Font size element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSize {
    #[serde(rename = "@val")]
    pub val: f64,
}

impl Default for Comments {
    fn default() -> Self {
        Self {
            xmlns: namespaces::SPREADSHEET_ML.to_string(),
            authors: Authors {
                authors: Vec::new(),
            },
            comment_list: CommentList {
                comments: Vec::new(),
            },
        }
    }
}

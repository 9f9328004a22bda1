//! Line-record encoding of annotated documents.
//!
//! Each line becomes `{"text": ..., "tags": {"<tag name>": true, ...}}`.
//! Tag names follow a small grammar:
//!
//! ```text
//! bold | italic | underline | color_<value> | family_<name> | size_<integer>
//! ```

use crate::document::{AnnotatedDocument, StyledLine, TagSpec};
use ctxhelp_common::{HelpError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const COLOR_PREFIX: &str = "color_";
const FAMILY_PREFIX: &str = "family_";
const SIZE_PREFIX: &str = "size_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRecord {
    pub text: String,
    #[serde(default)]
    pub tags: BTreeMap<String, bool>,
}

impl TagSpec {
    pub fn tag_name(&self) -> String {
        match self {
            TagSpec::Bold => "bold".to_string(),
            TagSpec::Italic => "italic".to_string(),
            TagSpec::Underline => "underline".to_string(),
            TagSpec::Color(color) => format!("{}{}", COLOR_PREFIX, color),
            TagSpec::FontFamily(family) => format!("{}{}", FAMILY_PREFIX, family),
            TagSpec::FontSize(size) => format!("{}{}", SIZE_PREFIX, size),
        }
    }

    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "bold" => return Ok(TagSpec::Bold),
            "italic" => return Ok(TagSpec::Italic),
            "underline" => return Ok(TagSpec::Underline),
            _ => {}
        }

        if let Some(color) = name.strip_prefix(COLOR_PREFIX) {
            if color.is_empty() {
                return Err(HelpError::malformed_tag(name, "missing color value"));
            }
            Ok(TagSpec::Color(color.to_string()))
        } else if let Some(family) = name.strip_prefix(FAMILY_PREFIX) {
            if family.is_empty() {
                return Err(HelpError::malformed_tag(name, "missing font family"));
            }
            Ok(TagSpec::FontFamily(family.to_string()))
        } else if let Some(size) = name.strip_prefix(SIZE_PREFIX) {
            size.parse::<i32>()
                .map(TagSpec::FontSize)
                .map_err(|e| HelpError::malformed_tag(name, format!("invalid font size: {}", e)))
        } else {
            Err(HelpError::malformed_tag(name, "unknown tag"))
        }
    }
}

pub fn encode_line(line: &StyledLine) -> LineRecord {
    LineRecord {
        text: line.text().to_string(),
        tags: line
            .normalized_tags()
            .into_iter()
            .map(|tag| (tag.tag_name(), true))
            .collect(),
    }
}

/// Encode a document, keeping only the last applied family and size per line
pub fn encode(document: &AnnotatedDocument) -> Vec<LineRecord> {
    document.lines().iter().map(encode_line).collect()
}

pub fn decode_line(record: &LineRecord) -> Result<StyledLine> {
    let mut line = StyledLine::new(record.text.clone());
    for (name, enabled) in &record.tags {
        if *enabled {
            line.apply(TagSpec::parse(name)?);
        }
    }
    Ok(line)
}

pub fn decode(records: &[LineRecord]) -> Result<AnnotatedDocument> {
    records
        .iter()
        .map(decode_line)
        .collect::<Result<Vec<_>>>()
        .map(AnnotatedDocument::from_lines)
}

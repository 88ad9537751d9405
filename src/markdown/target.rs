//! Patch target strings and the identifiers they are built from.

use crate::markdown::element::{Element, ElementKind};
use crate::markdown::error::TargetError;
use crate::markdown::tree::Node;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Nesting delimiter of the human/tool-facing form.
pub const HUMAN_DELIMITER: &str = " -> ";
/// Nesting delimiter expected by the REST API.
pub const WIRE_DELIMITER: &str = "::";

const HEADING_PREFIX: &str = "heading:";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatchOperation {
    Append,
    Prepend,
    Replace,
}

impl PatchOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatchOperation::Append => "append",
            PatchOperation::Prepend => "prepend",
            PatchOperation::Replace => "replace",
        }
    }
}

impl FromStr for PatchOperation {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "append" => Ok(PatchOperation::Append),
            "prepend" => Ok(PatchOperation::Prepend),
            "replace" => Ok(PatchOperation::Replace),
            other => Err(TargetError::invalid_operation(other)),
        }
    }
}

impl Display for PatchOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetType {
    Heading,
    Block,
    Frontmatter,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Heading => "heading",
            TargetType::Block => "block",
            TargetType::Frontmatter => "frontmatter",
        }
    }
}

impl FromStr for TargetType {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heading" => Ok(TargetType::Heading),
            "block" => Ok(TargetType::Block),
            "frontmatter" => Ok(TargetType::Frontmatter),
            other => Err(TargetError::invalid_target_type(other)),
        }
    }
}

impl Display for TargetType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-form target of a heading node: the heading titles along its path
/// joined with `" -> "`. Non-heading nodes have no target.
pub fn format_target(node: Node<'_>) -> Option<String> {
    if !node.element().is_heading() {
        return None;
    }

    let titles: Vec<&str> = node
        .path()
        .iter()
        .filter_map(|segment| segment.strip_prefix(HEADING_PREFIX))
        .filter(|title| !title.is_empty())
        .collect();

    if titles.is_empty() {
        return Some(node.element().title.clone());
    }

    Some(titles.join(HUMAN_DELIMITER))
}

pub fn to_wire(target: &str) -> String {
    target.replace(HUMAN_DELIMITER, WIRE_DELIMITER)
}

pub fn to_human(target: &str) -> String {
    target.replace(WIRE_DELIMITER, HUMAN_DELIMITER)
}

/// Split a target in either form into trimmed, non-empty segments.
pub fn split_target(target: &str) -> Vec<String> {
    to_wire(target)
        .split(WIRE_DELIMITER)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Clean up a raw target for the given type before it is sent out. Heading
/// targets are converted to the wire form.
pub fn normalize_target(target_type: TargetType, target: &str) -> String {
    match target_type {
        TargetType::Heading => to_wire(target).trim().to_string(),
        TargetType::Block | TargetType::Frontmatter => target.trim().to_string(),
    }
}

/// Block ID (`^id`) of an element: the first line starting with a caret.
pub fn extract_block_id(element: &Element) -> Option<String> {
    element.content.lines().find_map(|line| {
        let id: String = line
            .trim()
            .strip_prefix('^')?
            .chars()
            .take_while(|c| !c.is_whitespace())
            .collect();

        (!id.is_empty()).then_some(id)
    })
}

/// `name: value` pairs of a frontmatter body. Later duplicates win.
pub fn extract_frontmatter_fields(content: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }

        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            if !name.is_empty() {
                fields.insert(name.to_string(), value.trim().to_string());
            }
        }
    }

    fields
}

/// Frontmatter fields of the document's frontmatter element, if any.
pub fn document_frontmatter(elements: &[Element]) -> BTreeMap<String, String> {
    elements
        .iter()
        .filter(|element| element.kind == ElementKind::Frontmatter)
        .flat_map(|element| extract_frontmatter_fields(&element.content))
        .collect()
}

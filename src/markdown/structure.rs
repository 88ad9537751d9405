//! Patch-target discovery for a whole document.

use crate::markdown::element::{Element, ElementKind};
use crate::markdown::target::{extract_block_id, extract_frontmatter_fields, format_target};
use crate::markdown::tree::{Forest, Node};
use serde::Serialize;

pub const DEFAULT_MAX_DEPTH: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BlockTarget {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub block_id: String,
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FrontmatterTarget {
    pub field: String,
    pub value: String,
    pub line: usize,
}

/// Everything that can be addressed by a patch in one document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StructureSummary {
    pub filepath: String,
    pub headings: Vec<String>,
    pub blocks: Vec<BlockTarget>,
    pub frontmatter: Vec<FrontmatterTarget>,
    pub summary: String,
}

/// Collect the patch targets of `forest`.
///
/// Sub-headings of a heading are listed when `max_depth` is 0 or the
/// heading's level is below `max_depth`.
pub fn discover(filepath: impl Into<String>, forest: &Forest, max_depth: usize) -> StructureSummary {
    let mut headings = Vec::new();
    for root in forest.roots() {
        collect_headings(root, max_depth, &mut headings);
    }

    let blocks = forest
        .iter()
        .map(|node| node.element())
        .filter(|element| element.kind.is_block_eligible())
        .filter_map(block_target)
        .collect();

    // Fields come out of a BTreeMap, so they are already sorted by name.
    let frontmatter = forest
        .iter()
        .map(|node| node.element())
        .filter(|element| element.kind == ElementKind::Frontmatter)
        .flat_map(|element| {
            extract_frontmatter_fields(&element.content)
                .into_iter()
                .map(move |(field, value)| FrontmatterTarget {
                    field,
                    value,
                    line: element.line,
                })
        })
        .collect();

    StructureSummary {
        filepath: filepath.into(),
        headings,
        blocks,
        frontmatter,
        summary: summarize(forest.iter().map(|node| node.element())),
    }
}

fn collect_headings(node: Node<'_>, max_depth: usize, targets: &mut Vec<String>) {
    if !node.element().is_heading() {
        return;
    }

    if let Some(target) = format_target(node) {
        targets.push(target);
    }

    if max_depth == 0 || node.element().level < max_depth {
        for child in node.children() {
            collect_headings(child, max_depth, targets);
        }
    }
}

fn block_target(element: &Element) -> Option<BlockTarget> {
    let block_id = extract_block_id(element)?;
    let content = element.content.trim();

    Some(BlockTarget {
        kind: element.kind,
        block_id,
        line: element.line,
        content: (!content.is_empty()).then(|| content.to_string()),
    })
}

/// Element counts such as `"2 heading(s), 1 paragraph(s)"`, or `"Empty file"`.
pub fn summarize<'a>(elements: impl IntoIterator<Item = &'a Element>) -> String {
    let mut counts = [0usize; 5];
    for element in elements {
        let slot = match element.kind {
            ElementKind::Heading => 0,
            ElementKind::Paragraph => 1,
            ElementKind::List => 2,
            ElementKind::CodeBlock => 3,
            ElementKind::Table => 4,
            _ => continue,
        };
        counts[slot] += 1;
    }

    let labels = ["heading(s)", "paragraph(s)", "list(s)", "code block(s)", "table(s)"];
    let parts: Vec<String> = counts
        .iter()
        .zip(labels)
        .filter(|(count, _)| **count > 0)
        .map(|(count, label)| format!("{} {}", count, label))
        .collect();

    if parts.is_empty() {
        "Empty file".to_string()
    } else {
        parts.join(", ")
    }
}

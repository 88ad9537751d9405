//! Plain-text rendering of tool results.

use crate::markdown::element::Element;
use crate::markdown::headings::HeadingInfo;
use crate::markdown::select::Selector;
use crate::markdown::target::{PatchOperation, TargetType, format_target};
use crate::markdown::tree::Node;
use crate::vault::types::FileInfo;
use serde::Serialize;
use serde_json::{Map, Value};

const INDENT: &str = "  ";

#[derive(Debug, Serialize)]
pub struct DirectoryListing<'a> {
    pub directory: &'a str,
    pub max_depth: usize,
    pub total_items: usize,
    pub items: &'a [FileInfo],
}

pub fn connection(base_url: &str) -> String {
    format!("Successfully connected to Obsidian!\n\nConfiguration:\n  URL: {}\n", base_url)
}

pub fn vault_files(files: &[FileInfo]) -> String {
    let mut out = String::from("Files in Obsidian Vault:\n\n");
    if files.is_empty() {
        out.push_str("No files found in the vault.\n");
    }

    for (index, file) in files.iter().enumerate() {
        let suffix = if file.is_dir() { "/" } else { "" };
        out.push_str(&format!("{}. {}{}\n", index + 1, file.path, suffix));
    }

    out
}

pub fn directory_listing(directory: &str, max_depth: usize, items: &[FileInfo]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&DirectoryListing {
        directory,
        max_depth,
        total_items: items.len(),
        items,
    })
}

pub fn file_contents(filepath: &str, content: &str) -> String {
    format!("File: {}\n\n{}", filepath, content)
}

pub fn headings(filepath: &str, headings: &[HeadingInfo]) -> String {
    let mut out = format!("Headings in file: {}\n\n", filepath);
    if headings.is_empty() {
        out.push_str("No headings found in the file.\n");
    }

    for (index, heading) in headings.iter().enumerate() {
        out.push_str(&format!(
            "{}. {}{} (Level {}, Line {})\n",
            index + 1,
            INDENT.repeat(heading.level.saturating_sub(1)),
            heading.title,
            heading.level,
            heading.line
        ));
    }

    out
}

pub fn heading_content(filepath: &str, heading: &HeadingInfo) -> String {
    format!(
        "Content under heading '{}' in file: {}\n\n{}",
        heading.title, filepath, heading.content
    )
}

pub fn heading_not_found(filepath: &str, query: &str, headings: &[HeadingInfo]) -> String {
    let mut out = format!("Heading '{}' not found in file: {}\n\nAvailable headings:\n", query, filepath);

    for (index, heading) in headings.iter().enumerate() {
        out.push_str(&format!(
            "{}. {}{} {}\n",
            index + 1,
            INDENT.repeat(heading.level.saturating_sub(1)),
            "#".repeat(heading.level),
            heading.title
        ));
    }

    out
}

/// Content of a resolved heading path, including everything nested below it.
pub fn nested_content(filepath: &str, nested_path: &str, node: Node<'_>) -> String {
    let mut out = format!("Nested Content for: {}\nFile: {}\n\nFound content:\n\n", nested_path, filepath);

    if let Some(target) = format_target(node) {
        out.push_str("PATCH TARGET: Use this exact target for patch_content operations:\n");
        out.push_str(&format!("Target: \"{}\"\n\n", target));
    }

    write_subtree(&mut out, node, 0);
    out
}

fn write_subtree(out: &mut String, node: Node<'_>, depth: usize) {
    let indent = INDENT.repeat(depth);
    let element = node.element();

    out.push_str(&format!("{}{}\n", indent, header(element)));
    if !element.content.is_empty() {
        out.push_str(&format!(
            "{indent}  Content:\n{indent}  ```\n{}\n{indent}  ```\n",
            element.content
        ));
    }

    for child in node.children() {
        write_subtree(out, child, depth + 1);
    }
}

/// Heading titles of `roots` and everything below them, one per line.
pub fn heading_outline<'a>(roots: impl Iterator<Item = Node<'a>>) -> String {
    let mut out = String::new();
    for root in roots {
        write_heading_outline(&mut out, root, 0);
    }
    out
}

fn write_heading_outline(out: &mut String, node: Node<'_>, depth: usize) {
    if !node.element().is_heading() {
        return;
    }

    out.push_str(&format!("{}{}\n", INDENT.repeat(depth), node.element().title));
    for child in node.children() {
        write_heading_outline(out, child, depth + 1);
    }
}

/// A failed lookup: the error message followed by the document's heading
/// outline.
pub fn not_found<'a>(message: &str, roots: impl Iterator<Item = Node<'a>>) -> String {
    let outline = heading_outline(roots);
    if outline.is_empty() {
        return format!("{}\n\nThe file has no headings.\n", message);
    }

    format!("{}\n\nAvailable paths:\n{}", message, outline)
}

pub fn read_content<'a>(
    filepath: &str,
    selector_type: &str,
    selector: &Selector,
    matches: &[Node<'_>],
    roots: impl Iterator<Item = Node<'a>>,
) -> String {
    let mut out = format!("Content from {} (Selector: {}", filepath, selector_type);
    if !selector.query.is_empty() {
        out.push_str(&format!(", Query: {}", selector.query));
    }
    if selector.level > 0 {
        out.push_str(&format!(", Level: {}", selector.level));
    }
    out.push_str(")\n\n");

    if matches.is_empty() {
        out.push_str("No content found matching the selector.\n\nAvailable elements:\n");
        for root in roots {
            write_outline(&mut out, root, 0);
        }
        return out;
    }

    out.push_str(&format!("Found {} matching element(s):\n\n", matches.len()));
    for (index, node) in matches.iter().enumerate() {
        let element = node.element();
        out.push_str(&format!("--- Element {}: {} ---\n", index + 1, element.kind));
        if !element.title.is_empty() {
            out.push_str(&format!("Title: {}\n", element.title));
        }
        if element.level > 1 {
            out.push_str(&format!("Level: {}\n", element.level));
        }
        if !element.content.is_empty() {
            out.push_str(&format!("Content:\n```markdown\n{}\n```\n", element.content));
        }
        if element.is_heading() && node.has_children() {
            out.push_str("Nested content:\n");
            for child in node.children() {
                write_outline(&mut out, child, 1);
            }
        }
        out.push('\n');
    }

    out
}

/// One line per element with its description, content in a fenced block.
fn write_outline(out: &mut String, node: Node<'_>, depth: usize) {
    let indent = INDENT.repeat(depth);
    let element = node.element();

    out.push_str(&format!("{}{} - {}\n", indent, header(element), element.description()));
    if !element.content.is_empty() {
        out.push_str(&format!("{indent}    Content:\n{indent}```\n{}\n{indent}```\n", element.content));
    }

    for child in node.children() {
        write_outline(out, child, depth + 1);
    }
}

/// `kind: title (Level n) (Line n)`
fn header(element: &Element) -> String {
    let mut header = element.kind.to_string();
    if !element.title.is_empty() {
        header.push_str(&format!(": {}", element.title));
    }
    if element.level > 1 {
        header.push_str(&format!(" (Level {})", element.level));
    }
    header.push_str(&format!(" (Line {})", element.line));
    header
}

pub fn patched(
    filepath: &str,
    operation: PatchOperation,
    target_type: TargetType,
    target: &str,
    content: &str,
) -> String {
    format!(
        "Successfully patched content in {}\n\nOperation: {}\nTarget Type: {}\nTarget: {}\nContent:\n{}",
        filepath, operation, target_type, target, content
    )
}

pub fn patch_failed(
    filepath: &str,
    error: &str,
    operation: PatchOperation,
    target_type: TargetType,
    target: &str,
    content_len: usize,
) -> String {
    format!(
        "failed to patch content in {}: {}\n\nDebug info:\n- File: {}\n- Operation: {}\n- Target Type: {}\n- Target: '{}'\n- Content length: {} chars",
        filepath, error, filepath, operation, target_type, target, content_len
    )
}

pub fn frontmatter(filepath: &str, frontmatter: &Map<String, Value>) -> Result<String, serde_json::Error> {
    Ok(format!(
        "Frontmatter for {}: {}",
        filepath,
        serde_json::to_string_pretty(frontmatter)?
    ))
}

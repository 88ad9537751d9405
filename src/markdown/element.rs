use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Category of a classified markdown construct.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Heading,
    Paragraph,
    List,
    CodeBlock,
    Table,
    Blockquote,
    Link,
    Image,
    Frontmatter,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Heading => "heading",
            ElementKind::Paragraph => "paragraph",
            ElementKind::List => "list",
            ElementKind::CodeBlock => "code_block",
            ElementKind::Table => "table",
            ElementKind::Blockquote => "blockquote",
            ElementKind::Link => "link",
            ElementKind::Image => "image",
            ElementKind::Frontmatter => "frontmatter",
        }
    }

    /// Kinds that may carry a `^block-id` reference.
    pub fn is_block_eligible(&self) -> bool {
        matches!(
            self,
            ElementKind::Paragraph | ElementKind::CodeBlock | ElementKind::Table | ElementKind::List
        )
    }
}

impl Display for ElementKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified markdown construct.
///
/// `level` is only meaningful for headings (0 otherwise). `line` is 1-based.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub level: usize,
    pub title: String,
    pub content: String,
    pub line: usize,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl Element {
    pub fn new(kind: ElementKind, line: usize) -> Self {
        Self {
            kind,
            level: 0,
            title: String::new(),
            content: String::new(),
            line,
            attributes: BTreeMap::new(),
        }
    }

    pub fn heading(level: usize, title: impl Into<String>, line: usize) -> Self {
        Self {
            level,
            title: title.into(),
            ..Self::new(ElementKind::Heading, line)
        }
    }

    pub fn is_heading(&self) -> bool {
        self.kind == ElementKind::Heading
    }

    /// Segment used in nested paths: `"<kind>:<title>"`.
    pub fn path_segment(&self) -> String {
        format!("{}:{}", self.kind, self.title)
    }

    /// Human readable description of the element, used by renderers.
    pub fn description(&self) -> String {
        match self.kind {
            ElementKind::Heading => heading_level_description(self.level).to_string(),
            ElementKind::Paragraph => "Text content block".to_string(),
            ElementKind::List => "List of items".to_string(),
            ElementKind::CodeBlock => match self.attributes.get("language") {
                Some(language) if !language.is_empty() => {
                    format!("Code block in {} language", language)
                }
                _ => "Code block".to_string(),
            },
            ElementKind::Table => "Data table".to_string(),
            ElementKind::Blockquote => "Quoted text".to_string(),
            ElementKind::Link => "External or internal link".to_string(),
            ElementKind::Image => "Image or media file".to_string(),
            ElementKind::Frontmatter => "Document properties".to_string(),
        }
    }
}

pub fn heading_level_description(level: usize) -> &'static str {
    match level {
        1 => "Main document title",
        2 => "Major section",
        3 => "Subsection",
        4 => "Sub-subsection",
        5 => "Minor subsection",
        _ => "Deep subsection",
    }
}

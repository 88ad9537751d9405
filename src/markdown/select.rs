//! Content queries over a parsed document.

use crate::markdown::element::{Element, ElementKind};
use crate::markdown::error::TargetError;
use crate::markdown::target::{extract_block_id, extract_frontmatter_fields};
use crate::markdown::tree::{Forest, Node};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectorType {
    Heading,
    Block,
    Frontmatter,
}

impl FromStr for SelectorType {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heading" => Ok(SelectorType::Heading),
            "block" => Ok(SelectorType::Block),
            "frontmatter" => Ok(SelectorType::Frontmatter),
            other => Err(TargetError::invalid_target_type(other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    pub kind: SelectorType,
    /// Empty selects every element of the category.
    pub query: String,
    /// Heading level filter, 0 for any. Ignored for other categories.
    pub level: usize,
    /// Case-insensitive equality instead of substring matching.
    pub exact: bool,
}

impl Selector {
    pub fn new(kind: SelectorType, query: impl Into<String>) -> Self {
        Self {
            kind,
            query: query.into(),
            level: 0,
            exact: false,
        }
    }

    pub fn matches(&self, element: &Element) -> bool {
        match self.kind {
            SelectorType::Heading => {
                element.is_heading()
                    && (self.level == 0 || element.level == self.level)
                    && self.matches_text(&element.title)
            }
            SelectorType::Block => {
                element.kind.is_block_eligible()
                    && (self.query.is_empty()
                        || extract_block_id(element).is_some_and(|id| self.matches_text(&id))
                        || self.matches_text(&element.content))
            }
            SelectorType::Frontmatter => {
                element.kind == ElementKind::Frontmatter
                    && (self.query.is_empty()
                        || extract_frontmatter_fields(&element.content)
                            .iter()
                            .any(|(name, value)| self.matches_text(name) || self.matches_text(value)))
            }
        }
    }

    fn matches_text(&self, text: &str) -> bool {
        if self.query.is_empty() {
            return true;
        }

        let text = text.to_lowercase();
        let query = self.query.to_lowercase();
        if self.exact { text == query } else { text.contains(&query) }
    }
}

/// Every node in document order whose element satisfies `selector`.
pub fn select<'a>(forest: &'a Forest, selector: &Selector) -> Vec<Node<'a>> {
    forest
        .iter()
        .filter(|node| selector.matches(node.element()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::classifier::classify;

    const NOTE: &str = "---\nstatus: Draft\ntags: rust\n---\n# Guide\nIntro text ^intro\n\n## Install\n- step one\n- step two\n^steps\n\n```sh\ncargo build\n```\n## Usage\n| a | b |";

    fn titles(nodes: &[Node<'_>]) -> Vec<String> {
        nodes.iter().map(|node| node.element().title.clone()).collect()
    }

    #[test]
    fn should_select_headings_by_level_and_query() {
        let forest = Forest::build(&classify(NOTE));

        let all = select(&forest, &Selector::new(SelectorType::Heading, ""));
        assert_eq!(vec!["Guide", "Install", "Usage"], titles(&all));

        let mut selector = Selector::new(SelectorType::Heading, "");
        selector.level = 2;
        assert_eq!(vec!["Install", "Usage"], titles(&select(&forest, &selector)));

        let found = select(&forest, &Selector::new(SelectorType::Heading, "INST"));
        assert_eq!(vec!["Install"], titles(&found));
    }

    #[test]
    fn exact_heading_match_ignores_case_only() {
        let forest = Forest::build(&classify(NOTE));
        let mut selector = Selector::new(SelectorType::Heading, "usage");
        selector.exact = true;
        assert_eq!(1, select(&forest, &selector).len());

        selector.query = "usa".to_string();
        assert!(select(&forest, &selector).is_empty());
    }

    #[test]
    fn should_select_blocks_by_id_or_content() {
        let forest = Forest::build(&classify(NOTE));

        let all = select(&forest, &Selector::new(SelectorType::Block, ""));
        let kinds: Vec<ElementKind> = all.iter().map(|node| node.element().kind).collect();
        assert_eq!(
            vec![
                ElementKind::Paragraph,
                ElementKind::List,
                ElementKind::Paragraph,
                ElementKind::CodeBlock,
                ElementKind::Table
            ],
            kinds
        );

        let mut by_id = Selector::new(SelectorType::Block, "steps");
        by_id.exact = true;
        let found = select(&forest, &by_id);
        assert_eq!(1, found.len());
        assert_eq!("^steps", found[0].element().content);

        let by_content = select(&forest, &Selector::new(SelectorType::Block, "cargo"));
        assert_eq!(ElementKind::CodeBlock, by_content[0].element().kind);
    }

    #[test]
    fn should_select_frontmatter_by_field_or_value() {
        let forest = Forest::build(&classify(NOTE));

        assert_eq!(1, select(&forest, &Selector::new(SelectorType::Frontmatter, "")).len());
        assert_eq!(1, select(&forest, &Selector::new(SelectorType::Frontmatter, "draft")).len());
        assert_eq!(1, select(&forest, &Selector::new(SelectorType::Frontmatter, "TAGS")).len());
        assert!(select(&forest, &Selector::new(SelectorType::Frontmatter, "missing")).is_empty());
    }

    #[test]
    fn should_reject_unknown_selector_type() {
        assert_eq!(
            Err(TargetError::invalid_target_type("section")),
            "section".parse::<SelectorType>()
        );
    }
}

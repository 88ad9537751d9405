//! Resolution of heading paths against a [`Forest`].
//!
//! Segments are compared against heading titles with a fixed list of rules.
//! Within one set of sibling candidates a rule is tried against every
//! candidate before the next, weaker rule is considered, so an exact match
//! always wins over an earlier fuzzy one.

use crate::markdown::error::TargetError;
use crate::markdown::target::{HUMAN_DELIMITER, format_target, split_target, to_wire};
use crate::markdown::tree::{Forest, Node};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResolveMode {
    /// The first segment may match any heading; every following segment must
    /// match a direct sub-heading of the previous match.
    #[default]
    Strict,
    /// Following segments may match at any depth below the previous match,
    /// and every branch is also searched one level deeper with the full
    /// remaining path.
    Permissive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MatchRule {
    /// Case-sensitive equality.
    Verbatim,
    /// Case-insensitive equality.
    IgnoreCase,
    /// Case-insensitive equality after dropping non-printable-ASCII.
    Cleaned,
    /// Cleaned title contains the cleaned segment.
    Contains,
    /// Cleaned segment contains the cleaned title.
    ContainedIn,
}

const FUZZY_RULES: [MatchRule; 4] = [
    MatchRule::IgnoreCase,
    MatchRule::Cleaned,
    MatchRule::Contains,
    MatchRule::ContainedIn,
];

const VALIDATION_RULES: [MatchRule; 2] = [MatchRule::Verbatim, MatchRule::IgnoreCase];

impl MatchRule {
    fn matches(self, title: &str, segment: &str) -> bool {
        match self {
            MatchRule::Verbatim => title.trim() == segment,
            MatchRule::IgnoreCase => title.trim().to_lowercase() == segment.to_lowercase(),
            MatchRule::Cleaned => clean(title) == clean(segment),
            MatchRule::Contains => {
                let needle = clean(segment);
                !needle.is_empty() && clean(title).contains(&needle)
            }
            MatchRule::ContainedIn => {
                let needle = clean(title);
                !needle.is_empty() && clean(segment).contains(&needle)
            }
        }
    }
}

/// Lowercased, trimmed text with every character outside printable ASCII
/// (32..=126) removed. Strips emoji and other decoration from headings.
pub fn clean(text: &str) -> String {
    text.chars()
        .filter(|c| (' '..='~').contains(c))
        .collect::<String>()
        .trim()
        .to_lowercase()
}

/// Split a user path on `" -> "` into trimmed, non-empty segments.
pub fn split_path(path: &str) -> Vec<String> {
    path.split(HUMAN_DELIMITER)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve `segments` in [`ResolveMode::Strict`].
pub fn resolve<'a, S: AsRef<str>>(
    forest: &'a Forest,
    segments: &[S],
) -> Result<Node<'a>, TargetError> {
    resolve_with(forest, segments, ResolveMode::Strict)
}

/// Resolve `segments` to a heading node.
///
/// On failure the error lists the titles of the top-level headings.
pub fn resolve_with<'a, S: AsRef<str>>(
    forest: &'a Forest,
    segments: &[S],
    mode: ResolveMode,
) -> Result<Node<'a>, TargetError> {
    let segments: Vec<&str> = segments
        .iter()
        .map(|segment| segment.as_ref().trim())
        .filter(|segment| !segment.is_empty())
        .collect();

    let found = match mode {
        ResolveMode::Strict => resolve_strict(forest, &segments),
        ResolveMode::Permissive => {
            let roots: Vec<Node<'a>> = forest.roots().collect();
            resolve_permissive(&roots, &segments)
        }
    };

    found.ok_or_else(|| {
        TargetError::not_found(
            "path",
            segments.join(HUMAN_DELIMITER),
            forest
                .roots()
                .filter(|node| node.element().is_heading())
                .map(|node| node.element().title.clone())
                .collect(),
        )
    })
}

fn resolve_strict<'a>(forest: &'a Forest, segments: &[&str]) -> Option<Node<'a>> {
    let (head, rest) = segments.split_first()?;
    let anchors: Vec<Node<'a>> = forest.headings().collect();

    first_match(&anchors, head, &FUZZY_RULES, &mut |anchor| {
        descend_children(anchor, rest, &FUZZY_RULES)
    })
}

/// Walk `segments` through direct sub-headings of `node`.
fn descend_children<'a>(node: Node<'a>, segments: &[&str], rules: &[MatchRule]) -> Option<Node<'a>> {
    let Some((head, rest)) = segments.split_first() else {
        return Some(node);
    };

    let children = sub_headings(node);
    first_match(&children, head, rules, &mut |child| {
        descend_children(child, rest, rules)
    })
}

fn resolve_permissive<'a>(nodes: &[Node<'a>], segments: &[&str]) -> Option<Node<'a>> {
    let (head, rest) = segments.split_first()?;
    let headings: Vec<Node<'a>> = nodes
        .iter()
        .copied()
        .filter(|node| node.element().is_heading())
        .collect();

    let found = first_match(&headings, head, &FUZZY_RULES, &mut |candidate| {
        if rest.is_empty() {
            Some(candidate)
        } else {
            let children: Vec<Node<'a>> = candidate.children().collect();
            resolve_permissive(&children, rest)
        }
    });
    if found.is_some() {
        return found;
    }

    nodes.iter().filter(|node| node.has_children()).find_map(|node| {
        let children: Vec<Node<'a>> = node.children().collect();
        resolve_permissive(&children, segments)
    })
}

fn sub_headings(node: Node<'_>) -> Vec<Node<'_>> {
    node.children()
        .filter(|child| child.element().is_heading())
        .collect()
}

/// Rule-major search: the first candidate matching `segment` under the
/// strongest rule for which `complete` also succeeds.
fn first_match<'a>(
    candidates: &[Node<'a>],
    segment: &str,
    rules: &[MatchRule],
    complete: &mut dyn FnMut(Node<'a>) -> Option<Node<'a>>,
) -> Option<Node<'a>> {
    for rule in rules {
        for candidate in candidates {
            if rule.matches(&candidate.element().title, segment) {
                if let Some(found) = complete(*candidate) {
                    return Some(found);
                }
            }
        }
    }

    None
}

/// Find the heading addressed by a single bare title: exact match first,
/// case-insensitive otherwise. Every heading in the document is considered.
pub fn resolve_heading_title<'a>(forest: &'a Forest, title: &str) -> Result<Node<'a>, TargetError> {
    let title = title.trim();
    let headings: Vec<Node<'a>> = forest.headings().collect();

    first_match(&headings, title, &VALIDATION_RULES, &mut |node| Some(node)).ok_or_else(|| {
        TargetError::not_found(
            "heading",
            title,
            headings
                .iter()
                .map(|node| node.element().title.clone())
                .collect(),
        )
    })
}

/// Check a heading patch target against the document and return the full
/// wire-form path of the heading it addresses, with the document's exact
/// titles substituted.
///
/// Accepts the human (`A -> B`) or wire (`A::B`) form. Nested targets are
/// anchored at any heading and must continue through direct sub-headings.
pub fn validate_heading_target(forest: &Forest, target: &str) -> Result<String, TargetError> {
    let segments = split_target(target);
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

    match segments.as_slice() {
        [] => Err(TargetError::not_found("heading", target.trim(), all_targets(forest))),
        [title] => resolve_heading_title(forest, title).map(wire_target),
        [head, rest @ ..] => {
            let anchors: Vec<Node<'_>> = forest.headings().collect();
            let found = first_match(&anchors, head, &VALIDATION_RULES, &mut |anchor| {
                descend_children(anchor, rest, &VALIDATION_RULES)
            });

            found.map(wire_target).ok_or_else(|| {
                TargetError::not_found("heading", segments.join(HUMAN_DELIMITER), all_targets(forest))
            })
        }
    }
}

fn wire_target(node: Node<'_>) -> String {
    let target = format_target(node).unwrap_or_else(|| node.element().title.clone());
    to_wire(&target)
}

/// Human-form targets of every heading, in document order.
pub fn all_targets(forest: &Forest) -> Vec<String> {
    forest.headings().filter_map(format_target).collect()
}

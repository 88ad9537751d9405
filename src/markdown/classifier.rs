//! Single-pass line classifier.
//!
//! Splits raw markdown into a flat, ordered sequence of [`Element`]s. The
//! classifier never rejects input: anything it does not recognize ends up in
//! a paragraph. Precedence per line (first match wins):
//!
//! 1. a fence line (```` ``` ````) opens or closes a code block
//! 2. inside a code block every line is kept verbatim
//! 3. `#` starts a heading
//! 4. `- `, `* `, `+ ` accumulate into a list
//! 5. two or more `|` accumulate into a table
//! 6. `>` accumulates into a blockquote
//! 7. `[` and `]` form a one-line link (or image for `![`)
//! 8. any other non-blank line accumulates into a paragraph
//! 9. a blank line closes an open paragraph and nothing else
//!
//! A YAML frontmatter block (`---` on line 1 up to the next `---`) is
//! recognized before any of the above.

use crate::markdown::element::{Element, ElementKind};

const FENCE: &str = "```";
const FRONTMATTER_DELIMITER: &str = "---";

/// Classify `text` into its ordered element sequence.
pub fn classify(text: &str) -> Vec<Element> {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let mut classifier = Classifier::default();
    let body_start = classifier.frontmatter(&lines);

    for (index, line) in lines.iter().enumerate().skip(body_start) {
        classifier.push_line(index + 1, line);
    }

    classifier.finish()
}

struct OpenElement {
    element: Element,
    lines: Vec<String>,
}

#[derive(Default)]
struct Classifier {
    elements: Vec<Element>,
    open: Option<OpenElement>,
    in_code_block: bool,
}

impl Classifier {
    /// Emits the frontmatter element if present and returns the index of the
    /// first body line.
    fn frontmatter(&mut self, lines: &[&str]) -> usize {
        if lines.first().map(|line| line.trim()) != Some(FRONTMATTER_DELIMITER) {
            return 0;
        }

        let Some(closing) = lines
            .iter()
            .skip(1)
            .position(|line| line.trim() == FRONTMATTER_DELIMITER)
            .map(|offset| offset + 1)
        else {
            return 0;
        };

        let mut element = Element::new(ElementKind::Frontmatter, 1);
        element.content = lines[1..closing].join("\n").trim().to_string();
        self.elements.push(element);

        closing + 1
    }

    fn push_line(&mut self, number: usize, line: &str) {
        let trimmed = line.trim();

        if let Some(info) = trimmed.strip_prefix(FENCE) {
            self.close();
            if self.in_code_block {
                self.in_code_block = false;
            } else {
                let mut element = Element::new(ElementKind::CodeBlock, number);
                element
                    .attributes
                    .insert("language".to_string(), info.trim().to_string());
                self.open(element);
                self.in_code_block = true;
            }
            return;
        }

        if self.in_code_block {
            self.append(line);
            return;
        }

        if trimmed.starts_with('#') {
            self.close();
            let level = trimmed.chars().take_while(|c| *c == '#').count();
            let title = trimmed[level..].trim();
            self.open(Element::heading(level, title, number));
            return;
        }

        if is_list_item(trimmed) {
            self.accumulate(ElementKind::List, number, trimmed);
            return;
        }

        if trimmed.matches('|').count() >= 2 {
            self.accumulate(ElementKind::Table, number, trimmed);
            return;
        }

        if trimmed.starts_with('>') {
            self.accumulate(ElementKind::Blockquote, number, trimmed);
            return;
        }

        if trimmed.contains('[') && trimmed.contains(']') {
            self.close();
            let kind = if trimmed.contains("![") {
                ElementKind::Image
            } else {
                ElementKind::Link
            };
            let mut element = Element::new(kind, number);
            element.title = link_title(trimmed);
            self.open(element);
            self.append(trimmed);
            return;
        }

        if !trimmed.is_empty() {
            if self.open_kind() != Some(ElementKind::Paragraph) {
                self.close();
                self.open(Element::new(ElementKind::Paragraph, number));
            }
            self.append(line);
        } else if self.open_kind() == Some(ElementKind::Paragraph) {
            self.close();
        }
    }

    fn finish(mut self) -> Vec<Element> {
        self.close();
        self.elements
    }

    fn open_kind(&self) -> Option<ElementKind> {
        self.open.as_ref().map(|open| open.element.kind)
    }

    /// Lists, tables and blockquotes absorb consecutive lines of their kind.
    fn accumulate(&mut self, kind: ElementKind, number: usize, line: &str) {
        if self.open_kind() != Some(kind) {
            self.close();
            self.open(Element::new(kind, number));
        }
        self.append(line);
    }

    fn open(&mut self, element: Element) {
        self.open = Some(OpenElement {
            element,
            lines: Vec::new(),
        });
    }

    fn append(&mut self, line: &str) {
        if let Some(open) = self.open.as_mut() {
            open.lines.push(line.to_string());
        }
    }

    fn close(&mut self) {
        if let Some(OpenElement { mut element, lines }) = self.open.take() {
            element.content = lines.join("\n").trim().to_string();
            self.elements.push(element);
        }
    }
}

fn is_list_item(trimmed: &str) -> bool {
    ["- ", "* ", "+ "]
        .iter()
        .any(|marker| trimmed.starts_with(marker))
}

/// Text between the first `[` and the first `]` following it.
fn link_title(line: &str) -> String {
    let Some(start) = line.find('[') else {
        return String::new();
    };
    let rest = &line[start + 1..];

    match rest.find(']') {
        Some(end) => rest[..end].trim().to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(elements: &[Element]) -> Vec<ElementKind> {
        elements.iter().map(|element| element.kind).collect()
    }

    #[test]
    fn should_classify_headings_and_paragraph() {
        let elements = classify("# Top\n## Sub\nSome text.");

        assert_eq!(3, elements.len());
        assert_eq!(Element::heading(1, "Top", 1), elements[0]);
        assert_eq!(Element::heading(2, "Sub", 2), elements[1]);
        assert_eq!(ElementKind::Paragraph, elements[2].kind);
        assert_eq!("Some text.", elements[2].content);
        assert_eq!(3, elements[2].line);
    }

    #[test]
    fn should_keep_code_block_verbatim() {
        let text = "intro\n```rust\nfn main() {\n\n    # not a heading\n}\n```\nafter";
        let elements = classify(text);

        assert_eq!(
            vec![ElementKind::Paragraph, ElementKind::CodeBlock, ElementKind::Paragraph],
            kinds(&elements)
        );
        let code = &elements[1];
        assert_eq!(2, code.line);
        assert_eq!(Some(&"rust".to_string()), code.attributes.get("language"));
        assert_eq!("fn main() {\n\n    # not a heading\n}", code.content);
        assert_eq!(8, elements[2].line);
    }

    #[test]
    fn should_finalize_unclosed_code_block_at_end_of_input() {
        let elements = classify("```\nlet x = 1;");

        assert_eq!(vec![ElementKind::CodeBlock], kinds(&elements));
        assert_eq!(Some(&String::new()), elements[0].attributes.get("language"));
        assert_eq!("let x = 1;", elements[0].content);
    }

    #[test]
    fn should_accumulate_list_items_across_blank_lines() {
        let elements = classify("- one\n* two\n\n+ three\nplain");

        assert_eq!(vec![ElementKind::List, ElementKind::Paragraph], kinds(&elements));
        assert_eq!("- one\n* two\n+ three", elements[0].content);
        assert_eq!(5, elements[1].line);
    }

    #[test]
    fn should_not_treat_bare_marker_as_list() {
        let elements = classify("-\n---");

        assert_eq!(vec![ElementKind::Paragraph], kinds(&elements));
        assert_eq!("-\n---", elements[0].content);
    }

    #[test]
    fn should_split_tables_and_blockquotes() {
        let text = "| a | b |\n|---|---|\n| 1 | 2 |\n> quoted\n> more";
        let elements = classify(text);

        assert_eq!(vec![ElementKind::Table, ElementKind::Blockquote], kinds(&elements));
        assert_eq!("| a | b |\n|---|---|\n| 1 | 2 |", elements[0].content);
        assert_eq!("> quoted\n> more", elements[1].content);
        assert_eq!(4, elements[1].line);
    }

    #[test]
    fn should_extract_link_and_image_titles() {
        let elements = classify("[Docs](https://example.com)\n![ Logo ](logo.png)");

        assert_eq!(vec![ElementKind::Link, ElementKind::Image], kinds(&elements));
        assert_eq!("Docs", elements[0].title);
        assert_eq!("[Docs](https://example.com)", elements[0].content);
        assert_eq!("Logo", elements[1].title);
    }

    #[test]
    fn should_close_paragraph_on_blank_line() {
        let elements = classify("first\n  second\n\nthird");

        assert_eq!(
            vec![ElementKind::Paragraph, ElementKind::Paragraph],
            kinds(&elements)
        );
        assert_eq!("first\n  second", elements[0].content);
        assert_eq!(4, elements[1].line);
    }

    #[test]
    fn should_count_heading_level_from_leading_hashes() {
        let elements = classify("   ### Deep   \n#tag");

        assert_eq!(Element::heading(3, "Deep", 1), elements[0]);
        assert_eq!(Element::heading(1, "tag", 2), elements[1]);
    }

    #[test]
    fn should_detect_frontmatter_on_first_line() {
        let text = "---\ntitle: My Note\ntags: a, b\n---\n# Body";
        let elements = classify(text);

        assert_eq!(vec![ElementKind::Frontmatter, ElementKind::Heading], kinds(&elements));
        assert_eq!("title: My Note\ntags: a, b", elements[0].content);
        assert_eq!(1, elements[0].line);
        assert_eq!(5, elements[1].line);
    }

    #[test]
    fn should_ignore_unterminated_frontmatter() {
        let elements = classify("---\ntitle: x");

        assert_eq!(vec![ElementKind::Paragraph], kinds(&elements));
        assert_eq!("---\ntitle: x", elements[0].content);
    }

    #[test]
    fn should_tolerate_crlf_line_endings() {
        let elements = classify("# Title\r\nbody\r\n");

        assert_eq!("Title", elements[0].title);
        assert_eq!("body", elements[1].content);
    }

    #[test]
    fn should_never_fail_and_be_idempotent() {
        let text = "]] [[ | ``` \n> \n#\n\n\n* ";
        assert_eq!(classify(text), classify(text));
        assert!(classify("").is_empty());
    }

    #[test]
    fn element_ranges_cover_every_line() {
        let text = "---\ntitle: Note\n---\n# Top\nIntro line\n  continues\n\n- a\n- b\n\n```sh\nmake\n\nmake install\n```\n\n| x | y |\n> quote\n[Link](https://example.com)\ntrailing text";
        let lines: Vec<&str> = text.split('\n').collect();
        let elements = classify(text);

        let starts: Vec<usize> = elements.iter().map(|element| element.line).collect();
        assert_eq!(vec![1, 4, 5, 8, 11, 17, 18, 19, 20], starts);

        // Each element owns its start line up to the line before the next one.
        let mut covered = 0;
        for (index, element) in elements.iter().enumerate() {
            let end = elements
                .get(index + 1)
                .map(|next| next.line - 1)
                .unwrap_or(lines.len());
            assert_eq!(covered + 1, element.line);

            for line in &lines[element.line - 1..end] {
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed.starts_with(FENCE) || trimmed == FRONTMATTER_DELIMITER {
                    continue;
                }
                assert!(
                    element.content.contains(trimmed)
                        || (!element.title.is_empty() && trimmed.contains(element.title.as_str())),
                    "line {:?} not owned by {:?}",
                    line,
                    element
                );
            }
            covered = end;
        }
        assert_eq!(lines.len(), covered);
    }
}

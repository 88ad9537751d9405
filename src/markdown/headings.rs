use serde::Serialize;

/// A heading together with the raw text up to the next heading.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HeadingInfo {
    pub level: usize,
    pub title: String,
    pub content: String,
    pub line: usize,
}

/// Flat heading listing.
///
/// Unlike the classifier this pass knows nothing about code fences or other
/// constructs: every line whose trimmed form starts with `#` opens a new
/// heading. Text before the first heading is not attributed to anything.
pub fn extract_headings(text: &str) -> Vec<HeadingInfo> {
    let mut headings = Vec::new();
    let mut current: Option<(HeadingInfo, Vec<&str>)> = None;

    for (index, line) in text.split('\n').enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let trimmed = line.trim();

        if trimmed.starts_with('#') {
            if let Some((heading, lines)) = current.take() {
                headings.push(finish(heading, &lines));
            }

            let level = trimmed.chars().take_while(|c| *c == '#').count();
            let heading = HeadingInfo {
                level,
                title: trimmed[level..].trim().to_string(),
                content: String::new(),
                line: index + 1,
            };
            current = Some((heading, Vec::new()));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }

    if let Some((heading, lines)) = current {
        headings.push(finish(heading, &lines));
    }

    headings
}

fn finish(mut heading: HeadingInfo, lines: &[&str]) -> HeadingInfo {
    heading.content = lines.join("\n").trim().to_string();
    heading
}

/// First heading whose title matches `query`.
///
/// `exact` compares titles verbatim, otherwise a case-insensitive substring
/// match is used.
pub fn find_heading<'a>(
    headings: &'a [HeadingInfo],
    query: &str,
    exact: bool,
) -> Option<&'a HeadingInfo> {
    let needle = query.to_lowercase();

    headings.iter().find(|heading| {
        if exact {
            heading.title == query
        } else {
            heading.title.to_lowercase().contains(&needle)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTE: &str = "preamble\n# Intro\nWelcome.\n\n## Setup Guide\n```sh\n# install\n```\nDone.";

    #[test]
    fn should_extract_headings_with_content() {
        let headings = extract_headings(NOTE);
        let titles: Vec<&str> = headings.iter().map(|h| h.title.as_str()).collect();

        assert_eq!(vec!["Intro", "Setup Guide", "install"], titles);
        assert_eq!(2, headings[0].line);
        assert_eq!("Welcome.", headings[0].content);
        assert_eq!(2, headings[1].level);
        assert_eq!("```sh", headings[1].content);
        assert_eq!("```\nDone.", headings[2].content);
    }

    #[test]
    fn should_find_heading_by_substring_or_exact_title() {
        let headings = extract_headings(NOTE);

        let found = find_heading(&headings, "setup", false).unwrap();
        assert_eq!("Setup Guide", found.title);

        assert!(find_heading(&headings, "setup guide", true).is_none());
        assert!(find_heading(&headings, "Setup Guide", true).is_some());
    }

    #[test]
    fn should_return_nothing_without_headings() {
        assert!(extract_headings("just text\nmore").is_empty());
    }

    #[test]
    fn should_strip_carriage_returns() {
        let headings = extract_headings("# Title\r\nfirst\r\nsecond\r\n## Next\r\n");

        assert_eq!("Title", headings[0].title);
        assert_eq!("first\nsecond", headings[0].content);
        assert_eq!("Next", headings[1].title);
        assert_eq!("", headings[1].content);
    }
}

//! Heading-rooted document tree.
//!
//! Nodes live in a flat arena and refer to their children by index, so the
//! builder never holds references into a growing collection. The heading
//! stack used while building is a function-local list of arena indices.

use crate::markdown::element::Element;
use serde::Serialize;

/// Index of a node inside its [`Forest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Clone, Debug)]
struct NodeData {
    element: Element,
    children: Vec<NodeId>,
    path: Vec<String>,
}

/// All nodes of one parsed document plus the ordered list of roots.
#[derive(Clone, Debug, Default)]
pub struct Forest {
    nodes: Vec<NodeData>,
    roots: Vec<NodeId>,
}

/// Borrowed view of one node.
#[derive(Clone, Copy, Debug)]
pub struct Node<'a> {
    forest: &'a Forest,
    id: NodeId,
}

impl Forest {
    /// Nest `elements` under their owning headings.
    ///
    /// A heading closes every open heading of the same or deeper level and
    /// becomes a child of the nearest shallower one. Other elements attach to
    /// the innermost open heading and never open a scope themselves.
    pub fn build(elements: &[Element]) -> Self {
        let mut forest = Forest::default();
        let mut stack: Vec<NodeId> = Vec::new();

        for element in elements {
            if element.is_heading() {
                while let Some(top) = stack.last() {
                    if forest.data(*top).element.level < element.level {
                        break;
                    }
                    stack.pop();
                }
            }

            let parent = stack.last().copied();
            let id = forest.insert(element.clone(), parent);

            if element.is_heading() {
                stack.push(id);
            }
        }

        forest
    }

    fn insert(&mut self, element: Element, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let segment = element.path_segment();

        let path = match parent {
            Some(parent) => {
                let mut path = self.data(parent).path.clone();
                path.push(segment);
                path
            }
            None => vec![segment],
        };

        self.nodes.push(NodeData {
            element,
            children: Vec::new(),
            path,
        });

        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }

        id
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    pub fn node(&self, id: NodeId) -> Node<'_> {
        Node { forest: self, id }
    }

    pub fn roots(&self) -> impl Iterator<Item = Node<'_>> + '_ {
        self.roots.iter().map(|id| self.node(*id))
    }

    /// Every node in document order (pre-order walk).
    pub fn iter(&self) -> impl Iterator<Item = Node<'_>> + '_ {
        // Arena insertion order is document order, which equals pre-order.
        (0..self.nodes.len()).map(|index| self.node(NodeId(index)))
    }

    /// Every heading node in document order.
    pub fn headings(&self) -> impl Iterator<Item = Node<'_>> + '_ {
        self.iter().filter(|node| node.element().is_heading())
    }

    /// Owned nested representation, for serialization.
    pub fn to_nested(&self) -> Vec<NestedNode> {
        self.roots().map(|node| node.to_nested()).collect()
    }
}

impl<'a> Node<'a> {
    pub fn element(self) -> &'a Element {
        &self.forest.data(self.id).element
    }

    pub fn path(self) -> &'a [String] {
        &self.forest.data(self.id).path
    }

    pub fn children(self) -> impl Iterator<Item = Node<'a>> + 'a {
        let forest = self.forest;
        forest
            .data(self.id)
            .children
            .iter()
            .map(move |id| forest.node(*id))
    }

    pub fn has_children(self) -> bool {
        !self.forest.data(self.id).children.is_empty()
    }

    pub fn to_nested(self) -> NestedNode {
        NestedNode {
            element: self.element().clone(),
            path: self.path().to_vec(),
            children: self.children().map(|child| child.to_nested()).collect(),
        }
    }
}

/// Owned copy of a subtree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NestedNode {
    pub element: Element,
    pub path: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NestedNode>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::classifier::classify;
    use crate::markdown::element::ElementKind;

    fn titles<'a>(nodes: impl Iterator<Item = Node<'a>>) -> Vec<String> {
        nodes.map(|node| node.element().title.clone()).collect()
    }

    #[test]
    fn should_nest_content_under_headings() {
        let forest = Forest::build(&classify("# Top\n## Sub\nSome text."));

        assert_eq!(vec!["Top"], titles(forest.roots()));
        let top = forest.roots().next().unwrap();
        let sub = top.children().next().unwrap();
        assert_eq!("Sub", sub.element().title);
        assert_eq!(vec!["heading:Top", "heading:Sub"], sub.path());

        let paragraph = sub.children().next().unwrap();
        assert_eq!(ElementKind::Paragraph, paragraph.element().kind);
        assert_eq!(
            vec!["heading:Top", "heading:Sub", "paragraph:"],
            paragraph.path()
        );
    }

    #[test]
    fn should_close_same_level_scopes() {
        let text = "# A\n## B\n### C\n## D\ntext\n# E";
        let forest = Forest::build(&classify(text));

        assert_eq!(vec!["A", "E"], titles(forest.roots()));
        let a = forest.roots().next().unwrap();
        assert_eq!(vec!["B", "D"], titles(a.children()));

        let d = a.children().nth(1).unwrap();
        assert_eq!(vec!["heading:A", "heading:D"], d.path());
        assert_eq!(ElementKind::Paragraph, d.children().next().unwrap().element().kind);
    }

    #[test]
    fn should_keep_leading_content_at_root() {
        let forest = Forest::build(&classify("intro\n\n## Late\nbody"));
        let roots: Vec<Node> = forest.roots().collect();

        assert_eq!(2, roots.len());
        assert_eq!(ElementKind::Paragraph, roots[0].element().kind);
        assert_eq!(1, roots[0].path().len());
        assert_eq!("Late", roots[1].element().title);
    }

    #[test]
    fn should_nest_skipped_levels_under_nearest_shallower_heading() {
        let forest = Forest::build(&classify("## Two\n#### Four\n### Three"));
        let two = forest.roots().next().unwrap();

        assert_eq!(vec!["Four", "Three"], titles(two.children()));
    }

    #[test]
    fn path_length_matches_heading_ancestry() {
        let text = "# A\np\n## B\n- item\n### C\n```\ncode\n```\n## D\n> q";
        let forest = Forest::build(&classify(text));

        fn check(node: Node, heading_ancestors: usize) {
            let own = usize::from(node.element().is_heading());
            assert_eq!(heading_ancestors + 1, node.path().len());
            for child in node.children() {
                check(child, heading_ancestors + own);
            }
            if !node.element().is_heading() {
                assert!(!node.has_children());
            }
        }

        for root in forest.roots() {
            check(root, 0);
        }
        assert_eq!(vec!["A", "B", "C", "D"], titles(forest.headings()));
    }

    #[test]
    fn should_serialize_nested_copy() {
        let forest = Forest::build(&classify("# Top\ntext"));
        let nested = forest.to_nested();

        assert_eq!(1, nested.len());
        assert_eq!(1, nested[0].children.len());
        let json = serde_json::to_value(&nested).unwrap();
        assert_eq!("heading", json[0]["element"]["type"]);
    }
}

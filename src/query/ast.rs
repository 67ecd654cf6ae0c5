//! Parsed query trees.

use std::fmt;

pub use crate::index::store::WildcardKind;

/// A node of a parsed query.
///
/// Leaves hold the raw words from the query string. Normalization happens
/// when the tree is compiled against an index, not at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    /// A single word.
    Term(String),
    /// A word with leading and/or trailing `*`. `pattern` is the literal
    /// part without the asterisks.
    Wildcard { pattern: String, kind: WildcardKind },
    /// A quoted phrase; the words must occur contiguously and in order.
    Phrase(Vec<String>),
    And(Vec<QueryNode>),
    Or(Vec<QueryNode>),
    Not(Box<QueryNode>),
}

impl QueryNode {
    /// Combine nodes with AND, collapsing a single node to itself.
    pub fn and(mut children: Vec<QueryNode>) -> QueryNode {
        if children.len() == 1 {
            children.remove(0)
        } else {
            QueryNode::And(children)
        }
    }

    /// Combine nodes with OR, collapsing a single node to itself.
    pub fn or(mut children: Vec<QueryNode>) -> QueryNode {
        if children.len() == 1 {
            children.remove(0)
        } else {
            QueryNode::Or(children)
        }
    }

    /// Negate a node.
    #[allow(clippy::should_implement_trait)]
    pub fn not(child: QueryNode) -> QueryNode {
        QueryNode::Not(Box::new(child))
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            QueryNode::Term(_) | QueryNode::Wildcard { .. } | QueryNode::Phrase(_) => 1,
            QueryNode::And(children) | QueryNode::Or(children) => {
                children.iter().map(QueryNode::leaf_count).sum()
            }
            QueryNode::Not(child) => child.leaf_count(),
        }
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryNode::Term(term) => write!(f, "{term}"),
            QueryNode::Wildcard { pattern, kind } => match kind {
                WildcardKind::Prefix => write!(f, "{pattern}*"),
                WildcardKind::Suffix => write!(f, "*{pattern}"),
                WildcardKind::Substring => write!(f, "*{pattern}*"),
            },
            QueryNode::Phrase(words) => write!(f, "\"{}\"", words.join(" ")),
            QueryNode::And(children) => write_group(f, children, " AND "),
            QueryNode::Or(children) => write_group(f, children, " OR "),
            QueryNode::Not(child) => write!(f, "NOT {child}"),
        }
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, children: &[QueryNode], separator: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, "{separator}")?;
        }
        write!(f, "{child}")?;
    }
    write!(f, ")")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let tree = QueryNode::or(vec![
            QueryNode::and(vec![
                QueryNode::Term("apple".into()),
                QueryNode::not(QueryNode::Wildcard {
                    pattern: "ban".into(),
                    kind: WildcardKind::Prefix,
                }),
            ]),
            QueryNode::Phrase(vec!["pie".into(), "crust".into()]),
        ]);

        assert_eq!(tree.to_string(), "((apple AND NOT ban*) OR \"pie crust\")");
        assert_eq!(tree.leaf_count(), 3);
    }

    #[test]
    fn test_single_child_collapses() {
        let node = QueryNode::and(vec![QueryNode::Term("x".into())]);
        assert_eq!(node, QueryNode::Term("x".into()));
    }
}

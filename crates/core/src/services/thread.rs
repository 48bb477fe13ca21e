//! Reply tree assembly.
//!
//! Comments are stored flat; each carries the id of the comment it answers.
//! [`build`] turns one content item's comments into a tree in a single pass:
//! index by id, link children to parents, then assemble bottom-up. Nothing
//! is dropped. A reply whose target is gone (orphan) is promoted to the top
//! level, and so is the earliest member of a reply cycle.
//!
//! Logical depth is unbounded. [`display_rows`] flattens a tree for
//! rendering and clamps indentation to a maximum depth without hiding
//! anything.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use colloquy_db::entities::comment;
use serde::Serialize;

/// A comment and its replies, oldest first.
///
/// Nesting depth is unbounded, so drop and equality walk the tree with an
/// explicit stack instead of recursing per level.
pub struct ThreadNode {
    pub comment: comment::Model,
    pub replies: Vec<ThreadNode>,
}

impl Drop for ThreadNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.replies);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.replies);
        }
    }
}

impl PartialEq for ThreadNode {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            if a.comment != b.comment || a.replies.len() != b.replies.len() {
                return false;
            }
            stack.extend(a.replies.iter().zip(&b.replies));
        }
        true
    }
}

impl Eq for ThreadNode {}

impl fmt::Debug for ThreadNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reply_ids: Vec<&str> = self.replies.iter().map(|r| r.comment.id.as_str()).collect();
        f.debug_struct("ThreadNode")
            .field("comment", &self.comment)
            .field("replies", &reply_ids)
            .field("descendants", &self.descendant_count())
            .finish()
    }
}

impl ThreadNode {
    /// Number of direct replies.
    #[must_use]
    pub fn reply_count(&self) -> usize {
        self.replies.len()
    }

    /// Number of replies at any depth below this node.
    #[must_use]
    pub fn descendant_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&Self> = self.replies.iter().collect();
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.replies.iter());
        }
        count
    }

    /// Whether this top-level node is a reply whose target was not found.
    ///
    /// Only meaningful for nodes at the top level of a built thread.
    #[must_use]
    pub const fn is_orphan(&self) -> bool {
        self.comment.reply_to_id.is_some()
    }

    /// This comment and all replies in display (pre-)order.
    #[must_use]
    pub fn comments(&self) -> Vec<&comment::Model> {
        let mut out = Vec::with_capacity(self.descendant_count() + 1);
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(&node.comment);
            stack.extend(node.replies.iter().rev());
        }
        out
    }
}

/// Total number of comments in a forest.
#[must_use]
pub fn count_comments(nodes: &[ThreadNode]) -> usize {
    nodes.iter().map(|node| node.descendant_count() + 1).sum()
}

/// Display order: creation time, then id.
fn display_order(a: &comment::Model, b: &comment::Model) -> Ordering {
    a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Build the reply forest for one content item's comments.
///
/// Pure and deterministic: the result depends only on the input set, not
/// on its order.
#[must_use]
pub fn build(comments: &[comment::Model]) -> Vec<ThreadNode> {
    let mut sorted: Vec<&comment::Model> = comments.iter().collect();
    sorted.sort_by(|a, b| display_order(a, b));
    let n = sorted.len();

    // First occurrence wins if an id is duplicated
    let mut position: HashMap<&str, usize> = HashMap::with_capacity(n);
    for (pos, c) in sorted.iter().enumerate() {
        position.entry(c.id.as_str()).or_insert(pos);
    }

    // Children lists inherit display order from the iteration order
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut top_level: Vec<usize> = Vec::new();
    for (pos, c) in sorted.iter().enumerate() {
        match c.reply_to_id.as_deref().and_then(|id| position.get(id)) {
            Some(&parent) if parent != pos => children[parent].push(pos),
            _ => top_level.push(pos),
        }
    }

    let mut walk = Walk {
        children: &children,
        visited: vec![false; n],
        tree_children: vec![Vec::new(); n],
        post_order: Vec::with_capacity(n),
    };
    for &root in &top_level {
        walk.attach(root);
    }
    // Whatever is still unvisited hangs off a reply cycle
    for pos in 0..n {
        if !walk.visited[pos] {
            walk.attach(pos);
            top_level.push(pos);
        }
    }
    top_level.sort_unstable();

    let mut built: Vec<Option<ThreadNode>> = (0..n).map(|_| None).collect();
    for &pos in &walk.post_order {
        let replies = walk.tree_children[pos]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[pos] = Some(ThreadNode {
            comment: sorted[pos].clone(),
            replies,
        });
    }

    top_level
        .into_iter()
        .filter_map(|pos| built[pos].take())
        .collect()
}

struct Walk<'a> {
    children: &'a [Vec<usize>],
    visited: Vec<bool>,
    tree_children: Vec<Vec<usize>>,
    post_order: Vec<usize>,
}

impl Walk<'_> {
    /// Depth-first from `start`, recording tree edges and post-order.
    fn attach(&mut self, start: usize) {
        self.visited[start] = true;
        let mut stack = vec![(start, 0usize)];
        while let Some(top) = stack.last_mut() {
            let node = top.0;
            if let Some(&child) = self.children[node].get(top.1) {
                top.1 += 1;
                if !self.visited[child] {
                    self.visited[child] = true;
                    self.tree_children[node].push(child);
                    stack.push((child, 0));
                }
            } else {
                self.post_order.push(node);
                stack.pop();
            }
        }
    }
}

/// One rendered line of a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRow {
    pub comment: comment::Model,
    /// Logical nesting depth (0 for top-level).
    pub depth: usize,
    /// Indentation level, `depth` clamped to the display maximum.
    pub indent: usize,
    /// Top-level reply whose target no longer exists.
    pub orphaned: bool,
}

/// Flatten a forest into display rows in pre-order.
#[must_use]
pub fn display_rows(nodes: &[ThreadNode], max_display_depth: usize) -> Vec<DisplayRow> {
    let mut rows = Vec::with_capacity(count_comments(nodes));
    let mut stack: Vec<(&ThreadNode, usize)> = nodes.iter().rev().map(|node| (node, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        rows.push(DisplayRow {
            comment: node.comment.clone(),
            depth,
            indent: depth.min(max_display_depth),
            orphaned: depth == 0 && node.is_orphan(),
        });
        stack.extend(node.replies.iter().rev().map(|reply| (reply, depth + 1)));
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn at(seconds: i64) -> chrono::DateTime<chrono::FixedOffset> {
        (Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_default()
            + Duration::seconds(seconds))
        .into()
    }

    fn create_test_comment(id: &str, reply_to_id: Option<&str>, seconds: i64) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            parent_id: "blog-42".to_string(),
            reply_to_id: reply_to_id.map(ToString::to_string),
            author_id: "user1".to_string(),
            author_name: "User One".to_string(),
            author_role: "Member".to_string(),
            content: format!("comment {id}"),
            created_at: at(seconds),
        }
    }

    fn ids(nodes: &[ThreadNode]) -> Vec<&str> {
        nodes.iter().map(|node| node.comment.id.as_str()).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(build(&[]).is_empty());
    }

    #[test]
    fn test_root_with_reply() {
        let comments = vec![
            create_test_comment("a", None, 0),
            create_test_comment("b", Some("a"), 10),
        ];

        let tree = build(&comments);
        assert_eq!(ids(&tree), vec!["a"]);
        assert_eq!(tree[0].reply_count(), 1);
        assert_eq!(tree[0].replies[0].comment.id, "b");
        assert!(!tree[0].is_orphan());
    }

    #[test]
    fn test_ordering_at_every_level() {
        let comments = vec![
            create_test_comment("r2", None, 20),
            create_test_comment("r1", None, 10),
            create_test_comment("r1-late", Some("r1"), 50),
            create_test_comment("r1-early", Some("r1"), 30),
            create_test_comment("deep-b", Some("r1-early"), 60),
            create_test_comment("deep-a", Some("r1-early"), 40),
        ];

        let tree = build(&comments);
        assert_eq!(ids(&tree), vec!["r1", "r2"]);
        assert_eq!(ids(&tree[0].replies), vec!["r1-early", "r1-late"]);
        assert_eq!(ids(&tree[0].replies[0].replies), vec!["deep-a", "deep-b"]);
    }

    #[test]
    fn test_timestamp_ties_break_on_id() {
        let comments = vec![
            create_test_comment("b", None, 0),
            create_test_comment("a", None, 0),
        ];

        assert_eq!(ids(&build(&comments)), vec!["a", "b"]);
    }

    #[test]
    fn test_orphan_is_promoted() {
        // "a" was deleted; "b" still points at it
        let comments = vec![
            create_test_comment("b", Some("a"), 10),
            create_test_comment("c", Some("b"), 20),
            create_test_comment("root", None, 30),
        ];

        let tree = build(&comments);
        assert_eq!(ids(&tree), vec!["b", "root"]);
        assert!(tree[0].is_orphan());
        assert_eq!(ids(&tree[0].replies), vec!["c"]);
        assert!(!tree[1].is_orphan());
    }

    #[test]
    fn test_reply_cycle_is_not_dropped() {
        let comments = vec![
            create_test_comment("x", Some("y"), 10),
            create_test_comment("y", Some("x"), 20),
            create_test_comment("self", Some("self"), 30),
        ];

        let tree = build(&comments);
        assert_eq!(count_comments(&tree), 3);
        assert_eq!(ids(&tree), vec!["x", "self"]);
        assert_eq!(ids(&tree[0].replies), vec!["y"]);
    }

    #[test]
    fn test_no_silent_drops() {
        let comments = vec![
            create_test_comment("a", None, 0),
            create_test_comment("b", Some("a"), 1),
            create_test_comment("c", Some("b"), 2),
            create_test_comment("d", Some("missing"), 3),
            create_test_comment("e", Some("d"), 4),
            create_test_comment("f", None, 5),
        ];

        let tree = build(&comments);
        assert_eq!(count_comments(&tree), comments.len());
    }

    #[test]
    fn test_build_ignores_input_order() {
        let mut comments = vec![
            create_test_comment("a", None, 0),
            create_test_comment("b", Some("a"), 1),
            create_test_comment("c", Some("a"), 1),
            create_test_comment("d", Some("gone"), 2),
            create_test_comment("e", Some("c"), 3),
        ];
        let expected = build(&comments);

        comments.reverse();
        assert_eq!(build(&comments), expected);
        comments.swap(0, 3);
        assert_eq!(build(&comments), expected);
    }

    #[test]
    fn test_rebuild_from_flattened_output() {
        let comments = vec![
            create_test_comment("a", None, 0),
            create_test_comment("b", Some("a"), 1),
            create_test_comment("c", Some("b"), 2),
            create_test_comment("d", Some("gone"), 3),
        ];
        let tree = build(&comments);

        let flattened: Vec<comment::Model> = tree
            .iter()
            .flat_map(ThreadNode::comments)
            .cloned()
            .collect();
        assert_eq!(build(&flattened), tree);
    }

    #[test]
    fn test_deep_chain() {
        let mut comments = vec![create_test_comment("n0", None, 0)];
        for i in 1..500 {
            let parent = format!("n{}", i - 1);
            comments.push(create_test_comment(&format!("n{i}"), Some(&parent), i));
        }

        let tree = build(&comments);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].descendant_count(), 499);
    }

    #[test]
    fn test_very_deep_chain_builds_and_drops() {
        const DEPTH: usize = 100_000;
        let mut comments = Vec::with_capacity(DEPTH);
        comments.push(create_test_comment("n0", None, 0));
        for i in 1..DEPTH {
            let parent = format!("n{}", i - 1);
            comments.push(create_test_comment(
                &format!("n{i}"),
                Some(&parent),
                i64::try_from(i).unwrap_or(i64::MAX),
            ));
        }

        let tree = build(&comments);
        assert_eq!(count_comments(&tree), DEPTH);

        let rows = display_rows(&tree, 2);
        assert_eq!(rows.len(), DEPTH);
        assert_eq!(rows[DEPTH - 1].depth, DEPTH - 1);
        assert_eq!(rows[DEPTH - 1].indent, 2);

        assert!(build(&comments) == tree);
        drop(tree);
    }

    #[test]
    fn test_equality_compares_nested_replies() {
        let left = build(&[
            create_test_comment("a", None, 0),
            create_test_comment("b", Some("a"), 1),
        ]);
        let right = build(&[
            create_test_comment("a", None, 0),
            create_test_comment("b", None, 1),
        ]);
        assert_ne!(left, right);
    }

    #[test]
    fn test_display_rows_clamp_indent() {
        let comments = vec![
            create_test_comment("a", None, 0),
            create_test_comment("b", Some("a"), 1),
            create_test_comment("c", Some("b"), 2),
            create_test_comment("d", Some("c"), 3),
            create_test_comment("e", Some("a"), 4),
            create_test_comment("orphan", Some("gone"), 5),
        ];

        let rows = display_rows(&build(&comments), 2);
        let summary: Vec<(&str, usize, usize, bool)> = rows
            .iter()
            .map(|row| (row.comment.id.as_str(), row.depth, row.indent, row.orphaned))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("a", 0, 0, false),
                ("b", 1, 1, false),
                ("c", 2, 2, false),
                ("d", 3, 2, false),
                ("e", 1, 1, false),
                ("orphan", 0, 0, true),
            ]
        );
    }

    #[test]
    fn test_display_rows_zero_depth_flattens_everything() {
        let comments = vec![
            create_test_comment("a", None, 0),
            create_test_comment("b", Some("a"), 1),
        ];

        let rows = display_rows(&build(&comments), 0);
        assert!(rows.iter().all(|row| row.indent == 0));
        assert_eq!(rows[1].depth, 1);
    }
}
